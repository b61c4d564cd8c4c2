//! Boot texture image type and codecs.
//!
//! The console stores its boot textures as a restricted TGA variant:
//! uncompressed true-color only, no id field, no color map, origin at
//! (0, 0), rows bottom-to-top, 24 or 32 bits per pixel, and a fixed
//! 26-byte footer. Anything outside that shape is rejected wholesale.
//!
//! Decoded pixels are held in one canonical layout regardless of source:
//! 4 bytes per pixel in RGBA order (the order the PNG decoder produces),
//! row 0 at the visual top. TGA decode reverses the three positional
//! color bytes of each pixel into that order; encode reverses them back.

use std::io::Cursor;

use thiserror::Error;

/// Fixed TGA header: 18 bytes, all fields validated exactly on decode.
const TGA_HEADER_LEN: usize = 18;

/// 8 zero bytes (extension + developer offsets) followed by the signature.
const TGA_FOOTER: &[u8; 26] = b"\0\0\0\0\0\0\0\0TRUEVISION-XFILE.\0";

/// Errors produced by the image codecs
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageError {
    /// The interchange decoder could not parse the data
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// The data is not a TGA file the console would accept
    #[error("invalid or unsupported TGA data")]
    InvalidTga,
}

/// Pixel depth of an encoded native texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TgaDepth {
    /// 24-bit, no alpha channel
    Bpp24,
    /// 32-bit with an 8-bit alpha channel
    Bpp32,
}

impl TgaDepth {
    fn bytes_per_pixel(self) -> usize {
        match self {
            TgaDepth::Bpp24 => 3,
            TgaDepth::Bpp32 => 4,
        }
    }

    fn bits(self) -> u8 {
        match self {
            TgaDepth::Bpp24 => 24,
            TgaDepth::Bpp32 => 32,
        }
    }

    /// Image descriptor byte: alpha-channel depth, 8 when alpha is present.
    fn descriptor(self) -> u8 {
        match self {
            TgaDepth::Bpp24 => 0,
            TgaDepth::Bpp32 => 8,
        }
    }
}

/// A decoded boot texture.
///
/// Dimensions are fixed at construction; replacing a texture's content
/// goes through [`crate::TitleMeta`], which enforces matching dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Image {
    /// Build an image from raw RGBA pixels, row 0 at the top.
    ///
    /// Panics if the buffer length does not match the dimensions; that is
    /// a logic error in the caller, not a recoverable condition.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        assert_eq!(
            pixels.len(),
            width as usize * height as usize * 4,
            "pixel buffer does not match dimensions"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes, `width * height * 4` long.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Decode a console boot texture.
    pub fn from_tga(data: &[u8]) -> Result<Self, ImageError> {
        if data.len() < TGA_HEADER_LEN {
            return Err(ImageError::InvalidTga);
        }

        let width = u16::from_le_bytes([data[12], data[13]]) as usize;
        let height = u16::from_le_bytes([data[14], data[15]]) as usize;
        let bpp = data[16];
        let px_bytes = bpp as usize / 8;

        if data.len() < TGA_HEADER_LEN + width * height * px_bytes {
            return Err(ImageError::InvalidTga);
        }

        // id field, color map and origin must all be absent.
        if data[0] != 0 || data[1] != 0 {
            return Err(ImageError::InvalidTga);
        }
        // image type 2: uncompressed true-color
        if data[2] != 2 {
            return Err(ImageError::InvalidTga);
        }
        if data[3..8].iter().any(|&b| b != 0) {
            return Err(ImageError::InvalidTga);
        }
        let x_origin = u16::from_le_bytes([data[8], data[9]]);
        let y_origin = u16::from_le_bytes([data[10], data[11]]);
        if x_origin != 0 || y_origin != 0 {
            return Err(ImageError::InvalidTga);
        }
        if bpp != 24 && bpp != 32 {
            return Err(ImageError::InvalidTga);
        }
        let descriptor = data[17];
        if (bpp == 32 && descriptor != 8) || (bpp == 24 && descriptor != 0) {
            return Err(ImageError::InvalidTga);
        }

        let payload = &data[TGA_HEADER_LEN..];
        let mut pixels = vec![0u8; width * height * 4];

        // Payload rows run bottom-to-top; flip so row 0 is the top row.
        for y in 0..height {
            let src_row = y * width * px_bytes;
            let dst_row = (height - 1 - y) * width * 4;
            for x in 0..width {
                let src = src_row + x * px_bytes;
                let dst = dst_row + x * 4;
                pixels[dst] = payload[src + 2];
                pixels[dst + 1] = payload[src + 1];
                pixels[dst + 2] = payload[src];
                pixels[dst + 3] = if px_bytes == 4 { payload[src + 3] } else { 0xFF };
            }
        }

        Ok(Self {
            width: width as u32,
            height: height as u32,
            pixels,
        })
    }

    /// Encode as a console boot texture at the given depth.
    pub fn to_tga(&self, depth: TgaDepth) -> Vec<u8> {
        let width = self.width as usize;
        let height = self.height as usize;
        let px_bytes = depth.bytes_per_pixel();

        let mut out =
            Vec::with_capacity(TGA_HEADER_LEN + width * height * px_bytes + TGA_FOOTER.len());

        out.extend_from_slice(&[0, 0, 2, 0, 0, 0, 0, 0]);
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&(self.width as u16).to_le_bytes());
        out.extend_from_slice(&(self.height as u16).to_le_bytes());
        out.push(depth.bits());
        out.push(depth.descriptor());

        for y in (0..height).rev() {
            let row = y * width * 4;
            for x in 0..width {
                let src = row + x * 4;
                out.push(self.pixels[src + 2]);
                out.push(self.pixels[src + 1]);
                out.push(self.pixels[src]);
                if px_bytes == 4 {
                    out.push(self.pixels[src + 3]);
                }
            }
        }

        out.extend_from_slice(TGA_FOOTER);
        out
    }

    /// Decode a PNG (or any format the interchange decoder knows),
    /// forcing 4 output channels.
    pub fn from_png(data: &[u8]) -> Result<Self, ImageError> {
        let decoded =
            image::load_from_memory(data).map_err(|e| ImageError::Decode(e.to_string()))?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self {
            width,
            height,
            pixels: rgba.into_raw(),
        })
    }

    /// Encode as a lossless PNG.
    pub fn to_png(&self) -> Vec<u8> {
        let rgba = image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .expect("pixel buffer matches dimensions");
        let mut out = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(rgba)
            .write_to(&mut out, image::ImageFormat::Png)
            .expect("in-memory PNG encoding failed");
        out.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32) -> Image {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = if (x + y) % 2 == 0 { 0x20 } else { 0xD0 };
                pixels.extend_from_slice(&[v, x as u8, y as u8, 0xFF - v]);
            }
        }
        Image::from_rgba(width, height, pixels)
    }

    fn valid_header(width: u16, height: u16, bpp: u8) -> Vec<u8> {
        let mut data = vec![0u8; TGA_HEADER_LEN];
        data[2] = 2;
        data[12..14].copy_from_slice(&width.to_le_bytes());
        data[14..16].copy_from_slice(&height.to_le_bytes());
        data[16] = bpp;
        data[17] = if bpp == 32 { 8 } else { 0 };
        data.resize(TGA_HEADER_LEN + width as usize * height as usize * bpp as usize / 8, 0);
        data
    }

    #[test]
    fn test_tga_roundtrip_32bpp() {
        let img = checker(4, 3);
        let encoded = img.to_tga(TgaDepth::Bpp32);
        let decoded = Image::from_tga(&encoded).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_tga_roundtrip_24bpp_forces_opaque_alpha() {
        let mut img = checker(5, 2);
        let encoded = img.to_tga(TgaDepth::Bpp24);
        let decoded = Image::from_tga(&encoded).unwrap();
        // 24-bit encoding drops alpha; decode restores it as 0xFF.
        for px in img.pixels.chunks_exact_mut(4) {
            px[3] = 0xFF;
        }
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_tga_row_order_is_flipped() {
        // 1x2 image: top pixel red-ish, bottom pixel blue-ish.
        let img = Image::from_rgba(1, 2, vec![200, 0, 0, 255, 0, 0, 200, 255]);
        let encoded = img.to_tga(TgaDepth::Bpp32);
        // First payload pixel is the bottom row, stored reversed (b, g, r, a).
        assert_eq!(&encoded[TGA_HEADER_LEN..TGA_HEADER_LEN + 4], &[200, 0, 0, 255]);
    }

    #[test]
    fn test_tga_footer_present() {
        let encoded = checker(2, 2).to_tga(TgaDepth::Bpp32);
        assert!(encoded.ends_with(TGA_FOOTER));
    }

    #[test]
    fn test_rejects_short_buffer() {
        assert_eq!(Image::from_tga(&[0u8; 17]), Err(ImageError::InvalidTga));
    }

    #[test]
    fn test_rejects_truncated_payload() {
        let mut data = valid_header(4, 4, 32);
        data.truncate(data.len() - 1);
        assert_eq!(Image::from_tga(&data), Err(ImageError::InvalidTga));
    }

    #[test]
    fn test_rejects_bad_header_fields() {
        for (offset, value) in [
            (0usize, 1u8), // id length
            (1, 1),        // color map type
            (2, 10),       // RLE image type
            (5, 1),        // color map spec
            (8, 1),        // x origin
            (10, 1),       // y origin
        ] {
            let mut data = valid_header(2, 2, 32);
            data[offset] = value;
            assert_eq!(Image::from_tga(&data), Err(ImageError::InvalidTga), "offset {offset}");
        }
    }

    #[test]
    fn test_rejects_unsupported_depth() {
        let data = valid_header(2, 2, 16);
        assert_eq!(Image::from_tga(&data), Err(ImageError::InvalidTga));
    }

    #[test]
    fn test_rejects_descriptor_depth_mismatch() {
        let mut data = valid_header(2, 2, 32);
        data[17] = 0;
        assert_eq!(Image::from_tga(&data), Err(ImageError::InvalidTga));

        let mut data = valid_header(2, 2, 24);
        data[17] = 8;
        assert_eq!(Image::from_tga(&data), Err(ImageError::InvalidTga));
    }

    #[test]
    fn test_png_roundtrip() {
        let img = checker(6, 4);
        let decoded = Image::from_png(&img.to_png()).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn test_png_decode_garbage() {
        assert!(matches!(
            Image::from_png(b"not a png"),
            Err(ImageError::Decode(_))
        ));
    }
}
