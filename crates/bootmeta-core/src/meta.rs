//! Per-title metadata bundle.

use crate::error::{Error, Result};
use crate::image::Image;
use crate::sound::{Sound, SoundTarget};

/// The five editable boot assets of one title, plus its edit state.
///
/// A bundle starts clean; every successful replacement or scalar edit
/// marks it dirty, and only a full engine-side sync clears the flag.
#[derive(Debug, Clone)]
pub struct TitleMeta {
    drc_tex: Image,
    tv_tex: Image,
    logo_tex: Image,
    icon_tex: Image,
    boot_sound: Sound,
    dirty: bool,
}

impl TitleMeta {
    /// Decode the five metadata files. The first codec rejection wins;
    /// later files are not attempted.
    pub fn from_files(
        drc: &[u8],
        tv: &[u8],
        logo: &[u8],
        icon: &[u8],
        sound: &[u8],
    ) -> Result<Self> {
        let drc_tex = Image::from_tga(drc)?;
        let tv_tex = Image::from_tga(tv)?;
        let logo_tex = Image::from_tga(logo)?;
        let icon_tex = Image::from_tga(icon)?;
        let boot_sound = Sound::from_btsnd(sound)?;
        Ok(Self {
            drc_tex,
            tv_tex,
            logo_tex,
            icon_tex,
            boot_sound,
            dirty: false,
        })
    }

    pub fn drc_tex(&self) -> &Image {
        &self.drc_tex
    }

    pub fn tv_tex(&self) -> &Image {
        &self.tv_tex
    }

    pub fn logo_tex(&self) -> &Image {
        &self.logo_tex
    }

    pub fn icon_tex(&self) -> &Image {
        &self.icon_tex
    }

    pub fn sound(&self) -> &Sound {
        &self.boot_sound
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn replace_drc_tex(&mut self, image: Image) -> Result<()> {
        check_dimensions(&self.drc_tex, &image)?;
        self.drc_tex = image;
        self.dirty = true;
        Ok(())
    }

    pub fn replace_tv_tex(&mut self, image: Image) -> Result<()> {
        check_dimensions(&self.tv_tex, &image)?;
        self.tv_tex = image;
        self.dirty = true;
        Ok(())
    }

    pub fn replace_logo_tex(&mut self, image: Image) -> Result<()> {
        check_dimensions(&self.logo_tex, &image)?;
        self.logo_tex = image;
        self.dirty = true;
        Ok(())
    }

    pub fn replace_icon_tex(&mut self, image: Image) -> Result<()> {
        check_dimensions(&self.icon_tex, &image)?;
        self.icon_tex = image;
        self.dirty = true;
        Ok(())
    }

    pub fn replace_sound(&mut self, sound: Sound) {
        self.boot_sound = sound;
        self.dirty = true;
    }

    pub fn set_loop_sample(&mut self, sample: usize) {
        self.boot_sound.set_loop_sample(sample);
        self.dirty = true;
    }

    pub fn set_target(&mut self, target: SoundTarget) {
        self.boot_sound.set_target(target);
        self.dirty = true;
    }

    pub(crate) fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}

fn check_dimensions(current: &Image, replacement: &Image) -> Result<()> {
    if current.width() != replacement.width() || current.height() != replacement.height() {
        return Err(Error::SizeMismatch {
            expected_width: current.width(),
            expected_height: current.height(),
            actual_width: replacement.width(),
            actual_height: replacement.height(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::TgaDepth;
    use crate::sound::SoundError;

    fn tga(width: u32, height: u32) -> Vec<u8> {
        let pixels = vec![0x55u8; (width * height * 4) as usize];
        Image::from_rgba(width, height, pixels).to_tga(TgaDepth::Bpp32)
    }

    fn btsnd() -> Vec<u8> {
        let mut data = vec![0u8; 8];
        data[3] = 2; // target Both
        data.extend_from_slice(&[0u8; 16]);
        data
    }

    #[test]
    fn test_from_files_starts_clean() {
        let meta = TitleMeta::from_files(&tga(2, 2), &tga(2, 2), &tga(2, 2), &tga(2, 2), &btsnd())
            .unwrap();
        assert!(!meta.is_dirty());
        assert_eq!(meta.sound().sample_count(), 4);
    }

    #[test]
    fn test_from_files_first_error_wins() {
        let err = TitleMeta::from_files(&tga(2, 2), b"junk", b"junk", &tga(2, 2), b"junk")
            .unwrap_err();
        assert!(matches!(err, Error::Image(_)));

        let err = TitleMeta::from_files(&tga(2, 2), &tga(2, 2), &tga(2, 2), &tga(2, 2), b"junk")
            .unwrap_err();
        assert!(matches!(err, Error::Sound(SoundError::InvalidBtsnd)));
    }

    #[test]
    fn test_replace_checks_dimensions() {
        let mut meta =
            TitleMeta::from_files(&tga(4, 2), &tga(2, 2), &tga(2, 2), &tga(2, 2), &btsnd())
                .unwrap();

        let wrong = Image::from_rgba(2, 2, vec![0; 16]);
        assert!(matches!(
            meta.replace_drc_tex(wrong),
            Err(Error::SizeMismatch { .. })
        ));
        assert!(!meta.is_dirty());

        let right = Image::from_rgba(4, 2, vec![0; 32]);
        meta.replace_drc_tex(right).unwrap();
        assert!(meta.is_dirty());
    }

    #[test]
    fn test_scalar_edits_mark_dirty() {
        let mut meta =
            TitleMeta::from_files(&tga(2, 2), &tga(2, 2), &tga(2, 2), &tga(2, 2), &btsnd())
                .unwrap();
        meta.set_loop_sample(3);
        assert!(meta.is_dirty());

        meta.clear_dirty();
        meta.set_target(SoundTarget::Tv);
        assert!(meta.is_dirty());
    }
}
