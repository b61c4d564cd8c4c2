//! Title identity and remote path conventions.

use std::fmt;

pub const BOOT_DRC_TEX: &str = "bootDrcTex.tga";
pub const BOOT_TV_TEX: &str = "bootTvTex.tga";
pub const BOOT_LOGO_TEX: &str = "bootLogoTex.tga";
pub const ICON_TEX: &str = "iconTex.tga";
pub const BOOT_SOUND: &str = "bootSound.btsnd";
pub const TITLE_INFO: &str = "meta.xml";

/// The five files a metadata bundle is parsed from, in fetch order.
pub const META_FILES: [&str; 5] = [
    BOOT_DRC_TEX,
    BOOT_TV_TEX,
    BOOT_LOGO_TEX,
    ICON_TEX,
    BOOT_SOUND,
];

/// The six files carried by backup archives.
pub const BACKUP_FILES: [&str; 6] = [
    BOOT_DRC_TEX,
    BOOT_TV_TEX,
    BOOT_LOGO_TEX,
    ICON_TEX,
    BOOT_SOUND,
    TITLE_INFO,
];

/// High directory holding DLC content; those titles carry no editable
/// boot metadata and are skipped during enumeration.
pub(crate) const DLC_HIGH_DIR: &str = "0005000c";

/// Where a title is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Storage {
    Usb,
    Mlc,
}

impl Storage {
    /// First path component of the remote filesystem for this storage.
    pub fn root(self) -> &'static str {
        match self {
            Storage::Usb => "storage_usb",
            Storage::Mlc => "storage_mlc",
        }
    }

    /// Short tag used in archive entry paths and CLI arguments.
    pub fn tag(self) -> &'static str {
        match self {
            Storage::Usb => "usb",
            Storage::Mlc => "mlc",
        }
    }
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Storage::Usb => write!(f, "USB"),
            Storage::Mlc => write!(f, "MLC"),
        }
    }
}

/// One installed title: a 16-hex-digit id plus the storage it lives on.
///
/// Produced once by enumeration and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TitleId {
    id: String,
    storage: Storage,
}

impl TitleId {
    /// Combine the two 8-hex-digit directory names into a title id.
    pub fn new(high: &str, low: &str, storage: Storage) -> Self {
        Self {
            id: format!("{high}{low}"),
            storage,
        }
    }

    /// Parse a full 16-hex-digit id, e.g. from a CLI argument.
    pub fn from_hex(id: &str, storage: Storage) -> Option<Self> {
        if id.len() != 16 || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        Some(Self {
            id: id.to_ascii_lowercase(),
            storage,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn storage(&self) -> Storage {
        self.storage
    }

    pub fn high(&self) -> &str {
        &self.id[..8]
    }

    pub fn low(&self) -> &str {
        &self.id[8..]
    }

    /// Remote path of one file in this title's metadata directory.
    pub fn meta_path(&self, filename: &str) -> String {
        format!(
            "/{}/usr/title/{}/{}/meta/{}",
            self.storage.root(),
            self.high(),
            self.low(),
            filename
        )
    }

    /// Directory prefix of this title's entries inside a backup archive.
    pub fn archive_dir(&self) -> String {
        format!("{}_{}", self.storage.tag(), self.id)
    }
}

impl fmt::Display for TitleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.storage.tag(), self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_path_convention() {
        let id = TitleId::new("00050000", "101c9500", Storage::Mlc);
        assert_eq!(
            id.meta_path(BOOT_SOUND),
            "/storage_mlc/usr/title/00050000/101c9500/meta/bootSound.btsnd"
        );
    }

    #[test]
    fn test_archive_dir_convention() {
        let id = TitleId::new("00050000", "101c9500", Storage::Usb);
        assert_eq!(id.archive_dir(), "usb_00050000101c9500");
    }

    #[test]
    fn test_from_hex_validation() {
        assert!(TitleId::from_hex("00050000101c9500", Storage::Mlc).is_some());
        assert!(TitleId::from_hex("00050000101C9500", Storage::Mlc).is_some());
        assert!(TitleId::from_hex("00050000101c950", Storage::Mlc).is_none());
        assert!(TitleId::from_hex("00050000101c950g", Storage::Mlc).is_none());
    }

    #[test]
    fn test_equality_uses_both_fields() {
        let a = TitleId::new("00050000", "101c9500", Storage::Mlc);
        let b = TitleId::new("00050000", "101c9500", Storage::Usb);
        assert_ne!(a, b);
    }
}
