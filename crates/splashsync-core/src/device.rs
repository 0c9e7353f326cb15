// splashsync Device Images
//
// 장치가 상태별로 화면에 띄우는 스플래시 이미지 (고정 경로)

use std::fmt;
use std::str::FromStr;

pub const IMAGE_DIR: &str = "/usr/share/remarkable";

/// 장치는 PNG 만 표시할 수 있음
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

pub fn is_png(data: &[u8]) -> bool {
    data.starts_with(&PNG_SIGNATURE)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceImage {
    PowerOff,
    BatteryEmpty,
    Rebooting,
    Sleeping,
    Suspended,
}

impl DeviceImage {
    pub const ALL: [DeviceImage; 5] = [
        DeviceImage::PowerOff,
        DeviceImage::BatteryEmpty,
        DeviceImage::Rebooting,
        DeviceImage::Sleeping,
        DeviceImage::Suspended,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            DeviceImage::PowerOff     => "poweroff.png",
            DeviceImage::BatteryEmpty => "batteryempty.png",
            DeviceImage::Rebooting    => "rebooting.png",
            DeviceImage::Sleeping     => "sleeping.png",
            DeviceImage::Suspended    => "suspended.png",
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            DeviceImage::PowerOff     => "/usr/share/remarkable/poweroff.png",
            DeviceImage::BatteryEmpty => "/usr/share/remarkable/batteryempty.png",
            DeviceImage::Rebooting    => "/usr/share/remarkable/rebooting.png",
            DeviceImage::Sleeping     => "/usr/share/remarkable/sleeping.png",
            DeviceImage::Suspended    => "/usr/share/remarkable/suspended.png",
        }
    }

    /// "suspended.png" 또는 "suspended" 모두 허용
    pub fn from_file_name(name: &str) -> Option<Self> {
        let stem = name.strip_suffix(".png").unwrap_or(name);
        Self::ALL
            .into_iter()
            .find(|img| img.file_name().strip_suffix(".png") == Some(stem))
    }
}

impl fmt::Display for DeviceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

impl FromStr for DeviceImage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_file_name(s).ok_or_else(|| format!("Unknown device image: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_live_in_the_image_dir() {
        for img in DeviceImage::ALL {
            assert_eq!(img.path(), format!("{}/{}", IMAGE_DIR, img.file_name()));
        }
    }

    #[test]
    fn parses_with_or_without_extension() {
        assert_eq!(DeviceImage::from_file_name("suspended.png"), Some(DeviceImage::Suspended));
        assert_eq!("batteryempty".parse::<DeviceImage>(), Ok(DeviceImage::BatteryEmpty));
        assert!("splash.png".parse::<DeviceImage>().is_err());
    }

    #[test]
    fn png_signature_is_required() {
        assert!(is_png(b"\x89PNG\r\n\x1a\n rest of image"));
        assert!(!is_png(b"\x89PNG"));
        assert!(!is_png(b"plain text notes"));
        assert!(!is_png(b""));
    }
}
