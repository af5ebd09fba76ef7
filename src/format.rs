use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    Jpeg,
    Png,
    Webp,
    Avif,
}

impl TargetFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "JPEG",
            TargetFormat::Png => "PNG",
            TargetFormat::Webp => "WEBP",
            TargetFormat::Avif => "AVIF",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Jpeg => "jpeg",
            TargetFormat::Png => "png",
            TargetFormat::Webp => "webp",
            TargetFormat::Avif => "avif",
        }
    }

    pub fn all() -> [TargetFormat; 4] {
        [
            TargetFormat::Jpeg,
            TargetFormat::Png,
            TargetFormat::Webp,
            TargetFormat::Avif,
        ]
    }

    /// Maps a MIME type such as `image/jpeg` onto a target format.
    ///
    /// Only the subtype is inspected. Source types with no matching target
    /// (`image/gif`, for example) return `None`.
    pub fn from_mime(mime: &str) -> Option<TargetFormat> {
        let subtype = mime.split('/').nth(1)?;
        match subtype.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Some(TargetFormat::Jpeg),
            "png" => Some(TargetFormat::Png),
            "webp" => Some(TargetFormat::Webp),
            "avif" => Some(TargetFormat::Avif),
            _ => None,
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
