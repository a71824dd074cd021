use std::ffi::OsStr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Package family a run was uploaded as.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Platform {
    /// iOS application archive (`.ipa`, `.app`).
    Ipa,
    /// Android package or bundle (`.apk`, `.aab`, `.abb`).
    Apk,
}

impl Platform {
    /// Maps a file extension (without the dot, any case) to a platform.
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_ascii_lowercase().as_str() {
            "ipa" | "app" => Some(Self::Ipa),
            "apk" | "aab" | "abb" => Some(Self::Apk),
            _ => None,
        }
    }

    /// Canonical lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ipa => "ipa",
            Self::Apk => "apk",
        }
    }
}

/// Returns the lowercased extension of a file name, if it has one.
#[must_use]
pub fn package_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(OsStr::to_str)
        .filter(|extension| !extension.is_empty())
        .map(str::to_ascii_lowercase)
}
