//! Farm vocabulary: soil types and the preferred-crops list format.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;

pub const CROP_SEPARATOR: char = ',';
pub const CROP_DISPLAY_SEPARATOR: &str = ", ";

/// Suggestions shown next to the crops input.
pub const COMMON_CROPS: &[&str] = &[
    "Wheat",
    "Rice",
    "Maize",
    "Cotton",
    "Soybean",
    "Potato",
    "Tomato",
    "Sugarcane",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoilType {
    Alluvial,
    Black,
    Red,
    Laterite,
    Mountain,
    Desert,
    Peaty,
    Saline,
}

impl SoilType {
    pub const ALL: [Self; 8] = [
        Self::Alluvial,
        Self::Black,
        Self::Red,
        Self::Laterite,
        Self::Mountain,
        Self::Desert,
        Self::Peaty,
        Self::Saline,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alluvial => "Alluvial",
            Self::Black => "Black",
            Self::Red => "Red",
            Self::Laterite => "Laterite",
            Self::Mountain => "Mountain",
            Self::Desert => "Desert",
            Self::Peaty => "Peaty",
            Self::Saline => "Saline",
        }
    }

    /// Reads the stored form, where the empty string means "not chosen".
    pub fn from_stored(s: &str) -> Result<Option<Self>, UnknownSoilType> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        trimmed.parse().map(Some)
    }

    #[must_use]
    pub fn to_stored(soil: Option<Self>) -> String {
        soil.map(Self::as_str).unwrap_or_default().to_string()
    }
}

impl fmt::Display for SoilType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown soil type: {0:?}")]
pub struct UnknownSoilType(pub String);

impl FromStr for SoilType {
    type Err = UnknownSoilType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|soil| soil.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownSoilType(s.to_string()))
    }
}

/// Splits the comma-separated crops buffer into the ordered crop list.
///
/// Entries are trimmed and blank entries dropped, so `"Wheat, Rice,"` gives
/// `["Wheat", "Rice"]` and an empty buffer clears the list.
#[must_use]
pub fn parse_crop_list(input: &str) -> Vec<String> {
    input
        .split(CROP_SEPARATOR)
        .map(str::trim)
        .filter(|crop| !crop.is_empty())
        .map(String::from)
        .collect()
}

#[must_use]
pub fn format_crop_list(crops: &[String]) -> String {
    crops.join(CROP_DISPLAY_SEPARATOR)
}
