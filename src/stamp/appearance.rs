//! Visible stamp appearance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

/// An RGB colour with components in `0.0..=1.0`.
pub type Rgb = [f32; 3];

/// A field rendered as a text line inside the stamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayField {
    /// Certificate subject common name
    #[serde(rename = "CN")]
    CommonName,
    /// Certificate subject distinguished name
    #[serde(rename = "DN")]
    DistinguishedName,
    /// Signing date
    #[serde(rename = "date")]
    Date,
    /// Contact information
    #[serde(rename = "contact")]
    Contact,
    /// Reason for signing
    #[serde(rename = "reason")]
    Reason,
    /// Signing location
    #[serde(rename = "location")]
    Location,
}

impl DisplayField {
    /// The name used in stamp profiles and settings.
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayField::CommonName => "CN",
            DisplayField::DistinguishedName => "DN",
            DisplayField::Date => "date",
            DisplayField::Contact => "contact",
            DisplayField::Reason => "reason",
            DisplayField::Location => "location",
        }
    }
}

impl FromStr for DisplayField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "CN" => Ok(DisplayField::CommonName),
            "DN" => Ok(DisplayField::DistinguishedName),
            "date" => Ok(DisplayField::Date),
            "contact" => Ok(DisplayField::Contact),
            "reason" => Ok(DisplayField::Reason),
            "location" => Ok(DisplayField::Location),
            other => Err(Error::Config(format!("unknown stamp label '{}'", other))),
        }
    }
}

impl fmt::Display for DisplayField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appearance of a visible signature stamp.
///
/// Serialized as the `signature_appearance` object of a stamp profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampAppearance {
    /// Outline colour
    #[serde(rename = "outline")]
    pub outline_color: Rgb,
    /// Fill colour, transparent when absent
    #[serde(rename = "background", default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<Rgb>,
    /// Border width
    #[serde(rename = "border")]
    pub border_width: u32,
    /// Whether field labels are drawn
    pub labels: bool,
    /// Fields drawn inside the stamp, in order
    pub display: Vec<DisplayField>,
    /// Stamp image
    #[serde(rename = "icon", default, skip_serializing_if = "Option::is_none")]
    pub icon_path: Option<PathBuf>,
    /// Keys this crate does not interpret (e.g. `text`), passed to the signer as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Default for StampAppearance {
    fn default() -> Self {
        Self {
            outline_color: [0.0, 0.0, 0.0],
            background_color: None,
            border_width: 1,
            labels: true,
            display: vec![DisplayField::CommonName, DisplayField::Date],
            icon_path: None,
            extra: serde_json::Map::new(),
        }
    }
}

impl StampAppearance {
    /// Use a stamp image.
    pub fn with_icon(mut self, path: impl Into<PathBuf>) -> Self {
        self.icon_path = Some(path.into());
        self
    }

    /// Check colour ranges.
    pub fn validate(&self) -> Result<()> {
        check_color("outline", &self.outline_color)?;
        if let Some(ref bg) = self.background_color {
            check_color("background", bg)?;
        }
        Ok(())
    }
}

fn check_color(name: &str, color: &Rgb) -> Result<()> {
    if color.iter().all(|c| (0.0..=1.0).contains(c)) {
        Ok(())
    } else {
        Err(Error::InvalidProfile(format!(
            "{} colour components must lie in 0..1, got {:?}",
            name, color
        )))
    }
}
