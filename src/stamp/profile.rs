//! Stamp profile (`.stampinfo`) persistence.
//!
//! A profile records where a stamp goes so later documents can be signed
//! without selecting a rectangle again:
//!
//! ```json
//! {"rect": [25.0, 155.0, 35.0, 175.0], "page": 0,
//!  "signature_appearance": {"outline": [0, 0, 0], "border": 1,
//!                           "labels": true, "display": ["CN", "date"]}}
//! ```
//!
//! The rect is stored in the user space of the page it was computed for.
//! Nothing checks that a later document's page has the same dimensions.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::appearance::StampAppearance;
use crate::error::{Error, Result};
use crate::geometry::PdfRect;

/// File extension that marks a stamp path as a profile.
pub const PROFILE_EXTENSION: &str = "stampinfo";

/// Reusable stamp placement and appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampProfile {
    /// Page the stamp goes on (0-indexed)
    #[serde(rename = "page", default)]
    pub page_index: usize,
    /// Placement in PDF user space
    pub rect: PdfRect,
    /// Appearance; configured defaults apply when absent
    #[serde(
        rename = "signature_appearance",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub appearance: Option<StampAppearance>,
}

impl StampProfile {
    /// Create a profile without an explicit appearance.
    pub fn new(page_index: usize, rect: PdfRect) -> Self {
        Self {
            page_index,
            rect,
            appearance: None,
        }
    }

    /// Attach an appearance.
    pub fn with_appearance(mut self, appearance: StampAppearance) -> Self {
        self.appearance = Some(appearance);
        self
    }

    /// Parse a profile descriptor.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let profile: StampProfile = serde_json::from_str(json)
            .map_err(|e| Error::InvalidProfile(e.to_string()))?;
        if let Some(ref appearance) = profile.appearance {
            appearance.validate()?;
        }
        Ok(profile)
    }

    /// Load a profile from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let profile = Self::from_json_str(&contents)?;
        log::debug!("Loaded stamp profile {}: {:?}", path.display(), profile);
        Ok(profile)
    }

    /// Serialize as a single-line descriptor.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Write the profile to disk.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// True when `path` names a profile file rather than a stamp image.
    ///
    /// Matches on the file name suffix, so a file named just `.stampinfo`
    /// counts too.
    pub fn is_profile_path(path: &Path) -> bool {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_suffix(PROFILE_EXTENSION))
            .is_some_and(|stem| stem.ends_with('.'))
    }
}
