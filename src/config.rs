//! Signing configuration and the persisted user-defaults store.
//!
//! [`SignerConfig`] is an immutable value built once per batch and threaded
//! into the request builder. [`SettingsStore`] is the flat key/value file it
//! is sourced from: read at startup, written back at shutdown.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::signatures::DigestAlgorithm;
use crate::stamp::{DisplayField, Rgb, StampAppearance};

const KEY_CERT_PATH: &str = "cert-path";
const KEY_STAMP_PATH: &str = "stamp-path";
const KEY_DRAW_STAMP: &str = "draw-stamp";
const KEY_CONTACT: &str = "signature-contact";
const KEY_LOCATION: &str = "signature-location";
const KEY_REASON: &str = "signature-reason";
const KEY_DIGEST: &str = "signature-digest";
const KEY_STAMP_BACKGROUND: &str = "stamp-background";
const KEY_STAMP_OUTLINE: &str = "stamp-outline";
const KEY_STAMP_BORDER: &str = "stamp-border";
const KEY_STAMP_LABELS: &str = "stamp-labels";
const KEY_LAST_DIR: &str = "last-dir";

/// Default stamp look used when a profile carries no appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct StampDefaults {
    /// Outline colour
    pub outline: Rgb,
    /// Fill colour
    pub background: Option<Rgb>,
    /// Border width
    pub border: u32,
    /// Fields drawn inside the stamp
    pub display: Vec<DisplayField>,
}

impl Default for StampDefaults {
    fn default() -> Self {
        Self {
            outline: [0.0, 0.0, 0.0],
            background: None,
            border: 1,
            display: vec![DisplayField::CommonName, DisplayField::Date],
        }
    }
}

impl StampDefaults {
    /// Build the appearance these defaults describe.
    pub fn appearance(&self) -> StampAppearance {
        StampAppearance {
            outline_color: self.outline,
            background_color: self.background,
            border_width: self.border,
            labels: true,
            display: self.display.clone(),
            icon_path: None,
            extra: serde_json::Map::new(),
        }
    }
}

/// Configuration shared by every document of one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SignerConfig {
    /// Contact information written into each signature
    pub contact: String,
    /// Signing location
    pub location: String,
    /// Reason for signing
    pub reason: String,
    /// Draw a visible stamp
    pub draw_stamp: bool,
    /// Stamp image or `.stampinfo` profile
    pub stamp_path: Option<PathBuf>,
    /// Last used certificate container
    pub certificate_path: Option<PathBuf>,
    /// Directory of the last signed document
    pub last_dir: Option<PathBuf>,
    /// Stamp appearance defaults
    pub stamp: StampDefaults,
    /// Message digest for the signature
    pub digest_algorithm: DigestAlgorithm,
}

impl SignerConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the contact information.
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = contact.into();
        self
    }

    /// Set the signing location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Set the reason for signing.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Enable or disable the visible stamp.
    pub fn with_draw_stamp(mut self, enable: bool) -> Self {
        self.draw_stamp = enable;
        self
    }

    /// Set the stamp image or profile path.
    pub fn with_stamp_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.stamp_path = Some(path.into());
        self
    }

    /// Set the message digest.
    pub fn with_digest_algorithm(mut self, algorithm: DigestAlgorithm) -> Self {
        self.digest_algorithm = algorithm;
        self
    }

    /// Set the stamp appearance defaults.
    pub fn with_stamp_defaults(mut self, stamp: StampDefaults) -> Self {
        self.stamp = stamp;
        self
    }
}

/// Persisted user defaults, stored as a flat JSON object of strings.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    path: Option<PathBuf>,
    values: BTreeMap<String, String>,
}

impl SettingsStore {
    /// Default location under the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pdf-signet").join("settings.json"))
    }

    /// Load from the default location, or start empty if there is none.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Load the store at `path`. A missing file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            log::debug!("No settings at {}, using defaults", path.display());
            BTreeMap::new()
        };
        Ok(Self {
            path: Some(path),
            values,
        })
    }

    /// Raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Set a raw value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Build the signing configuration these settings describe.
    pub fn to_config(&self) -> Result<SignerConfig> {
        let mut config = SignerConfig::new();

        if let Some(v) = self.get(KEY_CONTACT) {
            config.contact = v.to_string();
        }
        if let Some(v) = self.get(KEY_LOCATION) {
            config.location = v.to_string();
        }
        if let Some(v) = self.get(KEY_REASON) {
            config.reason = v.to_string();
        }
        if let Some(v) = self.get(KEY_DIGEST) {
            config.digest_algorithm = v
                .parse()
                .map_err(|e| Error::Config(format!("{}: {}", KEY_DIGEST, e)))?;
        }
        config.draw_stamp = self.get(KEY_DRAW_STAMP) == Some("1");
        config.stamp_path = self.non_empty_path(KEY_STAMP_PATH);
        config.certificate_path = self.non_empty_path(KEY_CERT_PATH);
        config.last_dir = self.non_empty_path(KEY_LAST_DIR);

        if let Some(v) = self.get(KEY_STAMP_BACKGROUND) {
            config.stamp.background = Some(parse_rgb(KEY_STAMP_BACKGROUND, v)?);
        }
        if let Some(v) = self.get(KEY_STAMP_OUTLINE) {
            config.stamp.outline = parse_rgb(KEY_STAMP_OUTLINE, v)?;
        }
        if let Some(v) = self.get(KEY_STAMP_BORDER) {
            config.stamp.border = v.trim().parse().map_err(|_| {
                Error::Config(format!(
                    "{}: expected a non-negative integer, got '{}'",
                    KEY_STAMP_BORDER, v
                ))
            })?;
        }
        if let Some(v) = self.get(KEY_STAMP_LABELS) {
            config.stamp.display = v
                .split(',')
                .map(|s| s.parse::<DisplayField>())
                .collect::<Result<Vec<_>>>()
                .map_err(|e| Error::Config(format!("{}: {}", KEY_STAMP_LABELS, e)))?;
        }

        Ok(config)
    }

    /// Record the values written back at shutdown.
    ///
    /// `last-dir` becomes the parent of `first_source`, and stays unchanged
    /// when that parent is empty.
    pub fn remember(&mut self, config: &SignerConfig, first_source: Option<&Path>) {
        self.set(KEY_CERT_PATH, path_string(config.certificate_path.as_deref()));
        self.set(KEY_STAMP_PATH, path_string(config.stamp_path.as_deref()));
        self.set(KEY_DRAW_STAMP, if config.draw_stamp { "1" } else { "0" });

        let parent = first_source
            .and_then(Path::parent)
            .filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = parent {
            self.set(KEY_LAST_DIR, dir.to_string_lossy());
        }
    }

    /// Write the store back to where it was loaded from.
    pub fn save(&self) -> Result<()> {
        let path = match self.path {
            Some(ref p) => p,
            None => return Ok(()),
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(&self.values)?;
        fs::write(path, contents)?;
        log::debug!("Saved settings to {}", path.display());
        Ok(())
    }

    fn non_empty_path(&self, key: &str) -> Option<PathBuf> {
        self.get(key).filter(|v| !v.is_empty()).map(PathBuf::from)
    }
}

fn path_string(path: Option<&Path>) -> String {
    path.map(|p| p.to_string_lossy().into_owned()).unwrap_or_default()
}

fn parse_rgb(key: &str, value: &str) -> Result<Rgb> {
    let parts = value
        .split(',')
        .map(|s| s.trim().parse::<f32>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::Config(format!("{}: {}", key, e)))?;
    match parts.as_slice() {
        [r, g, b] if parts.iter().all(|c| (0.0..=1.0).contains(c)) => Ok([*r, *g, *b]),
        _ => Err(Error::Config(format!(
            "{}: expected three comma-separated numbers in 0..1, got '{}'",
            key, value
        ))),
    }
}
