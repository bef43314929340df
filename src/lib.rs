// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::too_many_arguments)]
// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]

//! # PDF Signet
//!
//! Signing-request core for producing digitally signed PDFs from a PKCS#12
//! certificate container and an optional visible stamp.
//!
//! ## Core Features
//!
//! - **Certificate Loading**: Post-processes a decoded PKCS#12 container and
//!   warns once per batch about an expired leaf certificate
//! - **Stamp Geometry**: Converts a rectangle dragged on a page preview into
//!   PDF user-space placement
//! - **Stamp Profiles**: `.stampinfo` descriptors that replay a placement
//!   without selecting it again
//! - **Batch Signing**: Sequential signing with per-document failure
//!   isolation and append-only output
//!
//! ## Architecture
//!
//! PKCS#12 decoding, page rasterization, CMS signature generation, and every
//! user prompt are traits implemented by the presentation layer. The core is
//! synchronous and holds no state between invocations beyond the settings
//! store.
//!
//! ## Quick Start
//!
//! ```
//! use pdf_signet::geometry::{preview_to_pdf, PageSize, PreviewRect, PreviewSize};
//! use pdf_signet::stamp::StampProfile;
//!
//! // A 20x40 px box dragged on a 200x400 px preview of a 100x200 pt page
//! let rect = preview_to_pdf(
//!     &PreviewRect::new(50.0, 50.0, 20.0, 40.0),
//!     PreviewSize::new(200.0, 400.0),
//!     PageSize::new(100.0, 200.0),
//! );
//! let profile = StampProfile::new(0, rect);
//! assert_eq!(profile.to_json_string().unwrap(), r#"{"page":0,"rect":[25.0,155.0,35.0,175.0]}"#);
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration and persisted settings
pub mod config;

// Stamp placement
pub mod geometry;
pub mod stamp;

// Signing requests and batch control flow
pub mod signatures;

// Re-exports
pub use config::{SettingsStore, SignerConfig, StampDefaults};
pub use error::{Error, ErrorKind, Result};
pub use signatures::{BatchReport, BatchSigner, SigningOptions, SigningOutcome};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
