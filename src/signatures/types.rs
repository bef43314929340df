//! Digital signature types and data structures.
//!
//! This module defines the request handed to the signing primitive and the
//! per-document outcome recorded by the batch.

use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, ErrorKind};
use crate::geometry::PdfRect;
use crate::stamp::StampAppearance;

/// Prefix of every generated signature field name.
pub const SIG_FIELD_PREFIX: &str = "Signature-";

/// `/SigFlags` of the AcroForm: SignaturesExist | AppendOnly.
pub const SIG_FLAGS: u32 = 3;

/// `/F` annotation flags of the signature widget: Print | Locked.
pub const FIELD_FLAGS: u32 = 132;

/// Digest algorithm used for signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DigestAlgorithm {
    /// SHA-1 (deprecated, but still common in legacy PDFs)
    Sha1,
    /// SHA-256 (recommended)
    #[default]
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

impl DigestAlgorithm {
    /// Get the name of this algorithm as signing libraries spell it.
    pub fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha256 => "sha256",
            DigestAlgorithm::Sha384 => "sha384",
            DigestAlgorithm::Sha512 => "sha512",
        }
    }
}

impl FromStr for DigestAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(DigestAlgorithm::Sha1),
            "sha256" => Ok(DigestAlgorithm::Sha256),
            "sha384" => Ok(DigestAlgorithm::Sha384),
            "sha512" => Ok(DigestAlgorithm::Sha512),
            _ => Err(Error::Config(format!("unsupported digest algorithm '{}'", s))),
        }
    }
}

/// Options for signing one document.
#[derive(Debug, Clone, PartialEq)]
pub struct SigningOptions {
    /// Name of the signature field added to the document
    pub sig_field_name: String,
    /// Page carrying the signature widget (0-indexed)
    pub page_index: usize,
    /// Widget rectangle; zero-sized for invisible signatures
    pub rect: PdfRect,
    /// Certifying signature (locks the document) instead of an approval one
    pub certify: bool,
    /// Contact information
    pub contact: String,
    /// Signing location
    pub location: String,
    /// Reason for signing
    pub reason: String,
    /// `D:YYYYMMDDHHMMSS+00'00'`
    pub signing_timestamp: String,
    /// Visible stamp; `None` for invisible signatures
    pub appearance: Option<StampAppearance>,
    /// Digest algorithm
    pub digest_algorithm: DigestAlgorithm,
    /// AcroForm `/SigFlags`
    pub sig_flags: u32,
    /// Widget annotation `/F` flags
    pub field_flags: u32,
}

impl SigningOptions {
    /// True when a stamp is drawn.
    pub fn is_visible(&self) -> bool {
        self.appearance.is_some() && !self.rect.is_empty()
    }

    /// DocMDP permission level for certifying signatures (1 = no changes).
    pub fn docmdp_permissions(&self) -> Option<u8> {
        if self.certify {
            Some(1)
        } else {
            None
        }
    }

    /// Build the signature dictionary content (without /Contents and /ByteRange values).
    pub fn signature_dictionary(&self) -> String {
        let mut dict = String::new();

        dict.push_str("/Type /Sig\n");
        dict.push_str("/Filter /Adobe.PPKLite\n");
        dict.push_str("/SubFilter /adbe.pkcs7.detached\n");
        dict.push_str(&format!("/Name ({})\n", escape_pdf_string(&self.sig_field_name)));

        if !self.reason.is_empty() {
            dict.push_str(&format!("/Reason ({})\n", escape_pdf_string(&self.reason)));
        }
        if !self.location.is_empty() {
            dict.push_str(&format!("/Location ({})\n", escape_pdf_string(&self.location)));
        }
        if !self.contact.is_empty() {
            dict.push_str(&format!("/ContactInfo ({})\n", escape_pdf_string(&self.contact)));
        }

        dict.push_str(&format!("/M ({})\n", self.signing_timestamp));
        dict
    }
}

/// Unique field name derived from a sub-second UTC timestamp.
pub fn sig_field_name(now: DateTime<Utc>) -> String {
    format!(
        "{}{}.{:06}",
        SIG_FIELD_PREFIX,
        now.timestamp(),
        now.timestamp_subsec_micros()
    )
}

/// Format a time as a PDF date string in UTC.
pub fn format_pdf_date(now: DateTime<Utc>) -> String {
    now.format("D:%Y%m%d%H%M%S+00'00'").to_string()
}

/// Escape special characters in a PDF string.
fn escape_pdf_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 10);
    for c in s.chars() {
        match c {
            '\\' => result.push_str("\\\\"),
            '(' => result.push_str("\\("),
            ')' => result.push_str("\\)"),
            '\n' => result.push_str("\\n"),
            '\r' => result.push_str("\\r"),
            '\t' => result.push_str("\\t"),
            _ => result.push(c),
        }
    }
    result
}

/// Result of signing one document.
#[derive(Debug, Clone, PartialEq)]
pub struct SigningOutcome {
    /// Document that was signed
    pub source_path: PathBuf,
    /// Where the signed copy was written (or was to be written)
    pub dest_path: PathBuf,
    /// Whether the signed copy was written
    pub success: bool,
    /// Failure category
    pub error_kind: Option<ErrorKind>,
    /// Failure message
    pub error_message: Option<String>,
}

impl SigningOutcome {
    pub(crate) fn succeeded(source_path: PathBuf, dest_path: PathBuf) -> Self {
        Self {
            source_path,
            dest_path,
            success: true,
            error_kind: None,
            error_message: None,
        }
    }

    pub(crate) fn failed(source_path: PathBuf, dest_path: PathBuf, err: &crate::Error) -> Self {
        Self {
            source_path,
            dest_path,
            success: false,
            error_kind: Some(err.kind()),
            error_message: Some(err.to_string()),
        }
    }
}
