//! PDF signing requests.
//!
//! This module assembles everything an external CMS/PDF signing primitive
//! needs to sign a batch of documents, and runs the batch.
//!
//! ## Pipeline
//!
//! 1. [`CertificateLoader`] turns a PKCS#12 container and password into a
//!    [`CertificateIdentity`] once per batch, and reports an
//!    [`ExpiredCertificateWarning`] if the leaf certificate has expired.
//! 2. For each document, [`SignatureRequestBuilder`] builds fresh
//!    [`SigningOptions`] from the batch [`SignerConfig`](crate::config::SignerConfig),
//!    the stamp placement, and the clock.
//! 3. [`BatchSigner`] hands the options and identity to the
//!    [`SigningPrimitive`] and appends the returned bytes to the original
//!    document (incremental update).
//!
//! ## Example
//!
//! ```ignore
//! use pdf_signet::config::SettingsStore;
//! use pdf_signet::signatures::{BatchSigner, Interaction, SignRequest, SystemClock};
//!
//! let settings = SettingsStore::load_default()?;
//! let config = settings.to_config()?;
//! let signer = BatchSigner::new(&decoder, &rasterizer, &cms_signer, &SystemClock);
//! let report = signer.run(
//!     &SignRequest { container: &p12, password: "secret", documents: "a.pdf\nb.pdf", certify: false },
//!     &config,
//!     Interaction { destination: &mut save_dialog, selector: &mut preview, expiry: &mut message_box },
//! )?;
//! ```
//!
//! ## PDF Specification Reference
//!
//! - ISO 32000-1:2008 Section 12.8 - Digital Signatures
//! - ISO 32000-1:2008 Section 7.5.6 - Incremental Updates

mod batch;
mod builder;
mod clock;
mod identity;
mod types;

pub use batch::{
    default_signed_path, parse_document_list, BatchReport, BatchSigner, BatchStatus,
    DestinationPrompt, ExpiryConfirmation, Interaction, SignRequest, SigningPrimitive,
};
pub use builder::{PageSource, RectangleSelector, Selection, SignatureRequestBuilder, StampSource};
pub use clock::{Clock, SystemClock};
pub use identity::{
    CertificateIdentity, CertificateLoader, DecodedContainer, ExpiredCertificateWarning,
    Pkcs12Decoder,
};
pub use types::{
    format_pdf_date, sig_field_name, DigestAlgorithm, SigningOptions, SigningOutcome, FIELD_FLAGS,
    SIG_FIELD_PREFIX, SIG_FLAGS,
};
