//! Batch signing.
//!
//! Documents are signed one at a time in input order. A failure on one
//! document is recorded and the batch moves on; cancelling the destination
//! prompt stops the remaining batch. Documents already signed stay signed.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::builder::{PageSource, RectangleSelector, SignatureRequestBuilder, StampSource};
use super::clock::Clock;
use super::identity::{
    CertificateIdentity, CertificateLoader, ExpiredCertificateWarning, Pkcs12Decoder,
};
use super::types::{SigningOptions, SigningOutcome};
use crate::config::SignerConfig;
use crate::error::{Error, Result};

/// External CMS/PDF signing primitive.
///
/// Returns the incremental-update bytes to append to `document`.
pub trait SigningPrimitive {
    /// Sign `document` with `identity` as described by `options`.
    fn sign(
        &self,
        document: &[u8],
        options: &SigningOptions,
        identity: &CertificateIdentity,
    ) -> Result<Vec<u8>>;
}

/// Save-path prompt.
pub trait DestinationPrompt {
    /// Ask where to write the signed copy of `source`; `None` if cancelled.
    fn choose(&mut self, source: &Path, suggested: &Path) -> Option<PathBuf>;
}

/// Confirmation for signing with an expired certificate.
pub trait ExpiryConfirmation {
    /// Return `true` to continue signing despite `warning`.
    fn confirm_expired(&mut self, warning: &ExpiredCertificateWarning) -> bool;
}

/// User-facing collaborators that can block the batch.
pub struct Interaction<'a> {
    /// Save-path prompt
    pub destination: &'a mut dyn DestinationPrompt,
    /// Stamp placement surface
    pub selector: &'a mut dyn RectangleSelector,
    /// Expired-certificate confirmation
    pub expiry: &'a mut dyn ExpiryConfirmation,
}

/// One Sign or Certify invocation.
#[derive(Debug, Clone)]
pub struct SignRequest<'a> {
    /// PKCS#12 container bytes
    pub container: &'a [u8],
    /// Container password (may be empty)
    pub password: &'a str,
    /// Source documents, one path per line
    pub documents: &'a str,
    /// Certifying instead of approval signatures
    pub certify: bool,
}

/// How a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    /// Every document was attempted
    Completed,
    /// A destination prompt was cancelled
    DestinationAborted,
    /// The expired-certificate warning was declined
    ExpiryDeclined,
}

/// Result of a batch.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// How the batch ended
    pub status: BatchStatus,
    /// Outcomes of attempted documents, in input order
    pub outcomes: Vec<SigningOutcome>,
    /// Documents never attempted
    pub skipped: Vec<PathBuf>,
}

impl BatchReport {
    /// Number of documents written successfully.
    pub fn signed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.success).count()
    }

    /// Outcomes of failed documents.
    pub fn failures(&self) -> impl Iterator<Item = &SigningOutcome> {
        self.outcomes.iter().filter(|o| !o.success)
    }
}

/// Drives signing over a list of documents.
pub struct BatchSigner<'a> {
    decoder: &'a dyn Pkcs12Decoder,
    pages: &'a dyn PageSource,
    primitive: &'a dyn SigningPrimitive,
    clock: &'a dyn Clock,
}

impl<'a> BatchSigner<'a> {
    /// Create a batch signer from its non-interactive collaborators.
    pub fn new(
        decoder: &'a dyn Pkcs12Decoder,
        pages: &'a dyn PageSource,
        primitive: &'a dyn SigningPrimitive,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            decoder,
            pages,
            primitive,
            clock,
        }
    }

    /// Sign every document of `request`.
    ///
    /// Returns `Err` only for failures before the first document: a container
    /// that cannot be opened, or an unreadable stamp profile. Everything after
    /// that is reported per document in the [`BatchReport`].
    pub fn run(
        &self,
        request: &SignRequest<'_>,
        config: &SignerConfig,
        ui: Interaction<'_>,
    ) -> Result<BatchReport> {
        let documents = parse_document_list(request.documents);
        let identity =
            CertificateLoader::new(self.decoder).load(request.container, request.password)?;

        if let Some(warning) = identity.expiry_warning(self.clock.now()) {
            log::warn!("{}", warning);
            if !ui.expiry.confirm_expired(&warning) {
                log::info!("Signing cancelled: expired certificate not confirmed");
                return Ok(BatchReport {
                    status: BatchStatus::ExpiryDeclined,
                    outcomes: Vec::new(),
                    skipped: documents,
                });
            }
        }

        let stamp = StampSource::resolve(config)?;
        let builder = SignatureRequestBuilder::new(config, &stamp, self.pages, self.clock);

        log::info!(
            "Signing {} document(s){}",
            documents.len(),
            if request.certify { " (certify)" } else { "" }
        );

        let mut outcomes = Vec::with_capacity(documents.len());
        for (i, source) in documents.iter().enumerate() {
            let suggested = default_signed_path(source);
            let dest = match ui.destination.choose(source, &suggested) {
                Some(dest) => dest,
                None => {
                    let err = Error::DestinationAborted {
                        source_path: source.clone(),
                    };
                    log::warn!(
                        "{}, skipping the remaining {} document(s)",
                        err,
                        documents.len() - i
                    );
                    return Ok(BatchReport {
                        status: BatchStatus::DestinationAborted,
                        outcomes,
                        skipped: documents[i..].to_vec(),
                    });
                },
            };

            let signed = self.sign_one(
                &builder,
                source,
                &dest,
                &identity,
                request.certify,
                &mut *ui.selector,
            );
            let outcome = match signed {
                Ok(()) => {
                    log::info!("Signed {} -> {}", source.display(), dest.display());
                    SigningOutcome::succeeded(source.clone(), dest)
                },
                Err(e) => {
                    log::error!("Failed to sign {}: {}", source.display(), e);
                    SigningOutcome::failed(source.clone(), dest, &e)
                },
            };
            outcomes.push(outcome);
        }

        let report = BatchReport {
            status: BatchStatus::Completed,
            outcomes,
            skipped: Vec::new(),
        };
        log::info!(
            "Batch finished: {} signed, {} failed",
            report.signed_count(),
            report.failures().count()
        );
        Ok(report)
    }

    fn sign_one(
        &self,
        builder: &SignatureRequestBuilder<'_>,
        source: &Path,
        dest: &Path,
        identity: &CertificateIdentity,
        certify: bool,
        selector: &mut dyn RectangleSelector,
    ) -> Result<()> {
        let options = builder.build(source, certify, selector)?;
        let document = fs::read(source)?;

        let signature = self
            .primitive
            .sign(&document, &options, identity)
            .map_err(|e| match e {
                Error::SigningPrimitive(_) => e,
                other => Error::SigningPrimitive(other.to_string()),
            })?;

        // Incremental update: the source bytes are never rewritten.
        let mut out = BufWriter::new(File::create(dest)?);
        out.write_all(&document)?;
        out.write_all(&signature)?;
        out.flush()?;
        Ok(())
    }
}

/// Non-blank lines of `text`, trimmed, in order.
pub fn parse_document_list(text: &str) -> Vec<PathBuf> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect()
}

/// Suggested destination for the signed copy of `source`.
///
/// A `.pdf` suffix (any case) is replaced by `-signed.pdf`; any other name
/// gets `-signed.pdf` appended unchanged.
pub fn default_signed_path(source: &Path) -> PathBuf {
    let stem = source.to_str().and_then(|s| {
        s.len()
            .checked_sub(4)
            .filter(|&i| s.is_char_boundary(i) && s[i..].eq_ignore_ascii_case(".pdf"))
            .map(|i| &s[..i])
    });

    match stem {
        Some(stem) => PathBuf::from(format!("{}-signed.pdf", stem)),
        None => {
            let mut name = source.as_os_str().to_os_string();
            name.push("-signed.pdf");
            PathBuf::from(name)
        },
    }
}
