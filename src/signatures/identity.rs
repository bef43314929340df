//! Signing identity loading.
//!
//! Binary PKCS#12 parsing is done by an external [`Pkcs12Decoder`]; this
//! module post-processes its output into a [`CertificateIdentity`] and reads
//! the leaf certificate's expiry so the caller can warn once per batch.

use chrono::{DateTime, Utc};
use x509_parser::prelude::{FromDer, X509Certificate};

use crate::error::{Error, Result};

/// Raw output of a PKCS#12 decoder.
#[derive(Clone, Default)]
pub struct DecodedContainer {
    /// DER-encoded private key
    pub private_key: Vec<u8>,
    /// DER-encoded leaf certificate, if the container has one
    pub certificate: Option<Vec<u8>>,
    /// Additional certificates (DER-encoded)
    pub chain: Vec<Vec<u8>>,
}

/// Decoder for password-protected PKCS#12 containers.
///
/// Implementations return [`Error::Authentication`] for a wrong password or
/// malformed input.
pub trait Pkcs12Decoder {
    /// Decode `data` with `password` (which may be empty).
    fn decode(&self, data: &[u8], password: &str) -> Result<DecodedContainer>;
}

/// Private key, certificate, and chain for one signing invocation.
///
/// Never persisted; dropped when the batch ends.
#[derive(Clone)]
pub struct CertificateIdentity {
    /// DER-encoded private key
    pub private_key: Vec<u8>,
    /// DER-encoded leaf certificate
    pub certificate: Option<Vec<u8>>,
    /// Additional certificates (DER-encoded)
    pub chain: Vec<Vec<u8>>,
    /// Leaf `notAfter`
    pub not_after: Option<DateTime<Utc>>,
    /// Leaf subject common name
    pub subject: Option<String>,
}

impl CertificateIdentity {
    /// The expiry warning to confirm before signing, if the leaf has expired.
    pub fn expiry_warning(&self, now: DateTime<Utc>) -> Option<ExpiredCertificateWarning> {
        match self.not_after {
            Some(not_after) if not_after < now => Some(ExpiredCertificateWarning {
                subject: self.subject.clone(),
                not_after,
            }),
            _ => None,
        }
    }
}

impl std::fmt::Debug for CertificateIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertificateIdentity")
            .field("private_key", &"[REDACTED]")
            .field(
                "certificate",
                &self.certificate.as_ref().map(|c| format!("{} bytes", c.len())),
            )
            .field("chain", &format!("{} certificates", self.chain.len()))
            .field("not_after", &self.not_after)
            .field("subject", &self.subject)
            .finish()
    }
}

/// Non-fatal warning that the signing certificate has expired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiredCertificateWarning {
    /// Subject common name of the expired certificate
    pub subject: Option<String>,
    /// When the certificate expired
    pub not_after: DateTime<Utc>,
}

impl std::fmt::Display for ExpiredCertificateWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Your certificate expired on {}",
            self.not_after.format("%Y-%m-%d %H:%M:%S UTC")
        )?;
        if let Some(ref cn) = self.subject {
            write!(f, " ({})", cn)?;
        }
        Ok(())
    }
}

/// Turns a raw container and password into a [`CertificateIdentity`].
pub struct CertificateLoader<'a> {
    decoder: &'a dyn Pkcs12Decoder,
}

impl<'a> CertificateLoader<'a> {
    /// Create a loader backed by `decoder`.
    pub fn new(decoder: &'a dyn Pkcs12Decoder) -> Self {
        Self { decoder }
    }

    /// Decode the container and read the leaf certificate's validity.
    ///
    /// Decoder failures are propagated unchanged; a leaf that is not a valid
    /// X.509 certificate counts as a malformed container.
    pub fn load(&self, data: &[u8], password: &str) -> Result<CertificateIdentity> {
        let decoded = self.decoder.decode(data, password)?;

        let (not_after, subject) = match decoded.certificate {
            Some(ref der) => {
                let (not_after, subject) = read_leaf(der)?;
                (Some(not_after), subject)
            },
            None => {
                log::warn!("Certificate container has no leaf certificate");
                (None, None)
            },
        };

        log::debug!(
            "Loaded signing identity: subject={:?}, not_after={:?}, {} chain certificates",
            subject,
            not_after,
            decoded.chain.len()
        );

        Ok(CertificateIdentity {
            private_key: decoded.private_key,
            certificate: decoded.certificate,
            chain: decoded.chain,
            not_after,
            subject,
        })
    }
}

fn read_leaf(der: &[u8]) -> Result<(DateTime<Utc>, Option<String>)> {
    let (_, cert) = X509Certificate::from_der(der)
        .map_err(|e| Error::Authentication(format!("invalid leaf certificate: {}", e)))?;

    let timestamp = cert.validity().not_after.timestamp();
    let not_after = DateTime::<Utc>::from_timestamp(timestamp, 0).ok_or_else(|| {
        Error::Authentication(format!("certificate expiry out of range: {}", timestamp))
    })?;

    let subject = cert
        .subject()
        .iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string);

    Ok((not_after, subject))
}
