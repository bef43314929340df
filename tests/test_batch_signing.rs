//! Integration tests for batch signing control flow.
//!
//! The external collaborators (PKCS#12 decoder, rasterizer, CMS signer, and
//! the user prompts) are replaced with fixed-response doubles; documents are
//! real files in a temporary directory.

use chrono::{DateTime, TimeZone, Utc};
use pdf_signet::config::SignerConfig;
use pdf_signet::error::{Error, ErrorKind, Result};
use pdf_signet::geometry::{PageSize, PdfRect, PreviewRect, PreviewSize};
use pdf_signet::signatures::{
    default_signed_path, BatchSigner, BatchStatus, CertificateIdentity, Clock, DecodedContainer,
    DestinationPrompt, ExpiredCertificateWarning, ExpiryConfirmation, Interaction, PageSource,
    Pkcs12Decoder, RectangleSelector, Selection, SignRequest, SigningOptions, SigningPrimitive,
};
use pdf_signet::stamp::StampProfile;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const SIGNATURE: &[u8] = b"\n%signature-update\n";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn leaf_certificate(expires: (i32, u8, u8)) -> Vec<u8> {
    let mut params = rcgen::CertificateParams::new(vec!["signer.example".to_string()]).unwrap();
    params.distinguished_name.push(rcgen::DnType::CommonName, "Test Signer");
    params.not_before = rcgen::date_time_ymd(2020, 1, 1);
    params.not_after = rcgen::date_time_ymd(expires.0, expires.1, expires.2);
    let key_pair = rcgen::KeyPair::generate().unwrap();
    params.self_signed(&key_pair).unwrap().der().to_vec()
}

struct TestDecoder {
    certificate: Vec<u8>,
}

impl Pkcs12Decoder for TestDecoder {
    fn decode(&self, _data: &[u8], password: &str) -> Result<DecodedContainer> {
        if password != "secret" {
            return Err(Error::Authentication("mac verify failure".to_string()));
        }
        Ok(DecodedContainer {
            private_key: vec![0x30, 0x01, 0x00],
            certificate: Some(self.certificate.clone()),
            chain: Vec::new(),
        })
    }
}

struct FixedClock(DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

struct Letter;

impl PageSource for Letter {
    fn page_count(&self, _document: &Path) -> Result<usize> {
        Ok(2)
    }

    fn page_size(&self, _document: &Path, _page_index: usize) -> Result<PageSize> {
        Ok(PageSize::new(612.0, 792.0))
    }
}

/// Records every invocation; rejects documents containing `REJECT`.
#[derive(Default)]
struct RecordingPrimitive {
    calls: RefCell<Vec<(Vec<u8>, SigningOptions)>>,
}

impl SigningPrimitive for RecordingPrimitive {
    fn sign(
        &self,
        document: &[u8],
        options: &SigningOptions,
        _identity: &CertificateIdentity,
    ) -> Result<Vec<u8>> {
        self.calls.borrow_mut().push((document.to_vec(), options.clone()));
        if document.windows(6).any(|w| w == b"REJECT") {
            return Err(Error::SigningPrimitive("unsupported document".to_string()));
        }
        Ok(SIGNATURE.to_vec())
    }
}

/// Answers destination prompts from a script; accepts the suggestion once
/// the script runs out.
#[derive(Default)]
struct ScriptedDestination {
    answers: VecDeque<Option<PathBuf>>,
    asked: Vec<(PathBuf, PathBuf)>,
}

impl ScriptedDestination {
    fn with_answers(answers: Vec<Option<PathBuf>>) -> Self {
        Self {
            answers: answers.into(),
            asked: Vec::new(),
        }
    }
}

impl DestinationPrompt for ScriptedDestination {
    fn choose(&mut self, source: &Path, suggested: &Path) -> Option<PathBuf> {
        self.asked.push((source.to_path_buf(), suggested.to_path_buf()));
        self.answers
            .pop_front()
            .unwrap_or_else(|| Some(suggested.to_path_buf()))
    }
}

#[derive(Default)]
struct ScriptedSelector {
    answers: VecDeque<Option<Selection>>,
    calls: usize,
}

impl RectangleSelector for ScriptedSelector {
    fn select(&mut self, _document: &Path) -> Option<Selection> {
        self.calls += 1;
        self.answers.pop_front().flatten()
    }
}

struct CountingConfirmation {
    accept: bool,
    warnings: Vec<ExpiredCertificateWarning>,
}

impl CountingConfirmation {
    fn new(accept: bool) -> Self {
        Self {
            accept,
            warnings: Vec::new(),
        }
    }
}

impl ExpiryConfirmation for CountingConfirmation {
    fn confirm_expired(&mut self, warning: &ExpiredCertificateWarning) -> bool {
        self.warnings.push(warning.clone());
        self.accept
    }
}

struct Fixture {
    dir: TempDir,
    decoder: TestDecoder,
    clock: FixedClock,
    primitive: RecordingPrimitive,
}

impl Fixture {
    fn new(expires: (i32, u8, u8)) -> Self {
        init_logging();
        Self {
            dir: tempfile::tempdir().unwrap(),
            decoder: TestDecoder {
                certificate: leaf_certificate(expires),
            },
            clock: FixedClock(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
            primitive: RecordingPrimitive::default(),
        }
    }

    fn valid() -> Self {
        Self::new((2099, 12, 31))
    }

    fn document(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    fn list(paths: &[&PathBuf]) -> String {
        paths
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn signer(&self) -> BatchSigner<'_> {
        BatchSigner::new(&self.decoder, &Letter, &self.primitive, &self.clock)
    }

    fn call_count(&self) -> usize {
        self.primitive.calls.borrow().len()
    }
}

fn request<'a>(documents: &'a str, password: &'a str) -> SignRequest<'a> {
    SignRequest {
        container: b"p12",
        password,
        documents,
        certify: false,
    }
}

#[test]
fn test_signs_every_document_in_order() {
    let fx = Fixture::valid();
    let a = fx.document("a.pdf", b"%PDF-1.4 a");
    let b = fx.document("b.PDF", b"%PDF-1.4 b");
    let c = fx.document("c.pdf", b"%PDF-1.4 c");
    let docs = Fixture::list(&[&a, &b, &c]);

    let mut dest = ScriptedDestination::default();
    let report = fx
        .signer()
        .run(
            &request(&docs, "secret"),
            &SignerConfig::new(),
            Interaction {
                destination: &mut dest,
                selector: &mut ScriptedSelector::default(),
                expiry: &mut CountingConfirmation::new(true),
            },
        )
        .unwrap();

    assert_eq!(report.status, BatchStatus::Completed);
    assert_eq!(report.signed_count(), 3);
    let sources: Vec<_> = report.outcomes.iter().map(|o| o.source_path.clone()).collect();
    assert_eq!(sources, vec![a.clone(), b.clone(), c.clone()]);

    let signed_b = fs::read(fx.dir.path().join("b-signed.pdf")).unwrap();
    assert_eq!(signed_b, [&b"%PDF-1.4 b"[..], SIGNATURE].concat());
    assert_eq!(dest.asked[0].1, default_signed_path(&a));
}

#[test]
fn test_output_is_original_bytes_followed_by_signature() {
    let fx = Fixture::valid();
    let original: Vec<u8> = (0u8..=255).cycle().take(4096).collect();
    let a = fx.document("binary.pdf", &original);

    let report = fx
        .signer()
        .run(
            &request(&Fixture::list(&[&a]), "secret"),
            &SignerConfig::new(),
            Interaction {
                destination: &mut ScriptedDestination::default(),
                selector: &mut ScriptedSelector::default(),
                expiry: &mut CountingConfirmation::new(true),
            },
        )
        .unwrap();

    let written = fs::read(&report.outcomes[0].dest_path).unwrap();
    assert_eq!(&written[..original.len()], &original[..]);
    assert_eq!(&written[original.len()..], SIGNATURE);
    assert_eq!(fx.primitive.calls.borrow()[0].0, original);
    assert_eq!(fs::read(&a).unwrap(), original);
}

#[test]
fn test_cancelled_destination_aborts_remaining_batch() {
    let fx = Fixture::valid();
    let a = fx.document("a.pdf", b"%PDF a");
    let b = fx.document("b.pdf", b"%PDF b");
    let c = fx.document("c.pdf", b"%PDF c");
    let docs = Fixture::list(&[&a, &b, &c]);

    let mut dest =
        ScriptedDestination::with_answers(vec![Some(fx.dir.path().join("a-out.pdf")), None]);
    let report = fx
        .signer()
        .run(
            &request(&docs, "secret"),
            &SignerConfig::new(),
            Interaction {
                destination: &mut dest,
                selector: &mut ScriptedSelector::default(),
                expiry: &mut CountingConfirmation::new(true),
            },
        )
        .unwrap();

    assert_eq!(report.status, BatchStatus::DestinationAborted);
    assert_eq!(report.outcomes.len(), 1);
    assert!(report.outcomes[0].success);
    assert_eq!(report.skipped, vec![b, c]);
    assert_eq!(fx.call_count(), 1);
    assert_eq!(dest.asked.len(), 2);
    assert!(fx.dir.path().join("a-out.pdf").exists());
}

#[test]
fn test_primitive_failure_is_isolated() {
    let fx = Fixture::valid();
    let a = fx.document("a.pdf", b"%PDF a");
    let b = fx.document("b.pdf", b"%PDF REJECT");
    let c = fx.document("c.pdf", b"%PDF c");
    let docs = Fixture::list(&[&a, &b, &c]);

    let report = fx
        .signer()
        .run(
            &request(&docs, "secret"),
            &SignerConfig::new(),
            Interaction {
                destination: &mut ScriptedDestination::default(),
                selector: &mut ScriptedSelector::default(),
                expiry: &mut CountingConfirmation::new(true),
            },
        )
        .unwrap();

    assert_eq!(report.status, BatchStatus::Completed);
    assert_eq!(fx.call_count(), 3);
    let failed: Vec<_> = report.failures().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].source_path, b);
    assert_eq!(failed[0].error_kind, Some(ErrorKind::SigningPrimitiveFailure));
    assert!(failed[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("unsupported document"));
    assert!(!fx.dir.path().join("b-signed.pdf").exists());
    assert!(fx.dir.path().join("a-signed.pdf").exists());
    assert!(fx.dir.path().join("c-signed.pdf").exists());
}

#[test]
fn test_unreadable_source_is_isolated() {
    let fx = Fixture::valid();
    let missing = fx.dir.path().join("missing.pdf");
    let b = fx.document("b.pdf", b"%PDF b");
    let docs = Fixture::list(&[&missing, &b]);

    let report = fx
        .signer()
        .run(
            &request(&docs, "secret"),
            &SignerConfig::new(),
            Interaction {
                destination: &mut ScriptedDestination::default(),
                selector: &mut ScriptedSelector::default(),
                expiry: &mut CountingConfirmation::new(true),
            },
        )
        .unwrap();

    assert!(!report.outcomes[0].success);
    assert_eq!(report.outcomes[0].error_kind, Some(ErrorKind::SigningPrimitiveFailure));
    assert!(report.outcomes[1].success);
    assert_eq!(fx.call_count(), 1);
}

#[test]
fn test_wrong_password_fails_before_any_prompt() {
    let fx = Fixture::valid();
    let a = fx.document("a.pdf", b"%PDF a");
    let mut dest = ScriptedDestination::default();

    let err = fx
        .signer()
        .run(
            &request(&Fixture::list(&[&a]), "wrong"),
            &SignerConfig::new(),
            Interaction {
                destination: &mut dest,
                selector: &mut ScriptedSelector::default(),
                expiry: &mut CountingConfirmation::new(true),
            },
        )
        .unwrap_err();

    assert!(matches!(err, Error::Authentication(_)));
    assert!(dest.asked.is_empty());
    assert_eq!(fx.call_count(), 0);
}

#[test]
fn test_expired_certificate_warns_once_per_batch() {
    let fx = Fixture::new((2023, 1, 1));
    let docs: Vec<PathBuf> = (0..4)
        .map(|i| fx.document(&format!("doc{}.pdf", i), b"%PDF"))
        .collect();
    let list = Fixture::list(&docs.iter().collect::<Vec<_>>());

    let mut expiry = CountingConfirmation::new(true);
    let report = fx
        .signer()
        .run(
            &request(&list, "secret"),
            &SignerConfig::new(),
            Interaction {
                destination: &mut ScriptedDestination::default(),
                selector: &mut ScriptedSelector::default(),
                expiry: &mut expiry,
            },
        )
        .unwrap();

    assert_eq!(expiry.warnings.len(), 1);
    assert_eq!(expiry.warnings[0].subject.as_deref(), Some("Test Signer"));
    assert_eq!(report.signed_count(), 4);
}

#[test]
fn test_declined_expiry_touches_nothing() {
    let fx = Fixture::new((2023, 1, 1));
    let a = fx.document("a.pdf", b"%PDF a");
    let mut dest = ScriptedDestination::default();

    let report = fx
        .signer()
        .run(
            &request(&Fixture::list(&[&a]), "secret"),
            &SignerConfig::new(),
            Interaction {
                destination: &mut dest,
                selector: &mut ScriptedSelector::default(),
                expiry: &mut CountingConfirmation::new(false),
            },
        )
        .unwrap();

    assert_eq!(report.status, BatchStatus::ExpiryDeclined);
    assert!(report.outcomes.is_empty());
    assert_eq!(report.skipped, vec![a]);
    assert!(dest.asked.is_empty());
    assert_eq!(fx.call_count(), 0);
}

#[test]
fn test_valid_certificate_never_asks() {
    let fx = Fixture::valid();
    let a = fx.document("a.pdf", b"%PDF a");
    let mut expiry = CountingConfirmation::new(false);

    let report = fx
        .signer()
        .run(
            &request(&Fixture::list(&[&a]), "secret"),
            &SignerConfig::new(),
            Interaction {
                destination: &mut ScriptedDestination::default(),
                selector: &mut ScriptedSelector::default(),
                expiry: &mut expiry,
            },
        )
        .unwrap();

    assert!(expiry.warnings.is_empty());
    assert_eq!(report.signed_count(), 1);
}

#[test]
fn test_cancelled_selection_skips_only_that_document() {
    let fx = Fixture::valid();
    let a = fx.document("a.pdf", b"%PDF a");
    let b = fx.document("b.pdf", b"%PDF b");
    let docs = Fixture::list(&[&a, &b]);

    let mut selector = ScriptedSelector {
        answers: vec![
            None,
            Some(Selection {
                page_index: 1,
                rect: PreviewRect::new(0.0, 0.0, 306.0, 396.0),
                preview: PreviewSize::new(612.0, 792.0),
            }),
        ]
        .into(),
        calls: 0,
    };
    let config = SignerConfig::new().with_draw_stamp(true);
    let report = fx
        .signer()
        .run(
            &request(&docs, "secret"),
            &config,
            Interaction {
                destination: &mut ScriptedDestination::default(),
                selector: &mut selector,
                expiry: &mut CountingConfirmation::new(true),
            },
        )
        .unwrap();

    assert_eq!(report.status, BatchStatus::Completed);
    assert_eq!(report.outcomes[0].error_kind, Some(ErrorKind::GeometryInputAborted));
    assert!(report.outcomes[1].success);
    assert_eq!(selector.calls, 2);

    let calls = fx.primitive.calls.borrow();
    assert_eq!(calls.len(), 1);
    let options = &calls[0].1;
    assert_eq!(options.page_index, 1);
    assert_eq!(options.rect, PdfRect::new(0.0, 396.0, 306.0, 792.0));
    assert!(options.is_visible());
}

#[test]
fn test_stamp_profile_replaces_selection() {
    let fx = Fixture::valid();
    let profile_path = fx.dir.path().join("office.stampinfo");
    StampProfile::new(1, PdfRect::new(400.0, 50.0, 560.0, 110.0))
        .save(&profile_path)
        .unwrap();
    let a = fx.document("a.pdf", b"%PDF a");
    let b = fx.document("b.pdf", b"%PDF b");
    let docs = Fixture::list(&[&a, &b]);

    let mut selector = ScriptedSelector::default();
    let config = SignerConfig::new()
        .with_draw_stamp(true)
        .with_stamp_path(&profile_path)
        .with_reason("Approved");
    let report = fx
        .signer()
        .run(
            &SignRequest {
                certify: true,
                ..request(&docs, "secret")
            },
            &config,
            Interaction {
                destination: &mut ScriptedDestination::default(),
                selector: &mut selector,
                expiry: &mut CountingConfirmation::new(true),
            },
        )
        .unwrap();

    assert_eq!(report.signed_count(), 2);
    assert_eq!(selector.calls, 0);
    for (_, options) in fx.primitive.calls.borrow().iter() {
        assert_eq!(options.page_index, 1);
        assert_eq!(options.rect, PdfRect::new(400.0, 50.0, 560.0, 110.0));
        assert!(options.certify);
        assert_eq!(options.reason, "Approved");
        assert!(options.appearance.as_ref().unwrap().labels);
    }
}

#[test]
fn test_broken_profile_fails_before_any_document() {
    let fx = Fixture::valid();
    let profile_path = fx.dir.path().join("broken.stampinfo");
    fs::write(&profile_path, "{\"page\": 0}").unwrap();
    let a = fx.document("a.pdf", b"%PDF a");
    let mut dest = ScriptedDestination::default();

    let config = SignerConfig::new()
        .with_draw_stamp(true)
        .with_stamp_path(&profile_path);
    let err = fx
        .signer()
        .run(
            &request(&Fixture::list(&[&a]), "secret"),
            &config,
            Interaction {
                destination: &mut dest,
                selector: &mut ScriptedSelector::default(),
                expiry: &mut CountingConfirmation::new(true),
            },
        )
        .unwrap_err();

    assert!(matches!(err, Error::InvalidProfile(_)));
    assert!(dest.asked.is_empty());
}

#[test]
fn test_blank_lines_are_ignored() {
    let fx = Fixture::valid();
    let a = fx.document("a.pdf", b"%PDF a");
    let docs = format!("\n  \n{}\n\n", a.display());

    let mut dest = ScriptedDestination::default();
    let report = fx
        .signer()
        .run(
            &request(&docs, "secret"),
            &SignerConfig::new(),
            Interaction {
                destination: &mut dest,
                selector: &mut ScriptedSelector::default(),
                expiry: &mut CountingConfirmation::new(true),
            },
        )
        .unwrap();

    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(dest.asked.len(), 1);
}

#[test]
fn test_field_names_are_unique_across_instants() {
    let fx = Fixture::valid();
    let a = fx.document("a.pdf", b"%PDF a");
    let list = Fixture::list(&[&a]);
    let mut names = Vec::new();

    for micros in [1_000u32, 2_000] {
        let clock = FixedClock(Utc.timestamp_opt(1_714_564_800, micros * 1_000).unwrap());
        let primitive = RecordingPrimitive::default();
        let signer = BatchSigner::new(&fx.decoder, &Letter, &primitive, &clock);
        signer
            .run(
                &request(&list, "secret"),
                &SignerConfig::new(),
                Interaction {
                    destination: &mut ScriptedDestination::default(),
                    selector: &mut ScriptedSelector::default(),
                    expiry: &mut CountingConfirmation::new(true),
                },
            )
            .unwrap();
        let calls = primitive.calls.borrow();
        names.push(calls[0].1.sig_field_name.clone());
    }

    assert_ne!(names[0], names[1]);
    assert!(names.iter().all(|n| n.starts_with("Signature-")));
}
