//! Signing request assembly.
//!
//! [`SignatureRequestBuilder`] combines the batch configuration, the stamp
//! placement, and the clock into fresh [`SigningOptions`] for each document.

use std::path::{Path, PathBuf};

use super::clock::Clock;
use super::types::{format_pdf_date, sig_field_name, SigningOptions, FIELD_FLAGS, SIG_FLAGS};
use crate::config::SignerConfig;
use crate::error::{Error, Result};
use crate::geometry::{preview_to_pdf, PageSize, PdfRect, PreviewRect, PreviewSize};
use crate::stamp::StampProfile;

/// A rectangle dragged out on a page preview.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    /// Page the preview shows (0-indexed)
    pub page_index: usize,
    /// Selected rectangle in preview pixels
    pub rect: PreviewRect,
    /// Size of the preview the rectangle was drawn on
    pub preview: PreviewSize,
}

/// Interactive stamp placement surface.
pub trait RectangleSelector {
    /// Let the user pick a stamp area on `document`; `None` if cancelled.
    fn select(&mut self, document: &Path) -> Option<Selection>;
}

/// Page geometry of a document, as reported by the rasterizer.
pub trait PageSource {
    /// Number of pages in `document`.
    fn page_count(&self, document: &Path) -> Result<usize>;

    /// Size of page `page_index` in points.
    fn page_size(&self, document: &Path, page_index: usize) -> Result<PageSize>;
}

/// Where the stamp placement comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum StampSource {
    /// Invisible signature
    Disabled,
    /// Replay a saved placement
    Profile(StampProfile),
    /// Ask for a rectangle on every document
    Interactive {
        /// Stamp image drawn inside the rectangle
        icon: Option<PathBuf>,
    },
}

impl StampSource {
    /// Resolve the stamp source from the configured stamp path.
    ///
    /// An existing `.stampinfo` path is loaded as a profile; any other existing
    /// path is used as the stamp image for interactive placement.
    pub fn resolve(config: &SignerConfig) -> Result<Self> {
        if !config.draw_stamp {
            return Ok(StampSource::Disabled);
        }

        let existing = config.stamp_path.as_deref().filter(|p| p.exists());
        match existing {
            Some(path) if StampProfile::is_profile_path(path) => {
                let profile = StampProfile::load(path)?;
                log::info!("Using stamp profile {}", path.display());
                Ok(StampSource::Profile(profile))
            },
            Some(path) => Ok(StampSource::Interactive {
                icon: Some(path.to_path_buf()),
            }),
            None => Ok(StampSource::Interactive { icon: None }),
        }
    }
}

/// Builds the signing options for one document.
pub struct SignatureRequestBuilder<'a> {
    config: &'a SignerConfig,
    stamp: &'a StampSource,
    pages: &'a dyn PageSource,
    clock: &'a dyn Clock,
}

impl<'a> SignatureRequestBuilder<'a> {
    /// Create a builder for one batch.
    pub fn new(
        config: &'a SignerConfig,
        stamp: &'a StampSource,
        pages: &'a dyn PageSource,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            config,
            stamp,
            pages,
            clock,
        }
    }

    /// Build options for signing `document`.
    ///
    /// Only interactive placement consults `selector`; cancelling it fails
    /// with [`Error::GeometryInputAborted`] for this document alone.
    pub fn build(
        &self,
        document: &Path,
        certify: bool,
        selector: &mut dyn RectangleSelector,
    ) -> Result<SigningOptions> {
        let now = self.clock.now();
        let mut options = SigningOptions {
            sig_field_name: sig_field_name(now),
            page_index: 0,
            rect: PdfRect::ZERO,
            certify,
            contact: self.config.contact.clone(),
            location: self.config.location.clone(),
            reason: self.config.reason.clone(),
            signing_timestamp: format_pdf_date(now),
            appearance: None,
            digest_algorithm: self.config.digest_algorithm,
            sig_flags: SIG_FLAGS,
            field_flags: FIELD_FLAGS,
        };

        match self.stamp {
            StampSource::Disabled => {},
            StampSource::Profile(profile) => {
                options.page_index = profile.page_index;
                options.rect = profile.rect;
                options.appearance = Some(
                    profile
                        .appearance
                        .clone()
                        .unwrap_or_else(|| self.config.stamp.appearance()),
                );
            },
            StampSource::Interactive { icon } => {
                if let Some(profile) = self.select_placement(document, selector)? {
                    let mut appearance = self.config.stamp.appearance();
                    appearance.icon_path = icon.clone();
                    options.page_index = profile.page_index;
                    options.rect = profile.rect;
                    options.appearance = Some(appearance);
                }
            },
        }

        Ok(options)
    }

    /// Ask for a placement and convert it to page coordinates.
    ///
    /// `Ok(None)` means the user confirmed without dragging a rectangle.
    fn select_placement(
        &self,
        document: &Path,
        selector: &mut dyn RectangleSelector,
    ) -> Result<Option<StampProfile>> {
        if self.pages.page_count(document)? == 0 {
            return Err(Error::EmptyDocument(document.to_path_buf()));
        }

        let selection = selector
            .select(document)
            .ok_or_else(|| Error::GeometryInputAborted {
                source_path: document.to_path_buf(),
            })?;

        if selection.rect.is_empty() {
            log::info!(
                "No stamp area selected on {}, signing without a visible stamp",
                document.display()
            );
            return Ok(None);
        }

        let page = self.pages.page_size(document, selection.page_index)?;
        let rect = preview_to_pdf(&selection.rect, selection.preview, page);
        let profile = StampProfile::new(selection.page_index, rect);
        log::info!(
            "Save this as a .stampinfo file to reuse the placement: {}",
            profile.to_json_string()?
        );
        Ok(Some(profile))
    }
}
