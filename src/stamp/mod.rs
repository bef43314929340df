//! Visible signature stamps.
//!
//! A stamp is the visible box drawn for a signature. Its placement comes
//! either from an interactive selection on a page preview or from a saved
//! [`StampProfile`]; its look is a [`StampAppearance`].

mod appearance;
mod profile;

pub use appearance::{DisplayField, Rgb, StampAppearance};
pub use profile::{StampProfile, PROFILE_EXTENSION};
