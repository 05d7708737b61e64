#![forbid(unsafe_code)]

//! Color vocabulary for tensorscope.
//!
//! # Role in tensorscope
//! `tscope-style` holds the small set of color types shared by the triage
//! tree, the session, and the CLI. It has no rendering or runtime
//! dependencies.
//!
//! # This crate provides
//! - [`Rgb`] with hex parsing and interpolation.
//! - [`SeverityScale`] mapping normalized error severity to a color.

/// 24-bit color type.
pub mod color;
/// Severity color scales.
pub mod severity;

pub use color::{ColorParseError, Rgb};
pub use severity::{DEFAULT_ALERT, DEFAULT_NEUTRAL, SeverityScale};
