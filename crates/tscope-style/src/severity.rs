#![forbid(unsafe_code)]

//! Severity → color mapping for triage views.
//!
//! A [`SeverityScale`] interpolates between a neutral color (no error) and
//! an alert color (the largest error in the current comparison). Severities
//! are normalized against a global maximum, so the worst offender is always
//! fully saturated regardless of the absolute magnitude.
//!
//! ```
//! use tscope_style::{Rgb, SeverityScale};
//!
//! let scale = SeverityScale::default();
//! assert_eq!(scale.color_for(Some(2.0), 2.0), Some(scale.alert));
//! assert_eq!(scale.color_for(None, 2.0), None);
//! ```

use crate::color::Rgb;

/// Default neutral endpoint.
pub const DEFAULT_NEUTRAL: Rgb = Rgb::new(0xff, 0xff, 0xff);
/// Default alert endpoint.
pub const DEFAULT_ALERT: Rgb = Rgb::new(0xe1, 0x57, 0x59);

/// Two-stop color scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SeverityScale {
    pub neutral: Rgb,
    pub alert: Rgb,
}

impl Default for SeverityScale {
    fn default() -> Self {
        Self {
            neutral: DEFAULT_NEUTRAL,
            alert: DEFAULT_ALERT,
        }
    }
}

impl SeverityScale {
    #[must_use]
    pub const fn new(neutral: Rgb, alert: Rgb) -> Self {
        Self { neutral, alert }
    }

    /// Color at normalized position `t` (clamped to `[0, 1]`).
    #[must_use]
    pub fn color_at(&self, t: f64) -> Rgb {
        self.neutral.lerp(self.alert, t)
    }

    /// Normalize `severity` by `global_max` and map it.
    ///
    /// `None` severity has no color. A non-positive or non-finite maximum maps
    /// every present severity to the neutral color.
    #[must_use]
    pub fn color_for(&self, severity: Option<f64>, global_max: f64) -> Option<Rgb> {
        let severity = severity?;
        if !(global_max.is_finite() && global_max > 0.0) {
            return Some(self.neutral);
        }
        Some(self.color_at(severity / global_max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints() {
        let scale = SeverityScale::default();
        assert_eq!(scale.color_at(0.0), DEFAULT_NEUTRAL);
        assert_eq!(scale.color_at(1.0), DEFAULT_ALERT);
    }

    #[test]
    fn normalizes_against_max() {
        let scale = SeverityScale::new(Rgb::BLACK, Rgb::new(200, 0, 0));
        assert_eq!(scale.color_for(Some(1.0), 2.0), Some(Rgb::new(100, 0, 0)));
        assert_eq!(scale.color_for(Some(0.0), 2.0), Some(Rgb::BLACK));
    }

    #[test]
    fn over_max_clamps() {
        let scale = SeverityScale::default();
        assert_eq!(scale.color_for(Some(10.0), 1.0), Some(DEFAULT_ALERT));
    }

    #[test]
    fn degenerate_max_is_neutral() {
        let scale = SeverityScale::default();
        assert_eq!(scale.color_for(Some(0.0), 0.0), Some(DEFAULT_NEUTRAL));
        assert_eq!(scale.color_for(Some(1.0), f64::NAN), Some(DEFAULT_NEUTRAL));
        assert_eq!(scale.color_for(None, 0.0), None);
    }
}
