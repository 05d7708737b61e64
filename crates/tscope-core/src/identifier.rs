#![forbid(unsafe_code)]

//! Dot-delimited tensor identifiers.
//!
//! An [`Identifier`] names one tensor instance within a run, e.g.
//! `dt0.rec1.convA.dims4`. Segments are never empty, so every identifier has
//! a well-defined chain of path prefixes (`dt0`, `dt0.rec1`, ...) used by the
//! namespace tree.
//!
//! ```
//! use tscope_core::identifier::Identifier;
//!
//! let id: Identifier = "dt0.rec1.convA.dims4".parse().unwrap();
//! assert_eq!(id.segment_count(), 4);
//! let other = id.replace_segment("rec1", "rec2").unwrap();
//! assert_eq!(other.as_str(), "dt0.rec2.convA.dims4");
//! ```

use std::fmt;
use std::str::FromStr;

/// Separator between path segments.
pub const SEPARATOR: char = '.';

/// Identifier parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifierError {
    /// The identifier string was empty.
    Empty,
    /// Segment at `position` was empty (leading, trailing, or doubled dot).
    EmptySegment { raw: String, position: usize },
}

impl fmt::Display for IdentifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "identifier is empty"),
            Self::EmptySegment { raw, position } => {
                write!(f, "identifier '{raw}' has an empty segment at position {position}")
            }
        }
    }
}

impl std::error::Error for IdentifierError {}

/// A validated, dot-delimited tensor name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Identifier {
    raw: String,
}

impl Identifier {
    /// Parse and validate an identifier.
    pub fn new(raw: impl Into<String>) -> Result<Self, IdentifierError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(IdentifierError::Empty);
        }
        if let Some(position) = raw.split(SEPARATOR).position(str::is_empty) {
            return Err(IdentifierError::EmptySegment { raw, position });
        }
        Ok(Self { raw })
    }

    /// Build an identifier from segments.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, IdentifierError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect::<Vec<_>>()
            .join(".");
        Self::new(joined)
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Path segments in order.
    pub fn segments(&self) -> impl Iterator<Item = &str> + '_ {
        self.raw.split(SEPARATOR)
    }

    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments().count()
    }

    /// Last segment.
    #[must_use]
    pub fn leaf(&self) -> &str {
        self.raw.rsplit(SEPARATOR).next().unwrap_or(&self.raw)
    }

    /// Whether any segment equals `token` exactly.
    #[must_use]
    pub fn contains_segment(&self, token: &str) -> bool {
        self.segments().any(|s| s == token)
    }

    /// Replace every segment equal to `from` with `to`.
    ///
    /// Returns `None` when no segment matches or when `to` would produce an
    /// invalid identifier.
    #[must_use]
    pub fn replace_segment(&self, from: &str, to: &str) -> Option<Self> {
        if !self.contains_segment(from) {
            return None;
        }
        Self::from_segments(self.segments().map(|s| if s == from { to } else { s })).ok()
    }

    /// Path prefixes from the first segment to the full identifier.
    ///
    /// `a.b.c` yields `a`, `a.b`, `a.b.c`.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> + '_ {
        let ends = self
            .raw
            .match_indices(SEPARATOR)
            .map(|(i, _)| i)
            .chain(std::iter::once(self.raw.len()));
        ends.map(move |end| &self.raw[..end])
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Identifier {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Identifier> for String {
    fn from(id: Identifier) -> Self {
        id.raw
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}
