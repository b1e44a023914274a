//! Version parsing and total ordering for catalog entries.
//!
//! Catalog versions are dotted numeric strings with an optional vendor build
//! suffix after a hyphen, e.g. `8.0.21-12.1` (engine `8.0.21`, build `12.1`).
//! Ordering is numeric per segment, left to right; the hyphen only separates
//! the engine segments from the build segments, so `8.0.21-12.1` compares as
//! `[8, 0, 21, 12, 1]`. Shorter versions are zero-padded, which makes
//! `8.0.21` and `8.0.21.0` equal.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

/// Error for malformed version strings.
///
/// Malformed versions are a data-integrity failure: catalogs and floors are
/// machine-produced, so an unparsable entry means corrupt input, not a value
/// to skip.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    /// The string is not a dotted numeric version with an optional build suffix.
    #[error("invalid version format: {0}")]
    InvalidFormat(String),
}

/// A parsed component version with total ordering.
///
/// Keeps the original string for display and the numeric segments for
/// comparison. Construct via [`FromStr`] (catalog/policy strings) or
/// [`ComponentVersion::from_release`] (built-in floors, infallible).
#[derive(Debug, Clone)]
pub struct ComponentVersion {
    raw: String,
    segments: Vec<u64>,
}

impl ComponentVersion {
    /// Build a version from numeric segments, e.g. `from_release(&[8, 0, 0])`.
    ///
    /// Used for engine-wide floors so they never go through string parsing.
    pub fn from_release(segments: &[u64]) -> Self {
        let raw = segments
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(".");
        Self {
            raw,
            segments: segments.to_vec(),
        }
    }

    /// The original version string.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The numeric segments, engine segments followed by build segments.
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }
}

/// Compare two version strings.
///
/// This is the single comparison contract the rest of the crate builds on;
/// both inputs must parse or the comparison fails with
/// [`VersionError::InvalidFormat`].
pub fn compare(a: &str, b: &str) -> Result<Ordering, VersionError> {
    let a: ComponentVersion = a.parse()?;
    let b: ComponentVersion = b.parse()?;
    Ok(a.cmp(&b))
}

impl FromStr for ComponentVersion {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || VersionError::InvalidFormat(s.to_string());

        if s.is_empty() {
            return Err(malformed());
        }

        // At most one hyphen: engine segments, then build segments.
        let (engine, build) = match s.split_once('-') {
            Some((engine, build)) => (engine, Some(build)),
            None => (s, None),
        };

        let mut segments = Vec::new();
        for part in std::iter::once(engine).chain(build) {
            if part.is_empty() || part.contains('-') {
                return Err(malformed());
            }
            for segment in part.split('.') {
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(malformed());
                }
                segments.push(segment.parse::<u64>().map_err(|_| malformed())?);
            }
        }

        Ok(Self {
            raw: s.to_string(),
            segments,
        })
    }
}

impl fmt::Display for ComponentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

// Ordering pads the shorter segment list with zeros, so equality must follow
// the comparison (and Hash must follow equality) rather than the raw string.
impl Ord for ComponentVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        for i in 0..len {
            let a = self.segments.get(i).copied().unwrap_or(0);
            let b = other.segments.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for ComponentVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ComponentVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ComponentVersion {}

impl Hash for ComponentVersion {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Trailing zeros are insignificant under the padded comparison.
        let significant = self
            .segments
            .iter()
            .rposition(|&s| s != 0)
            .map_or(0, |i| i + 1);
        self.segments[..significant].hash(state);
    }
}
