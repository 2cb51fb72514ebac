//! Bitemporal version-correction coordinates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A `(version_as_of, corrected_to)` pair where `None` means "latest"
///
/// A coordinate containing "latest" is unfixed and must not be used as a cache
/// key: two "latest" lookups made at different wall-clock times may see
/// different data. Use [`VersionCorrection::with_latest_fixed`] first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct VersionCorrection {
    version_as_of: Option<DateTime<Utc>>,
    corrected_to: Option<DateTime<Utc>>,
}

impl VersionCorrection {
    pub const LATEST: VersionCorrection = VersionCorrection {
        version_as_of: None,
        corrected_to: None,
    };

    pub fn of(version_as_of: Option<DateTime<Utc>>, corrected_to: Option<DateTime<Utc>>) -> Self {
        Self {
            version_as_of,
            corrected_to,
        }
    }

    /// Both instants pinned to `instant`
    pub fn fixed_at(instant: DateTime<Utc>) -> Self {
        Self::of(Some(instant), Some(instant))
    }

    pub fn of_version_as_of(version_as_of: DateTime<Utc>) -> Self {
        Self::of(Some(version_as_of), None)
    }

    pub fn of_corrected_to(corrected_to: DateTime<Utc>) -> Self {
        Self::of(None, Some(corrected_to))
    }

    pub fn version_as_of(&self) -> Option<DateTime<Utc>> {
        self.version_as_of
    }

    pub fn corrected_to(&self) -> Option<DateTime<Utc>> {
        self.corrected_to
    }

    pub fn contains_latest(&self) -> bool {
        self.version_as_of.is_none() || self.corrected_to.is_none()
    }

    /// Replace every "latest" sentinel with `now`
    pub fn with_latest_fixed(&self, now: DateTime<Utc>) -> Self {
        Self {
            version_as_of: Some(self.version_as_of.unwrap_or(now)),
            corrected_to: Some(self.corrected_to.unwrap_or(now)),
        }
    }

    /// Fix against the current wall clock; already fixed coordinates are returned unchanged
    pub fn fixed_now(&self) -> Self {
        if self.contains_latest() {
            self.with_latest_fixed(Utc::now())
        } else {
            *self
        }
    }
}

impl fmt::Display for VersionCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = |instant: Option<DateTime<Utc>>| match instant {
            Some(i) => i.to_rfc3339(),
            None => "LATEST".to_string(),
        };
        write!(
            f,
            "V{}.C{}",
            format(self.version_as_of),
            format(self.corrected_to)
        )
    }
}
