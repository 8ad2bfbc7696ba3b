//! Time-delta tolerance policy and comparison.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Tolerance windows for the timestamp/OCSP consistency checks, in minutes.
///
/// Both values come from the configuration provider and are treated as
/// already-validated input (non-negative by type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct TimeDeltaPolicy {
    /// Allowed distance between the signature timestamp and the OCSP
    /// response production time.
    pub ts_ocsp_minutes: u32,
    /// Allowed distance between revocation data and the signature timestamp.
    pub revoc_ts_minutes: u32,
}

impl Default for TimeDeltaPolicy {
    fn default() -> Self {
        Self {
            ts_ocsp_minutes: 15,
            revoc_ts_minutes: 24 * 60,
        }
    }
}

/// Partial overrides for `TimeDeltaPolicy`, for config parsing.
/// Unknown keys cause deserialization to fail (deny_unknown_fields).
/// Merge with `TimeDeltaPolicy::default().apply(overrides)`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeDeltaPolicyOverrides {
    pub ts_ocsp_minutes: Option<u32>,
    pub revoc_ts_minutes: Option<u32>,
}

impl TimeDeltaPolicy {
    /// Apply overrides onto these values. Only `Some` values override.
    pub fn apply(self, overrides: TimeDeltaPolicyOverrides) -> TimeDeltaPolicy {
        TimeDeltaPolicy {
            ts_ocsp_minutes: overrides.ts_ocsp_minutes.unwrap_or(self.ts_ocsp_minutes),
            revoc_ts_minutes: overrides.revoc_ts_minutes.unwrap_or(self.revoc_ts_minutes),
        }
    }

    /// The single tolerance applied by the delta step: the more permissive
    /// of the two configured bounds.
    pub fn max_allowed_minutes(&self) -> u32 {
        self.ts_ocsp_minutes.max(self.revoc_ts_minutes)
    }
}

/// Whether `a` and `b` are at most `minutes` apart, boundary inclusive.
///
/// Computed over real elapsed milliseconds, not calendar-field truncation,
/// so minute boundaries have no off-by-one.
pub fn is_within_minutes(a: DateTime<Utc>, b: DateTime<Utc>, minutes: u32) -> bool {
    let distance = a.signed_duration_since(b).num_milliseconds().unsigned_abs();
    distance <= u64::from(minutes) * 60_000
}
