//! Trust-time validation for ASiC-E/BDoc signatures.
//!
//! A signature's timestamp token proves *when* it existed; its OCSP response
//! proves the signer's certificate was *not yet revoked*. The chains here
//! check that those two attestations are mutually consistent within
//! configured tolerances. Findings are accumulated data, never control flow:
//! every step in a chain runs to completion, and the caller decides signature
//! acceptability from the collected list.
//!
//! Cryptographic verification of the signature, token or response is out of
//! scope — the [`asice_container::Signature`] evidence consumed here is
//! already parsed and verified by an external signature engine.

pub mod chain;
pub mod steps;
pub mod time;

use serde::Serialize;

/// Kind of one validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// The signature artifact carries no bytes.
    MissingSignature,
    /// No OCSP response is attached to the signature at all.
    MissingRevocationEvidence,
    /// The signature timestamp was generated after the OCSP response was
    /// produced, so the revocation data predates the timestamped moment.
    TimestampAfterOcspResponse,
    /// Timestamp generation time and OCSP produced-at time are further apart
    /// than the configured tolerance allows.
    TimestampOcspDeltaTooLarge,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// One detected inconsistency, accumulated rather than thrown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub kind: ErrorKind,
    pub message: String,
    /// Raw millisecond distance between the two attestation times, carried
    /// for diagnostics on the time-delta finding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delta_millis: Option<i64>,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            delta_millis: None,
        }
    }

    pub fn with_delta_millis(mut self, delta_millis: i64) -> Self {
        self.delta_millis = Some(delta_millis);
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

// Convenience re-exports
pub use chain::{SignatureProfile, ValidationChain};
pub use steps::{ValidationContext, ValidationStep, BASE_STEPS, DELTA_STEPS, FRESHNESS_STEPS};
pub use time::{is_within_minutes, TimeDeltaPolicy, TimeDeltaPolicyOverrides};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finding_display_names_the_kind() {
        let finding = ValidationError::new(ErrorKind::MissingRevocationEvidence, "no OCSP");
        assert_eq!(
            finding.to_string(),
            "MissingRevocationEvidence: no OCSP"
        );
    }

    #[test]
    fn delta_serialized_only_when_present() {
        let bare = ValidationError::new(ErrorKind::MissingSignature, "empty");
        let json = serde_json::to_string(&bare).unwrap();
        assert!(!json.contains("delta_millis"));

        let with_delta = bare.with_delta_millis(960_000);
        let json = serde_json::to_string(&with_delta).unwrap();
        assert!(json.contains("\"delta_millis\":960000"));
    }
}
