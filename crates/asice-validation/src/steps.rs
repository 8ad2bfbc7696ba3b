//! Validation step registry.
//!
//! Each step is an independent strategy value: it inspects a signature's
//! parsed evidence and contributes at most one finding. Chains are assembled
//! from these registries at configuration time, so an extended policy is the
//! base list plus appended steps — never an override of an earlier one.

use crate::time::{is_within_minutes, TimeDeltaPolicy};
use crate::{ErrorKind, ValidationError};
use asice_container::Signature;

/// Context passed to step checks.
pub struct ValidationContext<'a> {
    /// Tolerance configuration supplied by the caller.
    pub policy: &'a TimeDeltaPolicy,
}

/// One check in a validation chain.
pub struct ValidationStep {
    pub id: &'static str,
    pub description: &'static str,
    pub check: fn(&Signature, &ValidationContext<'_>) -> Option<ValidationError>,
}

/// Structural checks shared by every signature profile.
pub static BASE_STEPS: &[ValidationStep] = &[
    ValidationStep {
        id: "BDOC-S001",
        description: "Signature artifact must not be empty",
        check: check_signature_present,
    },
    ValidationStep {
        id: "BDOC-S002",
        description: "Revocation (OCSP) evidence must be attached",
        check: check_revocation_present,
    },
];

/// Revocation-freshness checks for timestamped profiles.
pub static FRESHNESS_STEPS: &[ValidationStep] = &[ValidationStep {
    id: "BDOC-T001",
    description: "OCSP response must not precede the signature timestamp",
    check: check_ocsp_not_before_timestamp,
}];

/// The timestamp/OCSP time-delta check.
pub static DELTA_STEPS: &[ValidationStep] = &[ValidationStep {
    id: "BDOC-T002",
    description: "Timestamp and OCSP response times must agree within the configured tolerance",
    check: check_timestamp_ocsp_delta,
}];

fn check_signature_present(
    signature: &Signature,
    _ctx: &ValidationContext<'_>,
) -> Option<ValidationError> {
    if signature.raw.is_empty() {
        return Some(ValidationError::new(
            ErrorKind::MissingSignature,
            "signature artifact contains no bytes",
        ));
    }
    None
}

fn check_revocation_present(
    signature: &Signature,
    _ctx: &ValidationContext<'_>,
) -> Option<ValidationError> {
    if signature.evidence.revocation.is_none() {
        return Some(ValidationError::new(
            ErrorKind::MissingRevocationEvidence,
            "no OCSP response is attached to the signature",
        ));
    }
    None
}

fn check_ocsp_not_before_timestamp(
    signature: &Signature,
    _ctx: &ValidationContext<'_>,
) -> Option<ValidationError> {
    let timestamp = signature.evidence.timestamp.as_ref()?.generation_time?;
    let produced_at = signature.evidence.revocation.as_ref()?.produced_at?;
    if timestamp > produced_at {
        return Some(ValidationError::new(
            ErrorKind::TimestampAfterOcspResponse,
            "signature timestamp was generated after the OCSP response was produced",
        ));
    }
    None
}

/// The core trust-time check: when both attestation times exist, they must
/// agree within the most permissive configured bound. Absent evidence means
/// the check does not apply — a later profile's extra step finding nothing
/// is not itself an error.
fn check_timestamp_ocsp_delta(
    signature: &Signature,
    ctx: &ValidationContext<'_>,
) -> Option<ValidationError> {
    let timestamp = signature.evidence.timestamp.as_ref()?.generation_time?;
    let produced_at = signature.evidence.revocation.as_ref()?.produced_at?;

    let allowed = ctx.policy.max_allowed_minutes();
    if !is_within_minutes(timestamp, produced_at, allowed) {
        let delta_millis = timestamp
            .signed_duration_since(produced_at)
            .num_milliseconds()
            .abs();
        tracing::error!(
            delta_millis,
            allowed_minutes = allowed,
            "the difference between the OCSP response production time and the signature timestamp is too large"
        );
        return Some(
            ValidationError::new(
                ErrorKind::TimestampOcspDeltaTooLarge,
                format!(
                    "timestamp and OCSP response production time differ by {delta_millis} ms, \
                     more than the allowed {allowed} minutes"
                ),
            )
            .with_delta_millis(delta_millis),
        );
    }
    None
}
