//! Validation chains: ordered step compositions per signature profile.

use crate::steps::{ValidationContext, ValidationStep, BASE_STEPS, DELTA_STEPS, FRESHNESS_STEPS};
use crate::time::TimeDeltaPolicy;
use crate::ValidationError;
use asice_container::Signature;
use tracing::debug;

/// Signature profile a validation policy is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureProfile {
    /// Trust from an OCSP timemark; no signature timestamp expected.
    Timemark,
    /// Trust from a signature timestamp plus OCSP revocation data.
    Timestamp,
}

/// A named, ordered list of validation steps.
///
/// Profile variants extend the base policy by *appending* steps, never by
/// replacing one: running an extended chain always produces a superset of
/// the findings the base chain would produce on the same evidence.
pub struct ValidationChain {
    name: &'static str,
    steps: Vec<&'static ValidationStep>,
}

impl ValidationChain {
    /// The base policy for timemark signatures: structural checks only.
    pub fn timemark() -> Self {
        Self {
            name: "timemark",
            steps: BASE_STEPS.iter().collect(),
        }
    }

    /// The timestamp-profile policy: the base steps, then revocation
    /// freshness, then the timestamp/OCSP delta check.
    pub fn timestamp() -> Self {
        let mut chain = Self::timemark();
        chain.name = "timestamp";
        chain.steps.extend(FRESHNESS_STEPS.iter());
        chain.steps.extend(DELTA_STEPS.iter());
        chain
    }

    /// The policy variant for a signature profile.
    pub fn for_profile(profile: SignatureProfile) -> Self {
        match profile {
            SignatureProfile::Timemark => Self::timemark(),
            SignatureProfile::Timestamp => Self::timestamp(),
        }
    }

    /// Policy name, e.g. `"timestamp"`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The steps of this chain, in execution order.
    pub fn steps(&self) -> &[&'static ValidationStep] {
        &self.steps
    }

    /// Run every step in order against one signature's evidence, returning
    /// the accumulated findings. Never short-circuits: a step finding a
    /// problem does not keep later steps from running, and the returned list
    /// is freshly owned by the caller.
    pub fn run(&self, signature: &Signature, policy: &TimeDeltaPolicy) -> Vec<ValidationError> {
        let ctx = ValidationContext { policy };
        let mut findings = Vec::new();
        for step in &self.steps {
            if let Some(finding) = (step.check)(signature, &ctx) {
                findings.push(finding);
            }
        }
        debug!(
            chain = self.name,
            findings = findings.len(),
            "validation chain completed"
        );
        findings
    }
}
