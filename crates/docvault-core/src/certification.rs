//! Certification: which validators have signed a document.
//!
//! Two policies exist and are chosen per deployment:
//!
//! - **Multi-validator**: any number of distinct validators sign independently.
//!   Each validator signs at most once per round.
//! - **Single-certifier**: one canonical signature slot. The first validator to
//!   sign fills it and every later attempt is refused, whoever makes it.
//!
//! In both modes the first accepted signature activates the document.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::Principal;

/// Certification policy of a deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CertificationMode {
    /// Distinct validators accumulate signatures.
    #[default]
    #[serde(alias = "multi")]
    MultiValidator,
    /// First signature fills the only slot.
    #[serde(alias = "single")]
    SingleCertifier,
}

impl fmt::Display for CertificationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MultiValidator => f.write_str("multi-validator"),
            Self::SingleCertifier => f.write_str("single-certifier"),
        }
    }
}

impl FromStr for CertificationMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multi" | "multi-validator" => Ok(Self::MultiValidator),
            "single" | "single-certifier" => Ok(Self::SingleCertifier),
            other => Err(CoreError::UnknownCertificationMode(other.to_owned())),
        }
    }
}

/// One signature fact: `validator` certified the document at `signed_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureRecord {
    pub validator: Principal,
    pub signed_at: i64,
}

/// Why a signature was refused by the certification rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignRefusal {
    /// This validator already signed (multi-validator mode).
    ValidatorAlreadySigned,
    /// The canonical slot is taken (single-certifier mode).
    SlotFilled { signer: Principal },
}

/// Signatures of the current certification round, in signing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certification {
    signatures: Vec<SignatureRecord>,
}

impl Certification {
    /// Rebuild from stored signatures (in signing order).
    pub fn from_signatures(signatures: Vec<SignatureRecord>) -> Self {
        Self { signatures }
    }

    /// Check whether `validator` may sign under `mode`. Pure.
    pub fn check(&self, mode: CertificationMode, validator: &Principal) -> Result<(), SignRefusal> {
        match mode {
            CertificationMode::MultiValidator => {
                if self.has_signed(validator) {
                    Err(SignRefusal::ValidatorAlreadySigned)
                } else {
                    Ok(())
                }
            }
            CertificationMode::SingleCertifier => match self.signatures.first() {
                Some(first) => Err(SignRefusal::SlotFilled {
                    signer: first.validator.clone(),
                }),
                None => Ok(()),
            },
        }
    }

    /// Whether no validator may ever sign again under `mode`.
    ///
    /// Only a filled single-certifier slot is final; multi-validator rounds
    /// stay open to validators who have not signed.
    pub fn is_final(&self, mode: CertificationMode) -> bool {
        mode == CertificationMode::SingleCertifier && !self.signatures.is_empty()
    }

    /// Check and record a signature. Leaves `self` unchanged on refusal.
    pub fn sign(
        &mut self,
        mode: CertificationMode,
        validator: Principal,
        now: i64,
    ) -> Result<(), SignRefusal> {
        self.check(mode, &validator)?;
        self.signatures.push(SignatureRecord {
            validator,
            signed_at: now,
        });
        Ok(())
    }

    /// Whether `validator` has signed.
    pub fn has_signed(&self, validator: &Principal) -> bool {
        self.signatures.iter().any(|s| &s.validator == validator)
    }

    /// The signature of `validator`, if any.
    pub fn signature_of(&self, validator: &Principal) -> Option<&SignatureRecord> {
        self.signatures.iter().find(|s| &s.validator == validator)
    }

    /// The first signature of the round (the canonical slot in single mode).
    pub fn first(&self) -> Option<&SignatureRecord> {
        self.signatures.first()
    }

    /// All signatures in signing order.
    pub fn signatures(&self) -> &[SignatureRecord] {
        &self.signatures
    }

    /// Number of signatures.
    pub fn count(&self) -> usize {
        self.signatures.len()
    }

    /// Whether nobody has signed yet.
    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}
