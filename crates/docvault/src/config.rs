//! Ledger configuration.

use docvault_core::CertificationMode;
use serde::{Deserialize, Serialize};

/// Configuration for the Ledger.
///
/// Fixed for the lifetime of a ledger; the certification mode in particular
/// is a deployment constant, never chosen per document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Certification policy.
    pub certification: CertificationMode,

    /// Check that the latest stored version verifies before extending the chain.
    pub verify_chain_on_append: bool,

    /// Buffer size of the live event channel.
    pub event_channel_capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            certification: CertificationMode::MultiValidator,
            verify_chain_on_append: true,
            event_channel_capacity: 1024,
        }
    }
}

impl LedgerConfig {
    /// Default configuration with the given certification mode.
    pub fn with_mode(certification: CertificationMode) -> Self {
        Self {
            certification,
            ..Self::default()
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
