//! Interfaces to node services the kernel consumes but does not own.

use serde::{Deserialize, Serialize};
use stake_kernel_core::Transaction;

/// Script verification flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptFlags(pub u32);

impl ScriptFlags {
    pub const NONE: Self = Self(0);
    pub const P2SH: Self = Self(1 << 0);
    pub const STRICT_ENCODING: Self = Self(1 << 1);
    pub const DER_SIGNATURES: Self = Self(1 << 2);
    pub const LOW_S: Self = Self(1 << 3);
    pub const NULL_DUMMY: Self = Self(1 << 4);

    /// Flags applied to coinstake signatures.
    pub const STANDARD: Self = Self(
        Self::P2SH.0
            | Self::STRICT_ENCODING.0
            | Self::DER_SIGNATURES.0
            | Self::LOW_S.0
            | Self::NULL_DUMMY.0,
    );

    pub fn contains(&self, other: ScriptFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

/// What a signature commits to: a transaction and one of its inputs.
#[derive(Debug, Clone, Copy)]
pub struct SignatureContext<'a> {
    pub transaction: &'a Transaction,
    pub input_index: usize,
}

/// Script interpreter.
pub trait ScriptVerifier: Send + Sync {
    fn verify_script(
        &self,
        script_sig: &[u8],
        script_pubkey: &[u8],
        flags: ScriptFlags,
        context: &SignatureContext<'_>,
    ) -> bool;
}

/// Network parameters that activate by height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterId {
    /// First height validated with the V2 kernel.
    StakingProtocolV2,
}

/// Source of activation heights.
pub trait ActivationSource: Send + Sync {
    fn activation_height(&self, id: ParameterId) -> u32;
}

/// Fixed activation heights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticActivation {
    pub staking_protocol_v2: u32,
}

impl StaticActivation {
    pub fn new(staking_protocol_v2: u32) -> Self {
        Self { staking_protocol_v2 }
    }
}

impl ActivationSource for StaticActivation {
    fn activation_height(&self, id: ParameterId) -> u32 {
        match id {
            ParameterId::StakingProtocolV2 => self.staking_protocol_v2,
        }
    }
}

impl<A: ActivationSource + ?Sized> ActivationSource for std::sync::Arc<A> {
    fn activation_height(&self, id: ParameterId) -> u32 {
        (**self).activation_height(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_flags() {
        assert!(ScriptFlags::STANDARD.contains(ScriptFlags::P2SH));
        assert!(ScriptFlags::STANDARD.contains(ScriptFlags::LOW_S));
        assert!(!ScriptFlags::NONE.contains(ScriptFlags::P2SH));
    }

    #[test]
    fn test_static_activation() {
        let activation = StaticActivation::new(1_000);
        assert_eq!(activation.activation_height(ParameterId::StakingProtocolV2), 1_000);
    }
}
