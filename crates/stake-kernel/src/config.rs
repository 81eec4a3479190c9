//! Kernel configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stake_kernel_core::{CoreError, NetworkParams};

use crate::error::Result;
use crate::external::StaticActivation;

/// Height from which the V2 kernel applies when no activation source is given.
pub const DEFAULT_STAKING_PROTOCOL_V2_HEIGHT: u32 = 0;

/// Default delay between staker search rounds.
pub const DEFAULT_STAKER_POLL_MS: u64 = 500;

/// Configuration for a kernel instance.
///
/// Missing fields take their defaults, so a file may name only what it
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KernelConfig {
    /// Protocol constants.
    pub params: NetworkParams,
    /// First height validated with the V2 kernel.
    pub staking_protocol_v2_height: u32,
    /// Milliseconds between staker search rounds.
    pub staker_poll_ms: u64,
}

impl KernelConfig {
    pub fn new(params: NetworkParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Parse from JSON. Embedded params are validated while parsing.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::from(e).into())
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(CoreError::from)?;
        Self::from_json_str(&contents)
    }

    pub fn with_v2_height(mut self, height: u32) -> Self {
        self.staking_protocol_v2_height = height;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.staker_poll_ms = interval.as_millis() as u64;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.staker_poll_ms.max(1))
    }

    /// Activation heights fixed by this configuration.
    pub fn activation(&self) -> StaticActivation {
        StaticActivation::new(self.staking_protocol_v2_height)
    }
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            params: NetworkParams::mainnet(),
            staking_protocol_v2_height: DEFAULT_STAKING_PROTOCOL_V2_HEIGHT,
            staker_poll_ms: DEFAULT_STAKER_POLL_MS,
        }
    }
}
