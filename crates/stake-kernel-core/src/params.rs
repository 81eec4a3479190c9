//! Network parameters.
//!
//! Every protocol constant the kernel reads lives in [`NetworkParams`], an
//! immutable value threaded through each call. Nothing is read from ambient
//! global state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::crypto::HashAlgorithm;
use crate::error::CoreError;

/// Number of modifier selection rounds (one per modifier bit).
pub const MODIFIER_BITS: usize = 64;

/// Ratio of the last selection section to the first.
pub const MODIFIER_INTERVAL_RATIO: u32 = 3;

/// Modifier handed to the block directly after genesis.
pub const FIRST_BLOCK_STAKE_MODIFIER: u64 = u64::from_le_bytes(*b"stakemod");

/// Which chain a parameter set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    Main,
    Test,
    Dev,
}

/// Protocol constants for one network.
///
/// Deserialization validates, so a loaded value never carries a zero
/// interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNetworkParams")]
pub struct NetworkParams {
    pub network: Network,

    pub hash_algorithm: HashAlgorithm,

    /// Seconds between stake modifier regenerations.
    pub modifier_interval: u32,

    pub modifier_interval_ratio: u32,

    /// Minimum coin age before it may stake, in seconds.
    pub stake_min_age: u32,

    /// Granularity of V2 search timestamps, in seconds.
    pub stake_interval: u32,

    /// How far into the future a stake timestamp may be probed.
    pub max_future_drift: u32,

    /// How far behind the tip time a V2 search may reach.
    pub max_past_time_secs: u32,

    /// Cap on how far behind median-time-past a V1 search may reach.
    pub max_v1_past_probe: u32,

    /// Expected seconds between blocks.
    pub stake_target_spacing: u32,

    /// Known stake-modifier checksums by height.
    pub modifier_checkpoints: BTreeMap<u32, u32>,
}

/// Wire form of [`NetworkParams`] before validation.
#[derive(Deserialize)]
struct RawNetworkParams {
    network: Network,
    #[serde(default)]
    hash_algorithm: HashAlgorithm,
    modifier_interval: u32,
    #[serde(default = "default_ratio")]
    modifier_interval_ratio: u32,
    stake_min_age: u32,
    stake_interval: u32,
    max_future_drift: u32,
    max_past_time_secs: u32,
    max_v1_past_probe: u32,
    stake_target_spacing: u32,
    #[serde(default)]
    modifier_checkpoints: BTreeMap<u32, u32>,
}

fn default_ratio() -> u32 {
    MODIFIER_INTERVAL_RATIO
}

impl TryFrom<RawNetworkParams> for NetworkParams {
    type Error = CoreError;

    fn try_from(raw: RawNetworkParams) -> Result<Self, Self::Error> {
        let params = Self {
            network: raw.network,
            hash_algorithm: raw.hash_algorithm,
            modifier_interval: raw.modifier_interval,
            modifier_interval_ratio: raw.modifier_interval_ratio,
            stake_min_age: raw.stake_min_age,
            stake_interval: raw.stake_interval,
            max_future_drift: raw.max_future_drift,
            max_past_time_secs: raw.max_past_time_secs,
            max_v1_past_probe: raw.max_v1_past_probe,
            stake_target_spacing: raw.stake_target_spacing,
            modifier_checkpoints: raw.modifier_checkpoints,
        };
        params.validate()?;
        Ok(params)
    }
}

impl NetworkParams {
    /// Main network.
    pub fn mainnet() -> Self {
        Self {
            network: Network::Main,
            hash_algorithm: HashAlgorithm::Sha256d,
            modifier_interval: 60,
            modifier_interval_ratio: MODIFIER_INTERVAL_RATIO,
            stake_min_age: 60 * 60,
            stake_interval: 10,
            max_future_drift: 180,
            max_past_time_secs: 60,
            max_v1_past_probe: 100,
            stake_target_spacing: 60,
            modifier_checkpoints: BTreeMap::new(),
        }
    }

    /// Test network: shorter modifier interval and min age.
    pub fn testnet() -> Self {
        Self {
            network: Network::Test,
            modifier_interval: 20,
            stake_min_age: 10 * 60,
            ..Self::mainnet()
        }
    }

    /// Start a builder from the main network values.
    pub fn builder() -> NetworkParamsBuilder {
        NetworkParamsBuilder::new()
    }

    /// Parse from JSON. Validation runs as part of deserialization.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load and validate from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Reject parameter sets that would divide by zero or loop forever.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.modifier_interval == 0 {
            return Err(CoreError::InvalidParams("modifier_interval must be > 0".into()));
        }
        if self.modifier_interval_ratio < 1 {
            return Err(CoreError::InvalidParams(
                "modifier_interval_ratio must be >= 1".into(),
            ));
        }
        if self.stake_interval == 0 {
            return Err(CoreError::InvalidParams("stake_interval must be > 0".into()));
        }
        if self.stake_target_spacing == 0 {
            return Err(CoreError::InvalidParams(
                "stake_target_spacing must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Length in seconds of selection section `section`.
    ///
    /// `interval * 63 / (63 + (63 - section) * (ratio - 1))`, so the last
    /// section equals the full modifier interval.
    pub fn selection_interval_section(&self, section: usize) -> Result<i64, CoreError> {
        if section >= MODIFIER_BITS {
            return Err(CoreError::SectionOutOfRange(section));
        }
        let interval = i64::from(self.modifier_interval);
        let ratio = i64::from(self.modifier_interval_ratio);
        let section = section as i64;
        Ok(interval * 63 / (63 + (63 - section) * (ratio - 1)))
    }

    /// Total selection window in seconds: the sum of all 64 sections.
    pub fn selection_interval(&self) -> i64 {
        (0..MODIFIER_BITS)
            .filter_map(|section| self.selection_interval_section(section).ok())
            .sum()
    }

    /// The modifier-interval bucket a timestamp falls in.
    pub fn modifier_bucket(&self, time: i64) -> i64 {
        time / i64::from(self.modifier_interval)
    }
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self::mainnet()
    }
}

/// Builder for synthetic parameter sets.
#[derive(Debug, Clone)]
pub struct NetworkParamsBuilder {
    params: NetworkParams,
}

impl NetworkParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: NetworkParams {
                network: Network::Dev,
                ..NetworkParams::mainnet()
            },
        }
    }

    pub fn network(mut self, network: Network) -> Self {
        self.params.network = network;
        self
    }

    pub fn hash_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.params.hash_algorithm = algorithm;
        self
    }

    pub fn modifier_interval(mut self, secs: u32) -> Self {
        self.params.modifier_interval = secs;
        self
    }

    pub fn modifier_interval_ratio(mut self, ratio: u32) -> Self {
        self.params.modifier_interval_ratio = ratio;
        self
    }

    pub fn stake_min_age(mut self, secs: u32) -> Self {
        self.params.stake_min_age = secs;
        self
    }

    pub fn stake_interval(mut self, secs: u32) -> Self {
        self.params.stake_interval = secs;
        self
    }

    pub fn max_future_drift(mut self, secs: u32) -> Self {
        self.params.max_future_drift = secs;
        self
    }

    pub fn max_past_time_secs(mut self, secs: u32) -> Self {
        self.params.max_past_time_secs = secs;
        self
    }

    pub fn max_v1_past_probe(mut self, secs: u32) -> Self {
        self.params.max_v1_past_probe = secs;
        self
    }

    pub fn stake_target_spacing(mut self, secs: u32) -> Self {
        self.params.stake_target_spacing = secs;
        self
    }

    pub fn modifier_checkpoint(mut self, height: u32, checksum: u32) -> Self {
        self.params.modifier_checkpoints.insert(height, checksum);
        self
    }

    pub fn build(self) -> Result<NetworkParams, CoreError> {
        self.params.validate()?;
        Ok(self.params)
    }
}

impl Default for NetworkParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
