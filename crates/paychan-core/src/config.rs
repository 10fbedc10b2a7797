use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CoreError;
use crate::types::{Address, BlockNumber};

/// Fee ceiling in hundredths of a percent (50.00%).
pub const MAX_ACCOUNTANT_FEE: u16 = 5_000;

/// Protocol parameters shared by the registry, channels, and accountants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Timelock for balance decreases, channel exits, and fee activation.
    #[serde(default = "default_delay_blocks")]
    pub delay_blocks: BlockNumber,
    /// Length of one punishment time unit.
    #[serde(default = "default_unit_blocks")]
    pub unit_blocks: BlockNumber,
    /// Penalty per unit, in basis points of locked funds.
    #[serde(default = "default_punishment_bps")]
    pub punishment_bps: u32,
    /// Cooldown between closing an accountant and returning its stake.
    #[serde(default = "default_closing_delay_blocks")]
    pub closing_delay_blocks: BlockNumber,
    /// Upper bound for accountant fees, in hundredths of a percent.
    #[serde(default = "default_max_fee")]
    pub max_fee: u16,
    /// Fee retained by the registry for every identity registration.
    /// Kept as `u64` because TOML integers are 64-bit.
    #[serde(default)]
    pub registration_fee: u64,
    /// Smallest stake an accountant may register with.
    #[serde(default)]
    pub minimal_accountant_stake: u64,
    /// Deployment addresses.
    #[serde(default)]
    pub deployment: DeploymentConfig,
}

/// Addresses of the registry and of the shared implementations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    #[serde(default = "default_registry")]
    pub registry: Address,
    #[serde(default = "default_registry_owner")]
    pub registry_owner: Address,
    #[serde(default = "default_ledger")]
    pub ledger: Address,
    #[serde(default = "default_channel_implementation")]
    pub channel_implementation: Address,
    #[serde(default = "default_accountant_implementation")]
    pub accountant_implementation: Address,
    /// Exchange target handed to channels at initialization.
    #[serde(default)]
    pub dex: Address,
}

impl ProtocolConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, CoreError> {
        let config: Self =
            toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Write configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Reject parameter combinations the protocol cannot operate with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.unit_blocks == 0 {
            return Err(CoreError::Config("unit_blocks must be positive".into()));
        }
        if self.max_fee > MAX_ACCOUNTANT_FEE {
            return Err(CoreError::Config(format!(
                "max_fee {} exceeds {}",
                self.max_fee, MAX_ACCOUNTANT_FEE
            )));
        }
        if self.deployment.registry.is_zero() {
            return Err(CoreError::ZeroAddress("deployment.registry"));
        }
        Ok(())
    }
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            delay_blocks: default_delay_blocks(),
            unit_blocks: default_unit_blocks(),
            punishment_bps: default_punishment_bps(),
            closing_delay_blocks: default_closing_delay_blocks(),
            max_fee: default_max_fee(),
            registration_fee: 0,
            minimal_accountant_stake: 0,
            deployment: DeploymentConfig::default(),
        }
    }
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            registry: default_registry(),
            registry_owner: default_registry_owner(),
            ledger: default_ledger(),
            channel_implementation: default_channel_implementation(),
            accountant_implementation: default_accountant_implementation(),
            dex: Address::ZERO,
        }
    }
}

fn default_delay_blocks() -> BlockNumber {
    18_000
}
fn default_unit_blocks() -> BlockNumber {
    257
}
fn default_punishment_bps() -> u32 {
    4
}
fn default_closing_delay_blocks() -> BlockNumber {
    180_000
}
fn default_max_fee() -> u16 {
    MAX_ACCOUNTANT_FEE
}
fn default_registry() -> Address {
    Address([0x10; 20])
}
fn default_registry_owner() -> Address {
    Address([0x11; 20])
}
fn default_ledger() -> Address {
    Address([0x20; 20])
}
fn default_channel_implementation() -> Address {
    Address([0x30; 20])
}
fn default_accountant_implementation() -> Address {
    Address([0x40; 20])
}
