//! `paychan address`: Derive deterministic instance addresses.

use clap::{Args, Subcommand};
use paychan_core::types::Address;
use paychan_settlement::{channel_id, RegistryState};
use std::path::Path;

use super::load_config;

#[derive(Args, Debug)]
pub struct AddressArgs {
    #[command(subcommand)]
    pub target: AddressTarget,
}

#[derive(Subcommand, Debug)]
pub enum AddressTarget {
    /// Channel of an identity with an accountant.
    Channel {
        #[arg(long)]
        identity: Address,
        #[arg(long)]
        accountant: Address,
    },
    /// Accountant of an operator.
    Accountant {
        #[arg(long)]
        operator: Address,
    },
}

pub fn run(args: &AddressArgs, config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let registry = RegistryState::new(&config)?;

    match &args.target {
        AddressTarget::Channel {
            identity,
            accountant,
        } => {
            let channel = registry.channel_address(identity, accountant)?;
            println!("Channel:    {channel}");
            println!("Channel id: {}", channel_id(identity, accountant));
        }
        AddressTarget::Accountant { operator } => {
            println!("Accountant: {}", registry.accountant_address(operator)?);
        }
    }
    Ok(())
}
