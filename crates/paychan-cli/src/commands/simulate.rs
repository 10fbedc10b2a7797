//! `paychan simulate`: Register a hub, a consumer and a provider on an
//! in-memory ledger, then route one payment consumer → hub → provider.

use clap::Args;
use paychan_core::state_machine::AccountantStatus;
use paychan_core::types::{Address, Amount};
use paychan_crypto::{KeyPair, Promise, Registration, SignedMessage};
use paychan_settlement::{Event, IdentityRegistration, Runtime, SettledPromise};
use serde::Serialize;
use std::path::Path;

use super::load_config;

const FUNDER: Address = Address([0xf0; 20]);
const RELAYER: Address = Address([0x77; 20]);

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Accountant stake.
    #[arg(long, default_value_t = 1_000)]
    pub stake: Amount,

    /// Accountant fee in hundredths of a percent.
    #[arg(long, default_value_t = 200)]
    pub fee: u16,

    /// Consumer channel deposit.
    #[arg(long, default_value_t = 500)]
    pub deposit: Amount,

    /// Provider loan (the provider's settleable balance on the hub).
    #[arg(long, default_value_t = 200)]
    pub loan: Amount,

    /// Cumulative amount promised by the consumer and then by the hub.
    #[arg(long, default_value_t = 100)]
    pub amount: Amount,

    /// Include the emitted events in the output.
    #[arg(long)]
    pub events: bool,
}

#[derive(Serialize)]
struct Summary {
    accountant: Address,
    consumer: IdentityRegistration,
    provider: IdentityRegistration,
    consumer_settlement: SettledPromise,
    provider_settlement: SettledPromise,
    provider_beneficiary_balance: Amount,
    accountant_custody: Amount,
    accountant_available: Amount,
    accountant_status: AccountantStatus,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    events: Vec<Event>,
}

pub fn run(args: &SimulateArgs, config_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let registration_fee = Amount::from(config.registration_fee);
    let mut rt = Runtime::new(config)?;
    let registry = rt.registry().address();

    let operator = KeyPair::generate();
    rt.mint(FUNDER, args.stake)?;
    rt.approve(FUNDER, registry, args.stake)?;
    let hub = rt.register_accountant(FUNDER, operator.address(), args.stake, args.fee, args.loan)?;
    tracing::info!(%hub, "accountant registered");

    let consumer_key = KeyPair::generate();
    let consumer = register(
        &mut rt,
        &consumer_key,
        hub,
        0,
        registration_fee + args.deposit,
    )?;

    let provider_key = KeyPair::generate();
    let provider = register(
        &mut rt,
        &provider_key,
        hub,
        args.loan,
        registration_fee + args.loan,
    )?;

    let lock = [0x5a; 32];

    // Consumer pays the hub through its channel
    let promise = Promise::new(consumer.channel.to_word(), args.amount, 0, &lock);
    let signature = promise.sign(&consumer_key)?;
    let consumer_settlement =
        rt.settle_channel_promise(RELAYER, consumer.channel, args.amount, 0, &lock, &signature)?;

    // Hub pays the provider and refills the provider's balance
    let promise = Promise::new(*provider.channel_id.as_bytes(), args.amount, 0, &lock);
    let signature = promise.sign(&operator)?;
    let provider_settlement = rt.settle_and_rebalance(
        RELAYER,
        hub,
        provider.channel_id,
        args.amount,
        0,
        &lock,
        &signature,
    )?;

    let summary = Summary {
        accountant: hub,
        consumer,
        provider,
        consumer_settlement,
        provider_settlement,
        provider_beneficiary_balance: rt.balance_of(&provider_key.address()),
        accountant_custody: rt.balance_of(&hub),
        accountant_available: rt.available_balance(&hub)?,
        accountant_status: rt.accountant_status(&hub)?,
        events: if args.events {
            rt.take_events()
        } else {
            Vec::new()
        },
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Prefund the identity's channel address with `prefund` and register it,
/// paying out to the identity itself.
fn register(
    rt: &mut Runtime,
    identity: &KeyPair,
    hub: Address,
    loan: Amount,
    prefund: Amount,
) -> anyhow::Result<IdentityRegistration> {
    let message = Registration {
        registry: rt.registry().address(),
        accountant: hub,
        loan,
        transactor_fee: 0,
        beneficiary: identity.address(),
    };
    let signature = message.sign(identity)?;

    let channel = rt.channel_address(&identity.address(), &hub)?;
    rt.mint(channel, prefund)?;
    let registration = rt.register_identity(RELAYER, hub, loan, 0, identity.address(), &signature)?;
    tracing::info!(identity = %registration.identity, channel = %registration.channel, "identity registered");
    Ok(registration)
}
