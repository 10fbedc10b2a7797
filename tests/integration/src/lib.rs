//! Fixtures shared by the integration scenarios.

use paychan_core::config::ProtocolConfig;
use paychan_core::types::{Address, Amount, ChannelId};
use paychan_crypto::{KeyPair, Promise, Registration, Signature, SignedMessage};
use paychan_settlement::{IdentityRegistration, Runtime};

/// Funds hub stakes and emergency top-ups.
pub const FUNDER: Address = Address([0xf0; 20]);
/// Submits promises and collects transactor fees.
pub const RELAYER: Address = Address([0x77; 20]);
pub const LOCK: [u8; 32] = [0x5a; 32];

/// Short timelocks so scenarios can walk past them.
pub fn fast_config() -> ProtocolConfig {
    ProtocolConfig {
        delay_blocks: 10,
        unit_blocks: 10,
        punishment_bps: 1_000,
        closing_delay_blocks: 20,
        ..ProtocolConfig::default()
    }
}

pub fn runtime(config: ProtocolConfig) -> Runtime {
    Runtime::new(config).expect("valid config")
}

/// A registered hub and the key of its operator.
pub struct Hub {
    pub address: Address,
    pub operator: KeyPair,
}

impl Hub {
    pub fn operator_address(&self) -> Address {
        self.operator.address()
    }

    /// Operator-signed promise for the hub record `channel_id`.
    pub fn promise(&self, channel_id: ChannelId, amount: Amount, fee: Amount) -> Signature {
        Promise::new(*channel_id.as_bytes(), amount, fee, &LOCK)
            .sign(&self.operator)
            .expect("sign promise")
    }
}

/// Register a hub staked by [`FUNDER`].
pub fn register_hub(rt: &mut Runtime, stake: Amount, fee: u16, max_loan: Amount) -> Hub {
    let operator = KeyPair::generate();
    let registry = rt.registry().address();
    rt.mint(FUNDER, stake).expect("mint stake");
    rt.approve(FUNDER, registry, stake).expect("approve stake");
    let address = rt
        .register_accountant(FUNDER, operator.address(), stake, fee, max_loan)
        .expect("register accountant");
    Hub { address, operator }
}

/// A registered identity with its channel.
pub struct Party {
    pub key: KeyPair,
    pub registration: IdentityRegistration,
}

impl Party {
    pub fn address(&self) -> Address {
        self.key.address()
    }

    pub fn channel(&self) -> Address {
        self.registration.channel
    }

    pub fn channel_id(&self) -> ChannelId {
        self.registration.channel_id
    }

    /// Identity-signed promise drawn on its own channel.
    pub fn promise(&self, amount: Amount, fee: Amount) -> Signature {
        Promise::new(self.channel().to_word(), amount, fee, &LOCK)
            .sign(&self.key)
            .expect("sign promise")
    }
}

/// Register a fresh identity with `hub`, prefunding its channel with the
/// registration fee, the loan and `deposit`. Payouts go to the identity.
pub fn register_party(rt: &mut Runtime, hub: &Hub, loan: Amount, deposit: Amount) -> Party {
    let key = KeyPair::generate();
    let registry = rt.registry().address();
    let message = Registration {
        registry,
        accountant: hub.address,
        loan,
        transactor_fee: 0,
        beneficiary: key.address(),
    };
    let signature = message.sign(&key).expect("sign registration");

    let channel = rt
        .channel_address(&key.address(), &hub.address)
        .expect("channel address");
    let prefund = rt.registry().registration_fee() + loan + deposit;
    rt.mint(channel, prefund).expect("prefund channel");

    let registration = rt
        .register_identity(RELAYER, hub.address, loan, 0, key.address(), &signature)
        .expect("register identity");
    tracing::debug!(identity = %registration.identity, "party registered");
    Party { key, registration }
}
