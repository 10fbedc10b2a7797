//! Integration test: channel exit and deterministic addressing.

use paychan_core::state_machine::ChannelPhase;
use paychan_core::types::Address;
use paychan_crypto::{create2_address, channel_salt, proxy_code_hash, ExitRequest, SignedMessage};
use paychan_integration_tests::{fast_config, register_hub, register_party, runtime, RELAYER};
use paychan_settlement::{Authorization, SettlementError};

const EXIT_TO: Address = Address([0xe0; 20]);

#[test]
fn test_exit_sweeps_channel_after_timelock() {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    let consumer = register_party(&mut rt, &hub, 0, 100);
    let channel = consumer.channel();

    let valid_until = rt.block_number() + 5;
    let request = ExitRequest {
        channel,
        beneficiary: EXIT_TO,
        valid_until,
    };
    let signature = request.sign(&consumer.key).unwrap();
    let timelock = rt
        .request_exit(RELAYER, channel, EXIT_TO, valid_until, &Authorization::Signed(signature))
        .unwrap();
    assert_eq!(timelock, rt.block_number() + 10);
    assert_eq!(rt.channel_phase(&channel), ChannelPhase::ExitRequested);

    let twice = rt.request_exit(
        consumer.address(),
        channel,
        EXIT_TO,
        valid_until,
        &Authorization::Direct,
    );
    assert!(matches!(twice, Err(SettlementError::InvalidState(_))));

    let early = rt.finalize_exit(RELAYER, channel);
    assert!(matches!(early, Err(SettlementError::TimelockActive { .. })));

    rt.advance_blocks(10);
    assert_eq!(rt.finalize_exit(RELAYER, channel).unwrap(), 100);
    assert_eq!(rt.balance_of(&EXIT_TO), 100);
    assert_eq!(rt.channel_phase(&channel), ChannelPhase::Closed);

    // The instance persists and reopens once value arrives again
    rt.mint(channel, 5).unwrap();
    assert_eq!(rt.channel_phase(&channel), ChannelPhase::Operating);
}

#[test]
fn test_exit_request_must_expire_before_timelock() {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    let consumer = register_party(&mut rt, &hub, 0, 100);

    let valid_until = rt.block_number() + 10;
    let result = rt.request_exit(
        consumer.address(),
        consumer.channel(),
        EXIT_TO,
        valid_until,
        &Authorization::Direct,
    );
    assert!(matches!(result, Err(SettlementError::InvalidState(_))));
    assert_eq!(rt.channel_phase(&consumer.channel()), ChannelPhase::Operating);
}

#[test]
fn test_exit_signed_by_stranger_rejected() {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    let consumer = register_party(&mut rt, &hub, 0, 100);

    let valid_until = rt.block_number() + 5;
    let request = ExitRequest {
        channel: consumer.channel(),
        beneficiary: EXIT_TO,
        valid_until,
    };
    let forged = request.sign(&hub.operator).unwrap();
    let result = rt.request_exit(
        RELAYER,
        consumer.channel(),
        EXIT_TO,
        valid_until,
        &Authorization::Signed(forged),
    );
    assert!(matches!(result, Err(SettlementError::Unauthorized(_))));
}

#[test]
fn test_addresses_are_deterministic() {
    let mut rt = runtime(fast_config());
    let identity = Address([0x42; 20]);
    let operator = Address([0x43; 20]);

    let hub = rt.accountant_address(&operator).unwrap();
    assert_eq!(hub, rt.accountant_address(&operator).unwrap());

    // Channel address is CREATE2 over the proxy for the channel implementation
    let config = rt.config().clone();
    let expected = create2_address(
        &config.deployment.registry,
        &channel_salt(&identity, &hub),
        &proxy_code_hash(&config.deployment.channel_implementation),
    );
    assert_eq!(rt.channel_address(&identity, &hub).unwrap(), expected);

    // Distinct parties never collide
    let other = rt.channel_address(&Address([0x44; 20]), &hub).unwrap();
    assert_ne!(other, expected);

    // Another runtime with the same config derives the same addresses
    let twin = runtime(config);
    assert_eq!(twin.accountant_address(&operator).unwrap(), hub);
    assert_eq!(twin.channel_address(&identity, &hub).unwrap(), expected);

    // Registration lands exactly there
    let registered = register_hub(&mut rt, 10, 0, 0);
    assert_eq!(
        registered.address,
        rt.accountant_address(&registered.operator_address()).unwrap()
    );
}
