//! Integration test: registration and promise settlement across the
//! registry, consumer channels and the hub.

use paychan_core::state_machine::{AccountantStatus, ChannelPhase};
use paychan_crypto::{BalanceUpdate as BalanceUpdateMessage, KeyPair, Registration, SignedMessage};
use paychan_integration_tests::{
    fast_config, register_hub, register_party, runtime, LOCK, RELAYER,
};
use paychan_settlement::{Authorization, BalanceUpdate, SettledPromise, SettlementError};

// =========================================================================
// Registration
// =========================================================================

#[test]
fn test_registration_wires_channel_record_and_fee() {
    let mut config = fast_config();
    config.registration_fee = 7;
    let mut rt = runtime(config);
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    let registry = rt.registry().address();

    let provider = register_party(&mut rt, &hub, 60, 0);

    assert!(rt.is_registered(&provider.address()));
    assert_eq!(rt.balance_of(&registry), 7);
    assert_eq!(rt.channel_phase(&provider.channel()), ChannelPhase::Operating);
    assert_eq!(
        provider.channel(),
        rt.channel_address(&provider.address(), &hub.address).unwrap()
    );
    assert_eq!(
        provider.channel_id(),
        rt.get_channel_id(&hub.address, &provider.address())
    );

    let record = rt.channel_account(&hub.address, &provider.channel_id()).unwrap();
    assert_eq!(record.loan, 60);
    assert_eq!(record.balance, 60);
    assert_eq!(record.beneficiary, provider.address());
    assert_eq!(rt.balance_of(&hub.address), 160);
    assert_eq!(rt.minimal_expected_balance(&hub.address).unwrap(), 160);
}

#[test]
fn test_registration_to_paused_hub_rejected() {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    rt.pause_channel_opening(hub.operator_address(), hub.address)
        .unwrap();
    assert!(!rt.is_active_accountant(&hub.address));

    let identity = KeyPair::generate();
    let message = Registration {
        registry: rt.registry().address(),
        accountant: hub.address,
        loan: 0,
        transactor_fee: 0,
        beneficiary: identity.address(),
    };
    let signature = message.sign(&identity).unwrap();
    let channel = rt.channel_address(&identity.address(), &hub.address).unwrap();
    rt.mint(channel, 10).unwrap();
    let result = rt.register_identity(RELAYER, hub.address, 0, 0, identity.address(), &signature);
    assert!(result.is_err());
    assert!(!rt.is_registered(&identity.address()));
    assert_eq!(rt.channel_phase(&channel), ChannelPhase::Uninitialized);

    rt.resume_channel_opening(hub.operator_address(), hub.address)
        .unwrap();
    let result = rt.register_identity(RELAYER, hub.address, 0, 0, identity.address(), &signature);
    assert!(result.is_ok());
    assert!(rt.is_registered(&identity.address()));
}

// =========================================================================
// Hub settlement
// =========================================================================

#[test]
fn test_settlement_pays_beneficiary_minus_transactor_fee() {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    let provider = register_party(&mut rt, &hub, 60, 0);
    let id = provider.channel_id();

    let signature = hub.promise(id, 60, 5);
    let settled = rt
        .settle_promise(RELAYER, hub.address, id, 60, 5, &LOCK, &signature)
        .unwrap();
    assert_eq!(
        settled,
        SettledPromise {
            amount: 60,
            accountant_fee: 0,
            transactor_fee: 5,
            payout: 55,
            total_settled: 60,
        }
    );
    assert_eq!(rt.balance_of(&provider.address()), 55);
    assert_eq!(rt.balance_of(&RELAYER), 5);

    let record = rt.channel_account(&hub.address, &id).unwrap();
    assert_eq!(record.balance, 0);
    assert_eq!(record.settled, 60);
    assert_eq!(rt.balance_of(&hub.address), 100);

    // Promises are cumulative: replaying the same amount settles nothing
    let replay = rt.settle_promise(RELAYER, hub.address, id, 60, 5, &LOCK, &signature);
    assert!(matches!(replay, Err(SettlementError::NothingToSettle { .. })));
}

#[test]
fn test_promise_signed_by_stranger_rejected() {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    let provider = register_party(&mut rt, &hub, 60, 0);

    // The provider cannot sign its own hub promise
    let forged = paychan_crypto::Promise::new(*provider.channel_id().as_bytes(), 60, 0, &LOCK)
        .sign(&provider.key)
        .unwrap();
    let result = rt.settle_promise(
        RELAYER,
        hub.address,
        provider.channel_id(),
        60,
        0,
        &LOCK,
        &forged,
    );
    assert!(matches!(result, Err(SettlementError::Unauthorized(_))));
    assert_eq!(rt.balance_of(&provider.address()), 0);
}

#[test]
fn test_consumer_payment_funds_provider_rebalance() {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    let consumer = register_party(&mut rt, &hub, 0, 200);
    let provider = register_party(&mut rt, &hub, 60, 0);
    assert_eq!(rt.balance_of(&hub.address), 160);

    // Consumer → hub
    let paid = rt
        .settle_channel_promise(
            RELAYER,
            consumer.channel(),
            60,
            0,
            &LOCK,
            &consumer.promise(60, 0),
        )
        .unwrap();
    assert_eq!(paid.payout, 60);
    assert_eq!(rt.balance_of(&hub.address), 220);
    assert_eq!(rt.balance_of(&consumer.channel()), 140);

    // Hub → provider, then refill the provider's settleable balance
    let id = provider.channel_id();
    let settled = rt
        .settle_and_rebalance(RELAYER, hub.address, id, 60, 0, &LOCK, &hub.promise(id, 60, 0))
        .unwrap();
    assert_eq!(settled.payout, 60);
    assert_eq!(rt.balance_of(&provider.address()), 60);

    let record = rt.channel_account(&hub.address, &id).unwrap();
    assert_eq!(record.balance, 60);
    assert_eq!(rt.accountant_status(&hub.address).unwrap(), AccountantStatus::Active);
    assert_eq!(rt.available_balance(&hub.address).unwrap(), 0);
}

#[test]
fn test_channel_promise_clamped_to_custody() {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    let consumer = register_party(&mut rt, &hub, 0, 100);

    let first = rt
        .settle_channel_promise(RELAYER, consumer.channel(), 40, 3, &LOCK, &consumer.promise(40, 3))
        .unwrap();
    assert_eq!(first.payout, 37);
    assert_eq!(rt.balance_of(&RELAYER), 3);
    assert_eq!(rt.balance_of(&hub.address), 137);

    // 150 cumulative but only 60 left in custody
    let second = rt
        .settle_channel_promise(RELAYER, consumer.channel(), 150, 0, &LOCK, &consumer.promise(150, 0))
        .unwrap();
    assert_eq!(second.amount, 60);
    assert_eq!(second.total_settled, 100);
    assert_eq!(rt.balance_of(&consumer.channel()), 0);
}

// =========================================================================
// Fees and balances
// =========================================================================

#[test]
fn test_accountant_fee_applies_after_delay() {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    let provider = register_party(&mut rt, &hub, 100, 0);
    let id = provider.channel_id();

    let valid_from = rt
        .set_accountant_fee(hub.operator_address(), hub.address, 1_000)
        .unwrap();
    assert_eq!(valid_from, rt.block_number() + 10);
    assert_eq!(rt.active_fee(&hub.address).unwrap().value, 0);

    // A second change waits for the pending one to take effect
    let early = rt.set_accountant_fee(hub.operator_address(), hub.address, 500);
    assert!(matches!(early, Err(SettlementError::TimelockActive { .. })));

    let before = rt
        .settle_promise(RELAYER, hub.address, id, 50, 0, &LOCK, &hub.promise(id, 50, 0))
        .unwrap();
    assert_eq!(before.accountant_fee, 0);
    assert_eq!(before.payout, 50);

    rt.advance_blocks(10);
    assert_eq!(rt.active_fee(&hub.address).unwrap().value, 1_000);
    assert_eq!(rt.calculate_accountant_fee(&hub.address, 50).unwrap(), 5);

    let after = rt
        .settle_promise(RELAYER, hub.address, id, 100, 0, &LOCK, &hub.promise(id, 100, 0))
        .unwrap();
    assert_eq!(after.amount, 50);
    assert_eq!(after.accountant_fee, 5);
    assert_eq!(after.payout, 45);
    assert_eq!(rt.balance_of(&provider.address()), 95);
    assert_eq!(rt.balance_of(&hub.address), 105);
}

#[test]
fn test_two_phase_balance_decrease() {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    let provider = register_party(&mut rt, &hub, 50, 0);
    let id = provider.channel_id();
    let operator = hub.operator_address();

    // Raising the balance needs free custody
    let raise = rt.update_channel_balance(operator, hub.address, id, 80, 1, &Authorization::Direct);
    assert!(matches!(raise, Err(SettlementError::InsufficientFunds { .. })));
    rt.mint(hub.address, 30).unwrap();

    // Relayed with the operator's signature
    let message = BalanceUpdateMessage {
        channel_id: id,
        nonce: 1,
        new_balance: 80,
    };
    let signature = message.sign(&hub.operator).unwrap();
    let applied = rt
        .update_channel_balance(RELAYER, hub.address, id, 80, 1, &Authorization::Signed(signature))
        .unwrap();
    assert_eq!(applied, BalanceUpdate::Applied { balance: 80 });

    let requested = rt
        .update_channel_balance(operator, hub.address, id, 60, 2, &Authorization::Direct)
        .unwrap();
    let timelock = rt.block_number() + 10;
    assert_eq!(requested, BalanceUpdate::DecreaseRequested { timelock });
    assert_eq!(rt.channel_account(&hub.address, &id).unwrap().balance, 80);

    let early = rt.update_channel_balance(operator, hub.address, id, 60, 3, &Authorization::Direct);
    assert!(matches!(early, Err(SettlementError::TimelockActive { until }) if until == timelock));

    rt.advance_blocks(10);
    let applied = rt
        .update_channel_balance(operator, hub.address, id, 60, 3, &Authorization::Direct)
        .unwrap();
    assert_eq!(applied, BalanceUpdate::Applied { balance: 60 });
    assert_eq!(rt.channel_account(&hub.address, &id).unwrap().balance, 60);

    // Used nonces stay used
    let stale = rt.update_channel_balance(operator, hub.address, id, 70, 3, &Authorization::Direct);
    assert!(matches!(stale, Err(SettlementError::StaleNonce { .. })));
}

// =========================================================================
// Loans
// =========================================================================

#[test]
fn test_increase_loan_escrows_party_funds() {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 100);
    let provider = register_party(&mut rt, &hub, 60, 0);
    let id = provider.channel_id();
    rt.mint(provider.address(), 50).unwrap();
    rt.approve(provider.address(), hub.address, 50).unwrap();
    rt.take_events();

    rt.increase_loan(provider.address(), hub.address, id, 30).unwrap();
    let record = rt.channel_account(&hub.address, &id).unwrap();
    assert_eq!(record.loan, 90);
    assert_eq!(record.balance, 90);
    assert_eq!(rt.balance_of(&provider.address()), 20);
    assert_eq!(rt.balance_of(&hub.address), 190);
    assert_eq!(rt.minimal_expected_balance(&hub.address).unwrap(), 190);

    let events: Vec<serde_json::Value> = rt
        .take_events()
        .iter()
        .map(|event| serde_json::to_value(event).unwrap())
        .collect();
    let kinds: Vec<&str> = events.iter().filter_map(|e| e["type"].as_str()).collect();
    assert_eq!(kinds, ["new_loan", "channel_balance_updated"]);
    assert_eq!(events[0]["loan"], 90);
    assert_eq!(events[1]["balance"], 90);

    // Past the per-channel cap of 100
    let over = rt.increase_loan(provider.address(), hub.address, id, 20);
    assert!(matches!(
        over,
        Err(SettlementError::LoanLimitExceeded {
            requested: 110,
            limit: 100
        })
    ));
    let zero = rt.increase_loan(provider.address(), hub.address, id, 0);
    assert!(matches!(zero, Err(SettlementError::ZeroAmount(_))));
    assert_eq!(rt.balance_of(&provider.address()), 20);
    assert_eq!(rt.channel_account(&hub.address, &id).unwrap().loan, 90);
}

#[test]
fn test_increase_loan_after_settlement_keeps_hub_solvent() {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    let provider = register_party(&mut rt, &hub, 100, 0);
    let other = register_party(&mut rt, &hub, 0, 0);
    let id = provider.channel_id();

    rt.mint(hub.address, 300).unwrap();
    rt.update_channel_balance(
        hub.operator_address(),
        hub.address,
        other.channel_id(),
        300,
        1,
        &Authorization::Direct,
    )
    .unwrap();
    rt.settle_promise(RELAYER, hub.address, id, 60, 0, &LOCK, &hub.promise(id, 60, 0))
        .unwrap();
    assert_eq!(rt.balance_of(&hub.address), 440);
    assert_eq!(rt.minimal_expected_balance(&hub.address).unwrap(), 440);

    rt.mint(provider.address(), 10).unwrap();
    rt.approve(provider.address(), hub.address, 10).unwrap();
    rt.increase_loan(provider.address(), hub.address, id, 10).unwrap();

    // Only the pulled 10 is added to the settleable balance
    let record = rt.channel_account(&hub.address, &id).unwrap();
    assert_eq!(record.loan, 110);
    assert_eq!(record.balance, 50);
    assert_eq!(rt.balance_of(&hub.address), 450);
    assert!(rt.balance_of(&hub.address) >= rt.minimal_expected_balance(&hub.address).unwrap());
    assert_eq!(rt.accountant_status(&hub.address).unwrap(), AccountantStatus::Active);
}

#[test]
fn test_closed_hub_settles_but_takes_no_new_loans() {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    let provider = register_party(&mut rt, &hub, 60, 0);
    let id = provider.channel_id();
    rt.close_accountant(hub.operator_address(), hub.address).unwrap();

    rt.mint(provider.address(), 10).unwrap();
    rt.approve(provider.address(), hub.address, 10).unwrap();
    let loan = rt.increase_loan(provider.address(), hub.address, id, 10);
    assert!(matches!(loan, Err(SettlementError::InvalidState(_))));

    // The balance left below its loan is not refilled once closed
    let settled = rt
        .settle_and_rebalance(RELAYER, hub.address, id, 40, 0, &LOCK, &hub.promise(id, 40, 0))
        .unwrap();
    assert_eq!(settled.payout, 40);
    assert_eq!(rt.balance_of(&provider.address()), 50);
    assert_eq!(rt.channel_account(&hub.address, &id).unwrap().balance, 20);
    assert_eq!(rt.accountant_status(&hub.address).unwrap(), AccountantStatus::Closed);
}
