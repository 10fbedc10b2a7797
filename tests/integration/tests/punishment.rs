//! Integration test: hub solvency, the punishment cycle, loan returns and
//! the close / stake-back lifecycle.

use paychan_core::state_machine::AccountantStatus;
use paychan_integration_tests::{
    fast_config, register_hub, register_party, runtime, Hub, Party, FUNDER, LOCK, RELAYER,
};
use paychan_settlement::{Authorization, EmergencyResolution, Runtime, SettlementError};

/// Hub with stake 100 and one provider whose 60 loan was fully paid out,
/// leaving the hub at exactly its stake.
fn drained_provider() -> (Runtime, Hub, Party) {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    let provider = register_party(&mut rt, &hub, 60, 0);
    let id = provider.channel_id();
    rt.settle_promise(RELAYER, hub.address, id, 60, 0, &LOCK, &hub.promise(id, 60, 0))
        .unwrap();
    assert_eq!(rt.balance_of(&hub.address), 100);
    (rt, hub, provider)
}

#[test]
fn test_rebalance_shortfall_caps_increase_and_accrues_penalty() {
    let (mut rt, hub, provider) = drained_provider();
    let id = provider.channel_id();

    // Partial refill: only 25 of the 60 owed can be restored
    rt.mint(hub.address, 25).unwrap();
    let increase = rt.rebalance_channel(RELAYER, hub.address, id).unwrap();
    assert_eq!(increase, 25);
    assert_eq!(
        rt.accountant_status(&hub.address).unwrap(),
        AccountantStatus::Punishment
    );
    assert_eq!(rt.channel_account(&hub.address, &id).unwrap().balance, 25);
    let activated = rt.accountant(&hub.address).unwrap().punishment.activation_block;
    assert_eq!(activated, rt.block_number());

    // Withdrawals are frozen while punished
    let withdraw = rt.withdraw(hub.operator_address(), hub.address, FUNDER, 1);
    assert!(matches!(withdraw, Err(SettlementError::InvalidState(_))));

    // A second shortfall keeps the original activation block
    rt.advance_blocks(20);
    assert_eq!(rt.rebalance_channel(RELAYER, hub.address, id).unwrap(), 0);
    assert_eq!(
        rt.accountant(&hub.address).unwrap().punishment.activation_block,
        activated
    );

    // 40 blocks = 4 units; the first is free. 10% of 25 locked rounds up to 3.
    rt.advance_blocks(20);
    rt.mint(FUNDER, 35).unwrap();
    rt.approve(FUNDER, hub.address, 35).unwrap();
    let resolution = rt.resolve_emergency(FUNDER, hub.address).unwrap();
    assert_eq!(
        resolution,
        EmergencyResolution {
            penalty: 9,
            topped_up: 35,
        }
    );
    assert_eq!(
        rt.accountant_status(&hub.address).unwrap(),
        AccountantStatus::Active
    );
    // max(25, 60) + max(100, 9)
    assert_eq!(rt.balance_of(&hub.address), 160);
    assert_eq!(rt.minimal_expected_balance(&hub.address).unwrap(), 160);
}

#[test]
fn test_resolve_without_punishment_rejected() {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    let result = rt.resolve_emergency(FUNDER, hub.address);
    assert!(matches!(result, Err(SettlementError::InvalidState(_))));
}

#[test]
fn test_decrease_loan_solvent_pays_in_full() {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    let provider = register_party(&mut rt, &hub, 60, 0);
    let id = provider.channel_id();

    let paid = rt
        .decrease_loan(provider.address(), hub.address, id, 20, 1, &Authorization::Direct)
        .unwrap();
    assert_eq!(paid, 20);
    assert_eq!(rt.balance_of(&provider.address()), 20);

    let record = rt.channel_account(&hub.address, &id).unwrap();
    assert_eq!(record.loan, 40);
    assert_eq!(record.balance, 40);
    assert_eq!(
        rt.accountant_status(&hub.address).unwrap(),
        AccountantStatus::Active
    );
}

#[test]
fn test_decrease_loan_in_shortfall_pays_what_custody_allows() {
    let (mut rt, hub, provider) = drained_provider();
    let id = provider.channel_id();
    rt.mint(hub.address, 30).unwrap();

    let paid = rt
        .decrease_loan(provider.address(), hub.address, id, 60, 1, &Authorization::Direct)
        .unwrap();
    assert_eq!(paid, 30);
    assert_eq!(rt.balance_of(&provider.address()), 90);

    let record = rt.channel_account(&hub.address, &id).unwrap();
    assert_eq!(record.loan, 30);
    assert_eq!(record.balance, 0);
    assert_eq!(
        rt.accountant_status(&hub.address).unwrap(),
        AccountantStatus::Punishment
    );
    assert_eq!(
        rt.accountant(&hub.address).unwrap().punishment.activation_block,
        rt.block_number()
    );
}

#[test]
fn test_loan_return_needs_the_party() {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    let provider = register_party(&mut rt, &hub, 60, 0);

    let result = rt.decrease_loan(
        hub.operator_address(),
        hub.address,
        provider.channel_id(),
        20,
        1,
        &Authorization::Direct,
    );
    assert!(matches!(result, Err(SettlementError::Unauthorized(_))));
}

#[test]
fn test_close_then_stake_back_after_cooldown() {
    let mut rt = runtime(fast_config());
    let hub = register_hub(&mut rt, 100, 0, 1_000);
    let operator = hub.operator_address();
    let beneficiary = paychan_core::types::Address([0x5b; 20]);

    let timelock = rt.close_accountant(operator, hub.address).unwrap();
    assert_eq!(timelock, rt.block_number() + 20);
    assert!(!rt.is_active_accountant(&hub.address));

    let early = rt.get_stake_back(operator, hub.address, beneficiary);
    assert!(matches!(early, Err(SettlementError::TimelockActive { .. })));

    rt.advance_blocks(21);
    assert_eq!(rt.get_stake_back(operator, hub.address, beneficiary).unwrap(), 100);
    assert_eq!(rt.balance_of(&beneficiary), 100);

    let again = rt.get_stake_back(operator, hub.address, beneficiary);
    assert!(matches!(again, Err(SettlementError::InvalidState(_))));
}
