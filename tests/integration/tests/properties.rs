//! Property tests: random operation sequences against one hub must keep the
//! accounting invariants.

use paychan_core::state_machine::AccountantStatus;
use paychan_core::types::{Amount, BlockNumber, Nonce};
use paychan_integration_tests::{
    fast_config, register_hub, register_party, runtime, Hub, Party, FUNDER, LOCK, RELAYER,
};
use paychan_settlement::{Authorization, Runtime, SettlementError};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    /// Hub promises the provider `n` more.
    Settle(Amount),
    /// Consumer promises the hub `n` more.
    ConsumerPay(Amount),
    /// Value arrives at the hub from outside.
    Fund(Amount),
    Rebalance,
    ReturnLoan(Amount),
    /// Provider escrows `n` more as loan.
    IncreaseLoan(Amount),
    SetBalance(Amount),
    Advance(BlockNumber),
    Resolve,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (1u128..120).prop_map(Op::Settle),
        2 => (1u128..120).prop_map(Op::ConsumerPay),
        1 => (1u128..80).prop_map(Op::Fund),
        2 => Just(Op::Rebalance),
        1 => (1u128..60).prop_map(Op::ReturnLoan),
        1 => (0u128..120).prop_map(Op::IncreaseLoan),
        1 => (0u128..200).prop_map(Op::SetBalance),
        1 => (1u64..30).prop_map(Op::Advance),
        1 => Just(Op::Resolve),
    ]
}

struct Scenario {
    rt: Runtime,
    hub: Hub,
    consumer: Party,
    provider: Party,
    supply: Amount,
    promised: Amount,
    consumer_promised: Amount,
}

impl Scenario {
    fn new() -> Self {
        let mut rt = runtime(fast_config());
        let hub = register_hub(&mut rt, 100, 150, 1_000);
        let consumer = register_party(&mut rt, &hub, 0, 300);
        let provider = register_party(&mut rt, &hub, 80, 0);
        let supply = rt.ledger().total_supply();
        Self {
            rt,
            hub,
            consumer,
            provider,
            supply,
            promised: 0,
            consumer_promised: 0,
        }
    }

    fn next_nonce(&self) -> Nonce {
        self.rt
            .channel_account(&self.hub.address, &self.provider.channel_id())
            .map(|record| record.last_used_nonce + 1)
            .unwrap_or(1)
    }

    fn apply(&mut self, op: &Op) -> Result<(), SettlementError> {
        let hub = self.hub.address;
        let id = self.provider.channel_id();
        match *op {
            Op::Settle(n) => {
                self.promised += n;
                let signature = self.hub.promise(id, self.promised, 0);
                self.rt
                    .settle_promise(RELAYER, hub, id, self.promised, 0, &LOCK, &signature)
                    .map(drop)
            }
            Op::ConsumerPay(n) => {
                self.consumer_promised += n;
                let signature = self.consumer.promise(self.consumer_promised, 0);
                self.rt
                    .settle_channel_promise(
                        RELAYER,
                        self.consumer.channel(),
                        self.consumer_promised,
                        0,
                        &LOCK,
                        &signature,
                    )
                    .map(drop)
            }
            Op::Fund(n) => {
                self.rt.mint(hub, n)?;
                self.supply += n;
                Ok(())
            }
            Op::Rebalance => self.rt.rebalance_channel(RELAYER, hub, id).map(drop),
            Op::ReturnLoan(n) => {
                let nonce = self.next_nonce();
                self.rt
                    .decrease_loan(self.provider.address(), hub, id, n, nonce, &Authorization::Direct)
                    .map(drop)
            }
            Op::IncreaseLoan(n) => {
                let provider = self.provider.address();
                self.rt.mint(provider, n)?;
                self.supply += n;
                self.rt.approve(provider, hub, n)?;
                self.rt.increase_loan(provider, hub, id, n)
            }
            Op::SetBalance(balance) => {
                let nonce = self.next_nonce();
                self.rt
                    .update_channel_balance(
                        self.hub.operator_address(),
                        hub,
                        id,
                        balance,
                        nonce,
                        &Authorization::Direct,
                    )
                    .map(drop)
            }
            Op::Advance(blocks) => {
                self.rt.advance_blocks(blocks);
                Ok(())
            }
            Op::Resolve => {
                self.rt.mint(FUNDER, 1_000)?;
                self.supply += 1_000;
                self.rt.approve(FUNDER, hub, 1_000)?;
                self.rt.resolve_emergency(FUNDER, hub).map(drop)
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn accounting_invariants_hold(ops in prop::collection::vec(op(), 1..40)) {
        let mut scenario = Scenario::new();
        let id = scenario.provider.channel_id();
        let mut settled: Amount = 0;
        let mut consumer_settled: Amount = 0;
        let mut nonce: Nonce = 0;

        for op in &ops {
            // Rejected operations are fine; they must leave no trace
            let result = scenario.apply(op);

            let state = scenario.rt.accountant(&scenario.hub.address).unwrap();
            prop_assert!(state.accounting_consistent());

            // Settled-down loans stay uncovered until the next refill, but
            // every settleable balance plus the reserve is always in custody.
            let custody = scenario.rt.balance_of(&scenario.hub.address);
            if state.status != AccountantStatus::Punishment {
                prop_assert!(custody >= state.required_balance(state.locked_funds, 0));
                if matches!(op, Op::Rebalance) && result.is_ok() {
                    prop_assert!(custody >= state.minimal_expected_balance());
                }
            }

            let record = scenario.rt.channel_account(&scenario.hub.address, &id).unwrap();
            prop_assert!(record.settled >= settled);
            prop_assert!(record.settled <= scenario.promised);
            prop_assert!(record.last_used_nonce >= nonce);
            prop_assert!(record.balance <= state.locked_funds);
            settled = record.settled;
            nonce = record.last_used_nonce;

            let channel = scenario.rt.channel(&scenario.consumer.channel()).unwrap();
            prop_assert!(channel.hub.settled >= consumer_settled);
            prop_assert!(channel.hub.settled <= scenario.consumer_promised);
            consumer_settled = channel.hub.settled;

            prop_assert_eq!(scenario.rt.ledger().total_supply(), scenario.supply);
        }
    }

    #[test]
    fn nonces_accept_only_increasing_values(nonces in prop::collection::vec(1u64..20, 1..20)) {
        let mut scenario = Scenario::new();
        let hub = scenario.hub.address;
        let id = scenario.provider.channel_id();
        let operator = scenario.hub.operator_address();
        let mut last: Nonce = 0;

        for nonce in nonces {
            // Same balance: only the nonce is consumed
            let result = scenario.rt.update_channel_balance(
                operator,
                hub,
                id,
                80,
                nonce,
                &Authorization::Direct,
            );
            if nonce > last {
                prop_assert!(result.is_ok());
                last = nonce;
            } else {
                let is_stale = matches!(result, Err(SettlementError::StaleNonce { .. }));
                prop_assert!(is_stale);
            }
            let record = scenario.rt.channel_account(&hub, &id).unwrap();
            prop_assert_eq!(record.last_used_nonce, last);
        }
    }
}
