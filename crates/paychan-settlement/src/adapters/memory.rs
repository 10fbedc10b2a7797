use dashmap::DashMap;
use paychan_core::ledger::{LedgerError, ValueLedger};
use paychan_core::types::{Address, Amount};

/// In-memory token ledger.
///
/// Balances and allowances live in concurrent maps so the ledger can be
/// read through a shared reference while an operation moves value.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    balances: DashMap<Address, Amount>,
    allowances: DashMap<(Address, Address), Amount>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` out of thin air for `to`.
    pub fn mint(&self, to: Address, amount: Amount) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroRecipient);
        }
        let mut balance = self.balances.entry(to).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(to))?;
        tracing::debug!(to = %to, amount, "minted");
        Ok(())
    }

    /// Sum of all balances.
    pub fn total_supply(&self) -> Amount {
        self.balances
            .iter()
            .fold(0, |acc, entry| acc.saturating_add(*entry.value()))
    }

    fn debit(&self, account: Address, amount: Amount) -> Result<(), LedgerError> {
        let available = self.balance_of(&account);
        if available < amount {
            return Err(LedgerError::InsufficientBalance {
                account,
                available,
                required: amount,
            });
        }
        self.balances.insert(account, available - amount);
        Ok(())
    }

    fn credit(&self, account: Address, amount: Amount) -> Result<(), LedgerError> {
        let current = self.balance_of(&account);
        let updated = current
            .checked_add(amount)
            .ok_or(LedgerError::Overflow(account))?;
        self.balances.insert(account, updated);
        Ok(())
    }
}

impl ValueLedger for InMemoryLedger {
    fn balance_of(&self, owner: &Address) -> Amount {
        self.balances.get(owner).map(|v| *v).unwrap_or(0)
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .map(|v| *v)
            .unwrap_or(0)
    }

    fn transfer(&self, from: Address, to: Address, amount: Amount) -> Result<(), LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroRecipient);
        }
        if from == to {
            // Self-transfer only needs the balance check
            let available = self.balance_of(&from);
            if available < amount {
                return Err(LedgerError::InsufficientBalance {
                    account: from,
                    available,
                    required: amount,
                });
            }
            return Ok(());
        }
        self.debit(from, amount)?;
        self.credit(to, amount)?;
        tracing::trace!(from = %from, to = %to, amount, "transfer");
        Ok(())
    }

    fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let allowed = self.allowance(&from, &spender);
        if allowed < amount {
            return Err(LedgerError::InsufficientAllowance {
                owner: from,
                spender,
                available: allowed,
                required: amount,
            });
        }
        self.transfer(from, to, amount)?;
        self.allowances.insert((from, spender), allowed - amount);
        Ok(())
    }

    fn approve(&self, owner: Address, spender: Address, amount: Amount) -> Result<(), LedgerError> {
        if spender.is_zero() {
            return Err(LedgerError::ZeroRecipient);
        }
        self.allowances.insert((owner, spender), amount);
        tracing::trace!(owner = %owner, spender = %spender, amount, "approve");
        Ok(())
    }
}
