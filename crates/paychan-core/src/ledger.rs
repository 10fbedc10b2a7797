//! Interface of the fungible-value ledger that custodies all protocol funds.
//!
//! The ledger is an external collaborator. Callers are explicit because there
//! is no ambient message sender: `from`/`owner` is the account whose balance
//! moves, `spender` is the account spending an allowance.

use crate::types::{Address, Amount};

/// Ledger failures. Any of these aborts the enclosing protocol operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("insufficient balance for {account}: available {available}, required {required}")]
    InsufficientBalance {
        account: Address,
        available: Amount,
        required: Amount,
    },

    #[error("insufficient allowance from {owner} to {spender}: available {available}, required {required}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        available: Amount,
        required: Amount,
    },

    #[error("transfer to the zero address")]
    ZeroRecipient,

    #[error("balance overflow for {0}")]
    Overflow(Address),
}

/// Token-style value ledger.
pub trait ValueLedger: Send + Sync {
    /// Balance held by `owner`.
    fn balance_of(&self, owner: &Address) -> Amount;

    /// Allowance granted by `owner` to `spender`.
    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    /// Move `amount` from `from` to `to`.
    fn transfer(&self, from: Address, to: Address, amount: Amount) -> Result<(), LedgerError>;

    /// Move `amount` from `from` to `to`, spending the allowance `from` gave `spender`.
    fn transfer_from(
        &self,
        spender: Address,
        from: Address,
        to: Address,
        amount: Amount,
    ) -> Result<(), LedgerError>;

    /// Set the allowance `owner` grants to `spender`.
    fn approve(&self, owner: Address, spender: Address, amount: Amount) -> Result<(), LedgerError>;
}
