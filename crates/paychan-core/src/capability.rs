//! Capability interfaces composed per component instead of a fixed
//! inheritance chain.

use crate::error::CoreError;
use crate::types::Address;

/// Single-owner access control.
pub trait Owned {
    /// Current owner.
    fn owner(&self) -> Address;

    /// Overwrite the owner without checks. Implementors store the field.
    fn set_owner_unchecked(&mut self, owner: Address);

    /// Fail unless `caller` is the owner.
    fn ensure_owner(&self, caller: &Address) -> Result<(), CoreError> {
        if *caller != self.owner() {
            return Err(CoreError::NotOwner {
                caller: caller.to_string(),
            });
        }
        Ok(())
    }

    /// Hand ownership to `new_owner`. Only the current owner may do this.
    fn transfer_ownership(&mut self, caller: &Address, new_owner: Address) -> Result<(), CoreError> {
        self.ensure_owner(caller)?;
        if new_owner.is_zero() {
            return Err(CoreError::ZeroAddress("new owner"));
        }
        tracing::info!(from = %self.owner(), to = %new_owner, "ownership transferred");
        self.set_owner_unchecked(new_owner);
        Ok(())
    }
}

/// Components that can forward value sent to them by mistake to a
/// destination chosen by their owner.
pub trait FundsRecoverable: Owned {
    /// Where recovered funds go, if set.
    fn funds_destination(&self) -> Option<Address>;

    /// Overwrite the destination without checks. Implementors store the field.
    fn set_funds_destination_unchecked(&mut self, destination: Address);

    /// Owner-gated destination change.
    fn set_funds_destination(
        &mut self,
        caller: &Address,
        destination: Address,
    ) -> Result<(), CoreError> {
        self.ensure_owner(caller)?;
        if destination.is_zero() {
            return Err(CoreError::ZeroAddress("funds destination"));
        }
        self.set_funds_destination_unchecked(destination);
        Ok(())
    }
}

/// Components bound to one value ledger.
pub trait LedgerBound {
    /// Address of the ledger this component custodies value in.
    fn ledger_id(&self) -> Address;
}
