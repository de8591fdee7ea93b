//! Mintable token capability
//!
//! The fungible-token ledger itself is an external collaborator. Components
//! only see the narrow [`MintableToken`] surface: minting (gated by
//! [`Role::Minter`] and the global cap), burning for bridge egress, and plain
//! transfers out of an account the component controls.
//!
//! [`InMemoryToken`] backs simulations and tests.

use crate::access::{AccessError, Authorizer, Role};
use crate::address::Address;
use crate::Amount;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("token operation targets the zero address")]
    ZeroAddress,

    #[error("mint of {requested} exceeds supply cap, {remaining} remaining")]
    CapExceeded { requested: Amount, remaining: Amount },

    #[error("insufficient balance for {account}: have {balance}, need {requested}")]
    InsufficientBalance {
        account: Address,
        balance: Amount,
        requested: Amount,
    },

    #[error("insufficient allowance: have {allowance}, need {requested}")]
    InsufficientAllowance { allowance: Amount, requested: Amount },
}

/// Interface consumed by the emissions controller (mint) and the rewards
/// distributor (transfer out of its own account).
pub trait MintableToken: Send + Sync {
    /// Create `amount` new units for `to`. `minter` must hold [`Role::Minter`].
    fn mint(&self, minter: &Address, to: &Address, amount: Amount) -> Result<(), TokenError>;

    /// Destroy units held by `holder` (bridge egress).
    fn burn(&self, holder: &Address, amount: Amount) -> Result<(), TokenError>;

    /// Destroy units held by `holder` using an allowance granted to `spender`.
    fn burn_from(&self, spender: &Address, holder: &Address, amount: Amount) -> Result<(), TokenError>;

    fn approve(&self, owner: &Address, spender: &Address, amount: Amount) -> Result<(), TokenError>;

    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), TokenError>;

    fn balance_of(&self, account: &Address) -> Amount;

    fn total_supply(&self) -> Amount;

    fn cap(&self) -> Amount;

    fn remaining_mintable(&self) -> Amount {
        self.cap().saturating_sub(self.total_supply())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TokenState {
    balances: HashMap<Address, Amount>,
    allowances: HashMap<(Address, Address), Amount>,
    total_supply: Amount,
}

impl TokenState {
    fn balance(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn debit(&mut self, account: &Address, amount: Amount) -> Result<(), TokenError> {
        let balance = self.balance(account);
        if balance < amount {
            return Err(TokenError::InsufficientBalance {
                account: *account,
                balance,
                requested: amount,
            });
        }
        self.balances.insert(*account, balance - amount);
        Ok(())
    }

    fn credit(&mut self, account: &Address, amount: Amount) {
        let entry = self.balances.entry(*account).or_insert(0);
        *entry = entry.saturating_add(amount);
    }
}

/// Capped in-memory token ledger.
pub struct InMemoryToken {
    cap: Amount,
    access: Arc<dyn Authorizer>,
    state: RwLock<TokenState>,
}

impl InMemoryToken {
    pub fn new(cap: Amount, access: Arc<dyn Authorizer>) -> Self {
        Self {
            cap,
            access,
            state: RwLock::new(TokenState::default()),
        }
    }

    pub fn holders(&self) -> usize {
        self.state.read().balances.values().filter(|b| **b > 0).count()
    }
}

impl MintableToken for InMemoryToken {
    fn mint(&self, minter: &Address, to: &Address, amount: Amount) -> Result<(), TokenError> {
        self.access.ensure_role(Role::Minter, minter)?;
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }

        let mut state = self.state.write();
        let remaining = self.cap.saturating_sub(state.total_supply);
        if amount > remaining {
            return Err(TokenError::CapExceeded {
                requested: amount,
                remaining,
            });
        }
        state.total_supply += amount;
        state.credit(to, amount);

        info!(target: "token", %to, amount, total_supply = state.total_supply, "minted");
        Ok(())
    }

    fn burn(&self, holder: &Address, amount: Amount) -> Result<(), TokenError> {
        let mut state = self.state.write();
        state.debit(holder, amount)?;
        state.total_supply -= amount;
        info!(target: "token", %holder, amount, total_supply = state.total_supply, "burned");
        Ok(())
    }

    fn burn_from(&self, spender: &Address, holder: &Address, amount: Amount) -> Result<(), TokenError> {
        let mut state = self.state.write();
        let key = (*holder, *spender);
        let allowance = state.allowances.get(&key).copied().unwrap_or(0);
        if allowance < amount {
            return Err(TokenError::InsufficientAllowance {
                allowance,
                requested: amount,
            });
        }
        state.debit(holder, amount)?;
        state.allowances.insert(key, allowance - amount);
        state.total_supply -= amount;
        info!(target: "token", %holder, %spender, amount, "burned from allowance");
        Ok(())
    }

    fn approve(&self, owner: &Address, spender: &Address, amount: Amount) -> Result<(), TokenError> {
        if spender.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        self.state.write().allowances.insert((*owner, *spender), amount);
        debug!(target: "token", %owner, %spender, amount, "allowance set");
        Ok(())
    }

    fn transfer(&self, from: &Address, to: &Address, amount: Amount) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        let mut state = self.state.write();
        state.debit(from, amount)?;
        state.credit(to, amount);
        debug!(target: "token", %from, %to, amount, "transferred");
        Ok(())
    }

    fn balance_of(&self, account: &Address) -> Amount {
        self.state.read().balance(account)
    }

    fn total_supply(&self) -> Amount {
        self.state.read().total_supply
    }

    fn cap(&self) -> Amount {
        self.cap
    }
}
