//! Rewards distributor
//!
//! Holds tokens funded by the emissions controller and pays them out against
//! published cumulative-allocation roots. Each root commits to every
//! account's total entitlement to date, so an account that claims under root
//! `n` and again under root `n + 1` is paid only the difference.
//!
//! Claims are permissionless: anyone may submit a valid proof on behalf of an
//! account and the payout always goes to that account.
//!
//! Bookkeeping is committed before the token transfer. Claims and skims run
//! under a reentrancy guard: a token that calls back into the distributor
//! from the same thread gets [`DistributorError::Reentrant`], while callers
//! on other threads wait their turn.

use crate::errors::DistributorError;
use crate::events::DistributorEvent;
use crate::types::{AllocationRoot, ClaimReceipt, RootId};
use mintgate_crypto::{allocation_leaf, verify_sorted_proof};
use mintgate_types::{Address, Amount, Authorizer, Clock, EventLog, Hash32, MintableToken, Role};
use parking_lot::{ReentrantMutex, ReentrantMutexGuard, RwLock};
use std::cell::Cell;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct DistributorState {
    /// Index `i` holds root id `i + 1`.
    roots: Vec<AllocationRoot>,
    /// Cumulative amount claimed by an account under a given root.
    claims: HashMap<(RootId, Address), Amount>,
    /// Highest cumulative amount each account has been paid up to, across
    /// all roots.
    paid_up_to: HashMap<Address, Amount>,
}

impl DistributorState {
    fn root(&self, id: RootId) -> Option<&AllocationRoot> {
        id.checked_sub(1).and_then(|i| self.roots.get(i as usize))
    }

    fn root_mut(&mut self, id: RootId) -> Option<&mut AllocationRoot> {
        id.checked_sub(1).and_then(move |i| self.roots.get_mut(i as usize))
    }

    fn paid_up_to(&self, account: &Address) -> Amount {
        self.paid_up_to.get(account).copied().unwrap_or(0)
    }

    /// Validate a claim without touching state; returns the payable delta.
    fn payable(
        &self,
        root_id: RootId,
        account: &Address,
        cumulative: Amount,
        proof: &[Hash32],
    ) -> Result<Amount, DistributorError> {
        let root = self.root(root_id).ok_or(DistributorError::RootNotFound(root_id))?;
        if account.is_zero() {
            return Err(DistributorError::ZeroAddress);
        }
        if !verify_sorted_proof(proof, &root.root, allocation_leaf(account, cumulative)) {
            return Err(DistributorError::InvalidProof(root_id));
        }
        let claimed = self.paid_up_to(account);
        if cumulative <= claimed {
            return Err(DistributorError::NothingToClaim { cumulative, claimed });
        }
        Ok(cumulative - claimed)
    }
}

/// Bookkeeping values overwritten by a claim, restored if the transfer fails.
struct ClaimUndo {
    root_id: RootId,
    account: Address,
    prior_root_claim: Option<Amount>,
    prior_paid_up_to: Option<Amount>,
    prior_claimed_total: Amount,
}

struct EntryGuard<'a> {
    entered: ReentrantMutexGuard<'a, Cell<bool>>,
}

impl Drop for EntryGuard<'_> {
    fn drop(&mut self) {
        self.entered.set(false);
    }
}

pub struct RewardsDistributor {
    /// Account holding the distributor's token balance.
    address: Address,
    access: Arc<dyn Authorizer>,
    token: Arc<dyn MintableToken>,
    clock: Arc<dyn Clock>,
    state: RwLock<DistributorState>,
    entered: ReentrantMutex<Cell<bool>>,
    events: EventLog<DistributorEvent>,
}

impl RewardsDistributor {
    pub fn new(
        address: Address,
        access: Arc<dyn Authorizer>,
        token: Arc<dyn MintableToken>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            address,
            access,
            token,
            clock,
            state: RwLock::new(DistributorState::default()),
            entered: ReentrantMutex::new(Cell::new(false)),
            events: EventLog::new(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    fn enter(&self) -> Result<EntryGuard<'_>, DistributorError> {
        let entered = self.entered.lock();
        if entered.get() {
            warn!(target: "distributor", "reentrant call rejected");
            return Err(DistributorError::Reentrant);
        }
        entered.set(true);
        Ok(EntryGuard { entered })
    }

    /// Append a new allocation snapshot. Ids start at 1.
    pub fn publish_root(
        &self,
        caller: &Address,
        root: Hash32,
        total: Amount,
    ) -> Result<RootId, DistributorError> {
        self.access.ensure_role(Role::RootSetter, caller)?;
        if root == [0u8; 32] {
            return Err(DistributorError::ZeroRoot);
        }
        if total == 0 {
            return Err(DistributorError::ZeroTotal);
        }

        let mut state = self.state.write();
        let id = state.roots.len() as RootId + 1;
        state.roots.push(AllocationRoot {
            id,
            root,
            total,
            claimed_total: 0,
            published_at: self.clock.now(),
        });

        info!(
            target: "distributor",
            id,
            root = %mintgate_crypto::to_hex(&root),
            total,
            "allocation root published"
        );
        self.events
            .record(DistributorEvent::RootPublished { id, root, total });
        Ok(id)
    }

    /// Pay `account` the part of `cumulative_amount` it has not yet received.
    pub fn claim(
        &self,
        root_id: RootId,
        account: Address,
        cumulative_amount: Amount,
        proof: &[Hash32],
    ) -> Result<ClaimReceipt, DistributorError> {
        let _guard = self.enter()?;

        let (paid, undo) = {
            let mut state = self.state.write();
            let paid = state.payable(root_id, &account, cumulative_amount, proof)?;

            let root = state
                .root_mut(root_id)
                .ok_or(DistributorError::RootNotFound(root_id))?;
            let prior_claimed_total = root.claimed_total;
            root.claimed_total = prior_claimed_total
                .checked_add(paid)
                .ok_or(DistributorError::Overflow("claimed total"))?;

            let undo = ClaimUndo {
                root_id,
                account,
                prior_root_claim: state.claims.insert((root_id, account), cumulative_amount),
                prior_paid_up_to: state.paid_up_to.insert(account, cumulative_amount),
                prior_claimed_total,
            };
            (paid, undo)
        };

        if let Err(err) = self.token.transfer(&self.address, &account, paid) {
            warn!(
                target: "distributor",
                root_id,
                %account,
                paid,
                error = %err,
                "claim transfer failed; bookkeeping restored"
            );
            self.restore(undo);
            return Err(err.into());
        }

        info!(target: "distributor", root_id, %account, cumulative_amount, paid, "claimed");
        self.events.record(DistributorEvent::Claimed {
            root_id,
            account,
            cumulative_amount,
            paid,
        });
        Ok(ClaimReceipt {
            root_id,
            cumulative_amount,
            paid,
        })
    }

    fn restore(&self, undo: ClaimUndo) {
        let mut state = self.state.write();
        let key = (undo.root_id, undo.account);
        match undo.prior_root_claim {
            Some(v) => state.claims.insert(key, v),
            None => state.claims.remove(&key),
        };
        match undo.prior_paid_up_to {
            Some(v) => state.paid_up_to.insert(undo.account, v),
            None => state.paid_up_to.remove(&undo.account),
        };
        if let Some(root) = state.root_mut(undo.root_id) {
            root.claimed_total = undo.prior_claimed_total;
        }
    }

    /// Move tokens out of the distributor without touching root bookkeeping.
    pub fn skim(&self, caller: &Address, to: Address, amount: Amount) -> Result<(), DistributorError> {
        self.access.ensure_role(Role::Recover, caller)?;
        if to.is_zero() {
            return Err(DistributorError::ZeroAddress);
        }
        if amount == 0 {
            return Err(DistributorError::ZeroAmount);
        }
        let _guard = self.enter()?;

        self.token.transfer(&self.address, &to, amount)?;
        warn!(target: "distributor", by = %caller, %to, amount, "tokens skimmed");
        self.events.record(DistributorEvent::Skimmed {
            by: *caller,
            to,
            amount,
        });
        Ok(())
    }

    /// Dry run of [`Self::claim`]: what the claim would pay right now.
    pub fn claimable(
        &self,
        root_id: RootId,
        account: &Address,
        cumulative_amount: Amount,
        proof: &[Hash32],
    ) -> Result<Amount, DistributorError> {
        let payable = self
            .state
            .read()
            .payable(root_id, account, cumulative_amount, proof)?;
        debug!(target: "distributor", root_id, %account, payable, "claimable");
        Ok(payable)
    }

    pub fn unclaimed_in_root(&self, root_id: RootId) -> Amount {
        self.state
            .read()
            .root(root_id)
            .map(AllocationRoot::unclaimed)
            .unwrap_or(0)
    }

    pub fn root(&self, root_id: RootId) -> Option<AllocationRoot> {
        self.state.read().root(root_id).copied()
    }

    pub fn roots(&self) -> Vec<AllocationRoot> {
        self.state.read().roots.clone()
    }

    /// 0 until the first root is published.
    pub fn last_root_id(&self) -> RootId {
        self.state.read().roots.len() as RootId
    }

    /// Cumulative amount `account` has claimed under `root_id`.
    pub fn claimed(&self, root_id: RootId, account: &Address) -> Amount {
        self.state
            .read()
            .claims
            .get(&(root_id, *account))
            .copied()
            .unwrap_or(0)
    }

    /// Highest cumulative entitlement `account` has been paid up to.
    pub fn claimed_cumulative(&self, account: &Address) -> Amount {
        self.state.read().paid_up_to(account)
    }

    pub fn balance(&self) -> Amount {
        self.token.balance_of(&self.address)
    }

    pub fn events(&self) -> &EventLog<DistributorEvent> {
        &self.events
    }
}
