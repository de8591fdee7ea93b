//! Emissions controller
//!
//! Gates all new supply behind explicit, budgeted, non-overlapping epochs.
//! Scheduling authority ([`Role::Scheduler`]) is separate from execution
//! authority ([`Role::Emitter`]): a compromised emitter can never mint more
//! than the budgets a scheduler has already approved.
//!
//! Epochs are ordered by id and never overlap. Emission is authorized only
//! against the most recently scheduled epoch, so at most one epoch is active
//! at any instant.

use crate::errors::EmissionError;
use crate::events::EmissionEvent;
use crate::supply::SupplyRegistry;
use crate::types::{EmissionReceipt, Epoch, EpochId};
use mintgate_types::{
    Address, Amount, Authorizer, Clock, EmissionsConfig, EventLog, MintableToken, Role, Timestamp,
    TokenError,
};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct ControllerState {
    /// Index `i` holds epoch id `i + 1`.
    epochs: Vec<Epoch>,
    paused: bool,
    distributors: HashSet<Address>,
}

impl ControllerState {
    fn epoch(&self, id: EpochId) -> Option<&Epoch> {
        id.checked_sub(1).and_then(|i| self.epochs.get(i as usize))
    }

    fn epoch_mut(&mut self, id: EpochId) -> Option<&mut Epoch> {
        id.checked_sub(1).and_then(move |i| self.epochs.get_mut(i as usize))
    }

    /// Index of the epoch active at `now`. Only the most recently scheduled
    /// epoch is ever considered: scheduling the next epoch ahead of time
    /// closes emission for the current one.
    fn active_index(&self, now: Timestamp) -> Option<usize> {
        let last = self.epochs.last()?;
        last.is_active(now).then(|| self.epochs.len() - 1)
    }
}

pub struct EmissionsController {
    /// Identity used towards the token (minter) and the registry (recorder).
    address: Address,
    access: Arc<dyn Authorizer>,
    token: Arc<dyn MintableToken>,
    registry: Arc<SupplyRegistry>,
    clock: Arc<dyn Clock>,
    config: EmissionsConfig,
    state: RwLock<ControllerState>,
    events: EventLog<EmissionEvent>,
}

impl EmissionsController {
    pub fn new(
        address: Address,
        access: Arc<dyn Authorizer>,
        token: Arc<dyn MintableToken>,
        registry: Arc<SupplyRegistry>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            address,
            access,
            token,
            registry,
            clock,
            config: EmissionsConfig::default(),
            state: RwLock::new(ControllerState::default()),
            events: EventLog::new(),
        }
    }

    pub fn with_config(mut self, config: EmissionsConfig) -> Self {
        self.config = config;
        self
    }

    pub fn address(&self) -> Address {
        self.address
    }

    // ---------------------------------------------------------------------
    // Scheduling
    // ---------------------------------------------------------------------

    /// Append a new epoch `[start, end)` with the given budget.
    pub fn schedule_epoch(
        &self,
        caller: &Address,
        start: Timestamp,
        end: Timestamp,
        budget: Amount,
    ) -> Result<EpochId, EmissionError> {
        self.access.ensure_role(Role::Scheduler, caller)?;

        let now = self.clock.now();
        if end <= start || start < now {
            return Err(EmissionError::InvalidTime { start, end, now });
        }
        if budget == 0 {
            return Err(EmissionError::ZeroBudget);
        }

        let mut state = self.state.write();
        if let Some(previous) = state.epochs.last() {
            if start < previous.end {
                return Err(EmissionError::Overlap {
                    start,
                    previous_end: previous.end,
                });
            }
        }

        let id = state.epochs.len() as EpochId + 1;
        state.epochs.push(Epoch::new(id, start, end, budget));

        info!(target: "emissions", id, start, end, budget, "epoch scheduled");
        self.events.record(EmissionEvent::EpochScheduled {
            id,
            start,
            end,
            budget,
        });
        Ok(id)
    }

    /// Raise an epoch's budget. Budgets never shrink, so an in-flight
    /// authorization can never be invalidated by a concurrent change.
    ///
    /// Not checked against the epoch's end: raising a closed epoch's budget
    /// is accepted and has no effect, emissions stay gated by the window.
    pub fn increase_epoch_budget(
        &self,
        caller: &Address,
        id: EpochId,
        delta: Amount,
    ) -> Result<Amount, EmissionError> {
        self.access.ensure_role(Role::Scheduler, caller)?;

        let mut state = self.state.write();
        let epoch = state.epoch_mut(id).ok_or(EmissionError::NotEpoch(id))?;
        if delta == 0 {
            return Ok(epoch.budget);
        }
        epoch.budget = epoch
            .budget
            .checked_add(delta)
            .ok_or(EmissionError::Overflow("epoch budget"))?;

        let budget = epoch.budget;
        info!(target: "emissions", id, delta, budget, "epoch budget increased");
        self.events
            .record(EmissionEvent::EpochBudgetIncreased { id, delta, budget });
        Ok(budget)
    }

    /// Close an epoch for good. Returns the unused budget, which is reported
    /// only; nothing is reclaimed or carried over.
    pub fn finalize_epoch(&self, caller: &Address, id: EpochId) -> Result<Amount, EmissionError> {
        self.access.ensure_role(Role::Scheduler, caller)?;

        let now = self.clock.now();
        let mut state = self.state.write();
        let epoch = state.epoch_mut(id).ok_or(EmissionError::NotEpoch(id))?;
        if epoch.finalized {
            return Err(EmissionError::AlreadyFinal(id));
        }
        if !epoch.has_started(now) {
            return Err(EmissionError::NotStarted {
                epoch: id,
                start: epoch.start,
                now,
            });
        }
        epoch.finalized = true;

        let minted = epoch.minted;
        let unused = epoch.remaining();
        info!(target: "emissions", id, minted, unused, "epoch finalized");
        self.events
            .record(EmissionEvent::EpochFinalized { id, minted, unused });
        Ok(unused)
    }

    // ---------------------------------------------------------------------
    // Execution
    // ---------------------------------------------------------------------

    pub fn emit_to(
        &self,
        caller: &Address,
        recipient: Address,
        amount: Amount,
    ) -> Result<EmissionReceipt, EmissionError> {
        let receipt = self.emit(caller, &[(recipient, amount)], false)?;
        self.events.record(EmissionEvent::Emitted {
            epoch_id: receipt.epoch_id,
            recipient,
            amount,
        });
        Ok(receipt)
    }

    /// Emit to many recipients against one budget check; either every
    /// recipient is paid or none is.
    pub fn emit_batch(
        &self,
        caller: &Address,
        recipients: &[Address],
        amounts: &[Amount],
    ) -> Result<EmissionReceipt, EmissionError> {
        if recipients.len() != amounts.len() {
            return Err(EmissionError::LengthMismatch {
                recipients: recipients.len(),
                amounts: amounts.len(),
            });
        }
        let payouts: Vec<(Address, Amount)> = recipients
            .iter()
            .copied()
            .zip(amounts.iter().copied())
            .collect();

        let receipt = self.emit(caller, &payouts, false)?;
        for (recipient, amount) in payouts {
            self.events.record(EmissionEvent::Emitted {
                epoch_id: receipt.epoch_id,
                recipient,
                amount,
            });
        }
        self.events.record(EmissionEvent::BatchEmitted {
            epoch_id: receipt.epoch_id,
            recipients: receipt.recipients,
            total: receipt.total,
        });
        Ok(receipt)
    }

    /// Fund a registered rewards distributor from the active epoch.
    pub fn emit_to_distributor(
        &self,
        caller: &Address,
        distributor: Address,
        amount: Amount,
    ) -> Result<EmissionReceipt, EmissionError> {
        let receipt = self.emit(caller, &[(distributor, amount)], true)?;
        self.events.record(EmissionEvent::DistributorFunded {
            epoch_id: receipt.epoch_id,
            distributor,
            amount,
        });
        Ok(receipt)
    }

    /// Shared emission path. Every check runs before the first mint so a
    /// rejected call leaves the epoch, the token and the registry untouched.
    /// The registry record follows the mints as a separately committed step.
    ///
    /// If the token still fails a mint part way through a batch, whatever was
    /// already minted is charged to the epoch and recorded before the error
    /// is returned, so no supply exists outside an epoch budget.
    fn emit(
        &self,
        caller: &Address,
        payouts: &[(Address, Amount)],
        to_distributor: bool,
    ) -> Result<EmissionReceipt, EmissionError> {
        self.access.ensure_role(Role::Emitter, caller)?;

        if payouts.is_empty() {
            return Err(EmissionError::EmptyBatch);
        }
        let max = self.config.max_batch_len;
        if max > 0 && payouts.len() > max {
            return Err(EmissionError::BatchTooLarge {
                len: payouts.len(),
                max,
            });
        }

        let mut total: Amount = 0;
        for (recipient, amount) in payouts {
            if recipient.is_zero() {
                return Err(EmissionError::ZeroAddress);
            }
            if *amount == 0 {
                return Err(EmissionError::ZeroAmount);
            }
            total = total
                .checked_add(*amount)
                .ok_or(EmissionError::Overflow("batch total"))?;
        }

        // Held for the whole call: emissions are serialized.
        let mut state = self.state.write();
        if state.paused {
            return Err(EmissionError::Paused);
        }
        if to_distributor {
            if let Some((unknown, _)) = payouts
                .iter()
                .find(|(recipient, _)| !state.distributors.contains(recipient))
            {
                return Err(EmissionError::UnknownDistributor(*unknown));
            }
        }

        let now = self.clock.now();
        let index = state
            .active_index(now)
            .ok_or(EmissionError::EpochNotActive { now })?;
        let epoch = state.epochs[index];

        let minted_after = epoch
            .minted
            .checked_add(total)
            .ok_or(EmissionError::Overflow("epoch minted"))?;
        if minted_after > epoch.budget {
            warn!(
                target: "emissions",
                epoch = epoch.id,
                minted = epoch.minted,
                requested = total,
                budget = epoch.budget,
                "emission rejected: budget exceeded"
            );
            return Err(EmissionError::BudgetExceeded {
                epoch: epoch.id,
                minted: epoch.minted,
                requested: total,
                budget: epoch.budget,
            });
        }

        let remaining = self.token.remaining_mintable();
        if total > remaining {
            return Err(TokenError::CapExceeded {
                requested: total,
                remaining,
            }
            .into());
        }
        self.registry.ensure_recorder(&self.address)?;

        for (i, (recipient, amount)) in payouts.iter().enumerate() {
            if let Err(err) = self.token.mint(&self.address, recipient, *amount) {
                let paid = &payouts[..i];
                if !paid.is_empty() {
                    let partial: Amount = paid.iter().map(|(_, a)| *a).sum();
                    state.epochs[index].minted = epoch.minted + partial;
                    for (recipient, amount) in paid {
                        self.events.record(EmissionEvent::Emitted {
                            epoch_id: epoch.id,
                            recipient: *recipient,
                            amount: *amount,
                        });
                    }
                    warn!(
                        target: "emissions",
                        epoch = epoch.id,
                        minted = i,
                        of = payouts.len(),
                        partial,
                        error = %err,
                        "mint failed mid-batch; minted part charged to epoch"
                    );
                    self.registry.record_native_mint(&self.address, partial)?;
                }
                return Err(err.into());
            }
            debug!(target: "emissions", epoch = epoch.id, %recipient, amount, "minted");
        }
        state.epochs[index].minted = minted_after;
        self.registry.record_native_mint(&self.address, total)?;

        info!(
            target: "emissions",
            epoch = epoch.id,
            recipients = payouts.len(),
            total,
            minted = minted_after,
            budget = epoch.budget,
            "emission executed"
        );
        Ok(EmissionReceipt {
            epoch_id: epoch.id,
            recipients: payouts.len(),
            total,
            epoch_minted: minted_after,
        })
    }

    // ---------------------------------------------------------------------
    // Pausing and distributor registry
    // ---------------------------------------------------------------------

    /// Halt emission execution. Scheduling, finalization and registry
    /// recording are unaffected.
    pub fn pause(&self, caller: &Address) -> Result<(), EmissionError> {
        self.access.ensure_role(Role::Pauser, caller)?;
        let mut state = self.state.write();
        if !state.paused {
            state.paused = true;
            warn!(target: "emissions", by = %caller, "emissions paused");
            self.events.record(EmissionEvent::Paused { by: *caller });
        }
        Ok(())
    }

    pub fn unpause(&self, caller: &Address) -> Result<(), EmissionError> {
        self.access.ensure_role(Role::Pauser, caller)?;
        let mut state = self.state.write();
        if state.paused {
            state.paused = false;
            info!(target: "emissions", by = %caller, "emissions resumed");
            self.events.record(EmissionEvent::Unpaused { by: *caller });
        }
        Ok(())
    }

    pub fn register_distributor(&self, caller: &Address, distributor: Address) -> Result<(), EmissionError> {
        self.access.ensure_role(Role::Admin, caller)?;
        if distributor.is_zero() {
            return Err(EmissionError::ZeroAddress);
        }
        if self.state.write().distributors.insert(distributor) {
            info!(target: "emissions", %distributor, "distributor registered");
            self.events
                .record(EmissionEvent::DistributorRegistered { distributor });
        }
        Ok(())
    }

    pub fn remove_distributor(&self, caller: &Address, distributor: &Address) -> Result<(), EmissionError> {
        self.access.ensure_role(Role::Admin, caller)?;
        if self.state.write().distributors.remove(distributor) {
            info!(target: "emissions", %distributor, "distributor removed");
            self.events.record(EmissionEvent::DistributorRemoved {
                distributor: *distributor,
            });
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------------

    pub fn epoch(&self, id: EpochId) -> Option<Epoch> {
        self.state.read().epoch(id).copied()
    }

    pub fn epochs(&self) -> Vec<Epoch> {
        self.state.read().epochs.clone()
    }

    /// 0 until the first epoch is scheduled.
    pub fn last_epoch_id(&self) -> EpochId {
        self.state.read().epochs.len() as EpochId
    }

    pub fn active_epoch(&self) -> Option<Epoch> {
        let now = self.clock.now();
        let state = self.state.read();
        state.active_index(now).map(|i| state.epochs[i])
    }

    pub fn remaining_budget(&self, id: EpochId) -> Option<Amount> {
        self.state.read().epoch(id).map(Epoch::remaining)
    }

    pub fn is_paused(&self) -> bool {
        self.state.read().paused
    }

    pub fn is_distributor(&self, account: &Address) -> bool {
        self.state.read().distributors.contains(account)
    }

    pub fn events(&self) -> &EventLog<EmissionEvent> {
        &self.events
    }
}
