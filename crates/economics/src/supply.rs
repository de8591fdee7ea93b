//! Supply registry
//!
//! Bookkeeping ledger of recognized supply across accounting domains. It holds
//! no tokens; it only records what the controller and bridge settlement
//! authorities report. Every mutation requires [`Role::Recorder`] and rejects a
//! zero amount, and no counter is ever allowed below zero: an update that
//! would underflow is rejected rather than clamped, since clamping would hide
//! an upstream ordering defect.

use crate::errors::SupplyError;
use crate::events::SupplyEvent;
use crate::types::{SupplyLedger, SupplySnapshot};
use mintgate_types::{Address, Amount, Authorizer, EventLog, Role};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct SupplyRegistry {
    access: Arc<dyn Authorizer>,
    ledger: RwLock<SupplyLedger>,
    events: EventLog<SupplyEvent>,
}

impl SupplyRegistry {
    pub fn new(access: Arc<dyn Authorizer>) -> Self {
        Self {
            access,
            ledger: RwLock::new(SupplyLedger::default()),
            events: EventLog::new(),
        }
    }

    /// Fail unless `caller` may record. Lets callers that pair a mint with a
    /// record check both legs before committing either.
    pub fn ensure_recorder(&self, caller: &Address) -> Result<(), SupplyError> {
        self.access.ensure_role(Role::Recorder, caller)?;
        Ok(())
    }

    fn guard(&self, caller: &Address, amount: Amount) -> Result<(), SupplyError> {
        self.ensure_recorder(caller)?;
        if amount == 0 {
            return Err(SupplyError::ZeroAmount);
        }
        Ok(())
    }

    /// `native_circulating += amount`
    pub fn record_native_mint(&self, caller: &Address, amount: Amount) -> Result<(), SupplyError> {
        self.guard(caller, amount)?;

        let mut ledger = self.ledger.write();
        ledger.native_circulating = ledger
            .native_circulating
            .checked_add(amount)
            .ok_or(SupplyError::Overflow("native_circulating"))?;

        info!(
            target: "supply",
            amount,
            native_circulating = ledger.native_circulating,
            "native mint recorded"
        );
        self.events.record(SupplyEvent::NativeMintRecorded {
            amount,
            native_circulating: ledger.native_circulating,
        });
        Ok(())
    }

    /// `native_circulating -= amount`, for burns observed outside the bridge path.
    pub fn record_native_burn_reconciliation(
        &self,
        caller: &Address,
        amount: Amount,
        reason: impl Into<String>,
    ) -> Result<(), SupplyError> {
        self.guard(caller, amount)?;
        let reason = reason.into();

        let mut ledger = self.ledger.write();
        if amount > ledger.native_circulating {
            warn!(
                target: "supply",
                amount,
                native_circulating = ledger.native_circulating,
                %reason,
                "burn reconciliation exceeds native circulating supply"
            );
            return Err(SupplyError::NativeUnderflow {
                requested: amount,
                available: ledger.native_circulating,
            });
        }
        ledger.native_circulating -= amount;

        info!(
            target: "supply",
            amount,
            native_circulating = ledger.native_circulating,
            %reason,
            "native burn reconciled"
        );
        self.events.record(SupplyEvent::NativeBurnReconciled {
            amount,
            reason,
            native_circulating: ledger.native_circulating,
        });
        Ok(())
    }

    /// `remote_recognized += amount`. Remote recognition only grows.
    pub fn record_remote_emission(&self, caller: &Address, amount: Amount) -> Result<(), SupplyError> {
        self.guard(caller, amount)?;

        let mut ledger = self.ledger.write();
        ledger.remote_recognized = ledger
            .remote_recognized
            .checked_add(amount)
            .ok_or(SupplyError::Overflow("remote_recognized"))?;

        info!(
            target: "supply",
            amount,
            remote_recognized = ledger.remote_recognized,
            "remote emission recorded"
        );
        self.events.record(SupplyEvent::RemoteEmissionRecorded {
            amount,
            remote_recognized: ledger.remote_recognized,
        });
        Ok(())
    }

    /// Absolute set of the informational vesting counter. Zero is accepted:
    /// it is a level, not an amount moved.
    pub fn update_vesting_locked(&self, caller: &Address, value: Amount) -> Result<(), SupplyError> {
        self.ensure_recorder(caller)?;

        let mut ledger = self.ledger.write();
        let previous = ledger.vesting_locked;
        ledger.vesting_locked = value;

        info!(target: "supply", previous, vesting_locked = value, "vesting locked updated");
        self.events.record(SupplyEvent::VestingLockedUpdated {
            previous,
            vesting_locked: value,
        });
        Ok(())
    }

    /// `bridge_pending += amount`: burned here, awaiting a mint elsewhere.
    pub fn record_bridge_burn(&self, caller: &Address, amount: Amount) -> Result<(), SupplyError> {
        self.guard(caller, amount)?;

        let mut ledger = self.ledger.write();
        ledger.bridge_pending = ledger
            .bridge_pending
            .checked_add(amount)
            .ok_or(SupplyError::Overflow("bridge_pending"))?;

        info!(
            target: "supply",
            amount,
            bridge_pending = ledger.bridge_pending,
            "bridge burn recorded"
        );
        self.events.record(SupplyEvent::BridgeBurnRecorded {
            amount,
            bridge_pending: ledger.bridge_pending,
        });
        Ok(())
    }

    /// `bridge_pending -= amount`; never below what is currently outstanding.
    pub fn record_bridge_mint(&self, caller: &Address, amount: Amount) -> Result<(), SupplyError> {
        self.guard(caller, amount)?;

        let mut ledger = self.ledger.write();
        if amount > ledger.bridge_pending {
            warn!(
                target: "supply",
                amount,
                bridge_pending = ledger.bridge_pending,
                "bridge mint exceeds pending supply"
            );
            return Err(SupplyError::InsufficientPending {
                requested: amount,
                pending: ledger.bridge_pending,
            });
        }
        ledger.bridge_pending -= amount;

        info!(
            target: "supply",
            amount,
            bridge_pending = ledger.bridge_pending,
            "bridge mint recorded"
        );
        self.events.record(SupplyEvent::BridgeMintRecorded {
            amount,
            bridge_pending: ledger.bridge_pending,
        });
        Ok(())
    }

    /// Publish the full state and derived views. Counters are untouched.
    pub fn snapshot(&self) -> SupplySnapshot {
        let snapshot = self.ledger.read().snapshot();
        debug!(target: "supply", ?snapshot, "supply snapshot");
        self.events.record(SupplyEvent::Snapshot(snapshot));
        snapshot
    }

    /// Current counters without publishing a snapshot event.
    pub fn state(&self) -> SupplyLedger {
        *self.ledger.read()
    }

    pub fn native_circulating(&self) -> Amount {
        self.ledger.read().native_circulating
    }

    pub fn remote_recognized(&self) -> Amount {
        self.ledger.read().remote_recognized
    }

    pub fn vesting_locked(&self) -> Amount {
        self.ledger.read().vesting_locked
    }

    pub fn bridge_pending(&self) -> Amount {
        self.ledger.read().bridge_pending
    }

    pub fn total_market_supply(&self) -> Amount {
        self.ledger.read().total_market_supply()
    }

    pub fn fdv_supply(&self) -> Amount {
        self.ledger.read().fdv_supply()
    }

    pub fn events(&self) -> &EventLog<SupplyEvent> {
        &self.events
    }
}
