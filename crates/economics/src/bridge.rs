//! Two-phase bridge settlement
//!
//! Cross-domain transfers are modelled as two independently authorized
//! bookkeeping calls on the [`SupplyRegistry`]: a burn here moves supply into
//! `bridge_pending`, a later mint on the destination releases it. This tracker
//! pairs the two legs per transfer so an operator can see which burns are
//! still outstanding and for how long.
//!
//! An unsettled transfer is never reversed or expired. Once it is older than
//! `settlement_alert_secs` it is reported by [`BridgeSettlement::overdue`]
//! and left for an operator to resolve.

use crate::errors::BridgeError;
use crate::events::BridgeEvent;
use crate::supply::SupplyRegistry;
use crate::types::{BridgeTransferId, DomainId, PendingTransfer};
use mintgate_types::{Address, Amount, BridgeConfig, Clock, EventLog};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Default)]
struct BridgeState {
    next_id: BridgeTransferId,
    pending: BTreeMap<BridgeTransferId, PendingTransfer>,
}

pub struct BridgeSettlement {
    registry: Arc<SupplyRegistry>,
    clock: Arc<dyn Clock>,
    config: BridgeConfig,
    state: Mutex<BridgeState>,
    events: EventLog<BridgeEvent>,
}

impl BridgeSettlement {
    pub fn new(registry: Arc<SupplyRegistry>, clock: Arc<dyn Clock>, config: BridgeConfig) -> Self {
        Self {
            registry,
            clock,
            config,
            state: Mutex::new(BridgeState {
                next_id: 1,
                pending: BTreeMap::new(),
            }),
            events: EventLog::new(),
        }
    }

    /// First leg: tokens burned locally for `destination`. The caller must be
    /// a registry recorder.
    pub fn initiate(
        &self,
        caller: &Address,
        destination: DomainId,
        amount: Amount,
    ) -> Result<BridgeTransferId, BridgeError> {
        if destination.as_str().is_empty() {
            return Err(BridgeError::EmptyDestination);
        }

        let mut state = self.state.lock();
        self.registry.record_bridge_burn(caller, amount)?;

        let id = state.next_id;
        state.next_id += 1;
        let at = self.clock.now();
        state.pending.insert(
            id,
            PendingTransfer {
                id,
                destination: destination.clone(),
                amount,
                initiated_at: at,
                initiated_by: *caller,
            },
        );

        info!(target: "bridge", id, %destination, amount, "bridge transfer initiated");
        self.events.record(BridgeEvent::TransferInitiated {
            id,
            destination,
            amount,
            at,
        });
        Ok(id)
    }

    /// Second leg: the destination minted the transfer's amount.
    pub fn settle(&self, caller: &Address, id: BridgeTransferId) -> Result<PendingTransfer, BridgeError> {
        let mut state = self.state.lock();
        let amount = state
            .pending
            .get(&id)
            .map(|t| t.amount)
            .ok_or(BridgeError::UnknownTransfer(id))?;

        self.registry.record_bridge_mint(caller, amount)?;
        let transfer = state
            .pending
            .remove(&id)
            .ok_or(BridgeError::UnknownTransfer(id))?;

        let at = self.clock.now();
        info!(
            target: "bridge",
            id,
            destination = %transfer.destination,
            amount,
            latency_secs = at.saturating_sub(transfer.initiated_at),
            "bridge transfer settled"
        );
        self.events.record(BridgeEvent::TransferSettled {
            id,
            destination: transfer.destination.clone(),
            amount,
            at,
        });
        Ok(transfer)
    }

    pub fn pending(&self) -> Vec<PendingTransfer> {
        self.state.lock().pending.values().cloned().collect()
    }

    pub fn pending_total(&self) -> Amount {
        self.state.lock().pending.values().map(|t| t.amount).sum()
    }

    /// Transfers outstanding for at least `settlement_alert_secs`.
    pub fn overdue(&self) -> Vec<PendingTransfer> {
        let now = self.clock.now();
        let threshold = self.config.settlement_alert_secs;
        let overdue: Vec<PendingTransfer> = self
            .state
            .lock()
            .pending
            .values()
            .filter(|t| now.saturating_sub(t.initiated_at) >= threshold)
            .cloned()
            .collect();

        for t in &overdue {
            warn!(
                target: "bridge",
                id = t.id,
                destination = %t.destination,
                amount = t.amount,
                age_secs = now.saturating_sub(t.initiated_at),
                "bridge transfer overdue"
            );
        }
        overdue
    }

    pub fn events(&self) -> &EventLog<BridgeEvent> {
        &self.events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SupplyError;
    use mintgate_types::{AccessControl, ManualClock, Role};

    fn setup() -> (BridgeSettlement, Arc<SupplyRegistry>, Arc<ManualClock>, Address) {
        let admin = Address::derive("admin");
        let relayer = Address::derive("relayer");
        let acl = AccessControl::new(admin);
        acl.grant_role(&admin, Role::Recorder, relayer).unwrap();
        let registry = Arc::new(SupplyRegistry::new(Arc::new(acl)));
        let clock = Arc::new(ManualClock::new(10_000));
        let bridge = BridgeSettlement::new(
            registry.clone(),
            clock.clone(),
            BridgeConfig {
                settlement_alert_secs: 600,
            },
        );
        (bridge, registry, clock, relayer)
    }

    #[test]
    fn initiate_then_settle_round_trips_pending() {
        let (bridge, registry, clock, relayer) = setup();
        let id = bridge.initiate(&relayer, DomainId::new("l2"), 2_000).unwrap();
        assert_eq!(registry.bridge_pending(), 2_000);
        assert_eq!(bridge.pending_total(), 2_000);

        clock.advance(30);
        let settled = bridge.settle(&relayer, id).unwrap();
        assert_eq!(settled.amount, 2_000);
        assert_eq!(registry.bridge_pending(), 0);
        assert!(bridge.pending().is_empty());
        assert_eq!(bridge.settle(&relayer, id), Err(BridgeError::UnknownTransfer(id)));
    }

    #[test]
    fn failed_registry_leg_leaves_tracker_untouched() {
        let (bridge, registry, _, relayer) = setup();
        let stranger = Address::derive("stranger");
        assert!(matches!(
            bridge.initiate(&stranger, DomainId::new("l2"), 5),
            Err(BridgeError::Supply(SupplyError::Access(_)))
        ));
        assert!(bridge.pending().is_empty());

        let id = bridge.initiate(&relayer, DomainId::new("l2"), 500).unwrap();
        // an out-of-band settlement drains pending first
        registry.record_bridge_mint(&relayer, 200).unwrap();
        assert_eq!(
            bridge.settle(&relayer, id),
            Err(BridgeError::Supply(SupplyError::InsufficientPending {
                requested: 500,
                pending: 300
            }))
        );
        assert_eq!(bridge.pending().len(), 1);
    }

    #[test]
    fn overdue_reports_without_reversing() {
        let (bridge, registry, clock, relayer) = setup();
        let old = bridge.initiate(&relayer, DomainId::new("l2"), 10).unwrap();
        clock.advance(500);
        bridge.initiate(&relayer, DomainId::new("l3"), 20).unwrap();
        clock.advance(100);

        let overdue = bridge.overdue();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, old);
        assert_eq!(registry.bridge_pending(), 30);
    }

    #[test]
    fn empty_destination_rejected() {
        let (bridge, registry, _, relayer) = setup();
        assert_eq!(
            bridge.initiate(&relayer, DomainId::new(""), 10),
            Err(BridgeError::EmptyDestination)
        );
        assert_eq!(registry.bridge_pending(), 0);
    }
}
