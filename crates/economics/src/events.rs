//! Events recorded by the registry, the controller and the bridge tracker.
//!
//! Replaying a component's events in order reproduces its state.

use crate::types::{BridgeTransferId, DomainId, EpochId, SupplySnapshot};
use mintgate_types::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SupplyEvent {
    NativeMintRecorded {
        amount: Amount,
        native_circulating: Amount,
    },
    NativeBurnReconciled {
        amount: Amount,
        reason: String,
        native_circulating: Amount,
    },
    RemoteEmissionRecorded {
        amount: Amount,
        remote_recognized: Amount,
    },
    VestingLockedUpdated {
        previous: Amount,
        vesting_locked: Amount,
    },
    BridgeBurnRecorded {
        amount: Amount,
        bridge_pending: Amount,
    },
    BridgeMintRecorded {
        amount: Amount,
        bridge_pending: Amount,
    },
    Snapshot(SupplySnapshot),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EmissionEvent {
    EpochScheduled {
        id: EpochId,
        start: Timestamp,
        end: Timestamp,
        budget: Amount,
    },
    EpochBudgetIncreased {
        id: EpochId,
        delta: Amount,
        budget: Amount,
    },
    EpochFinalized {
        id: EpochId,
        minted: Amount,
        unused: Amount,
    },
    Emitted {
        epoch_id: EpochId,
        recipient: Address,
        amount: Amount,
    },
    BatchEmitted {
        epoch_id: EpochId,
        recipients: usize,
        total: Amount,
    },
    DistributorFunded {
        epoch_id: EpochId,
        distributor: Address,
        amount: Amount,
    },
    DistributorRegistered {
        distributor: Address,
    },
    DistributorRemoved {
        distributor: Address,
    },
    Paused {
        by: Address,
    },
    Unpaused {
        by: Address,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BridgeEvent {
    TransferInitiated {
        id: BridgeTransferId,
        destination: DomainId,
        amount: Amount,
        at: Timestamp,
    },
    TransferSettled {
        id: BridgeTransferId,
        destination: DomainId,
        amount: Amount,
        at: Timestamp,
    },
}
