//! Core records owned by the emissions controller and the supply registry.

use mintgate_types::{Address, Amount, Timestamp};
use serde::{Deserialize, Serialize};

/// Epoch identifier, assigned sequentially from 1.
pub type EpochId = u64;

/// A time-boxed, budgeted minting window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Epoch {
    pub id: EpochId,
    pub start: Timestamp,
    pub end: Timestamp,
    pub budget: Amount,
    pub minted: Amount,
    pub finalized: bool,
}

impl Epoch {
    pub fn new(id: EpochId, start: Timestamp, end: Timestamp, budget: Amount) -> Self {
        Self {
            id,
            start,
            end,
            budget,
            minted: 0,
            finalized: false,
        }
    }

    /// Open for emissions at `now`.
    pub fn is_active(&self, now: Timestamp) -> bool {
        !self.finalized && self.start <= now && now < self.end
    }

    pub fn has_started(&self, now: Timestamp) -> bool {
        now >= self.start
    }

    /// Budget still available for emission.
    pub fn remaining(&self) -> Amount {
        self.budget.saturating_sub(self.minted)
    }
}

/// Outcome of a successful emission call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmissionReceipt {
    pub epoch_id: EpochId,
    pub recipients: usize,
    pub total: Amount,
    /// Epoch `minted` after this emission.
    pub epoch_minted: Amount,
}

/// The four recognized-supply counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyLedger {
    pub native_circulating: Amount,
    pub remote_recognized: Amount,
    /// Informational only; never constrains other counters.
    pub vesting_locked: Amount,
    /// Burned locally, awaiting settlement on the remote domain.
    pub bridge_pending: Amount,
}

impl SupplyLedger {
    pub fn total_market_supply(&self) -> Amount {
        self.native_circulating.saturating_add(self.remote_recognized)
    }

    pub fn fdv_supply(&self) -> Amount {
        self.total_market_supply().saturating_add(self.vesting_locked)
    }

    pub fn snapshot(&self) -> SupplySnapshot {
        SupplySnapshot {
            native_circulating: self.native_circulating,
            remote_recognized: self.remote_recognized,
            vesting_locked: self.vesting_locked,
            bridge_pending: self.bridge_pending,
            total_market_supply: self.total_market_supply(),
            fdv_supply: self.fdv_supply(),
        }
    }
}

/// Full registry state plus derived views, as published to indexers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplySnapshot {
    pub native_circulating: Amount,
    pub remote_recognized: Amount,
    pub vesting_locked: Amount,
    pub bridge_pending: Amount,
    pub total_market_supply: Amount,
    pub fdv_supply: Amount,
}

/// Domain a bridge transfer leaves towards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DomainId(pub String);

impl DomainId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DomainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a tracked bridge transfer.
pub type BridgeTransferId = u64;

/// A bridge burn that has not yet been settled on the remote domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransfer {
    pub id: BridgeTransferId,
    pub destination: DomainId,
    pub amount: Amount,
    pub initiated_at: Timestamp,
    pub initiated_by: Address,
}
