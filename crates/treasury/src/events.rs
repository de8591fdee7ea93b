use crate::types::RootId;
use mintgate_types::{Address, Amount, Hash32};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DistributorEvent {
    RootPublished {
        id: RootId,
        root: Hash32,
        total: Amount,
    },
    Claimed {
        root_id: RootId,
        account: Address,
        cumulative_amount: Amount,
        paid: Amount,
    },
    Skimmed {
        by: Address,
        to: Address,
        amount: Amount,
    },
}
