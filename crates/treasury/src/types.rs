use mintgate_types::{Amount, Hash32, Timestamp};
use serde::{Deserialize, Serialize};

pub type RootId = u64;

/// One published cumulative-allocation snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationRoot {
    pub id: RootId,
    pub root: Hash32,
    pub total: Amount,
    pub claimed_total: Amount,
    pub published_at: Timestamp,
}

impl AllocationRoot {
    /// Never negative: payouts under a newer root may exceed its own total
    /// when earlier rounds were left unclaimed.
    pub fn unclaimed(&self) -> Amount {
        self.total.saturating_sub(self.claimed_total)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub root_id: RootId,
    pub cumulative_amount: Amount,
    pub paid: Amount,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unclaimed_saturates() {
        let mut root = AllocationRoot {
            id: 1,
            root: [1u8; 32],
            total: 100,
            claimed_total: 40,
            published_at: 0,
        };
        assert_eq!(root.unclaimed(), 60);
        root.claimed_total = 150;
        assert_eq!(root.unclaimed(), 0);
    }
}
