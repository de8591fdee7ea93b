//! Mintgate treasury
//!
//! The rewards distributor: publishes cumulative allocation roots and pays
//! out Merkle-proven claims from a balance funded by the emissions
//! controller.

pub mod distributor;
pub mod errors;
pub mod events;
pub mod types;

pub use distributor::RewardsDistributor;
pub use errors::DistributorError;
pub use events::DistributorEvent;
pub use types::{AllocationRoot, ClaimReceipt, RootId};
