//! Mintgate economics
//!
//! Epoch-budgeted emission authorization and cross-domain supply accounting:
//! - [`EmissionsController`] mints only inside scheduled, budgeted epochs
//! - [`SupplyRegistry`] keeps the recognized-supply counters for every domain
//! - [`BridgeSettlement`] pairs bridge burns with their remote settlement

pub mod bridge;
pub mod emission;
pub mod errors;
pub mod events;
pub mod supply;
pub mod types;

pub use bridge::*;
pub use emission::*;
pub use errors::*;
pub use events::*;
pub use supply::*;
pub use types::*;
