//! Mintgate shared primitives
//!
//! Account addresses, the role/authorization interface, wall-clock access,
//! the mintable-token capability, the event log and deployment configuration.

pub mod access;
pub mod address;
pub mod config;
pub mod events;
pub mod time_service;
pub mod token;

pub use access::*;
pub use address::*;
pub use config::*;
pub use events::*;
pub use time_service::*;
pub use token::*;

/// Token amount in base units.
pub type Amount = u128;

/// 32-byte digest (Merkle roots, leaves and proof nodes).
pub type Hash32 = [u8; 32];
