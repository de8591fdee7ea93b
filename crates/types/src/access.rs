//! Role-based authorization
//!
//! Every privileged entry point in Mintgate names the [`Role`] it requires and
//! checks it through an [`Authorizer`] before touching state. Roles are a closed
//! set; there are no opaque role identifiers.

use crate::address::Address;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info};

/// Capability set recognised by Mintgate components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Grants and revokes every other role; registers distributors.
    Admin,
    /// Schedules epochs, raises budgets and finalizes epochs.
    Scheduler,
    /// Executes emissions against the active epoch.
    Emitter,
    /// Halts and resumes emission execution.
    Pauser,
    /// Mutates the supply registry counters.
    Recorder,
    /// Publishes allocation roots on the distributor.
    RootSetter,
    /// Recovers unencumbered distributor balance.
    Recover,
    /// Creates new token supply.
    Minter,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Scheduler => "scheduler",
            Role::Emitter => "emitter",
            Role::Pauser => "pauser",
            Role::Recorder => "recorder",
            Role::RootSetter => "root-setter",
            Role::Recover => "recover",
            Role::Minter => "minter",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("account {account} is missing role {role}")]
    MissingRole { role: Role, account: Address },

    #[error("role cannot be granted to the zero address")]
    ZeroAddress,
}

/// Capability check consumed by every component.
pub trait Authorizer: Send + Sync {
    fn has_role(&self, role: Role, account: &Address) -> bool;

    fn ensure_role(&self, role: Role, account: &Address) -> Result<(), AccessError> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            debug!(target: "access", %role, %account, "capability check failed");
            Err(AccessError::MissingRole {
                role,
                account: *account,
            })
        }
    }
}

/// In-memory role table. The admin passed to [`AccessControl::new`] holds
/// [`Role::Admin`] and can hand out the remaining roles.
#[derive(Debug, Default)]
pub struct AccessControl {
    members: RwLock<HashMap<Role, HashSet<Address>>>,
}

impl AccessControl {
    pub fn new(admin: Address) -> Self {
        let mut members: HashMap<Role, HashSet<Address>> = HashMap::new();
        members.entry(Role::Admin).or_default().insert(admin);
        Self {
            members: RwLock::new(members),
        }
    }

    pub fn grant_role(&self, caller: &Address, role: Role, account: Address) -> Result<(), AccessError> {
        self.ensure_role(Role::Admin, caller)?;
        if account.is_zero() {
            return Err(AccessError::ZeroAddress);
        }
        let inserted = self.members.write().entry(role).or_default().insert(account);
        if inserted {
            info!(target: "access", %role, %account, sender = %caller, "role granted");
        }
        Ok(())
    }

    pub fn revoke_role(&self, caller: &Address, role: Role, account: &Address) -> Result<(), AccessError> {
        self.ensure_role(Role::Admin, caller)?;
        let removed = self
            .members
            .write()
            .get_mut(&role)
            .map(|set| set.remove(account))
            .unwrap_or(false);
        if removed {
            info!(target: "access", %role, %account, sender = %caller, "role revoked");
        }
        Ok(())
    }

    /// Drop a role held by the caller itself.
    pub fn renounce_role(&self, caller: &Address, role: Role) {
        if let Some(set) = self.members.write().get_mut(&role) {
            if set.remove(caller) {
                info!(target: "access", %role, account = %caller, "role renounced");
            }
        }
    }

    pub fn members(&self, role: Role) -> Vec<Address> {
        let mut out: Vec<Address> = self
            .members
            .read()
            .get(&role)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        out.sort();
        out
    }
}

impl Authorizer for AccessControl {
    fn has_role(&self, role: Role, account: &Address) -> bool {
        self.members
            .read()
            .get(&role)
            .map(|set| set.contains(account))
            .unwrap_or(false)
    }
}
