use mintgate_types::{AccessError, Amount, TokenError};
use thiserror::Error;

use crate::types::RootId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DistributorError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("allocation root must be non-zero")]
    ZeroRoot,

    #[error("allocation total must be non-zero")]
    ZeroTotal,

    #[error("amount must be non-zero")]
    ZeroAmount,

    #[error("account is the zero address")]
    ZeroAddress,

    #[error("allocation root {0} not found")]
    RootNotFound(RootId),

    #[error("inclusion proof does not match root {0}")]
    InvalidProof(RootId),

    #[error("nothing to claim: cumulative {cumulative}, already claimed {claimed}")]
    NothingToClaim { cumulative: Amount, claimed: Amount },

    #[error("reentrant call into the distributor")]
    Reentrant,

    #[error("arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error(transparent)]
    Token(#[from] TokenError),
}
