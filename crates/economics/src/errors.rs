use crate::types::EpochId;
use mintgate_types::{AccessError, Address, Amount, Timestamp, TokenError};
use thiserror::Error;

/// Rejections from the supply registry. None of them leave a partial update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SupplyError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("recorded amount must be greater than zero")]
    ZeroAmount,

    #[error("native burn of {requested} exceeds native circulating supply {available}")]
    NativeUnderflow { requested: Amount, available: Amount },

    #[error("bridge mint of {requested} exceeds pending bridge supply {pending}")]
    InsufficientPending { requested: Amount, pending: Amount },

    #[error("arithmetic overflow updating {0}")]
    Overflow(&'static str),
}

/// Rejections from the emissions controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmissionError {
    #[error(transparent)]
    Access(#[from] AccessError),

    #[error("no epoch is active at {now}")]
    EpochNotActive { now: Timestamp },

    #[error("epoch {epoch} budget exceeded: minted={minted}, requested={requested}, budget={budget}")]
    BudgetExceeded {
        epoch: EpochId,
        minted: Amount,
        requested: Amount,
        budget: Amount,
    },

    #[error("epoch starting at {start} overlaps previous epoch ending at {previous_end}")]
    Overlap { start: Timestamp, previous_end: Timestamp },

    #[error("invalid epoch window [{start}, {end}) at {now}")]
    InvalidTime {
        start: Timestamp,
        end: Timestamp,
        now: Timestamp,
    },

    #[error("epoch budget must be greater than zero")]
    ZeroBudget,

    #[error("emission amount must be greater than zero")]
    ZeroAmount,

    #[error("emission recipient is the zero address")]
    ZeroAddress,

    #[error("recipients ({recipients}) and amounts ({amounts}) differ in length")]
    LengthMismatch { recipients: usize, amounts: usize },

    #[error("batch must contain at least one recipient")]
    EmptyBatch,

    #[error("batch of {len} recipients exceeds limit of {max}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("epoch {0} does not exist")]
    NotEpoch(EpochId),

    #[error("epoch {0} is already finalized")]
    AlreadyFinal(EpochId),

    #[error("epoch {epoch} starts at {start}, not yet reached at {now}")]
    NotStarted {
        epoch: EpochId,
        start: Timestamp,
        now: Timestamp,
    },

    #[error("emissions are paused")]
    Paused,

    #[error("{0} is not a registered distributor")]
    UnknownDistributor(Address),

    #[error("arithmetic overflow computing {0}")]
    Overflow(&'static str),

    #[error("token rejected mint: {0}")]
    Token(#[from] TokenError),

    #[error("supply registry rejected record: {0}")]
    Supply(#[from] SupplyError),
}

/// Rejections from the bridge settlement tracker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("bridge transfer {0} is unknown or already settled")]
    UnknownTransfer(u64),

    #[error("destination domain must not be empty")]
    EmptyDestination,

    #[error(transparent)]
    Supply(#[from] SupplyError),
}
