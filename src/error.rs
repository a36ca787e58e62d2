use thiserror::Error;

use crate::engine::EngineState;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("cursor out of range: cannot advance past index {cursor} of a {len}-point series")]
    OutOfRange { cursor: usize, len: usize },

    #[error("engine already initialized")]
    AlreadyInitialized,

    #[error("engine not initialized")]
    NotInitialized,

    #[error("cannot {op} while {state}")]
    InvalidState { op: &'static str, state: EngineState },

    #[error("insufficient funds: need {needed:.2}, have {available:.2}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("insufficient shares: need {needed}, hold {held}")]
    InsufficientShares { needed: u32, held: u32 },

    #[error("config error: {0}")]
    Config(String),
}

pub type SyncResult<T> = Result<T, SyncError>;
