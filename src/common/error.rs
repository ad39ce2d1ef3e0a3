use thiserror::Error;

use crate::recovery::RecoveryState;

#[derive(Debug, Error)]
pub enum AriesError {
    #[error("Cannot {operation} while the engine is {state}")]
    InvalidState {
        operation: &'static str,
        state: RecoveryState,
    },

    #[error("Corrupt image: expected LSN {expected}, found {found}")]
    CorruptImage { expected: u64, found: u64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, AriesError>;
