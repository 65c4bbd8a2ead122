use thiserror::Error;

use crate::navigation::GameStatus;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("no level has been started")]
    NoSession,
    #[error("cannot {action} while the session is {status}")]
    InvalidStatus {
        action: &'static str,
        status: GameStatus,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session worker has stopped")]
    Closed,
}
