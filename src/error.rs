use thiserror::Error;

/// Errors surfaced by the session-wallet subsystem.
///
/// Insufficient balance is deliberately absent: it is a normal outcome
/// reported in-band by [`crate::ledger::SpendOutcome`], not an error.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("pin must be at least {0} characters")]
    InvalidPin(usize),

    #[error("key derivation failed: {0}")]
    Derivation(String),

    #[error("no active session")]
    NoActiveSession,

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}
