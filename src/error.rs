//! Error taxonomy for the land operation.
//!
//! Every failure the engine raises deliberately is a [`LandError`] carried
//! inside `anyhow::Error`, so callers can branch on the category (exit codes,
//! "already landed" detection) while intermediate layers keep plain `Result`
//! plumbing with `?`.

use thiserror::Error;

/// A categorized land failure.
#[derive(Debug, Error)]
pub enum LandError {
    /// The user asked for something contradictory or invalid. Raised before
    /// any repository mutation.
    #[error("{0}")]
    Config(String),

    /// There is nothing to land; the target already has every change.
    #[error("{0}")]
    NoOp(String),

    /// The changes do not integrate cleanly and the attempt was rolled back.
    #[error("{0}")]
    Conflict(String),

    /// A remote interaction (fetch, push, Perforce sync/submit) failed.
    #[error("{0}")]
    Publish(String),

    /// A pipeline sequencing bug or unparsable git output. Never the user's
    /// fault.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LandError {
    pub fn config(message: impl Into<String>) -> anyhow::Error {
        LandError::Config(message.into()).into()
    }

    pub fn no_op(message: impl Into<String>) -> anyhow::Error {
        LandError::NoOp(message.into()).into()
    }

    pub fn conflict(message: impl Into<String>) -> anyhow::Error {
        LandError::Conflict(message.into()).into()
    }

    pub fn publish(message: impl Into<String>) -> anyhow::Error {
        LandError::Publish(message.into()).into()
    }

    pub fn internal(message: impl Into<String>) -> anyhow::Error {
        LandError::Internal(message.into()).into()
    }
}

/// The categorized error behind an `anyhow::Error`, if there is one.
pub fn as_land_error(err: &anyhow::Error) -> Option<&LandError> {
    err.downcast_ref::<LandError>()
}
