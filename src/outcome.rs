//! The dispatch result model.
//!
//! Every dispatch ends in exactly one [`Outcome`]: a success payload or a
//! structured failure. Explicit failure returns and propagated errors from
//! handler or middleware bodies are normalized into the same [`Failure`]
//! shape, so the embedding application has one place to customize
//! user-visible failure behavior (the result-handler hook).

use std::collections::BTreeMap;

/// Success payload: a bare acknowledgement or a short status string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Success {
    Done,
    Status(String),
}

/// Structured failure: a human-readable message, the originating error when
/// the failure came out of a propagated error, and free-form debug pairs for
/// diagnostics.
#[derive(Debug)]
pub struct Failure {
    pub message: String,
    pub original_error: Option<anyhow::Error>,
    pub debug: BTreeMap<String, String>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Failure {
            message: message.into(),
            original_error: None,
            debug: BTreeMap::new(),
        }
    }

    /// Normalize a propagated error into the failure shape, keeping the
    /// original error attached.
    pub fn unexpected(error: anyhow::Error) -> Self {
        Failure {
            message: "handler raised an unexpected error".to_string(),
            original_error: Some(error),
            debug: BTreeMap::new(),
        }
    }

    pub fn caused_by(mut self, error: anyhow::Error) -> Self {
        self.original_error = Some(error);
        self
    }

    pub fn with_debug(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.debug.insert(key.into(), value.into());
        self
    }
}

/// The single channel through which all handler outcomes are reported.
#[derive(Debug)]
pub enum Outcome {
    Success(Success),
    Failure(Failure),
}

impl Outcome {
    pub fn ok() -> Self {
        Outcome::Success(Success::Done)
    }

    pub fn status(status: impl Into<String>) -> Self {
        Outcome::Success(Success::Status(status.into()))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Outcome::Failure(Failure::new(message))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }
}

impl From<Failure> for Outcome {
    fn from(failure: Failure) -> Self {
        Outcome::Failure(failure)
    }
}
