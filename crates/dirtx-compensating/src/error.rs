use std::fmt::{self, Debug};

use thiserror::Error;

/// The completion sweep during which an executor failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionPhase {
    Commit,
    Rollback,
}

impl fmt::Display for CompletionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Commit => f.write_str("commit"),
            Self::Rollback => f.write_str("rollback"),
        }
    }
}

/// Error from a failed commit or rollback of one recorded operation.
#[derive(Debug, thiserror::Error)]
#[error("{description} failed for operation '{operation}'")]
pub struct CompensationError<E> {
    /// Name of the operation whose commit or rollback failed.
    pub operation: String,
    /// Description of what the commit or rollback was trying to do.
    pub description: String,
    /// The underlying error.
    #[source]
    pub error: E,
}

/// Error from a compensating transaction.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransactionError<E: Debug> {
    /// The forward operation failed before taking effect. Nothing was
    /// recorded for it and earlier operations are untouched.
    #[error("operation '{operation}' failed")]
    OperationFailed {
        /// Name of the operation that failed.
        operation: String,
        /// The error that caused the operation to fail.
        #[source]
        source: E,
    },

    /// Commit or rollback of one or more recorded operations failed. The
    /// resource may match neither the state before nor after the
    /// transaction.
    #[error("{phase} failed for {} operation(s); resource state can no longer be trusted", failures.len())]
    TransactionSystem {
        /// Sweep in which the failures happened.
        phase: CompletionPhase,
        /// Every failure, in the order the executors were processed.
        failures: Vec<CompensationError<E>>,
    },
}

impl<E: Debug> TransactionError<E> {
    /// Whether the transaction's consistency guarantees were lost.
    #[must_use]
    pub fn is_transaction_system_error(&self) -> bool {
        matches!(self, Self::TransactionSystem { .. })
    }
}
