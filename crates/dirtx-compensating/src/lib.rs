//! Compensating transactions for resources without native rollback.
//!
//! Before each mutating call an [`OperationRecorder`] captures the state
//! needed to reverse it and hands back an [`OperationExecutor`]. The
//! [`CompensatingOperationManager`] performs the call and stacks the
//! executor; on commit the executors finalize in order, on rollback they
//! undo in reverse order.

mod audit;
mod error;
mod executor;
mod manager;

pub use audit::{OperationAuditLog, OperationRecord, OperationStatus};
pub use error::{CompensationError, CompletionPhase, TransactionError};
pub use executor::{ExecutorContext, ExecutorError, OperationExecutor, OperationRecorder};
pub use manager::CompensatingOperationManager;
