use std::fmt::Debug;

use tracing::{debug, error};

use crate::audit::OperationAuditLog;
use crate::error::{CompensationError, CompletionPhase, TransactionError};
use crate::executor::{ExecutorContext, ExecutorError, OperationExecutor, OperationRecorder};

/// Drives one compensating transaction.
///
/// Each performed operation pushes its executor on a stack. Commit visits
/// the stack in insertion order; rollback unwinds it in reverse (LIFO), so
/// later operations are undone before the earlier ones they may depend on.
///
/// Both sweeps attempt every executor and report all failures together.
/// The stack is empty afterwards, whatever the outcome.
pub struct CompensatingOperationManager<R: OperationRecorder> {
    recorder: R,
    executors: Vec<(usize, R::Executor)>,
    audit_log: OperationAuditLog,
}

impl<R> CompensatingOperationManager<R>
where
    R: OperationRecorder,
    ExecutorError<R>: Debug,
{
    #[must_use]
    pub fn new(recorder: R) -> Self {
        Self {
            recorder,
            executors: Vec::new(),
            audit_log: OperationAuditLog::new(),
        }
    }

    #[must_use]
    pub fn recorder(&self) -> &R {
        &self.recorder
    }

    /// Number of performed operations awaiting commit or rollback.
    #[must_use]
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }

    #[must_use]
    pub fn audit_log(&self) -> &OperationAuditLog {
        &self.audit_log
    }

    /// Record the operation, perform it, and keep its executor for commit
    /// or rollback.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::OperationFailed` if recording or the
    /// forward operation fails. Nothing is kept for the operation in that
    /// case.
    pub fn perform_operation(
        &mut self,
        ctx: &ExecutorContext<R>,
        operation: R::Operation,
    ) -> Result<(), TransactionError<ExecutorError<R>>> {
        let name = self.recorder.operation_name(&operation);
        let index = self.audit_log.record_start(name);

        let performed = self
            .recorder
            .record(ctx, operation)
            .and_then(|executor| executor.perform(ctx).map(|()| executor));

        match performed {
            Ok(executor) => {
                self.audit_log
                    .record_performed(index, executor.rollback_description());
                self.executors.push((index, executor));
                debug!(
                    operation = name,
                    pending = self.executors.len(),
                    "operation performed"
                );
                Ok(())
            }
            Err(source) => {
                self.audit_log.record_failure(index);
                debug!(operation = name, "operation failed before taking effect");
                Err(TransactionError::OperationFailed {
                    operation: name.to_string(),
                    source,
                })
            }
        }
    }

    /// Finalize every performed operation in the order it was performed.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::TransactionSystem` listing every executor
    /// whose commit failed.
    pub fn commit(
        &mut self,
        ctx: &ExecutorContext<R>,
    ) -> Result<(), TransactionError<ExecutorError<R>>> {
        debug!(count = self.executors.len(), "performing commit");
        let mut failures = Vec::new();

        for (index, executor) in std::mem::take(&mut self.executors) {
            match executor.commit(ctx) {
                Ok(()) => self.audit_log.record_committed(index),
                Err(error) => {
                    self.audit_log.record_commit_failed(index);
                    failures.push(CompensationError {
                        operation: executor.name().to_string(),
                        description: executor.commit_description(),
                        error,
                    });
                }
            }
        }

        Self::complete(CompletionPhase::Commit, failures)
    }

    /// Undo every performed operation, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::TransactionSystem` listing every executor
    /// whose rollback failed.
    pub fn rollback(
        &mut self,
        ctx: &ExecutorContext<R>,
    ) -> Result<(), TransactionError<ExecutorError<R>>> {
        debug!(count = self.executors.len(), "performing rollback");
        let mut failures = Vec::new();

        while let Some((index, executor)) = self.executors.pop() {
            match executor.rollback(ctx) {
                Ok(()) => self.audit_log.record_rolled_back(index),
                Err(error) => {
                    self.audit_log.record_rollback_failed(index);
                    failures.push(CompensationError {
                        operation: executor.name().to_string(),
                        description: executor.rollback_description(),
                        error,
                    });
                }
            }
        }

        Self::complete(CompletionPhase::Rollback, failures)
    }

    fn complete(
        phase: CompletionPhase,
        failures: Vec<CompensationError<ExecutorError<R>>>,
    ) -> Result<(), TransactionError<ExecutorError<R>>> {
        if failures.is_empty() {
            return Ok(());
        }
        for failure in &failures {
            error!(
                %phase,
                operation = %failure.operation,
                description = %failure.description,
                "completion step failed"
            );
        }
        Err(TransactionError::TransactionSystem { phase, failures })
    }
}
