/// A recorded operation that knows how to apply itself and how to undo it.
///
/// Lifecycle: created by an [`OperationRecorder`], `perform()` runs once,
/// then exactly one of `commit()` or `rollback()` runs once.
///
/// # Type Parameters
///
/// - `Context`: The resource the operation is applied to (injected on each call)
/// - `Error`: The error type reported by the resource
pub trait OperationExecutor {
    /// Resource the operation runs against.
    type Context: ?Sized;

    /// Error type for resource failures.
    type Error;

    /// Human-readable operation name for logging and error messages.
    fn name(&self) -> &'static str;

    /// Apply the forward operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource rejects the operation. The operation
    /// is then considered never to have taken effect.
    fn perform(&self, ctx: &Self::Context) -> Result<(), Self::Error>;

    /// Undo the effects of `perform()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the inverse operation fails.
    fn rollback(&self, ctx: &Self::Context) -> Result<(), Self::Error>;

    /// Finalize the operation once the transaction is known to succeed.
    ///
    /// The default implementation is a no-op, suitable for operations whose
    /// forward action is already final.
    ///
    /// # Errors
    ///
    /// Returns an error if the finalizing call fails.
    fn commit(&self, ctx: &Self::Context) -> Result<(), Self::Error> {
        let _ = ctx;
        Ok(())
    }

    /// Human-readable description of what rollback will do.
    fn rollback_description(&self) -> String {
        format!("undo {}", self.name())
    }

    /// Human-readable description of what commit will do.
    fn commit_description(&self) -> String {
        format!("finalize {}", self.name())
    }
}

/// Captures the state needed to reverse an operation and produces the
/// executor that will perform it.
pub trait OperationRecorder {
    /// The operation vocabulary this recorder understands.
    type Operation;

    /// Executor produced for each recorded operation.
    type Executor: OperationExecutor;

    /// Name used for the operation in logs and errors, available before
    /// recording succeeds.
    fn operation_name(&self, operation: &Self::Operation) -> &'static str;

    /// Capture the current state of the resource and return an executor
    /// that has not yet performed the operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the prior state cannot be read.
    fn record(
        &self,
        ctx: &<Self::Executor as OperationExecutor>::Context,
        operation: Self::Operation,
    ) -> Result<Self::Executor, <Self::Executor as OperationExecutor>::Error>;
}

/// Resource type of the executors produced by recorder `R`.
pub type ExecutorContext<R> =
    <<R as OperationRecorder>::Executor as OperationExecutor>::Context;

/// Error type of the executors produced by recorder `R`.
pub type ExecutorError<R> = <<R as OperationRecorder>::Executor as OperationExecutor>::Error;
