use std::time::Instant;

/// Status of an operation in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum OperationStatus {
    /// Forward operation applied and awaiting commit or rollback.
    Performed,
    /// Recording or the forward operation failed.
    Failed,
    /// Operation was committed.
    Committed,
    /// Commit of the operation failed.
    CommitFailed,
    /// Operation was rolled back.
    RolledBack,
    /// Rollback of the operation failed.
    RollbackFailed,
}

/// Record of one attempted operation.
#[derive(Debug)]
pub struct OperationRecord {
    /// Name of the operation.
    pub operation: String,
    /// Current status.
    pub status: OperationStatus,
    /// When the operation started.
    pub started_at: Instant,
    /// When the operation last changed status.
    pub completed_at: Option<Instant>,
    /// Description of the rollback (for performed operations).
    pub rollback_description: Option<String>,
}

/// Audit log tracking every operation attempted in a transaction.
#[derive(Debug, Default)]
pub struct OperationAuditLog {
    records: Vec<OperationRecord>,
}

impl OperationAuditLog {
    /// Create a new empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an operation starting and return its position in the log.
    pub(crate) fn record_start(&mut self, operation: &str) -> usize {
        self.records.push(OperationRecord {
            operation: operation.to_string(),
            status: OperationStatus::Performed,
            started_at: Instant::now(),
            completed_at: None,
            rollback_description: None,
        });
        self.records.len() - 1
    }

    pub(crate) fn record_failure(&mut self, index: usize) {
        self.set_status(index, OperationStatus::Failed);
    }

    pub(crate) fn record_performed(&mut self, index: usize, rollback_description: String) {
        self.set_status(index, OperationStatus::Performed);
        if let Some(record) = self.records.get_mut(index) {
            record.rollback_description = Some(rollback_description);
        }
    }

    pub(crate) fn record_committed(&mut self, index: usize) {
        self.set_status(index, OperationStatus::Committed);
    }

    pub(crate) fn record_commit_failed(&mut self, index: usize) {
        self.set_status(index, OperationStatus::CommitFailed);
    }

    pub(crate) fn record_rolled_back(&mut self, index: usize) {
        self.set_status(index, OperationStatus::RolledBack);
    }

    pub(crate) fn record_rollback_failed(&mut self, index: usize) {
        self.set_status(index, OperationStatus::RollbackFailed);
    }

    fn set_status(&mut self, index: usize, status: OperationStatus) {
        if let Some(record) = self.records.get_mut(index) {
            record.status = status;
            record.completed_at = Some(Instant::now());
        }
    }

    /// Get all records in the audit log, in the order operations started.
    #[must_use]
    pub fn records(&self) -> &[OperationRecord] {
        &self.records
    }

    /// Get a summary of the transaction for display.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        for record in &self.records {
            let status = match record.status {
                OperationStatus::Performed => "•",
                OperationStatus::Committed => "✓",
                OperationStatus::Failed => "✗",
                OperationStatus::RolledBack => "↩",
                OperationStatus::CommitFailed | OperationStatus::RollbackFailed => "⚠",
            };
            lines.push(format!("{status} {}", record.operation));
        }
        lines.join("\n")
    }
}
