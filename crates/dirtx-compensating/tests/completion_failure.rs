//! Integration tests for commit and rollback failure scenarios.

use std::cell::RefCell;

use dirtx_compensating::{
    CompensatingOperationManager, CompletionPhase, OperationExecutor, OperationRecorder,
    OperationStatus, TransactionError,
};

struct TestContext {
    log: RefCell<Vec<String>>,
}

impl TestContext {
    fn new() -> Self {
        Self {
            log: RefCell::new(Vec::new()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
struct TestError(String);

#[derive(Clone, Copy)]
struct Behaviour {
    name: &'static str,
    fail_rollback: bool,
    fail_commit: bool,
}

impl Behaviour {
    fn ok(name: &'static str) -> Self {
        Self {
            name,
            fail_rollback: false,
            fail_commit: false,
        }
    }

    fn failing_rollback(name: &'static str) -> Self {
        Self {
            fail_rollback: true,
            ..Self::ok(name)
        }
    }

    fn failing_commit(name: &'static str) -> Self {
        Self {
            fail_commit: true,
            ..Self::ok(name)
        }
    }
}

struct ScriptedExecutor(Behaviour);

impl OperationExecutor for ScriptedExecutor {
    type Context = TestContext;
    type Error = TestError;

    fn name(&self) -> &'static str {
        self.0.name
    }

    fn perform(&self, ctx: &TestContext) -> Result<(), TestError> {
        ctx.log.borrow_mut().push(format!("performed {}", self.0.name));
        Ok(())
    }

    fn rollback(&self, ctx: &TestContext) -> Result<(), TestError> {
        if self.0.fail_rollback {
            ctx.log
                .borrow_mut()
                .push(format!("failed to roll back {}", self.0.name));
            return Err(TestError(format!("{} rollback error", self.0.name)));
        }
        ctx.log.borrow_mut().push(format!("rolled back {}", self.0.name));
        Ok(())
    }

    fn commit(&self, ctx: &TestContext) -> Result<(), TestError> {
        if self.0.fail_commit {
            ctx.log
                .borrow_mut()
                .push(format!("failed to commit {}", self.0.name));
            return Err(TestError(format!("{} commit error", self.0.name)));
        }
        ctx.log.borrow_mut().push(format!("committed {}", self.0.name));
        Ok(())
    }

    fn rollback_description(&self) -> String {
        format!("restore state before {}", self.0.name)
    }
}

struct ScriptedRecorder;

impl OperationRecorder for ScriptedRecorder {
    type Operation = Behaviour;
    type Executor = ScriptedExecutor;

    fn operation_name(&self, operation: &Behaviour) -> &'static str {
        operation.name
    }

    fn record(&self, _ctx: &TestContext, operation: Behaviour) -> Result<ScriptedExecutor, TestError> {
        Ok(ScriptedExecutor(operation))
    }
}

fn perform_all(
    ctx: &TestContext,
    operations: &[Behaviour],
) -> CompensatingOperationManager<ScriptedRecorder> {
    let mut manager = CompensatingOperationManager::new(ScriptedRecorder);
    for operation in operations {
        manager
            .perform_operation(ctx, *operation)
            .expect("scripted operations always perform");
    }
    ctx.log.borrow_mut().clear();
    manager
}

#[test]
fn rollback_failure_still_runs_other_rollbacks() {
    let ctx = TestContext::new();
    let mut manager = perform_all(
        &ctx,
        &[
            Behaviour::ok("step_a"),
            Behaviour::failing_rollback("step_b"),
            Behaviour::ok("step_c"),
        ],
    );

    let result = manager.rollback(&ctx);

    assert!(result.is_err());
    let log = ctx.log.borrow();
    assert_eq!(log.len(), 3);
    assert_eq!(log[0], "rolled back step_c");
    assert_eq!(log[1], "failed to roll back step_b");
    assert_eq!(log[2], "rolled back step_a");
}

#[test]
fn multiple_rollback_failures_are_all_reported() {
    let ctx = TestContext::new();
    let mut manager = perform_all(
        &ctx,
        &[
            Behaviour::failing_rollback("fail_a"),
            Behaviour::ok("success_b"),
            Behaviour::failing_rollback("fail_c"),
            Behaviour::failing_rollback("fail_d"),
        ],
    );

    let err = manager.rollback(&ctx).expect_err("should be an error");
    match err {
        TransactionError::TransactionSystem { phase, failures } => {
            assert_eq!(phase, CompletionPhase::Rollback);
            let operations: Vec<&str> = failures.iter().map(|f| f.operation.as_str()).collect();
            assert_eq!(operations, ["fail_d", "fail_c", "fail_a"]);

            let messages: Vec<&str> = failures.iter().map(|f| f.error.0.as_str()).collect();
            assert_eq!(
                messages,
                ["fail_d rollback error", "fail_c rollback error", "fail_a rollback error"]
            );
            assert_eq!(failures[0].description, "restore state before fail_d");
        }
        _ => panic!("expected TransactionSystem error"),
    }
    assert!(manager.is_empty());
}

#[test]
fn commit_failure_still_commits_later_operations() {
    let ctx = TestContext::new();
    let mut manager = perform_all(
        &ctx,
        &[
            Behaviour::failing_commit("unbind_a"),
            Behaviour::ok("bind_b"),
        ],
    );

    let err = manager.commit(&ctx).expect_err("should be an error");

    assert!(matches!(
        err,
        TransactionError::TransactionSystem {
            phase: CompletionPhase::Commit,
            ref failures,
        } if failures.len() == 1 && failures[0].description == "finalize unbind_a"
    ));
    let log = ctx.log.borrow();
    assert_eq!(*log, ["failed to commit unbind_a", "committed bind_b"]);
}

#[test]
fn transaction_system_error_display_counts_failures() {
    let ctx = TestContext::new();
    let mut manager = perform_all(
        &ctx,
        &[
            Behaviour::failing_rollback("a"),
            Behaviour::failing_rollback("b"),
        ],
    );

    let err = manager.rollback(&ctx).expect_err("should be an error");

    assert_eq!(
        err.to_string(),
        "rollback failed for 2 operation(s); resource state can no longer be trusted"
    );
}

#[test]
fn audit_log_reflects_completion_outcome() {
    let ctx = TestContext::new();
    let mut manager = perform_all(
        &ctx,
        &[
            Behaviour::ok("first"),
            Behaviour::failing_rollback("second"),
        ],
    );

    let _ = manager.rollback(&ctx);

    let records = manager.audit_log().records();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].status, OperationStatus::RolledBack);
    assert_eq!(records[1].status, OperationStatus::RollbackFailed);
    assert_eq!(
        records[1].rollback_description.as_deref(),
        Some("restore state before second")
    );
    assert_eq!(manager.audit_log().summary(), "↩ first\n⚠ second");
}
