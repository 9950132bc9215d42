//! Integration tests for directory failures during commit and rollback.

use std::sync::{Arc, Mutex};

use dirtx_compensating::{CompletionPhase, OperationStatus, TransactionError};
use dirtx_core::{
    Attributes, DirectoryError, DirectoryOperations, DistinguishedName, InMemoryDirectory,
    ModificationItem,
};
use dirtx_ldap::{DirectoryTransactionManager, LdapTransactionError};

fn dn(s: &str) -> DistinguishedName {
    DistinguishedName::parse(s).expect("valid name")
}

fn company() -> InMemoryDirectory {
    InMemoryDirectory::new()
        .with_entry("o=acme", Attributes::new().with("o", ["acme"]))
        .with_entry("cn=a, o=acme", Attributes::new().with("cn", ["a"]))
        .with_entry("cn=b, o=acme", Attributes::new().with("cn", ["b"]))
        .with_entry("cn=c, o=acme", Attributes::new().with("cn", ["c"]))
}

/// Fails unbinds of the listed names once armed; everything else goes
/// straight to the in-memory directory.
struct FlakyDirectory {
    inner: InMemoryDirectory,
    failing_unbinds: Mutex<Vec<DistinguishedName>>,
}

impl FlakyDirectory {
    fn new(inner: InMemoryDirectory) -> Self {
        Self {
            inner,
            failing_unbinds: Mutex::new(Vec::new()),
        }
    }

    fn fail_unbind_of(&self, name: &str) {
        self.failing_unbinds.lock().expect("lock").push(dn(name));
    }
}

impl DirectoryOperations for FlakyDirectory {
    fn bind(&self, name: &DistinguishedName, attributes: &Attributes) -> dirtx_core::Result<()> {
        self.inner.bind(name, attributes)
    }

    fn lookup(&self, name: &DistinguishedName) -> dirtx_core::Result<Attributes> {
        self.inner.lookup(name)
    }

    fn rebind(&self, name: &DistinguishedName, attributes: &Attributes) -> dirtx_core::Result<()> {
        self.inner.rebind(name, attributes)
    }

    fn rename(&self, old_name: &DistinguishedName, new_name: &DistinguishedName) -> dirtx_core::Result<()> {
        self.inner.rename(old_name, new_name)
    }

    fn has_children(&self, name: &DistinguishedName) -> dirtx_core::Result<bool> {
        self.inner.has_children(name)
    }

    fn unbind(&self, name: &DistinguishedName) -> dirtx_core::Result<()> {
        if self.failing_unbinds.lock().expect("lock").contains(name) {
            return Err(DirectoryError::Unavailable(format!("server refused to delete {name}")));
        }
        self.inner.unbind(name)
    }

    fn modify_attributes(
        &self,
        name: &DistinguishedName,
        items: &[ModificationItem],
    ) -> dirtx_core::Result<()> {
        self.inner.modify_attributes(name, items)
    }
}

fn failures(err: LdapTransactionError) -> (CompletionPhase, Vec<String>) {
    match err {
        TransactionError::TransactionSystem { phase, failures } => (
            phase,
            failures.into_iter().map(|f| f.description).collect(),
        ),
        other => panic!("expected transaction system error, got {other:?}"),
    }
}

#[test]
fn rollback_failures_are_aggregated_and_other_operations_still_undone() -> anyhow::Result<()> {
    let directory = Arc::new(FlakyDirectory::new(company()));
    let manager = DirectoryTransactionManager::new(Arc::clone(&directory))?;

    let mut tx = manager.begin();
    tx.bind(&dn("cn=d, o=acme"), &Attributes::new().with("cn", ["d"]))?;
    tx.unbind(&dn("cn=a, o=acme"))?;
    tx.bind(&dn("cn=e, o=acme"), &Attributes::new().with("cn", ["e"]))?;

    directory.fail_unbind_of("cn=d, o=acme");
    directory.fail_unbind_of("cn=e, o=acme");

    let err = tx.rollback().expect_err("two rollbacks fail");
    assert!(err.is_transaction_system_error());

    let (phase, descriptions) = failures(err);
    assert_eq!(phase, CompletionPhase::Rollback);
    assert_eq!(descriptions, ["unbind 'cn=e, o=acme'", "unbind 'cn=d, o=acme'"]);

    assert!(directory.inner.contains(&dn("cn=a, o=acme")));
    assert!(!directory.inner.contains(&dn("cn=a_temp, o=acme")));
    Ok(())
}

#[test]
fn commit_failure_still_commits_later_operations() -> anyhow::Result<()> {
    let directory = Arc::new(FlakyDirectory::new(company()));
    let manager = DirectoryTransactionManager::new(Arc::clone(&directory))?;

    let mut tx = manager.begin();
    tx.unbind(&dn("cn=a, o=acme"))?;
    tx.unbind(&dn("cn=b, o=acme"))?;
    tx.unbind(&dn("cn=c, o=acme"))?;

    directory.fail_unbind_of("cn=b_temp, o=acme");

    let err = tx.commit().expect_err("one commit fails");
    assert_eq!(
        err.to_string(),
        "commit failed for 1 operation(s); resource state can no longer be trusted"
    );

    let (phase, descriptions) = failures(err);
    assert_eq!(phase, CompletionPhase::Commit);
    assert_eq!(descriptions, ["unbind 'cn=b_temp, o=acme'"]);

    assert!(!directory.inner.contains(&dn("cn=a_temp, o=acme")));
    assert!(directory.inner.contains(&dn("cn=b_temp, o=acme")));
    assert!(!directory.inner.contains(&dn("cn=c_temp, o=acme")));
    Ok(())
}

#[test]
fn execute_reports_rollback_failure_over_closure_error() -> anyhow::Result<()> {
    let directory = Arc::new(FlakyDirectory::new(company()));
    let manager = DirectoryTransactionManager::new(Arc::clone(&directory))?;
    directory.fail_unbind_of("cn=d, o=acme");

    let result = manager.execute(|tx| -> Result<(), LdapTransactionError> {
        tx.bind(&dn("cn=d, o=acme"), &Attributes::new().with("cn", ["d"]))?;
        tx.bind(&dn("cn=a, o=acme"), &Attributes::new().with("cn", ["a"]))?;
        Ok(())
    });

    let (phase, descriptions) = failures(result.expect_err("rollback fails"));
    assert_eq!(phase, CompletionPhase::Rollback);
    assert_eq!(descriptions, ["unbind 'cn=d, o=acme'"]);
    Ok(())
}

#[test]
fn failed_operation_is_audited_and_rollback_continues_past_failures() -> anyhow::Result<()> {
    let directory = Arc::new(FlakyDirectory::new(company()));
    let manager = DirectoryTransactionManager::new(Arc::clone(&directory))?;

    let mut tx = manager.begin();
    tx.bind(&dn("cn=d, o=acme"), &Attributes::new().with("cn", ["d"]))?;
    tx.rename(&dn("cn=b, o=acme"), &dn("cn=bb, o=acme"))?;
    directory.fail_unbind_of("cn=d, o=acme");

    let _ = tx.bind(&dn("cn=c, o=acme"), &Attributes::new());
    let statuses: Vec<_> = tx.audit_log().records().iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        [
            OperationStatus::Performed,
            OperationStatus::Performed,
            OperationStatus::Failed
        ]
    );

    assert!(tx.rollback().is_err());
    assert!(directory.inner.contains(&dn("cn=b, o=acme")));
    assert!(directory.inner.contains(&dn("cn=d, o=acme")));
    Ok(())
}
