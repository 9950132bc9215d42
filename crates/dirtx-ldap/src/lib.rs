//! Compensating transactions over LDAP-style directory operations.
//!
//! A [`DirectoryTransactionManager`] begins [`DirectoryTransaction`]s.
//! Every write made through a transaction is applied to the directory at
//! once, together with enough recorded state to undo it. Unbinds move the
//! entry to a temporary name chosen by a [`TempEntryRenamingStrategy`] and
//! only delete it on commit.

mod config;
mod error;
mod executor;
mod operation;
mod recorder;
mod renaming;
mod transaction;

pub use config::{RenamingStrategyConfig, TransactionConfig};
pub use error::{ConfigError, LdapTransactionError, UnsupportedOperation};
pub use executor::LdapOperationExecutor;
pub use operation::{DirectoryOperation, OperationKind};
pub use recorder::LdapOperationRecorder;
pub use renaming::{
    DEFAULT_TEMP_SUFFIX, DefaultTempEntryRenamingStrategy, DifferentSubtreeTempEntryRenamingStrategy,
    TempEntryRenamingStrategy, TempNameSequence,
};
pub use transaction::{DirectoryTransaction, DirectoryTransactionManager};
