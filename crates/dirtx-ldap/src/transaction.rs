use std::sync::Arc;

use dirtx_compensating::{CompensatingOperationManager, OperationAuditLog};
use dirtx_core::{Attributes, DirectoryOperations, DistinguishedName, ModificationItem};
use tracing::{debug, error, warn};

use crate::config::TransactionConfig;
use crate::error::{ConfigError, LdapTransactionError};
use crate::operation::DirectoryOperation;
use crate::recorder::LdapOperationRecorder;
use crate::renaming::{DefaultTempEntryRenamingStrategy, TempEntryRenamingStrategy, TempNameSequence};

/// Hands out compensating transactions over one directory.
///
/// Each [`DirectoryTransaction`] gets its own operation stack, so
/// transactions never see each other's pending work.
#[derive(Debug)]
pub struct DirectoryTransactionManager<D> {
    directory: Arc<D>,
    renaming_strategy: Arc<dyn TempEntryRenamingStrategy>,
}

impl<D> DirectoryTransactionManager<D>
where
    D: DirectoryOperations + 'static,
{
    /// Manager using the default `_temp` suffix strategy.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::AnonymousReadOnly` if the directory is an
    /// anonymous read-only view.
    pub fn new(directory: Arc<D>) -> Result<Self, ConfigError> {
        Self::with_renaming_strategy(directory, Arc::new(DefaultTempEntryRenamingStrategy::default()))
    }

    /// # Errors
    ///
    /// Returns `ConfigError::AnonymousReadOnly` if the directory is an
    /// anonymous read-only view.
    pub fn with_renaming_strategy(
        directory: Arc<D>,
        renaming_strategy: Arc<dyn TempEntryRenamingStrategy>,
    ) -> Result<Self, ConfigError> {
        if directory.is_anonymous_read_only() {
            return Err(ConfigError::AnonymousReadOnly);
        }
        Ok(Self {
            directory,
            renaming_strategy,
        })
    }

    /// Manager using the configured renaming strategy. Managers that may
    /// park entries in the same subtree must be given clones of one
    /// `sequence` so their temporary names never collide.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::AnonymousReadOnly` if the directory is an
    /// anonymous read-only view.
    pub fn from_config(
        directory: Arc<D>,
        config: &TransactionConfig,
        sequence: &TempNameSequence,
    ) -> Result<Self, ConfigError> {
        let strategy = config.build_renaming_strategy(sequence);
        Self::with_renaming_strategy(directory, strategy)
    }

    #[must_use]
    pub fn directory(&self) -> &Arc<D> {
        &self.directory
    }

    #[must_use]
    pub fn renaming_strategy(&self) -> &Arc<dyn TempEntryRenamingStrategy> {
        &self.renaming_strategy
    }

    #[must_use]
    pub fn begin(&self) -> DirectoryTransaction<'_> {
        debug!("beginning directory transaction");
        DirectoryTransaction {
            directory: &*self.directory,
            manager: CompensatingOperationManager::new(LdapOperationRecorder::new(Arc::clone(
                &self.renaming_strategy,
            ))),
            completed: false,
        }
    }

    /// Run `f` inside a transaction. `Ok` commits, `Err` rolls back.
    ///
    /// # Errors
    ///
    /// Returns the error from `f`, or the commit failure. If rolling back
    /// after `f` fails also fails, the rollback failure is returned instead,
    /// since the directory is then in an unknown state.
    pub fn execute<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut DirectoryTransaction<'_>) -> Result<T, E>,
        E: From<LdapTransactionError>,
    {
        let mut transaction = self.begin();
        match f(&mut transaction) {
            Ok(value) => {
                transaction.commit()?;
                Ok(value)
            }
            Err(e) => {
                transaction.rollback()?;
                Err(e)
            }
        }
    }
}

/// A running compensating transaction.
///
/// Writes are performed immediately and recorded so they can be undone.
/// Dropping a transaction that was neither committed nor rolled back rolls
/// it back.
pub struct DirectoryTransaction<'a> {
    directory: &'a (dyn DirectoryOperations + 'static),
    manager: CompensatingOperationManager<LdapOperationRecorder>,
    completed: bool,
}

impl DirectoryTransaction<'_> {
    /// # Errors
    ///
    /// Returns `TransactionError::OperationFailed` if the directory rejects
    /// the bind.
    pub fn bind(
        &mut self,
        name: &DistinguishedName,
        attributes: &Attributes,
    ) -> Result<(), LdapTransactionError> {
        self.perform(DirectoryOperation::Bind {
            name: name.clone(),
            attributes: attributes.clone(),
        })
    }

    /// # Errors
    ///
    /// Returns `TransactionError::OperationFailed` if the current entry
    /// cannot be read or the directory rejects the rebind.
    pub fn rebind(
        &mut self,
        name: &DistinguishedName,
        attributes: &Attributes,
    ) -> Result<(), LdapTransactionError> {
        self.perform(DirectoryOperation::Rebind {
            name: name.clone(),
            attributes: attributes.clone(),
        })
    }

    /// # Errors
    ///
    /// Returns `TransactionError::OperationFailed` if the directory rejects
    /// the rename.
    pub fn rename(
        &mut self,
        old_name: &DistinguishedName,
        new_name: &DistinguishedName,
    ) -> Result<(), LdapTransactionError> {
        self.perform(DirectoryOperation::Rename {
            old_name: old_name.clone(),
            new_name: new_name.clone(),
        })
    }

    /// Move the entry to its temporary name. It is deleted on commit.
    ///
    /// # Errors
    ///
    /// Returns `TransactionError::OperationFailed` if no temporary name can
    /// be derived or the rename to it fails.
    pub fn unbind(&mut self, name: &DistinguishedName) -> Result<(), LdapTransactionError> {
        self.perform(DirectoryOperation::Unbind { name: name.clone() })
    }

    /// # Errors
    ///
    /// Returns `TransactionError::OperationFailed` if the entry cannot be
    /// read or the modification is rejected.
    pub fn modify_attributes(
        &mut self,
        name: &DistinguishedName,
        items: &[ModificationItem],
    ) -> Result<(), LdapTransactionError> {
        self.perform(DirectoryOperation::ModifyAttributes {
            name: name.clone(),
            items: items.to_vec(),
        })
    }

    /// Read an entry. Reads are not recorded.
    ///
    /// # Errors
    ///
    /// Returns the directory error, typically `NameNotFound`.
    pub fn lookup(&self, name: &DistinguishedName) -> dirtx_core::Result<Attributes> {
        self.directory.lookup(name)
    }

    /// # Errors
    ///
    /// Returns `TransactionError::OperationFailed` if recording or
    /// performing the operation fails. Nothing is recorded in that case.
    pub fn perform(&mut self, operation: DirectoryOperation) -> Result<(), LdapTransactionError> {
        self.manager.perform_operation(self.directory, operation)
    }

    #[must_use]
    pub fn pending_operations(&self) -> usize {
        self.manager.len()
    }

    #[must_use]
    pub fn audit_log(&self) -> &OperationAuditLog {
        self.manager.audit_log()
    }

    /// # Errors
    ///
    /// Returns `TransactionError::TransactionSystem` listing every operation
    /// that could not be finalized.
    pub fn commit(mut self) -> Result<(), LdapTransactionError> {
        self.completed = true;
        debug!(pending = self.manager.len(), "committing directory transaction");
        self.manager.commit(self.directory)
    }

    /// # Errors
    ///
    /// Returns `TransactionError::TransactionSystem` listing every operation
    /// that could not be undone.
    pub fn rollback(mut self) -> Result<(), LdapTransactionError> {
        self.completed = true;
        debug!(pending = self.manager.len(), "rolling back directory transaction");
        self.manager.rollback(self.directory)
    }
}

impl Drop for DirectoryTransaction<'_> {
    fn drop(&mut self) {
        if self.completed || self.manager.is_empty() {
            return;
        }
        warn!(
            pending = self.manager.len(),
            "directory transaction dropped without completion; rolling back"
        );
        if let Err(e) = self.manager.rollback(self.directory) {
            error!(error = %e, "rollback of dropped directory transaction failed");
        }
    }
}
