use std::collections::HashSet;
use std::sync::Arc;

use dirtx_compensating::OperationRecorder;
use dirtx_core::{
    Attribute, Attributes, DirectoryError, DirectoryOperations, ModificationItem,
};
use tracing::debug;

use crate::executor::LdapOperationExecutor;
use crate::operation::DirectoryOperation;
use crate::renaming::TempEntryRenamingStrategy;

/// Captures what each directory write needs for its rollback, reading the
/// current entry state where the inverse depends on it.
#[derive(Debug, Clone)]
pub struct LdapOperationRecorder {
    renaming_strategy: Arc<dyn TempEntryRenamingStrategy>,
}

impl LdapOperationRecorder {
    #[must_use]
    pub fn new(renaming_strategy: Arc<dyn TempEntryRenamingStrategy>) -> Self {
        Self { renaming_strategy }
    }

    #[must_use]
    pub fn renaming_strategy(&self) -> &Arc<dyn TempEntryRenamingStrategy> {
        &self.renaming_strategy
    }
}

impl OperationRecorder for LdapOperationRecorder {
    type Operation = DirectoryOperation;
    type Executor = LdapOperationExecutor;

    fn operation_name(&self, operation: &DirectoryOperation) -> &'static str {
        operation.kind().as_str()
    }

    fn record(
        &self,
        ctx: &dyn DirectoryOperations,
        operation: DirectoryOperation,
    ) -> Result<LdapOperationExecutor, DirectoryError> {
        let executor = match operation {
            DirectoryOperation::Bind { name, attributes } => {
                LdapOperationExecutor::Bind { name, attributes }
            }
            DirectoryOperation::Rebind { name, attributes } => {
                let original_attributes = match ctx.lookup(&name) {
                    Ok(original) => Some(original),
                    Err(DirectoryError::NameNotFound(_)) => None,
                    Err(e) => return Err(e),
                };
                LdapOperationExecutor::Rebind {
                    name,
                    attributes,
                    original_attributes,
                }
            }
            DirectoryOperation::Rename { old_name, new_name } => LdapOperationExecutor::Rename {
                original_name: old_name,
                new_name,
            },
            DirectoryOperation::Unbind { name } => {
                // Parking a subtree would defer the failure to commit.
                if ctx.has_children(&name)? {
                    return Err(DirectoryError::NotEmpty(name));
                }
                let temporary_name = self.renaming_strategy.temporary_name(&name)?;
                LdapOperationExecutor::Unbind {
                    original_name: name,
                    temporary_name,
                }
            }
            DirectoryOperation::ModifyAttributes { name, items } => {
                let original = ctx.lookup(&name)?;
                let compensating_items = compensating_items(&original, &items);
                LdapOperationExecutor::ModifyAttributes {
                    name,
                    items,
                    compensating_items,
                }
            }
        };

        debug!(operation = %executor.kind(), "recorded compensating state");
        Ok(executor)
    }
}

/// One replace per touched attribute, restoring its values from `original`.
/// Attributes the entry did not have are replaced with no values, which
/// removes whatever the modification added.
fn compensating_items(original: &Attributes, items: &[ModificationItem]) -> Vec<ModificationItem> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.attribute.id().to_lowercase()))
        .map(|item| {
            let id = item.attribute.id();
            let restored = original
                .get(id)
                .cloned()
                .unwrap_or_else(|| Attribute::named(id));
            ModificationItem::replace(restored)
        })
        .collect()
}
