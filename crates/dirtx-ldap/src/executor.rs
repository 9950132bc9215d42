use dirtx_compensating::OperationExecutor;
use dirtx_core::{Attributes, DirectoryError, DirectoryOperations, DistinguishedName, ModificationItem};
use tracing::debug;

use crate::operation::OperationKind;

/// A recorded directory write with everything needed to undo it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LdapOperationExecutor {
    Bind {
        name: DistinguishedName,
        attributes: Attributes,
    },
    Rebind {
        name: DistinguishedName,
        attributes: Attributes,
        /// Attributes before the rebind, or `None` if the rebind created the entry.
        original_attributes: Option<Attributes>,
    },
    Rename {
        original_name: DistinguishedName,
        new_name: DistinguishedName,
    },
    /// The entry is parked at `temporary_name` and only deleted on commit.
    Unbind {
        original_name: DistinguishedName,
        temporary_name: DistinguishedName,
    },
    ModifyAttributes {
        name: DistinguishedName,
        items: Vec<ModificationItem>,
        compensating_items: Vec<ModificationItem>,
    },
}

impl LdapOperationExecutor {
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Bind { .. } => OperationKind::Bind,
            Self::Rebind { .. } => OperationKind::Rebind,
            Self::Rename { .. } => OperationKind::Rename,
            Self::Unbind { .. } => OperationKind::Unbind,
            Self::ModifyAttributes { .. } => OperationKind::ModifyAttributes,
        }
    }
}

impl OperationExecutor for LdapOperationExecutor {
    type Context = dyn DirectoryOperations;
    type Error = DirectoryError;

    fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    fn perform(&self, ctx: &dyn DirectoryOperations) -> Result<(), DirectoryError> {
        match self {
            Self::Bind { name, attributes } => {
                debug!(%name, "performing bind");
                ctx.bind(name, attributes)
            }
            Self::Rebind {
                name, attributes, ..
            } => {
                debug!(%name, "performing rebind");
                ctx.rebind(name, attributes)
            }
            Self::Rename {
                original_name,
                new_name,
            } => {
                debug!(from = %original_name, to = %new_name, "performing rename");
                ctx.rename(original_name, new_name)
            }
            Self::Unbind {
                original_name,
                temporary_name,
            } => {
                debug!(
                    name = %original_name,
                    temporary = %temporary_name,
                    "performing unbind by renaming to temporary entry"
                );
                ctx.rename(original_name, temporary_name)
            }
            Self::ModifyAttributes { name, items, .. } => {
                debug!(%name, count = items.len(), "performing modifyAttributes");
                ctx.modify_attributes(name, items)
            }
        }
    }

    fn rollback(&self, ctx: &dyn DirectoryOperations) -> Result<(), DirectoryError> {
        match self {
            Self::Bind { name, .. } => {
                debug!(%name, "rolling back bind");
                ctx.unbind(name)
            }
            Self::Rebind {
                name,
                original_attributes,
                ..
            } => {
                debug!(%name, "rolling back rebind");
                match original_attributes {
                    Some(original) => ctx.rebind(name, original),
                    None => ctx.unbind(name),
                }
            }
            Self::Rename {
                original_name,
                new_name,
            } => {
                debug!(from = %new_name, to = %original_name, "rolling back rename");
                ctx.rename(new_name, original_name)
            }
            Self::Unbind {
                original_name,
                temporary_name,
            } => {
                debug!(
                    name = %original_name,
                    temporary = %temporary_name,
                    "rolling back unbind"
                );
                ctx.rename(temporary_name, original_name)
            }
            Self::ModifyAttributes {
                name,
                compensating_items,
                ..
            } => {
                debug!(%name, "rolling back modifyAttributes");
                ctx.modify_attributes(name, compensating_items)
            }
        }
    }

    fn commit(&self, ctx: &dyn DirectoryOperations) -> Result<(), DirectoryError> {
        if let Self::Unbind { temporary_name, .. } = self {
            debug!(temporary = %temporary_name, "committing unbind - removing temporary entry");
            return ctx.unbind(temporary_name);
        }
        Ok(())
    }

    fn rollback_description(&self) -> String {
        match self {
            Self::Bind { name, .. } => format!("unbind '{name}'"),
            Self::Rebind {
                name,
                original_attributes: Some(_),
                ..
            } => format!("restore previous attributes of '{name}'"),
            Self::Rebind { name, .. } => format!("unbind '{name}'"),
            Self::Rename {
                original_name,
                new_name,
            } => format!("rename '{new_name}' back to '{original_name}'"),
            Self::Unbind {
                original_name,
                temporary_name,
            } => format!("rename '{temporary_name}' back to '{original_name}'"),
            Self::ModifyAttributes { name, .. } => {
                format!("restore modified attributes of '{name}'")
            }
        }
    }

    fn commit_description(&self) -> String {
        match self {
            Self::Unbind { temporary_name, .. } => format!("unbind '{temporary_name}'"),
            other => format!("finalize {}", other.name()),
        }
    }
}
