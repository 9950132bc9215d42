use crate::attributes::{Attributes, ModificationItem};
use crate::error::Result;
use crate::name::DistinguishedName;

/// Synchronous write and lookup access to a directory server.
///
/// Every call may fail with a directory-level error; implementations never
/// retry on their own.
pub trait DirectoryOperations: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if `name` is already bound or its parent is missing.
    fn bind(&self, name: &DistinguishedName, attributes: &Attributes) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if no entry is bound at `name`.
    fn lookup(&self, name: &DistinguishedName) -> Result<Attributes>;

    /// Replace the entry at `name`, binding it if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent of `name` is missing.
    fn rebind(&self, name: &DistinguishedName, attributes: &Attributes) -> Result<()>;

    /// Move an entry, together with its subordinates, to a new name.
    ///
    /// # Errors
    ///
    /// Returns an error if `old_name` is missing, `new_name` is taken, or the
    /// parent of `new_name` does not exist.
    fn rename(&self, old_name: &DistinguishedName, new_name: &DistinguishedName) -> Result<()>;

    /// Whether any entry is bound directly below `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if no entry is bound at `name`.
    fn has_children(&self, name: &DistinguishedName) -> Result<bool>;

    /// # Errors
    ///
    /// Returns an error if `name` is missing or still has subordinates.
    fn unbind(&self, name: &DistinguishedName) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error if `name` is missing or any item cannot be applied,
    /// in which case none of the items take effect.
    fn modify_attributes(&self, name: &DistinguishedName, items: &[ModificationItem])
    -> Result<()>;

    /// Whether this directory is accessed anonymously for reads only.
    fn is_anonymous_read_only(&self) -> bool {
        false
    }
}
