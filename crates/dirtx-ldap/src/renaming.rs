use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dirtx_core::{DirectoryError, DistinguishedName};

pub const DEFAULT_TEMP_SUFFIX: &str = "_temp";

/// Decides where an entry is parked while an unbind is in flight, so the
/// original name is free but the entry can still be restored.
pub trait TempEntryRenamingStrategy: Debug + Send + Sync {
    /// # Errors
    ///
    /// Returns `DirectoryError::InvalidName` if `original` has no leaf to
    /// derive a temporary name from.
    fn temporary_name(&self, original: &DistinguishedName) -> Result<DistinguishedName, DirectoryError>;
}

fn root_has_no_leaf() -> DirectoryError {
    DirectoryError::InvalidName {
        input: String::new(),
        reason: "the root has no leaf to rename",
    }
}

/// Appends a suffix to the first value of the leaf RDN, keeping the entry
/// under its current parent.
///
/// The temporary entry stays in the same subtree, so searches in that
/// subtree can still see it until the transaction completes.
#[derive(Debug, Clone)]
pub struct DefaultTempEntryRenamingStrategy {
    temp_suffix: String,
}

impl DefaultTempEntryRenamingStrategy {
    #[must_use]
    pub fn new(temp_suffix: impl Into<String>) -> Self {
        Self {
            temp_suffix: temp_suffix.into(),
        }
    }

    #[must_use]
    pub fn temp_suffix(&self) -> &str {
        &self.temp_suffix
    }
}

impl Default for DefaultTempEntryRenamingStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_TEMP_SUFFIX)
    }
}

impl TempEntryRenamingStrategy for DefaultTempEntryRenamingStrategy {
    fn temporary_name(&self, original: &DistinguishedName) -> Result<DistinguishedName, DirectoryError> {
        let leaf = original.leaf().ok_or_else(root_has_no_leaf)?;
        let parent = original.parent().unwrap_or_default();
        Ok(parent.child(leaf.with_value_suffix(&self.temp_suffix)))
    }
}

/// Monotonic counter handing out temp-name suffixes, starting at 1.
///
/// Clones share the same counter. Strategies that must never collide, such
/// as several managers parking entries in one subtree, should be built from
/// clones of one sequence.
#[derive(Debug, Clone)]
pub struct TempNameSequence(Arc<AtomicU64>);

impl TempNameSequence {
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    #[must_use]
    pub fn starting_at(first: u64) -> Self {
        Self(Arc::new(AtomicU64::new(first)))
    }

    pub fn next_value(&self) -> u64 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for TempNameSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// Moves the entry below a dedicated subtree node, appending a sequence
/// number to the leaf value so equal leaves never collide.
///
/// The subtree node is not checked up front; if it does not exist the
/// rename into it fails when the unbind is performed.
#[derive(Debug, Clone)]
pub struct DifferentSubtreeTempEntryRenamingStrategy {
    subtree_node: DistinguishedName,
    sequence: TempNameSequence,
}

impl DifferentSubtreeTempEntryRenamingStrategy {
    #[must_use]
    pub fn new(subtree_node: DistinguishedName) -> Self {
        Self::with_sequence(subtree_node, TempNameSequence::new())
    }

    #[must_use]
    pub fn with_sequence(subtree_node: DistinguishedName, sequence: TempNameSequence) -> Self {
        Self {
            subtree_node,
            sequence,
        }
    }

    #[must_use]
    pub fn subtree_node(&self) -> &DistinguishedName {
        &self.subtree_node
    }
}

impl TempEntryRenamingStrategy for DifferentSubtreeTempEntryRenamingStrategy {
    fn temporary_name(&self, original: &DistinguishedName) -> Result<DistinguishedName, DirectoryError> {
        let leaf = original.leaf().ok_or_else(root_has_no_leaf)?;
        let suffix = self.sequence.next_value().to_string();
        Ok(self.subtree_node.child(leaf.with_value_suffix(&suffix)))
    }
}
