//! Directory data model shared by the dirtx crates.
//!
//! Holds distinguished names, entry attributes and the
//! [`DirectoryOperations`] contract that compensating transactions are
//! recorded against.

mod attributes;
mod directory;
pub mod error;
#[cfg(any(test, feature = "testing"))]
mod memory;
mod name;

pub use attributes::{Attribute, Attributes, ModificationItem, ModificationOp};
pub use directory::DirectoryOperations;
pub use error::*;
#[cfg(any(test, feature = "testing"))]
pub use memory::InMemoryDirectory;
pub use name::{DistinguishedName, Rdn, RdnComponent};
