use std::fmt;
use std::str::FromStr;

use dirtx_core::{Attributes, DistinguishedName, ModificationItem};

use crate::error::UnsupportedOperation;

/// The closed set of directory calls that can take part in a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Bind,
    Rebind,
    Rename,
    Unbind,
    ModifyAttributes,
}

impl OperationKind {
    pub const ALL: [Self; 5] = [
        Self::Bind,
        Self::Rebind,
        Self::Rename,
        Self::Unbind,
        Self::ModifyAttributes,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bind => "bind",
            Self::Rebind => "rebind",
            Self::Rename => "rename",
            Self::Unbind => "unbind",
            Self::ModifyAttributes => "modifyAttributes",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = UnsupportedOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnsupportedOperation(s.to_string()))
    }
}

/// A directory write together with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryOperation {
    Bind {
        name: DistinguishedName,
        attributes: Attributes,
    },
    Rebind {
        name: DistinguishedName,
        attributes: Attributes,
    },
    Rename {
        old_name: DistinguishedName,
        new_name: DistinguishedName,
    },
    Unbind {
        name: DistinguishedName,
    },
    ModifyAttributes {
        name: DistinguishedName,
        items: Vec<ModificationItem>,
    },
}

impl DirectoryOperation {
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

    /// The entry the operation acts on (the source name for a rename).
    #[must_use]
    pub fn target(&self) -> &DistinguishedName {
        match self {
            Self::Bind { name, .. }
            | Self::Rebind { name, .. }
            | Self::Unbind { name }
            | Self::ModifyAttributes { name, .. } => name,
            Self::Rename { old_name, .. } => old_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_round_trip_through_names() {
        for kind in OperationKind::ALL {
            assert_eq!(kind.as_str().parse::<OperationKind>().ok(), Some(kind));
        }
    }

    #[test]
    fn modify_attributes_uses_camel_case_name() {
        assert_eq!(OperationKind::ModifyAttributes.to_string(), "modifyAttributes");
    }

    #[test]
    fn unknown_operation_names_are_rejected() {
        let err = "search".parse::<OperationKind>().expect_err("search is read-only");
        assert_eq!(err.to_string(), "'search' is not a transactional directory operation");
        assert!("Bind".parse::<OperationKind>().is_err());
    }

    #[test]
    fn rename_targets_old_name() {
        let old_name = DistinguishedName::parse("cn=a, o=x").expect("valid name");
        let operation = DirectoryOperation::Rename {
            old_name: old_name.clone(),
            new_name: DistinguishedName::parse("cn=b, o=x").expect("valid name"),
        };

        assert_eq!(operation.kind(), OperationKind::Rename);
        assert_eq!(operation.target(), &old_name);
    }
}
