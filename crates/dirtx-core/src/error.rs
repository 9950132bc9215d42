use thiserror::Error;

use crate::name::DistinguishedName;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("invalid distinguished name '{input}': {reason}")]
    InvalidName { input: String, reason: &'static str },

    #[error("entry '{0}' already exists")]
    NameAlreadyBound(DistinguishedName),

    #[error("no such entry '{0}'")]
    NameNotFound(DistinguishedName),

    #[error("entry '{0}' has subordinate entries")]
    NotEmpty(DistinguishedName),

    #[error("entry '{name}' has no attribute '{attribute}'")]
    NoSuchAttribute {
        name: DistinguishedName,
        attribute: String,
    },

    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

impl DirectoryError {
    pub(crate) fn invalid_name(input: &str, reason: &'static str) -> Self {
        Self::InvalidName {
            input: input.to_string(),
            reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, DirectoryError>;
