use std::path::PathBuf;

use dirtx_compensating::TransactionError;
use dirtx_core::DirectoryError;
use thiserror::Error;

/// Error from a transactional directory call, its commit, or its rollback.
pub type LdapTransactionError = TransactionError<DirectoryError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read transaction configuration '{path}'")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse transaction configuration")]
    Parse(#[from] toml::de::Error),

    #[error("compensating transactions cannot be used with an anonymous read-only directory")]
    AnonymousReadOnly,
}

#[derive(Debug, Error)]
#[error("'{0}' is not a transactional directory operation")]
pub struct UnsupportedOperation(pub String);
