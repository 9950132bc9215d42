use std::path::Path;
use std::sync::Arc;

use dirtx_core::DistinguishedName;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::renaming::{
    DEFAULT_TEMP_SUFFIX, DefaultTempEntryRenamingStrategy, DifferentSubtreeTempEntryRenamingStrategy,
    TempEntryRenamingStrategy, TempNameSequence,
};

/// Which temporary-entry renaming strategy a transaction manager uses.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RenamingStrategyConfig {
    Default {
        #[serde(default = "default_temp_suffix", rename = "temp-suffix")]
        temp_suffix: String,
    },
    DifferentSubtree {
        #[serde(rename = "subtree-node")]
        subtree_node: DistinguishedName,
    },
}

fn default_temp_suffix() -> String {
    String::from(DEFAULT_TEMP_SUFFIX)
}

impl Default for RenamingStrategyConfig {
    fn default() -> Self {
        Self::Default {
            temp_suffix: default_temp_suffix(),
        }
    }
}

impl RenamingStrategyConfig {
    /// Build the configured strategy. A different-subtree strategy draws
    /// its numbers from `sequence`.
    #[must_use]
    pub fn build(&self, sequence: &TempNameSequence) -> Arc<dyn TempEntryRenamingStrategy> {
        match self {
            Self::Default { temp_suffix } => {
                Arc::new(DefaultTempEntryRenamingStrategy::new(temp_suffix.clone()))
            }
            Self::DifferentSubtree { subtree_node } => Arc::new(
                DifferentSubtreeTempEntryRenamingStrategy::with_sequence(
                    subtree_node.clone(),
                    sequence.clone(),
                ),
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionConfig {
    renaming_strategy: RenamingStrategyConfig,
}

#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    transaction: TransactionSection,
}

#[derive(Debug, Deserialize, Default)]
struct TransactionSection {
    #[serde(default, rename = "renaming-strategy")]
    renaming_strategy: Option<RenamingStrategyConfig>,
}

impl TransactionConfig {
    #[must_use]
    pub fn new(renaming_strategy: RenamingStrategyConfig) -> Self {
        Self { renaming_strategy }
    }

    #[must_use]
    pub fn renaming_strategy(&self) -> &RenamingStrategyConfig {
        &self.renaming_strategy
    }

    #[must_use]
    pub fn build_renaming_strategy(
        &self,
        sequence: &TempNameSequence,
    ) -> Arc<dyn TempEntryRenamingStrategy> {
        self.renaming_strategy.build(sequence)
    }

    /// Parse the `[transaction]` table of a TOML document. A missing table
    /// or strategy falls back to the default `_temp` suffix.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` if the document is not valid TOML or the
    /// strategy table is malformed.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(Self {
            renaming_strategy: file.transaction.renaming_strategy.unwrap_or_default(),
        })
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Read` if the file cannot be read, or
    /// `ConfigError::Parse` if its contents are invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }
}
