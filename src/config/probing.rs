//! Probing configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::domain::packs::{PackError, PackRegistry};

/// Probing configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProbingConfig {
    /// YAML file with packs added to the built-in ones
    pub pack_file: Option<PathBuf>,

    /// Ask the text-generation provider for anchors too
    #[serde(default)]
    pub generative_extraction: bool,
}

impl ProbingConfig {
    /// Built-in packs plus the configured pack file.
    pub fn registry(&self) -> Result<PackRegistry, PackError> {
        let registry = PackRegistry::builtin()?;
        match &self.pack_file {
            Some(path) => registry.with_pack_file(path),
            None => Ok(registry),
        }
    }

    /// Validate probing configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(path) = &self.pack_file {
            if !path.is_file() {
                return Err(ValidationError::PackFileNotFound(path.display().to_string()));
            }
        }
        Ok(())
    }
}
