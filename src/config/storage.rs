//! Local storage configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Which LocalStore adapter backs the engine
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

/// Local storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory for the file backend
    #[serde(default = "default_dir")]
    pub dir: String,
}

fn default_dir() -> String {
    "./data/onboarding".to_string()
}

impl StorageConfig {
    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == StorageBackend::File && self.dir.trim().is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE__DIR"));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            dir: default_dir(),
        }
    }
}
