// Harness configuration
// Optional JSON file; every field falls back to its default.

use crate::error::{Error, Result};
use crate::hashing::HashPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub hash: HashPolicy,
    /// Directory exported reports are written to
    pub report_dir: PathBuf,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            hash: HashPolicy::default(),
            report_dir: PathBuf::from("."),
        }
    }
}

impl HarnessConfig {
    /// Read, parse and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: HarnessConfig =
            serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.hash.validate()?;
        if self.report_dir.as_os_str().is_empty() {
            return Err(Error::Config("report_dir must not be empty".to_string()));
        }
        Ok(())
    }
}
