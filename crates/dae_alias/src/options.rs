//! Options of the alias-elimination pass and their TOML form.

use crate::error::AliasError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Knobs for a single alias-elimination pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasOptions {
    /// Reject cyclic observed equations instead of returning a partial order.
    pub check_cycles: bool,
    /// Upper bound on fixpoint sweeps after reconciliation. `None` iterates
    /// until a sweep changes nothing.
    pub max_sweeps: Option<usize>,
}

impl Default for AliasOptions {
    fn default() -> Self {
        Self {
            check_cycles: true,
            max_sweeps: None,
        }
    }
}

impl AliasOptions {
    pub fn with_check_cycles(mut self, check: bool) -> Self {
        self.check_cycles = check;
        self
    }

    pub fn with_max_sweeps(mut self, max: usize) -> Self {
        self.max_sweeps = Some(max);
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self, AliasError> {
        toml::from_str(content).map_err(|e| AliasError::Options(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, AliasError> {
        toml::to_string_pretty(self).map_err(|e| AliasError::Options(e.to_string()))
    }

    /// Read options from a TOML file, falling back to defaults when the
    /// file is missing or malformed.
    pub fn load(path: &Path) -> Self {
        if path.exists() {
            match fs::read_to_string(path) {
                Ok(content) => match Self::from_toml_str(&content) {
                    Ok(options) => return options,
                    Err(e) => tracing::warn!(target: "alias", path = %path.display(), error = %e, "using default options"),
                },
                Err(e) => tracing::warn!(target: "alias", path = %path.display(), error = %e, "using default options"),
            }
        }
        Self::default()
    }
}
