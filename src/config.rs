//! TOML configuration file for CLI defaults.
//!
//! Every section is optional; missing fields fall back to the contract
//! defaults. Command-line flags override whatever the file says.

use std::path::Path;

use serde::Deserialize;

use crate::build::BuildConfig;
use crate::error::{EngineError, WeftResult};
use crate::prune::PruneConfig;
use crate::retrieve::RetrieveConfig;

/// On-disk configuration (`weft.toml`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WeftConfig {
    pub build: BuildConfig,
    pub retrieve: RetrieveConfig,
    pub prune: PruneConfig,
}

impl WeftConfig {
    /// Load a config file, or defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> WeftResult<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path).map_err(|e| EngineError::InvalidConfig {
            message: format!("read {}: {e}", path.display()),
        })?;
        let config = toml::from_str(&text).map_err(|e| EngineError::InvalidConfig {
            message: format!("parse {}: {e}", path.display()),
        })?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_yields_defaults() {
        let config = WeftConfig::load(None).unwrap();
        assert!((config.build.similarity_threshold - 0.82).abs() < 1e-6);
        assert_eq!(config.retrieve.top_k, 5);
        assert_eq!(config.prune.min_degree, 3);
    }

    #[test]
    fn partial_file_keeps_defaults_elsewhere() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("weft.toml");
        std::fs::write(
            &path,
            "[build]\nsimilarity_threshold = 0.9\n\n[retrieve]\ntop_k = 8\n",
        )
        .unwrap();

        let config = WeftConfig::load(Some(&path)).unwrap();
        assert!((config.build.similarity_threshold - 0.9).abs() < 1e-6);
        assert_eq!(config.build.max_edges_per_chunk, 10);
        assert_eq!(config.retrieve.top_k, 8);
        assert_eq!(config.prune.edge_stale_days, 90);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("weft.toml");
        std::fs::write(&path, "not toml [[").unwrap();
        assert!(WeftConfig::load(Some(&path)).is_err());
    }
}
