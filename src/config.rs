//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/treepart/treepart.toml`
//! 3. Local config: `./.treepart.toml`
//! 4. Environment variables: `TREEPART_*` prefix
//! 5. Command line flags (applied by the CLI)

use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::{Config, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{SettingsError, SettingsResult};
use crate::generate::WeightRanges;
use crate::graph::{SpanningTree, Weight};
use crate::rational::{self, Rational};

pub const LOCAL_CONFIG_FILE: &str = ".treepart.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Number of parts
    pub kparts: usize,
    /// Imbalance as `a/b`, integer or decimal
    pub imbalance: String,
    /// Base seed for generators and random spanning trees
    pub seed: u64,
    /// Spanning tree used to partition general graphs
    pub prep: SpanningTree,
    /// Worker threads for parallel tries; 0 lets rayon decide
    pub threads: usize,
    pub edge_weight_min: Weight,
    pub edge_weight_max: Weight,
    pub node_weight_min: Weight,
    pub node_weight_max: Weight,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            kparts: 2,
            imbalance: "1/2".to_string(),
            seed: 0,
            prep: SpanningTree::Mst,
            threads: 0,
            edge_weight_min: 1,
            edge_weight_max: 100,
            node_weight_min: 1,
            node_weight_max: 1,
        }
    }
}

/// Raw settings for intermediate parsing; `None` means "not specified".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub kparts: Option<usize>,
    pub imbalance: Option<String>,
    pub seed: Option<u64>,
    pub prep: Option<SpanningTree>,
    pub threads: Option<usize>,
    pub edge_weight_min: Option<Weight>,
    pub edge_weight_max: Option<Weight>,
    pub node_weight_min: Option<Weight>,
    pub node_weight_max: Option<Weight>,
}

/// Get the XDG config directory for treepart.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "treepart").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("treepart.toml"))
}

/// Get the path to the local config file in `dir`.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(LOCAL_CONFIG_FILE)
}

fn load_raw_settings(path: &Path) -> SettingsResult<RawSettings> {
    let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&content).map_err(|e| SettingsError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

impl Settings {
    /// Overlay wins wherever it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            kparts: overlay.kparts.unwrap_or(self.kparts),
            imbalance: overlay
                .imbalance
                .clone()
                .unwrap_or_else(|| self.imbalance.clone()),
            seed: overlay.seed.unwrap_or(self.seed),
            prep: overlay.prep.unwrap_or(self.prep),
            threads: overlay.threads.unwrap_or(self.threads),
            edge_weight_min: overlay.edge_weight_min.unwrap_or(self.edge_weight_min),
            edge_weight_max: overlay.edge_weight_max.unwrap_or(self.edge_weight_max),
            node_weight_min: overlay.node_weight_min.unwrap_or(self.node_weight_min),
            node_weight_max: overlay.node_weight_max.unwrap_or(self.node_weight_max),
        }
    }

    /// Load settings with layered precedence, reading the local config from `local_dir`.
    pub fn load(local_dir: Option<&Path>) -> SettingsResult<Self> {
        Self::load_from(
            global_config_path().as_deref(),
            local_dir.map(local_config_path).as_deref(),
        )
    }

    /// Load settings from explicit config file locations; missing files are skipped.
    pub fn load_from(global: Option<&Path>, local: Option<&Path>) -> SettingsResult<Self> {
        let mut current = Self::default();

        for path in [global, local].into_iter().flatten() {
            if path.exists() {
                debug!("loading config from {}", path.display());
                let raw = load_raw_settings(path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.validate()?;
        Ok(current)
    }

    /// Apply TREEPART_* environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self) -> SettingsResult<Self> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("TREEPART").separator("__"))
            .build()
            .map_err(|e| SettingsError::Environment(e.to_string()))?;

        let raw = RawSettings {
            kparts: env_value(&config, "kparts")?,
            imbalance: config.get_string("imbalance").ok(),
            seed: env_value(&config, "seed")?,
            prep: env_value(&config, "prep")?,
            threads: env_value(&config, "threads")?,
            edge_weight_min: env_value(&config, "edge_weight_min")?,
            edge_weight_max: env_value(&config, "edge_weight_max")?,
            node_weight_min: env_value(&config, "node_weight_min")?,
            node_weight_max: env_value(&config, "node_weight_max")?,
        };
        Ok(settings.merge_with(&raw))
    }

    pub fn validate(&self) -> SettingsResult<()> {
        if self.kparts == 0 {
            return Err(invalid("kparts", "must be at least 1"));
        }
        let eps = self.imbalance_ratio()?;
        if !rational::is_positive(&eps) {
            return Err(invalid("imbalance", "must be positive"));
        }
        if self.edge_weight_min > self.edge_weight_max {
            return Err(invalid("edge_weight_min", "exceeds edge_weight_max"));
        }
        if self.node_weight_min > self.node_weight_max {
            return Err(invalid("node_weight_min", "exceeds node_weight_max"));
        }
        Ok(())
    }

    pub fn imbalance_ratio(&self) -> SettingsResult<Rational> {
        rational::parse(&self.imbalance).map_err(|e| invalid("imbalance", e.to_string()))
    }

    pub fn weight_ranges(&self) -> WeightRanges {
        WeightRanges {
            node: self.node_weight_min..=self.node_weight_max,
            edge: self.edge_weight_min..=self.edge_weight_max,
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> SettingsResult<String> {
        toml::to_string_pretty(self).map_err(|e| SettingsError::Parse {
            path: PathBuf::from("<settings>"),
            message: e.to_string(),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# treepart configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/treepart/treepart.toml
#   Local:  ./.treepart.toml
#   Env:    TREEPART_* environment variables
#   Flags:  command line options

# Number of parts
# kparts = 2

# Imbalance: parts hold at most (1 + imbalance) * ceil(n / kparts) nodes
# imbalance = "1/2"

# Base seed; try i uses seed + i
# seed = 0

# Spanning tree for general graphs: "mst" or "rst"
# prep = "mst"

# Worker threads for parallel tries (0 = one per core)
# threads = 0

# Generator weight ranges (inclusive)
# edge_weight_min = 1
# edge_weight_max = 100
# node_weight_min = 1
# node_weight_max = 1
"#
        .to_string()
    }
}

fn env_value<T: FromStr>(config: &Config, key: &str) -> SettingsResult<Option<T>> {
    match config.get_string(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| invalid(key, format!("cannot parse '{}'", value))),
        Err(_) => Ok(None),
    }
}

fn invalid(key: &str, message: impl Into<String>) -> SettingsError {
    SettingsError::Invalid {
        key: key.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_no_config_files_when_loading_then_uses_defaults() {
        let settings = Settings::load_from(None, None).expect("load defaults");
        assert_eq!(settings.kparts, Settings::default().kparts);
        assert_eq!(settings.imbalance_ratio().unwrap(), rational::ratio(1, 2).unwrap());
    }

    #[test]
    fn given_overlay_when_merging_then_only_specified_fields_change() {
        let overlay = RawSettings {
            kparts: Some(4),
            prep: Some(SpanningTree::Rst),
            ..Default::default()
        };
        let merged = Settings::default().merge_with(&overlay);
        assert_eq!(merged.kparts, 4);
        assert_eq!(merged.prep, SpanningTree::Rst);
        assert_eq!(merged.imbalance, "1/2");
        assert_eq!(merged.edge_weight_max, 100);
    }

    #[test]
    fn given_bad_imbalance_when_validating_then_fails() {
        let settings = Settings {
            imbalance: "-1/3".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(SettingsError::Invalid { ref key, .. }) if key == "imbalance"
        ));
    }

    #[test]
    fn given_defaults_when_serialized_then_round_trips_through_toml() {
        let text = Settings::default().to_toml().unwrap();
        let raw: RawSettings = toml::from_str(&text).unwrap();
        assert_eq!(Settings::default().merge_with(&raw), Settings::default());
    }

    #[test]
    fn given_template_when_parsed_then_is_valid_toml() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.kparts.is_none());
    }
}
