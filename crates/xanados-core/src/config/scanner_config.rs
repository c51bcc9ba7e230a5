//! Top-level scanner configuration with 4-layer resolution.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{CacheConfig, EngineConfig, PressureConfig, ResourceConfig, WalkConfig};
use crate::errors::ConfigError;
use crate::types::ResourceKind;

/// Project-level config file name, looked up in the project root.
pub const PROJECT_CONFIG_FILE: &str = "xanados.toml";

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`XANADOS_*`)
/// 3. Project config (`xanados.toml` in project root)
/// 4. User config (`~/.xanados/config.toml`)
/// 5. Compiled defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ScannerConfig {
    pub engine: EngineConfig,
    pub cache: CacheConfig,
    pub resources: ResourceConfig,
    pub pressure: PressureConfig,
    pub walk: WalkConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub workers: Option<usize>,
    pub cache_max_entries: Option<usize>,
    pub max_file_size: Option<u64>,
    pub detector_timeout_ms: Option<u64>,
    pub pressure_enabled: Option<bool>,
}

impl ScannerConfig {
    /// Load configuration with 4-layer resolution rooted at `root`.
    pub fn load(root: &Path, cli_overrides: Option<&CliOverrides>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 4 (lowest priority): user config
        if let Some(user_config_path) = Self::user_config_path() {
            if user_config_path.exists() {
                match Self::merge_toml_file(&mut config, &user_config_path) {
                    Ok(()) => {}
                    Err(e @ ConfigError::ParseError { .. }) => return Err(e),
                    Err(e) => {
                        // An unreadable user config is not fatal.
                        tracing::warn!(error = %e, "ignoring user config");
                    }
                }
            }
        }

        // Layer 3: project config
        let project_config_path = root.join(PROJECT_CONFIG_FILE);
        if project_config_path.exists() {
            Self::merge_toml_file(&mut config, &project_config_path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config);

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }

    /// Validate the configuration values.
    pub fn validate(config: &ScannerConfig) -> Result<(), ConfigError> {
        if config.engine.workers == Some(0) {
            return Err(invalid("engine.workers", "must be greater than 0"));
        }
        if config.engine.queue_poll_ms == Some(0) {
            return Err(invalid("engine.queue_poll_ms", "must be greater than 0"));
        }
        if config.cache.max_entries == Some(0) {
            return Err(invalid("cache.max_entries", "must be greater than 0"));
        }
        if let Some(fraction) = config.cache.eviction_fraction {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(invalid(
                    "cache.eviction_fraction",
                    "must be in the range (0.0, 1.0]",
                ));
            }
        }
        for kind in ResourceKind::ALL {
            if config.resources.limit_for(kind) == Some(0) {
                return Err(invalid(
                    &format!("resources.{kind}"),
                    "must be greater than 0",
                ));
            }
        }
        for (field, value) in [
            (
                "pressure.cpu_threshold_percent",
                config.pressure.cpu_threshold_percent,
            ),
            (
                "pressure.memory_threshold_percent",
                config.pressure.memory_threshold_percent,
            ),
        ] {
            if let Some(v) = value {
                if !(v > 0.0 && v <= 100.0) {
                    return Err(invalid(field, "must be in the range (0, 100]"));
                }
            }
        }
        if config.pressure.sample_interval_ms == Some(0) {
            return Err(invalid(
                "pressure.sample_interval_ms",
                "must be greater than 0",
            ));
        }
        if config.walk.max_file_size == Some(0) {
            return Err(invalid("walk.max_file_size", "must be greater than 0"));
        }
        Ok(())
    }

    /// Returns the user config path: `~/.xanados/config.toml`.
    fn user_config_path() -> Option<PathBuf> {
        home_dir().map(|h| h.join(".xanados").join("config.toml"))
    }

    /// Merge a TOML file into the existing config.
    /// Unknown keys are silently ignored.
    fn merge_toml_file(config: &mut ScannerConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: ScannerConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`; `other` wins wherever it has a value.
    pub fn merge(base: &mut ScannerConfig, other: &ScannerConfig) {
        // Engine
        merge_opt(&mut base.engine.workers, other.engine.workers);
        merge_opt(&mut base.engine.queue_poll_ms, other.engine.queue_poll_ms);
        merge_opt(
            &mut base.engine.throttle_backoff_ms,
            other.engine.throttle_backoff_ms,
        );
        merge_opt(
            &mut base.engine.detector_timeout_ms,
            other.engine.detector_timeout_ms,
        );
        merge_opt(&mut base.engine.yield_every, other.engine.yield_every);
        merge_opt(&mut base.engine.result_history, other.engine.result_history);
        merge_opt(
            &mut base.engine.metrics_window_secs,
            other.engine.metrics_window_secs,
        );

        // Cache
        merge_opt(&mut base.cache.max_entries, other.cache.max_entries);
        merge_opt(
            &mut base.cache.eviction_fraction,
            other.cache.eviction_fraction,
        );

        // Resources
        for kind in ResourceKind::ALL {
            if let Some(limit) = other.resources.limit_for(kind) {
                base.resources.set_limit(kind, Some(limit));
            }
        }

        // Pressure
        merge_opt(&mut base.pressure.enabled, other.pressure.enabled);
        merge_opt(
            &mut base.pressure.cpu_threshold_percent,
            other.pressure.cpu_threshold_percent,
        );
        merge_opt(
            &mut base.pressure.memory_threshold_percent,
            other.pressure.memory_threshold_percent,
        );
        merge_opt(
            &mut base.pressure.sample_interval_ms,
            other.pressure.sample_interval_ms,
        );

        // Walk
        merge_opt(&mut base.walk.max_file_size, other.walk.max_file_size);
        merge_opt(&mut base.walk.follow_symlinks, other.walk.follow_symlinks);
        if !other.walk.exclude.is_empty() {
            base.walk.exclude = other.walk.exclude.clone();
        }
        if !other.walk.excluded_roots.is_empty() {
            base.walk.excluded_roots = other.walk.excluded_roots.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `XANADOS_ENGINE_WORKERS`, `XANADOS_CACHE_MAX_ENTRIES`, etc.
    fn apply_env_overrides(config: &mut ScannerConfig) {
        if let Some(v) = env_parse::<usize>("XANADOS_ENGINE_WORKERS") {
            config.engine.workers = Some(v);
        }
        if let Some(v) = env_parse::<u64>("XANADOS_ENGINE_DETECTOR_TIMEOUT_MS") {
            config.engine.detector_timeout_ms = Some(v);
        }
        if let Some(v) = env_parse::<usize>("XANADOS_CACHE_MAX_ENTRIES") {
            config.cache.max_entries = Some(v);
        }
        if let Some(v) = env_parse::<u64>("XANADOS_WALK_MAX_FILE_SIZE") {
            config.walk.max_file_size = Some(v);
        }
        if let Some(v) = env_parse::<bool>("XANADOS_PRESSURE_ENABLED") {
            config.pressure.enabled = Some(v);
        }
    }

    /// Apply CLI overrides (highest priority).
    pub fn apply_cli_overrides(config: &mut ScannerConfig, cli: &CliOverrides) {
        merge_opt(&mut config.engine.workers, cli.workers);
        merge_opt(&mut config.cache.max_entries, cli.cache_max_entries);
        merge_opt(&mut config.walk.max_file_size, cli.max_file_size);
        merge_opt(
            &mut config.engine.detector_timeout_ms,
            cli.detector_timeout_ms,
        );
        merge_opt(&mut config.pressure.enabled, cli.pressure_enabled);
    }
}

fn merge_opt<T: Copy>(base: &mut Option<T>, other: Option<T>) {
    if other.is_some() {
        *base = other;
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Cross-platform home directory resolution.
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
}
