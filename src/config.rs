//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/dtrules/dtrules.toml`
//! 3. Local config: `<tree_dir>/.dtrules.toml` (directory of the tree dump)
//! 4. Environment variables: `DTRULES_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::application::ApplicationError;
use crate::domain::SingleChildPolicy;

/// Raw settings for intermediate parsing (`None` means "not specified, inherit").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    pub single_child: Option<SingleChildPolicy>,
    pub features_file: Option<PathBuf>,
}

/// Unified configuration for dtrules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    /// Handling of split nodes with one child (default: follow)
    pub single_child: SingleChildPolicy,
    /// Feature name list used when no feature option is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            single_child: SingleChildPolicy::Follow,
            features_file: None,
        }
    }
}

/// Get the XDG config directory for dtrules.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "dtrules").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("dtrules.toml"))
}

/// Get the path to the local config file next to a tree dump.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".dtrules.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables are left as written.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(raw.as_ref()) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref()),
    }
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        if let Some(path) = &self.features_file {
            self.features_file = Some(expand_path(path));
        }
    }

    /// Overlay wins where it specifies a value.
    ///
    /// `features_file` is expanded first; if still relative it is resolved
    /// against `base`, the directory holding the overlay file.
    fn merge_with(&self, overlay: &RawSettings, base: Option<&Path>) -> Self {
        let features_file = match &overlay.features_file {
            Some(path) => {
                let expanded = expand_path(path);
                match base {
                    Some(base) if expanded.is_relative() => Some(base.join(expanded)),
                    _ => Some(expanded),
                }
            }
            None => self.features_file.clone(),
        };
        Self {
            single_child: overlay.single_child.unwrap_or(self.single_child),
            features_file,
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory searched for `.dtrules.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), local_dir)
    }

    /// Same as [`Settings::load`] with an explicit global config location.
    pub fn load_from(
        global_path: Option<&Path>,
        local_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        // 1. Start with defaults
        let mut current = Self::default();

        // 2. Global config
        if let Some(global_path) = global_path {
            if global_path.exists() {
                let raw = load_raw_settings(global_path)?;
                current = current.merge_with(&raw, None);
            }
        }

        // 3. Local config next to the tree dump
        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw, Some(dir));
            }
        }

        // 4. Environment variables
        current = Self::apply_env_overrides(current)?;

        current.expand_paths();
        Ok(current)
    }

    /// Apply DTRULES_* environment variables as explicit overrides.
    fn apply_env_overrides(settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("DTRULES")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;
        Self::apply_overrides(settings, &config)
    }

    fn apply_overrides(mut settings: Self, config: &Config) -> Result<Self, ApplicationError> {
        if let Ok(val) = config.get_string("single_child") {
            settings.single_child = parse_policy(&val)?;
        }
        if let Ok(val) = config.get_string("features_file") {
            settings.features_file = Some(PathBuf::from(val));
        }
        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# dtrules configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/dtrules/dtrules.toml
#   Local:  <tree dir>/.dtrules.toml
#   Env:    DTRULES_* environment variables (explicit overrides)

# Split nodes with a single child: "follow" walks into the child,
# "reject" reports an error (same as --strict)
# single_child = "follow"

# Feature names, one per line, used when neither --features nor --names is given.
# Relative paths in a local config are resolved against its directory.
# features_file = "~/models/features.txt"
"#
        .to_string()
    }
}

fn parse_policy(value: &str) -> Result<SingleChildPolicy, ApplicationError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "follow" => Ok(SingleChildPolicy::Follow),
        "reject" => Ok(SingleChildPolicy::Reject),
        other => Err(ApplicationError::Config {
            message: format!("single_child: expected 'follow' or 'reject', got '{other}'"),
        }),
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
