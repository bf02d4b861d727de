//! Layered configuration: built-in defaults, overridden by an optional TOML
//! file, overridden in turn by `CXI_`-prefixed environment variables.
//!
//! Nesting in the env layer uses a double underscore, e.g.
//! `CXI_INDEXING__PARALLEL=true` sets `indexing.parallel`. This mirrors the
//! teacher's own `config.rs` (`CI_` prefix, `__` separator), renamed to the
//! new crate's prefix.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::IndexError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Language tags the driver will attempt, in the absence of an explicit
    /// `--lang` flag.
    pub languages: Vec<String>,
    /// Use the `rayon`-backed parallel driver instead of the sequential one.
    pub parallel: bool,
    /// Follow symlinks during the repository walk. Off by default per
    /// the traversal note in the data model: symlinks that escape the
    /// root should not be followed.
    pub follow_symlinks: bool,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            languages: vec!["python".into(), "c".into(), "cpp".into()],
            parallel: false,
            follow_symlinks: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level, e.g. "warn", "info", "debug". `RUST_LOG` always wins.
    pub default: String,
    /// Per-module overrides, e.g. `{"indexer": "debug"}`.
    #[serde(default)]
    pub modules: std::collections::HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { default: "warn".into(), modules: std::collections::HashMap::new() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub indexing: IndexingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Settings {
    /// Loads settings from built-in defaults, then `codanna-xref.toml` in the
    /// current directory if present, then `CXI_`-prefixed env vars.
    pub fn load() -> Result<Self, IndexError> {
        Self::load_from(Self::default(), "codanna-xref.toml")
    }

    pub fn load_from(defaults: Settings, toml_path: &str) -> Result<Self, IndexError> {
        if let Ok(content) = std::fs::read_to_string(toml_path) {
            if let Err(e) = toml::from_str::<toml::Value>(&content) {
                return Err(IndexError::ConfigError {
                    reason: format!("{toml_path} is not valid TOML: {e}"),
                });
            }
        }

        Figment::from(Serialized::defaults(defaults))
            .merge(Toml::file(toml_path))
            .merge(Env::prefixed("CXI_").split("__"))
            .extract()
            .map_err(|e| IndexError::ConfigError { reason: e.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_the_three_in_scope_languages() {
        let settings = Settings::default();
        assert_eq!(settings.indexing.languages, vec!["python", "c", "cpp"]);
        assert!(!settings.indexing.parallel);
    }

    #[test]
    fn env_override_takes_precedence_over_defaults() {
        std::env::set_var("CXI_INDEXING__PARALLEL", "true");
        let settings = Settings::load_from(Settings::default(), "nonexistent.toml").unwrap();
        assert!(settings.indexing.parallel);
        std::env::remove_var("CXI_INDEXING__PARALLEL");
    }
}
