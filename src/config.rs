use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct JeanConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub router: RouterConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub log_level: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
    pub pool_size: u32,
    pub busy_timeout_ms: u64,
    pub default_tenant: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct RouterConfig {
    /// Registered category adapters, in merge order.
    pub categories: Vec<String>,
    pub search_limit: usize,
    pub recent_limit: usize,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LlmConfig {
    pub enabled: bool,
    pub model: String,
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        let db_path = default_jean_dir()
            .join("memory.db")
            .to_string_lossy()
            .into_owned();
        Self {
            db_path,
            pool_size: 8,
            busy_timeout_ms: 5000,
            default_tenant: "default".into(),
        }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            categories: crate::classifier::DEFAULT_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            search_limit: 5,
            recent_limit: 3,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            model: "gemini-1.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com".into(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Returns `~/.jean/`, or `./.jean` when no home directory can be resolved.
pub fn default_jean_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".jean")
}

/// Returns the default config file path: `~/.jean/config.toml`
pub fn default_config_path() -> PathBuf {
    default_jean_dir().join("config.toml")
}

impl JeanConfig {
    /// Load config from TOML file (if it exists) then apply env var overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load from a specific path, then apply env var overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            let contents =
                std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str(&contents).context("failed to parse config TOML")?
        } else {
            info!("no config file at {}, using defaults", path.display());
            JeanConfig::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides (JEAN_DB, JEAN_TENANT_ID, JEAN_LOG_LEVEL, GEMINI_API_KEY).
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("JEAN_DB") {
            self.storage.db_path = val;
        }
        if let Ok(val) = std::env::var("JEAN_TENANT_ID") {
            self.storage.default_tenant = val;
        }
        if let Ok(val) = std::env::var("JEAN_LOG_LEVEL") {
            self.server.log_level = val;
        }
        if let Ok(val) = std::env::var("GEMINI_API_KEY") {
            if !val.is_empty() {
                self.llm.api_key = val;
                self.llm.enabled = true;
            }
        }
    }

    /// Resolve the database path, expanding `~` if needed.
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_tilde(&self.storage.db_path)
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = JeanConfig::default();
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.storage.default_tenant, "default");
        assert_eq!(config.storage.pool_size, 8);
        assert!(config.storage.db_path.ends_with("memory.db"));
        assert!(!config.llm.enabled);
        assert_eq!(config.router.categories.first().map(String::as_str), Some("github"));
        assert!(config.router.categories.iter().any(|c| c == "explicit_note"));
    }

    #[test]
    fn parse_toml_config() {
        let toml_str = r#"
[server]
log_level = "debug"

[storage]
db_path = "/tmp/test.db"
default_tenant = "acme"

[router]
categories = ["notes", "tasks"]
"#;
        let config: JeanConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.log_level, "debug");
        assert_eq!(config.storage.db_path, "/tmp/test.db");
        assert_eq!(config.storage.default_tenant, "acme");
        assert_eq!(config.router.categories, vec!["notes", "tasks"]);
        // defaults still apply for unset fields
        assert_eq!(config.router.search_limit, 5);
        assert_eq!(config.storage.busy_timeout_ms, 5000);
        assert_eq!(config.llm.model, "gemini-1.5-flash");
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = JeanConfig::default();
        std::env::set_var("JEAN_DB", "/tmp/override.db");
        std::env::set_var("JEAN_TENANT_ID", "env-tenant");
        std::env::set_var("JEAN_LOG_LEVEL", "trace");
        std::env::set_var("GEMINI_API_KEY", "test-key");

        config.apply_env_overrides();

        assert_eq!(config.storage.db_path, "/tmp/override.db");
        assert_eq!(config.storage.default_tenant, "env-tenant");
        assert_eq!(config.server.log_level, "trace");
        assert_eq!(config.llm.api_key, "test-key");
        assert!(config.llm.enabled);

        // Clean up
        std::env::remove_var("JEAN_DB");
        std::env::remove_var("JEAN_TENANT_ID");
        std::env::remove_var("JEAN_LOG_LEVEL");
        std::env::remove_var("GEMINI_API_KEY");
    }

    #[test]
    fn expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/var/lib/jean.db"), PathBuf::from("/var/lib/jean.db"));
    }
}
