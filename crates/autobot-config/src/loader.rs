//! Configuration loader.
//!
//! Reads an optional TOML file (with `${VAR}` substitution) and overlays the
//! deployment environment variables on top of it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::schema::BotConfig;

pub const ENV_HOSTED: &str = "RENDER";
pub const ENV_PORT: &str = "PORT";
pub const ENV_EMAIL: &str = "WATI_EMAIL";
pub const ENV_PASSWORD: &str = "WATI_PASSWORD";
pub const ENV_TENANT_ID: &str = "WATI_TENANT_ID";
pub const ENV_INTERACTIVE: &str = "WATI_INTERACTIVE_LOGIN";
pub const ENV_BROWSERS_PATH: &str = "PLAYWRIGHT_BROWSERS_PATH";

/// Source of environment variables.
///
/// The process environment in production, a map in tests.
pub trait EnvLookup {
    fn var(&self, key: &str) -> Option<String>;
}

impl<F> EnvLookup for F
where
    F: Fn(&str) -> Option<String>,
{
    fn var(&self, key: &str) -> Option<String> {
        self(key)
    }
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn load(path: &Path, env: &impl EnvLookup) -> Result<BotConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content, env)
    }

    /// Load configuration from a string, then apply environment overrides.
    pub fn load_str(content: &str, env: &impl EnvLookup) -> Result<BotConfig, ConfigError> {
        let expanded = Self::expand_env_vars(content, env)?;
        let mut config: BotConfig = toml::from_str(&expanded)?;
        Self::apply_env(&mut config, env)?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for deployments without a file.
    pub fn from_env(env: &impl EnvLookup) -> Result<BotConfig, ConfigError> {
        let mut config = BotConfig::default();
        Self::apply_env(&mut config, env)?;
        Ok(config)
    }

    /// Overlay deployment environment variables.
    pub fn apply_env(config: &mut BotConfig, env: &impl EnvLookup) -> Result<(), ConfigError> {
        let non_empty = |key: &str| env.var(key).filter(|v| !v.trim().is_empty());

        if let Some(value) = non_empty(ENV_HOSTED) {
            config.environment.hosted = value.trim().eq_ignore_ascii_case("true");
        }

        if let Some(value) = non_empty(ENV_PORT) {
            config.server.port = value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: ENV_PORT.to_string(),
                message: format!("'{}' is not a valid port", value),
            })?;
        }

        if let Some(value) = non_empty(ENV_EMAIL) {
            config.login.credentials.email = Some(value);
        }
        if let Some(value) = non_empty(ENV_PASSWORD) {
            config.login.credentials.password = Some(value);
        }
        if let Some(value) = non_empty(ENV_TENANT_ID) {
            config.login.credentials.tenant_id = Some(value);
        }

        if let Some(value) = non_empty(ENV_INTERACTIVE) {
            config.login.interactive_fallback = Some(parse_bool(ENV_INTERACTIVE, &value)?);
        }

        if let Some(value) = non_empty(ENV_BROWSERS_PATH) {
            config.browser.cache_dir = Some(PathBuf::from(Self::expand_path(&value)));
        }

        Ok(())
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str, env: &impl EnvLookup) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::InvalidValue {
            field: "pattern".to_string(),
            message: e.to_string(),
        })?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = env
                .var(var_name)
                .ok_or_else(|| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/wati_profile`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("'{}' is not a boolean", other),
        }),
    }
}
