//! # AutoBot Config
//!
//! Configuration for the WATI AutoBot. A single [`BotConfig`] is built once at
//! process start from an optional TOML file plus environment overrides, then
//! threaded through every component.

mod error;
mod loader;
mod schema;
mod validator;

pub use error::ConfigError;
pub use loader::{
    ConfigLoader, EnvLookup, ProcessEnv, ENV_BROWSERS_PATH, ENV_EMAIL, ENV_HOSTED, ENV_INTERACTIVE,
    ENV_PASSWORD, ENV_PORT, ENV_TENANT_ID,
};
pub use schema::*;
pub use validator::{ConfigValidator, ValidationError, ValidationResult, ValidationWarning};
