//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::BotConfig;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &BotConfig) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_browser(config, &mut result);
        Self::validate_login(config, &mut result);
        Self::validate_selectors(config, &mut result);
        Self::validate_poller(config, &mut result);

        Ok(result)
    }

    fn validate_server(config: &BotConfig, result: &mut ValidationResult) {
        if config.server.port == 0 {
            result.add_error(ValidationError::new("server.port", "Port cannot be 0"));
        }

        if config.server.host.is_empty() {
            result.add_error(ValidationError::new("server.host", "Host cannot be empty"));
        }
    }

    fn validate_browser(config: &BotConfig, result: &mut ValidationResult) {
        if config.browser.executable.is_none() && config.browser.installer.is_empty() {
            result.add_error(ValidationError::new(
                "browser.installer",
                "installer command cannot be empty when no executable is configured",
            ));
        }

        if config.browser.debug_port == 0 {
            result.add_error(ValidationError::new("browser.debug_port", "Port cannot be 0"));
        }

        if config.browser.debug_port == config.server.port {
            result.add_error(ValidationError::new(
                "browser.debug_port",
                "debug port collides with the health server port",
            ));
        }

        if config.hosted() && !config.browser.headless {
            result.add_warning(ValidationWarning::new(
                "browser.headless",
                "headed browser on the hosting platform has no display to attach to",
            ));
        }
    }

    fn validate_login(config: &BotConfig, result: &mut ValidationResult) {
        for (path, url) in [
            ("login.inbox_url", &config.login.inbox_url),
            ("login.login_url", &config.login.login_url),
        ] {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                result.add_error(ValidationError::new(path, "must be an http(s) URL"));
            }
        }

        let missing = config.login.credentials.missing_fields();
        if !missing.is_empty() {
            result.add_warning(ValidationWarning::new(
                "login.credentials",
                format!(
                    "missing {}; automatic login will be skipped",
                    missing.join(", ")
                ),
            ));
        }

        if config.login.interactive_fallback == Some(true) && config.login.manual_attempts == 0 {
            result.add_warning(ValidationWarning::new(
                "login.manual_attempts",
                "interactive fallback is enabled but manual_attempts is 0",
            ));
        }

        for (path, secs) in [
            ("login.navigation_timeout_secs", config.login.navigation_timeout_secs),
            ("login.session_check_timeout_secs", config.login.session_check_timeout_secs),
            ("login.form_timeout_secs", config.login.form_timeout_secs),
        ] {
            if secs == 0 {
                result.add_error(ValidationError::new(path, "timeout must be greater than 0"));
            }
        }
    }

    fn validate_selectors(config: &BotConfig, result: &mut ValidationResult) {
        let selectors = &config.inbox;
        for (path, value) in [
            ("inbox.landmark_text", &selectors.landmark_text),
            ("inbox.email_input", &selectors.email_input),
            ("inbox.password_input", &selectors.password_input),
            ("inbox.tenant_input", &selectors.tenant_input),
            ("inbox.submit_button", &selectors.submit_button),
            ("inbox.unread_indicator", &selectors.unread_indicator),
            ("inbox.action_menu", &selectors.action_menu),
            ("inbox.routing_flow", &selectors.routing_flow),
        ] {
            if value.trim().is_empty() {
                result.add_error(ValidationError::new(path, "selector cannot be empty"));
            }
        }
    }

    fn validate_poller(config: &BotConfig, result: &mut ValidationResult) {
        if config.poller.check_interval_secs == 0 {
            result.add_error(ValidationError::new(
                "poller.check_interval_secs",
                "check interval must be greater than 0",
            ));
        } else if config.poller.check_interval_secs < 30 {
            result.add_warning(ValidationWarning::new(
                "poller.check_interval_secs",
                "check interval under 30s reloads the inbox very aggressively",
            ));
        }

        if config.poller.unread_wait_ms == 0 {
            result.add_error(ValidationError::new(
                "poller.unread_wait_ms",
                "unread wait must be greater than 0",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
