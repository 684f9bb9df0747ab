//! Startup logic: configuration, tracing, and the two top-level tasks.

use std::path::Path;

use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use autobot_api::{HealthConfig, HealthServer};
use autobot_config::{BotConfig, ConfigError, ConfigLoader, ConfigValidator, LoggingConfig, ProcessEnv};
use autobot_flow::BotFlow;

/// Build the configuration from an optional file plus the process environment.
pub(crate) fn load_config(path: Option<&Path>) -> Result<BotConfig, ConfigError> {
    match path {
        Some(path) => ConfigLoader::load(path, &ProcessEnv),
        None => ConfigLoader::from_env(&ProcessEnv),
    }
}

/// Initialize tracing with console and file output.
///
/// Log files are written to the configured directory with daily rotation.
pub(crate) fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(&logging.dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&logging.file_prefix)
        .filename_suffix("log")
        .max_log_files(logging.max_files)
        .build(&logging.dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // The guard flushes the file writer on drop; keep it for the whole run.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json_file = logging.json.then(|| {
        fmt::layer()
            .json()
            .with_writer(non_blocking.clone())
            .with_ansi(false)
    });
    let text_file = (!logging.json).then(|| fmt::layer().with_writer(non_blocking).with_ansi(false));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(json_file)
        .with(text_file)
        .init();

    Ok(())
}

/// Log validation findings; refuse to start on errors.
fn validate(config: &BotConfig) -> Result<(), Box<dyn std::error::Error>> {
    let result = ConfigValidator::validate(config)?;
    for warning in &result.warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }
    if !result.is_valid() {
        for err in &result.errors {
            error!("Config {}: {}", err.path, err.message);
        }
        return Err(format!("{} configuration error(s)", result.errors.len()).into());
    }
    Ok(())
}

/// Run the health endpoint and the bot flow side by side.
///
/// Returns when either task ends or on Ctrl-C. A failed bot flow is an error
/// so the process exits non-zero and the supervisor restarts it.
pub(crate) async fn run(config: BotConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate(&config)?;

    info!("Starting WATI AutoBot v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Environment: {}",
        if config.hosted() { "hosted" } else { "local" }
    );

    let health = HealthServer::new(HealthConfig::new(&config.server.host, config.server.port));
    let listener = health.bind().await?;

    let mut health_task = tokio::spawn(HealthServer::serve(listener));
    let mut bot_task = tokio::spawn(BotFlow::new(config).run());

    tokio::select! {
        result = &mut health_task => {
            bot_task.abort();
            match result {
                Ok(Ok(())) => error!("Health server stopped"),
                Ok(Err(e)) => error!("Health server failed: {}", e),
                Err(e) => error!("Health server task aborted: {}", e),
            }
            Err("health server exited".into())
        }
        result = &mut bot_task => {
            health_task.abort();
            match result {
                Ok(Ok(())) => {
                    info!("Bot flow finished");
                    Ok(())
                }
                Ok(Err(e)) => {
                    error!("Bot flow failed: {}", e);
                    Err(e.into())
                }
                Err(e) => {
                    error!("Bot flow task aborted: {}", e);
                    Err(e.into())
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl-C, shutting down...");
            // Dropping the flow kills the Chromium child.
            bot_task.abort();
            health_task.abort();
            let _ = bot_task.await;
            Ok(())
        }
    }
}

/// Supervised login that only saves the session.
pub(crate) async fn save_session(config: BotConfig) -> Result<(), Box<dyn std::error::Error>> {
    validate(&config)?;
    BotFlow::new(config).save_session().await?;
    info!("Session saved; the bot will resume it on next start");
    Ok(())
}

/// Print the effective configuration and the validation findings.
pub(crate) fn check_config(config: &BotConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(config)?);
    println!();
    println!("profile dir:   {}", config.profile_dir().display());
    println!("session file:  {}", config.storage_state_path().display());
    println!("browser cache: {}", config.browser_cache_dir().display());
    println!("sandbox:       {}", config.sandbox_enabled());

    let missing = config.login.credentials.missing_fields();
    if !missing.is_empty() {
        println!("credentials:   missing {}", missing.join(", "));
    }

    let result = ConfigValidator::validate(config)?;
    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for err in &result.errors {
        println!("error: {}: {}", err.path, err.message);
    }
    if !result.is_valid() {
        return Err(format!("{} configuration error(s)", result.errors.len()).into());
    }
    println!("Configuration OK");
    Ok(())
}
