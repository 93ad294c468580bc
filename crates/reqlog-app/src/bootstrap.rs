use std::net::SocketAddr;

use reqlog_http::{LoggerOptions, RequestLogger};
use reqlog_telemetry::{DEFAULT_LOG_LEVEL, GlobalContextGuard, LogFormat, LoggingConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::routes::router;

/// Environment variable holding the listen address.
pub const ENV_BIND_ADDR: &str = "REQLOG_BIND_ADDR";
/// Environment variable selecting the diagnostic log format (`json` or `pretty`).
pub const ENV_LOG_FORMAT: &str = "REQLOG_LOG_FORMAT";
/// Listen address used when [`ENV_BIND_ADDR`] is unset.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Settings for the demo server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSettings {
    /// Address the server listens on.
    pub bind_addr: SocketAddr,
    /// Format of the diagnostic `tracing` output.
    pub log_format: LogFormat,
    /// Options for the request logger.
    pub logger: LoggerOptions,
}

impl AppSettings {
    /// Load settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if any variable holds an unparseable value.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let logger = LoggerOptions::from_lookup(&lookup)?;
        let raw_addr = lookup(ENV_BIND_ADDR)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr
            .parse::<SocketAddr>()
            .map_err(|source| AppError::InvalidBindAddr {
                value: raw_addr.clone(),
                source,
            })?;
        let log_format = LogFormat::from_name(lookup(ENV_LOG_FORMAT).as_deref());
        Ok(Self {
            bind_addr,
            log_format,
            logger,
        })
    }
}

/// Entry point for the demo server boot sequence.
///
/// # Errors
///
/// Returns an error if settings cannot be loaded, logging cannot be installed, or the
/// listener fails.
pub async fn run_app() -> AppResult<()> {
    let settings = AppSettings::from_env()?;
    run_app_with(settings).await
}

/// Boot sequence driven entirely by the supplied settings.
pub(crate) async fn run_app_with(settings: AppSettings) -> AppResult<()> {
    reqlog_telemetry::init_logging(&LoggingConfig {
        level: DEFAULT_LOG_LEVEL,
        format: settings.log_format,
        app_name: &settings.logger.name,
    })
    .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new();

    info!(log_params = settings.logger.log_params, "request logging demo starting");

    let logger = RequestLogger::new(settings.logger);
    let app = router(&logger);

    let addr = settings.bind_addr;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::Bind { addr, source })?;
    info!(addr = %addr, "listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|source| AppError::Serve { source })?;

    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqlog_http::LogLevel;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn settings_default_to_loopback_and_unnamed_app() -> anyhow::Result<()> {
        let settings = AppSettings::from_lookup(lookup(&[]))?;
        assert_eq!(settings.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert_eq!(settings.logger, LoggerOptions::default());
        assert_eq!(settings.log_format, LogFormat::infer());
        Ok(())
    }

    #[test]
    fn settings_read_every_variable() -> anyhow::Result<()> {
        let settings = AppSettings::from_lookup(lookup(&[
            (ENV_BIND_ADDR, "0.0.0.0:8080"),
            (ENV_LOG_FORMAT, "json"),
            ("REQLOG_NAME", "demo"),
            ("REQLOG_LOG_PARAMS", "true"),
            ("REQLOG_LEVEL", "warn"),
        ]))?;
        assert_eq!(settings.bind_addr.port(), 8080);
        assert_eq!(settings.log_format, LogFormat::Json);
        assert_eq!(settings.logger.name, "demo");
        assert!(settings.logger.log_params);
        assert_eq!(settings.logger.level, LogLevel::Warn);
        Ok(())
    }

    #[test]
    fn bad_bind_address_is_reported() {
        let result = AppSettings::from_lookup(lookup(&[(ENV_BIND_ADDR, "localhost")]));
        assert!(matches!(result, Err(AppError::InvalidBindAddr { .. })));
    }

    #[test]
    fn bad_logger_option_is_reported() {
        let result = AppSettings::from_lookup(lookup(&[("REQLOG_LEVEL", "chatty")]));
        assert!(matches!(result, Err(AppError::Config { .. })));
    }
}
