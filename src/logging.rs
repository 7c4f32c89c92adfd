//! # Structured Logging Module
//!
//! Environment-aware structured logging that writes human-readable output to
//! the console and JSON lines to a per-process file under `log/`.

use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = get_log_level(&environment);

        let console_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_level(true)
            .with_ansi(true)
            .with_filter(EnvFilter::new(log_level.clone()));

        let log_dir = PathBuf::from("log");
        if let Err(error) = fs::create_dir_all(&log_dir) {
            // Console output alone is better than no logging
            let _ = tracing_subscriber::registry().with(console_layer).try_init();
            tracing::warn!(
                error = %error,
                log_dir = %log_dir.display(),
                "Log directory unavailable, logging to console only"
            );
            return;
        }

        let pid = process::id();
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
        let log_filename = format!("{environment}.{pid}.{timestamp}.log");
        let log_path = log_dir.join(&log_filename);

        let file_appender = tracing_appender::rolling::never(&log_dir, log_filename);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

        let subscriber = tracing_subscriber::registry().with(console_layer).with(
            fmt::layer()
                .with_writer(file_writer)
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(false)
                .json()
                .with_filter(EnvFilter::new(log_level)),
        );

        // An embedding host may already own the global subscriber
        if subscriber.try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized");
        }

        tracing::info!(
            pid = pid,
            environment = %environment,
            log_file = %log_path.display(),
            "🔧 STRUCTURED LOGGING: Initialized with file output"
        );

        // The writer flushes for as long as the guard lives
        std::mem::forget(guard);
    });
}

fn get_environment() -> String {
    std::env::var("TRACKER_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Explicit level overrides win over the environment default
fn get_log_level(environment: &str) -> String {
    if let Ok(level) = std::env::var("TRACKER_LOG_LEVEL").or_else(|_| std::env::var("RUST_LOG")) {
        return level;
    }
    default_log_level(environment).to_string()
}

fn default_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for operation lifecycle events
pub fn log_operation_event(
    correlation_key: &str,
    event: &str,
    status: Option<&str>,
    channel: Option<&str>,
) {
    tracing::info!(
        correlation_key = %correlation_key,
        event = %event,
        status = status,
        channel = channel,
        timestamp = %Utc::now().to_rfc3339(),
        "📋 OPERATION_EVENT"
    );
}

/// Log structured data for subscription provisioning
pub fn log_provisioning_event(detail_type: &str, region: &str, status: &str, details: Option<&str>) {
    tracing::info!(
        detail_type = %detail_type,
        region = %region,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📡 PROVISIONING_EVENT"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(default_log_level("test"), "debug");
        assert_eq!(default_log_level("development"), "debug");
        assert_eq!(default_log_level("production"), "info");
        assert_eq!(default_log_level("unknown"), "debug");
    }

    #[test]
    fn test_logging_helpers_without_subscriber() {
        log_operation_event("ami-1", "launched", Some("pending"), None);
        log_provisioning_event("EC2 AMI State Change", "us-east-1", "pending", None);
        log_error("tracker", "poll", "boom", Some("ami-1"));
    }
}
