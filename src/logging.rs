//! Logging initialization.
//!
//! Diagnostics go to stderr so they never mix with command output such as
//! `gibr issues --json`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Pick the filter directive: `RUST_LOG` wins, then `--verbose`, then config
pub fn filter_directive(rust_log: Option<String>, verbose: bool, config: &LoggingConfig) -> String {
    match rust_log {
        Some(directive) if !directive.is_empty() => directive,
        _ if verbose => "debug".to_string(),
        _ => config.level.clone(),
    }
}

/// Install the global subscriber.
///
/// Safe to call more than once; later calls leave the first subscriber in place.
pub fn init_logging(verbose: bool, config: &LoggingConfig) {
    let directive = filter_directive(std::env::var("RUST_LOG").ok(), verbose, config);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_takes_precedence() {
        let config = LoggingConfig::default();
        assert_eq!(
            filter_directive(Some("gibr=trace".to_string()), true, &config),
            "gibr=trace"
        );
    }

    #[test]
    fn test_verbose_enables_debug() {
        let config = LoggingConfig::default();
        assert_eq!(filter_directive(None, true, &config), "debug");
        assert_eq!(filter_directive(Some(String::new()), true, &config), "debug");
    }

    #[test]
    fn test_config_level_is_fallback() {
        let config = LoggingConfig {
            level: "info".to_string(),
        };
        assert_eq!(filter_directive(None, false, &config), "info");
        assert_eq!(
            filter_directive(None, false, &LoggingConfig::default()),
            "warn"
        );
    }

    #[test]
    fn test_init_twice_does_not_panic() {
        init_logging(false, &LoggingConfig::default());
        init_logging(true, &LoggingConfig::default());
    }
}
