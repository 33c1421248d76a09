//! Logging utilities for the Coursecast services.
//!
//! Every binary calls [`init`] once at startup; library crates only emit
//! events through the `tracing` macros.

use tracing::{error, info, Level};
use tracing_subscriber::{filter::LevelFilter, fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber at INFO level.
///
/// # Examples
///
/// ```
/// use coursecast_common::logging;
///
/// logging::init();
/// // A second call is a no-op.
/// logging::init_with_level(tracing::Level::DEBUG);
/// ```
pub fn init() {
    init_with_level(Level::INFO);
}

/// Build the event filter: `RUST_LOG` directives when set, with `level` for
/// every target they don't mention.
fn env_filter(level: Level, rust_log: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .parse_lossy(rust_log.unwrap_or_default())
}

/// Initialize the tracing subscriber with a specific default log level.
/// `RUST_LOG` directives take precedence for the targets they name, so load
/// `.env` before calling this.
pub fn init_with_level(level: Level) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = env_filter(level, rust_log.as_deref());

    // try_init: a global subscriber may already be installed (tests, embedding)
    let result = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_thread_ids(true)
                .with_thread_names(true),
        )
        .with(filter)
        .try_init();

    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Log a result, with different messages for success and error cases.
///
/// Returns the original result so it can be used in a chain.
pub fn log_result<T, E: std::fmt::Display>(
    result: Result<T, E>,
    success_message: &str,
    error_context: &str,
) -> Result<T, E> {
    match &result {
        Ok(_) => info!("{}", success_message),
        Err(e) => error!("{}: {}", error_context, e),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directives(filter: &EnvFilter) -> Vec<String> {
        filter.to_string().split(',').map(str::to_string).collect()
    }

    #[test]
    fn test_default_level_covers_all_targets_without_rust_log() {
        let filter = env_filter(Level::INFO, None);
        assert_eq!(directives(&filter), vec!["info".to_string()]);
    }

    #[test]
    fn test_rust_log_directives_are_kept_verbatim() {
        let filter = env_filter(Level::INFO, Some("coursecast=debug,tower_http=info"));
        let directives = directives(&filter);
        assert!(directives.contains(&"coursecast=debug".to_string()));
        assert!(directives.contains(&"tower_http=info".to_string()));
        assert!(directives.contains(&"info".to_string()));
    }
}
