//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "venuewatch=info";

/// Log filter from `RUST_LOG`, falling back to `LOG_LEVEL` for our crates
pub fn log_filter_from_env() -> String {
    resolve_log_filter(
        std::env::var("RUST_LOG").ok(),
        std::env::var("LOG_LEVEL").ok(),
    )
}

fn resolve_log_filter(rust_log: Option<String>, log_level: Option<String>) -> String {
    rust_log
        .filter(|f| !f.trim().is_empty())
        .or_else(|| {
            log_level
                .filter(|l| !l.trim().is_empty())
                .map(|level| format!("venuewatch={}", level.trim()))
        })
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}

/// Install the global fmt subscriber
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_takes_precedence() {
        assert_eq!(
            resolve_log_filter(Some("debug".into()), Some("warn".into())),
            "debug"
        );
    }

    #[test]
    fn test_log_level_scopes_to_our_crates() {
        assert_eq!(
            resolve_log_filter(None, Some("debug".into())),
            "venuewatch=debug"
        );
    }

    #[test]
    fn test_default_filter() {
        assert_eq!(resolve_log_filter(None, None), DEFAULT_FILTER);
        assert_eq!(resolve_log_filter(Some("  ".into()), None), DEFAULT_FILTER);
    }
}
