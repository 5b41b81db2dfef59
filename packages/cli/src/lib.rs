// ABOUTME: Shared setup for the Streamline command line front-end
// ABOUTME: Environment loading and tracing subscriber initialization

use streamline_config::constants::DEFAULT_LOG_FILTER;
use tracing_subscriber::EnvFilter;

/// Load `.env` and install the tracing subscriber.
///
/// `RUST_LOG` overrides the default filter.
pub fn init() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_target(false)
        .compact()
        .init();
}

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use streamline_config::constants::RUST_LOG;

    #[test]
    #[serial]
    fn test_default_log_filter() {
        std::env::remove_var(RUST_LOG);
        let filter = log_filter().to_string();
        assert!(filter.contains("streamline=info"));
        assert!(filter.contains("streamline_auth=info"));
    }

    #[test]
    #[serial]
    fn test_rust_log_overrides_default() {
        std::env::set_var(RUST_LOG, "debug");
        assert_eq!(log_filter().to_string(), "debug");
        std::env::remove_var(RUST_LOG);
    }
}
