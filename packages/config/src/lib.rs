// ABOUTME: Configuration helpers shared by the Streamline crates
// ABOUTME: Reads environment variables by the names defined in `constants`

pub mod constants;

use std::env;
use std::str::FromStr;

use tracing::warn;

/// Read an environment variable, returning `None` when unset or blank.
pub fn env_string(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse an environment variable, falling back to `default` when
/// it is unset.
///
/// Returns `Err` with the raw value when it is set but does not parse.
pub fn env_parse_or<T: FromStr>(name: &str, default: T) -> Result<T, String> {
    match env_string(name) {
        Some(raw) => raw.parse::<T>().map_err(|_| {
            warn!("Invalid value for {}", name);
            raw
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_parse_or_default_when_unset() {
        let value = env_parse_or("STREAMLINE_TEST_SURELY_UNSET_VAR", 42u16);
        assert_eq!(value, Ok(42));
    }

    #[test]
    fn test_env_string_unset() {
        assert_eq!(env_string("STREAMLINE_TEST_SURELY_UNSET_VAR"), None);
    }
}
