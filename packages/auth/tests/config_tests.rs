// ABOUTME: Integration tests for environment-driven session configuration
// ABOUTME: Serialized because they mutate process environment variables

use serial_test::serial;
use streamline_auth::{AuthError, SessionConfig};

const VARS: &[&str] = &[
    "CLIENT_ID",
    "STREAMLINE_CALLBACK_PORT",
    "STREAMLINE_HTTP_TIMEOUT_SECS",
    "STREAMLINE_API_BASE_URL",
];

fn clear_env() {
    for var in VARS {
        std::env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_from_env_requires_client_id() {
    clear_env();
    let result = SessionConfig::from_env();
    assert!(matches!(result, Err(AuthError::Configuration(_))));
}

#[test]
#[serial]
fn test_from_env_defaults() {
    clear_env();
    std::env::set_var("CLIENT_ID", "abc123");

    let config = SessionConfig::from_env().unwrap();

    assert_eq!(config.client_id, "abc123");
    assert_eq!(config.callback_port, 3737);
    assert_eq!(config.redirect_uri, "http://localhost:3737/auth/callback");
    assert_eq!(config.http_timeout.as_secs(), 30);
    assert_eq!(config.endpoints.users_url(), "https://api.twitch.tv/helix/users");
    clear_env();
}

#[test]
#[serial]
fn test_from_env_overrides() {
    clear_env();
    std::env::set_var("CLIENT_ID", "abc123");
    std::env::set_var("STREAMLINE_CALLBACK_PORT", "4545");
    std::env::set_var("STREAMLINE_HTTP_TIMEOUT_SECS", "5");
    std::env::set_var("STREAMLINE_API_BASE_URL", "http://127.0.0.1:9000/helix/");

    let config = SessionConfig::from_env().unwrap();

    assert_eq!(config.redirect_uri, "http://localhost:4545/auth/callback");
    assert_eq!(config.http_timeout.as_secs(), 5);
    assert_eq!(config.endpoints.users_url(), "http://127.0.0.1:9000/helix/users");
    clear_env();
}

#[test]
#[serial]
fn test_from_env_rejects_bad_port() {
    clear_env();
    std::env::set_var("CLIENT_ID", "abc123");

    std::env::set_var("STREAMLINE_CALLBACK_PORT", "not-a-port");
    assert!(matches!(
        SessionConfig::from_env(),
        Err(AuthError::Configuration(_))
    ));

    std::env::set_var("STREAMLINE_CALLBACK_PORT", "0");
    assert!(matches!(
        SessionConfig::from_env(),
        Err(AuthError::Configuration(_))
    ));
    clear_env();
}
