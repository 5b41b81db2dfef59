// ABOUTME: Environment variable name constants and their defaults
// ABOUTME: Centralized definitions of every environment variable Streamline reads

// Twitch application registration
pub const CLIENT_ID: &str = "CLIENT_ID";

// Loopback callback server
pub const STREAMLINE_CALLBACK_PORT: &str = "STREAMLINE_CALLBACK_PORT";
pub const DEFAULT_CALLBACK_PORT: u16 = 3737;

// HTTP client
pub const STREAMLINE_HTTP_TIMEOUT_SECS: &str = "STREAMLINE_HTTP_TIMEOUT_SECS";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
pub const STREAMLINE_API_BASE_URL: &str = "STREAMLINE_API_BASE_URL";

// Logging
pub const RUST_LOG: &str = "RUST_LOG";
pub const DEFAULT_LOG_FILTER: &str = "streamline=info,streamline_auth=info";
