// ABOUTME: Loopback callback server capturing the implicit-grant redirect
// ABOUTME: Relays the URL fragment back as a query string and extracts token, state, and errors

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};
use tracing::{debug, info, warn};

use crate::{
    error::{AuthError, AuthResult},
    oauth::types::{AuthOutcome, RedirectParams, CALLBACK_PATH},
};
use streamline_config::constants::DEFAULT_CALLBACK_PORT;

/// Path the relay page forwards the fragment to.
pub const TOKEN_RELAY_PATH: &str = "/auth/token";

/// OAuth callback server configuration
pub struct CallbackServer {
    port: u16,
}

impl Default for CallbackServer {
    fn default() -> Self {
        Self::new()
    }
}

/// What to do with one incoming request
#[derive(Debug, PartialEq, Eq)]
enum CallbackRoute {
    /// Serve the page that forwards the fragment
    Relay,
    /// The provider's parameters have arrived
    Redirect(RedirectParams),
    NotFound,
}

impl CallbackServer {
    /// Create a new callback server (defaults to port 3737)
    pub fn new() -> Self {
        Self {
            port: DEFAULT_CALLBACK_PORT,
        }
    }

    /// Create callback server with custom port
    pub fn with_port(port: u16) -> Self {
        Self { port }
    }

    /// Get the callback URL for this server
    pub fn callback_url(&self) -> String {
        format!("http://localhost:{}{}", self.port, CALLBACK_PATH)
    }

    /// Bind to localhost
    pub async fn bind(&self) -> AuthResult<TcpListener> {
        let addr = format!("127.0.0.1:{}", self.port);
        TcpListener::bind(&addr)
            .await
            .map_err(|e| AuthError::CallbackServer(format!("Failed to bind to {}: {}", addr, e)))
    }

    /// Serve on a bound listener until the provider's redirect arrives.
    ///
    /// The access token of an implicit grant sits in the URL fragment, which
    /// the browser never sends. The first hit on the callback path therefore
    /// gets a relay page that reloads [`TOKEN_RELAY_PATH`] with the fragment
    /// as its query string. Denials arrive in the query and resolve directly.
    pub async fn serve(listener: TcpListener) -> AuthResult<AuthOutcome> {
        if let Ok(addr) = listener.local_addr() {
            info!("📡 Waiting for OAuth redirect on {}", addr);
        }

        loop {
            let (mut stream, peer_addr) = listener.accept().await.map_err(|e| {
                AuthError::CallbackServer(format!("Failed to accept connection: {}", e))
            })?;
            debug!("Received connection from {}", peer_addr);

            let request = match Self::read_request(&mut stream).await {
                Ok(request) => request,
                Err(e) => {
                    warn!("Dropping unreadable callback request: {}", e);
                    continue;
                }
            };

            match Self::route(&request) {
                CallbackRoute::Relay => {
                    debug!("Serving fragment relay page");
                    Self::respond(&mut stream, &Self::html_response("200 OK", RELAY_HTML)).await;
                }
                CallbackRoute::NotFound => {
                    Self::respond(&mut stream, &Self::html_response("404 Not Found", "")).await;
                }
                CallbackRoute::Redirect(params) => {
                    if let Some(error) = &params.error {
                        let detail = params.error_description.as_deref().unwrap_or(error);
                        Self::respond(&mut stream, &Self::error_response(detail)).await;
                    } else {
                        Self::respond(&mut stream, &Self::html_response("200 OK", SUCCESS_HTML))
                            .await;
                    }
                    info!("Received OAuth redirect");
                    return Ok(AuthOutcome::Success(params));
                }
            }
        }
    }

    async fn read_request(stream: &mut TcpStream) -> std::io::Result<String> {
        let mut buffer = vec![0; 4096];
        let n = stream.read(&mut buffer).await?;
        Ok(String::from_utf8_lossy(&buffer[..n]).into_owned())
    }

    async fn respond(stream: &mut TcpStream, response: &str) {
        if let Err(e) = stream.write_all(response.as_bytes()).await {
            warn!("Failed to write callback response: {}", e);
        }
        let _ = stream.shutdown().await;
    }

    /// Split the request line into path and query
    fn request_target(request: &str) -> Option<(&str, &str)> {
        let first_line = request.lines().next()?;
        let mut parts = first_line.split_whitespace();
        let method = parts.next()?;
        let target = parts.next()?;
        if method != "GET" {
            return None;
        }
        Some(target.split_once('?').unwrap_or((target, "")))
    }

    fn route(request: &str) -> CallbackRoute {
        let Some((path, query)) = Self::request_target(request) else {
            return CallbackRoute::NotFound;
        };

        match path {
            CALLBACK_PATH => {
                let params = RedirectParams::from_query(query);
                if params.error.is_some() || params.access_token.is_some() {
                    CallbackRoute::Redirect(params)
                } else {
                    CallbackRoute::Relay
                }
            }
            TOKEN_RELAY_PATH => {
                let params = RedirectParams::from_query(query);
                if params.is_empty() {
                    CallbackRoute::NotFound
                } else {
                    CallbackRoute::Redirect(params)
                }
            }
            _ => CallbackRoute::NotFound,
        }
    }

    fn html_response(status: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        )
    }

    /// Generate error HTML response
    fn error_response(error_msg: &str) -> String {
        let html = format!(
            r#"<html><body><h1>❌ Sign-in Failed</h1><p>{}</p><p>You can close this tab and return to your terminal.</p></body></html>"#,
            escape_html(error_msg)
        );
        Self::html_response("400 Bad Request", &html)
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

const RELAY_HTML: &str = r#"<html>
<head><title>Completing sign-in…</title></head>
<body>
    <p>Completing sign-in…</p>
    <script>
        var fragment = window.location.hash.substring(1);
        if (fragment) {
            window.location.replace('/auth/token?' + fragment);
        } else {
            document.querySelector('p').textContent = 'No authorization parameters found. Return to your terminal.';
        }
    </script>
</body>
</html>"#;

const SUCCESS_HTML: &str = r#"<html>
<head>
    <title>Signed In</title>
    <style>
        body { font-family: system-ui, -apple-system, sans-serif; max-width: 600px; margin: 100px auto; text-align: center; }
        h1 { color: #9146ff; }
        p { color: #64748b; }
    </style>
</head>
<body>
    <h1>✅ Signed in with Twitch</h1>
    <p>You can now close this tab and return to your terminal.</p>
</body>
</html>"#;
