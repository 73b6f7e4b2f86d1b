use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING};
use reqwest::Client;

/// Fixed client identification sent with every registry and CDN request.
pub const APP_USER_AGENT: &str = "InterfaceOficial/0.1.0 (mods)";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared HTTP client. Per-call timeouts are applied on each request,
/// since registry lookups and artifact downloads need different budgets.
pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
}
