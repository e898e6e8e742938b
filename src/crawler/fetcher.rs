//! HTTP link resolution
//!
//! This module handles the HTTP side of link auditing:
//! - Building the HTTP client with the crawler's user agent and limits
//! - Resolving a link to its post-redirect URL and final status
//! - Classifying network failures into short reasons

use crate::config::{NetworkConfig, UserAgentConfig};
use crate::state::LinkStatus;
use reqwest::{redirect::Policy, Client, Method, Response};
use std::time::Duration;
use url::Url;

/// Status codes from servers that refuse HEAD; the link is retried with GET
const HEAD_REJECTED: [u16; 3] = [400, 403, 405];

/// Upper bound on the TCP connect phase
const MAX_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of resolving one link
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// URL after following redirects (the original URL on failure)
    pub final_url: Url,

    /// Final status, or `Error` on timeout/connection failure
    pub status: LinkStatus,
}

/// Builds an HTTP client with proper configuration
///
/// The same client is used for link resolution, robots.txt and page fetches,
/// so every request carries the crawler's user agent and is bounded by the
/// configured timeout.
///
/// # Arguments
///
/// * `network` - Timeout and redirect limits
/// * `user_agent` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    network: &NetworkConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_millis(network.timeout_ms);

    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(MAX_CONNECT_TIMEOUT))
        .redirect(Policy::limited(network.max_redirects as usize))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Resolves a link to its final URL and status
///
/// # Request Flow
///
/// 1. Send HEAD, following redirects up to the client's hop limit
/// 2. If the server answers 400, 403 or 405, send one GET instead
/// 3. Timeouts, connection errors and redirect overflows become
///    `LinkStatus::Error`; nothing is retried beyond step 2
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The absolute URL to resolve
pub async fn resolve_link(client: &Client, url: &Url) -> Resolution {
    let head = send(client, Method::HEAD, url).await;

    let response = match head {
        Ok(response) if HEAD_REJECTED.contains(&response.status().as_u16()) => {
            tracing::debug!(
                "HEAD {} answered {}, retrying with GET",
                url,
                response.status().as_u16()
            );
            send(client, Method::GET, url).await
        }
        other => other,
    };

    match response {
        Ok(response) => {
            let final_url = response.url().clone();
            if final_url != *url {
                tracing::debug!("Redirect: {} -> {}", url, final_url);
            }
            Resolution {
                final_url,
                status: LinkStatus::Status(response.status().as_u16()),
            }
        }
        Err(e) => {
            let reason = describe_error(&e);
            tracing::debug!("Resolution failed for {}: {}", url, reason);
            Resolution {
                final_url: url.clone(),
                status: LinkStatus::Error { reason },
            }
        }
    }
}

async fn send(client: &Client, method: Method, url: &Url) -> Result<Response, reqwest::Error> {
    client.request(method, url.clone()).send().await
}

/// Classifies a request failure into a short reason
pub fn describe_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "timeout".to_string()
    } else if e.is_connect() {
        "connection error".to_string()
    } else if e.is_redirect() {
        "too many redirects".to_string()
    } else {
        e.to_string()
    }
}
