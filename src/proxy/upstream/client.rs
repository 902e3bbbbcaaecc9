// Upstream client implementation
// Thin reqwest wrapper for the booking platform's member API

use reqwest::{header, Client, Method, Response};
use tokio::time::Duration;

// The platform's credential-check endpoint; a valid session cookie yields the
// logged-in member as JSON.
const CURRENT_MEMBER_PATH: &str = "api/memberapi/get/current";

pub struct UpstreamClient {
    http_client: Client,
    base_url: String,
}

impl UpstreamClient {
    pub fn new(upstream_host: &str, request_timeout: u64) -> Self {
        let http_client = Client::builder()
            // Connection settings (optimize connection reuse, reduce overhead)
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(16)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(Duration::from_secs(request_timeout))
            .build()
            .expect("failed to create HTTP client");

        Self {
            http_client,
            base_url: format!("https://{}", upstream_host),
        }
    }

    /// Build an upstream request URL from a relayed sub-path and query string
    fn build_url(base_url: &str, path: &str, query: Option<&str>) -> String {
        let path = path.trim_start_matches('/');
        match query {
            Some(qs) if !qs.is_empty() => format!("{}/{}?{}", base_url, path, qs),
            _ => format!("{}/{}", base_url, path),
        }
    }

    /// Forward a member-API call to the upstream host.
    ///
    /// Only the session credential and an `Accept: application/json` header
    /// travel upstream; the caller's other cookies and headers stay behind.
    pub async fn forward(
        &self,
        method: Method,
        path: &str,
        query: Option<&str>,
        session: Option<&str>,
        body: Option<String>,
    ) -> Result<Response, String> {
        let url = Self::build_url(&self.base_url, path, query);

        let mut request = self
            .http_client
            .request(method, &url)
            .header(header::ACCEPT, "application/json");

        if let Some(token) = session {
            request = request.header(header::COOKIE, format!("session={}", token));
        }

        if let Some(payload) = body {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(payload);
        }

        request
            .send()
            .await
            .map_err(|e| format!("upstream request failed: {}", e))
    }

    /// Check a session token against the platform's "current member" endpoint
    pub async fn get_current_member(&self, session_token: &str) -> Result<Response, String> {
        self.forward(
            Method::GET,
            CURRENT_MEMBER_PATH,
            None,
            Some(session_token),
            None,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let base_url = "https://z.coregym.club";

        let url1 = UpstreamClient::build_url(base_url, "api/memberapi/get/current", None);
        assert_eq!(url1, "https://z.coregym.club/api/memberapi/get/current");

        let url2 = UpstreamClient::build_url(base_url, "api/memberapi/booking/list", Some("week=32"));
        assert_eq!(
            url2,
            "https://z.coregym.club/api/memberapi/booking/list?week=32"
        );
    }

    #[test]
    fn test_build_url_strips_leading_slash() {
        let url = UpstreamClient::build_url("https://z.coregym.club", "/api/ping", None);
        assert_eq!(url, "https://z.coregym.club/api/ping");
    }

    #[test]
    fn test_build_url_ignores_empty_query() {
        let url = UpstreamClient::build_url("https://z.coregym.club", "api/ping", Some(""));
        assert_eq!(url, "https://z.coregym.club/api/ping");
    }
}
