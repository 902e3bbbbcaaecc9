//! Member-API relay
//!
//! Forwards `/api/z/{path}` calls to the upstream booking platform and hands
//! the response back with its session cookies rewritten to be first-party for
//! the serving site. Browsers with third-party-cookie blocking (Safari ITP)
//! would otherwise drop the upstream's cookies entirely.

use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use serde_json::{json, Value};
use url::form_urlencoded;

use crate::proxy::cookies::{rewrite_cookie_domain, split_set_cookie};
use crate::proxy::server::AppState;

const SESSION_COOKIE_NAME: &str = "session";

/// Handle any member-API call under the relay prefix
pub async fn handle_relay(
    State(state): State<AppState>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    jar: CookieJar,
    body: Bytes,
) -> Response {
    let session = jar
        .get(SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_string());

    let normalized_query = query.as_deref().and_then(normalize_query);

    // Only the mutating methods carry a body upstream, always as JSON
    let forward_body = if method == Method::POST || method == Method::PUT || method == Method::PATCH
    {
        normalize_body(&body)
    } else {
        None
    };

    let upstream_response = match state
        .upstream
        .forward(
            method,
            &path,
            normalized_query.as_deref(),
            session.as_deref(),
            forward_body,
        )
        .await
    {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("relay to upstream failed: {}", e);
            return proxy_error(e);
        }
    };

    relay_response(upstream_response, &state.site_domain).await
}

/// Decode and re-serialize the query string. All keys and values round-trip
/// exactly; parameter order is not guaranteed.
fn normalize_query(raw: &str) -> Option<String> {
    if raw.is_empty() {
        return None;
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        serializer.append_pair(&key, &value);
    }

    let serialized = serializer.finish();
    if serialized.is_empty() {
        None
    } else {
        Some(serialized)
    }
}

/// Re-serialize a JSON body, or pass non-JSON payloads through as text
fn normalize_body(body: &Bytes) -> Option<String> {
    if body.is_empty() {
        return None;
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(value) => serde_json::to_string(&value).ok(),
        Err(_) => Some(String::from_utf8_lossy(body).into_owned()),
    }
}

/// Copy status, content type and body from the upstream response, emitting one
/// rewritten `Set-Cookie` header per upstream cookie directive.
async fn relay_response(upstream: reqwest::Response, site_domain: &str) -> Response {
    let status = upstream.status();
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let mut directives = Vec::new();
    for value in upstream.headers().get_all(header::SET_COOKIE) {
        if let Ok(raw) = value.to_str() {
            for directive in split_set_cookie(raw) {
                directives.push(rewrite_cookie_domain(&directive, site_domain));
            }
        }
    }

    let is_json = content_type
        .as_deref()
        .map(|ct| ct.contains("application/json"))
        .unwrap_or(false);

    let mut response = if is_json {
        // Decode and re-encode so the outbound body is well-formed JSON
        match upstream.json::<Value>().await {
            Ok(value) => Json(value).into_response(),
            Err(e) => {
                tracing::error!("failed to read upstream JSON body: {}", e);
                return proxy_error(format!("invalid upstream response: {}", e));
            }
        }
    } else {
        match upstream.text().await {
            Ok(text) => text.into_response(),
            Err(e) => {
                tracing::error!("failed to read upstream body: {}", e);
                return proxy_error(format!("invalid upstream response: {}", e));
            }
        }
    };

    *response.status_mut() = status;

    if let Some(ct) = content_type {
        if let Ok(value) = HeaderValue::from_str(&ct) {
            response.headers_mut().insert(header::CONTENT_TYPE, value);
        }
    }

    for directive in &directives {
        if let Ok(value) = HeaderValue::from_str(directive) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

fn proxy_error(message: String) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "error": "Proxy error", "message": message })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn query_pairs(raw: &str) -> BTreeSet<(String, String)> {
        form_urlencoded::parse(raw.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_normalize_query_round_trips_pairs() {
        let raw = "week=32&name=Eva%20Str%C3%B6m&flag";
        let normalized = normalize_query(raw).expect("query should survive");
        assert_eq!(query_pairs(raw), query_pairs(&normalized));
    }

    #[test]
    fn test_normalize_query_empty() {
        assert_eq!(normalize_query(""), None);
    }

    #[test]
    fn test_normalize_body_reserializes_json() {
        let body = Bytes::from_static(b"{ \"week\": 32,\n  \"spots\": 2 }");
        let normalized = normalize_body(&body).expect("json body expected");
        let value: Value = serde_json::from_str(&normalized).expect("valid json out");
        assert_eq!(value, serde_json::json!({"week": 32, "spots": 2}));
    }

    #[test]
    fn test_normalize_body_passes_non_json_through() {
        let body = Bytes::from_static(b"plain text payload");
        assert_eq!(
            normalize_body(&body).as_deref(),
            Some("plain text payload")
        );
    }

    #[test]
    fn test_normalize_body_empty() {
        assert_eq!(normalize_body(&Bytes::new()), None);
    }
}
