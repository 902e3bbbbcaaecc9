//! Session bridge
//!
//! After a federated login (BankID or Google) the upstream platform redirects
//! back to the site with a bare session token. The browser cannot rely on the
//! upstream's own cookie because third-party-cookie blocking may have dropped
//! it, so the callback page posts the token here. The handler verifies the
//! token against the platform's "current member" endpoint and, only when it
//! identifies a real member, re-issues the session cookie first-party on the
//! site's domain.

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::proxy::server::AppState;

const SESSION_COOKIE_NAME: &str = "session";
const SESSION_COOKIE_MAX_AGE_DAYS: i64 = 365;

#[derive(Deserialize)]
pub struct SessionSyncRequest {
    #[serde(default)]
    pub session: Option<String>,
}

/// Member identity as the upstream reports it. Only `id` is load-bearing: a
/// payload without it counts as an invalid session, names may be null.
#[derive(Debug, Deserialize)]
pub struct CurrentMember {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
}

/// Validate a handed-over session token and make it first-party
pub async fn sync_session(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SessionSyncRequest>,
) -> Result<(CookieJar, Json<Value>), (StatusCode, Json<Value>)> {
    let token = match request.session.as_deref() {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => {
            return Err((
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Missing session token" })),
            ));
        }
    };

    let response = state
        .upstream
        .get_current_member(&token)
        .await
        .map_err(|e| {
            tracing::error!("session validation request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Session validation failed" })),
            )
        })?;

    if !response.status().is_success() {
        tracing::warn!(
            "upstream rejected session token (status {})",
            response.status()
        );
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid session" })),
        ));
    }

    let member: CurrentMember = response.json().await.map_err(|e| {
        tracing::error!("failed to parse current-member payload: {}", e);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Session validation failed" })),
        )
    })?;

    let Some(member_id) = member.id else {
        tracing::warn!("current-member payload carries no id, treating session as invalid");
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid session" })),
        ));
    };

    // Expire the no-domain variant first so stale duplicates cannot linger
    // next to the freshly scoped cookie.
    let jar = jar
        .add(expired_session_cookie())
        .add(first_party_session_cookie(&token, &state.site_domain));

    tracing::info!("session synced for member {}", member_id);

    Ok((
        jar,
        Json(json!({
            "success": true,
            "user": {
                "id": member_id,
                "firstname": member.firstname,
                "lastname": member.lastname,
            }
        })),
    ))
}

/// Removal directive for a previously set cookie without a domain attribute
fn expired_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

/// The first-party session cookie. Not HttpOnly: client-side code reads it,
/// and some deployment targets mishandle the attribute.
fn first_party_session_cookie(token: &str, site_domain: &str) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token.to_string()))
        .domain(format!(".{}", site_domain))
        .path("/")
        .secure(true)
        .http_only(false)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(SESSION_COOKIE_MAX_AGE_DAYS))
        .build()
}
