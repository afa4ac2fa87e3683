//! Signed-cookie login sessions.
//!
//! The session is a small JSON document in one cookie, signed with the
//! server's secret key. Pages and API routes reject missing sessions
//! differently: pages redirect to `/login`, API routes answer 401 JSON.

use axum::async_trait;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::response::Redirect;
use axum_extra::extract::cookie::{Cookie, Key, SameSite, SignedCookieJar};
use pipeline::UserId;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const SESSION_COOKIE: &str = "scriptly_session";

/// Name recorded in the activity feed when the session has none.
pub const DEFAULT_USER_NAME: &str = "Admin";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
    pub user_name: String,
}

impl Session {
    /// The session carried by `jar`, if it has a valid one.
    pub fn read(jar: &SignedCookieJar) -> Option<Self> {
        let cookie = jar.get(SESSION_COOKIE)?;
        serde_json::from_str(cookie.value()).ok()
    }

    /// Adds this session to `jar`, replacing any previous one.
    pub fn store(&self, jar: SignedCookieJar) -> SignedCookieJar {
        // Serializing two strings cannot fail.
        let value = serde_json::to_string(self).unwrap_or_default();
        let cookie = Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build();
        jar.add(cookie)
    }

    pub fn clear(jar: SignedCookieJar) -> SignedCookieJar {
        jar.remove(Cookie::build(SESSION_COOKIE).path("/").build())
    }

    pub fn display_name(&self) -> &str {
        if self.user_name.trim().is_empty() {
            DEFAULT_USER_NAME
        } else {
            &self.user_name
        }
    }
}

async fn session_from_parts<S>(parts: &mut Parts, state: &S) -> Option<Session>
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    // The jar extractor is infallible.
    let jar = SignedCookieJar::<Key>::from_request_parts(parts, state)
        .await
        .ok()?;
    Session::read(&jar)
}

/// Session of a page request; redirects to `/login` when absent.
pub struct PageSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for PageSession
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        session_from_parts(parts, state)
            .await
            .map(PageSession)
            .ok_or_else(|| Redirect::to("/login"))
    }
}

/// Session of an API request; 401 JSON when absent.
pub struct ApiSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for ApiSession
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        session_from_parts(parts, state)
            .await
            .map(ApiSession)
            .ok_or_else(|| ApiError::unauthorized("Not signed in"))
    }
}
