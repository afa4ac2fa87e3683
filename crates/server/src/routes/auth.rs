//! Sign-in flow: login views, token verification, logout.

use axum::extract::State;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::extract::cookie::SignedCookieJar;
use pipeline::Timestamp;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use super::{Ack, ApiJson};
use crate::error::{ApiError, Result};
use crate::session::Session;
use crate::state::AppState;
use crate::views::LoginView;

pub async fn index(jar: SignedCookieJar) -> Redirect {
    match Session::read(&jar) {
        Some(_) => Redirect::to("/dashboard"),
        None => Redirect::to("/login"),
    }
}

fn login_view(state: &AppState, jar: &SignedCookieJar, page: &'static str) -> Response {
    if Session::read(jar).is_some() {
        return Redirect::to("/dashboard").into_response();
    }
    Json(LoginView {
        page,
        identity_config: &state.client_config,
    })
    .into_response()
}

pub async fn login(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    login_view(&state, &jar, "login")
}

pub async fn signup(State(state): State<AppState>, jar: SignedCookieJar) -> Response {
    login_view(&state, &jar, "signup")
}

#[derive(Debug, Deserialize)]
pub struct VerifyBody {
    #[serde(rename = "idToken", default)]
    id_token: String,
}

/// Exchanges a client ID token for a session.
#[instrument(skip_all)]
pub async fn verify(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    ApiJson(body): ApiJson<VerifyBody>,
) -> Result<(SignedCookieJar, Json<Ack>)> {
    let identity = state
        .identity
        .verify(&body.id_token)
        .await
        .map_err(|err| {
            warn!(error = %err, "sign-in rejected");
            ApiError::unauthorized(err.to_string())
        })?;

    let profile = identity.to_profile(Timestamp::now());
    if let Err(err) = state.store.upsert_user(&profile).await {
        warn!(error = %err, uid = %profile.uid, "could not save user profile");
    }

    let session = Session {
        user_id: profile.uid,
        user_name: profile.name,
    };
    info!(uid = %session.user_id, "user signed in");
    Ok((session.store(jar), Json(Ack::redirect("/dashboard"))))
}

pub async fn logout(jar: SignedCookieJar) -> (SignedCookieJar, Redirect) {
    (Session::clear(jar), Redirect::to("/login"))
}
