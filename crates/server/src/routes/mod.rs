//! Route table.

mod api;
mod auth;
mod pages;

use axum::extract::FromRequest;
use axum::routing::{delete, get, post};
use axum::Router;
use pipeline::BlogId;
use serde::Serialize;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::timeout::RequestBodyTimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, Result};
use crate::state::{AppState, ServerLimits};

/// A JSON body whose rejection is answered in the API's error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `{ "success": true }`, optionally with where the client should go next.
#[derive(Debug, Serialize)]
pub struct Ack {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect: Option<&'static str>,
}

impl Ack {
    pub fn ok() -> Self {
        Self {
            success: true,
            redirect: None,
        }
    }

    pub fn redirect(to: &'static str) -> Self {
        Self {
            success: true,
            redirect: Some(to),
        }
    }
}

fn blog_id(raw: String) -> Result<BlogId> {
    BlogId::new(raw).ok_or_else(|| ApiError::bad_request("Blog id is required"))
}

/// Builds the application router with tracing, the in-flight request cap and
/// the request body idle timeout.
///
/// The cap is one semaphore shared by every route, so `max_connections`
/// bounds the whole server rather than each path.
pub fn router(state: AppState, limits: ServerLimits) -> Router {
    Router::new()
        .route("/", get(auth::index))
        .route("/login", get(auth::login).post(auth::login))
        .route("/signup", get(auth::signup).post(auth::signup))
        .route("/logout", get(auth::logout))
        .route("/api/auth/verify", post(auth::verify))
        .route("/dashboard", get(pages::dashboard))
        .route("/create", get(pages::create))
        .route("/edit/:id", get(pages::edit))
        .route("/drafts", get(pages::drafts))
        .route("/approval", get(pages::approval))
        .route("/categories", get(pages::categories))
        .route("/api/generate", post(api::generate))
        .route("/api/update_status/:id", post(api::update_status))
        .route("/api/review/:id", post(api::review))
        .route("/api/update_content/:id", post(api::update_content))
        .route("/api/submit_for_review/:id", post(api::submit_for_review))
        .route("/api/delete_blog/:id", delete(api::delete_blog))
        .route("/api/delete_category/:id", delete(api::delete_category))
        .route("/api/edit_category/:id", post(api::edit_category))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(GlobalConcurrencyLimitLayer::new(limits.max_connections))
                .layer(RequestBodyTimeoutLayer::new(limits.idle_timeout)),
        )
}
