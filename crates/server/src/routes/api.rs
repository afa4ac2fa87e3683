//! JSON action endpoints. Every successful mutation appends an activity entry
//! in the signed-in user's name.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use nodes::{record_activity, GenerateRequest};
use pipeline::{ActivityKind, BlogStatus, CategoryId, CategoryName};
use serde::Deserialize;
use tracing::{info, instrument};

use super::{blog_id, Ack, ApiJson};
use crate::error::{ApiError, Result};
use crate::session::ApiSession;
use crate::state::AppState;

/// Feed entry written after a post reaches `status`.
fn status_activity(status: BlogStatus) -> (ActivityKind, &'static str) {
    match status {
        BlogStatus::Published => (ActivityKind::Published, "approved for publication"),
        BlogStatus::Rejected => (ActivityKind::Edited, "rejected the blog"),
        BlogStatus::Draft => (ActivityKind::Edited, "rejected back to drafts"),
        BlogStatus::UnderReview => (ActivityKind::ReviewRequested, "submitted for approval"),
    }
}

fn category_id(raw: String) -> Result<CategoryId> {
    CategoryId::new(raw).ok_or_else(|| ApiError::bad_request("Category id is required"))
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    auto_submit: bool,
}

#[instrument(skip_all)]
pub async fn generate(
    State(state): State<AppState>,
    ApiSession(session): ApiSession,
    ApiJson(body): ApiJson<GenerateBody>,
) -> Result<(StatusCode, Json<Ack>)> {
    let outcome = state
        .workflow
        .generate(GenerateRequest {
            prompt: body.prompt,
            auto_submit: body.auto_submit,
            author_id: session.user_id.clone(),
            actor: session.display_name().to_string(),
        })
        .await?;
    info!(blog_id = %outcome.blog_id, category = %outcome.category, "blog generated");

    let redirect = match outcome.status {
        BlogStatus::UnderReview => "/approval",
        _ => "/drafts",
    };
    Ok((StatusCode::CREATED, Json(Ack::redirect(redirect))))
}

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    #[serde(default = "default_status")]
    status: String,
    #[serde(default)]
    notes: Option<String>,
}

fn default_status() -> String {
    BlogStatus::Draft.as_str().to_string()
}

pub async fn update_status(
    State(state): State<AppState>,
    ApiSession(session): ApiSession,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StatusBody>,
) -> Result<Json<Ack>> {
    let record = state
        .approvals
        .set_status(&blog_id(id)?, &body.status, body.notes)
        .await?;
    let (kind, text) = status_activity(record.status);
    record_activity(state.store.as_ref(), session.display_name(), kind, text, &record.title).await;
    Ok(Json(Ack::ok()))
}

#[derive(Debug, Deserialize)]
pub struct ReviewBody {
    #[serde(default)]
    action: String,
    #[serde(default)]
    notes: Option<String>,
}

pub async fn review(
    State(state): State<AppState>,
    ApiSession(session): ApiSession,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ReviewBody>,
) -> Result<Json<Ack>> {
    let record = state
        .approvals
        .process_admin_action(&blog_id(id)?, &body.action, body.notes)
        .await?;
    let (kind, text) = status_activity(record.status);
    record_activity(state.store.as_ref(), session.display_name(), kind, text, &record.title).await;
    Ok(Json(Ack::ok()))
}

#[derive(Debug, Deserialize)]
pub struct ContentBody {
    body: String,
}

pub async fn update_content(
    State(state): State<AppState>,
    ApiSession(session): ApiSession,
    Path(id): Path<String>,
    ApiJson(content): ApiJson<ContentBody>,
) -> Result<Json<Ack>> {
    let record = state
        .drafts
        .update_draft_content(&blog_id(id)?, &content.body)
        .await?;
    record_activity(
        state.store.as_ref(),
        session.display_name(),
        ActivityKind::Edited,
        "edited the content",
        &record.title,
    )
    .await;
    Ok(Json(Ack::ok()))
}

pub async fn submit_for_review(
    State(state): State<AppState>,
    ApiSession(session): ApiSession,
    Path(id): Path<String>,
) -> Result<Json<Ack>> {
    let record = state.approvals.submit_for_review(&blog_id(id)?).await?;
    let (kind, text) = status_activity(record.status);
    record_activity(state.store.as_ref(), session.display_name(), kind, text, &record.title).await;
    Ok(Json(Ack::redirect("/dashboard")))
}

pub async fn delete_blog(
    State(state): State<AppState>,
    ApiSession(session): ApiSession,
    Path(id): Path<String>,
) -> Result<Json<Ack>> {
    let id = blog_id(id)?;
    let title = state.store.get_blog(&id).await?.title;
    state.store.delete_blog(&id).await?;
    info!(blog_id = %id, "blog deleted");
    record_activity(
        state.store.as_ref(),
        session.display_name(),
        ActivityKind::Deleted,
        "permanently deleted",
        &title,
    )
    .await;
    Ok(Json(Ack::ok()))
}

pub async fn delete_category(
    State(state): State<AppState>,
    ApiSession(session): ApiSession,
    Path(id): Path<String>,
) -> Result<Json<Ack>> {
    let id = category_id(id)?;
    let category = state.store.get_category(&id).await?;
    state.store.delete_category(&id).await?;
    record_activity(
        state.store.as_ref(),
        session.display_name(),
        ActivityKind::Deleted,
        "deleted the category",
        category.name.as_str(),
    )
    .await;
    Ok(Json(Ack::ok()))
}

#[derive(Debug, Deserialize)]
pub struct CategoryBody {
    #[serde(default)]
    name: Option<String>,
}

pub async fn edit_category(
    State(state): State<AppState>,
    ApiSession(session): ApiSession,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<CategoryBody>,
) -> Result<Json<Ack>> {
    let name = body
        .name
        .and_then(|n| CategoryName::new(n.trim()))
        .ok_or_else(|| ApiError::bad_request("Name is required"))?;
    state.store.rename_category(&category_id(id)?, &name).await?;
    record_activity(
        state.store.as_ref(),
        session.display_name(),
        ActivityKind::Edited,
        "renamed a category to",
        name.as_str(),
    )
    .await;
    Ok(Json(Ack::ok()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_status_has_a_feed_entry() {
        assert_eq!(status_activity(BlogStatus::Published).0, ActivityKind::Published);
        assert_eq!(status_activity(BlogStatus::Draft).1, "rejected back to drafts");
        assert_eq!(
            status_activity(BlogStatus::UnderReview).0,
            ActivityKind::ReviewRequested
        );
    }
}
