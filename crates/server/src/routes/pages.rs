//! Page routes. Each answers the view model its template would render.

use axum::extract::{Path, Query, State};
use axum::Json;
use pipeline::{
    BlogStatus, BlogStore, PageRequest, StoreError, Timestamp, DEFAULT_PER_PAGE,
};
use serde::Deserialize;
use tracing::warn;

use super::blog_id;
use crate::error::Result;
use crate::session::PageSession;
use crate::state::AppState;
use crate::views::{
    local_greeting, ActivityView, CategoriesView, CreateView, DashboardView, EditView, QueueView,
};

/// Entries shown in the dashboard feed.
const RECENT_ACTIVITY_LIMIT: usize = 10;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    /// The requested page; anything unparsable reads as page 1.
    fn request(&self) -> PageRequest {
        let page = self
            .page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1);
        PageRequest::new(page, DEFAULT_PER_PAGE)
    }
}

async fn dashboard_stats(
    store: &dyn BlogStore,
    greeting: &'static str,
    username: String,
) -> Result<DashboardView, StoreError> {
    let now = Timestamp::now();
    Ok(DashboardView {
        greeting,
        username,
        total_blogs_count: store.count_blogs(None).await?,
        drafts_count: store.count_blogs(Some(BlogStatus::Draft)).await?,
        pending_count: store.count_blogs(Some(BlogStatus::UnderReview)).await?,
        categories_count: store.list_categories().await?.len() as u64,
        recent_activity: store
            .recent_activity(RECENT_ACTIVITY_LIMIT)
            .await?
            .into_iter()
            .map(|entry| ActivityView::new(entry, now))
            .collect(),
    })
}

/// Totals and the activity feed. A store failure still renders, with zeros.
pub async fn dashboard(
    State(state): State<AppState>,
    PageSession(session): PageSession,
) -> Json<DashboardView> {
    let greeting = local_greeting();
    let username = session.display_name().to_string();
    match dashboard_stats(state.store.as_ref(), greeting, username.clone()).await {
        Ok(view) => Json(view),
        Err(err) => {
            warn!(error = %err, "dashboard stats unavailable");
            Json(DashboardView::empty(greeting, username))
        }
    }
}

pub async fn create(PageSession(session): PageSession) -> Json<CreateView> {
    Json(CreateView {
        username: session.display_name().to_string(),
    })
}

pub async fn edit(
    State(state): State<AppState>,
    PageSession(session): PageSession,
    Path(id): Path<String>,
) -> Result<Json<EditView>> {
    let blog = state.store.get_blog(&blog_id(id)?).await?;
    Ok(Json(EditView {
        username: session.display_name().to_string(),
        blog,
    }))
}

pub async fn drafts(
    State(state): State<AppState>,
    _session: PageSession,
    Query(query): Query<PageQuery>,
) -> Result<Json<QueueView>> {
    let request = query.request();
    let page = state
        .store
        .paginated_drafts(request.page(), request.per_page())
        .await?;
    Ok(Json(page.into()))
}

pub async fn approval(
    State(state): State<AppState>,
    _session: PageSession,
    Query(query): Query<PageQuery>,
) -> Result<Json<QueueView>> {
    let page = state
        .store
        .page_by_status(BlogStatus::UnderReview, query.request())
        .await?;
    Ok(Json(page.into()))
}

pub async fn categories(
    State(state): State<AppState>,
    _session: PageSession,
) -> Result<Json<CategoriesView>> {
    Ok(Json(CategoriesView {
        categories: state.store.list_categories().await?,
    }))
}
