//! Router tests over the in-memory store with scripted collaborators.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use pipeline::{
    BlogStatus, BlogStore, CategoryId, IdentityError, IdentityVerifier, LlmError, LlmProvider,
    LlmRequest, LlmResponse, PageRequest, UserId, VerifiedIdentity,
};
use serde_json::{json, Value};
use server::{router, AppState, ClientConfig, Key, ServerLimits};
use store::MemoryStore;
use tokio::sync::Notify;
use tower::ServiceExt;

/// Answers prompts from a queue of canned replies.
struct CannedModel {
    replies: Mutex<VecDeque<String>>,
}

impl CannedModel {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
        }
    }
}

#[async_trait]
impl LlmProvider for CannedModel {
    fn model_id(&self) -> &str {
        "canned"
    }

    async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let text = self.replies.lock().unwrap().pop_front().ok_or_else(|| LlmError::Transport {
            message: "no reply queued".into(),
        })?;
        Ok(LlmResponse { text, usage: None })
    }
}

/// Parks every prompt until released, then fails it.
#[derive(Default)]
struct HeldModel {
    entered: Notify,
    release: Notify,
}

#[async_trait]
impl LlmProvider for HeldModel {
    fn model_id(&self) -> &str {
        "held"
    }

    async fn generate(&self, _request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.entered.notify_one();
        self.release.notified().await;
        Err(LlmError::Transport {
            message: "released".into(),
        })
    }
}

/// Accepts the token `"good-token"` only.
struct OneUser;

#[async_trait]
impl IdentityVerifier for OneUser {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, IdentityError> {
        if id_token != "good-token" {
            return Err(IdentityError::InvalidToken("unknown token".into()));
        }
        Ok(VerifiedIdentity {
            uid: UserId::new("uid-ada").unwrap(),
            name: Some("Ada".into()),
            email: Some("ada@example.com".into()),
            picture: None,
        })
    }
}

/// One generated post, filed under `category`.
fn one_post(category: &str) -> Vec<String> {
    vec![
        r#"["Why it matters", "How to start"]"#.to_string(),
        "# Rust on the server\n\nAxum keeps handlers small.".to_string(),
        category.to_string(),
    ]
}

struct Harness {
    app: Router,
    store: Arc<MemoryStore>,
}

impl Harness {
    fn new(replies: Vec<String>) -> Self {
        let replies: Vec<&str> = replies.iter().map(String::as_str).collect();
        Self::with(Arc::new(CannedModel::new(&replies)), ServerLimits::default())
    }

    fn with(provider: Arc<dyn LlmProvider>, limits: ServerLimits) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(
            store.clone(),
            provider,
            Arc::new(OneUser),
            Key::generate(),
            ClientConfig {
                project_id: "blog-test".into(),
                ..ClientConfig::default()
            },
        );
        Self {
            app: router(state, limits),
            store,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Signs in and returns the `Cookie` header value for later requests.
    async fn sign_in(&self) -> String {
        let response = self
            .send(json_request(Method::POST, "/api/auth/verify", None, json!({"idToken": "good-token"})))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("session cookie")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }
}

fn json_request(method: Method, uri: &str, cookie: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: Method, uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

#[tokio::test]
async fn pages_redirect_to_login_without_a_session() {
    let harness = Harness::new(Vec::new());
    let response = harness.send(empty_request(Method::GET, "/dashboard", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = harness.send(empty_request(Method::GET, "/", None)).await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn api_answers_401_without_a_session() {
    let harness = Harness::new(Vec::new());
    let response = harness
        .send(json_request(Method::POST, "/api/generate", None, json!({"prompt": "Rust"})))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await, json!({"success": false, "error": "Not signed in"}));
}

#[tokio::test]
async fn invalid_token_is_refused() {
    let harness = Harness::new(Vec::new());
    let response = harness
        .send(json_request(Method::POST, "/api/auth/verify", None, json!({"idToken": "forged"})))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn sign_in_records_the_user_and_opens_pages() {
    let harness = Harness::new(Vec::new());
    let cookie = harness.sign_in().await;

    let user = harness.store.user(&UserId::new("uid-ada").unwrap()).unwrap().unwrap();
    assert_eq!(user.name, "Ada");

    let response = harness.send(empty_request(Method::GET, "/login", Some(&cookie))).await;
    assert_eq!(location(&response), "/dashboard");

    let response = harness.send(empty_request(Method::GET, "/create", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["username"], "Ada");
}

#[tokio::test]
async fn login_view_carries_the_client_config() {
    let harness = Harness::new(Vec::new());
    let response = harness.send(empty_request(Method::GET, "/signup", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let view = body_json(response).await;
    assert_eq!(view["page"], "signup");
    assert_eq!(view["identity_config"]["projectId"], "blog-test");
}

#[tokio::test]
async fn generate_stores_a_draft_and_points_to_drafts() {
    let harness = Harness::new(one_post("Programming"));
    let cookie = harness.sign_in().await;

    let response = harness
        .send(json_request(
            Method::POST,
            "/api/generate",
            Some(&cookie),
            json!({"prompt": "rust on the server"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_json(response).await, json!({"success": true, "redirect": "/drafts"}));

    assert_eq!(harness.store.count_blogs(Some(BlogStatus::Draft)).await.unwrap(), 1);

    let response = harness.send(empty_request(Method::GET, "/drafts", Some(&cookie))).await;
    let queue = body_json(response).await;
    assert_eq!(queue["total"], 1);
    assert_eq!(queue["current_page"], 1);
    assert_eq!(queue["has_next"], false);
    assert_eq!(queue["blogs"][0]["title"], "Rust On The Server");
}

#[tokio::test]
async fn blank_prompt_is_a_bad_request() {
    let harness = Harness::new(Vec::new());
    let cookie = harness.sign_in().await;
    let response = harness
        .send(json_request(Method::POST, "/api/generate", Some(&cookie), json!({"prompt": "   "})))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Prompt is required");
}

#[tokio::test]
async fn failed_generation_is_a_server_error() {
    let harness = Harness::new(vec![String::new()]);
    let cookie = harness.sign_in().await;
    let response = harness
        .send(json_request(Method::POST, "/api/generate", Some(&cookie), json!({"prompt": "Rust"})))
        .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["success"], false);
    assert_eq!(harness.store.count_blogs(None).await.unwrap(), 0);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let harness = Harness::new(Vec::new());
    let cookie = harness.sign_in().await;
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/generate")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, &cookie)
        .body(Body::from("{not json"))
        .unwrap();
    let response = harness.send(request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn review_flow_and_unknown_actions() {
    let harness = Harness::new(one_post("Tech"));
    let cookie = harness.sign_in().await;
    let response = harness
        .send(json_request(
            Method::POST,
            "/api/generate",
            Some(&cookie),
            json!({"prompt": "rust", "auto_submit": true}),
        ))
        .await;
    assert_eq!(body_json(response).await["redirect"], "/approval");

    let queue = harness
        .store
        .page_by_status(BlogStatus::UnderReview, PageRequest::new(1, 10))
        .await
        .unwrap();
    let id = queue.items[0].id.clone();

    let response = harness
        .send(json_request(
            Method::POST,
            &format!("/api/review/{id}"),
            Some(&cookie),
            json!({"action": "archive"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(harness.store.get_blog(&id).await.unwrap().status, BlogStatus::UnderReview);

    let response = harness
        .send(json_request(
            Method::POST,
            &format!("/api/review/{id}"),
            Some(&cookie),
            json!({"action": "APPROVE", "notes": "Ship it"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let stored = harness.store.get_blog(&id).await.unwrap();
    assert_eq!(stored.status, BlogStatus::Published);
    assert_eq!(stored.admin.review_notes.as_deref(), Some("Ship it"));

    let feed = harness.store.recent_activity(1).await.unwrap();
    assert_eq!(feed[0].action_text, "approved for publication");
    assert_eq!(feed[0].user, "Ada");

    let response = harness
        .send(json_request(
            Method::POST,
            &format!("/api/update_status/{id}"),
            Some(&cookie),
            json!({"status": "DRAFT"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn submit_then_edit_returns_to_draft() {
    let harness = Harness::new(one_post("Tech"));
    let cookie = harness.sign_in().await;
    harness
        .send(json_request(Method::POST, "/api/generate", Some(&cookie), json!({"prompt": "rust"})))
        .await;
    let id = harness
        .store
        .paginated_drafts(1, 10)
        .await
        .unwrap()
        .items[0]
        .id
        .clone();

    let response = harness
        .send(empty_request(Method::POST, &format!("/api/submit_for_review/{id}"), Some(&cookie)))
        .await;
    assert_eq!(body_json(response).await["redirect"], "/dashboard");
    assert_eq!(harness.store.get_blog(&id).await.unwrap().status, BlogStatus::UnderReview);

    let response = harness
        .send(json_request(
            Method::POST,
            &format!("/api/update_content/{id}"),
            Some(&cookie),
            json!({"body": "Rewritten by hand."}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let stored = harness.store.get_blog(&id).await.unwrap();
    assert_eq!(stored.status, BlogStatus::Draft);
    assert_eq!(stored.content.body, "Rewritten by hand.");
}

#[tokio::test]
async fn editing_a_missing_blog_is_not_found() {
    let harness = Harness::new(Vec::new());
    let cookie = harness.sign_in().await;
    let response = harness
        .send(empty_request(Method::GET, "/edit/no-such-blog", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["success"], false);
}

#[tokio::test]
async fn deleting_a_blog_decrements_its_category() {
    let harness = Harness::new(one_post("Tech"));
    let cookie = harness.sign_in().await;
    harness
        .send(json_request(Method::POST, "/api/generate", Some(&cookie), json!({"prompt": "rust"})))
        .await;
    let categories = harness.store.list_categories().await.unwrap();
    assert_eq!(categories[0].count, 1);
    let id = harness.store.paginated_drafts(1, 10).await.unwrap().items[0].id.clone();

    let response = harness
        .send(empty_request(Method::DELETE, &format!("/api/delete_blog/{id}"), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(harness.store.count_blogs(None).await.unwrap(), 0);
    assert_eq!(harness.store.get_category(&categories[0].id).await.unwrap().count, 0);

    let response = harness
        .send(empty_request(Method::DELETE, &format!("/api/delete_blog/{id}"), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn category_rename_and_delete() {
    let harness = Harness::new(one_post("Tech"));
    let cookie = harness.sign_in().await;
    harness
        .send(json_request(Method::POST, "/api/generate", Some(&cookie), json!({"prompt": "rust"})))
        .await;
    let id = harness.store.list_categories().await.unwrap()[0].id.clone();

    let response = harness
        .send(json_request(
            Method::POST,
            &format!("/api/edit_category/{id}"),
            Some(&cookie),
            json!({"name": "  "}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Name is required");

    let response = harness
        .send(json_request(
            Method::POST,
            &format!("/api/edit_category/{id}"),
            Some(&cookie),
            json!({"name": "Engineering"}),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(harness.store.get_category(&id).await.unwrap().name.as_str(), "Engineering");

    let response = harness
        .send(empty_request(Method::DELETE, &format!("/api/delete_category/{id}"), Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(harness.store.list_categories().await.unwrap().is_empty());

    let missing = CategoryId::new("gone").unwrap();
    let response = harness
        .send(empty_request(
            Method::DELETE,
            &format!("/api/delete_category/{missing}"),
            Some(&cookie),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dashboard_counts_and_feed() {
    let harness = Harness::new(one_post("Tech"));
    let cookie = harness.sign_in().await;
    harness
        .send(json_request(Method::POST, "/api/generate", Some(&cookie), json!({"prompt": "rust"})))
        .await;

    let response = harness.send(empty_request(Method::GET, "/dashboard", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let view = body_json(response).await;
    assert_eq!(view["username"], "Ada");
    assert_eq!(view["total_blogs_count"], 1);
    assert_eq!(view["drafts_count"], 1);
    assert_eq!(view["pending_count"], 0);
    assert_eq!(view["categories_count"], 1);
    assert_eq!(view["recent_activity"][0]["type"], "generated");
    assert_eq!(view["recent_activity"][0]["time_ago"], "Just now");
}

#[tokio::test]
async fn unparsable_page_falls_back_to_the_first() {
    let harness = Harness::new(Vec::new());
    let cookie = harness.sign_in().await;
    let response = harness
        .send(empty_request(Method::GET, "/approval?page=abc", Some(&cookie)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let queue = body_json(response).await;
    assert_eq!(queue["current_page"], 1);
    assert_eq!(queue["total"], 0);
}

#[tokio::test]
async fn logout_clears_the_session() {
    let harness = Harness::new(Vec::new());
    let cookie = harness.sign_in().await;
    let response = harness.send(empty_request(Method::GET, "/logout", Some(&cookie))).await;
    assert_eq!(location(&response), "/login");
    let cleared = response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(cleared.starts_with("scriptly_session="));
}

#[tokio::test]
async fn connection_cap_is_shared_across_routes() {
    let model = Arc::new(HeldModel::default());
    let harness = Harness::with(
        model.clone(),
        ServerLimits {
            max_connections: 1,
            ..ServerLimits::default()
        },
    );
    let cookie = harness.sign_in().await;

    let app = harness.app.clone();
    let held = tokio::spawn(async move {
        app.oneshot(json_request(
            Method::POST,
            "/api/generate",
            Some(&cookie),
            json!({"prompt": "Rust"}),
        ))
        .await
        .unwrap()
    });
    model.entered.notified().await;

    let blocked = tokio::time::timeout(
        Duration::from_millis(200),
        harness.send(empty_request(Method::GET, "/login", None)),
    )
    .await;
    assert!(blocked.is_err(), "a second route was served past the cap");

    model.release.notify_one();
    assert_eq!(held.await.unwrap().status(), StatusCode::INTERNAL_SERVER_ERROR);
    let login = harness.send(empty_request(Method::GET, "/login", None)).await;
    assert_eq!(login.status(), StatusCode::OK);
}
