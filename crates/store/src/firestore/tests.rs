use std::time::Duration;

use pipeline::{AdminReview, BlogContent, UserId};
use serde_json::{json, Value as Json};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use super::*;

const ROOT: &str = "/v1/projects/demo/databases/test-db/documents";

fn store(server: &MockServer) -> FirestoreStore {
    FirestoreStore::new(&FirestoreConfig {
        project_id: "demo".into(),
        database: "test-db".into(),
        base_url: server.uri(),
        access_token: Some("token-1".into()),
        timeout: Duration::from_secs(5),
    })
    .unwrap()
}

async fn respond(server: &MockServer, verb: &str, at: String, response: ResponseTemplate) {
    Mock::given(method(verb))
        .and(path(at))
        .respond_with(response)
        .mount(server)
        .await;
}

fn ok(body: Json) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

async fn requests_to(server: &MockServer, suffix: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|r| r.url.path().ends_with(suffix))
        .collect()
}

fn json_body(request: &Request) -> Json {
    serde_json::from_slice(&request.body).unwrap()
}

fn blog_doc(id: &str, category: Option<&str>) -> Json {
    json!({
        "name": format!("projects/demo/databases/test-db/documents/blogs/{id}"),
        "fields": {
            "title": {"stringValue": "Post"},
            "content": {"mapValue": {"fields": {"body": {"stringValue": "text"}}}},
            "status": {"stringValue": "DRAFT"},
            "author_id": {"stringValue": "uid-1"},
            "category": category.map_or(json!({"nullValue": null}), |c| json!({"stringValue": c})),
            "created_at": {"timestampValue": "2024-05-01T08:00:00Z"},
            "updated_at": {"timestampValue": "2024-05-01T09:00:00Z"}
        }
    })
}

fn category_doc(id: &str, name: &str, count: i64) -> Json {
    json!({
        "name": format!("projects/demo/databases/test-db/documents/categories/{id}"),
        "fields": {
            "name": {"stringValue": name},
            "count": {"integerValue": count.to_string()}
        }
    })
}

fn new_blog(category: Option<&str>) -> NewBlog {
    NewBlog {
        title: "Post".into(),
        content: BlogContent::from_body("text"),
        status: BlogStatus::Draft,
        author_id: UserId::new("uid-1").unwrap(),
        category: category.map(|c| CategoryName::new(c).unwrap()),
        admin: AdminReview::default(),
        outline: vec![],
        metadata: None,
    }
}

#[tokio::test]
async fn get_blog_decodes_and_sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{ROOT}/blogs/b1")))
        .and(header("authorization", "Bearer token-1"))
        .respond_with(ok(blog_doc("b1", Some("Tech"))))
        .mount(&server)
        .await;

    let blog = store(&server).get_blog(&BlogId::new("b1").unwrap()).await.unwrap();
    assert_eq!(blog.title, "Post");
    assert_eq!(blog.category.unwrap().as_str(), "Tech");
}

#[tokio::test]
async fn missing_blog_is_not_found() {
    let server = MockServer::start().await;
    respond(&server, "GET", format!("{ROOT}/blogs/gone"), ResponseTemplate::new(404)).await;

    let err = store(&server)
        .get_blog(&BlogId::new("gone").unwrap())
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::not_found(BLOGS, "gone"));
}

#[tokio::test]
async fn server_errors_are_unavailable() {
    let server = MockServer::start().await;
    respond(&server, "POST", format!("{ROOT}:runAggregationQuery"), ResponseTemplate::new(503)).await;

    let err = store(&server).count_blogs(None).await.unwrap_err();
    assert!(matches!(err, StoreError::Unavailable(_)));
}

#[tokio::test]
async fn create_with_new_category_commits_both_writes_in_one_transaction() {
    let server = MockServer::start().await;
    respond(&server, "POST", format!("{ROOT}:beginTransaction"), ok(json!({"transaction": "tx-1"}))).await;
    respond(&server, "POST", format!("{ROOT}:runQuery"), ok(json!([{"readTime": "2024-05-01T08:00:00Z"}]))).await;
    respond(&server, "POST", format!("{ROOT}:commit"), ok(json!({"writeResults": []}))).await;

    let id = store(&server).create_blog(new_blog(Some("Tech"))).await.unwrap();

    let query = json_body(&requests_to(&server, ":runQuery").await[0]);
    assert_eq!(query["transaction"], "tx-1");

    let commit = json_body(&requests_to(&server, ":commit").await[0]);
    assert_eq!(commit["transaction"], "tx-1");
    let writes = commit["writes"].as_array().unwrap();
    assert_eq!(writes.len(), 2);
    assert!(writes[0]["update"]["name"].as_str().unwrap().ends_with(&format!("/blogs/{id}")));
    assert_eq!(writes[0]["currentDocument"]["exists"], false);
    assert_eq!(writes[1]["update"]["fields"]["name"]["stringValue"], "Tech");
    assert_eq!(writes[1]["update"]["fields"]["count"]["integerValue"], "1");
}

#[tokio::test]
async fn create_with_existing_category_increments_it() {
    let server = MockServer::start().await;
    respond(&server, "POST", format!("{ROOT}:beginTransaction"), ok(json!({"transaction": "tx-2"}))).await;
    respond(&server, "POST", format!("{ROOT}:runQuery"), ok(json!([{"document": category_doc("c1", "Tech", 3)}]))).await;
    respond(&server, "POST", format!("{ROOT}:commit"), ok(json!({}))).await;

    store(&server).create_blog(new_blog(Some("Tech"))).await.unwrap();

    let commit = json_body(&requests_to(&server, ":commit").await[0]);
    let transform = &commit["writes"][1]["transform"];
    assert!(transform["document"].as_str().unwrap().ends_with("/categories/c1"));
    assert_eq!(transform["fieldTransforms"][0]["increment"]["integerValue"], "1");
}

#[tokio::test]
async fn create_without_category_skips_the_transaction() {
    let server = MockServer::start().await;
    respond(&server, "POST", format!("{ROOT}:commit"), ok(json!({}))).await;

    store(&server).create_blog(new_blog(None)).await.unwrap();

    assert!(requests_to(&server, ":beginTransaction").await.is_empty());
    let commit = json_body(&requests_to(&server, ":commit").await[0]);
    assert!(commit.get("transaction").is_none());
}

#[tokio::test]
async fn delete_decrements_category_and_deletes_blog() {
    let server = MockServer::start().await;
    respond(&server, "POST", format!("{ROOT}:beginTransaction"), ok(json!({"transaction": "tx-3"}))).await;
    respond(&server, "GET", format!("{ROOT}/blogs/b1"), ok(blog_doc("b1", Some("Tech")))).await;
    respond(&server, "POST", format!("{ROOT}:runQuery"), ok(json!([{"document": category_doc("c1", "Tech", 3)}]))).await;
    respond(&server, "POST", format!("{ROOT}:commit"), ok(json!({}))).await;

    store(&server).delete_blog(&BlogId::new("b1").unwrap()).await.unwrap();

    let read = &requests_to(&server, "/blogs/b1").await[0];
    assert_eq!(read.url.query(), Some("transaction=tx-3"));

    let commit = json_body(&requests_to(&server, ":commit").await[0]);
    let writes = commit["writes"].as_array().unwrap();
    assert_eq!(writes[0]["transform"]["fieldTransforms"][0]["increment"]["integerValue"], "-1");
    assert!(writes[1]["delete"].as_str().unwrap().ends_with("/blogs/b1"));
}

#[tokio::test]
async fn deleting_a_missing_blog_rolls_back() {
    let server = MockServer::start().await;
    respond(&server, "POST", format!("{ROOT}:beginTransaction"), ok(json!({"transaction": "tx-4"}))).await;
    respond(&server, "GET", format!("{ROOT}/blogs/gone"), ResponseTemplate::new(404)).await;
    respond(&server, "POST", format!("{ROOT}:rollback"), ok(json!({}))).await;

    let err = store(&server)
        .delete_blog(&BlogId::new("gone").unwrap())
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(json_body(&requests_to(&server, ":rollback").await[0]), json!({"transaction": "tx-4"}));
    assert!(requests_to(&server, ":commit").await.is_empty());
}

#[tokio::test]
async fn page_queries_items_and_total() {
    let server = MockServer::start().await;
    respond(
        &server,
        "POST",
        format!("{ROOT}:runQuery"),
        ok(json!([{"document": blog_doc("b11", None)}, {"document": blog_doc("b12", None)}])),
    )
    .await;
    respond(
        &server,
        "POST",
        format!("{ROOT}:runAggregationQuery"),
        ok(json!([{"result": {"aggregateFields": {"total": {"integerValue": "25"}}}}])),
    )
    .await;

    let page = store(&server).paginated_drafts(2, 10).await.unwrap();
    assert_eq!(page.total, 25);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.page, 2);

    let query = json_body(&requests_to(&server, ":runQuery").await[0]);
    assert_eq!(query["structuredQuery"]["offset"], 10);
    assert_eq!(query["structuredQuery"]["limit"], 10);
    assert_eq!(query["structuredQuery"]["orderBy"][0]["direction"], "DESCENDING");
}

#[tokio::test]
async fn page_past_the_int32_offset_is_empty_with_the_real_total() {
    let server = MockServer::start().await;
    respond(
        &server,
        "POST",
        format!("{ROOT}:runAggregationQuery"),
        ok(json!([{"result": {"aggregateFields": {"total": {"integerValue": "25"}}}}])),
    )
    .await;
    Mock::given(method("POST"))
        .and(path(format!("{ROOT}:runQuery")))
        .respond_with(ResponseTemplate::new(400))
        .expect(0)
        .mount(&server)
        .await;

    let page = store(&server)
        .page_by_status(BlogStatus::Draft, PageRequest::new(300_000_000, 10))
        .await
        .unwrap();
    assert!(page.items.is_empty());
    assert_eq!(page.total, 25);
    assert_eq!(page.page, 300_000_000);
}

#[tokio::test]
async fn status_update_masks_written_fields() {
    let server = MockServer::start().await;
    respond(&server, "PATCH", format!("{ROOT}/blogs/b1"), ok(blog_doc("b1", None))).await;

    let update = StatusUpdate {
        status: BlogStatus::Published,
        admin: Some(AdminReview::default()),
        updated_at: Timestamp::now(),
    };
    store(&server)
        .update_status(&BlogId::new("b1").unwrap(), &update)
        .await
        .unwrap();

    let patch = &requests_to(&server, "/blogs/b1").await[0];
    let query = patch.url.query().unwrap();
    for field in ["admin", "status", "updated_at"] {
        assert!(query.contains(&format!("updateMask.fieldPaths={field}")), "{query}");
    }
    assert!(query.contains("currentDocument.exists=true"));
}

#[tokio::test]
async fn renaming_a_missing_category_is_not_found() {
    let server = MockServer::start().await;
    respond(&server, "PATCH", format!("{ROOT}/categories/c9"), ResponseTemplate::new(404)).await;

    let err = store(&server)
        .rename_category(&CategoryId::new("c9").unwrap(), &CategoryName::new("Ops").unwrap())
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::not_found(CATEGORIES, "c9"));
}

#[tokio::test]
async fn user_upsert_has_no_existence_precondition() {
    let server = MockServer::start().await;
    respond(&server, "PATCH", format!("{ROOT}/users/uid-1"), ok(json!({}))).await;

    let profile = UserProfile {
        uid: UserId::new("uid-1").unwrap(),
        name: "Ada".into(),
        email: Some("ada@example.com".into()),
        picture: None,
        last_login: Timestamp::now(),
    };
    store(&server).upsert_user(&profile).await.unwrap();

    let patch = &requests_to(&server, "/users/uid-1").await[0];
    assert!(!patch.url.query().unwrap().contains("currentDocument"));
    assert_eq!(json_body(patch)["fields"]["email"]["stringValue"], "ada@example.com");
}
