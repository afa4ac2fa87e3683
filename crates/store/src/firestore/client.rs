//! Thin typed wrapper over the Firestore REST v1 endpoints the store uses.

use std::time::Duration;

use pipeline::StoreError;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::documents::Document;
use super::query::{
    RunAggregationItem, RunAggregationRequest, RunQueryItem, RunQueryRequest, StructuredQuery,
    COUNT_ALIAS,
};
use super::value::{Fields, Value};

pub const DEFAULT_BASE_URL: &str = "https://firestore.googleapis.com";
pub const DEFAULT_DATABASE: &str = "(default)";

/// Connection settings for [`super::FirestoreStore`].
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    pub project_id: String,
    pub database: String,
    /// API root, e.g. `https://firestore.googleapis.com` or an emulator's
    /// `http://localhost:8080`.
    pub base_url: String,
    /// OAuth bearer token. `None` for the emulator.
    pub access_token: Option<String>,
    pub timeout: Duration,
}

impl FirestoreConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database: DEFAULT_DATABASE.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            access_token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

// -- Writes -----------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    #[serde(skip_serializing_if = "Option::is_none")]
    update: Option<WriteDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delete: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transform: Option<DocumentTransform>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    update_transforms: Vec<FieldTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_document: Option<Precondition>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct WriteDocument {
    name: String,
    fields: Fields,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentTransform {
    document: String,
    field_transforms: Vec<FieldTransform>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldTransform {
    field_path: String,
    #[serde(flatten)]
    kind: TransformKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
enum TransformKind {
    Increment(Value),
    SetToServerValue(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct Precondition {
    exists: bool,
}

impl Write {
    fn empty() -> Self {
        Self {
            update: None,
            delete: None,
            transform: None,
            update_transforms: Vec::new(),
            current_document: None,
        }
    }

    /// Creates `name`; fails the whole commit if it already exists.
    pub fn create(name: String, fields: Fields) -> Self {
        Self {
            update: Some(WriteDocument { name, fields }),
            current_document: Some(Precondition { exists: false }),
            ..Self::empty()
        }
    }

    /// Deletes `name`; fails the whole commit if it does not exist.
    pub fn delete(name: String) -> Self {
        Self {
            delete: Some(name),
            current_document: Some(Precondition { exists: true }),
            ..Self::empty()
        }
    }

    /// Atomically adds `by` to the numeric `field` of `name`.
    pub fn increment(name: String, field: &str, by: i64) -> Self {
        Self {
            transform: Some(DocumentTransform {
                document: name,
                field_transforms: vec![FieldTransform {
                    field_path: field.to_string(),
                    kind: TransformKind::Increment(Value::IntegerValue(by)),
                }],
            }),
            ..Self::empty()
        }
    }

    /// Stamps `field` with the commit time. Only valid on `create` writes.
    pub fn with_server_time(mut self, field: &str) -> Self {
        self.update_transforms.push(FieldTransform {
            field_path: field.to_string(),
            kind: TransformKind::SetToServerValue("REQUEST_TIME"),
        });
        self
    }
}

#[derive(Serialize)]
struct CommitRequest<'a> {
    writes: &'a [Write],
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction: Option<&'a str>,
}

#[derive(Deserialize)]
struct TransactionResponse {
    transaction: String,
}

#[derive(Serialize)]
struct RollbackRequest<'a> {
    transaction: &'a str,
}

// -- Client -----------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct FirestoreClient {
    http: Client,
    /// `projects/{p}/databases/{d}/documents`
    root: String,
    base_url: String,
    access_token: Option<String>,
}

fn transport(err: reqwest::Error) -> StoreError {
    StoreError::Unavailable(err.to_string())
}

fn status_error(status: StatusCode, body: &str) -> StoreError {
    let message = format!("HTTP {}: {}", status.as_u16(), body.trim());
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        StoreError::Unavailable(message)
    } else {
        StoreError::Rejected(message)
    }
}

impl FirestoreClient {
    pub fn new(config: &FirestoreConfig) -> Result<Self, StoreError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(format!("could not build HTTP client: {e}")))?;
        Ok(Self {
            http,
            root: format!(
                "projects/{}/databases/{}/documents",
                config.project_id, config.database
            ),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
        })
    }

    /// Full resource name of a document.
    pub fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.root)
    }

    fn url(&self, suffix: &str) -> String {
        format!("{}/v1/{}{suffix}", self.base_url, self.root)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, StoreError> {
        self.authorized(request).send().await.map_err(transport)
    }

    async fn expect_success(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, StoreError> {
        let response = Self::expect_success(response).await?;
        response
            .json()
            .await
            .map_err(|e| StoreError::Codec(format!("unexpected Firestore response: {e}")))
    }

    /// Reads one document; `None` when it does not exist.
    pub async fn get(
        &self,
        collection: &str,
        id: &str,
        transaction: Option<&str>,
    ) -> Result<Option<Document>, StoreError> {
        let mut request = self.http.get(self.url(&format!("/{collection}/{id}")));
        if let Some(tx) = transaction {
            request = request.query(&[("transaction", tx)]);
        }
        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::json(response).await.map(Some)
    }

    /// Writes the fields named in `mask`, leaving the rest of the document
    /// alone. With `must_exist` a missing document is
    /// [`StoreError::NotFound`]; without it the document is created.
    pub async fn patch(
        &self,
        collection: &'static str,
        id: &str,
        fields: Fields,
        mask: &[&str],
        must_exist: bool,
    ) -> Result<(), StoreError> {
        let mut params: Vec<(&str, &str)> =
            mask.iter().map(|path| ("updateMask.fieldPaths", *path)).collect();
        if must_exist {
            params.push(("currentDocument.exists", "true"));
        }
        let request = self
            .http
            .patch(self.url(&format!("/{collection}/{id}")))
            .query(&params)
            .json(&serde_json::json!({ "fields": fields }));
        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::not_found(collection, id));
        }
        Self::expect_success(response).await.map(|_| ())
    }

    /// Deletes a document that must exist.
    pub async fn delete(&self, collection: &'static str, id: &str) -> Result<(), StoreError> {
        let request = self
            .http
            .delete(self.url(&format!("/{collection}/{id}")))
            .query(&[("currentDocument.exists", "true")]);
        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::not_found(collection, id));
        }
        Self::expect_success(response).await.map(|_| ())
    }

    pub async fn run_query(
        &self,
        query: &StructuredQuery,
        transaction: Option<&str>,
    ) -> Result<Vec<Document>, StoreError> {
        let body = RunQueryRequest {
            structured_query: query,
            transaction,
        };
        let response = self
            .send(self.http.post(self.url(":runQuery")).json(&body))
            .await?;
        let items: Vec<RunQueryItem> = Self::json(response).await?;
        Ok(items.into_iter().filter_map(|item| item.document).collect())
    }

    pub async fn count(&self, query: &StructuredQuery) -> Result<u64, StoreError> {
        let response = self
            .send(
                self.http
                    .post(self.url(":runAggregationQuery"))
                    .json(&RunAggregationRequest::count(query)),
            )
            .await?;
        let items: Vec<RunAggregationItem> = Self::json(response).await?;
        let total = items
            .into_iter()
            .find_map(|item| item.result)
            .and_then(|result| result.aggregate_fields.get(COUNT_ALIAS).cloned());
        match total {
            Some(Value::IntegerValue(n)) => Ok(u64::try_from(n).unwrap_or(0)),
            other => Err(StoreError::Codec(format!("count aggregation returned {other:?}"))),
        }
    }

    pub async fn begin_transaction(&self) -> Result<String, StoreError> {
        let response = self
            .send(
                self.http
                    .post(self.url(":beginTransaction"))
                    .json(&serde_json::json!({})),
            )
            .await?;
        let body: TransactionResponse = Self::json(response).await?;
        debug!("transaction started");
        Ok(body.transaction)
    }

    /// Applies `writes` atomically, inside `transaction` when given.
    pub async fn commit(&self, writes: &[Write], transaction: Option<&str>) -> Result<(), StoreError> {
        let body = CommitRequest { writes, transaction };
        let response = self
            .send(self.http.post(self.url(":commit")).json(&body))
            .await?;
        Self::expect_success(response).await.map(|_| ())
    }

    /// Releases a transaction that will not be committed. Failures are only
    /// logged; the server expires abandoned transactions anyway.
    pub async fn rollback(&self, transaction: &str) {
        let request = self
            .http
            .post(self.url(":rollback"))
            .json(&RollbackRequest { transaction });
        let result = match self.send(request).await {
            Ok(response) => Self::expect_success(response).await.map(|_| ()),
            Err(err) => Err(err),
        };
        if let Err(err) = result {
            warn!(error = %err, "transaction rollback failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_write_with_server_timestamps() {
        let write = Write::create("projects/p/databases/d/documents/blogs/b1".into(), Fields::new())
            .with_server_time("created_at");
        assert_eq!(
            serde_json::to_value(&write).unwrap(),
            json!({
                "update": {"name": "projects/p/databases/d/documents/blogs/b1", "fields": {}},
                "updateTransforms": [{"fieldPath": "created_at", "setToServerValue": "REQUEST_TIME"}],
                "currentDocument": {"exists": false}
            })
        );
    }

    #[test]
    fn increment_write_shape() {
        let write = Write::increment("doc".into(), "count", -1);
        assert_eq!(
            serde_json::to_value(&write).unwrap(),
            json!({"transform": {
                "document": "doc",
                "fieldTransforms": [{"fieldPath": "count", "increment": {"integerValue": "-1"}}]
            }})
        );
    }

    #[test]
    fn server_errors_are_unavailable_and_client_errors_rejected() {
        assert!(matches!(
            status_error(StatusCode::SERVICE_UNAVAILABLE, "down"),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            status_error(StatusCode::CONFLICT, "ABORTED"),
            StoreError::Rejected(_)
        ));
    }
}
