use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use nodes::{ApprovalAgent, DraftAgent, GenerateWorkflow};
use pipeline::{BlogStore, IdentityVerifier, LlmProvider};
use serde::{Deserialize, Serialize};

/// Browser-side identity configuration handed to the login and signup views.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub auth_domain: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub storage_bucket: String,
    #[serde(default)]
    pub messaging_sender_id: String,
    #[serde(default)]
    pub app_id: String,
}

/// Connection handling limits applied around the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerLimits {
    /// Requests served concurrently; further requests wait.
    pub max_connections: usize,
    /// A request body that sends nothing for this long is dropped.
    pub idle_timeout: Duration,
}

impl Default for ServerLimits {
    fn default() -> Self {
        Self {
            max_connections: 100,
            idle_timeout: Duration::from_secs(10),
        }
    }
}

/// Shared handles every handler receives. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BlogStore>,
    pub workflow: Arc<GenerateWorkflow>,
    pub drafts: DraftAgent,
    pub approvals: ApprovalAgent,
    pub identity: Arc<dyn IdentityVerifier>,
    pub client_config: Arc<ClientConfig>,
    key: Key,
}

impl AppState {
    pub fn new(
        store: Arc<dyn BlogStore>,
        provider: Arc<dyn LlmProvider>,
        identity: Arc<dyn IdentityVerifier>,
        key: Key,
        client_config: ClientConfig,
    ) -> Self {
        Self {
            workflow: Arc::new(GenerateWorkflow::new(provider, store.clone())),
            drafts: DraftAgent::new(store.clone()),
            approvals: ApprovalAgent::new(store.clone()),
            store,
            identity,
            client_config: Arc::new(client_config),
            key,
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.key.clone()
    }
}
