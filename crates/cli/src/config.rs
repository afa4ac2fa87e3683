//! `scriptly.toml` loading and validation.
//!
//! Every section is optional in the file. Secrets may instead come from the
//! environment, which overrides the file:
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `SCRIPTLY_SECRET_KEY` | `server.secret_key` |
//! | `GEMINI_API_KEY` | `llm.api_key` |
//! | `FIREBASE_API_KEY` | `identity.api_key` and `identity.client.apiKey` |
//! | `FIRESTORE_ACCESS_TOKEN` | `store.access_token` |
//! | `FIRESTORE_EMULATOR_HOST` | `store.base_url` (plain HTTP, no token) |

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use identity::IdentityToolkitConfig;
use llm::GeminiConfig;
use pipeline::ScriptlyError;
use serde::Deserialize;
use server::{ClientConfig, Key, ServerLimits};
use store::FirestoreConfig;

/// Shortest accepted cookie signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 64;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerSection,
    pub llm: LlmSection,
    pub store: StoreSection,
    pub identity: IdentitySection,
    pub telemetry: TelemetrySection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerSection {
    pub bind: String,
    /// Tokio worker threads; the runtime default when unset.
    pub worker_threads: Option<usize>,
    pub max_connections: usize,
    pub idle_timeout_secs: u64,
    /// Signs the session cookie. Sessions do not survive a restart without it.
    pub secret_key: Option<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        let limits = ServerLimits::default();
        Self {
            bind: "127.0.0.1:3000".to_string(),
            worker_threads: None,
            max_connections: limits.max_connections,
            idle_timeout_secs: limits.idle_timeout.as_secs(),
            secret_key: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LlmSection {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: llm::DEFAULT_MODEL.to_string(),
            base_url: llm::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local collections, lost on exit.
    #[default]
    Memory,
    Firestore,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    pub backend: StoreBackend,
    pub project_id: String,
    pub database: String,
    pub base_url: String,
    pub access_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            project_id: String::new(),
            database: store::firestore::DEFAULT_DATABASE.to_string(),
            base_url: store::firestore::DEFAULT_BASE_URL.to_string(),
            access_token: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentitySection {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Handed to the browser on the login and signup views.
    pub client: ClientConfig,
}

impl Default for IdentitySection {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: identity::DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            client: ClientConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetrySection {
    pub log_format: LogFormat,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// OTLP gRPC collector; spans are exported only when set.
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

impl Default for TelemetrySection {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Json,
            log_filter: "info".to_string(),
            otlp_endpoint: None,
            service_name: "scriptly".to_string(),
        }
    }
}

impl Config {
    /// Reads `path` (defaults when the file does not exist), applies the
    /// process environment and validates.
    pub fn load(path: &Path) -> Result<Self, ScriptlyError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(err) => {
                return Err(ScriptlyError::config(format!(
                    "cannot read {}: {err}",
                    path.display()
                )))
            }
        };
        Self::parse(&text, |name| std::env::var(name).ok())
    }

    /// Parses `text`, applies overrides from `env` and validates.
    pub fn parse(text: &str, env: impl Fn(&str) -> Option<String>) -> Result<Self, ScriptlyError> {
        let mut config: Config =
            toml::from_str(text).map_err(|e| ScriptlyError::config(e.to_string()))?;
        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        if let Some(secret) = var("SCRIPTLY_SECRET_KEY") {
            self.server.secret_key = Some(secret);
        }
        if let Some(key) = var("GEMINI_API_KEY") {
            self.llm.api_key = key;
        }
        if let Some(key) = var("FIREBASE_API_KEY") {
            self.identity.client.api_key = key.clone();
            self.identity.api_key = key;
        }
        if let Some(token) = var("FIRESTORE_ACCESS_TOKEN") {
            self.store.access_token = Some(token);
        }
        if let Some(host) = var("FIRESTORE_EMULATOR_HOST") {
            self.store.base_url = format!("http://{host}");
            self.store.access_token = None;
        }
    }

    fn validate(&self) -> Result<(), ScriptlyError> {
        self.bind_addr()?;
        if self.server.max_connections == 0 {
            return Err(ScriptlyError::config("server.max_connections must be at least 1"));
        }
        if self.server.worker_threads == Some(0) {
            return Err(ScriptlyError::config("server.worker_threads must be at least 1"));
        }
        if let Some(secret) = &self.server.secret_key {
            if secret.len() < MIN_SECRET_LEN {
                return Err(ScriptlyError::config(format!(
                    "server.secret_key must be at least {MIN_SECRET_LEN} bytes"
                )));
            }
        }
        if self.store.backend == StoreBackend::Firestore && self.store.project_id.trim().is_empty() {
            return Err(ScriptlyError::config(
                "store.project_id is required for the firestore backend",
            ));
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ScriptlyError> {
        self.server
            .bind
            .parse()
            .map_err(|e| ScriptlyError::config(format!("server.bind {:?}: {e}", self.server.bind)))
    }

    pub fn limits(&self) -> ServerLimits {
        ServerLimits {
            max_connections: self.server.max_connections,
            idle_timeout: Duration::from_secs(self.server.idle_timeout_secs),
        }
    }

    /// The cookie signing key, or `None` when no secret is configured.
    pub fn session_key(&self) -> Result<Option<Key>, ScriptlyError> {
        self.server
            .secret_key
            .as_deref()
            .map(|secret| {
                Key::try_from(secret.as_bytes())
                    .map_err(|e| ScriptlyError::config(format!("server.secret_key: {e}")))
            })
            .transpose()
    }

    pub fn gemini(&self) -> Result<GeminiConfig, ScriptlyError> {
        if self.llm.api_key.trim().is_empty() {
            return Err(ScriptlyError::config(
                "llm.api_key (or GEMINI_API_KEY) is required",
            ));
        }
        Ok(GeminiConfig {
            api_key: self.llm.api_key.clone(),
            model: self.llm.model.clone(),
            base_url: self.llm.base_url.clone(),
            timeout: Duration::from_secs(self.llm.timeout_secs),
            temperature: None,
        })
    }

    pub fn firestore(&self) -> FirestoreConfig {
        FirestoreConfig {
            project_id: self.store.project_id.clone(),
            database: self.store.database.clone(),
            base_url: self.store.base_url.clone(),
            access_token: self.store.access_token.clone(),
            timeout: Duration::from_secs(self.store.timeout_secs),
        }
    }

    pub fn identity(&self) -> Result<IdentityToolkitConfig, ScriptlyError> {
        if self.identity.api_key.trim().is_empty() {
            return Err(ScriptlyError::config(
                "identity.api_key (or FIREBASE_API_KEY) is required",
            ));
        }
        Ok(IdentityToolkitConfig {
            api_key: self.identity.api_key.clone(),
            base_url: self.identity.base_url.clone(),
            timeout: Duration::from_secs(self.identity.timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("", no_env).unwrap();
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.llm.model, llm::DEFAULT_MODEL);
        assert_eq!(config.limits(), ServerLimits::default());
        assert_eq!(config.telemetry.log_format, LogFormat::Json);
        assert!(config.session_key().unwrap().is_none());
    }

    #[test]
    fn full_file_is_read() {
        let text = r#"
            [server]
            bind = "0.0.0.0:8080"
            worker_threads = 4
            max_connections = 20
            idle_timeout_secs = 5

            [llm]
            api_key = "gem"
            model = "gemini-test"

            [store]
            backend = "firestore"
            project_id = "blog-prod"

            [identity]
            api_key = "fire"

            [identity.client]
            authDomain = "blog-prod.firebaseapp.com"

            [telemetry]
            log_format = "pretty"
            otlp_endpoint = "http://collector:4317"
        "#;
        let config = Config::parse(text, no_env).unwrap();
        assert_eq!(config.bind_addr().unwrap().port(), 8080);
        assert_eq!(config.server.worker_threads, Some(4));
        assert_eq!(config.limits().idle_timeout, Duration::from_secs(5));
        assert_eq!(config.gemini().unwrap().model, "gemini-test");
        assert_eq!(config.firestore().project_id, "blog-prod");
        assert_eq!(config.identity.client.auth_domain, "blog-prod.firebaseapp.com");
        assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    }

    #[test]
    fn environment_overrides_file() {
        let text = "[llm]\napi_key = \"from-file\"\n";
        let env = env_of(&[
            ("GEMINI_API_KEY", "from-env"),
            ("FIREBASE_API_KEY", "web-key"),
            ("FIRESTORE_ACCESS_TOKEN", "token"),
        ]);
        let config = Config::parse(text, env).unwrap();
        assert_eq!(config.llm.api_key, "from-env");
        assert_eq!(config.identity().unwrap().api_key, "web-key");
        assert_eq!(config.identity.client.api_key, "web-key");
        assert_eq!(config.firestore().access_token.as_deref(), Some("token"));
    }

    #[test]
    fn emulator_host_drops_the_token() {
        let env = env_of(&[
            ("FIRESTORE_ACCESS_TOKEN", "token"),
            ("FIRESTORE_EMULATOR_HOST", "localhost:8081"),
        ]);
        let config = Config::parse("", env).unwrap();
        let firestore = config.firestore();
        assert_eq!(firestore.base_url, "http://localhost:8081");
        assert_eq!(firestore.access_token, None);
    }

    #[test]
    fn short_secret_is_rejected() {
        let err = Config::parse("", env_of(&[("SCRIPTLY_SECRET_KEY", "short")])).unwrap_err();
        assert!(matches!(err, ScriptlyError::ConfigurationError { .. }));
    }

    #[test]
    fn long_secret_yields_a_key() {
        let secret = "s".repeat(MIN_SECRET_LEN);
        let config = Config::parse("", env_of(&[("SCRIPTLY_SECRET_KEY", secret.as_str())])).unwrap();
        assert!(config.session_key().unwrap().is_some());
    }

    #[test]
    fn firestore_requires_a_project() {
        let err = Config::parse("[store]\nbackend = \"firestore\"\n", no_env).unwrap_err();
        assert!(err.to_string().contains("store.project_id"));
    }

    #[test]
    fn unknown_backend_and_fields_are_rejected() {
        assert!(Config::parse("[store]\nbackend = \"sqlite\"\n", no_env).is_err());
        assert!(Config::parse("[server]\nport = 80\n", no_env).is_err());
    }

    #[test]
    fn bad_bind_address_is_rejected() {
        assert!(Config::parse("[server]\nbind = \"localhost\"\n", no_env).is_err());
    }

    #[test]
    fn missing_keys_are_reported_when_needed() {
        let config = Config::parse("", no_env).unwrap();
        assert!(config.gemini().is_err());
        assert!(config.identity().is_err());
    }
}
