//! Scriptly entry point.
//!
//! This binary is the composition root. It:
//!
//! 1. **Parses configuration** from `scriptly.toml` and the environment.
//! 2. **Wires observability**: `tracing-subscriber` with a JSON or pretty
//!    formatter and, when configured, an OpenTelemetry OTLP exporter.
//! 3. **Constructs infrastructure**: the store backend, the Gemini provider
//!    and the identity verifier, injected into the server state.
//! 4. **Runs a command**: `serve` starts the HTTP server; `verify` checks the
//!    store and the generation pipeline end to end.

mod config;
mod telemetry;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use identity::IdentityToolkitVerifier;
use llm::GeminiProvider;
use nodes::{GenerateRequest, GenerateWorkflow};
use pipeline::{BlogStore, UserId};
use server::{AppState, Key};
use store::{FirestoreStore, MemoryStore};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::{Config, StoreBackend};

#[derive(Debug, Parser)]
#[command(name = "scriptly", version, about = "AI-assisted blog content admin")]
struct Cli {
    /// Configuration file; defaults apply when it does not exist.
    #[arg(long, short, global = true, default_value = "scriptly.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the admin HTTP server.
    Serve,
    /// Check the store and the generation pipeline, writing one draft.
    Verify {
        #[arg(long, default_value = "Why Rust for web services")]
        topic: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(threads) = config.server.worker_threads {
        builder.worker_threads(threads);
    }
    let runtime = builder.build().context("failed to build the Tokio runtime")?;

    runtime.block_on(async move {
        let telemetry = telemetry::init(&config.telemetry)?;
        let result = match cli.command {
            Command::Serve => serve(config).await,
            Command::Verify { topic } => verify(config, &topic).await,
        };
        telemetry.shutdown();
        result
    })
}

fn build_store(config: &Config) -> anyhow::Result<Arc<dyn BlogStore>> {
    let store: Arc<dyn BlogStore> = match config.store.backend {
        StoreBackend::Memory => {
            warn!("using the in-memory store; content is lost on exit");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Firestore => {
            let firestore = config.firestore();
            info!(project = %firestore.project_id, base_url = %firestore.base_url, "using Firestore");
            Arc::new(FirestoreStore::new(&firestore).context("failed to build the Firestore client")?)
        }
    };
    Ok(store)
}

fn build_provider(config: &Config) -> anyhow::Result<Arc<GeminiProvider>> {
    let provider = GeminiProvider::new(config.gemini()?).context("failed to build the Gemini client")?;
    Ok(Arc::new(provider))
}

async fn serve(config: Config) -> anyhow::Result<()> {
    let store = build_store(&config)?;
    let provider = build_provider(&config)?;
    let identity = IdentityToolkitVerifier::new(config.identity()?)
        .context("failed to build the identity client")?;
    let key = match config.session_key()? {
        Some(key) => key,
        None => {
            warn!("server.secret_key is unset; sessions end when the server restarts");
            Key::generate()
        }
    };

    let state = AppState::new(
        store,
        provider,
        Arc::new(identity),
        key,
        config.identity.client.clone(),
    );
    let router = server::router(state, config.limits());

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    server::serve(listener, router, server::shutdown_signal())
        .await
        .context("server error")?;
    info!("server stopped");
    Ok(())
}

/// Runs each setup step in turn, printing its outcome.
async fn verify(config: Config, topic: &str) -> anyhow::Result<()> {
    let store = build_store(&config)?;
    let total = store
        .count_blogs(None)
        .await
        .context("store check failed")?;
    println!("store: ok ({total} blogs)");

    let provider = build_provider(&config)?;
    println!("llm: configured ({})", config.llm.model);

    let workflow = GenerateWorkflow::new(provider, store.clone());
    let outcome = workflow
        .generate(GenerateRequest {
            prompt: topic.to_string(),
            auto_submit: false,
            author_id: UserId::new("scriptly-verify").context("author id")?,
            actor: "Setup check".to_string(),
        })
        .await
        .context("generation check failed")?;
    println!(
        "pipeline: ok, stored draft {} \"{}\" in {}",
        outcome.blog_id, outcome.title, outcome.category
    );

    let stored = store
        .get_blog(&outcome.blog_id)
        .await
        .context("reading the draft back failed")?;
    let words = stored.metadata.map_or(0, |m| m.word_count);
    println!("store: read back \"{}\" ({words} words)", stored.title);
    Ok(())
}
