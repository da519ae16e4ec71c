//! Application state wiring for the `serve` command.
//!
//! Loads configuration, builds the provider, session store, event bus and
//! think service, and hands out the shared [`AppState`] the router needs.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use simulon_core::event::EventBus;
use simulon_core::think::{ThinkEngine, ThinkService};
use simulon_infra::config::{api_key_from_env, apply_env_overrides, load_config, resolve_data_dir};
use simulon_infra::llm::create_provider;
use simulon_infra::session::{InMemorySessionStore, spawn_expiry_sweeper};
use simulon_types::config::SimulonConfig;
use simulon_types::think::ThinkMode;

/// The think service pinned to the in-memory session store.
pub type ConcreteThinkService = ThinkService<InMemorySessionStore>;

/// Shared application state passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub think: Arc<ConcreteThinkService>,
    /// Mode used when a request does not name one.
    pub default_mode: ThinkMode,
}

impl AppState {
    pub fn new(think: ConcreteThinkService) -> Self {
        let default_mode = think.settings().default_mode;
        Self {
            think: Arc::new(think),
            default_mode,
        }
    }

    /// Resolve configuration and build the production service graph.
    pub async fn init() -> anyhow::Result<(Self, SimulonConfig)> {
        let data_dir: PathBuf = resolve_data_dir();
        let mut config = load_config(&data_dir).await;
        apply_env_overrides(&mut config);
        tracing::debug!(data_dir = %data_dir.display(), "configuration loaded");

        let api_key = api_key_from_env().context("the server needs an API key to call the model")?;
        let provider = Arc::new(create_provider(&config.provider, api_key));
        let engine = ThinkEngine::new(provider, &config.provider);

        let store = InMemorySessionStore::new(Duration::from_secs(config.sessions.ttl_secs));
        let service = ThinkService::new(engine, store, EventBus::default(), config.think.clone());

        Ok((Self::new(service), config))
    }

    /// Start the event logger and the session sweeper. Returns the sweeper,
    /// which stops when `shutdown` fires.
    pub fn spawn_background(&self, config: &SimulonConfig, shutdown: CancellationToken) -> JoinHandle<()> {
        simulon_observe::event_log::spawn_event_logger(self.think.events().subscribe());
        spawn_expiry_sweeper(
            self.think.sessions().clone(),
            Duration::from_secs(config.sessions.sweep_interval_secs.max(1)),
            shutdown,
        )
    }
}
