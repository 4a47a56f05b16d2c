//! Writing Assistant server entry point.

use std::sync::Arc;

use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use tracing_subscriber::EnvFilter;

use writing_assistant::adapters::ai::{
    AnthropicClient, AnthropicConfig, MockLlmClient, RetryPolicy, RetryingLlmClient, UsageLedger,
};
use writing_assistant::adapters::http::{app_router, WritingAppState};
use writing_assistant::adapters::postgres::PostgresResultStore;
use writing_assistant::adapters::storage::InMemoryResultStore;
use writing_assistant::adapters::tools::build_tool_registry;
use writing_assistant::application::{AssistWritingHandler, AssistantSettings};
use writing_assistant::config::{
    AppConfig, LlmConfig, LlmProvider, PersistenceBackend, PersistenceConfig,
};
use writing_assistant::ports::{LlmClient, ResultStore, UsageRecorder};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config);
    config.validate().context("Invalid configuration")?;

    let registry = build_tool_registry(
        config.tools.include_builtin,
        config.tools.definitions_path.as_deref(),
    )
    .await
    .context("Failed to build tool registry")?;
    if !registry.contains(&config.tools.default_tool) {
        anyhow::bail!(
            "Default tool '{}' is not registered (available: {})",
            config.tools.default_tool,
            registry.tool_ids().join(", ")
        );
    }
    tracing::info!(tools = ?registry.tool_ids(), "Tool registry ready");

    let ledger = Arc::new(UsageLedger::new());
    let llm = llm_client(&config.llm, ledger.clone())?;
    let store = result_store(&config.persistence).await?;

    let settings = AssistantSettings::default()
        .with_llm_timeout(config.llm.timeout())
        .with_default_max_tokens(config.llm.max_tokens)
        .with_max_input_chars(config.tools.max_input_chars)
        .with_persistence_mode(config.persistence.mode)
        .with_persistence_budget(config.persistence.budget());

    let mut handler = AssistWritingHandler::new(Arc::new(registry), llm).with_settings(settings);
    if let Some(store) = &store {
        handler = handler.with_store(store.clone());
    }

    let usage: Arc<dyn UsageRecorder> = ledger;
    let state = WritingAppState {
        handler: Arc::new(handler),
        store,
        usage,
        default_tool: config.tools.default_tool.clone(),
    };
    let app = app_router(state, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, environment = ?config.server.environment, "Writing Assistant listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn llm_client(config: &LlmConfig, ledger: Arc<UsageLedger>) -> Result<Arc<dyn LlmClient>> {
    let inner: Arc<dyn LlmClient> = match config.provider {
        LlmProvider::Anthropic => {
            let api_key = config
                .anthropic_api_key
                .as_ref()
                .context("Anthropic API key is not configured")?;
            let client = AnthropicClient::new(
                AnthropicConfig::new(api_key.expose_secret().clone())
                    .with_model(&config.model)
                    .with_base_url(&config.base_url),
            )
            .context("Failed to build HTTP client")?;
            Arc::new(client)
        }
        LlmProvider::Mock => {
            tracing::warn!("Using mock LLM client; responses echo the prompt");
            Arc::new(MockLlmClient::new())
        }
    };

    let policy = RetryPolicy::default()
        .with_max_attempts(config.max_attempts)
        .with_initial_backoff(config.initial_backoff())
        .with_max_backoff(config.max_backoff())
        .with_multiplier(config.backoff_multiplier);

    Ok(Arc::new(RetryingLlmClient::new(inner, ledger).with_policy(policy)))
}

async fn result_store(config: &PersistenceConfig) -> Result<Option<Arc<dyn ResultStore>>> {
    let store: Option<Arc<dyn ResultStore>> = match config.backend {
        PersistenceBackend::Memory => Some(Arc::new(InMemoryResultStore::with_capacity(
            config.memory_capacity,
        ))),
        PersistenceBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("Database URL is not configured")?;
            let store = PostgresResultStore::connect(url, config.max_connections)
                .await
                .context("Failed to connect to PostgreSQL")?;
            Some(Arc::new(store))
        }
        PersistenceBackend::Disabled => None,
    };

    if config.backend == PersistenceBackend::Memory {
        tracing::warn!(
            capacity = config.memory_capacity,
            "Results are kept in memory only and are lost on restart"
        );
    }
    tracing::info!(backend = ?config.backend, mode = ?config.mode, "Result persistence configured");
    Ok(store)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
