use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use linksnip_cache::{CacheConfig, CachedRepository, MokaLinkCache};
use linksnip_core::Repository;
use linksnip_gateway::cli::{Config, LogFormat, StorageBackendArg};
use linksnip_gateway::{App, AppState};
use linksnip_generator::RandomGenerator;
use linksnip_redirector::RedirectorService;
use linksnip_shortener::{ShortenerService, ShortenerSettings};
use linksnip_storage::{InMemoryRepository, SqliteRepository};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    init_tracing(config.log_format);

    info!(
        listen_addr = %config.listen_addr,
        public_base_url = %config.public_base_url,
        storage_backend = %config.storage,
        "starting linksnip"
    );

    match config.storage {
        StorageBackendArg::InMemory => run_server(config, InMemoryRepository::new()).await,
        StorageBackendArg::Sqlite => {
            let sqlite_url = config
                .sqlite_url
                .clone()
                .context("sqlite url is required when storage backend is sqlite")?;
            let repository = SqliteRepository::connect(&sqlite_url)
                .await
                .with_context(|| format!("failed to open sqlite database at {sqlite_url}"))?;
            run_server(config, repository).await
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

async fn run_server<R: Repository>(config: Config, repository: R) -> anyhow::Result<()> {
    let cache_config = CacheConfig::builder()
        .max_capacity(config.cache_capacity)
        .ttl(Duration::from_secs(config.cache_ttl_secs))
        .tti(config.cache_tti_secs.map(Duration::from_secs))
        .build();
    info!(?cache_config, "configured link cache");

    // Both services share one cache so writes invalidate what reads see.
    let repository = Arc::new(CachedRepository::new(
        repository,
        MokaLinkCache::from(cache_config),
    ));

    let settings = ShortenerSettings::builder()
        .max_attempts(config.max_attempts)
        .build();
    let shortener =
        ShortenerService::with_settings(Arc::clone(&repository), RandomGenerator::new(), settings);
    let redirector = RedirectorService::new(repository);

    let state = AppState::new(
        Arc::new(shortener),
        Arc::new(redirector),
        config.public_base_url,
    );
    let app = App::service(state, Duration::from_secs(config.request_timeout_secs));

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
}
