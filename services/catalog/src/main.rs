//! Luxe catalog HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, storage, media backend, staff sign-in and session
//! verification, then serves the API until Ctrl+C.
//!
//! # Notes
//! Backend selection lives in `build_state` so tests can exercise it without
//! binding sockets.
use anyhow::Context;
use catalog::app::{AppState, HttpSettings, build_router};
use catalog::auth::{Authenticator, SessionKeys, StaffDirectory};
use catalog::config::{CatalogConfig, MediaBackend, StorageBackend};
use catalog::media::MediaStore;
use catalog::media::cloudinary::CloudinaryMediaStore;
use catalog::media::memory::InMemoryMediaStore;
use catalog::observability;
use catalog::store::{CatalogStore, memory::InMemoryStore, postgres::PostgresStore};
use std::future::Future;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CatalogConfig::from_env_or_yaml().context("catalog config")?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: CatalogConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let metrics_handle = observability::init_observability("luxe-catalog", config.environment);
    let state = build_state(&config).await?;
    tracing::info!(
        storage = state.store.backend_name(),
        media = state.media.backend_name(),
        environment = ?config.environment,
        "catalog state ready"
    );
    let metrics_task = tokio::spawn(observability::serve_metrics(
        metrics_handle,
        config.metrics_bind,
    ));

    let app = build_router(state);
    let addr = config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(addr = %listener.local_addr()?, "catalog listening");
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("catalog stopped");

    metrics_task.abort();
    let _ = metrics_task.await;
    Ok(())
}

async fn build_state(config: &CatalogConfig) -> anyhow::Result<AppState> {
    let store: Arc<dyn CatalogStore> = match config.storage {
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        StorageBackend::Postgres => {
            let pg = config
                .postgres
                .as_ref()
                .context("postgres configuration missing")?;
            Arc::new(PostgresStore::connect(pg).await.context("connect postgres")?)
        }
    };

    let (media, local_media) = match config.media.backend {
        MediaBackend::Memory => {
            let local = Arc::new(InMemoryMediaStore::new(
                &config.media.public_base_url,
                &config.media.folder,
            ));
            let media: Arc<dyn MediaStore> = local.clone();
            (media, Some(local))
        }
        MediaBackend::Cloudinary => {
            let cloudinary = config
                .media
                .cloudinary
                .clone()
                .context("cloudinary configuration missing")?;
            let media: Arc<dyn MediaStore> =
                Arc::new(CloudinaryMediaStore::new(cloudinary, &config.media.folder)?);
            (media, None)
        }
    };

    let dev_bypass = config.dev_bypass_active();
    if dev_bypass {
        tracing::warn!("development auth bypass enabled; every request acts as manager");
    }
    let staff = StaffDirectory::from_config(&config.session);
    if staff.is_empty() {
        tracing::warn!("no staff password hashes configured; password login is disabled");
    }
    let auth = Authenticator::new(
        SessionKeys::from_config(&config.session),
        config.session.cookie_name.clone(),
        dev_bypass,
    )
    .with_staff(staff)
    .with_secure_cookies(config.environment.is_production());

    Ok(AppState {
        store,
        media,
        local_media,
        auth: Arc::new(auth),
        max_upload_bytes: config.media.max_upload_bytes,
        http: HttpSettings {
            cors_origins: config.cors_origins.clone(),
            request_timeout: config.request_timeout,
        },
    })
}
