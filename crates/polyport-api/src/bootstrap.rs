//! Wiring for the host judge
//!
//! The judge application calls [`start`] with its `JudgeClient` and
//! `MediaStore` implementations, mounts the returned router into its server
//! (or hands it to [`serve`]), and signals `shutdown` on exit.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use polyport_config::{ApiConfig, ApplicationConfig};
use polyport_importer::worker::import_worker;
use polyport_importer::{ImportDispatcher, ImportServices, PandocConverter};
use polyport_judge::{JudgeClient, MediaStore};
use polyport_meta_data::{initialize_database, DbSourceRepository, SourceRepository};
use polyport_polygon::PolygonClient;

use crate::routes;
use crate::state::AppState;

/// A started importer: router to mount, worker to await, shutdown to signal
pub struct Bootstrap {
    pub router: Router,
    pub api: ApiConfig,
    pub dispatcher: ImportDispatcher,
    pub shutdown: watch::Sender<bool>,
    pub worker: JoinHandle<()>,
}

/// [`start`] with configuration taken from `.env` and the process
/// environment; also installs the tracing subscriber.
pub async fn start_from_env(
    judge: Arc<dyn JudgeClient>,
    media: Arc<dyn MediaStore>,
) -> anyhow::Result<Bootstrap> {
    polyport_common::initialize_environment();
    polyport_common::init_tracing("info");
    start(ApplicationConfig::from_env(), judge, media).await
}

/// Validate config, locate pandoc, connect the database, and spawn the
/// import worker.
///
/// A missing or outdated pandoc fails here, before any request is served.
pub async fn start(
    config: ApplicationConfig,
    judge: Arc<dyn JudgeClient>,
    media: Arc<dyn MediaStore>,
) -> anyhow::Result<Bootstrap> {
    config.validate().context("invalid configuration")?;

    let pandoc = PandocConverter::locate(&config.pandoc)
        .await
        .context("pandoc is required for statement conversion")?;

    let pool = initialize_database(&config.database).await?;
    let sources: Arc<dyn SourceRepository> = Arc::new(DbSourceRepository::new(pool));
    let polygon = PolygonClient::new(config.polygon.clone());
    let api = config.api.clone();
    info!(
        "Importer ready (database: {})",
        config.database.safe_connection_string()
    );

    let services = Arc::new(ImportServices {
        polygon: polygon.clone(),
        judge: Arc::clone(&judge),
        media,
        sources: Arc::clone(&sources),
        pandoc,
        config,
    });

    let (dispatcher, worker, shutdown) = import_worker(services);
    let worker = tokio::spawn(worker.run());

    let state = AppState {
        dispatcher: dispatcher.clone(),
        sources,
        judge,
        polygon,
    };

    Ok(Bootstrap {
        router: routes::router(state),
        api,
        dispatcher,
        shutdown,
        worker,
    })
}

/// Serve the router on the configured address until the process exits
pub async fn serve(config: &ApiConfig, router: Router) -> anyhow::Result<()> {
    let address = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("could not bind {address}"))?;
    info!("Listening on {address}");
    axum::serve(listener, router).await?;
    Ok(())
}
