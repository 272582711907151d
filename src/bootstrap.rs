//! Process bootstrap: acquire the store, run the module lifecycle, serve, release.

use anyhow::Context;
use carzone_db::Database;
use carzone_kernel::settings::{Settings, StoreBackend};
use carzone_kernel::{InitCtx, ModuleRegistry};

use crate::modules;

/// Open the configured store.
pub async fn connect(settings: &Settings) -> anyhow::Result<Database> {
    match settings.database.backend {
        StoreBackend::Mongodb => Database::mongodb(&settings.database.mongo_options())
            .await
            .with_context(|| format!("failed to create client for {}", settings.database.uri)),
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; listings are lost on exit");
            Ok(Database::memory())
        }
    }
}

/// Registry with every module wired to `db`.
pub fn build_registry(settings: &Settings, db: &Database) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, settings, db);
    registry
}

/// Run the full lifecycle and serve HTTP until a shutdown signal arrives.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let db = connect(&settings).await?;
    let registry = build_registry(&settings, &db);
    let ctx = InitCtx {
        settings: &settings,
        db: &db,
    };

    registry.init_core_modules(&ctx).await?;
    registry.init_custom_modules(&ctx).await?;
    registry.ensure_indexes(&ctx).await?;
    registry.start_core_modules(&ctx).await?;
    registry.start_custom_modules(&ctx).await?;

    tracing::info!(
        port = settings.server.port,
        "Toy Car Zone server is running on {}",
        settings.server.port
    );

    let served =
        carzone_http::start_server(&registry, &settings, carzone_http::shutdown_signal()).await;

    registry.stop_custom_modules().await?;
    registry.stop_core_modules().await?;

    served
}

/// Connect and ping the store, then release it.
pub async fn ping(settings: &Settings) -> anyhow::Result<()> {
    let db = connect(settings).await?;
    let result = db.ping().await.context("store ping failed");
    db.shutdown().await.context("failed to close store")?;
    result
}

/// Create every declared index and return how many were ensured.
pub async fn ensure_indexes(settings: &Settings) -> anyhow::Result<usize> {
    let db = connect(settings).await?;
    let registry = build_registry(settings, &db);
    let ctx = InitCtx { settings, db: &db };

    let result = registry.ensure_indexes(&ctx).await;
    db.shutdown().await.context("failed to close store")?;
    result
}
