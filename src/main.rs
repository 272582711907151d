use anyhow::Context;
use carzone_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load carzone settings")?;
    carzone_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.database.backend,
        db = %settings.database.name,
        "carzone-app bootstrap starting"
    );

    carzone_app::bootstrap::serve(settings).await
}
