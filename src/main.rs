use anyhow::Context;
use libris_app::App;
use libris_db::Db;
use libris_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load Libris settings")?;
    libris_telemetry::init(&settings.telemetry)?;

    tracing::info!(
        env = ?settings.environment,
        db = %settings.database.url,
        "libris-app bootstrap starting"
    );

    let db = Db::connect(&settings.database.url, settings.database.max_connections).await?;
    let app = App::build(settings, db).await?;

    tracing::info!("libris-app bootstrap complete");
    app.serve().await
}
