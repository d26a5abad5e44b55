use anyhow::Context;
use clap::{Parser, Subcommand};
use libris_app::App;
use libris_db::Db;
use libris_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "libris", version, about = "Books and authors catalogue")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Apply pending schema migrations and exit
    Migrate,
    /// Print the merged OpenAPI document
    Openapi,
    /// Load and validate configuration, check the database, then print the
    /// effective values
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().context("failed to load Libris settings")?;
    libris_telemetry::init(&settings.telemetry)?;

    match cli.command {
        Command::Serve => {
            let db = connect(&settings).await?;
            App::build(settings, db).await?.serve().await
        }
        Command::Migrate => {
            let db = connect(&settings).await?;
            let app = App::build(settings, db).await?;
            let report = app.migrations();
            for id in &report.applied {
                println!("applied {id}");
            }
            println!(
                "{} applied, {} already up to date",
                report.applied.len(),
                report.skipped
            );
            app.db().close().await;
            Ok(())
        }
        Command::Openapi => {
            // The document only depends on the registered modules.
            let app = App::build(settings, Db::in_memory().await?).await?;
            let document = libris_http::router::merged_openapi(app.registry());
            println!("{}", serde_json::to_string_pretty(&document)?);
            Ok(())
        }
        Command::CheckConfig => {
            println!("environment: {:?}", settings.environment);
            println!(
                "server: {}:{} (timeout {}ms)",
                settings.server.host, settings.server.port, settings.server.request_timeout_ms
            );
            let db = connect(&settings).await?;
            db.ping().await?;
            db.close().await;
            println!("database: {} (reachable)", settings.database.url);
            println!(
                "cache: books {}s, authors {}s, capacity {}",
                settings.cache.books_ttl_secs,
                settings.cache.authors_ttl_secs,
                settings.cache.max_capacity
            );
            println!(
                "pagination: default limit {}, max limit {}",
                settings.pagination.default_limit, settings.pagination.max_limit
            );
            println!("api keys: {}", settings.auth.api_keys.len());
            Ok(())
        }
    }
}

async fn connect(settings: &Settings) -> anyhow::Result<Db> {
    Db::connect(&settings.database.url, settings.database.max_connections).await
}
