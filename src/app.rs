//! Application bootstrap: registry, migrations, and the HTTP surface.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use libris_authz::ApiKeyring;
use libris_cache::ResponseCache;
use libris_db::{Db, MigrationReport};
use libris_kernel::{settings::Settings, InitCtx, ModuleRegistry};

use crate::modules;

/// A fully wired application: modules registered, schema migrated, modules
/// initialized.
pub struct App {
    settings: Settings,
    db: Db,
    cache: ResponseCache,
    keyring: Arc<ApiKeyring>,
    registry: ModuleRegistry,
    migrations: MigrationReport,
}

impl App {
    pub async fn build(settings: Settings, db: Db) -> anyhow::Result<Self> {
        let cache = ResponseCache::new(settings.cache.max_capacity);
        let keyring = Arc::new(ApiKeyring::new(settings.auth.api_keys.clone()));
        if keyring.is_empty() {
            tracing::warn!("no API keys configured; every write will be rejected");
        }

        let mut registry = ModuleRegistry::new();
        let ctx = InitCtx {
            settings: &settings,
            db: &db,
            cache: &cache,
        };
        modules::register_all(&mut registry, &ctx);

        let migrations = registry.migrate(&db).await?;
        registry
            .init_modules(&ctx)
            .await
            .context("module initialization failed")?;

        tracing::info!(
            modules = registry.module_count(),
            api_keys = keyring.len(),
            "libris application ready"
        );

        Ok(Self {
            settings,
            db,
            cache,
            keyring,
            registry,
            migrations,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Migrations applied while building this application
    pub fn migrations(&self) -> &MigrationReport {
        &self.migrations
    }

    /// The complete router, middleware included
    pub fn router(&self) -> Router {
        libris_http::build_router(&self.registry, &self.settings, self.keyring.clone())
    }

    /// Start modules, serve until shutdown, then stop modules and close the pool.
    pub async fn serve(self) -> anyhow::Result<()> {
        let ctx = InitCtx {
            settings: &self.settings,
            db: &self.db,
            cache: &self.cache,
        };
        self.registry.start_modules(&ctx).await?;

        let served =
            libris_http::start_server(&self.registry, &self.settings, self.keyring.clone()).await;

        self.registry.stop_modules().await?;
        self.db.close().await;
        served
    }
}
