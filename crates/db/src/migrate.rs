//! Module-contributed schema migrations, applied once each and recorded in a
//! ledger table.

use thiserror::Error;

use crate::Db;

const LEDGER_DDL: &str = r#"
    CREATE TABLE IF NOT EXISTS _libris_migrations (
        module     TEXT NOT NULL,
        id         TEXT NOT NULL,
        applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
        PRIMARY KEY (module, id)
    )
"#;

/// Migration definition contributed by a module
#[derive(Debug, Clone)]
pub struct Migration {
    pub id: &'static str,
    pub up: &'static str,
}

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration '{module}/{id}' failed: {source}")]
    Failed {
        module: String,
        id: String,
        #[source]
        source: sqlx::Error,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Outcome of a migration run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// `module/id` of each migration applied by this run, in order
    pub applied: Vec<String>,
    /// Migrations already recorded in the ledger
    pub skipped: usize,
}

/// Apply every migration not yet present in the ledger.
///
/// Each migration runs in its own transaction together with its ledger row,
/// so a failing script leaves no partial schema behind.
pub async fn run_migrations(
    db: &Db,
    migrations: &[(String, Migration)],
) -> Result<MigrationReport, MigrationError> {
    sqlx::query(LEDGER_DDL).execute(db.pool()).await?;

    let mut report = MigrationReport::default();

    for (module, migration) in migrations {
        let applied: Option<i64> =
            sqlx::query_scalar("SELECT 1 FROM _libris_migrations WHERE module = ? AND id = ?")
                .bind(module.as_str())
                .bind(migration.id)
                .fetch_optional(db.pool())
                .await?;

        if applied.is_some() {
            report.skipped += 1;
            continue;
        }

        let mut tx = db.pool().begin().await?;

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|source| MigrationError::Failed {
                module: module.clone(),
                id: migration.id.to_string(),
                source,
            })?;

        sqlx::query("INSERT INTO _libris_migrations (module, id) VALUES (?, ?)")
            .bind(module.as_str())
            .bind(migration.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(target: "libris-db", module = %module, id = migration.id, "migration applied");
        report.applied.push(format!("{module}/{}", migration.id));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<(String, Migration)> {
        vec![(
            "shelf".to_string(),
            Migration {
                id: "001_init",
                up: "CREATE TABLE shelf (id INTEGER PRIMARY KEY, label TEXT NOT NULL);",
            },
        )]
    }

    #[tokio::test]
    async fn applies_pending_migrations_once() {
        let db = Db::in_memory().await.unwrap();

        let first = run_migrations(&db, &sample()).await.unwrap();
        assert_eq!(first.applied, vec!["shelf/001_init".to_string()]);
        assert_eq!(first.skipped, 0);

        let second = run_migrations(&db, &sample()).await.unwrap();
        assert!(second.applied.is_empty());
        assert_eq!(second.skipped, 1);
    }

    #[tokio::test]
    async fn failing_script_is_reported_with_its_id() {
        let db = Db::in_memory().await.unwrap();
        let broken = vec![(
            "shelf".to_string(),
            Migration {
                id: "002_broken",
                up: "CREATE TABLE;",
            },
        )];

        let err = run_migrations(&db, &broken).await.unwrap_err();
        assert!(matches!(err, MigrationError::Failed { ref id, .. } if id == "002_broken"));

        let recorded: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM _libris_migrations")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(recorded, 0);
    }
}
