use deadpool_postgres::PoolError;
use thiserror::Error;
use tokio_postgres::Error as PgError;
use tracing::{info, instrument};

use crate::db::PgPool;
use crate::schema;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("failed to run migration: {0}")]
    Postgres(#[from] PgError),
}

struct Migration {
    id: i32,
    description: &'static str,
    sql: &'static str,
}

const BOOTSTRAP: &str = r#"
CREATE SCHEMA IF NOT EXISTS scout;

CREATE TABLE IF NOT EXISTS scout.schema_migrations (
    id INTEGER PRIMARY KEY,
    description TEXT NOT NULL,
    applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

const MIGRATIONS: &[Migration] = &[
    Migration {
        id: 1,
        description: "agent robot table",
        sql: schema::AGENT_ROBOTS_DDL,
    },
    Migration {
        id: 2,
        description: "scout service table",
        sql: schema::SCOUT_SERVICES_DDL,
    },
    Migration {
        id: 3,
        description: "scout service template table",
        sql: schema::SCOUT_SERVICE_TEMPLATES_DDL,
    },
    Migration {
        id: 4,
        description: "scout service entry time table",
        sql: schema::SCOUT_SERVICE_GET_ENTRY_TIMES_DDL,
    },
    Migration {
        id: 5,
        description: "dispatcher read index on active services",
        sql: r#"
CREATE INDEX IF NOT EXISTS idx_scout_services_active
    ON scout.scout_services(robot_id)
    WHERE active = true;
CREATE INDEX IF NOT EXISTS idx_templates_service
    ON scout.scout_service_templates(service_id);
CREATE INDEX IF NOT EXISTS idx_entry_times_service
    ON scout.scout_service_get_entry_times(service_id);
"#,
    },
];

/// Apply pending migrations in order, recording each in `schema_migrations`.
#[instrument(skip(pool))]
pub async fn run_migrations(pool: &PgPool) -> Result<(), MigrationError> {
    let mut client = pool.get().await?;
    client.batch_execute(BOOTSTRAP).await?;

    for migration in MIGRATIONS {
        let applied = client
            .query_opt(
                "SELECT id FROM scout.schema_migrations WHERE id = $1",
                &[&migration.id],
            )
            .await?;
        if applied.is_some() {
            continue;
        }

        let tx = client.transaction().await?;
        tx.batch_execute(migration.sql).await?;
        tx.execute(
            "INSERT INTO scout.schema_migrations (id, description) VALUES ($1, $2)",
            &[&migration.id, &migration.description],
        )
        .await?;
        tx.commit().await?;

        info!(id = migration.id, description = migration.description, "applied migration");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migration_ids_are_sequential_and_unique() {
        for (index, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.id, index as i32 + 1);
        }
    }
}
