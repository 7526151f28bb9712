use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tokio_postgres::Row;
use tracing::instrument;

use crate::db::PgPool;
use crate::model::entry_time::ScoutServiceGetEntryTime;
use crate::model::template::StartTime;

#[derive(Debug, thiserror::Error)]
pub enum EntryTimeStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to map entry time row: {0}")]
    Mapping(String),
}

pub(crate) fn row_to_entry_time(
    row: &Row,
) -> Result<ScoutServiceGetEntryTime, EntryTimeStorageError> {
    let start = StartTime::from_row_values(row.get("start_hour"), row.get("start_minute"))
        .map_err(|e| EntryTimeStorageError::Mapping(e.to_string()))?;

    Ok(ScoutServiceGetEntryTime {
        id: row.get("id"),
        service_id: row.get("service_id"),
        start,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[instrument(skip(pool))]
pub async fn list_entry_times(
    pool: &PgPool,
    service_id: i64,
) -> Result<Vec<ScoutServiceGetEntryTime>, EntryTimeStorageError> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT * FROM scout.scout_service_get_entry_times WHERE service_id = $1 ORDER BY id",
            &[&service_id],
        )
        .await?;

    rows.iter().map(row_to_entry_time).collect()
}

/// Replace the entry-time set of a service in one transaction.
#[instrument(skip(pool, entry_times))]
pub async fn replace_entry_times(
    pool: &PgPool,
    service_id: i64,
    entry_times: &[ScoutServiceGetEntryTime],
) -> Result<(), EntryTimeStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;
    insert_entry_times_tx(&tx, service_id, entry_times).await?;
    tx.commit().await?;
    Ok(())
}

pub(crate) async fn insert_entry_times_tx(
    tx: &deadpool_postgres::Transaction<'_>,
    service_id: i64,
    entry_times: &[ScoutServiceGetEntryTime],
) -> Result<(), EntryTimeStorageError> {
    tx.execute(
        "DELETE FROM scout.scout_service_get_entry_times WHERE service_id = $1",
        &[&service_id],
    )
    .await?;

    let stmt = tx
        .prepare(
            "INSERT INTO scout.scout_service_get_entry_times (
                service_id, start_hour, start_minute
            ) VALUES ($1, $2, $3)",
        )
        .await?;

    for entry_time in entry_times {
        tx.execute(
            &stmt,
            &[
                &service_id,
                &(i16::from(entry_time.start.hour())),
                &(i16::from(entry_time.start.minute())),
            ],
        )
        .await?;
    }

    Ok(())
}
