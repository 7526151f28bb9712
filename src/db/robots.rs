use deadpool_postgres::PoolError;
use tokio_postgres::Error as PgError;
use tokio_postgres::Row;
use tracing::instrument;

use crate::db::PgPool;
use crate::model::robot::AgentRobot;

#[derive(Debug, thiserror::Error)]
pub enum RobotStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("not found: {0}")]
    NotFound(String),
}

pub(crate) fn row_to_robot(row: &Row) -> AgentRobot {
    AgentRobot {
        id: row.get("id"),
        agency_id: row.get("agency_id"),
        name: row.get("name"),
        entry_active: row.get("entry_active"),
        scout_active: row.get("scout_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// Insert a new robot (id 0) or update an existing row. Returns the row id.
#[instrument(skip(pool, robot))]
pub async fn upsert_robot(pool: &PgPool, robot: &AgentRobot) -> Result<i64, RobotStorageError> {
    let client = pool.get().await?;

    if robot.id == 0 {
        let row = client
            .query_one(
                "INSERT INTO scout.agent_robots (
                    agency_id, name, entry_active, scout_active
                ) VALUES ($1, $2, $3, $4)
                RETURNING id",
                &[
                    &robot.agency_id,
                    &robot.name,
                    &robot.entry_active,
                    &robot.scout_active,
                ],
            )
            .await?;
        return Ok(row.get("id"));
    }

    let updated = client
        .execute(
            "UPDATE scout.agent_robots
             SET name = $2, entry_active = $3, scout_active = $4, updated_at = NOW()
             WHERE id = $1",
            &[
                &robot.id,
                &robot.name,
                &robot.entry_active,
                &robot.scout_active,
            ],
        )
        .await?;

    if updated == 0 {
        return Err(RobotStorageError::NotFound(format!("robot {}", robot.id)));
    }
    Ok(robot.id)
}

#[instrument(skip(pool))]
pub async fn fetch_robot(pool: &PgPool, robot_id: i64) -> Result<AgentRobot, RobotStorageError> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            "SELECT * FROM scout.agent_robots WHERE id = $1",
            &[&robot_id],
        )
        .await?;

    row.map(|r| row_to_robot(&r))
        .ok_or_else(|| RobotStorageError::NotFound(format!("robot {robot_id}")))
}
