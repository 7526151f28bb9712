use std::collections::HashMap;

use deadpool_postgres::PoolError;
use serde::Serialize;
use tokio_postgres::Error as PgError;
use tokio_postgres::Row;
use tracing::instrument;

use crate::api::service_param::{
    CreateScoutServiceParam, DeleteScoutServiceParam, UpdatePasswordParam, UpdateScoutServiceParam,
};
use crate::db::entry_times::{insert_entry_times_tx, row_to_entry_time, EntryTimeStorageError};
use crate::db::templates::{insert_templates_tx, row_to_template, TemplateStorageError};
use crate::db::PgPool;
use crate::error::ModelError;
use crate::model::entry_time::ScoutServiceGetEntryTime;
use crate::model::robot::AgentRobot;
use crate::model::service::{ScoutService, ScoutServiceKind};
use crate::model::template::ScoutServiceTemplate;

#[derive(Debug, thiserror::Error)]
pub enum ServiceStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to map service row: {0}")]
    Mapping(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Template(#[from] TemplateStorageError),
    #[error(transparent)]
    EntryTime(#[from] EntryTimeStorageError),
}

pub(crate) fn row_to_service(row: &Row) -> Result<ScoutService, ServiceStorageError> {
    let kind_raw: String = row.get("kind");
    let kind = ScoutServiceKind::parse(&kind_raw)
        .ok_or_else(|| ServiceStorageError::Mapping(format!("unknown service kind: {kind_raw}")))?;

    Ok(ScoutService {
        id: row.get("id"),
        robot_id: row.get("robot_id"),
        staff_id: row.get("staff_id"),
        kind,
        login_id: row.get("login_id"),
        password: row.get("password"),
        active: row.get("active"),
        message_template_id: row.get("message_template_id"),
        inflow_channel_id: row.get("inflow_channel_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn build_templates(
    service_id: i64,
    kind: ScoutServiceKind,
    params: &[crate::api::service_param::ScoutServiceTemplateParam],
) -> Result<Vec<ScoutServiceTemplate>, ModelError> {
    params
        .iter()
        .map(|param| {
            ScoutServiceTemplate::new(
                service_id,
                param.start_time()?,
                param.weekdays()?,
                param.target(kind)?,
            )
        })
        .collect()
}

fn build_entry_times(
    service_id: i64,
    params: &[crate::api::service_param::GetEntryTimeParam],
) -> Result<Vec<ScoutServiceGetEntryTime>, ModelError> {
    params
        .iter()
        .map(|param| Ok(ScoutServiceGetEntryTime::new(service_id, param.start_time()?)))
        .collect()
}

/// Create a service with its template and entry-time sets in one transaction.
///
/// The robot gate is checked first; a gated robot aborts before any write.
#[instrument(skip(pool, robot, param))]
pub async fn create_service(
    pool: &PgPool,
    robot: &AgentRobot,
    param: &CreateScoutServiceParam,
) -> Result<i64, ServiceStorageError> {
    let service = param.validate(robot)?;

    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    let row = tx
        .query_one(
            "INSERT INTO scout.scout_services (
                robot_id, staff_id, kind, login_id, password, active,
                message_template_id, inflow_channel_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id",
            &[
                &service.robot_id,
                &service.staff_id,
                &service.kind.as_str(),
                &service.login_id,
                &service.password,
                &service.active,
                &service.message_template_id,
                &service.inflow_channel_id,
            ],
        )
        .await?;
    let service_id: i64 = row.get("id");

    let templates = build_templates(service_id, param.kind, &param.templates)?;
    insert_templates_tx(&tx, service_id, &templates).await?;

    let entry_times = build_entry_times(service_id, &param.entry_times)?;
    insert_entry_times_tx(&tx, service_id, &entry_times).await?;

    tx.commit().await?;
    Ok(service_id)
}

#[instrument(skip(pool))]
pub async fn fetch_service(
    pool: &PgPool,
    service_id: i64,
) -> Result<ScoutService, ServiceStorageError> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            "SELECT * FROM scout.scout_services WHERE id = $1",
            &[&service_id],
        )
        .await?;

    match row {
        Some(row) => row_to_service(&row),
        None => Err(ServiceStorageError::NotFound(format!(
            "service {service_id}"
        ))),
    }
}

/// Apply a partial update, replacing the template/entry-time sets when the
/// request carries them.
#[instrument(skip(pool, robot, param))]
pub async fn update_service(
    pool: &PgPool,
    robot: &AgentRobot,
    param: &UpdateScoutServiceParam,
) -> Result<(), ServiceStorageError> {
    let mut service = fetch_service(pool, param.service_id).await?;
    param.apply(robot, &mut service)?;

    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    tx.execute(
        "UPDATE scout.scout_services
         SET staff_id = $2, active = $3, message_template_id = $4,
             inflow_channel_id = $5, updated_at = NOW()
         WHERE id = $1",
        &[
            &service.id,
            &service.staff_id,
            &service.active,
            &service.message_template_id,
            &service.inflow_channel_id,
        ],
    )
    .await?;

    if let Some(template_params) = &param.templates {
        let templates = build_templates(service.id, service.kind, template_params)?;
        insert_templates_tx(&tx, service.id, &templates).await?;
    }
    if let Some(entry_time_params) = &param.entry_times {
        let entry_times = build_entry_times(service.id, entry_time_params)?;
        insert_entry_times_tx(&tx, service.id, &entry_times).await?;
    }

    tx.commit().await?;
    Ok(())
}

/// Credential rotation, narrow on purpose: nothing but the password moves.
#[instrument(skip(pool, param))]
pub async fn update_password(
    pool: &PgPool,
    param: &UpdatePasswordParam,
) -> Result<(), ServiceStorageError> {
    param.validate()?;

    let client = pool.get().await?;
    let updated = client
        .execute(
            "UPDATE scout.scout_services SET password = $2, updated_at = NOW() WHERE id = $1",
            &[&param.service_id, &param.password],
        )
        .await?;

    if updated == 0 {
        return Err(ServiceStorageError::NotFound(format!(
            "service {}",
            param.service_id
        )));
    }
    Ok(())
}

/// Terminal delete. Owned templates and entry times go in the same
/// transaction, so no active template can outlive its service even on a
/// database created without the FK cascades.
#[instrument(skip(pool))]
pub async fn delete_service(
    pool: &PgPool,
    param: &DeleteScoutServiceParam,
) -> Result<(), ServiceStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;

    tx.execute(
        "DELETE FROM scout.scout_service_get_entry_times WHERE service_id = $1",
        &[&param.service_id],
    )
    .await?;
    tx.execute(
        "DELETE FROM scout.scout_service_templates WHERE service_id = $1",
        &[&param.service_id],
    )
    .await?;
    let deleted = tx
        .execute(
            "DELETE FROM scout.scout_services WHERE id = $1",
            &[&param.service_id],
        )
        .await?;

    if deleted == 0 {
        return Err(ServiceStorageError::NotFound(format!(
            "service {}",
            param.service_id
        )));
    }

    tx.commit().await?;
    Ok(())
}

/// 配信側の読み取り単位: サービス1件 + 配下のスケジュール一式
#[derive(Debug, Clone, Serialize)]
pub struct ActiveSchedule {
    pub robot: AgentRobot,
    pub service: ScoutService,
    pub templates: Vec<ScoutServiceTemplate>,
    pub entry_times: Vec<ScoutServiceGetEntryTime>,
}

// Each schedule half is served under its own robot gate: templates need
// scout_active, entry times need entry_active. A service row is included as
// soon as either gate is open.
const ACTIVE_SERVICES_SQL: &str = "SELECT s.*, r.agency_id AS robot_agency_id, r.name AS robot_name,
        r.entry_active AS robot_entry_active, r.scout_active AS robot_scout_active,
        r.created_at AS robot_created_at, r.updated_at AS robot_updated_at
 FROM scout.scout_services s
 JOIN scout.agent_robots r ON r.id = s.robot_id
 WHERE s.active = true AND (r.scout_active = true OR r.entry_active = true)
 ORDER BY s.id";

const ACTIVE_TEMPLATES_SQL: &str = "SELECT t.* FROM scout.scout_service_templates t
 JOIN scout.scout_services s ON s.id = t.service_id
 JOIN scout.agent_robots r ON r.id = s.robot_id
 WHERE s.active = true AND r.scout_active = true
 ORDER BY t.id";

const ACTIVE_ENTRY_TIMES_SQL: &str = "SELECT e.* FROM scout.scout_service_get_entry_times e
 JOIN scout.scout_services s ON s.id = e.service_id
 JOIN scout.agent_robots r ON r.id = s.robot_id
 WHERE s.active = true AND r.entry_active = true
 ORDER BY e.id";

/// Dispatcher read: every Active service under an active robot gate, joined
/// with its templates and entry times. Inactive services and fully gated
/// robots are filtered out here so the dispatcher never sees suppressed
/// schedules.
#[instrument(skip(pool))]
pub async fn fetch_active_schedules(
    pool: &PgPool,
) -> Result<Vec<ActiveSchedule>, ServiceStorageError> {
    let client = pool.get().await?;

    let service_rows = client.query(ACTIVE_SERVICES_SQL, &[]).await?;

    let mut schedules: Vec<ActiveSchedule> = Vec::with_capacity(service_rows.len());
    let mut index_by_service: HashMap<i64, usize> = HashMap::new();
    let mut kind_by_service: HashMap<i64, ScoutServiceKind> = HashMap::new();

    for row in &service_rows {
        let service = row_to_service(row)?;
        let robot = AgentRobot {
            id: service.robot_id,
            agency_id: row.get("robot_agency_id"),
            name: row.get("robot_name"),
            entry_active: row.get("robot_entry_active"),
            scout_active: row.get("robot_scout_active"),
            created_at: row.get("robot_created_at"),
            updated_at: row.get("robot_updated_at"),
        };
        index_by_service.insert(service.id, schedules.len());
        kind_by_service.insert(service.id, service.kind);
        schedules.push(ActiveSchedule {
            robot,
            service,
            templates: Vec::new(),
            entry_times: Vec::new(),
        });
    }

    let template_rows = client.query(ACTIVE_TEMPLATES_SQL, &[]).await?;

    for row in &template_rows {
        let service_id: i64 = row.get("service_id");
        let (Some(index), Some(kind)) = (
            index_by_service.get(&service_id),
            kind_by_service.get(&service_id),
        ) else {
            continue;
        };
        schedules[*index]
            .templates
            .push(row_to_template(row, *kind)?);
    }

    let entry_time_rows = client.query(ACTIVE_ENTRY_TIMES_SQL, &[]).await?;

    for row in &entry_time_rows {
        let service_id: i64 = row.get("service_id");
        let Some(index) = index_by_service.get(&service_id) else {
            continue;
        };
        schedules[*index].entry_times.push(row_to_entry_time(row)?);
    }

    Ok(schedules)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn templates_are_served_under_the_scout_gate() {
        assert!(ACTIVE_TEMPLATES_SQL.contains("r.scout_active = true"));
        assert!(!ACTIVE_TEMPLATES_SQL.contains("entry_active"));
    }

    #[test]
    fn entry_times_are_served_under_the_entry_gate() {
        assert!(ACTIVE_ENTRY_TIMES_SQL.contains("r.entry_active = true"));
        assert!(!ACTIVE_ENTRY_TIMES_SQL.contains("scout_active"));
    }

    #[test]
    fn service_rows_require_at_least_one_open_gate() {
        assert!(ACTIVE_SERVICES_SQL
            .contains("(r.scout_active = true OR r.entry_active = true)"));
        assert!(ACTIVE_SERVICES_SQL.contains("s.active = true"));
    }
}
