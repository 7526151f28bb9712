use chrono::{DateTime, Utc};
use deadpool_postgres::PoolError;
use tokio_postgres::Row;
use tokio_postgres::Error as PgError;
use tracing::instrument;

use crate::db::PgPool;
use crate::model::service::ScoutServiceKind;
use crate::model::template::{
    AmbiScoutType, RanScoutType, ScoutServiceTemplate, StartTime, TemplateTarget, WeekdaySet,
};

#[derive(Debug, thiserror::Error)]
pub enum TemplateStorageError {
    #[error("failed to get postgres connection: {0}")]
    Pool(#[from] PoolError),
    #[error("postgres error: {0}")]
    Postgres(#[from] PgError),
    #[error("failed to map template row: {0}")]
    Mapping(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
}

fn mapping(message: impl Into<String>) -> TemplateStorageError {
    TemplateStorageError::Mapping(message.into())
}

/// Narrow the flat nullable columns back into the typed target.
///
/// Rows written through the validated params always narrow cleanly; a row
/// that does not is surfaced as a mapping error instead of being patched up.
fn row_to_target(row: &Row, kind: ScoutServiceKind) -> Result<TemplateTarget, TemplateStorageError> {
    let send_cap: Option<i32> = row.get("send_cap");
    let scout_type: Option<String> = row.get("scout_type");

    match kind {
        ScoutServiceKind::Ran => Ok(TemplateTarget::Ran {
            send_cap: send_cap.ok_or_else(|| mapping("ran template without send_cap"))?,
            job_information_id: row
                .get::<_, Option<String>>("job_information_id")
                .ok_or_else(|| mapping("ran template without job_information_id"))?,
            scout_type: match scout_type.as_deref() {
                Some(raw) => RanScoutType::parse(raw)
                    .ok_or_else(|| mapping(format!("unknown ran scout_type: {raw}")))?,
                None => RanScoutType::Normal,
            },
        }),
        ScoutServiceKind::MynaviScouting => Ok(TemplateTarget::MynaviScouting {
            send_cap: send_cap.ok_or_else(|| mapping("mynavi template without send_cap"))?,
            age_limit: row.get("age_limit"),
            reply_limit: row.get("reply_limit"),
        }),
        ScoutServiceKind::Ambi => Ok(TemplateTarget::Ambi {
            send_cap: send_cap.ok_or_else(|| mapping("ambi template without send_cap"))?,
            scout_type: match scout_type.as_deref() {
                Some(raw) => AmbiScoutType::parse(raw)
                    .ok_or_else(|| mapping(format!("unknown ambi scout_type: {raw}")))?,
                None => AmbiScoutType::Normal,
            },
            reply_limit: row.get("reply_limit"),
        }),
        ScoutServiceKind::MynaviAgentScout => Ok(TemplateTarget::MynaviAgentScout),
    }
}

pub(crate) fn row_to_template(
    row: &Row,
    kind: ScoutServiceKind,
) -> Result<ScoutServiceTemplate, TemplateStorageError> {
    let start = StartTime::from_row_values(row.get("start_hour"), row.get("start_minute"))
        .map_err(|e| mapping(e.to_string()))?;

    let weekdays = WeekdaySet::from_flags([
        row.get("run_monday"),
        row.get("run_tuesday"),
        row.get("run_wednesday"),
        row.get("run_thursday"),
        row.get("run_friday"),
        row.get("run_saturday"),
        row.get("run_sunday"),
    ]);

    Ok(ScoutServiceTemplate {
        id: row.get("id"),
        service_id: row.get("service_id"),
        start,
        weekdays,
        target: row_to_target(row, kind)?,
        last_send_count: row.get("last_send_count"),
        last_send_at: row.get("last_send_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// List templates of one service, newest last.
#[instrument(skip(pool))]
pub async fn list_templates(
    pool: &PgPool,
    service_id: i64,
    kind: ScoutServiceKind,
) -> Result<Vec<ScoutServiceTemplate>, TemplateStorageError> {
    let client = pool.get().await?;
    let rows = client
        .query(
            "SELECT * FROM scout.scout_service_templates WHERE service_id = $1 ORDER BY id",
            &[&service_id],
        )
        .await?;

    rows.iter().map(|row| row_to_template(row, kind)).collect()
}

/// Replace the template set of a service in one transaction.
#[instrument(skip(pool, templates))]
pub async fn replace_templates(
    pool: &PgPool,
    service_id: i64,
    templates: &[ScoutServiceTemplate],
) -> Result<(), TemplateStorageError> {
    let mut client = pool.get().await?;
    let tx = client.transaction().await?;
    insert_templates_tx(&tx, service_id, templates).await?;
    tx.commit().await?;
    Ok(())
}

pub(crate) async fn insert_templates_tx(
    tx: &deadpool_postgres::Transaction<'_>,
    service_id: i64,
    templates: &[ScoutServiceTemplate],
) -> Result<(), TemplateStorageError> {
    tx.execute(
        "DELETE FROM scout.scout_service_templates WHERE service_id = $1",
        &[&service_id],
    )
    .await?;

    let stmt = tx
        .prepare(
            "INSERT INTO scout.scout_service_templates (
                service_id,
                start_hour,
                start_minute,
                run_monday,
                run_tuesday,
                run_wednesday,
                run_thursday,
                run_friday,
                run_saturday,
                run_sunday,
                send_cap,
                age_limit,
                scout_type,
                reply_limit,
                job_information_id,
                last_send_count,
                last_send_at
            ) VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10,
                $11, $12, $13, $14, $15, $16, $17
            )",
        )
        .await?;

    for template in templates {
        let (send_cap, age_limit, scout_type, reply_limit, job_information_id) =
            match &template.target {
                TemplateTarget::Ran {
                    send_cap,
                    job_information_id,
                    scout_type,
                } => (
                    Some(*send_cap),
                    None,
                    Some(scout_type.as_str()),
                    None,
                    Some(job_information_id.as_str()),
                ),
                TemplateTarget::MynaviScouting {
                    send_cap,
                    age_limit,
                    reply_limit,
                } => (Some(*send_cap), *age_limit, None, *reply_limit, None),
                TemplateTarget::Ambi {
                    send_cap,
                    scout_type,
                    reply_limit,
                } => (
                    Some(*send_cap),
                    None,
                    Some(scout_type.as_str()),
                    *reply_limit,
                    None,
                ),
                TemplateTarget::MynaviAgentScout => (None, None, None, None, None),
            };

        tx.execute(
            &stmt,
            &[
                &service_id,
                &(i16::from(template.start.hour())),
                &(i16::from(template.start.minute())),
                &template.weekdays.monday,
                &template.weekdays.tuesday,
                &template.weekdays.wednesday,
                &template.weekdays.thursday,
                &template.weekdays.friday,
                &template.weekdays.saturday,
                &template.weekdays.sunday,
                &send_cap,
                &age_limit,
                &scout_type,
                &reply_limit,
                &job_information_id,
                &template.last_send_count,
                &template.last_send_at,
            ],
        )
        .await?;
    }

    Ok(())
}

/// Record one dispatch for a template.
///
/// Compare-and-set on the minute of `last_send_at`: of two dispatcher ticks
/// racing inside the same minute, exactly one update lands; the loser gets
/// `Conflict` and must not fire.
#[instrument(skip(pool))]
pub async fn record_dispatch(
    pool: &PgPool,
    template_id: i64,
    send_count: i32,
    now: DateTime<Utc>,
) -> Result<(), TemplateStorageError> {
    let client = pool.get().await?;
    let stmt = client
        .prepare(
            "UPDATE scout.scout_service_templates
SET
    last_send_count = $2,
    last_send_at = $3,
    updated_at = $3
WHERE id = $1
  AND (last_send_at IS NULL OR date_trunc('minute', last_send_at) <> date_trunc('minute', $3))",
        )
        .await?;

    let updated = client
        .execute(&stmt, &[&template_id, &send_count, &now])
        .await?;

    if updated == 0 {
        let exists = client
            .query_opt(
                "SELECT id FROM scout.scout_service_templates WHERE id = $1",
                &[&template_id],
            )
            .await?;
        return dispatch_outcome(template_id, updated, exists.is_some());
    }

    dispatch_outcome(template_id, updated, true)
}

/// Map the guarded-update result onto the dispatch contract: zero affected
/// rows on an existing template means another tick already recorded this
/// minute.
fn dispatch_outcome(
    template_id: i64,
    updated: u64,
    exists: bool,
) -> Result<(), TemplateStorageError> {
    if updated > 0 {
        return Ok(());
    }
    if exists {
        Err(TemplateStorageError::Conflict(format!(
            "template {template_id} already dispatched this minute"
        )))
    } else {
        Err(TemplateStorageError::NotFound(format!(
            "template {template_id}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_same_minute_recording_maps_to_conflict() {
        // First tick lands the update, the racing tick sees zero rows.
        assert!(dispatch_outcome(7, 1, true).is_ok());
        assert!(matches!(
            dispatch_outcome(7, 0, true),
            Err(TemplateStorageError::Conflict(_))
        ));
    }

    #[test]
    fn missing_template_maps_to_not_found() {
        assert!(matches!(
            dispatch_outcome(7, 0, false),
            Err(TemplateStorageError::NotFound(_))
        ));
    }
}
