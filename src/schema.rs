/// scout.agent_robots スキーマ定義
pub const AGENT_ROBOTS_DDL: &str = r#"
CREATE TABLE scout.agent_robots (
    id BIGSERIAL PRIMARY KEY,
    agency_id BIGINT NOT NULL,
    name VARCHAR(255) NOT NULL,
    entry_active BOOLEAN NOT NULL DEFAULT false,
    scout_active BOOLEAN NOT NULL DEFAULT false,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
"#;

/// scout.scout_services スキーマ定義
pub const SCOUT_SERVICES_DDL: &str = r#"
CREATE TABLE scout.scout_services (
    id BIGSERIAL PRIMARY KEY,
    robot_id BIGINT NOT NULL REFERENCES scout.agent_robots(id) ON DELETE CASCADE,
    staff_id BIGINT,
    kind VARCHAR(30) NOT NULL,
    login_id VARCHAR(255) NOT NULL,
    password VARCHAR(255) NOT NULL,
    active BOOLEAN NOT NULL DEFAULT false,
    message_template_id BIGINT,
    inflow_channel_id BIGINT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_kind CHECK (kind IN ('ran', 'mynavi_scouting', 'ambi', 'mynavi_agent_scout'))
);
"#;

/// scout.scout_service_templates スキーマ定義
///
/// Platform fields stay as nullable columns on the row; the typed
/// `TemplateTarget` narrowing happens in the model layer on read.
pub const SCOUT_SERVICE_TEMPLATES_DDL: &str = r#"
CREATE TABLE scout.scout_service_templates (
    id BIGSERIAL PRIMARY KEY,
    service_id BIGINT NOT NULL REFERENCES scout.scout_services(id) ON DELETE CASCADE,
    start_hour SMALLINT NOT NULL,
    start_minute SMALLINT NOT NULL,
    run_monday BOOLEAN NOT NULL DEFAULT false,
    run_tuesday BOOLEAN NOT NULL DEFAULT false,
    run_wednesday BOOLEAN NOT NULL DEFAULT false,
    run_thursday BOOLEAN NOT NULL DEFAULT false,
    run_friday BOOLEAN NOT NULL DEFAULT false,
    run_saturday BOOLEAN NOT NULL DEFAULT false,
    run_sunday BOOLEAN NOT NULL DEFAULT false,
    send_cap INTEGER,
    age_limit INTEGER,
    scout_type VARCHAR(30),
    reply_limit INTEGER,
    job_information_id VARCHAR(100),
    last_send_count INTEGER,
    last_send_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_start_hour CHECK (start_hour BETWEEN 0 AND 23),
    CONSTRAINT chk_start_minute CHECK (start_minute BETWEEN 0 AND 59)
);
"#;

/// scout.scout_service_get_entry_times スキーマ定義
pub const SCOUT_SERVICE_GET_ENTRY_TIMES_DDL: &str = r#"
CREATE TABLE scout.scout_service_get_entry_times (
    id BIGSERIAL PRIMARY KEY,
    service_id BIGINT NOT NULL REFERENCES scout.scout_services(id) ON DELETE CASCADE,
    start_hour SMALLINT NOT NULL,
    start_minute SMALLINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    CONSTRAINT chk_entry_start_hour CHECK (start_hour BETWEEN 0 AND 23),
    CONSTRAINT chk_entry_start_minute CHECK (start_minute BETWEEN 0 AND 59)
);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_ddl_contains_required_columns() {
        for required in [
            "service_id",
            "start_hour",
            "start_minute",
            "run_monday",
            "run_sunday",
            "send_cap",
            "age_limit",
            "scout_type",
            "reply_limit",
            "job_information_id",
            "last_send_count",
            "last_send_at",
        ] {
            assert!(
                SCOUT_SERVICE_TEMPLATES_DDL.contains(required),
                "missing column: {required}"
            );
        }
    }

    #[test]
    fn owned_tables_cascade_on_service_delete() {
        assert!(SCOUT_SERVICE_TEMPLATES_DDL.contains("ON DELETE CASCADE"));
        assert!(SCOUT_SERVICE_GET_ENTRY_TIMES_DDL.contains("ON DELETE CASCADE"));
        assert!(SCOUT_SERVICES_DDL.contains("ON DELETE CASCADE"));
    }

    #[test]
    fn service_kind_check_matches_the_enum() {
        for kind in ["ran", "mynavi_scouting", "ambi", "mynavi_agent_scout"] {
            assert!(SCOUT_SERVICES_DDL.contains(kind), "missing kind: {kind}");
        }
    }
}
