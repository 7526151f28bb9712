use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// スカウト媒体ENUM: ["ran", "mynavi_scouting", "ambi", "mynavi_agent_scout"]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoutServiceKind {
    Ran,
    MynaviScouting,
    Ambi,
    MynaviAgentScout,
}

impl ScoutServiceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoutServiceKind::Ran => "ran",
            ScoutServiceKind::MynaviScouting => "mynavi_scouting",
            ScoutServiceKind::Ambi => "ambi",
            ScoutServiceKind::MynaviAgentScout => "mynavi_agent_scout",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "ran" => Some(ScoutServiceKind::Ran),
            "mynavi_scouting" => Some(ScoutServiceKind::MynaviScouting),
            "ambi" => Some(ScoutServiceKind::Ambi),
            "mynavi_agent_scout" => Some(ScoutServiceKind::MynaviAgentScout),
            _ => None,
        }
    }
}

/// スカウトサービス: ロボットから外部媒体への認証付き接続1件
///
/// A service is either Inactive or Active. While Inactive the dispatcher must
/// skip its templates and entry times entirely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoutService {
    pub id: i64,
    pub robot_id: i64,
    pub staff_id: Option<i64>,
    pub kind: ScoutServiceKind,
    pub login_id: String,
    pub password: String,
    pub active: bool,
    pub message_template_id: Option<i64>,
    pub inflow_channel_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScoutService {
    pub fn new(robot_id: i64, kind: ScoutServiceKind, login_id: &str, password: &str) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            robot_id,
            staff_id: None,
            kind,
            login_id: login_id.to_string(),
            password: password.to_string(),
            active: false,
            message_template_id: None,
            inflow_channel_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn has_credentials(&self) -> bool {
        !self.login_id.trim().is_empty() && !self.password.trim().is_empty()
    }

    /// Inactive → Active. 認証情報が空の場合は遷移しない。
    pub fn activate(&mut self) -> Result<(), ModelError> {
        if !self.has_credentials() {
            return Err(ModelError::validation(
                "cannot activate scout service without login credentials",
            ));
        }
        self.active = true;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn deactivate(&mut self) {
        self.active = false;
        self.updated_at = Utc::now();
    }

    /// Credential rotation without touching the rest of the configuration.
    pub fn rotate_password(&mut self, password: &str) -> Result<(), ModelError> {
        if password.trim().is_empty() {
            return Err(ModelError::validation("password must not be empty"));
        }
        self.password = password.to_string();
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_as_str() {
        for kind in [
            ScoutServiceKind::Ran,
            ScoutServiceKind::MynaviScouting,
            ScoutServiceKind::Ambi,
            ScoutServiceKind::MynaviAgentScout,
        ] {
            assert_eq!(ScoutServiceKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ScoutServiceKind::parse("doda"), None);
    }

    #[test]
    fn activation_requires_credentials() {
        let mut service = ScoutService::new(1, ScoutServiceKind::Ran, "", "");
        let err = service.activate().unwrap_err();
        assert!(matches!(err, ModelError::Validation(_)));
        assert!(!service.active);

        service.login_id = "agency-001".into();
        service.password = "hunter2".into();
        service.activate().unwrap();
        assert!(service.active);
    }

    #[test]
    fn password_rotation_rejects_empty() {
        let mut service = ScoutService::new(1, ScoutServiceKind::Ambi, "login", "old");
        assert!(service.rotate_password("  ").is_err());
        service.rotate_password("new-secret").unwrap();
        assert_eq!(service.password, "new-secret");
    }
}
