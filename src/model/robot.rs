use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// エージェントロボット: 1代理店に属する自動化ユニット
///
/// The two active flags gate everything underneath: no scout service may be
/// created (and no scouting may be enabled) while `scout_active` is false, and
/// no entry collection may run while `entry_active` is false.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRobot {
    pub id: i64,
    pub agency_id: i64,
    pub name: String,
    pub entry_active: bool,
    pub scout_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentRobot {
    pub fn new(agency_id: i64, name: &str) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            agency_id,
            name: name.to_string(),
            entry_active: false,
            scout_active: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn can_create_entry(&self) -> bool {
        self.entry_active
    }

    pub fn can_create_scout(&self) -> bool {
        self.scout_active
    }

    /// Gate check used before any entry-side creation. No side effects.
    pub fn ensure_entry_allowed(&self) -> Result<(), ModelError> {
        if self.can_create_entry() {
            Ok(())
        } else {
            Err(ModelError::permission_denied(format!(
                "robot {} is not permitted to collect entries",
                self.id
            )))
        }
    }

    /// Gate check used before creating a scout service or enabling scouting.
    pub fn ensure_scout_allowed(&self) -> Result<(), ModelError> {
        if self.can_create_scout() {
            Ok(())
        } else {
            Err(ModelError::permission_denied(format!(
                "robot {} is not permitted to scout",
                self.id
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_robot_starts_fully_gated() {
        let robot = AgentRobot::new(10, "第一営業ロボ");
        assert!(!robot.can_create_entry());
        assert!(!robot.can_create_scout());
    }

    #[test]
    fn gated_robot_denies_entry_creation() {
        let robot = AgentRobot::new(10, "robot");
        let err = robot.ensure_entry_allowed().unwrap_err();
        assert!(matches!(err, ModelError::PermissionDenied(_)));
    }

    #[test]
    fn active_flags_open_the_gates() {
        let mut robot = AgentRobot::new(10, "robot");
        robot.entry_active = true;
        robot.scout_active = true;
        assert!(robot.ensure_entry_allowed().is_ok());
        assert!(robot.ensure_scout_allowed().is_ok());
    }
}
