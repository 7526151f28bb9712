use serde::Deserialize;

use crate::error::ModelError;
use crate::model::robot::AgentRobot;

/// 管理画面からのロボット作成リクエスト
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAgentRobotParam {
    pub agency_id: i64,
    pub name: String,
    #[serde(default)]
    pub entry_active: bool,
    #[serde(default)]
    pub scout_active: bool,
}

impl CreateAgentRobotParam {
    pub fn validate(&self) -> Result<AgentRobot, ModelError> {
        if self.name.trim().is_empty() {
            return Err(ModelError::validation("robot name must not be empty"));
        }
        let mut robot = AgentRobot::new(self.agency_id, self.name.trim());
        robot.entry_active = self.entry_active;
        robot.scout_active = self.scout_active;
        Ok(robot)
    }
}

/// ロボット更新リクエスト（部分更新）
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateAgentRobotParam {
    pub robot_id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub entry_active: Option<bool>,
    #[serde(default)]
    pub scout_active: Option<bool>,
}

impl UpdateAgentRobotParam {
    /// Apply the requested changes onto an existing row.
    pub fn apply(&self, robot: &mut AgentRobot) -> Result<(), ModelError> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(ModelError::validation("robot name must not be empty"));
            }
            robot.name = name.trim().to_string();
        }
        if let Some(entry_active) = self.entry_active {
            robot.entry_active = entry_active;
        }
        if let Some(scout_active) = self.scout_active {
            robot.scout_active = scout_active;
        }
        robot.updated_at = chrono::Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_rejects_blank_name() {
        let param = CreateAgentRobotParam {
            agency_id: 5,
            name: "   ".into(),
            entry_active: false,
            scout_active: false,
        };
        assert!(matches!(param.validate(), Err(ModelError::Validation(_))));
    }

    #[test]
    fn update_toggles_only_requested_flags() {
        let mut robot = AgentRobot::new(5, "robot");
        robot.entry_active = true;

        let param = UpdateAgentRobotParam {
            robot_id: robot.id,
            name: None,
            entry_active: None,
            scout_active: Some(true),
        };
        param.apply(&mut robot).unwrap();

        assert!(robot.entry_active);
        assert!(robot.scout_active);
        assert_eq!(robot.name, "robot");
    }
}
