use serde::Deserialize;

use crate::error::ModelError;
use crate::model::robot::AgentRobot;
use crate::model::service::{ScoutService, ScoutServiceKind};
use crate::model::template::{
    AmbiScoutType, RanScoutType, StartTime, TemplateTarget, WeekdaySet,
};

/// テンプレート設定リクエスト（媒体共通のフラット形）
///
/// The wire shape mirrors the original untyped row: every platform field is
/// optional here, and `validate` narrows it into the typed `TemplateTarget`
/// for the service's kind. Fields the kind does not support are rejected, not
/// dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoutServiceTemplateParam {
    pub start_hour: u8,
    pub start_minute: u8,
    pub run_monday: bool,
    pub run_tuesday: bool,
    pub run_wednesday: bool,
    pub run_thursday: bool,
    pub run_friday: bool,
    pub run_saturday: bool,
    pub run_sunday: bool,
    #[serde(default)]
    pub send_cap: Option<i32>,
    #[serde(default)]
    pub age_limit: Option<i32>,
    #[serde(default)]
    pub scout_type: Option<String>,
    #[serde(default)]
    pub reply_limit: Option<i32>,
    #[serde(default)]
    pub job_information_id: Option<String>,
}

impl ScoutServiceTemplateParam {
    pub fn start_time(&self) -> Result<StartTime, ModelError> {
        StartTime::new(self.start_hour, self.start_minute)
    }

    pub fn weekdays(&self) -> Result<WeekdaySet, ModelError> {
        let set = WeekdaySet::from_flags([
            self.run_monday,
            self.run_tuesday,
            self.run_wednesday,
            self.run_thursday,
            self.run_friday,
            self.run_saturday,
            self.run_sunday,
        ]);
        if set.is_empty() {
            return Err(ModelError::validation(
                "template must run on at least one weekday",
            ));
        }
        Ok(set)
    }

    fn reject_field(&self, kind: ScoutServiceKind, field: &str) -> ModelError {
        ModelError::validation(format!(
            "{field} is not supported by {}",
            kind.as_str()
        ))
    }

    fn required_cap(&self, kind: ScoutServiceKind) -> Result<i32, ModelError> {
        self.send_cap.ok_or_else(|| {
            ModelError::validation(format!("send_cap is required for {}", kind.as_str()))
        })
    }

    /// Narrow the flat fields into the target for `kind`.
    pub fn target(&self, kind: ScoutServiceKind) -> Result<TemplateTarget, ModelError> {
        let target = match kind {
            ScoutServiceKind::Ran => {
                if self.age_limit.is_some() {
                    return Err(self.reject_field(kind, "age_limit"));
                }
                if self.reply_limit.is_some() {
                    return Err(self.reject_field(kind, "reply_limit"));
                }
                let job_information_id = self.job_information_id.clone().ok_or_else(|| {
                    ModelError::validation("job_information_id is required for ran")
                })?;
                let scout_type = match &self.scout_type {
                    Some(raw) => RanScoutType::parse(raw).ok_or_else(|| {
                        ModelError::validation(format!("unknown ran scout_type: {raw}"))
                    })?,
                    None => RanScoutType::Normal,
                };
                TemplateTarget::Ran {
                    send_cap: self.required_cap(kind)?,
                    job_information_id,
                    scout_type,
                }
            }
            ScoutServiceKind::MynaviScouting => {
                if self.scout_type.is_some() {
                    return Err(self.reject_field(kind, "scout_type"));
                }
                if self.job_information_id.is_some() {
                    return Err(self.reject_field(kind, "job_information_id"));
                }
                TemplateTarget::MynaviScouting {
                    send_cap: self.required_cap(kind)?,
                    age_limit: self.age_limit,
                    reply_limit: self.reply_limit,
                }
            }
            ScoutServiceKind::Ambi => {
                if self.age_limit.is_some() {
                    return Err(self.reject_field(kind, "age_limit"));
                }
                if self.job_information_id.is_some() {
                    return Err(self.reject_field(kind, "job_information_id"));
                }
                let scout_type = match &self.scout_type {
                    Some(raw) => AmbiScoutType::parse(raw).ok_or_else(|| {
                        ModelError::validation(format!("unknown ambi scout_type: {raw}"))
                    })?,
                    None => AmbiScoutType::Normal,
                };
                TemplateTarget::Ambi {
                    send_cap: self.required_cap(kind)?,
                    scout_type,
                    reply_limit: self.reply_limit,
                }
            }
            ScoutServiceKind::MynaviAgentScout => {
                if self.send_cap.is_some() {
                    return Err(self.reject_field(kind, "send_cap"));
                }
                if self.age_limit.is_some()
                    || self.scout_type.is_some()
                    || self.reply_limit.is_some()
                    || self.job_information_id.is_some()
                {
                    return Err(ModelError::validation(
                        "mynavi_agent_scout templates carry no platform fields",
                    ));
                }
                TemplateTarget::MynaviAgentScout
            }
        };

        target.validate()?;
        Ok(target)
    }
}

/// エントリー取得時刻リクエスト
#[derive(Debug, Clone, Deserialize)]
pub struct GetEntryTimeParam {
    pub start_hour: u8,
    pub start_minute: u8,
}

impl GetEntryTimeParam {
    pub fn start_time(&self) -> Result<StartTime, ModelError> {
        StartTime::new(self.start_hour, self.start_minute)
    }
}

/// サービス作成リクエスト: テンプレート群とエントリー取得時刻群を同梱
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScoutServiceParam {
    pub robot_id: i64,
    #[serde(default)]
    pub staff_id: Option<i64>,
    pub kind: ScoutServiceKind,
    pub login_id: String,
    pub password: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub message_template_id: Option<i64>,
    #[serde(default)]
    pub inflow_channel_id: Option<i64>,
    #[serde(default)]
    pub templates: Vec<ScoutServiceTemplateParam>,
    #[serde(default)]
    pub entry_times: Vec<GetEntryTimeParam>,
}

impl CreateScoutServiceParam {
    /// Gate checks against the owning robot, then build the service row.
    /// Fails with `PermissionDenied` before any validation side effects.
    /// Entry-time configuration additionally needs the entry gate open.
    pub fn validate(&self, robot: &AgentRobot) -> Result<ScoutService, ModelError> {
        robot.ensure_scout_allowed()?;
        if !self.entry_times.is_empty() {
            robot.ensure_entry_allowed()?;
        }

        for template in &self.templates {
            template.start_time()?;
            template.weekdays()?;
            template.target(self.kind)?;
        }
        for entry_time in &self.entry_times {
            entry_time.start_time()?;
        }

        let mut service = ScoutService::new(
            robot.id,
            self.kind,
            self.login_id.trim(),
            self.password.trim(),
        );
        service.staff_id = self.staff_id;
        service.message_template_id = self.message_template_id;
        service.inflow_channel_id = self.inflow_channel_id;
        if self.active {
            service.activate()?;
        }
        Ok(service)
    }
}

/// サービス更新リクエスト（部分更新、認証情報は別口）
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateScoutServiceParam {
    pub service_id: i64,
    #[serde(default)]
    pub staff_id: Option<i64>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub message_template_id: Option<i64>,
    #[serde(default)]
    pub inflow_channel_id: Option<i64>,
    #[serde(default)]
    pub templates: Option<Vec<ScoutServiceTemplateParam>>,
    #[serde(default)]
    pub entry_times: Option<Vec<GetEntryTimeParam>>,
}

impl UpdateScoutServiceParam {
    pub fn apply(&self, robot: &AgentRobot, service: &mut ScoutService) -> Result<(), ModelError> {
        if let Some(templates) = &self.templates {
            for template in templates {
                template.start_time()?;
                template.weekdays()?;
                template.target(service.kind)?;
            }
        }
        if let Some(entry_times) = &self.entry_times {
            if !entry_times.is_empty() {
                robot.ensure_entry_allowed()?;
            }
            for entry_time in entry_times {
                entry_time.start_time()?;
            }
        }

        if let Some(staff_id) = self.staff_id {
            service.staff_id = Some(staff_id);
        }
        if let Some(message_template_id) = self.message_template_id {
            service.message_template_id = Some(message_template_id);
        }
        if let Some(inflow_channel_id) = self.inflow_channel_id {
            service.inflow_channel_id = Some(inflow_channel_id);
        }
        match self.active {
            Some(true) => {
                robot.ensure_scout_allowed()?;
                service.activate()?;
            }
            Some(false) => service.deactivate(),
            None => {}
        }
        Ok(())
    }
}

/// パスワードのみの更新（設定全体の再送を避ける狭い操作）
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePasswordParam {
    pub service_id: i64,
    pub password: String,
}

impl UpdatePasswordParam {
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.password.trim().is_empty() {
            return Err(ModelError::validation("password must not be empty"));
        }
        Ok(())
    }
}

/// サービス削除リクエスト: 終端操作、配下のテンプレート/取得時刻も同時に消える
#[derive(Debug, Clone, Deserialize)]
pub struct DeleteScoutServiceParam {
    pub service_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_template_param() -> ScoutServiceTemplateParam {
        ScoutServiceTemplateParam {
            start_hour: 9,
            start_minute: 30,
            run_monday: true,
            run_tuesday: false,
            run_wednesday: true,
            run_thursday: false,
            run_friday: true,
            run_saturday: false,
            run_sunday: false,
            send_cap: Some(200),
            age_limit: None,
            scout_type: None,
            reply_limit: None,
            job_information_id: Some("J-100".into()),
        }
    }

    #[test]
    fn ran_template_with_age_limit_is_rejected() {
        let mut param = base_template_param();
        param.age_limit = Some(35);
        let err = param.target(ScoutServiceKind::Ran).unwrap_err();
        assert!(matches!(err, ModelError::Validation(_)));
    }

    #[test]
    fn ran_template_with_job_information_id_passes() {
        let param = base_template_param();
        let target = param.target(ScoutServiceKind::Ran).unwrap();
        assert_eq!(target.send_cap(), Some(200));
        assert!(matches!(target, TemplateTarget::Ran { .. }));
    }

    #[test]
    fn empty_weekday_mask_is_rejected() {
        let mut param = base_template_param();
        param.run_monday = false;
        param.run_wednesday = false;
        param.run_friday = false;
        assert!(param.weekdays().is_err());
    }

    #[test]
    fn create_against_gated_robot_is_denied_before_validation() {
        let robot = AgentRobot::new(1, "robot");

        let param = CreateScoutServiceParam {
            robot_id: robot.id,
            staff_id: None,
            kind: ScoutServiceKind::Ran,
            login_id: "login".into(),
            password: "secret".into(),
            active: false,
            message_template_id: None,
            inflow_channel_id: None,
            // Invalid template on purpose: the gate must fire first.
            templates: vec![{
                let mut t = base_template_param();
                t.send_cap = Some(999);
                t
            }],
            entry_times: vec![],
        };

        let err = param.validate(&robot).unwrap_err();
        assert!(matches!(err, ModelError::PermissionDenied(_)));
    }

    #[test]
    fn create_with_active_flag_requires_credentials() {
        let mut robot = AgentRobot::new(1, "robot");
        robot.scout_active = true;

        let param = CreateScoutServiceParam {
            robot_id: robot.id,
            staff_id: None,
            kind: ScoutServiceKind::MynaviScouting,
            login_id: "".into(),
            password: "".into(),
            active: true,
            message_template_id: None,
            inflow_channel_id: None,
            templates: vec![],
            entry_times: vec![],
        };

        assert!(matches!(
            param.validate(&robot),
            Err(ModelError::Validation(_))
        ));
    }

    #[test]
    fn update_enabling_scout_rechecks_the_robot_gate() {
        let mut robot = AgentRobot::new(1, "robot");
        robot.scout_active = true;
        let mut service = ScoutService::new(robot.id, ScoutServiceKind::Ambi, "login", "secret");

        robot.scout_active = false;
        let param = UpdateScoutServiceParam {
            service_id: service.id,
            staff_id: None,
            active: Some(true),
            message_template_id: None,
            inflow_channel_id: None,
            templates: None,
            entry_times: None,
        };

        let err = param.apply(&robot, &mut service).unwrap_err();
        assert!(matches!(err, ModelError::PermissionDenied(_)));
        assert!(!service.active);
    }

    #[test]
    fn entry_times_require_the_entry_gate() {
        let mut robot = AgentRobot::new(1, "robot");
        robot.scout_active = true;

        let param = CreateScoutServiceParam {
            robot_id: robot.id,
            staff_id: None,
            kind: ScoutServiceKind::Ran,
            login_id: "login".into(),
            password: "secret".into(),
            active: false,
            message_template_id: None,
            inflow_channel_id: None,
            templates: vec![],
            entry_times: vec![GetEntryTimeParam {
                start_hour: 7,
                start_minute: 0,
            }],
        };

        let err = param.validate(&robot).unwrap_err();
        assert!(matches!(err, ModelError::PermissionDenied(_)));

        robot.entry_active = true;
        assert!(param.validate(&robot).is_ok());
    }

    #[test]
    fn update_adding_entry_times_rechecks_the_entry_gate() {
        let mut robot = AgentRobot::new(1, "robot");
        robot.scout_active = true;
        let mut service = ScoutService::new(robot.id, ScoutServiceKind::Ran, "login", "secret");

        let param = UpdateScoutServiceParam {
            service_id: service.id,
            staff_id: None,
            active: None,
            message_template_id: None,
            inflow_channel_id: None,
            templates: None,
            entry_times: Some(vec![GetEntryTimeParam {
                start_hour: 7,
                start_minute: 0,
            }]),
        };

        let err = param.apply(&robot, &mut service).unwrap_err();
        assert!(matches!(err, ModelError::PermissionDenied(_)));

        // Clearing the set needs no gate.
        let clearing = UpdateScoutServiceParam {
            entry_times: Some(vec![]),
            ..param.clone()
        };
        assert!(clearing.apply(&robot, &mut service).is_ok());
    }

    #[test]
    fn agent_scout_rejects_send_cap() {
        let mut param = base_template_param();
        param.job_information_id = None;
        let err = param.target(ScoutServiceKind::MynaviAgentScout).unwrap_err();
        assert!(matches!(err, ModelError::Validation(_)));
    }
}
