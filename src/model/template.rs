use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::model::service::ScoutServiceKind;

/// 媒体別の送信数上限テーブル
pub const RAN_SEND_CAPS: &[i32] = &[100, 200, 300];
pub const MYNAVI_SEND_CAPS: &[i32] = &[50, 100, 300, 500];
pub const AMBI_SEND_CAPS: &[i32] = &[50, 200];

/// RANスカウト種別ENUM: ["normal", "again", "send_other"]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RanScoutType {
    Normal,
    Again,
    SendOther,
}

impl RanScoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RanScoutType::Normal => "normal",
            RanScoutType::Again => "again",
            RanScoutType::SendOther => "send_other",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "normal" => Some(RanScoutType::Normal),
            "again" => Some(RanScoutType::Again),
            "send_other" => Some(RanScoutType::SendOther),
            _ => None,
        }
    }
}

/// AMBIスカウト種別ENUM: ["normal", "normal_again", "premium", "premium_again"]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiScoutType {
    Normal,
    NormalAgain,
    Premium,
    PremiumAgain,
}

impl AmbiScoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AmbiScoutType::Normal => "normal",
            AmbiScoutType::NormalAgain => "normal_again",
            AmbiScoutType::Premium => "premium",
            AmbiScoutType::PremiumAgain => "premium_again",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "normal" => Some(AmbiScoutType::Normal),
            "normal_again" => Some(AmbiScoutType::NormalAgain),
            "premium" => Some(AmbiScoutType::Premium),
            "premium_again" => Some(AmbiScoutType::PremiumAgain),
            _ => None,
        }
    }
}

/// Wall-clock daily start time, validated at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartTime {
    hour: u8,
    minute: u8,
}

impl StartTime {
    pub fn new(hour: u8, minute: u8) -> Result<Self, ModelError> {
        if hour > 23 {
            return Err(ModelError::validation(format!(
                "start hour out of range: {hour}"
            )));
        }
        if minute > 59 {
            return Err(ModelError::validation(format!(
                "start minute out of range: {minute}"
            )));
        }
        Ok(Self { hour, minute })
    }

    /// Rebuild from storage columns. Values outside u8 are corrupt rows and
    /// must not wrap around into a plausible time.
    pub fn from_row_values(hour: i16, minute: i16) -> Result<Self, ModelError> {
        let hour = u8::try_from(hour)
            .map_err(|_| ModelError::validation(format!("start hour out of range: {hour}")))?;
        let minute = u8::try_from(minute)
            .map_err(|_| ModelError::validation(format!("start minute out of range: {minute}")))?;
        Self::new(hour, minute)
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Exact-minute match. The dispatcher ticks at least once per minute, so a
    /// window would double-fire and anything coarser would miss.
    pub fn matches_minute(&self, now: &NaiveDateTime) -> bool {
        now.hour() == u32::from(self.hour) && now.minute() == u32::from(self.minute)
    }
}

/// 曜日別の実行フラグ7個
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeekdaySet {
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
}

impl WeekdaySet {
    /// Flags in Monday-first order, matching the column order in storage.
    pub fn from_flags(flags: [bool; 7]) -> Self {
        Self {
            monday: flags[0],
            tuesday: flags[1],
            wednesday: flags[2],
            thursday: flags[3],
            friday: flags[4],
            saturday: flags[5],
            sunday: flags[6],
        }
    }

    pub fn contains(&self, weekday: Weekday) -> bool {
        match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.monday
            || self.tuesday
            || self.wednesday
            || self.thursday
            || self.friday
            || self.saturday
            || self.sunday)
    }
}

/// 媒体固有のターゲティング設定
///
/// The original data model kept these as independent nullable columns on the
/// template row, letting any combination through. Here the fields only exist
/// on the variant of the matching service kind, so a template carrying, say,
/// an age limit for a RAN service is unrepresentable once validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateTarget {
    Ran {
        send_cap: i32,
        job_information_id: String,
        scout_type: RanScoutType,
    },
    MynaviScouting {
        send_cap: i32,
        age_limit: Option<i32>,
        reply_limit: Option<i32>,
    },
    Ambi {
        send_cap: i32,
        scout_type: AmbiScoutType,
        reply_limit: Option<i32>,
    },
    MynaviAgentScout,
}

impl TemplateTarget {
    pub fn kind(&self) -> ScoutServiceKind {
        match self {
            TemplateTarget::Ran { .. } => ScoutServiceKind::Ran,
            TemplateTarget::MynaviScouting { .. } => ScoutServiceKind::MynaviScouting,
            TemplateTarget::Ambi { .. } => ScoutServiceKind::Ambi,
            TemplateTarget::MynaviAgentScout => ScoutServiceKind::MynaviAgentScout,
        }
    }

    pub fn send_cap(&self) -> Option<i32> {
        match self {
            TemplateTarget::Ran { send_cap, .. }
            | TemplateTarget::MynaviScouting { send_cap, .. }
            | TemplateTarget::Ambi { send_cap, .. } => Some(*send_cap),
            TemplateTarget::MynaviAgentScout => None,
        }
    }

    /// Validate the send cap against the per-platform table.
    pub fn validate(&self) -> Result<(), ModelError> {
        let (caps, cap) = match self {
            TemplateTarget::Ran {
                send_cap,
                job_information_id,
                ..
            } => {
                if job_information_id.trim().is_empty() {
                    return Err(ModelError::validation(
                        "job_information_id is required for ran templates",
                    ));
                }
                (RAN_SEND_CAPS, *send_cap)
            }
            TemplateTarget::MynaviScouting {
                send_cap,
                age_limit,
                ..
            } => {
                if let Some(age) = age_limit {
                    if !(18..=99).contains(age) {
                        return Err(ModelError::validation(format!(
                            "age_limit out of range: {age}"
                        )));
                    }
                }
                (MYNAVI_SEND_CAPS, *send_cap)
            }
            TemplateTarget::Ambi { send_cap, .. } => (AMBI_SEND_CAPS, *send_cap),
            TemplateTarget::MynaviAgentScout => return Ok(()),
        };

        if !caps.contains(&cap) {
            return Err(ModelError::validation(format!(
                "send cap {cap} is not offered by {}; valid caps: {caps:?}",
                self.kind().as_str()
            )));
        }
        Ok(())
    }
}

/// スカウト送信テンプレート: 週次スケジュール + キャンペーン設定1件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoutServiceTemplate {
    pub id: i64,
    pub service_id: i64,
    pub start: StartTime,
    pub weekdays: WeekdaySet,
    pub target: TemplateTarget,
    pub last_send_count: Option<i32>,
    pub last_send_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScoutServiceTemplate {
    pub fn new(
        service_id: i64,
        start: StartTime,
        weekdays: WeekdaySet,
        target: TemplateTarget,
    ) -> Result<Self, ModelError> {
        target.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: 0,
            service_id,
            start,
            weekdays,
            target,
            last_send_count: None,
            last_send_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// 発火判定: 実行曜日フラグが立っていて、かつ時:分が完全一致する分だけ真
    ///
    /// `now` is wall-clock time in the schedule timezone (Asia/Tokyo).
    pub fn is_due(&self, now: &NaiveDateTime) -> bool {
        self.weekdays.contains(now.weekday()) && self.start.matches_minute(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn mon_wed_fri_0930(service_id: i64) -> ScoutServiceTemplate {
        ScoutServiceTemplate::new(
            service_id,
            StartTime::new(9, 30).unwrap(),
            WeekdaySet::from_flags([true, false, true, false, true, false, false]),
            TemplateTarget::Ran {
                send_cap: 200,
                job_information_id: "J-100".into(),
                scout_type: RanScoutType::Normal,
            },
        )
        .unwrap()
    }

    #[test]
    fn due_only_on_flagged_weekdays_at_exact_minute() {
        let template = mon_wed_fri_0930(1);

        // 2025-06-02 is a Monday.
        assert!(template.is_due(&at(2025, 6, 2, 9, 30)));
        assert!(template.is_due(&at(2025, 6, 4, 9, 30)));
        assert!(template.is_due(&at(2025, 6, 6, 9, 30)));

        // Tuesday 09:30 and Monday 09:31 both miss.
        assert!(!template.is_due(&at(2025, 6, 3, 9, 30)));
        assert!(!template.is_due(&at(2025, 6, 2, 9, 31)));
        assert!(!template.is_due(&at(2025, 6, 2, 9, 29)));
    }

    #[test]
    fn due_exactly_once_per_scheduled_day() {
        let template = mon_wed_fri_0930(1);
        let monday = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();

        let mut fires = 0;
        for hour in 0..24 {
            for minute in 0..60 {
                if template.is_due(&monday.and_hms_opt(hour, minute, 0).unwrap()) {
                    fires += 1;
                }
            }
        }
        assert_eq!(fires, 1);
    }

    #[test]
    fn midnight_schedule_does_not_drift_across_day_boundary() {
        let template = ScoutServiceTemplate::new(
            1,
            StartTime::new(0, 0).unwrap(),
            WeekdaySet::from_flags([true, false, false, false, false, false, false]),
            TemplateTarget::Ambi {
                send_cap: 50,
                scout_type: AmbiScoutType::Premium,
                reply_limit: None,
            },
        )
        .unwrap();

        // Sunday 23:59 is not Monday 00:00.
        assert!(!template.is_due(&at(2025, 6, 1, 23, 59)));
        assert!(template.is_due(&at(2025, 6, 2, 0, 0)));
        assert!(!template.is_due(&at(2025, 6, 2, 0, 1)));
    }

    #[test]
    fn start_time_rejects_out_of_range() {
        assert!(StartTime::new(24, 0).is_err());
        assert!(StartTime::new(0, 60).is_err());
        assert!(StartTime::new(23, 59).is_ok());
    }

    #[test]
    fn corrupt_row_values_do_not_wrap_into_a_valid_time() {
        // 300 would truncate to 44 under a plain `as u8` cast.
        assert!(StartTime::from_row_values(300, 0).is_err());
        assert!(StartTime::from_row_values(-1, 30).is_err());
        assert!(StartTime::from_row_values(0, 300).is_err());
        assert_eq!(
            StartTime::from_row_values(9, 30).unwrap(),
            StartTime::new(9, 30).unwrap()
        );
    }

    #[test]
    fn send_caps_are_validated_per_platform() {
        let bad = TemplateTarget::Ran {
            send_cap: 500,
            job_information_id: "J-1".into(),
            scout_type: RanScoutType::Again,
        };
        assert!(matches!(bad.validate(), Err(ModelError::Validation(_))));

        let ok = TemplateTarget::MynaviScouting {
            send_cap: 500,
            age_limit: Some(35),
            reply_limit: Some(10),
        };
        assert!(ok.validate().is_ok());

        let ambi = TemplateTarget::Ambi {
            send_cap: 100,
            scout_type: AmbiScoutType::Normal,
            reply_limit: None,
        };
        assert!(ambi.validate().is_err());
    }

    #[test]
    fn ran_requires_job_information_id() {
        let target = TemplateTarget::Ran {
            send_cap: 100,
            job_information_id: "  ".into(),
            scout_type: RanScoutType::Normal,
        };
        assert!(matches!(target.validate(), Err(ModelError::Validation(_))));
    }
}
