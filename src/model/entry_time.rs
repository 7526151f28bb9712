use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::template::StartTime;

/// エントリー取得時刻: 媒体の新着応募をポーリングする日次スケジュール
///
/// Independent of the send template; a service may poll for entries without
/// ever sending scouts. Runs every day, no weekday mask.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoutServiceGetEntryTime {
    pub id: i64,
    pub service_id: i64,
    pub start: StartTime,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScoutServiceGetEntryTime {
    pub fn new(service_id: i64, start: StartTime) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            service_id,
            start,
            created_at: now,
            updated_at: now,
        }
    }

    /// 発火判定: 時:分の完全一致のみ（曜日は見ない）
    pub fn is_due(&self, now: &NaiveDateTime) -> bool {
        self.start.matches_minute(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn due_every_day_at_the_configured_minute() {
        let entry = ScoutServiceGetEntryTime::new(1, StartTime::new(7, 15).unwrap());

        for day in 1..=7 {
            let hit = NaiveDate::from_ymd_opt(2025, 6, day)
                .unwrap()
                .and_hms_opt(7, 15, 0)
                .unwrap();
            assert!(entry.is_due(&hit));

            let miss = NaiveDate::from_ymd_opt(2025, 6, day)
                .unwrap()
                .and_hms_opt(7, 16, 0)
                .unwrap();
            assert!(!entry.is_due(&miss));
        }
    }
}
