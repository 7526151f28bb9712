pub mod entry_time;
pub mod robot;
pub mod service;
pub mod status;
pub mod template;

pub use entry_time::ScoutServiceGetEntryTime;
pub use robot::AgentRobot;
pub use service::{ScoutService, ScoutServiceKind};
pub use status::{evaluate_entry_time, evaluate_template, ScheduleStatus};
pub use template::{
    AmbiScoutType, RanScoutType, ScoutServiceTemplate, StartTime, TemplateTarget, WeekdaySet,
};
