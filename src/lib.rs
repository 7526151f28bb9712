pub mod api;
pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod schema;
pub mod timezone;

pub use error::ModelError;
pub use model::entry_time::ScoutServiceGetEntryTime;
pub use model::robot::AgentRobot;
pub use model::service::{ScoutService, ScoutServiceKind};
pub use model::status::{evaluate_entry_time, evaluate_template, ScheduleStatus};
pub use model::template::{
    AmbiScoutType, RanScoutType, ScoutServiceTemplate, StartTime, TemplateTarget, WeekdaySet,
};
