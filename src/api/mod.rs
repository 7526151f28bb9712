pub mod robot_param;
pub mod service_param;

pub use robot_param::{CreateAgentRobotParam, UpdateAgentRobotParam};
pub use service_param::{
    CreateScoutServiceParam, DeleteScoutServiceParam, GetEntryTimeParam, ScoutServiceTemplateParam,
    UpdatePasswordParam, UpdateScoutServiceParam,
};
