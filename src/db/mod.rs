pub mod entry_times;
pub mod migrations;
pub mod pool;
pub mod robots;
pub mod services;
pub mod templates;

// Keep re-exports unique so downstream crates see a single symbol per helper.
pub use entry_times::{list_entry_times, replace_entry_times, EntryTimeStorageError};
pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool_from_url, DbPoolError, PgPool};
pub use robots::{fetch_robot, upsert_robot, RobotStorageError};
pub use services::{
    create_service, delete_service, fetch_active_schedules, fetch_service, update_password,
    update_service, ActiveSchedule, ServiceStorageError,
};
pub use templates::{
    list_templates, record_dispatch, replace_templates, TemplateStorageError,
};
