/// Canonical timezone for schedule evaluation and run-date columns.
///
/// Templates store wall-clock start times in this zone; the dispatcher is
/// expected to convert its tick to Asia/Tokyo before calling `is_due`.
pub const SCHEDULE_TIMEZONE: &str = "Asia/Tokyo";
