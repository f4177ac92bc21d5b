// handlers/elevated/mod.rs - Elevated handlers (administrators and maintainers)
//
// User management, access request review and reporting.

pub mod administrative_activity;
pub mod report;
pub mod user;
