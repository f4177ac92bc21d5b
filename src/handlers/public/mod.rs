// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Code tables for the forms, the read-only view of published projects, and
// signed file downloads.

pub mod codes;
pub mod files;
pub mod project;
pub mod search;

pub use codes::codes_get;
pub use files::file_get;
pub use project::{project_view, projects_list};
pub use search::search_get;
