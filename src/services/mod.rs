pub mod administrative_activity_service;
pub mod attachment_service;
pub mod code_service;
pub mod draft_service;
pub mod notify_service;
pub mod project_service;
pub mod region_service;
pub mod report_service;
pub mod search_service;
pub mod spatial_service;
pub mod user_service;

pub use administrative_activity_service::AdministrativeActivityService;
pub use attachment_service::AttachmentService;
pub use code_service::{fetch_codes, CodeSetSource};
pub use draft_service::DraftService;
pub use notify_service::{NotifyError, NotifyService};
pub use project_service::ProjectService;
pub use region_service::{RegionError, RegionService};
pub use report_service::ReportService;
pub use search_service::SearchService;
pub use spatial_service::SpatialService;
pub use user_service::UserService;

use crate::error::{ApiError, ApiResult};

/// Operations that write on behalf of the caller need a resolved id.
pub fn require_system_user_id(system_user_id: Option<i32>) -> ApiResult<i32> {
    system_user_id.ok_or_else(|| ApiError::internal_server_error("Failed to identify system user ID"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_system_user_id_is_a_server_error() {
        assert_eq!(require_system_user_id(Some(7)).unwrap(), 7);

        let err = require_system_user_id(None).unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.message(), "Failed to identify system user ID");
    }
}
