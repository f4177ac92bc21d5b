pub mod auth;
pub mod authorize;
pub mod response;

pub use auth::{authenticate, resolve_principal};
pub use authorize::{authorize, RouteGuard};
pub use response::{ApiResponse, ApiResult};
