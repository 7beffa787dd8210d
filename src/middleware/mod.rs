pub mod auth;
pub mod response;
pub mod validate_college;

pub use auth::{super_admin_middleware, validate_user_middleware, AuthUser};
pub use response::{ApiResponse, ApiResult};
pub use validate_college::{validate_college_middleware, CollegeContext, TenantPool};
