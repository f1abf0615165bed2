pub mod auth;
pub mod response;

pub use auth::{bearer_token, jwt_auth_middleware};
pub use response::{ApiResponse, ApiResult};
