pub mod activity;
pub mod auth;
pub mod membership;
pub mod permission;
pub mod response;

pub use activity::activity_middleware;
pub use auth::{authenticate_middleware, AuthContext, AuthMethod};
pub use membership::{membership_middleware, MembershipGate};
pub use permission::permission_middleware;
pub use response::{ApiResponse, ApiResult};
