pub mod credential;
pub mod session;
pub mod task;
pub mod user;

pub use credential::{Credential, Scope};
pub use session::Session;
pub use task::{Task, TaskAssignmentActivity};
pub use user::{AdminRecord, User};
