pub mod dev_status;
pub mod execute;
pub mod role;

pub use dev_status::DevStatus;
pub use execute::{ExecuteRequest, ExecuteResponse, ExitStatus};
pub use role::Role;
