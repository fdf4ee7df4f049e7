pub mod acl_editor;
pub mod api_client;
pub mod traits;
pub mod users;

pub use acl_editor::{AclEditor, ConsoleSnapshot, SaveReport};
pub use api_client::{ApiErrorBody, ConsoleApiClient};
pub use traits::{AclFilter, ConsoleBackend};
pub use users::{CreateUserRequest, ScramMechanism};
