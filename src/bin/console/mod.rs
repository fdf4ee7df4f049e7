pub mod acl_commands;
pub mod formatters;
pub mod user_commands;


pub use acl_commands::{execute_acl_command, AclCommands};
pub use formatters::{Output, OutputFormat};
pub use user_commands::{execute_user_command, UserCommands};
