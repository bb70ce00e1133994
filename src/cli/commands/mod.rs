pub mod auth;
pub mod bootstrap;

pub use auth::{auth_command, AuthCommands};
pub use bootstrap::bootstrap_command;
