pub mod app;
pub mod commands;
pub mod context;

pub use app::{Cli, Commands, GlobalArgs};
pub use context::CommandContext;
