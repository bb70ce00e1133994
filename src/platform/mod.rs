//! Capabilities the auth layer needs from the outside world
//!
//! File access, environment variables and the clock are injected as traits
//! so tests can swap in deterministic in-memory versions.

pub mod environment;
pub mod filesystem;
pub mod time;

pub use environment::{Environment, MockEnvironment, OsEnvironment};
pub use filesystem::{FileSystem, MockFileSystem, OsFileSystem};
pub use time::{MockTimeService, SystemTimeService, TimeService};
