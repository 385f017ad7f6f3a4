//! Host harness for previewing a Videohub routing card from files.

pub mod bus;
pub mod input;

pub use bus::LoggingBus;
pub use input::load_config;
pub use input::load_snapshot;
pub use input::LogLevel;
pub use input::RouteAction;
