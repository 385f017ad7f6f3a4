//! Routing card for Blackmagic Videohub outputs.
//!
//! The card turns a host state snapshot into one selector row per router output plus
//! optional preset buttons, and issues routing commands through the host's command bus.
//! Each command keeps its row or preset disabled until the command settles.

pub mod bus;
pub mod card;
pub mod config;
pub mod escape;
pub mod registry;
mod render;
pub mod resolver;
pub mod snapshot;
pub mod tracker;
pub mod view;

pub use bus::CommandBus;
pub use bus::CommandError;
pub use bus::ServiceCall;
pub use card::Card;
pub use card::Dispatch;
pub use card::SkipReason;
pub use config::stub_config;
pub use config::CardConfig;
pub use config::ConfigError;
pub use config::EntityRef;
pub use config::Preset;
pub use escape::Markup;
pub use registry::find_card;
pub use registry::CardRegistration;
pub use resolver::resolve;
pub use resolver::OutputRow;
pub use snapshot::EntityState;
pub use snapshot::Snapshot;
pub use tracker::CommandKey;
pub use tracker::Tracker;
pub use view::synthesize;
pub use view::View;
