//! Loading preview inputs and parsing command-line actions.

use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use tracing_subscriber::filter::LevelFilter;
use videohub_card::CardConfig;
use videohub_card::Snapshot;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

/// A row change given on the command line as `<entity>=<option>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAction {
    pub entity: String,
    pub option: String,
}

impl FromStr for RouteAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (entity, option) = s
            .split_once('=')
            .filter(|(entity, _)| !entity.is_empty())
            .ok_or_else(|| format!("expected <entity>=<option>, got {:?}", s))?;
        Ok(Self {
            entity: entity.to_string(),
            option: option.to_string(),
        })
    }
}

/// Load a card configuration. `.json` files are read as JSON, anything else as TOML.
pub fn load_config(path: impl AsRef<Path>) -> anyhow::Result<CardConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read card config {}", path.display()))?;

    let config = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => CardConfig::from_json_str(&contents),
        _ => CardConfig::from_toml_str(&contents),
    };
    config.with_context(|| format!("Invalid card config {}", path.display()))
}

/// Load a JSON state snapshot (`entity_id -> {state, attributes}`).
pub fn load_snapshot(path: impl AsRef<Path>) -> anyhow::Result<Snapshot> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read state snapshot {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid state snapshot {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_route_action() {
        let action: RouteAction = "select.videohub_output_1=2: Camera = 2".parse().unwrap();
        assert_eq!(action.entity, "select.videohub_output_1");
        assert_eq!(action.option, "2: Camera = 2");

        assert!("select.videohub_output_1".parse::<RouteAction>().is_err());
        assert!("=2: Camera 2".parse::<RouteAction>().is_err());
    }

    #[test]
    fn test_log_level_filter() {
        assert_eq!(LevelFilter::from(LogLevel::default()), LevelFilter::INFO);
        assert_eq!(LevelFilter::from(LogLevel::Trace), LevelFilter::TRACE);
    }
}
