//! Card configuration.
//!
//! Hosts hand the card an untyped mapping, usually parsed from the dashboard's YAML. The
//! mapping is shallow-merged over the defaults (`title`, `auto_discover`); fields with the
//! wrong shape are treated as absent rather than failing the whole card.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

/// Title shown when the configuration does not provide one.
pub const DEFAULT_TITLE: &str = "Videohub Routing";

/// Type discriminator the host uses to look the card up in its registry.
pub const CARD_TYPE: &str = "custom:blackmagic-videohub-card";

/// Immutable card configuration, replaced wholesale on reconfiguration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardConfig {
    /// Host registry discriminator (e.g. "custom:blackmagic-videohub-card")
    #[serde(
        rename = "type",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient"
    )]
    pub card_type: Option<String>,

    #[serde(default = "default_title", deserialize_with = "title_or_default")]
    pub title: String,

    /// Discover output selects from the snapshot when no entities are configured.
    /// Only an explicit `false` disables discovery.
    #[serde(default = "default_true", deserialize_with = "unless_false")]
    pub auto_discover: bool,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_entities"
    )]
    pub entities: Option<Vec<EntityRef>>,

    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_presets"
    )]
    pub presets: Option<Vec<Preset>>,
}

/// An explicitly configured output row.
///
/// Entries without a usable entity id decode to a placeholder with an empty `entity`,
/// which never resolves to a row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub entity: String,

    /// Label override for the row
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub name: Option<String>,
}

impl EntityRef {
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            name: None,
        }
    }

    pub fn named(entity: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            name: Some(name.into()),
        }
    }
}

/// A one-click route.
///
/// When `service` is set the preset calls that service with `data`; otherwise it routes
/// `input` to `output` on the Videohub identified by `entry_id`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub name: Option<String>,

    /// "domain.service_name"
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub service: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient")]
    pub data: Option<Map<String, Value>>,

    // Forwarded to route_output untouched; the integration coerces them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_id: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl Preset {
    /// Button label: the configured name, else "Preset {n}" with a 1-based `n`.
    pub fn label(&self, index: usize) -> String {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Preset {}", index + 1),
        }
    }
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            card_type: None,
            title: default_title(),
            auto_discover: true,
            entities: None,
            presets: None,
        }
    }
}

impl CardConfig {
    /// Build a configuration from the host-supplied mapping.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        match value {
            Value::Null => Err(ConfigError::Missing),
            Value::Object(_) => serde_json::from_value(value).map_err(ConfigError::Parse),
            _ => Err(ConfigError::NotAMapping),
        }
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(contents).map_err(ConfigError::Parse)?;
        Self::from_value(value)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let value: Value = toml::from_str(contents)?;
        Self::from_value(value)
    }

    /// Configured rows, placeholders included; empty when none are configured.
    pub fn entities(&self) -> &[EntityRef] {
        self.entities.as_deref().unwrap_or_default()
    }

    pub fn presets(&self) -> &[Preset] {
        self.presets.as_deref().unwrap_or_default()
    }

    pub fn preset(&self, index: usize) -> Option<&Preset> {
        self.presets().get(index)
    }
}

/// Default configuration offered by the host's card picker.
pub fn stub_config() -> CardConfig {
    CardConfig {
        card_type: Some(CARD_TYPE.to_string()),
        ..CardConfig::default()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: no configuration provided")]
    Missing,

    #[error("Invalid configuration: expected a mapping")]
    NotAMapping,

    #[error("Failed to parse card configuration: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
}

fn default_title() -> String {
    DEFAULT_TITLE.to_string()
}

fn default_true() -> bool {
    true
}

/// Decode `T`, treating a value of any other shape as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn title_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let title: Option<String> = lenient(deserializer)?;
    Ok(title
        .filter(|t| !t.is_empty())
        .unwrap_or_else(default_title))
}

fn unless_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(!matches!(value, Some(Value::Bool(false))))
}

fn lenient_entities<'de, D>(deserializer: D) -> Result<Option<Vec<EntityRef>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(Value::Array(items)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };

    // A configured list stays authoritative even when none of its entries are usable.
    let entities = items
        .into_iter()
        .map(|item| match item {
            Value::String(entity) => EntityRef::new(entity),
            item => serde_json::from_value(item).unwrap_or_default(),
        })
        .collect();
    Ok(Some(entities))
}

// Presets are addressed by index, so malformed entries keep their slot as an empty preset.
fn lenient_presets<'de, D>(deserializer: D) -> Result<Option<Vec<Preset>>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(Value::Array(items)) = Option::<Value>::deserialize(deserializer)? else {
        return Ok(None);
    };

    let presets = items
        .into_iter()
        .map(|item| serde_json::from_value(item).unwrap_or_default())
        .collect();
    Ok(Some(presets))
}
