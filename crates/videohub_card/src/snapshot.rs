use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;

/// Read-only picture of every entity the host knows about.
///
/// Entities are kept in identifier order so that every pass over the snapshot sees the
/// same sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    entities: BTreeMap<String, EntityState>,
}

/// State of a single entity: its current option plus the attributes the card reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityState {
    /// Currently selected option
    pub state: String,
    pub attributes: Attributes,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Attributes {
    pub friendly_name: Option<String>,

    /// Legal options for a select entity, in display order
    pub options: Vec<String>,
}

impl Snapshot {
    /// Decode a host state mapping (`entity_id -> {state, attributes}`).
    ///
    /// Entries whose shape does not match are left out of the snapshot.
    pub fn from_value(value: Value) -> Result<Self, SnapshotError> {
        let Value::Object(states) = value else {
            return Err(SnapshotError::NotAMapping);
        };

        let entities = states
            .into_iter()
            .filter_map(|(entity_id, state)| {
                EntityState::from_value(&state).map(|state| (entity_id, state))
            })
            .collect();
        Ok(Self { entities })
    }

    pub fn insert(&mut self, entity_id: impl Into<String>, state: EntityState) {
        self.entities.insert(entity_id.into(), state);
    }

    pub fn get(&self, entity_id: &str) -> Option<&EntityState> {
        self.entities.get(entity_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityState)> {
        self.entities.iter().map(|(id, state)| (id.as_str(), state))
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl FromIterator<(String, EntityState)> for Snapshot {
    fn from_iter<T: IntoIterator<Item = (String, EntityState)>>(iter: T) -> Self {
        Self {
            entities: iter.into_iter().collect(),
        }
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Snapshot::from_value(value).map_err(D::Error::custom)
    }
}

impl EntityState {
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
            attributes: Attributes::default(),
        }
    }

    pub fn with_friendly_name(mut self, name: impl Into<String>) -> Self {
        self.attributes.friendly_name = Some(name.into());
        self
    }

    pub fn with_options<S: Into<String>>(mut self, options: impl IntoIterator<Item = S>) -> Self {
        self.attributes.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Decode one HA-style state object. Returns `None` when `state` is not a string.
    ///
    /// A non-string or empty friendly name is dropped, as is a non-list `options`
    /// attribute; non-string options are skipped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let state = value.get("state")?.as_str()?.to_string();
        let attributes = value.get("attributes");

        let friendly_name = attributes
            .and_then(|a| a.get("friendly_name"))
            .and_then(Value::as_str)
            .filter(|name| !name.is_empty())
            .map(str::to_string);

        let options = attributes
            .and_then(|a| a.get("options"))
            .and_then(Value::as_array)
            .map(|options| {
                options
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            state,
            attributes: Attributes {
                friendly_name,
                options,
            },
        })
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.attributes.friendly_name.as_deref()
    }

    pub fn options(&self) -> &[String] {
        &self.attributes.options
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("state snapshot must be a mapping of entity id to state")]
    NotAMapping,
}
