use std::collections::HashMap;
use std::fmt;

/// Identifies what an in-flight command is working on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandKey {
    /// A row command, keyed by the row's entity id
    Entity(String),

    /// A preset command, keyed by the preset's index in the configuration
    Preset(usize),
}

impl CommandKey {
    pub fn entity(entity_id: impl Into<String>) -> Self {
        CommandKey::Entity(entity_id.into())
    }
}

impl fmt::Display for CommandKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandKey::Entity(entity_id) => write!(f, "{}", entity_id),
            CommandKey::Preset(index) => write!(f, "preset-{}", index),
        }
    }
}

/// Commands currently in flight.
///
/// Every `begin` must be matched by exactly one `end` once the command settles. Keys are
/// counted, so overlapping commands for the same key keep it pending until the last one
/// settles.
#[derive(Debug, Default, Clone)]
pub struct Tracker {
    in_flight: HashMap<CommandKey, usize>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, key: CommandKey) {
        *self.in_flight.entry(key).or_insert(0) += 1;
    }

    /// Release one command for `key`. Unknown keys are ignored.
    pub fn end(&mut self, key: &CommandKey) {
        if let Some(count) = self.in_flight.get_mut(key) {
            *count -= 1;
            if *count == 0 {
                self.in_flight.remove(key);
            }
        }
    }

    pub fn is_pending(&self, key: &CommandKey) -> bool {
        self.in_flight.contains_key(key)
    }

    pub fn is_entity_pending(&self, entity_id: &str) -> bool {
        self.is_pending(&CommandKey::entity(entity_id))
    }

    pub fn is_preset_pending(&self, index: usize) -> bool {
        self.is_pending(&CommandKey::Preset(index))
    }

    /// Number of distinct keys in flight
    pub fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }
}
