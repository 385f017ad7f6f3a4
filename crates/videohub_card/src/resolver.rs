//! Output row resolution.
//!
//! Rows come from the explicit `entities` list when one is configured, otherwise from
//! discovering Videohub output selects in the snapshot.

use chumsky::prelude::*;

use crate::config::CardConfig;
use crate::snapshot::EntityState;
use crate::snapshot::Snapshot;

/// Output index given to discovered rows whose name carries no output number.
pub const NO_OUTPUT_INDEX: u32 = 9999;

/// One routable output, borrowing from the configuration and snapshot it was resolved from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputRow<'a> {
    pub entity: &'a str,

    /// Label override from the configuration
    pub name: Option<&'a str>,

    pub state: &'a EntityState,
}

impl<'a> OutputRow<'a> {
    /// Display label: configured name, else friendly name, else the entity id.
    pub fn label(&self) -> &'a str {
        self.name
            .filter(|name| !name.is_empty())
            .or_else(|| self.state.friendly_name())
            .unwrap_or(self.entity)
    }

    pub fn accepts(&self, option: &str) -> bool {
        self.state.options().iter().any(|o| o == option)
    }
}

/// Resolve the ordered output rows for `config` against `snapshot`.
pub fn resolve<'a>(config: &'a CardConfig, snapshot: &'a Snapshot) -> Vec<OutputRow<'a>> {
    let configured = config.entities();
    if !configured.is_empty() {
        return configured
            .iter()
            .filter(|item| !item.entity.is_empty())
            .filter_map(|item| {
                snapshot.get(&item.entity).map(|state| OutputRow {
                    entity: &item.entity,
                    name: item.name.as_deref(),
                    state,
                })
            })
            .collect();
    }

    if !config.auto_discover {
        return Vec::new();
    }

    let mut discovered: Vec<(u32, OutputRow<'a>)> = snapshot
        .iter()
        .filter(|(entity_id, state)| is_videohub_output(entity_id, state.friendly_name()))
        .map(|(entity_id, state)| {
            let index = output_index(entity_id, state.friendly_name());
            let row = OutputRow {
                entity: entity_id,
                name: None,
                state,
            };
            (index, row)
        })
        .collect();

    // Stable: rows sharing an index keep snapshot order.
    discovered.sort_by_key(|(index, _)| *index);
    discovered.into_iter().map(|(_, row)| row).collect()
}

/// A discoverable row is a `select.` entity mentioning both "videohub" and "output" in its
/// id or friendly name.
pub fn is_videohub_output(entity_id: &str, friendly_name: Option<&str>) -> bool {
    if !entity_id.starts_with("select.") {
        return false;
    }

    let id = entity_id.to_lowercase();
    let name = friendly_name.unwrap_or_default().to_lowercase();
    let mentions = |needle: &str| id.contains(needle) || name.contains(needle);
    mentions("videohub") && mentions("output")
}

/// Extract the output number from `"{entity_id} {friendly_name}"`.
///
/// The first case-insensitive occurrence of `output`, one or more `_`/whitespace
/// separators and a run of digits wins. Without one the row gets [`NO_OUTPUT_INDEX`].
pub fn output_index(entity_id: &str, friendly_name: Option<&str>) -> u32 {
    let source = format!("{} {}", entity_id, friendly_name.unwrap_or_default()).to_lowercase();
    let parser = output_number();

    source
        .match_indices("output")
        .find_map(|(offset, _)| parser.parse(&source[offset..]).into_output())
        .map(|digits| digits.parse().unwrap_or(u32::MAX))
        .unwrap_or(NO_OUTPUT_INDEX)
}

/// `output[_\s]+(\d+)` anchored at the start of the input, ignoring whatever follows.
fn output_number<'src>() -> impl Parser<'src, &'src str, &'src str> {
    let separator = any()
        .filter(|c: &char| *c == '_' || c.is_whitespace())
        .repeated()
        .at_least(1);
    let digits = any()
        .filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .at_least(1)
        .to_slice();

    just("output")
        .ignore_then(separator)
        .ignore_then(digits)
        .lazy()
}
