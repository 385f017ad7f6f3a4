//! View synthesis.
//!
//! [`synthesize`] derives the complete view from the configuration, the resolved rows and
//! the commands in flight. It is recomputed from scratch on every change; nothing is
//! cached between passes.

use crate::config::CardConfig;
use crate::escape::Markup;
use crate::resolver::OutputRow;
use crate::tracker::Tracker;

/// Shown in place of the rows when none resolve.
pub const EMPTY_MESSAGE: &str = "No Videohub output select entities found. Add entity IDs in card config or verify the integration is loaded.";

/// Row count assumed for the sizing hint before any rows can be resolved.
const UNKNOWN_ROW_COUNT: usize = 4;

/// Everything needed to draw the card. All text is already escaped.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    pub title: Markup,

    /// "1 output", "3 outputs"
    pub count: Markup,

    pub body: Body,

    pub presets: Vec<PresetView>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Rows(Vec<RowView>),

    /// Placeholder text shown when no rows resolve
    Empty(Markup),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowView {
    pub entity: Markup,

    /// DOM id for the row's selector
    pub element_id: Markup,

    pub label: Markup,

    /// Currently selected option
    pub selection: Markup,

    pub options: Vec<OptionView>,

    /// A command for this row is in flight
    pub disabled: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptionView {
    pub value: Markup,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PresetView {
    pub index: usize,
    pub label: Markup,
    pub disabled: bool,
}

impl View {
    pub fn rows(&self) -> &[RowView] {
        match &self.body {
            Body::Rows(rows) => rows,
            Body::Empty(_) => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.body, Body::Empty(_))
    }
}

/// Build the view for `rows` under `config`, marking anything in `pending` as disabled.
pub fn synthesize(config: &CardConfig, rows: &[OutputRow<'_>], pending: &Tracker) -> View {
    let body = if rows.is_empty() {
        Body::Empty(Markup::escape(EMPTY_MESSAGE))
    } else {
        Body::Rows(rows.iter().map(|row| row_view(row, pending)).collect())
    };

    let presets = config
        .presets()
        .iter()
        .enumerate()
        .map(|(index, preset)| PresetView {
            index,
            label: Markup::escape(&preset.label(index)),
            disabled: pending.is_preset_pending(index),
        })
        .collect();

    View {
        title: Markup::escape(&config.title),
        count: Markup::escape(&count_text(rows.len())),
        body,
        presets,
    }
}

fn row_view(row: &OutputRow<'_>, pending: &Tracker) -> RowView {
    let current = row.state.state.as_str();
    let options = row
        .state
        .options()
        .iter()
        .map(|option| OptionView {
            value: Markup::escape(option),
            selected: option == current,
        })
        .collect();

    RowView {
        entity: Markup::escape(row.entity),
        element_id: Markup::escape(&element_id(row.entity)),
        label: Markup::escape(row.label()),
        selection: Markup::escape(current),
        options,
        disabled: pending.is_entity_pending(row.entity),
    }
}

fn count_text(rows: usize) -> String {
    if rows == 1 {
        "1 output".to_string()
    } else {
        format!("{} outputs", rows)
    }
}

/// `route-` followed by the entity id with everything outside `[A-Za-z0-9_-]` replaced by `_`.
fn element_id(entity_id: &str) -> String {
    let sanitized: String = entity_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("route-{}", sanitized)
}

/// Layout height hint for the host: two rows of chrome plus one per output, kept within
/// 3..=12. `None` means rows cannot be resolved yet.
pub fn sizing_hint(row_count: Option<usize>) -> usize {
    let rows = row_count.unwrap_or(UNKNOWN_ROW_COUNT);
    rows.saturating_add(2).clamp(3, 12)
}
