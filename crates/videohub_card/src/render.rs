//! Structural HTML for a [`View`]. Styling is left to the host.

use crate::view::Body;
use crate::view::PresetView;
use crate::view::RowView;
use crate::view::View;

impl View {
    /// Render the card markup, one element per line.
    pub fn to_html(&self) -> String {
        let mut lines = vec![
            "<ha-card>".to_string(),
            r#"<div class="header">"#.to_string(),
            format!(r#"<div class="title">{}</div>"#, self.title),
            format!(r#"<div class="subtle">{}</div>"#, self.count),
            "</div>".to_string(),
            r#"<div class="rows">"#.to_string(),
        ];

        match &self.body {
            Body::Rows(rows) => {
                for row in rows {
                    push_row(&mut lines, row);
                }
            }
            Body::Empty(message) => lines.push(format!(r#"<div class="empty">{}</div>"#, message)),
        }
        lines.push("</div>".to_string());

        if !self.presets.is_empty() {
            lines.push(r#"<div class="presets">"#.to_string());
            lines.push(r#"<div class="subtle">Presets</div>"#.to_string());
            lines.push(r#"<div class="preset-grid">"#.to_string());
            lines.extend(self.presets.iter().map(preset_button));
            lines.push("</div>".to_string());
            lines.push("</div>".to_string());
        }

        lines.push("</ha-card>".to_string());
        lines.join("\n")
    }
}

fn push_row(lines: &mut Vec<String>, row: &RowView) {
    lines.push(r#"<div class="row">"#.to_string());
    lines.push(r#"<div class="row-label">"#.to_string());
    lines.push(format!(r#"<div class="row-name">{}</div>"#, row.label));
    lines.push(format!(r#"<div class="row-id">{}</div>"#, row.entity));
    lines.push("</div>".to_string());
    lines.push(format!(
        r#"<select id="{}" data-entity="{}"{}>"#,
        row.element_id,
        row.entity,
        disabled_attr(row.disabled)
    ));
    for option in &row.options {
        let selected = if option.selected { " selected" } else { "" };
        lines.push(format!(
            r#"<option value="{}"{}>{}</option>"#,
            option.value, selected, option.value
        ));
    }
    lines.push("</select>".to_string());
    lines.push("</div>".to_string());
}

fn preset_button(preset: &PresetView) -> String {
    format!(
        r#"<button type="button" data-preset-index="{}"{}>{}</button>"#,
        preset.index,
        disabled_attr(preset.disabled),
        preset.label
    )
}

fn disabled_attr(disabled: bool) -> &'static str {
    if disabled {
        " disabled"
    } else {
        ""
    }
}
