//! Plain-text rendering of the discovery view model.
//!
//! Used by the command-line front end. Matched characters of the quick filter
//! are wrapped in brackets, the selected row is marked with `>`.

use crate::ui::viewmodel::{DiscoveryViewModel, GymRow};
use std::fmt::Write;

/// Renders `vm` as a multi-line string.
#[must_use]
pub fn render_text(vm: &DiscoveryViewModel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", vm.header.title);
    if !vm.header.subtitle.is_empty() {
        let _ = writeln!(out, "{}", vm.header.subtitle);
    }

    if let Some(prompt) = &vm.prompt {
        let _ = writeln!(
            out,
            "{} [{}] [{}]",
            prompt.message, prompt.allow_label, prompt.skip_label
        );
    }
    if let Some(banner) = &vm.banner {
        let _ = writeln!(out, "! {} [{}]", banner.message, banner.retry_label);
    }
    if let Some(empty) = &vm.empty_state {
        let _ = writeln!(out, "{}\n{}", empty.message, empty.subtitle);
    }

    for row in &vm.rows {
        render_row(&mut out, row);
    }

    if vm.is_loading {
        let _ = writeln!(out, "Loading...");
    } else if vm.can_load_more {
        let _ = writeln!(out, "More gyms available");
    }
    out
}

fn render_row(out: &mut String, row: &GymRow) {
    let marker = if row.is_selected { '>' } else { ' ' };
    let name = highlight(&row.name, &row.highlight_ranges);
    let _ = write!(
        out,
        "{marker} {name}  {}  {}  {}",
        row.rating_label, row.price_label, row.gym_type
    );
    if !row.address.is_empty() {
        let _ = write!(out, "  {}", row.address);
    }
    out.push('\n');
}

/// Wraps each `(start, end)` character range of `text` in brackets.
fn highlight(text: &str, ranges: &[(usize, usize)]) -> String {
    if ranges.is_empty() {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len() + ranges.len() * 2);
    for (idx, ch) in text.chars().enumerate() {
        if ranges.iter().any(|&(start, _)| start == idx) {
            result.push('[');
        }
        result.push(ch);
        if ranges.iter().any(|&(_, end)| end == idx + 1) {
            result.push(']');
        }
    }
    result
}
