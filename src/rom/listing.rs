//! Human readable matrix of which models are present in which directories.

use super::catalog::{ModelCatalog, ModelSelector};
use super::model::Model;
use crate::engine::RomIdentifier;
use colored::Colorize;
use std::fmt::Write;

const PRE_SPACE: &str = "  ";
const COLUMN_PAD: &str = " ";
const CUTOFF: &str = "..";

/// Renders the model × directory presence matrix.
///
/// The header lists every model's version label: grayed out when no
/// directory holds it, green for the selected model. Each directory that
/// holds at least one model gets a row with an `x` under every model it
/// holds, and the first occurrence of the selected model is highlighted.
/// With `auto`, the selected model is the one `auto` would pick.
///
/// # Arguments
///
/// * `dirs` - Directories in search order
/// * `term_width` - Available width; long directory names are truncated
pub fn render_listing(
    catalog: &ModelCatalog,
    identifier: &dyn RomIdentifier,
    selected: &ModelSelector,
    dirs: &[String],
    term_width: usize,
) -> String {
    let mut rows: Vec<(&str, Vec<&Model>)> = Vec::new();
    for dir in dirs {
        if rows.iter().any(|(d, _)| *d == dir.as_str()) {
            continue;
        }
        let present = catalog.models_in(identifier, dir);
        if !present.is_empty() {
            rows.push((dir.as_str(), present));
        }
    }

    let mut out = String::new();
    if rows.is_empty() {
        out.push_str(PRE_SPACE);
        out.push_str("No supported models present.\n");
        return out;
    }

    let is_present = |m: &Model| rows.iter().any(|(_, present)| present.contains(&m));
    let highlighted = match selected {
        ModelSelector::Named(name) => Some(name.as_str()),
        ModelSelector::Auto => catalog
            .models()
            .iter()
            .find(|&m| is_present(m))
            .map(Model::name),
    };

    let header_width = PRE_SPACE.len()
        + catalog
            .models()
            .iter()
            .map(|m| m.version().len() + COLUMN_PAD.len())
            .sum::<usize>();
    let longest_dir = rows.iter().map(|(d, _)| d.chars().count()).max().unwrap_or(0);
    let dirs_width = term_width.saturating_sub(header_width).min(longest_dir);

    out.push_str(PRE_SPACE);
    out.push_str(&" ".repeat(dirs_width));
    for model in catalog.models() {
        let version = model.version();
        if !is_present(model) {
            let _ = write!(out, "{}{}", version.bright_black(), COLUMN_PAD);
        } else if highlighted == Some(model.name()) {
            let _ = write!(out, "{}{}", version.bright_green(), COLUMN_PAD);
        } else {
            let _ = write!(out, "{}{}", version, COLUMN_PAD);
        }
    }
    out.push('\n');

    let mut printed_first_match = false;
    for (dir, present) in &rows {
        out.push_str(PRE_SPACE);
        out.push_str(&fit_to_width(dir, dirs_width));

        for model in catalog.models() {
            let width = model.version().len() + COLUMN_PAD.len();
            let mut cell: Vec<char> = vec![' '; width];
            if !present.contains(&model) {
                out.extend(cell);
                continue;
            }
            cell[2.min(width - 1)] = 'x';
            let cell: String = cell.into_iter().collect();
            if highlighted == Some(model.name()) && !printed_first_match {
                printed_first_match = true;
                let _ = write!(out, "{}", cell.bright_green());
            } else {
                out.push_str(&cell);
            }
        }
        out.push('\n');
    }
    out
}

/// Pads or truncates `dir` to exactly `width` characters.
fn fit_to_width(dir: &str, width: usize) -> String {
    let len = dir.chars().count();
    if len > width {
        let keep = width.saturating_sub(CUTOFF.len());
        let mut cut: String = dir.chars().take(keep).collect();
        cut.push_str(&CUTOFF[..width.min(CUTOFF.len())]);
        cut
    } else {
        format!("{}{}", dir, " ".repeat(width - len))
    }
}
