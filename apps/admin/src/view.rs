//! Row composition, paging and text rendering for the admin screens.

use std::fmt::Write as _;

use client_core::{SessionPhase, SessionSnapshot};
use shared::{
    directory,
    domain::{FlagDefinition, FlagKey, FlagValue, FlagValueMap},
};

pub const ORG_PAGE_SIZES: [u32; 4] = [10, 20, 50, 100];
pub const DEFAULT_ORG_PAGE_SIZE: u32 = 20;
pub const FLAG_PAGE_SIZES: [usize; 6] = [10, 50, 100, 150, 200, 250];
pub const DEFAULT_FLAG_PAGE_SIZE: usize = 10;

/// A directory entry joined with the organization's current value.
#[derive(Debug, Clone, PartialEq)]
pub struct FlagRow {
    pub definition: &'static FlagDefinition,
    pub value: FlagValue,
}

impl FlagRow {
    pub fn key(&self) -> FlagKey {
        self.definition.key
    }
}

/// Left-joins the directory with `values` (stored value wins, else the
/// default) and keeps rows whose key, name or category contains `search`,
/// ignoring case. Directory order is preserved.
pub fn compose_rows(values: &FlagValueMap, search: &str) -> Vec<FlagRow> {
    let needle = search.trim().to_lowercase();
    directory::definitions()
        .iter()
        .map(|definition| FlagRow {
            definition,
            value: values
                .get(definition.key.as_str())
                .cloned()
                .unwrap_or_else(|| definition.default_value.clone()),
        })
        .filter(|row| needle.is_empty() || matches_search(row.definition, &needle))
        .collect()
}

fn matches_search(definition: &FlagDefinition, needle: &str) -> bool {
    [
        definition.key.as_str(),
        definition.name.as_str(),
        definition.category.as_str(),
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(needle))
}

/// Stored entries whose key is not in the directory.
pub fn unknown_values(values: &FlagValueMap) -> Vec<(&str, &FlagValue)> {
    values
        .iter()
        .filter(|(key, _)| directory::find_definition(key).is_none())
        .map(|(key, value)| (key.as_str(), value))
        .collect()
}

/// Last page index that still holds rows (0 when there are none).
pub fn last_page(total: usize, page_size: usize) -> usize {
    if page_size == 0 || total == 0 {
        return 0;
    }
    (total - 1) / page_size
}

pub fn page_slice<T>(rows: &[T], page: usize, page_size: usize) -> &[T] {
    let start = page.saturating_mul(page_size).min(rows.len());
    let end = start.saturating_add(page_size).min(rows.len());
    &rows[start..end]
}

pub fn pagination_label(page: usize, page_size: usize, total: usize) -> String {
    let from = page.saturating_mul(page_size);
    if total == 0 || from >= total {
        return format!("0–0 of {total}");
    }
    let to = from.saturating_add(page_size).min(total);
    format!("{}–{to} of {total}", from + 1)
}

pub fn display_value(value: &FlagValue) -> String {
    match value {
        FlagValue::Bool(true) => "Enabled".to_string(),
        FlagValue::Bool(false) => "Disabled".to_string(),
        other => other.to_string(),
    }
}

/// What activating a row's control should do.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleIntent {
    /// Boolean rows write the negation straight away.
    Write(FlagValue),
    /// Other rows ask for a replacement, pre-filled with `current`.
    Prompt { current: String },
}

pub fn toggle_intent(value: &FlagValue) -> ToggleIntent {
    match value {
        FlagValue::Bool(current) => ToggleIntent::Write(FlagValue::Bool(!current)),
        other => ToggleIntent::Prompt {
            current: other.to_string(),
        },
    }
}

/// Numeric input becomes a number, anything else stays the raw string.
/// Blank input is not numeric.
pub fn coerce_input(input: &str) -> FlagValue {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return FlagValue::String(input.to_string());
    }
    if let Ok(integer) = trimmed.parse::<i64>() {
        return FlagValue::from(integer);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(FlagValue::from_f64)
        .unwrap_or_else(|| FlagValue::String(input.to_string()))
}

/// Display state of the flag grid, owned by the front-end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlagGridState {
    pub search: String,
    pub page: usize,
    pub page_size: usize,
}

impl Default for FlagGridState {
    fn default() -> Self {
        Self {
            search: String::new(),
            page: 0,
            page_size: DEFAULT_FLAG_PAGE_SIZE,
        }
    }
}

impl FlagGridState {
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
        self.page = 0;
    }

    pub fn set_page_size(&mut self, page_size: usize) -> Result<(), String> {
        if !FLAG_PAGE_SIZES.contains(&page_size) {
            return Err(format!(
                "page size must be one of {}",
                join_sizes(&FLAG_PAGE_SIZES)
            ));
        }
        self.page_size = page_size;
        self.page = 0;
        Ok(())
    }

    pub fn set_page(&mut self, page: usize, total_rows: usize) {
        self.page = page.min(last_page(total_rows, self.page_size));
    }
}

/// Rows of the current flag grid page, numbered from 1 across all pages.
pub fn visible_rows(snapshot: &SessionSnapshot, grid: &FlagGridState) -> Vec<(usize, FlagRow)> {
    if snapshot.phase != SessionPhase::Ready {
        return Vec::new();
    }
    let rows = compose_rows(&snapshot.values, &grid.search);
    let offset = grid.page.saturating_mul(grid.page_size);
    page_slice(&rows, grid.page, grid.page_size)
        .iter()
        .cloned()
        .enumerate()
        .map(|(index, row)| (offset + index + 1, row))
        .collect()
}

pub fn render_flags(snapshot: &SessionSnapshot, grid: &FlagGridState) -> String {
    let mut out = String::new();
    if let Some(error) = &snapshot.error {
        let _ = writeln!(out, "Error: {error}");
    }
    let Some(org_id) = &snapshot.selected_org else {
        if out.is_empty() {
            out.push_str("No organization selected.\n");
        }
        return out;
    };
    let _ = writeln!(out, "Showing flags for organization: {org_id}");
    match snapshot.phase {
        SessionPhase::Loading => {
            out.push_str("Loading…\n");
            return out;
        }
        SessionPhase::Failed | SessionPhase::Idle => return out,
        SessionPhase::Ready => {}
    }
    if !grid.search.is_empty() {
        let _ = writeln!(out, "Search: {}", grid.search);
    }

    let rows = compose_rows(&snapshot.values, &grid.search);
    if rows.is_empty() {
        let _ = writeln!(out, "No feature flags found for organization \"{org_id}\"");
    } else {
        let _ = writeln!(
            out,
            "{:>3}  {:<26} {:<24} {:<13} {:<14} Action",
            "#", "Flag Key", "Name", "Category", "Current Value"
        );
        for (number, row) in visible_rows(snapshot, grid) {
            let action = match toggle_intent(&row.value) {
                ToggleIntent::Write(_) => "toggle",
                ToggleIntent::Prompt { .. } => "edit",
            };
            let _ = writeln!(
                out,
                "{:>3}  {:<26} {:<24} {:<13} {:<14} {action}",
                number,
                row.key().as_str(),
                row.definition.name,
                row.definition.category.as_str(),
                display_value(&row.value),
            );
        }
        let _ = writeln!(
            out,
            "{}  (rows per page: {})",
            pagination_label(grid.page, grid.page_size, rows.len()),
            grid.page_size
        );
    }

    let unknown = unknown_values(&snapshot.values);
    if !unknown.is_empty() {
        out.push_str("Other stored values:\n");
        for (key, value) in unknown {
            let _ = writeln!(out, "     {key} = {value}");
        }
    }
    out
}

pub fn render_definitions(definitions: &[FlagDefinition]) -> String {
    let mut out = String::new();
    for definition in definitions {
        let _ = writeln!(
            out,
            "{:<26} {:<8} default={:<10} [{}] {}: {}",
            definition.key.as_str(),
            definition.value_type.as_str(),
            definition.default_value.to_string(),
            definition.category.as_str(),
            definition.name,
            definition.description,
        );
    }
    out
}

pub(crate) fn join_sizes<T: ToString>(sizes: &[T]) -> String {
    sizes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
