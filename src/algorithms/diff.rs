//! Hand-written structural diff between two schedule states.
//!
//! The comparator walks the schedule/block/item value model field by field
//! and reports additions, value changes and removals. Blocks and items are
//! matched by id, so a reorder shows up as `order` changes rather than a
//! remove/add pair. The output is deterministic (entries follow declaration
//! order, never hash order) and feeds the human-readable version changelog.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::core::domain::{Block, BlockId, BlockItem, BlockItemId, RiskFactor, Schedule};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffKind {
    Added,
    Changed,
    Removed,
}

/// One field-level difference between two schedule states.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffEntry {
    pub path: String,
    pub kind: DiffKind,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Compares two schedule states field by field.
pub fn diff_schedules(old: &Schedule, new: &Schedule) -> Vec<DiffEntry> {
    let mut entries = Vec::new();

    push_changed(&mut entries, "name", &old.name, &new.name);
    push_changed(&mut entries, "description", &old.description, &new.description);
    push_changed(&mut entries, "start_date", &old.start_date, &new.start_date);
    push_changed(&mut entries, "end_date", &old.end_date, &new.end_date);
    push_changed(&mut entries, "risk_score", &old.risk_score, &new.risk_score);
    push_changed(
        &mut entries,
        "total_duration_min",
        &old.total_duration_min,
        &new.total_duration_min,
    );
    push_changed(
        &mut entries,
        "buffer_time_min",
        &old.buffer_time_min,
        &new.buffer_time_min,
    );

    let old_blocks: HashMap<BlockId, &Block> =
        old.blocks.iter().map(|block| (block.id, block)).collect();
    let new_blocks: HashMap<BlockId, &Block> =
        new.blocks.iter().map(|block| (block.id, block)).collect();

    for block in &new.blocks {
        match old_blocks.get(&block.id) {
            Some(previous) => diff_block(&mut entries, previous, block),
            None => entries.push(DiffEntry {
                path: format!("blocks[{}]", block.id),
                kind: DiffKind::Added,
                from: None,
                to: Some(block.name.clone()),
            }),
        }
    }

    for block in &old.blocks {
        if !new_blocks.contains_key(&block.id) {
            entries.push(DiffEntry {
                path: format!("blocks[{}]", block.id),
                kind: DiffKind::Removed,
                from: Some(block.name.clone()),
                to: None,
            });
        }
    }

    entries
}

/// Renders diff entries as `Added`/`Changed`/`Removed` changelog lines.
pub fn render_changelog(entries: &[DiffEntry]) -> String {
    let mut lines = Vec::with_capacity(entries.len());
    for entry in entries {
        let line = match entry.kind {
            DiffKind::Added => format!(
                "Added {}: {}",
                entry.path,
                entry.to.as_deref().unwrap_or_default()
            ),
            DiffKind::Changed => format!(
                "Changed {}: {} -> {}",
                entry.path,
                entry.from.as_deref().unwrap_or_default(),
                entry.to.as_deref().unwrap_or_default()
            ),
            DiffKind::Removed => format!(
                "Removed {}: {}",
                entry.path,
                entry.from.as_deref().unwrap_or_default()
            ),
        };
        lines.push(line);
    }
    lines.join("\n")
}

fn diff_block(entries: &mut Vec<DiffEntry>, old: &Block, new: &Block) {
    let prefix = format!("blocks[{}]", new.id);

    push_changed(entries, &format!("{prefix}.name"), &old.name, &new.name);
    push_changed(entries, &format!("{prefix}.kind"), &old.kind, &new.kind);
    push_changed(entries, &format!("{prefix}.order"), &old.order, &new.order);
    push_changed_with(
        entries,
        &format!("{prefix}.start_time"),
        &old.start_time,
        &new.start_time,
        fmt_instant,
    );
    push_changed(
        entries,
        &format!("{prefix}.duration_min"),
        &old.duration_min,
        &new.duration_min,
    );
    push_changed(
        entries,
        &format!("{prefix}.tech_break_min"),
        &old.tech_break_min,
        &new.tech_break_min,
    );
    push_changed(
        entries,
        &format!("{prefix}.location"),
        &old.location,
        &new.location,
    );
    push_changed(
        entries,
        &format!("{prefix}.complexity"),
        &old.complexity,
        &new.complexity,
    );
    push_changed(
        entries,
        &format!("{prefix}.max_participants"),
        &old.max_participants,
        &new.max_participants,
    );
    push_changed(
        entries,
        &format!("{prefix}.required_staff"),
        &old.required_staff,
        &new.required_staff,
    );
    push_changed_with(
        entries,
        &format!("{prefix}.equipment"),
        &equipment_names(old),
        &equipment_names(new),
        |names| names.join(", "),
    );
    push_changed_with(
        entries,
        &format!("{prefix}.dependencies"),
        &sorted_dependencies(old),
        &sorted_dependencies(new),
        |deps| {
            deps.iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        },
    );
    push_changed_with(
        entries,
        &format!("{prefix}.risk_factors"),
        &old.risk_factors,
        &new.risk_factors,
        |factors| fmt_risk_factors(factors),
    );

    diff_items(entries, &prefix, old, new);
}

fn diff_items(entries: &mut Vec<DiffEntry>, prefix: &str, old: &Block, new: &Block) {
    let old_items: HashMap<BlockItemId, &BlockItem> =
        old.items.iter().map(|item| (item.id, item)).collect();
    let new_items: HashMap<BlockItemId, &BlockItem> =
        new.items.iter().map(|item| (item.id, item)).collect();

    for item in &new.items {
        let path = format!("{prefix}.items[{}]", item.id);
        match old_items.get(&item.id) {
            Some(previous) => {
                push_changed(entries, &format!("{path}.name"), &previous.name, &item.name);
                push_changed(entries, &format!("{path}.kind"), &previous.kind, &item.kind);
                push_changed(
                    entries,
                    &format!("{path}.description"),
                    &previous.description,
                    &item.description,
                );
                push_changed(
                    entries,
                    &format!("{path}.duration_min"),
                    &previous.duration_min,
                    &item.duration_min,
                );
                push_changed(entries, &format!("{path}.order"), &previous.order, &item.order);
                push_changed_with(
                    entries,
                    &format!("{path}.participants"),
                    &previous.participants,
                    &item.participants,
                    |value| value.map_or_else(|| "unset".to_string(), |v| v.to_string()),
                );
            }
            None => entries.push(DiffEntry {
                path,
                kind: DiffKind::Added,
                from: None,
                to: Some(item.name.clone()),
            }),
        }
    }

    for item in &old.items {
        if !new_items.contains_key(&item.id) {
            entries.push(DiffEntry {
                path: format!("{prefix}.items[{}]", item.id),
                kind: DiffKind::Removed,
                from: Some(item.name.clone()),
                to: None,
            });
        }
    }
}

fn push_changed<T: PartialEq + std::fmt::Display>(
    entries: &mut Vec<DiffEntry>,
    path: &str,
    old: &T,
    new: &T,
) {
    if old != new {
        entries.push(DiffEntry {
            path: path.to_string(),
            kind: DiffKind::Changed,
            from: Some(old.to_string()),
            to: Some(new.to_string()),
        });
    }
}

fn push_changed_with<T: PartialEq>(
    entries: &mut Vec<DiffEntry>,
    path: &str,
    old: &T,
    new: &T,
    render: impl Fn(&T) -> String,
) {
    if old != new {
        entries.push(DiffEntry {
            path: path.to_string(),
            kind: DiffKind::Changed,
            from: Some(render(old)),
            to: Some(render(new)),
        });
    }
}

fn fmt_instant(value: &Option<DateTime<Utc>>) -> String {
    value.map_or_else(|| "unset".to_string(), |instant| instant.to_rfc3339())
}

fn equipment_names(block: &Block) -> Vec<String> {
    let mut names: Vec<String> = block.equipment.iter().map(|eq| eq.name.clone()).collect();
    names.sort();
    names
}

fn sorted_dependencies(block: &Block) -> Vec<BlockId> {
    let mut deps = block.dependencies.clone();
    deps.sort();
    deps
}

fn fmt_risk_factors(factors: &[RiskFactor]) -> String {
    factors
        .iter()
        .map(|factor| {
            format!(
                "{:?}({:.2}x{:.2})",
                factor.kind, factor.probability, factor.impact
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}
