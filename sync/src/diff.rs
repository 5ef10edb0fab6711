//! Row-level diff between consecutive view models.
//!
//! Consumers apply the changes to their existing list instead of clearing
//! and repopulating it, which keeps scroll position and selection stable.
//!
//! Changes are meant to be applied in order: removals first, then inserts
//! and updates by ascending index into the partially rebuilt list (see
//! [`apply_changes`]).

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::view::TransactionRow;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum RowChange {
    Insert { index: usize, row: TransactionRow },
    Update { index: usize, row: TransactionRow },
    Remove { key: String },
}

fn has_unique_keys(rows: &[TransactionRow]) -> bool {
    let mut seen = HashSet::with_capacity(rows.len());
    rows.iter().all(|row| seen.insert(row.key.as_str()))
}

fn full_replace(previous: &[TransactionRow], current: &[TransactionRow]) -> Vec<RowChange> {
    previous
        .iter()
        .map(|row| RowChange::Remove {
            key: row.key.clone(),
        })
        .chain(current.iter().enumerate().map(|(index, row)| RowChange::Insert {
            index,
            row: row.clone(),
        }))
        .collect()
}

/// Compute the changes that turn `previous` into `current`.
///
/// Rows are matched by key. If keys are duplicated or surviving rows changed
/// their relative order (a chain reorganisation), the result degrades to
/// removing everything and inserting everything.
pub fn diff_rows(previous: &[TransactionRow], current: &[TransactionRow]) -> Vec<RowChange> {
    if !has_unique_keys(previous) || !has_unique_keys(current) {
        return full_replace(previous, current);
    }

    let current_keys: HashSet<&str> = current.iter().map(|r| r.key.as_str()).collect();
    let previous_by_key: HashMap<&str, &TransactionRow> =
        previous.iter().map(|r| (r.key.as_str(), r)).collect();

    let survivors_before = previous
        .iter()
        .filter(|r| current_keys.contains(r.key.as_str()))
        .map(|r| r.key.as_str());
    let survivors_after = current
        .iter()
        .filter(|r| previous_by_key.contains_key(r.key.as_str()))
        .map(|r| r.key.as_str());
    if !survivors_before.eq(survivors_after) {
        return full_replace(previous, current);
    }

    let mut changes: Vec<RowChange> = previous
        .iter()
        .filter(|r| !current_keys.contains(r.key.as_str()))
        .map(|r| RowChange::Remove { key: r.key.clone() })
        .collect();

    for (index, row) in current.iter().enumerate() {
        match previous_by_key.get(row.key.as_str()) {
            None => changes.push(RowChange::Insert {
                index,
                row: row.clone(),
            }),
            Some(old) if *old != row => changes.push(RowChange::Update {
                index,
                row: row.clone(),
            }),
            Some(_) => {}
        }
    }

    changes
}

/// Apply `changes` produced by [`diff_rows`] to `rows`.
pub fn apply_changes(rows: &mut Vec<TransactionRow>, changes: &[RowChange]) {
    for change in changes {
        match change {
            RowChange::Remove { key } => rows.retain(|r| &r.key != key),
            RowChange::Insert { index, row } => {
                let at = (*index).min(rows.len());
                rows.insert(at, row.clone());
            }
            RowChange::Update { index, row } => {
                if let Some(slot) = rows.get_mut(*index) {
                    *slot = row.clone();
                }
            }
        }
    }
}
