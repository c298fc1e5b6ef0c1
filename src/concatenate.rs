//! History concatenator: pure, deterministic folds over a version history.
//!
//! Algorithm-for-algorithm port of `concatenate_column`/`get_column_renames`
//! /`get_primary_key` from the original Python implementation
//! (`examples/original_source/src/alphadb/utils/concatenate/`), with the
//! recursive rename-chain walk rewritten as a bounded, cycle-guarded loop
//! per the specification's design notes. None of these functions touch a
//! database or hold any state beyond their arguments: the whole engine can
//! be tested without a driver because of that purity.

use std::collections::HashSet;

use crate::model::{self, ColumnType, ConcatenatedColumn, VersionEntry};
use crate::version::VersionNumber;

/// Direction to walk a rename chain in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenameOrder {
    /// End at `column`; each event carries the name it replaced.
    Descending,
    /// Start at `column`; each event carries the name it became.
    Ascending,
}

/// One hop in a rename chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameEvent {
    /// Descending: the old name at this hop. Ascending: the new name.
    pub name: String,
    /// The version at which this rename took effect.
    pub rename_version: VersionNumber,
}

fn parse_version_lenient(entry: &VersionEntry) -> Option<VersionNumber> {
    VersionNumber::parse(&entry.id).ok()
}

/// Walk the rename chain for `column` in `table`, in the requested
/// direction.
///
/// Descending starts at `column` and walks backward through history,
/// recording the name it replaced at each `renamecolumn` hop it finds,
/// then continuing the search using that older name. Ascending is the
/// mirror image, walking forward and recording the name each hop became.
///
/// A column name is only ever visited once per call: if a hop would
/// revisit a name already seen, the walk stops there instead of looping
/// forever on a cyclic rename. A well-formed version source can never
/// produce a cycle (the verifier flags one as `CRITICAL`); this guard is
/// a backstop, not the primary defense.
pub fn get_column_renames(
    versions: &[VersionEntry],
    table: &str,
    column: &str,
    order: RenameOrder,
) -> Vec<RenameEvent> {
    let mut events = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(column.to_string());
    let mut current = column.to_string();

    let entries: Box<dyn Iterator<Item = &VersionEntry>> = match order {
        RenameOrder::Descending => Box::new(versions.iter().rev()),
        RenameOrder::Ascending => Box::new(versions.iter()),
    };

    for entry in entries {
        let Some(alter) = entry.altertable.get(table) else {
            continue;
        };
        if alter.renamecolumn.is_empty() {
            continue;
        }
        let Some(v) = parse_version_lenient(entry) else {
            continue;
        };

        let hop = match order {
            RenameOrder::Descending => alter
                .renamecolumn
                .iter()
                .find(|(_, new_name)| new_name.as_str() == current)
                .map(|(old_name, _)| old_name.clone()),
            RenameOrder::Ascending => alter.renamecolumn.get(&current).cloned(),
        };

        if let Some(name) = hop {
            if !visited.insert(name.clone()) {
                break;
            }
            events.push(RenameEvent {
                name: name.clone(),
                rename_version: v,
            });
            current = name;
        }
    }

    events
}

/// Resolve the name `column` was known by as of version `v`, given its
/// descending rename chain (the chain ending at `column`'s current name).
///
/// This is the earliest rename whose version is still `>= v` (the
/// smallest such version), or `column` itself if `v` is after every
/// rename in the chain.
fn resolve_name_as_of(renames: &[RenameEvent], column: &str, v: VersionNumber) -> String {
    renames
        .iter()
        .filter(|r| r.rename_version >= v)
        .min_by_key(|r| r.rename_version)
        .map(|r| r.name.clone())
        .unwrap_or_else(|| column.to_string())
}

/// Fold the full history into the effective, merged column state.
///
/// See `spec.md` §4.3.2 for the algorithm; this is a direct port.
pub fn concatenate_column(versions: &[VersionEntry], table: &str, column: &str) -> ConcatenatedColumn {
    let renames = get_column_renames(versions, table, column, RenameOrder::Descending);
    let mut acc = ConcatenatedColumn::default();

    for entry in versions {
        let Some(v) = parse_version_lenient(entry) else {
            continue;
        };
        let name = resolve_name_as_of(&renames, column, v);

        if let Some(create) = entry.createtable.get(table) {
            if let Some(spec) = create.columns.get(&name) {
                model::merge_spec(&mut acc, spec);
            }
        }

        if let Some(alter) = entry.altertable.get(table) {
            if let Some(patch) = alter.modifycolumn.get(&name) {
                if patch.recreate {
                    acc = ConcatenatedColumn::default();
                }
                model::merge_patch(&mut acc, patch);
            }
            if alter.dropcolumn.iter().any(|c| c == &name) {
                acc = ConcatenatedColumn::default();
            }
            if let Some(spec) = alter.addcolumn.get(&name) {
                model::merge_spec(&mut acc, spec);
            }
        }
    }

    acc
}

/// `true` if walking `column`'s descending rename chain would need to
/// revisit a name already seen -- a cyclic rename. Used by the verifier
/// to turn a malformed source into a `CRITICAL` issue instead of letting
/// [`get_column_renames`]'s own visited-set guard silently truncate the
/// chain.
pub fn rename_chain_is_cyclic(versions: &[VersionEntry], table: &str, column: &str) -> bool {
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(column.to_string());
    let mut current = column.to_string();

    for entry in versions.iter().rev() {
        let Some(alter) = entry.altertable.get(table) else {
            continue;
        };
        if alter.renamecolumn.is_empty() {
            continue;
        }

        let hop = alter
            .renamecolumn
            .iter()
            .find(|(_, new_name)| new_name.as_str() == current)
            .map(|(old_name, _)| old_name.clone());

        if let Some(name) = hop {
            if !visited.insert(name.clone()) {
                return true;
            }
            current = name;
        }
    }

    false
}

/// The most recent `type` attribute seen for `column`, handling type
/// changes made by later `modifycolumn` patches.
///
/// Implemented directly on top of [`concatenate_column`]: the
/// accumulator's `column_type` field is only ever overwritten when a
/// later spec/patch actually carries a `type`, reset when the column is
/// dropped or fully recreated, so it already holds exactly this value.
pub fn get_column_type(versions: &[VersionEntry], table: &str, column: &str) -> Option<ColumnType> {
    concatenate_column(versions, table, column).column_type
}

/// Walk history to find the table's current primary-key column.
///
/// If `before_version` is given, the walk stops before that version
/// (versions at or after it are not considered).
pub fn get_primary_key(
    versions: &[VersionEntry],
    table: &str,
    before_version: Option<VersionNumber>,
) -> Option<String> {
    let mut primary_key: Option<String> = None;

    for entry in versions {
        let Some(v) = parse_version_lenient(entry) else {
            continue;
        };
        if let Some(before) = before_version {
            if before <= v {
                continue;
            }
        }

        if let Some(create) = entry.createtable.get(table) {
            if let Some(pk) = &create.primary_key {
                primary_key = Some(pk.clone());
            }
        }

        if let Some(alter) = entry.altertable.get(table) {
            if let Some(change) = &alter.primary_key {
                primary_key = change.as_set().map(str::to_string);
            }
            if let Some(pk) = &primary_key {
                if alter.dropcolumn.iter().any(|c| c == pk) {
                    primary_key = None;
                }
            }
        }
    }

    primary_key
}
