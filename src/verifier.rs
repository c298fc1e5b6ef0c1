//! Version-source verifier: invariants I1-I8 plus the structural checks
//! the original Python calls "source verification"
//! (`examples/original_source/src/alphadb/version_verification.py`).
//!
//! Produces a flat list of [`Issue`]s rather than failing fast, so a
//! caller can see every problem in one pass instead of fixing them one
//! at a time against repeated `update` calls.

use std::collections::HashSet;
use std::fmt;

use crate::concatenate;
use crate::model::{ColumnPatch, ColumnSpec, VersionEntry, VersionSource};
use crate::version::VersionNumber;

/// How serious an [`Issue`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    /// Cosmetic or a no-op; does not affect behavior.
    Low,
    /// Executes, but probably not as intended.
    High,
    /// Will not execute; blocks `update`.
    Critical,
}

impl Severity {
    /// The legacy name for [`Severity::Critical`]. `NORMAL` and
    /// `CRITICAL` name the same level in the original's history; this is
    /// a constant alias, not a fourth variant.
    pub const NORMAL: Severity = Severity::Critical;
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Low => "LOW",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        };
        f.write_str(s)
    }
}

/// One verifier finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
}

impl Issue {
    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Issue {
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity, self.message)
    }
}

/// `true` if none of the issues are [`Severity::Critical`].
pub fn is_passing(issues: &[Issue]) -> bool {
    !issues.iter().any(|i| i.severity == Severity::Critical)
}

struct Context<'a> {
    version_id: &'a str,
    table: &'a str,
}

impl Context<'_> {
    fn location(&self, kind: &str, column: &str) -> String {
        format!(
            "Version {} -> {} -> table:{} -> column:{}",
            self.version_id, kind, self.table, column
        )
    }
}

/// Walk a full version source and report every issue found.
///
/// Returns an empty `Vec` when the source is clean (the "ok" sentinel
/// from the specification is represented here simply as no issues).
pub fn verify(source: &VersionSource) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut seen_ids: HashSet<VersionNumber> = HashSet::new();
    let mut last: Option<VersionNumber> = None;

    for entry in &source.version {
        verify_version_id(entry, &mut seen_ids, &mut last, &mut issues);
        for (table, create) in &entry.createtable {
            verify_createtable(entry, table, create, &mut issues);
        }
        for (table, alter) in &entry.altertable {
            verify_altertable(source, entry, table, alter, &mut issues);
        }
        for (table, rows) in &entry.default_data {
            if rows.is_empty() {
                issues.push(Issue::new(
                    Severity::Low,
                    format!(
                        "Version {} -> default_data -> table:{}: empty body",
                        entry.id, table
                    ),
                ));
            }
        }
    }

    verify_rename_cycles(source, &mut issues);

    issues
}

fn verify_version_id(
    entry: &VersionEntry,
    seen: &mut HashSet<VersionNumber>,
    last: &mut Option<VersionNumber>,
    issues: &mut Vec<Issue>,
) {
    if entry.id.is_empty() {
        issues.push(Issue::new(
            Severity::Critical,
            "Version entry is missing its \"_id\" field",
        ));
        return;
    }

    let Ok(v) = VersionNumber::parse(&entry.id) else {
        issues.push(Issue::new(
            Severity::Critical,
            format!("\"{}\" is not a valid version number", entry.id),
        ));
        return;
    };

    if !seen.insert(v) {
        issues.push(Issue::new(
            Severity::Critical,
            format!("Duplicate version \"{}\"", entry.id),
        ));
    } else if let Some(prev) = *last {
        if v <= prev {
            issues.push(Issue::new(
                Severity::Critical,
                format!(
                    "Version \"{}\" is not strictly greater than the preceding version",
                    entry.id
                ),
            ));
        }
    }

    *last = Some(v);
}

fn verify_createtable(
    entry: &VersionEntry,
    table: &str,
    create: &crate::model::CreateTableOp,
    issues: &mut Vec<Issue>,
) {
    let ctx = Context {
        version_id: &entry.id,
        table,
    };

    if create.columns.is_empty() && create.primary_key.is_none() && create.foreign_key.is_none() {
        issues.push(Issue::new(
            Severity::Low,
            format!("Version {} -> createtable -> table:{}: empty body", entry.id, table),
        ));
    }

    for (name, spec) in &create.columns {
        verify_column_spec(&ctx, "createtable", name, spec, issues);
    }

    if let Some(pk) = &create.primary_key {
        if !create.columns.contains_key(pk) {
            issues.push(Issue::new(
                Severity::Critical,
                format!(
                    "{}: primary_key \"{}\" does not reference a column defined in this table block",
                    ctx.location("createtable", pk),
                    pk
                ),
            ));
        }
    }

    if let Some(fk) = &create.foreign_key {
        verify_foreign_key(&ctx, "createtable", fk, issues);
    }
}

fn verify_altertable(
    source: &VersionSource,
    entry: &VersionEntry,
    table: &str,
    alter: &crate::model::AlterTableOp,
    issues: &mut Vec<Issue>,
) {
    let ctx = Context {
        version_id: &entry.id,
        table,
    };

    if alter.is_empty() {
        issues.push(Issue::new(
            Severity::Low,
            format!("Version {} -> altertable -> table:{}: empty body", entry.id, table),
        ));
    }

    for (name, spec) in &alter.addcolumn {
        verify_column_spec(&ctx, "altertable.addcolumn", name, spec, issues);
    }

    for (name, patch) in &alter.modifycolumn {
        verify_column_patch(&ctx, name, patch, issues);
    }

    if let Some(fk) = &alter.foreign_key {
        verify_foreign_key(&ctx, "altertable", fk, issues);
    }

    // I5: dropping the current primary-key column (as of the previous
    // version) is an error.
    if !alter.dropcolumn.is_empty() {
        let before = VersionNumber::parse(&entry.id).ok();
        let current_pk = concatenate::get_primary_key(&source.version, table, before);
        if let Some(pk) = current_pk {
            if alter.dropcolumn.iter().any(|c| c == &pk) {
                issues.push(Issue::new(
                    Severity::Critical,
                    format!(
                        "{}: dropping the current primary-key column \"{}\" without first clearing \
                         primary_key is not allowed",
                        ctx.location("altertable.dropcolumn", &pk),
                        pk
                    ),
                ));
            }
        }
    }
}

fn verify_column_spec(ctx: &Context<'_>, kind: &str, name: &str, spec: &ColumnSpec, issues: &mut Vec<Issue>) {
    if spec.null && spec.a_i {
        issues.push(Issue::new(
            Severity::Critical,
            format!(
                "{}: Column attributes NULL and AUTO_INCREMENT are incompatible",
                ctx.location(kind, name)
            ),
        ));
    }

    match spec.column_type {
        Some(t) => {
            if spec.a_i && t.incompatible_with_auto_increment() {
                issues.push(Issue::new(
                    Severity::Critical,
                    format!(
                        "{}: Column type {} is incompatible with attribute AUTO_INCREMENT",
                        ctx.location(kind, name),
                        t
                    ),
                ));
            }
            if spec.unique && t.incompatible_with_unique() {
                issues.push(Issue::new(
                    Severity::Critical,
                    format!(
                        "{}: Column type {} is incompatible with attribute UNIQUE",
                        ctx.location(kind, name),
                        t
                    ),
                ));
            }
        }
        None => {
            issues.push(Issue::new(
                Severity::Critical,
                format!("{}: \"type\" is required", ctx.location(kind, name)),
            ));
        }
    }
}

fn verify_column_patch(ctx: &Context<'_>, name: &str, patch: &ColumnPatch, issues: &mut Vec<Issue>) {
    let kind = "altertable.modifycolumn";

    if patch.recreate && patch.column_type.is_none() {
        issues.push(Issue::new(
            Severity::Critical,
            format!(
                "{}: \"type\" is required when recreate is true",
                ctx.location(kind, name)
            ),
        ));
    }

    let null = patch.null.unwrap_or(false);
    let a_i = patch.a_i.unwrap_or(false);
    if patch.null.is_some() && patch.a_i.is_some() && null && a_i {
        issues.push(Issue::new(
            Severity::Critical,
            format!(
                "{}: Column attributes NULL and AUTO_INCREMENT are incompatible",
                ctx.location(kind, name)
            ),
        ));
    }

    if let Some(t) = patch.column_type {
        if patch.a_i == Some(true) && t.incompatible_with_auto_increment() {
            issues.push(Issue::new(
                Severity::Critical,
                format!(
                    "{}: Column type {} is incompatible with attribute AUTO_INCREMENT",
                    ctx.location(kind, name),
                    t
                ),
            ));
        }
        if patch.unique == Some(true) && t.incompatible_with_unique() {
            issues.push(Issue::new(
                Severity::Critical,
                format!(
                    "{}: Column type {} is incompatible with attribute UNIQUE",
                    ctx.location(kind, name),
                    t
                ),
            ));
        }
    }
}

fn verify_foreign_key(ctx: &Context<'_>, kind: &str, fk: &crate::model::ForeignKey, issues: &mut Vec<Issue>) {
    if fk.key.is_empty() {
        issues.push(Issue::new(
            Severity::Critical,
            format!("{}: foreign_key is missing \"key\"", ctx.location(kind, "foreign_key")),
        ));
    }
    if fk.references.is_empty() {
        issues.push(Issue::new(
            Severity::Critical,
            format!(
                "{}: foreign_key is missing \"references\"",
                ctx.location(kind, "foreign_key")
            ),
        ));
    }
}

/// Flag cyclic renames as `CRITICAL` rather than letting the concatenator's
/// visited-set guard silently truncate the chain.
fn verify_rename_cycles(source: &VersionSource, issues: &mut Vec<Issue>) {
    let mut tables: HashSet<(&str, &str)> = HashSet::new();
    for entry in &source.version {
        for (table, alter) in &entry.altertable {
            for (old, new) in &alter.renamecolumn {
                tables.insert((table.as_str(), old.as_str()));
                tables.insert((table.as_str(), new.as_str()));
            }
        }
    }

    for (table, column) in tables {
        if concatenate::rename_chain_is_cyclic(&source.version, table, column) {
            issues.push(Issue::new(
                Severity::Critical,
                format!(
                    "Version {} -> altertable -> table:{} -> column:{}: cyclic rename detected",
                    source.version.last().map(|e| e.id.as_str()).unwrap_or(""),
                    table,
                    column
                ),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AlterTableOp, ColumnType, CreateTableOp, ForeignKey};

    fn entry(id: &str) -> VersionEntry {
        VersionEntry {
            id: id.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn clean_source_has_no_issues() {
        let mut v1 = entry("0.0.1");
        let mut create = CreateTableOp::default();
        create.primary_key = Some("id".to_string());
        create.columns.insert(
            "id".to_string(),
            ColumnSpec {
                column_type: Some(ColumnType::Int),
                a_i: true,
                ..Default::default()
            },
        );
        v1.createtable.insert("users".to_string(), create);

        let source = VersionSource {
            name: "t".to_string(),
            version: vec![v1],
        };

        assert!(verify(&source).is_empty());
    }

    /// I1: `null=true` and `a_i=true` are mutually exclusive.
    #[test]
    fn null_and_auto_increment_conflict_is_critical() {
        let mut v1 = entry("0.2.6");
        let mut create = CreateTableOp::default();
        create.columns.insert(
            "email".to_string(),
            ColumnSpec {
                column_type: Some(ColumnType::Varchar),
                null: true,
                a_i: true,
                ..Default::default()
            },
        );
        v1.createtable.insert("users".to_string(), create);

        let source = VersionSource {
            name: "t".to_string(),
            version: vec![v1],
        };

        let issues = verify(&source);
        assert!(issues.iter().any(|i| {
            i.severity == Severity::Critical
                && i.message.contains("Version 0.2.6 -> createtable -> table:users -> column:email")
                && i.message.contains("NULL and AUTO_INCREMENT")
        }));
    }

    /// I3: `unique=true` is incompatible with type `JSON`.
    #[test]
    fn json_unique_conflict_is_critical() {
        let mut v1 = entry("0.0.1");
        let mut create = CreateTableOp::default();
        create.columns.insert(
            "blob".to_string(),
            ColumnSpec {
                column_type: Some(ColumnType::Json),
                unique: true,
                ..Default::default()
            },
        );
        v1.createtable.insert("t".to_string(), create);

        let source = VersionSource {
            name: "x".to_string(),
            version: vec![v1],
        };

        let issues = verify(&source);
        assert!(issues
            .iter()
            .any(|i| i.severity == Severity::Critical && i.message.contains("JSON") && i.message.contains("UNIQUE")));
    }

    /// I4: `primary_key` must reference a defined column.
    #[test]
    fn dangling_primary_key_reference_is_critical() {
        let mut v1 = entry("0.0.1");
        let mut create = CreateTableOp::default();
        create.primary_key = Some("missing".to_string());
        create.columns.insert(
            "id".to_string(),
            ColumnSpec {
                column_type: Some(ColumnType::Int),
                ..Default::default()
            },
        );
        v1.createtable.insert("t".to_string(), create);

        let source = VersionSource {
            name: "x".to_string(),
            version: vec![v1],
        };

        let issues = verify(&source);
        assert!(issues.iter().any(|i| i.severity == Severity::Critical));
    }

    /// I5 / P6: dropping the current primary key without first nulling it
    /// is CRITICAL.
    #[test]
    fn dropping_primary_key_column_without_clearing_is_critical() {
        let mut v1 = entry("0.0.1");
        let mut create = CreateTableOp::default();
        create.primary_key = Some("id".to_string());
        create.columns.insert(
            "id".to_string(),
            ColumnSpec {
                column_type: Some(ColumnType::Int),
                a_i: true,
                ..Default::default()
            },
        );
        v1.createtable.insert("t".to_string(), create);

        let mut v2 = entry("0.0.2");
        let mut alter = AlterTableOp::default();
        alter.dropcolumn.push("id".to_string());
        v2.altertable.insert("t".to_string(), alter);

        let source = VersionSource {
            name: "x".to_string(),
            version: vec![v1, v2],
        };

        let issues = verify(&source);
        assert!(issues
            .iter()
            .any(|i| i.severity == Severity::Critical && i.message.contains("primary-key column")));
    }

    /// I6: duplicate `_id` is an error.
    #[test]
    fn duplicate_version_id_is_critical() {
        let source = VersionSource {
            name: "x".to_string(),
            version: vec![entry("0.0.1"), entry("0.0.1")],
        };
        let issues = verify(&source);
        assert!(issues
            .iter()
            .any(|i| i.severity == Severity::Critical && i.message.contains("Duplicate")));
    }

    /// I6: non-monotonic order is an error.
    #[test]
    fn out_of_order_version_id_is_critical() {
        let source = VersionSource {
            name: "x".to_string(),
            version: vec![entry("0.0.2"), entry("0.0.1")],
        };
        let issues = verify(&source);
        assert!(issues.iter().any(|i| i.severity == Severity::Critical));
    }

    /// I7: `foreign_key` must carry both `key` and `references`.
    #[test]
    fn foreign_key_missing_references_is_critical() {
        let mut v1 = entry("0.0.1");
        let mut create = CreateTableOp::default();
        create.foreign_key = Some(ForeignKey {
            key: "owner_id".to_string(),
            references: String::new(),
            on_delete: None,
        });
        v1.createtable.insert("t".to_string(), create);

        let source = VersionSource {
            name: "x".to_string(),
            version: vec![v1],
        };
        let issues = verify(&source);
        assert!(issues.iter().any(|i| i.severity == Severity::Critical));
    }

    /// I8: `recreate=true` modifycolumn without `type` is an error.
    #[test]
    fn recreate_modify_without_type_is_critical() {
        let mut v1 = entry("0.0.1");
        let mut alter = AlterTableOp::default();
        alter.modifycolumn.insert(
            "c".to_string(),
            ColumnPatch {
                recreate: true,
                ..Default::default()
            },
        );
        v1.altertable.insert("t".to_string(), alter);

        let source = VersionSource {
            name: "x".to_string(),
            version: vec![v1],
        };
        let issues = verify(&source);
        assert!(issues.iter().any(|i| i.severity == Severity::Critical));
    }

    #[test]
    fn empty_createtable_body_is_low() {
        let mut v1 = entry("0.0.1");
        v1.createtable.insert("t".to_string(), CreateTableOp::default());

        let source = VersionSource {
            name: "x".to_string(),
            version: vec![v1],
        };
        let issues = verify(&source);
        assert!(issues.iter().any(|i| i.severity == Severity::Low && i.message.contains("empty body")));
    }

    #[test]
    fn cyclic_rename_is_flagged_critical() {
        let mut v1 = entry("0.0.1");
        let mut alter1 = AlterTableOp::default();
        alter1.renamecolumn.insert("a".to_string(), "b".to_string());
        v1.altertable.insert("t".to_string(), alter1);

        let mut v2 = entry("0.0.2");
        let mut alter2 = AlterTableOp::default();
        alter2.renamecolumn.insert("b".to_string(), "a".to_string());
        v2.altertable.insert("t".to_string(), alter2);

        let source = VersionSource {
            name: "x".to_string(),
            version: vec![v1, v2],
        };

        let issues = verify(&source);
        assert!(issues
            .iter()
            .any(|i| i.severity == Severity::Critical && i.message.contains("cyclic rename")));
    }

    #[test]
    fn normal_alias_matches_critical() {
        assert_eq!(Severity::NORMAL, Severity::Critical);
    }
}
