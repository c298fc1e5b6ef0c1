//! The table emitter: `CREATE TABLE`/`ALTER TABLE` statement synthesis.

use crate::concatenate;
use crate::dialect::{Dialect, DialectProfile};
use crate::error::AlphaDbError;
use crate::model::{self, AlterTableOp, ColumnPatch, ConcatenatedColumn, CreateTableOp, ForeignKey, PrimaryKeyChange, VersionSource};
use crate::version::VersionNumber;

use super::column::{self, DefineColumnInput};

/// `createtable(version_source, table, version, dialect)`: render a
/// complete `CREATE TABLE` statement from one version's `createtable`
/// block. `createtable` blocks are never concatenated across versions --
/// a table is only ever declared once -- so this renders `op` directly.
pub fn create_table(table: &str, op: &CreateTableOp, profile: &DialectProfile) -> Result<String, AlphaDbError> {
    let mut column_defs = Vec::new();
    let mut deferred_constraints = Vec::new();

    for (name, spec) in &op.columns {
        let column_type = spec.column_type.ok_or_else(|| AlphaDbError::IncompleteVersionObject {
            key: "type",
            object: format!("createtable:{table}:{name}"),
        })?;
        let input = DefineColumnInput {
            name,
            column_type,
            length: spec.length,
            null: spec.null,
            unique: spec.unique,
            default: spec.default.as_ref(),
            a_i: spec.a_i,
        };
        let fragment = column::define_column(&input, profile)?;
        column_defs.push(fragment.definition);
        deferred_constraints.extend(fragment.constraints);
    }

    let mut clauses = column_defs;

    if let Some(pk) = &op.primary_key {
        clauses.push(format!("PRIMARY KEY ({pk})"));
    }

    clauses.extend(deferred_constraints);

    if let Some(fk) = &op.foreign_key {
        clauses.push(render_foreign_key(fk)?);
    }

    let mut sql = format!("CREATE TABLE {table} ( {} )", clauses.join(", "));
    if let Some(suffix) = profile.table_suffix {
        sql.push(' ');
        sql.push_str(suffix);
    }
    sql.push(';');
    Ok(sql)
}

fn render_foreign_key(fk: &ForeignKey) -> Result<String, AlphaDbError> {
    if fk.key.is_empty() {
        return Err(AlphaDbError::IncompleteVersionObject {
            key: "key",
            object: "foreign_key".to_string(),
        });
    }
    if fk.references.is_empty() {
        return Err(AlphaDbError::IncompleteVersionObject {
            key: "references",
            object: "foreign_key".to_string(),
        });
    }

    let mut clause = format!("FOREIGN KEY ({}) REFERENCES {} ({})", fk.key, fk.references, fk.key);
    if let Some(on_delete) = &fk.on_delete {
        clause.push_str(&format!(" ON DELETE {}", on_delete.to_uppercase()));
    }
    Ok(clause)
}

/// `altertable(version_source, table, version, dialect)`: render a
/// single `ALTER TABLE` statement with comma-separated sub-clauses, in
/// the fixed order `dropcolumn` -> `addcolumn` -> `modifycolumn` ->
/// `renamecolumn` -> primary-key change.
///
/// Returns `Ok(None)` if `table` has no `altertable` block at
/// `version_id` (nothing to emit).
pub fn alter_table(
    source: &VersionSource,
    table: &str,
    version_id: &str,
    profile: &DialectProfile,
) -> Result<Option<String>, AlphaDbError> {
    let Some((idx, entry)) = source
        .version
        .iter()
        .enumerate()
        .find(|(_, entry)| entry.id == version_id)
    else {
        return Err(AlphaDbError::InvalidVersionNumber(version_id.to_string()));
    };
    let Some(op) = entry.altertable.get(table) else {
        return Ok(None);
    };

    let mut clauses = Vec::new();

    for name in &op.dropcolumn {
        clauses.push(format!("DROP COLUMN {name}"));
    }

    for (name, spec) in &op.addcolumn {
        let column_type = spec.column_type.ok_or_else(|| AlphaDbError::IncompleteVersionObject {
            key: "type",
            object: format!("altertable:{table}:addcolumn:{name}"),
        })?;
        let input = DefineColumnInput {
            name,
            column_type,
            length: spec.length,
            null: spec.null,
            unique: spec.unique,
            default: spec.default.as_ref(),
            a_i: spec.a_i,
        };
        let fragment = column::define_column(&input, profile)?;
        clauses.push(format!("ADD {}", fragment.definition));
        for constraint in fragment.constraints {
            clauses.push(format!("ADD {constraint}"));
        }
    }

    for (name, patch) in &op.modifycolumn {
        clauses.extend(render_modify_column(source, idx, table, name, patch, profile)?);
    }

    for (old_name, new_name) in &op.renamecolumn {
        clauses.push(format!("RENAME COLUMN {old_name} TO {new_name}"));
    }

    if let Some(change) = &op.primary_key {
        match change {
            PrimaryKeyChange::Set(name) => clauses.push(format!("ADD PRIMARY KEY ({name})")),
            PrimaryKeyChange::Drop => {
                let before = VersionNumber::parse(version_id).ok();
                if let Some(current_pk) = concatenate::get_primary_key(&source.version, table, before) {
                    let injected = ColumnPatch {
                        a_i: Some(false),
                        recreate: false,
                        ..Default::default()
                    };
                    clauses.extend(render_modify_column(source, idx, table, &current_pk, &injected, profile)?);
                }
                clauses.push(drop_primary_key_clause(table, profile.dialect)?);
            }
        }
    }

    Ok(Some(format!("ALTER TABLE {table} {};", clauses.join(", "))))
}

fn drop_primary_key_clause(table: &str, dialect: Dialect) -> Result<String, AlphaDbError> {
    match dialect {
        Dialect::MySQL => Ok("DROP PRIMARY KEY".to_string()),
        Dialect::PostgreSQL => Ok(format!("DROP CONSTRAINT {table}_pkey")),
        Dialect::SQLite => Err(AlphaDbError::UnsupportedForDialect {
            operation: "dropping a primary key",
            dialect,
        }),
    }
}

/// Render one `modifycolumn` patch. For mysql/sqlite this is a single
/// `MODIFY COLUMN` fragment; for postgres it is a sequence of
/// `ALTER COLUMN`/`ADD CONSTRAINT`/`DROP CONSTRAINT` clauses, one per
/// attribute actually present in the patch.
fn render_modify_column(
    source: &VersionSource,
    version_index: usize,
    table: &str,
    name: &str,
    patch: &ColumnPatch,
    profile: &DialectProfile,
) -> Result<Vec<String>, AlphaDbError> {
    match profile.dialect {
        Dialect::MySQL | Dialect::SQLite => {
            let effective = resolve_effective_column(source, version_index, table, name, patch)?;
            let column_type = effective.column_type.ok_or_else(|| AlphaDbError::IncompleteVersionObject {
                key: "type",
                object: format!("altertable:{table}:modifycolumn:{name}"),
            })?;
            let input = DefineColumnInput {
                name,
                column_type,
                length: effective.length,
                null: effective.is_null(),
                unique: effective.is_unique(),
                default: effective.default.as_ref(),
                a_i: effective.is_auto_increment(),
            };
            let fragment = column::define_column(&input, profile)?;
            let mut clauses = vec![format!("MODIFY COLUMN {}", fragment.definition)];
            for constraint in fragment.constraints {
                clauses.push(format!("MODIFY COLUMN {constraint}"));
            }
            Ok(clauses)
        }
        Dialect::PostgreSQL => {
            if let Some(t) = patch.column_type {
                if patch.a_i == Some(true) && t.incompatible_with_auto_increment() {
                    return Err(AlphaDbError::IncompatibleColumnAttributes {
                        version: String::new(),
                        context: format!("column:{name}"),
                        detail: format!("Column type {t} is incompatible with attribute AUTO_INCREMENT"),
                    });
                }
                if patch.unique == Some(true) && t.incompatible_with_unique() {
                    return Err(AlphaDbError::IncompatibleColumnAttributes {
                        version: String::new(),
                        context: format!("column:{name}"),
                        detail: format!("Column type {t} is incompatible with attribute UNIQUE"),
                    });
                }
            }

            let mut clauses = Vec::new();
            if let Some(t) = patch.column_type {
                clauses.push(format!("ALTER COLUMN {name} TYPE {}", t.as_str()));
            }
            if let Some(null) = patch.null {
                let keyword = if null { "DROP" } else { "SET" };
                clauses.push(format!("ALTER COLUMN {name} {keyword} NOT NULL"));
            }
            if let Some(unique) = patch.unique {
                if unique {
                    clauses.push(format!("ADD CONSTRAINT {name}_u UNIQUE ({name})"));
                } else {
                    clauses.push(format!("DROP CONSTRAINT {name}_u"));
                }
            }
            Ok(clauses)
        }
    }
}

/// The full, effective column state to re-emit for a `recreate=false`
/// patch: the concatenated state up to *but not including* the current
/// version, with `patch` merged on top (`spec.md` I8).
fn resolve_effective_column(
    source: &VersionSource,
    version_index: usize,
    table: &str,
    name: &str,
    patch: &ColumnPatch,
) -> Result<ConcatenatedColumn, AlphaDbError> {
    if patch.recreate {
        let column_type = patch.column_type.ok_or_else(|| AlphaDbError::IncompleteVersionObject {
            key: "type",
            object: format!("altertable:{table}:modifycolumn:{name}"),
        })?;
        return Ok(ConcatenatedColumn {
            column_type: Some(column_type),
            length: patch.length,
            null: patch.null,
            unique: patch.unique,
            default: patch.default.clone(),
            a_i: patch.a_i,
        });
    }

    let mut effective = if version_index == 0 {
        ConcatenatedColumn::default()
    } else {
        concatenate::concatenate_column(&source.version[..version_index], table, name)
    };
    model::merge_patch(&mut effective, patch);
    Ok(effective)
}
