//! PostgreSQL-dialect emission, asserted as generated text rather than
//! executed (no live PostgreSQL server in this harness). Covers the
//! `modifycolumn` sub-clause join (§9 Open Question 3) and the deferred
//! `UNIQUE`/`CHECK` table constraints (§4.4's dialect table).

use alphadb::dialect::{Dialect, DialectProfile};
use alphadb::emit::table::{alter_table, create_table};
use alphadb::model::{
    AlterTableOp, ColumnPatch, ColumnSpec, ColumnType, CreateTableOp, VersionEntry, VersionSource,
};

fn entry(id: &str) -> VersionEntry {
    VersionEntry { id: id.to_string(), ..Default::default() }
}

#[test]
fn postgres_create_table_defers_unique_and_text_length() {
    let mut op = CreateTableOp::default();
    op.primary_key = Some("id".to_string());
    op.columns.insert(
        "id".to_string(),
        ColumnSpec { column_type: Some(ColumnType::Int), ..Default::default() },
    );
    op.columns.insert(
        "bio".to_string(),
        ColumnSpec {
            column_type: Some(ColumnType::Text),
            length: Some(500),
            unique: true,
            ..Default::default()
        },
    );

    let profile = DialectProfile::for_dialect(Dialect::PostgreSQL);
    let sql = create_table("users", &op, &profile).unwrap();

    assert!(!sql.contains("AUTO_INCREMENT"));
    assert!(!sql.contains("ENGINE"));
    assert!(sql.contains("PRIMARY KEY (id)"));
    assert!(sql.contains("CONSTRAINT bio_tl CHECK (char_length(bio) <= 500)"));
    assert!(sql.contains("CONSTRAINT bio_u UNIQUE (bio)"));
    assert!(!sql.contains("bio TEXT(500)"), "TEXT length must not be an inline modifier on postgres");
}

/// §9 Open Question 3: multiple postgres `modifycolumn` sub-clauses must
/// be comma-joined, never a dangling leading/trailing comma.
#[test]
fn postgres_modifycolumn_joins_subclauses_with_commas_only() {
    let mut v1 = entry("0.0.1");
    let mut create = CreateTableOp::default();
    create.columns.insert(
        "email".to_string(),
        ColumnSpec { column_type: Some(ColumnType::Varchar), length: Some(100), ..Default::default() },
    );
    v1.createtable.insert("users".to_string(), create);

    let mut v2 = entry("0.0.2");
    let mut alter = AlterTableOp::default();
    alter.modifycolumn.insert(
        "email".to_string(),
        ColumnPatch {
            column_type: Some(ColumnType::Text),
            null: Some(true),
            unique: Some(true),
            recreate: true,
            ..Default::default()
        },
    );
    v2.altertable.insert("users".to_string(), alter);

    let source = VersionSource { name: "x".to_string(), version: vec![v1, v2] };
    let profile = DialectProfile::for_dialect(Dialect::PostgreSQL);
    let sql = alter_table(&source, "users", "0.0.2", &profile).unwrap().unwrap();

    assert_eq!(
        sql,
        "ALTER TABLE users ALTER COLUMN email TYPE TEXT, ALTER COLUMN email DROP NOT NULL, \
         ADD CONSTRAINT email_u UNIQUE (email);"
    );
    assert!(!sql.contains(",,"));
    assert!(!sql.trim_end_matches(';').ends_with(','));
}

#[test]
fn postgres_drops_primary_key_via_named_constraint() {
    let mut v1 = entry("0.0.1");
    let mut create = CreateTableOp::default();
    create.primary_key = Some("id".to_string());
    create.columns.insert(
        "id".to_string(),
        ColumnSpec { column_type: Some(ColumnType::Int), ..Default::default() },
    );
    v1.createtable.insert("t".to_string(), create);

    let mut v2 = entry("0.0.2");
    let mut alter = AlterTableOp::default();
    alter.primary_key = Some(alphadb::model::PrimaryKeyChange::Drop);
    v2.altertable.insert("t".to_string(), alter);

    let source = VersionSource { name: "x".to_string(), version: vec![v1, v2] };
    let profile = DialectProfile::for_dialect(Dialect::PostgreSQL);
    let sql = alter_table(&source, "t", "0.0.2", &profile).unwrap().unwrap();
    assert!(sql.contains("DROP CONSTRAINT t_pkey"));
}
