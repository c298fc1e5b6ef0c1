//! Strongly-typed representation of a version source.
//!
//! Mirrors the JSON document shape from the specification as tagged
//! Rust types instead of untyped maps, so the rest of the crate gets
//! exhaustive `match` coverage instead of `KeyError`-shaped bugs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::AlphaDbError;

/// Top-level input: a named, ordered history of versioned transformations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionSource {
    /// Template identifier. Non-empty.
    pub name: String,
    /// Ordered list of version entries, in declaration order.
    pub version: Vec<VersionEntry>,
}

/// One version in the history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Dotted version number, e.g. `"0.2.6"`.
    #[serde(rename = "_id")]
    pub id: String,
    /// `createtable[table_name]` blocks.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub createtable: BTreeMap<String, CreateTableOp>,
    /// `altertable[table_name]` blocks.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub altertable: BTreeMap<String, AlterTableOp>,
    /// `default_data[table_name]` row lists.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub default_data: BTreeMap<String, Vec<Row>>,
}

/// `createtable[table_name]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTableOp {
    /// Column name that becomes the primary key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
    /// Foreign key clause, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKey>,
    /// Remaining keys: column definitions.
    #[serde(flatten)]
    pub columns: BTreeMap<String, ColumnSpec>,
}

/// `altertable[table_name]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlterTableOp {
    /// Column names to drop.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dropcolumn: Vec<String>,
    /// New columns to add.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub addcolumn: BTreeMap<String, ColumnSpec>,
    /// Column attribute patches.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub modifycolumn: BTreeMap<String, ColumnPatch>,
    /// old-name -> new-name renames.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub renamecolumn: BTreeMap<String, String>,
    /// `Some(Set(col))` sets a new primary key, `Some(Drop)` clears it
    /// (the JSON document's `primary_key: null`), `None` means untouched.
    ///
    /// `deserialize_with` only runs when the key is present at all, so
    /// a present-but-`null` value (drop) is distinguishable from an
    /// absent key (untouched) -- a plain `Option<Option<String>>` would
    /// collapse both to `None` since serde's `Option` deserializer
    /// consumes the JSON `null` token before a nested `Option` ever sees it.
    #[serde(
        default,
        deserialize_with = "deserialize_primary_key_change",
        serialize_with = "serialize_primary_key_change",
        skip_serializing_if = "Option::is_none"
    )]
    pub primary_key: Option<PrimaryKeyChange>,
    /// Foreign key clause, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKey>,
}

impl AlterTableOp {
    /// `true` if none of the transformation lists/maps carry any data.
    pub fn is_empty(&self) -> bool {
        self.dropcolumn.is_empty()
            && self.addcolumn.is_empty()
            && self.modifycolumn.is_empty()
            && self.renamecolumn.is_empty()
            && self.primary_key.is_none()
            && self.foreign_key.is_none()
    }
}

/// A primary-key change on `altertable`: set to a column, or drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrimaryKeyChange {
    /// Drop the current primary key (`primary_key: null` in the document).
    Drop,
    /// Make the named column the new primary key.
    Set(String),
}

impl PrimaryKeyChange {
    /// The column name this change sets the primary key to, if any.
    pub fn as_set(&self) -> Option<&str> {
        match self {
            PrimaryKeyChange::Set(name) => Some(name.as_str()),
            PrimaryKeyChange::Drop => None,
        }
    }
}

fn deserialize_primary_key_change<'de, D>(
    deserializer: D,
) -> Result<Option<PrimaryKeyChange>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(Some(match opt {
        None => PrimaryKeyChange::Drop,
        Some(name) => PrimaryKeyChange::Set(name),
    }))
}

fn serialize_primary_key_change<S>(
    value: &Option<PrimaryKeyChange>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match value {
        None => unreachable!("guarded by skip_serializing_if"),
        Some(PrimaryKeyChange::Drop) => serializer.serialize_none(),
        Some(PrimaryKeyChange::Set(name)) => serializer.serialize_some(name),
    }
}

/// `foreign_key: { key, references, on_delete? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKey {
    /// Local column name.
    pub key: String,
    /// Referenced table name.
    pub references: String,
    /// `ON DELETE` action (e.g. `"cascade"`), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
}

/// A full column definition, used by `createtable` and `addcolumn`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column kind.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<ColumnType>,
    /// Optional length (`VARCHAR(n)`, `TEXT` check length, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Nullability. Default `false`.
    #[serde(default)]
    pub null: bool,
    /// Uniqueness. Default `false`.
    #[serde(default)]
    pub unique: bool,
    /// Default value, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Auto-increment / identity. Default `false`.
    #[serde(default)]
    pub a_i: bool,
}

/// An attribute patch for `modifycolumn`. Same fields as [`ColumnSpec`]
/// plus the `recreate` instruction, and every field optional so a patch
/// can touch only a subset of attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnPatch {
    /// Column kind. Required when `recreate` is `true` (the default).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<ColumnType>,
    /// Optional length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Nullability patch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub null: Option<bool>,
    /// Uniqueness patch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    /// Default-value patch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Auto-increment patch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a_i: Option<bool>,
    /// Whether this patch replaces the column's prior effective state
    /// (`true`, the default) or merges on top of it (`false`).
    #[serde(default = "default_recreate")]
    pub recreate: bool,
}

fn default_recreate() -> bool {
    true
}

/// The effective, fully-merged state of a column at some point in history.
/// This is what [`crate::concatenate::concatenate_column`] returns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConcatenatedColumn {
    /// Column kind, if ever set.
    pub column_type: Option<ColumnType>,
    /// Length, if set.
    pub length: Option<u32>,
    /// Nullability, if explicitly set at any point.
    pub null: Option<bool>,
    /// Uniqueness, if explicitly set at any point.
    pub unique: Option<bool>,
    /// Default value, if set.
    pub default: Option<Value>,
    /// Auto-increment, if explicitly set at any point.
    pub a_i: Option<bool>,
}

impl ConcatenatedColumn {
    /// `null` with the spec's default of `false` applied.
    pub fn is_null(&self) -> bool {
        self.null.unwrap_or(false)
    }

    /// `unique` with the spec's default of `false` applied.
    pub fn is_unique(&self) -> bool {
        self.unique.unwrap_or(false)
    }

    /// `a_i` with the spec's default of `false` applied.
    pub fn is_auto_increment(&self) -> bool {
        self.a_i.unwrap_or(false)
    }

    fn merge_spec(&mut self, spec: &ColumnSpec) {
        if spec.column_type.is_some() {
            self.column_type = spec.column_type;
        }
        if spec.length.is_some() {
            self.length = spec.length;
        }
        self.null = Some(spec.null);
        self.unique = Some(spec.unique);
        if spec.default.is_some() {
            self.default = spec.default.clone();
        }
        self.a_i = Some(spec.a_i);
    }

    fn merge_patch(&mut self, patch: &ColumnPatch) {
        if patch.column_type.is_some() {
            self.column_type = patch.column_type;
        }
        if patch.length.is_some() {
            self.length = patch.length;
        }
        if let Some(null) = patch.null {
            self.null = Some(null);
        }
        if let Some(unique) = patch.unique {
            self.unique = Some(unique);
        }
        if patch.default.is_some() {
            self.default = patch.default.clone();
        }
        if let Some(a_i) = patch.a_i {
            self.a_i = Some(a_i);
        }
    }
}

/// Apply a [`ColumnSpec`] on top of a [`ConcatenatedColumn`] accumulator
/// (used by `createtable`/`addcolumn` merges).
pub(crate) fn merge_spec(acc: &mut ConcatenatedColumn, spec: &ColumnSpec) {
    acc.merge_spec(spec);
}

/// Apply a [`ColumnPatch`] on top of a [`ConcatenatedColumn`] accumulator
/// (used by `modifycolumn` merges, after the `recreate` flag has already
/// been handled by the caller).
pub(crate) fn merge_patch(acc: &mut ConcatenatedColumn, patch: &ColumnPatch) {
    acc.merge_patch(patch);
}

/// The ten supported column kinds from the glossary, plus an `Other`
/// escape hatch so an unrecognized type string is a verifier `HIGH`
/// issue rather than a parse failure for the whole document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum ColumnType {
    Int,
    Tinyint,
    Bigint,
    Float,
    Decimal,
    Varchar,
    Text,
    Longtext,
    Datetime,
    Json,
}

impl ColumnType {
    /// Parse a column type string case-insensitively. Returns `None` for
    /// anything outside the supported set.
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s.to_ascii_uppercase().as_str() {
            "INT" => ColumnType::Int,
            "TINYINT" => ColumnType::Tinyint,
            "BIGINT" => ColumnType::Bigint,
            "FLOAT" => ColumnType::Float,
            "DECIMAL" => ColumnType::Decimal,
            "VARCHAR" => ColumnType::Varchar,
            "TEXT" => ColumnType::Text,
            "LONGTEXT" => ColumnType::Longtext,
            "DATETIME" => ColumnType::Datetime,
            "JSON" => ColumnType::Json,
            _ => return None,
        })
    }

    /// The canonical uppercase SQL keyword for this type.
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Int => "INT",
            ColumnType::Tinyint => "TINYINT",
            ColumnType::Bigint => "BIGINT",
            ColumnType::Float => "FLOAT",
            ColumnType::Decimal => "DECIMAL",
            ColumnType::Varchar => "VARCHAR",
            ColumnType::Text => "TEXT",
            ColumnType::Longtext => "LONGTEXT",
            ColumnType::Datetime => "DATETIME",
            ColumnType::Json => "JSON",
        }
    }

    /// `true` for the types I2 forbids combining with `a_i = true`.
    pub fn incompatible_with_auto_increment(self) -> bool {
        matches!(
            self,
            ColumnType::Varchar
                | ColumnType::Text
                | ColumnType::Longtext
                | ColumnType::Datetime
                | ColumnType::Decimal
                | ColumnType::Json
        )
    }

    /// `true` for the types I3 forbids combining with `unique = true`.
    pub fn incompatible_with_unique(self) -> bool {
        matches!(self, ColumnType::Json)
    }

    /// `true` for types whose length modifier is textual (`VARCHAR`,
    /// `TEXT`, `LONGTEXT`) rather than numeric-precision (`INT`, ...).
    pub fn is_text_like(self) -> bool {
        matches!(self, ColumnType::Varchar | ColumnType::Text | ColumnType::Longtext)
    }

    /// `true` for the `INT`-family types whose length is a display-width
    /// modifier rather than a semantic constraint.
    pub fn is_int_like(self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::Tinyint | ColumnType::Bigint)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ColumnType> for String {
    fn from(t: ColumnType) -> Self {
        t.as_str().to_string()
    }
}

impl<'de> Deserialize<'de> for ColumnType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ColumnType::parse(&raw).ok_or_else(|| {
            serde::de::Error::custom(format!("unsupported column type: {raw}"))
        })
    }
}

/// A scalar value: column defaults and default-data row values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(serde_json::Value),
}

impl Value {
    /// `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// One `default_data` row: an ordered list of column/value pairs. A
/// `Vec` rather than a map so the emitted `(k1, k2, …)` column order
/// follows declaration order, matching the original's reliance on
/// Python dict insertion order. Deserialized straight off the JSON
/// object's `MapAccess` (rather than via `serde_json::Value`) so
/// document order survives regardless of `serde_json`'s own `Map`
/// backing type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(pub Vec<(String, Value)>);

impl Serialize for Row {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Row {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct RowVisitor;

        impl<'de> serde::de::Visitor<'de> for RowVisitor {
            type Value = Row;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a default-data row object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Row, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    entries.push((key, value));
                }
                Ok(Row(entries))
            }
        }

        deserializer.deserialize_map(RowVisitor)
    }
}

impl VersionSource {
    /// Parse a version source from its JSON document form.
    pub fn from_json(json: &str) -> Result<Self, AlphaDbError> {
        Ok(serde_json::from_str(json)?)
    }
}
