//! Dialect identity and the per-engine rendering rules that drive every
//! emitter in this crate.
//!
//! `Dialect` is the plain value switched on everywhere; `DialectProfile`
//! bundles the rendering rules so the emitters never `match` on `Dialect`
//! more than once (in [`DialectProfile::for_dialect`]) -- a single
//! orchestrator parameterized by a profile value, not a class hierarchy,
//! per the redesign flag in the specification.

use std::fmt;

/// The three dialects this engine generates SQL for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// `?` placeholders, no identity-column keyword, inline `UNIQUE`.
    SQLite,
    /// `$n` placeholders, `UNIQUE` as a deferred table constraint.
    PostgreSQL,
    /// `?` placeholders, `AUTO_INCREMENT`, `ENGINE = InnoDB` suffix.
    MySQL,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dialect::SQLite => "sqlite",
            Dialect::PostgreSQL => "postgres",
            Dialect::MySQL => "mysql",
        };
        f.write_str(s)
    }
}

impl Dialect {
    /// The bound-parameter placeholder for the `index`-th (1-based)
    /// parameter in a statement. MySQL and SQLite both use a bare `?`;
    /// PostgreSQL uses a positional `$n`.
    pub fn placeholder(self, index: usize) -> String {
        match self {
            Dialect::PostgreSQL => format!("${index}"),
            Dialect::MySQL | Dialect::SQLite => "?".to_string(),
        }
    }
}

/// How a `TEXT`/`LONGTEXT` column's `length` attribute is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextLengthStrategy {
    /// `TEXT(n)` -- a type modifier, same as any other length.
    Inline,
    /// `CONSTRAINT col_tl CHECK (char_length(col) <= n)` -- PostgreSQL
    /// has no type modifier for `TEXT`, so length becomes a constraint.
    CheckConstraint,
}

/// Where a `unique` attribute ends up in the emitted DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueStrategy {
    /// `col TYPE ... UNIQUE` inline on the column definition.
    Inline,
    /// Deferred to a `CONSTRAINT col_u UNIQUE (col)` table constraint.
    TableConstraint,
}

/// The bundle of per-dialect rendering rules consumed by every emitter.
/// Built once via [`DialectProfile::for_dialect`] and passed by value.
#[derive(Debug, Clone, Copy)]
pub struct DialectProfile {
    /// The dialect this profile renders for.
    pub dialect: Dialect,
    /// Identity/auto-increment keyword, if the dialect has one inline.
    pub identity_keyword: Option<&'static str>,
    /// Where `unique` attributes are rendered.
    pub unique_strategy: UniqueStrategy,
    /// How `TEXT`/`LONGTEXT` length is rendered.
    pub text_length_strategy: TextLengthStrategy,
    /// `true` if `INT`-family length modifiers (`INT(n)`) are honored.
    pub honors_int_length: bool,
    /// Suffix appended after a `CREATE TABLE`'s closing paren, before `;`.
    pub table_suffix: Option<&'static str>,
}

impl DialectProfile {
    /// The rendering rules for a given dialect.
    pub fn for_dialect(dialect: Dialect) -> Self {
        match dialect {
            Dialect::MySQL => DialectProfile {
                dialect,
                identity_keyword: Some("AUTO_INCREMENT"),
                unique_strategy: UniqueStrategy::Inline,
                text_length_strategy: TextLengthStrategy::Inline,
                honors_int_length: true,
                table_suffix: Some("ENGINE = InnoDB"),
            },
            Dialect::SQLite => DialectProfile {
                dialect,
                identity_keyword: None,
                unique_strategy: UniqueStrategy::Inline,
                text_length_strategy: TextLengthStrategy::Inline,
                honors_int_length: true,
                table_suffix: None,
            },
            Dialect::PostgreSQL => DialectProfile {
                dialect,
                identity_keyword: None,
                unique_strategy: UniqueStrategy::TableConstraint,
                text_length_strategy: TextLengthStrategy::CheckConstraint,
                honors_int_length: false,
                table_suffix: None,
            },
        }
    }
}
