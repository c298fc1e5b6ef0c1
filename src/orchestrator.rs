//! The update orchestrator: the state machine that reads a database's
//! recorded version, walks a version source, generates queries via the
//! emitters, and advances the stored version.
//!
//! Explicit guard clauses replace the `@conn_test`/`@init_test`
//! decorators from the original (`spec.md` §9's redesign flag): each
//! public method starts with the checks its Python counterpart wore as
//! a decorator.

use std::collections::BTreeMap;

use crate::config::{self, CompatibilityMode};
use crate::dialect::{Dialect, DialectProfile};
use crate::driver::{Driver, DriverError};
use crate::emit;
use crate::error::AlphaDbError;
use crate::model::{ColumnSpec, ColumnType, CreateTableOp, Value, VersionEntry, VersionSource};
use crate::verifier;
use crate::version::VersionNumber;

/// Result of `check`: whether the database is initialized, and its
/// currently recorded version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub ready: bool,
    pub current_version: Option<String>,
}

/// Result of `status`: `check`'s fields plus the database name and the
/// locked-in template name, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusResult {
    pub ready: bool,
    pub current_version: Option<String>,
    pub name: String,
    pub template: Option<String>,
}

/// One statement `update`/`update_queries` would execute. `params` is
/// non-empty only for the config-table version write-back; every other
/// value this engine emits is a literal embedded in `sql` (`spec.md`
/// §9's noted parameter-binding shortcut, carried forward deliberately).
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

impl GeneratedQuery {
    fn literal(sql: String) -> Self {
        GeneratedQuery { sql, params: Vec::new() }
    }
}

/// What `update` actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The requested target was not ahead of the stored version.
    UpToDate { current: String },
    /// The database was brought from `from` to `to`.
    Updated { from: String, to: String },
}

fn driver_err(err: DriverError) -> AlphaDbError {
    AlphaDbError::Driver(err.0)
}

/// Drives `check`/`init`/`status`/`update`/`update_queries`/`vacate`/
/// `export` against one named database. Holds no connection itself --
/// every method borrows a `&mut dyn Driver` for the call's duration only,
/// per `spec.md` §5's resource model.
pub struct Orchestrator {
    db_name: String,
    dialect: Option<Dialect>,
    compatibility: CompatibilityMode,
}

impl Orchestrator {
    /// A new orchestrator for `db_name`, with no dialect set yet.
    pub fn new(db_name: impl Into<String>) -> Self {
        Orchestrator {
            db_name: db_name.into(),
            dialect: None,
            compatibility: CompatibilityMode::Current,
        }
    }

    /// Set the dialect this orchestrator generates SQL for.
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    /// Address the legacy `fdb_cfg` config table instead of `adb_conf`.
    pub fn with_compatibility_mode(mut self, mode: CompatibilityMode) -> Self {
        self.compatibility = mode;
        self
    }

    fn dialect(&self) -> Result<Dialect, AlphaDbError> {
        self.dialect.ok_or(AlphaDbError::NoDatabaseEngineSpecified)
    }

    /// `{ready, current_version}` -- read-only, never fails on an
    /// uninitialized database (that state is exactly what it reports).
    #[tracing::instrument(skip(self, driver), fields(db = %self.db_name))]
    pub fn check(&self, driver: &mut dyn Driver) -> Result<CheckResult, AlphaDbError> {
        let dialect = self.dialect()?;
        let config = config::read_config(driver, self.compatibility, dialect, &self.db_name)?;
        Ok(match config {
            Some(row) => CheckResult {
                ready: true,
                current_version: Some(row.version),
            },
            None => CheckResult {
                ready: false,
                current_version: None,
            },
        })
    }

    /// `check`'s fields plus `name`/`template`. Fails on an
    /// uninitialized database.
    #[tracing::instrument(skip(self, driver), fields(db = %self.db_name))]
    pub fn status(&self, driver: &mut dyn Driver) -> Result<StatusResult, AlphaDbError> {
        let dialect = self.dialect()?;
        let config = config::read_config(driver, self.compatibility, dialect, &self.db_name)?
            .ok_or(AlphaDbError::DbNotInitialized)?;
        Ok(StatusResult {
            ready: true,
            current_version: Some(config.version),
            name: self.db_name.clone(),
            template: config.template,
        })
    }

    /// **absent** -> **initialized**: create the config table and seed
    /// its row. Idempotent: calling `init` on an already-initialized
    /// database is a no-op, matching §5's crash-recovery requirement
    /// that re-running a step that already landed does not corrupt state.
    #[tracing::instrument(skip(self, driver), fields(db = %self.db_name))]
    pub fn init(&self, driver: &mut dyn Driver) -> Result<(), AlphaDbError> {
        let dialect = self.dialect()?;
        if config::read_config(driver, self.compatibility, dialect, &self.db_name)?.is_some() {
            tracing::info!("already initialized");
            return Ok(());
        }

        driver
            .execute(&config::create_table_sql(self.compatibility, dialect), &[])
            .map_err(driver_err)?;
        let (sql, params) = config::insert_initial_row_sql(self.compatibility, dialect, &self.db_name);
        driver.execute(&sql, &params).map_err(driver_err)?;
        Ok(())
    }

    /// **initialized** -> **absent**: drop every table, including the
    /// config table itself. Requires `confirm = true`.
    #[tracing::instrument(skip(self, driver), fields(db = %self.db_name))]
    pub fn vacate(&self, driver: &mut dyn Driver, confirm: bool) -> Result<(), AlphaDbError> {
        if !confirm {
            return Err(AlphaDbError::NeedsConfirmation);
        }
        let dialect = self.dialect()?;
        config::read_config(driver, self.compatibility, dialect, &self.db_name)?.ok_or(AlphaDbError::DbNotInitialized)?;

        if dialect == Dialect::MySQL {
            driver.execute("SET FOREIGN_KEY_CHECKS = 0;", &[]).map_err(driver_err)?;
        }

        for table in list_tables(driver, dialect)? {
            driver.execute(&format!("DROP TABLE {table};"), &[]).map_err(driver_err)?;
        }

        if dialect == Dialect::MySQL {
            driver.execute("SET FOREIGN_KEY_CHECKS = 1;", &[]).map_err(driver_err)?;
        }

        Ok(())
    }

    /// Bring the database up to `update_to_version` (or the source's
    /// highest version), executing every generated statement in order.
    #[tracing::instrument(skip(self, driver, source), fields(db = %self.db_name))]
    pub fn update(
        &self,
        driver: &mut dyn Driver,
        source: &VersionSource,
        update_to_version: Option<&str>,
        no_data: bool,
    ) -> Result<UpdateOutcome, AlphaDbError> {
        let dialect = self.dialect()?;
        let plan = self.plan_update(driver, source, update_to_version, dialect, no_data)?;

        if plan.queries.is_empty() && plan.target_id == plan.config.version {
            return Ok(UpdateOutcome::UpToDate { current: plan.config.version });
        }

        if plan.lock_template {
            let (sql, params) =
                config::update_template_sql(self.compatibility, dialect, &self.db_name, &source.name);
            driver.execute(&sql, &params).map_err(driver_err)?;
        }

        for query in &plan.queries {
            driver.execute(&query.sql, &query.params).map_err(driver_err)?;
        }

        let (sql, params) =
            config::update_version_sql(self.compatibility, dialect, &self.db_name, &plan.target_id);
        driver.execute(&sql, &params).map_err(driver_err)?;

        Ok(UpdateOutcome::Updated {
            from: plan.config.version,
            to: plan.target_id,
        })
    }

    /// Generate the statements `update` would execute, without running
    /// them or touching the config table.
    #[tracing::instrument(skip(self, driver, source), fields(db = %self.db_name))]
    pub fn update_queries(
        &self,
        driver: &mut dyn Driver,
        source: &VersionSource,
        update_to_version: Option<&str>,
    ) -> Result<Vec<GeneratedQuery>, AlphaDbError> {
        let dialect = self.dialect()?;
        Ok(self.plan_update(driver, source, update_to_version, dialect, false)?.queries)
    }

    fn plan_update(
        &self,
        driver: &mut dyn Driver,
        source: &VersionSource,
        update_to_version: Option<&str>,
        dialect: Dialect,
        no_data: bool,
    ) -> Result<UpdatePlan, AlphaDbError> {
        if source.name.is_empty() || source.version.is_empty() {
            return Err(AlphaDbError::IncompleteVersionData);
        }

        let issues = verifier::verify(source);
        if !verifier::is_passing(&issues) {
            return Err(AlphaDbError::VerificationFailed(issues));
        }

        let config = config::read_config(driver, self.compatibility, dialect, &self.db_name)?
            .ok_or(AlphaDbError::DbNotInitialized)?;

        let lock_template = match &config.template {
            None => true,
            Some(existing) if existing != &source.name => return Err(AlphaDbError::DbTemplateNoMatch),
            Some(_) => false,
        };

        let current = VersionNumber::parse(&config.version)?;

        let target_id = match update_to_version {
            Some(v) => v.to_string(),
            None => source
                .version
                .iter()
                .max_by_key(|entry| VersionNumber::parse(&entry.id).ok())
                .map(|entry| entry.id.clone())
                .ok_or(AlphaDbError::MissingVersionData)?,
        };
        let target = VersionNumber::parse(&target_id)?;

        if target <= current {
            // Up-to-date (spec.md §4.7 step 5): report the stored version
            // as the target rather than the caller's (lower-or-equal)
            // request, so `update`'s up-to-date check can compare by
            // string equality without regressing the config row.
            let current_id = config.version.clone();
            return Ok(UpdatePlan {
                queries: Vec::new(),
                config,
                target_id: current_id,
                lock_template: false,
            });
        }

        let profile = DialectProfile::for_dialect(dialect);
        let mut queries = Vec::new();
        for entry in &source.version {
            let Ok(v) = VersionNumber::parse(&entry.id) else {
                continue;
            };
            if v <= current || v > target {
                continue;
            }
            queries.extend(generate_entry_queries(source, entry, &profile, no_data)?);
        }

        Ok(UpdatePlan {
            queries,
            config,
            target_id,
            lock_template,
        })
    }

    /// Snapshot the live schema as a one-entry version source, via
    /// `INFORMATION_SCHEMA`. Unsupported on SQLite, which has no such
    /// catalog (`spec.md` §9's Open Question; callers needing a SQLite
    /// dump should introspect `sqlite_master` themselves).
    #[tracing::instrument(skip(self, driver), fields(db = %self.db_name))]
    pub fn export(&self, driver: &mut dyn Driver) -> Result<VersionSource, AlphaDbError> {
        let dialect = self.dialect()?;
        if dialect == Dialect::SQLite {
            return Err(AlphaDbError::UnsupportedForDialect {
                operation: "export",
                dialect,
            });
        }

        let config = config::read_config(driver, self.compatibility, dialect, &self.db_name)?
            .ok_or(AlphaDbError::DbNotInitialized)?;

        let sql = match dialect {
            Dialect::MySQL => {
                "SELECT table_name, column_name, data_type, is_nullable FROM information_schema.columns \
                 WHERE table_schema = DATABASE() ORDER BY table_name, ordinal_position;"
            }
            Dialect::PostgreSQL => {
                "SELECT table_name, column_name, data_type, is_nullable FROM information_schema.columns \
                 WHERE table_schema = 'public' ORDER BY table_name, ordinal_position;"
            }
            Dialect::SQLite => unreachable!("handled above"),
        };
        let rows = driver.fetch_all(sql, &[]).map_err(driver_err)?;

        let mut tables: BTreeMap<String, CreateTableOp> = BTreeMap::new();
        for row in &rows {
            let Some(Value::Text(table_name)) = row.get("table_name") else {
                continue;
            };
            if table_name == config::CONFIG_TABLE || table_name == config::CONFIG_TABLE_LEGACY {
                continue;
            }
            let Some(Value::Text(column_name)) = row.get("column_name") else {
                continue;
            };
            let data_type = match row.get("data_type") {
                Some(Value::Text(s)) => s.clone(),
                _ => continue,
            };
            let nullable = matches!(row.get("is_nullable"), Some(Value::Text(s)) if s.eq_ignore_ascii_case("YES"));

            let op = tables.entry(table_name.clone()).or_default();
            op.columns.insert(
                column_name.clone(),
                ColumnSpec {
                    column_type: ColumnType::parse(&data_type),
                    length: None,
                    null: nullable,
                    unique: false,
                    default: None,
                    a_i: false,
                },
            );
        }

        let entry = VersionEntry {
            id: config.version.clone(),
            createtable: tables,
            altertable: BTreeMap::new(),
            default_data: BTreeMap::new(),
        };

        Ok(VersionSource {
            name: config.template.unwrap_or_else(|| self.db_name.clone()),
            version: vec![entry],
        })
    }
}

struct UpdatePlan {
    queries: Vec<GeneratedQuery>,
    config: config::ConfigRow,
    target_id: String,
    lock_template: bool,
}

/// Generate every statement one version entry contributes, in the
/// fixed order `createtable` -> `altertable` -> `default_data`.
fn generate_entry_queries(
    source: &VersionSource,
    entry: &VersionEntry,
    profile: &DialectProfile,
    no_data: bool,
) -> Result<Vec<GeneratedQuery>, AlphaDbError> {
    let mut queries = Vec::new();

    for (table, op) in &entry.createtable {
        queries.push(GeneratedQuery::literal(emit::table::create_table(table, op, profile)?));
    }

    for table in entry.altertable.keys() {
        if let Some(sql) = emit::table::alter_table(source, table, &entry.id, profile)? {
            queries.push(GeneratedQuery::literal(sql));
        }
    }

    if !no_data {
        for (table, rows) in &entry.default_data {
            for sql in emit::data::insert_rows(table, rows) {
                queries.push(GeneratedQuery::literal(sql));
            }
        }
    }

    Ok(queries)
}

fn list_tables(driver: &mut dyn Driver, dialect: Dialect) -> Result<Vec<String>, AlphaDbError> {
    let (sql, column) = match dialect {
        Dialect::SQLite => ("SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%';", "name"),
        Dialect::MySQL => (
            "SELECT table_name FROM information_schema.tables WHERE table_schema = DATABASE();",
            "table_name",
        ),
        Dialect::PostgreSQL => (
            "SELECT table_name FROM information_schema.tables WHERE table_schema = 'public';",
            "table_name",
        ),
    };
    let rows = driver.fetch_all(sql, &[]).map_err(driver_err)?;
    Ok(rows
        .iter()
        .filter_map(|row| match row.get(column) {
            Some(Value::Text(name)) => Some(name.clone()),
            _ => None,
        })
        .collect())
}
