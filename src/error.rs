//! Error taxonomy for the AlphaDB engine.
//!
//! One variant per failure case named in the specification, plus the two
//! this crate needs to plumb the `Driver` boundary and the dialect-scoped
//! `export` restriction.

use thiserror::Error;

use crate::dialect::Dialect;
use crate::verifier::Issue;

/// The engine's single error type.
#[derive(Debug, Error)]
pub enum AlphaDbError {
    /// Orchestrator method called before a driver was attached.
    #[error("No database connection active.")]
    NoConnection,

    /// A dialect-dependent operation was invoked with no dialect set.
    #[error("No database engine was specified.")]
    NoDatabaseEngineSpecified,

    /// `update`/`status`/etc. invoked on a database with no config row.
    #[error("The database has not yet been initialized.")]
    DbNotInitialized,

    /// The config row exists but is missing a required field.
    #[error(
        "There seems to be an issue with the database config. It is initialized, but does not \
         return a valid {missing}. Please manually check the config table in your database."
    )]
    DbConfigIncomplete {
        /// Name of the missing field (e.g. `"version"`).
        missing: &'static str,
    },

    /// `update` called without a version source.
    #[error("Version information data must be supplied for the update to run.")]
    MissingVersionData,

    /// The version source lacks `name` or `version`.
    #[error(
        "Version information data is not complete. It must contain a template name and a list \
         of versions."
    )]
    IncompleteVersionData,

    /// A required sub-field was missing from a version-source object.
    #[error("\"{object}\" is missing key \"{key}\".")]
    IncompleteVersionObject {
        /// The missing key.
        key: &'static str,
        /// Context describing which object was missing it.
        object: String,
    },

    /// Invariant I1/I2/I3 violated.
    #[error("Version {version} -> {context}: column attributes are not compatible: {detail}")]
    IncompatibleColumnAttributes {
        /// The version at which the conflict was detected.
        version: String,
        /// `kind -> table:name -> column:name` style location.
        context: String,
        /// Human-readable description of the incompatible attributes.
        detail: String,
    },

    /// The version source's template name does not match the one stored
    /// for this database.
    #[error(
        "This database uses a different version source. The template name does not match the \
         one previously used to update this database."
    )]
    DbTemplateNoMatch,

    /// `vacate` called without `confirm = true`.
    #[error("Did you forget to set confirm to true? This is a safety feature.")]
    NeedsConfirmation,

    /// The verifier produced at least one `CRITICAL` issue.
    #[error("Version source verification failed with {} critical issue(s).", .0.len())]
    VerificationFailed(Vec<Issue>),

    /// A dotted version string could not be parsed.
    #[error("\"{0}\" is not a valid version number.")]
    InvalidVersionNumber(String),

    /// An operation that is not well-defined for a given dialect.
    #[error("{operation} is not supported for dialect {dialect:?}.")]
    UnsupportedForDialect {
        /// Name of the unsupported operation (e.g. `"export"`).
        operation: &'static str,
        /// The dialect it was attempted against.
        dialect: Dialect,
    },

    /// Error surfaced from the underlying `Driver` implementation.
    #[error("Driver error: {0}")]
    Driver(String),

    /// JSON (de)serialization error on the version-source document.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
