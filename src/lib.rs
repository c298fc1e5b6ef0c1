//! AlphaDB: a declarative schema-migration engine.
//!
//! Users describe a database's desired structure as a [`model::VersionSource`]
//! -- an ordered history of versioned transformations (`createtable`,
//! `altertable`, `default_data`). [`verifier::verify`] statically rejects an
//! incoherent history before any SQL is generated; [`concatenate`] folds
//! that history into the effective column/table state at any point in it;
//! [`emit`] renders dialect-specific DDL/DML from the two; [`orchestrator`]
//! drives all of it against a live [`driver::Driver`], tracking the
//! database's recorded version in its own config table.
//!
//! The database driver itself, CLI tooling, and connection/credential setup
//! are deliberately out of scope -- this crate only defines the `Driver`
//! trait it consumes.

pub mod concatenate;
pub mod config;
pub mod dialect;
pub mod driver;
pub mod emit;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod verifier;
pub mod version;

pub use dialect::Dialect;
pub use driver::{Driver, DriverError, Row};
pub use error::AlphaDbError;
pub use model::VersionSource;
pub use orchestrator::{CheckResult, GeneratedQuery, Orchestrator, StatusResult, UpdateOutcome};
pub use verifier::{Issue, Severity};
