pub mod sqlite_driver;

pub use sqlite_driver::SqliteDriver;
