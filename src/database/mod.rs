//! Local preference tier.
//!
//! Larger values the UI stores by name (such as its color map) live in a
//! small SQLite database.
//!
//! ```no_run
//! use tidytabs::database::Database;
//!
//! let db = Database::open("local.db").expect("failed to open database");
//! db.set_value("colorOf", "{}").expect("failed to store value");
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
