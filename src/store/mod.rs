//! Storage module: table schemas, the CSV codec and the table store backends.
//!
//! Layout:
//! - `schema.rs`: fixed column list per table
//! - `csv.rs`: RFC 4180 record codec
//! - `row.rs`: string-celled rows with typed accessors
//! - `traits.rs`: the `TableStore` contract
//! - `csv_store.rs` / `sqlite.rs`: flat-file and SQLite backends
//! - `actor.rs`: the actor that owns the backend and serializes access

pub mod actor;
pub mod backend;
pub mod csv;
pub mod csv_store;
pub mod row;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use actor::{StoreHandle, spawn};
pub use backend::Backend;
pub use csv_store::CsvStore;
pub use row::Row;
pub use schema::Table;
pub use sqlite::SqliteStore;
pub use traits::{Filter, TableStore, filter};

/// Entities that map to one row of one table.
pub trait Record: Sized {
    const TABLE: Table;

    fn from_row(row: &Row) -> Result<Self, crate::error::NrcError>;

    fn to_row(&self) -> Result<Row, crate::error::NrcError>;
}
