use std::future::Future;

use super::row::Row;
use super::schema::Table;
use crate::error::NrcError;

/// Equality filter: `(column, expected cell value)`.
pub type Filter = (String, String);

pub fn filter(column: &str, value: impl Into<String>) -> Filter {
    (column.to_string(), value.into())
}

/// Whole-table storage contract shared by the flat-file and SQLite backends.
///
/// Rows come back in insertion order. Filter and patch columns are checked
/// against the table schema before anything is read or written.
pub trait TableStore: Send + Sync {
    /// Create missing tables (header-only files / DDL).
    fn init(&mut self) -> impl Future<Output = Result<(), NrcError>> + Send;

    fn read_all(&self, table: Table) -> impl Future<Output = Result<Vec<Row>, NrcError>> + Send;

    fn append(&mut self, table: Table, row: Row)
    -> impl Future<Output = Result<Row, NrcError>> + Send;

    /// Merge `patch` into the row with `id`. `None` when no row matches.
    fn update_by_id(
        &mut self,
        table: Table,
        id: &str,
        patch: Row,
    ) -> impl Future<Output = Result<Option<Row>, NrcError>> + Send;

    fn delete_by_id(
        &mut self,
        table: Table,
        id: &str,
    ) -> impl Future<Output = Result<bool, NrcError>> + Send;

    fn find(
        &self,
        table: Table,
        filters: &[Filter],
    ) -> impl Future<Output = Result<Vec<Row>, NrcError>> + Send;

    fn find_one(
        &self,
        table: Table,
        filters: &[Filter],
    ) -> impl Future<Output = Result<Option<Row>, NrcError>> + Send {
        async move { Ok(self.find(table, filters).await?.into_iter().next()) }
    }

    fn find_by_field(
        &self,
        table: Table,
        column: &str,
        value: &str,
    ) -> impl Future<Output = Result<Vec<Row>, NrcError>> + Send {
        let filters = [filter(column, value)];
        async move { self.find(table, &filters).await }
    }

    fn get(
        &self,
        table: Table,
        id: &str,
    ) -> impl Future<Output = Result<Option<Row>, NrcError>> + Send {
        let filters = [filter("id", id)];
        async move { self.find_one(table, &filters).await }
    }
}

pub(crate) fn check_filters(table: Table, filters: &[Filter]) -> Result<(), NrcError> {
    match filters.iter().find(|(c, _)| !table.has_column(c)) {
        Some((column, _)) => Err(NrcError::UnknownColumn {
            table,
            column: column.clone(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn matches(row: &Row, filters: &[Filter]) -> bool {
    filters.iter().all(|(c, v)| row.get(c) == v)
}
