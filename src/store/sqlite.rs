use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, Row as _, Sqlite};
use std::str::FromStr;
use tracing::info;

use super::row::Row;
use super::schema::Table;
use super::traits::{Filter, TableStore, check_filters};
use crate::error::NrcError;

pub type SqlitePool = Pool<Sqlite>;

/// Same contract as the CSV store, one TEXT-only SQLite table per entity.
///
/// Column names in generated SQL always come from the static schema; user
/// input only ever reaches bind parameters.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, NrcError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        Ok(Self::new(pool))
    }

    fn select_sql(table: Table, filters: &[Filter]) -> String {
        let mut sql = format!(
            "SELECT {} FROM {}",
            table.columns().join(", "),
            table.name()
        );
        if !filters.is_empty() {
            let cond = filters
                .iter()
                .map(|(c, _)| format!("{c} = ?"))
                .collect::<Vec<_>>()
                .join(" AND ");
            sql.push_str(" WHERE ");
            sql.push_str(&cond);
        }
        sql.push_str(" ORDER BY rowid");
        sql
    }

    async fn select(&self, table: Table, filters: &[Filter]) -> Result<Vec<Row>, NrcError> {
        let sql = Self::select_sql(table, filters);
        let mut query = sqlx::query(&sql);
        for (_, value) in filters {
            query = query.bind(value.as_str());
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| Self::row_to_model(table, r))
            .collect()
    }

    fn row_to_model(table: Table, row: SqliteRow) -> Result<Row, NrcError> {
        let mut out = Row::new();
        for column in table.columns() {
            let value: String = row.try_get(*column)?;
            out.set(column, value);
        }
        Ok(out)
    }
}

impl TableStore for SqliteStore {
    async fn init(&mut self) -> Result<(), NrcError> {
        for table in Table::ALL {
            sqlx::query(&table.sqlite_ddl()).execute(&self.pool).await?;
        }
        info!(tables = Table::ALL.len(), "sqlite schema ready");
        Ok(())
    }

    async fn read_all(&self, table: Table) -> Result<Vec<Row>, NrcError> {
        self.select(table, &[]).await
    }

    async fn append(&mut self, table: Table, row: Row) -> Result<Row, NrcError> {
        row.check_columns(table)?;
        let columns = table.columns();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table.name(),
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        );
        let mut query = sqlx::query(&sql);
        for cell in row.to_cells(table) {
            query = query.bind(cell);
        }
        query.execute(&self.pool).await?;
        Ok(row)
    }

    async fn update_by_id(
        &mut self,
        table: Table,
        id: &str,
        patch: Row,
    ) -> Result<Option<Row>, NrcError> {
        patch.check_columns(table)?;
        let cells: Vec<(&str, &str)> = patch.iter().filter(|(c, _)| *c != "id").collect();
        if cells.is_empty() {
            return self.get(table, id).await;
        }

        let assignments = cells
            .iter()
            .map(|(c, _)| format!("{c} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {} SET {} WHERE id = ?", table.name(), assignments);
        let mut query = sqlx::query(&sql);
        for (_, value) in &cells {
            query = query.bind(*value);
        }
        let result = query.bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get(table, id).await
    }

    async fn delete_by_id(&mut self, table: Table, id: &str) -> Result<bool, NrcError> {
        let sql = format!("DELETE FROM {} WHERE id = ?", table.name());
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, table: Table, filters: &[Filter]) -> Result<Vec<Row>, NrcError> {
        check_filters(table, filters)?;
        self.select(table, filters).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::traits::filter;

    async fn store() -> SqliteStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let mut store = SqliteStore::new(pool);
        store.init().await.unwrap();
        store
    }

    fn worker(id: &str, center: &str) -> Row {
        Row::new()
            .with("id", id)
            .with("name", format!("worker {id}"))
            .with("center_id", center)
    }

    #[tokio::test]
    async fn append_find_update_delete() {
        let mut store = store().await;
        store.append(Table::Workers, worker("w1", "c1")).await.unwrap();
        store.append(Table::Workers, worker("w2", "c2")).await.unwrap();
        store.append(Table::Workers, worker("w3", "c1")).await.unwrap();

        let c1 = store
            .find_by_field(Table::Workers, "center_id", "c1")
            .await
            .unwrap();
        assert_eq!(c1.iter().map(Row::id).collect::<Vec<_>>(), ["w1", "w3"]);
        assert_eq!(c1[0].get("phone"), "");

        let updated = store
            .update_by_id(Table::Workers, "w2", Row::new().with("phone", "98450"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.get("phone"), "98450");
        assert_eq!(updated.get("center_id"), "c2");

        assert!(
            store
                .update_by_id(Table::Workers, "w9", Row::new().with("phone", "1"))
                .await
                .unwrap()
                .is_none()
        );

        assert!(store.delete_by_id(Table::Workers, "w1").await.unwrap());
        assert!(!store.delete_by_id(Table::Workers, "w1").await.unwrap());
        assert_eq!(store.read_all(Table::Workers).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn filter_columns_are_validated() {
        let store = store().await;
        let err = store
            .find(Table::Workers, &[filter("name; DROP TABLE workers", "x")])
            .await
            .unwrap_err();
        assert!(matches!(err, NrcError::UnknownColumn { .. }));
    }
}
