use super::csv_store::CsvStore;
use super::row::Row;
use super::schema::Table;
use super::sqlite::SqliteStore;
use super::traits::{Filter, TableStore};
use crate::config::{StorageBackend, StorageConfig};
use crate::error::NrcError;

/// The configured storage backend.
pub enum Backend {
    Csv(CsvStore),
    Sqlite(SqliteStore),
}

impl Backend {
    /// Open the backend named by the config and create any missing tables.
    pub async fn open(cfg: &StorageConfig) -> Result<Self, NrcError> {
        let mut backend = match cfg.backend {
            StorageBackend::Csv => Backend::Csv(CsvStore::new(&cfg.data_dir)),
            StorageBackend::Sqlite => {
                if let Some(parent) = sqlite_parent_dir(&cfg.database_url) {
                    tokio::fs::create_dir_all(parent).await?;
                }
                Backend::Sqlite(SqliteStore::connect(&cfg.database_url).await?)
            }
        };
        backend.init().await?;
        Ok(backend)
    }

    pub fn kind(&self) -> StorageBackend {
        match self {
            Backend::Csv(_) => StorageBackend::Csv,
            Backend::Sqlite(_) => StorageBackend::Sqlite,
        }
    }
}

fn sqlite_parent_dir(url: &str) -> Option<&std::path::Path> {
    let path = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = path.split('?').next()?;
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    std::path::Path::new(path)
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
}

impl TableStore for Backend {
    async fn init(&mut self) -> Result<(), NrcError> {
        match self {
            Backend::Csv(s) => s.init().await,
            Backend::Sqlite(s) => s.init().await,
        }
    }

    async fn read_all(&self, table: Table) -> Result<Vec<Row>, NrcError> {
        match self {
            Backend::Csv(s) => s.read_all(table).await,
            Backend::Sqlite(s) => s.read_all(table).await,
        }
    }

    async fn append(&mut self, table: Table, row: Row) -> Result<Row, NrcError> {
        match self {
            Backend::Csv(s) => s.append(table, row).await,
            Backend::Sqlite(s) => s.append(table, row).await,
        }
    }

    async fn update_by_id(
        &mut self,
        table: Table,
        id: &str,
        patch: Row,
    ) -> Result<Option<Row>, NrcError> {
        match self {
            Backend::Csv(s) => s.update_by_id(table, id, patch).await,
            Backend::Sqlite(s) => s.update_by_id(table, id, patch).await,
        }
    }

    async fn delete_by_id(&mut self, table: Table, id: &str) -> Result<bool, NrcError> {
        match self {
            Backend::Csv(s) => s.delete_by_id(table, id).await,
            Backend::Sqlite(s) => s.delete_by_id(table, id).await,
        }
    }

    async fn find(&self, table: Table, filters: &[Filter]) -> Result<Vec<Row>, NrcError> {
        match self {
            Backend::Csv(s) => s.find(table, filters).await,
            Backend::Sqlite(s) => s.find(table, filters).await,
        }
    }
}
