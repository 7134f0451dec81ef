use std::path::PathBuf;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt, SeekFrom};
use tracing::{debug, info};

use super::csv;
use super::row::Row;
use super::schema::Table;
use super::traits::{Filter, TableStore, check_filters, matches};
use crate::error::NrcError;

/// One CSV file per table under a data directory.
///
/// Appends add a single line. Updates and deletes rewrite the whole file
/// through a sibling temp file and a rename.
#[derive(Debug, Clone)]
pub struct CsvStore {
    dir: PathBuf,
}

impl CsvStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_of(&self, table: Table) -> PathBuf {
        self.dir.join(table.file_name())
    }

    fn header_line(table: Table) -> String {
        let mut line = csv::encode_record(table.columns());
        line.push('\n');
        line
    }

    async fn load(&self, table: Table) -> Result<Vec<Row>, NrcError> {
        let path = self.path_of(table);
        let text = match fs::read_to_string(&path).await {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records = csv::parse(&text)
            .map_err(|e| NrcError::MalformedCsv {
                file: table.file_name(),
                line: e.line,
                reason: e.reason,
            })?
            .into_iter();

        let Some(header) = records.next() else {
            return Ok(Vec::new());
        };

        let rows = records
            .map(|cells| {
                let mut row = Row::new();
                for (column, cell) in header.iter().zip(cells) {
                    if table.has_column(column) {
                        row.set(column, cell);
                    }
                }
                row
            })
            .collect();
        Ok(rows)
    }

    async fn rewrite(&self, table: Table, rows: &[Row]) -> Result<(), NrcError> {
        let mut out = Self::header_line(table);
        for row in rows {
            out.push_str(&csv::encode_record(&row.to_cells(table)));
            out.push('\n');
        }

        let path = self.path_of(table);
        let tmp = path.with_extension("csv.tmp");
        fs::write(&tmp, out).await?;
        fs::rename(&tmp, &path).await?;
        debug!(table = %table, rows = rows.len(), "table rewritten");
        Ok(())
    }

    /// Whether the existing file ends without a newline (hand-edited files).
    async fn needs_leading_newline(file: &mut fs::File) -> Result<bool, NrcError> {
        let len = file.metadata().await?.len();
        if len == 0 {
            return Ok(false);
        }
        file.seek(SeekFrom::Start(len - 1)).await?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last).await?;
        Ok(last[0] != b'\n')
    }
}

impl TableStore for CsvStore {
    async fn init(&mut self) -> Result<(), NrcError> {
        fs::create_dir_all(&self.dir).await?;
        for table in Table::ALL {
            let path = self.path_of(table);
            if fs::try_exists(&path).await? {
                continue;
            }
            fs::write(&path, Self::header_line(table)).await?;
            info!(path = %path.display(), "created table file");
        }
        Ok(())
    }

    async fn read_all(&self, table: Table) -> Result<Vec<Row>, NrcError> {
        self.load(table).await
    }

    async fn append(&mut self, table: Table, row: Row) -> Result<Row, NrcError> {
        row.check_columns(table)?;
        let path = self.path_of(table);

        let mut file = fs::OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&path)
            .await?;

        let mut out = String::new();
        if file.metadata().await?.len() == 0 {
            out.push_str(&Self::header_line(table));
        } else if Self::needs_leading_newline(&mut file).await? {
            out.push('\n');
        }
        out.push_str(&csv::encode_record(&row.to_cells(table)));
        out.push('\n');

        file.write_all(out.as_bytes()).await?;
        file.flush().await?;
        Ok(row)
    }

    async fn update_by_id(
        &mut self,
        table: Table,
        id: &str,
        patch: Row,
    ) -> Result<Option<Row>, NrcError> {
        patch.check_columns(table)?;
        let mut rows = self.load(table).await?;
        let Some(row) = rows.iter_mut().find(|r| r.id() == id) else {
            return Ok(None);
        };
        row.merge(&patch);
        let updated = row.clone();
        self.rewrite(table, &rows).await?;
        Ok(Some(updated))
    }

    async fn delete_by_id(&mut self, table: Table, id: &str) -> Result<bool, NrcError> {
        let mut rows = self.load(table).await?;
        let before = rows.len();
        rows.retain(|r| r.id() != id);
        if rows.len() == before {
            return Ok(false);
        }
        self.rewrite(table, &rows).await?;
        Ok(true)
    }

    async fn find(&self, table: Table, filters: &[Filter]) -> Result<Vec<Row>, NrcError> {
        check_filters(table, filters)?;
        let rows = self.load(table).await?;
        Ok(rows.into_iter().filter(|r| matches(r, filters)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::traits::filter;

    fn bed(id: &str, ward: &str, number: &str) -> Row {
        Row::new()
            .with("id", id)
            .with("ward", ward)
            .with("bed_number", number)
            .with("status", "available")
    }

    async fn store() -> (tempfile::TempDir, CsvStore) {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvStore::new(dir.path().join("data"));
        store.init().await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn init_writes_headers() {
        let (_dir, store) = store().await;
        let text = std::fs::read_to_string(store.path_of(Table::Beds)).unwrap();
        assert_eq!(
            text,
            "id,ward,bed_number,status,patient_id,assigned_at,created_at\n"
        );
        assert!(store.read_all(Table::Beds).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn append_then_find() {
        let (_dir, mut store) = store().await;
        store.append(Table::Beds, bed("b1", "general", "1")).await.unwrap();
        store.append(Table::Beds, bed("b2", "general", "2")).await.unwrap();
        store.append(Table::Beds, bed("b3", "icu, east", "1")).await.unwrap();

        let all = store.read_all(Table::Beds).await.unwrap();
        assert_eq!(all.iter().map(Row::id).collect::<Vec<_>>(), ["b1", "b2", "b3"]);

        let general = store
            .find_by_field(Table::Beds, "ward", "general")
            .await
            .unwrap();
        assert_eq!(general.len(), 2);

        let icu = store
            .find_one(
                Table::Beds,
                &[filter("ward", "icu, east"), filter("bed_number", "1")],
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(icu.id(), "b3");
    }

    #[tokio::test]
    async fn update_merges_and_rewrites() {
        let (_dir, mut store) = store().await;
        store.append(Table::Beds, bed("b1", "general", "1")).await.unwrap();
        store.append(Table::Beds, bed("b2", "general", "2")).await.unwrap();

        let patch = Row::new()
            .with("status", "occupied")
            .with("patient_id", "p9");
        let updated = store
            .update_by_id(Table::Beds, "b2", patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.get("ward"), "general");
        assert_eq!(updated.get("status"), "occupied");

        let reloaded = store.get(Table::Beds, "b2").await.unwrap().unwrap();
        assert_eq!(reloaded.get("patient_id"), "p9");
        assert_eq!(store.read_all(Table::Beds).await.unwrap().len(), 2);
        let path = store.path_of(Table::Beds);
        assert!(path.exists());
        assert!(!path.with_extension("csv.tmp").exists());

        let missing = store
            .update_by_id(Table::Beds, "nope", Row::new().with("status", "x"))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_matched() {
        let (_dir, mut store) = store().await;
        store.append(Table::Beds, bed("b1", "general", "1")).await.unwrap();
        assert!(!store.delete_by_id(Table::Beds, "zzz").await.unwrap());
        assert!(store.delete_by_id(Table::Beds, "b1").await.unwrap());
        assert!(store.read_all(Table::Beds).await.unwrap().is_empty());
        assert!(!store.path_of(Table::Beds).with_extension("csv.tmp").exists());
    }

    #[tokio::test]
    async fn unknown_filter_column_is_an_error() {
        let (_dir, store) = store().await;
        let err = store
            .find_by_field(Table::Beds, "colour", "red")
            .await
            .unwrap_err();
        assert!(matches!(err, NrcError::UnknownColumn { .. }));
    }

    #[tokio::test]
    async fn reads_by_header_and_tolerates_short_lines() {
        let (_dir, mut store) = store().await;
        std::fs::write(
            store.path_of(Table::Beds),
            "ward,id,legacy\nmaternity,b7,zzz\nsurgical",
        )
        .unwrap();

        let rows = store.read_all(Table::Beds).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id(), "b7");
        assert_eq!(rows[0].get("ward"), "maternity");
        assert!(!rows[0].contains("legacy"));
        assert_eq!(rows[1].id(), "");

        // appending after a line without trailing newline must not glue rows
        store.append(Table::Beds, bed("b8", "general", "8")).await.unwrap();
        let rows = store.read_all(Table::Beds).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].id(), "b8");
    }

    #[tokio::test]
    async fn multiline_json_cells_round_trip_through_rewrite() {
        let (_dir, mut store) = store().await;
        let notes = "line one\n\"quoted\", line two";
        let row = Row::new()
            .with("id", "v1")
            .with("patient_id", "p1")
            .with("notes", notes);
        store.append(Table::Visits, row).await.unwrap();
        store
            .update_by_id(Table::Visits, "v1", Row::new().with("status", "completed"))
            .await
            .unwrap();

        let v = store.get(Table::Visits, "v1").await.unwrap().unwrap();
        assert_eq!(v.get("notes"), notes);
        assert_eq!(v.get("status"), "completed");
    }
}
