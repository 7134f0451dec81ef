use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::str::FromStr;

use super::schema::Table;
use crate::error::NrcError;

/// A table row: column name to raw cell text.
///
/// Cells are strings, as in the CSV files. Typed access goes through the
/// helpers below, which report the offending column on failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: HashMap<String, String>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cells in schema order; absent columns become empty strings.
    pub fn to_cells(&self, table: Table) -> Vec<String> {
        table
            .columns()
            .iter()
            .map(|c| self.get(c).to_string())
            .collect()
    }

    pub fn id(&self) -> &str {
        self.get("id")
    }

    pub fn get(&self, column: &str) -> &str {
        self.cells.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) -> &mut Self {
        self.cells.insert(column.to_string(), value.into());
        self
    }

    pub fn with(mut self, column: &str, value: impl Into<String>) -> Self {
        self.set(column, value);
        self
    }

    /// Set a cell only when a value is present.
    pub fn with_opt<T: ToString>(mut self, column: &str, value: Option<T>) -> Self {
        if let Some(v) = value {
            self.set(column, v.to_string());
        }
        self
    }

    pub fn with_json<T: Serialize>(mut self, column: &str, value: &T) -> Result<Self, NrcError> {
        self.set(column, serde_json::to_string(value)?);
        Ok(self)
    }

    /// Copy every cell of `patch` over this row, except `id`.
    pub fn merge(&mut self, patch: &Row) {
        for (k, v) in patch.iter() {
            if k != "id" {
                self.set(k, v);
            }
        }
    }

    /// Ensure every cell names a column of `table`.
    pub fn check_columns(&self, table: Table) -> Result<(), NrcError> {
        match self.columns().find(|c| !table.has_column(c)) {
            Some(column) => Err(NrcError::UnknownColumn {
                table,
                column: column.to_string(),
            }),
            None => Ok(()),
        }
    }

    pub fn text(&self, column: &str) -> String {
        self.get(column).to_string()
    }

    /// Empty cells read as `None`.
    pub fn opt_text(&self, column: &str) -> Option<String> {
        let v = self.get(column);
        (!v.is_empty()).then(|| v.to_string())
    }

    pub fn parse<T>(&self, table: Table, column: &str) -> Result<T, NrcError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.get(column)
            .parse()
            .map_err(|e: T::Err| malformed(table, column, e.to_string()))
    }

    pub fn opt_parse<T>(&self, table: Table, column: &str) -> Result<Option<T>, NrcError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        if self.get(column).is_empty() {
            return Ok(None);
        }
        self.parse(table, column).map(Some)
    }

    pub fn flag(&self, column: &str) -> bool {
        matches!(self.get(column), "true" | "1" | "yes")
    }

    /// JSON cell; empty reads as the type's default.
    pub fn json<T>(&self, table: Table, column: &str) -> Result<T, NrcError>
    where
        T: DeserializeOwned + Default,
    {
        let raw = self.get(column);
        if raw.is_empty() {
            return Ok(T::default());
        }
        serde_json::from_str(raw).map_err(|e| malformed(table, column, e.to_string()))
    }
}

fn malformed(table: Table, column: &str, reason: String) -> NrcError {
    NrcError::MalformedCell {
        table,
        column: column.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_become_empty_cells() {
        let row = Row::new().with("id", "b1").with("ward", "general");
        assert_eq!(row.get("status"), "");
        let cells = row.to_cells(Table::Beds);
        assert_eq!(cells.len(), Table::Beds.columns().len());
        assert_eq!(cells[0], "b1");
        assert_eq!(cells[1], "general");
    }

    #[test]
    fn merge_never_touches_id() {
        let mut row = Row::new().with("id", "a").with("ward", "x");
        row.merge(&Row::new().with("id", "b").with("ward", "y"));
        assert_eq!(row.id(), "a");
        assert_eq!(row.get("ward"), "y");
    }

    #[test]
    fn unknown_columns_are_rejected() {
        let row = Row::new().with("colour", "red");
        assert!(matches!(
            row.check_columns(Table::Beds),
            Err(NrcError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn typed_access_names_the_column() {
        let row = Row::new().with("age_months", "abc");
        let err = row.parse::<u32>(Table::Patients, "age_months").unwrap_err();
        assert!(err.to_string().contains("age_months"));
        assert_eq!(row.opt_parse::<f64>(Table::Patients, "weight_kg").unwrap(), None);
    }
}
