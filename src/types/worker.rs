use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NrcError;
use crate::store::{Record, Row, Table};

/// Field worker attached to an anganwadi center. Not necessarily a login user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Worker {
    pub id: String,
    pub name: String,
    pub employee_id: String,
    pub phone: Option<String>,
    pub center_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for Worker {
    const TABLE: Table = Table::Workers;

    fn from_row(row: &Row) -> Result<Self, NrcError> {
        Ok(Self {
            id: row.text("id"),
            name: row.text("name"),
            employee_id: row.text("employee_id"),
            phone: row.opt_text("phone"),
            center_id: row.opt_text("center_id"),
            created_at: row.parse(Self::TABLE, "created_at")?,
        })
    }

    fn to_row(&self) -> Result<Row, NrcError> {
        Ok(Row::new()
            .with("id", &self.id)
            .with("name", &self.name)
            .with("employee_id", &self.employee_id)
            .with_opt("phone", self.phone.as_ref())
            .with_opt("center_id", self.center_id.as_ref())
            .with("created_at", self.created_at.to_rfc3339()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewWorker {
    pub name: String,
    pub employee_id: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub center_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkerPatch {
    pub name: Option<String>,
    pub employee_id: Option<String>,
    pub phone: Option<String>,
    pub center_id: Option<String>,
}

impl WorkerPatch {
    pub fn to_row(&self) -> Row {
        Row::new()
            .with_opt("name", self.name.as_deref().map(str::trim))
            .with_opt("employee_id", self.employee_id.as_deref().map(str::trim))
            .with_opt("phone", self.phone.as_ref())
            .with_opt("center_id", self.center_id.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerQuery {
    pub center_id: Option<String>,
}
