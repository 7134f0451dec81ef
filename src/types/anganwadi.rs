use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NrcError;
use crate::store::{Record, Row, Table};

/// A village-level anganwadi center that refers children to the NRC.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnganwadiCenter {
    pub id: String,
    pub name: String,
    pub code: String,
    pub district: Option<String>,
    pub block: Option<String>,
    pub village: Option<String>,
    pub supervisor_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for AnganwadiCenter {
    const TABLE: Table = Table::AnganwadiCenters;

    fn from_row(row: &Row) -> Result<Self, NrcError> {
        Ok(Self {
            id: row.text("id"),
            name: row.text("name"),
            code: row.text("code"),
            district: row.opt_text("district"),
            block: row.opt_text("block"),
            village: row.opt_text("village"),
            supervisor_id: row.opt_text("supervisor_id"),
            created_at: row.parse(Self::TABLE, "created_at")?,
        })
    }

    fn to_row(&self) -> Result<Row, NrcError> {
        Ok(Row::new()
            .with("id", &self.id)
            .with("name", &self.name)
            .with("code", &self.code)
            .with_opt("district", self.district.as_ref())
            .with_opt("block", self.block.as_ref())
            .with_opt("village", self.village.as_ref())
            .with_opt("supervisor_id", self.supervisor_id.as_ref())
            .with("created_at", self.created_at.to_rfc3339()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCenter {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub block: Option<String>,
    #[serde(default)]
    pub village: Option<String>,
    #[serde(default)]
    pub supervisor_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CenterPatch {
    pub name: Option<String>,
    pub code: Option<String>,
    pub district: Option<String>,
    pub block: Option<String>,
    pub village: Option<String>,
    pub supervisor_id: Option<String>,
}

impl CenterPatch {
    pub fn to_row(&self) -> Row {
        Row::new()
            .with_opt("name", self.name.as_deref().map(str::trim))
            .with_opt("code", self.code.as_deref().map(str::trim))
            .with_opt("district", self.district.as_ref())
            .with_opt("block", self.block.as_ref())
            .with_opt("village", self.village.as_ref())
            .with_opt("supervisor_id", self.supervisor_id.as_ref())
    }
}
