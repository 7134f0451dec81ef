use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::NrcError;
use crate::store::{Record, Row, Table};

cell_enum! {
    pub enum BedStatus {
        Available => "available",
        Occupied => "occupied",
        Maintenance => "maintenance",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bed {
    pub id: String,
    pub ward: String,
    pub bed_number: String,
    pub status: BedStatus,
    pub patient_id: Option<String>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Record for Bed {
    const TABLE: Table = Table::Beds;

    fn from_row(row: &Row) -> Result<Self, NrcError> {
        Ok(Self {
            id: row.text("id"),
            ward: row.text("ward"),
            bed_number: row.text("bed_number"),
            status: row.parse(Self::TABLE, "status")?,
            patient_id: row.opt_text("patient_id"),
            assigned_at: row.opt_parse(Self::TABLE, "assigned_at")?,
            created_at: row.parse(Self::TABLE, "created_at")?,
        })
    }

    fn to_row(&self) -> Result<Row, NrcError> {
        Ok(Row::new()
            .with("id", &self.id)
            .with("ward", &self.ward)
            .with("bed_number", &self.bed_number)
            .with("status", self.status.as_str())
            .with("patient_id", self.patient_id.clone().unwrap_or_default())
            .with(
                "assigned_at",
                self.assigned_at.map(|t| t.to_rfc3339()).unwrap_or_default(),
            )
            .with("created_at", self.created_at.to_rfc3339()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewBed {
    pub ward: String,
    pub bed_number: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignBedRequest {
    pub patient_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReleaseBedRequest {
    /// Discharge the patient instead of returning them to `registered`.
    pub discharge: bool,
    pub discharge_weight_kg: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceRequest {
    pub on: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BedQuery {
    pub ward: Option<String>,
    pub status: Option<BedStatus>,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct BedCounts {
    pub total: usize,
    pub available: usize,
    pub occupied: usize,
    pub maintenance: usize,
}

impl BedCounts {
    fn add(&mut self, status: BedStatus) {
        self.total += 1;
        match status {
            BedStatus::Available => self.available += 1,
            BedStatus::Occupied => self.occupied += 1,
            BedStatus::Maintenance => self.maintenance += 1,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct BedSummary {
    #[serde(flatten)]
    pub overall: BedCounts,
    pub wards: BTreeMap<String, BedCounts>,
}

impl BedSummary {
    pub fn from_beds<'a>(beds: impl IntoIterator<Item = &'a Bed>) -> Self {
        let mut summary = BedSummary::default();
        for bed in beds {
            summary.overall.add(bed.status);
            summary
                .wards
                .entry(bed.ward.clone())
                .or_default()
                .add(bed.status);
        }
        summary
    }
}
