use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NrcError;
use crate::store::{Record, Row, Table};

cell_enum! {
    #[derive(Default)]
    pub enum VisitKind {
        Screening => "screening",
        #[default]
        FollowUp => "follow_up",
        HomeVisit => "home_visit",
    }
}

cell_enum! {
    pub enum VisitStatus {
        Scheduled => "scheduled",
        Completed => "completed",
        Missed => "missed",
        Cancelled => "cancelled",
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Visit {
    pub id: String,
    pub patient_id: String,
    pub worker_id: Option<String>,
    pub scheduled_date: NaiveDate,
    pub kind: VisitKind,
    pub status: VisitStatus,
    pub notes: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Visit {
    pub fn scheduled(
        patient_id: impl Into<String>,
        worker_id: Option<String>,
        scheduled_date: NaiveDate,
        kind: VisitKind,
    ) -> Self {
        Self {
            id: super::new_id(),
            patient_id: patient_id.into(),
            worker_id,
            scheduled_date,
            kind,
            status: VisitStatus::Scheduled,
            notes: None,
            completed_at: None,
            created_at: super::now(),
        }
    }

    /// Still scheduled and due on or before `today`.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.status == VisitStatus::Scheduled && self.scheduled_date <= today
    }
}

impl Record for Visit {
    const TABLE: Table = Table::Visits;

    fn from_row(row: &Row) -> Result<Self, NrcError> {
        Ok(Self {
            id: row.text("id"),
            patient_id: row.text("patient_id"),
            worker_id: row.opt_text("worker_id"),
            scheduled_date: row.parse(Self::TABLE, "scheduled_date")?,
            kind: row.parse(Self::TABLE, "kind")?,
            status: row.parse(Self::TABLE, "status")?,
            notes: row.opt_text("notes"),
            completed_at: row.opt_parse(Self::TABLE, "completed_at")?,
            created_at: row.parse(Self::TABLE, "created_at")?,
        })
    }

    fn to_row(&self) -> Result<Row, NrcError> {
        Ok(Row::new()
            .with("id", &self.id)
            .with("patient_id", &self.patient_id)
            .with_opt("worker_id", self.worker_id.as_ref())
            .with("scheduled_date", self.scheduled_date.to_string())
            .with("kind", self.kind.as_str())
            .with("status", self.status.as_str())
            .with_opt("notes", self.notes.as_ref())
            .with_opt("completed_at", self.completed_at.map(|t| t.to_rfc3339()))
            .with("created_at", self.created_at.to_rfc3339()))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewVisit {
    pub patient_id: String,
    #[serde(default)]
    pub worker_id: Option<String>,
    pub scheduled_date: NaiveDate,
    #[serde(default)]
    pub kind: VisitKind,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VisitPatch {
    pub worker_id: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    pub status: Option<VisitStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VisitQuery {
    pub patient_id: Option<String>,
    pub worker_id: Option<String>,
    pub status: Option<VisitStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn due_only_when_scheduled_and_not_in_future() {
        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut v = Visit::scheduled("p1", None, day, VisitKind::FollowUp);
        assert!(v.is_due(day));
        assert!(!v.is_due(day.pred_opt().unwrap()));
        v.status = VisitStatus::Completed;
        assert!(!v.is_due(day));

        let back = Visit::from_row(&v.to_row().unwrap()).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn kind_defaults_to_follow_up() {
        let v: NewVisit =
            serde_json::from_str(r#"{"patient_id":"p1","scheduled_date":"2025-03-10"}"#).unwrap();
        assert_eq!(v.kind, VisitKind::FollowUp);
        assert_eq!(v.worker_id, None);
    }
}
