use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::NrcError;
use crate::store::{Record, Row, Table};

/// Weight gain over admission weight at which a child may be discharged.
pub const TARGET_GAIN_RATIO: f64 = 1.15;

cell_enum! {
    pub enum TrackerStatus {
        Active => "active",
        Completed => "completed",
    }
}

/// One day of in-patient care, kept in the tracker's `daily_records` cell.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyRecord {
    pub date: NaiveDate,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    /// Therapeutic feed given (F-75, F-100, RUTF...).
    #[serde(default)]
    pub feed: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub recorded_by: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentTracker {
    pub id: String,
    pub patient_id: String,
    pub admission_date: NaiveDate,
    pub admission_weight_kg: Option<f64>,
    pub target_weight_kg: Option<f64>,
    pub medications: Vec<String>,
    pub daily_records: Vec<DailyRecord>,
    pub status: TrackerStatus,
    pub discharge_date: Option<NaiveDate>,
    pub discharge_weight_kg: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Progress {
    pub latest_weight_kg: Option<f64>,
    pub weight_gain_kg: Option<f64>,
    /// Average gain in grams per kg of admission weight per day.
    pub avg_gain_g_per_kg_day: Option<f64>,
    pub days_admitted: i64,
    pub target_reached: bool,
}

impl TreatmentTracker {
    pub fn open(patient_id: impl Into<String>, admission_date: NaiveDate, weight: Option<f64>) -> Self {
        let now = super::now();
        Self {
            id: super::new_id(),
            patient_id: patient_id.into(),
            admission_date,
            admission_weight_kg: weight,
            target_weight_kg: weight.map(target_weight),
            medications: Vec::new(),
            daily_records: Vec::new(),
            status: TrackerStatus::Active,
            discharge_date: None,
            discharge_weight_kg: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Most recent recorded weight, by record date.
    pub fn latest_weight(&self) -> Option<(NaiveDate, f64)> {
        self.daily_records
            .iter()
            .filter_map(|r| r.weight_kg.map(|w| (r.date, w)))
            .max_by_key(|(d, _)| *d)
    }

    pub fn progress(&self) -> Progress {
        let latest = self.latest_weight();
        let end = self
            .discharge_date
            .or(latest.map(|(d, _)| d))
            .unwrap_or(self.admission_date);
        let days = (end - self.admission_date).num_days().max(0);
        let latest_weight = self.discharge_weight_kg.or(latest.map(|(_, w)| w));

        let gain = match (self.admission_weight_kg, latest_weight) {
            (Some(a), Some(l)) => Some(l - a),
            _ => None,
        };
        let rate = match (gain, self.admission_weight_kg) {
            (Some(g), Some(a)) if days > 0 && a > 0.0 => Some(g * 1000.0 / a / days as f64),
            _ => None,
        };
        let target_reached = matches!(
            (latest_weight, self.target_weight_kg),
            (Some(l), Some(t)) if l >= t
        );

        Progress {
            latest_weight_kg: latest_weight,
            weight_gain_kg: gain,
            avg_gain_g_per_kg_day: rate,
            days_admitted: days,
            target_reached,
        }
    }
}

pub fn target_weight(admission_weight: f64) -> f64 {
    (admission_weight * TARGET_GAIN_RATIO * 100.0).round() / 100.0
}

impl Record for TreatmentTracker {
    const TABLE: Table = Table::TreatmentTrackers;

    fn from_row(row: &Row) -> Result<Self, NrcError> {
        let t = Self::TABLE;
        Ok(Self {
            id: row.text("id"),
            patient_id: row.text("patient_id"),
            admission_date: row.parse(t, "admission_date")?,
            admission_weight_kg: row.opt_parse(t, "admission_weight_kg")?,
            target_weight_kg: row.opt_parse(t, "target_weight_kg")?,
            medications: row.json(t, "medications")?,
            daily_records: row.json(t, "daily_records")?,
            status: row.parse(t, "status")?,
            discharge_date: row.opt_parse(t, "discharge_date")?,
            discharge_weight_kg: row.opt_parse(t, "discharge_weight_kg")?,
            created_at: row.parse(t, "created_at")?,
            updated_at: row.parse(t, "updated_at")?,
        })
    }

    fn to_row(&self) -> Result<Row, NrcError> {
        Row::new()
            .with("id", &self.id)
            .with("patient_id", &self.patient_id)
            .with("admission_date", self.admission_date.to_string())
            .with_opt("admission_weight_kg", self.admission_weight_kg)
            .with_opt("target_weight_kg", self.target_weight_kg)
            .with("status", self.status.as_str())
            .with_opt("discharge_date", self.discharge_date)
            .with_opt("discharge_weight_kg", self.discharge_weight_kg)
            .with("created_at", self.created_at.to_rfc3339())
            .with("updated_at", self.updated_at.to_rfc3339())
            .with_json("medications", &self.medications)?
            .with_json("daily_records", &self.daily_records)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTracker {
    pub patient_id: String,
    #[serde(default)]
    pub admission_date: Option<NaiveDate>,
    #[serde(default)]
    pub admission_weight_kg: Option<f64>,
    #[serde(default)]
    pub medications: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TrackerPatch {
    pub medications: Option<Vec<String>>,
    pub target_weight_kg: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackerQuery {
    pub status: Option<TrackerStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, d).unwrap()
    }

    fn record(d: u32, w: f64) -> DailyRecord {
        DailyRecord {
            date: day(d),
            weight_kg: Some(w),
            feed: Some("F-100".into()),
            notes: None,
            recorded_by: None,
        }
    }

    #[test]
    fn target_is_fifteen_percent_over_admission() {
        assert_eq!(target_weight(6.0), 6.9);
        let t = TreatmentTracker::open("p1", day(1), Some(8.0));
        assert_eq!(t.target_weight_kg, Some(9.2));
    }

    #[test]
    fn progress_uses_latest_dated_weight() {
        let mut t = TreatmentTracker::open("p1", day(1), Some(5.0));
        t.daily_records = vec![record(11, 5.5), record(6, 5.2)];
        let p = t.progress();
        assert_eq!(p.days_admitted, 10);
        assert_eq!(p.latest_weight_kg, Some(5.5));
        // 500 g over 5 kg in 10 days
        let rate = p.avg_gain_g_per_kg_day.unwrap();
        assert!((rate - 10.0).abs() < 1e-9);
        assert!(!p.target_reached);
    }

    #[test]
    fn progress_without_records_has_no_rate() {
        let t = TreatmentTracker::open("p1", day(1), Some(5.0));
        let p = t.progress();
        assert_eq!(p.avg_gain_g_per_kg_day, None);
        assert_eq!(p.days_admitted, 0);
    }

    #[test]
    fn records_survive_the_json_cell() {
        let mut t = TreatmentTracker::open("p1", day(1), None);
        t.daily_records.push(record(2, 4.4));
        t.medications = vec!["amoxicillin".into(), "vitamin A, single dose".into()];
        let back = TreatmentTracker::from_row(&t.to_row().unwrap()).unwrap();
        assert_eq!(back, t);
    }
}
