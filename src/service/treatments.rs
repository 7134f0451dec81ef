use chrono::NaiveDate;
use tracing::info;

use super::{fetch, fetch_all, insert, patch};
use crate::error::NrcError;
use crate::store::{Record, TableStore, filter};
use crate::types::treatment::{
    DailyRecord, NewTracker, Progress, TrackerPatch, TrackerQuery, target_weight,
};
use crate::types::{Patient, TrackerStatus, TreatmentTracker, clean, now};

async fn active_for<S: TableStore>(
    db: &S,
    patient_id: &str,
) -> Result<Option<TreatmentTracker>, NrcError> {
    let filters = [
        filter("patient_id", patient_id),
        filter("status", TrackerStatus::Active.as_str()),
    ];
    Ok(fetch_all(db, &filters).await?.into_iter().next())
}

async fn save<S: TableStore>(
    db: &mut S,
    mut tracker: TreatmentTracker,
) -> Result<TreatmentTracker, NrcError> {
    tracker.updated_at = now();
    let id = tracker.id.clone();
    patch(db, "treatment tracker", &id, tracker.to_row()?).await
}

pub async fn create<S: TableStore>(
    db: &mut S,
    input: NewTracker,
) -> Result<TreatmentTracker, NrcError> {
    let patient: Patient = fetch(db, "patient", &input.patient_id).await?;
    if active_for(db, &patient.id).await?.is_some() {
        return Err(NrcError::conflict(format!(
            "patient {} already has an active treatment tracker",
            patient.id
        )));
    }
    if let Some(w) = input.admission_weight_kg
        && !(w.is_finite() && w > 0.0)
    {
        return Err(NrcError::validation("admission_weight_kg must be a positive number"));
    }

    let date = input.admission_date.unwrap_or_else(|| now().date_naive());
    let weight = input.admission_weight_kg.or(patient.weight_kg);
    let mut tracker = TreatmentTracker::open(&patient.id, date, weight);
    tracker.medications = input.medications;
    insert(db, &tracker).await?;
    info!(tracker_id = %tracker.id, patient_id = %patient.id, "treatment tracker opened");
    Ok(tracker)
}

/// Active tracker for `patient`, opening one from the patient's current
/// weight when there is none.
pub(crate) async fn open_if_missing<S: TableStore>(
    db: &mut S,
    patient: &Patient,
    admission_date: NaiveDate,
) -> Result<TreatmentTracker, NrcError> {
    if let Some(active) = active_for(db, &patient.id).await? {
        return Ok(active);
    }
    let tracker = TreatmentTracker::open(&patient.id, admission_date, patient.weight_kg);
    insert(db, &tracker).await?;
    info!(tracker_id = %tracker.id, patient_id = %patient.id, "treatment tracker opened on admission");
    Ok(tracker)
}

/// Close the patient's active tracker, if any. Without an explicit weight the
/// last recorded one is used.
pub(crate) async fn complete_active<S: TableStore>(
    db: &mut S,
    patient_id: &str,
    discharge_date: NaiveDate,
    discharge_weight: Option<f64>,
) -> Result<Option<TreatmentTracker>, NrcError> {
    let Some(mut tracker) = active_for(db, patient_id).await? else {
        return Ok(None);
    };
    tracker.status = TrackerStatus::Completed;
    tracker.discharge_date = Some(discharge_date);
    tracker.discharge_weight_kg = discharge_weight.or(tracker.latest_weight().map(|(_, w)| w));
    let tracker = save(db, tracker).await?;
    info!(
        tracker_id = %tracker.id,
        patient_id,
        target_reached = tracker.progress().target_reached,
        "treatment tracker completed"
    );
    Ok(Some(tracker))
}

pub async fn add_record<S: TableStore>(
    db: &mut S,
    id: &str,
    mut record: DailyRecord,
) -> Result<TreatmentTracker, NrcError> {
    let mut tracker: TreatmentTracker = fetch(db, "treatment tracker", id).await?;
    if tracker.status == TrackerStatus::Completed {
        return Err(NrcError::conflict(format!("treatment tracker {id} is completed")));
    }
    if let Some(w) = record.weight_kg
        && !(w.is_finite() && w > 0.0)
    {
        return Err(NrcError::validation("weight_kg must be a positive number"));
    }
    record.feed = clean(record.feed);
    record.notes = clean(record.notes);
    record.recorded_by = clean(record.recorded_by);

    tracker.daily_records.push(record);
    tracker.daily_records.sort_by_key(|r| r.date);
    save(db, tracker).await
}

pub async fn update<S: TableStore>(
    db: &mut S,
    id: &str,
    input: TrackerPatch,
) -> Result<TreatmentTracker, NrcError> {
    let mut tracker: TreatmentTracker = fetch(db, "treatment tracker", id).await?;
    if let Some(meds) = input.medications {
        tracker.medications = meds
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
    }
    if let Some(target) = input.target_weight_kg {
        if !(target.is_finite() && target > 0.0) {
            return Err(NrcError::validation("target_weight_kg must be a positive number"));
        }
        tracker.target_weight_kg = Some(target);
    } else if tracker.target_weight_kg.is_none() {
        tracker.target_weight_kg = tracker.admission_weight_kg.map(target_weight);
    }
    save(db, tracker).await
}

pub async fn get<S: TableStore>(db: &S, id: &str) -> Result<TreatmentTracker, NrcError> {
    fetch(db, "treatment tracker", id).await
}

/// The patient's active tracker, else their most recent one.
pub async fn for_patient<S: TableStore>(
    db: &S,
    patient_id: &str,
) -> Result<TreatmentTracker, NrcError> {
    let mut trackers: Vec<TreatmentTracker> =
        fetch_all(db, &[filter("patient_id", patient_id)]).await?;
    trackers.sort_by_key(|t| (t.status == TrackerStatus::Active, t.created_at));
    trackers
        .pop()
        .ok_or_else(|| NrcError::not_found("treatment tracker", patient_id))
}

pub async fn list<S: TableStore>(
    db: &S,
    query: TrackerQuery,
) -> Result<Vec<TreatmentTracker>, NrcError> {
    let filters = match query.status {
        Some(s) => vec![filter("status", s.as_str())],
        None => Vec::new(),
    };
    fetch_all(db, &filters).await
}

pub async fn progress<S: TableStore>(db: &S, id: &str) -> Result<Progress, NrcError> {
    Ok(get(db, id).await?.progress())
}
