use chrono::{Days, NaiveDate};
use tracing::info;

use super::notifications::notify;
use super::{ensure_exists, fetch, fetch_all, insert, patch, remove};
use crate::config::FollowupConfig;
use crate::error::NrcError;
use crate::store::{Record, Table, TableStore, filter};
use crate::types::visit::{NewVisit, VisitPatch, VisitQuery};
use crate::types::{
    Notification, NotificationKind, Patient, Visit, VisitKind, VisitStatus, clean, now,
};

pub async fn schedule<S: TableStore>(db: &mut S, input: NewVisit) -> Result<Visit, NrcError> {
    let patient: Patient = fetch(db, "patient", &input.patient_id).await?;
    let worker_id = clean(input.worker_id);
    if let Some(worker) = &worker_id {
        ensure_exists(db, Table::Users, "user", worker).await?;
    }

    let mut visit = Visit::scheduled(&patient.id, worker_id, input.scheduled_date, input.kind);
    visit.notes = clean(input.notes);
    insert(db, &visit).await?;

    if let Some(worker) = &visit.worker_id {
        let msg = format!(
            "{} visit for {} scheduled on {}",
            visit.kind, patient.name, visit.scheduled_date
        );
        let n = Notification::new(NotificationKind::VisitScheduled, msg)
            .for_user(worker)
            .about(&patient.id);
        notify(db, n).await?;
    }
    info!(visit_id = %visit.id, patient_id = %patient.id, date = %visit.scheduled_date, "visit scheduled");
    Ok(visit)
}

/// Dates of the post-discharge follow-ups, counted from `discharged_on`.
pub fn followup_dates(discharged_on: NaiveDate, cfg: FollowupConfig) -> Vec<NaiveDate> {
    (1..=cfg.visits)
        .filter_map(|i| {
            discharged_on.checked_add_days(Days::new(u64::from(i) * u64::from(cfg.interval_days)))
        })
        .collect()
}

pub(crate) async fn schedule_followups<S: TableStore>(
    db: &mut S,
    patient: &Patient,
    discharged_on: NaiveDate,
    cfg: FollowupConfig,
) -> Result<Vec<Visit>, NrcError> {
    let mut visits = Vec::new();
    for date in followup_dates(discharged_on, cfg) {
        let visit = Visit::scheduled(
            &patient.id,
            patient.registered_by.clone(),
            date,
            VisitKind::FollowUp,
        );
        insert(db, &visit).await?;
        visits.push(visit);
    }
    if let (Some(worker), Some(first)) = (&patient.registered_by, visits.first()) {
        let msg = format!(
            "{} was discharged; {} follow-up visits scheduled from {}",
            patient.name,
            visits.len(),
            first.scheduled_date
        );
        let n = Notification::new(NotificationKind::VisitScheduled, msg)
            .for_user(worker)
            .about(&patient.id);
        notify(db, n).await?;
    }
    Ok(visits)
}

pub async fn update<S: TableStore>(
    db: &mut S,
    id: &str,
    input: VisitPatch,
) -> Result<Visit, NrcError> {
    let current: Visit = fetch(db, "visit", id).await?;
    let mut visit = current.clone();

    if let Some(worker) = input.worker_id {
        let worker = clean(Some(worker));
        if let Some(w) = &worker {
            ensure_exists(db, Table::Users, "user", w).await?;
        }
        visit.worker_id = worker;
    }
    if let Some(date) = input.scheduled_date {
        visit.scheduled_date = date;
    }
    if let Some(notes) = input.notes {
        visit.notes = clean(Some(notes));
    }
    if let Some(status) = input.status {
        visit.status = status;
        visit.completed_at = match status {
            VisitStatus::Completed if current.status != VisitStatus::Completed => Some(now()),
            VisitStatus::Completed => current.completed_at,
            _ => None,
        };
    }

    patch(db, "visit", id, visit.to_row()?).await
}

/// Sorted by scheduled date.
pub async fn list<S: TableStore>(db: &S, query: VisitQuery) -> Result<Vec<Visit>, NrcError> {
    let mut filters = Vec::new();
    if let Some(p) = query.patient_id {
        filters.push(filter("patient_id", p));
    }
    if let Some(w) = query.worker_id {
        filters.push(filter("worker_id", w));
    }
    if let Some(s) = query.status {
        filters.push(filter("status", s.as_str()));
    }
    let mut visits: Vec<Visit> = fetch_all(db, &filters).await?;
    visits.sort_by_key(|v| v.scheduled_date);
    Ok(visits)
}

pub async fn get<S: TableStore>(db: &S, id: &str) -> Result<Visit, NrcError> {
    fetch(db, "visit", id).await
}

pub async fn delete<S: TableStore>(db: &mut S, id: &str) -> Result<(), NrcError> {
    remove(db, Table::Visits, "visit", id).await
}
