use serde::Serialize;
use tracing::{info, warn};

use super::notifications::notify;
use super::patients::occupant;
use super::{fetch, fetch_all, insert, patch, remove, treatments, visits};
use crate::config::FollowupConfig;
use crate::error::NrcError;
use crate::store::{Row, Table, TableStore, filter};
use crate::types::bed::{BedQuery, BedSummary, NewBed, ReleaseBedRequest};
use crate::types::{
    AdmissionStatus, Bed, BedStatus, Notification, NotificationKind, Patient, Visit, new_id, now,
    required,
};

#[derive(Debug, Clone, Serialize)]
pub struct Release {
    pub bed: Bed,
    pub patient: Option<Patient>,
    /// Follow-up visits scheduled on discharge.
    pub followups: Vec<Visit>,
}

pub async fn create<S: TableStore>(db: &mut S, input: NewBed) -> Result<Bed, NrcError> {
    let ward = required("ward", &input.ward)?;
    let bed_number = required("bed_number", &input.bed_number)?;
    let taken = db
        .find_one(
            Table::Beds,
            &[filter("ward", &*ward), filter("bed_number", &*bed_number)],
        )
        .await?;
    if taken.is_some() {
        return Err(NrcError::conflict(format!(
            "bed {bed_number} already exists in ward {ward}"
        )));
    }
    let bed = Bed {
        id: new_id(),
        ward,
        bed_number,
        status: BedStatus::Available,
        patient_id: None,
        assigned_at: None,
        created_at: now(),
    };
    insert(db, &bed).await?;
    Ok(bed)
}

/// Create `count` beds in ward `general` when there are no beds at all.
pub async fn seed<S: TableStore>(db: &mut S, count: u32) -> Result<usize, NrcError> {
    if !db.read_all(Table::Beds).await?.is_empty() {
        return Ok(0);
    }
    for n in 1..=count {
        let bed = NewBed {
            ward: "general".to_string(),
            bed_number: n.to_string(),
        };
        create(db, bed).await?;
    }
    if count > 0 {
        info!(count, "seeded beds");
    }
    Ok(count as usize)
}

pub async fn get<S: TableStore>(db: &S, id: &str) -> Result<Bed, NrcError> {
    fetch(db, "bed", id).await
}

pub async fn list<S: TableStore>(db: &S, query: BedQuery) -> Result<Vec<Bed>, NrcError> {
    let mut filters = Vec::new();
    if let Some(ward) = query.ward {
        filters.push(filter("ward", ward));
    }
    if let Some(status) = query.status {
        filters.push(filter("status", status.as_str()));
    }
    fetch_all(db, &filters).await
}

pub async fn summary<S: TableStore>(db: &S) -> Result<BedSummary, NrcError> {
    let beds: Vec<Bed> = fetch_all(db, &[]).await?;
    Ok(BedSummary::from_beds(&beds))
}

/// Admit `patient_id` to `bed_id`.
///
/// Bed and patient are written together, an active treatment tracker is
/// opened when missing and the registering user is told.
pub async fn assign<S: TableStore>(
    db: &mut S,
    bed_id: &str,
    patient_id: &str,
) -> Result<Bed, NrcError> {
    let bed: Bed = fetch(db, "bed", bed_id).await?;
    if bed.status != BedStatus::Available {
        return Err(NrcError::conflict(format!("bed {} is {}", bed.id, bed.status)));
    }
    let patient: Patient = fetch(db, "patient", patient_id).await?;
    if let Some(held) = &patient.bed_id {
        return Err(NrcError::conflict(format!(
            "patient {} already holds bed {held}",
            patient.id
        )));
    }

    let at = now();
    let bed: Bed = patch(
        db,
        "bed",
        bed_id,
        Row::new()
            .with("status", BedStatus::Occupied.as_str())
            .with("patient_id", &patient.id)
            .with("assigned_at", at.to_rfc3339()),
    )
    .await?;
    let patient: Patient = patch(
        db,
        "patient",
        patient_id,
        Row::new()
            .with("bed_id", &bed.id)
            .with("admission_status", AdmissionStatus::Admitted.as_str())
            .with("updated_at", at.to_rfc3339()),
    )
    .await?;

    treatments::open_if_missing(db, &patient, at.date_naive()).await?;

    if let Some(user) = &patient.registered_by {
        let msg = format!(
            "{} admitted to bed {} in ward {}",
            patient.name, bed.bed_number, bed.ward
        );
        let n = Notification::new(NotificationKind::Admission, msg)
            .for_user(user)
            .about(&patient.id);
        notify(db, n).await?;
    }
    info!(bed_id = %bed.id, patient_id = %patient.id, "bed assigned");
    Ok(bed)
}

/// Free an occupied bed. With `discharge` the patient leaves the programme
/// for follow-up; otherwise they go back to `registered`.
pub async fn release<S: TableStore>(
    db: &mut S,
    bed_id: &str,
    req: ReleaseBedRequest,
    followup: FollowupConfig,
) -> Result<Release, NrcError> {
    let bed: Bed = fetch(db, "bed", bed_id).await?;
    if bed.status != BedStatus::Occupied {
        return Err(NrcError::conflict(format!("bed {} is not occupied", bed.id)));
    }
    let holder = occupant(db, &bed).await?;

    let at = now();
    let bed: Bed = patch(
        db,
        "bed",
        bed_id,
        Row::new()
            .with("status", BedStatus::Available.as_str())
            .with("patient_id", "")
            .with("assigned_at", ""),
    )
    .await?;

    let Some(holder) = holder else {
        warn!(bed_id = %bed.id, "occupied bed had no patient on record");
        return Ok(Release {
            bed,
            patient: None,
            followups: Vec::new(),
        });
    };

    let status = if req.discharge {
        AdmissionStatus::Discharged
    } else {
        AdmissionStatus::Registered
    };
    let patient: Patient = patch(
        db,
        "patient",
        &holder.id,
        Row::new()
            .with("bed_id", "")
            .with("admission_status", status.as_str())
            .with("updated_at", at.to_rfc3339()),
    )
    .await?;

    let mut followups = Vec::new();
    if req.discharge {
        let today = at.date_naive();
        treatments::complete_active(db, &patient.id, today, req.discharge_weight_kg).await?;
        followups = visits::schedule_followups(db, &patient, today, followup).await?;
        if let Some(user) = &patient.registered_by {
            let msg = format!("{} discharged from bed {}", patient.name, bed.bed_number);
            let n = Notification::new(NotificationKind::Discharge, msg)
                .for_user(user)
                .about(&patient.id);
            notify(db, n).await?;
        }
    }
    info!(
        bed_id = %bed.id,
        patient_id = %patient.id,
        discharged = req.discharge,
        "bed released"
    );
    Ok(Release {
        bed,
        patient: Some(patient),
        followups,
    })
}

pub async fn set_maintenance<S: TableStore>(
    db: &mut S,
    id: &str,
    on: bool,
) -> Result<Bed, NrcError> {
    let bed: Bed = fetch(db, "bed", id).await?;
    if bed.status == BedStatus::Occupied {
        return Err(NrcError::conflict(format!("bed {id} is occupied")));
    }
    let status = if on {
        BedStatus::Maintenance
    } else {
        BedStatus::Available
    };
    patch(db, "bed", id, Row::new().with("status", status.as_str())).await
}

pub async fn delete<S: TableStore>(db: &mut S, id: &str) -> Result<(), NrcError> {
    let bed: Bed = fetch(db, "bed", id).await?;
    if bed.status == BedStatus::Occupied {
        return Err(NrcError::conflict(format!("bed {id} is occupied")));
    }
    remove(db, Table::Beds, "bed", id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{patients, testutil};
    use crate::types::patient::NewPatient;
    use crate::types::{TrackerStatus, TreatmentTracker, VisitKind};

    async fn bed<S: TableStore>(db: &mut S, number: &str) -> Bed {
        create(
            db,
            NewBed {
                ward: "general".into(),
                bed_number: number.into(),
            },
        )
        .await
        .unwrap()
    }

    async fn child<S: TableStore>(db: &mut S, name: &str) -> Patient {
        patients::create(
            db,
            NewPatient {
                name: name.into(),
                muac_cm: Some(11.0),
                weight_kg: Some(6.0),
                registered_by: Some("worker-1".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    fn notes_of(rows: &[Row], kind: NotificationKind) -> usize {
        rows.iter().filter(|r| r.get("kind") == kind.as_str()).count()
    }

    #[tokio::test]
    async fn bed_numbers_are_unique_per_ward() {
        let (_dir, mut db) = testutil::store().await;
        bed(&mut db, "1").await;
        let dup = create(
            &mut db,
            NewBed {
                ward: "general".into(),
                bed_number: "1".into(),
            },
        )
        .await;
        assert!(matches!(dup, Err(NrcError::Conflict(_))));
        create(
            &mut db,
            NewBed {
                ward: "icu".into(),
                bed_number: "1".into(),
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn assign_updates_bed_patient_and_tracker() {
        let (_dir, mut db) = testutil::store().await;
        let b = bed(&mut db, "1").await;
        let p = child(&mut db, "Ravi").await;

        let assigned = assign(&mut db, &b.id, &p.id).await.unwrap();
        assert_eq!(assigned.status, BedStatus::Occupied);
        assert_eq!(assigned.patient_id.as_deref(), Some(p.id.as_str()));
        assert!(assigned.assigned_at.is_some());

        let p = patients::get(&db, &p.id).await.unwrap();
        assert_eq!(p.admission_status, AdmissionStatus::Admitted);
        assert_eq!(p.bed_id.as_deref(), Some(b.id.as_str()));

        let trackers: Vec<TreatmentTracker> = fetch_all(&db, &[]).await.unwrap();
        assert_eq!(trackers.len(), 1);
        assert_eq!(trackers[0].target_weight_kg, Some(6.9));

        let rows = db.read_all(Table::Notifications).await.unwrap();
        assert_eq!(notes_of(&rows, NotificationKind::Admission), 1);
    }

    #[tokio::test]
    async fn assign_rejects_busy_bed_and_bedded_patient() {
        let (_dir, mut db) = testutil::store().await;
        let b1 = bed(&mut db, "1").await;
        let b2 = bed(&mut db, "2").await;
        let p = child(&mut db, "Ravi").await;
        let q = child(&mut db, "Meera").await;
        assign(&mut db, &b1.id, &p.id).await.unwrap();

        let busy = assign(&mut db, &b1.id, &q.id).await;
        assert!(matches!(busy, Err(NrcError::Conflict(_))));
        let twice = assign(&mut db, &b2.id, &p.id).await;
        assert!(matches!(twice, Err(NrcError::Conflict(_))));
        let missing = assign(&mut db, &b2.id, "ghost").await;
        assert!(matches!(missing, Err(NrcError::NotFound { .. })));

        // failed attempts leave the second bed untouched
        assert_eq!(get(&db, &b2.id).await.unwrap().status, BedStatus::Available);
    }

    #[tokio::test]
    async fn discharge_completes_tracker_and_books_followups() {
        let (_dir, mut db) = testutil::store().await;
        let b = bed(&mut db, "1").await;
        let p = child(&mut db, "Ravi").await;
        assign(&mut db, &b.id, &p.id).await.unwrap();

        let req = ReleaseBedRequest {
            discharge: true,
            discharge_weight_kg: Some(7.0),
        };
        let out = release(&mut db, &b.id, req, FollowupConfig::default())
            .await
            .unwrap();
        assert_eq!(out.bed.status, BedStatus::Available);
        assert_eq!(out.bed.patient_id, None);
        let patient = out.patient.unwrap();
        assert_eq!(patient.admission_status, AdmissionStatus::Discharged);
        assert_eq!(patient.bed_id, None);

        assert_eq!(out.followups.len(), 4);
        assert!(out.followups.iter().all(|v| v.kind == VisitKind::FollowUp
            && v.worker_id.as_deref() == Some("worker-1")));

        let t = treatments::for_patient(&db, &patient.id).await.unwrap();
        assert_eq!(t.status, TrackerStatus::Completed);
        assert_eq!(t.discharge_weight_kg, Some(7.0));
        assert!(t.progress().target_reached);

        let rows = db.read_all(Table::Notifications).await.unwrap();
        assert_eq!(notes_of(&rows, NotificationKind::Discharge), 1);

        let again = release(&mut db, &b.id, ReleaseBedRequest::default(), FollowupConfig::default()).await;
        assert!(matches!(again, Err(NrcError::Conflict(_))));
    }

    #[tokio::test]
    async fn plain_release_returns_patient_to_registered() {
        let (_dir, mut db) = testutil::store().await;
        let b = bed(&mut db, "1").await;
        let p = child(&mut db, "Ravi").await;
        assign(&mut db, &b.id, &p.id).await.unwrap();

        let out = release(&mut db, &b.id, ReleaseBedRequest::default(), FollowupConfig::default())
            .await
            .unwrap();
        let patient = out.patient.unwrap();
        assert_eq!(patient.admission_status, AdmissionStatus::Registered);
        assert!(out.followups.is_empty());
        let t = treatments::for_patient(&db, &patient.id).await.unwrap();
        assert_eq!(t.status, TrackerStatus::Active);
    }

    #[tokio::test]
    async fn maintenance_and_delete_refuse_occupied_beds() {
        let (_dir, mut db) = testutil::store().await;
        let b = bed(&mut db, "1").await;
        let p = child(&mut db, "Ravi").await;

        let m = set_maintenance(&mut db, &b.id, true).await.unwrap();
        assert_eq!(m.status, BedStatus::Maintenance);
        assert!(matches!(
            assign(&mut db, &b.id, &p.id).await,
            Err(NrcError::Conflict(_))
        ));
        set_maintenance(&mut db, &b.id, false).await.unwrap();

        assign(&mut db, &b.id, &p.id).await.unwrap();
        assert!(matches!(
            set_maintenance(&mut db, &b.id, true).await,
            Err(NrcError::Conflict(_))
        ));
        assert!(matches!(delete(&mut db, &b.id).await, Err(NrcError::Conflict(_))));
    }

    #[tokio::test]
    async fn seed_only_fills_an_empty_table() {
        let (_dir, mut db) = testutil::store().await;
        assert_eq!(seed(&mut db, 3).await.unwrap(), 3);
        assert_eq!(seed(&mut db, 3).await.unwrap(), 0);
        let s = summary(&db).await.unwrap();
        assert_eq!(s.overall.total, 3);
        assert_eq!(s.wards["general"].available, 3);
        let general = list(
            &db,
            BedQuery {
                ward: Some("general".into()),
                status: None,
            },
        )
        .await
        .unwrap();
        let numbers: Vec<_> = general.iter().map(|b| b.bed_number.as_str()).collect();
        assert_eq!(numbers, vec!["1", "2", "3"]);
    }
}
