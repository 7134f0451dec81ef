use tracing::{info, warn};

use super::classifier::classify;
use super::notifications::notify;
use super::{ensure_exists, fetch, fetch_all, insert, patch, remove};
use crate::error::NrcError;
use crate::store::{Row, Table, TableStore, filter};
use crate::types::patient::{NewPatient, PatientPatch, PatientQuery, check_age};
use crate::types::{
    AdmissionStatus, Bed, BedStatus, Notification, NotificationKind, NutritionStatus, Patient,
    Role, clean, new_id, now, required,
};

/// Roles alerted when a child is graded SAM.
const SAM_ALERT_ROLES: [Role; 2] = [Role::HospitalStaff, Role::Supervisor];

fn check_measurements(weight: Option<f64>, height: Option<f64>, muac: Option<f64>) -> Result<(), NrcError> {
    for (name, value) in [("weight_kg", weight), ("height_cm", height), ("muac_cm", muac)] {
        if let Some(v) = value
            && !(v.is_finite() && v > 0.0)
        {
            return Err(NrcError::validation(format!("{name} must be a positive number")));
        }
    }
    Ok(())
}

async fn alert_sam<S: TableStore>(db: &mut S, patient: &Patient) -> Result<(), NrcError> {
    let message = format!(
        "{} has been identified with severe acute malnutrition{}",
        patient.name,
        patient
            .muac_cm
            .map(|m| format!(" (MUAC {m} cm)"))
            .unwrap_or_default()
    );
    for role in SAM_ALERT_ROLES {
        let n = Notification::new(NotificationKind::SamAlert, message.clone())
            .for_role(role)
            .about(&patient.id);
        notify(db, n).await?;
    }
    Ok(())
}

pub async fn create<S: TableStore>(db: &mut S, input: NewPatient) -> Result<Patient, NrcError> {
    let name = required("name", &input.name)?;
    check_age(input.age_months)?;
    check_measurements(input.weight_kg, input.height_cm, input.muac_cm)?;

    let anganwadi_id = clean(input.anganwadi_id);
    if let Some(center) = &anganwadi_id {
        ensure_exists(db, Table::AnganwadiCenters, "anganwadi center", center).await?;
    }

    let edema = input.edema.unwrap_or(false);
    let nutrition_status = input
        .nutrition_status
        .unwrap_or_else(|| classify(input.muac_cm, edema));
    let created = now();

    let patient = Patient {
        id: new_id(),
        name,
        age_months: input.age_months,
        gender: clean(input.gender),
        guardian_name: clean(input.guardian_name),
        phone: clean(input.phone),
        address: clean(input.address),
        anganwadi_id,
        registered_by: clean(input.registered_by),
        weight_kg: input.weight_kg,
        height_cm: input.height_cm,
        muac_cm: input.muac_cm,
        edema,
        nutrition_status,
        symptoms: input
            .symptoms
            .into_iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        admission_status: AdmissionStatus::Registered,
        bed_id: None,
        created_at: created,
        updated_at: created,
    };
    insert(db, &patient).await?;

    if patient.nutrition_status == NutritionStatus::Sam {
        alert_sam(db, &patient).await?;
    }
    info!(
        patient_id = %patient.id,
        status = %patient.nutrition_status,
        "patient registered"
    );
    Ok(patient)
}

pub async fn update<S: TableStore>(
    db: &mut S,
    id: &str,
    input: PatientPatch,
) -> Result<Patient, NrcError> {
    let current: Patient = fetch(db, "patient", id).await?;
    check_age(input.age_months)?;
    check_measurements(input.weight_kg, input.height_cm, input.muac_cm)?;
    if let Some(name) = &input.name {
        required("name", name)?;
    }
    if let Some(center) = input.anganwadi_id.as_deref().filter(|c| !c.trim().is_empty()) {
        ensure_exists(db, Table::AnganwadiCenters, "anganwadi center", center).await?;
    }

    let mut cells = input.to_row()?;
    if input.nutrition_status.is_none() && input.touches_anthropometry() {
        let muac = input.muac_cm.or(current.muac_cm);
        let edema = input.edema.unwrap_or(current.edema);
        cells.set("nutrition_status", classify(muac, edema).as_str());
    }
    cells.set("updated_at", now().to_rfc3339());

    let updated: Patient = patch(db, "patient", id, cells).await?;
    if updated.nutrition_status == NutritionStatus::Sam
        && current.nutrition_status != NutritionStatus::Sam
    {
        alert_sam(db, &updated).await?;
    }
    Ok(updated)
}

/// Delete a patient, freeing their bed and dropping their visits and trackers.
pub async fn delete<S: TableStore>(db: &mut S, id: &str) -> Result<(), NrcError> {
    let patient: Patient = fetch(db, "patient", id).await?;

    if let Some(bed_id) = &patient.bed_id {
        let freed = db
            .update_by_id(
                Table::Beds,
                bed_id,
                Row::new()
                    .with("status", BedStatus::Available.as_str())
                    .with("patient_id", "")
                    .with("assigned_at", ""),
            )
            .await?;
        if freed.is_none() {
            warn!(patient_id = %id, bed_id = %bed_id, "patient referenced a missing bed");
        }
    }

    for table in [Table::Visits, Table::TreatmentTrackers] {
        for row in db.find(table, &[filter("patient_id", id)]).await? {
            db.delete_by_id(table, row.id()).await?;
        }
    }
    remove(db, Table::Patients, "patient", id).await?;
    info!(patient_id = %id, "patient deleted");
    Ok(())
}

pub async fn get<S: TableStore>(db: &S, id: &str) -> Result<Patient, NrcError> {
    fetch(db, "patient", id).await
}

pub async fn list<S: TableStore>(db: &S, query: PatientQuery) -> Result<Vec<Patient>, NrcError> {
    let mut filters = Vec::new();
    if let Some(center) = query.anganwadi_id {
        filters.push(filter("anganwadi_id", center));
    }
    if let Some(status) = query.nutrition_status {
        filters.push(filter("nutrition_status", status.as_str()));
    }
    if let Some(status) = query.admission_status {
        filters.push(filter("admission_status", status.as_str()));
    }
    fetch_all(db, &filters).await
}

/// Patient currently holding `bed`, if the bed row still points at one.
pub(crate) async fn occupant<S: TableStore>(db: &S, bed: &Bed) -> Result<Option<Patient>, NrcError> {
    let Some(patient_id) = &bed.patient_id else {
        return Ok(None);
    };
    match fetch(db, "patient", patient_id).await {
        Ok(p) => Ok(Some(p)),
        Err(NrcError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{beds, notifications, testutil, visits};
    use crate::types::VisitKind;
    use crate::types::bed::NewBed;
    use crate::types::notification::NotificationQuery;
    use crate::types::visit::NewVisit;

    fn child(name: &str, muac: f64) -> NewPatient {
        NewPatient {
            name: name.into(),
            age_months: Some(20),
            muac_cm: Some(muac),
            weight_kg: Some(7.5),
            registered_by: Some("u1".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn sam_registration_fans_out_to_two_roles() {
        let (_dir, mut db) = testutil::store().await;
        let p = create(&mut db, child("Ravi", 11.0)).await.unwrap();
        assert_eq!(p.nutrition_status, NutritionStatus::Sam);
        assert_eq!(p.admission_status, AdmissionStatus::Registered);

        let all = db.read_all(Table::Notifications).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.iter().all(|n| n.get("patient_id") == p.id));

        let staff = notifications::list(
            &db,
            NotificationQuery {
                role: Some(Role::HospitalStaff),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0].kind, NotificationKind::SamAlert);
    }

    #[tokio::test]
    async fn normal_registration_is_silent() {
        let (_dir, mut db) = testutil::store().await;
        let p = create(&mut db, child("Meera", 13.2)).await.unwrap();
        assert_eq!(p.nutrition_status, NutritionStatus::Normal);
        assert!(db.read_all(Table::Notifications).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn validation_errors() {
        let (_dir, mut db) = testutil::store().await;
        let mut bad = child(" ", 12.0);
        assert!(matches!(
            create(&mut db, bad.clone()).await,
            Err(NrcError::Validation(_))
        ));
        bad.name = "X".into();
        bad.age_months = Some(72);
        assert!(matches!(create(&mut db, bad.clone()).await, Err(NrcError::Validation(_))));
        bad.age_months = None;
        bad.anganwadi_id = Some("nowhere".into());
        assert!(matches!(create(&mut db, bad).await, Err(NrcError::NotFound { .. })));
    }

    #[tokio::test]
    async fn muac_update_reclassifies_and_alerts() {
        let (_dir, mut db) = testutil::store().await;
        let p = create(&mut db, child("Gopal", 12.0)).await.unwrap();
        assert_eq!(p.nutrition_status, NutritionStatus::Mam);

        let patch_in = PatientPatch {
            muac_cm: Some(11.2),
            ..Default::default()
        };
        let updated = update(&mut db, &p.id, patch_in).await.unwrap();
        assert_eq!(updated.nutrition_status, NutritionStatus::Sam);
        assert_eq!(updated.name, "Gopal");
        assert!(updated.updated_at >= p.updated_at);
        assert_eq!(db.read_all(Table::Notifications).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn delete_frees_the_bed_and_drops_visits() {
        let (_dir, mut db) = testutil::store().await;
        let p = create(&mut db, child("Ravi", 13.0)).await.unwrap();
        let other = create(&mut db, child("Meena", 13.0)).await.unwrap();
        for patient_id in [&p.id, &p.id, &other.id] {
            visits::schedule(
                &mut db,
                NewVisit {
                    patient_id: patient_id.clone(),
                    worker_id: None,
                    scheduled_date: chrono::NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
                    kind: VisitKind::HomeVisit,
                    notes: None,
                },
            )
            .await
            .unwrap();
        }
        let bed = beds::create(
            &mut db,
            NewBed {
                ward: "general".into(),
                bed_number: "1".into(),
            },
        )
        .await
        .unwrap();
        beds::assign(&mut db, &bed.id, &p.id).await.unwrap();

        delete(&mut db, &p.id).await.unwrap();
        let bed = beds::get(&db, &bed.id).await.unwrap();
        assert_eq!(bed.status, BedStatus::Available);
        assert_eq!(bed.patient_id, None);
        assert!(db.read_all(Table::TreatmentTrackers).await.unwrap().is_empty());
        assert!(matches!(get(&db, &p.id).await, Err(NrcError::NotFound { .. })));

        let left = db.read_all(Table::Visits).await.unwrap();
        assert_eq!(left.len(), 1);
        assert_eq!(left[0].get("patient_id"), other.id);
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let (_dir, mut db) = testutil::store().await;
        create(&mut db, child("A", 11.0)).await.unwrap();
        create(&mut db, child("B", 13.0)).await.unwrap();
        let sam = list(
            &db,
            PatientQuery {
                nutrition_status: Some(NutritionStatus::Sam),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(sam.len(), 1);
        assert_eq!(sam[0].name, "A");
    }
}
