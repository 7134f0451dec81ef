use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{beds, fetch_all, notifications};
use crate::error::NrcError;
use crate::store::TableStore;
use crate::types::bed::BedSummary;
use crate::types::notification::NotificationQuery;
use crate::types::{Patient, Role, Visit, now};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DashboardQuery {
    /// Scope the unread count to what this reader sees.
    pub user_id: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Dashboard {
    pub total_patients: usize,
    pub by_nutrition_status: BTreeMap<String, usize>,
    pub by_admission_status: BTreeMap<String, usize>,
    pub beds: BedSummary,
    pub unread_notifications: usize,
    /// Scheduled visits due today or earlier.
    pub visits_due: usize,
}

pub async fn build<S: TableStore>(db: &S, query: DashboardQuery) -> Result<Dashboard, NrcError> {
    let patients: Vec<Patient> = fetch_all(db, &[]).await?;
    let mut by_nutrition_status = BTreeMap::new();
    let mut by_admission_status = BTreeMap::new();
    for p in &patients {
        *by_nutrition_status
            .entry(p.nutrition_status.to_string())
            .or_insert(0) += 1;
        *by_admission_status
            .entry(p.admission_status.to_string())
            .or_insert(0) += 1;
    }

    let unread = notifications::list(
        db,
        NotificationQuery {
            user_id: query.user_id,
            role: query.role,
            unread_only: true,
        },
    )
    .await?;

    let today = now().date_naive();
    let visits: Vec<Visit> = fetch_all(db, &[]).await?;

    Ok(Dashboard {
        total_patients: patients.len(),
        by_nutrition_status,
        by_admission_status,
        beds: beds::summary(db).await?,
        unread_notifications: unread.len(),
        visits_due: visits.iter().filter(|v| v.is_due(today)).count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{patients, testutil, visits};
    use crate::types::patient::NewPatient;
    use crate::types::visit::NewVisit;
    use crate::types::VisitKind;
    use chrono::Days;

    #[tokio::test]
    async fn counts_everything() {
        let (_dir, mut db) = testutil::store().await;
        beds::seed(&mut db, 2).await.unwrap();
        let sam = patients::create(
            &mut db,
            NewPatient {
                name: "A".into(),
                muac_cm: Some(11.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        patients::create(
            &mut db,
            NewPatient {
                name: "B".into(),
                muac_cm: Some(13.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let today = now().date_naive();
        for date in [today - Days::new(1), today + Days::new(5)] {
            visits::schedule(
                &mut db,
                NewVisit {
                    patient_id: sam.id.clone(),
                    worker_id: None,
                    scheduled_date: date,
                    kind: VisitKind::HomeVisit,
                    notes: None,
                },
            )
            .await
            .unwrap();
        }

        let d = build(&db, DashboardQuery::default()).await.unwrap();
        assert_eq!(d.total_patients, 2);
        assert_eq!(d.by_nutrition_status["sam"], 1);
        assert_eq!(d.by_nutrition_status["normal"], 1);
        assert_eq!(d.by_admission_status["registered"], 2);
        assert_eq!(d.beds.overall.available, 2);
        assert_eq!(d.unread_notifications, 2);
        assert_eq!(d.visits_due, 1);

        let staff = build(
            &db,
            DashboardQuery {
                user_id: None,
                role: Some(Role::HospitalStaff),
            },
        )
        .await
        .unwrap();
        assert_eq!(staff.unread_notifications, 1);
    }
}
