use tracing::info;

use super::{ensure_exists, ensure_unique, fetch, fetch_all, insert, patch, remove};
use crate::error::NrcError;
use crate::store::{Table, TableStore, filter};
use crate::types::anganwadi::{CenterPatch, NewCenter};
use crate::types::{AnganwadiCenter, clean, new_id, now, required};

pub async fn create<S: TableStore>(
    db: &mut S,
    input: NewCenter,
) -> Result<AnganwadiCenter, NrcError> {
    let name = required("name", &input.name)?;
    let code = required("code", &input.code)?;
    ensure_unique(db, Table::AnganwadiCenters, "code", &code, None).await?;

    let supervisor_id = clean(input.supervisor_id);
    if let Some(sup) = &supervisor_id {
        ensure_exists(db, Table::Users, "user", sup).await?;
    }
    let center = AnganwadiCenter {
        id: new_id(),
        name,
        code,
        district: clean(input.district),
        block: clean(input.block),
        village: clean(input.village),
        supervisor_id,
        created_at: now(),
    };
    insert(db, &center).await?;
    info!(center_id = %center.id, code = %center.code, "anganwadi center created");
    Ok(center)
}

pub async fn update<S: TableStore>(
    db: &mut S,
    id: &str,
    input: CenterPatch,
) -> Result<AnganwadiCenter, NrcError> {
    let _: AnganwadiCenter = fetch(db, "anganwadi center", id).await?;
    if let Some(name) = &input.name {
        required("name", name)?;
    }
    if let Some(code) = &input.code {
        let code = required("code", code)?;
        ensure_unique(db, Table::AnganwadiCenters, "code", &code, Some(id)).await?;
    }
    if let Some(sup) = input.supervisor_id.as_deref().filter(|s| !s.trim().is_empty()) {
        ensure_exists(db, Table::Users, "user", sup).await?;
    }
    patch(db, "anganwadi center", id, input.to_row()).await
}

pub async fn get<S: TableStore>(db: &S, id: &str) -> Result<AnganwadiCenter, NrcError> {
    fetch(db, "anganwadi center", id).await
}

pub async fn list<S: TableStore>(db: &S) -> Result<Vec<AnganwadiCenter>, NrcError> {
    fetch_all(db, &[]).await
}

/// Centers still referenced by patients or workers cannot be removed.
pub async fn delete<S: TableStore>(db: &mut S, id: &str) -> Result<(), NrcError> {
    let _: AnganwadiCenter = fetch(db, "anganwadi center", id).await?;
    for (table, column, what) in [
        (Table::Patients, "anganwadi_id", "patients"),
        (Table::Workers, "center_id", "workers"),
    ] {
        if db.find_one(table, &[filter(column, id)]).await?.is_some() {
            return Err(NrcError::conflict(format!(
                "anganwadi center {id} still has {what}"
            )));
        }
    }
    remove(db, Table::AnganwadiCenters, "anganwadi center", id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{patients, testutil};
    use crate::types::patient::NewPatient;

    fn center(code: &str) -> NewCenter {
        NewCenter {
            name: "Rampur AWC".into(),
            code: code.into(),
            district: Some("Sehore".into()),
            block: None,
            village: Some(" ".into()),
            supervisor_id: None,
        }
    }

    #[tokio::test]
    async fn codes_are_unique() {
        let (_dir, mut db) = testutil::store().await;
        let a = create(&mut db, center("AWC-1")).await.unwrap();
        assert_eq!(a.village, None);
        let b = create(&mut db, center("AWC-2")).await.unwrap();

        assert!(matches!(
            create(&mut db, center("AWC-1")).await,
            Err(NrcError::Conflict(_))
        ));
        let clash = CenterPatch {
            code: Some("AWC-1".into()),
            ..Default::default()
        };
        assert!(matches!(
            update(&mut db, &b.id, clash).await,
            Err(NrcError::Conflict(_))
        ));
        let same = CenterPatch {
            code: Some("AWC-1".into()),
            district: Some("Bhopal".into()),
            ..Default::default()
        };
        let a = update(&mut db, &a.id, same).await.unwrap();
        assert_eq!(a.district.as_deref(), Some("Bhopal"));
    }

    #[tokio::test]
    async fn referenced_center_cannot_be_deleted() {
        let (_dir, mut db) = testutil::store().await;
        let c = create(&mut db, center("AWC-1")).await.unwrap();
        let p = patients::create(
            &mut db,
            NewPatient {
                name: "Ravi".into(),
                anganwadi_id: Some(c.id.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert!(matches!(delete(&mut db, &c.id).await, Err(NrcError::Conflict(_))));
        patients::delete(&mut db, &p.id).await.unwrap();
        delete(&mut db, &c.id).await.unwrap();
        assert!(list(&db).await.unwrap().is_empty());
    }
}
