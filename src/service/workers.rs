use super::{ensure_exists, ensure_unique, fetch, fetch_all, insert, patch, remove};
use crate::error::NrcError;
use crate::store::{Table, TableStore, filter};
use crate::types::worker::{NewWorker, WorkerPatch, WorkerQuery};
use crate::types::{Worker, clean, new_id, now, required};

pub async fn create<S: TableStore>(db: &mut S, input: NewWorker) -> Result<Worker, NrcError> {
    let name = required("name", &input.name)?;
    let employee_id = required("employee_id", &input.employee_id)?;
    ensure_unique(db, Table::Workers, "employee_id", &employee_id, None).await?;

    let center_id = clean(input.center_id);
    if let Some(center) = &center_id {
        ensure_exists(db, Table::AnganwadiCenters, "anganwadi center", center).await?;
    }
    let worker = Worker {
        id: new_id(),
        name,
        employee_id,
        phone: clean(input.phone),
        center_id,
        created_at: now(),
    };
    insert(db, &worker).await?;
    Ok(worker)
}

pub async fn update<S: TableStore>(
    db: &mut S,
    id: &str,
    input: WorkerPatch,
) -> Result<Worker, NrcError> {
    let _: Worker = fetch(db, "worker", id).await?;
    if let Some(name) = &input.name {
        required("name", name)?;
    }
    if let Some(emp) = &input.employee_id {
        let emp = required("employee_id", emp)?;
        ensure_unique(db, Table::Workers, "employee_id", &emp, Some(id)).await?;
    }
    if let Some(center) = input.center_id.as_deref().filter(|c| !c.trim().is_empty()) {
        ensure_exists(db, Table::AnganwadiCenters, "anganwadi center", center).await?;
    }
    patch(db, "worker", id, input.to_row()).await
}

pub async fn get<S: TableStore>(db: &S, id: &str) -> Result<Worker, NrcError> {
    fetch(db, "worker", id).await
}

pub async fn list<S: TableStore>(db: &S, query: WorkerQuery) -> Result<Vec<Worker>, NrcError> {
    let filters = match query.center_id {
        Some(c) => vec![filter("center_id", c)],
        None => Vec::new(),
    };
    fetch_all(db, &filters).await
}

pub async fn delete<S: TableStore>(db: &mut S, id: &str) -> Result<(), NrcError> {
    remove(db, Table::Workers, "worker", id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{anganwadi, testutil};
    use crate::types::anganwadi::NewCenter;

    fn worker(emp: &str, center: Option<&str>) -> NewWorker {
        NewWorker {
            name: "Sunita".into(),
            employee_id: emp.into(),
            phone: None,
            center_id: center.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn employee_ids_unique_and_center_checked() {
        let (_dir, mut db) = testutil::store().await;
        let c = anganwadi::create(
            &mut db,
            NewCenter {
                name: "Rampur".into(),
                code: "AWC-1".into(),
                district: None,
                block: None,
                village: None,
                supervisor_id: None,
            },
        )
        .await
        .unwrap();

        create(&mut db, worker("W1", Some(&c.id))).await.unwrap();
        create(&mut db, worker("W2", None)).await.unwrap();
        assert!(matches!(
            create(&mut db, worker("W1", None)).await,
            Err(NrcError::Conflict(_))
        ));
        assert!(matches!(
            create(&mut db, worker("W3", Some("nowhere"))).await,
            Err(NrcError::NotFound { .. })
        ));

        let at_center = list(
            &db,
            WorkerQuery {
                center_id: Some(c.id.clone()),
            },
        )
        .await
        .unwrap();
        assert_eq!(at_center.len(), 1);
        assert_eq!(at_center[0].employee_id, "W1");
    }

    #[tokio::test]
    async fn update_and_delete() {
        let (_dir, mut db) = testutil::store().await;
        let w = create(&mut db, worker("W1", None)).await.unwrap();
        let w = update(
            &mut db,
            &w.id,
            WorkerPatch {
                phone: Some("9876543210".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(w.phone.as_deref(), Some("9876543210"));
        assert_eq!(w.name, "Sunita");

        delete(&mut db, &w.id).await.unwrap();
        assert!(matches!(get(&db, &w.id).await, Err(NrcError::NotFound { .. })));
    }
}
