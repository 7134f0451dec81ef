//! Business rules over the table store.
//!
//! Every operation takes the backend directly so a handler can run it inside
//! one `StoreHandle::atomic` job; multi-table rules then see and write a
//! consistent state.

pub mod anganwadi;
pub mod beds;
pub mod classifier;
pub mod dashboard;
pub mod notifications;
pub mod patients;
pub mod throttle;
pub mod treatments;
pub mod users;
pub mod visits;
pub mod workers;

use crate::error::NrcError;
use crate::store::{Filter, Record, Row, Table, TableStore, filter};

pub(crate) async fn fetch<R, S>(db: &S, entity: &'static str, id: &str) -> Result<R, NrcError>
where
    R: Record,
    S: TableStore,
{
    let row = db
        .get(R::TABLE, id)
        .await?
        .ok_or_else(|| NrcError::not_found(entity, id))?;
    R::from_row(&row)
}

pub(crate) async fn fetch_all<R, S>(db: &S, filters: &[Filter]) -> Result<Vec<R>, NrcError>
where
    R: Record,
    S: TableStore,
{
    db.find(R::TABLE, filters)
        .await?
        .iter()
        .map(R::from_row)
        .collect()
}

pub(crate) async fn insert<R, S>(db: &mut S, record: &R) -> Result<(), NrcError>
where
    R: Record,
    S: TableStore,
{
    db.append(R::TABLE, record.to_row()?).await?;
    Ok(())
}

pub(crate) async fn patch<R, S>(
    db: &mut S,
    entity: &'static str,
    id: &str,
    cells: Row,
) -> Result<R, NrcError>
where
    R: Record,
    S: TableStore,
{
    let row = db
        .update_by_id(R::TABLE, id, cells)
        .await?
        .ok_or_else(|| NrcError::not_found(entity, id))?;
    R::from_row(&row)
}

pub(crate) async fn remove<S: TableStore>(
    db: &mut S,
    table: Table,
    entity: &'static str,
    id: &str,
) -> Result<(), NrcError> {
    if db.delete_by_id(table, id).await? {
        Ok(())
    } else {
        Err(NrcError::not_found(entity, id))
    }
}

pub(crate) async fn ensure_exists<S: TableStore>(
    db: &S,
    table: Table,
    entity: &'static str,
    id: &str,
) -> Result<(), NrcError> {
    match db.get(table, id).await? {
        Some(_) => Ok(()),
        None => Err(NrcError::not_found(entity, id)),
    }
}

/// Fail with a conflict when any row already has `column == value`,
/// ignoring the row `except_id`.
pub(crate) async fn ensure_unique<S: TableStore>(
    db: &S,
    table: Table,
    column: &str,
    value: &str,
    except_id: Option<&str>,
) -> Result<(), NrcError> {
    let taken = db
        .find(table, &[filter(column, value)])
        .await?
        .iter()
        .any(|r| Some(r.id()) != except_id);
    if taken {
        return Err(NrcError::conflict(format!("{column} `{value}` already exists")));
    }
    Ok(())
}
