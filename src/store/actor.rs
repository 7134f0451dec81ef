use futures::future::BoxFuture;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use std::fmt;
use tokio::sync::oneshot;
use tracing::{debug, info};

use super::backend::Backend;
use super::row::Row;
use super::schema::Table;
use super::traits::{Filter, TableStore, filter};
use crate::error::NrcError;

/// Work that runs with exclusive access to the backend.
pub type StoreJob = Box<dyn for<'a> FnOnce(&'a mut Backend) -> BoxFuture<'a, ()> + Send>;

/// Messages handled by the store actor.
pub enum StoreMessage {
    ReadAll(Table, RpcReplyPort<Result<Vec<Row>, NrcError>>),
    Append(Table, Row, RpcReplyPort<Result<Row, NrcError>>),
    UpdateById(Table, String, Row, RpcReplyPort<Result<Option<Row>, NrcError>>),
    DeleteById(Table, String, RpcReplyPort<Result<bool, NrcError>>),
    Find(Table, Vec<Filter>, RpcReplyPort<Result<Vec<Row>, NrcError>>),
    /// Multi-step job; nothing else touches the backend until it finishes.
    Atomic(StoreJob),
}

impl fmt::Debug for StoreMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreMessage::ReadAll(t, _) => write!(f, "ReadAll({t})"),
            StoreMessage::Append(t, row, _) => write!(f, "Append({t}, {})", row.id()),
            StoreMessage::UpdateById(t, id, _, _) => write!(f, "UpdateById({t}, {id})"),
            StoreMessage::DeleteById(t, id, _) => write!(f, "DeleteById({t}, {id})"),
            StoreMessage::Find(t, filters, _) => write!(f, "Find({t}, {filters:?})"),
            StoreMessage::Atomic(_) => f.write_str("Atomic"),
        }
    }
}

/// Handle for interacting with the store actor.
#[derive(Clone)]
pub struct StoreHandle {
    actor: ActorRef<StoreMessage>,
}

fn rpc_failed(op: &'static str) -> impl FnOnce(ractor::RactorErr<StoreMessage>) -> NrcError {
    move |e| NrcError::StoreUnavailable(format!("{op} RPC failed: {e}"))
}

impl StoreHandle {
    pub async fn read_all(&self, table: Table) -> Result<Vec<Row>, NrcError> {
        ractor::call!(self.actor, StoreMessage::ReadAll, table).map_err(rpc_failed("ReadAll"))?
    }

    pub async fn append(&self, table: Table, row: Row) -> Result<Row, NrcError> {
        ractor::call!(self.actor, StoreMessage::Append, table, row).map_err(rpc_failed("Append"))?
    }

    pub async fn update_by_id(
        &self,
        table: Table,
        id: impl Into<String>,
        patch: Row,
    ) -> Result<Option<Row>, NrcError> {
        ractor::call!(self.actor, StoreMessage::UpdateById, table, id.into(), patch)
            .map_err(rpc_failed("UpdateById"))?
    }

    pub async fn delete_by_id(&self, table: Table, id: impl Into<String>) -> Result<bool, NrcError> {
        ractor::call!(self.actor, StoreMessage::DeleteById, table, id.into())
            .map_err(rpc_failed("DeleteById"))?
    }

    pub async fn find(&self, table: Table, filters: Vec<Filter>) -> Result<Vec<Row>, NrcError> {
        ractor::call!(self.actor, StoreMessage::Find, table, filters).map_err(rpc_failed("Find"))?
    }

    pub async fn find_one(
        &self,
        table: Table,
        filters: Vec<Filter>,
    ) -> Result<Option<Row>, NrcError> {
        Ok(self.find(table, filters).await?.into_iter().next())
    }

    pub async fn find_by_field(
        &self,
        table: Table,
        column: &str,
        value: impl Into<String>,
    ) -> Result<Vec<Row>, NrcError> {
        self.find(table, vec![filter(column, value)]).await
    }

    pub async fn get(&self, table: Table, id: impl Into<String>) -> Result<Option<Row>, NrcError> {
        self.find_one(table, vec![filter("id", id)]).await
    }

    /// Run `work` with exclusive access to the backend and return its result.
    ///
    /// Writes made before a failing step stay in place.
    pub async fn atomic<T, F>(&self, work: F) -> Result<T, NrcError>
    where
        T: Send + 'static,
        F: for<'a> FnOnce(&'a mut Backend) -> BoxFuture<'a, Result<T, NrcError>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job = boxed_job(move |backend| {
            Box::pin(async move {
                let _ = tx.send(work(backend).await);
            })
        });
        ractor::cast!(self.actor, StoreMessage::Atomic(job))
            .map_err(|e| NrcError::StoreUnavailable(format!("Atomic cast failed: {e}")))?;
        rx.await
            .map_err(|e| NrcError::StoreUnavailable(format!("atomic job dropped: {e}")))?
    }
}

fn boxed_job<F>(f: F) -> StoreJob
where
    F: for<'a> FnOnce(&'a mut Backend) -> BoxFuture<'a, ()> + Send + 'static,
{
    Box::new(f)
}

struct StoreActor;

#[ractor::async_trait]
impl Actor for StoreActor {
    type Msg = StoreMessage;
    type State = Backend;
    type Arguments = Backend;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        backend: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!(backend = ?backend.kind(), "StoreActor started");
        Ok(backend)
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        debug!(?message, "store message");
        match message {
            StoreMessage::ReadAll(table, rp) => {
                let _ = rp.send(state.read_all(table).await);
            }
            StoreMessage::Append(table, row, rp) => {
                let _ = rp.send(state.append(table, row).await);
            }
            StoreMessage::UpdateById(table, id, patch, rp) => {
                let _ = rp.send(state.update_by_id(table, &id, patch).await);
            }
            StoreMessage::DeleteById(table, id, rp) => {
                let _ = rp.send(state.delete_by_id(table, &id).await);
            }
            StoreMessage::Find(table, filters, rp) => {
                let _ = rp.send(state.find(table, &filters).await);
            }
            StoreMessage::Atomic(job) => job(state).await,
        }
        Ok(())
    }
}

/// Spawn the store actor around an opened backend.
pub async fn spawn(backend: Backend) -> Result<StoreHandle, NrcError> {
    let (actor, _jh) = Actor::spawn(None, StoreActor, backend)
        .await
        .map_err(|e| NrcError::StoreUnavailable(format!("failed to spawn StoreActor: {e}")))?;
    Ok(StoreHandle { actor })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::CsvStore;

    async fn handle() -> (tempfile::TempDir, StoreHandle) {
        let dir = tempfile::tempdir().unwrap();
        let mut csv = CsvStore::new(dir.path());
        csv.init().await.unwrap();
        let handle = spawn(Backend::Csv(csv)).await.unwrap();
        (dir, handle)
    }

    #[tokio::test]
    async fn primitive_ops_go_through_the_actor() {
        let (_dir, store) = handle().await;
        let row = Row::new().with("id", "c1").with("name", "Rampur").with("code", "AW-1");
        store.append(Table::AnganwadiCenters, row).await.unwrap();

        let found = store
            .find_by_field(Table::AnganwadiCenters, "code", "AW-1")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        store
            .update_by_id(Table::AnganwadiCenters, "c1", Row::new().with("village", "Rampur"))
            .await
            .unwrap();
        let got = store.get(Table::AnganwadiCenters, "c1").await.unwrap().unwrap();
        assert_eq!(got.get("village"), "Rampur");

        assert!(store.delete_by_id(Table::AnganwadiCenters, "c1").await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_atomic_increments_do_not_lose_updates() {
        let (_dir, store) = handle().await;
        store
            .append(Table::Beds, Row::new().with("id", "b1").with("bed_number", "0"))
            .await
            .unwrap();

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .atomic(|db| {
                            Box::pin(async move {
                                let row = db.get(Table::Beds, "b1").await?.unwrap_or_default();
                                let n: u32 = row.parse(Table::Beds, "bed_number")?;
                                db.update_by_id(
                                    Table::Beds,
                                    "b1",
                                    Row::new().with("bed_number", (n + 1).to_string()),
                                )
                                .await?;
                                Ok::<_, NrcError>(n + 1)
                            })
                        })
                        .await
                })
            })
            .collect();

        for t in tasks {
            t.await.unwrap().unwrap();
        }
        let row = store.get(Table::Beds, "b1").await.unwrap().unwrap();
        assert_eq!(row.get("bed_number"), "20");
    }

    #[tokio::test]
    async fn atomic_errors_reach_the_caller() {
        let (_dir, store) = handle().await;
        let err = store
            .atomic(|db| {
                Box::pin(async move {
                    db.get(Table::Beds, "missing")
                        .await?
                        .ok_or_else(|| NrcError::not_found("bed", "missing"))
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, NrcError::NotFound { .. }));
    }
}
