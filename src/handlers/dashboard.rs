use axum::{
    Json,
    extract::{Query, State},
};

use crate::service::dashboard::{self, Dashboard, DashboardQuery};
use crate::{NrcError, router::NrcState};

pub async fn dashboard_handler(
    State(state): State<NrcState>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Dashboard>, NrcError> {
    let board = state
        .store
        .atomic(move |db| Box::pin(async move { dashboard::build(&*db, query).await }))
        .await?;
    Ok(Json(board))
}
