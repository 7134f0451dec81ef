//! HTTP handlers. Each one runs its service call as a single store job so
//! multi-table rules are never interleaved with other requests.

pub mod anganwadi;
pub mod auth;
pub mod beds;
pub mod dashboard;
pub mod notifications;
pub mod patients;
pub mod treatments;
pub mod users;
pub mod visits;
pub mod workers;

use axum::Json;
use axum_extra::extract::WithRejection;

use crate::NrcError;

/// JSON request body whose rejections render as `INVALID_INPUT` errors.
pub type JsonBody<T> = WithRejection<Json<T>, NrcError>;
