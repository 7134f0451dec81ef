use axum::{
    Json, Router,
    http::{HeaderName, HeaderValue, Method, header::AUTHORIZATION, header::CONTENT_TYPE},
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::FollowupConfig;
use crate::handlers::{
    anganwadi, auth, beds, dashboard, notifications, patients, treatments, users, visits, workers,
};
use crate::middleware::auth::ADMIN_KEY_HEADER;
use crate::service::throttle::LoginThrottle;
use crate::store::StoreHandle;

/// Shared state for every handler.
#[derive(Clone)]
pub struct NrcState {
    pub store: StoreHandle,
    pub admin_key: Arc<str>,
    pub throttle: LoginThrottle,
    pub followup: FollowupConfig,
}

impl NrcState {
    pub fn new(
        store: StoreHandle,
        admin_key: Arc<str>,
        throttle: LoginThrottle,
        followup: FollowupConfig,
    ) -> Self {
        Self {
            store,
            admin_key,
            throttle,
            followup,
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!(origin = %o, error = %e, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };
    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            CONTENT_TYPE,
            AUTHORIZATION,
            HeaderName::from_static(ADMIN_KEY_HEADER),
        ])
        .max_age(Duration::from_secs(60 * 60))
}

pub fn nrc_router(state: NrcState, cors_origins: &[String]) -> Router {
    let api = Router::new()
        .route("/auth/signup", post(auth::signup_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/users", get(users::list_users_handler))
        .route(
            "/users/{id}",
            get(users::get_user_handler).delete(users::delete_user_handler),
        )
        .route(
            "/patients",
            get(patients::list_patients_handler).post(patients::create_patient_handler),
        )
        .route(
            "/patients/{id}",
            get(patients::get_patient_handler)
                .put(patients::update_patient_handler)
                .delete(patients::delete_patient_handler),
        )
        .route(
            "/patients/{id}/treatment",
            get(patients::patient_treatment_handler),
        )
        .route(
            "/beds",
            get(beds::list_beds_handler).post(beds::create_bed_handler),
        )
        .route("/beds/summary", get(beds::bed_summary_handler))
        .route(
            "/beds/{id}",
            get(beds::get_bed_handler).delete(beds::delete_bed_handler),
        )
        .route("/beds/{id}/assign", post(beds::assign_bed_handler))
        .route("/beds/{id}/release", post(beds::release_bed_handler))
        .route("/beds/{id}/maintenance", post(beds::bed_maintenance_handler))
        .route(
            "/notifications",
            get(notifications::list_notifications_handler)
                .post(notifications::create_notification_handler),
        )
        .route(
            "/notifications/read-all",
            post(notifications::mark_all_read_handler),
        )
        .route(
            "/notifications/{id}/read",
            post(notifications::mark_read_handler),
        )
        .route(
            "/notifications/{id}",
            get(notifications::get_notification_handler)
                .delete(notifications::delete_notification_handler),
        )
        .route(
            "/visits",
            get(visits::list_visits_handler).post(visits::schedule_visit_handler),
        )
        .route(
            "/visits/{id}",
            get(visits::get_visit_handler)
                .put(visits::update_visit_handler)
                .delete(visits::delete_visit_handler),
        )
        .route(
            "/treatments",
            get(treatments::list_trackers_handler).post(treatments::create_tracker_handler),
        )
        .route(
            "/treatments/{id}",
            get(treatments::get_tracker_handler).put(treatments::update_tracker_handler),
        )
        .route(
            "/treatments/{id}/records",
            post(treatments::add_record_handler),
        )
        .route(
            "/treatments/{id}/progress",
            get(treatments::progress_handler),
        )
        .route(
            "/anganwadis",
            get(anganwadi::list_centers_handler).post(anganwadi::create_center_handler),
        )
        .route(
            "/anganwadis/{id}",
            get(anganwadi::get_center_handler)
                .put(anganwadi::update_center_handler)
                .delete(anganwadi::delete_center_handler),
        )
        .route(
            "/workers",
            get(workers::list_workers_handler).post(workers::create_worker_handler),
        )
        .route(
            "/workers/{id}",
            get(workers::get_worker_handler)
                .put(workers::update_worker_handler)
                .delete(workers::delete_worker_handler),
        )
        .route("/dashboard", get(dashboard::dashboard_handler));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}
