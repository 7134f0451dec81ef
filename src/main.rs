use mimalloc::MiMalloc;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal::ctrl_c;
#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use nrc_server::config::CONFIG;
use nrc_server::router::{NrcState, nrc_router};
use nrc_server::service::throttle::LoginThrottle;
use nrc_server::service::{beds, users};
use nrc_server::store::{self, Backend};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = &*CONFIG;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cfg.basic.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        listen_addr = %cfg.basic.listen_addr,
        backend = ?cfg.storage.backend,
        data_dir = %cfg.storage.data_dir.display(),
        loglevel = %cfg.basic.loglevel,
        admin_routes = !cfg.basic.admin_key.is_empty(),
    );
    if cfg.basic.admin_key.is_empty() {
        warn!("basic.admin_key is empty; admin routes will reject every request");
    }

    let backend = Backend::open(&cfg.storage).await?;
    let handle = store::spawn(backend).await?;

    let seed_beds = cfg.storage.seed_beds;
    let seeded = handle
        .atomic(move |db| Box::pin(async move { beds::seed(db, seed_beds).await }))
        .await?;
    if seeded > 0 {
        info!(count = seeded, "bed table was empty; seeded ward general");
    }

    if let Some(password) = cfg.auth.bootstrap_admin_password.clone() {
        let created = handle
            .atomic(move |db| {
                Box::pin(async move { users::bootstrap_admin(db, &password).await })
            })
            .await?;
        if let Some(admin) = created {
            info!(user_id = %admin.id, username = %admin.username, "bootstrap admin created");
        }
    }

    let state = NrcState::new(
        handle,
        Arc::from(cfg.basic.admin_key.as_str()),
        LoginThrottle::per_minute(cfg.auth.login_attempts_per_minute),
        cfg.followup,
    );
    let app = nrc_router(state, &cfg.basic.cors_origins);

    let listener = TcpListener::bind(&cfg.basic.listen_addr).await?;
    info!("HTTP server listening on {}", cfg.basic.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
