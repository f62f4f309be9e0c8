pub mod caller;
pub mod error;
pub mod persistence;
pub mod routes;
pub mod telemetry;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use error::AppError;
use persistence::Persistence;
use supervisor_allocation_config::Config;
use supervisor_allocation_database::roster::{default_roster, load_roster};
use supervisor_allocation_database::{load_snapshot, Phase};
use supervisor_allocation_engine::{
    AllocationEngine, PhaseContext, PhaseController, StoreVersions,
};
use tokio::net::TcpListener;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<AllocationEngine>,
    pub phase: Arc<PhaseController>,
    /// Phase a reset goes back to.
    pub initial_phase: Phase,
    pub persistence: Option<Arc<Persistence>>,
}

impl AppState {
    #[must_use]
    pub fn new(
        engine: AllocationEngine,
        phase: PhaseController,
        initial_phase: Phase,
        persistence: Option<Persistence>,
    ) -> Self {
        Self {
            engine: Arc::new(engine),
            phase: Arc::new(phase),
            initial_phase,
            persistence: persistence.map(Arc::new),
        }
    }

    /// Writes the current state to the snapshot file, if there is one. Runs after a change
    /// was committed, so a failed write is logged and doesn't fail the request.
    pub async fn persist(&self) {
        if let Some(persistence) = &self.persistence {
            if let Err(err) = persistence.save(&self.engine, &self.phase).await {
                error!("failed to write snapshot, the change is only kept in memory: {err}");
            }
        }
    }
}

/// Loads the roster and, if configured, continues from the last snapshot.
pub async fn setup_state(config: &Config) -> Result<AppState, AppError> {
    let roster = match &config.roster_path {
        Some(path) => load_roster(path, config.default_confirm_quota).await?,
        None => {
            warn!("no roster configured, using the demo roster");
            default_roster()
        }
    };

    let snapshot = match &config.snapshot_path {
        Some(path) => load_snapshot(path).await?,
        None => None,
    };
    let (engine, phase) = match snapshot {
        Some(snapshot) => {
            info!(
                phase = %snapshot.phase,
                selections = snapshot.selections.len(),
                "restored snapshot"
            );
            (
                AllocationEngine::restore(
                    roster,
                    snapshot.persons,
                    snapshot.selections,
                    StoreVersions {
                        roster: snapshot.versions.roster,
                        selections: snapshot.versions.selections,
                    },
                    config.cancel_policy,
                ),
                PhaseController::restore(PhaseContext {
                    phase: snapshot.phase,
                    version: snapshot.versions.phase,
                }),
            )
        }
        None => (
            AllocationEngine::new(roster, config.cancel_policy),
            PhaseController::new(config.initial_phase),
        ),
    };

    Ok(AppState::new(
        engine,
        phase,
        config.initial_phase,
        config.snapshot_path.clone().map(Persistence::new),
    ))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/phase", get(routes::phase::current).put(routes::phase::change))
        .route("/versions", get(routes::phase::versions))
        .route("/selections", post(routes::selections::apply))
        .route(
            "/selections/mine",
            get(routes::selections::mine).delete(routes::selections::cancel),
        )
        .route("/selections/:id/decision", post(routes::selections::decide))
        .route("/instructors", get(routes::instructors::overview))
        .route("/instructors/:id/stats", get(routes::instructors::stats))
        .route(
            "/instructors/:id/applications",
            get(routes::instructors::applications),
        )
        .route("/instructors/:id/quota", put(routes::instructors::quota))
        .route("/students/:id/status", get(routes::students::status))
        .route("/reports/unmatched", get(routes::reports::unmatched))
        .route("/reports/matches", get(routes::reports::matches))
        .route("/reports/summary", get(routes::reports::summary))
        .route("/admin/reset", post(routes::admin::reset))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::new())
}

pub async fn run_server(config: Config) -> Result<(), AppError> {
    info!("starting up server...");
    let state = setup_state(&config).await?;
    let listener = TcpListener::bind(config.listen).await?;
    info!(listen = %config.listen, "started up server...");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

#[allow(clippy::redundant_pub_crate)]
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("failed to install signal handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    warn!("shutting down");
}
