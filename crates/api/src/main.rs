use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use finboard_core::dashboard::DashboardAggregator;
use finboard_core::domain::dashboard::DashboardView;
use finboard_core::domain::snapshot::CompositeSnapshot;
use finboard_core::refresh::SnapshotCoordinator;
use finboard_core::storage::users::PgUserDataStore;
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = finboard_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let pool: Option<PgPool> = match settings.require_database_url() {
        Ok(db_url) => match sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
        {
            Ok(pool) => match finboard_core::storage::migrate(&pool).await {
                Ok(()) => Some(pool),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                let err = anyhow::Error::new(e);
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %err, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let coordinator = Arc::new(
        finboard_core::refresh::setup::build_coordinator(&settings, pool.clone()).await?,
    );
    let dashboard = pool.map(|pool| {
        DashboardAggregator::new(coordinator.clone(), Arc::new(PgUserDataStore::new(pool)))
    });

    let state = AppState {
        coordinator,
        dashboard,
    };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/economy", get(get_economy))
        .route("/economy/cache", delete(invalidate_economy_cache))
        .route("/dashboard/:user_id", get(get_dashboard))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    coordinator: Arc<SnapshotCoordinator>,
    // None when the database is unavailable.
    dashboard: Option<DashboardAggregator>,
}

async fn get_economy(State(state): State<AppState>) -> Json<CompositeSnapshot> {
    Json(state.coordinator.fetch_snapshot().await)
}

async fn invalidate_economy_cache(State(state): State<AppState>) -> StatusCode {
    match state.coordinator.invalidate_cache().await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %format!("{e:#}"), "economic snapshot cache invalidation failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn get_dashboard(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<DashboardView>, StatusCode> {
    let Some(dashboard) = &state.dashboard else {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let user_id = Uuid::parse_str(&user_id).map_err(|_| StatusCode::BAD_REQUEST)?;

    let view = dashboard.fetch_dashboard(user_id).await.map_err(|e| {
        sentry_anyhow::capture_anyhow(&e);
        tracing::error!(%user_id, error = %format!("{e:#}"), "dashboard load failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(view))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &finboard_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
