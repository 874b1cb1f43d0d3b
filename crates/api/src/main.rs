use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ledger_core::domain::error::ValidationError;
use ledger_core::domain::template::{EntryInput, StoredEntry};
use ledger_core::projection::MonthView;
use ledger_core::service::BudgetService;
use ledger_core::storage::PgTemplateStore;
use ledger_core::time::calendar::{self, YearMonth};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = ledger_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let service = match settings.require_database_url() {
        Ok(db_url) => match ledger_core::storage::connect(db_url, settings.db_max_connections).await {
            Ok(pool) => match ledger_core::storage::migrate(&pool).await {
                Ok(()) => Some(Arc::new(BudgetService::new(
                    PgTemplateStore::new(pool),
                    settings.expand_options(),
                ))),
                Err(e) => {
                    sentry_anyhow::capture_anyhow(&e);
                    tracing::error!(error = %e, "db migrations failed; starting API in degraded mode");
                    None
                }
            },
            Err(e) => {
                sentry_anyhow::capture_anyhow(&e);
                tracing::error!(error = %e, "db connect failed; starting API in degraded mode");
                None
            }
        },
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "DATABASE_URL missing; starting API in degraded mode");
            None
        }
    };

    let state = AppState { service };

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/owners/:owner_id/budget", get(get_month_view))
        .route("/owners/:owner_id/months", get(get_selectable_months))
        .route(
            "/owners/:owner_id/entries",
            get(list_entries).post(create_entry),
        )
        .route("/entries/:id", put(update_entry).delete(delete_entry))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));

    tracing::info!(%addr, horizon_months = settings.horizon_months, "api listening");

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
    service: Option<Arc<BudgetService<PgTemplateStore>>>,
}

impl AppState {
    fn service(&self) -> Result<&BudgetService<PgTemplateStore>, StatusCode> {
        self.service
            .as_deref()
            .ok_or(StatusCode::SERVICE_UNAVAILABLE)
    }
}

#[derive(Debug, Deserialize)]
struct MonthQuery {
    month: Option<String>,
}

#[derive(Debug, Serialize)]
struct Created {
    id: i64,
}

/// Validation failures become 400 with no detail; everything else is reported and hidden behind 500.
fn status_for(err: anyhow::Error) -> StatusCode {
    if let Some(v) = err.downcast_ref::<ValidationError>() {
        tracing::warn!(field = v.field, detail = %v.detail, "rejected budget input");
        return StatusCode::BAD_REQUEST;
    }
    sentry_anyhow::capture_anyhow(&err);
    tracing::error!(error = %err, "budget request failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

async fn get_month_view(
    State(state): State<AppState>,
    Path(owner_id): Path<i64>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<MonthView>, StatusCode> {
    let service = state.service()?;

    let month = query
        .month
        .as_deref()
        .map(str::parse::<YearMonth>)
        .transpose()
        .map_err(|_| StatusCode::BAD_REQUEST)?;

    let view = service
        .month_view(owner_id, month, today())
        .await
        .map_err(status_for)?;

    Ok(Json(view))
}

async fn get_selectable_months(Path(_owner_id): Path<i64>) -> Json<Vec<YearMonth>> {
    Json(calendar::selectable_months(today()))
}

async fn list_entries(
    State(state): State<AppState>,
    Path(owner_id): Path<i64>,
) -> Result<Json<Vec<StoredEntry>>, StatusCode> {
    let service = state.service()?;
    let entries = service.entries(owner_id).await.map_err(status_for)?;
    Ok(Json(entries))
}

async fn create_entry(
    State(state): State<AppState>,
    Path(owner_id): Path<i64>,
    Json(input): Json<EntryInput>,
) -> Result<(StatusCode, Json<Created>), StatusCode> {
    let service = state.service()?;
    let id = service
        .add_entry(owner_id, input)
        .await
        .map_err(status_for)?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

async fn update_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(input): Json<EntryInput>,
) -> Result<StatusCode, StatusCode> {
    let service = state.service()?;
    let updated = service.edit_entry(id, input).await.map_err(status_for)?;
    if updated {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, StatusCode> {
    let service = state.service()?;
    let removed = service.remove_entry(id).await.map_err(status_for)?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(StatusCode::NOT_FOUND)
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &ledger_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
