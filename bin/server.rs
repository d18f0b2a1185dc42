// Future Sight - Web Server
// REST API with Axum over the banner store

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use future_sight::{
    get_tracked_banners, load_user_resources, open_database, plan, AppConfig, Banner,
    BannerAssembler, BannerCategory, BannerProjection, BannerRepository, FutureSightError,
    ResourceCalculator,
};

/// Shared application state
#[derive(Clone)]
struct AppState {
    db: Arc<Mutex<Connection>>,
    config: Arc<AppConfig>,
}

impl AppState {
    fn conn(&self) -> Result<MutexGuard<'_, Connection>, ApiError> {
        self.db
            .lock()
            .map_err(|_| ApiError::internal(anyhow::anyhow!("database lock poisoned")))
    }

    fn assembler(&self) -> BannerAssembler {
        BannerAssembler::with_namespace(&self.config.resource_namespace)
    }
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Handler failure carried to the client as `ApiResponse::err`
struct ApiError {
    status: StatusCode,
    error: anyhow::Error,
}

impl ApiError {
    fn internal(error: anyhow::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error,
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        let status = match error.downcast_ref::<FutureSightError>() {
            Some(FutureSightError::BannerNotFound(_)) => StatusCode::NOT_FOUND,
            Some(FutureSightError::UnknownCategory(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, error }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!(error = %format!("{:#}", self.error), "request failed");
        }
        (self.status, Json(ApiResponse::<()>::err(self.error.to_string()))).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Deserialize)]
struct BannerQuery {
    category: Option<String>,
}

#[derive(Serialize)]
struct TrackResponse {
    id: String,
    is_tracked: bool,
}

#[derive(Serialize)]
struct RefreshResponse {
    banners: usize,
    tracked: usize,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/banners?category= - All banners, optionally one category
async fn list_banners(
    State(state): State<AppState>,
    Query(query): Query<BannerQuery>,
) -> ApiResult<Vec<Banner>> {
    let category = match query.category.as_deref() {
        Some(value) => Some(
            BannerCategory::parse(value)
                .ok_or_else(|| FutureSightError::UnknownCategory(value.to_string()))
                .map_err(anyhow::Error::from)?,
        ),
        None => None,
    };

    let conn = state.conn()?;
    let source = state.config.data_source();
    let repo = BannerRepository::new(&conn, &source, state.assembler()).with_actor("server");

    let banners = match category {
        Some(category) => repo.get_banners_by_category(category)?,
        None => repo.get_banners()?,
    };

    Ok(Json(ApiResponse::ok(banners)))
}

/// GET /api/banners/tracked - Tracked banners only
async fn tracked_banners(State(state): State<AppState>) -> ApiResult<Vec<Banner>> {
    let conn = state.conn()?;
    let banners = get_tracked_banners(&conn)?;
    Ok(Json(ApiResponse::ok(banners)))
}

async fn set_tracking(state: AppState, banner_id: String, is_tracked: bool) -> ApiResult<TrackResponse> {
    let conn = state.conn()?;
    let source = state.config.data_source();
    let repo = BannerRepository::new(&conn, &source, state.assembler()).with_actor("server");

    repo.set_tracked(&banner_id, is_tracked)?;

    Ok(Json(ApiResponse::ok(TrackResponse {
        id: banner_id,
        is_tracked,
    })))
}

/// POST /api/banners/:id/track - Start tracking
async fn track_banner(State(state): State<AppState>, Path(banner_id): Path<String>) -> ApiResult<TrackResponse> {
    set_tracking(state, banner_id, true).await
}

/// DELETE /api/banners/:id/track - Stop tracking
async fn untrack_banner(State(state): State<AppState>, Path(banner_id): Path<String>) -> ApiResult<TrackResponse> {
    set_tracking(state, banner_id, false).await
}

/// POST /api/refresh - Re-ingest the data files (blocking task)
async fn refresh(State(state): State<AppState>) -> ApiResult<RefreshResponse> {
    let banners = tokio::task::spawn_blocking(move || -> Result<Vec<Banner>, ApiError> {
        let conn = state.conn()?;
        let source = state.config.data_source();
        let repo = BannerRepository::new(&conn, &source, state.assembler()).with_actor("server");
        Ok(repo.refresh()?)
    })
    .await
    .map_err(|e| ApiError::internal(e.into()))??;

    Ok(Json(ApiResponse::ok(RefreshResponse {
        banners: banners.len(),
        tracked: banners.iter().filter(|b| b.is_tracked).count(),
    })))
}

/// GET /api/plan - Resource projection for every tracked banner
async fn get_plan(State(state): State<AppState>) -> ApiResult<Vec<BannerProjection>> {
    let conn = state.conn()?;
    let resources = load_user_resources(&conn)?;
    let tracked = get_tracked_banners(&conn)?;

    let projections = plan(
        &tracked,
        &resources,
        Local::now().date_naive(),
        state.config.offset_days,
        &ResourceCalculator::new(),
    );

    Ok(Json(ApiResponse::ok(projections)))
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/banners", get(list_banners))
        .route("/banners/tracked", get(tracked_banners))
        .route("/banners/:id/track", post(track_banner).delete(untrack_banner))
        .route("/refresh", post(refresh))
        .route("/plan", get(get_plan))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("future_sight=info,future_sight_server=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let conn = open_database(&config.database_path)?;
    info!(path = %config.database_path.display(), "database opened");

    let port = config.server_port;
    let state = AppState {
        db: Arc::new(Mutex::new(conn)),
        config: Arc::new(config),
    };

    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("🚀 Server running on http://localhost:{}", port);
    info!("   API: http://localhost:{}/api/banners", port);

    axum::serve(listener, app).await?;

    Ok(())
}
