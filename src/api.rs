// HTTP API with Axum
//
// Thin layer over BudgetService: decode the request, call the service,
// map BudgetError kinds onto status codes.

use crate::error::{BudgetError, ErrorKind};
use crate::report::Report;
use crate::service::{log_failure, BudgetService};
use crate::state::{BudgetState, Expense};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::{self, JoinError};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BudgetService>,
}

impl AppState {
    pub fn new(service: BudgetService) -> Self {
        AppState {
            service: Arc::new(service),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

pub enum ApiError {
    Budget(BudgetError),
    /// A blocking service task panicked or was cancelled
    Worker(JoinError),
}

impl From<BudgetError> for ApiError {
    fn from(err: BudgetError) -> Self {
        ApiError::Budget(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Budget(BudgetError::InvalidRequest(rejection.body_text()))
    }
}

impl From<JoinError> for ApiError {
    fn from(err: JoinError) -> Self {
        ApiError::Worker(err)
    }
}

#[derive(Serialize)]
struct ErrorDetail {
    kind: &'static str,
    message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

fn error_response(status: StatusCode, kind: &'static str, message: String) -> Response {
    let body = ErrorBody {
        error: ErrorDetail { kind, message },
    };
    (status, Json(body)).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Budget(err) => err,
            ApiError::Worker(err) => {
                tracing::error!(error = %err, "budget task failed");
                return error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "Internal server error".to_string(),
                );
            }
        };
        log_failure(&err);

        let status = match err.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let message = match err.kind() {
            ErrorKind::Internal => "Internal storage error".to_string(),
            _ => err.to_string(),
        };
        error_response(status, err.code(), message)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Run a service call on the blocking pool. Store I/O and the service lock
/// stay off the async workers.
async fn run<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&BudgetService) -> Result<T, BudgetError> + Send + 'static,
{
    let service = Arc::clone(&state.service);
    Ok(task::spawn_blocking(move || f(&service)).await??)
}

// ============================================================================
// Request / response bodies
// ============================================================================

#[derive(Deserialize)]
pub struct CategoryRequest {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Deserialize)]
pub struct ReplaceCategoriesRequest {
    #[serde(default)]
    pub categories: Vec<String>,
}

#[derive(Deserialize)]
pub struct ExpenseRequest {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub amount: Value,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub message: String,
    pub id: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub store: &'static str,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        store: state.service.backend(),
    })
}

/// GET /api/state - Categories, budget and expenses
async fn get_state(State(state): State<AppState>) -> ApiResult<Json<BudgetState>> {
    Ok(Json(run(&state, |service| service.state()).await?))
}

/// POST /api/categories - Add or remove a single category
async fn update_category(
    State(state): State<AppState>,
    payload: Result<Json<CategoryRequest>, JsonRejection>,
) -> ApiResult<Json<BudgetState>> {
    let Json(req) = payload?;
    let updated = match req.action.trim().to_ascii_lowercase().as_str() {
        "add" => run(&state, move |service| service.add_category(&req.category)).await?,
        "remove" => run(&state, move |service| service.remove_category(&req.category)).await?,
        _ => return Err(BudgetError::UnsupportedAction(req.action).into()),
    };
    Ok(Json(updated))
}

/// PUT /api/categories - Replace the whole category list
async fn replace_categories(
    State(state): State<AppState>,
    payload: Result<Json<ReplaceCategoriesRequest>, JsonRejection>,
) -> ApiResult<Json<BudgetState>> {
    let Json(req) = payload?;
    let updated = run(&state, move |service| service.replace_categories(&req.categories)).await?;
    Ok(Json(updated))
}

/// POST /api/budget - Set limits for any subset of categories
async fn set_budget(
    State(state): State<AppState>,
    payload: Result<Json<serde_json::Map<String, Value>>, JsonRejection>,
) -> ApiResult<Json<BudgetState>> {
    let Json(mapping) = payload?;
    Ok(Json(run(&state, move |service| service.set_budgets(&mapping)).await?))
}

/// POST /api/expense - Log an expense dated today
async fn add_expense(
    State(state): State<AppState>,
    payload: Result<Json<ExpenseRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Expense>)> {
    let Json(req) = payload?;
    let expense = run(&state, move |service| {
        service.add_expense(&req.category, &req.amount, req.description.as_deref())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

/// DELETE /api/expense/:id - Delete an expense
async fn delete_expense(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    let removed = run(&state, move |service| service.remove_expense(&id)).await?;
    Ok(Json(DeleteResponse {
        message: "Expense deleted".to_string(),
        id: removed.id,
    }))
}

/// GET /api/report - Spent vs budget per category
async fn get_report(State(state): State<AppState>) -> ApiResult<Json<Report>> {
    Ok(Json(run(&state, |service| service.report()).await?))
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

// ============================================================================
// Router
// ============================================================================

pub fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/state", get(get_state))
        .route("/categories", post(update_category).put(replace_categories))
        .route("/budget", post(set_budget))
        .route("/expense", post(add_expense))
        .route("/expense/:id", delete(delete_expense))
        .route("/report", get(get_report))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .nest_service("/static", ServeDir::new("web"))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
