//! REST API for Shift Scheduling.
//!
//! Provides endpoints for:
//! - Demo data retrieval
//! - Schedule job management (create, get, status, re-solve, stop)
//! - Required-staff preview for a demand profile
//! - Swagger UI at /q/swagger-ui

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::demand::{required_staff, RequiredStaff};
use crate::demo_data::{self, DemoData};
use crate::domain::DemandPattern;
use crate::dto::{
    DemandDto, EmployeeDto, ErrorDto, HealthResponse, InfoResponse, OptimizationConfigDto,
    ScheduleDto, ScheduleProblemDto, StatusResponse, TerminationDto,
};
use crate::error::OptimizeError;
use crate::extract::{
    CoverageStatus, EmployeeAssignment, HourCoverage, ScheduleResult, ScheduleStatistics,
    ShiftInterval,
};
use crate::ilp::SolveStatus;
use crate::objective::ObjectiveKind;
use crate::solver::{JobError, SolverService, SolverStatus};

/// Application state shared across handlers.
pub struct AppState {
    pub solver: SolverService,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            solver: SolverService::new(),
        }
    }

    pub fn with_service(solver: SolverService) -> Self {
        Self { solver }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

type ApiError = (StatusCode, Json<ErrorDto>);

fn bad_request(e: &OptimizeError) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(ErrorDto::from(e)))
}

fn job_error(e: JobError) -> ApiError {
    let status = match e {
        JobError::NotFound(_) => StatusCode::NOT_FOUND,
        JobError::AlreadySolving(_) => StatusCode::CONFLICT,
    };
    (
        status,
        Json(ErrorDto {
            kind: e.kind(),
            message: e.to_string(),
        }),
    )
}

/// Creates the API router with CORS and Swagger UI enabled.
pub fn create_router() -> Router {
    router(Arc::new(AppState::new()))
}

/// Creates the API router over existing state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health & Info
        .route("/health", get(health))
        .route("/info", get(info))
        // Demo data
        .route("/demo-data", get(list_demo_data))
        .route("/demo-data/{id}", get(get_demo_data))
        // Schedules
        .route("/schedules", post(create_schedule).get(list_schedules))
        .route("/schedules/{id}", get(get_schedule).delete(stop_solving))
        .route("/schedules/{id}/status", get(get_schedule_status))
        .route("/schedules/{id}/solve", post(solve_again))
        // Demand preview
        .route("/required-staff", post(preview_required_staff))
        // Swagger UI at /q/swagger-ui (Quarkus-style path)
        .merge(SwaggerUi::new("/q/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health & Info
// ============================================================================

/// GET /health - Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse))
)]
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "UP" })
}

/// GET /info - Application info endpoint.
#[utoipa::path(
    get,
    path = "/info",
    responses((status = 200, description = "Application info", body = InfoResponse))
)]
async fn info(State(state): State<Arc<AppState>>) -> Json<InfoResponse> {
    Json(InfoResponse {
        name: "Shift Scheduler",
        version: env!("CARGO_PKG_VERSION"),
        solver_engine: state.solver.solver_name(),
    })
}

// ============================================================================
// Demo Data
// ============================================================================

/// GET /demo-data - List available demo data sets.
#[utoipa::path(
    get,
    path = "/demo-data",
    responses((status = 200, description = "List of demo dataset names", body = Vec<String>))
)]
async fn list_demo_data() -> Json<Vec<&'static str>> {
    Json(demo_data::list_demo_data())
}

/// GET /demo-data/{id} - Get a specific demo data set.
#[utoipa::path(
    get,
    path = "/demo-data/{id}",
    params(("id" = String, Path, description = "Demo dataset name")),
    responses(
        (status = 200, description = "Demo problem", body = ScheduleProblemDto),
        (status = 404, description = "Dataset not found")
    )
)]
async fn get_demo_data(Path(id): Path<String>) -> Result<Json<ScheduleProblemDto>, StatusCode> {
    match id.parse::<DemoData>() {
        Ok(demo) => Ok(Json(ScheduleProblemDto::from_problem(&demo_data::generate(demo)))),
        Err(_) => Err(StatusCode::NOT_FOUND),
    }
}

// ============================================================================
// Schedule Handlers
// ============================================================================

/// POST /schedules - Create and start solving a schedule.
/// Returns the job ID as plain text.
#[utoipa::path(
    post,
    path = "/schedules",
    request_body = ScheduleProblemDto,
    responses(
        (status = 200, description = "Job ID", body = String),
        (status = 400, description = "Invalid problem", body = ErrorDto)
    )
)]
async fn create_schedule(
    State(state): State<Arc<AppState>>,
    Json(dto): Json<ScheduleProblemDto>,
) -> Result<String, ApiError> {
    let problem = dto.to_problem();
    problem.validate().map_err(|e| bad_request(&e))?;

    let id = Uuid::new_v4().to_string();
    let job = state.solver.create_job(id.clone(), problem);
    let _completion = state.solver.start_solving(job).map_err(job_error)?;
    tracing::info!(job_id = %id, "schedule submitted");
    Ok(id)
}

/// POST /schedules/{id}/solve - Solve an existing schedule again.
/// Returns the job ID as plain text.
#[utoipa::path(
    post,
    path = "/schedules/{id}/solve",
    params(("id" = String, Path, description = "Schedule job ID")),
    responses(
        (status = 200, description = "Job ID", body = String),
        (status = 404, description = "Not found", body = ErrorDto),
        (status = 409, description = "Job is still solving", body = ErrorDto)
    )
)]
async fn solve_again(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<String, ApiError> {
    let job = state
        .solver
        .get_job(&id)
        .ok_or_else(|| job_error(JobError::NotFound(id.clone())))?;
    let _completion = state.solver.start_solving(job).map_err(job_error)?;
    tracing::info!(job_id = %id, "schedule resubmitted");
    Ok(id)
}

/// GET /schedules - List all schedule IDs.
#[utoipa::path(
    get,
    path = "/schedules",
    responses((status = 200, description = "List of job IDs", body = Vec<String>))
)]
async fn list_schedules(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.solver.list_jobs())
}

/// GET /schedules/{id} - Get a schedule's problem, status and result.
#[utoipa::path(
    get,
    path = "/schedules/{id}",
    params(("id" = String, Path, description = "Schedule job ID")),
    responses(
        (status = 200, description = "Schedule retrieved", body = ScheduleDto),
        (status = 404, description = "Not found")
    )
)]
async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ScheduleDto>, StatusCode> {
    match state.solver.get_job(&id) {
        Some(job) => Ok(Json(ScheduleDto::from_job(&job.read()))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// GET /schedules/{id}/status - Get a schedule's status only.
#[utoipa::path(
    get,
    path = "/schedules/{id}/status",
    params(("id" = String, Path, description = "Schedule job ID")),
    responses(
        (status = 200, description = "Status retrieved", body = StatusResponse),
        (status = 404, description = "Not found")
    )
)]
async fn get_schedule_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StatusResponse>, StatusCode> {
    match state.solver.get_job(&id) {
        Some(job) => Ok(Json(StatusResponse::from_job(&job.read()))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

/// DELETE /schedules/{id} - Stop solving and remove a schedule.
#[utoipa::path(
    delete,
    path = "/schedules/{id}",
    params(("id" = String, Path, description = "Schedule job ID")),
    responses(
        (status = 200, description = "Solving stopped", body = ScheduleDto),
        (status = 404, description = "Not found")
    )
)]
async fn stop_solving(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ScheduleDto>, StatusCode> {
    state
        .solver
        .stop_solving(&id)
        .map_err(|_| StatusCode::NOT_FOUND)?;
    match state.solver.remove_job(&id) {
        Some(job) => Ok(Json(ScheduleDto::from_job(&job.read()))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

// ============================================================================
// Demand Preview
// ============================================================================

/// POST /required-staff - Staff needed per open hour for a demand profile.
#[utoipa::path(
    post,
    path = "/required-staff",
    request_body = DemandDto,
    responses(
        (status = 200, description = "Required staff per hour", body = RequiredStaff),
        (status = 400, description = "Invalid demand profile", body = ErrorDto)
    )
)]
async fn preview_required_staff(Json(dto): Json<DemandDto>) -> Result<Json<RequiredStaff>, ApiError> {
    required_staff(&dto.to_profile())
        .map(Json)
        .map_err(|e| bad_request(&e))
}

// ============================================================================
// OpenAPI Documentation
// ============================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        info,
        list_demo_data,
        get_demo_data,
        create_schedule,
        list_schedules,
        get_schedule,
        get_schedule_status,
        solve_again,
        stop_solving,
        preview_required_staff,
    ),
    components(schemas(
        HealthResponse,
        InfoResponse,
        EmployeeDto,
        DemandDto,
        DemandPattern,
        OptimizationConfigDto,
        ObjectiveKind,
        TerminationDto,
        ScheduleProblemDto,
        ScheduleDto,
        StatusResponse,
        ErrorDto,
        SolverStatus,
        SolveStatus,
        ScheduleResult,
        EmployeeAssignment,
        ShiftInterval,
        HourCoverage,
        CoverageStatus,
        ScheduleStatistics,
        RequiredStaff,
    ))
)]
struct ApiDoc;
