use crate::constraints::default_registry;
use crate::data::{
    Class, ClassId, ClassPriorityConfig, Day, Period, SchoolConfig, Subject, Teacher, TeacherId,
    Timetable,
};
use crate::improver::{ImproverConfig, improve_timetable};
use crate::rotation::generate_rotations;
use crate::scoring::{ScoreBreakdown, score_breakdown};
use crate::solver::{
    SolveOutcome, SolveStatus, SolverSettings, invert_to_teacher_timetable, solve_timetable_with,
};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::env;
use std::net::SocketAddr;
use tower::limit::ConcurrencyLimitLayer;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
const MAX_CONCURRENT_REQUESTS: usize = 4;
/// Upper bound on requested rotation weeks; every week is a full timetable copy.
pub const MAX_ROTATION_WEEKS: usize = 52;

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Failure of one request, rendered with its HTTP status.
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NoSolution(SolveStatus),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::NoSolution(status) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(NoSolutionResponse { status }),
            )
                .into_response(),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response(),
        }
    }
}

fn check_rotation_weeks(weeks: usize) -> Result<(), ApiError> {
    if weeks > MAX_ROTATION_WEEKS {
        return Err(ApiError::BadRequest(format!(
            "{weeks} rotation weeks requested, at most {MAX_ROTATION_WEEKS} allowed"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveRequest {
    pub school: SchoolConfig,
    pub teachers: Vec<Teacher>,
    pub classes: Vec<Class>,
    #[serde(default)]
    pub disabled_constraints: Vec<String>,
    #[serde(default)]
    pub priority_configs: Vec<ClassPriorityConfig>,
    pub improve: Option<ImproverConfig>,
    #[serde(default)]
    pub rotation_weeks: usize,
    #[serde(default)]
    pub settings: SolverSettings,
}

/// One entry of the teacher-centric view.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TeacherAssignment {
    pub teacher_id: TeacherId,
    pub day: Day,
    pub period: Period,
    pub class_id: ClassId,
    pub subject: Subject,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolveResponse {
    pub status: SolveStatus,
    pub class_timetable: Timetable,
    pub teacher_timetable: Vec<TeacherAssignment>,
    pub score: ScoreBreakdown,
    pub rotations: Vec<Timetable>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoSolutionResponse {
    pub status: SolveStatus,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    pub school: SchoolConfig,
    pub timetable: Timetable,
    #[serde(default)]
    pub priority_configs: Vec<ClassPriorityConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotateRequest {
    pub school: SchoolConfig,
    pub timetable: Timetable,
    pub num_weeks: usize,
}

/// Runs the whole pipeline for one request: solve, optionally improve, score, rotate.
pub fn run_pipeline(request: SolveRequest) -> Result<SolveResponse, ApiError> {
    check_rotation_weeks(request.rotation_weeks)?;

    let mut registry = default_registry();
    for name in &request.disabled_constraints {
        registry.disable(name);
    }

    let outcome = solve_timetable_with(
        &request.school,
        &request.teachers,
        &request.classes,
        Some(&registry),
        &request.settings,
    )
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let (timetable, status) = match outcome {
        SolveOutcome::Solved { timetable, status } => (timetable, status),
        SolveOutcome::NoSolution { status } => return Err(ApiError::NoSolution(status)),
    };

    let timetable = match &request.improve {
        Some(config) => improve_timetable(
            &timetable,
            &request.school,
            &request.classes,
            &request.priority_configs,
            config,
        ),
        None => timetable,
    };

    let teacher_timetable = invert_to_teacher_timetable(&timetable)
        .into_iter()
        .flat_map(|(teacher_id, slots)| {
            slots.into_iter().map(move |(slot, lesson)| TeacherAssignment {
                teacher_id: teacher_id.clone(),
                day: slot.day,
                period: slot.period,
                class_id: lesson.class_id,
                subject: lesson.subject,
            })
        })
        .collect();

    Ok(SolveResponse {
        status,
        score: score_breakdown(&timetable, &request.school, &request.priority_configs),
        rotations: generate_rotations(&timetable, &request.school, request.rotation_weeks),
        teacher_timetable,
        class_timetable: timetable,
    })
}

async fn solve_handler(Json(request): Json<SolveRequest>) -> ApiResult<SolveResponse> {
    // the solver blocks for up to its time budget
    match tokio::task::spawn_blocking(move || run_pipeline(request)).await {
        Ok(Ok(response)) => Ok(Json(response)),
        Ok(Err(e)) => Err(e),
        Err(e) => {
            warn!("Solve task failed: {}", e);
            Err(ApiError::Internal(e.to_string()))
        }
    }
}

async fn score_handler(Json(request): Json<ScoreRequest>) -> Json<ScoreBreakdown> {
    Json(score_breakdown(
        &request.timetable,
        &request.school,
        &request.priority_configs,
    ))
}

async fn rotate_handler(Json(request): Json<RotateRequest>) -> ApiResult<Vec<Timetable>> {
    check_rotation_weeks(request.num_weeks)?;
    Ok(Json(generate_rotations(
        &request.timetable,
        &request.school,
        request.num_weeks,
    )))
}

async fn constraints_handler() -> Json<Vec<String>> {
    Json(
        default_registry()
            .names()
            .into_iter()
            .map(String::from)
            .collect(),
    )
}

pub fn router() -> Router {
    Router::new()
        .route("/v1/timetable/solve", post(solve_handler))
        .route("/v1/timetable/score", post(score_handler))
        .route("/v1/timetable/rotate", post(rotate_handler))
        .route("/v1/constraints", get(constraints_handler))
        .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS))
}

/// Bind address from `TIMETABLE_BIND_ADDR`, falling back to the default.
pub fn bind_addr() -> SocketAddr {
    let fallback = || {
        DEFAULT_BIND_ADDR
            .parse()
            .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 8080)))
    };
    match env::var("TIMETABLE_BIND_ADDR") {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Ignoring invalid TIMETABLE_BIND_ADDR {raw:?}: {e}");
            fallback()
        }),
        Err(_) => fallback(),
    }
}

pub async fn run_server() -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr()).await?;

    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, router()).await
}
