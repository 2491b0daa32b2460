//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification.
//!
//! Handlers resolve the server-local clock once per request and pass it down;
//! the core never reads the time itself.

use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{Duration, Local, NaiveDate, Timelike, Utc};
use momentum_core::domain::{GoalAdjustment, PreferredTime, ReadingSession, StreakHistoryEntry};
use momentum_core::nudge::Nudge;
use momentum_core::ports::PortError;
use momentum_core::{goals, nudge, sessions, settings, streak};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_user_handler,
        get_user_handler,
        log_session_handler,
        list_sessions_handler,
        heatmap_handler,
        goal_suggestion_handler,
        accept_goal_handler,
        dismiss_goal_handler,
        update_settings_handler,
        nudge_handler,
        streak_history_handler,
    ),
    components(
        schemas(
            CreateUserRequest,
            UserResponse,
            LogSessionRequest,
            LogSessionResponse,
            SessionResponse,
            HeatmapDay,
            GoalSuggestionResponse,
            AdjustmentActionRequest,
            AcceptGoalResponse,
            SettingsRequest,
            NudgeResponse,
            StreakHistoryResponse,
        )
    ),
    tags(
        (name = "Momentum API", description = "API endpoints for the daily reading habit tracker.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: String,
    /// Defaults to 20 minutes when omitted.
    pub daily_goal_minutes: Option<u32>,
    /// One of "morning", "afternoon", "evening". Defaults to "evening".
    pub preferred_reading_time: Option<String>,
}

/// The user snapshot returned by the read path. Fetching it recomputes and
/// persists the streak, so `current_streak` is always fresh.
#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub daily_goal_minutes: u32,
    pub preferred_reading_time: String,
    pub shields_available: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub streak_start_date: Option<NaiveDate>,
    pub today_minutes: f64,
    pub shield_message: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct LogSessionRequest {
    pub duration_minutes: f64,
}

#[derive(Serialize, ToSchema)]
pub struct LogSessionResponse {
    pub goal_met: bool,
    pub today_total: f64,
    pub streak: u32,
    pub streak_extended: bool,
    pub shield_message: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: i64,
    pub started_at: chrono::DateTime<Utc>,
    pub duration_minutes: f64,
    pub date: NaiveDate,
}

impl From<ReadingSession> for SessionResponse {
    fn from(session: ReadingSession) -> Self {
        Self {
            id: session.id,
            started_at: session.started_at,
            duration_minutes: session.duration_minutes,
            date: session.date,
        }
    }
}

/// One cell of the trailing 30-day activity heatmap.
#[derive(Serialize, ToSchema)]
pub struct HeatmapDay {
    pub date: NaiveDate,
    pub minutes: f64,
    pub completed: bool,
}

#[derive(Serialize, ToSchema)]
pub struct GoalSuggestionResponse {
    pub id: i64,
    pub old_goal: u32,
    pub new_goal: u32,
    pub reason: String,
    pub suggested_at: chrono::DateTime<Utc>,
}

impl From<GoalAdjustment> for GoalSuggestionResponse {
    fn from(adjustment: GoalAdjustment) -> Self {
        Self {
            id: adjustment.id,
            old_goal: adjustment.old_goal,
            new_goal: adjustment.new_goal,
            reason: adjustment.reason,
            suggested_at: adjustment.suggested_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AdjustmentActionRequest {
    pub adjustment_id: i64,
}

#[derive(Serialize, ToSchema)]
pub struct AcceptGoalResponse {
    pub new_goal: u32,
}

#[derive(Deserialize, ToSchema)]
pub struct SettingsRequest {
    pub daily_goal_minutes: Option<u32>,
    /// One of "morning", "afternoon", "evening".
    pub preferred_reading_time: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct NudgeResponse {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub remaining: u32,
}

impl From<Nudge> for NudgeResponse {
    fn from(nudge: Nudge) -> Self {
        Self {
            kind: nudge.kind.as_str().to_string(),
            message: nudge.message,
            remaining: nudge.remaining_minutes,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct StreakHistoryResponse {
    pub id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub length_days: u32,
}

impl From<StreakHistoryEntry> for StreakHistoryResponse {
    fn from(entry: StreakHistoryEntry) -> Self {
        Self {
            id: entry.id,
            start_date: entry.start_date,
            end_date: entry.end_date,
            length_days: entry.length_days,
        }
    }
}

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Maps a port error onto a response, logging the detail of unexpected
/// failures instead of echoing it to the client.
fn port_error_response(action: &str, err: PortError) -> (StatusCode, String) {
    match err {
        PortError::NotFound(detail) => (StatusCode::NOT_FOUND, detail),
        PortError::InvalidInput(detail) => (StatusCode::BAD_REQUEST, detail),
        PortError::Unexpected(detail) => {
            error!("Failed to {}: {}", action, detail);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to {}", action),
            )
        }
    }
}

fn parse_preference(raw: Option<&str>) -> Result<Option<PreferredTime>, (StatusCode, String)> {
    raw.map(|s| s.parse::<PreferredTime>())
        .transpose()
        .map_err(|e| (StatusCode::BAD_REQUEST, e))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Create a new user.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid name, goal or preference"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn create_user_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let preferred = parse_preference(payload.preferred_reading_time.as_deref())?;

    let user = settings::create_user(
        app_state.db.as_ref(),
        &payload.name,
        payload.daily_goal_minutes.unwrap_or(20),
        preferred.unwrap_or_default(),
    )
    .await
    .map_err(|e| port_error_response("create user", e))?;

    let response = UserResponse {
        id: user.id,
        name: user.name,
        daily_goal_minutes: user.daily_goal_minutes,
        preferred_reading_time: user.preferred_reading_time.to_string(),
        shields_available: user.shields_available,
        current_streak: user.current_streak,
        longest_streak: user.longest_streak,
        streak_start_date: user.streak_start_date,
        today_minutes: 0.0,
        shield_message: None,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// Fetch a user snapshot, recomputing the streak on the way.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    responses(
        (status = 200, description = "User snapshot", body = UserResponse),
        (status = 404, description = "Unknown user"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = i64, Path, description = "The user's id"))
)]
pub async fn get_user_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let db = app_state.db.as_ref();
    let today = Local::now().date_naive();

    let report = streak::compute_streak(db, user_id, today)
        .await
        .map_err(|e| port_error_response("fetch user", e))?;

    let user = db
        .get_user(user_id)
        .await
        .map_err(|e| port_error_response("fetch user", e))?;
    let totals = db
        .get_daily_totals(user_id, Some(today))
        .await
        .map_err(|e| port_error_response("fetch user", e))?;

    let response = UserResponse {
        id: user.id,
        name: user.name,
        daily_goal_minutes: user.daily_goal_minutes,
        preferred_reading_time: user.preferred_reading_time.to_string(),
        shields_available: user.shields_available,
        current_streak: report.length,
        longest_streak: report.longest,
        streak_start_date: user.streak_start_date,
        today_minutes: sessions::round_tenth(totals.get(&today).copied().unwrap_or(0.0)),
        shield_message: report.shield_message,
    };
    Ok(Json(response))
}

/// Log a reading session for today and recompute the streak.
#[utoipa::path(
    post,
    path = "/api/users/{id}/sessions",
    request_body = LogSessionRequest,
    responses(
        (status = 201, description = "Session logged", body = LogSessionResponse),
        (status = 400, description = "Non-positive duration"),
        (status = 404, description = "Unknown user"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = i64, Path, description = "The user's id"))
)]
pub async fn log_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Json(payload): Json<LogSessionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let now = Local::now();

    let logged = sessions::log_session(
        app_state.db.as_ref(),
        user_id,
        Utc::now(),
        now.date_naive(),
        payload.duration_minutes,
    )
    .await
    .map_err(|e| port_error_response("log session", e))?;

    let response = LogSessionResponse {
        goal_met: logged.goal_met,
        today_total: logged.today_total,
        streak: logged.streak.length,
        streak_extended: logged.goal_met,
        shield_message: logged.streak.shield_message,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// List the most recent reading sessions.
#[utoipa::path(
    get,
    path = "/api/users/{id}/sessions",
    responses(
        (status = 200, description = "Most recent sessions, newest first", body = [SessionResponse]),
        (status = 404, description = "Unknown user"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = i64, Path, description = "The user's id"))
)]
pub async fn list_sessions_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let db = app_state.db.as_ref();
    db.get_user(user_id)
        .await
        .map_err(|e| port_error_response("list sessions", e))?;

    let sessions = db
        .recent_sessions(user_id, 50)
        .await
        .map_err(|e| port_error_response("list sessions", e))?;

    let response: Vec<SessionResponse> = sessions.into_iter().map(Into::into).collect();
    Ok(Json(response))
}

/// The trailing 30 days of activity, one cell per calendar day.
#[utoipa::path(
    get,
    path = "/api/users/{id}/heatmap",
    responses(
        (status = 200, description = "30 daily cells, oldest first", body = [HeatmapDay]),
        (status = 404, description = "Unknown user"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = i64, Path, description = "The user's id"))
)]
pub async fn heatmap_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let db = app_state.db.as_ref();
    let user = db
        .get_user(user_id)
        .await
        .map_err(|e| port_error_response("build heatmap", e))?;

    let today = Local::now().date_naive();
    let start = today - Duration::days(29);
    let totals = db
        .get_daily_totals(user_id, Some(start))
        .await
        .map_err(|e| port_error_response("build heatmap", e))?;

    let goal = f64::from(user.daily_goal_minutes);
    let days: Vec<HeatmapDay> = (0..30)
        .map(|offset| {
            let date = start + Duration::days(offset);
            let minutes = sessions::round_tenth(totals.get(&date).copied().unwrap_or(0.0));
            HeatmapDay {
                date,
                minutes,
                completed: minutes >= goal,
            }
        })
        .collect();

    Ok(Json(days))
}

/// The pending goal suggestion, computing a new one when warranted.
#[utoipa::path(
    get,
    path = "/api/users/{id}/goal-suggestion",
    responses(
        (status = 200, description = "Pending or newly created suggestion, or null", body = Option<GoalSuggestionResponse>),
        (status = 404, description = "Unknown user"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = i64, Path, description = "The user's id"))
)]
pub async fn goal_suggestion_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let today = Local::now().date_naive();

    let suggestion = goals::suggest_goal(app_state.db.as_ref(), user_id, today)
        .await
        .map_err(|e| port_error_response("suggest goal", e))?;

    Ok(Json(suggestion.map(GoalSuggestionResponse::from)))
}

/// Accept a goal suggestion, applying its new goal to the user.
#[utoipa::path(
    post,
    path = "/api/users/{id}/goal-suggestion/accept",
    request_body = AdjustmentActionRequest,
    responses(
        (status = 200, description = "Suggestion accepted", body = AcceptGoalResponse),
        (status = 404, description = "Unknown user or adjustment"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = i64, Path, description = "The user's id"))
)]
pub async fn accept_goal_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Json(payload): Json<AdjustmentActionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let new_goal = goals::accept_adjustment(app_state.db.as_ref(), payload.adjustment_id, user_id)
        .await
        .map_err(|e| port_error_response("accept goal suggestion", e))?;

    Ok(Json(AcceptGoalResponse { new_goal }))
}

/// Dismiss a goal suggestion.
#[utoipa::path(
    post,
    path = "/api/users/{id}/goal-suggestion/dismiss",
    request_body = AdjustmentActionRequest,
    responses(
        (status = 204, description = "Suggestion dismissed"),
        (status = 404, description = "Unknown adjustment"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = i64, Path, description = "The user's id"))
)]
pub async fn dismiss_goal_handler(
    State(app_state): State<Arc<AppState>>,
    Path(_user_id): Path<i64>,
    Json(payload): Json<AdjustmentActionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    goals::dismiss_adjustment(app_state.db.as_ref(), payload.adjustment_id)
        .await
        .map_err(|e| port_error_response("dismiss goal suggestion", e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// Update the daily goal and/or preferred reading time.
#[utoipa::path(
    patch,
    path = "/api/users/{id}/settings",
    request_body = SettingsRequest,
    responses(
        (status = 204, description = "Settings updated"),
        (status = 400, description = "Invalid goal or preference"),
        (status = 404, description = "Unknown user"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = i64, Path, description = "The user's id"))
)]
pub async fn update_settings_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
    Json(payload): Json<SettingsRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let preferred = parse_preference(payload.preferred_reading_time.as_deref())?;

    settings::update_settings(
        app_state.db.as_ref(),
        user_id,
        payload.daily_goal_minutes,
        preferred,
    )
    .await
    .map_err(|e| port_error_response("update settings", e))?;

    Ok(StatusCode::NO_CONTENT)
}

/// The reminder appropriate for right now, if any.
#[utoipa::path(
    get,
    path = "/api/users/{id}/nudge",
    responses(
        (status = 200, description = "A nudge, or null when none applies", body = Option<NudgeResponse>),
        (status = 404, description = "Unknown user"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = i64, Path, description = "The user's id"))
)]
pub async fn nudge_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let now = Local::now();

    let nudge = nudge::nudge_for_user(
        app_state.db.as_ref(),
        user_id,
        now.date_naive(),
        now.hour(),
    )
    .await
    .map_err(|e| port_error_response("build nudge", e))?;

    Ok(Json(nudge.map(NudgeResponse::from)))
}

/// Completed streaks, newest first.
#[utoipa::path(
    get,
    path = "/api/users/{id}/streak-history",
    responses(
        (status = 200, description = "Archived streaks", body = [StreakHistoryResponse]),
        (status = 404, description = "Unknown user"),
        (status = 500, description = "Internal server error")
    ),
    params(("id" = i64, Path, description = "The user's id"))
)]
pub async fn streak_history_handler(
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<i64>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let db = app_state.db.as_ref();
    db.get_user(user_id)
        .await
        .map_err(|e| port_error_response("list streak history", e))?;

    let history = db
        .streak_history(user_id)
        .await
        .map_err(|e| port_error_response("list streak history", e))?;

    let response: Vec<StreakHistoryResponse> = history.into_iter().map(Into::into).collect();
    Ok(Json(response))
}
