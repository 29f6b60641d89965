//! Habit HTTP handlers.
//!
//! # Routes
//! - `GET    /api/habits`                 list the caller's habits
//! - `POST   /api/habits`                 create a habit (201)
//! - `PUT    /api/habits/{id}`            partial update
//! - `POST   /api/habits/{id}/increment`  add one completion
//! - `DELETE /api/habits/{id}`            hard delete
//! - `GET    /health`                     liveness check
//!
//! The caller is identified by the `X-User-Id` header, which the upstream
//! auth layer sets after verifying the session.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequestParts, Path, State};
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use studyhub_core::{CreateHabitRequest, Frequency, HabitId, HabitPatch, HabitRecord};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Verified owner id of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner(pub String);

impl<S: Send + Sync> FromRequestParts<S> for Owner {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Self(value.to_string()))
            .ok_or(ApiError::Unauthorized)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateHabitBody {
    pub name: Option<String>,
    pub frequency: Option<Frequency>,
    pub target: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateHabitBody {
    pub name: Option<String>,
    pub frequency: Option<Frequency>,
    pub target: Option<i64>,
    pub progress: Option<i64>,
}

/// Wire shape of a habit record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitView {
    pub id: HabitId,
    pub owner: String,
    pub name: String,
    pub frequency: Frequency,
    pub progress: u32,
    pub target: u32,
    pub period_start: i64,
    pub last_updated: i64,
    pub created_at: i64,
    pub completed: bool,
}

impl From<HabitRecord> for HabitView {
    fn from(record: HabitRecord) -> Self {
        Self {
            completed: record.is_completed(),
            id: record.id,
            owner: record.owner,
            name: record.name,
            frequency: record.frequency,
            progress: record.progress,
            target: record.target,
            period_start: record.period_start,
            last_updated: record.last_updated,
            created_at: record.created_at,
        }
    }
}

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": studyhub_core::core_version(),
    }))
}

pub async fn list_habits(
    State(state): State<AppState>,
    Owner(owner): Owner,
) -> Result<Json<Vec<HabitView>>, ApiError> {
    let habits = state
        .with_habit_service(move |service, now| service.list_for_owner(&owner, now))
        .await?;
    Ok(Json(habits.into_iter().map(HabitView::from).collect()))
}

pub async fn create_habit(
    State(state): State<AppState>,
    Owner(owner): Owner,
    payload: Result<Json<CreateHabitBody>, JsonRejection>,
) -> Result<(StatusCode, Json<HabitView>), ApiError> {
    let Json(body) = payload?;
    let name = body
        .name
        .ok_or_else(|| ApiError::BadRequest("name is required".to_string()))?;
    let request = CreateHabitRequest {
        name,
        frequency: body.frequency,
        target: body.target,
    };

    let record = state
        .with_habit_service(move |service, now| service.create_habit(&owner, &request, now))
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

pub async fn update_habit(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
    payload: Result<Json<UpdateHabitBody>, JsonRejection>,
) -> Result<Json<HabitView>, ApiError> {
    let id = parse_habit_id(&id)?;
    let Json(body) = payload?;
    let patch = HabitPatch {
        name: body.name,
        frequency: body.frequency,
        target: body.target,
        progress: body.progress,
    };

    let record = state
        .with_habit_service(move |service, now| service.update_habit(&owner, id, &patch, now))
        .await?;
    Ok(Json(record.into()))
}

pub async fn increment_habit(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Result<Json<HabitView>, ApiError> {
    let id = parse_habit_id(&id)?;
    let record = state
        .with_habit_service(move |service, now| service.increment_habit(&owner, id, now))
        .await?;
    Ok(Json(record.into()))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Owner(owner): Owner,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_habit_id(&id)?;
    state
        .with_habit_service(move |service, _now| service.delete_habit(&owner, id))
        .await?;
    Ok(Json(json!({ "message": "habit deleted", "id": id })))
}

fn parse_habit_id(raw: &str) -> Result<HabitId, ApiError> {
    HabitId::parse_str(raw.trim())
        .map_err(|_| ApiError::BadRequest(format!("malformed habit id `{raw}`")))
}
