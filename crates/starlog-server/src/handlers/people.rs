//! Person handlers
//!
//! Creation requires all three semantic fields in the payload; updates are
//! partial, applying only the fields present and keeping prior values for
//! the rest.

use crate::error::ApiError;
use crate::handlers::{missing_data, CreatedResponse, MessageResponse};
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use starlog_types::Person;

const REQUIRED_FIELDS: [&str; 3] = ["name", "species", "homeworld"];

#[derive(Debug, Deserialize)]
struct CreatePersonRequest {
    name: String,
    species: Option<String>,
    homeworld: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdatePersonRequest {
    name: Option<String>,
    species: Option<String>,
    homeworld: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Person>>, ApiError> {
    Ok(Json(state.db.list_people().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Person>, ApiError> {
    let person = state
        .db
        .get_person(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Person not found".to_string()))?;
    Ok(Json(person))
}

pub async fn create(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let req = parse_create(body)?;

    let id = state
        .db
        .create_person(&req.name, req.species.as_deref(), req.homeworld.as_deref())
        .await?;
    tracing::info!("Created person {} ({})", id, req.name);

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Person created".to_string(),
            id,
        }),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Option<Json<Value>>,
) -> Result<Json<MessageResponse>, ApiError> {
    // Target existence is checked before the payload, so an absent id is a
    // 404 even when the body is also bad.
    if state.db.get_person(id).await?.is_none() {
        return Err(ApiError::NotFound("Person not found".to_string()));
    }

    let req = parse_update(body)?;
    state
        .db
        .update_person(
            id,
            req.name.as_deref(),
            req.species.as_deref(),
            req.homeworld.as_deref(),
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Person updated".to_string(),
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = state.db.delete_person(id).await?;
    if removed == 0 {
        return Err(ApiError::NotFound("Person not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Person deleted".to_string(),
    }))
}

fn parse_create(body: Option<Json<Value>>) -> Result<CreatePersonRequest, ApiError> {
    let Json(value) = body.ok_or_else(missing_data)?;
    let obj = value
        .as_object()
        .filter(|o| !o.is_empty())
        .ok_or_else(missing_data)?;
    if !REQUIRED_FIELDS.iter().all(|k| obj.contains_key(*k)) {
        return Err(missing_data());
    }
    serde_json::from_value(value).map_err(|_| missing_data())
}

fn parse_update(body: Option<Json<Value>>) -> Result<UpdatePersonRequest, ApiError> {
    let Json(value) = body.ok_or_else(missing_data)?;
    if value.as_object().map_or(true, |o| o.is_empty()) {
        return Err(missing_data());
    }
    // An explicit null value is treated like an omitted key: the stored
    // value is kept.
    serde_json::from_value(value).map_err(|_| missing_data())
}
