//! Planet handlers
//!
//! Same contract as the person handlers, over `climate` and `terrain`.

use crate::error::ApiError;
use crate::handlers::{missing_data, CreatedResponse, MessageResponse};
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;
use starlog_types::Planet;

const REQUIRED_FIELDS: [&str; 3] = ["name", "climate", "terrain"];

#[derive(Debug, Deserialize)]
struct CreatePlanetRequest {
    name: String,
    climate: Option<String>,
    terrain: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdatePlanetRequest {
    name: Option<String>,
    climate: Option<String>,
    terrain: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Planet>>, ApiError> {
    Ok(Json(state.db.list_planets().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Planet>, ApiError> {
    let planet = state
        .db
        .get_planet(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Planet not found".to_string()))?;
    Ok(Json(planet))
}

pub async fn create(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let req = parse_create(body)?;

    let id = state
        .db
        .create_planet(&req.name, req.climate.as_deref(), req.terrain.as_deref())
        .await?;
    tracing::info!("Created planet {} ({})", id, req.name);

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Planet created".to_string(),
            id,
        }),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Option<Json<Value>>,
) -> Result<Json<MessageResponse>, ApiError> {
    if state.db.get_planet(id).await?.is_none() {
        return Err(ApiError::NotFound("Planet not found".to_string()));
    }

    let req = parse_update(body)?;
    state
        .db
        .update_planet(
            id,
            req.name.as_deref(),
            req.climate.as_deref(),
            req.terrain.as_deref(),
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Planet updated".to_string(),
    }))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    let removed = state.db.delete_planet(id).await?;
    if removed == 0 {
        return Err(ApiError::NotFound("Planet not found".to_string()));
    }

    Ok(Json(MessageResponse {
        message: "Planet deleted".to_string(),
    }))
}

fn parse_create(body: Option<Json<Value>>) -> Result<CreatePlanetRequest, ApiError> {
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

fn parse_update(body: Option<Json<Value>>) -> Result<UpdatePlanetRequest, ApiError> {
    let Json(value) = body.ok_or_else(missing_data)?;
    if value.as_object().map_or(true, |o| o.is_empty()) {
        return Err(missing_data());
    }
    serde_json::from_value(value).map_err(|_| missing_data())
}
