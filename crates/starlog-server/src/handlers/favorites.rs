//! Favorites handlers
//!
//! A favorite's target is resolved through an explicit match on its kind;
//! there is no store-level foreign key to lean on, and a favorite whose
//! target has since been deleted is silently dropped from listings.

use crate::error::ApiError;
use crate::extractors::AuthUser;
use crate::handlers::MessageResponse;
use crate::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use starlog_types::FavoriteKind;

#[derive(Debug, Serialize)]
pub struct FavoriteEntry {
    #[serde(rename = "type")]
    pub kind: FavoriteKind,
    pub id: i64,
    pub name: String,
}

pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<FavoriteEntry>>, ApiError> {
    let favorites = state.db.list_favorites(user.id).await?;

    let mut entries = Vec::with_capacity(favorites.len());
    for fav in favorites {
        let resolved = match fav.kind {
            FavoriteKind::Planet => state
                .db
                .get_planet(fav.item_id)
                .await?
                .map(|p| (p.id, p.name)),
            FavoriteKind::People => state
                .db
                .get_person(fav.item_id)
                .await?
                .map(|p| (p.id, p.name)),
        };
        // Dangling favorites are skipped, not surfaced as errors
        if let Some((id, name)) = resolved {
            entries.push(FavoriteEntry {
                kind: fav.kind,
                id,
                name,
            });
        }
    }

    Ok(Json(entries))
}

pub async fn add(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, item_id)): Path<(String, i64)>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let kind = parse_kind(&kind)?;

    let name = match kind {
        FavoriteKind::Planet => state
            .db
            .get_planet(item_id)
            .await?
            .map(|p| p.name)
            .ok_or_else(|| ApiError::NotFound("Planet not found".to_string()))?,
        FavoriteKind::People => state
            .db
            .get_person(item_id)
            .await?
            .map(|p| p.name)
            .ok_or_else(|| ApiError::NotFound("Person not found".to_string()))?,
    };

    let inserted = state.db.create_favorite(user.id, kind, item_id).await?;
    if inserted.is_none() {
        return Err(ApiError::Conflict(format!(
            "{} already in favorites",
            noun(kind)
        )));
    }

    tracing::info!("{} favorited {} {}", user.email, kind, item_id);

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("{} {} added to favorites", noun(kind), name),
        }),
    ))
}

pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path((kind, item_id)): Path<(String, i64)>,
) -> Result<Json<MessageResponse>, ApiError> {
    let kind = parse_kind(&kind)?;

    let removed = state.db.delete_favorite(user.id, kind, item_id).await?;
    if removed == 0 {
        return Err(ApiError::NotFound(format!(
            "Favorite {} not found",
            lowercase_noun(kind)
        )));
    }

    Ok(Json(MessageResponse {
        message: format!("Favorite {} removed", lowercase_noun(kind)),
    }))
}

fn parse_kind(kind: &str) -> Result<FavoriteKind, ApiError> {
    kind.parse()
        .map_err(|_| ApiError::NotFound(format!("Unknown favorite type: {kind}")))
}

fn noun(kind: FavoriteKind) -> &'static str {
    match kind {
        FavoriteKind::Planet => "Planet",
        FavoriteKind::People => "Person",
    }
}

fn lowercase_noun(kind: FavoriteKind) -> &'static str {
    match kind {
        FavoriteKind::Planet => "planet",
        FavoriteKind::People => "person",
    }
}
