//! Favorite types

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of catalog item a favorite points at.
///
/// Stored as the literal strings `"planet"` and `"people"`. The target is
/// not a store-level foreign key; every lookup goes through an explicit
/// match on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteKind {
    Planet,
    People,
}

impl std::fmt::Display for FavoriteKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FavoriteKind::Planet => write!(f, "planet"),
            FavoriteKind::People => write!(f, "people"),
        }
    }
}

/// Error returned when a string does not name a favorite kind.
#[derive(Debug, Error)]
#[error("unknown favorite kind: {0}")]
pub struct UnknownFavoriteKind(pub String);

impl std::str::FromStr for FavoriteKind {
    type Err = UnknownFavoriteKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planet" => Ok(FavoriteKind::Planet),
            "people" => Ok(FavoriteKind::People),
            other => Err(UnknownFavoriteKind(other.to_string())),
        }
    }
}

/// A join record linking a user to a catalog item they marked as preferred.
///
/// `item_id` identifies a person or planet depending on `kind`; a favorite
/// whose target has been deleted is tolerated and dropped at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "item_type")]
    pub kind: FavoriteKind,
    pub item_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn kind_round_trips_through_stored_strings() {
        for kind in [FavoriteKind::Planet, FavoriteKind::People] {
            let tag = kind.to_string();
            assert_eq!(FavoriteKind::from_str(&tag).unwrap(), kind);
        }
        assert!(FavoriteKind::from_str("starship").is_err());
    }

    #[test]
    fn favorite_serializes_with_item_type_tag() {
        let fav = Favorite {
            id: 7,
            user_id: 1,
            kind: FavoriteKind::People,
            item_id: 3,
        };
        let value = serde_json::to_value(&fav).unwrap();
        assert_eq!(value["item_type"], "people");
        assert_eq!(value["item_id"], 3);
    }
}
