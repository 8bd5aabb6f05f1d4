//! Person types

use serde::{Deserialize, Serialize};

/// A person in the reference catalog.
///
/// `homeworld` is free text, not a reference to a [`Planet`](crate::Planet)
/// record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub name: String,
    pub species: Option<String>,
    pub homeworld: Option<String>,
}
