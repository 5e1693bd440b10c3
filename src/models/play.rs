use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Actor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
}

impl Actor {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ActorInput {
    #[validate(length(min = 1, max = 63))]
    pub first_name: String,
    #[validate(length(min = 1, max = 63))]
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GenreInput {
    #[validate(length(min = 1, max = 63))]
    pub name: String,
}

/// A play as stored: actors and genres are referenced by id.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Play {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub actors: Vec<i64>,
    pub genres: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct PlayInput {
    #[validate(length(min = 1, max = 63))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub actors: Vec<i64>,
    #[serde(default)]
    pub genres: Vec<i64>,
}

// List rows show names instead of ids
#[derive(Debug, Clone, Serialize)]
pub struct PlayListItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub actors: Vec<String>,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlayDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub actors: Vec<Actor>,
    pub genres: Vec<Genre>,
}
