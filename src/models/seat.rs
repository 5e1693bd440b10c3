use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// A (row, seat) coordinate inside a hall. Both parts are 1-based.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromRow, Serialize, Deserialize,
)]
pub struct Place {
    pub row: i32,
    pub seat: i32,
}

impl Place {
    pub const fn new(row: i32, seat: i32) -> Self {
        Self { row, seat }
    }
}

impl fmt::Display for Place {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.seat)
    }
}

/// Comma separated rendering used in error messages.
pub fn format_places(places: &[Place]) -> String {
    places
        .iter()
        .map(Place::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
