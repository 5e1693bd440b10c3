use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Hall {
    pub id: i64,
    pub name: String,
    pub rows: i32,
    pub seats_in_row: i32,
}

impl Hall {
    pub fn capacity(&self) -> i64 {
        i64::from(self.rows) * i64::from(self.seats_in_row)
    }

    pub fn same_dimensions(&self, input: &HallInput) -> bool {
        self.rows == input.rows && self.seats_in_row == input.seats_in_row
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct HallInput {
    #[validate(length(min = 1, max = 63))]
    pub name: String,
    #[validate(range(min = 1))]
    pub rows: i32,
    #[validate(range(min = 1))]
    pub seats_in_row: i32,
}
