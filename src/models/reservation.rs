use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{Place, PerformanceSummary};

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    pub reservation_id: i64,
    pub performance_id: i64,
    pub row: i32,
    pub seat: i32,
}

impl Ticket {
    pub fn place(&self) -> Place {
        Place::new(self.row, self.seat)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub tickets: Vec<Ticket>,
}

// POST /api/theatre/reservations
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReservationInput {
    #[validate(range(min = 1))]
    pub performance_id: i64,
    #[validate(length(min = 1, message = "at least one seat is required"))]
    pub seats: Vec<Place>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketView {
    pub id: i64,
    pub row: i32,
    pub seat: i32,
    pub performance: PerformanceSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReservationView {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub tickets: Vec<TicketView>,
}
