use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use super::{Hall, Place, PlayListItem};

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Performance {
    pub id: i64,
    pub play_id: i64,
    pub hall_id: i64,
    pub show_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PerformanceInput {
    #[validate(range(min = 1))]
    pub play_id: i64,
    #[validate(range(min = 1))]
    pub hall_id: i64,
    pub show_time: DateTime<Utc>,
}

/// Row of the performance listing, with the number of seats still on sale.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct PerformanceSummary {
    pub id: i64,
    pub play_id: i64,
    pub play_title: String,
    pub hall_id: i64,
    pub hall_name: String,
    pub hall_capacity: i64,
    pub show_time: DateTime<Utc>,
    pub tickets_available: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceDetail {
    pub id: i64,
    pub play: PlayListItem,
    pub hall: Hall,
    pub show_time: DateTime<Utc>,
    pub taken_places: Vec<Place>,
}
