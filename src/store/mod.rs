//! Persistence seams.
//!
//! [`postgres::PgStore`] is the production backend. [`memory::MemoryStore`]
//! implements the same traits for tests and local runs without a database.

use async_trait::async_trait;

use crate::error::Result;
use crate::filters::{PerformanceFilter, PlayFilter};
use crate::models::{
    Actor, ActorInput, Genre, GenreInput, Hall, HallInput, NewUser, Performance, PerformanceInput,
    PerformanceSummary, Place, Play, PlayInput, Reservation, User, UserChanges,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Halls, actors, genres, plays and performances.
///
/// `update_*` and `delete_*` fail with NotFound for an unknown id. Unknown
/// referenced ids (a play's actors, a performance's hall) are a Validation
/// error.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_halls(&self) -> Result<Vec<Hall>>;
    async fn get_hall(&self, id: i64) -> Result<Option<Hall>>;
    async fn create_hall(&self, input: &HallInput) -> Result<Hall>;
    /// Changing rows or seats_in_row of a hall that performances reference
    /// is a Conflict.
    async fn update_hall(&self, id: i64, input: &HallInput) -> Result<Hall>;
    async fn delete_hall(&self, id: i64) -> Result<()>;

    async fn list_actors(&self) -> Result<Vec<Actor>>;
    async fn get_actor(&self, id: i64) -> Result<Option<Actor>>;
    async fn actors_by_ids(&self, ids: &[i64]) -> Result<Vec<Actor>>;
    async fn create_actor(&self, input: &ActorInput) -> Result<Actor>;
    async fn update_actor(&self, id: i64, input: &ActorInput) -> Result<Actor>;
    async fn delete_actor(&self, id: i64) -> Result<()>;

    async fn list_genres(&self) -> Result<Vec<Genre>>;
    async fn get_genre(&self, id: i64) -> Result<Option<Genre>>;
    async fn genres_by_ids(&self, ids: &[i64]) -> Result<Vec<Genre>>;
    async fn create_genre(&self, input: &GenreInput) -> Result<Genre>;
    async fn update_genre(&self, id: i64, input: &GenreInput) -> Result<Genre>;
    async fn delete_genre(&self, id: i64) -> Result<()>;

    async fn list_plays(&self, filter: &PlayFilter) -> Result<Vec<Play>>;
    async fn get_play(&self, id: i64) -> Result<Option<Play>>;
    async fn create_play(&self, input: &PlayInput) -> Result<Play>;
    async fn update_play(&self, id: i64, input: &PlayInput) -> Result<Play>;
    async fn delete_play(&self, id: i64) -> Result<()>;

    async fn list_performances(&self, filter: &PerformanceFilter) -> Result<Vec<PerformanceSummary>>;
    async fn performance_summaries(&self, ids: &[i64]) -> Result<Vec<PerformanceSummary>>;
    async fn get_performance(&self, id: i64) -> Result<Option<Performance>>;
    /// A second performance in the same hall at the same instant is a Conflict.
    async fn create_performance(&self, input: &PerformanceInput) -> Result<Performance>;
    /// Moving a performance that already sold tickets to another hall is a
    /// Conflict.
    async fn update_performance(&self, id: i64, input: &PerformanceInput) -> Result<Performance>;
    async fn delete_performance(&self, id: i64) -> Result<()>;
    /// Sold seats of a performance, sorted by row then seat.
    async fn taken_places(&self, performance_id: i64) -> Result<Vec<Place>>;
}

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Validates and commits a reservation as one atomic unit:
    ///
    /// 1. the performance exists, else NotFound;
    /// 2. [`check_within_hall`](crate::services::booking::check_within_hall)
    ///    passes for the performance's hall;
    /// 3. [`check_available`](crate::services::booking::check_available)
    ///    passes against the seats already sold;
    /// 4. one reservation and one ticket per place are written, or nothing is.
    ///
    /// The (performance, row, seat) uniqueness must also hold at the storage
    /// level so that concurrent callers cannot both pass step 3.
    async fn create_reservation(
        &self,
        user_id: i64,
        performance_id: i64,
        places: &[Place],
    ) -> Result<Reservation>;

    /// Newest first.
    async fn list_reservations(&self, user_id: i64) -> Result<Vec<Reservation>>;
    async fn get_reservation(&self, id: i64) -> Result<Option<Reservation>>;
    /// Tickets go with the reservation.
    async fn delete_reservation(&self, id: i64) -> Result<()>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Duplicate email is a Conflict.
    async fn create_user(&self, user: &NewUser) -> Result<User>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_user(&self, id: i64) -> Result<Option<User>>;
    async fn update_user(&self, id: i64, changes: &UserChanges) -> Result<User>;
}

pub trait Store: CatalogStore + BookingStore + UserStore {}

impl<T: CatalogStore + BookingStore + UserStore> Store for T {}
