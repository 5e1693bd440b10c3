//! Postgres backend.
//!
//! Booking takes `SELECT ... FOR NO KEY UPDATE` on the performance row, so
//! bookers of one performance queue behind each other for the
//! check-then-insert step. The `tickets_performance_row_seat_key` unique
//! index rejects any writer that slips past the check anyway.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use super::{BookingStore, CatalogStore, UserStore};
use crate::error::{Error, Result};
use crate::filters::{PerformanceFilter, PlayFilter};
use crate::models::{
    Actor, ActorInput, Genre, GenreInput, Hall, HallInput, NewUser, Performance, PerformanceInput,
    PerformanceSummary, Place, Play, PlayInput, Reservation, Ticket, User, UserChanges,
};
use crate::services::booking::{check_available, check_within_hall};

const PLAY_SELECT: &str = r#"
    SELECT p.id, p.title, p.description,
           ARRAY(SELECT pa.actor_id FROM play_actors pa WHERE pa.play_id = p.id ORDER BY pa.actor_id) AS actors,
           ARRAY(SELECT pg.genre_id FROM play_genres pg WHERE pg.play_id = p.id ORDER BY pg.genre_id) AS genres
    FROM plays p
"#;

const SUMMARY_SELECT: &str = r#"
    SELECT pf.id, pf.play_id, pl.title AS play_title, pf.hall_id, h.name AS hall_name,
           h.rows::BIGINT * h.seats_in_row AS hall_capacity,
           pf.show_time,
           h.rows::BIGINT * h.seats_in_row - COUNT(t.id) AS tickets_available
    FROM performances pf
    JOIN plays pl ON pl.id = pf.play_id
    JOIN halls h ON h.id = pf.hall_id
    LEFT JOIN tickets t ON t.performance_id = pf.id
    WHERE TRUE
"#;

const USER_COLUMNS: &str = "id, email, password_hash, first_name, last_name, is_staff, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/* ---------- helpers ---------- */

// Constraint violations become domain errors, everything else stays Storage
fn map_constraint(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db) = &err {
        let constraint = db.constraint().unwrap_or_default().to_string();
        if db.is_unique_violation() {
            return Error::conflict(match constraint.as_str() {
                "halls_name_key" => "hall with this name already exists",
                "performances_hall_show_time_key" => "hall already has a performance at this time",
                "users_email_key" => "user with this email already exists",
                "tickets_performance_row_seat_key" => "seat already taken",
                _ => "duplicate value",
            });
        }
        if db.is_foreign_key_violation() {
            return Error::validation(match constraint.as_str() {
                "play_actors_actor_id_fkey" => "unknown actor id",
                "play_genres_genre_id_fkey" => "unknown genre id",
                "performances_play_id_fkey" => "unknown play id",
                "performances_hall_id_fkey" => "unknown hall id",
                _ => "referenced record does not exist",
            });
        }
    }
    Error::Storage(err)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn escape_like(value: &str) -> String {
    value.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn dedup(ids: &[i64]) -> Vec<i64> {
    ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect()
}

fn split_places(places: &[Place]) -> (Vec<i32>, Vec<i32>) {
    places.iter().map(|p| (p.row, p.seat)).unzip()
}

fn deleted(entity: &'static str, id: i64, rows_affected: u64) -> Result<()> {
    if rows_affected == 0 {
        Err(Error::not_found(entity, id))
    } else {
        Ok(())
    }
}

/// Requested places that already have a ticket for the performance.
async fn clashing_places<'e>(
    executor: impl PgExecutor<'e>,
    performance_id: i64,
    places: &[Place],
) -> Result<Vec<Place>> {
    let (rows, seats) = split_places(places);
    let clashing = sqlx::query_as::<_, Place>(
        r#"
        SELECT t.row, t.seat
        FROM tickets t
        JOIN UNNEST($2::INT4[], $3::INT4[]) AS req(r, s) ON req.r = t.row AND req.s = t.seat
        WHERE t.performance_id = $1
        ORDER BY t.row, t.seat
        "#,
    )
    .bind(performance_id)
    .bind(rows)
    .bind(seats)
    .fetch_all(executor)
    .await?;
    Ok(clashing)
}

async fn replace_play_links(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    play_id: i64,
    actors: &[i64],
    genres: &[i64],
) -> Result<()> {
    sqlx::query("DELETE FROM play_actors WHERE play_id = $1")
        .bind(play_id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM play_genres WHERE play_id = $1")
        .bind(play_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("INSERT INTO play_actors (play_id, actor_id) SELECT $1, UNNEST($2::BIGINT[])")
        .bind(play_id)
        .bind(actors)
        .execute(&mut **tx)
        .await
        .map_err(map_constraint)?;
    sqlx::query("INSERT INTO play_genres (play_id, genre_id) SELECT $1, UNNEST($2::BIGINT[])")
        .bind(play_id)
        .bind(genres)
        .execute(&mut **tx)
        .await
        .map_err(map_constraint)?;
    Ok(())
}

impl PgStore {
    async fn summaries(&self, filter: &PerformanceFilter, ids: Option<&[i64]>) -> Result<Vec<PerformanceSummary>> {
        let mut qb = QueryBuilder::<Postgres>::new(SUMMARY_SELECT);
        if let Some(date) = filter.date {
            qb.push(" AND (pf.show_time AT TIME ZONE 'UTC')::DATE = ").push_bind(date);
        }
        if let Some(play_id) = filter.play_id {
            qb.push(" AND pf.play_id = ").push_bind(play_id);
        }
        if let Some(ids) = ids {
            qb.push(" AND pf.id = ANY(").push_bind(ids.to_vec()).push(")");
        }
        qb.push(" GROUP BY pf.id, pl.title, h.id ORDER BY pf.show_time DESC, pf.id");

        let rows = qb
            .build_query_as::<PerformanceSummary>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn tickets_for(&self, reservation_ids: &[i64]) -> Result<BTreeMap<i64, Vec<Ticket>>> {
        let tickets = sqlx::query_as::<_, Ticket>(
            r#"
            SELECT id, reservation_id, performance_id, row, seat
            FROM tickets
            WHERE reservation_id = ANY($1)
            ORDER BY row, seat
            "#,
        )
        .bind(reservation_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut grouped: BTreeMap<i64, Vec<Ticket>> = BTreeMap::new();
        for ticket in tickets {
            grouped.entry(ticket.reservation_id).or_default().push(ticket);
        }
        Ok(grouped)
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: i64,
    user_id: i64,
    created_at: DateTime<Utc>,
}

/* ---------- CATALOG ---------- */

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_halls(&self) -> Result<Vec<Hall>> {
        let halls = sqlx::query_as::<_, Hall>("SELECT id, name, rows, seats_in_row FROM halls ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(halls)
    }

    async fn get_hall(&self, id: i64) -> Result<Option<Hall>> {
        let hall = sqlx::query_as::<_, Hall>("SELECT id, name, rows, seats_in_row FROM halls WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(hall)
    }

    async fn create_hall(&self, input: &HallInput) -> Result<Hall> {
        sqlx::query_as::<_, Hall>(
            "INSERT INTO halls (name, rows, seats_in_row) VALUES ($1, $2, $3)
             RETURNING id, name, rows, seats_in_row",
        )
        .bind(&input.name)
        .bind(input.rows)
        .bind(input.seats_in_row)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint)
    }

    async fn update_hall(&self, id: i64, input: &HallInput) -> Result<Hall> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Hall>(
            "SELECT id, name, rows, seats_in_row FROM halls WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::not_found("hall", id))?;

        if !current.same_dimensions(input) {
            let referenced = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM performances WHERE hall_id = $1)",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            if referenced {
                return Err(Error::conflict("hall dimensions cannot change once performances are scheduled"));
            }
        }

        let hall = sqlx::query_as::<_, Hall>(
            "UPDATE halls SET name = $2, rows = $3, seats_in_row = $4 WHERE id = $1
             RETURNING id, name, rows, seats_in_row",
        )
        .bind(id)
        .bind(&input.name)
        .bind(input.rows)
        .bind(input.seats_in_row)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_constraint)?;

        tx.commit().await?;
        Ok(hall)
    }

    async fn delete_hall(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM halls WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        deleted("hall", id, res.rows_affected())
    }

    async fn list_actors(&self) -> Result<Vec<Actor>> {
        let actors = sqlx::query_as::<_, Actor>(
            "SELECT id, first_name, last_name FROM actors ORDER BY first_name, id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(actors)
    }

    async fn get_actor(&self, id: i64) -> Result<Option<Actor>> {
        let actor = sqlx::query_as::<_, Actor>("SELECT id, first_name, last_name FROM actors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(actor)
    }

    async fn actors_by_ids(&self, ids: &[i64]) -> Result<Vec<Actor>> {
        let actors = sqlx::query_as::<_, Actor>(
            "SELECT id, first_name, last_name FROM actors WHERE id = ANY($1) ORDER BY first_name, id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(actors)
    }

    async fn create_actor(&self, input: &ActorInput) -> Result<Actor> {
        let actor = sqlx::query_as::<_, Actor>(
            "INSERT INTO actors (first_name, last_name) VALUES ($1, $2) RETURNING id, first_name, last_name",
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(actor)
    }

    async fn update_actor(&self, id: i64, input: &ActorInput) -> Result<Actor> {
        sqlx::query_as::<_, Actor>(
            "UPDATE actors SET first_name = $2, last_name = $3 WHERE id = $1
             RETURNING id, first_name, last_name",
        )
        .bind(id)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found("actor", id))
    }

    async fn delete_actor(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM actors WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        deleted("actor", id, res.rows_affected())
    }

    async fn list_genres(&self) -> Result<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres ORDER BY name, id")
            .fetch_all(&self.pool)
            .await?;
        Ok(genres)
    }

    async fn get_genre(&self, id: i64) -> Result<Option<Genre>> {
        let genre = sqlx::query_as::<_, Genre>("SELECT id, name FROM genres WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(genre)
    }

    async fn genres_by_ids(&self, ids: &[i64]) -> Result<Vec<Genre>> {
        let genres = sqlx::query_as::<_, Genre>(
            "SELECT id, name FROM genres WHERE id = ANY($1) ORDER BY name, id",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(genres)
    }

    async fn create_genre(&self, input: &GenreInput) -> Result<Genre> {
        let genre = sqlx::query_as::<_, Genre>("INSERT INTO genres (name) VALUES ($1) RETURNING id, name")
            .bind(&input.name)
            .fetch_one(&self.pool)
            .await?;
        Ok(genre)
    }

    async fn update_genre(&self, id: i64, input: &GenreInput) -> Result<Genre> {
        sqlx::query_as::<_, Genre>("UPDATE genres SET name = $2 WHERE id = $1 RETURNING id, name")
            .bind(id)
            .bind(&input.name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| Error::not_found("genre", id))
    }

    async fn delete_genre(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM genres WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        deleted("genre", id, res.rows_affected())
    }

    async fn list_plays(&self, filter: &PlayFilter) -> Result<Vec<Play>> {
        let mut qb = QueryBuilder::<Postgres>::new(PLAY_SELECT);
        qb.push(" WHERE TRUE");
        if let Some(title) = &filter.title {
            qb.push(" AND p.title ILIKE ").push_bind(format!("%{}%", escape_like(title)));
        }
        if let Some(genres) = &filter.genres {
            qb.push(" AND EXISTS (SELECT 1 FROM play_genres g WHERE g.play_id = p.id AND g.genre_id = ANY(")
                .push_bind(genres.iter().copied().collect::<Vec<i64>>())
                .push("))");
        }
        if let Some(actors) = &filter.actors {
            qb.push(" AND EXISTS (SELECT 1 FROM play_actors a WHERE a.play_id = p.id AND a.actor_id = ANY(")
                .push_bind(actors.iter().copied().collect::<Vec<i64>>())
                .push("))");
        }
        qb.push(" ORDER BY p.title, p.id");

        let plays = qb.build_query_as::<Play>().fetch_all(&self.pool).await?;
        Ok(plays)
    }

    async fn get_play(&self, id: i64) -> Result<Option<Play>> {
        let play = sqlx::query_as::<_, Play>(&format!("{PLAY_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(play)
    }

    async fn create_play(&self, input: &PlayInput) -> Result<Play> {
        let actors = dedup(&input.actors);
        let genres = dedup(&input.genres);
        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO plays (title, description) VALUES ($1, $2) RETURNING id",
        )
        .bind(&input.title)
        .bind(&input.description)
        .fetch_one(&mut *tx)
        .await?;

        replace_play_links(&mut tx, id, &actors, &genres).await?;
        tx.commit().await?;

        Ok(Play { id, title: input.title.clone(), description: input.description.clone(), actors, genres })
    }

    async fn update_play(&self, id: i64, input: &PlayInput) -> Result<Play> {
        let actors = dedup(&input.actors);
        let genres = dedup(&input.genres);
        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, i64>(
            "UPDATE plays SET title = $2, description = $3 WHERE id = $1 RETURNING id",
        )
        .bind(id)
        .bind(&input.title)
        .bind(&input.description)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::not_found("play", id))?;

        replace_play_links(&mut tx, id, &actors, &genres).await?;
        tx.commit().await?;

        Ok(Play { id, title: input.title.clone(), description: input.description.clone(), actors, genres })
    }

    async fn delete_play(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM plays WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        deleted("play", id, res.rows_affected())
    }

    async fn list_performances(&self, filter: &PerformanceFilter) -> Result<Vec<PerformanceSummary>> {
        self.summaries(filter, None).await
    }

    async fn performance_summaries(&self, ids: &[i64]) -> Result<Vec<PerformanceSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.summaries(&PerformanceFilter::default(), Some(ids)).await
    }

    async fn get_performance(&self, id: i64) -> Result<Option<Performance>> {
        let performance = sqlx::query_as::<_, Performance>(
            "SELECT id, play_id, hall_id, show_time FROM performances WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(performance)
    }

    async fn create_performance(&self, input: &PerformanceInput) -> Result<Performance> {
        sqlx::query_as::<_, Performance>(
            "INSERT INTO performances (play_id, hall_id, show_time) VALUES ($1, $2, $3)
             RETURNING id, play_id, hall_id, show_time",
        )
        .bind(input.play_id)
        .bind(input.hall_id)
        .bind(input.show_time)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint)
    }

    async fn update_performance(&self, id: i64, input: &PerformanceInput) -> Result<Performance> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, Performance>(
            "SELECT id, play_id, hall_id, show_time FROM performances WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::not_found("performance", id))?;

        if current.hall_id != input.hall_id {
            let sold = sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS(SELECT 1 FROM tickets WHERE performance_id = $1)",
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
            if sold {
                return Err(Error::conflict("performance with sold tickets cannot move to another hall"));
            }
        }

        let performance = sqlx::query_as::<_, Performance>(
            "UPDATE performances SET play_id = $2, hall_id = $3, show_time = $4 WHERE id = $1
             RETURNING id, play_id, hall_id, show_time",
        )
        .bind(id)
        .bind(input.play_id)
        .bind(input.hall_id)
        .bind(input.show_time)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_constraint)?;

        tx.commit().await?;
        Ok(performance)
    }

    async fn delete_performance(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM performances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        deleted("performance", id, res.rows_affected())
    }

    async fn taken_places(&self, performance_id: i64) -> Result<Vec<Place>> {
        let places = sqlx::query_as::<_, Place>(
            "SELECT row, seat FROM tickets WHERE performance_id = $1 ORDER BY row, seat",
        )
        .bind(performance_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(places)
    }
}

/* ---------- BOOKING ---------- */

#[async_trait]
impl BookingStore for PgStore {
    async fn create_reservation(
        &self,
        user_id: i64,
        performance_id: i64,
        places: &[Place],
    ) -> Result<Reservation> {
        let mut tx = self.pool.begin().await?;

        // 1) Lock the performance; concurrent bookers of it wait here
        let hall = sqlx::query_as::<_, Hall>(
            r#"
            SELECT h.id, h.name, h.rows, h.seats_in_row
            FROM performances p
            JOIN halls h ON h.id = p.hall_id
            WHERE p.id = $1
            FOR NO KEY UPDATE OF p
            "#,
        )
        .bind(performance_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| Error::not_found("performance", performance_id))?;

        // 2) Seats inside the hall
        check_within_hall(&hall, places)?;

        // 3) Seats still free
        let taken = clashing_places(&mut *tx, performance_id, places).await?;
        check_available(&taken, places)?;

        // 4) Reservation + tickets
        let row = sqlx::query_as::<_, ReservationRow>(
            "INSERT INTO reservations (user_id) VALUES ($1) RETURNING id, user_id, created_at",
        )
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_constraint)?;

        let (rows, seats) = split_places(places);
        let inserted = sqlx::query_as::<_, Ticket>(
            r#"
            INSERT INTO tickets (reservation_id, performance_id, row, seat)
            SELECT $1, $2, req.r, req.s
            FROM UNNEST($3::INT4[], $4::INT4[]) AS req(r, s)
            RETURNING id, reservation_id, performance_id, row, seat
            "#,
        )
        .bind(row.id)
        .bind(performance_id)
        .bind(rows)
        .bind(seats)
        .fetch_all(&mut *tx)
        .await;

        let mut tickets = match inserted {
            Ok(tickets) => tickets,
            Err(e) if is_unique_violation(&e) => {
                // Rolled back on drop; report what is actually taken now
                drop(tx);
                warn!("Unique index rejected tickets for performance {}", performance_id);
                let taken = clashing_places(&self.pool, performance_id, places).await?;
                let reported = if taken.is_empty() { places.to_vec() } else { taken };
                return Err(Error::seats_taken(reported));
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;
        debug!("Committed reservation {} with {} tickets", row.id, tickets.len());

        tickets.sort_by_key(Ticket::place);
        Ok(Reservation { id: row.id, user_id: row.user_id, created_at: row.created_at, tickets })
    }

    async fn list_reservations(&self, user_id: i64) -> Result<Vec<Reservation>> {
        let rows = sqlx::query_as::<_, ReservationRow>(
            "SELECT id, user_id, created_at FROM reservations WHERE user_id = $1
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut tickets = self.tickets_for(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|r| Reservation {
                id: r.id,
                user_id: r.user_id,
                created_at: r.created_at,
                tickets: tickets.remove(&r.id).unwrap_or_default(),
            })
            .collect())
    }

    async fn get_reservation(&self, id: i64) -> Result<Option<Reservation>> {
        let row = sqlx::query_as::<_, ReservationRow>(
            "SELECT id, user_id, created_at FROM reservations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut tickets = self.tickets_for(&[row.id]).await?;
        Ok(Some(Reservation {
            id: row.id,
            user_id: row.user_id,
            created_at: row.created_at,
            tickets: tickets.remove(&row.id).unwrap_or_default(),
        }))
    }

    async fn delete_reservation(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        deleted("reservation", id, res.rows_affected())
    }
}

/* ---------- USERS ---------- */

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (email, password_hash, first_name, last_name, is_staff)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.is_staff)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn update_user(&self, id: i64, changes: &UserChanges) -> Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users
             SET password_hash = COALESCE($2, password_hash),
                 first_name = COALESCE($3, first_name),
                 last_name = COALESCE($4, last_name)
             WHERE id = $1
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.password_hash.as_deref())
        .bind(changes.first_name.as_deref())
        .bind(changes.last_name.as_deref())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| Error::not_found("user", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_patterns_are_escaped() {
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
    }

    #[test]
    fn places_split_into_parallel_arrays() {
        let (rows, seats) = split_places(&[Place::new(1, 2), Place::new(3, 4)]);
        assert_eq!(rows, vec![1, 3]);
        assert_eq!(seats, vec![2, 4]);
    }

    #[test]
    fn link_ids_are_sorted_and_unique() {
        assert_eq!(dedup(&[3, 1, 3, 2]), vec![1, 2, 3]);
    }

    #[test]
    fn non_database_errors_stay_storage_errors() {
        assert!(matches!(map_constraint(sqlx::Error::RowNotFound), Error::Storage(_)));
    }
}
