//! In-memory backend for tests and local runs.
//!
//! All state sits behind one async mutex, so every operation, booking
//! included, is atomic. `ticket_index` plays the role of the unique index on
//! (performance, row, seat).

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::Mutex;

use super::{BookingStore, CatalogStore, UserStore};
use crate::error::{Error, Result};
use crate::filters::{PerformanceFilter, PlayFilter};
use crate::models::{
    Actor, ActorInput, Genre, GenreInput, Hall, HallInput, NewUser, Performance, PerformanceInput,
    PerformanceSummary, Place, Play, PlayInput, Reservation, Ticket, User, UserChanges,
};
use crate::services::booking::{check_available, check_within_hall};

#[derive(Default)]
struct State {
    next_id: i64,
    halls: BTreeMap<i64, Hall>,
    actors: BTreeMap<i64, Actor>,
    genres: BTreeMap<i64, Genre>,
    plays: BTreeMap<i64, Play>,
    performances: BTreeMap<i64, Performance>,
    reservations: BTreeMap<i64, Reservation>,
    ticket_index: HashSet<(i64, Place)>,
    users: BTreeMap<i64, User>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn tickets(&self) -> impl Iterator<Item = &Ticket> {
        self.reservations.values().flat_map(|r| r.tickets.iter())
    }

    fn sold(&self, performance_id: i64) -> usize {
        self.tickets().filter(|t| t.performance_id == performance_id).count()
    }

    fn hall_name_taken(&self, name: &str, except: Option<i64>) -> bool {
        self.halls.values().any(|h| h.name == name && Some(h.id) != except)
    }

    fn hall_busy(&self, hall_id: i64, show_time: chrono::DateTime<Utc>, except: Option<i64>) -> bool {
        self.performances
            .values()
            .any(|p| p.hall_id == hall_id && p.show_time == show_time && Some(p.id) != except)
    }

    fn check_play_links(&self, input: &PlayInput) -> Result<(Vec<i64>, Vec<i64>)> {
        if input.actors.iter().any(|id| !self.actors.contains_key(id)) {
            return Err(Error::validation("unknown actor id"));
        }
        if input.genres.iter().any(|id| !self.genres.contains_key(id)) {
            return Err(Error::validation("unknown genre id"));
        }
        let mut actors = input.actors.clone();
        actors.sort_unstable();
        actors.dedup();
        let mut genres = input.genres.clone();
        genres.sort_unstable();
        genres.dedup();
        Ok((actors, genres))
    }

    fn check_performance_refs(&self, input: &PerformanceInput) -> Result<()> {
        if !self.plays.contains_key(&input.play_id) {
            return Err(Error::validation("unknown play id"));
        }
        if !self.halls.contains_key(&input.hall_id) {
            return Err(Error::validation("unknown hall id"));
        }
        Ok(())
    }

    fn summary(&self, performance: &Performance) -> Option<PerformanceSummary> {
        let play = self.plays.get(&performance.play_id)?;
        let hall = self.halls.get(&performance.hall_id)?;
        Some(PerformanceSummary {
            id: performance.id,
            play_id: play.id,
            play_title: play.title.clone(),
            hall_id: hall.id,
            hall_name: hall.name.clone(),
            hall_capacity: hall.capacity(),
            show_time: performance.show_time,
            tickets_available: hall.capacity() - self.sold(performance.id) as i64,
        })
    }

    // Mirrors ON DELETE CASCADE from performances down to tickets
    fn drop_performances(&mut self, doomed: &[i64]) {
        self.performances.retain(|id, _| !doomed.contains(id));
        for reservation in self.reservations.values_mut() {
            reservation.tickets.retain(|t| !doomed.contains(&t.performance_id));
        }
        self.ticket_index.retain(|(performance_id, _)| !doomed.contains(performance_id));
    }
}

fn sorted_summaries(mut rows: Vec<PerformanceSummary>) -> Vec<PerformanceSummary> {
    rows.sort_by(|a, b| b.show_time.cmp(&a.show_time).then(a.id.cmp(&b.id)));
    rows
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/* ---------- CATALOG ---------- */

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_halls(&self) -> Result<Vec<Hall>> {
        let state = self.state.lock().await;
        let mut halls: Vec<Hall> = state.halls.values().cloned().collect();
        halls.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(halls)
    }

    async fn get_hall(&self, id: i64) -> Result<Option<Hall>> {
        Ok(self.state.lock().await.halls.get(&id).cloned())
    }

    async fn create_hall(&self, input: &HallInput) -> Result<Hall> {
        let mut state = self.state.lock().await;
        if state.hall_name_taken(&input.name, None) {
            return Err(Error::conflict("hall with this name already exists"));
        }
        let hall = Hall {
            id: state.next_id(),
            name: input.name.clone(),
            rows: input.rows,
            seats_in_row: input.seats_in_row,
        };
        state.halls.insert(hall.id, hall.clone());
        Ok(hall)
    }

    async fn update_hall(&self, id: i64, input: &HallInput) -> Result<Hall> {
        let mut state = self.state.lock().await;
        let current = state.halls.get(&id).ok_or_else(|| Error::not_found("hall", id))?;
        if !current.same_dimensions(input) && state.performances.values().any(|p| p.hall_id == id) {
            return Err(Error::conflict("hall dimensions cannot change once performances are scheduled"));
        }
        if state.hall_name_taken(&input.name, Some(id)) {
            return Err(Error::conflict("hall with this name already exists"));
        }
        let hall = Hall { id, name: input.name.clone(), rows: input.rows, seats_in_row: input.seats_in_row };
        state.halls.insert(id, hall.clone());
        Ok(hall)
    }

    async fn delete_hall(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        state.halls.remove(&id).ok_or_else(|| Error::not_found("hall", id))?;
        let doomed: Vec<i64> = state.performances.values().filter(|p| p.hall_id == id).map(|p| p.id).collect();
        state.drop_performances(&doomed);
        Ok(())
    }

    async fn list_actors(&self) -> Result<Vec<Actor>> {
        let state = self.state.lock().await;
        let mut actors: Vec<Actor> = state.actors.values().cloned().collect();
        actors.sort_by(|a, b| a.first_name.cmp(&b.first_name).then(a.id.cmp(&b.id)));
        Ok(actors)
    }

    async fn get_actor(&self, id: i64) -> Result<Option<Actor>> {
        Ok(self.state.lock().await.actors.get(&id).cloned())
    }

    async fn actors_by_ids(&self, ids: &[i64]) -> Result<Vec<Actor>> {
        let state = self.state.lock().await;
        let mut actors: Vec<Actor> = ids.iter().filter_map(|id| state.actors.get(id).cloned()).collect();
        actors.sort_by(|a, b| a.first_name.cmp(&b.first_name).then(a.id.cmp(&b.id)));
        actors.dedup_by_key(|a| a.id);
        Ok(actors)
    }

    async fn create_actor(&self, input: &ActorInput) -> Result<Actor> {
        let mut state = self.state.lock().await;
        let actor = Actor {
            id: state.next_id(),
            first_name: input.first_name.clone(),
            last_name: input.last_name.clone(),
        };
        state.actors.insert(actor.id, actor.clone());
        Ok(actor)
    }

    async fn update_actor(&self, id: i64, input: &ActorInput) -> Result<Actor> {
        let mut state = self.state.lock().await;
        let actor = state.actors.get_mut(&id).ok_or_else(|| Error::not_found("actor", id))?;
        actor.first_name = input.first_name.clone();
        actor.last_name = input.last_name.clone();
        Ok(actor.clone())
    }

    async fn delete_actor(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        state.actors.remove(&id).ok_or_else(|| Error::not_found("actor", id))?;
        for play in state.plays.values_mut() {
            play.actors.retain(|a| *a != id);
        }
        Ok(())
    }

    async fn list_genres(&self) -> Result<Vec<Genre>> {
        let state = self.state.lock().await;
        let mut genres: Vec<Genre> = state.genres.values().cloned().collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(genres)
    }

    async fn get_genre(&self, id: i64) -> Result<Option<Genre>> {
        Ok(self.state.lock().await.genres.get(&id).cloned())
    }

    async fn genres_by_ids(&self, ids: &[i64]) -> Result<Vec<Genre>> {
        let state = self.state.lock().await;
        let mut genres: Vec<Genre> = ids.iter().filter_map(|id| state.genres.get(id).cloned()).collect();
        genres.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        genres.dedup_by_key(|g| g.id);
        Ok(genres)
    }

    async fn create_genre(&self, input: &GenreInput) -> Result<Genre> {
        let mut state = self.state.lock().await;
        let genre = Genre { id: state.next_id(), name: input.name.clone() };
        state.genres.insert(genre.id, genre.clone());
        Ok(genre)
    }

    async fn update_genre(&self, id: i64, input: &GenreInput) -> Result<Genre> {
        let mut state = self.state.lock().await;
        let genre = state.genres.get_mut(&id).ok_or_else(|| Error::not_found("genre", id))?;
        genre.name = input.name.clone();
        Ok(genre.clone())
    }

    async fn delete_genre(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        state.genres.remove(&id).ok_or_else(|| Error::not_found("genre", id))?;
        for play in state.plays.values_mut() {
            play.genres.retain(|g| *g != id);
        }
        Ok(())
    }

    async fn list_plays(&self, filter: &PlayFilter) -> Result<Vec<Play>> {
        let state = self.state.lock().await;
        let mut plays: Vec<Play> = state.plays.values().filter(|p| filter.matches(p)).cloned().collect();
        plays.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(plays)
    }

    async fn get_play(&self, id: i64) -> Result<Option<Play>> {
        Ok(self.state.lock().await.plays.get(&id).cloned())
    }

    async fn create_play(&self, input: &PlayInput) -> Result<Play> {
        let mut state = self.state.lock().await;
        let (actors, genres) = state.check_play_links(input)?;
        let play = Play {
            id: state.next_id(),
            title: input.title.clone(),
            description: input.description.clone(),
            actors,
            genres,
        };
        state.plays.insert(play.id, play.clone());
        Ok(play)
    }

    async fn update_play(&self, id: i64, input: &PlayInput) -> Result<Play> {
        let mut state = self.state.lock().await;
        if !state.plays.contains_key(&id) {
            return Err(Error::not_found("play", id));
        }
        let (actors, genres) = state.check_play_links(input)?;
        let play = Play { id, title: input.title.clone(), description: input.description.clone(), actors, genres };
        state.plays.insert(id, play.clone());
        Ok(play)
    }

    async fn delete_play(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        state.plays.remove(&id).ok_or_else(|| Error::not_found("play", id))?;
        let doomed: Vec<i64> = state.performances.values().filter(|p| p.play_id == id).map(|p| p.id).collect();
        state.drop_performances(&doomed);
        Ok(())
    }

    async fn list_performances(&self, filter: &PerformanceFilter) -> Result<Vec<PerformanceSummary>> {
        let state = self.state.lock().await;
        let rows = state
            .performances
            .values()
            .filter(|p| filter.matches(p))
            .filter_map(|p| state.summary(p))
            .collect();
        Ok(sorted_summaries(rows))
    }

    async fn performance_summaries(&self, ids: &[i64]) -> Result<Vec<PerformanceSummary>> {
        let state = self.state.lock().await;
        let rows = state
            .performances
            .values()
            .filter(|p| ids.contains(&p.id))
            .filter_map(|p| state.summary(p))
            .collect();
        Ok(sorted_summaries(rows))
    }

    async fn get_performance(&self, id: i64) -> Result<Option<Performance>> {
        Ok(self.state.lock().await.performances.get(&id).cloned())
    }

    async fn create_performance(&self, input: &PerformanceInput) -> Result<Performance> {
        let mut state = self.state.lock().await;
        state.check_performance_refs(input)?;
        if state.hall_busy(input.hall_id, input.show_time, None) {
            return Err(Error::conflict("hall already has a performance at this time"));
        }
        let performance = Performance {
            id: state.next_id(),
            play_id: input.play_id,
            hall_id: input.hall_id,
            show_time: input.show_time,
        };
        state.performances.insert(performance.id, performance.clone());
        Ok(performance)
    }

    async fn update_performance(&self, id: i64, input: &PerformanceInput) -> Result<Performance> {
        let mut state = self.state.lock().await;
        let current = state.performances.get(&id).ok_or_else(|| Error::not_found("performance", id))?;
        if current.hall_id != input.hall_id && state.sold(id) > 0 {
            return Err(Error::conflict("performance with sold tickets cannot move to another hall"));
        }
        state.check_performance_refs(input)?;
        if state.hall_busy(input.hall_id, input.show_time, Some(id)) {
            return Err(Error::conflict("hall already has a performance at this time"));
        }
        let performance = Performance { id, play_id: input.play_id, hall_id: input.hall_id, show_time: input.show_time };
        state.performances.insert(id, performance.clone());
        Ok(performance)
    }

    async fn delete_performance(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        if !state.performances.contains_key(&id) {
            return Err(Error::not_found("performance", id));
        }
        state.drop_performances(&[id]);
        Ok(())
    }

    async fn taken_places(&self, performance_id: i64) -> Result<Vec<Place>> {
        let state = self.state.lock().await;
        let mut places: Vec<Place> = state
            .tickets()
            .filter(|t| t.performance_id == performance_id)
            .map(Ticket::place)
            .collect();
        places.sort();
        Ok(places)
    }
}

/* ---------- BOOKING ---------- */

#[async_trait]
impl BookingStore for MemoryStore {
    async fn create_reservation(
        &self,
        user_id: i64,
        performance_id: i64,
        places: &[Place],
    ) -> Result<Reservation> {
        let mut state = self.state.lock().await;

        let performance = state
            .performances
            .get(&performance_id)
            .ok_or_else(|| Error::not_found("performance", performance_id))?;
        let hall = state
            .halls
            .get(&performance.hall_id)
            .ok_or_else(|| Error::not_found("hall", performance.hall_id))?;

        check_within_hall(hall, places)?;

        let taken: Vec<Place> = places
            .iter()
            .copied()
            .filter(|p| state.ticket_index.contains(&(performance_id, *p)))
            .collect();
        check_available(&taken, places)?;

        // Nothing below can fail, so the write is all-or-nothing
        let reservation_id = state.next_id();
        let mut tickets = Vec::with_capacity(places.len());
        for place in places {
            let id = state.next_id();
            state.ticket_index.insert((performance_id, *place));
            tickets.push(Ticket { id, reservation_id, performance_id, row: place.row, seat: place.seat });
        }
        tickets.sort_by_key(Ticket::place);

        let reservation = Reservation { id: reservation_id, user_id, created_at: Utc::now(), tickets };
        state.reservations.insert(reservation_id, reservation.clone());
        Ok(reservation)
    }

    async fn list_reservations(&self, user_id: i64) -> Result<Vec<Reservation>> {
        let state = self.state.lock().await;
        let mut reservations: Vec<Reservation> =
            state.reservations.values().filter(|r| r.user_id == user_id).cloned().collect();
        reservations.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(reservations)
    }

    async fn get_reservation(&self, id: i64) -> Result<Option<Reservation>> {
        Ok(self.state.lock().await.reservations.get(&id).cloned())
    }

    async fn delete_reservation(&self, id: i64) -> Result<()> {
        let mut state = self.state.lock().await;
        let reservation = state.reservations.remove(&id).ok_or_else(|| Error::not_found("reservation", id))?;
        for ticket in &reservation.tickets {
            state.ticket_index.remove(&(ticket.performance_id, ticket.place()));
        }
        Ok(())
    }
}

/* ---------- USERS ---------- */

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(Error::conflict("user with this email already exists"));
        }
        let user = User {
            id: state.next_id(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            is_staff: user.is_staff,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        Ok(self.state.lock().await.users.get(&id).cloned())
    }

    async fn update_user(&self, id: i64, changes: &UserChanges) -> Result<User> {
        let mut state = self.state.lock().await;
        let user = state.users.get_mut(&id).ok_or_else(|| Error::not_found("user", id))?;
        if let Some(hash) = &changes.password_hash {
            user.password_hash = hash.clone();
        }
        if let Some(first_name) = &changes.first_name {
            user.first_name = first_name.clone();
        }
        if let Some(last_name) = &changes.last_name {
            user.last_name = last_name.clone();
        }
        Ok(user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn hall_input(rows: i32, seats_in_row: i32) -> HallInput {
        HallInput { name: "Main".to_string(), rows, seats_in_row }
    }

    async fn scheduled(store: &MemoryStore) -> (Hall, Performance) {
        let hall = store.create_hall(&hall_input(5, 10)).await.unwrap();
        let play = store
            .create_play(&PlayInput { title: "Hamlet".to_string(), ..Default::default() })
            .await
            .unwrap();
        let performance = store
            .create_performance(&PerformanceInput {
                play_id: play.id,
                hall_id: hall.id,
                show_time: Utc.with_ymd_and_hms(2030, 1, 1, 19, 0, 0).unwrap(),
            })
            .await
            .unwrap();
        (hall, performance)
    }

    #[tokio::test]
    async fn hall_dimensions_lock_once_scheduled() {
        let store = MemoryStore::new();
        let (hall, _) = scheduled(&store).await;

        let err = store.update_hall(hall.id, &hall_input(6, 10)).await.unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));

        let renamed = HallInput { name: "Grand".to_string(), ..hall_input(5, 10) };
        assert_eq!(store.update_hall(hall.id, &renamed).await.unwrap().name, "Grand");
    }

    #[tokio::test]
    async fn one_performance_per_hall_and_time() {
        let store = MemoryStore::new();
        let (_, performance) = scheduled(&store).await;

        let err = store
            .create_performance(&PerformanceInput {
                play_id: performance.play_id,
                hall_id: performance.hall_id,
                show_time: performance.show_time,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict { .. }));
    }

    #[tokio::test]
    async fn deleting_a_hall_releases_its_seats() {
        let store = MemoryStore::new();
        let (hall, performance) = scheduled(&store).await;
        store.create_reservation(1, performance.id, &[Place::new(1, 1)]).await.unwrap();

        store.delete_hall(hall.id).await.unwrap();

        assert!(store.get_performance(performance.id).await.unwrap().is_none());
        assert!(store.taken_places(performance.id).await.unwrap().is_empty());
        assert!(store.list_reservations(1).await.unwrap()[0].tickets.is_empty());
    }

    #[tokio::test]
    async fn unknown_genre_is_rejected() {
        let store = MemoryStore::new();
        let err = store
            .create_play(&PlayInput { title: "Hamlet".to_string(), genres: vec![42], ..Default::default() })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
