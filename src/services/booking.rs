//! booking.rs
//!
//! Reservation and ticket booking.
//!
//! A reservation is created together with its tickets or not at all. The
//! checks run in this order and each has its own error:
//! 1. request shape (non-empty, no seat twice) -> Validation
//! 2. performance exists -> NotFound
//! 3. every seat inside the hall's seat map -> Validation
//! 4. no seat already sold -> Conflict
//!
//! Steps 2-4 and the commit run inside the store, in one transaction.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::models::{format_places, Hall, Place, Reservation, ReservationView, TicketView};
use crate::policy::{self, Resource};
use crate::seat_map::SeatMap;
use crate::store::Store;

// --- Checks shared by every store ---

pub fn check_request(places: &[Place]) -> Result<()> {
    if places.is_empty() {
        return Err(Error::validation("at least one seat is required"));
    }

    let mut seen = BTreeSet::new();
    let repeated: BTreeSet<Place> = places.iter().copied().filter(|p| !seen.insert(*p)).collect();
    if !repeated.is_empty() {
        let repeated: Vec<Place> = repeated.into_iter().collect();
        return Err(Error::Validation {
            message: format!("seats requested more than once: {}", format_places(&repeated)),
            places: repeated,
        });
    }
    Ok(())
}

pub fn check_within_hall(hall: &Hall, places: &[Place]) -> Result<()> {
    let outside = SeatMap::for_hall(hall)?.outside(places);
    if outside.is_empty() {
        Ok(())
    } else {
        Err(Error::seats_out_of_range(outside))
    }
}

/// `taken` is whatever the store knows to be sold; only the requested
/// places that clash are reported.
pub fn check_available<'a>(taken: impl IntoIterator<Item = &'a Place>, places: &[Place]) -> Result<()> {
    let taken: BTreeSet<Place> = taken.into_iter().copied().collect();
    let clashing: Vec<Place> = places.iter().copied().filter(|p| taken.contains(p)).collect();
    if clashing.is_empty() {
        Ok(())
    } else {
        Err(Error::seats_taken(clashing))
    }
}

// --- Service ---

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn Store>,
}

impl BookingService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Books `places` for `performance_id` on behalf of the caller. Identity
    /// is trusted as given.
    pub async fn create_reservation(
        &self,
        ctx: &RequestContext,
        performance_id: i64,
        places: &[Place],
    ) -> Result<Reservation> {
        check_request(places)?;

        match self.store.create_reservation(ctx.user_id, performance_id, places).await {
            Ok(reservation) => {
                info!(
                    "Reservation {} created for user {}: performance {}, seats {}",
                    reservation.id,
                    ctx.user_id,
                    performance_id,
                    format_places(places)
                );
                Ok(reservation)
            }
            Err(e @ Error::Conflict { .. }) => {
                warn!("Booking conflict for performance {}: {}", performance_id, e);
                Err(e)
            }
            Err(e) => {
                debug!("Booking rejected for performance {}: {}", performance_id, e);
                Err(e)
            }
        }
    }

    /// Only the caller's own reservations, newest first.
    pub async fn list_reservations(&self, ctx: &RequestContext) -> Result<Vec<ReservationView>> {
        let reservations = self.store.list_reservations(ctx.user_id).await?;
        self.attach_performances(reservations).await
    }

    pub async fn get_reservation(&self, ctx: &RequestContext, id: i64) -> Result<ReservationView> {
        let reservation = self.visible_reservation(ctx, id).await?;
        let mut views = self.attach_performances(vec![reservation]).await?;
        views.pop().ok_or_else(|| Error::not_found("reservation", id))
    }

    pub async fn cancel_reservation(&self, ctx: &RequestContext, id: i64) -> Result<()> {
        let reservation = self.visible_reservation(ctx, id).await?;
        policy::ensure_can_modify(Some(ctx), Resource::Reservation { owner_id: reservation.user_id })?;

        self.store.delete_reservation(id).await?;
        info!("Reservation {} cancelled by user {}, {} tickets released", id, ctx.user_id, reservation.tickets.len());
        Ok(())
    }

    // Someone else's reservation looks the same as a missing one
    async fn visible_reservation(&self, ctx: &RequestContext, id: i64) -> Result<Reservation> {
        let reservation = self
            .store
            .get_reservation(id)
            .await?
            .ok_or_else(|| Error::not_found("reservation", id))?;

        if !policy::can_view(Some(ctx), Resource::Reservation { owner_id: reservation.user_id }) {
            return Err(Error::not_found("reservation", id));
        }
        Ok(reservation)
    }

    async fn attach_performances(&self, reservations: Vec<Reservation>) -> Result<Vec<ReservationView>> {
        let ids: Vec<i64> = reservations
            .iter()
            .flat_map(|r| r.tickets.iter().map(|t| t.performance_id))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let summaries: HashMap<i64, _> = self
            .store
            .performance_summaries(&ids)
            .await?
            .into_iter()
            .map(|s| (s.id, s))
            .collect();

        let views = reservations
            .into_iter()
            .map(|reservation| {
                let tickets = reservation
                    .tickets
                    .into_iter()
                    .filter_map(|t| {
                        summaries.get(&t.performance_id).map(|performance| TicketView {
                            id: t.id,
                            row: t.row,
                            seat: t.seat,
                            performance: performance.clone(),
                        })
                    })
                    .collect();
                ReservationView { id: reservation.id, created_at: reservation.created_at, tickets }
            })
            .collect();

        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hall() -> Hall {
        Hall { id: 1, name: "Main".to_string(), rows: 5, seats_in_row: 10 }
    }

    #[test]
    fn empty_request_is_rejected() {
        assert!(matches!(check_request(&[]), Err(Error::Validation { .. })));
    }

    #[test]
    fn repeated_seat_is_named() {
        let err = check_request(&[Place::new(1, 1), Place::new(1, 2), Place::new(1, 1)]).unwrap_err();
        match err {
            Error::Validation { places, .. } => assert_eq!(places, vec![Place::new(1, 1)]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn row_past_the_last_is_out_of_range() {
        let err = check_within_hall(&hall(), &[Place::new(6, 1)]).unwrap_err();
        match err {
            Error::Validation { places, .. } => assert_eq!(places, vec![Place::new(6, 1)]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_seat_is_out_of_range() {
        assert!(check_within_hall(&hall(), &[Place::new(1, 0)]).is_err());
        assert!(check_within_hall(&hall(), &[Place::new(5, 10)]).is_ok());
    }

    #[test]
    fn only_clashing_places_are_reported() {
        let taken = [Place::new(1, 1), Place::new(1, 2)];
        let err = check_available(&taken, &[Place::new(1, 2), Place::new(1, 3)]).unwrap_err();
        match err {
            Error::Conflict { places, .. } => assert_eq!(places, vec![Place::new(1, 2)]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(check_available(&taken, &[Place::new(2, 1)]).is_ok());
    }
}
