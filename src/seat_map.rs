//! Seat map of a hall: the set of valid (row, seat) coordinates.

use std::collections::BTreeSet;

use crate::error::{Error, Result};
use crate::models::{Hall, Place};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeatMap {
    rows: i32,
    seats_in_row: i32,
}

impl SeatMap {
    pub fn new(rows: i32, seats_in_row: i32) -> Result<Self> {
        if rows <= 0 || seats_in_row <= 0 {
            return Err(Error::validation(format!(
                "hall dimensions must be positive, got {} rows x {} seats",
                rows, seats_in_row
            )));
        }
        Ok(Self { rows, seats_in_row })
    }

    pub fn for_hall(hall: &Hall) -> Result<Self> {
        Self::new(hall.rows, hall.seats_in_row)
    }

    pub fn contains(&self, place: Place) -> bool {
        (1..=self.rows).contains(&place.row) && (1..=self.seats_in_row).contains(&place.seat)
    }

    /// Row-major walk over every seat.
    pub fn places(&self) -> impl Iterator<Item = Place> + '_ {
        (1..=self.rows).flat_map(move |row| (1..=self.seats_in_row).map(move |seat| Place::new(row, seat)))
    }

    /// Requested places that fall outside the map, in request order.
    pub fn outside(&self, places: &[Place]) -> Vec<Place> {
        places.iter().copied().filter(|p| !self.contains(*p)).collect()
    }
}

pub fn valid_seats(hall: &Hall) -> Result<BTreeSet<Place>> {
    Ok(SeatMap::for_hall(hall)?.places().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn hall(rows: i32, seats_in_row: i32) -> Hall {
        Hall { id: 1, name: "Main".to_string(), rows, seats_in_row }
    }

    #[test]
    fn rejects_empty_dimensions() {
        assert!(matches!(valid_seats(&hall(0, 10)), Err(Error::Validation { .. })));
        assert!(matches!(valid_seats(&hall(5, -1)), Err(Error::Validation { .. })));
    }

    #[test]
    fn bounds_are_inclusive_and_one_based() {
        let map = SeatMap::new(5, 10).unwrap();
        assert!(map.contains(Place::new(1, 1)));
        assert!(map.contains(Place::new(5, 10)));
        assert!(!map.contains(Place::new(0, 1)));
        assert!(!map.contains(Place::new(6, 1)));
        assert!(!map.contains(Place::new(1, 11)));
    }

    #[test]
    fn outside_keeps_request_order() {
        let map = SeatMap::new(5, 10).unwrap();
        let requested = [Place::new(6, 1), Place::new(1, 1), Place::new(1, 11)];
        assert_eq!(map.outside(&requested), vec![Place::new(6, 1), Place::new(1, 11)]);
    }

    proptest! {
        #[test]
        fn valid_seats_has_rows_times_seats_elements(rows in 1i32..40, seats in 1i32..40) {
            let h = hall(rows, seats);
            let set = valid_seats(&h).unwrap();
            let walked: Vec<Place> = SeatMap::for_hall(&h).unwrap().places().collect();

            prop_assert_eq!(set.len() as i64, h.capacity());
            // no duplicates in the raw walk either
            prop_assert_eq!(walked.len(), set.len());
            prop_assert!(set.iter().all(|p| p.row >= 1 && p.row <= rows && p.seat >= 1 && p.seat <= seats));
        }

        #[test]
        fn contains_agrees_with_valid_seats(rows in 1i32..15, seats in 1i32..15, row in -2i32..20, seat in -2i32..20) {
            let h = hall(rows, seats);
            let map = SeatMap::for_hall(&h).unwrap();
            let place = Place::new(row, seat);
            prop_assert_eq!(map.contains(place), valid_seats(&h).unwrap().contains(&place));
        }
    }
}
