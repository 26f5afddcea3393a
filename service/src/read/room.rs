//! [`Room`]-related read definitions.

use common::Money;
use derive_more::Deref;

#[cfg(doc)]
use crate::domain::Reservation;
use crate::domain::{
    reservation::{self, Stay},
    room, Room,
};

/// Indicator whether a [`Room`] is booked by an active [`Reservation`]
/// within some [`BookingWindow`].
#[derive(Clone, Copy, Debug, Deref, Eq, Hash, PartialEq)]
pub struct IsBooked(pub bool);

impl PartialEq<bool> for IsBooked {
    fn eq(&self, other: &bool) -> bool {
        self.0 == *other
    }
}

/// [`Stay`] of a [`Room`] to look for overlapping active [`Reservation`]s
/// within.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BookingWindow {
    /// ID of the [`Room`] to check.
    pub room_id: room::Id,

    /// [`Stay`] to check.
    pub stay: Stay,

    /// ID of the [`Reservation`] to ignore, if any.
    pub excluding: Option<reservation::Id>,
}

/// Indicator whether a [`Room`] has any active [`Reservation`]s.
#[derive(Clone, Copy, Debug, Deref, Eq, Hash, PartialEq)]
pub struct HasActiveReservations(pub bool);

impl PartialEq<bool> for HasActiveReservations {
    fn eq(&self, other: &bool) -> bool {
        self.0 == *other
    }
}

/// Filter of non-deleted [`Room`]s.
#[derive(Clone, Debug, Default)]
pub struct Filter {
    /// Part of a [`room::Category`] to look for, ignoring the case.
    pub category: Option<room::Category>,

    /// Minimal price of a night, inclusive.
    pub min_price: Option<Money>,

    /// Maximal price of a night, inclusive.
    pub max_price: Option<Money>,

    /// [`room::Status`]es to accept.
    ///
    /// Empty means any [`room::Status`].
    pub statuses: Vec<room::Status>,

    /// [`Stay`] which must not overlap any active [`Reservation`] of a
    /// [`Room`].
    pub free_within: Option<Stay>,
}

impl Filter {
    /// Checks whether the provided [`Room`] properties pass this [`Filter`],
    /// leaving [`Filter::free_within`] aside.
    #[must_use]
    pub fn accepts(&self, room: &Room) -> bool {
        !room.is_deleted()
            && self
                .category
                .as_ref()
                .map_or(true, |c| room.category.contains(c.as_ref()))
            && self.min_price.map_or(true, |p| room.price_per_night >= p)
            && self.max_price.map_or(true, |p| room.price_per_night <= p)
            && (self.statuses.is_empty()
                || self.statuses.contains(&room.status))
    }
}
