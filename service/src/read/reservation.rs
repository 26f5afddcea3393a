//! [`Reservation`] read model definitions.

use std::collections::BTreeMap;

use derive_more::{Deref, Into};

use crate::domain::reservation;
#[cfg(doc)]
use crate::domain::Reservation;

/// Number of [`Reservation`]s in every [`reservation::Status`].
#[derive(Clone, Debug, Deref, Eq, Into, PartialEq)]
pub struct CountsByStatus(BTreeMap<reservation::Status, u64>);

impl CountsByStatus {
    /// Creates new [`CountsByStatus`] out of the provided counted
    /// [`reservation::Status`]es.
    ///
    /// Missing [`reservation::Status`]es are counted as zero.
    #[must_use]
    pub fn new(
        counted: impl IntoIterator<Item = (reservation::Status, u64)>,
    ) -> Self {
        let mut counts = reservation::Status::all()
            .map(|s| (s, 0))
            .collect::<BTreeMap<_, _>>();
        for (status, count) in counted {
            *counts.entry(status).or_default() += count;
        }
        Self(counts)
    }

    /// Returns the number of [`Reservation`]s in the provided
    /// [`reservation::Status`].
    #[must_use]
    pub fn get(&self, status: reservation::Status) -> u64 {
        self.0.get(&status).copied().unwrap_or_default()
    }

    /// Returns the total number of [`Reservation`]s.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }
}

pub mod list {
    //! [`Reservation`]s list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::{
        reservation::{self, guest},
        room, Reservation,
    };

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = Reservation;

    /// Cursor pointing to a specific [`Reservation`] in a list.
    pub type Cursor = reservation::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// [`reservation::Status`] to match exactly.
        pub status: Option<reservation::Status>,

        /// [`guest::Email`] to match exactly.
        pub email: Option<guest::Email>,

        /// ID of the reserved [`Room`] to match.
        ///
        /// [`Room`]: crate::domain::Room
        pub room_id: Option<room::Id>,
    }

    impl Filter {
        /// Checks whether the provided [`Reservation`] passes this
        /// [`Filter`].
        #[must_use]
        pub fn accepts(&self, reservation: &Reservation) -> bool {
            self.status.map_or(true, |s| reservation.status == s)
                && self
                    .email
                    .as_ref()
                    .map_or(true, |e| &reservation.guest.email == e)
                && self.room_id.map_or(true, |id| reservation.room_id == id)
        }
    }

    /// Total count of [`Reservation`]s.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i64);
}
