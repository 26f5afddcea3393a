//! In-memory [`Database`] implementation.
//!
//! Every transaction holds the whole [`Storage`] exclusively until it's
//! committed or dropped, so transactions are serializable. Changes of a
//! dropped uncommitted transaction are discarded.

pub mod client;
mod impls;

use std::collections::HashMap;

use derive_more::{Deref, Display, Error as StdError};

use crate::{
    domain::{reservation, room, Reservation, Room},
    infra::database::{RESERVATIONS_NO_OVERLAP, ROOMS_NUMBER_KEY},
};
#[cfg(doc)]
use crate::infra::Database;

pub use self::client::{Connection, NonTx, Tx};

/// Name of the constraint requiring a [`Reservation`] to refer an existing
/// [`Room`].
const RESERVATIONS_ROOM_ID_FKEY: &str = "reservations_room_id_fkey";

/// In-memory [`Database`] client.
#[derive(Clone, Debug, Default, Deref)]
pub struct Memory<T = NonTx>(T);

/// Data kept by a [`Memory`] database.
#[derive(Clone, Debug, Default)]
pub struct Storage {
    /// Stored [`Room`]s, including the deleted ones.
    rooms: HashMap<room::Id, Room>,

    /// Stored [`Reservation`]s.
    reservations: HashMap<reservation::Id, Reservation>,
}

impl Storage {
    /// Inserts or replaces the provided [`Room`].
    ///
    /// # Errors
    ///
    /// If another non-deleted [`Room`] has the same [`room::Number`].
    fn put_room(&mut self, room: Room) -> Result<(), Error> {
        let occupied = !room.is_deleted()
            && self.rooms.values().any(|r| {
                r.id != room.id && !r.is_deleted() && r.number == room.number
            });
        if occupied {
            return Err(Error::UniqueViolation(ROOMS_NUMBER_KEY));
        }

        drop(self.rooms.insert(room.id, room));
        Ok(())
    }

    /// Inserts or replaces the provided [`Reservation`].
    ///
    /// # Errors
    ///
    /// - If the reserved [`Room`] doesn't exist.
    /// - If the [`Reservation`] is active and overlaps another active one of
    ///   the same [`Room`].
    fn put_reservation(
        &mut self,
        reservation: Reservation,
    ) -> Result<(), Error> {
        if !self.rooms.contains_key(&reservation.room_id) {
            return Err(Error::ForeignKeyViolation(RESERVATIONS_ROOM_ID_FKEY));
        }

        let overlaps = reservation.is_active()
            && self.reservations.values().any(|r| {
                r.id != reservation.id
                    && r.room_id == reservation.room_id
                    && r.is_active()
                    && r.stay.overlaps(&reservation.stay)
            });
        if overlaps {
            return Err(Error::ExclusionViolation(RESERVATIONS_NO_OVERLAP));
        }

        drop(self.reservations.insert(reservation.id, reservation));
        Ok(())
    }
}

/// In-memory database [`Error`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("Unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),

    /// Exclusion constraint is violated.
    #[display("Exclusion constraint `{_0}` is violated")]
    ExclusionViolation(#[error(not(source))] &'static str),

    /// Foreign key constraint is violated.
    #[display("Foreign key constraint `{_0}` is violated")]
    ForeignKeyViolation(#[error(not(source))] &'static str),

    /// Transaction has been committed already.
    #[display("Transaction is finished already")]
    TxFinished,
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |n| n == *c),
            Self::ExclusionViolation(..)
            | Self::ForeignKeyViolation(..)
            | Self::TxFinished => false,
        }
    }

    /// Checks if the error is an exclusion violation of the specified
    /// constraint.
    #[must_use]
    pub fn is_exclusion_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::ExclusionViolation(c) => constraint.map_or(true, |n| n == *c),
            Self::UniqueViolation(..)
            | Self::ForeignKeyViolation(..)
            | Self::TxFinished => false,
        }
    }
}
