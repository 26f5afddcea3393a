//! [`Command`] for creating a new [`Reservation`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Date, DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        reservation::{self, Stay},
        room, Reservation, Room,
    },
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for creating a new [`Reservation`].
#[derive(Clone, Debug)]
pub struct CreateReservation {
    /// ID of the [`Room`] to reserve.
    pub room_id: room::Id,

    /// [`reservation::Guest`] making the [`Reservation`].
    pub guest: reservation::Guest,

    /// [`Date`] of the first night.
    pub check_in: Date,

    /// [`Date`] of the departure.
    pub check_out: Date,

    /// Number of guests staying.
    pub total_guests: u16,

    /// [`reservation::PaymentMethod`] of the [`Reservation`].
    pub payment_method: reservation::PaymentMethod,

    /// [`reservation::SpecialRequests`] of the guest, if any.
    pub special_requests: Option<reservation::SpecialRequests>,
}

impl<Db> Command<CreateReservation> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Room, room::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::room::IsBooked, read::room::BookingWindow>>,
            Ok = read::room::IsBooked,
            Err = Traced<database::Error>,
        > + Database<
            Insert<Reservation>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Reservation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateReservation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateReservation {
            room_id,
            guest,
            check_in,
            check_out,
            total_guests,
            payment_method,
            special_requests,
        } = cmd;

        let stay = Stay::new(check_in, check_out)
            .ok_or(E::InvalidDateRange { check_in, check_out })
            .map_err(tracerr::wrap!())?;
        let today = Date::today();
        if check_in < today {
            return Err(tracerr::new!(E::PastCheckIn(check_in)));
        }
        let total_guests = reservation::GuestsCount::new(total_guests)
            .ok_or(E::InvalidGuestsCount(total_guests))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serialize bookings of the same `Room`.
        tx.execute(Lock(By::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let room = tx
            .execute(Select(By::<Option<Room>, _>::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RoomNotExists(room_id))
            .map_err(tracerr::wrap!())?;
        if !room.is_bookable() {
            return Err(tracerr::new!(E::RoomUnavailable(room_id)));
        }

        let is_booked = tx
            .execute(Select(By::<read::room::IsBooked, _>::new(
                read::room::BookingWindow {
                    room_id,
                    stay,
                    excluding: None,
                },
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if *is_booked {
            return Err(tracerr::new!(E::RoomUnavailable(room_id)));
        }

        let total_amount = room
            .price_per_night
            .checked_mul(stay.nights())
            .ok_or(E::AmountOverflow(room_id))
            .map_err(tracerr::wrap!())?;

        let reservation = Reservation {
            id: reservation::Id::new(),
            room_id,
            guest,
            stay,
            total_guests,
            payment_method,
            special_requests,
            total_amount,
            status: reservation::Status::INITIAL,
            created_at: DateTime::now().coerce(),
        };

        tx.execute(Insert(reservation.clone())).await.map_err(|e| {
            if e.as_ref().is_exclusion_violation(Some(
                database::RESERVATIONS_NO_OVERLAP,
            )) {
                tracerr::new!(E::RoomUnavailable(room_id))
            } else {
                tracerr::map_from(e)
            }
        })?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(
            reservation.id = %reservation.id,
            room.id = %room_id,
            check_in = %check_in,
            check_out = %check_out,
            "reservation created"
        );

        Ok(reservation)
    }
}

/// Error of [`CreateReservation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Check-out [`Date`] doesn't follow the check-in one.
    #[display("check-out `{check_out}` must follow check-in `{check_in}`")]
    #[from(ignore)]
    InvalidDateRange {
        /// Requested check-in [`Date`].
        check_in: Date,

        /// Requested check-out [`Date`].
        check_out: Date,
    },

    /// Check-in [`Date`] is in the past.
    #[display("check-in `{_0}` is in the past")]
    #[from(ignore)]
    PastCheckIn(#[error(not(source))] Date),

    /// Number of guests is out of the allowed range.
    #[display("guests count `{_0}` is out of range")]
    #[from(ignore)]
    InvalidGuestsCount(#[error(not(source))] u16),

    /// [`Room`] with the provided ID doesn't exist.
    #[display("`Room(id: {_0})` does not exist")]
    #[from(ignore)]
    RoomNotExists(#[error(not(source))] room::Id),

    /// [`Room`] is under maintenance or booked for the requested dates.
    #[display("`Room(id: {_0})` is unavailable for the requested dates")]
    #[from(ignore)]
    RoomUnavailable(#[error(not(source))] room::Id),

    /// Total amount of the [`Reservation`] doesn't fit into [`Money`].
    ///
    /// [`Money`]: common::Money
    #[display("total amount for `Room(id: {_0})` overflows")]
    #[from(ignore)]
    AmountOverflow(#[error(not(source))] room::Id),
}
