//! [`Query`] checking whether a [`Room`] may be booked.

use common::{
    operations::{By, Select},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::Reservation;
use crate::{
    domain::{
        reservation::{self, Stay},
        room, Room,
    },
    infra::{database, Database},
    read, Query, Service,
};

/// [`Query`] checking whether a new [`Reservation`] of a [`Room`] may be
/// admitted for the provided dates.
///
/// A [`Room`] under [`room::Status::Maintenance`] is never free.
#[derive(Clone, Copy, Debug)]
pub struct IsFree {
    /// ID of the [`Room`] to check.
    pub room_id: room::Id,

    /// [`Date`] of the first night.
    pub check_in: Date,

    /// [`Date`] of the departure.
    pub check_out: Date,

    /// ID of the [`Reservation`] to ignore, if any.
    pub excluding: Option<reservation::Id>,
}

impl<Db> Query<IsFree> for Service<Db>
where
    Db: Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::room::IsBooked, read::room::BookingWindow>>,
            Ok = read::room::IsBooked,
            Err = Traced<database::Error>,
        >,
{
    type Ok = bool;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: IsFree) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let IsFree {
            room_id,
            check_in,
            check_out,
            excluding,
        } = query;

        let stay = Stay::new(check_in, check_out)
            .ok_or(E::InvalidDateRange { check_in, check_out })
            .map_err(tracerr::wrap!())?;

        let room = self
            .database()
            .execute(Select(By::<Option<Room>, _>::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RoomNotExists(room_id))
            .map_err(tracerr::wrap!())?;
        if !room.is_bookable() {
            return Ok(false);
        }

        let is_booked = self
            .database()
            .execute(Select(By::<read::room::IsBooked, _>::new(
                read::room::BookingWindow {
                    room_id,
                    stay,
                    excluding,
                },
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(!*is_booked)
    }
}

/// Error of [`IsFree`] [`Query`] execution.
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

    /// [`Room`] with the provided ID doesn't exist.
    #[display("`Room(id: {_0})` does not exist")]
    #[from(ignore)]
    RoomNotExists(#[error(not(source))] room::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{self, Command as _},
        domain::room,
        test_util::{self, booking, day, reserve, service},
    };

    use super::{ExecutionError, IsFree};

    #[tokio::test]
    async fn reports_overlap_after_booking() {
        let svc = service();
        let room = test_util::room(&svc, "R101", "100").await;
        let check = |from, to| IsFree {
            room_id: room.id,
            check_in: day(from),
            check_out: day(to),
            excluding: None,
        };

        assert!(svc.execute(check(10, 13)).await.unwrap());

        let booked = reserve(&svc, room.id, day(10), day(13)).await;

        assert!(!svc.execute(check(10, 13)).await.unwrap());
        assert!(!svc.execute(check(11, 12)).await.unwrap());
        assert!(!svc.execute(check(9, 11)).await.unwrap());
        assert!(svc.execute(check(13, 15)).await.unwrap());
        assert!(svc.execute(check(8, 10)).await.unwrap());

        assert!(svc
            .execute(IsFree {
                excluding: Some(booked.id),
                ..check(11, 12)
            })
            .await
            .unwrap());

        let err = svc.execute(booking(room.id, day(12), day(14))).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn never_reports_maintained_room_free() {
        let svc = service();
        let room = test_util::room(&svc, "R101", "100").await;
        drop(
            svc.execute(command::UpdateRoom {
                room_id: room.id,
                status: Some(room::Status::Maintenance),
                ..command::UpdateRoom::default()
            })
            .await
            .unwrap(),
        );

        let free = svc
            .execute(IsFree {
                room_id: room.id,
                check_in: day(1),
                check_out: day(2),
                excluding: None,
            })
            .await
            .unwrap();
        assert!(!free);
    }

    #[tokio::test]
    async fn rejects_malformed_request() {
        let svc = service();
        let room = test_util::room(&svc, "R101", "100").await;

        let err = svc
            .execute(IsFree {
                room_id: room.id,
                check_in: day(2),
                check_out: day(2),
                excluding: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidDateRange { .. },
        ));

        let err = svc
            .execute(IsFree {
                room_id: room::Id::new(),
                check_in: day(1),
                check_out: day(2),
                excluding: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::RoomNotExists(_)));
    }
}
