//! [`Command`] for updating the mutable parts of a [`Reservation`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{
        reservation::{self, SpecialRequests, Status},
        session::Initiator,
        Reservation,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating the [`Status`] and/or the [`SpecialRequests`]
/// of a [`Reservation`] at once.
///
/// Either both changes are applied, or none of them.
#[derive(Clone, Debug)]
pub struct UpdateReservation {
    /// ID of the [`Reservation`] to update.
    pub reservation_id: reservation::Id,

    /// [`Status`] to move the [`Reservation`] to, if any.
    pub status: Option<Status>,

    /// [`Status`] the [`Initiator`] has observed the [`Reservation`] in.
    ///
    /// If it differs from the stored one, the update is rejected.
    pub expected_status: Option<Status>,

    /// New [`SpecialRequests`], if they should be changed.
    ///
    /// `Some(None)` clears them.
    pub special_requests: Option<Option<SpecialRequests>>,

    /// [`Initiator`] of the update.
    pub initiator: Initiator,
}

impl<Db> Command<UpdateReservation> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Reservation, reservation::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Reservation>, reservation::Id>>,
            Ok = Option<Reservation>,
            Err = Traced<database::Error>,
        > + Database<
            Update<Reservation>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Reservation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateReservation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateReservation {
            reservation_id,
            status,
            expected_status,
            special_requests,
            initiator,
        } = cmd;

        if status.is_none() && special_requests.is_none() {
            return Err(tracerr::new!(E::NothingToUpdate));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent updates of the same `Reservation`.
        tx.execute(Lock(By::new(reservation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut reservation = tx
            .execute(Select(By::<Option<Reservation>, _>::new(reservation_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ReservationNotExists(reservation_id))
            .map_err(tracerr::wrap!())?;
        if !initiator.can_access(&reservation.guest.email) {
            return Err(tracerr::new!(E::Forbidden(reservation_id)));
        }

        let from = reservation.status;
        if let Some(expected) = expected_status.filter(|s| *s != from) {
            return Err(tracerr::new!(E::Conflict {
                expected,
                actual: from,
            }));
        }
        if let Some(to) = status {
            if !from.can_transition_to(to) {
                return Err(tracerr::new!(E::InvalidTransition { from, to }));
            }
            if !initiator.is_staff()
                && !(from == Status::Pending && to == Status::Cancelled)
            {
                return Err(tracerr::new!(E::Forbidden(reservation_id)));
            }
            if to == Status::CheckedIn {
                let check_in = reservation.stay.check_in();
                if Date::today() < check_in {
                    return Err(tracerr::new!(E::CheckInTooEarly(check_in)));
                }
            }
        }
        if special_requests.is_some() && from.is_terminal() {
            return Err(tracerr::new!(E::ReservationFinished(from)));
        }

        let unchanged = status.is_none()
            && special_requests.as_ref() == Some(&reservation.special_requests);
        if unchanged {
            return Ok(reservation);
        }
        if let Some(to) = status {
            reservation.status = to;
        }
        if let Some(requests) = special_requests {
            reservation.special_requests = requests;
        }

        tx.execute(Update(reservation.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(
            reservation.id = %reservation_id,
            from = %from,
            to = %reservation.status,
            "reservation updated"
        );

        Ok(reservation)
    }
}

/// Error of [`UpdateReservation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// Neither [`Status`] nor [`SpecialRequests`] are requested to change.
    #[display("nothing to update")]
    NothingToUpdate,

    /// [`Reservation`] with the provided ID doesn't exist.
    #[display("`Reservation(id: {_0})` does not exist")]
    #[from(ignore)]
    ReservationNotExists(#[error(not(source))] reservation::Id),

    /// [`Initiator`] is not allowed to perform the update.
    #[display("update of `Reservation(id: {_0})` is forbidden")]
    #[from(ignore)]
    Forbidden(#[error(not(source))] reservation::Id),

    /// [`Reservation`] was changed since the [`Initiator`] observed it.
    #[display("`Reservation` is `{actual}`, not `{expected}`")]
    #[from(ignore)]
    Conflict {
        /// [`Status`] the [`Initiator`] expected.
        expected: Status,

        /// Actual [`Status`] of the [`Reservation`].
        actual: Status,
    },

    /// Transition is not allowed by the [`Reservation`] lifecycle.
    #[display("cannot transition `Reservation` from `{from}` to `{to}`")]
    #[from(ignore)]
    InvalidTransition {
        /// Current [`Status`] of the [`Reservation`].
        from: Status,

        /// Requested [`Status`].
        to: Status,
    },

    /// Check-in is attempted before the check-in [`Date`].
    #[display("cannot check in before `{_0}`")]
    #[from(ignore)]
    CheckInTooEarly(#[error(not(source))] Date),

    /// [`Reservation`] is in a terminal [`Status`].
    #[display("`Reservation` is `{_0}` already")]
    #[from(ignore)]
    ReservationFinished(#[error(not(source))] Status),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{Command as _, TransitionReservation},
        domain::{
            reservation::{guest::Email, SpecialRequests, Status},
            session::Initiator,
            Reservation,
        },
        query,
        test_util::{self, day, reserve, service},
    };

    use super::{ExecutionError, UpdateReservation};

    fn requests(text: &str) -> Option<Option<SpecialRequests>> {
        Some(Some(SpecialRequests::new(text).unwrap()))
    }

    fn guest(email: &str) -> Initiator {
        Initiator::Guest(Email::new(email).unwrap())
    }

    fn edit(
        reservation: &Reservation,
        initiator: Initiator,
    ) -> UpdateReservation {
        UpdateReservation {
            reservation_id: reservation.id,
            status: None,
            expected_status: None,
            special_requests: None,
            initiator,
        }
    }

    #[tokio::test]
    async fn lets_owner_edit_requests() {
        let svc = service();
        let room = test_util::room(&svc, "R101", "100").await;
        let created = reserve(&svc, room.id, day(1), day(3)).await;

        let updated = svc
            .execute(UpdateReservation {
                special_requests: requests("Late arrival"),
                ..edit(&created, guest("jane@example.com"))
            })
            .await
            .unwrap();
        assert_eq!(
            updated.special_requests.as_ref().map(ToString::to_string),
            Some("Late arrival".to_owned()),
        );
        assert_eq!(updated.status, created.status);

        let err = svc
            .execute(UpdateReservation {
                special_requests: Some(None),
                ..edit(&created, guest("john@example.com"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::Forbidden(_)));
    }

    #[tokio::test]
    async fn applies_status_and_requests_together() {
        let svc = service();
        let room = test_util::room(&svc, "R101", "100").await;
        let created = reserve(&svc, room.id, day(1), day(3)).await;

        let updated = svc
            .execute(UpdateReservation {
                status: Some(Status::Confirmed),
                special_requests: requests("Extra pillow"),
                ..edit(&created, Initiator::Staff)
            })
            .await
            .unwrap();
        assert_eq!(updated.status, Status::Confirmed);
        assert_eq!(
            updated.special_requests.as_ref().map(ToString::to_string),
            Some("Extra pillow".to_owned()),
        );
    }

    #[tokio::test]
    async fn leaves_requests_untouched_on_rejected_transition() {
        let svc = service();
        let room = test_util::room(&svc, "R101", "100").await;
        let created = reserve(&svc, room.id, day(1), day(3)).await;

        let err = svc
            .execute(UpdateReservation {
                status: Some(Status::CheckedOut),
                special_requests: requests("Late arrival"),
                ..edit(&created, Initiator::Staff)
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidTransition {
                from: Status::Pending,
                to: Status::CheckedOut,
            },
        ));

        let stored = svc
            .execute(query::reservation::ById::by(created.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.status, Status::Pending);
        assert_eq!(stored.special_requests, created.special_requests);
    }

    #[tokio::test]
    async fn rejects_empty_update() {
        let svc = service();
        let room = test_util::room(&svc, "R101", "100").await;
        let created = reserve(&svc, room.id, day(1), day(3)).await;

        let err = svc
            .execute(edit(&created, Initiator::Staff))
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NothingToUpdate));
    }

    #[tokio::test]
    async fn rejects_finished_reservation() {
        let svc = service();
        let room = test_util::room(&svc, "R101", "100").await;
        let created = reserve(&svc, room.id, day(1), day(3)).await;
        drop(
            svc.execute(TransitionReservation {
                reservation_id: created.id,
                status: Status::Cancelled,
                expected_status: None,
                initiator: Initiator::Staff,
            })
            .await
            .unwrap(),
        );

        let err = svc
            .execute(UpdateReservation {
                special_requests: Some(None),
                ..edit(&created, Initiator::Staff)
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::ReservationFinished(Status::Cancelled),
        ));
    }
}
