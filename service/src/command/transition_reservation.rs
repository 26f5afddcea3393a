//! [`Command`] for moving a [`Reservation`] to another [`Status`].

use tracerr::Traced;

use crate::{
    domain::{
        reservation::{self, Status},
        session::Initiator,
        Reservation,
    },
    Service,
};

use super::{Command, UpdateReservation};

pub use super::update_reservation::ExecutionError;

/// [`Command`] for moving a [`Reservation`] to another [`Status`].
///
/// Same as an [`UpdateReservation`] touching the [`Status`] only.
#[derive(Clone, Debug)]
pub struct TransitionReservation {
    /// ID of the [`Reservation`] to transition.
    pub reservation_id: reservation::Id,

    /// Target [`Status`] of the [`Reservation`].
    pub status: Status,

    /// [`Status`] the [`Initiator`] has observed the [`Reservation`] in.
    ///
    /// If it differs from the stored one, the transition is rejected.
    pub expected_status: Option<Status>,

    /// [`Initiator`] of the transition.
    pub initiator: Initiator,
}

impl From<TransitionReservation> for UpdateReservation {
    fn from(cmd: TransitionReservation) -> Self {
        let TransitionReservation {
            reservation_id,
            status,
            expected_status,
            initiator,
        } = cmd;

        Self {
            reservation_id,
            status: Some(status),
            expected_status,
            special_requests: None,
            initiator,
        }
    }
}

impl<Db> Command<TransitionReservation> for Service<Db>
where
    Self: Command<
        UpdateReservation,
        Ok = Reservation,
        Err = Traced<ExecutionError>,
    >,
{
    type Ok = Reservation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: TransitionReservation,
    ) -> Result<Self::Ok, Self::Err> {
        <Self as Command<UpdateReservation>>::execute(self, cmd.into())
            .await
            .map_err(tracerr::wrap!())
    }
}
