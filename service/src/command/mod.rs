//! [`Command`] definition.

pub mod authorize_session;
pub mod create_reservation;
pub mod create_room;
pub mod create_session;
pub mod delete_room;
pub mod transition_reservation;
pub mod update_reservation;
pub mod update_room;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_session::AuthorizeSession,
    create_reservation::CreateReservation, create_room::CreateRoom,
    create_session::CreateSession, delete_room::DeleteRoom,
    transition_reservation::TransitionReservation,
    update_reservation::UpdateReservation, update_room::UpdateRoom,
};
