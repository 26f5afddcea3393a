//! Domain definitions.

pub mod reservation;
pub mod room;
pub mod session;

pub use self::{reservation::Reservation, room::Room, session::Session};
