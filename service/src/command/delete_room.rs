//! [`Command`] for deleting a [`Room`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{room, Room},
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for deleting a [`Room`].
///
/// The [`Room`] is only marked as deleted, so the historical reservations
/// keep referring to it.
#[derive(Clone, Copy, Debug)]
pub struct DeleteRoom {
    /// ID of the [`Room`] to delete.
    pub room_id: room::Id,
}

impl<Db> Command<DeleteRoom> for Service<Db>
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
            Select<By<read::room::HasActiveReservations, room::Id>>,
            Ok = read::room::HasActiveReservations,
            Err = Traced<database::Error>,
        > + Database<Update<Room>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Room;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteRoom) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteRoom { room_id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid new reservations appearing while deleting.
        tx.execute(Lock(By::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut room = tx
            .execute(Select(By::<Option<Room>, _>::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RoomNotExists(room_id))
            .map_err(tracerr::wrap!())?;

        let has_active = tx
            .execute(Select(By::<read::room::HasActiveReservations, _>::new(
                room_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if *has_active {
            return Err(tracerr::new!(E::RoomHasActiveReservations(room_id)));
        }

        room.deleted_at = Some(DateTime::now().coerce());

        tx.execute(Update(room.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(room.id = %room.id, "room deleted");

        Ok(room)
    }
}

/// Error of [`DeleteRoom`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Room`] with the provided ID doesn't exist.
    #[display("`Room(id: {_0})` does not exist")]
    #[from(ignore)]
    RoomNotExists(#[error(not(source))] room::Id),

    /// [`Room`] still has pending, confirmed or checked-in reservations.
    #[display("`Room(id: {_0})` has active reservations")]
    #[from(ignore)]
    RoomHasActiveReservations(#[error(not(source))] room::Id),
}
