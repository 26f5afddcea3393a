//! [`Command`] for updating a [`Room`].

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{room, Room},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating a [`Room`].
///
/// Only the provided fields are changed.
#[derive(Clone, Debug, Default)]
pub struct UpdateRoom {
    /// ID of the [`Room`] to update.
    pub room_id: room::Id,

    /// New [`room::Number`] of the [`Room`].
    pub number: Option<room::Number>,

    /// New [`room::Category`] of the [`Room`].
    pub category: Option<room::Category>,

    /// New price of a single night in the [`Room`].
    ///
    /// Doesn't affect existing reservations.
    pub price_per_night: Option<Money>,

    /// New administrative [`room::Status`] of the [`Room`].
    pub status: Option<room::Status>,

    /// New [`room::Feature`]s of the [`Room`].
    pub features: Option<Vec<room::Feature>>,

    /// New [`room::Image`]s of the [`Room`].
    pub images: Option<Vec<room::Image>>,
}

impl<Db> Command<UpdateRoom> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Room, room::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Lock<By<Room, room::Number>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Room>, room::Number>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<Update<Room>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Room;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateRoom) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateRoom {
            room_id,
            number,
            category,
            price_per_night,
            status,
            features,
            images,
        } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent actions upon the same `Room`.
        tx.execute(Lock(By::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut room = tx
            .execute(Select(By::<Option<Room>, _>::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::RoomNotExists(room_id))
            .map_err(tracerr::wrap!())?;

        if let Some(number) = number.filter(|n| *n != room.number) {
            // Avoid concurrent occupation of the same number.
            tx.execute(Lock(By::new(number.clone())))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            let existing = tx
                .execute(Select(By::<Option<Room>, _>::new(number.clone())))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if existing.is_some() {
                return Err(tracerr::new!(E::NumberOccupied(number)));
            }

            room.number = number;
        }
        if let Some(category) = category {
            room.category = category;
        }
        if let Some(price) = price_per_night {
            room.price_per_night = price;
        }
        if let Some(status) = status {
            room.status = status;
        }
        if let Some(features) = features {
            room.features = room::Feature::dedup(features);
        }
        if let Some(images) = images {
            room.images = images;
        }

        tx.execute(Update(room.clone())).await.map_err(|e| {
            if e.as_ref()
                .is_unique_violation(Some(database::ROOMS_NUMBER_KEY))
            {
                tracerr::new!(E::NumberOccupied(room.number.clone()))
            } else {
                tracerr::map_from(e)
            }
        })?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!(room.id = %room.id, "room updated");

        Ok(room)
    }
}

/// Error of [`UpdateRoom`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Room`] with the provided ID doesn't exist.
    #[display("`Room(id: {_0})` does not exist")]
    #[from(ignore)]
    RoomNotExists(#[error(not(source))] room::Id),

    /// Another [`Room`] with the provided [`room::Number`] exists already.
    #[display("`Room(number: {_0})` exists already")]
    #[from(ignore)]
    NumberOccupied(#[error(not(source))] room::Number),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::Command as _,
        domain::room,
        test_util::{self, service},
    };

    use super::{ExecutionError, UpdateRoom};

    #[tokio::test]
    async fn applies_only_provided_fields() {
        let svc = service();
        let created = test_util::room(&svc, "R101", "100").await;

        let updated = svc
            .execute(UpdateRoom {
                room_id: created.id,
                price_per_night: Some("120.50".parse().unwrap()),
                status: Some(room::Status::Maintenance),
                ..UpdateRoom::default()
            })
            .await
            .unwrap();

        assert_eq!(updated.number, created.number);
        assert_eq!(updated.category, created.category);
        assert_eq!(updated.price_per_night.to_string(), "120.5");
        assert_eq!(updated.status, room::Status::Maintenance);
        assert_eq!(updated.features, created.features);
    }

    #[tokio::test]
    async fn rejects_occupied_number() {
        let svc = service();
        let first = test_util::room(&svc, "R101", "100").await;
        drop(test_util::room(&svc, "R102", "100").await);

        let err = svc
            .execute(UpdateRoom {
                room_id: first.id,
                number: Some(room::Number::new("R102").unwrap()),
                ..UpdateRoom::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NumberOccupied(_)));

        let same = svc
            .execute(UpdateRoom {
                room_id: first.id,
                number: Some(room::Number::new("R101").unwrap()),
                ..UpdateRoom::default()
            })
            .await
            .unwrap();
        assert_eq!(same.number, first.number);
    }

    #[tokio::test]
    async fn fails_on_unknown_room() {
        let svc = service();

        let err = svc
            .execute(UpdateRoom {
                room_id: room::Id::new(),
                ..UpdateRoom::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::RoomNotExists(_)));
    }
}
