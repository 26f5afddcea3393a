//! [`Command`] for creating a new [`Room`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime, Money,
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

/// [`Command`] for creating a new [`Room`].
#[derive(Clone, Debug)]
pub struct CreateRoom {
    /// [`room::Number`] of a new [`Room`].
    pub number: room::Number,

    /// [`room::Category`] of a new [`Room`].
    pub category: room::Category,

    /// Price of a single night in a new [`Room`].
    pub price_per_night: Money,

    /// Administrative [`room::Status`] of a new [`Room`].
    pub status: room::Status,

    /// [`room::Feature`]s of a new [`Room`].
    pub features: Vec<room::Feature>,

    /// [`room::Image`]s of a new [`Room`].
    pub images: Vec<room::Image>,
}

impl<Db> Command<CreateRoom> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Room, room::Number>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Room>, room::Number>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<Insert<Room>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Room;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateRoom) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateRoom {
            number,
            category,
            price_per_night,
            status,
            features,
            images,
        } = cmd;

        let room = Room {
            id: room::Id::new(),
            number,
            category,
            price_per_night,
            status,
            features: room::Feature::dedup(features),
            images,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent creation of `Room`s with the same number.
        tx.execute(Lock(By::new(room.number.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let existing = tx
            .execute(Select(By::<Option<Room>, _>::new(room.number.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::NumberOccupied(room.number)));
        }

        tx.execute(Insert(room.clone())).await.map_err(|e| {
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

        log::info!(
            room.id = %room.id,
            room.number = %room.number,
            "room created"
        );

        Ok(room)
    }
}

/// Error of [`CreateRoom`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

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

    use super::{CreateRoom, ExecutionError};

    #[tokio::test]
    async fn creates_room_with_deduplicated_features() {
        let svc = service();

        let created = svc
            .execute(CreateRoom {
                number: room::Number::new("R101").unwrap(),
                category: room::Category::new("Deluxe").unwrap(),
                price_per_night: "100".parse().unwrap(),
                status: room::Status::Available,
                features: ["Balcony", "Minibar", "Balcony"]
                    .into_iter()
                    .map(|f| room::Feature::new(f).unwrap())
                    .collect(),
                images: vec![room::Image::new("r101.jpg").unwrap()],
            })
            .await
            .unwrap();

        assert_eq!(created.number.to_string(), "R101");
        assert_eq!(created.features.len(), 2);
        assert_eq!(created.images.len(), 1);
        assert!(!created.is_deleted());
    }

    #[tokio::test]
    async fn rejects_duplicate_number() {
        let svc = service();
        drop(test_util::room(&svc, "R101", "100").await);

        let err = svc
            .execute(CreateRoom {
                number: room::Number::new("R101").unwrap(),
                category: room::Category::new("Suite").unwrap(),
                price_per_night: "250".parse().unwrap(),
                status: room::Status::Available,
                features: vec![],
                images: vec![],
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::NumberOccupied(n) if n.to_string() == "R101",
        ));
    }
}
