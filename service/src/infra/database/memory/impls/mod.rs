//! [`Database`] implementations.

mod reservation;
mod room;

use common::operations::{Commit, Transact};
use tracerr::Traced;

use crate::infra::{database, Database};

use super::{Memory, NonTx, Tx};

impl Database<Transact> for Memory<NonTx> {
    type Ok = Memory<Tx>;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Memory(Tx::begin(&self.0).await))
    }
}

impl Database<Transact> for Memory<Tx> {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(self.clone())
    }
}

impl Database<Commit> for Memory<Tx> {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        self.commit().await.map_err(tracerr::wrap!())
    }
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Commit, Insert, Select, Transact};

    use crate::{
        domain::{room, Room},
        infra::{database, Database as _, Memory},
    };

    fn room(number: &str) -> Room {
        Room {
            id: room::Id::new(),
            number: room::Number::new(number).unwrap(),
            category: room::Category::new("Single").unwrap(),
            price_per_night: "50".parse().unwrap(),
            status: room::Status::Available,
            features: vec![],
            images: vec![],
            created_at: common::DateTime::now().coerce(),
            deleted_at: None,
        }
    }

    #[tokio::test]
    async fn commits_transaction() {
        let db: Memory = Memory::default();
        let r = room("101");

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(r.clone())).await.unwrap();
        tx.execute(Commit).await.unwrap();
        drop(tx);

        let stored = db
            .execute(Select(By::<Option<Room>, _>::new(r.id)))
            .await
            .unwrap();
        assert_eq!(stored, Some(r));
    }

    #[tokio::test]
    async fn rolls_back_dropped_transaction() {
        let db: Memory = Memory::default();
        let r = room("101");

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Insert(r.clone())).await.unwrap();
        drop(tx);

        let stored = db
            .execute(Select(By::<Option<Room>, _>::new(r.id)))
            .await
            .unwrap();
        assert_eq!(stored, None);
    }

    #[tokio::test]
    async fn rejects_duplicate_room_number() {
        let db: Memory = Memory::default();
        db.execute(Insert(room("101"))).await.unwrap();

        let err = db.execute(Insert(room("101"))).await.unwrap_err();
        assert!(err
            .as_ref()
            .is_unique_violation(Some(database::ROOMS_NUMBER_KEY)));

        db.execute(Insert(room("102"))).await.unwrap();
    }
}
