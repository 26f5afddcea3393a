//! [`Room`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Lock, Select, Update};
use tracerr::Traced;

use crate::{
    domain::{room, Room},
    infra::{
        database::{self, memory::Connection, Memory},
        Database,
    },
    read,
};

impl<C, IDs> Database<Select<By<HashMap<room::Id, Room>, IDs>>> for Memory<C>
where
    C: Connection,
    IDs: AsRef<[room::Id]>,
{
    type Ok = HashMap<room::Id, Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<room::Id, Room>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        self.read(|s| {
            ids.as_ref()
                .iter()
                .filter_map(|id| s.rooms.get(id))
                .map(|r| (r.id, r.clone()))
                .collect()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Option<Room>, room::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Room>, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.read(|s| s.rooms.get(&id).filter(|r| !r.is_deleted()).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Option<Room>, room::Number>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Room>, room::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        let number = by.into_inner();
        self.read(|s| {
            s.rooms
                .values()
                .find(|r| !r.is_deleted() && r.number == number)
                .cloned()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Vec<Room>, read::room::Filter>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Room>, read::room::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        self.read(|s| {
            let mut rooms = s
                .rooms
                .values()
                .filter(|r| filter.accepts(r))
                .filter(|r| {
                    filter.free_within.map_or(true, |stay| {
                        !s.reservations.values().any(|b| {
                            b.room_id == r.id
                                && b.is_active()
                                && b.stay.overlaps(&stay)
                        })
                    })
                })
                .cloned()
                .collect::<Vec<_>>();
            rooms.sort_by(|a, b| a.number.cmp(&b.number));
            rooms
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<Room>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(room): Insert<Room>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| s.put_room(room))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Room>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(room): Update<Room>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| s.put_room(room))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Lock<By<Room, room::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Room, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Transactions are exclusive already.
        Ok(())
    }
}

impl<C> Database<Lock<By<Room, room::Number>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Room, room::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Transactions are exclusive already.
        Ok(())
    }
}

impl<C> Database<Select<By<read::room::HasActiveReservations, room::Id>>>
    for Memory<C>
where
    C: Connection,
{
    type Ok = read::room::HasActiveReservations;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::room::HasActiveReservations, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let room_id = by.into_inner();
        self.read(|s| {
            read::room::HasActiveReservations(
                s.reservations
                    .values()
                    .any(|r| r.room_id == room_id && r.is_active()),
            )
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C>
    Database<Select<By<read::room::IsBooked, read::room::BookingWindow>>>
    for Memory<C>
where
    C: Connection,
{
    type Ok = read::room::IsBooked;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::room::IsBooked, read::room::BookingWindow>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::room::BookingWindow {
            room_id,
            stay,
            excluding,
        } = by.into_inner();
        self.read(|s| {
            read::room::IsBooked(s.reservations.values().any(|r| {
                r.room_id == room_id
                    && Some(r.id) != excluding
                    && r.is_active()
                    && r.stay.overlaps(&stay)
            }))
        })
        .await
        .map_err(tracerr::wrap!())
    }
}
