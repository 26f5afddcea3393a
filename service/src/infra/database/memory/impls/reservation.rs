//! [`Reservation`]-related [`Database`] implementations.

use std::cmp::Reverse;

use common::{
    operations::{By, Insert, Lock, Select, Update},
    pagination::{self, Order},
};
use tracerr::Traced;

use crate::{
    domain::{
        reservation::{self, guest},
        Reservation,
    },
    infra::{
        database::{self, memory::Connection, Memory},
        Database,
    },
    read,
};

/// Sorting key of [`Reservation`]s in their natural (descending) order.
fn key(r: &Reservation) -> (reservation::CreationDateTime, reservation::Id) {
    (r.created_at, r.id)
}

impl<C> Database<Select<By<Option<Reservation>, reservation::Id>>>
    for Memory<C>
where
    C: Connection,
{
    type Ok = Option<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Reservation>, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        self.read(|s| s.reservations.get(&id).cloned())
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Vec<Reservation>, guest::Email>>> for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Reservation>, guest::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        self.read(|s| {
            let mut found = s
                .reservations
                .values()
                .filter(|r| r.guest.email == email)
                .cloned()
                .collect::<Vec<_>>();
            found.sort_by_key(|r| Reverse(key(r)));
            found
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<Vec<Reservation>, reservation::Status>>>
    for Memory<C>
where
    C: Connection,
{
    type Ok = Vec<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Reservation>, reservation::Status>>,
    ) -> Result<Self::Ok, Self::Err> {
        let status = by.into_inner();
        self.read(|s| {
            let mut found = s
                .reservations
                .values()
                .filter(|r| r.status == status)
                .cloned()
                .collect::<Vec<_>>();
            found.sort_by_key(|r| Reverse(key(r)));
            found
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Select<By<read::reservation::CountsByStatus, ()>>>
    for Memory<C>
where
    C: Connection,
{
    type Ok = read::reservation::CountsByStatus;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::reservation::CountsByStatus, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.read(|s| {
            read::reservation::CountsByStatus::new(
                s.reservations.values().map(|r| (r.status, 1)),
            )
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C>
    Database<
        Select<
            By<
                read::reservation::list::Page,
                read::reservation::list::Selector,
            >,
        >,
    > for Memory<C>
where
    C: Connection,
{
    type Ok = read::reservation::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                read::reservation::list::Page,
                read::reservation::list::Selector,
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::reservation::list::Selector { arguments, filter } =
            by.into_inner();
        let kind = arguments.kind();
        let limit = arguments.limit();

        let (edges, has_more) = self
            .read(|s| {
                let cursor = match arguments.cursor() {
                    Some(id) => match s.reservations.get(id) {
                        Some(r) => Some(key(r)),
                        None => return (vec![], false),
                    },
                    None => None,
                };

                let mut found = s
                    .reservations
                    .values()
                    .filter(|r| filter.accepts(r))
                    .filter(|r| {
                        cursor.map_or(true, |c| {
                            let k = key(r);
                            match kind {
                                pagination::Kind::Forward => k < c,
                                pagination::Kind::ForwardIncluding => k <= c,
                                pagination::Kind::Backward => k > c,
                                pagination::Kind::BackwardIncluding => k >= c,
                            }
                        })
                    })
                    .collect::<Vec<_>>();
                found.sort_by_key(|r| key(r));
                if kind.order_within(Order::Descending) == Order::Descending {
                    found.reverse();
                }

                let has_more = found.len() > limit;
                let edges = found
                    .into_iter()
                    .take(limit)
                    .map(|r| (r.id, r.clone()))
                    .collect::<Vec<_>>();
                (edges, has_more)
            })
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::reservation::list::Page::new(&arguments, edges, has_more))
    }
}

impl<C>
    Database<
        Select<
            By<
                read::reservation::list::TotalCount,
                read::reservation::list::Filter,
            >,
        >,
    > for Memory<C>
where
    C: Connection,
{
    type Ok = read::reservation::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                read::reservation::list::TotalCount,
                read::reservation::list::Filter,
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        self.read(|s| {
            let count =
                s.reservations.values().filter(|r| filter.accepts(r)).count();
            i64::try_from(count).unwrap_or(i64::MAX).into()
        })
        .await
        .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<Reservation>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(reservation): Insert<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| s.put_reservation(reservation))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Reservation>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(reservation): Update<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        self.write(|s| s.put_reservation(reservation))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Lock<By<Reservation, reservation::Id>>> for Memory<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Reservation, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Transactions are exclusive already.
        Ok(())
    }
}
