//! [`Room`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Insert, Lock, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{reservation, room, Room},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `rooms` table, in the order [`from_row()`] expects.
const COLUMNS: &str = "\
    id, number, category, price_per_night, status, features, images, \
    created_at, deleted_at";

/// Reads a [`Room`] out of the provided [`Row`] selecting [`COLUMNS`].
fn from_row(row: &Row) -> Room {
    Room {
        id: row.get("id"),
        number: row.get("number"),
        category: row.get("category"),
        price_per_night: row.get("price_per_night"),
        status: row.get("status"),
        features: row.get("features"),
        images: row.get("images"),
        created_at: row.get("created_at"),
        deleted_at: row.get("deleted_at"),
    }
}

impl<C, IDs> Database<Select<By<HashMap<room::Id, Room>, IDs>>> for Postgres<C>
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
        // Avoid subtle change for SQL.
        let ids: &[room::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM rooms \
             WHERE id = ANY($1::UUID[])",
        );
        Ok(self
            .query(&sql, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| {
                let room = from_row(row);
                (room.id, room)
            })
            .collect())
    }
}

impl<C> Database<Select<By<Option<Room>, room::Id>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<HashMap<room::Id, Room>, [room::Id; 1]>>,
        Ok = HashMap<room::Id, Room>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Room>, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self
            .execute(Select(By::new([id])))
            .await
            .map_err(tracerr::wrap!())?
            .remove(&id)
            .filter(|r| !r.is_deleted()))
    }
}

impl<C> Database<Select<By<Option<Room>, room::Number>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Room>, room::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let number: room::Number = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM rooms \
             WHERE number = $1::VARCHAR \
               AND deleted_at IS NULL \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&number])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Room>, read::room::Filter>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Room>, read::room::Filter>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::room::Filter {
            category,
            min_price,
            max_price,
            statuses,
            free_within,
        } = by.into_inner();

        let active: &[reservation::Status] = &reservation::Status::ACTIVE;
        let window = free_within.map(|s| (s.check_in(), s.check_out()));

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];

        let category_idx = category.as_ref().map(|c| {
            ps.push(c);
            ps.len()
        });
        let min_price_idx = min_price.as_ref().map(|p| {
            ps.push(p);
            ps.len()
        });
        let max_price_idx = max_price.as_ref().map(|p| {
            ps.push(p);
            ps.len()
        });
        let statuses_idx = (!statuses.is_empty()).then(|| {
            ps.push(&statuses);
            ps.len()
        });
        let window_idx = window.as_ref().map(|(check_in, check_out)| {
            ps.push(&active);
            ps.push(check_in);
            ps.push(check_out);
            (ps.len() - 2, ps.len() - 1, ps.len())
        });

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM rooms \
             WHERE deleted_at IS NULL \
                   {category_filtering} \
                   {min_price_filtering} \
                   {max_price_filtering} \
                   {status_filtering} \
                   {window_filtering} \
             ORDER BY number ASC",
            category_filtering =
                category_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!(
                        "AND POSITION(LOWER(${idx}::VARCHAR) \
                                      IN LOWER(category)) > 0"
                    ))
                }),
            min_price_filtering =
                min_price_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND price_per_night >= ${idx}::NUMERIC"))
                }),
            max_price_filtering =
                max_price_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND price_per_night <= ${idx}::NUMERIC"))
                }),
            status_filtering =
                statuses_idx.into_iter().format_with("", |idx, f| {
                    f(&format_args!("AND status = ANY(${idx}::INT2[])"))
                }),
            window_filtering = window_idx.into_iter().format_with(
                "",
                |(active, check_in, check_out), f| {
                    f(&format_args!(
                        "AND NOT EXISTS (\
                             SELECT 1 \
                             FROM reservations \
                             WHERE room_id = rooms.id \
                               AND status = ANY(${active}::INT2[]) \
                               AND check_in < ${check_out}::DATE \
                               AND check_out > ${check_in}::DATE\
                         )"
                    ))
                }
            ),
        );
        Ok(self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Room>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Room>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(room): Insert<Room>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(room)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Room>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(room): Update<Room>,
    ) -> Result<Self::Ok, Self::Err> {
        let Room {
            id,
            number,
            category,
            price_per_night,
            status,
            features,
            images,
            created_at,
            deleted_at,
        } = room;

        const SQL: &str = "\
            INSERT INTO rooms (\
                id, number, category, price_per_night, status, \
                features, images, \
                created_at, deleted_at\
            ) VALUES (\
                $1::UUID, $2::VARCHAR, $3::VARCHAR, $4::NUMERIC, $5::INT2, \
                $6::VARCHAR[], $7::VARCHAR[], \
                $8::TIMESTAMPTZ, $9::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET number = EXCLUDED.number, \
                category = EXCLUDED.category, \
                price_per_night = EXCLUDED.price_per_night, \
                status = EXCLUDED.status, \
                features = EXCLUDED.features, \
                images = EXCLUDED.images, \
                deleted_at = EXCLUDED.deleted_at";
        self.exec(
            SQL,
            &[
                &id,
                &number,
                &category,
                &price_per_night,
                &status,
                &features,
                &images,
                &created_at,
                &deleted_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Room, room::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Room, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: room::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM rooms \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Room, room::Number>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Room, room::Number>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let number: room::Number = by.into_inner();

        const SQL: &str = "\
            SELECT pg_advisory_xact_lock(hashtext('rooms:' || $1::VARCHAR))";
        self.query(SQL, &[&number])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<read::room::HasActiveReservations, room::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::room::HasActiveReservations;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::room::HasActiveReservations, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let room_id: room::Id = by.into_inner();
        let active: &[reservation::Status] = &reservation::Status::ACTIVE;

        const SQL: &str = "\
            SELECT id \
            FROM reservations \
            WHERE room_id = $1::UUID \
              AND status = ANY($2::INT2[]) \
            LIMIT 1";
        self.query_opt(SQL, &[&room_id, &active])
            .await
            .map_err(tracerr::wrap!())
            .map(|r| read::room::HasActiveReservations(r.is_some()))
    }
}

impl<C>
    Database<Select<By<read::room::IsBooked, read::room::BookingWindow>>>
    for Postgres<C>
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
        let active: &[reservation::Status] = &reservation::Status::ACTIVE;
        let (check_in, check_out) = (stay.check_in(), stay.check_out());

        const SQL: &str = "\
            SELECT id \
            FROM reservations \
            WHERE room_id = $1::UUID \
              AND status = ANY($2::INT2[]) \
              AND check_in < $4::DATE \
              AND check_out > $3::DATE \
              AND ($5::UUID IS NULL OR id <> $5::UUID) \
            LIMIT 1";
        self.query_opt(
            SQL,
            &[&room_id, &active, &check_in, &check_out, &excluding],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(|r| read::room::IsBooked(r.is_some()))
    }
}
