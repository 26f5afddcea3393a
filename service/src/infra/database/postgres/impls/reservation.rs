//! [`Reservation`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select, Update},
    pagination::Order,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        reservation::{self, guest, Guest, GuestsCount, Stay},
        Reservation,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of the `reservations` table, in the order [`from_row()`]
/// expects.
const COLUMNS: &str = "\
    id, room_id, \
    guest_name, guest_email, guest_phone, guest_address, \
    check_in, check_out, total_guests, payment_method, special_requests, \
    total_amount, status, created_at";

/// Natural [`Order`] of [`Reservation`]s in lists.
const NATURAL_ORDER: Order = Order::Descending;

/// Reads a [`Reservation`] out of the provided [`Row`] selecting
/// [`COLUMNS`].
fn from_row(row: &Row) -> Reservation {
    Reservation {
        id: row.get("id"),
        room_id: row.get("room_id"),
        guest: Guest {
            name: row.get("guest_name"),
            email: row.get("guest_email"),
            phone: row.get("guest_phone"),
            address: row.get("guest_address"),
        },
        stay: Stay::new(row.get("check_in"), row.get("check_out"))
            .expect("`check_in < check_out` constraint"),
        total_guests: u16::try_from(row.get::<_, i16>("total_guests"))
            .ok()
            .and_then(GuestsCount::new)
            .expect("`total_guests` constraint"),
        payment_method: row.get("payment_method"),
        special_requests: row.get("special_requests"),
        total_amount: row.get("total_amount"),
        status: row.get("status"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Reservation>, reservation::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Reservation>, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: reservation::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM reservations \
             WHERE id = $1::UUID \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Reservation>, guest::Email>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Reservation>, guest::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let email: guest::Email = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM reservations \
             WHERE guest_email = $1::VARCHAR \
             ORDER BY created_at DESC, id DESC",
        );
        Ok(self
            .query(&sql, &[&email])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Reservation>, reservation::Status>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Reservation>, reservation::Status>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let status: reservation::Status = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM reservations \
             WHERE status = $1::INT2 \
             ORDER BY created_at DESC, id DESC",
        );
        Ok(self
            .query(&sql, &[&status])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Select<By<read::reservation::CountsByStatus, ()>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::reservation::CountsByStatus;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::reservation::CountsByStatus, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT status, COUNT(*) AS count \
            FROM reservations \
            GROUP BY status";
        let rows = self.query(SQL, &[]).await.map_err(tracerr::wrap!())?;

        Ok(read::reservation::CountsByStatus::new(rows.iter().map(|row| {
            (
                row.get("status"),
                u64::try_from(row.get::<_, i64>("count"))
                    .expect("`COUNT(*)` is never negative"),
            )
        })))
    }
}

/// Renders SQL conditions of the provided [`read::reservation::list::Filter`]
/// pushing its parameters into `ps`.
fn filtering<'a>(
    filter: &'a read::reservation::list::Filter,
    ps: &mut Vec<&'a (dyn ToSql + Sync)>,
) -> String {
    let read::reservation::list::Filter {
        status,
        email,
        room_id,
    } = filter;

    let status_idx = status.as_ref().map(|s| {
        ps.push(s);
        ps.len()
    });
    let email_idx = email.as_ref().map(|e| {
        ps.push(e);
        ps.len()
    });
    let room_idx = room_id.as_ref().map(|id| {
        ps.push(id);
        ps.len()
    });

    format!(
        "{status} {email} {room}",
        status = status_idx.into_iter().format_with("", |idx, f| {
            f(&format_args!("AND status = ${idx}::INT2"))
        }),
        email = email_idx.into_iter().format_with("", |idx, f| {
            f(&format_args!("AND guest_email = ${idx}::VARCHAR"))
        }),
        room = room_idx.into_iter().format_with("", |idx, f| {
            f(&format_args!("AND room_id = ${idx}::UUID"))
        }),
    )
}

impl<C>
    Database<
        Select<
            By<
                read::reservation::list::Page,
                read::reservation::list::Selector,
            >,
        >,
    > for Postgres<C>
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

        let limit = i32::try_from(arguments.limit())
            .unwrap_or(i32::MAX - 1)
            + 1;

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];

        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let filtering = filtering(&filter, &mut ps);

        let kind = arguments.kind();
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM reservations \
             WHERE true \
                   {cursor} \
                   {filtering} \
             ORDER BY created_at {order}, id {order} \
             LIMIT $1::INT4",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = kind.operator_within(NATURAL_ORDER);
                f(&format_args!(
                    "AND (created_at, id) {op} (\
                         SELECT created_at, id \
                         FROM reservations \
                         WHERE id = ${idx}::UUID\
                     )"
                ))
            }),
            order = kind.order_within(NATURAL_ORDER).sql(),
        );
        let rows = self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?;

        let has_more = rows.len() > arguments.limit();
        let edges = rows
            .iter()
            .take(arguments.limit())
            .map(|row| {
                let reservation = from_row(row);
                (reservation.id, reservation)
            })
            .collect::<Vec<_>>();

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
    > for Postgres<C>
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

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let filtering = filtering(&filter, &mut ps);

        let sql = format!(
            "SELECT COUNT(*) \
             FROM reservations \
             WHERE true {filtering}",
        );
        self.query_opt(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())
            .map(|row| row.expect("always exists").get::<_, i64>(0).into())
    }
}

impl<C> Database<Insert<Reservation>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Reservation>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(reservation): Insert<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(reservation))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Reservation>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(reservation): Update<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        let Reservation {
            id,
            room_id,
            guest:
                Guest {
                    name,
                    email,
                    phone,
                    address,
                },
            stay,
            total_guests,
            payment_method,
            special_requests,
            total_amount,
            status,
            created_at,
        } = reservation;

        let (check_in, check_out) = (stay.check_in(), stay.check_out());
        let total_guests = i16::try_from(u16::from(total_guests))
            .expect("`GuestsCount` fits `INT2`");

        // Only the status and the special requests are mutable.
        const SQL: &str = "\
            INSERT INTO reservations (\
                id, room_id, \
                guest_name, guest_email, guest_phone, guest_address, \
                check_in, check_out, total_guests, payment_method, \
                special_requests, total_amount, status, created_at\
            ) VALUES (\
                $1::UUID, $2::UUID, \
                $3::VARCHAR, $4::VARCHAR, $5::VARCHAR, $6::VARCHAR, \
                $7::DATE, $8::DATE, $9::INT2, $10::INT2, \
                $11::VARCHAR, $12::NUMERIC, $13::INT2, $14::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET special_requests = EXCLUDED.special_requests, \
                status = EXCLUDED.status";
        self.exec(
            SQL,
            &[
                &id,
                &room_id,
                &name,
                &email,
                &phone,
                &address,
                &check_in,
                &check_out,
                &total_guests,
                &payment_method,
                &special_requests,
                &total_amount,
                &status,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Reservation, reservation::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Reservation, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: reservation::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM reservations \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
