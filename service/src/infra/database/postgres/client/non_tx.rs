//! [`NonTx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

/// Postgres client running every statement in its own implicit transaction.
///
/// The pooled connection is acquired on the first statement and kept until
/// the client is dropped or upgraded into a [`Tx`].
///
/// [`Tx`]: super::Tx
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to acquire connections from.
    pool: connection::Pool,

    /// Acquired pooled connection, if any.
    conn: Arc<RwLock<Option<connection::NonTx>>>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client acquiring connections from the
    /// provided [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self {
            pool,
            conn: Arc::new(RwLock::new(None)),
        }
    }

    /// Acquires a new pooled connection.
    ///
    /// # Errors
    ///
    /// If the [`connection::Pool`] has no free connection in time.
    pub(crate) async fn acquire(
        &self,
    ) -> Result<connection::NonTx, Traced<database::Error>> {
        self.pool
            .get()
            .await
            .map_err(tracerr::from_and_wrap!(=> database::Error))
    }

    /// Returns the pooled connection of this [`NonTx`] client, acquiring it
    /// if there is none yet.
    async fn conn(
        &self,
    ) -> Result<
        RwLockReadGuard<'_, Option<connection::NonTx>>,
        Traced<database::Error>,
    > {
        {
            let conn = self.conn.read().await;
            if conn.is_some() {
                return Ok(conn);
            }
        }

        let mut conn = self.conn.write().await;
        if conn.is_none() {
            *conn = Some(self.acquire().await.map_err(tracerr::wrap!())?);
        }
        Ok(conn.downgrade())
    }

    /// Detaches the pooled connection from this [`NonTx`] client, so it can
    /// be reused for a transaction.
    pub(crate) async fn detach(&self) -> Option<connection::NonTx> {
        self.conn.write().await.take()
    }
}

/// Returns the connection stored in the provided slot.
///
/// # Errors
///
/// If the connection is detached from the slot.
pub(super) fn held<C>(
    slot: &Option<C>,
) -> Result<&C, Traced<database::Error>> {
    slot.as_ref()
        .ok_or(postgres::Error::Detached)
        .map_err(tracerr::from_and_wrap!(=> database::Error))
}

impl Connection for NonTx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let guard = self.conn().await.map_err(tracerr::wrap!())?;
        held(&*guard)?
            .query(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn query_opt<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Option<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let guard = self.conn().await.map_err(tracerr::wrap!())?;
        held(&*guard)?
            .query_opt(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }

    async fn exec<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<u64, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let guard = self.conn().await.map_err(tracerr::wrap!())?;
        held(&*guard)?
            .exec(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}
