//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{connection, Connection},
};

use super::{non_tx::held, NonTx};

/// Postgres client running all its statements in a single transaction.
///
/// The transaction is opened on the first statement, reusing the connection
/// of the [`NonTx`] client this one originates from, if it has any.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`NonTx`] client this [`Tx`] originates from.
    origin: NonTx,

    /// Opened transaction, if any.
    tx: Arc<RwLock<Option<connection::Tx>>>,
}

impl Tx {
    /// Creates a new [`Tx`] client originating from the provided [`NonTx`]
    /// one.
    #[must_use]
    pub fn from_non_tx(origin: NonTx) -> Self {
        Self {
            origin,
            tx: Arc::new(RwLock::new(None)),
        }
    }

    /// Returns the transaction of this [`Tx`] client, opening it if there is
    /// none yet.
    async fn open(
        &self,
    ) -> Result<
        RwLockReadGuard<'_, Option<connection::Tx>>,
        Traced<database::Error>,
    > {
        {
            let tx = self.tx.read().await;
            if tx.is_some() {
                return Ok(tx);
            }
        }

        let mut tx = self.tx.write().await;
        if tx.is_none() {
            let conn = match self.origin.detach().await {
                Some(conn) => conn,
                None => {
                    self.origin.acquire().await.map_err(tracerr::wrap!())?
                }
            };
            *tx = Some(
                connection::Tx::begin(conn)
                    .await
                    .map_err(tracerr::wrap!())?,
            );
        }
        Ok(tx.downgrade())
    }

    /// Commits the transaction of this [`Tx`] client.
    ///
    /// Does nothing if no statement has been run yet.
    ///
    /// # Errors
    ///
    /// If the `COMMIT` statement fails.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.tx.write().await.take() else {
            return Ok(());
        };
        tx.commit().await.map_err(tracerr::wrap!())
    }
}

impl Connection for Tx {
    async fn query<T>(
        &self,
        stmt: &T,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Row>, Traced<database::Error>>
    where
        T: ToStatement + ?Sized,
    {
        let guard = self.open().await.map_err(tracerr::wrap!())?;
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
        let guard = self.open().await.map_err(tracerr::wrap!())?;
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
        let guard = self.open().await.map_err(tracerr::wrap!())?;
        held(&*guard)?
            .exec(stmt, params)
            .await
            .map_err(tracerr::wrap!())
    }
}
