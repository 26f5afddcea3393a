//! In-memory database client definitions.

use std::{future::Future, sync::Arc};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracerr::Traced;

use crate::infra::database;

use super::{Error, Storage};

/// Generic in-memory database connection.
pub trait Connection {
    /// Reads the [`Storage`] with the provided function.
    ///
    /// # Errors
    ///
    /// If the [`Storage`] is not accessible anymore.
    fn read<R>(
        &self,
        f: impl FnOnce(&Storage) -> R,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;

    /// Modifies the [`Storage`] with the provided function.
    ///
    /// # Errors
    ///
    /// If the provided function fails or the [`Storage`] is not accessible
    /// anymore.
    fn write<R>(
        &self,
        f: impl FnOnce(&mut Storage) -> Result<R, Error>,
    ) -> impl Future<Output = Result<R, Traced<database::Error>>>;
}

/// Non-transactional in-memory database client.
#[derive(Clone, Debug, Default)]
pub struct NonTx {
    /// Shared [`Storage`].
    storage: Arc<Mutex<Storage>>,
}

impl Connection for NonTx {
    async fn read<R>(
        &self,
        f: impl FnOnce(&Storage) -> R,
    ) -> Result<R, Traced<database::Error>> {
        Ok(f(&*self.storage.lock().await))
    }

    async fn write<R>(
        &self,
        f: impl FnOnce(&mut Storage) -> Result<R, Error>,
    ) -> Result<R, Traced<database::Error>> {
        f(&mut *self.storage.lock().await)
            .map_err(tracerr::wrap!())
            .map_err(tracerr::map_from)
    }
}

/// Transactional in-memory database client.
#[derive(Clone, Debug)]
pub struct Tx {
    /// Inner state of this [`Tx`], [`None`] once committed.
    inner: Arc<Mutex<Option<Inner>>>,
}

/// Inner state of a [`Tx`] client.
#[derive(Debug)]
struct Inner {
    /// Exclusive access to the shared [`Storage`].
    guard: OwnedMutexGuard<Storage>,

    /// Changes made in this transaction so far.
    staged: Storage,
}

impl Tx {
    /// Starts a new [`Tx`] over the [`Storage`] of the provided [`NonTx`]
    /// client, waiting for other transactions to finish.
    pub(crate) async fn begin(client: &NonTx) -> Self {
        let guard = Arc::clone(&client.storage).lock_owned().await;
        let staged = (*guard).clone();
        Self {
            inner: Arc::new(Mutex::new(Some(Inner { guard, staged }))),
        }
    }

    /// Commits this [`Tx`] client.
    ///
    /// # Errors
    ///
    /// If this [`Tx`] has been committed already.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Inner { mut guard, staged } = self
            .inner
            .lock()
            .await
            .take()
            .ok_or(Error::TxFinished)
            .map_err(tracerr::wrap!())
            .map_err(tracerr::map_from)?;
        *guard = staged;
        Ok(())
    }
}

impl Connection for Tx {
    async fn read<R>(
        &self,
        f: impl FnOnce(&Storage) -> R,
    ) -> Result<R, Traced<database::Error>> {
        let inner = self.inner.lock().await;
        let Inner { staged, .. } = inner
            .as_ref()
            .ok_or(Error::TxFinished)
            .map_err(tracerr::wrap!())
            .map_err(tracerr::map_from)?;
        Ok(f(staged))
    }

    async fn write<R>(
        &self,
        f: impl FnOnce(&mut Storage) -> Result<R, Error>,
    ) -> Result<R, Traced<database::Error>> {
        let mut inner = self.inner.lock().await;
        let Inner { staged, .. } = inner
            .as_mut()
            .ok_or(Error::TxFinished)
            .map_err(tracerr::wrap!())
            .map_err(tracerr::map_from)?;
        f(staged).map_err(tracerr::wrap!()).map_err(tracerr::map_from)
    }
}
