//! Postgres [`Database`] implementation.

pub mod client;
pub mod connection;
mod impls;

use deadpool_postgres::Runtime;
use derive_more::{Deref, Display, Error as StdError, From};
use tokio_postgres::{error::SqlState, NoTls};
use tracerr::Traced;

use crate::infra::database;
#[cfg(doc)]
use crate::infra::Database;

pub use refinery::embed_migrations;

pub use self::{
    client::{NonTx, Tx},
    connection::Connection,
};

pub use deadpool_postgres::{Config, PoolConfig, Timeouts};

/// Postgres [`Database`] client.
#[derive(Clone, Copy, Debug, Deref)]
pub struct Postgres<T = NonTx>(T);

impl Postgres {
    /// Creates a new [`Postgres`] client with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If failed to create a new [`Postgres`] client.
    pub fn new(conf: &Config) -> Result<Self, Traced<database::Error>> {
        let pool = conf
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(tracerr::from_and_wrap!(=> database::Error))?;
        Ok(Self(NonTx::from_pool(pool)))
    }
}

/// Postgres database [`Error`].
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// [`Connection`] error.
    #[display("`Connection` error: {_0}")]
    Connection(connection::Error),

    /// Error of creating a new [`connection::Pool`] client.
    #[display("Failed to create a new `connection::Pool`: {_0}")]
    PoolCreationError(connection::PoolCreationError),

    /// [`connection::Pool`] error.
    #[display("`connection::Pool` error: {_0}")]
    PoolError(connection::PoolError),

    /// Connection is used after being detached from its client, or a
    /// transaction is used after being committed.
    #[display("Connection is detached already")]
    #[from(ignore)]
    Detached,
}

impl From<connection::Error> for database::Error {
    fn from(err: connection::Error) -> Self {
        Error::from(err).into()
    }
}

impl From<connection::PoolError> for database::Error {
    fn from(err: connection::PoolError) -> Self {
        Error::from(err).into()
    }
}

impl From<connection::PoolCreationError> for database::Error {
    fn from(err: connection::PoolCreationError) -> Self {
        Error::from(err).into()
    }
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        self.violates(&SqlState::UNIQUE_VIOLATION, constraint)
    }

    /// Checks if the error is an exclusion violation of the specified
    /// constraint.
    #[must_use]
    pub fn is_exclusion_violation(&self, constraint: Option<&str>) -> bool {
        self.violates(&SqlState::EXCLUSION_VIOLATION, constraint)
    }

    /// Checks if the error is raised by the specified `constraint` (or any, if
    /// [`None`]) with the provided [`SqlState`].
    fn violates(&self, state: &SqlState, constraint: Option<&str>) -> bool {
        let Self::Connection(e) = self else {
            return false;
        };
        let Some(db) = e.as_db_error() else {
            return false;
        };
        db.code() == state
            && constraint.map_or(true, |c| db.constraint() == Some(c))
    }
}
