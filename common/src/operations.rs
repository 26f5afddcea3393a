//! Storage-agnostic operations a [`Handler`] may be asked to perform.
//!
//! Each operation wraps the data it acts upon, so storages implement
//! [`Handler`] once per operation and data type they support.

use std::marker::PhantomData;

use crate::Handler;

/// Persists a new `T`.
#[derive(Clone, Copy, Debug)]
pub struct Insert<T>(pub T);

/// Overwrites an already persisted `T`.
#[derive(Clone, Copy, Debug)]
pub struct Update<T>(pub T);

/// Reads whatever `T` describes.
#[derive(Clone, Copy, Debug)]
pub struct Select<T>(pub T);

/// Exclusively locks whatever `T` describes for the rest of the current
/// transaction.
#[derive(Clone, Copy, Debug)]
pub struct Lock<T>(pub T);

/// Opens a transaction, or joins the already opened one.
#[derive(Clone, Copy, Debug)]
pub struct Transact;

/// Handle a [`Handler`] resolves into on [`Transact`].
pub type Transacted<T> = <T as Handler<Transact>>::Ok;

/// Makes the changes of the current transaction durable.
#[derive(Clone, Copy, Debug)]
pub struct Commit;

/// Criteria `B` identifying a `W`.
///
/// ```rust
/// # use common::operations::By;
/// let by = By::<String, u32>::new(7);
/// assert_eq!(by.into_inner(), 7);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// What is identified.
    _what: PhantomData<W>,

    /// Criteria to identify by.
    by: B,
}

impl<W, B> By<W, B> {
    /// Wraps the provided criteria.
    #[must_use]
    pub fn new(by: B) -> Self {
        Self {
            _what: PhantomData,
            by,
        }
    }

    /// Unwraps the criteria of this [`By`].
    #[must_use]
    pub fn into_inner(self) -> B {
        self.by
    }
}
