//! [`Handler`] abstraction shared by commands, queries and storages.

use std::future::Future;

/// Asynchronous unit of work taking `Args` and resolving into a [`Result`].
///
/// Commands, queries and database operations are all expressed as
/// [`Handler`]s over their own argument types, so a single type may handle
/// many of them.
pub trait Handler<Args = ()> {
    /// Value produced on success.
    type Ok;

    /// Error produced on failure.
    type Err;

    /// Runs this [`Handler`] over the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}
