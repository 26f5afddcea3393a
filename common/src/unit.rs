//! Marker types distinguishing lifecycle moments of an entity.
//!
//! Used as a phantom parameter of [`DateTimeOf`].
//!
//! [`DateTimeOf`]: crate::DateTimeOf

/// Moment an entity was created.
#[derive(Clone, Copy, Debug)]
pub struct Creation;

/// Moment an entity was soft-deleted.
#[derive(Clone, Copy, Debug)]
pub struct Deletion;

/// Moment an entity stops being valid.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;
