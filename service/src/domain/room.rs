//! [`Room`] definitions.

use std::collections::HashSet;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hotel room available for booking.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Room {
    /// ID of this [`Room`].
    pub id: Id,

    /// Human-facing [`Number`] of this [`Room`].
    pub number: Number,

    /// [`Category`] of this [`Room`].
    pub category: Category,

    /// Price of a single night in this [`Room`].
    pub price_per_night: Money,

    /// Administrative [`Status`] of this [`Room`].
    pub status: Status,

    /// [`Feature`]s of this [`Room`].
    pub features: Vec<Feature>,

    /// [`Image`]s of this [`Room`] in their display order.
    pub images: Vec<Image>,

    /// [`DateTime`] when this [`Room`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Room`] was deleted, if it was.
    pub deleted_at: Option<DeletionDateTime>,
}

impl Room {
    /// Indicates whether this [`Room`] was deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Indicates whether this [`Room`] accepts new reservations at all.
    ///
    /// Only [`Status::Maintenance`] blocks reservations, the other
    /// [`Status`]es are informational.
    #[must_use]
    pub fn is_bookable(&self) -> bool {
        !self.is_deleted() && self.status.is_bookable()
    }
}

/// ID of a [`Room`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Human-facing number of a [`Room`], unique across non-deleted [`Room`]s.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Number(String);

impl Number {
    /// Creates a new [`Number`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `number` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Creates a new [`Number`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Number`].
    fn check(number: impl AsRef<str>) -> bool {
        let number = number.as_ref();
        number.trim() == number && !number.is_empty() && number.len() <= 32
    }
}

impl FromStr for Number {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Number`")
    }
}

/// Category of a [`Room`] (`Single`, `Double`, `Suite`, `Deluxe`, etc).
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Category(String);

impl Category {
    /// Creates a new [`Category`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `category` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(category: impl Into<String>) -> Self {
        Self(category.into())
    }

    /// Creates a new [`Category`] if the given `category` is valid.
    #[must_use]
    pub fn new(category: impl Into<String>) -> Option<Self> {
        let category = category.into();
        Self::check(&category).then_some(Self(category))
    }

    /// Indicates whether this [`Category`] contains the provided `part`,
    /// ignoring the case.
    #[must_use]
    pub fn contains(&self, part: &str) -> bool {
        self.0.to_lowercase().contains(&part.to_lowercase())
    }

    /// Checks whether the given `category` is a valid [`Category`].
    fn check(category: impl AsRef<str>) -> bool {
        let category = category.as_ref();
        category.trim() == category
            && !category.is_empty()
            && category.len() <= 128
    }
}

impl FromStr for Category {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Category`")
    }
}

/// Feature tag of a [`Room`] (`Sea view`, `Balcony`, etc).
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Feature(String);

impl Feature {
    /// Creates a new [`Feature`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `feature` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(feature: impl Into<String>) -> Self {
        Self(feature.into())
    }

    /// Creates a new [`Feature`] if the given `feature` is valid.
    #[must_use]
    pub fn new(feature: impl Into<String>) -> Option<Self> {
        let feature = feature.into();
        Self::check(&feature).then_some(Self(feature))
    }

    /// Deduplicates the provided [`Feature`]s keeping the first occurrence
    /// of each one.
    #[must_use]
    pub fn dedup(features: impl IntoIterator<Item = Self>) -> Vec<Self> {
        let mut seen = HashSet::new();
        features
            .into_iter()
            .filter(|f| seen.insert(f.clone()))
            .collect()
    }

    /// Checks whether the given `feature` is a valid [`Feature`].
    fn check(feature: impl AsRef<str>) -> bool {
        let feature = feature.as_ref();
        feature.trim() == feature && !feature.is_empty() && feature.len() <= 128
    }
}

impl FromStr for Feature {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Feature`")
    }
}

/// Opaque reference to an image of a [`Room`] (URL or storage path).
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Image(String);

impl Image {
    /// Creates a new [`Image`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `reference` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    /// Creates a new [`Image`] if the given `reference` is valid.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Option<Self> {
        let reference = reference.into();
        Self::check(&reference).then_some(Self(reference))
    }

    /// Checks whether the given `reference` is a valid [`Image`].
    fn check(reference: impl AsRef<str>) -> bool {
        let reference = reference.as_ref();
        !reference.is_empty()
            && reference.len() <= 2048
            && !reference.chars().any(char::is_whitespace)
    }
}

impl FromStr for Image {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Image`")
    }
}

define_kind! {
    #[doc = "Administrative status of a [`Room`]."]
    #[case = "PascalCase"]
    enum Status {
        #[doc = "The [`Room`] is free to be booked."]
        Available = 1,

        #[doc = "The [`Room`] is occupied by guests."]
        Occupied = 2,

        #[doc = "The [`Room`] is under maintenance and cannot be booked."]
        Maintenance = 3,

        #[doc = "The [`Room`] is reserved."]
        Reserved = 4,
    }
}

impl Status {
    /// Indicates whether a [`Room`] in this [`Status`] accepts new
    /// reservations.
    #[must_use]
    pub const fn is_bookable(self) -> bool {
        !matches!(self, Self::Maintenance)
    }
}

/// [`DateTime`] when a [`Room`] was created.
pub type CreationDateTime = DateTimeOf<(Room, unit::Creation)>;

/// [`DateTime`] when a [`Room`] was deleted.
pub type DeletionDateTime = DateTimeOf<(Room, unit::Deletion)>;
