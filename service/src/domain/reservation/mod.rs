//! [`Reservation`] definitions.

pub mod guest;
pub mod stay;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::room;
#[cfg(doc)]
use crate::domain::Room;

pub use self::{guest::Guest, stay::Stay};

/// Reservation of a [`Room`] for a [`Stay`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Reservation {
    /// ID of this [`Reservation`].
    pub id: Id,

    /// ID of the reserved [`Room`].
    pub room_id: room::Id,

    /// [`Guest`] contact snapshot of this [`Reservation`].
    pub guest: Guest,

    /// [`Stay`] this [`Reservation`] spans.
    pub stay: Stay,

    /// Number of guests staying.
    pub total_guests: GuestsCount,

    /// [`PaymentMethod`] chosen by the [`Guest`].
    pub payment_method: PaymentMethod,

    /// [`SpecialRequests`] of the [`Guest`], if any.
    pub special_requests: Option<SpecialRequests>,

    /// Total price of this [`Reservation`], fixed at its creation.
    pub total_amount: Money,

    /// Lifecycle [`Status`] of this [`Reservation`].
    pub status: Status,

    /// [`DateTime`] when this [`Reservation`] was created.
    pub created_at: CreationDateTime,
}

impl Reservation {
    /// Indicates whether this [`Reservation`] blocks its [`Room`] for its
    /// [`Stay`].
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

/// ID of a [`Reservation`].
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

/// Number of guests of a [`Reservation`], between [`GuestsCount::MIN`] and
/// [`GuestsCount::MAX`].
#[derive(
    Clone, Copy, Debug, Display, Eq, Hash, Into, Ord, PartialEq, PartialOrd,
)]
pub struct GuestsCount(u16);

impl GuestsCount {
    /// Minimal [`GuestsCount`] of a [`Reservation`].
    pub const MIN: u16 = 1;

    /// Maximal [`GuestsCount`] of a [`Reservation`].
    pub const MAX: u16 = 10;

    /// Creates a new [`GuestsCount`] if the provided `count` is in range.
    #[must_use]
    pub fn new(count: u16) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&count).then_some(Self(count))
    }
}

/// Free-form special requests of a [`Guest`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct SpecialRequests(String);

impl SpecialRequests {
    /// Creates new [`SpecialRequests`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `text` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Creates new [`SpecialRequests`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Checks whether the given `text` is valid [`SpecialRequests`].
    fn check(text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        !text.trim().is_empty() && text.len() <= 2048
    }
}

impl FromStr for SpecialRequests {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `SpecialRequests`")
    }
}

define_kind! {
    #[doc = "Method a [`Reservation`] is paid with."]
    #[case = "snake_case"]
    enum PaymentMethod {
        #[doc = "Credit card."]
        CreditCard = 1,

        #[doc = "Debit card."]
        DebitCard = 2,

        #[doc = "PayPal account."]
        Paypal = 3,

        #[doc = "Cash on arrival."]
        Cash = 4,
    }
}

define_kind! {
    #[doc = "Lifecycle status of a [`Reservation`]."]
    enum Status {
        #[doc = "Requested by a [`Guest`], awaiting confirmation."]
        Pending = 1,

        #[doc = "Confirmed by the staff."]
        Confirmed = 2,

        #[doc = "[`Guest`] has arrived."]
        CheckedIn = 3,

        #[doc = "[`Guest`] has departed."]
        CheckedOut = 4,

        #[doc = "Cancelled before the arrival."]
        Cancelled = 5,
    }
}

impl Status {
    /// [`Status`] every new [`Reservation`] starts in.
    pub const INITIAL: Self = Self::Pending;

    /// [`Status`]es blocking a [`Room`] for the [`Stay`] of a
    /// [`Reservation`].
    pub const ACTIVE: [Self; 3] =
        [Self::Pending, Self::Confirmed, Self::CheckedIn];

    /// Indicates whether a [`Reservation`] in this [`Status`] blocks its
    /// [`Room`].
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::CheckedIn)
    }

    /// Indicates whether a [`Reservation`] in this [`Status`] is immutable.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::CheckedOut | Self::Cancelled)
    }

    /// Indicates whether a [`Reservation`] may move from this [`Status`] to
    /// the `target` one.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Pending, Self::Confirmed | Self::Cancelled)
                | (Self::Confirmed, Self::CheckedIn | Self::Cancelled)
                | (Self::CheckedIn, Self::CheckedOut),
        )
    }
}

/// [`DateTime`] when a [`Reservation`] was created.
pub type CreationDateTime = DateTimeOf<(Reservation, unit::Creation)>;
