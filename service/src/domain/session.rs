//! [`Session`] definitions.

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, FromStr};
use regex::Regex;
use serde::{Deserialize, Serialize};

#[cfg(doc)]
use crate::domain::Reservation;
use crate::domain::reservation::guest::Email;

/// Authenticated session, encoded as [JWT] claims.
///
/// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Session {
    /// Subject of this [`Session`]: staff [`Login`] or guest [`Email`].
    #[serde(rename = "sub")]
    pub subject: String,

    /// [`Role`] this [`Session`] grants.
    pub role: Role,

    /// [`DateTime`] when this [`Session`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

impl Session {
    /// Resolves the [`Initiator`] acting with this [`Session`].
    ///
    /// [`None`] is returned if the subject doesn't fit the [`Role`].
    #[must_use]
    pub fn initiator(&self) -> Option<Initiator> {
        match self.role {
            Role::Staff => Some(Initiator::Staff),
            Role::Guest => {
                Email::new(self.subject.clone()).map(Initiator::Guest)
            }
        }
    }
}

define_kind! {
    #[doc = "Role granted by a [`Session`]."]
    enum Role {
        #[doc = "Hotel staff, managing the whole inventory."]
        Staff = 1,

        #[doc = "Guest, owning their [`Reservation`]s."]
        Guest = 2,
    }
}

/// Party performing an operation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Initiator {
    /// Hotel staff.
    Staff,

    /// Guest identified by the [`Email`] of their [`Reservation`]s.
    Guest(Email),
}

impl Initiator {
    /// Indicates whether this [`Initiator`] is the hotel staff.
    #[must_use]
    pub const fn is_staff(&self) -> bool {
        matches!(self, Self::Staff)
    }

    /// Indicates whether this [`Initiator`] may access data of the guest
    /// with the provided [`Email`].
    #[must_use]
    pub fn can_access(&self, email: &Email) -> bool {
        match self {
            Self::Staff => true,
            Self::Guest(own) => own == email,
        }
    }
}

/// Login of the hotel staff.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
pub struct Login(String);

impl Login {
    /// Creates a new [`Login`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `login` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(login: impl Into<String>) -> Self {
        Self(login.into())
    }

    /// Creates a new [`Login`] if the given `login` is valid.
    #[must_use]
    pub fn new(login: impl Into<String>) -> Option<Self> {
        let login = login.into();
        Self::check(&login).then_some(Self(login))
    }

    /// Checks whether the given `login` is a valid [`Login`].
    fn check(login: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Login`] invariants:
        /// - Must not start/end with whitespace;
        /// - Must contain only letters, digits, `.`, `_` and `-`;
        /// - Must be between 2 and 64 characters long.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[\p{L}\p{N}._-]{2,64}$").expect("valid regex")
        });

        REGEX.is_match(login.as_ref())
    }
}

impl FromStr for Login {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Login`")
    }
}

/// Access token of a [`Session`].
#[derive(AsRef, Clone, Debug, Display, FromStr)]
#[as_ref(str, String)]
pub struct Token(String);

impl Token {
    /// Creates a new [`Token`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The provided `token` must be a valid [`Token`] representation.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(token: String) -> Self {
        Self(token)
    }
}

/// [`DateTime`] of a [`Session`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Session, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use common::DateTime;

    use super::{Email, Initiator, Login, Role, Session};

    #[test]
    fn resolves_initiator() {
        let staff = Session {
            subject: "admin".into(),
            role: Role::Staff,
            expires_at: DateTime::now().coerce(),
        };
        assert_eq!(staff.initiator(), Some(Initiator::Staff));

        let guest = Session {
            subject: "jane@example.com".into(),
            role: Role::Guest,
            expires_at: DateTime::now().coerce(),
        };
        assert_eq!(
            guest.initiator(),
            Some(Initiator::Guest(Email::new("jane@example.com").unwrap())),
        );

        let broken = Session {
            subject: "not an email".into(),
            ..guest
        };
        assert_eq!(broken.initiator(), None);
    }

    #[test]
    fn guest_accesses_only_own_data() {
        let jane = Email::new("jane@example.com").unwrap();
        let john = Email::new("john@example.com").unwrap();

        assert!(Initiator::Staff.can_access(&jane));
        assert!(Initiator::Guest(jane.clone()).can_access(&jane));
        assert!(!Initiator::Guest(jane).can_access(&john));
    }

    #[test]
    fn validates_login() {
        assert!(Login::new("admin").is_some());
        assert!(Login::new("front-desk.1").is_some());
        assert!(Login::new("a").is_none());
        assert!(Login::new("front desk").is_none());
    }

    #[test]
    fn encodes_role_in_screaming_case() {
        assert_eq!(Role::Staff.to_string(), "STAFF");
        assert_eq!(
            serde_json::to_string(&Role::Guest).unwrap(),
            r#""GUEST""#,
        );
    }
}
