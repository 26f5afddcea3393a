//! [`Money`]-related definitions.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{fmt, str::FromStr};

#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use rust_decimal::Decimal;

/// Non-negative amount of money.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Money(Decimal);

impl Money {
    /// Zero [`Money`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`Money`] if the provided `amount` is non-negative.
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        (!amount.is_sign_negative() || amount.is_zero())
            .then(|| Self(amount.normalize()))
    }

    /// Returns the amount of this [`Money`].
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Multiplies this [`Money`] by the provided `times`.
    ///
    /// [`None`] is returned on overflow.
    #[must_use]
    pub fn checked_mul(self, times: u32) -> Option<Self> {
        self.0
            .checked_mul(Decimal::from(times))
            .map(|amount| Self(amount.normalize()))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let amount = Decimal::from_str(s.trim()).map_err(|_| "invalid amount")?;
        Self::new(amount).ok_or("negative amount")
    }
}

impl From<Money> for Decimal {
    fn from(m: Money) -> Self {
        m.0
    }
}

#[cfg(feature = "postgres")]
impl FromSql<'_> for Money {
    accepts!(NUMERIC);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        let amount = Decimal::from_sql(ty, raw)?;
        Self::new(amount)
            .ok_or_else(|| format!("negative `Money` amount: {amount}").into())
    }
}

#[cfg(feature = "postgres")]
impl ToSql for Money {
    accepts!(NUMERIC);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.0.to_sql(ty, w)
    }
}

#[cfg(feature = "serde")]
pub mod serde {
    //! Module providing integration with [`serde`] crate.

    pub mod number {
        //! Module providing serialization and deserialization of [`Money`]
        //! as a JSON number.

        use rust_decimal::{
            prelude::{FromPrimitive as _, ToPrimitive as _},
            Decimal,
        };
        use serde::{de::Error, Deserialize, Deserializer, Serializer};

        use crate::Money;

        /// Serializes the [`Money`] as a floating point number.
        ///
        /// # Errors
        ///
        /// Returns an error if the amount is not representable as [`f64`].
        pub fn serialize<S>(m: &Money, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            if let Some(n) = m.0.to_u64().filter(|_| m.0.is_integer()) {
                return serializer.serialize_u64(n);
            }
            m.0.to_f64()
                .ok_or_else(|| serde::ser::Error::custom("amount overflow"))
                .and_then(|n| serializer.serialize_f64(n))
        }

        /// Deserializes a floating point number into a [`Money`].
        ///
        /// # Errors
        ///
        /// Returns an error if the number is negative or not finite.
        pub fn deserialize<'de, D>(deserializer: D) -> Result<Money, D::Error>
        where
            D: Deserializer<'de>,
        {
            let n = f64::deserialize(deserializer)?;
            Decimal::from_f64(n)
                .and_then(Money::new)
                .ok_or_else(|| Error::custom("invalid amount"))
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::Money;

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn rejects_negative() {
        assert!(Money::new(decimal("-0.01")).is_none());
        assert!(Money::new(decimal("-100")).is_none());

        assert_eq!(Money::new(decimal("0")), Some(Money::ZERO));
        assert_eq!(Money::new(decimal("-0")), Some(Money::ZERO));
        assert!(Money::new(decimal("99.99")).is_some());
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("123.45").unwrap().amount(),
            decimal("123.45"),
        );
        assert_eq!(Money::from_str(" 100 ").unwrap().amount(), decimal("100"));

        assert!(Money::from_str("-1").is_err());
        assert!(Money::from_str("12USD").is_err());
        assert!(Money::from_str("").is_err());
    }

    #[test]
    fn to_string() {
        assert_eq!(Money::from_str("123.45").unwrap().to_string(), "123.45");
        assert_eq!(Money::from_str("123.00").unwrap().to_string(), "123");
        assert_eq!(Money::from_str("123.0").unwrap().to_string(), "123");
        assert_eq!(Money::from_str("0.50").unwrap().to_string(), "0.5");
    }

    #[test]
    fn multiplies_by_nights() {
        let price = Money::from_str("100").unwrap();
        assert_eq!(price.checked_mul(3), Money::new(decimal("300")));
        assert_eq!(price.checked_mul(0), Some(Money::ZERO));

        let price = Money::from_str("89.90").unwrap();
        assert_eq!(price.checked_mul(2), Money::new(decimal("179.8")));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_number() {
        #[derive(serde::Deserialize, serde::Serialize)]
        struct Wrapper {
            #[serde(with = "super::serde::number")]
            price: Money,
        }

        let json = serde_json::to_value(Wrapper {
            price: Money::from_str("300").unwrap(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "price": 300 }));

        let json = serde_json::to_value(Wrapper {
            price: Money::from_str("99.5").unwrap(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "price": 99.5 }));

        let w: Wrapper =
            serde_json::from_value(serde_json::json!({ "price": 120.25 }))
                .unwrap();
        assert_eq!(w.price, Money::from_str("120.25").unwrap());

        assert!(serde_json::from_value::<Wrapper>(
            serde_json::json!({ "price": -1.0 }),
        )
        .is_err());
    }
}
