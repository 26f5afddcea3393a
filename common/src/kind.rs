//! Macros for defining kind enums.

/// Macro for defining a kind enum.
///
/// Textual representation uses `SCREAMING_SNAKE_CASE` unless another casing
/// is specified via `#[case = "..."]`. Parsing is ASCII case-insensitive,
/// while formatting always produces the canonical casing.
///
/// # Example
///
/// ```rust
/// # use common::define_kind;
///
/// define_kind! {
///     #[doc = "Shape kind."]
///     #[case = "PascalCase"]
///     enum Kind {
///         #[doc = "A cube"]
///         Cube = 1,
///
///         #[doc = "A sphere"]
///         Sphere = 2,
///     }
/// }
///
/// assert_eq!(Kind::Cube.to_string(), "Cube");
/// assert_eq!("SPHERE".parse::<Kind>(), Ok(Kind::Sphere));
/// ```
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_kind {
    (
        #[doc = $doc:literal]
        enum $name:ident {
            $(
                #[doc = $variant_doc:literal]
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        $crate::define_kind! {
            #[doc = $doc]
            #[case = "SCREAMING_SNAKE_CASE"]
            enum $name {
                $(
                    #[doc = $variant_doc]
                    $variant = $value,
                )*
            }
        }
    };

    (
        #[doc = $doc:literal]
        #[case = $case:literal]
        enum $name:ident {
            $(
                #[doc = $variant_doc:literal]
                $variant:ident = $value:expr
            ),* $(,)?
        }
    ) => {
        #[derive(
            Clone,
            Copy,
            Debug,
            $crate::private::strum::Display,
            $crate::private::strum::EnumIter,
            $crate::private::strum::EnumString,
            Eq,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
        )]
        #[cfg_attr(
            feature = "serde",
            derive(
                $crate::private::serde::Deserialize,
                $crate::private::serde::Serialize,
            ),
            serde(rename_all = $case),
        )]
        #[doc = $doc]
        #[repr(u8)]
        #[strum(serialize_all = $case, ascii_case_insensitive)]
        pub enum $name {
            $(
                 #[doc = $variant_doc]
                 $variant = $value,
            )*
        }

        impl $name {
            /// Converts this into its [`u8`] representation.
            #[must_use]
            pub const fn u8(self) -> u8 {
                self as u8
            }

            /// Returns all the variants in their declaration order.
            pub fn all() -> impl Iterator<Item = Self> {
                <Self as $crate::private::strum::IntoEnumIterator>::iter()
            }
        }

        #[cfg(feature = "postgres")]
        impl<'a> $crate::private::postgres_types::FromSql<'a> for $name {
            $crate::private::postgres_types::accepts!(INT2);

            fn from_sql(
                ty: &$crate::private::postgres_types::Type,
                raw: &[u8],
            ) -> Result<
                $name,
                Box<dyn ::std::error::Error
                    + ::core::marker::Sync
                    + ::core::marker::Send>,
            > {
                match u8::try_from(i16::from_sql(ty, raw)?)? {
                    $(
                        v if Self::$variant.u8() == v => Ok(Self::$variant),
                    )*
                    v => Err(::std::format!(
                        "invalid `{}` value: {v}",
                        ::core::stringify!($name),
                    ).into()),
                }
            }
        }

        #[cfg(feature = "postgres")]
        impl $crate::private::postgres_types::ToSql for $name {
            $crate::private::postgres_types::accepts!(INT2);
            $crate::private::postgres_types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &$crate::private::postgres_types::Type,
                w: &mut $crate::private::postgres_types::private::BytesMut,
            ) -> Result<
                $crate::private::postgres_types::IsNull,
                ::std::boxed::Box<
                    dyn ::std::error::Error
                        + ::core::marker::Sync
                        + ::core::marker::Send
                >,
            > {
                i16::from(self.u8()).to_sql(ty, w)
            }
        }
    };
}

#[cfg(test)]
mod spec {
    crate::define_kind! {
        #[doc = "Checked kind."]
        enum Screaming {
            #[doc = "First."]
            CheckedIn = 1,

            #[doc = "Second."]
            CheckedOut = 2,
        }
    }

    crate::define_kind! {
        #[doc = "Pascal kind."]
        #[case = "PascalCase"]
        enum Pascal {
            #[doc = "First."]
            Available = 1,

            #[doc = "Second."]
            UnderRepair = 2,
        }
    }

    crate::define_kind! {
        #[doc = "Snake kind."]
        #[case = "snake_case"]
        enum Snake {
            #[doc = "First."]
            CreditCard = 1,
        }
    }

    #[test]
    fn formats_in_canonical_case() {
        assert_eq!(Screaming::CheckedIn.to_string(), "CHECKED_IN");
        assert_eq!(Pascal::UnderRepair.to_string(), "UnderRepair");
        assert_eq!(Snake::CreditCard.to_string(), "credit_card");
    }

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("checked_out".parse(), Ok(Screaming::CheckedOut));
        assert_eq!("CHECKED_OUT".parse(), Ok(Screaming::CheckedOut));
        assert_eq!("available".parse(), Ok(Pascal::Available));
        assert_eq!("CREDIT_CARD".parse(), Ok(Snake::CreditCard));

        assert!("checked out".parse::<Screaming>().is_err());
        assert!("".parse::<Pascal>().is_err());
    }

    #[test]
    fn iterates_in_declaration_order() {
        assert_eq!(
            Screaming::all().collect::<Vec<_>>(),
            [Screaming::CheckedIn, Screaming::CheckedOut],
        );
        assert_eq!(Pascal::UnderRepair.u8(), 2);
    }
}
