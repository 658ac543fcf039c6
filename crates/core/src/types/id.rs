//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different BigCommerce resources.

use serde::Deserialize;

/// Wire representation accepted for any ID.
///
/// The V2 API, the V3 API, and hand-edited import files disagree on whether
/// IDs are numbers or numeric strings, so both are accepted.
#[doc(hidden)]
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum IdRepr {
    Int(i64),
    Text(String),
}

impl IdRepr {
    /// Resolve to an integer ID.
    ///
    /// # Errors
    ///
    /// Returns an error message if a string form is not a valid integer.
    pub fn into_i64(self) -> Result<i64, String> {
        match self {
            Self::Int(id) => Ok(id),
            Self::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|e| format!("invalid id {s:?}: {e}")),
        }
    }
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize` as a plain number, `Deserialize` from a number or numeric string
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>`, `Into<i64>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use coupon_migrator_core::define_id;
/// define_id!(WidgetId);
/// define_id!(GadgetId);
///
/// let widget_id = WidgetId::new(1);
/// let gadget_id = GadgetId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: WidgetId = gadget_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> ::core::result::Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let repr =
                    <$crate::types::id::IdRepr as ::serde::Deserialize>::deserialize(deserializer)?;
                repr.into_i64()
                    .map(Self)
                    .map_err(<D::Error as ::serde::de::Error>::custom)
            }
        }
    };
}

// V3 promotion resources
define_id!(PromotionId);
define_id!(PromotionCodeId);

// V2 legacy coupon resource
define_id!(LegacyCouponId);

// Storefront channel a promotion is scoped to
define_id!(ChannelId);

impl Default for ChannelId {
    /// BigCommerce's default storefront channel.
    fn default() -> Self {
        Self(1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_deserializes_from_number_and_string() {
        let from_number: PromotionId = serde_json::from_str("42").unwrap();
        let from_string: PromotionId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(from_number, from_string);
        assert_eq!(from_number.as_i64(), 42);
    }

    #[test]
    fn test_id_rejects_non_numeric_string() {
        let result: Result<LegacyCouponId, _> = serde_json::from_str("\"abc\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_id_serializes_as_number() {
        let json = serde_json::to_string(&PromotionCodeId::new(7)).unwrap();
        assert_eq!(json, "7");
    }

    #[test]
    fn test_channel_id_default() {
        assert_eq!(ChannelId::default().as_i64(), 1);
    }

    #[test]
    fn test_from_str_trims() {
        let id: LegacyCouponId = " 12 ".parse().unwrap();
        assert_eq!(id.to_string(), "12");
    }
}
