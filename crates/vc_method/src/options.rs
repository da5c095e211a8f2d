//! Option bundles selecting how procedures are compiled.
//!
//! Both records are plain `Copy` values: they take part in cache keys and
//! a conversion's overrides derive a new record for its subtree instead of
//! mutating the caller's.
//!
//! They deserialize from any serde format, missing keys taking the
//! default value:
//!
//! ```
//! use vc_method::SerializationOptions;
//!
//! let options: SerializationOptions =
//!     serde_json::from_str(r#"{"exclude_none": true, "pass_through": {"collections": true}}"#).unwrap();
//!
//! assert!(options.exclude_none);
//! assert!(options.exclude_unset);
//! assert!(options.pass_through.collections);
//! ```

use alloc::string::String;
use alloc::sync::Arc;

use serde::Deserialize;

use crate::conversion::ConversionOverrides;

// -----------------------------------------------------------------------------
// AliasStyle

/// How field names without an explicit alias are exposed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AliasStyle {
    #[default]
    AsIs,
    CamelCase,
}

impl AliasStyle {
    pub fn apply(self, name: &str) -> Arc<str> {
        match self {
            Self::AsIs => name.into(),
            Self::CamelCase => {
                let mut out = String::with_capacity(name.len());
                let mut upper = false;
                for (index, ch) in name.chars().enumerate() {
                    if ch == '_' && index > 0 {
                        upper = true;
                    } else if upper {
                        out.extend(ch.to_uppercase());
                        upper = false;
                    } else {
                        out.push(ch);
                    }
                }
                out.into()
            }
        }
    }
}

// -----------------------------------------------------------------------------
// PassThrough

/// Kinds of values handed back untouched when no conversion is needed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct PassThrough {
    /// `Any` typed values are returned as they are.
    pub any: bool,
    /// Sets, tuples and mappings of identity items are returned as they are.
    pub collections: bool,
    /// Enum members are returned as they are.
    pub enums: bool,
}

// -----------------------------------------------------------------------------
// SerializationOptions

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct SerializationOptions {
    /// Verify each value's class before converting it.
    pub check_type: bool,
    /// Serialize by run-time class when the static type does not match.
    pub fall_back_on_any: bool,
    /// Only emit fields that were explicitly set.
    pub exclude_unset: bool,
    /// Leave out fields equal to their default.
    pub exclude_defaults: bool,
    /// Leave out null fields.
    pub exclude_none: bool,
    pub pass_through: PassThrough,
    pub aliaser: AliasStyle,
}

impl Default for SerializationOptions {
    fn default() -> Self {
        Self {
            check_type: false,
            fall_back_on_any: false,
            exclude_unset: true,
            exclude_defaults: false,
            exclude_none: false,
            pass_through: PassThrough::default(),
            aliaser: AliasStyle::AsIs,
        }
    }
}

impl SerializationOptions {
    /// Derives the options of a converted subtree.
    pub fn overridden(self, overrides: &ConversionOverrides) -> Self {
        Self {
            exclude_unset: overrides.exclude_unset.unwrap_or(self.exclude_unset),
            fall_back_on_any: overrides.fall_back_on_any.unwrap_or(self.fall_back_on_any),
            ..self
        }
    }
}

// -----------------------------------------------------------------------------
// DeserializationOptions

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(default)]
pub struct DeserializationOptions {
    /// Accept and ignore unknown object keys.
    pub additional_properties: bool,
    /// Convert strings and numbers to the expected primitive.
    pub coerce: bool,
    /// Replace invalid optional fields by their default.
    pub fall_back_on_default: bool,
    pub aliaser: AliasStyle,
}

impl DeserializationOptions {
    /// Derives the options of a converted subtree.
    pub fn overridden(self, overrides: &ConversionOverrides) -> Self {
        Self {
            additional_properties: overrides
                .additional_properties
                .unwrap_or(self.additional_properties),
            coerce: overrides.coerce.unwrap_or(self.coerce),
            fall_back_on_default: overrides
                .fall_back_on_default
                .unwrap_or(self.fall_back_on_default),
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camel_case() {
        assert_eq!(&*AliasStyle::CamelCase.apply("foo_bar_baz"), "fooBarBaz");
        assert_eq!(&*AliasStyle::CamelCase.apply("_private"), "_private");
        assert_eq!(&*AliasStyle::AsIs.apply("foo_bar"), "foo_bar");
    }

    #[test]
    fn overrides_only_touch_given_options() {
        let overrides = ConversionOverrides {
            fall_back_on_any: Some(true),
            ..Default::default()
        };
        let options = SerializationOptions::default().overridden(&overrides);
        assert!(options.fall_back_on_any);
        assert!(options.exclude_unset);

        let overrides = ConversionOverrides {
            additional_properties: Some(true),
            ..Default::default()
        };
        let options = DeserializationOptions::default().overridden(&overrides);
        assert!(options.additional_properties);
        assert!(!options.coerce);
    }

    #[test]
    fn load_from_config() {
        let options: DeserializationOptions =
            serde_json::from_str(r#"{"coerce": true, "aliaser": "camel_case"}"#).unwrap();
        assert!(options.coerce);
        assert_eq!(options.aliaser, AliasStyle::CamelCase);
        assert!(!options.additional_properties);
    }
}
