use std::{collections::BTreeMap, str::FromStr};

use crate::error::Error;

/// Projection of a field whose schema occurrence is optional or nillable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionalStyle {
    /// `Option<T>`.
    Option,
    /// `Option<Box<T>>`, for deep or recursive object graphs.
    Pointer,
    /// Plain `T`, absent fields filled with `Default::default()`.
    Sentinel,
}

impl FromStr for OptionalStyle {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "option" => Ok(OptionalStyle::Option),
            "pointer" => Ok(OptionalStyle::Pointer),
            "sentinel" => Ok(OptionalStyle::Sentinel),
            other => Err(Error::InvalidOption {
                option: "optional-style",
                value: other.to_owned(),
            }),
        }
    }
}

/// Projection of an XSD enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumStyle {
    /// A Rust enum with one variant per value plus an escape variant for
    /// values the schema snapshot does not know.
    Variant,
    /// A plain `String` alias.
    String,
}

impl FromStr for EnumStyle {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "variant" => Ok(EnumStyle::Variant),
            "string" => Ok(EnumStyle::String),
            other => Err(Error::InvalidOption {
                option: "enum-style",
                value: other.to_owned(),
            }),
        }
    }
}

/// Generation settings, all overridable from the command line.
#[derive(Debug, Clone)]
pub struct Options {
    /// Service name to module name overrides.
    pub packages: BTreeMap<String, String>,
    /// Namespace URI to identifier prefix. Types from a mapped namespace
    /// have the prefix prepended, which is how cross-namespace local-name
    /// collisions are resolved.
    pub namespace_prefixes: BTreeMap<String, String>,
    pub optional_style: OptionalStyle,
    pub enum_style: EnumStyle,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            packages: BTreeMap::new(),
            namespace_prefixes: BTreeMap::new(),
            optional_style: OptionalStyle::Option,
            enum_style: EnumStyle::Variant,
        }
    }
}
