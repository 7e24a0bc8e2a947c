//! Materialization mode for `iterate_or_materialize`.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::error::BlobError;

/// How `iterate_or_materialize` hands entries back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaterializeMode {
    /// Return the entry iterator for direct streaming consumption
    #[default]
    Lazy,
    /// Drain every entry into an ordered map of decoded values
    Eager,
}

impl MaterializeMode {
    /// Parse a mode name, case-insensitively.
    pub fn parse(s: &str) -> Result<Self, BlobError> {
        match s.to_ascii_lowercase().as_str() {
            "eager" => Ok(MaterializeMode::Eager),
            "lazy" => Ok(MaterializeMode::Lazy),
            _ => Err(BlobError::Configuration(format!(
                "invalid materialize mode '{s}'; expected a boolean, \"eager\" or \"lazy\""
            ))),
        }
    }

    /// Whether entries are drained into a map.
    pub fn is_eager(self) -> bool {
        matches!(self, MaterializeMode::Eager)
    }
}

impl fmt::Display for MaterializeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterializeMode::Lazy => write!(f, "lazy"),
            MaterializeMode::Eager => write!(f, "eager"),
        }
    }
}

impl From<bool> for MaterializeMode {
    fn from(eager: bool) -> Self {
        if eager {
            MaterializeMode::Eager
        } else {
            MaterializeMode::Lazy
        }
    }
}

impl FromStr for MaterializeMode {
    type Err = BlobError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A materialize setting as written by a caller or a config file.
///
/// Accepts a boolean or a mode name; validation happens in
/// [`MaterializeSetting::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MaterializeSetting {
    /// `true` for eager, `false` for lazy
    Flag(bool),
    /// `"eager"` or `"lazy"`, any case
    Named(String),
}

impl MaterializeSetting {
    /// Validate the setting.
    pub fn resolve(&self) -> Result<MaterializeMode, BlobError> {
        match self {
            MaterializeSetting::Flag(eager) => Ok(MaterializeMode::from(*eager)),
            MaterializeSetting::Named(name) => MaterializeMode::parse(name),
        }
    }
}

impl Default for MaterializeSetting {
    fn default() -> Self {
        MaterializeSetting::Flag(false)
    }
}

impl From<bool> for MaterializeSetting {
    fn from(eager: bool) -> Self {
        MaterializeSetting::Flag(eager)
    }
}

impl From<&str> for MaterializeSetting {
    fn from(name: &str) -> Self {
        MaterializeSetting::Named(name.to_owned())
    }
}

impl From<String> for MaterializeSetting {
    fn from(name: String) -> Self {
        MaterializeSetting::Named(name)
    }
}

impl From<MaterializeMode> for MaterializeSetting {
    fn from(mode: MaterializeMode) -> Self {
        MaterializeSetting::Flag(mode.is_eager())
    }
}
