//! Plain and compound entry identifiers.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Identifier of one entry in a blob.
///
/// A single part is stored as its plain string. Several parts (for example
/// histogram name, process and channel) are stored as the JSON text of the
/// parts array, e.g. `["njets","ttH","2lss"]`. A stored string that starts
/// with `[` but is not an array of strings reads back as a single part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HistKey {
    parts: Vec<String>,
}

impl HistKey {
    /// Create a single-part key.
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            parts: vec![name.into()],
        }
    }

    /// Create a compound key from its parts.
    pub fn compound<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// All parts of the key.
    pub fn parts(&self) -> &[String] {
        &self.parts
    }

    /// Whether the key has more than one part.
    pub fn is_compound(&self) -> bool {
        self.parts.len() > 1
    }

    /// Text form used as the JSON object key.
    pub fn to_key_string(&self) -> String {
        match self.parts.as_slice() {
            [single] => single.clone(),
            parts => serde_json::to_string(parts).unwrap_or_default(),
        }
    }

    /// Parse the text form written by [`HistKey::to_key_string`].
    pub fn from_key_str(s: &str) -> Self {
        if s.starts_with('[') {
            if let Ok(parts) = serde_json::from_str::<Vec<String>>(s) {
                return Self { parts };
            }
        }
        Self::name(s)
    }
}

impl fmt::Display for HistKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.parts.join("/"))
    }
}

impl From<&str> for HistKey {
    fn from(s: &str) -> Self {
        Self::name(s)
    }
}

impl From<String> for HistKey {
    fn from(s: String) -> Self {
        Self::name(s)
    }
}

impl Serialize for HistKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_key_string())
    }
}

impl<'de> Deserialize<'de> for HistKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;

        impl de::Visitor<'_> for KeyVisitor {
            type Value = HistKey;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a histogram key string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<HistKey, E> {
                Ok(HistKey::from_key_str(v))
            }
        }

        deserializer.deserialize_str(KeyVisitor)
    }
}
