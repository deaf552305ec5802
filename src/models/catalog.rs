//! Source catalog structures.
//!
//! Only the fields the pivot needs are named. Everything else in a language
//! entry is kept in an explicit remaining-fields map so it can be carried
//! verbatim into derived records.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::Result;

/// The catalog document published by the API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Catalog {
    /// Opaque metadata entries, passed through unchanged
    #[serde(default, deserialize_with = "null_as_default")]
    pub catalogs: Vec<Value>,

    /// Language entries; `None` when the field is absent
    #[serde(default)]
    pub languages: Option<Vec<Language>>,
}

impl Catalog {
    /// Decompose a JSON document into a catalog.
    ///
    /// Anything that is not a JSON object is treated as a catalog with
    /// neither `catalogs` nor `languages`.
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            log::warn!("Catalog document is not a JSON object; treating it as empty");
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Number of language entries.
    pub fn language_count(&self) -> usize {
        self.languages.as_ref().map_or(0, Vec::len)
    }

    /// Number of resources across all language entries.
    pub fn resource_count(&self) -> usize {
        self.languages
            .iter()
            .flatten()
            .map(|lang| lang.resources.len())
            .sum()
    }
}

/// A language entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Language {
    /// Language code, e.g. `ur-deva`. Carried as-is, whatever its type;
    /// `Some(Value::Null)` when the source has an explicit `null`
    #[serde(default, deserialize_with = "present")]
    pub identifier: Option<Value>,

    /// Resources available in this language
    #[serde(default, deserialize_with = "null_as_default")]
    pub resources: Vec<Value>,

    /// Every other field (`direction`, `title`, ...), in source order
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// Deserialize `null` as the type's default.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize any present value, `null` included, as `Some`.
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}
