//! Structures produced by the catalog pivot.

use std::collections::HashMap;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

/// One resource re-homed under its pivot value.
///
/// Serializes as
/// `{ [key]: value, identifier: value, language, ...fields, resources: [resource] }`.
/// Language fields are applied after the generated ones and win on a name
/// collision.
#[derive(Debug, Clone, PartialEq)]
pub struct PivotRecord {
    key: Arc<str>,
    value: String,
    language: Option<Value>,
    fields: Arc<Map<String, Value>>,
    resource: Value,
}

impl PivotRecord {
    pub fn new(
        key: Arc<str>,
        value: String,
        language: Option<Value>,
        fields: Arc<Map<String, Value>>,
        resource: Value,
    ) -> Self {
        Self {
            key,
            value,
            language,
            fields,
            resource,
        }
    }

    /// Normalized pivot value.
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Identifier of the language this record came from, as found in the
    /// source.
    pub fn language(&self) -> Option<&Value> {
        self.language.as_ref()
    }

    /// The single source resource.
    pub fn resource(&self) -> &Value {
        &self.resource
    }

    /// Build the JSON object for this record.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = Map::with_capacity(self.fields.len() + 4);
        map.insert(self.key.to_string(), Value::String(self.value.clone()));
        map.insert("identifier".into(), Value::String(self.value.clone()));
        if let Some(language) = &self.language {
            map.insert("language".into(), language.clone());
        }
        for (name, value) in self.fields.iter() {
            map.insert(name.clone(), value.clone());
        }
        map.insert(
            "resources".into(),
            Value::Array(vec![self.resource.clone()]),
        );
        map
    }
}

impl Serialize for PivotRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// Records grouped by pivot value, iterated in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct PivotBuckets {
    order: Vec<String>,
    buckets: HashMap<String, Vec<PivotRecord>>,
}

impl PivotBuckets {
    /// Append a record to its bucket. Returns `true` if the bucket is new.
    pub fn push(&mut self, record: PivotRecord) -> bool {
        match self.buckets.get_mut(record.value()) {
            Some(bucket) => {
                bucket.push(record);
                false
            }
            None => {
                self.order.push(record.value().to_string());
                self.buckets
                    .insert(record.value().to_string(), vec![record]);
                true
            }
        }
    }

    pub fn get(&self, value: &str) -> Option<&[PivotRecord]> {
        self.buckets.get(value).map(Vec::as_slice)
    }

    /// Number of distinct pivot values.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Total number of records across all buckets.
    pub fn record_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Pivot values in first-seen order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Buckets in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[PivotRecord])> {
        self.order
            .iter()
            .filter_map(|value| self.get(value).map(|records| (value.as_str(), records)))
    }
}

impl Serialize for PivotBuckets {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (value, records) in self.iter() {
            map.serialize_entry(value, records)?;
        }
        map.end()
    }
}

/// The catalog re-keyed by the pivot attribute.
#[derive(Debug, Clone, Default)]
pub struct PivotedCatalog {
    /// Passed through from the source catalog
    pub catalogs: Vec<Value>,
    /// Field name for `records`, i.e. the pivot key plus `s`
    pub plural_key: String,
    pub records: Vec<PivotRecord>,
}

impl Serialize for PivotedCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // A pivot key of `catalog` makes the record list replace `catalogs`.
        if self.plural_key == "catalogs" {
            let mut map = serializer.serialize_map(Some(1))?;
            map.serialize_entry(&self.plural_key, &self.records)?;
            return map.end();
        }
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("catalogs", &self.catalogs)?;
        map.serialize_entry(&self.plural_key, &self.records)?;
        map.end()
    }
}

/// Everything the pivot derives from one catalog.
///
/// Serializes as `{ [key]: buckets, index, pivoted }`.
#[derive(Debug, Clone, Default)]
pub struct PivotResult {
    /// The pivot attribute, e.g. `subject`
    pub key: String,
    /// Records grouped by normalized value
    pub buckets: PivotBuckets,
    /// Unique per-value URLs in first-seen order
    pub index: Vec<String>,
    pub pivoted: PivotedCatalog,
}

impl PivotResult {
    pub fn plural_key(&self) -> &str {
        &self.pivoted.plural_key
    }
}

impl Serialize for PivotResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry(&self.key, &self.buckets)?;
        map.serialize_entry("index", &self.index)?;
        map.serialize_entry("pivoted", &self.pivoted)?;
        map.end()
    }
}
