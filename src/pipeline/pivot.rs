//! Catalog pivot.
//!
//! Re-keys a language-first catalog by a resource attribute. Every resource
//! carrying the attribute becomes one [`PivotRecord`] that inherits its
//! language's fields, and records sharing a value are grouped together.
//!
//! ```text
//! languages[ur-deva].resources[{subject: "Translation Notes"}]
//!     -> subjects[{subject: "Translation_Notes", language: "ur-deva", ...}]
//!     -> index["https://api.door43.org/v3/subjects/Translation_Notes.json"]
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::models::{
    Catalog, INDEX_BASE_URL, PivotBuckets, PivotRecord, PivotResult, PivotedCatalog,
};

/// Pivot a catalog on `key`, writing index URLs under the public API.
pub fn pivot(catalog: &Catalog, key: &str) -> PivotResult {
    pivot_with_base(catalog, key, INDEX_BASE_URL)
}

/// Pivot a catalog on `key`, writing index URLs under `base_url`.
pub fn pivot_with_base(catalog: &Catalog, key: &str, base_url: &str) -> PivotResult {
    let plural_key = plural(key);
    let base_url = base_url.trim_end_matches('/');
    let shared_key: Arc<str> = Arc::from(key);

    let mut result = PivotResult {
        key: key.to_string(),
        buckets: PivotBuckets::default(),
        index: Vec::new(),
        pivoted: PivotedCatalog {
            catalogs: catalog.catalogs.clone(),
            plural_key: plural_key.clone(),
            records: Vec::new(),
        },
    };

    let Some(languages) = &catalog.languages else {
        return result;
    };

    let mut seen_urls = HashSet::new();

    for language in languages {
        let fields = Arc::new(language.fields.clone());

        for resource in &language.resources {
            let Some(value) = pivot_value(resource, key) else {
                continue;
            };

            let record = PivotRecord::new(
                Arc::clone(&shared_key),
                value.clone(),
                language.identifier.clone(),
                Arc::clone(&fields),
                resource.clone(),
            );

            result.buckets.push(record.clone());

            let url = format!("{base_url}/{plural_key}/{value}.json");
            if seen_urls.insert(url.clone()) {
                result.index.push(url);
            }

            result.pivoted.records.push(record);
        }
    }

    log::debug!(
        "Pivoted {} records into {} {}",
        result.pivoted.records.len(),
        result.buckets.len(),
        plural_key
    );

    result
}

/// Field name that holds the pivoted records.
pub fn plural(key: &str) -> String {
    format!("{key}s")
}

/// Replace every whitespace character with `_`.
///
/// Whitespace is the ECMAScript `\s` set. Unlike [`char::is_whitespace`] it
/// includes U+FEFF and leaves U+0085 (NEL) alone.
pub fn normalize(value: &str) -> String {
    value
        .chars()
        .map(|c| if is_space(c) { '_' } else { c })
        .collect()
}

fn is_space(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\u{b}'
            | '\u{c}'
            | '\r'
            | ' '
            | '\u{a0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200a}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202f}'
            | '\u{205f}'
            | '\u{3000}'
            | '\u{feff}'
    )
}

/// Normalized pivot value of a resource, if it has a usable one.
///
/// Missing, non-string, empty and whitespace-only values are skipped.
fn pivot_value(resource: &Value, key: &str) -> Option<String> {
    let raw = resource.get(key)?.as_str()?;
    if raw.chars().all(is_space) {
        return None;
    }
    Some(normalize(raw))
}
