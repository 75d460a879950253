//! Extraction result: one entry per field, in table order.

use std::fmt;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Mapping from field name to the extracted value, or `None` when the field
/// was not found.
///
/// Every field of the table that produced it appears exactly once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    entries: Vec<(String, Option<String>)>,
}

impl ExtractionResult {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: impl Into<String>, value: Option<String>) {
        self.entries.push((name.into(), value));
    }

    /// Value for `name`. Outer `None` means the field is not part of the
    /// table; inner `None` means it was not found in the text.
    pub fn get(&self, name: &str) -> Option<Option<&str>> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_deref())
    }

    /// Found value for `name`, flattening "unknown field" and "not found".
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_deref()))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Fields that matched, in table order.
    pub fn found(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .filter_map(|(n, v)| v.as_deref().map(|v| (n.as_str(), v)))
    }

    /// Names of fields that did not match.
    pub fn missing(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(n, _)| n.as_str())
    }

    pub fn found_count(&self) -> usize {
        self.entries.iter().filter(|(_, v)| v.is_some()).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl fmt::Display for ExtractionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in self.iter() {
            writeln!(f, "{}: {}", name, value.unwrap_or("(not found)"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ExtractionResult {
        let mut result = ExtractionResult::default();
        result.push("DATE", Some("2024-05-01".to_string()));
        result.push("TIME", None);
        result
    }

    #[test]
    fn test_lookup() {
        let result = sample();
        assert_eq!(result.get("DATE"), Some(Some("2024-05-01")));
        assert_eq!(result.get("TIME"), Some(None));
        assert_eq!(result.get("KM"), None);
        assert_eq!(result.value("DATE"), Some("2024-05-01"));
        assert_eq!(result.value("TIME"), None);
    }

    #[test]
    fn test_found_and_missing() {
        let result = sample();
        assert_eq!(result.found().collect::<Vec<_>>(), vec![("DATE", "2024-05-01")]);
        assert_eq!(result.missing().collect::<Vec<_>>(), vec!["TIME"]);
        assert_eq!(result.found_count(), 1);
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_serializes_in_order_with_nulls() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(json, r#"{"DATE":"2024-05-01","TIME":null}"#);
    }

    #[test]
    fn test_display() {
        assert_eq!(sample().to_string(), "DATE: 2024-05-01\nTIME: (not found)\n");
    }
}
