//! Compiled field table.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::error::ExtractionError;

use super::patterns::{build_pattern, default_rules, FieldRule};

lazy_static! {
    static ref RAIL_FIELD_SPEC: FieldSpec =
        FieldSpec::from_rules(default_rules()).expect("built-in field table must compile");
}

/// A field rule together with its compiled pattern.
#[derive(Debug, Clone)]
pub struct CompiledField {
    rule: FieldRule,
    regex: Regex,
}

impl CompiledField {
    fn compile(rule: FieldRule) -> Result<Self, ExtractionError> {
        let pattern = build_pattern(&rule)?;
        let regex = Regex::new(&pattern).map_err(|source| ExtractionError::Pattern {
            field: rule.name.clone(),
            source,
        })?;
        Ok(Self { rule, regex })
    }

    pub fn name(&self) -> &str {
        &self.rule.name
    }

    pub fn rule(&self) -> &FieldRule {
        &self.rule
    }

    /// Regex source the field is matched with.
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Value of the left-most match in `text`, if any.
    pub fn find(&self, text: &str) -> Option<String> {
        let caps = self.regex.captures(text)?;
        let value = caps.get(1)?.as_str().trim();
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    }
}

/// Ordered, immutable table of fields to extract.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    fields: Vec<CompiledField>,
}

impl FieldSpec {
    /// The built-in rail marking table.
    pub fn rail() -> Self {
        RAIL_FIELD_SPEC.clone()
    }

    /// Compile a table from rules, keeping their order.
    pub fn from_rules(rules: impl IntoIterator<Item = FieldRule>) -> Result<Self, ExtractionError> {
        Self { fields: Vec::new() }.with_extra_rules(rules)
    }

    /// Append rules after the existing fields.
    pub fn with_extra_rules(
        mut self,
        rules: impl IntoIterator<Item = FieldRule>,
    ) -> Result<Self, ExtractionError> {
        for rule in rules {
            let name = rule.name.trim().to_string();
            if name.is_empty() {
                return Err(ExtractionError::InvalidRule {
                    field: rule.name.clone(),
                    reason: "name is empty".to_string(),
                });
            }
            if self.fields.iter().any(|f| f.name().eq_ignore_ascii_case(&name)) {
                return Err(ExtractionError::DuplicateField(name));
            }

            let field = CompiledField::compile(FieldRule { name, ..rule })?;
            debug!("Compiled field {}: {}", field.name(), field.pattern());
            self.fields.push(field);
        }

        Ok(self)
    }

    pub fn fields(&self) -> &[CompiledField] {
        &self.fields
    }

    /// Field names in extraction order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name())
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self::rail()
    }
}
