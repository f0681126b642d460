//! Equality-based label/field selectors used to filter list results.
//!
//! Grammar: comma-separated terms, each `key=value`, `key==value` or
//! `key!=value`. The empty string selects everything.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::object::Object;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SelectorParseError {
    #[error("invalid selector term '{0}': expected key=value or key!=value")]
    InvalidTerm(String),

    #[error("empty key in selector term '{0}'")]
    EmptyKey(String),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum Operator {
    Equals,
    NotEquals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Requirement {
    key: String,
    op: Operator,
    value: String,
}

impl Requirement {
    fn matches(&self, set: &BTreeMap<String, String>) -> bool {
        match self.op {
            Operator::Equals => set.get(&self.key) == Some(&self.value),
            // A missing key satisfies `!=`.
            Operator::NotEquals => set.get(&self.key) != Some(&self.value),
        }
    }
}

fn parse_requirements(s: &str) -> Result<Vec<Requirement>, SelectorParseError> {
    let mut out = Vec::new();
    for term in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (key, op, value) = if let Some((k, v)) = term.split_once("!=") {
            (k, Operator::NotEquals, v)
        } else if let Some((k, v)) = term.split_once("==") {
            (k, Operator::Equals, v)
        } else if let Some((k, v)) = term.split_once('=') {
            (k, Operator::Equals, v)
        } else {
            return Err(SelectorParseError::InvalidTerm(term.to_string()));
        };

        let key = key.trim();
        if key.is_empty() {
            return Err(SelectorParseError::EmptyKey(term.to_string()));
        }
        out.push(Requirement {
            key: key.to_string(),
            op,
            value: value.trim().to_string(),
        });
    }
    Ok(out)
}

/// Selector over an object's labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSelector {
    requirements: Vec<Requirement>,
}

impl LabelSelector {
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn parse(s: &str) -> Result<Self, SelectorParseError> {
        Ok(Self { requirements: parse_requirements(s)? })
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

/// Selector over an object's selectable fields (e.g. `metadata.name`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSelector {
    requirements: Vec<Requirement>,
}

impl FieldSelector {
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn parse(s: &str) -> Result<Self, SelectorParseError> {
        Ok(Self { requirements: parse_requirements(s)? })
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn matches(&self, fields: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(fields))
    }
}

/// Label + field filter applied to list results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionPredicate {
    pub label: LabelSelector,
    pub field: FieldSelector,
}

impl SelectionPredicate {
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn new(label: LabelSelector, field: FieldSelector) -> Self {
        Self { label, field }
    }

    pub fn parse(label: &str, field: &str) -> Result<Self, SelectorParseError> {
        Ok(Self {
            label: LabelSelector::parse(label)?,
            field: FieldSelector::parse(field)?,
        })
    }

    pub fn is_everything(&self) -> bool {
        self.label.is_empty() && self.field.is_empty()
    }

    pub fn matches_attrs(
        &self,
        labels: &BTreeMap<String, String>,
        fields: &BTreeMap<String, String>,
    ) -> bool {
        self.label.matches(labels) && self.field.matches(fields)
    }

    pub fn matches<T: Object>(&self, obj: &T) -> bool {
        if self.is_everything() {
            return true;
        }
        self.matches_attrs(&obj.metadata().labels, &obj.selectable_fields())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn empty_selector_matches_everything() {
        let sel = LabelSelector::parse("").unwrap();
        assert!(sel.is_empty());
        assert!(sel.matches(&set(&[])));
        assert!(sel.matches(&set(&[("a", "b")])));
    }

    #[test]
    fn equality_and_inequality_terms() {
        let sel = LabelSelector::parse("app=web, tier!=db").unwrap();
        assert!(sel.matches(&set(&[("app", "web")])));
        assert!(sel.matches(&set(&[("app", "web"), ("tier", "frontend")])));
        assert!(!sel.matches(&set(&[("app", "web"), ("tier", "db")])));
        assert!(!sel.matches(&set(&[("app", "api")])));

        let double = LabelSelector::parse("app==web").unwrap();
        assert!(double.matches(&set(&[("app", "web")])));
    }

    #[test]
    fn malformed_terms_are_rejected() {
        assert_eq!(
            LabelSelector::parse("app").unwrap_err(),
            SelectorParseError::InvalidTerm("app".to_string())
        );
        assert!(matches!(
            FieldSelector::parse("=x").unwrap_err(),
            SelectorParseError::EmptyKey(_)
        ));
    }

    #[test]
    fn predicate_combines_labels_and_fields() {
        let pred = SelectionPredicate::parse("team=infra", "metadata.name=view").unwrap();
        assert!(pred.matches_attrs(&set(&[("team", "infra")]), &set(&[("metadata.name", "view")])));
        assert!(!pred.matches_attrs(&set(&[("team", "infra")]), &set(&[("metadata.name", "edit")])));
        assert!(SelectionPredicate::everything().is_everything());
    }
}
