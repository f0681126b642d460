//! Policy rules and rule coverage.
//!
//! Coverage works on *atomic* rules: every rule is broken down into
//! single-verb, single-group, single-resource (and single-name) pieces, and
//! each piece must be matched by one owner rule on its own. This keeps
//! `covers` sound for rules whose axes were granted by different owners.

use core::fmt;

use serde::{Deserialize, Serialize};

pub const VERB_ALL: &str = "*";
pub const API_GROUP_ALL: &str = "*";
pub const RESOURCE_ALL: &str = "*";
pub const NON_RESOURCE_ALL: &str = "*";

/// Additive permission tuple. `*` on any axis is a wildcard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    pub verbs: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_groups: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_names: Vec<String>,

    #[serde(default, rename = "nonResourceURLs", skip_serializing_if = "Vec::is_empty")]
    pub non_resource_urls: Vec<String>,
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl PolicyRule {
    /// Start a rule granting `verbs`; chain the other axes.
    pub fn new(verbs: &[&str]) -> Self {
        Self {
            verbs: strings(verbs),
            ..Self::default()
        }
    }

    pub fn groups(mut self, groups: &[&str]) -> Self {
        self.api_groups.extend(strings(groups));
        self
    }

    pub fn resources(mut self, resources: &[&str]) -> Self {
        self.resources.extend(strings(resources));
        self
    }

    pub fn names(mut self, names: &[&str]) -> Self {
        self.resource_names.extend(strings(names));
        self
    }

    pub fn urls(mut self, urls: &[&str]) -> Self {
        self.non_resource_urls.extend(strings(urls));
        self
    }

    /// Break the rule into atomic rules.
    ///
    /// Resource rules expand to group × resource × verb (× name); non-resource
    /// rules expand to url × verb. A rule naming neither resources nor URLs
    /// grants nothing and yields no pieces.
    pub fn breakdown(&self) -> Vec<PolicyRule> {
        let mut out = Vec::new();

        for group in &self.api_groups {
            for resource in &self.resources {
                for verb in &self.verbs {
                    let base = PolicyRule {
                        verbs: vec![verb.clone()],
                        api_groups: vec![group.clone()],
                        resources: vec![resource.clone()],
                        ..PolicyRule::default()
                    };
                    if self.resource_names.is_empty() {
                        out.push(base);
                    } else {
                        for name in &self.resource_names {
                            out.push(PolicyRule {
                                resource_names: vec![name.clone()],
                                ..base.clone()
                            });
                        }
                    }
                }
            }
        }

        // Non-resource URLs only combine with verbs.
        for url in &self.non_resource_urls {
            for verb in &self.verbs {
                out.push(PolicyRule {
                    verbs: vec![verb.clone()],
                    non_resource_urls: vec![url.clone()],
                    ..PolicyRule::default()
                });
            }
        }

        out
    }

    /// Whether this (owner) rule alone covers `sub`.
    pub fn covers_rule(&self, sub: &PolicyRule) -> bool {
        let verbs = has(&self.verbs, VERB_ALL) || has_all(&self.verbs, &sub.verbs);
        let groups = has(&self.api_groups, API_GROUP_ALL) || has_all(&self.api_groups, &sub.api_groups);
        let resources = has(&self.resources, RESOURCE_ALL) || has_all(&self.resources, &sub.resources);
        let urls = sub
            .non_resource_urls
            .iter()
            .all(|url| self.non_resource_urls.iter().any(|owner| non_resource_url_covers(owner, url)));

        // Names only qualify resources. An owner restricted to specific names
        // cannot cover an unrestricted request.
        let names = if sub.resources.is_empty() {
            true
        } else if sub.resource_names.is_empty() {
            self.resource_names.is_empty()
        } else {
            self.resource_names.is_empty() || has_all(&self.resource_names, &sub.resource_names)
        };

        verbs && groups && resources && names && urls
    }

    pub fn is_wildcard_everything(&self) -> bool {
        has(&self.verbs, VERB_ALL)
            && has(&self.api_groups, API_GROUP_ALL)
            && has(&self.resources, RESOURCE_ALL)
    }
}

fn has(set: &[String], value: &str) -> bool {
    set.iter().any(|s| s == value)
}

fn has_all(set: &[String], values: &[String]) -> bool {
    values.iter().all(|v| has(set, v))
}

/// `*` covers every URL, `/apis/*` covers any URL under `/apis/`.
fn non_resource_url_covers(owner: &str, requested: &str) -> bool {
    if owner == requested {
        return true;
    }
    match owner.strip_suffix('*') {
        Some(prefix) => requested.starts_with(prefix),
        None => false,
    }
}

/// Whether `owner` rules cover every rule in `servant`.
///
/// Returns the atomic rules that are not covered (empty when covered).
pub fn covers(owner: &[PolicyRule], servant: &[PolicyRule]) -> (bool, Vec<PolicyRule>) {
    let uncovered: Vec<PolicyRule> = servant
        .iter()
        .flat_map(PolicyRule::breakdown)
        .filter(|sub| !owner.iter().any(|o| o.covers_rule(sub)))
        .collect();

    (uncovered.is_empty(), uncovered)
}

impl fmt::Display for PolicyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.api_groups.is_empty() {
            parts.push(format!("APIGroups:{:?}", self.api_groups));
        }
        if !self.resources.is_empty() {
            parts.push(format!("Resources:{:?}", self.resources));
        }
        if !self.resource_names.is_empty() {
            parts.push(format!("ResourceNames:{:?}", self.resource_names));
        }
        if !self.non_resource_urls.is_empty() {
            parts.push(format!("NonResourceURLs:{:?}", self.non_resource_urls));
        }
        parts.push(format!("Verbs:{:?}", self.verbs));
        write!(f, "{{{}}}", parts.join(", "))
    }
}
