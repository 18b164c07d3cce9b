//! Resource selection rules for a KCLRun.
//!
//! Matching is exact string comparison only. A document matches when it satisfies every
//! non-empty rule category; an empty [`MatchConstraintsSpec`] matches everything.

use crate::core::kube::KubeObject;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Selection rule set over the documents of a batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchConstraintsSpec {
    /// Group/version/kind alternatives; a document must satisfy at least one.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_rules: Vec<ResourceRule>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<String>,
    /// Every pair must be present on the document with an equal value.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub label_selector: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotation_selector: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRule {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_groups: Vec<String>,
    /// Either a bare version (`v1`) or a full `group/version`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_versions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kinds: Vec<String>,
}

impl MatchConstraintsSpec {
    pub fn is_empty(&self) -> bool {
        self.resource_rules.is_empty()
            && self.names.is_empty()
            && self.namespaces.is_empty()
            && self.label_selector.is_empty()
            && self.annotation_selector.is_empty()
    }
}

impl ResourceRule {
    /// Shorthand for a rule over one `apiVersion`/`kind` pair, e.g. `("apps/v1", "Deployment")`.
    pub fn for_kind(api_version: &str, kind: &str) -> Self {
        let (group, _) = api_version.rsplit_once('/').unwrap_or(("", api_version));
        Self {
            api_groups: vec![group.to_string()],
            api_versions: vec![api_version.to_string()],
            kinds: vec![kind.to_string()],
        }
    }

    fn matches(&self, object: &KubeObject) -> bool {
        let (group, version) = object.group_version();
        contains(&self.api_groups, group)
            && self.version_matches(object.api_version(), version)
            && contains(&self.kinds, object.kind())
    }

    fn version_matches(&self, api_version: &str, version: &str) -> bool {
        self.api_versions.is_empty()
            || self.api_versions.iter().any(|entry| {
                (entry.contains('/') && entry == api_version) || entry == version
            })
    }
}

/// Check whether `object` satisfies `constraints`.
pub fn matches(object: &KubeObject, constraints: &MatchConstraintsSpec) -> bool {
    if !constraints.resource_rules.is_empty()
        && !constraints
            .resource_rules
            .iter()
            .any(|rule| rule.matches(object))
    {
        return false;
    }
    if !constraints.names.is_empty() && !constraints.names.iter().any(|n| n == object.name()) {
        return false;
    }
    if !constraints.namespaces.is_empty()
        && !constraints
            .namespaces
            .iter()
            .any(|ns| ns == object.namespace())
    {
        return false;
    }
    selector_matches(&constraints.label_selector, |key| object.label(key))
        && selector_matches(&constraints.annotation_selector, |key| {
            object.annotation(key)
        })
}

fn contains(entries: &[String], value: &str) -> bool {
    entries.is_empty() || entries.iter().any(|entry| entry == value)
}

fn selector_matches<'a, F>(selector: &BTreeMap<String, String>, lookup: F) -> bool
where
    F: Fn(&str) -> Option<&'a str>,
{
    selector
        .iter()
        .all(|(key, expected)| lookup(key) == Some(expected.as_str()))
}
