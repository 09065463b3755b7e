//! Endpoint grouping
//!
//! Collapses families of raw endpoint ids into one logical node before they
//! reach the graph, e.g. every `10.0.0.*` address into a single `lan` node.
//! Rules are ordered; the first matching rule decides and unmatched ids pass
//! through unchanged.

use regex::Regex;

/// One rewrite rule: ids matching `pattern` become `target`.
#[derive(Debug, Clone)]
pub struct MappingRule {
    pub pattern: Regex,
    pub target: String,
}

impl MappingRule {
    pub fn new(pattern: Regex, target: impl Into<String>) -> Self {
        Self {
            pattern,
            target: target.into(),
        }
    }

    pub fn matches(&self, id: &str) -> bool {
        self.pattern.is_match(id)
    }
}

/// An ordered rule list applied to endpoint ids.
#[derive(Debug, Clone, Default)]
pub struct GroupMapper {
    rules: Vec<MappingRule>,
}

impl GroupMapper {
    pub fn new(rules: Vec<MappingRule>) -> Self {
        Self { rules }
    }

    pub fn push_rule(&mut self, rule: MappingRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[MappingRule] {
        &self.rules
    }

    /// Map an id through the rule list. First match wins.
    pub fn map<'a>(&'a self, id: &'a str) -> &'a str {
        self.rules
            .iter()
            .find(|rule| rule.matches(id))
            .map(|rule| rule.target.as_str())
            .unwrap_or(id)
    }

    /// Remove every rule mapping to `target`, returning the removed rules.
    pub fn remove(&mut self, target: &str) -> Vec<MappingRule> {
        let mut removed = Vec::new();
        self.rules.retain(|rule| {
            if rule.target == target {
                removed.push(rule.clone());
                false
            } else {
                true
            }
        });
        removed
    }
}
