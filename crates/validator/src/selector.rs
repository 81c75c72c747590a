//! Rule selectors
//!
//! A selector decides, per rule and per rendered path, whether the rule
//! runs in the current context. Every context carries one.

use crate::context::ValidationContext;
use crate::rule::Rule;

/// Name of the rule set that matches rules declared without one.
pub const DEFAULT_RULE_SET: &str = "default";

/// Wildcard that matches every rule set.
pub const ALL_RULE_SETS: &str = "*";

/// Decides whether a rule executes.
pub trait RuleSelector: Send + Sync {
    /// `property_path` is the rendered path the rule would report under.
    fn can_execute(&self, rule: &Rule, property_path: &str, ctx: &ValidationContext) -> bool;
}

/// Runs every rule.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSelector;

impl RuleSelector for DefaultSelector {
    fn can_execute(&self, _rule: &Rule, _property_path: &str, _ctx: &ValidationContext) -> bool {
        true
    }
}

/// Runs rules belonging to one of the named rule sets.
///
/// [`DEFAULT_RULE_SET`] matches rules with no set and [`ALL_RULE_SETS`]
/// matches everything.
#[derive(Debug, Clone, Default)]
pub struct RuleSetSelector {
    sets: Vec<String>,
}

impl RuleSetSelector {
    pub fn new<I, S>(sets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sets: sets.into_iter().map(Into::into).collect(),
        }
    }
}

impl RuleSelector for RuleSetSelector {
    fn can_execute(&self, rule: &Rule, _property_path: &str, _ctx: &ValidationContext) -> bool {
        if self.sets.iter().any(|set| set == ALL_RULE_SETS) {
            return true;
        }
        if rule.rule_sets().is_empty() {
            return self.sets.iter().any(|set| set == DEFAULT_RULE_SET);
        }
        rule.rule_sets()
            .iter()
            .any(|declared| self.sets.iter().any(|set| set == declared))
    }
}

/// Runs rules whose path is one of the listed members, lies below one of
/// them, or leads towards one of them through a nested validator.
#[derive(Debug, Clone, Default)]
pub struct MemberNameSelector {
    members: Vec<String>,
}

impl MemberNameSelector {
    pub fn new<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

fn is_below(path: &str, ancestor: &str) -> bool {
    path.strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('['))
}

impl RuleSelector for MemberNameSelector {
    fn can_execute(&self, _rule: &Rule, property_path: &str, _ctx: &ValidationContext) -> bool {
        self.members.iter().any(|member| {
            member == property_path
                || is_below(property_path, member)
                || is_below(member, property_path)
        })
    }
}
