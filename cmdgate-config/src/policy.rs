use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::constants::{GROUP_PREFIX, defaults};

/// Action a policy rule assigns to a capability group.
///
/// Variants are ordered by restrictiveness so `max` picks the stricter one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyAction {
    /// Allow execution without confirmation
    Allow,
    /// Ask the user before executing
    Confirm,
    /// Never allow execution
    Deny,
}

impl PolicyAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Confirm => "confirm",
            Self::Deny => "deny",
        }
    }

    /// The stricter of two actions.
    pub fn most_restrictive(self, other: Self) -> Self {
        self.max(other)
    }
}

impl std::fmt::Display for PolicyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy configuration: the active profile and any user-defined profiles
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// Profile used when the caller does not name one
    #[serde(default = "default_profile")]
    pub default_profile: String,

    /// User-defined profiles keyed by name
    #[serde(default)]
    pub profiles: IndexMap<String, CustomProfileConfig>,
}

fn default_profile() -> String {
    defaults::DEFAULT_PROFILE.to_string()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            default_profile: default_profile(),
            profiles: IndexMap::new(),
        }
    }
}

/// A user-defined profile.
///
/// Rules are emitted in `allow`, `confirm`, `deny` order. When
/// `default_action` is omitted an empty allow-list means "allow everything
/// not explicitly denied" and a non-empty one means "deny everything not
/// explicitly allowed".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CustomProfileConfig {
    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub allow: Vec<String>,

    #[serde(default)]
    pub confirm: Vec<String>,

    #[serde(default)]
    pub deny: Vec<String>,

    #[serde(default)]
    pub default_action: Option<PolicyAction>,
}

impl CustomProfileConfig {
    /// Action applied to groups no rule matches.
    pub fn effective_default_action(&self) -> PolicyAction {
        match self.default_action {
            Some(action) => action,
            None if self.allow.is_empty() => PolicyAction::Allow,
            None => PolicyAction::Deny,
        }
    }

    /// All `(group, action)` pairs in rule order.
    pub fn rule_entries(&self) -> impl Iterator<Item = (&str, PolicyAction)> {
        let allow = self.allow.iter().map(|g| (g.as_str(), PolicyAction::Allow));
        let confirm = self
            .confirm
            .iter()
            .map(|g| (g.as_str(), PolicyAction::Confirm));
        let deny = self.deny.iter().map(|g| (g.as_str(), PolicyAction::Deny));
        allow.chain(confirm).chain(deny)
    }
}

/// Normalize a capability group identifier to its `group:`-prefixed form.
///
/// Returns `None` for empty identifiers, empty segments, or segments containing
/// whitespace.
pub fn normalize_group_id(raw: &str) -> Option<String> {
    let lowered = raw.trim().to_ascii_lowercase();
    if lowered.is_empty() {
        return None;
    }

    let segments: Vec<&str> = lowered.split(':').collect();
    if segments
        .iter()
        .any(|segment| segment.is_empty() || segment.chars().any(char::is_whitespace))
    {
        return None;
    }

    match segments.first() {
        Some(&first) if first == GROUP_PREFIX => Some(segments.join(":")),
        _ => Some(format!("{GROUP_PREFIX}:{}", segments.join(":"))),
    }
}
