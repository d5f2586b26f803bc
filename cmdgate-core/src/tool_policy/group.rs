use std::fmt;
use std::str::FromStr;

use cmdgate_config::normalize_group_id;
use serde::{Deserialize, Serialize};

use crate::error::PolicyError;

pub const FS: &str = "group:fs";
pub const FS_READ: &str = "group:fs:read";
pub const FS_WRITE: &str = "group:fs:write";
pub const RUNTIME: &str = "group:runtime";
pub const RUNTIME_SHELL: &str = "group:runtime:shell";
pub const WEB: &str = "group:web";
pub const GIT: &str = "group:git";
pub const GIT_READ: &str = "group:git:read";
pub const GIT_WRITE: &str = "group:git:write";
pub const DANGEROUS: &str = "group:dangerous";

/// Groups every built-in profile rules on at the top level.
pub const TOP_LEVEL_GROUPS: &[&str] = &[FS, RUNTIME, WEB, GIT, DANGEROUS];

/// Hierarchical capability identifier such as `group:fs:write`.
///
/// Always stored normalized: lowercase, `group:`-prefixed, no empty segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CapabilityGroup(String);

impl CapabilityGroup {
    pub fn parse(raw: &str) -> Result<Self, PolicyError> {
        normalize_group_id(raw)
            .map(Self)
            .ok_or_else(|| PolicyError::InvalidGroup(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(':')
    }

    /// Number of colon-separated segments, the rule specificity.
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Whether `self` equals `other` or is one of its ancestors.
    pub fn covers(&self, other: &CapabilityGroup) -> bool {
        other.0 == self.0
            || other
                .0
                .strip_prefix(self.0.as_str())
                .is_some_and(|rest| rest.starts_with(':'))
    }

    /// The group itself followed by each ancestor, most specific first.
    pub fn ancestors(&self) -> impl Iterator<Item = CapabilityGroup> + '_ {
        let segments: Vec<&str> = self.segments().collect();
        (1..=segments.len())
            .rev()
            .map(move |len| Self(segments[..len].join(":")))
    }
}

impl fmt::Display for CapabilityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CapabilityGroup {
    type Err = PolicyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<String> for CapabilityGroup {
    type Error = PolicyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CapabilityGroup> for String {
    fn from(group: CapabilityGroup) -> Self {
        group.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalizes_prefix_and_case() {
        assert_eq!(
            CapabilityGroup::parse("fs:write").unwrap(),
            CapabilityGroup::parse("GROUP:FS:Write").unwrap()
        );
        assert_eq!(CapabilityGroup::parse("web").unwrap().as_str(), WEB);
    }

    #[test]
    fn rejects_malformed_groups() {
        for raw in ["", "group::x", "fs:", "a b"] {
            assert_eq!(
                CapabilityGroup::parse(raw),
                Err(PolicyError::InvalidGroup(raw.to_string()))
            );
        }
    }

    #[test]
    fn covers_whole_segments_only() {
        let fs = CapabilityGroup::parse(FS).unwrap();
        assert!(fs.covers(&CapabilityGroup::parse(FS_WRITE).unwrap()));
        assert!(fs.covers(&fs));
        assert!(!fs.covers(&CapabilityGroup::parse("group:fsx").unwrap()));
        assert!(!CapabilityGroup::parse(FS_WRITE).unwrap().covers(&fs));
    }

    #[test]
    fn ancestors_run_from_specific_to_general() {
        let group = CapabilityGroup::parse("fs:write:tmp").unwrap();
        let chain: Vec<String> = group.ancestors().map(String::from).collect();
        assert_eq!(
            chain,
            vec!["group:fs:write:tmp", "group:fs:write", "group:fs", "group"]
        );
        assert_eq!(group.depth(), 4);
    }

    #[test]
    fn serde_round_trips_through_strings() {
        let group: CapabilityGroup = serde_json::from_str("\"git:read\"").unwrap();
        assert_eq!(group.as_str(), GIT_READ);
        assert!(serde_json::from_str::<CapabilityGroup>("\"git::read\"").is_err());
    }
}
