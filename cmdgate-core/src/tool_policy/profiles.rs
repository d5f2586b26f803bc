use std::fmt;

use cmdgate_config::constants::{BUILTIN_PROFILE_NAMES, defaults};
use cmdgate_config::{CustomProfileConfig, PolicyAction, PolicyConfig};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::group::{self, CapabilityGroup};
use crate::error::PolicyError;

/// A single `group -> action` assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub group: CapabilityGroup,
    pub action: PolicyAction,
}

impl PolicyRule {
    pub fn new(group: CapabilityGroup, action: PolicyAction) -> Self {
        Self { group, action }
    }
}

/// How an action was reached for one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub group: CapabilityGroup,
    pub action: PolicyAction,
    /// Rule that decided, `None` when the profile default applied
    pub matched_rule: Option<PolicyRule>,
}

impl Resolution {
    pub fn used_default(&self) -> bool {
        self.matched_rule.is_none()
    }
}

/// Named set of rules plus the action for groups no rule covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyProfile {
    pub name: String,
    pub description: String,
    pub rules: Vec<PolicyRule>,
    pub default_action: PolicyAction,
}

impl PolicyProfile {
    /// Build a profile from configuration, normalizing every group.
    pub fn from_config(name: &str, config: &CustomProfileConfig) -> Result<Self, PolicyError> {
        if BUILTIN_PROFILE_NAMES.contains(&name) {
            return Err(PolicyError::ReservedProfileName(name.to_string()));
        }
        let rules = config
            .rule_entries()
            .map(|(raw, action)| Ok(PolicyRule::new(CapabilityGroup::parse(raw)?, action)))
            .collect::<Result<Vec<_>, PolicyError>>()?;

        Ok(Self {
            name: name.to_string(),
            description: config.description.clone(),
            rules,
            default_action: config.effective_default_action(),
        })
    }

    /// Action for `group`: the deepest covering rule wins, ties go to the
    /// stricter action, and the profile default applies when nothing covers it.
    pub fn resolve(&self, group: &CapabilityGroup) -> PolicyAction {
        self.explain(group).action
    }

    /// Most restrictive action across `groups`. An empty set yields the default.
    pub fn resolve_all<'a>(
        &self,
        groups: impl IntoIterator<Item = &'a CapabilityGroup>,
    ) -> PolicyAction {
        groups
            .into_iter()
            .map(|group| self.resolve(group))
            .max()
            .unwrap_or(self.default_action)
    }

    pub fn explain(&self, group: &CapabilityGroup) -> Resolution {
        let mut best: Option<&PolicyRule> = None;
        for rule in self.rules.iter().filter(|rule| rule.group.covers(group)) {
            best = match best {
                None => Some(rule),
                Some(current) => {
                    let deeper = rule.group.depth() > current.group.depth();
                    let same_depth = rule.group.depth() == current.group.depth();
                    if deeper || (same_depth && rule.action > current.action) {
                        Some(rule)
                    } else {
                        Some(current)
                    }
                }
            };
        }

        Resolution {
            group: group.clone(),
            action: best.map_or(self.default_action, |rule| rule.action),
            matched_rule: best.cloned(),
        }
    }

    /// Action of the rule written exactly for `group`, if any.
    pub fn explicit_action(&self, group: &CapabilityGroup) -> Option<PolicyAction> {
        self.rules
            .iter()
            .filter(|rule| &rule.group == group)
            .map(|rule| rule.action)
            .max()
    }
}

/// The profiles shipped with cmdgate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuiltinProfile {
    Minimal,
    Coding,
    Messaging,
    Full,
}

impl BuiltinProfile {
    pub const ALL: [Self; 4] = [Self::Minimal, Self::Coding, Self::Messaging, Self::Full];

    pub fn name(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Coding => "coding",
            Self::Messaging => "messaging",
            Self::Full => "full",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|profile| profile.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Minimal => "Read-only access to files and git history",
            Self::Coding => {
                "Full development access; shell and dangerous commands need confirmation"
            }
            Self::Messaging => "Read files, browse the web and inspect git; no execution",
            Self::Full => "Everything allowed; dangerous commands need confirmation",
        }
    }

    pub fn default_action(self) -> PolicyAction {
        match self {
            Self::Minimal | Self::Messaging => PolicyAction::Deny,
            Self::Coding => PolicyAction::Confirm,
            Self::Full => PolicyAction::Allow,
        }
    }

    fn rule_table(self) -> &'static [(&'static str, PolicyAction)] {
        use PolicyAction::{Allow, Confirm, Deny};

        match self {
            Self::Minimal => &[
                (group::FS, Deny),
                (group::FS_READ, Allow),
                (group::FS_WRITE, Deny),
                (group::RUNTIME, Deny),
                (group::WEB, Deny),
                (group::GIT, Deny),
                (group::GIT_READ, Allow),
                (group::DANGEROUS, Deny),
            ],
            Self::Coding => &[
                (group::FS, Allow),
                (group::RUNTIME, Allow),
                (group::RUNTIME_SHELL, Confirm),
                (group::WEB, Allow),
                (group::GIT, Allow),
                (group::DANGEROUS, Confirm),
            ],
            Self::Messaging => &[
                (group::FS, Deny),
                (group::FS_READ, Allow),
                (group::RUNTIME, Deny),
                (group::WEB, Allow),
                (group::GIT, Deny),
                (group::GIT_READ, Allow),
                (group::GIT_WRITE, Deny),
                (group::DANGEROUS, Deny),
            ],
            Self::Full => &[
                (group::FS, Allow),
                (group::RUNTIME, Allow),
                (group::WEB, Allow),
                (group::GIT, Allow),
                (group::DANGEROUS, Confirm),
            ],
        }
    }

    pub fn profile(self) -> PolicyProfile {
        let rules = self
            .rule_table()
            .iter()
            .filter_map(|(raw, action)| {
                CapabilityGroup::parse(raw)
                    .ok()
                    .map(|group| PolicyRule::new(group, *action))
            })
            .collect();

        PolicyProfile {
            name: self.name().to_string(),
            description: self.description().to_string(),
            rules,
            default_action: self.default_action(),
        }
    }
}

impl fmt::Display for BuiltinProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable set of profiles: the built-ins followed by configured ones.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: IndexMap<String, PolicyProfile>,
    default_index: usize,
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProfileRegistry {
    pub fn builtin() -> Self {
        let profiles = BuiltinProfile::ALL
            .into_iter()
            .map(|builtin| (builtin.name().to_string(), builtin.profile()))
            .collect();
        let default_index = BuiltinProfile::ALL
            .iter()
            .position(|builtin| builtin.name() == defaults::DEFAULT_PROFILE)
            .unwrap_or_default();
        Self {
            profiles,
            default_index,
        }
    }

    /// Built-ins plus every profile under `[policy.profiles]`.
    pub fn from_config(config: &PolicyConfig) -> Result<Self, PolicyError> {
        let mut registry = Self::builtin();
        for (name, profile) in &config.profiles {
            let profile = PolicyProfile::from_config(name, profile)?;
            tracing::debug!(
                profile = %name,
                rules = profile.rules.len(),
                default_action = %profile.default_action,
                "registered custom policy profile"
            );
            registry.profiles.insert(name.clone(), profile);
        }

        registry.profile(&config.default_profile)?;
        if let Some(index) = registry.profiles.get_index_of(&config.default_profile) {
            registry.default_index = index;
        }
        Ok(registry)
    }

    pub fn profile(&self, name: &str) -> Result<&PolicyProfile, PolicyError> {
        self.profiles
            .get(name)
            .ok_or_else(|| PolicyError::UnknownProfile {
                name: name.to_string(),
                available: self.profile_names().join(", "),
            })
    }

    pub fn profile_names(&self) -> Vec<&str> {
        self.profiles.keys().map(String::as_str).collect()
    }

    pub fn profiles(&self) -> impl Iterator<Item = &PolicyProfile> {
        self.profiles.values()
    }

    pub fn profile_rules(&self, name: &str) -> Result<&[PolicyRule], PolicyError> {
        Ok(&self.profile(name)?.rules)
    }

    /// Profile used when a caller does not name one.
    pub fn default_profile(&self) -> &PolicyProfile {
        &self.profiles[self.default_index]
    }

    /// Resolve a raw group string against a named profile.
    pub fn resolve(&self, profile: &str, group: &str) -> Result<Resolution, PolicyError> {
        let group = CapabilityGroup::parse(group)?;
        Ok(self.profile(profile)?.explain(&group))
    }

    /// Every group some profile rules on, in first-seen order.
    pub fn known_groups(&self) -> Vec<&CapabilityGroup> {
        let mut groups: Vec<&CapabilityGroup> = Vec::new();
        for rule in self.profiles.values().flat_map(|profile| &profile.rules) {
            if !groups.contains(&&rule.group) {
                groups.push(&rule.group);
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn group(raw: &str) -> CapabilityGroup {
        CapabilityGroup::parse(raw).unwrap()
    }

    fn resolve(profile: BuiltinProfile, raw: &str) -> PolicyAction {
        profile.profile().resolve(&group(raw))
    }

    mod builtin {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn minimal_reads_but_never_writes() {
            use BuiltinProfile::Minimal;
            assert_eq!(resolve(Minimal, "group:fs:read"), PolicyAction::Allow);
            assert_eq!(resolve(Minimal, "group:fs:write"), PolicyAction::Deny);
            assert_eq!(resolve(Minimal, "group:fs"), PolicyAction::Deny);
            assert_eq!(resolve(Minimal, "group:runtime:shell"), PolicyAction::Deny);
            assert_eq!(resolve(Minimal, "group:git:read"), PolicyAction::Allow);
            assert_eq!(resolve(Minimal, "group:git:write"), PolicyAction::Deny);
        }

        #[test]
        fn coding_confirms_shell_and_dangerous() {
            use BuiltinProfile::Coding;
            assert_eq!(resolve(Coding, "group:fs:write"), PolicyAction::Allow);
            assert_eq!(resolve(Coding, "group:runtime:shell"), PolicyAction::Confirm);
            assert_eq!(resolve(Coding, "group:runtime:python"), PolicyAction::Allow);
            assert_eq!(resolve(Coding, "group:dangerous"), PolicyAction::Confirm);
            assert_eq!(resolve(Coding, "group:mcp"), PolicyAction::Confirm);
        }

        #[test]
        fn messaging_and_full_match_the_table() {
            use BuiltinProfile::{Full, Messaging};
            assert_eq!(resolve(Messaging, "group:web:fetch"), PolicyAction::Allow);
            assert_eq!(resolve(Messaging, "group:git:write"), PolicyAction::Deny);
            assert_eq!(resolve(Messaging, "group:runtime"), PolicyAction::Deny);
            assert_eq!(resolve(Full, "group:runtime:shell"), PolicyAction::Allow);
            assert_eq!(resolve(Full, "group:dangerous"), PolicyAction::Confirm);
            assert_eq!(resolve(Full, "group:anything"), PolicyAction::Allow);
        }

        #[test]
        fn every_builtin_rules_on_each_top_level_group() {
            for builtin in BuiltinProfile::ALL {
                let profile = builtin.profile();
                for top in group::TOP_LEVEL_GROUPS {
                    assert!(
                        profile.explicit_action(&group(top)).is_some(),
                        "{builtin} has no rule for {top}"
                    );
                }
            }
        }

        #[test]
        fn names_round_trip() {
            for builtin in BuiltinProfile::ALL {
                assert_eq!(BuiltinProfile::from_name(builtin.name()), Some(builtin));
                assert!(BUILTIN_PROFILE_NAMES.contains(&builtin.name()));
            }
            assert_eq!(BuiltinProfile::from_name("sandboxed"), None);
        }
    }

    mod resolution {
        use super::*;
        use pretty_assertions::assert_eq;

        fn profile(rules: &[(&str, PolicyAction)], default_action: PolicyAction) -> PolicyProfile {
            PolicyProfile {
                name: "test".into(),
                description: String::new(),
                rules: rules
                    .iter()
                    .map(|(raw, action)| PolicyRule::new(group(raw), *action))
                    .collect(),
                default_action,
            }
        }

        #[test]
        fn specificity_beats_polarity() {
            let profile = profile(
                &[
                    ("fs", PolicyAction::Deny),
                    ("fs:read", PolicyAction::Allow),
                ],
                PolicyAction::Deny,
            );
            assert_eq!(profile.resolve(&group("fs:read:config")), PolicyAction::Allow);
            assert_eq!(profile.resolve(&group("fs:write")), PolicyAction::Deny);
        }

        #[test]
        fn same_specificity_picks_most_restrictive() {
            let profile = profile(
                &[
                    ("web", PolicyAction::Allow),
                    ("web", PolicyAction::Confirm),
                ],
                PolicyAction::Allow,
            );
            assert_eq!(profile.resolve(&group("web")), PolicyAction::Confirm);
        }

        #[test]
        fn unmatched_group_uses_default() {
            let profile = profile(&[("fs", PolicyAction::Allow)], PolicyAction::Confirm);
            let resolution = profile.explain(&group("fsx"));
            assert_eq!(resolution.action, PolicyAction::Confirm);
            assert!(resolution.used_default());
        }

        #[test]
        fn explain_reports_matching_rule() {
            let resolution = BuiltinProfile::Coding
                .profile()
                .explain(&group("runtime:shell:bash"));
            assert_eq!(
                resolution.matched_rule,
                Some(PolicyRule::new(group("runtime:shell"), PolicyAction::Confirm))
            );
        }

        #[test]
        fn resolve_all_takes_the_strictest() {
            let coding = BuiltinProfile::Coding.profile();
            let groups = [group("fs:read"), group("runtime:shell"), group("web")];
            assert_eq!(coding.resolve_all(&groups), PolicyAction::Confirm);

            let minimal = BuiltinProfile::Minimal.profile();
            let groups = [group("fs:read"), group("dangerous")];
            assert_eq!(minimal.resolve_all(&groups), PolicyAction::Deny);
            assert_eq!(minimal.resolve_all(&[]), PolicyAction::Deny);
        }
    }

    mod registry {
        use super::*;
        use pretty_assertions::assert_eq;

        fn sandboxed() -> PolicyConfig {
            let mut config = PolicyConfig::default();
            config.profiles.insert(
                "sandboxed".into(),
                CustomProfileConfig {
                    description: "Only read the workspace".into(),
                    allow: vec!["fs:read".into()],
                    deny: vec!["runtime".into()],
                    ..CustomProfileConfig::default()
                },
            );
            config
        }

        #[test]
        fn builtin_registry_lists_profiles_in_order() {
            let registry = ProfileRegistry::builtin();
            assert_eq!(
                registry.profile_names(),
                vec!["minimal", "coding", "messaging", "full"]
            );
            assert_eq!(registry.default_profile().name, "coding");
        }

        #[test]
        fn unknown_profile_is_an_error() {
            let registry = ProfileRegistry::builtin();
            let err = registry.profile("paranoid").unwrap_err();
            assert_eq!(
                err,
                PolicyError::UnknownProfile {
                    name: "paranoid".into(),
                    available: "minimal, coding, messaging, full".into(),
                }
            );
            assert!(err.to_string().contains("paranoid"));
        }

        #[test]
        fn custom_profiles_join_the_registry() {
            let registry = ProfileRegistry::from_config(&sandboxed()).unwrap();
            assert_eq!(registry.profile_names().last(), Some(&"sandboxed"));

            let resolution = registry.resolve("sandboxed", "fs:read").unwrap();
            assert_eq!(resolution.action, PolicyAction::Allow);
            let resolution = registry.resolve("sandboxed", "web").unwrap();
            assert_eq!(resolution.action, PolicyAction::Deny);
            assert!(resolution.used_default());
        }

        #[test]
        fn deny_only_profile_allows_the_rest() {
            let config = CustomProfileConfig {
                deny: vec!["dangerous".into()],
                ..CustomProfileConfig::default()
            };
            let profile = PolicyProfile::from_config("open", &config).unwrap();
            assert_eq!(profile.default_action, PolicyAction::Allow);
            assert_eq!(profile.resolve(&group("dangerous")), PolicyAction::Deny);
            assert_eq!(profile.resolve(&group("web")), PolicyAction::Allow);
        }

        #[test]
        fn builtin_names_are_reserved() {
            let err = PolicyProfile::from_config("coding", &CustomProfileConfig::default())
                .unwrap_err();
            assert_eq!(err, PolicyError::ReservedProfileName("coding".into()));
        }

        #[test]
        fn invalid_groups_are_rejected() {
            let config = CustomProfileConfig {
                allow: vec!["fs::read".into()],
                ..CustomProfileConfig::default()
            };
            assert_eq!(
                PolicyProfile::from_config("broken", &config).unwrap_err(),
                PolicyError::InvalidGroup("fs::read".into())
            );
            assert!(matches!(
                ProfileRegistry::builtin().resolve("coding", "web::x"),
                Err(PolicyError::InvalidGroup(_))
            ));
        }

        #[test]
        fn configured_default_profile_must_exist() {
            let mut config = sandboxed();
            config.default_profile = "sandboxed".into();
            let registry = ProfileRegistry::from_config(&config).unwrap();
            assert_eq!(registry.default_profile().name, "sandboxed");

            config.default_profile = "missing".into();
            assert!(matches!(
                ProfileRegistry::from_config(&config),
                Err(PolicyError::UnknownProfile { .. })
            ));
        }

        #[test]
        fn known_groups_cover_the_table() {
            let registry = ProfileRegistry::builtin();
            let groups: Vec<&str> = registry
                .known_groups()
                .into_iter()
                .map(|g| g.as_str())
                .collect();
            for expected in [
                "group:fs",
                "group:fs:read",
                "group:fs:write",
                "group:runtime:shell",
                "group:git:write",
                "group:dangerous",
            ] {
                assert!(groups.contains(&expected), "{expected} missing");
            }
        }
    }
}
