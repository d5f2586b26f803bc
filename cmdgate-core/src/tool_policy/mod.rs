//! Tool policy engine: capability groups, profiles and resolution.
//!
//! Free functions operate on the built-in registry. Hosts that load
//! `[policy.profiles]` from configuration build their own
//! [`ProfileRegistry`] with [`ProfileRegistry::from_config`].

pub mod group;
mod profiles;
mod report;

use std::sync::LazyLock;

pub use group::CapabilityGroup;
pub use profiles::{BuiltinProfile, PolicyProfile, PolicyRule, ProfileRegistry, Resolution};
pub use report::{format_profile as format_policy_profile, profile_comparison};

use crate::error::PolicyError;

static BUILTIN_REGISTRY: LazyLock<ProfileRegistry> = LazyLock::new(ProfileRegistry::builtin);

/// Registry holding only the built-in profiles.
pub fn builtin_registry() -> &'static ProfileRegistry {
    &BUILTIN_REGISTRY
}

pub fn get_profile(name: &str) -> Result<&'static PolicyProfile, PolicyError> {
    BUILTIN_REGISTRY.profile(name)
}

pub fn get_profile_names() -> Vec<&'static str> {
    BUILTIN_REGISTRY.profile_names()
}

pub fn get_profile_rules(name: &str) -> Result<&'static [PolicyRule], PolicyError> {
    BUILTIN_REGISTRY.profile_rules(name)
}

pub fn format_profile(name: &str) -> Result<String, PolicyError> {
    get_profile(name).map(report::format_profile)
}

pub fn get_profile_comparison() -> String {
    profile_comparison(&BUILTIN_REGISTRY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdgate_config::PolicyAction;
    use pretty_assertions::assert_eq;

    #[test]
    fn free_functions_use_builtin_profiles() {
        assert_eq!(
            get_profile_names(),
            vec!["minimal", "coding", "messaging", "full"]
        );
        assert_eq!(get_profile("full").unwrap().default_action, PolicyAction::Allow);
        assert!(!get_profile_rules("coding").unwrap().is_empty());
        assert!(format_profile("messaging").unwrap().contains("Profile: messaging"));
        assert!(get_profile_comparison().contains("group:git:write"));
    }

    #[test]
    fn unknown_names_fail_everywhere() {
        assert!(matches!(
            get_profile("nope"),
            Err(PolicyError::UnknownProfile { .. })
        ));
        assert!(get_profile_rules("nope").is_err());
        assert!(format_profile("nope").is_err());
    }
}
