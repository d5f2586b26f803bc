use anyhow::{Result, bail, ensure};
use serde::{Deserialize, Serialize};

use crate::audit::AuditConfig;
use crate::constants::{BUILTIN_PROFILE_NAMES, defaults};
use crate::debug::DebugConfig;
use crate::parser::ParserConfig;
use crate::policy::{PolicyConfig, normalize_group_id};

/// Effective cmdgate configuration after all layers are merged
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GateConfig {
    #[serde(default)]
    pub parser: ParserConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub audit: AuditConfig,

    #[serde(default)]
    pub debug: DebugConfig,
}

impl GateConfig {
    /// Validate cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (1..=defaults::MAX_PARSE_DEPTH_LIMIT).contains(&self.parser.max_depth),
            "parser.max_depth must be between 1 and {} (got {})",
            defaults::MAX_PARSE_DEPTH_LIMIT,
            self.parser.max_depth
        );

        ensure!(
            self.audit.max_entries >= 1,
            "audit.max_entries must be at least 1"
        );

        ensure!(
            !self.policy.default_profile.trim().is_empty(),
            "policy.default_profile must not be empty"
        );

        for (name, profile) in &self.policy.profiles {
            if name.trim().is_empty() {
                bail!("policy profile names must not be empty");
            }
            if BUILTIN_PROFILE_NAMES.contains(&name.as_str()) {
                bail!("policy profile '{name}' shadows a built-in profile");
            }
            for (group, _) in profile.rule_entries() {
                if normalize_group_id(group).is_none() {
                    bail!("policy profile '{name}' has a malformed capability group '{group}'");
                }
            }
        }

        let default_profile = self.policy.default_profile.as_str();
        ensure!(
            BUILTIN_PROFILE_NAMES.contains(&default_profile)
                || self.policy.profiles.contains_key(default_profile),
            "policy.default_profile '{default_profile}' is not a known profile"
        );

        Ok(())
    }
}
