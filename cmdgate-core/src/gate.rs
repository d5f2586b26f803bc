//! The command gate: parse, classify, resolve and audit one command line.
//!
//! Every command line is treated as a request for `group:runtime:shell`;
//! a dangerous verdict adds `group:dangerous`. The strictest action across
//! those groups wins, and an `allow` on input that did not parse cleanly is
//! escalated to `confirm`.

use cmdgate_config::{GateConfig, PolicyAction};
use serde::{Deserialize, Serialize};

use crate::audit::{ACTION_COMMAND_VALIDATION, AuditDecision, AuditEntry, AuditLogger};
use crate::command_safety::{DangerVerdict, ParseResult, ShellParser, classify_parsed};
use crate::error::PolicyError;
use crate::tool_policy::{CapabilityGroup, ProfileRegistry, Resolution, group};

const AUDIT_SOURCE: &str = "command_gate";

/// Everything the gate decided about one command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateVerdict {
    pub command: String,
    pub profile: String,
    pub action: PolicyAction,
    /// Set when an `allow` was raised to `confirm` because of parse warnings
    pub escalated: bool,
    pub parse: ParseResult,
    pub danger: DangerVerdict,
    pub resolutions: Vec<Resolution>,
}

impl GateVerdict {
    pub fn groups(&self) -> impl Iterator<Item = &CapabilityGroup> {
        self.resolutions.iter().map(|resolution| &resolution.group)
    }

    /// One-line explanation suitable for the audit log.
    pub fn reason(&self) -> String {
        let mut parts = Vec::new();
        if self.danger.dangerous {
            let categories: Vec<&str> =
                self.danger.categories.iter().map(|c| c.label()).collect();
            parts.push(format!(
                "dangerous: {} ({})",
                self.danger.commands.join(", "),
                categories.join(", ")
            ));
        }
        if self.escalated {
            parts.push("parse warnings: treated as unclassified".to_string());
        }
        for resolution in &self.resolutions {
            let source = match &resolution.matched_rule {
                Some(rule) => rule.group.to_string(),
                None => "default".to_string(),
            };
            parts.push(format!("{} -> {} via {source}", resolution.group, resolution.action));
        }
        format!("profile {}: {}", self.profile, parts.join("; "))
    }
}

/// Pipeline combining the parser, classifier, policy registry and audit log.
#[derive(Debug)]
pub struct CommandGate {
    parser: ShellParser,
    registry: ProfileRegistry,
    audit: AuditLogger,
}

impl Default for CommandGate {
    fn default() -> Self {
        Self::new(ShellParser::default(), ProfileRegistry::builtin(), AuditLogger::default())
    }
}

impl CommandGate {
    pub fn new(parser: ShellParser, registry: ProfileRegistry, audit: AuditLogger) -> Self {
        Self {
            parser,
            registry,
            audit,
        }
    }

    /// Build a gate from a validated configuration.
    pub fn from_config(config: &GateConfig) -> Result<Self, PolicyError> {
        let parser = ShellParser::with_preference(config.parser.backend, config.parser.max_depth);
        let registry = ProfileRegistry::from_config(&config.policy)?;
        Ok(Self::new(parser, registry, AuditLogger::new(config.audit.clone())))
    }

    pub fn parser(&self) -> &ShellParser {
        &self.parser
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn audit_mut(&mut self) -> &mut AuditLogger {
        &mut self.audit
    }

    /// Decide whether `command` may run under `profile` (or the default profile).
    pub fn evaluate(
        &mut self,
        command: &str,
        profile: Option<&str>,
    ) -> Result<GateVerdict, PolicyError> {
        let profile = match profile {
            Some(name) => self.registry.profile(name)?,
            None => self.registry.default_profile(),
        };

        let parse = self.parser.parse(command);
        let danger = classify_parsed(&parse);

        let mut groups = vec![CapabilityGroup::parse(group::RUNTIME_SHELL)?];
        if danger.dangerous {
            groups.push(CapabilityGroup::parse(group::DANGEROUS)?);
        }

        let resolutions: Vec<Resolution> =
            groups.iter().map(|group| profile.explain(group)).collect();
        let resolved = profile.resolve_all(&groups);

        let escalated = resolved == PolicyAction::Allow && parse.has_warnings();
        let action = if escalated {
            PolicyAction::Confirm
        } else {
            resolved
        };

        let verdict = GateVerdict {
            command: command.to_string(),
            profile: profile.name.clone(),
            action,
            escalated,
            parse,
            danger,
            resolutions,
        };

        tracing::debug!(
            profile = %verdict.profile,
            action = %verdict.action,
            dangerous = verdict.danger.dangerous,
            escalated,
            backend = self.parser.backend_name(),
            "command gate decision"
        );

        let decision = match action {
            PolicyAction::Allow => AuditDecision::Allow,
            PolicyAction::Confirm => AuditDecision::Warn,
            PolicyAction::Deny => AuditDecision::Block,
        };
        self.audit.log(
            AuditEntry::new(ACTION_COMMAND_VALIDATION, decision, AUDIT_SOURCE)
                .with_target(command)
                .with_reason(verdict.reason()),
        );

        Ok(verdict)
    }

    /// Record the user's answer to a `confirm` verdict.
    pub fn record_confirmation(&mut self, verdict: &GateVerdict, granted: bool) {
        self.audit
            .log_confirmation("execute_command", &verdict.command, granted);
    }
}
