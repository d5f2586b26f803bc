//! Decision audit logging
//! Keeps a bounded, in-memory record of every allow/block/warn decision made
//! by the gate, the code validators and the confirmation flow.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use cmdgate_config::AuditConfig;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::info;

pub const ACTION_CODE_VALIDATION: &str = "code_validation";
pub const ACTION_COMMAND_VALIDATION: &str = "command_validation";
pub const ACTION_CONFIRMATION_GRANTED: &str = "confirmation_granted";
pub const ACTION_CONFIRMATION_DENIED: &str = "confirmation_denied";
pub const ACTION_POLICY_RESOLUTION: &str = "policy_resolution";

/// The decision reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditDecision {
    Allow,
    #[serde(alias = "deny")]
    Block,
    Warn,
}

impl AuditDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Block => "block",
            Self::Warn => "warn",
        }
    }

    fn from_flag(passed: bool) -> Self {
        if passed { Self::Allow } else { Self::Block }
    }
}

impl std::fmt::Display for AuditDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record of a single decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the decision was made
    pub timestamp: DateTime<Local>,

    /// Decision category (`command_validation`, `confirmation_granted`, ...)
    pub action: String,

    /// The decision reached
    pub decision: AuditDecision,

    /// Component that made the decision
    pub source: String,

    /// What the decision was about (command, file, operation)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Why the decision was made
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AuditEntry {
    pub fn new(
        action: impl Into<String>,
        decision: AuditDecision,
        source: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Local::now(),
            action: action.into(),
            decision,
            source: source.into(),
            target: None,
            reason: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Counts over the current log contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditSummary {
    pub total: usize,
    pub allowed: usize,
    pub blocked: usize,
    pub warnings: usize,
    /// Entry count per action, in first-seen order
    pub by_action: IndexMap<String, usize>,
}

/// Bounded decision log owned by one agent session.
///
/// Entries beyond `max_entries` evict the oldest first. Not internally
/// synchronized; hosts running several sessions keep one logger per session.
#[derive(Debug, Clone)]
pub struct AuditLogger {
    entries: VecDeque<AuditEntry>,
    config: AuditConfig,
}

impl Default for AuditLogger {
    fn default() -> Self {
        Self::new(AuditConfig::default())
    }
}

impl AuditLogger {
    pub fn new(config: AuditConfig) -> Self {
        let capacity = config.max_entries.clamp(1, 1024);
        Self {
            entries: VecDeque::with_capacity(capacity),
            config,
        }
    }

    pub fn config(&self) -> &AuditConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Apply a new configuration, evicting the oldest entries if capacity shrank.
    pub fn init(&mut self, config: AuditConfig) {
        self.config = config;
        self.evict_overflow();
    }

    /// Restore the default configuration and drop every entry.
    pub fn reset(&mut self) {
        self.init(AuditConfig::default());
        self.clear();
    }

    /// Record an entry
    pub fn log(&mut self, entry: AuditEntry) {
        if !self.config.enabled {
            return;
        }

        info!(
            target: "cmdgate_core::audit",
            action = %entry.action,
            decision = %entry.decision,
            source = %entry.source,
            target_name = entry.target.as_deref().unwrap_or(""),
            reason = entry.reason.as_deref().unwrap_or(""),
            "Audit entry recorded"
        );

        self.entries.push_back(entry);
        self.evict_overflow();
    }

    /// Record the outcome of a static code check
    pub fn log_code_validation(&mut self, target: &str, safe: bool, findings_count: usize) {
        let reason = if findings_count == 0 {
            "no findings".to_string()
        } else {
            format!("{findings_count} finding(s)")
        };
        self.log(
            AuditEntry::new(
                ACTION_CODE_VALIDATION,
                AuditDecision::from_flag(safe),
                "code_validator",
            )
            .with_target(target)
            .with_reason(reason),
        );
    }

    /// Record the outcome of a command check
    pub fn log_command_validation(&mut self, command: &str, valid: bool, reason: Option<&str>) {
        let mut entry = AuditEntry::new(
            ACTION_COMMAND_VALIDATION,
            AuditDecision::from_flag(valid),
            "command_validator",
        )
        .with_target(command);
        if let Some(reason) = reason {
            entry = entry.with_reason(reason);
        }
        self.log(entry);
    }

    /// Record a human answer to a confirmation prompt
    pub fn log_confirmation(&mut self, operation: &str, target: &str, granted: bool) {
        let action = if granted {
            ACTION_CONFIRMATION_GRANTED
        } else {
            ACTION_CONFIRMATION_DENIED
        };
        self.log(
            AuditEntry::new(action, AuditDecision::from_flag(granted), "user_confirmation")
                .with_target(target)
                .with_reason(operation),
        );
    }

    /// Entries from oldest to newest
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn entries_by_action(&self, action: &str) -> Vec<AuditEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.action == action)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> AuditSummary {
        let mut summary = AuditSummary {
            total: self.entries.len(),
            ..AuditSummary::default()
        };
        for entry in &self.entries {
            match entry.decision {
                AuditDecision::Allow => summary.allowed += 1,
                AuditDecision::Block => summary.blocked += 1,
                AuditDecision::Warn => summary.warnings += 1,
            }
            *summary.by_action.entry(entry.action.clone()).or_insert(0) += 1;
        }
        summary
    }

    /// Human-readable summary for terminal display
    pub fn format_summary(&self) -> String {
        let summary = self.summary();
        let mut out = format!(
            "Audit Summary: {} total | {} allowed | {} blocked | {} warnings",
            summary.total, summary.allowed, summary.blocked, summary.warnings
        );
        if !summary.by_action.is_empty() {
            out.push_str("\nBy action:");
            for (action, count) in &summary.by_action {
                out.push_str(&format!("\n  {action}: {count}"));
            }
        }
        out
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn evict_overflow(&mut self) {
        let max_entries = self.config.max_entries.max(1);
        while self.entries.len() > max_entries {
            self.entries.pop_front();
        }
    }
}
