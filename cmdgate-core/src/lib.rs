//! Core library for cmdgate.
//!
//! Decides whether a shell command proposed by an agent may run:
//! [`command_safety`] turns the command line into atomic commands and flags
//! dangerous programs, [`tool_policy`] resolves capability groups against a
//! named profile, and [`audit`] keeps a bounded record of each decision.
//! [`CommandGate`] runs all of them for one command line.
//!
//! ```no_run
//! use cmdgate_core::{CommandGate, contains_dangerous_command};
//!
//! assert!(contains_dangerous_command("sudo rm -rf /").dangerous);
//!
//! let mut gate = CommandGate::default();
//! let verdict = gate.evaluate("cargo test && git push", Some("coding"))?;
//! println!("{}", verdict.action);
//! # Ok::<(), cmdgate_core::PolicyError>(())
//! ```

pub mod audit;
pub mod command_safety;
pub mod error;
pub mod gate;
pub mod tool_policy;

pub use audit::{AuditDecision, AuditEntry, AuditLogger, AuditSummary};
pub use command_safety::{
    AtomicCommand, Connector, DangerCategory, DangerVerdict, ParseResult, ShellParser,
    ShellParserBackend, contains_command, contains_dangerous_command, extract_command_names,
    parse_bash_command,
};
pub use error::PolicyError;
pub use gate::{CommandGate, GateVerdict};
pub use tool_policy::{
    BuiltinProfile, CapabilityGroup, PolicyProfile, PolicyRule, ProfileRegistry, Resolution,
    format_profile, get_profile, get_profile_comparison, get_profile_names, get_profile_rules,
};

pub use cmdgate_config::{GateConfig, PolicyAction};
