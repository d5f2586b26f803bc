//! Detection of dangerous programs in a command line.
//!
//! Every atomic command the parser extracts is matched by exact program name
//! against a fixed taxonomy, regardless of connector or nesting depth.
//! Examples:
//! - `rm -rf /` (destructive file operation)
//! - `echo ok && sudo dd if=/dev/zero of=/dev/sda` (disk operation behind `sudo`)
//! - `bash -c "shutdown now"` (power control inside a shell payload)

use serde::{Deserialize, Serialize};

use super::shell_parser::{
    AtomicCommand, ParseResult, invocation_chain, parse_bash_command, program_basename,
};

/// Effect class of a dangerous program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DangerCategory {
    DestructiveFileOps,
    DiskPartition,
    PowerProcessControl,
    PermissionChange,
    Firewall,
    SystemAdministration,
}

impl DangerCategory {
    pub const ALL: [Self; 6] = [
        Self::DestructiveFileOps,
        Self::DiskPartition,
        Self::PowerProcessControl,
        Self::PermissionChange,
        Self::Firewall,
        Self::SystemAdministration,
    ];

    /// Programs belonging to this category.
    pub fn programs(self) -> &'static [&'static str] {
        match self {
            Self::DestructiveFileOps => &["rm", "rmdir"],
            Self::DiskPartition => &["dd", "mkfs", "fdisk", "parted"],
            Self::PowerProcessControl => &[
                "shutdown", "reboot", "poweroff", "halt", "kill", "killall", "pkill",
            ],
            Self::PermissionChange => &["chmod", "chown", "chgrp"],
            Self::Firewall => &["iptables", "ip6tables", "nft"],
            Self::SystemAdministration => &[
                "systemctl", "service", "crontab", "useradd", "userdel", "usermod", "groupadd",
                "mount", "umount",
            ],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::DestructiveFileOps => "destructive file operation",
            Self::DiskPartition => "disk/partition operation",
            Self::PowerProcessControl => "power/process control",
            Self::PermissionChange => "permission/ownership change",
            Self::Firewall => "firewall change",
            Self::SystemAdministration => "service/user/mount management",
        }
    }

    /// Category for a normalized program name, if it is dangerous.
    pub fn classify(program: &str) -> Option<Self> {
        let program = if program.starts_with("mkfs.") {
            "mkfs"
        } else {
            program
        };
        Self::ALL
            .into_iter()
            .find(|category| category.programs().contains(&program))
    }
}

impl std::fmt::Display for DangerCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of [`contains_dangerous_command`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DangerVerdict {
    pub dangerous: bool,
    /// Offending program names, deduplicated in first-seen order
    pub commands: Vec<String>,
    /// Categories hit, deduplicated in first-seen order
    pub categories: Vec<DangerCategory>,
}

impl DangerVerdict {
    fn record(&mut self, program: &str, category: DangerCategory) {
        self.dangerous = true;
        if !self.commands.iter().any(|seen| seen == program) {
            self.commands.push(program.to_string());
        }
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
    }
}

/// Normalized program name: basename, with `mkfs.ext4` style names kept as-is.
pub fn normalize_program(name: &str) -> &str {
    program_basename(name)
}

/// One command name per atomic command, in order, duplicates preserved.
pub fn extract_command_names(command: &str) -> Vec<String> {
    parse_bash_command(command).command_names()
}

/// Whether any atomic command's normalized name is one of `names`.
pub fn contains_command(command: &str, names: &[&str]) -> bool {
    parse_bash_command(command)
        .commands
        .iter()
        .flat_map(effective_programs)
        .any(|program| names.contains(&program))
}

/// Classify every program in `command` against the taxonomy.
pub fn contains_dangerous_command(command: &str) -> DangerVerdict {
    classify_parsed(&parse_bash_command(command))
}

/// Classify an already parsed command line.
pub fn classify_parsed(parsed: &ParseResult) -> DangerVerdict {
    let mut verdict = DangerVerdict::default();
    for program in parsed.commands.iter().flat_map(effective_programs) {
        if let Some(category) = DangerCategory::classify(program) {
            verdict.record(program, category);
        }
    }
    if verdict.dangerous {
        tracing::debug!(
            commands = ?verdict.commands,
            categories = ?verdict.categories,
            "dangerous command detected"
        );
    }
    verdict
}

/// The program itself plus whatever it wraps (`sudo -u root rm` -> `sudo`, `rm`).
fn effective_programs(command: &AtomicCommand) -> Vec<&str> {
    invocation_chain(command)
        .into_iter()
        .map(|link| link.program)
        .collect()
}
