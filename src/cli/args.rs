use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cmdgate_config::ParserBackendPreference;

/// Pre-execution safety gate for shell commands proposed by coding agents
#[derive(Debug, Parser)]
#[command(name = "cmdgate", version, about, long_about = None)]
pub struct Cli {
    /// Configuration file to load instead of the workspace lookup
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Workspace directory whose cmdgate.toml layers are loaded
    #[arg(long, global = true, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Split a command line into atomic commands
    ///
    /// Examples:
    ///   cmdgate parse "cd /repo && make | tee build.log"
    ///   cmdgate parse --backend lexical "bash -c 'rm -rf /tmp/x'"
    Parse {
        /// Command line to parse
        command: String,

        /// Parser backend (auto, lexical, tree-sitter); defaults to the configured one
        #[arg(long)]
        backend: Option<ParserBackendPreference>,

        /// Print the parse result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Decide whether command lines may run
    ///
    /// Exit code 0 = allow, 2 = deny, 3 = confirm, 1 = error. With several
    /// commands the strictest decision sets the exit code.
    ///
    /// Examples:
    ///   cmdgate check "cargo test"
    ///   cmdgate check --profile minimal "rm -rf /" "ls"
    Check {
        /// Command lines to check
        #[arg(required = true)]
        commands: Vec<String>,

        /// Policy profile; defaults to policy.default_profile
        #[arg(long)]
        profile: Option<String>,

        /// Print verdicts as JSON
        #[arg(long)]
        json: bool,

        /// Print the audit summary after the verdicts
        #[arg(long)]
        summary: bool,
    },

    /// Resolve a capability group against a profile
    ///
    /// Examples:
    ///   cmdgate resolve fs:write --profile minimal
    Resolve {
        /// Capability group, with or without the `group:` prefix
        group: String,

        /// Policy profile; defaults to policy.default_profile
        #[arg(long)]
        profile: Option<String>,
    },

    /// Inspect policy profiles
    Profiles {
        #[command(subcommand)]
        command: ProfilesCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProfilesCommand {
    /// List every known profile
    List,
    /// Show the rules of one profile
    Show {
        name: String,
    },
    /// Compare all profiles group by group
    Compare,
}
