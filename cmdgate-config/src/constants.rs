//! Default values shared by the configuration sections and the loader.

pub mod defaults {
    pub const CONFIG_FILE_NAME: &str = "cmdgate.toml";
    pub const CONFIG_DIR_NAME: &str = ".cmdgate";
    pub const CONFIG_PATH_ENV: &str = "CMDGATE_CONFIG_PATH";
    pub const WORKSPACE_ENV: &str = "CMDGATE_WORKSPACE";

    pub const DEFAULT_PROFILE: &str = "coding";
    pub const DEFAULT_MAX_AUDIT_ENTRIES: usize = 1000;
    pub const DEFAULT_MAX_PARSE_DEPTH: usize = 16;
    pub const MAX_PARSE_DEPTH_LIMIT: usize = 64;
}

/// Names reserved by the built-in policy profiles.
pub const BUILTIN_PROFILE_NAMES: &[&str] = &["minimal", "coding", "messaging", "full"];

/// Prefix every capability group identifier carries once normalized.
pub const GROUP_PREFIX: &str = "group";
