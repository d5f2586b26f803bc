use super::*;

use crate::loader::layers::ConfigLayerSource;
use crate::parser::ParserBackendPreference;
use crate::policy::PolicyAction;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create config dir");
    }
    fs::write(path, contents).expect("failed to write config");
}

#[test]
fn missing_files_fall_back_to_defaults() {
    let workspace = TempDir::new().expect("failed to create workspace");

    let manager = ConfigManager::load_from_workspace_with_home(workspace.path(), None)
        .expect("failed to load config");

    assert!(manager.config_path().is_none());
    assert!(manager.layer_stack().layers().is_empty());
    assert_eq!(manager.config().policy.default_profile, "coding");
    assert_eq!(manager.config().audit.max_entries, 1000);
    assert_eq!(manager.config().parser.max_depth, 16);
    assert_eq!(manager.workspace_root(), Some(workspace.path()));
}

#[test]
fn layers_merge_in_precedence_order() {
    let workspace = TempDir::new().expect("failed to create workspace");
    let home = TempDir::new().expect("failed to create home");

    write(
        &home.path().join(".cmdgate").join("cmdgate.toml"),
        "[audit]\nmax_entries = 50\n\n[policy]\ndefault_profile = \"minimal\"\n",
    );
    write(
        &workspace.path().join(".cmdgate").join("cmdgate.toml"),
        "[parser]\nbackend = \"lexical\"\nmax_depth = 8\n",
    );
    write(
        &workspace.path().join("cmdgate.toml"),
        "[parser]\nmax_depth = 4\n\n[policy]\ndefault_profile = \"full\"\n",
    );

    let manager = ConfigManager::load_from_workspace_with_home(
        workspace.path(),
        Some(home.path().to_path_buf()),
    )
    .expect("failed to load config");

    let config = manager.config();
    assert_eq!(config.audit.max_entries, 50);
    assert_eq!(config.parser.backend, ParserBackendPreference::Lexical);
    assert_eq!(config.parser.max_depth, 4);
    assert_eq!(config.policy.default_profile, "full");

    let layers = manager.layer_stack().layers();
    assert_eq!(layers.len(), 3);
    assert!(matches!(layers[0].source, ConfigLayerSource::User { .. }));
    assert!(matches!(
        layers[1].source,
        ConfigLayerSource::WorkspaceDir { .. }
    ));
    assert!(matches!(layers[2].source, ConfigLayerSource::Workspace { .. }));
    assert_eq!(
        manager.config_path(),
        Some(workspace.path().join("cmdgate.toml").as_path())
    );
}

#[test]
fn explicit_file_loads_custom_profiles() {
    let dir = TempDir::new().expect("failed to create dir");
    let path = dir.path().join("gate.toml");
    write(
        &path,
        r#"
[policy]
default_profile = "reviewer"

[policy.profiles.reviewer]
description = "Read-only review"
allow = ["fs:read", "git:read"]
confirm = ["web"]
"#,
    );

    let manager =
        ConfigManager::load_from_file_with_home(&path, None).expect("failed to load config");
    let profile = manager
        .config()
        .policy
        .profiles
        .get("reviewer")
        .expect("profile should be loaded");

    assert_eq!(profile.description, "Read-only review");
    assert_eq!(profile.effective_default_action(), PolicyAction::Deny);
    assert_eq!(manager.config_path(), Some(path.as_path()));
    assert_eq!(manager.workspace_root(), Some(dir.path()));
}

#[test]
fn explicit_file_is_layered_over_user_config() {
    let dir = TempDir::new().expect("failed to create dir");
    let home = TempDir::new().expect("failed to create home");
    write(
        &home.path().join(".cmdgate").join("cmdgate.toml"),
        "[audit]\nenabled = false\nmax_entries = 10\n",
    );
    let path = dir.path().join("override.toml");
    write(&path, "[audit]\nmax_entries = 20\n");

    let manager = ConfigManager::load_from_file_with_home(&path, Some(home.path().to_path_buf()))
        .expect("failed to load config");

    assert!(!manager.config().audit.enabled);
    assert_eq!(manager.config().audit.max_entries, 20);
    assert_eq!(manager.layer_stack().layers().len(), 2);
}

#[test]
fn invalid_values_fail_validation() {
    let cases = [
        "[parser]\nmax_depth = 0\n",
        "[parser]\nmax_depth = 65\n",
        "[audit]\nmax_entries = 0\n",
        "[policy]\ndefault_profile = \"\"\n",
        "[policy]\ndefault_profile = \"nobody\"\n",
        "[policy.profiles.coding]\nallow = [\"fs\"]\n",
        "[policy.profiles.broken]\ndeny = [\"fs::write\"]\n",
    ];

    for contents in cases {
        let dir = TempDir::new().expect("failed to create dir");
        let path = dir.path().join("cmdgate.toml");
        write(&path, contents);
        let result = ConfigManager::load_from_file_with_home(&path, None);
        assert!(result.is_err(), "expected validation failure for {contents:?}");
    }
}

#[test]
fn malformed_toml_reports_the_file() {
    let dir = TempDir::new().expect("failed to create dir");
    let path = dir.path().join("cmdgate.toml");
    write(&path, "[parser\nmax_depth = 4");

    let error = ConfigManager::load_from_file_with_home(&path, None)
        .expect_err("malformed toml should fail");
    assert!(format!("{error:#}").contains("Failed to parse config file"));
}

#[test]
fn merge_replaces_scalars_and_extends_tables() {
    let mut base: toml::Value = toml::from_str("[a]\nx = 1\ny = 2\n").expect("base");
    let overlay: toml::Value = toml::from_str("[a]\ny = 3\nz = 4\n").expect("overlay");

    merge_toml_values(&mut base, &overlay);

    let table = base.get("a").and_then(toml::Value::as_table).expect("table");
    assert_eq!(table.get("x").and_then(toml::Value::as_integer), Some(1));
    assert_eq!(table.get("y").and_then(toml::Value::as_integer), Some(3));
    assert_eq!(table.get("z").and_then(toml::Value::as_integer), Some(4));
}
