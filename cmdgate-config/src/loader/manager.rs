use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::constants::defaults;
use crate::loader::config::GateConfig;
use crate::loader::layers::{ConfigLayerEntry, ConfigLayerSource, ConfigLayerStack};

/// Configuration manager for loading and validating configurations
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config: GateConfig,
    config_path: Option<PathBuf>,
    workspace_root: Option<PathBuf>,
    layer_stack: ConfigLayerStack,
}

impl ConfigManager {
    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        if let Ok(config_path) = std::env::var(defaults::CONFIG_PATH_ENV) {
            let trimmed = config_path.trim();
            if !trimmed.is_empty() {
                return Self::load_from_file(trimmed).with_context(|| {
                    format!(
                        "Failed to load configuration from {}={}",
                        defaults::CONFIG_PATH_ENV,
                        trimmed
                    )
                });
            }
        }

        if let Ok(workspace_path) = std::env::var(defaults::WORKSPACE_ENV) {
            let trimmed = workspace_path.trim();
            if !trimmed.is_empty() {
                return Self::load_from_workspace(trimmed).with_context(|| {
                    format!(
                        "Failed to load configuration from {}={}",
                        defaults::WORKSPACE_ENV,
                        trimmed
                    )
                });
            }
        }

        let cwd = std::env::current_dir().context("Failed to resolve current directory")?;
        Self::load_from_workspace(cwd)
    }

    /// Load configuration from a specific workspace
    pub fn load_from_workspace(workspace: impl AsRef<Path>) -> Result<Self> {
        Self::load_from_workspace_with_home(workspace, dirs::home_dir())
    }

    pub(crate) fn load_from_workspace_with_home(
        workspace: impl AsRef<Path>,
        home_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let workspace_root = workspace.as_ref().to_path_buf();
        let mut layer_stack = ConfigLayerStack::default();

        // 1. User home config (~/.cmdgate/cmdgate.toml)
        if let Some(user_config) = Self::user_config_path(home_dir.as_deref()) {
            layer_stack.push(ConfigLayerEntry::new(
                ConfigLayerSource::User {
                    file: user_config.clone(),
                },
                Self::load_toml_from_file(&user_config)?,
            ));
        }

        // 2. Workspace config directory (.cmdgate/cmdgate.toml)
        let dir_config = workspace_root
            .join(defaults::CONFIG_DIR_NAME)
            .join(defaults::CONFIG_FILE_NAME);
        if dir_config.is_file() {
            layer_stack.push(ConfigLayerEntry::new(
                ConfigLayerSource::WorkspaceDir {
                    file: dir_config.clone(),
                },
                Self::load_toml_from_file(&dir_config)?,
            ));
        }

        // 3. Workspace root config (cmdgate.toml)
        let root_config = workspace_root.join(defaults::CONFIG_FILE_NAME);
        if root_config.is_file() {
            layer_stack.push(ConfigLayerEntry::new(
                ConfigLayerSource::Workspace {
                    file: root_config.clone(),
                },
                Self::load_toml_from_file(&root_config)?,
            ));
        }

        if layer_stack.layers().is_empty() {
            tracing::debug!(
                workspace = %workspace_root.display(),
                "no configuration files found; using defaults"
            );
            let config = GateConfig::default();
            config
                .validate()
                .context("Default configuration failed validation")?;

            return Ok(Self {
                config,
                config_path: None,
                workspace_root: Some(workspace_root),
                layer_stack,
            });
        }

        let config = Self::build_config(&layer_stack)
            .context("Failed to build effective configuration")?;
        let config_path = layer_stack
            .layers()
            .last()
            .map(|layer| layer.source.file().to_path_buf());

        Ok(Self {
            config,
            config_path,
            workspace_root: Some(workspace_root),
            layer_stack,
        })
    }

    /// Load configuration from a specific file layered over the user config
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_from_file_with_home(path, dirs::home_dir())
    }

    pub(crate) fn load_from_file_with_home(
        path: impl AsRef<Path>,
        home_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let mut layer_stack = ConfigLayerStack::default();

        if let Some(user_config) = Self::user_config_path(home_dir.as_deref())
            && user_config != path
        {
            layer_stack.push(ConfigLayerEntry::new(
                ConfigLayerSource::User {
                    file: user_config.clone(),
                },
                Self::load_toml_from_file(&user_config)?,
            ));
        }

        layer_stack.push(ConfigLayerEntry::new(
            ConfigLayerSource::Workspace {
                file: path.to_path_buf(),
            },
            Self::load_toml_from_file(path)?,
        ));

        let config = Self::build_config(&layer_stack).with_context(|| {
            format!(
                "Failed to build effective config with file: {}",
                path.display()
            )
        })?;

        Ok(Self {
            config,
            config_path: Some(path.to_path_buf()),
            workspace_root: path.parent().map(Path::to_path_buf),
            layer_stack,
        })
    }

    fn user_config_path(home_dir: Option<&Path>) -> Option<PathBuf> {
        let candidate = home_dir?
            .join(defaults::CONFIG_DIR_NAME)
            .join(defaults::CONFIG_FILE_NAME);
        candidate.is_file().then_some(candidate)
    }

    fn build_config(layer_stack: &ConfigLayerStack) -> Result<GateConfig> {
        let effective_toml = layer_stack.effective_config();
        let config: GateConfig = effective_toml
            .try_into()
            .context("Failed to deserialize effective configuration")?;
        config
            .validate()
            .context("Configuration failed validation")?;
        Ok(config)
    }

    fn load_toml_from_file(path: &Path) -> Result<toml::Value> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let value: toml::Value = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded configuration layer");
        Ok(value)
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Get the highest-precedence configuration file (if any was loaded)
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn workspace_root(&self) -> Option<&Path> {
        self.workspace_root.as_deref()
    }

    /// Get the configuration layer stack
    pub fn layer_stack(&self) -> &ConfigLayerStack {
        &self.layer_stack
    }

    /// Get the effective TOML configuration
    pub fn effective_config(&self) -> toml::Value {
        self.layer_stack.effective_config()
    }
}
