use crate::loader::merge_toml_values;
use std::path::{Path, PathBuf};
use toml::Value as TomlValue;

/// Source of a configuration layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLayerSource {
    /// User-specific configuration (e.g., ~/.cmdgate/cmdgate.toml)
    User { file: PathBuf },
    /// Workspace configuration directory (e.g., .cmdgate/cmdgate.toml)
    WorkspaceDir { file: PathBuf },
    /// Workspace root configuration (cmdgate.toml) or an explicitly named file
    Workspace { file: PathBuf },
}

impl ConfigLayerSource {
    pub fn file(&self) -> &Path {
        match self {
            Self::User { file } | Self::WorkspaceDir { file } | Self::Workspace { file } => file,
        }
    }
}

/// A single layer of configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayerEntry {
    /// Source of this layer
    pub source: ConfigLayerSource,
    /// Parsed TOML content
    pub config: TomlValue,
}

impl ConfigLayerEntry {
    pub fn new(source: ConfigLayerSource, config: TomlValue) -> Self {
        Self { source, config }
    }
}

/// A stack of configuration layers, ordered from lowest to highest precedence.
#[derive(Debug, Clone, Default)]
pub struct ConfigLayerStack {
    layers: Vec<ConfigLayerEntry>,
}

impl ConfigLayerStack {
    pub fn push(&mut self, layer: ConfigLayerEntry) {
        self.layers.push(layer);
    }

    /// Merge all layers into a single effective configuration.
    pub fn effective_config(&self) -> TomlValue {
        let mut merged = TomlValue::Table(toml::Table::new());
        for layer in &self.layers {
            merge_toml_values(&mut merged, &layer.config);
        }
        merged
    }

    pub fn layers(&self) -> &[ConfigLayerEntry] {
        &self.layers
    }
}
