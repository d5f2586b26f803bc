use serde::{Deserialize, Serialize};

use crate::constants::defaults;

/// Which shell parser backend the gate should use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ParserBackendPreference {
    /// Use the grammar backend when it is compiled in and loads, otherwise the lexical one
    #[default]
    Auto,
    /// Always use the hand-written lexical parser
    Lexical,
    /// Require the tree-sitter grammar backend (falls back with a warning if unavailable)
    TreeSitter,
}

impl ParserBackendPreference {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Lexical => "lexical",
            Self::TreeSitter => "tree-sitter",
        }
    }
}

impl std::fmt::Display for ParserBackendPreference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ParserBackendPreference {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "lexical" | "fallback" => Ok(Self::Lexical),
            "tree-sitter" | "treesitter" | "ast" => Ok(Self::TreeSitter),
            other => Err(format!(
                "unknown parser backend '{other}' (expected auto, lexical or tree-sitter)"
            )),
        }
    }
}

/// Shell parser configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ParserConfig {
    /// Backend selection (auto, lexical, tree-sitter)
    #[serde(default)]
    pub backend: ParserBackendPreference,

    /// Maximum nesting depth for subshells, substitutions and `bash -c` payloads
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_max_depth() -> usize {
    defaults::DEFAULT_MAX_PARSE_DEPTH
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            backend: ParserBackendPreference::default(),
            max_depth: default_max_depth(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_preference_parses_aliases() {
        assert_eq!(
            "fallback".parse::<ParserBackendPreference>(),
            Ok(ParserBackendPreference::Lexical)
        );
        assert_eq!(
            "Tree-Sitter".parse::<ParserBackendPreference>(),
            Ok(ParserBackendPreference::TreeSitter)
        );
        assert!("bison".parse::<ParserBackendPreference>().is_err());
    }

    #[test]
    fn backend_deserializes_kebab_case() {
        let config: ParserConfig = toml::from_str(r#"backend = "tree-sitter""#).unwrap();
        assert_eq!(config.backend, ParserBackendPreference::TreeSitter);
        assert_eq!(config.max_depth, defaults::DEFAULT_MAX_PARSE_DEPTH);
    }
}
