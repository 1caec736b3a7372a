//! Render configuration loaded from TOML.
//!
//! ```toml
//! standard_prefixes = true
//! emit_prologue = true
//! base = "http://example.org/"
//!
//! [prefixes]
//! ex = "http://example.org/"
//! foaf = "http://xmlns.com/foaf/0.1/"
//! ```

use crate::error::ConfigError;
use crate::prefix::PrefixMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for the SPARQL renderer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderConfig {
    /// User prefix declarations; these win over the standard ones
    #[serde(default)]
    pub prefixes: PrefixMap,

    /// Include rdf, rdfs, xsd and owl
    #[serde(default = "default_true")]
    pub standard_prefixes: bool,

    /// Optional BASE IRI emitted in the prologue
    #[serde(default)]
    pub base: Option<String>,

    /// Emit BASE/PREFIX lines ahead of the query text
    #[serde(default = "default_true")]
    pub emit_prologue: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            prefixes: PrefixMap::new(),
            standard_prefixes: true,
            base: None,
            emit_prologue: true,
        }
    }
}

impl RenderConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            prefixes = config.prefixes.len(),
            "loaded render config"
        );
        Ok(config)
    }

    /// Apply a `prefix=namespace` override
    pub fn apply_prefix_override(&mut self, declaration: &str) -> Result<(), ConfigError> {
        let (prefix, namespace) = declaration
            .split_once('=')
            .map(|(p, n)| (p.trim(), n.trim()))
            .filter(|(p, n)| !n.is_empty() && !p.contains(':'))
            .ok_or_else(|| ConfigError::InvalidPrefix(declaration.to_string()))?;
        self.prefixes.insert(prefix, namespace);
        Ok(())
    }

    /// The prefix map renderers should compact with
    pub fn effective_prefixes(&self) -> PrefixMap {
        let mut prefixes = if self.standard_prefixes {
            PrefixMap::standard()
        } else {
            PrefixMap::new()
        };
        prefixes.extend(&self.prefixes);
        prefixes
    }
}
