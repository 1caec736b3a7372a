//! SPARQL text renderer.

use crate::config::RenderConfig;
use crate::error::RenderError;
use crate::prefix::{escape_iri, PrefixMap};
use crate::render::{QueryRenderer, RenderedQuery};
use crate::statement::QueryStatement;

/// Renders statements to SPARQL 1.1/1.2 text.
///
/// Prefixes are used both for compacting IRIs and for the prologue, so
/// every prefixed name in the output is declared.
#[derive(Debug, Clone)]
pub struct SparqlRenderer {
    prefixes: PrefixMap,
    base: Option<String>,
    emit_prologue: bool,
}

impl Default for SparqlRenderer {
    fn default() -> Self {
        Self::from_config(&RenderConfig::default())
    }
}

impl SparqlRenderer {
    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            prefixes: config.effective_prefixes(),
            base: config.base.clone(),
            emit_prologue: config.emit_prologue,
        }
    }

    /// Renderer with exactly these prefixes and a prologue
    pub fn with_prefixes(prefixes: PrefixMap) -> Self {
        Self {
            prefixes,
            base: None,
            emit_prologue: true,
        }
    }

    pub fn prefixes(&self) -> &PrefixMap {
        &self.prefixes
    }

    fn prologue(&self) -> String {
        let mut lines = Vec::new();
        if let Some(base) = &self.base {
            lines.push(format!("BASE <{}>", escape_iri(base)));
        }
        if !self.prefixes.is_empty() {
            lines.push(self.prefixes.prologue());
        }
        lines.join("\n")
    }
}

impl QueryRenderer for SparqlRenderer {
    fn name(&self) -> &'static str {
        "sparql"
    }

    fn render(&self, statement: &QueryStatement) -> Result<RenderedQuery, RenderError> {
        let body = statement
            .to_sparql(&self.prefixes)
            .ok_or(RenderError::Unsupported {
                renderer: self.name(),
                statement: statement.name(),
            })?;

        let prologue = if self.emit_prologue {
            self.prologue()
        } else {
            String::new()
        };
        let text = if prologue.is_empty() {
            body
        } else {
            format!("{}\n\n{}", prologue, body)
        };

        tracing::trace!(statement = statement.name(), bytes = text.len(), "rendered sparql");
        Ok(RenderedQuery {
            text,
            kind: statement.kind(),
        })
    }
}
