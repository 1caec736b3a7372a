//! SQL-ish description renderer.
//!
//! Every statement has a one-line SQL description; SPARQL-only forms are
//! described by their compact SPARQL text.

use crate::error::RenderError;
use crate::render::{QueryRenderer, RenderedQuery};
use crate::statement::QueryStatement;

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlRenderer;

impl QueryRenderer for SqlRenderer {
    fn name(&self) -> &'static str {
        "sql"
    }

    fn render(&self, statement: &QueryStatement) -> Result<RenderedQuery, RenderError> {
        Ok(RenderedQuery {
            text: statement.to_sql(),
            kind: statement.kind(),
        })
    }
}
