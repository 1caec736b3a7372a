//! Text renderers for QueryIR statements.
//!
//! Renderers turn a finished [`QueryStatement`] into surface syntax
//! (SPARQL text, SQL-ish descriptions). They are pure and never cache.

mod sparql;
mod sql;

pub use sparql::SparqlRenderer;
pub use sql::SqlRenderer;

use crate::error::RenderError;
use crate::statement::{QueryStatement, StatementKind};

/// Output from rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedQuery {
    /// The generated query text
    pub text: String,
    /// Classification of the rendered statement
    pub kind: StatementKind,
}

/// Trait for rendering statements to a target query language.
pub trait QueryRenderer: Send + Sync {
    /// Unique name for this renderer
    fn name(&self) -> &'static str;

    /// Render the statement
    fn render(&self, statement: &QueryStatement) -> Result<RenderedQuery, RenderError>;
}

/// Indent every non-empty line by two spaces
pub(crate) fn indent(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("  {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// `head { body }` with the body indented; an empty head yields a bare group
pub(crate) fn block(head: &str, body: &str) -> String {
    let open = if head.is_empty() {
        "{".to_string()
    } else {
        format!("{} {{", head)
    };
    if body.is_empty() {
        format!("{} }}", open)
    } else {
        format!("{}\n{}\n}}", open, indent(body))
    }
}

/// Join the non-empty parts with newlines
pub(crate) fn join_lines<I>(parts: I) -> String
where
    I: IntoIterator<Item = String>,
{
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse multi-line text onto one line
pub(crate) fn inline(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
