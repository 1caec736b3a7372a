//! # QueryIR
//!
//! A query intermediate representation shared by SQL and SPARQL front ends.
//! Relational operators, RDF graph patterns, property paths and SQL/PGQ graph
//! tables live in one algebraic tree that can be analyzed, rewritten,
//! exchanged as tagged JSON and rendered back to SPARQL text.
//!
//! ## Features
//!
//! - Literals, terms and triple patterns with RDF 1.2 quoted triples
//! - Expressions covering arithmetic, comparison, aggregates and subqueries
//! - Property path algebra (reversal, simplification, length bounds)
//! - Graph pattern analysis (variables, required variables, complexity)
//! - Tag-discriminated JSON wire codec
//! - SPARQL and SQL-ish renderers, bottom-up rewrites, transform pipelines
//!
//! ## Quick Start
//!
//! ```rust
//! use queryir::{Expression, GraphPattern, QueryStatement, SelectQuery, TriplePattern};
//! use queryir::{PrefixMap, QueryRenderer, SparqlRenderer};
//!
//! let pattern = GraphPattern::filter(
//!     GraphPattern::bgp(vec![TriplePattern::rdf_type("x", "http://ex/Person")]),
//!     Expression::greater_than(Expression::var("age"), Expression::lit(18i64)),
//! );
//! let statement = QueryStatement::Select(SelectQuery::from_pattern(pattern));
//!
//! let renderer = SparqlRenderer::with_prefixes(PrefixMap::new());
//! let rendered = renderer.render(&statement).unwrap();
//! assert!(rendered.text.contains("FILTER((?age > 18))"));
//! ```

#![warn(clippy::all)]

pub mod codec;
pub mod config;
pub mod error;
pub mod expr;
pub mod literal;
pub mod path;
pub mod pattern;
pub mod prefix;
pub mod query;
pub mod render;
pub mod rewrite;
pub mod source;
pub mod statement;
pub mod term;
pub mod transform;

pub use codec::WireCodec;
pub use config::RenderConfig;
pub use error::{ConfigError, DecodeError, DecodeResult, QueryIrError, QueryIrResult, RenderError};
pub use expr::{AggregateFunction, CaseBranch, ColumnRef, DataType, Expression, FunctionCall};
pub use literal::Literal;
pub use path::PropertyPath;
pub use pattern::{AggregateBinding, GraphPattern};
pub use prefix::PrefixMap;
pub use query::{Projection, ProjectionItem, SelectQuery, SortDirection, SortKey};
pub use render::{QueryRenderer, RenderedQuery, SparqlRenderer, SqlRenderer};
pub use rewrite::{JoinMerger, PathSimplifier, Rewrite, Rewriter};
pub use source::{
    DataSource, EdgeDirection, GraphTable, JoinCondition, JoinType, PathElement, Quantifier,
    TableRef,
};
pub use statement::{QueryStatement, StatementKind};
pub use term::{SparqlTerm, TriplePattern, Variable};
pub use transform::{FlattenPatterns, QueryTransform, SimplifyPaths, TransformPipeline};
