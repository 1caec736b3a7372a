//! SPARQL graph pattern algebra.
//!
//! Variable scope follows SPARQL binding semantics: `variables` lists what a
//! pattern *may* bind, `required_variables` what every solution *must* bind.
//! The two diverge at OPTIONAL, UNION, MINUS, silent SERVICE and subqueries.

use crate::expr::{AggregateFunction, Expression};
use crate::literal::Literal;
use crate::path::PropertyPath;
use crate::prefix::PrefixMap;
use crate::query::SelectQuery;
use crate::render::{block, join_lines};
use crate::rewrite::{JoinMerger, Rewrite};
use crate::term::{SparqlTerm, TriplePattern, Variable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Cost of a single triple pattern scan
const TRIPLE_COST: f64 = 10.0;
/// Per-solution evaluation multiplier for FILTER and BIND
const EXPRESSION_FACTOR: f64 = 5.0;
/// Flat cost added by FILTER and BIND
const EXPRESSION_COST: f64 = 1.0;
/// Network overhead multiplier for federated SERVICE calls
const SERVICE_FACTOR: f64 = 10.0;
/// Aggregation multiplier for GROUP BY
const GROUP_FACTOR: f64 = 2.0;

/// A composed graph query fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum GraphPattern {
    Basic {
        triples: Vec<TriplePattern>,
    },
    Join {
        lhs: Box<GraphPattern>,
        rhs: Box<GraphPattern>,
    },
    Optional {
        lhs: Box<GraphPattern>,
        rhs: Box<GraphPattern>,
    },
    Union {
        lhs: Box<GraphPattern>,
        rhs: Box<GraphPattern>,
    },
    Filter {
        pattern: Box<GraphPattern>,
        expr: Expression,
    },
    Minus {
        lhs: Box<GraphPattern>,
        rhs: Box<GraphPattern>,
    },
    Graph {
        name: SparqlTerm,
        pattern: Box<GraphPattern>,
    },
    Service {
        endpoint: String,
        pattern: Box<GraphPattern>,
        #[serde(default)]
        silent: bool,
    },
    Bind {
        pattern: Box<GraphPattern>,
        expr: Expression,
        variable: Variable,
    },
    /// Inline data; `None` cells are `UNDEF`
    Values {
        variables: Vec<Variable>,
        rows: Vec<Vec<Option<Literal>>>,
    },
    Subquery {
        query: Box<SelectQuery>,
    },
    GroupBy {
        pattern: Box<GraphPattern>,
        keys: Vec<Expression>,
        #[serde(default)]
        aggregates: Vec<AggregateBinding>,
    },
    PropertyPath {
        subject: SparqlTerm,
        path: PropertyPath,
        object: SparqlTerm,
    },
    Lateral {
        lhs: Box<GraphPattern>,
        rhs: Box<GraphPattern>,
    },
}

/// An aggregate bound to an output variable inside a `groupBy`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AggregateBinding {
    pub aggregate: AggregateFunction,
    pub variable: Variable,
}

impl Default for GraphPattern {
    fn default() -> Self {
        Self::Basic {
            triples: Vec::new(),
        }
    }
}

impl GraphPattern {
    pub fn bgp(triples: Vec<TriplePattern>) -> Self {
        Self::Basic { triples }
    }

    pub fn join(lhs: GraphPattern, rhs: GraphPattern) -> Self {
        Self::Join {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn optional(lhs: GraphPattern, rhs: GraphPattern) -> Self {
        Self::Optional {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn union(lhs: GraphPattern, rhs: GraphPattern) -> Self {
        Self::Union {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn filter(pattern: GraphPattern, expr: Expression) -> Self {
        Self::Filter {
            pattern: Box::new(pattern),
            expr,
        }
    }

    pub fn minus(lhs: GraphPattern, rhs: GraphPattern) -> Self {
        Self::Minus {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn graph(name: SparqlTerm, pattern: GraphPattern) -> Self {
        Self::Graph {
            name,
            pattern: Box::new(pattern),
        }
    }

    pub fn service(endpoint: impl Into<String>, pattern: GraphPattern, silent: bool) -> Self {
        Self::Service {
            endpoint: endpoint.into(),
            pattern: Box::new(pattern),
            silent,
        }
    }

    pub fn bind(pattern: GraphPattern, expr: Expression, variable: impl Into<Variable>) -> Self {
        Self::Bind {
            pattern: Box::new(pattern),
            expr,
            variable: variable.into(),
        }
    }

    pub fn values(variables: Vec<Variable>, rows: Vec<Vec<Option<Literal>>>) -> Self {
        Self::Values { variables, rows }
    }

    pub fn subquery(query: SelectQuery) -> Self {
        Self::Subquery {
            query: Box::new(query),
        }
    }

    pub fn group_by(
        pattern: GraphPattern,
        keys: Vec<Expression>,
        aggregates: Vec<AggregateBinding>,
    ) -> Self {
        Self::GroupBy {
            pattern: Box::new(pattern),
            keys,
            aggregates,
        }
    }

    pub fn path(subject: SparqlTerm, path: PropertyPath, object: SparqlTerm) -> Self {
        Self::PropertyPath {
            subject,
            path,
            object,
        }
    }

    pub fn lateral(lhs: GraphPattern, rhs: GraphPattern) -> Self {
        Self::Lateral {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn is_empty_basic(&self) -> bool {
        matches!(self, Self::Basic { triples } if triples.is_empty())
    }

    /// Every variable that could be bound by some solution.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Basic { triples } => triples.iter().for_each(|t| t.collect_variables(out)),
            Self::Join { lhs, rhs }
            | Self::Optional { lhs, rhs }
            | Self::Union { lhs, rhs }
            | Self::Lateral { lhs, rhs } => {
                lhs.collect_variables(out);
                rhs.collect_variables(out);
            }
            Self::Minus { lhs, .. } => lhs.collect_variables(out),
            Self::Filter { pattern, .. } | Self::Service { pattern, .. } => {
                pattern.collect_variables(out)
            }
            Self::Graph { name, pattern } => {
                name.collect_variables(out);
                pattern.collect_variables(out);
            }
            Self::Bind {
                pattern, variable, ..
            } => {
                pattern.collect_variables(out);
                out.insert(variable.name().to_string());
            }
            Self::Values { variables, .. } => {
                out.extend(variables.iter().map(|v| v.name().to_string()))
            }
            Self::Subquery { query } => out.extend(query.projected_variables()),
            Self::GroupBy {
                pattern,
                aggregates,
                ..
            } => {
                pattern.collect_variables(out);
                out.extend(aggregates.iter().map(|a| a.variable.name().to_string()));
            }
            Self::PropertyPath {
                subject, object, ..
            } => {
                subject.collect_variables(out);
                object.collect_variables(out);
            }
        }
    }

    /// Variables bound in every solution of the pattern.
    pub fn required_variables(&self) -> BTreeSet<String> {
        match self {
            Self::Basic { .. } | Self::PropertyPath { .. } => self.variables(),
            Self::Join { lhs, rhs } | Self::Lateral { lhs, rhs } => {
                let mut out = lhs.required_variables();
                out.extend(rhs.required_variables());
                out
            }
            Self::Optional { lhs, .. } | Self::Minus { lhs, .. } => lhs.required_variables(),
            Self::Union { lhs, rhs } => lhs
                .required_variables()
                .intersection(&rhs.required_variables())
                .cloned()
                .collect(),
            Self::Filter { pattern, .. } => pattern.required_variables(),
            Self::Graph { name, pattern } => {
                let mut out = pattern.required_variables();
                name.collect_variables(&mut out);
                out
            }
            Self::Service {
                pattern, silent, ..
            } => {
                if *silent {
                    BTreeSet::new()
                } else {
                    pattern.required_variables()
                }
            }
            Self::Bind {
                pattern, variable, ..
            } => {
                let mut out = pattern.required_variables();
                out.insert(variable.name().to_string());
                out
            }
            Self::Values { variables, rows } => variables
                .iter()
                .enumerate()
                .filter(|(column, _)| {
                    rows.iter().all(|row| {
                        matches!(row.get(*column), Some(Some(value)) if !value.is_null())
                    })
                })
                .map(|(_, v)| v.name().to_string())
                .collect(),
            Self::Subquery { .. } | Self::GroupBy { .. } => BTreeSet::new(),
        }
    }

    /// Heuristic evaluation cost for planners; always positive.
    pub fn complexity(&self) -> f64 {
        match self {
            Self::Basic { triples } => TRIPLE_COST * triples.len().max(1) as f64,
            Self::Join { lhs, rhs } => lhs.complexity() * rhs.complexity(),
            Self::Optional { lhs, rhs }
            | Self::Union { lhs, rhs }
            | Self::Minus { lhs, rhs }
            | Self::Lateral { lhs, rhs } => lhs.complexity() + rhs.complexity(),
            Self::Filter { pattern, .. } | Self::Bind { pattern, .. } => {
                pattern.complexity() * EXPRESSION_FACTOR + EXPRESSION_COST
            }
            Self::Graph { pattern, .. } => pattern.complexity(),
            Self::Service { pattern, .. } => pattern.complexity() * SERVICE_FACTOR,
            Self::GroupBy { pattern, .. } => pattern.complexity() * GROUP_FACTOR,
            Self::Values { rows, .. } => rows.len().max(1) as f64,
            Self::Subquery { query } => query.complexity(),
            Self::PropertyPath { path, .. } => TRIPLE_COST * path.complexity(),
        }
    }

    /// Merge joins of basic patterns into single basic patterns, everywhere
    /// in the tree including nested subqueries.
    pub fn flattened(&self) -> Self {
        self.clone().rewrite(&JoinMerger)
    }

    /// Render as SPARQL group-body text (without the enclosing braces).
    pub fn to_sparql(&self, prefixes: &PrefixMap) -> String {
        match self {
            Self::Basic { triples } => triples
                .iter()
                .map(|t| t.to_sparql(prefixes))
                .collect::<Vec<_>>()
                .join("\n"),
            Self::Join { lhs, rhs } => {
                join_lines([lhs.to_sparql(prefixes), rhs.to_sparql(prefixes)])
            }
            Self::Optional { lhs, rhs } => join_lines([
                lhs.to_sparql(prefixes),
                block("OPTIONAL", &rhs.to_sparql(prefixes)),
            ]),
            Self::Union { lhs, rhs } => format!(
                "{} UNION {}",
                block("", &lhs.to_sparql(prefixes)),
                block("", &rhs.to_sparql(prefixes))
            ),
            Self::Filter { pattern, expr } => join_lines([
                pattern.to_sparql(prefixes),
                format!("FILTER({})", expr.to_sparql(prefixes)),
            ]),
            Self::Minus { lhs, rhs } => join_lines([
                lhs.to_sparql(prefixes),
                block("MINUS", &rhs.to_sparql(prefixes)),
            ]),
            Self::Graph { name, pattern } => block(
                &format!("GRAPH {}", name.to_sparql(prefixes)),
                &pattern.to_sparql(prefixes),
            ),
            Self::Service {
                endpoint,
                pattern,
                silent,
            } => {
                let head = if *silent {
                    format!("SERVICE SILENT {}", prefixes.render_iri(endpoint))
                } else {
                    format!("SERVICE {}", prefixes.render_iri(endpoint))
                };
                block(&head, &pattern.to_sparql(prefixes))
            }
            Self::Bind {
                pattern,
                expr,
                variable,
            } => join_lines([
                pattern.to_sparql(prefixes),
                format!("BIND({} AS {})", expr.to_sparql(prefixes), variable),
            ]),
            Self::Values { variables, rows } => {
                let header = variables
                    .iter()
                    .map(Variable::to_string)
                    .collect::<Vec<_>>()
                    .join(" ");
                let rows = rows
                    .iter()
                    .map(|row| {
                        let cells = (0..variables.len())
                            .map(|i| match row.get(i) {
                                Some(Some(value)) => value.to_sparql(prefixes),
                                _ => "UNDEF".to_string(),
                            })
                            .collect::<Vec<_>>()
                            .join(" ");
                        format!("({})", cells)
                    })
                    .collect::<Vec<_>>();
                if rows.is_empty() {
                    format!("VALUES ({}) {{ }}", header)
                } else {
                    format!("VALUES ({}) {{ {} }}", header, rows.join(" "))
                }
            }
            Self::Subquery { query } => block("", &query.to_sparql(prefixes)),
            Self::GroupBy {
                pattern,
                keys,
                aggregates,
            } => {
                let mut projection: Vec<String> = keys
                    .iter()
                    .filter(|k| matches!(k, Expression::Variable { .. }))
                    .map(|k| k.to_sparql(prefixes))
                    .collect();
                projection.extend(aggregates.iter().map(|a| {
                    format!("({} AS {})", a.aggregate.to_sparql(prefixes), a.variable)
                }));
                if projection.is_empty() {
                    projection.push("*".to_string());
                }
                let mut select = block(
                    &format!("SELECT {} WHERE", projection.join(" ")),
                    &pattern.to_sparql(prefixes),
                );
                if !keys.is_empty() {
                    let keys: Vec<String> = keys.iter().map(|k| k.to_sparql(prefixes)).collect();
                    select.push_str(&format!("\nGROUP BY {}", keys.join(" ")));
                }
                block("", &select)
            }
            Self::PropertyPath {
                subject,
                path,
                object,
            } => format!(
                "{} {} {} .",
                subject.to_sparql(prefixes),
                path.to_sparql(prefixes),
                object.to_sparql(prefixes)
            ),
            Self::Lateral { lhs, rhs } => join_lines([
                lhs.to_sparql(prefixes),
                block("LATERAL", &rhs.to_sparql(prefixes)),
            ]),
        }
    }
}
