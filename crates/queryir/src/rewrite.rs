//! Bottom-up tree rewriting.
//!
//! A [`Rewriter`] supplies hooks for the three recursive node families
//! (graph patterns, property paths, expressions). [`Rewrite`] walks any IR
//! value, rebuilding children first and then handing each rebuilt node to
//! the matching hook. Subqueries are walked too, so a rewriter sees every
//! pattern reachable from a statement.

use crate::expr::{AggregateFunction, CaseBranch, Expression, FunctionCall};
use crate::path::PropertyPath;
use crate::pattern::{AggregateBinding, GraphPattern};
use crate::query::{Projection, ProjectionItem, SelectQuery, SortKey};
use crate::source::{DataSource, GraphTable, JoinCondition};
use crate::statement::{
    Assignment, AskQuery, ConstructQuery, DeleteStatement, DescribeQuery, InsertSource,
    InsertStatement, ModifyStatement, QueryStatement, UpdateStatement,
};

/// Node hooks; the defaults leave nodes unchanged.
pub trait Rewriter {
    fn pattern(&self, pattern: GraphPattern) -> GraphPattern {
        pattern
    }

    fn path(&self, path: PropertyPath) -> PropertyPath {
        path
    }

    fn expression(&self, expr: Expression) -> Expression {
        expr
    }
}

/// IR values that can be rebuilt by a [`Rewriter`].
pub trait Rewrite: Sized {
    fn rewrite<R: Rewriter + ?Sized>(self, rewriter: &R) -> Self;
}

impl<T: Rewrite> Rewrite for Box<T> {
    fn rewrite<R: Rewriter + ?Sized>(self, rewriter: &R) -> Self {
        Box::new((*self).rewrite(rewriter))
    }
}

impl<T: Rewrite> Rewrite for Option<T> {
    fn rewrite<R: Rewriter + ?Sized>(self, rewriter: &R) -> Self {
        self.map(|value| value.rewrite(rewriter))
    }
}

impl<T: Rewrite> Rewrite for Vec<T> {
    fn rewrite<R: Rewriter + ?Sized>(self, rewriter: &R) -> Self {
        self.into_iter().map(|value| value.rewrite(rewriter)).collect()
    }
}

/// Merges `join(basic, basic)` into a single `basic`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinMerger;

impl Rewriter for JoinMerger {
    fn pattern(&self, pattern: GraphPattern) -> GraphPattern {
        match pattern {
            GraphPattern::Join { lhs, rhs } => match (*lhs, *rhs) {
                (
                    GraphPattern::Basic { triples: mut left },
                    GraphPattern::Basic { triples: right },
                ) => {
                    left.extend(right);
                    GraphPattern::Basic { triples: left }
                }
                (lhs, rhs) => GraphPattern::join(lhs, rhs),
            },
            other => other,
        }
    }
}

/// Simplifies every property path in place.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathSimplifier;

impl Rewriter for PathSimplifier {
    fn path(&self, path: PropertyPath) -> PropertyPath {
        path.simplified()
    }
}

// ============================================================================
// Statements
// ============================================================================

impl Rewrite for QueryStatement {
    fn rewrite<R: Rewriter + ?Sized>(self, r: &R) -> Self {
        match self {
            Self::Select(query) => Self::Select(query.rewrite(r)),
            Self::Insert(InsertStatement {
                table,
                columns,
                source,
            }) => Self::Insert(InsertStatement {
                table,
                columns,
                source: match source {
                    InsertSource::Values { rows } => InsertSource::Values {
                        rows: rows.rewrite(r),
                    },
                    InsertSource::Query { query } => InsertSource::Query {
                        query: query.rewrite(r),
                    },
                },
            }),
            Self::Update(UpdateStatement {
                table,
                assignments,
                filter,
            }) => Self::Update(UpdateStatement {
                table,
                assignments: assignments
                    .into_iter()
                    .map(|a| Assignment {
                        column: a.column,
                        value: a.value.rewrite(r),
                    })
                    .collect(),
                filter: filter.rewrite(r),
            }),
            Self::Delete(DeleteStatement { table, filter }) => Self::Delete(DeleteStatement {
                table,
                filter: filter.rewrite(r),
            }),
            Self::Construct(construct) => Self::Construct(ConstructQuery {
                pattern: construct.pattern.rewrite(r),
                order_by: construct.order_by.rewrite(r),
                ..construct
            }),
            Self::Ask(AskQuery { pattern }) => Self::Ask(AskQuery {
                pattern: pattern.rewrite(r),
            }),
            Self::Describe(DescribeQuery { resources, pattern }) => {
                Self::Describe(DescribeQuery {
                    resources,
                    pattern: pattern.rewrite(r),
                })
            }
            Self::Modify(modify) => Self::Modify(ModifyStatement {
                pattern: modify.pattern.rewrite(r),
                ..modify
            }),
            other @ (Self::CreateGraph(_)
            | Self::DropGraph(_)
            | Self::InsertData(_)
            | Self::DeleteData(_)
            | Self::DeleteWhere(_)
            | Self::Load(_)
            | Self::Clear(_)
            | Self::GraphManagement(_)) => other,
        }
    }
}

impl Rewrite for SelectQuery {
    fn rewrite<R: Rewriter + ?Sized>(self, r: &R) -> Self {
        Self {
            projection: match self.projection {
                Projection::All => Projection::All,
                Projection::Items { items } => Projection::Items {
                    items: items.rewrite(r),
                },
            },
            source: self.source.rewrite(r),
            filter: self.filter.rewrite(r),
            group_by: self.group_by.rewrite(r),
            having: self.having.rewrite(r),
            order_by: self.order_by.rewrite(r),
            ..self
        }
    }
}

impl Rewrite for ProjectionItem {
    fn rewrite<R: Rewriter + ?Sized>(self, r: &R) -> Self {
        Self {
            expr: self.expr.rewrite(r),
            alias: self.alias,
        }
    }
}

impl Rewrite for SortKey {
    fn rewrite<R: Rewriter + ?Sized>(self, r: &R) -> Self {
        Self {
            expr: self.expr.rewrite(r),
            direction: self.direction,
        }
    }
}

// ============================================================================
// Sources and patterns
// ============================================================================

impl Rewrite for DataSource {
    fn rewrite<R: Rewriter + ?Sized>(self, r: &R) -> Self {
        match self {
            Self::Table { table } => Self::Table { table },
            Self::Subquery { query, alias } => Self::Subquery {
                query: query.rewrite(r),
                alias,
            },
            Self::Join {
                lhs,
                rhs,
                join_type,
                condition,
            } => Self::Join {
                lhs: lhs.rewrite(r),
                rhs: rhs.rewrite(r),
                join_type,
                condition: condition.map(|c| match c {
                    JoinCondition::On { expr } => JoinCondition::On {
                        expr: expr.rewrite(r),
                    },
                    using @ JoinCondition::Using { .. } => using,
                }),
            },
            Self::Values {
                rows,
                columns,
                alias,
            } => Self::Values {
                rows,
                columns,
                alias,
            },
            Self::GraphTable { graph_table } => Self::GraphTable {
                graph_table: GraphTable {
                    filter: graph_table.filter.rewrite(r),
                    columns: graph_table.columns.rewrite(r),
                    ..graph_table
                },
            },
            Self::GraphPattern { pattern } => Self::GraphPattern {
                pattern: pattern.rewrite(r),
            },
            Self::NamedGraph { name, pattern } => Self::NamedGraph {
                name,
                pattern: pattern.rewrite(r),
            },
            Self::Service {
                endpoint,
                pattern,
                silent,
            } => Self::Service {
                endpoint,
                pattern: pattern.rewrite(r),
                silent,
            },
            Self::Union { lhs, rhs, all } => Self::Union {
                lhs: lhs.rewrite(r),
                rhs: rhs.rewrite(r),
                all,
            },
            Self::Intersect { lhs, rhs, all } => Self::Intersect {
                lhs: lhs.rewrite(r),
                rhs: rhs.rewrite(r),
                all,
            },
            Self::Except { lhs, rhs, all } => Self::Except {
                lhs: lhs.rewrite(r),
                rhs: rhs.rewrite(r),
                all,
            },
        }
    }
}

impl Rewrite for GraphPattern {
    fn rewrite<R: Rewriter + ?Sized>(self, r: &R) -> Self {
        let rebuilt = match self {
            basic @ Self::Basic { .. } => basic,
            values @ Self::Values { .. } => values,
            Self::Join { lhs, rhs } => Self::Join {
                lhs: lhs.rewrite(r),
                rhs: rhs.rewrite(r),
            },
            Self::Optional { lhs, rhs } => Self::Optional {
                lhs: lhs.rewrite(r),
                rhs: rhs.rewrite(r),
            },
            Self::Union { lhs, rhs } => Self::Union {
                lhs: lhs.rewrite(r),
                rhs: rhs.rewrite(r),
            },
            Self::Minus { lhs, rhs } => Self::Minus {
                lhs: lhs.rewrite(r),
                rhs: rhs.rewrite(r),
            },
            Self::Lateral { lhs, rhs } => Self::Lateral {
                lhs: lhs.rewrite(r),
                rhs: rhs.rewrite(r),
            },
            Self::Filter { pattern, expr } => Self::Filter {
                pattern: pattern.rewrite(r),
                expr: expr.rewrite(r),
            },
            Self::Graph { name, pattern } => Self::Graph {
                name,
                pattern: pattern.rewrite(r),
            },
            Self::Service {
                endpoint,
                pattern,
                silent,
            } => Self::Service {
                endpoint,
                pattern: pattern.rewrite(r),
                silent,
            },
            Self::Bind {
                pattern,
                expr,
                variable,
            } => Self::Bind {
                pattern: pattern.rewrite(r),
                expr: expr.rewrite(r),
                variable,
            },
            Self::Subquery { query } => Self::Subquery {
                query: query.rewrite(r),
            },
            Self::GroupBy {
                pattern,
                keys,
                aggregates,
            } => Self::GroupBy {
                pattern: pattern.rewrite(r),
                keys: keys.rewrite(r),
                aggregates: aggregates
                    .into_iter()
                    .map(|binding| AggregateBinding {
                        aggregate: binding.aggregate.rewrite(r),
                        variable: binding.variable,
                    })
                    .collect(),
            },
            Self::PropertyPath {
                subject,
                path,
                object,
            } => Self::PropertyPath {
                subject,
                path: path.rewrite(r),
                object,
            },
        };
        r.pattern(rebuilt)
    }
}

impl Rewrite for PropertyPath {
    fn rewrite<R: Rewriter + ?Sized>(self, r: &R) -> Self {
        let rebuilt = match self {
            iri @ Self::Iri { .. } => iri,
            negation @ Self::Negation { .. } => negation,
            Self::Sequence { lhs, rhs } => Self::Sequence {
                lhs: lhs.rewrite(r),
                rhs: rhs.rewrite(r),
            },
            Self::Alternative { lhs, rhs } => Self::Alternative {
                lhs: lhs.rewrite(r),
                rhs: rhs.rewrite(r),
            },
            Self::Inverse { path } => Self::Inverse {
                path: path.rewrite(r),
            },
            Self::ZeroOrMore { path } => Self::ZeroOrMore {
                path: path.rewrite(r),
            },
            Self::OneOrMore { path } => Self::OneOrMore {
                path: path.rewrite(r),
            },
            Self::ZeroOrOne { path } => Self::ZeroOrOne {
                path: path.rewrite(r),
            },
            Self::Range { path, min, max } => Self::Range {
                path: path.rewrite(r),
                min,
                max,
            },
        };
        r.path(rebuilt)
    }
}

// ============================================================================
// Expressions
// ============================================================================

impl Rewrite for Expression {
    fn rewrite<R: Rewriter + ?Sized>(self, r: &R) -> Self {
        macro_rules! binary {
            ($variant:ident, $lhs:expr, $rhs:expr) => {
                Self::$variant {
                    lhs: $lhs.rewrite(r),
                    rhs: $rhs.rewrite(r),
                }
            };
        }
        macro_rules! unary {
            ($variant:ident, $expr:expr) => {
                Self::$variant {
                    expr: $expr.rewrite(r),
                }
            };
        }

        let rebuilt = match self {
            leaf @ (Self::Literal { .. }
            | Self::Variable { .. }
            | Self::Column { .. }
            | Self::Bound { .. }) => leaf,

            Self::Add { lhs, rhs } => binary!(Add, lhs, rhs),
            Self::Subtract { lhs, rhs } => binary!(Subtract, lhs, rhs),
            Self::Multiply { lhs, rhs } => binary!(Multiply, lhs, rhs),
            Self::Divide { lhs, rhs } => binary!(Divide, lhs, rhs),
            Self::Modulo { lhs, rhs } => binary!(Modulo, lhs, rhs),
            Self::Equal { lhs, rhs } => binary!(Equal, lhs, rhs),
            Self::NotEqual { lhs, rhs } => binary!(NotEqual, lhs, rhs),
            Self::LessThan { lhs, rhs } => binary!(LessThan, lhs, rhs),
            Self::LessThanOrEqual { lhs, rhs } => binary!(LessThanOrEqual, lhs, rhs),
            Self::GreaterThan { lhs, rhs } => binary!(GreaterThan, lhs, rhs),
            Self::GreaterThanOrEqual { lhs, rhs } => binary!(GreaterThanOrEqual, lhs, rhs),
            Self::And { lhs, rhs } => binary!(And, lhs, rhs),
            Self::Or { lhs, rhs } => binary!(Or, lhs, rhs),

            Self::Negate { expr } => unary!(Negate, expr),
            Self::Not { expr } => unary!(Not, expr),
            Self::IsNull { expr } => unary!(IsNull, expr),
            Self::IsNotNull { expr } => unary!(IsNotNull, expr),
            Self::IsTriple { expr } => unary!(IsTriple, expr),
            Self::Subject { expr } => unary!(Subject, expr),
            Self::Predicate { expr } => unary!(Predicate, expr),
            Self::Object { expr } => unary!(Object, expr),

            Self::Like { expr, pattern } => Self::Like {
                expr: expr.rewrite(r),
                pattern,
            },
            Self::Regex {
                expr,
                pattern,
                flags,
            } => Self::Regex {
                expr: expr.rewrite(r),
                pattern,
                flags,
            },
            Self::Between { expr, low, high } => Self::Between {
                expr: expr.rewrite(r),
                low: low.rewrite(r),
                high: high.rewrite(r),
            },
            Self::InList { expr, values } => Self::InList {
                expr: expr.rewrite(r),
                values: values.rewrite(r),
            },
            Self::NotInList { expr, values } => Self::NotInList {
                expr: expr.rewrite(r),
                values: values.rewrite(r),
            },
            Self::Aggregate { aggregate_function } => Self::Aggregate {
                aggregate_function: aggregate_function.rewrite(r),
            },
            Self::FunctionCall { function_call } => Self::FunctionCall {
                function_call: FunctionCall {
                    arguments: function_call.arguments.rewrite(r),
                    ..function_call
                },
            },
            Self::CaseWhen { cases, else_result } => Self::CaseWhen {
                cases: cases
                    .into_iter()
                    .map(|branch| CaseBranch {
                        condition: branch.condition.rewrite(r),
                        result: branch.result.rewrite(r),
                    })
                    .collect(),
                else_result: else_result.rewrite(r),
            },
            Self::Coalesce { expressions } => Self::Coalesce {
                expressions: expressions.rewrite(r),
            },
            Self::Cast { expr, target_type } => Self::Cast {
                expr: expr.rewrite(r),
                target_type,
            },
            Self::Triple {
                subject_expr,
                predicate_expr,
                object_expr,
            } => Self::Triple {
                subject_expr: subject_expr.rewrite(r),
                predicate_expr: predicate_expr.rewrite(r),
                object_expr: object_expr.rewrite(r),
            },
            Self::Exists { query } => Self::Exists {
                query: query.rewrite(r),
            },
            Self::NotExists { query } => Self::NotExists {
                query: query.rewrite(r),
            },
            Self::ScalarSubquery { query } => Self::ScalarSubquery {
                query: query.rewrite(r),
            },
            Self::InSubquery { expr, query } => Self::InSubquery {
                expr: expr.rewrite(r),
                query: query.rewrite(r),
            },
        };
        r.expression(rebuilt)
    }
}

impl Rewrite for AggregateFunction {
    fn rewrite<R: Rewriter + ?Sized>(self, r: &R) -> Self {
        match self {
            Self::Count { expr, distinct } => Self::Count {
                expr: expr.rewrite(r),
                distinct,
            },
            Self::Sum { expr, distinct } => Self::Sum {
                expr: expr.rewrite(r),
                distinct,
            },
            Self::Avg { expr, distinct } => Self::Avg {
                expr: expr.rewrite(r),
                distinct,
            },
            Self::Min { expr, distinct } => Self::Min {
                expr: expr.rewrite(r),
                distinct,
            },
            Self::Max { expr, distinct } => Self::Max {
                expr: expr.rewrite(r),
                distinct,
            },
            Self::GroupConcat {
                expr,
                distinct,
                separator,
                order_by,
            } => Self::GroupConcat {
                expr: expr.rewrite(r),
                distinct,
                separator,
                order_by: order_by.rewrite(r),
            },
            Self::Sample { expr } => Self::Sample {
                expr: expr.rewrite(r),
            },
            Self::ArrayAgg {
                expr,
                distinct,
                order_by,
            } => Self::ArrayAgg {
                expr: expr.rewrite(r),
                distinct,
                order_by: order_by.rewrite(r),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{SparqlTerm, TriplePattern};
    use std::cell::Cell;

    fn bgp(s: &str, o: &str) -> GraphPattern {
        GraphPattern::bgp(vec![TriplePattern::new(
            SparqlTerm::var(s),
            SparqlTerm::iri("http://ex/p"),
            SparqlTerm::var(o),
        )])
    }

    fn iri(value: &str) -> PropertyPath {
        PropertyPath::iri(value)
    }

    /// Counts every hook invocation.
    #[derive(Default)]
    struct Counter {
        patterns: Cell<usize>,
        paths: Cell<usize>,
        expressions: Cell<usize>,
    }

    impl Rewriter for Counter {
        fn pattern(&self, pattern: GraphPattern) -> GraphPattern {
            self.patterns.set(self.patterns.get() + 1);
            pattern
        }

        fn path(&self, path: PropertyPath) -> PropertyPath {
            self.paths.set(self.paths.get() + 1);
            path
        }

        fn expression(&self, expr: Expression) -> Expression {
            self.expressions.set(self.expressions.get() + 1);
            expr
        }
    }

    /// Renames every `?x` to `?y`.
    struct Rename;

    impl Rewriter for Rename {
        fn expression(&self, expr: Expression) -> Expression {
            match expr {
                Expression::Variable { variable } if variable.name() == "x" => {
                    Expression::var("y")
                }
                other => other,
            }
        }
    }

    #[test]
    fn test_identity_rewrite_is_noop() {
        let pattern = GraphPattern::filter(
            GraphPattern::optional(bgp("a", "b"), bgp("b", "c")),
            Expression::bound("c"),
        );
        assert_eq!(pattern.clone().rewrite(&Counter::default()), pattern);
    }

    #[test]
    fn test_hooks_visit_every_node() {
        let pattern = GraphPattern::filter(
            GraphPattern::join(
                bgp("a", "b"),
                GraphPattern::path(
                    SparqlTerm::var("b"),
                    PropertyPath::one_or_more(iri("http://ex/knows")),
                    SparqlTerm::var("c"),
                ),
            ),
            Expression::and(Expression::bound("a"), Expression::bound("c")),
        );
        let counter = Counter::default();
        pattern.rewrite(&counter);
        assert_eq!(counter.patterns.get(), 4);
        assert_eq!(counter.paths.get(), 2);
        assert_eq!(counter.expressions.get(), 3);
    }

    #[test]
    fn test_rewrite_reaches_exists_subquery() {
        let inner = SelectQuery::from_pattern(GraphPattern::filter(
            bgp("x", "z"),
            Expression::is_not_null(Expression::var("x")),
        ));
        let pattern = GraphPattern::filter(bgp("x", "w"), Expression::exists(inner));

        let rewritten = pattern.rewrite(&Rename);
        let GraphPattern::Filter { expr, .. } = rewritten else {
            panic!("expected filter");
        };
        let Expression::Exists { query } = expr else {
            panic!("expected exists");
        };
        let GraphPattern::Filter { expr, .. } = query.pattern().unwrap() else {
            panic!("expected inner filter");
        };
        assert_eq!(expr, Expression::is_not_null(Expression::var("y")));
    }

    #[test]
    fn test_join_merger_keeps_non_basic_joins() {
        let pattern = GraphPattern::join(
            bgp("a", "b"),
            GraphPattern::optional(bgp("b", "c"), bgp("c", "d")),
        );
        assert_eq!(pattern.clone().rewrite(&JoinMerger), pattern);
    }

    #[test]
    fn test_join_merger_inside_statement() {
        let statement = QueryStatement::Ask(AskQuery {
            pattern: GraphPattern::join(bgp("a", "b"), bgp("b", "c")),
        });
        let QueryStatement::Ask(ask) = statement.rewrite(&JoinMerger) else {
            panic!("expected ask");
        };
        match ask.pattern {
            GraphPattern::Basic { triples } => assert_eq!(triples.len(), 2),
            other => panic!("expected basic, got {:?}", other),
        }
    }

    #[test]
    fn test_path_simplifier() {
        let pattern = GraphPattern::path(
            SparqlTerm::var("s"),
            PropertyPath::zero_or_more(PropertyPath::zero_or_more(iri("http://ex/p"))),
            SparqlTerm::var("o"),
        );
        assert_eq!(
            pattern.rewrite(&PathSimplifier),
            GraphPattern::path(
                SparqlTerm::var("s"),
                PropertyPath::zero_or_more(iri("http://ex/p")),
                SparqlTerm::var("o"),
            )
        );
    }
}
