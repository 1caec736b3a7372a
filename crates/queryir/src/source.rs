//! FROM-clause sources unifying relational and graph inputs.

use crate::expr::Expression;
use crate::literal::Literal;
use crate::pattern::GraphPattern;
use crate::prefix::PrefixMap;
use crate::query::{ProjectionItem, SelectQuery};
use crate::render::inline;
use crate::term::{SparqlTerm, Variable};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A relational or graph source a query reads from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    tag = "tag",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum DataSource {
    Table {
        table: TableRef,
    },
    Subquery {
        query: Box<SelectQuery>,
        alias: String,
    },
    Join {
        lhs: Box<DataSource>,
        rhs: Box<DataSource>,
        join_type: JoinType,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        condition: Option<JoinCondition>,
    },
    Values {
        rows: Vec<Vec<Literal>>,
        columns: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alias: Option<String>,
    },
    GraphTable {
        graph_table: GraphTable,
    },
    GraphPattern {
        pattern: GraphPattern,
    },
    NamedGraph {
        name: SparqlTerm,
        pattern: GraphPattern,
    },
    Service {
        endpoint: String,
        pattern: GraphPattern,
        #[serde(default)]
        silent: bool,
    },
    Union {
        lhs: Box<DataSource>,
        rhs: Box<DataSource>,
        #[serde(default)]
        all: bool,
    },
    Intersect {
        lhs: Box<DataSource>,
        rhs: Box<DataSource>,
        #[serde(default)]
        all: bool,
    },
    Except {
        lhs: Box<DataSource>,
        rhs: Box<DataSource>,
        #[serde(default)]
        all: bool,
    },
}

/// A table reference, optionally schema-qualified and aliased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            schema: None,
            name: name.into(),
            alias: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn to_sql(&self) -> String {
        let name = match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        };
        match &self.alias {
            Some(alias) => format!("{} AS {}", name, alias),
            None => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinType {
    fn keyword(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::Right => "RIGHT JOIN",
            Self::Full => "FULL JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// How two joined sources are correlated.
///
/// A join without a condition is a CROSS join for [`JoinType::Cross`] and a
/// NATURAL join otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum JoinCondition {
    On { expr: Expression },
    Using { columns: Vec<String> },
}

/// SQL/PGQ `GRAPH_TABLE (graph MATCH ... WHERE ... COLUMNS (...))`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphTable {
    pub graph: String,
    #[serde(rename = "match")]
    pub elements: Vec<PathElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expression>,
    #[serde(default)]
    pub columns: Vec<ProjectionItem>,
}

/// One node or edge of a MATCH path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum PathElement {
    Node {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variable: Option<String>,
        #[serde(default)]
        labels: Vec<String>,
    },
    Edge {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        variable: Option<String>,
        #[serde(default)]
        labels: Vec<String>,
        direction: EdgeDirection,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        quantifier: Option<Quantifier>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum EdgeDirection {
    /// `-[]->`
    Out,
    /// `<-[]-`
    In,
    /// `<-[]->`
    Both,
    /// `-[]-`
    Undirected,
}

/// Repetition of an edge pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum Quantifier {
    ZeroOrMore,
    OneOrMore,
    Range {
        min: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<u32>,
    },
}

impl PathElement {
    pub fn node(variable: Option<&str>, labels: &[&str]) -> Self {
        Self::Node {
            variable: variable.map(str::to_string),
            labels: labels.iter().map(|l| l.to_string()).collect(),
        }
    }

    pub fn edge(variable: Option<&str>, labels: &[&str], direction: EdgeDirection) -> Self {
        Self::Edge {
            variable: variable.map(str::to_string),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            direction,
            quantifier: None,
        }
    }

    pub fn variable(&self) -> Option<&str> {
        match self {
            Self::Node { variable, .. } | Self::Edge { variable, .. } => variable.as_deref(),
        }
    }

    fn filler(variable: &Option<String>, labels: &[String]) -> String {
        let mut out = variable.clone().unwrap_or_default();
        if !labels.is_empty() {
            out.push(':');
            out.push_str(&labels.join("|"));
        }
        out
    }

    pub fn to_sql(&self) -> String {
        match self {
            Self::Node { variable, labels } => format!("({})", Self::filler(variable, labels)),
            Self::Edge {
                variable,
                labels,
                direction,
                quantifier,
            } => {
                let filler = Self::filler(variable, labels);
                let edge = match direction {
                    EdgeDirection::Out => format!("-[{}]->", filler),
                    EdgeDirection::In => format!("<-[{}]-", filler),
                    EdgeDirection::Both => format!("<-[{}]->", filler),
                    EdgeDirection::Undirected => format!("-[{}]-", filler),
                };
                match quantifier {
                    None => edge,
                    Some(Quantifier::ZeroOrMore) => format!("{}*", edge),
                    Some(Quantifier::OneOrMore) => format!("{}+", edge),
                    Some(Quantifier::Range { min, max: Some(max) }) => {
                        format!("{}{{{},{}}}", edge, min, max)
                    }
                    Some(Quantifier::Range { min, max: None }) => format!("{}{{{},}}", edge, min),
                }
            }
        }
    }
}

impl GraphTable {
    pub fn new(graph: impl Into<String>, elements: Vec<PathElement>) -> Self {
        Self {
            graph: graph.into(),
            elements,
            filter: None,
            columns: Vec::new(),
        }
    }

    /// Element variables declared by the MATCH path
    pub fn variables(&self) -> BTreeSet<String> {
        self.elements
            .iter()
            .filter_map(PathElement::variable)
            .map(str::to_string)
            .collect()
    }

    pub fn to_sql(&self) -> String {
        let path: String = self.elements.iter().map(PathElement::to_sql).collect();
        let mut out = format!("GRAPH_TABLE ({} MATCH {}", self.graph, path);
        if let Some(filter) = &self.filter {
            out.push_str(&format!(" WHERE {}", filter.to_sql()));
        }
        if !self.columns.is_empty() {
            let columns: Vec<String> = self.columns.iter().map(ProjectionItem::to_sql).collect();
            out.push_str(&format!(" COLUMNS ({})", columns.join(", ")));
        }
        out.push(')');
        out
    }
}

impl DataSource {
    pub fn table(name: impl Into<String>) -> Self {
        Self::Table {
            table: TableRef::new(name),
        }
    }

    pub fn pattern(pattern: GraphPattern) -> Self {
        Self::GraphPattern { pattern }
    }

    pub fn join(
        lhs: DataSource,
        rhs: DataSource,
        join_type: JoinType,
        condition: Option<JoinCondition>,
    ) -> Self {
        Self::Join {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            join_type,
            condition,
        }
    }

    pub fn subquery(query: SelectQuery, alias: impl Into<String>) -> Self {
        Self::Subquery {
            query: Box::new(query),
            alias: alias.into(),
        }
    }

    /// Variables or columns a graph-shaped source can bind
    pub fn variables(&self) -> BTreeSet<String> {
        match self {
            Self::GraphTable { graph_table } => {
                let mut out = graph_table.variables();
                out.extend(graph_table.columns.iter().filter_map(ProjectionItem::output_name));
                out
            }
            Self::Values { columns, .. } => columns.iter().cloned().collect(),
            Self::Subquery { query, .. } => query.projected_variables(),
            Self::Join { lhs, rhs, .. } => {
                let mut out = lhs.variables();
                out.extend(rhs.variables());
                out
            }
            Self::Except { lhs, .. } => lhs.variables(),
            Self::Union { lhs, rhs, .. } | Self::Intersect { lhs, rhs, .. } => {
                let mut out = lhs.variables();
                out.extend(rhs.variables());
                out
            }
            other => other
                .to_graph_pattern()
                .map(|p| p.variables())
                .unwrap_or_default(),
        }
    }

    /// The equivalent graph pattern, when the source is graph-shaped.
    ///
    /// Inner and left joins map to join and OPTIONAL, union to UNION and
    /// except to MINUS; every other combination has no graph form.
    pub fn to_graph_pattern(&self) -> Option<GraphPattern> {
        match self {
            Self::GraphPattern { pattern } => Some(pattern.clone()),
            Self::NamedGraph { name, pattern } => {
                Some(GraphPattern::graph(name.clone(), pattern.clone()))
            }
            Self::Service {
                endpoint,
                pattern,
                silent,
            } => Some(GraphPattern::service(
                endpoint.clone(),
                pattern.clone(),
                *silent,
            )),
            Self::Values { rows, columns, .. } => Some(GraphPattern::values(
                columns.iter().map(|c| Variable::new(c.as_str())).collect(),
                rows.iter()
                    .map(|row| {
                        row.iter()
                            .map(|v| (!v.is_null()).then(|| v.clone()))
                            .collect()
                    })
                    .collect(),
            )),
            Self::Join {
                lhs,
                rhs,
                join_type,
                condition,
            } => {
                let (lhs, rhs) = (lhs.to_graph_pattern()?, rhs.to_graph_pattern()?);
                let on = match condition {
                    Some(JoinCondition::On { expr }) => Some(expr.clone()),
                    Some(JoinCondition::Using { .. }) | None => None,
                };
                match join_type {
                    JoinType::Inner | JoinType::Cross => {
                        let joined = GraphPattern::join(lhs, rhs);
                        Some(match on {
                            Some(expr) => GraphPattern::filter(joined, expr),
                            None => joined,
                        })
                    }
                    // LeftJoin(l, r, e): the ON condition stays inside the OPTIONAL
                    JoinType::Left => Some(GraphPattern::optional(
                        lhs,
                        match on {
                            Some(expr) => GraphPattern::filter(rhs, expr),
                            None => rhs,
                        },
                    )),
                    JoinType::Right | JoinType::Full => None,
                }
            }
            Self::Union { lhs, rhs, .. } => Some(GraphPattern::union(
                lhs.to_graph_pattern()?,
                rhs.to_graph_pattern()?,
            )),
            Self::Except { lhs, rhs, .. } => Some(GraphPattern::minus(
                lhs.to_graph_pattern()?,
                rhs.to_graph_pattern()?,
            )),
            Self::Subquery { query, .. } => Some(GraphPattern::subquery(query.as_ref().clone())),
            Self::Table { .. } | Self::GraphTable { .. } | Self::Intersect { .. } => None,
        }
    }

    /// SPARQL group body for the source; non-graph sources become a comment.
    pub fn to_sparql(&self, prefixes: &PrefixMap) -> String {
        match self.to_graph_pattern() {
            Some(pattern) => pattern.to_sparql(prefixes),
            None => format!("# FROM {}", self.to_sql()),
        }
    }

    pub fn to_sql(&self) -> String {
        match self {
            Self::Table { table } => table.to_sql(),
            Self::Subquery { query, alias } => format!("({}) AS {}", query.to_sql(), alias),
            Self::Join {
                lhs,
                rhs,
                join_type,
                condition,
            } => {
                let (lhs, rhs) = (lhs.to_sql(), rhs.to_sql());
                match (join_type, condition) {
                    (JoinType::Cross, _) => format!("{} CROSS JOIN {}", lhs, rhs),
                    (_, None) => format!("{} NATURAL {} {}", lhs, join_type.keyword(), rhs),
                    (_, Some(JoinCondition::On { expr })) => format!(
                        "{} {} {} ON {}",
                        lhs,
                        join_type.keyword(),
                        rhs,
                        expr.to_sql()
                    ),
                    (_, Some(JoinCondition::Using { columns })) => format!(
                        "{} {} {} USING ({})",
                        lhs,
                        join_type.keyword(),
                        rhs,
                        columns.join(", ")
                    ),
                }
            }
            Self::Values {
                rows,
                columns,
                alias,
            } => {
                let rows: Vec<String> = rows
                    .iter()
                    .map(|row| {
                        let cells: Vec<String> = row.iter().map(Literal::to_sql).collect();
                        format!("({})", cells.join(", "))
                    })
                    .collect();
                let mut out = format!("(VALUES {})", rows.join(", "));
                if let Some(alias) = alias {
                    out.push_str(&format!(" AS {}", alias));
                    if !columns.is_empty() {
                        out.push_str(&format!(" ({})", columns.join(", ")));
                    }
                }
                out
            }
            Self::GraphTable { graph_table } => graph_table.to_sql(),
            Self::GraphPattern { pattern } => {
                format!(
                    "SPARQL {{ {} }}",
                    inline(&pattern.to_sparql(&PrefixMap::new()))
                )
            }
            Self::NamedGraph { name, pattern } => format!(
                "GRAPH {} {{ {} }}",
                name.to_sparql(&PrefixMap::new()),
                inline(&pattern.to_sparql(&PrefixMap::new()))
            ),
            Self::Service {
                endpoint,
                pattern,
                silent,
            } => format!(
                "SERVICE {}<{}> {{ {} }}",
                if *silent { "SILENT " } else { "" },
                endpoint,
                inline(&pattern.to_sparql(&PrefixMap::new()))
            ),
            Self::Union { lhs, rhs, all } => set_operation(lhs, "UNION", *all, rhs),
            Self::Intersect { lhs, rhs, all } => set_operation(lhs, "INTERSECT", *all, rhs),
            Self::Except { lhs, rhs, all } => set_operation(lhs, "EXCEPT", *all, rhs),
        }
    }

    /// Cost hint: graph-shaped sources use pattern complexity
    pub fn complexity(&self) -> f64 {
        match self.to_graph_pattern() {
            Some(pattern) => pattern.complexity(),
            None => match self {
                Self::Join { lhs, rhs, .. } => lhs.complexity() * rhs.complexity(),
                Self::Union { lhs, rhs, .. }
                | Self::Intersect { lhs, rhs, .. }
                | Self::Except { lhs, rhs, .. } => lhs.complexity() + rhs.complexity(),
                Self::Subquery { query, .. } => query.complexity(),
                _ => 10.0,
            },
        }
    }
}

fn set_operation(lhs: &DataSource, op: &str, all: bool, rhs: &DataSource) -> String {
    format!(
        "({}) {}{} ({})",
        lhs.to_sql(),
        op,
        if all { " ALL" } else { "" },
        rhs.to_sql()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::TriplePattern;

    fn bgp(s: &str, p: &str, o: &str) -> GraphPattern {
        GraphPattern::bgp(vec![TriplePattern::new(
            SparqlTerm::var(s),
            SparqlTerm::iri(p),
            SparqlTerm::var(o),
        )])
    }

    #[test]
    fn test_join_sql() {
        let users = DataSource::Table {
            table: TableRef::new("users").with_alias("u"),
        };
        let orders = DataSource::table("orders");
        let on = DataSource::join(
            users.clone(),
            orders.clone(),
            JoinType::Left,
            Some(JoinCondition::On {
                expr: Expression::equal(
                    Expression::column(crate::expr::ColumnRef::qualified("u", "id")),
                    Expression::column(crate::expr::ColumnRef::qualified("orders", "user_id")),
                ),
            }),
        );
        assert_eq!(
            on.to_sql(),
            "users AS u LEFT JOIN orders ON (u.id = orders.user_id)"
        );

        let natural = DataSource::join(users.clone(), orders.clone(), JoinType::Inner, None);
        assert_eq!(natural.to_sql(), "users AS u NATURAL INNER JOIN orders");

        let cross = DataSource::join(users, orders, JoinType::Cross, None);
        assert_eq!(cross.to_sql(), "users AS u CROSS JOIN orders");
    }

    #[test]
    fn test_using_condition() {
        let source = DataSource::join(
            DataSource::table("a"),
            DataSource::table("b"),
            JoinType::Inner,
            Some(JoinCondition::Using {
                columns: vec!["id".into(), "tenant".into()],
            }),
        );
        assert_eq!(source.to_sql(), "a INNER JOIN b USING (id, tenant)");
        assert_eq!(source.to_graph_pattern(), None);
    }

    #[test]
    fn test_graph_joins_map_to_patterns() {
        let lhs = DataSource::pattern(bgp("x", "http://ex/p", "y"));
        let rhs = DataSource::pattern(bgp("y", "http://ex/q", "z"));

        let left = DataSource::join(lhs.clone(), rhs.clone(), JoinType::Left, None);
        assert_eq!(
            left.to_graph_pattern(),
            Some(GraphPattern::optional(
                bgp("x", "http://ex/p", "y"),
                bgp("y", "http://ex/q", "z")
            ))
        );

        let except = DataSource::Except {
            lhs: Box::new(lhs.clone()),
            rhs: Box::new(rhs.clone()),
            all: false,
        };
        assert_eq!(
            except.variables(),
            ["x", "y"].iter().map(|s| s.to_string()).collect()
        );

        let right = DataSource::join(lhs, rhs, JoinType::Right, None);
        assert_eq!(right.to_graph_pattern(), None);
    }

    #[test]
    fn test_left_join_condition_stays_inside_optional() {
        let source = DataSource::join(
            DataSource::pattern(bgp("x", "http://ex/name", "n")),
            DataSource::pattern(bgp("x", "http://ex/age", "a")),
            JoinType::Left,
            Some(JoinCondition::On {
                expr: Expression::greater_than(Expression::var("a"), Expression::lit(18i64)),
            }),
        );
        let prefixes = PrefixMap::new().with("ex", "http://ex/");
        assert_eq!(
            source.to_sparql(&prefixes),
            "?x ex:name ?n .\nOPTIONAL {\n  ?x ex:age ?a .\n  FILTER((?a > 18))\n}"
        );

        let query = SelectQuery::new(source);
        let rendered = query.to_sparql(&prefixes);
        assert!(
            !rendered.contains("}\n  FILTER"),
            "filter escaped the optional: {}",
            rendered
        );
    }

    #[test]
    fn test_inner_join_condition_filters_the_join() {
        let source = DataSource::join(
            DataSource::pattern(bgp("x", "http://ex/name", "n")),
            DataSource::pattern(bgp("x", "http://ex/age", "a")),
            JoinType::Inner,
            Some(JoinCondition::On {
                expr: Expression::greater_than(Expression::var("a"), Expression::lit(18i64)),
            }),
        );
        assert_eq!(
            source.to_graph_pattern(),
            Some(GraphPattern::filter(
                GraphPattern::join(
                    bgp("x", "http://ex/name", "n"),
                    bgp("x", "http://ex/age", "a")
                ),
                Expression::greater_than(Expression::var("a"), Expression::lit(18i64)),
            ))
        );
    }

    #[test]
    fn test_graph_table_sql() {
        let mut table = GraphTable::new(
            "social",
            vec![
                PathElement::node(Some("a"), &["Person"]),
                PathElement::Edge {
                    variable: Some("k".into()),
                    labels: vec!["KNOWS".into()],
                    direction: EdgeDirection::Out,
                    quantifier: Some(Quantifier::Range {
                        min: 1,
                        max: Some(3),
                    }),
                },
                PathElement::node(Some("b"), &["Person"]),
            ],
        );
        table.filter = Some(Expression::equal(
            Expression::column(crate::expr::ColumnRef::qualified("a", "name")),
            Expression::lit("Ann"),
        ));
        table.columns = vec![ProjectionItem::aliased(
            Expression::column(crate::expr::ColumnRef::qualified("b", "name")),
            "friend",
        )];
        assert_eq!(
            table.to_sql(),
            "GRAPH_TABLE (social MATCH (a:Person)-[k:KNOWS]->{1,3}(b:Person) \
             WHERE (a.name = 'Ann') COLUMNS (b.name AS friend))"
        );
        let source = DataSource::GraphTable { graph_table: table };
        assert_eq!(
            source.variables(),
            ["a", "b", "friend", "k"].iter().map(|s| s.to_string()).collect()
        );
    }

    #[test]
    fn test_values_source_becomes_values_pattern() {
        let source = DataSource::Values {
            rows: vec![vec![Literal::int(1), Literal::Null]],
            columns: vec!["a".into(), "b".into()],
            alias: Some("v".into()),
        };
        assert_eq!(source.to_sql(), "(VALUES (1, NULL)) AS v (a, b)");
        let pattern = source.to_graph_pattern().unwrap();
        assert_eq!(pattern.to_sparql(&PrefixMap::new()), "VALUES (?a ?b) { (1 UNDEF) }");
    }

    #[test]
    fn test_table_renders_as_comment_in_sparql() {
        let source = DataSource::Table {
            table: TableRef::new("users").with_schema("public"),
        };
        assert_eq!(source.to_sparql(&PrefixMap::new()), "# FROM public.users");
    }
}
