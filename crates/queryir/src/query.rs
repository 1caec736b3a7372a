//! SELECT queries, projections and sort keys.

use crate::expr::Expression;
use crate::pattern::GraphPattern;
use crate::prefix::PrefixMap;
use crate::render::{block, inline};
use crate::source::DataSource;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A SELECT over a data source with the usual solution modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectQuery {
    pub projection: Projection,
    #[serde(default)]
    pub distinct: bool,
    #[serde(default)]
    pub reduced: bool,
    pub source: DataSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expression>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<Expression>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub having: Option<Expression>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<SortKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum Projection {
    /// `SELECT *`
    All,
    Items { items: Vec<ProjectionItem> },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectionItem {
    pub expr: Expression,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Projection {
    /// An empty item list projects everything, like `All`
    pub fn is_all(&self) -> bool {
        match self {
            Self::All => true,
            Self::Items { items } => items.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortKey {
    pub expr: Expression,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(expr: Expression) -> Self {
        Self {
            expr,
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(expr: Expression) -> Self {
        Self {
            expr,
            direction: SortDirection::Descending,
        }
    }

    pub fn to_sparql(&self, prefixes: &PrefixMap) -> String {
        match self.direction {
            SortDirection::Ascending => format!("ASC({})", self.expr.to_sparql(prefixes)),
            SortDirection::Descending => format!("DESC({})", self.expr.to_sparql(prefixes)),
        }
    }

    pub fn to_sql(&self) -> String {
        match self.direction {
            SortDirection::Ascending => format!("{} ASC", self.expr.to_sql()),
            SortDirection::Descending => format!("{} DESC", self.expr.to_sql()),
        }
    }
}

impl ProjectionItem {
    pub fn new(expr: Expression) -> Self {
        Self { expr, alias: None }
    }

    pub fn aliased(expr: Expression, alias: impl Into<String>) -> Self {
        Self {
            expr,
            alias: Some(alias.into()),
        }
    }

    /// Name of the output column: the alias, or the bare variable/column name
    pub fn output_name(&self) -> Option<String> {
        match (&self.alias, &self.expr) {
            (Some(alias), _) => Some(alias.clone()),
            (None, Expression::Variable { variable }) => Some(variable.name().to_string()),
            (None, Expression::Column { column }) => Some(column.name.clone()),
            _ => None,
        }
    }

    fn to_sparql(&self, index: usize, prefixes: &PrefixMap) -> String {
        match (&self.alias, &self.expr) {
            (None, Expression::Variable { .. } | Expression::Column { .. }) => {
                self.expr.to_sparql(prefixes)
            }
            (Some(alias), _) => format!("({} AS ?{})", self.expr.to_sparql(prefixes), alias),
            (None, _) => format!("({} AS ?_{})", self.expr.to_sparql(prefixes), index + 1),
        }
    }

    pub fn to_sql(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} AS {}", self.expr.to_sql(), alias),
            None => self.expr.to_sql(),
        }
    }
}

impl Default for SelectQuery {
    fn default() -> Self {
        Self::new(DataSource::pattern(GraphPattern::default()))
    }
}

impl SelectQuery {
    /// `SELECT *` over a source with no modifiers
    pub fn new(source: DataSource) -> Self {
        Self {
            projection: Projection::All,
            distinct: false,
            reduced: false,
            source,
            filter: None,
            group_by: Vec::new(),
            having: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    pub fn from_pattern(pattern: GraphPattern) -> Self {
        Self::new(DataSource::pattern(pattern))
    }

    pub fn project(mut self, items: Vec<ProjectionItem>) -> Self {
        self.projection = Projection::Items { items };
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn reduced(mut self) -> Self {
        self.reduced = true;
        self
    }

    pub fn with_filter(mut self, expr: Expression) -> Self {
        self.filter = Some(expr);
        self
    }

    pub fn group_by(mut self, key: Expression) -> Self {
        self.group_by.push(key);
        self
    }

    pub fn having(mut self, expr: Expression) -> Self {
        self.having = Some(expr);
        self
    }

    pub fn order_by(mut self, key: SortKey) -> Self {
        self.order_by.push(key);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// The source as a graph pattern, if it has one
    pub fn pattern(&self) -> Option<GraphPattern> {
        self.source.to_graph_pattern()
    }

    /// Names the query exposes to an enclosing scope.
    ///
    /// `SELECT *` projects every variable its source can bind.
    pub fn projected_variables(&self) -> BTreeSet<String> {
        match &self.projection {
            Projection::Items { items } if !items.is_empty() => {
                items.iter().filter_map(ProjectionItem::output_name).collect()
            }
            _ => self.source.variables(),
        }
    }

    pub fn complexity(&self) -> f64 {
        self.source.complexity()
    }

    fn is_plain(&self) -> bool {
        self.projection.is_all()
            && !self.distinct
            && !self.reduced
            && self.group_by.is_empty()
            && self.having.is_none()
            && self.order_by.is_empty()
            && self.limit.is_none()
            && self.offset.is_none()
    }

    /// The WHERE group body: source pattern plus the filter
    fn where_body(&self, prefixes: &PrefixMap) -> String {
        let body = self.source.to_sparql(prefixes);
        match &self.filter {
            Some(filter) => {
                let filter = format!("FILTER({})", filter.to_sparql(prefixes));
                if body.is_empty() {
                    filter
                } else {
                    format!("{}\n{}", body, filter)
                }
            }
            None => body,
        }
    }

    /// Single-line group content for `EXISTS { … }`.
    ///
    /// Plain `SELECT *` queries contribute their pattern directly; anything
    /// with modifiers becomes a nested SELECT.
    pub(crate) fn group_inline(&self, prefixes: &PrefixMap) -> String {
        if self.is_plain() {
            inline(&self.where_body(prefixes))
        } else {
            inline(&self.to_sparql(prefixes))
        }
    }

    pub fn to_sparql(&self, prefixes: &PrefixMap) -> String {
        let mut head = String::from("SELECT");
        if self.distinct {
            head.push_str(" DISTINCT");
        } else if self.reduced {
            head.push_str(" REDUCED");
        }
        match &self.projection {
            Projection::Items { items } if !items.is_empty() => {
                for (index, item) in items.iter().enumerate() {
                    head.push(' ');
                    head.push_str(&item.to_sparql(index, prefixes));
                }
            }
            _ => head.push_str(" *"),
        }

        let mut lines = vec![head, block("WHERE", &self.where_body(prefixes))];
        if !self.group_by.is_empty() {
            let keys: Vec<String> = self.group_by.iter().map(|k| k.to_sparql(prefixes)).collect();
            lines.push(format!("GROUP BY {}", keys.join(" ")));
        }
        if let Some(having) = &self.having {
            lines.push(format!("HAVING({})", having.to_sparql(prefixes)));
        }
        if !self.order_by.is_empty() {
            let keys: Vec<String> = self.order_by.iter().map(|k| k.to_sparql(prefixes)).collect();
            lines.push(format!("ORDER BY {}", keys.join(" ")));
        }
        if let Some(limit) = self.limit {
            lines.push(format!("LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            lines.push(format!("OFFSET {}", offset));
        }
        lines.join("\n")
    }

    pub fn to_sql(&self) -> String {
        let mut out = String::from("SELECT");
        if self.distinct {
            out.push_str(" DISTINCT");
        }
        match &self.projection {
            Projection::Items { items } if !items.is_empty() => {
                let items: Vec<String> = items.iter().map(ProjectionItem::to_sql).collect();
                out.push(' ');
                out.push_str(&items.join(", "));
            }
            _ => out.push_str(" *"),
        }
        out.push_str(&format!(" FROM {}", self.source.to_sql()));
        if let Some(filter) = &self.filter {
            out.push_str(&format!(" WHERE {}", filter.to_sql()));
        }
        if !self.group_by.is_empty() {
            let keys: Vec<String> = self.group_by.iter().map(Expression::to_sql).collect();
            out.push_str(&format!(" GROUP BY {}", keys.join(", ")));
        }
        if let Some(having) = &self.having {
            out.push_str(&format!(" HAVING {}", having.to_sql()));
        }
        if !self.order_by.is_empty() {
            let keys: Vec<String> = self.order_by.iter().map(SortKey::to_sql).collect();
            out.push_str(&format!(" ORDER BY {}", keys.join(", ")));
        }
        if let Some(limit) = self.limit {
            out.push_str(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            out.push_str(&format!(" OFFSET {}", offset));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{AggregateFunction, ColumnRef};
    use crate::term::{SparqlTerm, TriplePattern};

    fn people() -> GraphPattern {
        GraphPattern::bgp(vec![
            TriplePattern::new(
                SparqlTerm::var("p"),
                SparqlTerm::iri("http://ex/name"),
                SparqlTerm::var("name"),
            ),
            TriplePattern::new(
                SparqlTerm::var("p"),
                SparqlTerm::iri("http://ex/age"),
                SparqlTerm::var("age"),
            ),
        ])
    }

    fn prefixes() -> PrefixMap {
        PrefixMap::new().with("ex", "http://ex/")
    }

    #[test]
    fn test_select_star_projects_source_variables() {
        let query = SelectQuery::from_pattern(people());
        let vars: Vec<String> = query.projected_variables().into_iter().collect();
        assert_eq!(vars, vec!["age", "name", "p"]);
    }

    #[test]
    fn test_empty_item_list_behaves_like_star() {
        let query = SelectQuery::from_pattern(people()).project(vec![]);
        let vars: Vec<String> = query.projected_variables().into_iter().collect();
        assert_eq!(vars, vec!["age", "name", "p"]);
        assert!(query.to_sparql(&prefixes()).starts_with("SELECT *\n"));
        assert_eq!(
            query.projected_variables(),
            SelectQuery::from_pattern(people()).projected_variables()
        );
    }

    #[test]
    fn test_projection_items_use_aliases() {
        let query = SelectQuery::from_pattern(people()).project(vec![
            ProjectionItem::new(Expression::var("name")),
            ProjectionItem::aliased(
                Expression::aggregate(AggregateFunction::count_all()),
                "total",
            ),
            ProjectionItem::new(Expression::lit(1i64)),
        ]);
        let vars: Vec<String> = query.projected_variables().into_iter().collect();
        assert_eq!(vars, vec!["name", "total"]);
    }

    #[test]
    fn test_select_sparql_with_modifiers() {
        let query = SelectQuery::from_pattern(people())
            .project(vec![
                ProjectionItem::new(Expression::var("name")),
                ProjectionItem::aliased(
                    Expression::aggregate(AggregateFunction::avg(Expression::var("age"))),
                    "avgAge",
                ),
            ])
            .distinct()
            .with_filter(Expression::greater_than(
                Expression::var("age"),
                Expression::lit(18i64),
            ))
            .group_by(Expression::var("name"))
            .having(Expression::greater_than(
                Expression::aggregate(AggregateFunction::count_all()),
                Expression::lit(1i64),
            ))
            .order_by(SortKey::desc(Expression::var("name")))
            .limit(10)
            .offset(20);

        insta::assert_snapshot!(query.to_sparql(&prefixes()), @r###"
        SELECT DISTINCT ?name (AVG(?age) AS ?avgAge)
        WHERE {
          ?p ex:name ?name .
          ?p ex:age ?age .
          FILTER((?age > 18))
        }
        GROUP BY ?name
        HAVING((COUNT(*) > 1))
        ORDER BY DESC(?name)
        LIMIT 10
        OFFSET 20
        "###);
    }

    #[test]
    fn test_select_sql() {
        let query = SelectQuery::new(DataSource::table("users"))
            .project(vec![
                ProjectionItem::new(Expression::column(ColumnRef::new("name"))),
                ProjectionItem::aliased(
                    Expression::aggregate(AggregateFunction::count_all()),
                    "n",
                ),
            ])
            .with_filter(Expression::is_not_null(Expression::column(ColumnRef::new(
                "email",
            ))))
            .group_by(Expression::column(ColumnRef::new("name")))
            .order_by(SortKey::asc(Expression::column(ColumnRef::new("name"))))
            .limit(5);
        assert_eq!(
            query.to_sql(),
            "SELECT name, COUNT(*) AS n FROM users WHERE (email IS NOT NULL) \
             GROUP BY name ORDER BY name ASC LIMIT 5"
        );
    }

    #[test]
    fn test_exists_inlines_plain_pattern() {
        let inner = SelectQuery::from_pattern(GraphPattern::bgp(vec![TriplePattern::new(
            SparqlTerm::var("p"),
            SparqlTerm::iri("http://ex/email"),
            SparqlTerm::var("e"),
        )]));
        let expr = Expression::exists(inner.clone());
        assert_eq!(expr.to_sparql(&prefixes()), "EXISTS { ?p ex:email ?e . }");

        let limited = Expression::not_exists(inner.limit(1));
        assert_eq!(
            limited.to_sparql(&prefixes()),
            "NOT EXISTS { SELECT * WHERE { ?p ex:email ?e . } LIMIT 1 }"
        );
    }
}
