//! Scalar expressions shared by the SQL and SPARQL surfaces.
//!
//! One tree serves both languages: arithmetic, comparison, logic, function
//! calls, aggregates, RDF-star accessors, and subquery-embedding forms
//! (`EXISTS`, scalar subqueries, `IN (subquery)`).

use crate::literal::{quote_string, Literal};
use crate::prefix::{PrefixMap, XSD};
use crate::query::{SelectQuery, SortKey};
use crate::render::inline;
use crate::term::Variable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A side-effect-free scalar computation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    tag = "tag",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum Expression {
    Literal {
        value: Literal,
    },
    Variable {
        variable: Variable,
    },
    Column {
        column: ColumnRef,
    },

    // Arithmetic
    Add {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Subtract {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Multiply {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Divide {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Modulo {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Negate {
        expr: Box<Expression>,
    },

    // Comparison
    Equal {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    NotEqual {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    LessThan {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    LessThanOrEqual {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    GreaterThan {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    GreaterThanOrEqual {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },

    // Logical
    And {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Or {
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    Not {
        expr: Box<Expression>,
    },

    IsNull {
        expr: Box<Expression>,
    },
    IsNotNull {
        expr: Box<Expression>,
    },
    Bound {
        variable: Variable,
    },

    /// SQL `LIKE` with `%` and `_` wildcards
    Like {
        expr: Box<Expression>,
        pattern: String,
    },
    Regex {
        expr: Box<Expression>,
        pattern: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        flags: Option<String>,
    },
    Between {
        expr: Box<Expression>,
        low: Box<Expression>,
        high: Box<Expression>,
    },
    InList {
        expr: Box<Expression>,
        values: Vec<Expression>,
    },
    NotInList {
        expr: Box<Expression>,
        values: Vec<Expression>,
    },

    Aggregate {
        aggregate_function: AggregateFunction,
    },
    FunctionCall {
        function_call: FunctionCall,
    },
    CaseWhen {
        cases: Vec<CaseBranch>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        else_result: Option<Box<Expression>>,
    },
    Coalesce {
        expressions: Vec<Expression>,
    },
    Cast {
        expr: Box<Expression>,
        target_type: DataType,
    },

    // RDF-star
    Triple {
        subject_expr: Box<Expression>,
        predicate_expr: Box<Expression>,
        object_expr: Box<Expression>,
    },
    IsTriple {
        expr: Box<Expression>,
    },
    Subject {
        expr: Box<Expression>,
    },
    Predicate {
        expr: Box<Expression>,
    },
    Object {
        expr: Box<Expression>,
    },

    // Subquery forms
    Exists {
        query: Box<SelectQuery>,
    },
    NotExists {
        query: Box<SelectQuery>,
    },
    ScalarSubquery {
        query: Box<SelectQuery>,
    },
    InSubquery {
        expr: Box<Expression>,
        query: Box<SelectQuery>,
    },
}

/// Column reference, optionally qualified by a table name or alias.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }

    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    pub fn to_sql(&self) -> String {
        match &self.table {
            Some(table) => format!("{}.{}", table, self.name),
            None => self.name.clone(),
        }
    }
}

/// One `WHEN condition THEN result` arm.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseBranch {
    pub condition: Expression,
    pub result: Expression,
}

/// A named function applied to arguments.
///
/// Names containing `://` are treated as extension function IRIs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: Vec<Expression>,
    #[serde(default)]
    pub distinct: bool,
}

impl FunctionCall {
    pub fn new(name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Self {
            name: name.into(),
            arguments,
            distinct: false,
        }
    }

    fn is_iri(&self) -> bool {
        self.name.contains("://")
    }
}

/// Aggregate functions, each with its own modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    tag = "tag",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum AggregateFunction {
    /// `None` counts rows (`COUNT(*)`)
    Count {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expr: Option<Box<Expression>>,
        #[serde(default)]
        distinct: bool,
    },
    Sum {
        expr: Box<Expression>,
        #[serde(default)]
        distinct: bool,
    },
    Avg {
        expr: Box<Expression>,
        #[serde(default)]
        distinct: bool,
    },
    Min {
        expr: Box<Expression>,
        #[serde(default)]
        distinct: bool,
    },
    Max {
        expr: Box<Expression>,
        #[serde(default)]
        distinct: bool,
    },
    GroupConcat {
        expr: Box<Expression>,
        #[serde(default)]
        distinct: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        separator: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        order_by: Vec<SortKey>,
    },
    Sample {
        expr: Box<Expression>,
    },
    ArrayAgg {
        expr: Box<Expression>,
        #[serde(default)]
        distinct: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        order_by: Vec<SortKey>,
    },
}

impl AggregateFunction {
    pub fn count_all() -> Self {
        Self::Count {
            expr: None,
            distinct: false,
        }
    }

    pub fn count(expr: Expression, distinct: bool) -> Self {
        Self::Count {
            expr: Some(Box::new(expr)),
            distinct,
        }
    }

    pub fn sum(expr: Expression) -> Self {
        Self::Sum {
            expr: Box::new(expr),
            distinct: false,
        }
    }

    pub fn avg(expr: Expression) -> Self {
        Self::Avg {
            expr: Box::new(expr),
            distinct: false,
        }
    }

    pub fn min(expr: Expression) -> Self {
        Self::Min {
            expr: Box::new(expr),
            distinct: false,
        }
    }

    pub fn max(expr: Expression) -> Self {
        Self::Max {
            expr: Box::new(expr),
            distinct: false,
        }
    }

    pub fn group_concat(expr: Expression, separator: Option<&str>) -> Self {
        Self::GroupConcat {
            expr: Box::new(expr),
            distinct: false,
            separator: separator.map(str::to_string),
            order_by: Vec::new(),
        }
    }

    pub fn sample(expr: Expression) -> Self {
        Self::Sample {
            expr: Box::new(expr),
        }
    }

    pub fn array_agg(expr: Expression) -> Self {
        Self::ArrayAgg {
            expr: Box::new(expr),
            distinct: false,
            order_by: Vec::new(),
        }
    }

    /// The aggregated argument, if any
    pub fn argument(&self) -> Option<&Expression> {
        match self {
            Self::Count { expr, .. } => expr.as_deref(),
            Self::Sum { expr, .. }
            | Self::Avg { expr, .. }
            | Self::Min { expr, .. }
            | Self::Max { expr, .. }
            | Self::GroupConcat { expr, .. }
            | Self::Sample { expr }
            | Self::ArrayAgg { expr, .. } => Some(expr),
        }
    }

    fn is_distinct(&self) -> bool {
        match self {
            Self::Count { distinct, .. }
            | Self::Sum { distinct, .. }
            | Self::Avg { distinct, .. }
            | Self::Min { distinct, .. }
            | Self::Max { distinct, .. }
            | Self::GroupConcat { distinct, .. }
            | Self::ArrayAgg { distinct, .. } => *distinct,
            Self::Sample { .. } => false,
        }
    }

    /// SPARQL form. `arrayAgg` has no SPARQL counterpart and degrades to
    /// `GROUP_CONCAT`; SQL-only ordering inside aggregates is dropped.
    pub fn to_sparql(&self, prefixes: &PrefixMap) -> String {
        let distinct = if self.is_distinct() { "DISTINCT " } else { "" };
        let arg = |e: &Expression| e.to_sparql(prefixes);
        match self {
            Self::Count { expr: None, .. } => format!("COUNT({}*)", distinct),
            Self::Count { expr: Some(e), .. } => format!("COUNT({}{})", distinct, arg(e)),
            Self::Sum { expr, .. } => format!("SUM({}{})", distinct, arg(expr)),
            Self::Avg { expr, .. } => format!("AVG({}{})", distinct, arg(expr)),
            Self::Min { expr, .. } => format!("MIN({}{})", distinct, arg(expr)),
            Self::Max { expr, .. } => format!("MAX({}{})", distinct, arg(expr)),
            Self::GroupConcat {
                expr, separator, ..
            } => match separator {
                Some(sep) => format!(
                    "GROUP_CONCAT({}{}; SEPARATOR={})",
                    distinct,
                    arg(expr),
                    quote_string(sep)
                ),
                None => format!("GROUP_CONCAT({}{})", distinct, arg(expr)),
            },
            Self::Sample { expr } => format!("SAMPLE({})", arg(expr)),
            Self::ArrayAgg { expr, .. } => format!("GROUP_CONCAT({}{})", distinct, arg(expr)),
        }
    }

    pub fn to_sql(&self) -> String {
        let distinct = if self.is_distinct() { "DISTINCT " } else { "" };
        match self {
            Self::Count { expr: None, .. } => "COUNT(*)".to_string(),
            Self::Count { expr: Some(e), .. } => format!("COUNT({}{})", distinct, e.to_sql()),
            Self::Sum { expr, .. } => format!("SUM({}{})", distinct, expr.to_sql()),
            Self::Avg { expr, .. } => format!("AVG({}{})", distinct, expr.to_sql()),
            Self::Min { expr, .. } => format!("MIN({}{})", distinct, expr.to_sql()),
            Self::Max { expr, .. } => format!("MAX({}{})", distinct, expr.to_sql()),
            Self::GroupConcat {
                expr,
                separator,
                order_by,
                ..
            } => format!(
                "STRING_AGG({}{}, {}{})",
                distinct,
                expr.to_sql(),
                Literal::string(separator.as_deref().unwrap_or(" ")).to_sql(),
                sql_order_suffix(order_by)
            ),
            Self::Sample { expr } => format!("ANY_VALUE({})", expr.to_sql()),
            Self::ArrayAgg { expr, order_by, .. } => format!(
                "ARRAY_AGG({}{}{})",
                distinct,
                expr.to_sql(),
                sql_order_suffix(order_by)
            ),
        }
    }
}

fn sql_order_suffix(order_by: &[SortKey]) -> String {
    if order_by.is_empty() {
        String::new()
    } else {
        format!(
            " ORDER BY {}",
            order_by
                .iter()
                .map(SortKey::to_sql)
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

/// SQL data types used by `CAST`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum DataType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Decimal {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        precision: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scale: Option<u32>,
    },
    Char {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        length: Option<u32>,
    },
    Varchar {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        length: Option<u32>,
    },
    Text,
    Date,
    Time,
    Timestamp,
    Blob,
    Uuid,
    Json,
    /// Type with no XSD mapping, rendered by name
    Custom {
        name: String,
    },
}

impl DataType {
    /// XSD datatype IRI for SPARQL casts; `None` for custom types
    pub fn xsd_iri(&self) -> Option<String> {
        let local = match self {
            Self::Boolean => "boolean",
            Self::SmallInt | Self::Integer | Self::BigInt => "integer",
            Self::Real => "float",
            Self::Double => "double",
            Self::Decimal { .. } => "decimal",
            Self::Char { .. } | Self::Varchar { .. } | Self::Text | Self::Uuid | Self::Json => {
                "string"
            }
            Self::Date => "date",
            Self::Time => "time",
            Self::Timestamp => "dateTime",
            Self::Blob => "base64Binary",
            Self::Custom { .. } => return None,
        };
        Some(format!("{}{}", XSD, local))
    }

    pub fn to_sql(&self) -> String {
        match self {
            Self::Boolean => "BOOLEAN".to_string(),
            Self::SmallInt => "SMALLINT".to_string(),
            Self::Integer => "INTEGER".to_string(),
            Self::BigInt => "BIGINT".to_string(),
            Self::Real => "REAL".to_string(),
            Self::Double => "DOUBLE PRECISION".to_string(),
            Self::Decimal {
                precision: Some(p),
                scale: Some(s),
            } => format!("DECIMAL({}, {})", p, s),
            Self::Decimal {
                precision: Some(p),
                scale: None,
            } => format!("DECIMAL({})", p),
            Self::Decimal { .. } => "DECIMAL".to_string(),
            Self::Char { length: Some(n) } => format!("CHAR({})", n),
            Self::Char { length: None } => "CHAR".to_string(),
            Self::Varchar { length: Some(n) } => format!("VARCHAR({})", n),
            Self::Varchar { length: None } => "VARCHAR".to_string(),
            Self::Text => "TEXT".to_string(),
            Self::Date => "DATE".to_string(),
            Self::Time => "TIME".to_string(),
            Self::Timestamp => "TIMESTAMP".to_string(),
            Self::Blob => "BLOB".to_string(),
            Self::Uuid => "UUID".to_string(),
            Self::Json => "JSON".to_string(),
            Self::Custom { name } => name.clone(),
        }
    }
}

fn boxed(e: Expression) -> Box<Expression> {
    Box::new(e)
}

impl Expression {
    pub fn lit(value: impl Into<Literal>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    pub fn var(variable: impl Into<Variable>) -> Self {
        Self::Variable {
            variable: variable.into(),
        }
    }

    pub fn column(column: ColumnRef) -> Self {
        Self::Column { column }
    }

    pub fn add(lhs: Expression, rhs: Expression) -> Self {
        Self::Add {
            lhs: boxed(lhs),
            rhs: boxed(rhs),
        }
    }

    pub fn subtract(lhs: Expression, rhs: Expression) -> Self {
        Self::Subtract {
            lhs: boxed(lhs),
            rhs: boxed(rhs),
        }
    }

    pub fn multiply(lhs: Expression, rhs: Expression) -> Self {
        Self::Multiply {
            lhs: boxed(lhs),
            rhs: boxed(rhs),
        }
    }

    pub fn divide(lhs: Expression, rhs: Expression) -> Self {
        Self::Divide {
            lhs: boxed(lhs),
            rhs: boxed(rhs),
        }
    }

    pub fn modulo(lhs: Expression, rhs: Expression) -> Self {
        Self::Modulo {
            lhs: boxed(lhs),
            rhs: boxed(rhs),
        }
    }

    pub fn negate(expr: Expression) -> Self {
        Self::Negate { expr: boxed(expr) }
    }

    pub fn equal(lhs: Expression, rhs: Expression) -> Self {
        Self::Equal {
            lhs: boxed(lhs),
            rhs: boxed(rhs),
        }
    }

    pub fn not_equal(lhs: Expression, rhs: Expression) -> Self {
        Self::NotEqual {
            lhs: boxed(lhs),
            rhs: boxed(rhs),
        }
    }

    pub fn less_than(lhs: Expression, rhs: Expression) -> Self {
        Self::LessThan {
            lhs: boxed(lhs),
            rhs: boxed(rhs),
        }
    }

    pub fn less_than_or_equal(lhs: Expression, rhs: Expression) -> Self {
        Self::LessThanOrEqual {
            lhs: boxed(lhs),
            rhs: boxed(rhs),
        }
    }

    pub fn greater_than(lhs: Expression, rhs: Expression) -> Self {
        Self::GreaterThan {
            lhs: boxed(lhs),
            rhs: boxed(rhs),
        }
    }

    pub fn greater_than_or_equal(lhs: Expression, rhs: Expression) -> Self {
        Self::GreaterThanOrEqual {
            lhs: boxed(lhs),
            rhs: boxed(rhs),
        }
    }

    pub fn and(lhs: Expression, rhs: Expression) -> Self {
        Self::And {
            lhs: boxed(lhs),
            rhs: boxed(rhs),
        }
    }

    pub fn or(lhs: Expression, rhs: Expression) -> Self {
        Self::Or {
            lhs: boxed(lhs),
            rhs: boxed(rhs),
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(expr: Expression) -> Self {
        Self::Not { expr: boxed(expr) }
    }

    pub fn is_null(expr: Expression) -> Self {
        Self::IsNull { expr: boxed(expr) }
    }

    pub fn is_not_null(expr: Expression) -> Self {
        Self::IsNotNull { expr: boxed(expr) }
    }

    pub fn bound(variable: impl Into<Variable>) -> Self {
        Self::Bound {
            variable: variable.into(),
        }
    }

    pub fn like(expr: Expression, pattern: impl Into<String>) -> Self {
        Self::Like {
            expr: boxed(expr),
            pattern: pattern.into(),
        }
    }

    pub fn regex(expr: Expression, pattern: impl Into<String>, flags: Option<&str>) -> Self {
        Self::Regex {
            expr: boxed(expr),
            pattern: pattern.into(),
            flags: flags.map(str::to_string),
        }
    }

    pub fn between(expr: Expression, low: Expression, high: Expression) -> Self {
        Self::Between {
            expr: boxed(expr),
            low: boxed(low),
            high: boxed(high),
        }
    }

    pub fn in_list(expr: Expression, values: Vec<Expression>) -> Self {
        Self::InList {
            expr: boxed(expr),
            values,
        }
    }

    pub fn not_in_list(expr: Expression, values: Vec<Expression>) -> Self {
        Self::NotInList {
            expr: boxed(expr),
            values,
        }
    }

    pub fn aggregate(aggregate_function: AggregateFunction) -> Self {
        Self::Aggregate { aggregate_function }
    }

    pub fn function(name: impl Into<String>, arguments: Vec<Expression>) -> Self {
        Self::FunctionCall {
            function_call: FunctionCall::new(name, arguments),
        }
    }

    pub fn case_when(cases: Vec<CaseBranch>, else_result: Option<Expression>) -> Self {
        Self::CaseWhen {
            cases,
            else_result: else_result.map(boxed),
        }
    }

    pub fn coalesce(expressions: Vec<Expression>) -> Self {
        Self::Coalesce { expressions }
    }

    pub fn cast(expr: Expression, target_type: DataType) -> Self {
        Self::Cast {
            expr: boxed(expr),
            target_type,
        }
    }

    pub fn triple(subject: Expression, predicate: Expression, object: Expression) -> Self {
        Self::Triple {
            subject_expr: boxed(subject),
            predicate_expr: boxed(predicate),
            object_expr: boxed(object),
        }
    }

    pub fn exists(query: SelectQuery) -> Self {
        Self::Exists {
            query: Box::new(query),
        }
    }

    pub fn not_exists(query: SelectQuery) -> Self {
        Self::NotExists {
            query: Box::new(query),
        }
    }

    pub fn scalar_subquery(query: SelectQuery) -> Self {
        Self::ScalarSubquery {
            query: Box::new(query),
        }
    }

    pub fn in_subquery(expr: Expression, query: SelectQuery) -> Self {
        Self::InSubquery {
            expr: boxed(expr),
            query: Box::new(query),
        }
    }

    /// Binary operators as `(lhs, operator-index, rhs)` for uniform rendering
    fn binary_parts(&self) -> Option<(&Expression, BinaryOp, &Expression)> {
        let (lhs, op, rhs) = match self {
            Self::Add { lhs, rhs } => (lhs, BinaryOp::Add, rhs),
            Self::Subtract { lhs, rhs } => (lhs, BinaryOp::Subtract, rhs),
            Self::Multiply { lhs, rhs } => (lhs, BinaryOp::Multiply, rhs),
            Self::Divide { lhs, rhs } => (lhs, BinaryOp::Divide, rhs),
            Self::Modulo { lhs, rhs } => (lhs, BinaryOp::Modulo, rhs),
            Self::Equal { lhs, rhs } => (lhs, BinaryOp::Equal, rhs),
            Self::NotEqual { lhs, rhs } => (lhs, BinaryOp::NotEqual, rhs),
            Self::LessThan { lhs, rhs } => (lhs, BinaryOp::LessThan, rhs),
            Self::LessThanOrEqual { lhs, rhs } => (lhs, BinaryOp::LessThanOrEqual, rhs),
            Self::GreaterThan { lhs, rhs } => (lhs, BinaryOp::GreaterThan, rhs),
            Self::GreaterThanOrEqual { lhs, rhs } => (lhs, BinaryOp::GreaterThanOrEqual, rhs),
            Self::And { lhs, rhs } => (lhs, BinaryOp::And, rhs),
            Self::Or { lhs, rhs } => (lhs, BinaryOp::Or, rhs),
            _ => return None,
        };
        Some((lhs, op, rhs))
    }

    /// Variables referenced by the expression.
    ///
    /// Subqueries have their own scope and are not descended into; columns
    /// count as variables of the same name.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    pub(crate) fn collect_variables(&self, out: &mut BTreeSet<String>) {
        if let Some((lhs, _, rhs)) = self.binary_parts() {
            lhs.collect_variables(out);
            rhs.collect_variables(out);
            return;
        }
        match self {
            Self::Variable { variable } | Self::Bound { variable } => {
                out.insert(variable.name().to_string());
            }
            Self::Column { column } => {
                out.insert(column.name.clone());
            }
            Self::Negate { expr }
            | Self::Not { expr }
            | Self::IsNull { expr }
            | Self::IsNotNull { expr }
            | Self::Like { expr, .. }
            | Self::Regex { expr, .. }
            | Self::Cast { expr, .. }
            | Self::IsTriple { expr }
            | Self::Subject { expr }
            | Self::Predicate { expr }
            | Self::Object { expr }
            | Self::InSubquery { expr, .. } => expr.collect_variables(out),
            Self::Between { expr, low, high } => {
                expr.collect_variables(out);
                low.collect_variables(out);
                high.collect_variables(out);
            }
            Self::InList { expr, values } | Self::NotInList { expr, values } => {
                expr.collect_variables(out);
                values.iter().for_each(|v| v.collect_variables(out));
            }
            Self::Aggregate { aggregate_function } => {
                if let Some(arg) = aggregate_function.argument() {
                    arg.collect_variables(out);
                }
            }
            Self::FunctionCall { function_call } => function_call
                .arguments
                .iter()
                .for_each(|a| a.collect_variables(out)),
            Self::CaseWhen { cases, else_result } => {
                for case in cases {
                    case.condition.collect_variables(out);
                    case.result.collect_variables(out);
                }
                if let Some(e) = else_result {
                    e.collect_variables(out);
                }
            }
            Self::Coalesce { expressions } => {
                expressions.iter().for_each(|e| e.collect_variables(out))
            }
            Self::Triple {
                subject_expr,
                predicate_expr,
                object_expr,
            } => {
                subject_expr.collect_variables(out);
                predicate_expr.collect_variables(out);
                object_expr.collect_variables(out);
            }
            _ => {}
        }
    }

    /// True if an aggregate occurs outside any nested subquery
    pub fn contains_aggregate(&self) -> bool {
        if let Some((lhs, _, rhs)) = self.binary_parts() {
            return lhs.contains_aggregate() || rhs.contains_aggregate();
        }
        match self {
            Self::Aggregate { .. } => true,
            Self::Negate { expr }
            | Self::Not { expr }
            | Self::IsNull { expr }
            | Self::IsNotNull { expr }
            | Self::Like { expr, .. }
            | Self::Regex { expr, .. }
            | Self::Cast { expr, .. }
            | Self::IsTriple { expr }
            | Self::Subject { expr }
            | Self::Predicate { expr }
            | Self::Object { expr }
            | Self::InSubquery { expr, .. } => expr.contains_aggregate(),
            Self::Between { expr, low, high } => {
                expr.contains_aggregate() || low.contains_aggregate() || high.contains_aggregate()
            }
            Self::InList { expr, values } | Self::NotInList { expr, values } => {
                expr.contains_aggregate() || values.iter().any(Expression::contains_aggregate)
            }
            Self::FunctionCall { function_call } => function_call
                .arguments
                .iter()
                .any(Expression::contains_aggregate),
            Self::CaseWhen { cases, else_result } => {
                cases
                    .iter()
                    .any(|c| c.condition.contains_aggregate() || c.result.contains_aggregate())
                    || else_result.as_ref().is_some_and(|e| e.contains_aggregate())
            }
            Self::Coalesce { expressions } => expressions.iter().any(Expression::contains_aggregate),
            Self::Triple {
                subject_expr,
                predicate_expr,
                object_expr,
            } => {
                subject_expr.contains_aggregate()
                    || predicate_expr.contains_aggregate()
                    || object_expr.contains_aggregate()
            }
            _ => false,
        }
    }

    /// Render as a SPARQL expression.
    pub fn to_sparql(&self, prefixes: &PrefixMap) -> String {
        let binary = |lhs: &Expression, op: BinaryOp, rhs: &Expression| {
            format!(
                "({} {} {})",
                lhs.to_sparql(prefixes),
                op.sparql(),
                rhs.to_sparql(prefixes)
            )
        };
        let list = |items: &[Expression]| {
            items
                .iter()
                .map(|e| e.to_sparql(prefixes))
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self {
            Self::Add { lhs, rhs } => binary(lhs, BinaryOp::Add, rhs),
            Self::Subtract { lhs, rhs } => binary(lhs, BinaryOp::Subtract, rhs),
            Self::Multiply { lhs, rhs } => binary(lhs, BinaryOp::Multiply, rhs),
            Self::Divide { lhs, rhs } => binary(lhs, BinaryOp::Divide, rhs),
            Self::Modulo { lhs, rhs } => binary(lhs, BinaryOp::Modulo, rhs),
            Self::Equal { lhs, rhs } => binary(lhs, BinaryOp::Equal, rhs),
            Self::NotEqual { lhs, rhs } => binary(lhs, BinaryOp::NotEqual, rhs),
            Self::LessThan { lhs, rhs } => binary(lhs, BinaryOp::LessThan, rhs),
            Self::LessThanOrEqual { lhs, rhs } => binary(lhs, BinaryOp::LessThanOrEqual, rhs),
            Self::GreaterThan { lhs, rhs } => binary(lhs, BinaryOp::GreaterThan, rhs),
            Self::GreaterThanOrEqual { lhs, rhs } => binary(lhs, BinaryOp::GreaterThanOrEqual, rhs),
            Self::And { lhs, rhs } => binary(lhs, BinaryOp::And, rhs),
            Self::Or { lhs, rhs } => binary(lhs, BinaryOp::Or, rhs),
            Self::Literal { value } => value.to_sparql(prefixes),
            Self::Variable { variable } => variable.to_string(),
            Self::Column { column } => format!("?{}", column.name),
            Self::Negate { expr } => format!("(-{})", expr.to_sparql(prefixes)),
            Self::Not { expr } => format!("(!{})", expr.to_sparql(prefixes)),
            Self::IsNull { expr } => format!("(!{})", expr.bound_sparql(prefixes)),
            Self::IsNotNull { expr } => expr.bound_sparql(prefixes),
            Self::Bound { variable } => format!("BOUND({})", variable),
            Self::Like { expr, pattern } => format!(
                "REGEX({}, {}, \"i\")",
                expr.to_sparql(prefixes),
                quote_string(&like_to_regex(pattern))
            ),
            Self::Regex {
                expr,
                pattern,
                flags,
            } => match flags {
                Some(flags) => format!(
                    "REGEX({}, {}, {})",
                    expr.to_sparql(prefixes),
                    quote_string(pattern),
                    quote_string(flags)
                ),
                None => format!(
                    "REGEX({}, {})",
                    expr.to_sparql(prefixes),
                    quote_string(pattern)
                ),
            },
            Self::Between { expr, low, high } => {
                let e = expr.to_sparql(prefixes);
                format!(
                    "(({} >= {}) && ({} <= {}))",
                    e,
                    low.to_sparql(prefixes),
                    e,
                    high.to_sparql(prefixes)
                )
            }
            Self::InList { expr, values } => {
                format!("({} IN ({}))", expr.to_sparql(prefixes), list(values))
            }
            Self::NotInList { expr, values } => {
                format!("({} NOT IN ({}))", expr.to_sparql(prefixes), list(values))
            }
            Self::Aggregate { aggregate_function } => aggregate_function.to_sparql(prefixes),
            Self::FunctionCall { function_call } => {
                let name = if function_call.is_iri() {
                    prefixes.render_iri(&function_call.name)
                } else {
                    function_call.name.clone()
                };
                let distinct = if function_call.distinct { "DISTINCT " } else { "" };
                format!("{}({}{})", name, distinct, list(&function_call.arguments))
            }
            Self::CaseWhen { cases, else_result } => {
                let fallback = else_result
                    .as_ref()
                    .map(|e| e.to_sparql(prefixes))
                    .unwrap_or_else(|| "UNDEF".to_string());
                cases.iter().rev().fold(fallback, |acc, case| {
                    format!(
                        "IF({}, {}, {})",
                        case.condition.to_sparql(prefixes),
                        case.result.to_sparql(prefixes),
                        acc
                    )
                })
            }
            Self::Coalesce { expressions } => format!("COALESCE({})", list(expressions)),
            Self::Cast { expr, target_type } => {
                let function = match (target_type.xsd_iri(), target_type) {
                    (Some(iri), _) => prefixes.render_iri(&iri),
                    (None, DataType::Custom { name }) => name.clone(),
                    (None, other) => other.to_sql(),
                };
                format!("{}({})", function, expr.to_sparql(prefixes))
            }
            Self::Triple {
                subject_expr,
                predicate_expr,
                object_expr,
            } => format!(
                "TRIPLE({}, {}, {})",
                subject_expr.to_sparql(prefixes),
                predicate_expr.to_sparql(prefixes),
                object_expr.to_sparql(prefixes)
            ),
            Self::IsTriple { expr } => format!("isTRIPLE({})", expr.to_sparql(prefixes)),
            Self::Subject { expr } => format!("SUBJECT({})", expr.to_sparql(prefixes)),
            Self::Predicate { expr } => format!("PREDICATE({})", expr.to_sparql(prefixes)),
            Self::Object { expr } => format!("OBJECT({})", expr.to_sparql(prefixes)),
            Self::Exists { query } => format!("EXISTS {{ {} }}", query.group_inline(prefixes)),
            Self::NotExists { query } => {
                format!("NOT EXISTS {{ {} }}", query.group_inline(prefixes))
            }
            Self::ScalarSubquery { query } => {
                format!("({})", inline(&query.to_sparql(prefixes)))
            }
            Self::InSubquery { expr, query } => format!(
                "({} IN ({}))",
                expr.to_sparql(prefixes),
                inline(&query.to_sparql(prefixes))
            ),
        }
    }

    /// SPARQL test for "evaluates to a bound term". `BOUND` only accepts a
    /// variable, so other operands go through `sameTerm`, which errors (and
    /// falls back to false) exactly when the operand is unbound.
    fn bound_sparql(&self, prefixes: &PrefixMap) -> String {
        match self {
            Self::Variable { .. } | Self::Column { .. } => {
                format!("BOUND({})", self.to_sparql(prefixes))
            }
            other => {
                let operand = other.to_sparql(prefixes);
                format!("COALESCE(sameTerm({}, {}), false)", operand, operand)
            }
        }
    }

    /// Render as an SQL expression.
    pub fn to_sql(&self) -> String {
        let binary = |lhs: &Expression, op: BinaryOp, rhs: &Expression| {
            format!("({} {} {})", lhs.to_sql(), op.sql(), rhs.to_sql())
        };
        let list = |items: &[Expression]| {
            items
                .iter()
                .map(Expression::to_sql)
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self {
            Self::Add { lhs, rhs } => binary(lhs, BinaryOp::Add, rhs),
            Self::Subtract { lhs, rhs } => binary(lhs, BinaryOp::Subtract, rhs),
            Self::Multiply { lhs, rhs } => binary(lhs, BinaryOp::Multiply, rhs),
            Self::Divide { lhs, rhs } => binary(lhs, BinaryOp::Divide, rhs),
            Self::Modulo { lhs, rhs } => binary(lhs, BinaryOp::Modulo, rhs),
            Self::Equal { lhs, rhs } => binary(lhs, BinaryOp::Equal, rhs),
            Self::NotEqual { lhs, rhs } => binary(lhs, BinaryOp::NotEqual, rhs),
            Self::LessThan { lhs, rhs } => binary(lhs, BinaryOp::LessThan, rhs),
            Self::LessThanOrEqual { lhs, rhs } => binary(lhs, BinaryOp::LessThanOrEqual, rhs),
            Self::GreaterThan { lhs, rhs } => binary(lhs, BinaryOp::GreaterThan, rhs),
            Self::GreaterThanOrEqual { lhs, rhs } => binary(lhs, BinaryOp::GreaterThanOrEqual, rhs),
            Self::And { lhs, rhs } => binary(lhs, BinaryOp::And, rhs),
            Self::Or { lhs, rhs } => binary(lhs, BinaryOp::Or, rhs),
            Self::Literal { value } => value.to_sql(),
            Self::Variable { variable } => variable.name().to_string(),
            Self::Column { column } => column.to_sql(),
            Self::Negate { expr } => format!("(-{})", expr.to_sql()),
            Self::Not { expr } => format!("(NOT {})", expr.to_sql()),
            Self::IsNull { expr } => format!("({} IS NULL)", expr.to_sql()),
            Self::IsNotNull { expr } => format!("({} IS NOT NULL)", expr.to_sql()),
            Self::Bound { variable } => format!("({} IS NOT NULL)", variable.name()),
            Self::Like { expr, pattern } => format!(
                "({} LIKE {})",
                expr.to_sql(),
                Literal::string(pattern.as_str()).to_sql()
            ),
            Self::Regex {
                expr,
                pattern,
                flags,
            } => match flags {
                Some(flags) => format!(
                    "REGEXP_LIKE({}, {}, {})",
                    expr.to_sql(),
                    Literal::string(pattern.as_str()).to_sql(),
                    Literal::string(flags.as_str()).to_sql()
                ),
                None => format!(
                    "REGEXP_LIKE({}, {})",
                    expr.to_sql(),
                    Literal::string(pattern.as_str()).to_sql()
                ),
            },
            Self::Between { expr, low, high } => format!(
                "({} BETWEEN {} AND {})",
                expr.to_sql(),
                low.to_sql(),
                high.to_sql()
            ),
            Self::InList { expr, values } => format!("({} IN ({}))", expr.to_sql(), list(values)),
            Self::NotInList { expr, values } => {
                format!("({} NOT IN ({}))", expr.to_sql(), list(values))
            }
            Self::Aggregate { aggregate_function } => aggregate_function.to_sql(),
            Self::FunctionCall { function_call } => {
                let distinct = if function_call.distinct { "DISTINCT " } else { "" };
                format!(
                    "{}({}{})",
                    function_call.name,
                    distinct,
                    list(&function_call.arguments)
                )
            }
            Self::CaseWhen { cases, else_result } => {
                let mut out = String::from("CASE");
                for case in cases {
                    out.push_str(&format!(
                        " WHEN {} THEN {}",
                        case.condition.to_sql(),
                        case.result.to_sql()
                    ));
                }
                if let Some(e) = else_result {
                    out.push_str(&format!(" ELSE {}", e.to_sql()));
                }
                out.push_str(" END");
                out
            }
            Self::Coalesce { expressions } => format!("COALESCE({})", list(expressions)),
            Self::Cast { expr, target_type } => {
                format!("CAST({} AS {})", expr.to_sql(), target_type.to_sql())
            }
            Self::Triple {
                subject_expr,
                predicate_expr,
                object_expr,
            } => format!(
                "TRIPLE({}, {}, {})",
                subject_expr.to_sql(),
                predicate_expr.to_sql(),
                object_expr.to_sql()
            ),
            Self::IsTriple { expr } => format!("IS_TRIPLE({})", expr.to_sql()),
            Self::Subject { expr } => format!("SUBJECT({})", expr.to_sql()),
            Self::Predicate { expr } => format!("PREDICATE({})", expr.to_sql()),
            Self::Object { expr } => format!("OBJECT({})", expr.to_sql()),
            Self::Exists { query } => format!("EXISTS ({})", query.to_sql()),
            Self::NotExists { query } => format!("NOT EXISTS ({})", query.to_sql()),
            Self::ScalarSubquery { query } => format!("({})", query.to_sql()),
            Self::InSubquery { expr, query } => {
                format!("({} IN ({}))", expr.to_sql(), query.to_sql())
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
}

impl BinaryOp {
    fn sparql(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Modulo => "%",
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::And => "&&",
            Self::Or => "||",
        }
    }

    fn sql(self) -> &'static str {
        match self {
            Self::NotEqual => "<>",
            Self::And => "AND",
            Self::Or => "OR",
            other => other.sparql(),
        }
    }
}

/// Translate an SQL `LIKE` pattern to an anchored regex.
///
/// The substitution is purely textual: `%` becomes `.*`, `_` becomes `.`,
/// and regex metacharacters already in the pattern pass through unescaped.
pub fn like_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 2);
    out.push('^');
    for c in pattern.chars() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            c => out.push(c),
        }
    }
    out.push('$');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn age() -> Expression {
        Expression::var("age")
    }

    fn render(e: &Expression) -> String {
        e.to_sparql(&PrefixMap::standard())
    }

    #[test]
    fn test_binary_renders_parenthesized() {
        let e = Expression::greater_than(age(), Expression::lit(18i64));
        assert_eq!(render(&e), "(?age > 18)");
        assert_eq!(e.to_sql(), "(age > 18)");
    }

    #[test_case(Expression::add, "+", "+" ; "add")]
    #[test_case(Expression::subtract, "-", "-" ; "subtract")]
    #[test_case(Expression::multiply, "*", "*" ; "multiply")]
    #[test_case(Expression::divide, "/", "/" ; "divide")]
    #[test_case(Expression::modulo, "%", "%" ; "modulo")]
    #[test_case(Expression::equal, "=", "=" ; "equal")]
    #[test_case(Expression::not_equal, "!=", "<>" ; "not equal")]
    #[test_case(Expression::less_than, "<", "<" ; "less than")]
    #[test_case(Expression::less_than_or_equal, "<=", "<=" ; "less or equal")]
    #[test_case(Expression::greater_than, ">", ">" ; "greater than")]
    #[test_case(Expression::greater_than_or_equal, ">=", ">=" ; "greater or equal")]
    #[test_case(Expression::and, "&&", "AND" ; "and")]
    #[test_case(Expression::or, "||", "OR" ; "or")]
    fn test_every_binary_operator_renders(
        build: fn(Expression, Expression) -> Expression,
        sparql: &str,
        sql: &str,
    ) {
        let e = build(Expression::var("a"), Expression::var("b"));
        assert_eq!(render(&e), format!("(?a {} ?b)", sparql));
        assert_eq!(e.to_sql(), format!("(a {} b)", sql));
    }

    #[test]
    fn test_null_checks_on_variables_use_bound() {
        assert_eq!(render(&Expression::is_null(age())), "(!BOUND(?age))");
        assert_eq!(render(&Expression::is_not_null(age())), "BOUND(?age)");
        let column = Expression::column(ColumnRef::qualified("u", "email"));
        assert_eq!(render(&Expression::is_not_null(column)), "BOUND(?email)");
    }

    #[test]
    fn test_null_checks_on_expressions_avoid_bound() {
        let sum = Expression::add(age(), Expression::lit(1i64));
        assert_eq!(
            render(&Expression::is_not_null(sum.clone())),
            "COALESCE(sameTerm((?age + 1), (?age + 1)), false)"
        );
        assert_eq!(
            render(&Expression::is_null(sum)),
            "(!COALESCE(sameTerm((?age + 1), (?age + 1)), false))"
        );
        assert_eq!(
            Expression::is_null(Expression::lit(1i64)).to_sql(),
            "(1 IS NULL)"
        );
    }

    #[test]
    fn test_logical_operators() {
        let e = Expression::and(
            Expression::not_equal(Expression::var("a"), Expression::var("b")),
            Expression::not(Expression::bound("c")),
        );
        assert_eq!(render(&e), "((?a != ?b) && (!BOUND(?c)))");
        assert_eq!(e.to_sql(), "((a <> b) AND (NOT (c IS NOT NULL)))");
    }

    #[test_case("abc%", "^abc.*$" ; "trailing percent")]
    #[test_case("_b_", "^.b.$" ; "underscores")]
    #[test_case("a.b%", "^a.b.*$" ; "metacharacters pass through")]
    #[test_case("(x)+", "^(x)+$" ; "groups pass through")]
    fn test_like_to_regex(pattern: &str, expected: &str) {
        assert_eq!(like_to_regex(pattern), expected);
    }

    #[test]
    fn test_like_renders_case_insensitive_regex() {
        let e = Expression::like(Expression::var("name"), "Jo%n_");
        assert_eq!(render(&e), r#"REGEX(?name, "^Jo.*n.$", "i")"#);
        assert_eq!(e.to_sql(), "(name LIKE 'Jo%n_')");
    }

    #[test]
    fn test_like_keeps_metacharacters_unescaped() {
        // Known fidelity gap: `.` in the LIKE pattern becomes a regex wildcard.
        let e = Expression::like(Expression::var("file"), "%.txt");
        assert_eq!(render(&e), r#"REGEX(?file, "^.*.txt$", "i")"#);
    }

    #[test]
    fn test_case_when_nests_right_associative() {
        let e = Expression::case_when(
            vec![
                CaseBranch {
                    condition: Expression::less_than(age(), Expression::lit(13i64)),
                    result: Expression::lit("child"),
                },
                CaseBranch {
                    condition: Expression::less_than(age(), Expression::lit(20i64)),
                    result: Expression::lit("teen"),
                },
            ],
            None,
        );
        assert_eq!(
            render(&e),
            r#"IF((?age < 13), "child", IF((?age < 20), "teen", UNDEF))"#
        );
        assert_eq!(
            e.to_sql(),
            "CASE WHEN (age < 13) THEN 'child' WHEN (age < 20) THEN 'teen' END"
        );
    }

    #[test]
    fn test_case_when_explicit_else() {
        let e = Expression::case_when(
            vec![CaseBranch {
                condition: Expression::var("flag"),
                result: Expression::lit(1i64),
            }],
            Some(Expression::lit(0i64)),
        );
        assert_eq!(render(&e), "IF(?flag, 1, 0)");
    }

    #[test_case(DataType::BigInt, "xsd:integer(?v)" ; "bigint")]
    #[test_case(DataType::Timestamp, "xsd:dateTime(?v)" ; "timestamp")]
    #[test_case(DataType::Varchar { length: Some(20) }, "xsd:string(?v)" ; "varchar")]
    #[test_case(DataType::Double, "xsd:double(?v)" ; "double")]
    #[test_case(DataType::Custom { name: "geo:wktLiteral".into() }, "geo:wktLiteral(?v)" ; "custom")]
    fn test_cast_rendering(target: DataType, expected: &str) {
        let e = Expression::cast(Expression::var("v"), target);
        assert_eq!(render(&e), expected);
    }

    #[test]
    fn test_cast_without_prefixes_uses_full_iri() {
        let e = Expression::cast(Expression::var("v"), DataType::BigInt);
        assert_eq!(
            e.to_sparql(&PrefixMap::new()),
            "<http://www.w3.org/2001/XMLSchema#integer>(?v)"
        );
        assert_eq!(e.to_sql(), "CAST(v AS BIGINT)");
    }

    #[test]
    fn test_aggregates() {
        let count = Expression::aggregate(AggregateFunction::count_all());
        assert_eq!(render(&count), "COUNT(*)");

        let distinct = Expression::aggregate(AggregateFunction::count(Expression::var("x"), true));
        assert_eq!(render(&distinct), "COUNT(DISTINCT ?x)");

        let concat =
            Expression::aggregate(AggregateFunction::group_concat(Expression::var("n"), Some(", ")));
        assert_eq!(render(&concat), r#"GROUP_CONCAT(?n; SEPARATOR=", ")"#);
        assert_eq!(concat.to_sql(), "STRING_AGG(n, ', ')");
    }

    #[test]
    fn test_array_agg_degrades_to_group_concat() {
        let e = Expression::aggregate(AggregateFunction::ArrayAgg {
            expr: Box::new(Expression::var("tag")),
            distinct: true,
            order_by: vec![SortKey::asc(Expression::var("tag"))],
        });
        assert_eq!(render(&e), "GROUP_CONCAT(DISTINCT ?tag)");
        assert_eq!(e.to_sql(), "ARRAY_AGG(DISTINCT tag ORDER BY tag ASC)");
        assert!(e.contains_aggregate());
    }

    #[test]
    fn test_rdf_star_functions() {
        let e = Expression::triple(
            Expression::var("s"),
            Expression::lit(Literal::iri("http://ex/p")),
            Expression::var("o"),
        );
        assert_eq!(render(&e), "TRIPLE(?s, <http://ex/p>, ?o)");
        let subject = Expression::Subject {
            expr: Box::new(Expression::var("t")),
        };
        assert_eq!(render(&subject), "SUBJECT(?t)");
        let is_triple = Expression::IsTriple {
            expr: Box::new(Expression::var("t")),
        };
        assert_eq!(render(&is_triple), "isTRIPLE(?t)");
    }

    #[test]
    fn test_between_and_in() {
        let e = Expression::between(age(), Expression::lit(18i64), Expression::lit(65i64));
        assert_eq!(render(&e), "((?age >= 18) && (?age <= 65))");
        assert_eq!(e.to_sql(), "(age BETWEEN 18 AND 65)");

        let e = Expression::in_list(
            Expression::var("c"),
            vec![Expression::lit("a"), Expression::lit("b")],
        );
        assert_eq!(render(&e), r#"(?c IN ("a", "b"))"#);
        assert_eq!(e.to_sql(), "(c IN ('a', 'b'))");
    }

    #[test]
    fn test_extension_function_iri_is_compacted() {
        let e = Expression::function(format!("{}string", XSD), vec![Expression::var("x")]);
        assert_eq!(render(&e), "xsd:string(?x)");
        let e = Expression::function("STRLEN", vec![Expression::var("x")]);
        assert_eq!(render(&e), "STRLEN(?x)");
    }

    #[test]
    fn test_variables_skip_subqueries() {
        let e = Expression::and(
            Expression::greater_than(age(), Expression::lit(1i64)),
            Expression::in_subquery(Expression::var("id"), SelectQuery::default()),
        );
        let vars: Vec<_> = e.variables().into_iter().collect();
        assert_eq!(vars, vec!["age".to_string(), "id".to_string()]);
        assert!(!e.contains_aggregate());
    }
}
