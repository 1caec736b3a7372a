//! Top-level statements: SQL DML, SQL/PGQ graph DDL, and every SPARQL
//! query and update form.

use crate::expr::Expression;
use crate::pattern::GraphPattern;
use crate::prefix::PrefixMap;
use crate::query::{SelectQuery, SortKey};
use crate::render::{block, inline, join_lines};
use crate::source::TableRef;
use crate::term::{SparqlTerm, TriplePattern};
use serde::{Deserialize, Serialize};

/// One complete statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum QueryStatement {
    Select(SelectQuery),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
    CreateGraph(CreateGraphStatement),
    DropGraph(DropGraphStatement),
    Construct(ConstructQuery),
    Ask(AskQuery),
    Describe(DescribeQuery),
    InsertData(QuadData),
    DeleteData(QuadData),
    DeleteWhere(QuadData),
    Modify(ModifyStatement),
    Load(LoadStatement),
    Clear(ClearStatement),
    GraphManagement(GraphManagementStatement),
}

/// Mutually exclusive statement classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    ReadOnly,
    Modification,
    SchemaDefinition,
}

impl StatementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadOnly => "read-only",
            Self::Modification => "modification",
            Self::SchemaDefinition => "schema-definition",
        }
    }
}

// ----------------------------------------------------------------------------
// SQL DML
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InsertStatement {
    pub table: TableRef,
    #[serde(default)]
    pub columns: Vec<String>,
    pub source: InsertSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum InsertSource {
    Values { rows: Vec<Vec<Expression>> },
    Query { query: Box<SelectQuery> },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    pub column: String,
    pub value: Expression,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UpdateStatement {
    pub table: TableRef,
    pub assignments: Vec<Assignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeleteStatement {
    pub table: TableRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expression>,
}

// ----------------------------------------------------------------------------
// SQL/PGQ property graph DDL
// ----------------------------------------------------------------------------

/// `CREATE PROPERTY GRAPH`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGraphStatement {
    pub name: String,
    #[serde(default)]
    pub if_not_exists: bool,
    #[serde(default)]
    pub vertex_tables: Vec<VertexTable>,
    #[serde(default)]
    pub edge_tables: Vec<EdgeTable>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexTable {
    pub table: String,
    #[serde(default)]
    pub key: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub properties: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeTable {
    pub table: String,
    #[serde(default)]
    pub key: Vec<String>,
    pub source: EdgeEndpoint,
    pub destination: EdgeEndpoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub properties: Vec<String>,
}

/// `KEY (cols) REFERENCES table`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeEndpoint {
    pub key: Vec<String>,
    pub references: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DropGraphStatement {
    pub name: String,
    #[serde(default)]
    pub if_exists: bool,
}

// ----------------------------------------------------------------------------
// SPARQL query forms
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructQuery {
    pub template: Vec<TriplePattern>,
    pub pattern: GraphPattern,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<SortKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AskQuery {
    pub pattern: GraphPattern,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DescribeQuery {
    /// Empty means `DESCRIBE *`
    #[serde(default)]
    pub resources: Vec<SparqlTerm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<GraphPattern>,
}

// ----------------------------------------------------------------------------
// SPARQL update forms
// ----------------------------------------------------------------------------

/// Triples, optionally scoped to a named graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuadBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graph: Option<SparqlTerm>,
    pub triples: Vec<TriplePattern>,
}

impl QuadBlock {
    pub fn default_graph(triples: Vec<TriplePattern>) -> Self {
        Self {
            graph: None,
            triples,
        }
    }

    pub fn named(graph: SparqlTerm, triples: Vec<TriplePattern>) -> Self {
        Self {
            graph: Some(graph),
            triples,
        }
    }

    fn to_sparql(&self, prefixes: &PrefixMap) -> String {
        let triples = self
            .triples
            .iter()
            .map(|t| t.to_sparql(prefixes))
            .collect::<Vec<_>>()
            .join("\n");
        match &self.graph {
            Some(graph) => block(&format!("GRAPH {}", graph.to_sparql(prefixes)), &triples),
            None => triples,
        }
    }

    fn to_pattern(&self) -> GraphPattern {
        let basic = GraphPattern::bgp(self.triples.clone());
        match &self.graph {
            Some(graph) => GraphPattern::graph(graph.clone(), basic),
            None => basic,
        }
    }
}

fn quads_sparql(quads: &[QuadBlock], prefixes: &PrefixMap) -> String {
    join_lines(quads.iter().map(|q| q.to_sparql(prefixes)))
}

fn quads_pattern(quads: &[QuadBlock]) -> GraphPattern {
    quads
        .iter()
        .map(QuadBlock::to_pattern)
        .reduce(GraphPattern::join)
        .unwrap_or_default()
}

/// Payload of `INSERT DATA`, `DELETE DATA` and `DELETE WHERE`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuadData {
    pub quads: Vec<QuadBlock>,
}

/// `[WITH g] DELETE {…} INSERT {…} [USING …] WHERE {…}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyStatement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub with: Option<String>,
    #[serde(default)]
    pub delete: Vec<QuadBlock>,
    #[serde(default)]
    pub insert: Vec<QuadBlock>,
    #[serde(default)]
    pub using: Vec<String>,
    #[serde(default)]
    pub using_named: Vec<String>,
    pub pattern: GraphPattern,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoadStatement {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub into: Option<String>,
    #[serde(default)]
    pub silent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClearStatement {
    pub target: GraphTarget,
    #[serde(default)]
    pub silent: bool,
}

/// Graph operand of CLEAR, DROP, COPY, MOVE and ADD.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum GraphTarget {
    Default,
    Named { iri: String },
    /// Every named graph
    AllNamed,
    All,
}

impl GraphTarget {
    fn to_sparql(&self, prefixes: &PrefixMap) -> String {
        match self {
            Self::Default => "DEFAULT".to_string(),
            Self::Named { iri } => format!("GRAPH {}", prefixes.render_iri(iri)),
            Self::AllNamed => "NAMED".to_string(),
            Self::All => "ALL".to_string(),
        }
    }

    /// COPY/MOVE/ADD operands omit the GRAPH keyword
    fn to_sparql_operand(&self, prefixes: &PrefixMap) -> String {
        match self {
            Self::Named { iri } => prefixes.render_iri(iri),
            other => other.to_sparql(prefixes),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphManagementStatement {
    pub operation: GraphOperation,
    #[serde(default)]
    pub silent: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum GraphOperation {
    Create { graph: String },
    Drop { target: GraphTarget },
    Copy { from: GraphTarget, to: GraphTarget },
    Move { from: GraphTarget, to: GraphTarget },
    Add { from: GraphTarget, to: GraphTarget },
}

fn silent_keyword(silent: bool) -> &'static str {
    if silent {
        " SILENT"
    } else {
        ""
    }
}

impl QueryStatement {
    /// Wire tag of the active variant
    pub fn name(&self) -> &'static str {
        match self {
            Self::Select(_) => "select",
            Self::Insert(_) => "insert",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
            Self::CreateGraph(_) => "createGraph",
            Self::DropGraph(_) => "dropGraph",
            Self::Construct(_) => "construct",
            Self::Ask(_) => "ask",
            Self::Describe(_) => "describe",
            Self::InsertData(_) => "insertData",
            Self::DeleteData(_) => "deleteData",
            Self::DeleteWhere(_) => "deleteWhere",
            Self::Modify(_) => "modify",
            Self::Load(_) => "load",
            Self::Clear(_) => "clear",
            Self::GraphManagement(_) => "graphManagement",
        }
    }

    /// Classification used by callers for retry and caching policy.
    ///
    /// Derived from the variant alone; a SELECT is read-only regardless of
    /// what its subqueries contain.
    pub fn kind(&self) -> StatementKind {
        match self {
            Self::Select(_) | Self::Construct(_) | Self::Ask(_) | Self::Describe(_) => {
                StatementKind::ReadOnly
            }
            Self::Insert(_)
            | Self::Update(_)
            | Self::Delete(_)
            | Self::InsertData(_)
            | Self::DeleteData(_)
            | Self::DeleteWhere(_)
            | Self::Modify(_)
            | Self::Load(_)
            | Self::Clear(_) => StatementKind::Modification,
            Self::CreateGraph(_) | Self::DropGraph(_) | Self::GraphManagement(_) => {
                StatementKind::SchemaDefinition
            }
        }
    }

    pub fn is_read_only(&self) -> bool {
        self.kind() == StatementKind::ReadOnly
    }

    pub fn is_modification(&self) -> bool {
        self.kind() == StatementKind::Modification
    }

    pub fn is_schema_definition(&self) -> bool {
        self.kind() == StatementKind::SchemaDefinition
    }

    /// True for statements with no SPARQL form
    pub fn is_sql_only(&self) -> bool {
        matches!(
            self,
            Self::Insert(_)
                | Self::Update(_)
                | Self::Delete(_)
                | Self::CreateGraph(_)
                | Self::DropGraph(_)
        )
    }

    /// Graph patterns the statement evaluates, for analysis
    pub fn patterns(&self) -> Vec<GraphPattern> {
        match self {
            Self::Select(query) => query.pattern().into_iter().collect(),
            Self::Insert(insert) => match &insert.source {
                InsertSource::Query { query } => query.pattern().into_iter().collect(),
                InsertSource::Values { .. } => Vec::new(),
            },
            Self::Construct(query) => vec![query.pattern.clone()],
            Self::Ask(query) => vec![query.pattern.clone()],
            Self::Describe(query) => query.pattern.iter().cloned().collect(),
            Self::DeleteWhere(data) => vec![quads_pattern(&data.quads)],
            Self::Modify(modify) => vec![modify.pattern.clone()],
            _ => Vec::new(),
        }
    }

    /// SPARQL text, or `None` for SQL-only statements.
    pub fn to_sparql(&self, prefixes: &PrefixMap) -> Option<String> {
        let text = match self {
            Self::Insert(_)
            | Self::Update(_)
            | Self::Delete(_)
            | Self::CreateGraph(_)
            | Self::DropGraph(_) => return None,
            Self::Select(query) => query.to_sparql(prefixes),
            Self::Construct(query) => {
                let template = query
                    .template
                    .iter()
                    .map(|t| t.to_sparql(prefixes))
                    .collect::<Vec<_>>()
                    .join("\n");
                let mut lines = vec![
                    block("CONSTRUCT", &template),
                    block("WHERE", &query.pattern.to_sparql(prefixes)),
                ];
                if !query.order_by.is_empty() {
                    let keys: Vec<String> =
                        query.order_by.iter().map(|k| k.to_sparql(prefixes)).collect();
                    lines.push(format!("ORDER BY {}", keys.join(" ")));
                }
                if let Some(limit) = query.limit {
                    lines.push(format!("LIMIT {}", limit));
                }
                if let Some(offset) = query.offset {
                    lines.push(format!("OFFSET {}", offset));
                }
                lines.join("\n")
            }
            Self::Ask(query) => block("ASK", &query.pattern.to_sparql(prefixes)),
            Self::Describe(query) => {
                let head = if query.resources.is_empty() {
                    "DESCRIBE *".to_string()
                } else {
                    let resources: Vec<String> =
                        query.resources.iter().map(|r| r.to_sparql(prefixes)).collect();
                    format!("DESCRIBE {}", resources.join(" "))
                };
                match &query.pattern {
                    Some(pattern) => {
                        format!("{}\n{}", head, block("WHERE", &pattern.to_sparql(prefixes)))
                    }
                    None => head,
                }
            }
            Self::InsertData(data) => block("INSERT DATA", &quads_sparql(&data.quads, prefixes)),
            Self::DeleteData(data) => block("DELETE DATA", &quads_sparql(&data.quads, prefixes)),
            Self::DeleteWhere(data) => {
                block("DELETE WHERE", &quads_sparql(&data.quads, prefixes))
            }
            Self::Modify(modify) => {
                let mut lines = Vec::new();
                if let Some(with) = &modify.with {
                    lines.push(format!("WITH {}", prefixes.render_iri(with)));
                }
                if !modify.delete.is_empty() {
                    lines.push(block("DELETE", &quads_sparql(&modify.delete, prefixes)));
                }
                if !modify.insert.is_empty() {
                    lines.push(block("INSERT", &quads_sparql(&modify.insert, prefixes)));
                }
                for using in &modify.using {
                    lines.push(format!("USING {}", prefixes.render_iri(using)));
                }
                for using in &modify.using_named {
                    lines.push(format!("USING NAMED {}", prefixes.render_iri(using)));
                }
                lines.push(block("WHERE", &modify.pattern.to_sparql(prefixes)));
                lines.join("\n")
            }
            Self::Load(load) => {
                let mut out = format!(
                    "LOAD{} {}",
                    silent_keyword(load.silent),
                    prefixes.render_iri(&load.source)
                );
                if let Some(into) = &load.into {
                    out.push_str(&format!(" INTO GRAPH {}", prefixes.render_iri(into)));
                }
                out
            }
            Self::Clear(clear) => format!(
                "CLEAR{} {}",
                silent_keyword(clear.silent),
                clear.target.to_sparql(prefixes)
            ),
            Self::GraphManagement(management) => {
                let silent = silent_keyword(management.silent);
                match &management.operation {
                    GraphOperation::Create { graph } => {
                        format!("CREATE{} GRAPH {}", silent, prefixes.render_iri(graph))
                    }
                    GraphOperation::Drop { target } => {
                        format!("DROP{} {}", silent, target.to_sparql(prefixes))
                    }
                    GraphOperation::Copy { from, to } => transfer("COPY", silent, from, to, prefixes),
                    GraphOperation::Move { from, to } => transfer("MOVE", silent, from, to, prefixes),
                    GraphOperation::Add { from, to } => transfer("ADD", silent, from, to, prefixes),
                }
            }
        };
        Some(text)
    }

    /// Single-line SQL-ish description of any statement.
    pub fn to_sql(&self) -> String {
        match self {
            Self::Select(query) => query.to_sql(),
            Self::Insert(insert) => {
                let mut out = format!("INSERT INTO {}", insert.table.to_sql());
                if !insert.columns.is_empty() {
                    out.push_str(&format!(" ({})", insert.columns.join(", ")));
                }
                match &insert.source {
                    InsertSource::Values { rows } => {
                        let rows: Vec<String> = rows
                            .iter()
                            .map(|row| {
                                let cells: Vec<String> = row.iter().map(Expression::to_sql).collect();
                                format!("({})", cells.join(", "))
                            })
                            .collect();
                        out.push_str(&format!(" VALUES {}", rows.join(", ")));
                    }
                    InsertSource::Query { query } => {
                        out.push(' ');
                        out.push_str(&query.to_sql());
                    }
                }
                out
            }
            Self::Update(update) => {
                let assignments: Vec<String> = update
                    .assignments
                    .iter()
                    .map(|a| format!("{} = {}", a.column, a.value.to_sql()))
                    .collect();
                let mut out = format!(
                    "UPDATE {} SET {}",
                    update.table.to_sql(),
                    assignments.join(", ")
                );
                if let Some(filter) = &update.filter {
                    out.push_str(&format!(" WHERE {}", filter.to_sql()));
                }
                out
            }
            Self::Delete(delete) => {
                let mut out = format!("DELETE FROM {}", delete.table.to_sql());
                if let Some(filter) = &delete.filter {
                    out.push_str(&format!(" WHERE {}", filter.to_sql()));
                }
                out
            }
            Self::CreateGraph(create) => create.to_sql(),
            Self::DropGraph(drop) => format!(
                "DROP PROPERTY GRAPH {}{}",
                if drop.if_exists { "IF EXISTS " } else { "" },
                drop.name
            ),
            sparql => sparql
                .to_sparql(&PrefixMap::new())
                .map(|text| inline(&text))
                .unwrap_or_default(),
        }
    }
}

fn transfer(
    verb: &str,
    silent: &str,
    from: &GraphTarget,
    to: &GraphTarget,
    prefixes: &PrefixMap,
) -> String {
    format!(
        "{}{} {} TO {}",
        verb,
        silent,
        from.to_sparql_operand(prefixes),
        to.to_sparql_operand(prefixes)
    )
}

impl CreateGraphStatement {
    pub fn to_sql(&self) -> String {
        let mut out = format!(
            "CREATE PROPERTY GRAPH {}{}",
            if self.if_not_exists { "IF NOT EXISTS " } else { "" },
            self.name
        );
        if !self.vertex_tables.is_empty() {
            let tables: Vec<String> = self.vertex_tables.iter().map(VertexTable::to_sql).collect();
            out.push_str(&format!(" VERTEX TABLES ({})", tables.join(", ")));
        }
        if !self.edge_tables.is_empty() {
            let tables: Vec<String> = self.edge_tables.iter().map(EdgeTable::to_sql).collect();
            out.push_str(&format!(" EDGE TABLES ({})", tables.join(", ")));
        }
        out
    }
}

fn element_suffix(key: &[String], label: &Option<String>, properties: &[String]) -> String {
    let mut out = String::new();
    if let Some(label) = label {
        out.push_str(&format!(" LABEL {}", label));
    }
    if !properties.is_empty() {
        out.push_str(&format!(" PROPERTIES ({})", properties.join(", ")));
    }
    if key.is_empty() {
        out
    } else {
        format!(" KEY ({}){}", key.join(", "), out)
    }
}

impl VertexTable {
    fn to_sql(&self) -> String {
        format!(
            "{}{}",
            self.table,
            element_suffix(&self.key, &self.label, &self.properties)
        )
    }
}

impl EdgeTable {
    fn to_sql(&self) -> String {
        let key = if self.key.is_empty() {
            String::new()
        } else {
            format!(" KEY ({})", self.key.join(", "))
        };
        format!(
            "{}{} SOURCE KEY ({}) REFERENCES {} DESTINATION KEY ({}) REFERENCES {}{}",
            self.table,
            key,
            self.source.key.join(", "),
            self.source.references,
            self.destination.key.join(", "),
            self.destination.references,
            element_suffix(&[], &self.label, &self.properties)
        )
    }
}
