//! RDF terms and triple patterns: the atomic vocabulary of graph patterns.

use crate::literal::{blank_node_label, Literal};
use crate::prefix::{PrefixMap, RDF};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// A query variable, stored without the leading `?`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variable(String);

impl Variable {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        match name.strip_prefix(&['?', '$'][..]) {
            Some(stripped) => Self(stripped.to_string()),
            None => Self(name),
        }
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn into_name(self) -> String {
        self.0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.0)
    }
}

impl From<&str> for Variable {
    fn from(name: &str) -> Self {
        Variable::new(name)
    }
}

impl From<String> for Variable {
    fn from(name: String) -> Self {
        Variable::new(name)
    }
}

/// An RDF term occurring in a pattern or expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum SparqlTerm {
    Variable {
        name: String,
    },
    Iri {
        value: String,
    },
    PrefixedName {
        prefix: String,
        local: String,
    },
    Literal {
        value: Literal,
    },
    BlankNode {
        id: String,
    },
    /// RDF-star quoted triple `<< s p o >>`
    QuotedTriple {
        subject: Box<SparqlTerm>,
        predicate: Box<SparqlTerm>,
        object: Box<SparqlTerm>,
    },
    /// SPARQL 1.2 reified triple `<< s p o ~ r >>`
    ReifiedTriple {
        subject: Box<SparqlTerm>,
        predicate: Box<SparqlTerm>,
        object: Box<SparqlTerm>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reifier: Option<Box<SparqlTerm>>,
    },
}

impl SparqlTerm {
    pub fn var(name: impl Into<Variable>) -> Self {
        Self::Variable {
            name: name.into().into_name(),
        }
    }

    pub fn iri(value: impl Into<String>) -> Self {
        Self::Iri {
            value: value.into(),
        }
    }

    pub fn prefixed(prefix: impl Into<String>, local: impl Into<String>) -> Self {
        Self::PrefixedName {
            prefix: prefix.into(),
            local: local.into(),
        }
    }

    pub fn literal(value: impl Into<Literal>) -> Self {
        Self::Literal {
            value: value.into(),
        }
    }

    pub fn blank_node(id: impl Into<String>) -> Self {
        Self::BlankNode { id: id.into() }
    }

    pub fn quoted(subject: SparqlTerm, predicate: SparqlTerm, object: SparqlTerm) -> Self {
        Self::QuotedTriple {
            subject: Box::new(subject),
            predicate: Box::new(predicate),
            object: Box::new(object),
        }
    }

    pub fn reified(
        subject: SparqlTerm,
        predicate: SparqlTerm,
        object: SparqlTerm,
        reifier: Option<SparqlTerm>,
    ) -> Self {
        Self::ReifiedTriple {
            subject: Box::new(subject),
            predicate: Box::new(predicate),
            object: Box::new(object),
            reifier: reifier.map(Box::new),
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable { .. })
    }

    /// True when no variable occurs anywhere in the term
    pub fn is_concrete(&self) -> bool {
        match self {
            Self::Variable { .. } => false,
            Self::QuotedTriple {
                subject,
                predicate,
                object,
            } => subject.is_concrete() && predicate.is_concrete() && object.is_concrete(),
            Self::ReifiedTriple {
                subject,
                predicate,
                object,
                reifier,
            } => {
                subject.is_concrete()
                    && predicate.is_concrete()
                    && object.is_concrete()
                    && reifier.as_ref().map_or(true, |r| r.is_concrete())
            }
            _ => true,
        }
    }

    pub fn variable_name(&self) -> Option<&str> {
        match self {
            Self::Variable { name } => Some(name),
            _ => None,
        }
    }

    /// Variables occurring in the term, including inside nested triples
    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    pub(crate) fn collect_variables(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Variable { name } => {
                out.insert(name.clone());
            }
            Self::QuotedTriple {
                subject,
                predicate,
                object,
            } => {
                subject.collect_variables(out);
                predicate.collect_variables(out);
                object.collect_variables(out);
            }
            Self::ReifiedTriple {
                subject,
                predicate,
                object,
                reifier,
            } => {
                subject.collect_variables(out);
                predicate.collect_variables(out);
                object.collect_variables(out);
                if let Some(r) = reifier {
                    r.collect_variables(out);
                }
            }
            _ => {}
        }
    }

    fn rank(&self) -> Option<u8> {
        match self {
            Self::Variable { .. } => None,
            Self::BlankNode { .. } => Some(1),
            Self::Iri { .. } | Self::PrefixedName { .. } => Some(2),
            Self::Literal { value } => Some(match value {
                Literal::Null => 0,
                Literal::BlankNode { .. } => 1,
                Literal::Iri { .. } => 2,
                _ => 3,
            }),
            Self::QuotedTriple { .. } | Self::ReifiedTriple { .. } => Some(4),
        }
    }

    /// Natural term ordering: blank node < IRI < literal < triple.
    ///
    /// Variables are unordered, and a prefixed name cannot be compared with
    /// a full IRI without a prefix map.
    pub fn natural_cmp(&self, other: &SparqlTerm) -> Option<Ordering> {
        let (lr, rr) = (self.rank()?, other.rank()?);
        if lr != rr {
            return Some(lr.cmp(&rr));
        }
        match (self, other) {
            (Self::BlankNode { id: a }, Self::BlankNode { id: b }) => Some(a.cmp(b)),
            (Self::Iri { value: a }, Self::Iri { value: b }) => Some(a.cmp(b)),
            (
                Self::PrefixedName {
                    prefix: pa,
                    local: la,
                },
                Self::PrefixedName {
                    prefix: pb,
                    local: lb,
                },
            ) if pa == pb => Some(la.cmp(lb)),
            (Self::Literal { value: a }, Self::Literal { value: b }) => a.natural_cmp(b),
            (Self::Literal { value }, other) | (other, Self::Literal { value })
                if !matches!(other, Self::Literal { .. }) =>
            {
                let flip = matches!(self, Self::Literal { .. });
                let as_literal = other.as_literal()?;
                let ord = if flip {
                    value.natural_cmp(&as_literal)?
                } else {
                    as_literal.natural_cmp(value)?
                };
                Some(ord)
            }
            (Self::QuotedTriple { .. } | Self::ReifiedTriple { .. }, _) => {
                let (sa, pa, oa) = self.triple_parts()?;
                let (sb, pb, ob) = other.triple_parts()?;
                match sa.natural_cmp(sb)? {
                    Ordering::Equal => match pa.natural_cmp(pb)? {
                        Ordering::Equal => oa.natural_cmp(ob),
                        ord => Some(ord),
                    },
                    ord => Some(ord),
                }
            }
            _ => None,
        }
    }

    fn as_literal(&self) -> Option<Literal> {
        match self {
            Self::Iri { value } => Some(Literal::iri(value.clone())),
            Self::BlankNode { id } => Some(Literal::blank_node(id.clone())),
            Self::Literal { value } => Some(value.clone()),
            _ => None,
        }
    }

    fn triple_parts(&self) -> Option<(&SparqlTerm, &SparqlTerm, &SparqlTerm)> {
        match self {
            Self::QuotedTriple {
                subject,
                predicate,
                object,
            }
            | Self::ReifiedTriple {
                subject,
                predicate,
                object,
                ..
            } => Some((subject, predicate, object)),
            _ => None,
        }
    }

    pub fn to_sparql(&self, prefixes: &PrefixMap) -> String {
        match self {
            Self::Variable { name } => format!("?{}", name),
            Self::Iri { value } => prefixes.render_iri(value),
            Self::PrefixedName { prefix, local } => format!("{}:{}", prefix, local),
            Self::Literal { value } => value.to_sparql(prefixes),
            Self::BlankNode { id } => blank_node_label(id),
            Self::QuotedTriple {
                subject,
                predicate,
                object,
            } => format!(
                "<< {} {} {} >>",
                subject.to_sparql(prefixes),
                predicate.to_sparql(prefixes),
                object.to_sparql(prefixes)
            ),
            Self::ReifiedTriple {
                subject,
                predicate,
                object,
                reifier,
            } => {
                let reifier = reifier
                    .as_ref()
                    .map(|r| format!(" ~ {}", r.to_sparql(prefixes)))
                    .unwrap_or_default();
                format!(
                    "<< {} {} {}{} >>",
                    subject.to_sparql(prefixes),
                    predicate.to_sparql(prefixes),
                    object.to_sparql(prefixes),
                    reifier
                )
            }
        }
    }
}

impl From<Variable> for SparqlTerm {
    fn from(variable: Variable) -> Self {
        Self::Variable {
            name: variable.into_name(),
        }
    }
}

impl From<Literal> for SparqlTerm {
    fn from(value: Literal) -> Self {
        Self::Literal { value }
    }
}

/// One (possibly variable) RDF triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TriplePattern {
    pub subject: SparqlTerm,
    pub predicate: SparqlTerm,
    pub object: SparqlTerm,
}

impl TriplePattern {
    pub fn new(
        subject: impl Into<SparqlTerm>,
        predicate: impl Into<SparqlTerm>,
        object: impl Into<SparqlTerm>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }

    /// `?subject rdf:type <class>`
    pub fn rdf_type(subject: &str, class_iri: &str) -> Self {
        Self::new(
            SparqlTerm::var(subject),
            SparqlTerm::iri(format!("{}type", RDF)),
            SparqlTerm::iri(class_iri),
        )
    }

    pub fn variables(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        self.collect_variables(&mut out);
        out
    }

    pub(crate) fn collect_variables(&self, out: &mut BTreeSet<String>) {
        self.subject.collect_variables(out);
        self.predicate.collect_variables(out);
        self.object.collect_variables(out);
    }

    /// `s p o .`
    pub fn to_sparql(&self, prefixes: &PrefixMap) -> String {
        format!(
            "{} {} {} .",
            self.subject.to_sparql(prefixes),
            self.predicate.to_sparql(prefixes),
            self.object.to_sparql(prefixes)
        )
    }
}
