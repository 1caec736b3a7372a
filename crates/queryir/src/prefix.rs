//! Prefix maps for compacting IRIs in rendered SPARQL.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";
pub const OWL: &str = "http://www.w3.org/2002/07/owl#";

/// Ordered prefix → namespace declarations.
///
/// Prefixes are kept sorted so prologues render deterministically.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefixMap {
    entries: BTreeMap<String, String>,
}

impl PrefixMap {
    /// Empty map; every IRI renders in `<…>` form
    pub fn new() -> Self {
        Self::default()
    }

    /// The rdf, rdfs, xsd and owl namespaces
    pub fn standard() -> Self {
        Self::new()
            .with("rdf", RDF)
            .with("rdfs", RDFS)
            .with("xsd", XSD)
            .with("owl", OWL)
    }

    /// Add a declaration (builder style)
    pub fn with(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.insert(prefix, namespace);
        self
    }

    pub fn insert(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.entries.insert(prefix.into(), namespace.into());
    }

    /// Merge another map in; its declarations win on conflicts
    pub fn extend(&mut self, other: &PrefixMap) {
        for (prefix, namespace) in &other.entries {
            self.entries.insert(prefix.clone(), namespace.clone());
        }
    }

    pub fn namespace(&self, prefix: &str) -> Option<&str> {
        self.entries.get(prefix).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(p, n)| (p.as_str(), n.as_str()))
    }

    /// Compact an IRI to `prefix:local` using the longest matching namespace.
    ///
    /// Returns `None` when no namespace matches or the remainder is not a
    /// valid prefixed-name local part.
    pub fn compact(&self, iri: &str) -> Option<String> {
        self.entries
            .iter()
            .filter(|(_, ns)| !ns.is_empty() && iri.starts_with(ns.as_str()))
            .filter(|(_, ns)| is_valid_local(&iri[ns.len()..]))
            .max_by_key(|(_, ns)| ns.len())
            .map(|(prefix, ns)| format!("{}:{}", prefix, &iri[ns.len()..]))
    }

    /// Expand `prefix:local` back to a full IRI
    pub fn expand(&self, prefix: &str, local: &str) -> Option<String> {
        self.namespace(prefix).map(|ns| format!("{}{}", ns, local))
    }

    /// Render an IRI as a prefixed name when possible, else as `<iri>`
    pub fn render_iri(&self, iri: &str) -> String {
        self.compact(iri)
            .unwrap_or_else(|| format!("<{}>", escape_iri(iri)))
    }

    /// `PREFIX p: <ns>` lines, one per declaration
    pub fn prologue(&self) -> String {
        self.entries
            .iter()
            .map(|(prefix, ns)| format!("PREFIX {}: <{}>", prefix, escape_iri(ns)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl<P: Into<String>, N: Into<String>> FromIterator<(P, N)> for PrefixMap {
    fn from_iter<I: IntoIterator<Item = (P, N)>>(iter: I) -> Self {
        let mut map = PrefixMap::new();
        for (prefix, namespace) in iter {
            map.insert(prefix, namespace);
        }
        map
    }
}

fn is_valid_local(local: &str) -> bool {
    let mut chars = local.chars();
    let Some(first) = chars.next() else {
        return true;
    };
    if !(first.is_alphanumeric() || first == '_') {
        return false;
    }
    if local.ends_with('.') {
        return false;
    }
    chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Percent-encode the characters IRIREF forbids.
///
/// Existing `%XX` sequences pass through untouched.
pub fn escape_iri(iri: &str) -> String {
    let mut out = String::with_capacity(iri.len());
    for c in iri.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                out.push_str(&format!("%{:02X}", c as u32));
            }
            c if c.is_whitespace() || c.is_control() => {
                let mut buf = [0u8; 4];
                for byte in c.encode_utf8(&mut buf).bytes() {
                    out.push_str(&format!("%{:02X}", byte));
                }
            }
            c => out.push(c),
        }
    }
    out
}
