//! Unified scalar values: SQL literals and RDF term lexical values.

use crate::prefix::{PrefixMap, RDF, XSD};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A concrete scalar or RDF value.
///
/// Typed and language-tagged lexical values are carried as-is and never
/// re-validated against their datatype.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "tag", rename_all = "camelCase")]
pub enum Literal {
    Null,
    Bool {
        value: bool,
    },
    Int {
        value: i64,
    },
    Double {
        #[serde(with = "lexical_double")]
        value: f64,
    },
    String {
        value: String,
    },
    Date {
        value: DateTime<Utc>,
    },
    Binary {
        #[serde(with = "base64_bytes")]
        value: Vec<u8>,
    },
    Array {
        values: Vec<Literal>,
    },
    Iri {
        value: String,
    },
    BlankNode {
        id: String,
    },
    TypedLiteral {
        value: String,
        datatype: String,
    },
    LangLiteral {
        value: String,
        language: String,
    },
}

impl Literal {
    pub fn bool(value: bool) -> Self {
        Self::Bool { value }
    }

    pub fn int(value: i64) -> Self {
        Self::Int { value }
    }

    pub fn double(value: f64) -> Self {
        Self::Double { value }
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String {
            value: value.into(),
        }
    }

    pub fn date(value: DateTime<Utc>) -> Self {
        Self::Date { value }
    }

    pub fn binary(value: impl Into<Vec<u8>>) -> Self {
        Self::Binary {
            value: value.into(),
        }
    }

    pub fn array(values: impl IntoIterator<Item = Literal>) -> Self {
        Self::Array {
            values: values.into_iter().collect(),
        }
    }

    pub fn iri(value: impl Into<String>) -> Self {
        Self::Iri {
            value: value.into(),
        }
    }

    pub fn blank_node(id: impl Into<String>) -> Self {
        Self::BlankNode { id: id.into() }
    }

    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Self::TypedLiteral {
            value: value.into(),
            datatype: datatype.into(),
        }
    }

    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Self::LangLiteral {
            value: value.into(),
            language: language.into(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_numeric(&self) -> bool {
        self.as_f64().is_some()
    }

    /// Numeric value, including typed literals with an XSD numeric datatype
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int { value } => Some(*value as f64),
            Self::Double { value } => Some(*value),
            Self::TypedLiteral { value, datatype } if is_numeric_datatype(datatype) => {
                value.trim().parse().ok()
            }
            _ => None,
        }
    }

    /// The XSD (or rdf:langString) datatype IRI of this value, if any
    pub fn datatype_iri(&self) -> Option<String> {
        let local = match self {
            Self::Bool { .. } => "boolean",
            Self::Int { .. } => "integer",
            Self::Double { .. } => "double",
            Self::String { .. } => "string",
            Self::Date { .. } => "dateTime",
            Self::Binary { .. } => "base64Binary",
            Self::TypedLiteral { datatype, .. } => return Some(datatype.clone()),
            Self::LangLiteral { .. } => return Some(format!("{}langString", RDF)),
            Self::Null | Self::Array { .. } | Self::Iri { .. } | Self::BlankNode { .. } => {
                return None
            }
        };
        Some(format!("{}{}", XSD, local))
    }

    /// Ordering rank: unbound < blank node < IRI < literal value
    fn rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::BlankNode { .. } => 1,
            Self::Iri { .. } => 2,
            _ => 3,
        }
    }

    /// Natural ordering used for ORDER BY and index term ordering.
    ///
    /// Returns `None` for value pairs SPARQL leaves unordered (for example a
    /// boolean against a string).
    pub fn natural_cmp(&self, other: &Literal) -> Option<Ordering> {
        let (lr, rr) = (self.rank(), other.rank());
        if lr != rr {
            return Some(lr.cmp(&rr));
        }
        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::BlankNode { id: a }, Self::BlankNode { id: b }) => Some(a.cmp(b)),
            (Self::Iri { value: a }, Self::Iri { value: b }) => Some(a.cmp(b)),
            (Self::Int { value: a }, Self::Int { value: b }) => Some(a.cmp(b)),
            (Self::Bool { value: a }, Self::Bool { value: b }) => Some(a.cmp(b)),
            (Self::String { value: a }, Self::String { value: b }) => Some(a.cmp(b)),
            (
                Self::LangLiteral {
                    value: a,
                    language: la,
                },
                Self::LangLiteral {
                    value: b,
                    language: lb,
                },
            ) => Some(a.cmp(b).then_with(|| la.cmp(lb))),
            (Self::Date { value: a }, Self::Date { value: b }) => Some(a.cmp(b)),
            (Self::Binary { value: a }, Self::Binary { value: b }) => Some(a.cmp(b)),
            (Self::Array { values: a }, Self::Array { values: b }) => {
                for (x, y) in a.iter().zip(b) {
                    match x.natural_cmp(y)? {
                        Ordering::Equal => continue,
                        ord => return Some(ord),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            (
                Self::TypedLiteral {
                    value: a,
                    datatype: da,
                },
                Self::TypedLiteral {
                    value: b,
                    datatype: db,
                },
            ) if da == db && !is_numeric_datatype(da) => Some(a.cmp(b)),
            (a, b) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        }
    }

    /// Render as a SPARQL term.
    pub fn to_sparql(&self, prefixes: &PrefixMap) -> String {
        match self {
            Self::Null => "UNDEF".to_string(),
            Self::Bool { value } => value.to_string(),
            Self::Int { value } => value.to_string(),
            Self::Double { value } if value.is_finite() => format!("{:e}", value),
            Self::Double { value } => typed_sparql(
                non_finite_lexical(*value),
                &format!("{}double", XSD),
                prefixes,
            ),
            Self::String { value } => quote_string(value),
            Self::Date { value } => typed_sparql(
                &value.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                &format!("{}dateTime", XSD),
                prefixes,
            ),
            Self::Binary { value } => {
                use base64::Engine;
                typed_sparql(
                    &base64::engine::general_purpose::STANDARD.encode(value),
                    &format!("{}base64Binary", XSD),
                    prefixes,
                )
            }
            Self::Array { values } => format!(
                "({})",
                values
                    .iter()
                    .map(|v| v.to_sparql(prefixes))
                    .collect::<Vec<_>>()
                    .join(" ")
            ),
            Self::Iri { value } => prefixes.render_iri(value),
            Self::BlankNode { id } => blank_node_label(id),
            Self::TypedLiteral { value, datatype } => typed_sparql(value, datatype, prefixes),
            Self::LangLiteral { value, language } => {
                format!("{}@{}", quote_string(value), language)
            }
        }
    }

    /// Render as an SQL literal.
    pub fn to_sql(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool { value: true } => "TRUE".to_string(),
            Self::Bool { value: false } => "FALSE".to_string(),
            Self::Int { value } => value.to_string(),
            Self::Double { value } if value.is_finite() => format!("{:?}", value),
            Self::Double { value } => sql_string(&value.to_string()),
            Self::String { value } => sql_string(value),
            Self::Date { value } => format!(
                "TIMESTAMP {}",
                sql_string(&value.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            ),
            Self::Binary { value } => format!("X'{}'", hex::encode_upper(value)),
            Self::Array { values } => format!(
                "ARRAY[{}]",
                values
                    .iter()
                    .map(Literal::to_sql)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Self::Iri { value } => sql_string(value),
            Self::BlankNode { id } => sql_string(&format!("_:{}", id)),
            Self::TypedLiteral { value, .. } | Self::LangLiteral { value, .. } => sql_string(value),
        }
    }
}

impl PartialEq for Literal {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool { value: a }, Self::Bool { value: b }) => a == b,
            (Self::Int { value: a }, Self::Int { value: b }) => a == b,
            (Self::Double { value: a }, Self::Double { value: b }) => {
                double_bits(*a) == double_bits(*b)
            }
            (Self::String { value: a }, Self::String { value: b }) => a == b,
            (Self::Date { value: a }, Self::Date { value: b }) => a == b,
            (Self::Binary { value: a }, Self::Binary { value: b }) => a == b,
            (Self::Array { values: a }, Self::Array { values: b }) => a == b,
            (Self::Iri { value: a }, Self::Iri { value: b }) => a == b,
            (Self::BlankNode { id: a }, Self::BlankNode { id: b }) => a == b,
            (
                Self::TypedLiteral {
                    value: a,
                    datatype: da,
                },
                Self::TypedLiteral {
                    value: b,
                    datatype: db,
                },
            ) => a == b && da == db,
            (
                Self::LangLiteral {
                    value: a,
                    language: la,
                },
                Self::LangLiteral {
                    value: b,
                    language: lb,
                },
            ) => a == b && la == lb,
            _ => false,
        }
    }
}

// Doubles compare by bit pattern with every NaN collapsed to one, so
// equality is reflexive.
impl Eq for Literal {}

impl Hash for Literal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool { value } => value.hash(state),
            Self::Int { value } => value.hash(state),
            Self::Double { value } => double_bits(*value).hash(state),
            Self::String { value } | Self::Iri { value } => value.hash(state),
            Self::Date { value } => value.hash(state),
            Self::Binary { value } => value.hash(state),
            Self::Array { values } => values.hash(state),
            Self::BlankNode { id } => id.hash(state),
            Self::TypedLiteral { value, datatype } => {
                value.hash(state);
                datatype.hash(state);
            }
            Self::LangLiteral { value, language } => {
                value.hash(state);
                language.hash(state);
            }
        }
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Self::Bool { value }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Int { value }
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Double { value }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::string(value)
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::String { value }
    }
}

fn is_numeric_datatype(datatype: &str) -> bool {
    datatype.strip_prefix(XSD).is_some_and(|local| {
        matches!(
            local,
            "integer"
                | "decimal"
                | "double"
                | "float"
                | "int"
                | "long"
                | "short"
                | "byte"
                | "nonNegativeInteger"
                | "positiveInteger"
                | "negativeInteger"
                | "nonPositiveInteger"
                | "unsignedInt"
                | "unsignedLong"
                | "unsignedShort"
                | "unsignedByte"
        )
    })
}

fn typed_sparql(lexical: &str, datatype: &str, prefixes: &PrefixMap) -> String {
    format!("{}^^{}", quote_string(lexical), prefixes.render_iri(datatype))
}

/// Quote a SPARQL string literal, escaping `"`, `\` and control characters.
pub fn quote_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0C}' => out.push_str("\\f"),
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn sql_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render a blank node label.
///
/// Ids outside the BLANK_NODE_LABEL grammar are replaced by a deterministic
/// hashed id rather than rejected.
pub fn blank_node_label(id: &str) -> String {
    if is_valid_blank_node_id(id) {
        format!("_:{}", id)
    } else {
        let digest = blake3::hash(id.as_bytes());
        format!("_:b{}", hex::encode(&digest.as_bytes()[..8]))
    }
}

fn is_valid_blank_node_id(id: &str) -> bool {
    let mut chars = id.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphanumeric() || first == '_')
        && !id.ends_with('.')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '\u{B7}'))
}

fn double_bits(value: f64) -> u64 {
    if value.is_nan() {
        f64::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

/// XSD lexical form of NaN and the infinities
fn non_finite_lexical(value: f64) -> &'static str {
    if value.is_nan() {
        "NaN"
    } else if value > 0.0 {
        "INF"
    } else {
        "-INF"
    }
}

/// JSON has no NaN or infinity, so those travel as their XSD lexical form.
mod lexical_double {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum WireDouble {
        Number(f64),
        Lexical(String),
    }

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_f64(*value)
        } else {
            serializer.serialize_str(super::non_finite_lexical(*value))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match WireDouble::deserialize(deserializer)? {
            WireDouble::Number(value) => Ok(value),
            WireDouble::Lexical(lexical) => match lexical.as_str() {
                "NaN" => Ok(f64::NAN),
                "INF" => Ok(f64::INFINITY),
                "-INF" => Ok(f64::NEG_INFINITY),
                other => Err(serde::de::Error::custom(format!(
                    "invalid double `{}`",
                    other
                ))),
            },
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    fn plain() -> PrefixMap {
        PrefixMap::new()
    }

    #[test_case(Literal::Null, "UNDEF" ; "null")]
    #[test_case(Literal::bool(true), "true" ; "bool")]
    #[test_case(Literal::int(-42), "-42" ; "int")]
    #[test_case(Literal::double(1.5), "1.5e0" ; "double")]
    #[test_case(Literal::double(100.0), "1e2" ; "integral double")]
    #[test_case(Literal::string("say \"hi\"\n"), r#""say \"hi\"\n""# ; "string escapes")]
    #[test_case(Literal::string("a\\b\u{01}"), r#""a\\b\u0001""# ; "backslash and control")]
    #[test_case(Literal::lang("chat", "fr"), r#""chat"@fr"# ; "lang literal")]
    #[test_case(Literal::iri("http://ex/a"), "<http://ex/a>" ; "iri")]
    #[test_case(Literal::blank_node("b0"), "_:b0" ; "blank node")]
    #[test_case(Literal::array([Literal::int(1), Literal::int(2)]), "(1 2)" ; "array")]
    fn test_to_sparql(literal: Literal, expected: &str) {
        assert_eq!(literal.to_sparql(&plain()), expected);
    }

    #[test]
    fn test_typed_literal_compacts_datatype() {
        let literal = Literal::typed("42", format!("{}integer", XSD));
        assert_eq!(literal.to_sparql(&PrefixMap::standard()), r#""42"^^xsd:integer"#);
        assert_eq!(
            literal.to_sparql(&plain()),
            r#""42"^^<http://www.w3.org/2001/XMLSchema#integer>"#
        );
    }

    #[test]
    fn test_non_finite_double() {
        let prefixes = PrefixMap::standard();
        assert_eq!(
            Literal::double(f64::NAN).to_sparql(&prefixes),
            r#""NaN"^^xsd:double"#
        );
        assert_eq!(
            Literal::double(f64::NEG_INFINITY).to_sparql(&prefixes),
            r#""-INF"^^xsd:double"#
        );
    }

    #[test]
    fn test_date_and_binary() {
        let prefixes = PrefixMap::standard();
        let date = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(
            Literal::date(date).to_sparql(&prefixes),
            r#""2024-03-01T12:30:00Z"^^xsd:dateTime"#
        );
        assert_eq!(
            Literal::binary(vec![1u8, 2, 3]).to_sparql(&prefixes),
            r#""AQID"^^xsd:base64Binary"#
        );
    }

    #[test]
    fn test_malformed_blank_node_degrades() {
        let label = Literal::blank_node("not valid!").to_sparql(&plain());
        assert!(label.starts_with("_:b"));
        assert_eq!(label.len(), "_:b".len() + 16);
        // deterministic
        assert_eq!(label, blank_node_label("not valid!"));
        assert_ne!(label, blank_node_label("also not valid!"));
    }

    #[test_case("" ; "empty")]
    #[test_case("a b" ; "space")]
    #[test_case("trailing." ; "trailing dot")]
    #[test_case("-lead" ; "leading hyphen")]
    fn test_invalid_blank_node_ids(id: &str) {
        assert!(!is_valid_blank_node_id(id));
    }

    #[test]
    fn test_natural_order_ranks() {
        let blank = Literal::blank_node("b");
        let iri = Literal::iri("http://a");
        let lit = Literal::string("a");
        assert_eq!(Literal::Null.natural_cmp(&blank), Some(Ordering::Less));
        assert_eq!(blank.natural_cmp(&iri), Some(Ordering::Less));
        assert_eq!(iri.natural_cmp(&lit), Some(Ordering::Less));
        assert_eq!(lit.natural_cmp(&blank), Some(Ordering::Greater));
    }

    #[test]
    fn test_natural_order_values() {
        assert_eq!(
            Literal::int(2).natural_cmp(&Literal::double(2.5)),
            Some(Ordering::Less)
        );
        assert_eq!(
            Literal::typed("10", format!("{}integer", XSD)).natural_cmp(&Literal::int(9)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            Literal::string("b").natural_cmp(&Literal::string("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(Literal::bool(true).natural_cmp(&Literal::string("a")), None);
    }

    #[test]
    fn test_double_equality_is_structural() {
        assert_eq!(Literal::double(f64::NAN), Literal::double(f64::NAN));
        assert_ne!(Literal::double(0.0), Literal::double(-0.0));
        assert_ne!(Literal::int(1), Literal::double(1.0));
    }

    #[test]
    fn test_to_sql() {
        assert_eq!(Literal::string("it's").to_sql(), "'it''s'");
        assert_eq!(Literal::binary(vec![0x0a, 0xff]).to_sql(), "X'0AFF'");
        assert_eq!(Literal::double(2.0).to_sql(), "2.0");
        assert_eq!(
            Literal::array([Literal::Null, Literal::bool(false)]).to_sql(),
            "ARRAY[NULL, FALSE]"
        );
    }

    #[test]
    fn test_datatype_iri() {
        assert_eq!(
            Literal::int(1).datatype_iri().as_deref(),
            Some("http://www.w3.org/2001/XMLSchema#integer")
        );
        assert_eq!(Literal::iri("http://x").datatype_iri(), None);
    }
}
