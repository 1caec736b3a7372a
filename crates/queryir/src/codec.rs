//! Tag-discriminated JSON wire codec.
//!
//! Every sum type encodes as `{"tag": "<case>", ...fields of that case}`.
//! Decoding checks the root discriminator itself so that the common
//! failures (not an object, no tag, unknown tag) carry precise errors; the
//! rest of the tree is decoded by serde and its errors are classified by
//! message.

use crate::error::{DecodeError, DecodeResult};
use crate::expr::{AggregateFunction, DataType, Expression};
use crate::literal::Literal;
use crate::path::PropertyPath;
use crate::pattern::GraphPattern;
use crate::query::SelectQuery;
use crate::source::DataSource;
use crate::statement::QueryStatement;
use crate::term::{SparqlTerm, TriplePattern};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

static UNKNOWN_VARIANT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"unknown variant `([^`]*)`").expect("valid regex"));
static MISSING_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"missing field `([^`]*)`").expect("valid regex"));

/// Encoding and decoding of an IR type in the wire format.
pub trait WireCodec: Serialize + DeserializeOwned {
    /// Type name used in decode errors
    const TYPE_NAME: &'static str;

    /// Known root tags; empty for plain structs
    const TAGS: &'static [&'static str];

    fn encode(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }

    fn encode_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    fn decode(value: &Value) -> DecodeResult<Self> {
        check_root(Self::TYPE_NAME, Self::TAGS, value)?;
        Self::deserialize(value).map_err(|err| {
            let err = classify(Self::TYPE_NAME, err);
            tracing::debug!(type_name = Self::TYPE_NAME, error = %err, "wire decode failed");
            err
        })
    }

    fn decode_str(input: &str) -> DecodeResult<Self> {
        let value: Value = serde_json::from_str(input)?;
        Self::decode(&value)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn check_root(type_name: &'static str, tags: &[&str], value: &Value) -> DecodeResult<()> {
    let object = value.as_object().ok_or(DecodeError::NotAnObject {
        type_name,
        found: json_kind(value),
    })?;
    if tags.is_empty() {
        return Ok(());
    }
    let tag = object
        .get("tag")
        .ok_or(DecodeError::MissingTag { type_name })?;
    let tag = tag.as_str().ok_or(DecodeError::InvalidTag {
        type_name,
        found: json_kind(tag),
    })?;
    if !tags.contains(&tag) {
        tracing::debug!(type_name, tag, "unknown wire tag");
        return Err(DecodeError::UnknownTag {
            type_name,
            tag: tag.to_string(),
        });
    }
    Ok(())
}

fn classify(type_name: &'static str, err: serde_json::Error) -> DecodeError {
    let message = err.to_string();
    if let Some(caps) = UNKNOWN_VARIANT.captures(&message) {
        return DecodeError::UnknownTag {
            type_name,
            tag: caps[1].to_string(),
        };
    }
    if let Some(caps) = MISSING_FIELD.captures(&message) {
        if &caps[1] == "tag" {
            return DecodeError::MissingTag { type_name };
        }
        return DecodeError::MissingField {
            type_name,
            field: caps[1].to_string(),
        };
    }
    DecodeError::Malformed { type_name, message }
}

macro_rules! wire_codec {
    ($ty:ty, $name:literal, [$($tag:literal),* $(,)?]) => {
        impl WireCodec for $ty {
            const TYPE_NAME: &'static str = $name;
            const TAGS: &'static [&'static str] = &[$($tag),*];
        }
    };
}

wire_codec!(
    Literal,
    "Literal",
    [
        "null",
        "bool",
        "int",
        "double",
        "string",
        "date",
        "binary",
        "array",
        "iri",
        "blankNode",
        "typedLiteral",
        "langLiteral",
    ]
);

wire_codec!(
    SparqlTerm,
    "SparqlTerm",
    [
        "variable",
        "iri",
        "prefixedName",
        "literal",
        "blankNode",
        "quotedTriple",
        "reifiedTriple",
    ]
);

wire_codec!(TriplePattern, "TriplePattern", []);

wire_codec!(
    Expression,
    "Expression",
    [
        "literal",
        "variable",
        "column",
        "add",
        "subtract",
        "multiply",
        "divide",
        "modulo",
        "negate",
        "equal",
        "notEqual",
        "lessThan",
        "lessThanOrEqual",
        "greaterThan",
        "greaterThanOrEqual",
        "and",
        "or",
        "not",
        "isNull",
        "isNotNull",
        "bound",
        "like",
        "regex",
        "between",
        "inList",
        "notInList",
        "aggregate",
        "functionCall",
        "caseWhen",
        "coalesce",
        "cast",
        "triple",
        "isTriple",
        "subject",
        "predicate",
        "object",
        "exists",
        "notExists",
        "scalarSubquery",
        "inSubquery",
    ]
);

wire_codec!(
    AggregateFunction,
    "AggregateFunction",
    [
        "count",
        "sum",
        "avg",
        "min",
        "max",
        "groupConcat",
        "sample",
        "arrayAgg",
    ]
);

wire_codec!(
    DataType,
    "DataType",
    [
        "boolean",
        "smallInt",
        "integer",
        "bigInt",
        "real",
        "double",
        "decimal",
        "char",
        "varchar",
        "text",
        "date",
        "time",
        "timestamp",
        "blob",
        "uuid",
        "json",
        "custom",
    ]
);

wire_codec!(
    PropertyPath,
    "PropertyPath",
    [
        "iri",
        "sequence",
        "alternative",
        "inverse",
        "zeroOrMore",
        "oneOrMore",
        "zeroOrOne",
        "negation",
        "range",
    ]
);

wire_codec!(
    GraphPattern,
    "GraphPattern",
    [
        "basic",
        "join",
        "optional",
        "union",
        "filter",
        "minus",
        "graph",
        "service",
        "bind",
        "values",
        "subquery",
        "groupBy",
        "propertyPath",
        "lateral",
    ]
);

wire_codec!(
    DataSource,
    "DataSource",
    [
        "table",
        "subquery",
        "join",
        "values",
        "graphTable",
        "graphPattern",
        "namedGraph",
        "service",
        "union",
        "intersect",
        "except",
    ]
);

wire_codec!(SelectQuery, "SelectQuery", []);

wire_codec!(
    QueryStatement,
    "QueryStatement",
    [
        "select",
        "insert",
        "update",
        "delete",
        "createGraph",
        "dropGraph",
        "construct",
        "ask",
        "describe",
        "insertData",
        "deleteData",
        "deleteWhere",
        "modify",
        "load",
        "clear",
        "graphManagement",
    ]
);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn test_typed_literal_encoding() {
        let literal = Literal::typed("42", "http://www.w3.org/2001/XMLSchema#integer");
        assert_eq!(
            literal.encode_string().unwrap(),
            r#"{"tag":"typedLiteral","value":"42","datatype":"http://www.w3.org/2001/XMLSchema#integer"}"#
        );
        let decoded = Literal::decode(&literal.encode().unwrap()).unwrap();
        assert_eq!(decoded, literal);
    }

    #[test_case(f64::NAN, "NaN" ; "nan")]
    #[test_case(f64::INFINITY, "INF" ; "positive infinity")]
    #[test_case(f64::NEG_INFINITY, "-INF" ; "negative infinity")]
    fn test_non_finite_double_uses_lexical_form(value: f64, lexical: &str) {
        let literal = Literal::double(value);
        let encoded = literal.encode().unwrap();
        assert_eq!(encoded, json!({"tag": "double", "value": lexical}));
        assert_eq!(Literal::decode(&encoded).unwrap(), literal);
    }

    #[test]
    fn test_finite_double_stays_a_number() {
        let literal = Literal::double(-0.25);
        assert_eq!(
            literal.encode().unwrap(),
            json!({"tag": "double", "value": -0.25})
        );
        assert_eq!(
            Literal::decode(&json!({"tag": "double", "value": 3})).unwrap(),
            Literal::double(3.0)
        );
    }

    #[test]
    fn test_unknown_double_lexical_is_malformed() {
        for value in [json!("Infinity"), json!(null)] {
            let err = Literal::decode(&json!({"tag": "double", "value": value})).unwrap_err();
            assert!(matches!(err, DecodeError::Malformed { .. }), "{:?}", err);
        }
    }

    #[test]
    fn test_root_not_an_object() {
        let err = Expression::decode(&json!([1, 2])).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::NotAnObject {
                type_name: "Expression",
                found: "array"
            }
        ));
    }

    #[test]
    fn test_missing_and_invalid_tag() {
        let err = PropertyPath::decode(&json!({"iri": "http://ex/p"})).unwrap_err();
        assert!(matches!(err, DecodeError::MissingTag { type_name: "PropertyPath" }));

        let err = PropertyPath::decode(&json!({"tag": 7})).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::InvalidTag {
                found: "number",
                ..
            }
        ));
    }

    #[test]
    fn test_unknown_root_tag_is_named() {
        let err = GraphPattern::decode(&json!({"tag": "cartesian"})).unwrap_err();
        assert_eq!(err.to_string(), "GraphPattern: unknown tag `cartesian`");
    }

    #[test]
    fn test_unknown_nested_tag_is_named() {
        let err = Expression::decode(&json!({
            "tag": "not",
            "expr": {"tag": "xor", "lhs": {"tag": "literal", "value": {"tag": "null"}}}
        }))
        .unwrap_err();
        assert!(matches!(err, DecodeError::UnknownTag { ref tag, .. } if tag == "xor"));
    }

    #[test]
    fn test_missing_field_is_named() {
        let err = Expression::decode(&json!({
            "tag": "add",
            "lhs": {"tag": "variable", "variable": "x"}
        }))
        .unwrap_err();
        assert_eq!(err.to_string(), "Expression: missing field `rhs`");
    }

    #[test]
    fn test_mistyped_field_is_malformed() {
        let err = Literal::decode(&json!({"tag": "int", "value": "forty-two"})).unwrap_err();
        assert!(matches!(err, DecodeError::Malformed { type_name: "Literal", .. }));
    }

    #[test]
    fn test_invalid_json_text() {
        let err = Literal::decode_str("{not json").unwrap_err();
        assert!(matches!(err, DecodeError::Json(_)));
    }

    #[test]
    fn test_expression_wire_field_names() {
        let expr = Expression::cast(
            Expression::Subject {
                expr: Box::new(Expression::var("t")),
            },
            DataType::BigInt,
        );
        assert_eq!(
            expr.encode().unwrap(),
            json!({
                "tag": "cast",
                "expr": {"tag": "subject", "expr": {"tag": "variable", "variable": "t"}},
                "targetType": {"tag": "bigInt"}
            })
        );
    }

    #[test]
    fn test_statement_round_trip_from_text() {
        let text = r#"{
            "tag": "select",
            "projection": {"tag": "all"},
            "source": {
                "tag": "graphPattern",
                "pattern": {"tag": "basic", "triples": [{
                    "subject": {"tag": "variable", "name": "s"},
                    "predicate": {"tag": "iri", "value": "http://ex/p"},
                    "object": {"tag": "variable", "name": "o"}
                }]}
            },
            "limit": 5
        }"#;
        let statement = QueryStatement::decode_str(text).unwrap();
        assert!(statement.is_read_only());
        let again = QueryStatement::decode(&statement.encode().unwrap()).unwrap();
        assert_eq!(again, statement);
    }
}
