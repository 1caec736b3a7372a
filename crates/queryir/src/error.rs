//! Error types for QueryIR.
//!
//! Rendering and analysis are total, so the only failures in this crate come
//! from decoding wire documents, loading configuration, and asking a
//! renderer for a surface syntax a statement has no form in.

use thiserror::Error;

/// Errors raised while decoding the tagged wire format.
///
/// Every variant names the IR type being decoded and, where known, the
/// offending tag or field.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("{type_name}: expected a JSON object, found {found}")]
    NotAnObject {
        type_name: &'static str,
        found: &'static str,
    },

    #[error("{type_name}: missing `tag` discriminator")]
    MissingTag { type_name: &'static str },

    #[error("{type_name}: `tag` must be a string, found {found}")]
    InvalidTag {
        type_name: &'static str,
        found: &'static str,
    },

    #[error("{type_name}: unknown tag `{tag}`")]
    UnknownTag { type_name: &'static str, tag: String },

    #[error("{type_name}: missing field `{field}`")]
    MissingField {
        type_name: &'static str,
        field: String,
    },

    #[error("{type_name}: {message}")]
    Malformed {
        type_name: &'static str,
        message: String,
    },

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for decoding
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Errors raised by statement renderers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// The statement has no form in the renderer's surface syntax
    #[error("{renderer} cannot render {statement} statements")]
    Unsupported {
        renderer: &'static str,
        statement: &'static str,
    },
}

/// Errors raised while loading render configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid prefix declaration `{0}` (expected prefix=namespace)")]
    InvalidPrefix(String),
}

/// Umbrella error for callers that drive the whole pipeline.
#[derive(Error, Debug)]
pub enum QueryIrError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Result type for pipeline operations
pub type QueryIrResult<T> = Result<T, QueryIrError>;
