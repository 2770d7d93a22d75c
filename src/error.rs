//! Error types for loading, resolving and querying element data

use std::path::PathBuf;

use thiserror::Error;

/// Failures of quantity arithmetic, conversion and unit parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QuantityError {
    #[error("cannot convert from '{from}' ({from_dim}) to '{to}' ({to_dim})")]
    Dimensionality {
        from: String,
        from_dim: String,
        to: String,
        to_dim: String,
    },

    #[error("unknown unit '{0}'")]
    UnknownUnit(String),

    #[error("malformed unit expression '{expr}': {reason}")]
    BadUnitExpr { expr: String, reason: String },

    #[error("'{unit}' is an absolute temperature and cannot be used in {operation}")]
    OffsetUnit {
        unit: String,
        operation: &'static str,
    },
}

/// Why a single raw field could not be read.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("missing required field '{0}'")]
    Missing(String),

    #[error("field '{field}' should be {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },

    #[error("unknown state '{0}'")]
    UnknownState(String),

    #[error("record is not a field mapping")]
    NotAMapping,

    #[error(transparent)]
    Quantity(#[from] QuantityError),
}

/// Failures while turning definition documents into elements.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("definition document did not contain the expected \"elements\" list")]
    MissingCollection,

    #[error("bad definition for {element}: {source}")]
    BadDefinition {
        element: String,
        #[source]
        source: FieldError,
    },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Failures of the one-time resolution pass run by `Elements::new`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("{element} transitions to unknown element '{target}'")]
    UnresolvedReference { element: String, target: String },

    #[error("element '{0}' is defined more than once")]
    DuplicateElement(String),
}

/// Failures of collection lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("no element named '{0}'")]
    UnknownElement(String),

    #[error("index {index} is out of range for {len} elements")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot index elements by {0}")]
    UnsupportedKey(&'static str),

    #[error("cannot search elements with {0}")]
    UnsupportedNeedle(&'static str),
}

/// Failures while evaluating an attribute or predicate against an element.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    #[error("{type_name} has no field '{field}'")]
    NoSuchField {
        type_name: &'static str,
        field: String,
    },

    #[error("'{path}' has no value")]
    MissingValue { path: String },

    #[error("{type_name} is not callable")]
    NotCallable { type_name: &'static str },

    #[error("cannot compare {lhs} with {rhs}")]
    Incomparable {
        lhs: &'static str,
        rhs: &'static str,
    },

    #[error("bad arguments to {method}(): {reason}")]
    BadArguments { method: String, reason: String },

    #[error("element #{0} does not belong to this collection")]
    DanglingElement(usize),

    #[error(transparent)]
    Quantity(#[from] QuantityError),
}
