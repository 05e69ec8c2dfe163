//! Error taxonomy for schema resolution and row decoding.
//!
//! Schema problems abort a read before any data row is touched; row problems
//! carry the 1-based data row index (header excluded) plus the field name so
//! a failure points at the offending cell.

use std::path::PathBuf;

use thiserror::Error;

use crate::schema::ScalarType;

/// Root error for a read operation.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Row(#[from] RowDecodeError),

    #[error("failed to read delimited input: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Header or configuration problems. Always fatal, never partial.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("input is empty; the first line must be a header")]
    MissingHeader,

    #[error("header cell '{cell}' has an empty field name")]
    EmptyFieldName { cell: String },

    #[error("unrecognized type '{token}' in header cell '{cell}'")]
    UnknownType { cell: String, token: String },

    #[error("{mode} mode requires both coordinate column names to be configured")]
    MissingCoordinateColumns { mode: &'static str },

    #[error("coordinate column '{name}' not found in header")]
    UnknownCoordinateColumn { name: String },

    #[error("header declares more than one geometry column ('{first}' and '{second}')")]
    MultipleGeometryColumns { first: String, second: String },

    #[error("header already defines field '{name}', which is reserved for the synthesized geometry column")]
    ReservedFieldName { name: String },
}

/// A cell that cannot be coerced to its field's resolved type.
///
/// Fails the whole row, and a failed row aborts the whole read; partial
/// records are never produced.
#[derive(Debug, Error)]
pub enum RowDecodeError {
    #[error("row {row}: cannot parse '{value}' as {ty} for field '{field}'")]
    Scalar {
        row: usize,
        field: String,
        value: String,
        ty: ScalarType,
    },

    #[error("row {row}: field '{field}': {source}")]
    Geometry {
        row: usize,
        field: String,
        #[source]
        source: GeometryError,
    },
}

/// Failure to decode a geometry payload in the configured encoding.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("invalid WKT: {0}")]
    Wkt(String),

    #[error("invalid WKB hex payload: {0}")]
    WkbHex(#[from] hex::FromHexError),

    #[error("invalid WKB: {0}")]
    Wkb(String),

    #[error("invalid GeoJSON geometry: {0}")]
    GeoJson(String),

    #[error("invalid XML geometry fragment: {0}")]
    Xml(String),

    #[error("unsupported XML geometry element '{0}'")]
    UnsupportedXmlElement(String),

    #[error("coordinate '{0}' is neither a decimal number nor a DMS expression")]
    Coordinate(String),
}
