//! Field types, schema construction, and column layout.
//!
//! The schema builder runs exactly once per read, before any data row, and
//! turns parsed header descriptors plus the configured geometry mode into an
//! ordered [`Schema`] and a [`ColumnLayout`] telling the row decoder what to
//! do with each header position. Every resolved field carries an explicit
//! scalar-vs-geometry tag; the decoder dispatches by matching, never by
//! runtime inspection.

use std::fmt;

use log::debug;

use crate::error::SchemaError;
use crate::geometry::EncodedFormat;
use crate::header::FieldDescriptor;
use crate::reader::{GeometryMode, ReaderOptions};

/// Name of the field appended in two-column modes.
pub const SYNTHESIZED_GEOMETRY_NAME: &str = "geom";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarType {
    String,
    Integer,
    Double,
    Float,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            ScalarType::String => "String",
            ScalarType::Integer => "int",
            ScalarType::Double => "double",
            ScalarType::Float => "float",
        };
        write!(f, "{token}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    Geometry,
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            GeometryKind::Point => "Point",
            GeometryKind::LineString => "LineString",
            GeometryKind::Polygon => "Polygon",
            GeometryKind::MultiPoint => "MultiPoint",
            GeometryKind::MultiLineString => "MultiLineString",
            GeometryKind::MultiPolygon => "MultiPolygon",
            GeometryKind::Geometry => "Geometry",
        };
        write!(f, "{token}")
    }
}

/// The resolved type of a schema field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Scalar(ScalarType),
    Geometry(GeometryKind),
}

impl FieldType {
    /// Case-sensitive lookup of a declared type token.
    pub fn from_token(token: &str) -> Option<FieldType> {
        let ty = match token {
            "String" => FieldType::Scalar(ScalarType::String),
            "int" | "Integer" => FieldType::Scalar(ScalarType::Integer),
            "double" | "Double" => FieldType::Scalar(ScalarType::Double),
            "float" | "Float" => FieldType::Scalar(ScalarType::Float),
            "Point" => FieldType::Geometry(GeometryKind::Point),
            "LineString" => FieldType::Geometry(GeometryKind::LineString),
            "Polygon" => FieldType::Geometry(GeometryKind::Polygon),
            "MultiPoint" => FieldType::Geometry(GeometryKind::MultiPoint),
            "MultiLineString" => FieldType::Geometry(GeometryKind::MultiLineString),
            "MultiPolygon" => FieldType::Geometry(GeometryKind::MultiPolygon),
            "Geometry" => FieldType::Geometry(GeometryKind::Geometry),
            _ => return None,
        };
        Some(ty)
    }

    pub fn is_geometry(&self) -> bool {
        matches!(self, FieldType::Geometry(_))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(ty) => write!(f, "{ty}"),
            FieldType::Geometry(kind) => write!(f, "{kind}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
}

/// Ordered field list plus the dataset-level coordinate reference system.
///
/// Field names are unique; when header cells repeat a name, the last
/// declaration wins for the type while the first occurrence keeps its
/// position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub fields: Vec<Field>,
    pub crs: Option<String>,
}

impl Schema {
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn geometry_field(&self) -> Option<&Field> {
        self.fields.iter().find(|field| field.ty.is_geometry())
    }
}

/// What the row decoder does with the cell at each header position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColumnRole {
    Scalar { field: usize, ty: ScalarType },
    Geometry { field: usize, format: EncodedFormat },
}

/// Two-column geometry synthesis: header positions of the source cells and
/// the index of the appended point field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PairPlan {
    pub x: usize,
    pub y: usize,
    pub field: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct ColumnLayout {
    pub columns: Vec<ColumnRole>,
    pub pair: Option<PairPlan>,
}

pub(crate) fn build_schema(
    descriptors: &[FieldDescriptor],
    options: &ReaderOptions,
) -> Result<(Schema, ColumnLayout), SchemaError> {
    match options.geometry_mode.encoded_format() {
        Some(format) => build_one_column(descriptors, options, format),
        None => build_two_column(descriptors, options),
    }
}

fn build_one_column(
    descriptors: &[FieldDescriptor],
    options: &ReaderOptions,
    format: EncodedFormat,
) -> Result<(Schema, ColumnLayout), SchemaError> {
    let geometry_pos = designate_geometry(descriptors, &options.geometry_column)?;

    let mut fields: Vec<Field> = Vec::new();
    let mut columns: Vec<ColumnRole> = Vec::with_capacity(descriptors.len());
    let mut crs = None;

    for (pos, descriptor) in descriptors.iter().enumerate() {
        if Some(pos) == geometry_pos {
            let kind = match descriptor.declared {
                Some(FieldType::Geometry(kind)) => kind,
                _ => GeometryKind::Point,
            };
            crs = descriptor.crs.clone();
            let field = upsert_field(&mut fields, &descriptor.name, FieldType::Geometry(kind));
            columns.push(ColumnRole::Geometry { field, format });
        } else {
            let scalar = match descriptor.declared {
                Some(FieldType::Scalar(scalar)) => scalar,
                _ => ScalarType::String,
            };
            let field = upsert_field(&mut fields, &descriptor.name, FieldType::Scalar(scalar));
            columns.push(ColumnRole::Scalar { field, ty: scalar });
        }
    }

    debug!(
        "Resolved one-column {format} schema: {} field(s), geometry {}",
        fields.len(),
        geometry_pos.map_or("absent".to_string(), |pos| {
            format!("at column {}", pos + 1)
        })
    );
    Ok((Schema { fields, crs }, ColumnLayout {
        columns,
        pair: None,
    }))
}

/// Pick the geometry source column: an explicit `geometry_column` name match
/// wins (ignoring cells that declare a scalar type), otherwise the single
/// descriptor with a declared geometry type. Geometry declarations outside
/// the designated column are rejected; a header with neither yields a purely
/// scalar schema.
fn designate_geometry(
    descriptors: &[FieldDescriptor],
    geometry_column: &str,
) -> Result<Option<usize>, SchemaError> {
    let named = descriptors.iter().rposition(|descriptor| {
        descriptor.name == geometry_column
            && !matches!(descriptor.declared, Some(FieldType::Scalar(_)))
    });
    let declared: Vec<usize> = descriptors
        .iter()
        .enumerate()
        .filter(|(_, descriptor)| matches!(descriptor.declared, Some(FieldType::Geometry(_))))
        .map(|(pos, _)| pos)
        .collect();

    let designated = match named {
        Some(pos) => Some(pos),
        None => match declared.as_slice() {
            [] => None,
            [single] => Some(*single),
            [first, second, ..] => {
                return Err(SchemaError::MultipleGeometryColumns {
                    first: descriptors[*first].name.clone(),
                    second: descriptors[*second].name.clone(),
                });
            }
        },
    };

    if let Some(pos) = designated
        && let Some(stray) = declared.iter().find(|declared_pos| **declared_pos != pos)
    {
        return Err(SchemaError::MultipleGeometryColumns {
            first: descriptors[pos].name.clone(),
            second: descriptors[*stray].name.clone(),
        });
    }
    Ok(designated)
}

fn build_two_column(
    descriptors: &[FieldDescriptor],
    options: &ReaderOptions,
) -> Result<(Schema, ColumnLayout), SchemaError> {
    let mode_label = match options.geometry_mode {
        GeometryMode::Xy => "XY",
        GeometryMode::LatLon => "lon/lat",
        // encoded_format() returned None, so only the pair modes reach here
        _ => "two-column",
    };
    let (x_name, y_name) = match options.geometry_mode {
        GeometryMode::Xy => (options.x_column.as_deref(), options.y_column.as_deref()),
        _ => (options.lon_column.as_deref(), options.lat_column.as_deref()),
    };
    let (Some(x_name), Some(y_name)) = (x_name, y_name) else {
        return Err(SchemaError::MissingCoordinateColumns { mode: mode_label });
    };

    if let Some(declared) = descriptors
        .iter()
        .find(|descriptor| matches!(descriptor.declared, Some(FieldType::Geometry(_))))
    {
        return Err(SchemaError::MultipleGeometryColumns {
            first: declared.name.clone(),
            second: SYNTHESIZED_GEOMETRY_NAME.to_string(),
        });
    }
    if descriptors
        .iter()
        .any(|descriptor| descriptor.name == SYNTHESIZED_GEOMETRY_NAME)
    {
        return Err(SchemaError::ReservedFieldName {
            name: SYNTHESIZED_GEOMETRY_NAME.to_string(),
        });
    }

    let position_of = |name: &str| {
        descriptors
            .iter()
            .rposition(|descriptor| descriptor.name == name)
            .ok_or_else(|| SchemaError::UnknownCoordinateColumn {
                name: name.to_string(),
            })
    };
    let x_pos = position_of(x_name)?;
    let y_pos = position_of(y_name)?;

    let mut fields: Vec<Field> = Vec::new();
    let mut columns: Vec<ColumnRole> = Vec::with_capacity(descriptors.len());
    for descriptor in descriptors {
        let scalar = match descriptor.declared {
            Some(FieldType::Scalar(scalar)) => scalar,
            _ => ScalarType::String,
        };
        let field = upsert_field(&mut fields, &descriptor.name, FieldType::Scalar(scalar));
        columns.push(ColumnRole::Scalar { field, ty: scalar });
    }

    // first source column wins when both declare a reference system
    let crs = descriptors[x_pos]
        .crs
        .clone()
        .or_else(|| descriptors[y_pos].crs.clone());

    fields.push(Field {
        name: SYNTHESIZED_GEOMETRY_NAME.to_string(),
        ty: FieldType::Geometry(GeometryKind::Point),
    });
    let pair = PairPlan {
        x: x_pos,
        y: y_pos,
        field: fields.len() - 1,
    };

    debug!(
        "Resolved {mode_label} schema: {} field(s), point synthesized from columns {} and {}",
        fields.len(),
        x_pos + 1,
        y_pos + 1
    );
    Ok((Schema { fields, crs }, ColumnLayout {
        columns,
        pair: Some(pair),
    }))
}

/// Insert a field, or update the type of an existing one (last declaration
/// wins, first occurrence keeps its position). Returns the field index.
fn upsert_field(fields: &mut Vec<Field>, name: &str, ty: FieldType) -> usize {
    match fields.iter().position(|field| field.name == name) {
        Some(existing) => {
            fields[existing].ty = ty;
            existing
        }
        None => {
            fields.push(Field {
                name: name.to_string(),
                ty,
            });
            fields.len() - 1
        }
    }
}
