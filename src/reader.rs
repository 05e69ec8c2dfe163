//! The delimited-record reader: configuration, row decoding, and dataset
//! assembly.
//!
//! A [`CsvReader`] is configured once (separator, geometry mode, column
//! names) and then reads whole inputs: the first line is always the header,
//! the schema is resolved before any data row, and the result is the full
//! `(Schema, records)` pair. Reads are stateless with respect to each other;
//! the same reader can be reused across inputs.

use std::fmt;
use std::fs;
use std::path::Path;

use clap::ValueEnum;
use csv::{ReaderBuilder, StringRecord};
use geo_types::Point;
use log::debug;

use crate::error::{ReadError, RowDecodeError, SchemaError};
use crate::geometry::{self, EncodedFormat};
use crate::header::parse_descriptor;
use crate::schema::{ColumnLayout, ColumnRole, Schema, build_schema};
use crate::value::{Value, parse_scalar};

/// How geometry is acquired for a row. Fixed for the whole read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum GeometryMode {
    /// One column holding well-known text (the default).
    #[default]
    #[value(name = "wkt")]
    Wkt,
    /// One column holding hex-encoded well-known binary.
    #[value(name = "wkb")]
    Wkb,
    /// One column holding a GeoJSON geometry object.
    #[value(name = "geojson")]
    GeoJson,
    /// One column holding a KML fragment.
    #[value(name = "kml")]
    Kml,
    /// One column holding a GML2 fragment.
    #[value(name = "gml2")]
    Gml2,
    /// One column holding a GML3 fragment.
    #[value(name = "gml3")]
    Gml3,
    /// Two columns combined into a point, x first.
    #[value(name = "xy")]
    Xy,
    /// Two labeled lon/lat columns combined into a point.
    #[value(name = "latlon")]
    LatLon,
}

impl GeometryMode {
    /// The payload encoding for one-column modes; `None` for the pair modes.
    pub(crate) fn encoded_format(self) -> Option<EncodedFormat> {
        match self {
            GeometryMode::Wkt => Some(EncodedFormat::Wkt),
            GeometryMode::Wkb => Some(EncodedFormat::Wkb),
            GeometryMode::GeoJson => Some(EncodedFormat::GeoJson),
            GeometryMode::Kml => Some(EncodedFormat::Kml),
            GeometryMode::Gml2 => Some(EncodedFormat::Gml2),
            GeometryMode::Gml3 => Some(EncodedFormat::Gml3),
            GeometryMode::Xy | GeometryMode::LatLon => None,
        }
    }
}

impl fmt::Display for GeometryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            GeometryMode::Wkt => "wkt",
            GeometryMode::Wkb => "wkb",
            GeometryMode::GeoJson => "geojson",
            GeometryMode::Kml => "kml",
            GeometryMode::Gml2 => "gml2",
            GeometryMode::Gml3 => "gml3",
            GeometryMode::Xy => "xy",
            GeometryMode::LatLon => "latlon",
        };
        write!(f, "{token}")
    }
}

/// Construction-time configuration for a reader.
#[derive(Debug, Clone)]
pub struct ReaderOptions {
    /// Cell delimiter; comma, pipe, and tab are all supported.
    pub separator: u8,
    pub geometry_mode: GeometryMode,
    /// Names the geometry column for one-column modes when the header does
    /// not declare one.
    pub geometry_column: String,
    pub x_column: Option<String>,
    pub y_column: Option<String>,
    pub lon_column: Option<String>,
    pub lat_column: Option<String>,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        ReaderOptions {
            separator: b',',
            geometry_mode: GeometryMode::default(),
            geometry_column: "geom".to_string(),
            x_column: None,
            y_column: None,
            lon_column: None,
            lat_column: None,
        }
    }
}

/// One decoded row, positionally aligned with the schema's fields.
///
/// Absent cells (empty text, or an empty geometry payload) are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<Option<Value>>,
}

impl Record {
    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index).and_then(Option::as_ref)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// The result of a read: a resolved schema plus every decoded record.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub schema: Schema,
    pub records: Vec<Record>,
}

impl Dataset {
    /// Look up a record value by field name.
    pub fn value(&self, row: usize, field: &str) -> Option<&Value> {
        let index = self.schema.field_index(field)?;
        self.records.get(row)?.get(index)
    }
}

pub struct CsvReader {
    options: ReaderOptions,
}

impl CsvReader {
    pub fn new(options: ReaderOptions) -> Self {
        CsvReader { options }
    }

    /// Read a full input text into a dataset.
    ///
    /// The first line is the header; whitespace-only lines are skipped; a
    /// line of all-empty cells still yields a record of absent values. Any
    /// schema or row failure aborts the whole read with no partial result.
    pub fn read(&self, text: &str) -> Result<Dataset, ReadError> {
        let csv_reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .delimiter(self.options.separator)
            .from_reader(text.as_bytes());
        let mut rows = csv_reader.into_records();

        let header = match rows.next() {
            Some(row) => row?,
            None => return Err(SchemaError::MissingHeader.into()),
        };
        let descriptors = header
            .iter()
            .map(parse_descriptor)
            .collect::<Result<Vec<_>, _>>()?;
        let (schema, layout) = build_schema(&descriptors, &self.options)?;

        let mut records = Vec::new();
        for row in rows {
            let row = row?;
            if is_blank(&row) {
                continue;
            }
            let record = decode_row(&row, &schema, &layout, records.len() + 1)?;
            records.push(record);
        }
        debug!(
            "Read {} record(s) across {} field(s)",
            records.len(),
            schema.fields.len()
        );
        Ok(Dataset { schema, records })
    }

    pub fn read_path(&self, path: &Path) -> Result<Dataset, ReadError> {
        let text = fs::read_to_string(path).map_err(|source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.read(&text)
    }
}

/// Whitespace-only lines are not rows. A line with more than one cell is
/// never blank, even when every cell is empty; it decodes to a record of
/// absent values.
fn is_blank(row: &StringRecord) -> bool {
    row.len() <= 1 && row.iter().all(|cell| cell.trim().is_empty())
}

fn decode_row(
    row: &StringRecord,
    schema: &Schema,
    layout: &ColumnLayout,
    row_index: usize,
) -> Result<Record, RowDecodeError> {
    let mut values: Vec<Option<Value>> = vec![None; schema.fields.len()];

    for (pos, role) in layout.columns.iter().enumerate() {
        // missing trailing cells are blank values, never an error
        let cell = row.get(pos).unwrap_or("");
        match *role {
            ColumnRole::Scalar { field, ty } => {
                values[field] =
                    parse_scalar(cell, ty).map_err(|source| RowDecodeError::Scalar {
                        row: row_index,
                        field: schema.fields[field].name.clone(),
                        value: source.value,
                        ty,
                    })?;
            }
            ColumnRole::Geometry { field, format } => {
                let payload = cell.trim();
                values[field] = if payload.is_empty() {
                    None
                } else {
                    let geom = geometry::decode(payload, format).map_err(|source| {
                        RowDecodeError::Geometry {
                            row: row_index,
                            field: schema.fields[field].name.clone(),
                            source,
                        }
                    })?;
                    Some(Value::Geometry(geom))
                };
            }
        }
    }

    if let Some(pair) = layout.pair {
        let x_cell = row.get(pair.x).unwrap_or("").trim();
        let y_cell = row.get(pair.y).unwrap_or("").trim();
        values[pair.field] = if x_cell.is_empty() || y_cell.is_empty() {
            None
        } else {
            let coordinate = |pos: usize, cell: &str| {
                geometry::parse_coordinate(cell).map_err(|source| RowDecodeError::Geometry {
                    row: row_index,
                    field: column_name(schema, layout, pos),
                    source,
                })
            };
            let x = coordinate(pair.x, x_cell)?;
            let y = coordinate(pair.y, y_cell)?;
            Some(Value::Geometry(Point::new(x, y).into()))
        };
    }

    Ok(Record { values })
}

fn column_name(schema: &Schema, layout: &ColumnLayout, pos: usize) -> String {
    let field = match layout.columns[pos] {
        ColumnRole::Scalar { field, .. } | ColumnRole::Geometry { field, .. } => field,
    };
    schema.fields[field].name.clone()
}
