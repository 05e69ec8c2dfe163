//! Geometry payload decoding.
//!
//! One-column geometry cells arrive as WKT, hex-encoded WKB, GeoJSON, or an
//! XML fragment in one of three dialects (KML, GML2, GML3). Two-column modes
//! go through [`parse_coordinate`], which accepts plain decimals and
//! degrees-minutes-seconds expressions with a hemisphere letter.
//!
//! WKT, WKB, and GeoJSON decoding delegates to `geozero`; the XML dialects
//! are close enough to each other that a single pull-parse over `quick-xml`
//! events covers all three. XML fragments are decoded for `Point`,
//! `LineString`, and `Polygon` roots; other root elements are rejected.

use std::fmt;
use std::sync::OnceLock;

use geo_types::{Geometry, LineString, Point, Polygon};
use geozero::ToGeo;
use log::trace;
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;

use crate::error::GeometryError;

/// The six single-column geometry encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodedFormat {
    Wkt,
    Wkb,
    GeoJson,
    Kml,
    Gml2,
    Gml3,
}

impl fmt::Display for EncodedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EncodedFormat::Wkt => "WKT",
            EncodedFormat::Wkb => "WKB",
            EncodedFormat::GeoJson => "GeoJSON",
            EncodedFormat::Kml => "KML",
            EncodedFormat::Gml2 => "GML2",
            EncodedFormat::Gml3 => "GML3",
        };
        write!(f, "{label}")
    }
}

/// Decode one non-empty geometry cell in the given encoding.
pub fn decode(cell: &str, format: EncodedFormat) -> Result<Geometry<f64>, GeometryError> {
    trace!("Decoding {format} geometry payload ({} bytes)", cell.len());
    match format {
        EncodedFormat::Wkt => geozero::wkt::WktStr(cell)
            .to_geo()
            .map_err(|err| GeometryError::Wkt(err.to_string())),
        EncodedFormat::Wkb => {
            let bytes = hex::decode(cell.trim())?;
            geozero::wkb::Wkb(bytes)
                .to_geo()
                .map_err(|err| GeometryError::Wkb(err.to_string()))
        }
        EncodedFormat::GeoJson => geozero::geojson::GeoJson(cell)
            .to_geo()
            .map_err(|err| GeometryError::GeoJson(err.to_string())),
        EncodedFormat::Kml => decode_xml(cell, XmlDialect::Kml),
        EncodedFormat::Gml2 => decode_xml(cell, XmlDialect::Gml2),
        EncodedFormat::Gml3 => decode_xml(cell, XmlDialect::Gml3),
    }
}

/// Parse a two-column coordinate cell: plain decimal first, DMS fallback.
pub fn parse_coordinate(raw: &str) -> Result<f64, GeometryError> {
    let trimmed = raw.trim();
    if let Ok(value) = trimmed.parse::<f64>() {
        return Ok(value);
    }
    parse_dms(trimmed).ok_or_else(|| GeometryError::Coordinate(raw.to_string()))
}

fn dms_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"^(-?\d+(?:\.\d+)?)\s*°?\s*(\d+(?:\.\d+)?)\s*'?\s*(\d+(?:\.\d+)?)\s*"?\s*([NSEW])$"#)
            .expect("DMS pattern compiles")
    })
}

/// `D° M' S" H` with H in {N,S,E,W}. The magnitude is negated when the
/// hemisphere is S or W, or when the degree term itself carries a sign.
fn parse_dms(value: &str) -> Option<f64> {
    let caps = dms_pattern().captures(value)?;
    let degrees: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    let magnitude = degrees.abs() + minutes / 60.0 + seconds / 3600.0;
    let southern = matches!(&caps[4], "S" | "W");
    if southern || degrees.is_sign_negative() {
        Some(-magnitude)
    } else {
        Some(magnitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum XmlDialect {
    Kml,
    Gml2,
    Gml3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum XmlRoot {
    Point,
    LineString,
    Polygon,
}

#[derive(Debug, Clone, Copy)]
enum CoordLayout {
    /// Whitespace-separated `x,y[,z]` tuples (KML and GML2 `coordinates`).
    Tuples,
    /// A single `x y [z]` position (GML3 `pos`).
    Pos,
    /// A flat, even-length ordinate list (GML3 `posList`).
    PosList,
}

/// Pull-parse an XML geometry fragment.
///
/// Each coordinate-bearing element yields one block of coordinates; blocks
/// map onto the root element (a point's single position, a line's vertices,
/// a polygon's exterior ring followed by interior rings).
fn decode_xml(fragment: &str, dialect: XmlDialect) -> Result<Geometry<f64>, GeometryError> {
    let mut reader = Reader::from_str(fragment);
    reader.config_mut().trim_text(true);

    let mut root: Option<XmlRoot> = None;
    let mut blocks: Vec<Vec<(f64, f64)>> = Vec::new();
    let mut capture: Option<CoordLayout> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                let local = element.local_name();
                let local = local.as_ref();
                if root.is_none() {
                    root = Some(match local {
                        b"Point" => XmlRoot::Point,
                        b"LineString" => XmlRoot::LineString,
                        b"Polygon" => XmlRoot::Polygon,
                        other => {
                            return Err(GeometryError::UnsupportedXmlElement(
                                String::from_utf8_lossy(other).into_owned(),
                            ));
                        }
                    });
                    continue;
                }
                capture = match (dialect, local) {
                    (XmlDialect::Kml | XmlDialect::Gml2, b"coordinates") => {
                        Some(CoordLayout::Tuples)
                    }
                    (XmlDialect::Gml3, b"pos") => Some(CoordLayout::Pos),
                    (XmlDialect::Gml3, b"posList") => Some(CoordLayout::PosList),
                    _ => capture,
                };
            }
            Ok(Event::Text(text)) => {
                if let Some(layout) = capture {
                    let raw = text
                        .unescape()
                        .map_err(|err| GeometryError::Xml(err.to_string()))?;
                    blocks.push(parse_coordinate_block(&raw, layout)?);
                }
            }
            Ok(Event::End(element)) => {
                if matches!(
                    element.local_name().as_ref(),
                    b"coordinates" | b"pos" | b"posList"
                ) {
                    capture = None;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => return Err(GeometryError::Xml(err.to_string())),
        }
    }

    assemble_xml_geometry(root, blocks)
}

fn parse_coordinate_block(
    text: &str,
    layout: CoordLayout,
) -> Result<Vec<(f64, f64)>, GeometryError> {
    let ordinate = |token: &str| {
        token
            .parse::<f64>()
            .map_err(|_| GeometryError::Xml(format!("invalid ordinate '{token}'")))
    };
    match layout {
        CoordLayout::Tuples => text
            .split_whitespace()
            .map(|tuple| {
                let mut parts = tuple.split(',');
                let x = parts
                    .next()
                    .ok_or_else(|| GeometryError::Xml(format!("malformed tuple '{tuple}'")))?;
                let y = parts
                    .next()
                    .ok_or_else(|| GeometryError::Xml(format!("malformed tuple '{tuple}'")))?;
                Ok((ordinate(x)?, ordinate(y)?))
            })
            .collect(),
        CoordLayout::Pos => {
            let mut parts = text.split_whitespace();
            let x = parts
                .next()
                .ok_or_else(|| GeometryError::Xml("empty pos element".to_string()))?;
            let y = parts
                .next()
                .ok_or_else(|| GeometryError::Xml("pos element needs two ordinates".to_string()))?;
            Ok(vec![(ordinate(x)?, ordinate(y)?)])
        }
        CoordLayout::PosList => {
            let ordinates = text
                .split_whitespace()
                .map(ordinate)
                .collect::<Result<Vec<_>, _>>()?;
            if ordinates.is_empty() || ordinates.len() % 2 != 0 {
                return Err(GeometryError::Xml(
                    "posList has an odd number of ordinates".to_string(),
                ));
            }
            Ok(ordinates.chunks(2).map(|pair| (pair[0], pair[1])).collect())
        }
    }
}

fn assemble_xml_geometry(
    root: Option<XmlRoot>,
    blocks: Vec<Vec<(f64, f64)>>,
) -> Result<Geometry<f64>, GeometryError> {
    let root = root.ok_or_else(|| GeometryError::Xml("no geometry element found".to_string()))?;
    let first_coord = blocks.first().and_then(|block| block.first()).copied();
    match root {
        XmlRoot::Point => {
            let (x, y) = first_coord
                .ok_or_else(|| GeometryError::Xml("point has no coordinates".to_string()))?;
            Ok(Point::new(x, y).into())
        }
        XmlRoot::LineString => {
            let coords: Vec<(f64, f64)> = blocks.into_iter().flatten().collect();
            if coords.len() < 2 {
                return Err(GeometryError::Xml(
                    "line string needs at least two coordinates".to_string(),
                ));
            }
            Ok(LineString::from(coords).into())
        }
        XmlRoot::Polygon => {
            let mut rings = blocks.into_iter().map(LineString::from);
            let exterior = rings
                .next()
                .ok_or_else(|| GeometryError::Xml("polygon has no rings".to_string()))?;
            Ok(Polygon::new(exterior, rings.collect()).into())
        }
    }
}
