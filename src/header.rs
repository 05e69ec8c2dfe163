//! Header cell parsing.
//!
//! A header cell follows the grammar `name[:type[:crsId]]`. The name is
//! trimmed and stripped of surrounding double quotes; the type token is
//! matched case-sensitively against the recognized scalar and geometry
//! names; anything after the second `:` is carried verbatim as a spatial
//! reference identifier (e.g. `EPSG:4326` — the CRS id itself may contain a
//! colon, so the split is limited to three parts).

use crate::error::SchemaError;
use crate::schema::FieldType;

/// One parsed header cell. Consumed by the schema builder and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub declared: Option<FieldType>,
    pub crs: Option<String>,
}

pub fn parse_descriptor(cell: &str) -> Result<FieldDescriptor, SchemaError> {
    let mut parts = cell.splitn(3, ':');
    let name = parts
        .next()
        .unwrap_or_default()
        .trim()
        .trim_matches('"')
        .to_string();
    if name.is_empty() {
        return Err(SchemaError::EmptyFieldName {
            cell: cell.to_string(),
        });
    }

    let declared = match parts.next().map(str::trim) {
        None | Some("") => None,
        Some(token) => Some(FieldType::from_token(token).ok_or_else(|| {
            SchemaError::UnknownType {
                cell: cell.to_string(),
                token: token.to_string(),
            }
        })?),
    };

    let crs = parts
        .next()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string);

    Ok(FieldDescriptor {
        name,
        declared,
        crs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{GeometryKind, ScalarType};

    #[test]
    fn bare_name_has_no_declared_type() {
        let descriptor = parse_descriptor("city").unwrap();
        assert_eq!(descriptor.name, "city");
        assert_eq!(descriptor.declared, None);
        assert_eq!(descriptor.crs, None);
    }

    #[test]
    fn quoted_names_are_stripped() {
        let descriptor = parse_descriptor("\"population\":int").unwrap();
        assert_eq!(descriptor.name, "population");
        assert_eq!(
            descriptor.declared,
            Some(FieldType::Scalar(ScalarType::Integer))
        );
    }

    #[test]
    fn geometry_type_with_crs() {
        let descriptor = parse_descriptor("geom:Point:EPSG:4326").unwrap();
        assert_eq!(
            descriptor.declared,
            Some(FieldType::Geometry(GeometryKind::Point))
        );
        assert_eq!(descriptor.crs.as_deref(), Some("EPSG:4326"));
    }

    #[test]
    fn type_tokens_are_case_sensitive() {
        assert!(parse_descriptor("geom:point").is_err());
        assert!(parse_descriptor("n:INT").is_err());
        let err = parse_descriptor("n:Bogus").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType { token, .. } if token == "Bogus"));
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(matches!(
            parse_descriptor("  :int"),
            Err(SchemaError::EmptyFieldName { .. })
        ));
    }

    #[test]
    fn both_integer_spellings_resolve() {
        for cell in ["n:int", "n:Integer"] {
            let descriptor = parse_descriptor(cell).unwrap();
            assert_eq!(
                descriptor.declared,
                Some(FieldType::Scalar(ScalarType::Integer))
            );
        }
    }
}
