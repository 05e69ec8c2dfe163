//! Typed cell values and scalar coercion.

use std::fmt;

use geo_types::Geometry;
use geozero::ToWkt;
use thiserror::Error;

use crate::schema::ScalarType;

/// One decoded cell. Absent cells are represented as `None` outside this
/// enum, so every variant holds a concrete value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Integer(i64),
    Double(f64),
    Float(f32),
    Geometry(Geometry<f64>),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Double(d) => d.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Geometry(g) => g.to_wkt().unwrap_or_else(|_| "<geometry>".to_string()),
        }
    }

}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

#[derive(Debug, Error)]
#[error("cannot parse '{value}' as {ty}")]
pub struct ScalarParseError {
    pub value: String,
    pub ty: ScalarType,
}

/// Coerce raw cell text to a scalar value. Empty text is absence, never an
/// error, regardless of the declared type.
pub fn parse_scalar(raw: &str, ty: ScalarType) -> Result<Option<Value>, ScalarParseError> {
    if raw.is_empty() {
        return Ok(None);
    }
    let fail = || ScalarParseError {
        value: raw.to_string(),
        ty,
    };
    let parsed = match ty {
        ScalarType::String => Value::String(raw.to_string()),
        ScalarType::Integer => Value::Integer(raw.trim().parse().map_err(|_| fail())?),
        ScalarType::Double => Value::Double(raw.trim().parse().map_err(|_| fail())?),
        ScalarType::Float => Value::Float(raw.trim().parse().map_err(|_| fail())?),
    };
    Ok(Some(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_absent_for_every_type() {
        for ty in [
            ScalarType::String,
            ScalarType::Integer,
            ScalarType::Double,
            ScalarType::Float,
        ] {
            assert!(parse_scalar("", ty).expect("empty is never an error").is_none());
        }
    }

    #[test]
    fn numeric_coercion_trims_whitespace() {
        assert_eq!(
            parse_scalar(" 42 ", ScalarType::Integer).unwrap(),
            Some(Value::Integer(42))
        );
        assert_eq!(
            parse_scalar("1.5", ScalarType::Double).unwrap(),
            Some(Value::Double(1.5))
        );
    }

    #[test]
    fn non_numeric_text_fails_for_numeric_types() {
        let err = parse_scalar("abc", ScalarType::Double).unwrap_err();
        assert_eq!(err.value, "abc");
    }
}
