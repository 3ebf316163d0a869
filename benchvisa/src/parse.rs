//! Coercing raw instrument responses into typed values.

use std::convert::TryFrom;

use crate::{Error, ResponseShape, Result, Value};

/// Strip trailing line endings.
pub fn trim_line_ending(raw: &str) -> &str {
    raw.trim_end_matches(&['\r', '\n'][..])
}

pub fn parse_real(raw: &str) -> Result<f64> {
    let text = trim_line_ending(raw);
    text.trim()
        .parse()
        .map_err(|_| Error::command(format!("Cannot parse `{}` as a real number.", text)))
}

pub fn parse_integer(raw: &str) -> Result<i64> {
    let text = trim_line_ending(raw);
    let trimmed = text.trim();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    trimmed
        .parse()
        .map_err(|_| Error::command(format!("Cannot parse `{}` as an integer.", text)))
}

/// Instruments answer `1`/`0` or `ON`/`OFF`, accept both.
pub fn parse_boolean(raw: &str) -> bool {
    let text = trim_line_ending(raw);
    text.contains('1') || text.contains("ON")
}

pub fn parse_response(shape: ResponseShape, raw: &str) -> Result<Value> {
    let ret = match shape {
        ResponseShape::None | ResponseShape::Text => Value::Text(trim_line_ending(raw).to_string()),
        ResponseShape::Real => Value::Real(parse_real(raw)?),
        ResponseShape::Integer => Value::Integer(parse_integer(raw)?),
        ResponseShape::Boolean => Value::Boolean(parse_boolean(raw)),
    };
    Ok(ret)
}

/// Rust types a query response can be coerced into.
pub trait FromResponse: Sized {
    const SHAPE: ResponseShape;

    fn from_value(value: Value) -> Option<Self>;
}

impl FromResponse for String {
    const SHAPE: ResponseShape = ResponseShape::Text;

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(x) => Some(x),
            _ => None,
        }
    }
}

impl FromResponse for f64 {
    const SHAPE: ResponseShape = ResponseShape::Real;

    fn from_value(value: Value) -> Option<Self> {
        value.as_real()
    }
}

impl FromResponse for i64 {
    const SHAPE: ResponseShape = ResponseShape::Integer;

    fn from_value(value: Value) -> Option<Self> {
        value.as_integer()
    }
}

impl FromResponse for i32 {
    const SHAPE: ResponseShape = ResponseShape::Integer;

    fn from_value(value: Value) -> Option<Self> {
        value.as_integer().and_then(|x| i32::try_from(x).ok())
    }
}

impl FromResponse for u8 {
    const SHAPE: ResponseShape = ResponseShape::Integer;

    fn from_value(value: Value) -> Option<Self> {
        value.as_integer().and_then(|x| u8::try_from(x).ok())
    }
}

impl FromResponse for bool {
    const SHAPE: ResponseShape = ResponseShape::Boolean;

    fn from_value(value: Value) -> Option<Self> {
        value.as_bool()
    }
}

/// Parse `raw` into `T`, reporting out of range values as command errors.
pub fn parse_as<T: FromResponse>(raw: &str) -> Result<T> {
    let value = parse_response(T::SHAPE, raw)?;
    let text = value.to_string();
    T::from_value(value).ok_or_else(|| {
        Error::command(format!(
            "Response `{}` is out of range for {}.",
            text,
            std::any::type_name::<T>()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn booleans() {
        assert!(parse_boolean("1\n"));
        assert!(parse_boolean("ON"));
        assert!(!parse_boolean("OFF"));
        assert!(!parse_boolean("0\r\n"));
        assert!(parse_as::<bool>("1\n").unwrap());
    }

    #[test]
    fn numbers() {
        assert_eq!(parse_real("+4.99E+00\n").unwrap(), 4.99);
        assert_eq!(parse_integer("+0\n").unwrap(), 0);
        assert_eq!(parse_integer("-113").unwrap(), -113);
        assert_eq!(parse_as::<i32>("7\n").unwrap(), 7);
    }

    #[test]
    fn bad_number_is_command_error_with_raw_text() {
        let err = parse_real("OVLD\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Command);
        assert!(err.to_string().contains("OVLD"));
        assert_eq!(parse_integer("1.5").unwrap_err().kind(), ErrorKind::Command);
    }

    #[test]
    fn out_of_range_is_command_error() {
        let err = parse_as::<u8>("300\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Command);
        assert!(err.to_string().contains("300"));
        assert_eq!(parse_as::<u8>("255").unwrap(), 255);
    }

    #[test]
    fn text_is_trimmed() {
        assert_eq!(
            parse_response(ResponseShape::Text, "ACME,X,1,2\r\n").unwrap(),
            Value::Text("ACME,X,1,2".into())
        );
        assert_eq!(parse_as::<String>("abc\n").unwrap(), "abc");
    }
}
