//! Conversion of raw token values to typed Sea-ORM values.

use chrono::{DateTime, Utc};
use sea_orm::Value;
use std::str::FromStr;
use uuid::Uuid;

use crate::{errors::CoercionError, schema::FieldType};

/// Character that introduces an escape in `LIKE` patterns
pub const LIKE_ESCAPE: char = '!';

/// Convert `raw` to a value of type `target`.
///
/// Multi-valued fields coerce against their element type. Booleans accept
/// only `true` and `false`, enums only an exact member name.
pub fn coerce(raw: &str, target: FieldType) -> Result<Value, CoercionError> {
    match target {
        FieldType::Bool => parse::<bool>(raw, target),
        FieldType::Integer => parse::<i32>(raw, target),
        FieldType::BigInteger => parse::<i64>(raw, target),
        FieldType::Float => parse::<f32>(raw, target),
        FieldType::Double => parse::<f64>(raw, target),
        FieldType::Text => Ok(Value::from(raw.to_string())),
        FieldType::Uuid => Uuid::parse_str(raw)
            .map(Value::from)
            .map_err(|e| CoercionError::new(raw, target, e)),
        FieldType::Timestamp => DateTime::parse_from_rfc3339(raw)
            .map(|timestamp| Value::from(timestamp.with_timezone(&Utc)))
            .map_err(|e| CoercionError::new(raw, target, e)),
        FieldType::Enum(members) => {
            if members.contains(&raw) {
                Ok(Value::from(raw.to_string()))
            } else {
                Err(CoercionError::new(
                    raw,
                    target,
                    format!("expected one of {}", members.join(", ")),
                ))
            }
        }
        FieldType::List(element) => coerce(raw, *element),
        FieldType::Relation(_) => Err(CoercionError::new(
            raw,
            target,
            "a related record cannot be compared to a value",
        )),
    }
}

fn parse<T>(raw: &str, target: FieldType) -> Result<Value, CoercionError>
where
    T: FromStr + Into<Value>,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>()
        .map(Into::into)
        .map_err(|e| CoercionError::new(raw, target, e))
}

/// Escape `LIKE` wildcards and the escape character itself with `!`
#[must_use]
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '!' | '%' | '_' | '[') {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

/// Substring pattern `%value%`, escaped when rendered as SQL text
#[must_use]
pub fn like_pattern(raw: &str, escape: bool) -> String {
    if escape {
        format!("%{}%", escape_like(raw))
    } else {
        format!("%{raw}%")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_types() {
        assert_eq!(coerce("42", FieldType::Integer).unwrap(), Value::from(42_i32));
        assert_eq!(coerce("-7", FieldType::BigInteger).unwrap(), Value::from(-7_i64));
        assert_eq!(coerce("1.5", FieldType::Double).unwrap(), Value::from(1.5_f64));
        assert_eq!(coerce("true", FieldType::Bool).unwrap(), Value::from(true));
        assert_eq!(
            coerce("hello", FieldType::Text).unwrap(),
            Value::from("hello".to_string())
        );
    }

    #[test]
    fn test_boolean_never_defaults() {
        let err = coerce("yes", FieldType::Bool).unwrap_err();
        assert_eq!(err.raw, "yes");
        assert_eq!(err.target, "bool");
        assert!(coerce("TRUE", FieldType::Bool).is_err());
    }

    #[test]
    fn test_integer_overflow_is_an_error() {
        let err = coerce("3000000000", FieldType::Integer).unwrap_err();
        assert_eq!(err.target, "i32");
        assert!(coerce("3000000000", FieldType::BigInteger).is_ok());
    }

    #[test]
    fn test_enum_members_are_case_sensitive() {
        static ROLES: [&str; 2] = ["Admin", "User"];
        assert_eq!(
            coerce("Admin", FieldType::Enum(&ROLES)).unwrap(),
            Value::from("Admin".to_string())
        );
        let err = coerce("admin", FieldType::Enum(&ROLES)).unwrap_err();
        assert_eq!(err.cause, "expected one of Admin, User");
    }

    #[test]
    fn test_list_uses_element_type() {
        assert_eq!(
            coerce("5", FieldType::List(&FieldType::Integer)).unwrap(),
            Value::from(5_i32)
        );
        assert!(coerce("five", FieldType::List(&FieldType::Integer)).is_err());
    }

    #[test]
    fn test_timestamp_and_uuid() {
        let value = coerce("2024-03-01T12:00:00+02:00", FieldType::Timestamp).unwrap();
        let expected = DateTime::parse_from_rfc3339("2024-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(value, Value::from(expected));

        let id = Uuid::new_v4();
        assert_eq!(coerce(&id.to_string(), FieldType::Uuid).unwrap(), Value::from(id));
        assert!(coerce("not-a-uuid", FieldType::Uuid).is_err());
    }

    #[test]
    fn test_like_escaping() {
        assert_eq!(like_pattern("%some name!%", true), "%!%some name!!!%%");
        assert_eq!(escape_like("a_b[c"), "a!_b![c");
        assert_eq!(like_pattern("50%", false), "%50%%");
    }
}
