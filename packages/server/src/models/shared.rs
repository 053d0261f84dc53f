use serde::{Deserialize, Deserializer};

use crate::error::AppError;

/// Counters arrive either as JSON numbers or as numeric strings (`"30"`).
#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrString {
    Int(i64),
    Str(String),
}

impl IntOrString {
    fn into_i32<E: serde::de::Error>(self) -> Result<i32, E> {
        let value = match self {
            IntOrString::Int(n) => n,
            IntOrString::Str(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| E::custom(format!("expected an integer, got {s:?}")))?,
        };
        i32::try_from(value).map_err(|_| E::custom(format!("integer {value} is out of range")))
    }
}

/// Serde helper accepting an integer or a string holding one.
pub fn int_or_string<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    IntOrString::deserialize(deserializer)?.into_i32()
}

/// Optional variant of [`int_or_string`]; pair with `#[serde(default)]`.
pub fn opt_int_or_string<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<IntOrString>::deserialize(deserializer)?
        .map(IntOrString::into_i32)
        .transpose()
}

/// Reject values that are empty after trimming or longer than `max` characters.
pub fn validate_text(value: &str, field: &str, max: Option<usize>) -> Result<(), AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} must not be blank")));
    }
    if let Some(max) = max
        && trimmed.chars().count() > max
    {
        return Err(AppError::Validation(format!(
            "{field} must be 1-{max} characters"
        )));
    }
    Ok(())
}
