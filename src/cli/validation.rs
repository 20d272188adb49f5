use crate::metrics::Magnitude;
use thiserror::Error;

/// Input rejected before any side effect happens.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("required flag \"{0}\" not set")]
    MissingFlag(&'static str),

    #[error("expected a decimal value on stdin")]
    MissingValue,

    #[error("could not read {input:?} as a single decimal value")]
    InvalidValue { input: String },

    #[error("value {0} is not a finite number")]
    NonFiniteValue(f64),

    #[error("invalid magnitude {value:?}, expected one of: {}", Magnitude::ACCEPTED.join(", "))]
    InvalidMagnitude { value: String },
}

/// Return the value of a required setting, treating empty as unset.
pub fn require<'a>(name: &'static str, value: Option<&'a str>) -> Result<&'a str, ValidationError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ValidationError::MissingFlag(name)),
    }
}

pub fn parse_magnitude(value: &str) -> Result<Magnitude, ValidationError> {
    value
        .parse()
        .map_err(|value| ValidationError::InvalidMagnitude { value })
}

/// Parse one line of input holding exactly one decimal number.
pub fn parse_decimal(line: &str) -> Result<f64, ValidationError> {
    let mut tokens = line.split_whitespace();
    let token = tokens.next().ok_or(ValidationError::MissingValue)?;
    if tokens.next().is_some() {
        return Err(ValidationError::InvalidValue {
            input: line.trim().to_string(),
        });
    }

    let value: f64 = token.parse().map_err(|_| ValidationError::InvalidValue {
        input: token.to_string(),
    })?;
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue(value));
    }
    Ok(value)
}
