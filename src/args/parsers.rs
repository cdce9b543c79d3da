use std::time::Duration;

use crate::bench::{HttpMethod, PipelineMode};
use crate::error::ValidationError;

pub(crate) fn parse_header(s: &str) -> Result<(String, String), ValidationError> {
    match s.split_once(':') {
        Some((key, value)) => Ok((key.trim().to_owned(), value.trim().to_owned())),
        None => Err(ValidationError::InvalidHeaderFormat {
            value: s.to_owned(),
        }),
    }
}

/// Parses a `name=value` form field. The value may be empty, the name may not.
pub(crate) fn parse_form_entry(s: &str) -> Result<(String, String), ValidationError> {
    let Some((name, value)) = s.split_once('=') else {
        return Err(ValidationError::InvalidFormEntryFormat {
            entry: s.to_owned(),
        });
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::FormEntryNameEmpty {
            entry: s.to_owned(),
        });
    }
    Ok((name.to_owned(), value.to_owned()))
}

pub(super) fn parse_method(s: &str) -> Result<HttpMethod, ValidationError> {
    s.parse::<HttpMethod>()
}

pub(super) fn parse_pipeline(s: &str) -> Result<PipelineMode, ValidationError> {
    s.parse::<PipelineMode>()
}

pub(crate) fn parse_bool_env(s: &str) -> Result<bool, ValidationError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Ok(true),
        "0" | "false" | "no" | "n" | "off" => Ok(false),
        _ => Err(ValidationError::InvalidBoolean {
            value: s.to_owned(),
        }),
    }
}

/// Parses `<number>[ms|s|m]`; a bare number is seconds and zero is allowed.
pub(crate) fn parse_duration_arg(s: &str) -> Result<Duration, ValidationError> {
    let value = s.trim();
    if value.is_empty() {
        return Err(ValidationError::DurationEmpty);
    }

    let digits_len = value.chars().take_while(char::is_ascii_digit).count();
    if digits_len == 0 {
        return Err(ValidationError::InvalidDurationFormat {
            value: value.to_owned(),
        });
    }
    let (num_part, unit_part) = value.split_at(digits_len);
    let number: u64 = num_part
        .parse()
        .map_err(|err| ValidationError::InvalidDurationNumber {
            value: value.to_owned(),
            source: err,
        })?;

    match unit_part {
        "ms" => Ok(Duration::from_millis(number)),
        "" | "s" => Ok(Duration::from_secs(number)),
        "m" => number
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or(ValidationError::DurationOverflow),
        unit => Err(ValidationError::InvalidDurationUnit {
            unit: unit.to_owned(),
        }),
    }
}

/// Whole milliseconds of `duration`, saturating at `u64::MAX`.
pub(crate) fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
