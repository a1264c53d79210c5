//! Decoder from upstream day records into a typed [`Schedule`]
//!
//! The timetable API returns one JSON object per study day. The day name is in
//! `"name"`, and slot `j` (1-based) of a week variant is in `"n{j}"` for the
//! numerator and `"z{j}"` for the denominator. Missing or null slots are free.

use serde_json::{Map, Value};
use thiserror::Error;

use super::{Class, Day, Schedule, Week, WeekParity, DAYS_PER_WEEK, SLOTS_PER_DAY};

/// One raw day record as returned by the upstream
pub type RawDay = Map<String, Value>;

/// Field holding the display name of a day
const NAME_FIELD: &str = "name";

/// Shape violations found while decoding day records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Fewer day records than the week has days
    #[error("Expected {expected} day records, got {found}")]
    TooFewDays { expected: usize, found: usize },

    /// A required field is absent or null
    #[error("Day {day}: missing required field '{field}'")]
    MissingField { day: usize, field: String },

    /// A field is present but holds something other than a string
    #[error("Day {day}: field '{field}' must be a string, got {found}")]
    FieldNotString {
        day: usize,
        field: String,
        found: &'static str,
    },
}

/// Decodes the first six day records into both week variants
///
/// Records beyond the sixth are ignored. A slot that is absent, null or blank
/// is skipped; any other non-string value is rejected.
pub fn decode(records: &[RawDay]) -> Result<Schedule, DecodeError> {
    if records.len() < DAYS_PER_WEEK {
        return Err(DecodeError::TooFewDays {
            expected: DAYS_PER_WEEK,
            found: records.len(),
        });
    }

    let records = &records[..DAYS_PER_WEEK];
    Ok(Schedule {
        numerator: decode_week(records, WeekParity::Numerator)?,
        denominator: decode_week(records, WeekParity::Denominator)?,
    })
}

fn decode_week(records: &[RawDay], parity: WeekParity) -> Result<Week, DecodeError> {
    let days = records
        .iter()
        .enumerate()
        .map(|(index, record)| decode_day(index, record, parity))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Week { days })
}

fn decode_day(index: usize, record: &RawDay, parity: WeekParity) -> Result<Day, DecodeError> {
    let name = match record.get(NAME_FIELD) {
        None | Some(Value::Null) => {
            return Err(DecodeError::MissingField {
                day: index,
                field: NAME_FIELD.to_string(),
            })
        }
        Some(value) => expect_string(index, NAME_FIELD, value)?,
    };

    let mut classes = Vec::new();
    for slot in 0..SLOTS_PER_DAY {
        let field = format!("{}{}", parity.field_prefix(), slot + 1);
        let description = match record.get(&field) {
            None | Some(Value::Null) => continue,
            Some(value) => expect_string(index, &field, value)?,
        };
        if description.trim().is_empty() {
            continue;
        }
        classes.push(Class {
            slot,
            description: description.to_string(),
        });
    }

    Ok(Day {
        name: name.to_string(),
        classes,
    })
}

fn expect_string<'a>(day: usize, field: &str, value: &'a Value) -> Result<&'a str, DecodeError> {
    value.as_str().ok_or_else(|| DecodeError::FieldNotString {
        day,
        field: field.to_string(),
        found: json_type_name(value),
    })
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
