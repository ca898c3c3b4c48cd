//! Review submission validation against a schema snapshot.
//!
//! Everything here is a pure function of its inputs. Callers take the snapshot
//! (normally inside the mutation's transaction) and pass it in, so a schema
//! change after the call never affects the outcome.

use crate::error::ValidationError;
use crate::orm::review_fields::FieldKind;
use crate::review_schema::ReviewFieldDefinition;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single submitted value. JSON numbers become `Number`, strings `Text`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }
}

/// Field `name` → submitted value.
pub type SubmittedValues = BTreeMap<String, FieldValue>;

/// Outcome of checking one value against its definition.
enum Check {
    Accepted,
    /// Text that is empty after trimming; counts as absent
    Blank,
    Rejected,
}

fn check_value(def: &ReviewFieldDefinition, value: &FieldValue) -> Check {
    match (def.kind, value) {
        (FieldKind::Rating, FieldValue::Number(n)) => {
            if !n.is_finite() {
                return Check::Rejected;
            }
            let above_min = def.min_value.map_or(true, |min| *n >= f64::from(min));
            let below_max = def.max_value.map_or(true, |max| *n <= f64::from(max));
            if above_min && below_max {
                Check::Accepted
            } else {
                Check::Rejected
            }
        }
        (FieldKind::ShortText | FieldKind::LongText, FieldValue::Text(s)) => {
            if s.trim().is_empty() {
                Check::Blank
            } else {
                Check::Accepted
            }
        }
        _ => Check::Rejected,
    }
}

/// Checks `submitted` against `schema`.
///
/// Required definitions must be present and valid; optional ones are checked
/// only when present. Offending names are reported in schema order. Keys
/// without a definition are ignored here and dropped by [`capture_values`].
pub fn validate(
    schema: &[ReviewFieldDefinition],
    submitted: &SubmittedValues,
) -> Result<(), ValidationError> {
    let mut error = ValidationError::default();

    for def in schema {
        match submitted.get(&def.name).map(|value| check_value(def, value)) {
            None | Some(Check::Blank) => {
                if def.required {
                    error.missing.push(def.name.clone());
                }
            }
            Some(Check::Rejected) => error.out_of_range.push(def.name.clone()),
            Some(Check::Accepted) => {}
        }
    }

    if error.is_empty() {
        Ok(())
    } else {
        Err(error)
    }
}

/// Values that will be persisted for a review: one entry per defined field
/// that was submitted with a non-blank value, in schema order.
///
/// Only call this on input that passed [`validate`] against the same snapshot.
pub fn capture_values(
    schema: &[ReviewFieldDefinition],
    submitted: &SubmittedValues,
) -> Vec<(String, FieldValue)> {
    schema
        .iter()
        .filter_map(|def| {
            let value = submitted.get(&def.name)?;
            match check_value(def, value) {
                Check::Accepted => {
                    let value = match value {
                        FieldValue::Text(s) => FieldValue::Text(s.trim().to_string()),
                        number => number.clone(),
                    };
                    Some((def.name.clone(), value))
                }
                Check::Blank | Check::Rejected => None,
            }
        })
        .collect()
}
