//! Per-field acceptance rules. Pure functions: the engine feeds them the
//! inbound payload and either stores the returned value or re-emits the
//! field's re-prompt.

use crate::schema::{FieldDef, FieldKind};

/// Inbound payload as seen by a validator. The transport distinguishes
/// plain text from structured location messages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Input<'a> {
    Text(&'a str),
    Location { lat: f64, lon: f64 },
}

/// Validate `input` against the field's kind. Returns the string to store
/// on success, or the field-specific re-prompt message on rejection.
pub fn validate(def: &FieldDef, input: Input<'_>) -> Result<String, &'static str> {
    match (def.kind, input) {
        (FieldKind::FreeText | FieldKind::Fixed, Input::Text(text)) => Ok(text.to_string()),
        (FieldKind::IntRange { lo, hi }, Input::Text(text)) => {
            if is_uint_literal(text) && text.parse::<u32>().map(|n| n >= lo && n <= hi) == Ok(true) {
                // Stored verbatim, not re-rendered: "07" stays "07".
                Ok(text.to_string())
            } else {
                Err(def.invalid)
            }
        }
        (FieldKind::Boolean, Input::Text(text)) => {
            if text.eq_ignore_ascii_case("true") || text.eq_ignore_ascii_case("false") {
                Ok(text.to_ascii_lowercase())
            } else {
                Err(def.invalid)
            }
        }
        (FieldKind::GeoPoint, Input::Location { lat, lon }) => Ok(format!("{lat}, {lon}")),
        // Text at a location field, or a location payload anywhere else.
        _ => Err(def.invalid),
    }
}

/// Non-empty, decimal digits only: no sign, no decimal point, no spaces.
fn is_uint_literal(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}
