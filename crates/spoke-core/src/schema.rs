//! The inspection schema: one declarative table drives the wizard step
//! order, the update-flow field choices, the CSV column order, and the
//! keyboard shown at each prompt.

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// The unique-key field. Prompted first, never editable afterwards.
pub const SERIAL_ID: &str = "Serial ID";

/// Stamped automatically at finalization, never prompted.
pub const DATE: &str = "Date";

/// Sentinel stored for skipped fields. Every persisted record has every
/// column populated, absent values included.
pub const NA: &str = "N/A";

pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// ---------------------------------------------------------------------------
// FieldKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any text verbatim, empty included.
    FreeText,
    /// Unsigned base-10 integer literal within [lo, hi] inclusive.
    IntRange { lo: u32, hi: u32 },
    /// Case-insensitive true/false, normalized to lowercase.
    Boolean,
    /// Structured location payload only; stored as "<lat>, <lon>".
    GeoPoint,
    /// Any text verbatim, no validation (the Serial ID).
    Fixed,
}

// ---------------------------------------------------------------------------
// Keyboard
// ---------------------------------------------------------------------------

/// Transport-independent keyboard spec. The transport adapter renders
/// these into platform reply markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyboard {
    /// Cancel only (Serial ID step has no Back target).
    SerialId,
    /// Back/Skip only, value typed as free text.
    Text,
    /// True/False pair plus Back/Skip.
    Boolean,
    /// 0-10 grid plus Back/Skip.
    Rate,
    /// 0-4 grid plus Back/Skip.
    Battery,
    /// 1-10 grid plus Back/Skip.
    SeatHeight,
    /// Location-request button plus Back/Skip.
    Location,
    /// One row per editable field plus Cancel.
    FieldChoice,
    /// Clear any visible keyboard.
    Remove,
}

// ---------------------------------------------------------------------------
// FieldDef
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub prompt: &'static str,
    /// Re-prompt emitted when validation rejects the input. Unused for
    /// kinds that always accept.
    pub invalid: &'static str,
    pub kind: FieldKind,
    pub keyboard: Keyboard,
}

/// Wizard steps in order. The stored record carries these columns in this
/// order, with [`DATE`] appended last.
pub static FIELDS: [FieldDef; 13] = [
    FieldDef {
        name: SERIAL_ID,
        prompt: "Enter Serial ID:",
        invalid: "",
        kind: FieldKind::Fixed,
        keyboard: Keyboard::SerialId,
    },
    FieldDef {
        name: "Inventory Tag",
        prompt: "Enter Inventory Tag:",
        invalid: "",
        kind: FieldKind::FreeText,
        keyboard: Keyboard::Text,
    },
    FieldDef {
        name: "Location",
        prompt: "Location:",
        invalid: "Share location or skip:",
        kind: FieldKind::GeoPoint,
        keyboard: Keyboard::Location,
    },
    FieldDef {
        name: "Is Straight Parking Angel",
        prompt: "Is Straight Parking Angel?",
        invalid: "Select 'True' or 'False':",
        kind: FieldKind::Boolean,
        keyboard: Keyboard::Boolean,
    },
    FieldDef {
        name: "Tires Rate",
        prompt: "Tires Rate (0-10):",
        invalid: "Select a valid rate (0-10):",
        kind: FieldKind::IntRange { lo: 0, hi: 10 },
        keyboard: Keyboard::Rate,
    },
    FieldDef {
        name: "Seat Height",
        prompt: "Seat Height (1-10):",
        invalid: "Select a valid height (1-10):",
        kind: FieldKind::IntRange { lo: 1, hi: 10 },
        keyboard: Keyboard::SeatHeight,
    },
    FieldDef {
        name: "Appearance Rate",
        prompt: "Appearance Rate (0-10):",
        invalid: "Select a valid rate (0-10):",
        kind: FieldKind::IntRange { lo: 0, hi: 10 },
        keyboard: Keyboard::Rate,
    },
    FieldDef {
        name: "Battery Level",
        prompt: "Battery Level (0-4):",
        invalid: "Select a valid battery level (0-4):",
        kind: FieldKind::IntRange { lo: 0, hi: 4 },
        keyboard: Keyboard::Battery,
    },
    FieldDef {
        name: "Left Brake Rate",
        prompt: "Left Brake Rate (0-10):",
        invalid: "Select a valid rate (0-10):",
        kind: FieldKind::IntRange { lo: 0, hi: 10 },
        keyboard: Keyboard::Rate,
    },
    FieldDef {
        name: "Right Brake Rate",
        prompt: "Right Brake Rate (0-10):",
        invalid: "Select a valid rate (0-10):",
        kind: FieldKind::IntRange { lo: 0, hi: 10 },
        keyboard: Keyboard::Rate,
    },
    FieldDef {
        name: "Pedaling Rate",
        prompt: "Pedaling Rate (0-10):",
        invalid: "Select a valid rate (0-10):",
        kind: FieldKind::IntRange { lo: 0, hi: 10 },
        keyboard: Keyboard::Rate,
    },
    FieldDef {
        name: "Speed Rate",
        prompt: "Speed Rate (0-10):",
        invalid: "Select a valid rate (0-10):",
        kind: FieldKind::IntRange { lo: 0, hi: 10 },
        keyboard: Keyboard::Rate,
    },
    FieldDef {
        name: "Note",
        prompt: "Any notes?",
        invalid: "",
        kind: FieldKind::FreeText,
        keyboard: Keyboard::Text,
    },
];

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

/// CSV column names in schema order: every field plus the derived Date.
pub fn columns() -> impl Iterator<Item = &'static str> {
    FIELDS.iter().map(|f| f.name).chain(std::iter::once(DATE))
}

pub fn column_count() -> usize {
    FIELDS.len() + 1
}

pub fn field(name: &str) -> Option<&'static FieldDef> {
    FIELDS.iter().find(|f| f.name == name)
}

/// Fields the update flow may change: everything except the Serial ID.
/// Date is never a field, so it is excluded by construction.
pub fn editable_fields() -> impl Iterator<Item = &'static FieldDef> {
    FIELDS.iter().filter(|f| f.name != SERIAL_ID)
}

/// Prompt shown in the update flow for a chosen field.
pub fn update_prompt(def: &FieldDef) -> String {
    match def.kind {
        FieldKind::IntRange { lo, hi } => format!("New {} ({lo}-{hi}):", def.name),
        FieldKind::GeoPoint => "New Location:".to_string(),
        _ => format!("New {}:", def.name),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_id_is_first_date_is_last() {
        let cols: Vec<_> = columns().collect();
        assert_eq!(cols.first(), Some(&SERIAL_ID));
        assert_eq!(cols.last(), Some(&DATE));
        assert_eq!(cols.len(), column_count());
    }

    #[test]
    fn field_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for name in columns() {
            assert!(seen.insert(name), "duplicate column: {name}");
        }
    }

    #[test]
    fn editable_fields_exclude_key_and_date() {
        let editable: Vec<_> = editable_fields().map(|f| f.name).collect();
        assert!(!editable.contains(&SERIAL_ID));
        assert!(!editable.contains(&DATE));
        assert_eq!(editable.len(), FIELDS.len() - 1);
    }

    #[test]
    fn update_prompts_name_the_range() {
        let tires = field("Tires Rate").unwrap();
        assert_eq!(update_prompt(tires), "New Tires Rate (0-10):");
        let battery = field("Battery Level").unwrap();
        assert_eq!(update_prompt(battery), "New Battery Level (0-4):");
        let location = field("Location").unwrap();
        assert_eq!(update_prompt(location), "New Location:");
        let note = field("Note").unwrap();
        assert_eq!(update_prompt(note), "New Note:");
    }
}
