use crate::schema::{self, DATE, DATE_FORMAT, NA, SERIAL_ID};
use chrono::Local;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One inspection report: field name to string-typed value. Used both for
/// persisted rows and the in-progress draft a wizard accumulates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    values: HashMap<String, String>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.values.insert(name.to_string(), value.into());
    }

    /// Skip semantics in the add flow: a value already supplied (then
    /// revisited via Back) is preserved, not overwritten.
    pub fn set_if_absent(&mut self, name: &str, value: impl Into<String>) {
        self.values
            .entry(name.to_string())
            .or_insert_with(|| value.into());
    }

    pub fn serial_id(&self) -> Option<&str> {
        self.get(SERIAL_ID)
    }

    /// Fill every absent field with the `N/A` sentinel and stamp the Date
    /// column with the local clock. Called once, when the wizard commits.
    pub fn finalize(&mut self) {
        for field in &schema::FIELDS {
            self.set_if_absent(field.name, NA);
        }
        self.set(DATE, Local::now().format(DATE_FORMAT).to_string());
    }

    /// Human-readable summary in schema column order.
    pub fn summary(&self) -> String {
        let mut out = String::from("Summary:\n\n");
        for name in schema::columns() {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(self.get(name).unwrap_or(NA));
            out.push('\n');
        }
        out
    }

    /// Values in schema column order, absent fields as `N/A`.
    pub fn to_row(&self) -> Vec<&str> {
        schema::columns()
            .map(|name| self.get(name).unwrap_or(NA))
            .collect()
    }

    /// Build a record from a CSV row already checked against the schema
    /// column order.
    pub fn from_row<'a>(row: impl Iterator<Item = &'a str>) -> Self {
        let mut record = Record::new();
        for (name, value) in schema::columns().zip(row) {
            record.set(name, value);
        }
        record
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
