//! Flat CSV record store. Every mutation is a whole-file rewrite through
//! an atomic tempfile swap; there is no locking, so concurrent writers
//! race last-write-wins. Acceptable for the single-operator use this
//! serves.

use crate::error::{Result, SpokeError};
use crate::io;
use crate::record::Record;
use crate::schema;
use std::path::{Path, PathBuf};

pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the backing file with a header row if it does not exist.
    pub fn ensure_initialized(&self) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(schema::columns())?;
        let header = into_bytes(wtr)?;
        io::write_if_missing(&self.path, &header)?;
        Ok(())
    }

    /// Read every record. Initializes the file first, so an absent file
    /// yields an empty store rather than an error. A header that does not
    /// match the schema columns is a hard error.
    pub fn load_all(&self) -> Result<Vec<Record>> {
        self.ensure_initialized()?;
        let mut rdr = csv::Reader::from_path(&self.path)?;
        let headers = rdr.headers()?.clone();
        if !headers.iter().eq(schema::columns()) {
            return Err(SpokeError::ColumnMismatch {
                path: self.path.display().to_string(),
                expected: schema::columns().collect::<Vec<_>>().join(", "),
                found: headers.iter().collect::<Vec<_>>().join(", "),
            });
        }
        let mut records = Vec::new();
        for row in rdr.records() {
            let row = row?;
            records.push(Record::from_row(row.iter()));
        }
        Ok(records)
    }

    /// Overwrite the whole table: header plus `records` in the given order.
    pub fn save_all(&self, records: &[Record]) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.write_record(schema::columns())?;
        for record in records {
            wtr.write_record(record.to_row())?;
        }
        let data = into_bytes(wtr)?;
        io::atomic_write(&self.path, &data)
    }

    /// Append one record via read-modify-write of the whole store.
    /// Serial ID collisions are not checked; duplicates are stored as-is.
    pub fn append(&self, record: Record) -> Result<()> {
        let mut records = self.load_all()?;
        records.push(record);
        self.save_all(&records)
    }

    /// First record whose Serial ID matches, if any. With duplicate IDs
    /// the first-inserted wins.
    pub fn find_by_serial(&self, id: &str) -> Result<Option<Record>> {
        Ok(self
            .load_all()?
            .into_iter()
            .find(|r| r.serial_id() == Some(id)))
    }

    /// Remove every record whose Serial ID matches (all duplicates, not
    /// just the first). Returns whether anything was removed.
    pub fn delete_by_serial(&self, id: &str) -> Result<bool> {
        let records = self.load_all()?;
        let before = records.len();
        let kept: Vec<Record> = records
            .into_iter()
            .filter(|r| r.serial_id() != Some(id))
            .collect();
        if kept.len() == before {
            return Ok(false);
        }
        self.save_all(&kept)?;
        Ok(true)
    }

    /// Replace one field on the first record whose Serial ID matches.
    /// No-op returning false when the ID is absent.
    pub fn upsert_field(&self, id: &str, field: &str, value: &str) -> Result<bool> {
        let mut records = self.load_all()?;
        let Some(record) = records.iter_mut().find(|r| r.serial_id() == Some(id)) else {
            return Ok(false);
        };
        record.set(field, value);
        self.save_all(&records)?;
        Ok(true)
    }
}

fn into_bytes(wtr: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    wtr.into_inner()
        .map_err(|e| SpokeError::Io(std::io::Error::other(e.to_string())))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
