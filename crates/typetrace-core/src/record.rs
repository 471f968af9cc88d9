//! Timestamped patch records and the per-session log.

use serde::{Deserialize, Serialize};

use crate::patch::Patch;

/// One captured edit: the patch, the wall-clock instant it was observed
/// (ms since the Unix epoch), and the elapsed time since the previous
/// record (`0` for the first). Field names follow the stored wire shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub patch: Patch,
    pub timestamp: u64,
    #[serde(default)]
    pub time_diff: u64,
}

/// The ordered, append-only record sequence of one recording session.
/// Serializes transparently as the record array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordLog {
    records: Vec<Record>,
}

impl RecordLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record. There is deliberately no way to remove or reorder
    /// entries.
    pub fn push(&mut self, record: Record) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn last(&self) -> Option<&Record> {
        self.records.last()
    }
}

impl From<Vec<Record>> for RecordLog {
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}
