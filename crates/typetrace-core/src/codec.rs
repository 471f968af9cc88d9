//! JSON codec for records, logs, and session payloads.
//!
//! Decoding is guarded: a payload over the record cap, or a patch whose
//! ops disagree with its claimed coordinates, is rejected with a typed
//! error rather than trusted.

use thiserror::Error;

use crate::patch::HunkError;
use crate::record::Record;
use crate::session::Session;

/// Hard cap on the number of records a decoded payload may carry,
/// independent of any recorder configuration.
pub const MAX_LOG_RECORDS: usize = 10_000;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed record payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("record payload holds {0} records, over the decode cap")]
    TooManyRecords(usize),
    #[error("record {record}: {source}")]
    InvalidPatch {
        record: usize,
        #[source]
        source: HunkError,
    },
}

pub fn serialize_records(records: &[Record]) -> Result<String, CodecError> {
    Ok(serde_json::to_string(records)?)
}

pub fn deserialize_records(data: &str) -> Result<Vec<Record>, CodecError> {
    let records: Vec<Record> = serde_json::from_str(data)?;
    validate_records(&records)?;
    Ok(records)
}

pub fn serialize_session(session: &Session) -> Result<String, CodecError> {
    Ok(serde_json::to_string(session)?)
}

pub fn deserialize_session(data: &str) -> Result<Session, CodecError> {
    let session: Session = serde_json::from_str(data)?;
    validate_records(session.log.records())?;
    Ok(session)
}

fn validate_records(records: &[Record]) -> Result<(), CodecError> {
    if records.len() > MAX_LOG_RECORDS {
        return Err(CodecError::TooManyRecords(records.len()));
    }
    for (record, entry) in records.iter().enumerate() {
        entry
            .patch
            .validate()
            .map_err(|source| CodecError::InvalidPatch { record, source })?;
    }
    Ok(())
}
