//! A finalized recording session.

use serde::{Deserialize, Serialize};

use crate::record::RecordLog;

/// The session id plus its frozen record log — the opaque payload handed
/// to the storage collaborator at finalize time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(rename = "sessionId")]
    pub id: String,
    #[serde(rename = "records")]
    pub log: RecordLog,
}
