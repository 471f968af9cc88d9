//! Storage collaborator seam.
//!
//! The core never retries: a save or fetch failure surfaces upward
//! unchanged, with the recorder's data still intact in memory for the
//! caller to retry.

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use typetrace_core::codec::{self, CodecError};
use typetrace_core::record::Record;
use typetrace_core::session::Session;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("failed to save session {session_id}: {reason}")]
    Save { session_id: String, reason: String },
    #[error("failed to fetch session {session_id}: {reason}")]
    Fetch { session_id: String, reason: String },
    #[error("malformed stored payload: {0}")]
    Codec(#[from] CodecError),
}

/// Persistence boundary for finalized sessions. Implementations live
/// outside the core (a remote record store, a local cache); [`MemoryStore`]
/// stands in for them in tests and demos.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn save(&self, session: &Session) -> Result<(), StoreError>;

    async fn fetch(&self, session_id: &str) -> Result<Vec<Record>, StoreError>;
}

/// In-process session store. Holds the serialized payload, so everything a
/// session round-trips through the codec exactly as it would through a
/// remote store.
#[derive(Default)]
pub struct MemoryStore {
    sessions: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn save(&self, session: &Session) -> Result<(), StoreError> {
        if session.log.is_empty() {
            return Err(StoreError::Save {
                session_id: session.id.clone(),
                reason: "empty record log".to_string(),
            });
        }
        let payload = codec::serialize_records(session.log.records())?;
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), payload);
        Ok(())
    }

    async fn fetch(&self, session_id: &str) -> Result<Vec<Record>, StoreError> {
        let sessions = self.sessions.read().await;
        let payload = sessions
            .get(session_id)
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))?;
        Ok(codec::deserialize_records(payload)?)
    }
}
