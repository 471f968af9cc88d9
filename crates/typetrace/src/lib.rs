//! typetrace — keystroke-level text capture and timed replay.
//!
//! `typetrace-core` provides the synchronous capture engine (diff, patch,
//! record log, recorder); this crate adds the timed replay player and the
//! storage collaborator seam.

pub mod player;
pub mod store;

pub use typetrace_core::{codec, diff, generate_session_id, patch, record, recorder, session};
