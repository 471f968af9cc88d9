//! Core primitives for typetrace: character-level text diffing, patch
//! framing and application, the timestamped record log, and the recording
//! state machine.

pub mod codec;
pub mod diff;
pub mod patch;
pub mod record;
pub mod recorder;
pub mod session;

use rand::Rng;

const SESSION_ID_LEN: usize = 9;
const SESSION_ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generates a random session id in the `_xxxxxxxxx` base-36 form that
/// stored record payloads are keyed by.
pub fn generate_session_id() -> String {
    let mut rng = rand::thread_rng();
    let mut id = String::with_capacity(SESSION_ID_LEN + 1);
    id.push('_');
    for _ in 0..SESSION_ID_LEN {
        let idx = rng.gen_range(0..SESSION_ID_ALPHABET.len());
        id.push(SESSION_ID_ALPHABET[idx] as char);
    }
    id
}

/// Returns the crate version at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
