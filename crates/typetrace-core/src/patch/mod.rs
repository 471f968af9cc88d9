//! Positionally-anchored patches.
//!
//! A [`Patch`] is an ordered run of [`Hunk`]s, each anchoring a group of
//! edit operations at coordinates in the source and destination texts with
//! a margin of equal-text context on both sides. Application tolerates
//! moderate drift in the source text; see [`Patch::apply`].

mod apply;
mod types;

pub use apply::ApplyOutcome;
pub use types::{Hunk, HunkError, Patch};

use crate::diff::{char_len, Diff, DiffOp};

/// Chars of equal-text context framed around each hunk's edits.
pub const CONTEXT_CHARS: usize = 4;

/// How far, in chars, application searches around a hunk's expected
/// position before giving up on that hunk.
pub const SEARCH_WINDOW: usize = 64;

impl Patch {
    /// Frames `diff` (computed against `src`) into context-anchored hunks.
    ///
    /// Equalities of more than `2 * CONTEXT_CHARS` split the patch into
    /// separate hunks; smaller interior equalities are carried inline.
    pub fn from_diff(src: &str, diff: &Diff) -> Self {
        let src_chars: Vec<char> = src.chars().collect();
        let mut hunks: Vec<Hunk> = Vec::new();
        let mut building: Option<Hunk> = None;
        let mut cc_src = 0usize;
        let mut cc_dst = 0usize;
        let count = diff.len();

        for (i, (op, text)) in diff.iter().enumerate() {
            let len = char_len(text);
            if *op != DiffOp::Eql && building.is_none() {
                building = Some(Hunk {
                    src_pos: cc_src,
                    src_len: 0,
                    dst_pos: cc_dst,
                    dst_len: 0,
                    ops: Vec::new(),
                });
            }
            match op {
                DiffOp::Ins => {
                    if let Some(hunk) = building.as_mut() {
                        hunk.ops.push((*op, text.clone()));
                        hunk.dst_len += len;
                    }
                }
                DiffOp::Del => {
                    if let Some(hunk) = building.as_mut() {
                        hunk.ops.push((*op, text.clone()));
                        hunk.src_len += len;
                    }
                }
                DiffOp::Eql => {
                    let absorb = len <= 2 * CONTEXT_CHARS && i + 1 < count;
                    if absorb {
                        if let Some(hunk) = building.as_mut() {
                            hunk.ops.push((*op, text.clone()));
                            hunk.src_len += len;
                            hunk.dst_len += len;
                        }
                    } else if let Some(mut hunk) = building.take() {
                        add_context(&mut hunk, &src_chars);
                        hunks.push(hunk);
                    }
                }
            }
            if *op != DiffOp::Ins {
                cc_src += len;
            }
            if *op != DiffOp::Del {
                cc_dst += len;
            }
        }
        if let Some(mut hunk) = building.take() {
            add_context(&mut hunk, &src_chars);
            hunks.push(hunk);
        }

        Patch { hunks }
    }
}

/// Widens a freshly built hunk with up to [`CONTEXT_CHARS`] of source text
/// on each side, adjusting its coordinates to cover the margin.
fn add_context(hunk: &mut Hunk, src: &[char]) {
    let lead = CONTEXT_CHARS.min(hunk.src_pos);
    if lead > 0 {
        let text: String = src[hunk.src_pos - lead..hunk.src_pos].iter().collect();
        hunk.ops.insert(0, (DiffOp::Eql, text));
        hunk.src_pos -= lead;
        hunk.dst_pos -= lead;
        hunk.src_len += lead;
        hunk.dst_len += lead;
    }
    let end = hunk.src_pos + hunk.src_len;
    let trail = CONTEXT_CHARS.min(src.len().saturating_sub(end));
    if trail > 0 {
        let text: String = src[end..end + trail].iter().collect();
        hunk.ops.push((DiffOp::Eql, text));
        hunk.src_len += trail;
        hunk.dst_len += trail;
    }
}
