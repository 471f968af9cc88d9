use crate::diff::DiffOp;

use super::{Hunk, Patch, SEARCH_WINDOW};

/// Result of applying a patch: the produced text plus the indexes of any
/// hunks that could not be located. A non-clean outcome is a reportable
/// condition for the caller, not a silent one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub text: String,
    pub failed_hunks: Vec<usize>,
}

impl ApplyOutcome {
    pub fn is_clean(&self) -> bool {
        self.failed_hunks.is_empty()
    }
}

struct Located {
    pos: usize,
    pattern_len: usize,
    replacement: Vec<char>,
    lead_trim: usize,
}

impl Patch {
    /// Applies the patch to `text`.
    ///
    /// Each hunk is anchored at its expected position adjusted by the
    /// drift observed so far; if the source pattern is not there, a
    /// bounded window around it is scanned, then retried with the context
    /// margin halved and then dropped. An unlocatable hunk is skipped and
    /// reported in the outcome; the rest of the patch still applies.
    pub fn apply(&self, text: &str) -> ApplyOutcome {
        let mut out: Vec<char> = text.chars().collect();
        let mut delta = 0isize;
        let mut failed_hunks = Vec::new();

        for (index, hunk) in self.hunks.iter().enumerate() {
            let expected = hunk.src_pos as isize + delta;
            match locate(&out, hunk, expected) {
                Some(found) => {
                    let end = found.pos + found.pattern_len;
                    out.splice(found.pos..end, found.replacement);
                    // Re-anchor the drift from where the hunk actually
                    // matched, so later hunks tolerate what accumulated.
                    delta = found.pos as isize
                        - found.lead_trim as isize
                        - hunk.src_pos as isize
                        + hunk.dst_len as isize
                        - hunk.src_len as isize;
                }
                None => failed_hunks.push(index),
            }
        }

        ApplyOutcome {
            text: out.into_iter().collect(),
            failed_hunks,
        }
    }
}

fn locate(out: &[char], hunk: &Hunk, expected: isize) -> Option<Located> {
    for level in 0..3 {
        let (pattern, replacement, lead_trim, trail_trim) = trimmed_pair(hunk, level);
        if level > 0 && lead_trim == 0 && trail_trim == 0 {
            continue;
        }
        if pattern.is_empty() {
            // A pure insertion has nothing to match; it anchors at the
            // expected position. Never reached via trimming: a hunk whose
            // context cannot be found anywhere fails instead of inserting
            // blind.
            if level == 0 {
                let pos = expected.clamp(0, out.len() as isize) as usize;
                return Some(Located {
                    pos,
                    pattern_len: 0,
                    replacement,
                    lead_trim,
                });
            }
            continue;
        }
        if pattern.len() > out.len() {
            continue;
        }

        let max_start = out.len() - pattern.len();
        let base = (expected + lead_trim as isize).clamp(0, max_start as isize) as usize;
        if matches_at(out, &pattern, base) {
            return Some(Located {
                pos: base,
                pattern_len: pattern.len(),
                replacement,
                lead_trim,
            });
        }
        for off in 1..=SEARCH_WINDOW {
            if base >= off && matches_at(out, &pattern, base - off) {
                return Some(Located {
                    pos: base - off,
                    pattern_len: pattern.len(),
                    replacement,
                    lead_trim,
                });
            }
            let fwd = base + off;
            if fwd <= max_start && matches_at(out, &pattern, fwd) {
                return Some(Located {
                    pos: fwd,
                    pattern_len: pattern.len(),
                    replacement,
                    lead_trim,
                });
            }
        }
    }
    None
}

fn matches_at(hay: &[char], pattern: &[char], pos: usize) -> bool {
    hay[pos..pos + pattern.len()] == *pattern
}

/// Builds the hunk's source pattern and destination replacement with the
/// boundary context margins trimmed down by `level`: untouched, halved,
/// dropped. Returns `(pattern, replacement, lead_trim, trail_trim)`.
fn trimmed_pair(hunk: &Hunk, level: usize) -> (Vec<char>, Vec<char>, usize, usize) {
    let lead_ctx = match hunk.ops.first() {
        Some((DiffOp::Eql, text)) => text.chars().count(),
        _ => 0,
    };
    let trail_ctx = if hunk.ops.len() > 1 {
        match hunk.ops.last() {
            Some((DiffOp::Eql, text)) => text.chars().count(),
            _ => 0,
        }
    } else {
        0
    };
    let (lead_trim, trail_trim) = match level {
        0 => (0, 0),
        1 => (lead_ctx / 2, trail_ctx / 2),
        _ => (lead_ctx, trail_ctx),
    };

    let mut pattern: Vec<char> = Vec::new();
    let mut replacement: Vec<char> = Vec::new();
    for (op, text) in &hunk.ops {
        if *op != DiffOp::Ins {
            pattern.extend(text.chars());
        }
        if *op != DiffOp::Del {
            replacement.extend(text.chars());
        }
    }
    pattern.drain(..lead_trim);
    pattern.truncate(pattern.len() - trail_trim);
    replacement.drain(..lead_trim);
    replacement.truncate(replacement.len() - trail_trim);

    (pattern, replacement, lead_trim, trail_trim)
}
