use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diff::{char_len, Diff, DiffOp};

#[derive(Debug, Error)]
pub enum HunkError {
    #[error("hunk {index}: ops span {actual} source chars, coordinates claim {expected}")]
    SourceLengthMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("hunk {index}: ops span {actual} destination chars, coordinates claim {expected}")]
    DestLengthMismatch {
        index: usize,
        expected: usize,
        actual: usize,
    },
    #[error("hunk {index}: no ops")]
    Empty { index: usize },
}

/// A group of edit operations anchored at coordinates in the source and
/// destination texts. `src_pos`/`dst_pos` point at the first char the hunk
/// covers (context margin included); `src_len`/`dst_len` are the spans the
/// ops consume and produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hunk {
    pub src_pos: usize,
    pub src_len: usize,
    pub dst_pos: usize,
    pub dst_len: usize,
    pub ops: Diff,
}

impl Hunk {
    /// The source-side text of this hunk: everything but insertions.
    pub fn source_text(&self) -> String {
        let mut txt = String::new();
        for (op, text) in &self.ops {
            if *op != DiffOp::Ins {
                txt.push_str(text);
            }
        }
        txt
    }

    /// The destination-side text of this hunk: everything but deletions.
    pub fn dest_text(&self) -> String {
        let mut txt = String::new();
        for (op, text) in &self.ops {
            if *op != DiffOp::Del {
                txt.push_str(text);
            }
        }
        txt
    }

    fn validate(&self, index: usize) -> Result<(), HunkError> {
        if self.ops.is_empty() {
            return Err(HunkError::Empty { index });
        }
        let actual_src = char_len(&self.source_text());
        if actual_src != self.src_len {
            return Err(HunkError::SourceLengthMismatch {
                index,
                expected: self.src_len,
                actual: actual_src,
            });
        }
        let actual_dst = char_len(&self.dest_text());
        if actual_dst != self.dst_len {
            return Err(HunkError::DestLengthMismatch {
                index,
                expected: self.dst_len,
                actual: actual_dst,
            });
        }
        Ok(())
    }
}

/// An ordered run of hunks transforming one text into another.
/// Serializes transparently as the hunk array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Patch {
    pub hunks: Vec<Hunk>,
}

impl Patch {
    pub fn len(&self) -> usize {
        self.hunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hunks.is_empty()
    }

    /// Checks each hunk's ops against its claimed coordinates. Decoded
    /// patches go through this before they are trusted.
    pub fn validate(&self) -> Result<(), HunkError> {
        for (index, hunk) in self.hunks.iter().enumerate() {
            hunk.validate(index)?;
        }
        Ok(())
    }
}
