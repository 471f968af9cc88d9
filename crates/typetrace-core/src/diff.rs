//! Character-level text diff.
//!
//! Myers bisect diff with common-affix trimming and merge normalization,
//! plus a semantic cleanup pass that collapses the positional noise a
//! single keystroke produces (a delete+insert pair sharing a run folds
//! into the minimal edit). All positions and lengths count Unicode scalar
//! values.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// One kind of diff run. Serialized as `-1` / `0` / `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffOp {
    Del,
    Eql,
    Ins,
}

pub type DiffRun = (DiffOp, String);
pub type Diff = Vec<DiffRun>;

impl DiffOp {
    pub fn tag(self) -> i8 {
        match self {
            DiffOp::Del => -1,
            DiffOp::Eql => 0,
            DiffOp::Ins => 1,
        }
    }

    pub fn from_tag(tag: i8) -> Option<Self> {
        match tag {
            -1 => Some(DiffOp::Del),
            0 => Some(DiffOp::Eql),
            1 => Some(DiffOp::Ins),
            _ => None,
        }
    }
}

impl Serialize for DiffOp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_i8(self.tag())
    }
}

impl<'de> Deserialize<'de> for DiffOp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = i8::deserialize(deserializer)?;
        DiffOp::from_tag(tag)
            .ok_or_else(|| de::Error::custom(format!("unknown diff op tag: {tag}")))
    }
}

// ── Char helpers ──────────────────────────────────────────────────────────

pub(crate) fn char_len(s: &str) -> usize {
    s.chars().count()
}

pub(crate) fn char_to_byte(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

fn common_prefix(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[char], b: &[char]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

fn common_prefix_str(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}

fn common_suffix_str(a: &str, b: &str) -> usize {
    a.chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

// ── Public API ────────────────────────────────────────────────────────────

/// Computes the diff transforming `src` into `dst`, normalized so that
/// adjacent runs never share an op kind and no run is empty.
pub fn diff(src: &str, dst: &str) -> Diff {
    let a: Vec<char> = src.chars().collect();
    let b: Vec<char> = dst.chars().collect();
    diff_chars(&a, &b)
}

/// Returns `true` when the diff carries no edits.
pub fn is_identity(diff: &Diff) -> bool {
    diff.iter().all(|(op, _)| *op == DiffOp::Eql)
}

/// Concatenation of the non-insert runs: the source text.
pub fn src(diff: &Diff) -> String {
    let mut txt = String::new();
    for (op, text) in diff {
        if *op != DiffOp::Ins {
            txt.push_str(text);
        }
    }
    txt
}

/// Concatenation of the non-delete runs: the destination text.
pub fn dst(diff: &Diff) -> String {
    let mut txt = String::new();
    for (op, text) in diff {
        if *op != DiffOp::Del {
            txt.push_str(text);
        }
    }
    txt
}

/// Swaps inserts and deletes, yielding the reverse diff.
pub fn invert(diff: &Diff) -> Diff {
    diff.iter()
        .map(|(op, text)| match op {
            DiffOp::Eql => (DiffOp::Eql, text.clone()),
            DiffOp::Ins => (DiffOp::Del, text.clone()),
            DiffOp::Del => (DiffOp::Ins, text.clone()),
        })
        .collect()
}

/// Drops empty runs and merges adjacent runs of the same kind.
pub fn normalize(diff: Diff) -> Diff {
    let mut normalized: Diff = Vec::with_capacity(diff.len());
    for (op, text) in diff {
        if text.is_empty() {
            continue;
        }
        if let Some(last) = normalized.last_mut() {
            if last.0 == op {
                last.1.push_str(&text);
                continue;
            }
        }
        normalized.push((op, text));
    }
    normalized
}

// ── Diff construction ─────────────────────────────────────────────────────

fn diff_chars(a: &[char], b: &[char]) -> Diff {
    if a == b {
        if a.is_empty() {
            return vec![];
        }
        return vec![(DiffOp::Eql, a.iter().collect())];
    }

    let prefix = common_prefix(a, b);
    let (mid_a, mid_b) = (&a[prefix..], &b[prefix..]);
    let suffix = common_suffix(mid_a, mid_b);

    let mut d = diff_middle(
        &mid_a[..mid_a.len() - suffix],
        &mid_b[..mid_b.len() - suffix],
    );
    if prefix > 0 {
        d.insert(0, (DiffOp::Eql, a[..prefix].iter().collect()));
    }
    if suffix > 0 {
        d.push((DiffOp::Eql, mid_a[mid_a.len() - suffix..].iter().collect()));
    }
    cleanup_merge(&mut d);
    d
}

/// Diff of two texts with no shared prefix or suffix.
fn diff_middle(a: &[char], b: &[char]) -> Diff {
    if a.is_empty() {
        return vec![(DiffOp::Ins, b.iter().collect())];
    }
    if b.is_empty() {
        return vec![(DiffOp::Del, a.iter().collect())];
    }

    let (long, short, src_longer) = if a.len() > b.len() {
        (a, b, true)
    } else {
        (b, a, false)
    };

    // Shorter text fully contained in the longer one.
    if let Some(at) = find_sub(long, short) {
        let edge = if src_longer { DiffOp::Del } else { DiffOp::Ins };
        return vec![
            (edge, long[..at].iter().collect()),
            (DiffOp::Eql, short.iter().collect()),
            (edge, long[at + short.len()..].iter().collect()),
        ];
    }

    // A lone char that is not contained shares nothing.
    if short.len() == 1 {
        return vec![
            (DiffOp::Del, a.iter().collect()),
            (DiffOp::Ins, b.iter().collect()),
        ];
    }

    bisect(a, b)
}

fn find_sub(hay: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > hay.len() {
        return None;
    }
    hay.windows(needle.len()).position(|w| w == needle)
}

/// Myers bisect: walk the forward and reverse furthest-reaching paths
/// until they overlap, then split the problem at the overlap.
fn bisect(a: &[char], b: &[char]) -> Diff {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max_d = (n + m + 1) / 2;
    let v_offset = max_d;
    let v_length = (2 * max_d + 2) as usize;
    let mut v1 = vec![-1isize; v_length];
    let mut v2 = vec![-1isize; v_length];
    v1[(v_offset + 1) as usize] = 0;
    v2[(v_offset + 1) as usize] = 0;

    let delta = n - m;
    // When the delta is odd the paths can only overlap on the forward scan.
    let front = delta % 2 != 0;
    let mut k1start = 0isize;
    let mut k1end = 0isize;
    let mut k2start = 0isize;
    let mut k2end = 0isize;

    for d in 0..max_d {
        let mut k1 = -d + k1start;
        while k1 <= d - k1end {
            let k1_offset = (v_offset + k1) as usize;
            let mut x1 = if k1 == -d || (k1 != d && v1[k1_offset - 1] < v1[k1_offset + 1]) {
                v1[k1_offset + 1]
            } else {
                v1[k1_offset - 1] + 1
            };
            let mut y1 = x1 - k1;
            while x1 < n && y1 < m && a[x1 as usize] == b[y1 as usize] {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_offset] = x1;
            if x1 > n {
                k1end += 2;
            } else if y1 > m {
                k1start += 2;
            } else if front {
                let k2_offset = v_offset + delta - k1;
                if k2_offset >= 0 && (k2_offset as usize) < v_length {
                    let v2x = v2[k2_offset as usize];
                    if v2x != -1 && x1 >= n - v2x {
                        return bisect_split(a, b, x1 as usize, y1 as usize);
                    }
                }
            }
            k1 += 2;
        }

        let mut k2 = -d + k2start;
        while k2 <= d - k2end {
            let k2_offset = (v_offset + k2) as usize;
            let mut x2 = if k2 == -d || (k2 != d && v2[k2_offset - 1] < v2[k2_offset + 1]) {
                v2[k2_offset + 1]
            } else {
                v2[k2_offset - 1] + 1
            };
            let mut y2 = x2 - k2;
            while x2 < n && y2 < m && a[(n - x2 - 1) as usize] == b[(m - y2 - 1) as usize] {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_offset] = x2;
            if x2 > n {
                k2end += 2;
            } else if y2 > m {
                k2start += 2;
            } else if !front {
                let k1_offset = v_offset + delta - k2;
                if k1_offset >= 0 && (k1_offset as usize) < v_length {
                    let x1 = v1[k1_offset as usize];
                    if x1 != -1 {
                        let y1 = v_offset + x1 - k1_offset;
                        if x1 >= n - x2 {
                            return bisect_split(a, b, x1 as usize, y1 as usize);
                        }
                    }
                }
            }
            k2 += 2;
        }
    }

    // The paths never overlapped: the texts share nothing.
    vec![
        (DiffOp::Del, a.iter().collect()),
        (DiffOp::Ins, b.iter().collect()),
    ]
}

fn bisect_split(a: &[char], b: &[char], x: usize, y: usize) -> Diff {
    let mut left = diff_chars(&a[..x], &b[..y]);
    let right = diff_chars(&a[x..], &b[y..]);
    left.extend(right);
    left
}

// ── Merge normalization ───────────────────────────────────────────────────

/// Reorders and merges like runs, factoring shared affixes out of
/// delete+insert pairs. Any diff that has been assembled from parts goes
/// through here before it is used.
fn cleanup_merge(diff: &mut Diff) {
    diff.push((DiffOp::Eql, String::new()));
    let mut pointer = 0usize;
    let mut del_cnt = 0usize;
    let mut ins_cnt = 0usize;
    let mut del_txt = String::new();
    let mut ins_txt = String::new();

    while pointer < diff.len() {
        if pointer < diff.len() - 1 && diff[pointer].1.is_empty() {
            diff.remove(pointer);
            continue;
        }
        match diff[pointer].0 {
            DiffOp::Ins => {
                ins_cnt += 1;
                ins_txt.push_str(&diff[pointer].1);
                pointer += 1;
            }
            DiffOp::Del => {
                del_cnt += 1;
                del_txt.push_str(&diff[pointer].1);
                pointer += 1;
            }
            DiffOp::Eql => {
                if !del_txt.is_empty() && !ins_txt.is_empty() {
                    // Factor a shared prefix into the preceding equality.
                    let common = common_prefix_str(&ins_txt, &del_txt);
                    if common != 0 {
                        let cut = char_to_byte(&ins_txt, common);
                        let pre = ins_txt[..cut].to_string();
                        ins_txt.drain(..cut);
                        let cut = char_to_byte(&del_txt, common);
                        del_txt.drain(..cut);
                        let prev_eq = pointer as isize - ins_cnt as isize - del_cnt as isize - 1;
                        if prev_eq >= 0 {
                            diff[prev_eq as usize].1.push_str(&pre);
                        } else {
                            diff.insert(0, (DiffOp::Eql, pre));
                            pointer += 1;
                        }
                    }
                    // Factor a shared suffix into the current equality.
                    let common = common_suffix_str(&ins_txt, &del_txt);
                    if common != 0 {
                        let cut = char_to_byte(&ins_txt, char_len(&ins_txt) - common);
                        let suffix = ins_txt[cut..].to_string();
                        ins_txt.truncate(cut);
                        let cut = char_to_byte(&del_txt, char_len(&del_txt) - common);
                        del_txt.truncate(cut);
                        let cur = std::mem::take(&mut diff[pointer].1);
                        diff[pointer].1 = format!("{suffix}{cur}");
                    }
                }

                let n = ins_cnt + del_cnt;
                if n > 0 {
                    let start = pointer - n;
                    let mut merged: Vec<DiffRun> = Vec::with_capacity(2);
                    if !del_txt.is_empty() {
                        merged.push((DiffOp::Del, std::mem::take(&mut del_txt)));
                    }
                    if !ins_txt.is_empty() {
                        merged.push((DiffOp::Ins, std::mem::take(&mut ins_txt)));
                    }
                    let kept = merged.len();
                    diff.splice(start..start + n, merged);
                    pointer = start + kept;
                }

                if pointer != 0
                    && pointer < diff.len()
                    && diff[pointer - 1].0 == DiffOp::Eql
                {
                    let cur = std::mem::take(&mut diff[pointer].1);
                    diff[pointer - 1].1.push_str(&cur);
                    diff.remove(pointer);
                } else {
                    pointer += 1;
                }

                ins_cnt = 0;
                del_cnt = 0;
                del_txt.clear();
                ins_txt.clear();
            }
        }
    }

    if diff.last().is_some_and(|(_, text)| text.is_empty()) {
        diff.pop();
    }

    // Slide single edits that sit between two equalities; a shift that
    // lines an edit up with one of its neighbours enables another merge.
    let mut changes = false;
    let mut ptr = 1usize;
    while ptr + 1 < diff.len() {
        if diff[ptr - 1].0 == DiffOp::Eql && diff[ptr + 1].0 == DiffOp::Eql {
            let prev = diff[ptr - 1].1.clone();
            let cur = diff[ptr].1.clone();
            let next = diff[ptr + 1].1.clone();
            if cur.ends_with(&prev) {
                let kept = &cur[..cur.len() - prev.len()];
                diff[ptr].1 = format!("{prev}{kept}");
                diff[ptr + 1].1 = format!("{prev}{next}");
                diff.remove(ptr - 1);
                changes = true;
            } else if cur.starts_with(&next) {
                diff[ptr - 1].1.push_str(&next);
                diff[ptr].1 = format!("{}{next}", &cur[next.len()..]);
                diff.remove(ptr + 1);
                changes = true;
            }
        }
        ptr += 1;
    }
    if changes {
        cleanup_merge(diff);
    }
}

// ── Semantic cleanup ──────────────────────────────────────────────────────

/// Rewrites the diff for edit coherence: equalities smaller than the edits
/// flanking them are folded into those edits, and delete+insert pairs that
/// overlap are split around the shared run. Raw positional diffs of live
/// typing are noisy; the recorder always runs this pass before framing a
/// patch.
pub fn cleanup_semantic(diff: &mut Diff) {
    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<String> = None;
    let mut pointer = 0usize;
    // Edit sizes before and after the candidate equality.
    let mut len_ins1 = 0usize;
    let mut len_del1 = 0usize;
    let mut len_ins2 = 0usize;
    let mut len_del2 = 0usize;

    while pointer < diff.len() {
        if diff[pointer].0 == DiffOp::Eql {
            equalities.push(pointer);
            len_ins1 = len_ins2;
            len_del1 = len_del2;
            len_ins2 = 0;
            len_del2 = 0;
            last_equality = Some(diff[pointer].1.clone());
            pointer += 1;
            continue;
        }

        if diff[pointer].0 == DiffOp::Ins {
            len_ins2 += char_len(&diff[pointer].1);
        } else {
            len_del2 += char_len(&diff[pointer].1);
        }

        let mut eliminated = false;
        if let Some(eq) = last_equality.clone() {
            let eq_len = char_len(&eq);
            if eq_len <= len_ins1.max(len_del1) && eq_len <= len_ins2.max(len_del2) {
                if let Some(&idx) = equalities.last() {
                    diff.insert(idx, (DiffOp::Del, eq.clone()));
                    diff[idx + 1] = (DiffOp::Ins, eq);
                    equalities.pop();
                    equalities.pop();
                    pointer = match equalities.last() {
                        Some(&p) => p + 1,
                        None => 0,
                    };
                    len_ins1 = 0;
                    len_del1 = 0;
                    len_ins2 = 0;
                    len_del2 = 0;
                    last_equality = None;
                    changes = true;
                    eliminated = true;
                }
            }
        }
        if !eliminated {
            pointer += 1;
        }
    }

    if changes {
        cleanup_merge(diff);
    }

    // Split overlapping delete+insert pairs around the shared run.
    let mut pointer = 1usize;
    let mut split = false;
    while pointer < diff.len() {
        if diff[pointer - 1].0 == DiffOp::Del && diff[pointer].0 == DiffOp::Ins {
            let deletion = diff[pointer - 1].1.clone();
            let insertion = diff[pointer].1.clone();
            let overlap1 = overlap_len(&deletion, &insertion);
            let overlap2 = overlap_len(&insertion, &deletion);
            let del_len = char_len(&deletion);
            let ins_len = char_len(&insertion);
            if overlap1 >= overlap2 {
                if overlap1 * 2 >= del_len || overlap1 * 2 >= ins_len {
                    let cut_i = char_to_byte(&insertion, overlap1);
                    let cut_d = char_to_byte(&deletion, del_len - overlap1);
                    diff.insert(pointer, (DiffOp::Eql, insertion[..cut_i].to_string()));
                    diff[pointer - 1].1 = deletion[..cut_d].to_string();
                    diff[pointer + 1].1 = insertion[cut_i..].to_string();
                    split = true;
                    pointer += 1;
                }
            } else if overlap2 * 2 >= del_len || overlap2 * 2 >= ins_len {
                let cut_d = char_to_byte(&deletion, overlap2);
                let cut_i = char_to_byte(&insertion, ins_len - overlap2);
                diff.insert(pointer, (DiffOp::Eql, deletion[..cut_d].to_string()));
                diff[pointer - 1] = (DiffOp::Ins, insertion[..cut_i].to_string());
                diff[pointer + 1] = (DiffOp::Del, deletion[cut_d..].to_string());
                split = true;
                pointer += 1;
            }
            pointer += 1;
        }
        pointer += 1;
    }
    if split {
        *diff = normalize(std::mem::take(diff));
    }
}

/// Length of the longest suffix of `a` that is also a prefix of `b`.
fn overlap_len(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let max = a.len().min(b.len());
    let mut best = 0usize;
    for k in 1..=max {
        if a[a.len() - k..] == b[..k] {
            best = k;
        }
    }
    best
}
