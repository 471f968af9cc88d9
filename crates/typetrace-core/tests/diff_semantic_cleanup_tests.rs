use typetrace_core::diff::{cleanup_semantic, diff, dst, src, Diff, DiffOp};

fn runs(parts: &[(DiffOp, &str)]) -> Diff {
    parts
        .iter()
        .map(|(op, text)| (*op, text.to_string()))
        .collect()
}

#[test]
fn small_equality_between_large_edits_is_folded_in() {
    let mut d = runs(&[
        (DiffOp::Del, "abc"),
        (DiffOp::Ins, "xyz"),
        (DiffOp::Eql, "m"),
        (DiffOp::Del, "def"),
        (DiffOp::Ins, "uvw"),
    ]);
    cleanup_semantic(&mut d);
    assert_eq!(
        d,
        runs(&[(DiffOp::Del, "abcmdef"), (DiffOp::Ins, "xyzmuvw")])
    );
}

#[test]
fn large_equality_survives() {
    let before = runs(&[
        (DiffOp::Del, "a"),
        (DiffOp::Eql, "equalpart"),
        (DiffOp::Ins, "b"),
    ]);
    let mut d = before.clone();
    cleanup_semantic(&mut d);
    assert_eq!(d, before);
}

#[test]
fn overlapping_edit_pair_splits_around_shared_run() {
    let mut d = runs(&[(DiffOp::Del, "abcxxx"), (DiffOp::Ins, "xxxdef")]);
    cleanup_semantic(&mut d);
    assert_eq!(
        d,
        runs(&[
            (DiffOp::Del, "abc"),
            (DiffOp::Eql, "xxx"),
            (DiffOp::Ins, "def"),
        ])
    );
}

#[test]
fn reverse_overlap_splits_the_other_way() {
    let mut d = runs(&[(DiffOp::Del, "xxxabc"), (DiffOp::Ins, "defxxx")]);
    cleanup_semantic(&mut d);
    assert_eq!(
        d,
        runs(&[
            (DiffOp::Ins, "def"),
            (DiffOp::Eql, "xxx"),
            (DiffOp::Del, "abc"),
        ])
    );
}

#[test]
fn word_replacement_keeps_surrounding_equalities() {
    let mut d = diff("the cat", "the hat");
    cleanup_semantic(&mut d);
    assert_eq!(
        d,
        runs(&[
            (DiffOp::Eql, "the "),
            (DiffOp::Del, "c"),
            (DiffOp::Ins, "h"),
            (DiffOp::Eql, "at"),
        ])
    );
}

#[test]
fn cleanup_preserves_endpoints() {
    let cases = [
        ("the quick brown fox jumps", "the quick red fox leaps"),
        ("abcdefghij", "jihgfedcba"),
        ("one two three", "one three two"),
        ("aaaaaa", "aabaaa"),
        ("", "fresh text"),
    ];
    for (a, b) in cases {
        let mut d = diff(a, b);
        cleanup_semantic(&mut d);
        assert_eq!(src(&d), a, "source endpoint after cleanup of {a:?} -> {b:?}");
        assert_eq!(
            dst(&d),
            b,
            "destination endpoint after cleanup of {a:?} -> {b:?}"
        );
    }
}
