//! Numeric-aware ordering of file names.
//!
//! Simulation writers name snapshots `1.vtk`, `2.vtk`, ..., `10.vtk`
//! without zero padding, so plain byte order would interleave them.

use std::cmp::Ordering;

/// Compare two names, treating runs of ASCII digits as numbers.
///
/// Non-digit text compares byte-wise. Digit runs compare by value, ignoring
/// leading zeros; on equal value the shorter run (fewer leading zeros) sorts
/// first. Fully equal keys fall back to plain byte order so the result is a
/// total order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (ab, bb) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);

    while i < ab.len() && j < bb.len() {
        if ab[i].is_ascii_digit() && bb[j].is_ascii_digit() {
            let si = i;
            while i < ab.len() && ab[i].is_ascii_digit() {
                i += 1;
            }
            let sj = j;
            while j < bb.len() && bb[j].is_ascii_digit() {
                j += 1;
            }
            let ord = cmp_digits(&ab[si..i], &bb[sj..j]);
            if ord != Ordering::Equal {
                return ord;
            }
        } else {
            match ab[i].cmp(&bb[j]) {
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
                ord => return ord,
            }
        }
    }

    (ab.len() - i)
        .cmp(&(bb.len() - j))
        .then_with(|| ab.cmp(bb))
}

/// Compare two digit runs by numeric value without parsing (no overflow).
fn cmp_digits(a: &[u8], b: &[u8]) -> Ordering {
    let strip = |s: &[u8]| -> usize { s.iter().take_while(|&&c| c == b'0').count() };
    let (a_trim, b_trim) = (&a[strip(a)..], &b[strip(b)..]);
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        .then_with(|| a.len().cmp(&b.len()))
}
