//! Edit distance between terms.
//!
//! Fuzzy matching and spelling correction both need "is this term within
//! `k` edits of that one" far more often than the exact distance, so the
//! workhorse here is [`bounded_distance`], which stops as soon as every cell
//! of a row exceeds the bound.

use std::cmp::min;

/// Edit distance bounded by `max`, or `None` once it is certain to exceed it.
///
/// With `transpositions`, swapping two adjacent characters counts as one
/// edit (optimal string alignment), which is how most typed typos look.
pub fn bounded_distance(s1: &str, s2: &str, max: usize, transpositions: bool) -> Option<usize> {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();

    if a.len().abs_diff(b.len()) > max {
        return None;
    }
    if a.is_empty() || b.is_empty() {
        let d = a.len().max(b.len());
        return (d <= max).then_some(d);
    }

    // Three rows: two back for transpositions, previous, current.
    let mut before: Vec<usize> = vec![0; b.len() + 1];
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr: Vec<usize> = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        let mut row_min = curr[0];

        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut cell = min(min(prev[j] + 1, curr[j - 1] + 1), prev[j - 1] + cost);

            if transpositions && i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                cell = min(cell, before[j - 2] + 1);
            }

            curr[j] = cell;
            row_min = min(row_min, cell);
        }

        if row_min > max {
            return None;
        }

        std::mem::swap(&mut before, &mut prev);
        std::mem::swap(&mut prev, &mut curr);
    }

    let distance = prev[b.len()];
    (distance <= max).then_some(distance)
}

/// The first `len` characters of `s` (all of it when shorter).
pub fn char_prefix(s: &str, len: usize) -> &str {
    match s.char_indices().nth(len) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_distance() {
        assert_eq!(bounded_distance("kitten", "sitting", 3, false), Some(3));
        assert_eq!(bounded_distance("zamalek", "zanalek", 1, false), Some(1));
        assert_eq!(bounded_distance("kitten", "sitting", 2, false), None);
        assert_eq!(bounded_distance("studio", "studio", 0, true), Some(0));
        assert_eq!(bounded_distance("a", "abc", 1, true), None);
        assert_eq!(bounded_distance("a", "ab", 1, true), Some(1));
        assert_eq!(bounded_distance("", "ab", 2, true), Some(2));
    }

    #[test]
    fn test_transpositions() {
        assert_eq!(bounded_distance("serach", "search", 2, false), Some(2));
        assert_eq!(bounded_distance("serach", "search", 1, true), Some(1));
        assert_eq!(bounded_distance("prakign", "parking", 2, true), Some(2));
    }

    #[test]
    fn test_unicode_counts_chars() {
        assert_eq!(bounded_distance("café", "cafe", 1, false), Some(1));
        assert_eq!(bounded_distance("résumé", "resume", 2, true), Some(2));
    }

    #[test]
    fn test_char_prefix() {
        assert_eq!(char_prefix("maadi", 2), "ma");
        assert_eq!(char_prefix("é", 3), "é");
    }
}
