// 📏 Sequence Similarity - Ratcliff/Obershelp ratio
//
// ratio = 2 * M / T
//   M = characters covered by the matching blocks
//   T = total characters in both strings
//
// Matching blocks are found the classic way: take the longest common
// substring, then recurse on the pieces left and right of it. Ties pick the
// earliest block in `a`, then the earliest in `b`.

use std::collections::HashMap;

/// Similarity of two strings in 0.0..=1.0 (1.0 = identical).
///
/// Two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    2.0 * matching_characters(&a, &b) as f64 / total as f64
}

/// Best ratio two strings of these lengths could ever reach.
///
/// Used to skip candidates before doing the real comparison.
pub fn ratio_upper_bound(len_a: usize, len_b: usize) -> f64 {
    let total = len_a + len_b;
    if total == 0 {
        return 1.0;
    }
    2.0 * len_a.min(len_b) as f64 / total as f64
}

/// Range of candidate lengths that can reach `cutoff` against a query of
/// `len` characters. Inclusive, slightly widened; callers still compare.
pub fn admissible_lengths(len: usize, cutoff: f64) -> (usize, usize) {
    if cutoff <= 0.0 || len == 0 {
        return (0, usize::MAX);
    }
    let cutoff = cutoff.min(1.0);
    let low = (len as f64 * cutoff / (2.0 - cutoff)).floor() as usize;
    let high = (len as f64 * (2.0 - cutoff) / cutoff).ceil() as usize;
    (low, high)
}

fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
    for (j, c) in b.iter().enumerate() {
        b2j.entry(*c).or_default().push(j);
    }

    let mut matched = 0;
    let mut queue = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, &b2j, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }

    matched
}

/// Longest common block of a[alo..ahi] and b[blo..bhi] as (i, j, size).
fn longest_match(
    a: &[char],
    b2j: &HashMap<char, Vec<usize>>,
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);

    // j2len[j] = length of the match ending at a[i-1], b[j]
    let mut j2len: HashMap<usize, usize> = HashMap::new();

    for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next: HashMap<usize, usize> = HashMap::new();

        if let Some(positions) = b2j.get(c) {
            for &j in positions {
                if j < blo {
                    continue;
                }
                if j >= bhi {
                    break;
                }
                let previous = if j > 0 {
                    j2len.get(&(j - 1)).copied().unwrap_or(0)
                } else {
                    0
                };
                let k = previous + 1;
                next.insert(j, k);
                if k > best_size {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_size = k;
                }
            }
        }

        j2len = next;
    }

    (best_i, best_j, best_size)
}

// ============================================================================
// TESTS
// ============================================================================
