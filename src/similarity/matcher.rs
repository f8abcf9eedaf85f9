//! Longest-matching-block sequence comparison over characters.
//!
//! Finds the longest contiguous matching block, then recurses into the
//! unmatched regions on either side of it. The similarity ratio is
//! `2 * M / T` where `M` is the total size of all matching blocks and `T` is
//! the combined length of both sequences.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Sequences at least this long are eligible for the popular-element heuristic.
const AUTOJUNK_MIN_LEN: usize = 200;

/// A matching block: `a[a_start..a_start + size] == b[b_start..b_start + size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Match {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

/// Compares two character sequences.
///
/// Construction indexes `b`; every other query is computed on demand.
pub struct SequenceMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions in `b` of every character usable as a match anchor.
    b2j: HashMap<char, Vec<usize>>,
    /// Characters dropped from `b2j` by the popular-element heuristic.
    popular: HashSet<char>,
}

impl<'a> SequenceMatcher<'a> {
    /// Build a matcher without the popular-element heuristic.
    pub fn new(a: &'a [char], b: &'a [char]) -> Self {
        Self::with_autojunk(a, b, false)
    }

    /// Build a matcher, optionally discarding "popular" characters of `b`.
    ///
    /// With `autojunk`, when `b` has at least 200 elements, any character
    /// occurring more than `len / 100 + 1` times is not used to anchor matches.
    pub fn with_autojunk(a: &'a [char], b: &'a [char], autojunk: bool) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        let mut popular = HashSet::new();
        if autojunk && b.len() >= AUTOJUNK_MIN_LEN {
            let ntest = b.len() / 100 + 1;
            b2j.retain(|&c, positions| {
                if positions.len() > ntest {
                    popular.insert(c);
                    false
                } else {
                    true
                }
            });
        }

        Self {
            a,
            b,
            b2j,
            popular,
        }
    }

    /// Characters excluded as anchors by the popular-element heuristic.
    pub fn popular(&self) -> &HashSet<char> {
        &self.popular
    }

    /// Longest matching block in `a[alo..ahi]` and `b[blo..bhi]`.
    ///
    /// Ties go to the block starting earliest in `a`, then earliest in `b`.
    /// Returns a zero-size match at `(alo, blo)` when nothing matches.
    pub fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> Match {
        let (a, b) = (self.a, self.b);
        let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0usize);

        // j2len[j] = length of the longest match ending with a[i - 1] and b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();
        for (i, c) in a.iter().enumerate().take(ahi).skip(alo) {
            let mut new_j2len = HashMap::new();
            if let Some(positions) = self.b2j.get(c) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let k = j
                        .checked_sub(1)
                        .and_then(|prev| j2len.get(&prev))
                        .copied()
                        .unwrap_or(0)
                        + 1;
                    new_j2len.insert(j, k);
                    if k > best_size {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_size = k;
                    }
                }
            }
            j2len = new_j2len;
        }

        // Popular characters never anchor a match but may still extend one.
        while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_size += 1;
        }
        while best_i + best_size < ahi
            && best_j + best_size < bhi
            && a[best_i + best_size] == b[best_j + best_size]
        {
            best_size += 1;
        }

        Match {
            a_start: best_i,
            b_start: best_j,
            size: best_size,
        }
    }

    /// All matching blocks, ascending and non-adjacent.
    ///
    /// The list always ends with the sentinel `Match { a.len(), b.len(), 0 }`.
    pub fn matching_blocks(&self) -> Vec<Match> {
        let (la, lb) = (self.a.len(), self.b.len());
        let mut queue = vec![(0, la, 0, lb)];
        let mut blocks = Vec::new();

        while let Some((alo, ahi, blo, bhi)) = queue.pop() {
            let m = self.find_longest_match(alo, ahi, blo, bhi);
            if m.size == 0 {
                continue;
            }
            blocks.push(m);
            if alo < m.a_start && blo < m.b_start {
                queue.push((alo, m.a_start, blo, m.b_start));
            }
            if m.a_start + m.size < ahi && m.b_start + m.size < bhi {
                queue.push((m.a_start + m.size, ahi, m.b_start + m.size, bhi));
            }
        }
        blocks.sort();

        // Merge blocks that touch end to start on both sides.
        let mut merged: Vec<Match> = Vec::with_capacity(blocks.len() + 1);
        for block in blocks {
            match merged.last_mut() {
                Some(last)
                    if last.a_start + last.size == block.a_start
                        && last.b_start + last.size == block.b_start =>
                {
                    last.size += block.size;
                }
                _ => merged.push(block),
            }
        }

        merged.push(Match {
            a_start: la,
            b_start: lb,
            size: 0,
        });
        merged
    }

    /// Similarity in `[0, 1]`. Two empty sequences are identical (1.0).
    pub fn ratio(&self) -> f64 {
        let matches: usize = self.matching_blocks().iter().map(|m| m.size).sum();
        calculate_ratio(matches, self.a.len() + self.b.len())
    }

    /// Upper bound on [`ratio`](Self::ratio) from shared character counts.
    pub fn quick_ratio(&self) -> f64 {
        let mut available: HashMap<char, usize> = HashMap::new();
        for &c in self.b {
            *available.entry(c).or_default() += 1;
        }
        let mut matches = 0;
        for c in self.a {
            if let Some(count) = available.get_mut(c) {
                if *count > 0 {
                    *count -= 1;
                    matches += 1;
                }
            }
        }
        calculate_ratio(matches, self.a.len() + self.b.len())
    }

    /// Upper bound on [`ratio`](Self::ratio) from lengths alone.
    pub fn real_quick_ratio(&self) -> f64 {
        let (la, lb) = (self.a.len(), self.b.len());
        calculate_ratio(la.min(lb), la + lb)
    }
}

fn calculate_ratio(matches: usize, length: usize) -> f64 {
    if length == 0 {
        1.0
    } else {
        2.0 * matches as f64 / length as f64
    }
}

/// Order a pair so that the shorter sequence comes first, ties broken
/// lexicographically. Matching in this orientation makes the ratio symmetric.
fn canonical<'a>(a: &'a [char], b: &'a [char]) -> (&'a [char], &'a [char]) {
    match a.len().cmp(&b.len()).then_with(|| a.cmp(b)) {
        Ordering::Greater => (b, a),
        _ => (a, b),
    }
}

/// Symmetric similarity ratio of two character sequences.
pub fn ratio_chars(a: &[char], b: &[char], autojunk: bool) -> f64 {
    let (first, second) = canonical(a, b);
    SequenceMatcher::with_autojunk(first, second, autojunk).ratio()
}

/// Symmetric similarity ratio of two strings, compared character by character.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    ratio_chars(&a, &b, false)
}
