//! Fuzzy name similarity on a 0-100 scale.
//!
//! Combines three views of the two strings and keeps the best:
//! - whole-string similarity,
//! - word-order-insensitive similarity (tokens sorted),
//! - best-window similarity when one string is much shorter than the other,
//!   so a short keyword can match a long name it is a fragment of.
//!
//! Similarity of two strings is `2 * lcs / (len_a + len_b)` where `lcs` is
//! the longest common subsequence, computed over lowercased characters with
//! punctuation folded to spaces.

/// Score how closely `candidate` matches `query`, 0-100.
pub fn similarity(query: &str, candidate: &str) -> u8 {
    let q = normalize(query);
    let c = normalize(candidate);
    if q.is_empty() || c.is_empty() {
        return 0;
    }

    let base = ratio(&q, &c);
    let sorted = ratio(&token_sort(&q), &token_sort(&c)) * 0.95;

    let (short, long) = if q.len() <= c.len() { (&q, &c) } else { (&c, &q) };
    let length_ratio = long.len() as f64 / short.len() as f64;
    let partial = if length_ratio < 1.5 {
        0.0
    } else {
        let scale = if length_ratio < 8.0 { 0.9 } else { 0.6 };
        partial_ratio(short, long) * scale
    };

    base.max(sorted).max(partial).round().clamp(0.0, 100.0) as u8
}

/// Lowercase, fold non-alphanumerics to single spaces, trim.
fn normalize(s: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(s.len());
    let mut pending_space = false;
    for ch in s.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        } else {
            pending_space = true;
        }
    }
    out
}

fn token_sort(s: &[char]) -> Vec<char> {
    let text: String = s.iter().collect();
    let mut tokens: Vec<&str> = text.split(' ').filter(|t| !t.is_empty()).collect();
    tokens.sort_unstable();
    tokens.join(" ").chars().collect()
}

fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 100.0;
    }
    200.0 * lcs_len(a, b) as f64 / total as f64
}

/// Best `ratio` of `short` against every same-length window of `long`.
fn partial_ratio(short: &[char], long: &[char]) -> f64 {
    if short.is_empty() {
        return 0.0;
    }
    if short.len() >= long.len() {
        return ratio(short, long);
    }
    long.windows(short.len())
        .map(|window| ratio(short, window))
        .fold(0.0, f64::max)
}

/// Longest common subsequence length, two-row DP.
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
