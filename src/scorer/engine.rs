use super::model::LogTables;
use super::stats::CiphertextStats;
use crate::alphabet::Alphabet;
use crate::permutation::Permutation;

/// `out[i]` is the model index of the image of `alphabet[i]`, or `None` when
/// that image is not a model character.
#[inline(always)]
pub fn permuted_indices(permutation: &Permutation, alphabet: &Alphabet) -> Vec<Option<usize>> {
    alphabet
        .chars()
        .iter()
        .map(|&c| alphabet.index_of(permutation.image(c)))
        .collect()
}

/// A term whose decoded character the model never saw costs the floor.
#[inline(always)]
fn pair_term(a: Option<usize>, b: Option<usize>, logs: &LogTables) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => logs.trans(a, b),
        _ => logs.floor,
    }
}

/// Only a first character the model knows is evidence; its image is then
/// scored like any other.
#[inline(always)]
fn first_char_term(
    first_char: Option<char>,
    permutation: &Permutation,
    alphabet: &Alphabet,
    logs: &LogTables,
) -> f64 {
    match first_char {
        Some(c) if alphabet.contains(c) => alphabet
            .index_of(permutation.image(c))
            .map_or(logs.floor, |i| logs.log_freq[i]),
        _ => 0.0,
    }
}

/// Hot path. Cost is proportional to the number of distinct ciphertext
/// bigrams, not the ciphertext length.
pub fn score_by_counts(
    stats: &CiphertextStats,
    first_char: Option<char>,
    permutation: &Permutation,
    alphabet: &Alphabet,
    logs: &LogTables,
) -> f64 {
    let mut log_prob = first_char_term(first_char, permutation, alphabet, logs);
    let idx = permuted_indices(permutation, alphabet);

    for cell in &stats.cells {
        log_prob += cell.count as f64 * pair_term(idx[cell.from], idx[cell.to], logs);
    }
    log_prob
}

/// Scans `text` pair by pair. Same result as `score_by_counts` on the stats of
/// `text`, only slower.
pub fn score_text(
    text: &str,
    permutation: &Permutation,
    alphabet: &Alphabet,
    logs: &LogTables,
) -> f64 {
    let mut log_prob = first_char_term(text.chars().next(), permutation, alphabet, logs);

    let mut prev: Option<char> = None;
    for c in text.chars() {
        if let Some(p) = prev {
            // Pairs with a ciphertext character the model lacks carry no evidence.
            if alphabet.contains(p) && alphabet.contains(c) {
                log_prob += pair_term(
                    alphabet.index_of(permutation.image(p)),
                    alphabet.index_of(permutation.image(c)),
                    logs,
                );
            }
        }
        prev = Some(c);
    }
    log_prob
}
