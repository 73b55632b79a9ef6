use crate::alphabet::Alphabet;
use crate::error::{DcResult, DecipherError};
use tracing::debug;

/// Added to every probability before taking logs.
pub const LOG_EPSILON: f64 = 1e-10;

/// Character-level unigram + bigram model trained on a corpus.
///
/// `transitions` is a flattened `n * n` table: row `i` holds
/// P(next = j | current = i) at `i * n + j`.
#[derive(Debug, Clone)]
pub struct LanguageModel {
    pub alphabet: Alphabet,
    pub frequencies: Vec<f64>,
    pub transitions: Vec<f64>,
}

impl LanguageModel {
    /// Trains on `text`. Every transition cell starts at a count of one
    /// (add-one smoothing), so no cell is ever zero.
    pub fn train(text: &str) -> DcResult<Self> {
        if text.is_empty() {
            return Err(DecipherError::Config(
                "Training text is empty; cannot build a language model".to_string(),
            ));
        }

        let alphabet = Alphabet::from_text(text);
        let n = alphabet.len();

        let mut frequencies = vec![0.0; n];
        let mut total_chars = 0usize;
        for c in text.chars() {
            if let Some(i) = alphabet.index_of(c) {
                frequencies[i] += 1.0;
            }
            total_chars += 1;
        }
        for f in frequencies.iter_mut() {
            *f /= total_chars as f64;
        }

        let mut transitions = vec![1.0; n * n];
        let mut prev: Option<usize> = None;
        for c in text.chars() {
            let cur = alphabet.index_of(c);
            if let (Some(p), Some(c)) = (prev, cur) {
                transitions[p * n + c] += 1.0;
            }
            prev = cur;
        }

        for row in transitions.chunks_mut(n) {
            let total: f64 = row.iter().sum();
            for cell in row.iter_mut() {
                *cell /= total;
            }
        }

        debug!(
            "Trained language model: {} chars, alphabet of {}",
            total_chars, n
        );

        Ok(Self {
            alphabet,
            frequencies,
            transitions,
        })
    }

    #[inline(always)]
    pub fn transition(&self, from: usize, to: usize) -> f64 {
        self.transitions[from * self.alphabet.len() + to]
    }

    /// Precomputes `ln(p + LOG_EPSILON)` for both tables.
    pub fn log_tables(&self) -> LogTables {
        LogTables {
            size: self.alphabet.len(),
            floor: LOG_EPSILON.ln(),
            log_freq: self.frequencies.iter().map(|&p| safe_ln(p)).collect(),
            log_trans: self.transitions.iter().map(|&p| safe_ln(p)).collect(),
        }
    }
}

/// Log-space copies of the model tables, built once per run and shared
/// read-only by every chain.
#[derive(Debug, Clone)]
pub struct LogTables {
    pub size: usize,
    /// `ln(LOG_EPSILON)`, charged for a decoded character outside the model.
    pub floor: f64,
    pub log_freq: Vec<f64>,
    pub log_trans: Vec<f64>,
}

impl LogTables {
    #[inline(always)]
    pub fn trans(&self, from: usize, to: usize) -> f64 {
        self.log_trans[from * self.size + to]
    }
}

#[inline(always)]
fn safe_ln(p: f64) -> f64 {
    (p + LOG_EPSILON).ln()
}
