pub mod engine;
pub mod loader;
pub mod model;
pub mod stats;

pub use self::model::{LanguageModel, LogTables, LOG_EPSILON};
pub use self::stats::{BigramCell, CiphertextStats};

use crate::alphabet::Alphabet;
use crate::error::DcResult;
use crate::permutation::Permutation;

/// Log-density of a candidate key. Higher is better.
///
/// `text` is whatever context the sampler was handed; implementations that
/// work from precomputed statistics are free to ignore it.
pub trait Scorer: Send + Sync {
    fn log_density(&self, text: &str, permutation: &Permutation) -> f64;
}

/// Scores against ciphertext bigram counts tabulated up front.
#[derive(Debug, Clone)]
pub struct BigramScorer {
    pub alphabet: Alphabet,
    pub tables: LogTables,
    pub stats: CiphertextStats,
}

impl BigramScorer {
    pub fn new(model: &LanguageModel, ciphertext: &str) -> Self {
        Self {
            alphabet: model.alphabet.clone(),
            tables: model.log_tables(),
            stats: CiphertextStats::compute(ciphertext, &model.alphabet),
        }
    }

    #[inline(always)]
    pub fn score(&self, permutation: &Permutation) -> f64 {
        engine::score_by_counts(
            &self.stats,
            self.stats.first_char,
            permutation,
            &self.alphabet,
            &self.tables,
        )
    }
}

impl Scorer for BigramScorer {
    #[inline(always)]
    fn log_density(&self, _text: &str, permutation: &Permutation) -> f64 {
        self.score(permutation)
    }
}

/// Rescans the context text on every call.
#[derive(Debug, Clone)]
pub struct NaiveScorer {
    pub alphabet: Alphabet,
    pub tables: LogTables,
}

impl NaiveScorer {
    pub fn new(model: &LanguageModel) -> Self {
        Self {
            alphabet: model.alphabet.clone(),
            tables: model.log_tables(),
        }
    }
}

impl Scorer for NaiveScorer {
    fn log_density(&self, text: &str, permutation: &Permutation) -> f64 {
        engine::score_text(text, permutation, &self.alphabet, &self.tables)
    }
}

pub fn build_language_model(training_text: &str) -> DcResult<LanguageModel> {
    LanguageModel::train(training_text)
}

pub fn precompute_ciphertext_stats(ciphertext: &str, model_alphabet: &Alphabet) -> CiphertextStats {
    CiphertextStats::compute(ciphertext, model_alphabet)
}

pub fn score(
    stats: &CiphertextStats,
    first_char: Option<char>,
    permutation: &Permutation,
    model_alphabet: &Alphabet,
    tables: &LogTables,
) -> f64 {
    engine::score_by_counts(stats, first_char, permutation, model_alphabet, tables)
}
