use crate::alphabet::{Alphabet, AlphabetPreset};
use crate::config::Config;
use crate::error::{DcResult, DecipherError};
use crate::optimizer::{chain_rng, ChainObserver, ChainSummary, OptimizationOptions, Optimizer};
use crate::permutation::Permutation;
use crate::scorer::{BigramScorer, LanguageModel};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a caller needs after a decoding run.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DecipherReport {
    pub log_prob: f64,
    pub plaintext: String,
    pub key: Permutation,
    pub best_chain: usize,
    pub chains: Vec<ChainSummary>,
    pub options: OptimizationOptions,
    pub model_alphabet_size: usize,
    pub perturb: AlphabetPreset,
}

/// Service: train on `training_text`, search for the key that makes
/// `ciphertext` most probable, and decode it.
pub fn decipher<O: ChainObserver + ?Sized>(
    training_text: &str,
    ciphertext: &str,
    config: &Config,
    observer: &O,
) -> DcResult<DecipherReport> {
    config.search.validate()?;

    let model = LanguageModel::train(training_text)?;
    let perturb = config.alphabet.perturb.resolve(&model.alphabet);
    let options = OptimizationOptions::from(config);
    options.validate(&perturb)?;

    info!(
        "Model alphabet: {} chars | Shuffling: {} ({} chars)",
        model.alphabet.len(),
        config.alphabet.perturb,
        perturb.len()
    );

    let unseen = ciphertext
        .chars()
        .filter(|&c| !model.alphabet.contains(c))
        .count();
    if unseen > 0 {
        warn!(
            "{} ciphertext chars never appear in the training text and carry no evidence",
            unseen
        );
    }

    let scorer = Arc::new(BigramScorer::new(&model, ciphertext));
    let optimizer = Optimizer::new(scorer, perturb, options.clone());
    let result = optimizer.run(ciphertext, observer)?;

    Ok(DecipherReport {
        log_prob: result.log_prob,
        plaintext: result.permutation.apply(ciphertext),
        key: result.permutation,
        best_chain: result.best_chain,
        chains: result.chains,
        options,
        model_alphabet_size: model.alphabet.len(),
        perturb: config.alphabet.perturb,
    })
}

#[derive(Debug, Clone)]
pub struct Scrambled {
    pub key: Permutation,
    pub ciphertext: String,
}

/// Service: encode `text` with a fresh random key over the chosen alphabet.
pub fn scramble(text: &str, preset: AlphabetPreset, seed: Option<u64>) -> DcResult<Scrambled> {
    if text.is_empty() {
        return Err(DecipherError::Config(
            "Input text is empty; nothing to scramble".to_string(),
        ));
    }
    let alphabet = preset.resolve(&Alphabet::from_text(text));
    let key = Permutation::random(&alphabet, &mut chain_rng(seed, 0));
    let ciphertext = key.apply(text);
    Ok(Scrambled { key, ciphertext })
}
