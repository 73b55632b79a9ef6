use decipher::alphabet::Alphabet;
use decipher::optimizer::{
    chain_rng, run_best_of_n_chains, run_chain, ChainObserver, NoopObserver, ProgressEvent,
    SamplerParams, SwapProposer,
};
use decipher::permutation::Permutation;
use decipher::scorer::{BigramScorer, LanguageModel, NaiveScorer, Scorer};
use fastrand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const TRAIN: &str = "the quick brown fox";
const CIPHER: &str = "gur dhvpx oebja sbk";

struct Counter(AtomicUsize);

impl ChainObserver for Counter {
    fn on_progress(&self, e: &ProgressEvent<'_>) {
        assert!(e.temperature > 0.0);
        assert!(e.preview.chars().count() <= 70);
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

fn setup() -> (LanguageModel, Arc<BigramScorer>) {
    let model = LanguageModel::train(TRAIN).unwrap();
    let scorer = Arc::new(BigramScorer::new(&model, CIPHER));
    (model, scorer)
}

fn params(iterations: usize) -> SamplerParams {
    SamplerParams {
        iterations,
        print_every: 1_000,
        ..Default::default()
    }
}

const CORPUS: &str = "it was the best of times it was the worst of times it was the age of \
wisdom it was the age of foolishness the quick brown fox jumps over the lazy dog \
pack my box with five dozen liquor jugs";

fn rot13() -> Permutation {
    Permutation::from_pairs(
        Alphabet::lowercase()
            .chars()
            .iter()
            .map(|&c| (c, ((c as u8 - b'a' + 13) % 26 + b'a') as char)),
    )
    .unwrap()
}

#[test]
fn test_caesar_run_reaches_true_key_score() {
    let (model, scorer) = setup();
    let lower = Alphabet::lowercase();
    let truth = scorer.score(&rot13());

    let (result, score) =
        run_best_of_n_chains(4, scorer.clone(), &lower, CIPHER, params(50_000), Some(13), &NoopObserver)
            .unwrap();

    assert!(result.is_bijective());
    assert!(score >= truth - 1e-9, "search {} vs true key {}", score, truth);
    assert!(score > scorer.score(&Permutation::identity(&model.alphabet)));

    // Every pair that is scored decodes to characters the model knows.
    for cell in &scorer.stats.cells {
        for idx in [cell.from, cell.to] {
            let decoded = result.image(model.alphabet.char_at(idx));
            assert!(model.alphabet.contains(decoded), "decoded '{}' is unknown", decoded);
        }
    }
}

#[test]
fn test_latin_search_decodes_inside_model() {
    let model = LanguageModel::train(CORPUS).unwrap();
    let cipher = rot13().apply("it was the age of wisdom and the best of times");
    let scorer = Arc::new(BigramScorer::new(&model, &cipher));
    let truth = scorer.score(&rot13());

    let (result, score) = run_best_of_n_chains(
        8,
        scorer,
        &Alphabet::latin(),
        &cipher,
        params(60_000),
        Some(21),
        &NoopObserver,
    )
    .unwrap();

    let plain = result.apply(&cipher);
    assert!(
        plain.chars().all(|c| model.alphabet.contains(c)),
        "decoded outside the model: {}",
        plain
    );
    assert!(score >= truth - 1e-9, "search {} vs true key {}", score, truth);
}

#[test]
fn test_best_of_n_dominates_each_chain() {
    let (model, scorer) = setup();
    let lower = Alphabet::lowercase();
    let seed = 77;
    let p = params(5_000);

    let (best, best_score) =
        run_best_of_n_chains(4, scorer.clone(), &lower, CIPHER, p, Some(seed), &NoopObserver)
            .unwrap();

    let mut individual = Vec::new();
    for i in 0..4 {
        let mut rng = chain_rng(Some(seed), i);
        let initial = Permutation::starting_state(&model.alphabet, &lower, &mut rng);
        let perm = run_chain(
            initial,
            &SwapProposer,
            scorer.as_ref(),
            &lower,
            CIPHER,
            p,
            rng,
            &NoopObserver,
        );
        individual.push(scorer.score(&perm));
    }

    let max_single = individual.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    assert!(best_score >= max_single);
    assert_eq!(best_score, max_single);
    assert_eq!(scorer.score(&best), best_score);
}

#[test]
fn test_seeded_chain_is_reproducible() {
    let (model, scorer) = setup();
    let lower = Alphabet::lowercase();
    let run = || {
        let mut rng = Rng::with_seed(5);
        let initial = Permutation::starting_state(&model.alphabet, &lower, &mut rng);
        run_chain(initial, &SwapProposer, scorer.as_ref(), &lower, CIPHER, params(3_000), rng, &NoopObserver)
    };
    assert_eq!(run(), run());
}

#[test]
fn test_observer_does_not_perturb_sampling() {
    let (model, scorer) = setup();
    let lower = Alphabet::lowercase();
    let counter = Counter(AtomicUsize::new(0));

    let run = |observer: &dyn ChainObserver| {
        let mut rng = Rng::with_seed(21);
        let initial = Permutation::starting_state(&model.alphabet, &lower, &mut rng);
        run_chain(initial, &SwapProposer, scorer.as_ref(), &lower, CIPHER, params(4_000), rng, observer)
    };

    let quiet = run(&NoopObserver);
    let loud = run(&counter);
    assert_eq!(quiet, loud);
    assert_eq!(counter.0.load(Ordering::Relaxed), 4);
}

#[test]
fn test_single_iteration_is_safe() {
    let (model, scorer) = setup();
    let lower = Alphabet::lowercase();
    for iterations in [0, 1] {
        let mut rng = Rng::with_seed(1);
        let initial = Permutation::starting_state(&model.alphabet, &lower, &mut rng);
        let p = SamplerParams {
            iterations,
            print_every: 1,
            ..Default::default()
        };
        let out = run_chain(initial.clone(), &SwapProposer, scorer.as_ref(), &lower, CIPHER, p, rng, &NoopObserver);
        assert!(out.is_bijective());
        if iterations == 0 {
            assert_eq!(out, initial);
        }
    }
}

#[test]
fn test_naive_scorer_drives_the_same_search() {
    // The sampler treats the text as opaque context; a scorer that rescans it
    // must follow the exact same trajectory as the count-based one.
    let (model, scorer) = setup();
    let naive = NaiveScorer::new(&model);
    let lower = Alphabet::lowercase();

    let run = |s: &dyn Scorer| {
        let mut rng = Rng::with_seed(8);
        let initial = Permutation::starting_state(&model.alphabet, &lower, &mut rng);
        run_chain(initial, &SwapProposer, s, &lower, CIPHER, params(500), rng, &NoopObserver)
    };

    let a = run(scorer.as_ref());
    let b = run(&naive);
    assert!((scorer.score(&a) - scorer.score(&b)).abs() < 1e-6);
}

#[test]
fn test_empty_ciphertext_runs() {
    let model = LanguageModel::train(TRAIN).unwrap();
    let scorer = Arc::new(BigramScorer::new(&model, ""));
    let (perm, score) =
        run_best_of_n_chains(2, scorer, &Alphabet::lowercase(), "", params(100), Some(3), &NoopObserver)
            .unwrap();
    assert_eq!(score, 0.0);
    assert!(perm.is_bijective());
}
