pub mod mutation;
pub mod runner;

pub use self::mutation::{propose, Proposer, SwapProposer};
pub use self::runner::{
    chain_rng, run_best_of_n_chains, ChainSummary, OptimizationOptions, OptimizationResult,
    Optimizer,
};

use crate::alphabet::Alphabet;
use crate::permutation::Permutation;
use crate::scorer::Scorer;
use fastrand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Number of ciphertext characters decoded for progress previews.
pub const PREVIEW_CHARS: usize = 70;

/// Knobs of a single annealed chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerParams {
    pub iterations: usize,
    pub print_every: usize,
    pub initial_temp: f64,
    pub final_temp: f64,
}

impl Default for SamplerParams {
    fn default() -> Self {
        Self {
            iterations: 500_000,
            print_every: 10_000,
            initial_temp: 1.0,
            final_temp: 0.001,
        }
    }
}

impl SamplerParams {
    /// Per-iteration multiplier taking `initial_temp` to `final_temp` over the
    /// run. Runs of one step or fewer have no schedule and stay at `initial_temp`.
    pub fn cooling_factor(&self) -> f64 {
        if self.iterations <= 1 {
            return 1.0;
        }
        (self.final_temp / self.initial_temp).powf(1.0 / (self.iterations - 1) as f64)
    }
}

/// Snapshot handed to observers at each report interval.
#[derive(Debug, Clone)]
pub struct ProgressEvent<'a> {
    pub chain: usize,
    pub iteration: usize,
    pub temperature: f64,
    pub log_prob: f64,
    pub preview: &'a str,
}

/// Side channel for progress. Called from chain threads; every call is one
/// complete event.
pub trait ChainObserver: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent<'_>);

    /// When false the chain skips building previews altogether.
    fn enabled(&self) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ChainObserver for NoopObserver {
    fn on_progress(&self, _event: &ProgressEvent<'_>) {}

    fn enabled(&self) -> bool {
        false
    }
}

/// Logs each event through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ChainObserver for TracingObserver {
    fn on_progress(&self, e: &ProgressEvent<'_>) {
        info!(
            "Chain {:2} | Iter {:7} | Temp {:.5} | LogP {:.2} | {}...",
            e.chain + 1,
            e.iteration,
            e.temperature,
            e.log_prob,
            e.preview
        );
    }
}

/// One Metropolis-Hastings chain with a geometric cooling schedule.
///
/// Owns its key, score, temperature and random source; nothing here is shared
/// with other chains.
pub struct Chain {
    pub id: usize,
    pub permutation: Permutation,
    pub log_prob: f64,
    pub temperature: f64,
    pub cooling: f64,
    pub iteration: usize,
    pub accepted: usize,
    pub params: SamplerParams,
    pub rng: Rng,
}

impl Chain {
    pub fn new<S: Scorer + ?Sized>(
        id: usize,
        initial: Permutation,
        scorer: &S,
        context: &str,
        params: SamplerParams,
        rng: Rng,
    ) -> Self {
        let log_prob = scorer.log_density(context, &initial);
        Self {
            id,
            permutation: initial,
            log_prob,
            temperature: params.initial_temp,
            cooling: params.cooling_factor(),
            iteration: 0,
            accepted: 0,
            params,
            rng,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.iteration >= self.params.iterations
    }

    /// Proposes, scores, accepts or rejects, then cools. Returns whether the
    /// proposal was accepted.
    #[inline(always)]
    pub fn step<P, S>(&mut self, proposer: &P, scorer: &S, alphabet: &Alphabet, context: &str) -> bool
    where
        P: Proposer + ?Sized,
        S: Scorer + ?Sized,
    {
        let proposed = proposer.propose(&self.permutation, alphabet, &mut self.rng);
        let proposed_log_prob = scorer.log_density(context, &proposed);

        let u = open_unit(&mut self.rng);
        let accept = (proposed_log_prob - self.log_prob) / self.temperature > u.ln();
        if accept {
            self.permutation = proposed;
            self.log_prob = proposed_log_prob;
            self.accepted += 1;
        }
        accept
    }

    /// Runs the full iteration budget. There is no early exit.
    pub fn run<P, S, O>(&mut self, proposer: &P, scorer: &S, alphabet: &Alphabet, context: &str, observer: &O)
    where
        P: Proposer + ?Sized,
        S: Scorer + ?Sized,
        O: ChainObserver + ?Sized,
    {
        let report = observer.enabled() && self.params.print_every > 0;
        let head: String = if report {
            context.chars().take(PREVIEW_CHARS).collect()
        } else {
            String::new()
        };

        while !self.is_finished() {
            self.step(proposer, scorer, alphabet, context);

            if report && self.iteration % self.params.print_every == 0 {
                let preview = self.permutation.apply(&head);
                observer.on_progress(&ProgressEvent {
                    chain: self.id,
                    iteration: self.iteration,
                    temperature: self.temperature,
                    log_prob: self.log_prob,
                    preview: &preview,
                });
            }

            self.temperature *= self.cooling;
            self.iteration += 1;
        }
    }

    pub fn acceptance_rate(&self) -> f64 {
        if self.iteration == 0 {
            0.0
        } else {
            self.accepted as f64 / self.iteration as f64
        }
    }
}

/// Uniform draw from (0, 1); `ln` of it is always finite.
#[inline(always)]
fn open_unit(rng: &mut Rng) -> f64 {
    loop {
        let u = rng.f64();
        if u > 0.0 {
            return u;
        }
    }
}

/// Runs one chain from `initial` and returns its final key.
#[allow(clippy::too_many_arguments)]
pub fn run_chain<P, S, O>(
    initial: Permutation,
    proposer: &P,
    scorer: &S,
    alphabet: &Alphabet,
    context: &str,
    params: SamplerParams,
    rng: Rng,
    observer: &O,
) -> Permutation
where
    P: Proposer + ?Sized,
    S: Scorer + ?Sized,
    O: ChainObserver + ?Sized,
{
    let mut chain = Chain::new(0, initial, scorer, context, params, rng);
    chain.run(proposer, scorer, alphabet, context, observer);
    chain.permutation
}
