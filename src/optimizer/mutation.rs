use crate::alphabet::Alphabet;
use crate::permutation::Permutation;
use fastrand::Rng;

/// Produces a neighbouring key. Implementations must leave `current` alone
/// and draw randomness only from `rng`.
pub trait Proposer: Send + Sync {
    fn propose(&self, current: &Permutation, alphabet: &Alphabet, rng: &mut Rng) -> Permutation;
}

/// Random transposition of two alphabet entries.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwapProposer;

impl Proposer for SwapProposer {
    #[inline(always)]
    fn propose(&self, current: &Permutation, alphabet: &Alphabet, rng: &mut Rng) -> Permutation {
        propose(current, alphabet, rng)
    }
}

/// Picks two distinct positions of `alphabet` and swaps their images.
///
/// An alphabet with fewer than two characters has no neighbours; the input is
/// returned as a copy.
pub fn propose(permutation: &Permutation, alphabet: &Alphabet, rng: &mut Rng) -> Permutation {
    let (i, j) = match pick_pair(alphabet.len(), rng) {
        Some(pair) => pair,
        None => return permutation.clone(),
    };
    permutation.swapped(alphabet.char_at(i), alphabet.char_at(j))
}

#[inline(always)]
fn pick_pair(len: usize, rng: &mut Rng) -> Option<(usize, usize)> {
    if len < 2 {
        return None;
    }
    let i = rng.usize(0..len);
    let mut j = rng.usize(0..len);
    while i == j {
        j = rng.usize(0..len);
    }
    Some((i, j))
}
