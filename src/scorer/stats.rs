use crate::alphabet::Alphabet;

/// One observed bigram of the ciphertext, in model indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BigramCell {
    pub from: usize,
    pub to: usize,
    pub count: u32,
}

/// Bigram counts of the text being decoded, tabulated once against the
/// model alphabet. Characters the model never saw are dropped.
#[derive(Debug, Clone)]
pub struct CiphertextStats {
    pub size: usize,
    pub counts: Vec<u32>,
    // Sparse view of `counts`, row-major; this is what the scorer walks.
    pub cells: Vec<BigramCell>,
    /// `None` for an empty ciphertext.
    pub first_char: Option<char>,
}

impl CiphertextStats {
    pub fn compute(ciphertext: &str, model_alphabet: &Alphabet) -> Self {
        let n = model_alphabet.len();
        let mut counts = vec![0u32; n * n];

        let mut prev: Option<usize> = None;
        for c in ciphertext.chars() {
            let cur = model_alphabet.index_of(c);
            if let (Some(p), Some(c)) = (prev, cur) {
                counts[p * n + c] += 1;
            }
            prev = cur;
        }

        let cells = counts
            .iter()
            .enumerate()
            .filter(|(_, &count)| count > 0)
            .map(|(idx, &count)| BigramCell {
                from: idx / n,
                to: idx % n,
                count,
            })
            .collect();

        Self {
            size: n,
            counts,
            cells,
            first_char: ciphertext.chars().next(),
        }
    }

    #[inline(always)]
    pub fn count(&self, from: usize, to: usize) -> u32 {
        self.counts[from * self.size + to]
    }

    pub fn total_bigrams(&self) -> u64 {
        self.cells.iter().map(|c| c.count as u64).sum()
    }
}
