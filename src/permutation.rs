use crate::alphabet::Alphabet;
use crate::error::{DcResult, DecipherError};
use fastrand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A character substitution table. Characters outside the map pass through
/// unchanged, so applying a partial map never loses text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permutation {
    map: BTreeMap<char, char>,
}

impl Permutation {
    pub fn identity(alphabet: &Alphabet) -> Self {
        Self {
            map: alphabet.chars().iter().map(|&c| (c, c)).collect(),
        }
    }

    /// Uniformly random bijection over `alphabet`.
    pub fn random(alphabet: &Alphabet, rng: &mut Rng) -> Self {
        let mut images = alphabet.chars().to_vec();
        rng.shuffle(&mut images);
        Self {
            map: alphabet.chars().iter().copied().zip(images).collect(),
        }
    }

    /// Identity over the model alphabet with the perturbation alphabet shuffled
    /// on top. Every model character gets an image, and the shuffled part only
    /// ever trades images inside `perturb`.
    pub fn starting_state(model: &Alphabet, perturb: &Alphabet, rng: &mut Rng) -> Self {
        let mut p = Self::identity(model);
        p.map.extend(Self::random(perturb, rng).map);
        p
    }

    /// Builds a map from explicit pairs, rejecting duplicates and non-bijections.
    pub fn from_pairs<I: IntoIterator<Item = (char, char)>>(pairs: I) -> DcResult<Self> {
        let mut map = BTreeMap::new();
        for (from, to) in pairs {
            if map.insert(from, to).is_some() {
                return Err(DecipherError::Validation(format!(
                    "Character '{}' is mapped more than once",
                    from
                )));
            }
        }
        let p = Self { map };
        if !p.is_bijective() {
            return Err(DecipherError::Validation(
                "Key is not a bijection over its characters".to_string(),
            ));
        }
        Ok(p)
    }

    #[inline(always)]
    pub fn get(&self, c: char) -> Option<char> {
        self.map.get(&c).copied()
    }

    /// Image of `c`, or `c` itself when unmapped.
    #[inline(always)]
    pub fn image(&self, c: char) -> char {
        self.get(c).unwrap_or(c)
    }

    /// Returns a copy with the images of `a` and `b` exchanged.
    pub fn swapped(&self, a: char, b: char) -> Self {
        let mut next = self.clone();
        next.map.insert(a, self.image(b));
        next.map.insert(b, self.image(a));
        next
    }

    pub fn apply(&self, text: &str) -> String {
        text.chars().map(|c| self.image(c)).collect()
    }

    pub fn inverse(&self) -> Self {
        Self {
            map: self.map.iter().map(|(&from, &to)| (to, from)).collect(),
        }
    }

    /// True when the image set equals the domain and no two keys share an image.
    pub fn is_bijective(&self) -> bool {
        let domain: BTreeSet<char> = self.map.keys().copied().collect();
        let image: BTreeSet<char> = self.map.values().copied().collect();
        image.len() == self.map.len() && domain == image
    }

    pub fn iter(&self) -> impl Iterator<Item = (char, char)> + '_ {
        self.map.iter().map(|(&k, &v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl fmt::Display for Permutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (from, to) in self.iter() {
            writeln!(f, "  {} -> {}", from, to)?;
        }
        Ok(())
    }
}
