use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum_macros::{Display, EnumIter, EnumString};

/// An ordered set of distinct characters plus the dense index of each one.
///
/// Order is first-seen order when built from text, so two alphabets built from
/// the same text always agree on indices.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Alphabet {
    chars: Vec<char>,
    index: HashMap<char, usize>,
}

impl Alphabet {
    /// Collects the distinct characters of `text` in first-seen order.
    pub fn from_text(text: &str) -> Self {
        Self::from_chars(text.chars())
    }

    /// Builds an alphabet from a character sequence; repeats are dropped.
    pub fn from_chars<I: IntoIterator<Item = char>>(chars: I) -> Self {
        let mut alphabet = Self::default();
        for c in chars {
            if !alphabet.index.contains_key(&c) {
                alphabet.index.insert(c, alphabet.chars.len());
                alphabet.chars.push(c);
            }
        }
        alphabet
    }

    /// `a..=z` followed by `A..=Z`.
    pub fn latin() -> Self {
        Self::from_chars(('a'..='z').chain('A'..='Z'))
    }

    pub fn lowercase() -> Self {
        Self::from_chars('a'..='z')
    }

    #[inline(always)]
    pub fn index_of(&self, c: char) -> Option<usize> {
        self.index.get(&c).copied()
    }

    #[inline(always)]
    pub fn char_at(&self, idx: usize) -> char {
        self.chars[idx]
    }

    pub fn contains(&self, c: char) -> bool {
        self.index.contains_key(&c)
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }
}

/// Which characters the sampler is allowed to shuffle.
#[derive(
    Debug, Clone, Copy, Default, EnumIter, EnumString, Display, PartialEq, Eq, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AlphabetPreset {
    /// Upper and lower case Latin letters.
    #[default]
    Latin,
    Lowercase,
    /// Whatever the training text contains.
    Training,
}

impl AlphabetPreset {
    pub fn resolve(&self, training: &Alphabet) -> Alphabet {
        match self {
            Self::Latin => Alphabet::latin(),
            Self::Lowercase => Alphabet::lowercase(),
            Self::Training => training.clone(),
        }
    }
}
