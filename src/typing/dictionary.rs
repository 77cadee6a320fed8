//! Word dictionary for the typing queue.

use anyhow::Result;
use rand::Rng;

/// Embedded word list, one word per line.
const EMBEDDED_WORDS: &str = include_str!("words.txt");

/// Fixed list of words sampled uniformly with replacement.
#[derive(Debug, Clone)]
pub struct Dictionary {
    words: Vec<String>,
}

impl Dictionary {
    /// Loads the embedded word list.
    #[must_use]
    pub fn embedded() -> Self {
        Self {
            words: EMBEDDED_WORDS
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// Builds a dictionary from custom words.
    ///
    /// # Errors
    ///
    /// Returns an error if no non-blank word is given.
    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let words: Vec<String> = words
            .into_iter()
            .map(|w| w.as_ref().trim().to_string())
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            anyhow::bail!("Dictionary must contain at least one word");
        }

        Ok(Self { words })
    }

    /// Picks one word uniformly at random.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        &self.words[rng.random_range(0..self.words.len())]
    }

    /// Number of words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Always false for a constructed dictionary.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Whether `word` is in the dictionary.
    #[must_use]
    pub fn contains(&self, word: &str) -> bool {
        self.words.iter().any(|w| w == word)
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::embedded()
    }
}
