//! Typing test engine.
//!
//! Keeps a rolling queue of dictionary words and the cursor into it. Every
//! queued word carries its trailing space, so the delimiter is typed and
//! classified like any other character. Completing a word samples a fresh
//! word onto the tail; once the queue is over capacity the oldest word is
//! evicted and the queue-relative index shifts down with it. The most
//! recently evicted word is kept with its typed text so Backspace can still
//! reach it.

pub mod dictionary;

use std::collections::VecDeque;
use std::fmt;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::models::{KeyEvent, NamedKey};

pub use dictionary::Dictionary;

/// Word delimiter appended to every queued word.
pub const DELIMITER: char = ' ';

/// What Backspace does at the start of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackspacePolicy {
    /// Backspace never leaves the current word.
    #[default]
    StayInWord,
    /// Backspace reopens the previous word with its typed text and erases
    /// its last character.
    CrossWordBoundary,
}

impl fmt::Display for BackspacePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StayInWord => write!(f, "stay in word"),
            Self::CrossWordBoundary => write!(f, "cross word boundary"),
        }
    }
}

/// Display class of one queued character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    /// Typed and matching
    Correct,
    /// Typed and wrong
    Incorrect,
    /// Not typed yet
    Untyped,
}

/// Effect of one key on the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingOutcome {
    /// A character was typed.
    Typed {
        /// Whether it matched the expected character
        correct: bool,
        /// Whether it finished the current word
        completed_word: bool,
    },
    /// A character was erased.
    Erased,
    /// The key had no effect on the text.
    Ignored,
}

impl TypingOutcome {
    /// True if the key changed the typed text.
    #[must_use]
    pub const fn consumed(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Keystroke statistics, counted when each character is typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypingStats {
    /// Characters typed that matched
    pub correct_chars: u32,
    /// Characters typed that did not match
    pub incorrect_chars: u32,
    /// Words finished
    pub completed_words: u32,
}

impl TypingStats {
    /// All typed characters.
    #[must_use]
    pub const fn total_chars(&self) -> u32 {
        self.correct_chars + self.incorrect_chars
    }

    /// Percentage of typed characters that matched; 100 when nothing was typed.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let total = self.total_chars();
        if total == 0 {
            100.0
        } else {
            f64::from(self.correct_chars) * 100.0 / f64::from(total)
        }
    }
}

/// Rolling word queue with cursor.
#[derive(Debug, Clone)]
pub struct TypingEngine {
    dictionary: Dictionary,
    rng: StdRng,
    queue: VecDeque<String>,
    /// Text typed for each completed word still in the queue (front aligned).
    history: VecDeque<String>,
    /// Word evicted last, with the text typed for it.
    evicted: Option<(String, String)>,
    word_index: usize,
    char_index: usize,
    typed_prefix: String,
    max_queue_length: usize,
    policy: BackspacePolicy,
    stats: TypingStats,
    absolute_word_index: u64,
}

impl TypingEngine {
    /// Creates an engine over the embedded dictionary with an OS-seeded RNG.
    #[must_use]
    pub fn new(max_queue_length: usize, policy: BackspacePolicy) -> Self {
        Self::with_rng(
            Dictionary::embedded(),
            StdRng::from_os_rng(),
            max_queue_length,
            policy,
        )
    }

    /// Creates a deterministic engine over the embedded dictionary.
    #[must_use]
    pub fn with_seed(max_queue_length: usize, policy: BackspacePolicy, seed: u64) -> Self {
        Self::with_rng(
            Dictionary::embedded(),
            StdRng::seed_from_u64(seed),
            max_queue_length,
            policy,
        )
    }

    /// Creates an engine with an explicit dictionary and RNG, filling the
    /// queue by sampling.
    #[must_use]
    pub fn with_rng(
        dictionary: Dictionary,
        rng: StdRng,
        max_queue_length: usize,
        policy: BackspacePolicy,
    ) -> Self {
        let mut engine = Self {
            dictionary,
            rng,
            queue: VecDeque::new(),
            history: VecDeque::new(),
            evicted: None,
            word_index: 0,
            char_index: 0,
            typed_prefix: String::new(),
            max_queue_length: max_queue_length.max(1),
            policy,
            stats: TypingStats::default(),
            absolute_word_index: 0,
        };
        engine.refill();
        engine
    }

    /// Creates an engine with a fixed initial queue.
    ///
    /// Words are taken in order up to `max_queue_length`. A shorter queue
    /// grows by one sampled word per completion until it reaches capacity;
    /// samples come from the embedded dictionary seeded with `seed`.
    #[must_use]
    pub fn from_words<I, S>(words: I, max_queue_length: usize, seed: u64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut engine = Self {
            dictionary: Dictionary::embedded(),
            rng: StdRng::seed_from_u64(seed),
            queue: VecDeque::new(),
            history: VecDeque::new(),
            evicted: None,
            word_index: 0,
            char_index: 0,
            typed_prefix: String::new(),
            max_queue_length: max_queue_length.max(1),
            policy: BackspacePolicy::default(),
            stats: TypingStats::default(),
            absolute_word_index: 0,
        };
        for word in words.into_iter().take(engine.max_queue_length) {
            engine.queue.push_back(with_delimiter(word.as_ref()));
        }
        if engine.queue.is_empty() {
            engine.push_sampled();
        }
        engine
    }

    /// Sets the backspace policy.
    #[must_use]
    pub fn with_policy(mut self, policy: BackspacePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Handles one normalized key.
    ///
    /// Printable characters (including the delimiter) and Backspace affect
    /// the text; every other named key is ignored.
    pub fn handle_key(&mut self, event: &KeyEvent) -> TypingOutcome {
        match event {
            KeyEvent::Named(NamedKey::Backspace) => self.backspace(),
            _ => event
                .typed_char()
                .map_or(TypingOutcome::Ignored, |c| self.type_char(c)),
        }
    }

    fn type_char(&mut self, c: char) -> TypingOutcome {
        let Some(expected) = self.current_word().chars().nth(self.char_index) else {
            return TypingOutcome::Ignored;
        };

        self.typed_prefix.push(c);
        self.char_index += 1;

        let correct = expected == c;
        if correct {
            self.stats.correct_chars += 1;
        } else {
            self.stats.incorrect_chars += 1;
        }

        let completed_word = self.char_index >= self.current_word().chars().count();
        if completed_word {
            self.complete_word();
        }

        TypingOutcome::Typed {
            correct,
            completed_word,
        }
    }

    fn backspace(&mut self) -> TypingOutcome {
        if self.char_index == 0 {
            if self.policy == BackspacePolicy::StayInWord {
                return TypingOutcome::Ignored;
            }
            let Some(previous) = self.reopen_previous() else {
                return TypingOutcome::Ignored;
            };
            self.absolute_word_index = self.absolute_word_index.saturating_sub(1);
            self.stats.completed_words = self.stats.completed_words.saturating_sub(1);
            self.char_index = previous.chars().count();
            self.typed_prefix = previous;
            if self.char_index == 0 {
                return TypingOutcome::Erased;
            }
        }

        self.char_index -= 1;
        self.typed_prefix.pop();
        TypingOutcome::Erased
    }

    /// Steps back onto the word before the current one and returns the text
    /// typed for it.
    fn reopen_previous(&mut self) -> Option<String> {
        if self.word_index > 0 {
            let typed = self.history.pop_back()?;
            self.word_index -= 1;
            return Some(typed);
        }

        let (word, typed) = self.evicted.take()?;
        self.queue.push_front(word);
        if self.queue.len() > self.max_queue_length {
            self.queue.pop_back();
        }
        Some(typed)
    }

    fn complete_word(&mut self) {
        self.history.push_back(std::mem::take(&mut self.typed_prefix));
        self.word_index += 1;
        self.absolute_word_index += 1;
        self.char_index = 0;
        self.stats.completed_words += 1;
        self.push_sampled();

        if self.queue.len() > self.max_queue_length {
            let word = self.queue.pop_front();
            if self.word_index > 0 {
                self.word_index -= 1;
                self.evicted = word.zip(self.history.pop_front());
            }
        }
    }

    fn push_sampled(&mut self) {
        let word = with_delimiter(self.dictionary.sample(&mut self.rng));
        self.queue.push_back(word);
    }

    fn refill(&mut self) {
        self.queue.clear();
        for _ in 0..self.max_queue_length {
            self.push_sampled();
        }
    }

    /// Starts over with a freshly sampled queue and zeroed statistics.
    pub fn reset(&mut self) {
        self.refill();
        self.history.clear();
        self.evicted = None;
        self.word_index = 0;
        self.char_index = 0;
        self.typed_prefix.clear();
        self.stats = TypingStats::default();
        self.absolute_word_index = 0;
    }

    /// Every queued character with its class, in queue order.
    ///
    /// Completed words are compared against the text typed for them, the
    /// current word against the typed prefix. Later words are untyped.
    pub fn render(&self) -> impl Iterator<Item = (char, CharClass)> + '_ {
        self.queue.iter().enumerate().flat_map(move |(w, word)| {
            let typed = match w.cmp(&self.word_index) {
                std::cmp::Ordering::Less => self.history.get(w).map(String::as_str),
                std::cmp::Ordering::Equal => Some(self.typed_prefix.as_str()),
                std::cmp::Ordering::Greater => None,
            };
            let mut typed_chars = typed.into_iter().flat_map(str::chars);
            word.chars().map(move |expected| {
                let class = match typed_chars.next() {
                    Some(t) if t == expected => CharClass::Correct,
                    Some(_) => CharClass::Incorrect,
                    None => CharClass::Untyped,
                };
                (expected, class)
            })
        })
    }

    /// Word being typed.
    #[must_use]
    pub fn current_word(&self) -> &str {
        self.queue.get(self.word_index).map_or("", String::as_str)
    }

    /// Queued words, trailing delimiters included.
    pub fn queue(&self) -> impl Iterator<Item = &str> {
        self.queue.iter().map(String::as_str)
    }

    /// Number of queued words.
    #[must_use]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Index of the current word within the queue.
    #[must_use]
    pub const fn word_index(&self) -> usize {
        self.word_index
    }

    /// Words completed since the last reset, unaffected by eviction.
    #[must_use]
    pub const fn absolute_word_index(&self) -> u64 {
        self.absolute_word_index
    }

    /// Cursor position within the current word.
    #[must_use]
    pub const fn char_index(&self) -> usize {
        self.char_index
    }

    /// Text typed for the current word.
    #[must_use]
    pub fn typed_prefix(&self) -> &str {
        &self.typed_prefix
    }

    /// Queue capacity.
    #[must_use]
    pub const fn max_queue_length(&self) -> usize {
        self.max_queue_length
    }

    /// Active backspace policy.
    #[must_use]
    pub const fn backspace_policy(&self) -> BackspacePolicy {
        self.policy
    }

    /// Changes the backspace policy.
    pub fn set_backspace_policy(&mut self, policy: BackspacePolicy) {
        self.policy = policy;
    }

    /// Keystroke statistics since the last reset.
    #[must_use]
    pub const fn stats(&self) -> TypingStats {
        self.stats
    }
}

fn with_delimiter(word: &str) -> String {
    let mut word = word.trim_end().to_string();
    word.push(DELIMITER);
    word
}
