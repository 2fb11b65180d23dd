use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::options::Options;

/// 1-in-N chance that a token becomes a number when numbers are enabled
const NUMBER_ODDS: u32 = 10;
/// 1-in-N chance that a word gets a trailing punctuation mark
const PUNCTUATION_ODDS: u32 = 5;

const PUNCTUATION: &[char] = &[
    '.', ',', ';', ':', '!', '?', '@', '#', '&', '%', '^', '*', '(', ')',
];

const WORDS: &[&str] = &[
    "about", "above", "across", "after", "again", "air", "all", "almost", "also", "always",
    "among", "an", "and", "another", "answer", "any", "around", "as", "ask", "at",
    "away", "back", "base", "be", "because", "been", "before", "begin", "below", "between",
    "both", "bring", "build", "but", "by", "call", "can", "change", "check", "close",
    "come", "common", "consider", "could", "course", "create", "day", "decide", "did",
    "different", "do", "does", "done", "down", "each", "early", "easy", "end", "enough",
    "even", "every", "example", "eye", "face", "fact", "family", "far", "fast", "feel",
    "few", "find", "first", "for", "form", "found", "from", "full", "get", "give", "go",
    "good", "great", "group", "grow", "had", "hand", "hard", "has", "have", "he",
    "head", "hear", "help", "her", "here", "high", "him", "his", "hold", "home",
    "how", "if", "important", "in", "into", "is", "it", "its", "just", "keep",
    "kind", "know", "large", "last", "late", "lead", "learn", "leave", "left", "less",
    "let", "life", "like", "line", "little", "long", "look", "made", "make", "man",
    "many", "may", "mean", "might", "more", "most", "move", "much", "must", "my",
    "name", "near", "need", "never", "new", "next", "no", "not", "now", "number",
    "of", "off", "often", "old", "on", "once", "one", "only", "open", "or",
    "order", "other", "our", "out", "over", "own", "part", "people", "place", "plan",
    "play", "point", "possible", "problem", "program", "public", "put", "question", "quick",
    "read", "real", "really", "right", "run", "said", "same", "saw", "say", "school",
    "see", "seem", "set", "she", "should", "show", "side", "small", "so", "some",
    "something", "sound", "start", "state", "still", "story", "such", "system", "take",
    "tell", "than", "that", "the", "their", "them", "then", "there", "these", "they",
    "thing", "think", "this", "those", "time", "to", "too", "try", "turn", "two",
    "under", "up", "use", "very", "want", "was", "way", "we", "well", "went", "were",
    "what", "when", "where", "which", "while", "who", "why", "will", "with", "word",
    "work", "world", "would", "write", "year", "you", "your",
];

/// Produces space separated target text from the built-in word list
#[derive(Debug)]
pub struct Generator {
    rng: StdRng,
}

impl Generator {
    pub fn new(rng: StdRng) -> Self {
        Self { rng }
    }

    /// Deterministic generator, same seed gives the same text
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    /// `count` space joined tokens
    pub fn build(&mut self, count: usize, options: &Options) -> Vec<char> {
        let mut text = Vec::new();
        self.push_tokens(&mut text, count, options);
        text
    }

    /// Append `count` tokens to `target`, separated from existing text by one space
    pub fn extend(&mut self, target: &mut Vec<char>, count: usize, options: &Options) {
        if count == 0 {
            return;
        }
        if !target.is_empty() {
            target.push(' ');
        }
        self.push_tokens(target, count, options);
    }

    fn push_tokens(&mut self, text: &mut Vec<char>, count: usize, options: &Options) {
        for i in 0..count {
            if i > 0 {
                text.push(' ');
            }
            let token = self.next_token(options);
            text.extend(token.chars());
        }
    }

    fn next_token(&mut self, options: &Options) -> String {
        if options.numbers && self.rng.gen_ratio(1, NUMBER_ODDS) {
            return self.rng.gen_range(1..=9999u32).to_string();
        }
        let mut word = WORDS.choose(&mut self.rng).copied().unwrap_or("the").to_string();
        if options.punctuation && self.rng.gen_ratio(1, PUNCTUATION_ODDS) {
            if let Some(mark) = PUNCTUATION.choose(&mut self.rng) {
                word.push(*mark);
            }
        }
        word
    }
}
