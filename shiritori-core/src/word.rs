//! # Words
//!
//! A `Word` is the literal token a player submits. Chaining and the
//! terminal-syllable rule look at *normalized* characters:
//! - katakana fold to hiragana (`ン` → `ん`)
//! - small kana fold to their full-size form (`ゃ` → `や`)
//! - a trailing long-vowel mark `ー` is skipped when reading the final character

use serde::{Deserialize, Serialize};
use std::fmt;

/// Words ending in this syllable lose immediately
pub const TERMINAL_SYLLABLE: char = 'ん';

/// Long-vowel mark, allowed inside words but ignored at the end
pub const LONG_VOWEL_MARK: char = 'ー';

/// Characters stripped from generated replies before anything else
const REPLY_NOISE: &[char] = &[
    '。', '、', '！', '？', '!', '?', '「', '」', '『', '』', '（', '）', '(', ')', '・', '.', ',',
];

/// A submitted word. Construction trims surrounding whitespace and refuses
/// empty text, so a `Word` always has at least one character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Word {
    text: String,
}

impl Word {
    /// Create a word from raw text. Returns `None` if nothing is left after trimming.
    pub fn new(text: impl AsRef<str>) -> Option<Self> {
        let text = text.as_ref().trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            text: text.to_string(),
        })
    }

    /// The trimmed text as submitted
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Identity used by the used-word set: the text with katakana folded to hiragana
    pub fn key(&self) -> String {
        self.text.chars().map(katakana_to_hiragana).collect()
    }

    /// Normalized first character
    pub fn first_char(&self) -> char {
        // text is never empty
        self.text.chars().next().map(normalize_char).unwrap_or(LONG_VOWEL_MARK)
    }

    /// Normalized final character, the one the next word has to start with
    pub fn final_char(&self) -> char {
        self.text
            .chars()
            .rev()
            .find(|c| *c != LONG_VOWEL_MARK)
            .or_else(|| self.text.chars().last())
            .map(normalize_char)
            .unwrap_or(LONG_VOWEL_MARK)
    }

    /// Whether the word ends in the terminal syllable `ん`
    pub fn ends_in_terminal(&self) -> bool {
        self.final_char() == TERMINAL_SYLLABLE
    }

    /// Whether every character is kana or the long-vowel mark
    pub fn is_kana(&self) -> bool {
        self.text.chars().all(is_kana)
    }

    /// Whether this word may follow `previous`
    pub fn chains_from(&self, previous: &Word) -> bool {
        self.first_char() == previous.final_char()
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl AsRef<str> for Word {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

// ============================================================================
// Character helpers
// ============================================================================

/// Hiragana, katakana, or the long-vowel mark
pub fn is_kana(c: char) -> bool {
    matches!(c, '\u{3041}'..='\u{3096}' | '\u{309D}'..='\u{309E}' | '\u{30A1}'..='\u{30FA}')
        || c == LONG_VOWEL_MARK
}

/// Fold a katakana character to hiragana; anything else is returned unchanged
pub fn katakana_to_hiragana(c: char) -> char {
    match c {
        '\u{30A1}'..='\u{30F6}' => char::from_u32(c as u32 - 0x60).unwrap_or(c),
        _ => c,
    }
}

/// Fold katakana to hiragana and small kana to full size
pub fn normalize_char(c: char) -> char {
    match katakana_to_hiragana(c) {
        'ぁ' => 'あ',
        'ぃ' => 'い',
        'ぅ' => 'う',
        'ぇ' => 'え',
        'ぉ' => 'お',
        'っ' => 'つ',
        'ゃ' => 'や',
        'ゅ' => 'ゆ',
        'ょ' => 'よ',
        'ゎ' => 'わ',
        'ゕ' => 'か',
        'ゖ' => 'け',
        other => other,
    }
}

/// Clean a generated reply down to a bare kana word.
///
/// Strips whitespace and punctuation, folds katakana to hiragana and drops
/// every remaining non-kana character (romaji glosses, kanji, emoji).
pub fn clean_reply(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace() && !REPLY_NOISE.contains(c))
        .map(katakana_to_hiragana)
        .filter(|c| is_kana(*c))
        .collect()
}
