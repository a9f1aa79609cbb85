//! Rule-based player that draws from a fixed vocabulary.
//!
//! Used for offline games and as a deterministic opponent in tests.

use crate::player::{Player, PlayerMove};
use async_trait::async_trait;
use shiritori_core::{TurnContext, Word};
use tracing::debug;

/// Built-in vocabulary, all hiragana, none ending in `ん`
const DEFAULT_VOCABULARY: &[&str] = &[
    "しりとり", "りんご", "ごりら", "らっぱ", "ぱせり", "りす", "すいか", "からす",
    "すずめ", "めだか", "かめ", "めがね", "ねこ", "こあら", "らくだ", "だちょう",
    "うさぎ", "ぎたー", "たまご", "ごま", "まくら", "いちご", "いか", "かさ",
    "さる", "るびー", "びーる", "るす", "すし", "しか", "かに", "にわとり",
    "りか", "かば", "ばった", "たぬき", "きつね", "ねずみ", "みみず", "きのこ",
    "こま", "まり", "りゅう", "うし", "しま", "まめ", "ろうそく", "くり",
    "とけい", "いす", "すもも", "もも", "もみじ", "じどうしゃ", "やま", "まど",
    "どんぐり", "つくえ", "えんぴつ", "つみき", "きって", "てがみ", "みず", "えび",
    "びわ", "わに", "にく", "くま", "まつり", "つばめ", "めじろ", "ろば",
    "ばなな", "なす", "すいとう", "うちわ", "わたがし", "しお", "おにぎり",
];

/// Plays the first unused vocabulary word that chains; resigns when none is left
pub struct DictionaryPlayer {
    name: String,
    vocabulary: Vec<Word>,
}

impl DictionaryPlayer {
    /// Player using the built-in vocabulary
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_vocabulary(name, DEFAULT_VOCABULARY.iter().copied())
    }

    pub fn with_vocabulary<I, S>(name: impl Into<String>, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vocabulary = words
            .into_iter()
            .filter_map(Word::new)
            .filter(|w| w.is_kana() && !w.ends_in_terminal())
            .collect();
        Self {
            name: name.into(),
            vocabulary,
        }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// First legal word for this turn, if any
    pub fn choose(&self, ctx: &TurnContext) -> Option<&Word> {
        let initial = ctx.required_initial();
        self.vocabulary.iter().find(|w| {
            initial.map_or(true, |c| w.first_char() == c) && !ctx.is_used(w)
        })
    }
}

#[async_trait]
impl Player for DictionaryPlayer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn next_word(&mut self, ctx: &TurnContext) -> PlayerMove {
        match self.choose(ctx) {
            Some(word) => PlayerMove::Word(word.text().to_string()),
            None => {
                debug!(player = %self.name, initial = ?ctx.required_initial(), "no word left");
                PlayerMove::Resign
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiritori_core::{GameConfig, GameState, TurnEngine};

    fn context_after(words: &[&str]) -> TurnContext {
        let config = GameConfig::new();
        let mut state = GameState::new(&config);
        let engine = TurnEngine::new(&config);
        for w in words {
            engine.play_turn(&mut state, Some(w)).unwrap();
        }
        state.context()
    }

    #[test]
    fn test_vocabulary_filters_illegal_words() {
        let player = DictionaryPlayer::with_vocabulary("テスト", ["りんご", "みかん", "apple", " "]);
        assert_eq!(player.vocabulary_len(), 1);

        let builtin = DictionaryPlayer::new("テスト");
        assert!(builtin.vocabulary.iter().all(|w| !w.ends_in_terminal()));
        assert!(builtin.vocabulary_len() > 50);
    }

    #[test]
    fn test_choose_chains_and_skips_used() {
        let player = DictionaryPlayer::with_vocabulary("テスト", ["りんご", "ごりら", "ごま"]);

        assert_eq!(player.choose(&context_after(&[])).unwrap().text(), "りんご");
        assert_eq!(player.choose(&context_after(&["りんご"])).unwrap().text(), "ごりら");
        assert_eq!(
            player.choose(&context_after(&["すいか", "かご", "ごりら", "らっぱ", "ぱご"])).unwrap().text(),
            "ごま"
        );
    }

    #[test]
    fn test_choose_folds_small_kana() {
        let player = DictionaryPlayer::with_vocabulary("テスト", ["やま"]);
        assert_eq!(player.choose(&context_after(&["きしゃ"])).unwrap().text(), "やま");
    }

    #[tokio::test]
    async fn test_resigns_without_a_word() {
        let mut player = DictionaryPlayer::with_vocabulary("テスト", ["りんご"]);
        let ctx = context_after(&["りんご"]);
        assert_eq!(player.next_word(&ctx).await, PlayerMove::Resign);
    }
}
