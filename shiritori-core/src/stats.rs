//! Per-game statistics derived from the history

use crate::state::{GameState, Seat};
use std::collections::HashSet;

/// Accepted words of one player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerStats {
    pub name: String,
    pub words: Vec<String>,
}

impl PlayerStats {
    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

/// Summary printed when a game ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStats {
    pub players: [PlayerStats; 2],
    pub total_turns: u32,
    pub unique_words: usize,
    /// Accepted words in order
    pub chain: Vec<String>,
}

impl GameStats {
    pub fn from_state(state: &GameState) -> Self {
        let accepted = || state.history().iter().filter(|r| r.accepted);
        let words_of = |seat: Seat| PlayerStats {
            name: state.player(seat).name().to_string(),
            words: accepted()
                .filter(|r| r.seat == seat)
                .filter_map(|r| r.word.clone())
                .collect(),
        };

        let chain: Vec<String> = accepted().filter_map(|r| r.word.clone()).collect();
        let unique_words = chain.iter().collect::<HashSet<_>>().len();

        Self {
            players: [words_of(Seat::First), words_of(Seat::Second)],
            total_turns: state.turn_counter(),
            unique_words,
            chain,
        }
    }

    /// `りんご → ごりら → らっぱ`
    pub fn chain_display(&self) -> String {
        self.chain.join(" → ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::engine::TurnEngine;

    #[test]
    fn test_stats_split_by_player() {
        let config = GameConfig::new();
        let mut state = GameState::new(&config);
        let engine = TurnEngine::new(&config);
        for w in ["りんご", "ごりら", "らっぱ", "ぱんだ", "だんご"] {
            engine.play_turn(&mut state, Some(w)).unwrap();
        }
        engine.play_turn(&mut state, Some("ごはん")).unwrap();

        let stats = GameStats::from_state(&state);
        assert_eq!(stats.players[0].name, "ノエル");
        assert_eq!(stats.players[0].words, vec!["りんご", "らっぱ", "だんご"]);
        assert_eq!(stats.players[1].word_count(), 2);
        assert_eq!(stats.total_turns, 5);
        assert_eq!(stats.unique_words, 5);
        assert_eq!(stats.chain_display(), "りんご → ごりら → らっぱ → ぱんだ → だんご");
    }
}
