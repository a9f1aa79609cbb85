//! Game runner - alternates players, bounds each turn with a timeout and
//! feeds the result to the turn engine
//!
//! Every turn is also an exchange of messages: the waiting player sends a
//! `Request` with the word to chain from, the mover answers with a
//! `Response`, or with an `Error` / `Timeout` reply when it has no word.

use crate::player::{Player, PlayerMove};
use chrono::{DateTime, Utc};
use shiritori_core::{
    A2aMessage, Error, Exchange, GameConfig, GameLog, GameState, GameStats, GameStatus, LogSink,
    MessageType, Result, Seat, TurnEngine, TurnRecord,
};
use tokio::time::{timeout, Instant};
use tracing::{info, warn};

/// Called after every recorded turn
pub type TurnCallback = Box<dyn FnMut(&TurnRecord) + Send>;

/// Everything known about a finished game
pub struct GameReport {
    pub state: GameState,
    pub log: GameLog,
    pub stats: GameStats,
    /// Where the log was written, if it was
    pub saved_to: Option<String>,
}

impl GameReport {
    pub fn status(&self) -> GameStatus {
        self.state.status()
    }
}

/// One game between two players
pub struct Game {
    config: GameConfig,
    state: GameState,
    players: [Box<dyn Player>; 2],
    exchange: Exchange,
    on_turn: Option<TurnCallback>,
    sink: Option<Box<dyn LogSink>>,
    started_at: DateTime<Utc>,
}

impl Game {
    /// Create a game. The configuration is validated here, and each player's
    /// name must match the configured name for its seat.
    pub fn new(config: GameConfig, first: Box<dyn Player>, second: Box<dyn Player>) -> Result<Self> {
        config.validate()?;
        for (seat, player) in [(Seat::First, &first), (Seat::Second, &second)] {
            let expected = config.player_name(seat);
            if player.name() != expected {
                return Err(Error::config_invalid("player name does not match its seat")
                    .with_operation("game::new")
                    .with_context("seat", format!("{:?}", seat))
                    .with_context("expected", expected)
                    .with_context("actual", player.name()));
            }
        }

        let state = GameState::new(&config);
        Ok(Self {
            config,
            state,
            players: [first, second],
            exchange: Exchange::new(),
            on_turn: None,
            sink: None,
            started_at: Utc::now(),
        })
    }

    /// Set a callback invoked with each turn record as it happens
    pub fn with_turn_callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(&TurnRecord) + Send + 'static,
    {
        self.on_turn = Some(Box::new(callback));
        self
    }

    /// Where to export the log when `save_log` is enabled
    pub fn with_log_sink(mut self, sink: Box<dyn LogSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Messages exchanged so far
    pub fn exchange(&self) -> &Exchange {
        &self.exchange
    }

    /// Play one turn of the current player and return the resulting status
    pub async fn play_turn(&mut self) -> Result<GameStatus> {
        if self.state.is_over() {
            return Err(Error::game_finished(self.state.status().label())
                .with_operation("game::play_turn"));
        }

        let engine = TurnEngine::new(&self.config);
        let seat = self.state.current_seat();
        let ctx = self.state.context();

        let request = self.exchange.post(
            A2aMessage::new(&ctx.opponent, &ctx.player, MessageType::Request, ctx.turn)
                .with_word(ctx.last_word.as_ref().map(|w| w.text().to_string())),
        );
        self.exchange.receive(&ctx.player, &request)?;

        let player = &mut self.players[seat.index()];
        let started = Instant::now();
        let reply = timeout(self.config.turn_timeout, player.next_word(&ctx)).await;
        let elapsed = started.elapsed();

        let answer = A2aMessage::new(&ctx.player, &ctx.opponent, MessageType::Response, ctx.turn)
            .in_reply_to(&request);
        let answer = match reply {
            Ok(PlayerMove::Word(word)) => {
                engine.play_timed_turn(&mut self.state, Some(word.as_str()), elapsed)?;
                answer.with_word(Some(word))
            }
            Ok(PlayerMove::NoWord) => {
                engine.play_timed_turn(&mut self.state, None, elapsed)?;
                answer.with_type(MessageType::Error).with_error("no word produced")
            }
            Ok(PlayerMove::Resign) => {
                engine.concede_timed(&mut self.state, elapsed)?;
                answer.with_type(MessageType::Error).with_error("resigned")
            }
            Err(_) => {
                let err = Error::timeout("game::play_turn", self.config.turn_timeout.as_secs_f64())
                    .with_context("player", ctx.player.clone());
                warn!(turn = ctx.turn, error = %err, "player timed out");
                engine.play_timed_turn(&mut self.state, None, elapsed)?;
                answer.with_type(MessageType::Timeout).with_error(err.message())
            }
        };

        // the request is handled when a word came back; the reply when it was accepted
        let accepted = self.state.history().last().is_some_and(|r| r.accepted);
        self.exchange.settle(&request, !answer.is_failure())?;
        let answer = self.exchange.post(answer);
        self.exchange.receive(&ctx.opponent, &answer)?;
        self.exchange.settle(&answer, accepted)?;

        if let (Some(callback), Some(record)) = (self.on_turn.as_mut(), self.state.history().last()) {
            callback(record);
        }
        Ok(self.state.status())
    }

    /// Run turns until the game ends, then build (and optionally save) the log
    pub async fn play(mut self) -> Result<GameReport> {
        self.started_at = Utc::now();
        info!(
            first = %self.config.first_player,
            second = %self.config.second_player,
            max_turns = self.config.max_turns,
            "game started"
        );

        while !self.state.is_over() {
            self.play_turn().await?;
        }

        let status = self.state.status();
        info!(
            status = status.label(),
            turns = self.state.turn_counter(),
            reason = %status.describe(&self.config),
            "game over"
        );

        let log = GameLog::from_state(&self.state, &self.config, self.started_at)
            .with_messages(std::mem::take(&mut self.exchange).into_messages());
        let saved_to = match (&mut self.sink, self.config.save_log) {
            (Some(sink), true) => match sink.write(&log) {
                Ok(location) => Some(location),
                Err(e) => {
                    warn!(error = %e, "failed to save game log");
                    None
                }
            },
            _ => None,
        };

        Ok(GameReport {
            stats: GameStats::from_state(&self.state),
            state: self.state,
            log,
            saved_to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::DictionaryPlayer;
    use async_trait::async_trait;
    use shiritori_core::{ErrorKind, LossReason, MemorySink, MessageStatus, TurnContext};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Plays a fixed list of moves, optionally taking its time
    struct ScriptedPlayer {
        name: String,
        moves: VecDeque<PlayerMove>,
        delay: Duration,
    }

    impl ScriptedPlayer {
        fn new(name: &str, words: &[&str]) -> Self {
            Self {
                name: name.to_string(),
                moves: words.iter().map(|w| PlayerMove::from_reply(*w)).collect(),
                delay: Duration::ZERO,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn boxed(self) -> Box<dyn Player> {
            Box::new(self)
        }
    }

    #[async_trait]
    impl Player for ScriptedPlayer {
        fn name(&self) -> &str {
            &self.name
        }

        async fn next_word(&mut self, _ctx: &TurnContext) -> PlayerMove {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.moves.pop_front().unwrap_or(PlayerMove::NoWord)
        }
    }

    fn game(config: GameConfig, first: &[&str], second: &[&str]) -> Game {
        Game::new(
            config,
            ScriptedPlayer::new("ノエル", first).boxed(),
            ScriptedPlayer::new("フレア", second).boxed(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_draw_at_turn_limit() {
        let report = game(GameConfig::new().with_max_turns(2), &["りんご"], &["ごま"])
            .play()
            .await
            .unwrap();

        assert_eq!(report.status(), GameStatus::Draw);
        assert_eq!(report.state.turn_counter(), 2);
        assert_eq!(report.stats.chain_display(), "りんご → ごま");
        assert_eq!(report.log.final_status.winner, None);
        assert_eq!(report.saved_to, None);
    }

    #[tokio::test]
    async fn test_duplicate_loses() {
        let report = game(GameConfig::new(), &["りんご", "らっぱ"], &["ごりら", "りんご"])
            .play()
            .await
            .unwrap();

        // りんご also breaks the chain, duplicate is checked first
        assert_eq!(
            report.status(),
            GameStatus::Lost {
                loser: Seat::Second,
                reason: LossReason::DuplicateWord
            }
        );
        assert_eq!(report.state.turn_counter(), 3);
        assert_eq!(report.state.history().len(), 4);
    }

    #[tokio::test]
    async fn test_empty_reply_loses() {
        let report = game(GameConfig::new(), &["りんご"], &[""]).play().await.unwrap();
        assert_eq!(
            report.status(),
            GameStatus::Lost {
                loser: Seat::Second,
                reason: LossReason::NoResponse
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_no_response() {
        let config = GameConfig::new().with_turn_timeout(Duration::from_secs(180));
        let slow = ScriptedPlayer::new("ノエル", &["りんご"]).with_delay(Duration::from_secs(200));
        let report = Game::new(config, slow.boxed(), ScriptedPlayer::new("フレア", &[]).boxed())
            .unwrap()
            .play()
            .await
            .unwrap();

        assert_eq!(
            report.status(),
            GameStatus::Lost {
                loser: Seat::First,
                reason: LossReason::NoResponse
            }
        );
        let record = &report.state.history()[0];
        assert_eq!(record.word, None);
        assert!(!record.accepted);
        assert!(record.elapsed_ms >= 180_000);
        assert_eq!(report.state.turn_counter(), 0);

        let messages = &report.log.messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].status, MessageStatus::Failed);
        assert_eq!(messages[1].message_type, MessageType::Timeout);
        assert_eq!(messages[1].sender, "ノエル");
        assert_eq!(messages[1].status, MessageStatus::Failed);
        assert!(messages[1].error.as_deref().is_some_and(|e| e.contains("180.0")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_but_in_time_is_accepted() {
        let config = GameConfig::new()
            .with_max_turns(1)
            .with_turn_timeout(Duration::from_secs(5));
        let slow = ScriptedPlayer::new("ノエル", &["りんご"]).with_delay(Duration::from_secs(4));
        let report = Game::new(config, slow.boxed(), ScriptedPlayer::new("フレア", &[]).boxed())
            .unwrap()
            .play()
            .await
            .unwrap();

        assert_eq!(report.status(), GameStatus::Draw);
        assert!(report.state.history()[0].elapsed_ms >= 4_000);
    }

    #[tokio::test]
    async fn test_resign_wins_for_opponent() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let callback_seen = seen.clone();

        let report = Game::new(
            GameConfig::new(),
            ScriptedPlayer::new("ノエル", &["りんご"]).boxed(),
            Box::new(DictionaryPlayer::with_vocabulary("フレア", ["すいか"])),
        )
        .unwrap()
        .with_turn_callback(move |record| {
            callback_seen.lock().unwrap().push((record.player.clone(), record.reason));
        })
        .play()
        .await
        .unwrap();

        assert_eq!(report.status(), GameStatus::Won { winner: Seat::First });
        assert_eq!(report.log.final_status.winner.as_deref(), Some("ノエル"));
        assert_eq!(report.log.final_status.status, "won");

        // the resignation is a recorded turn like any other ending
        let history = report.state.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].player, "フレア");
        assert_eq!(history[1].word, None);
        assert!(!history[1].accepted);
        assert_eq!(history[1].reason, Some(LossReason::Resigned));
        assert_eq!(report.log.records.len(), 2);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                ("ノエル".to_string(), None),
                ("フレア".to_string(), Some(LossReason::Resigned))
            ]
        );

        let last = report.log.messages.last().unwrap();
        assert_eq!(last.message_type, MessageType::Error);
        assert_eq!(last.error.as_deref(), Some("resigned"));
    }

    #[tokio::test]
    async fn test_each_turn_is_a_request_and_reply() {
        let mut game = game(GameConfig::new(), &["りんご", "らっぱ"], &["ごりら", "りんご"]);
        game.play_turn().await.unwrap();

        let exchange = game.exchange();
        assert_eq!(exchange.len(), 2);
        let request = &exchange.messages()[0];
        assert_eq!(request.message_type, MessageType::Request);
        assert_eq!((request.sender.as_str(), request.receiver.as_str()), ("フレア", "ノエル"));
        assert_eq!(request.word, None);
        assert_eq!(request.status, MessageStatus::Processed);

        let reply = &exchange.messages()[1];
        assert_eq!(reply.message_type, MessageType::Response);
        assert_eq!(reply.word.as_deref(), Some("りんご"));
        assert_eq!(reply.reply_to.as_deref(), Some(request.id.as_str()));
        assert_eq!(reply.status, MessageStatus::Processed);

        let report = game.play().await.unwrap();
        let messages = &report.log.messages;
        assert_eq!(messages.len(), 8);
        // turn 2's request carries the word to chain from
        assert_eq!(messages[2].word.as_deref(), Some("りんご"));
        assert_eq!(messages[2].turn, 2);
        // the duplicate is a response the engine rejected
        assert_eq!(messages[7].message_type, MessageType::Response);
        assert_eq!(messages[7].status, MessageStatus::Failed);

        let history = shiritori_core::MessageHistory::for_agent(messages, "フレア");
        assert_eq!(history.sent.len(), 4);
        assert_eq!(history.received.len(), 4);
    }

    #[tokio::test]
    async fn test_no_word_is_an_error_reply() {
        let report = game(GameConfig::new(), &["りんご"], &[""]).play().await.unwrap();
        let last = report.log.messages.last().unwrap();

        assert_eq!(last.message_type, MessageType::Error);
        assert_eq!(last.sender, "フレア");
        assert_eq!(last.word, None);
        assert_eq!(last.error.as_deref(), Some("no word produced"));
        assert!(last.status.is_settled());
    }

    #[tokio::test]
    async fn test_dictionary_players_reach_draw() {
        let config = GameConfig::new().with_max_turns(6);
        let report = Game::new(
            config,
            Box::new(DictionaryPlayer::new("ノエル")),
            Box::new(DictionaryPlayer::new("フレア")),
        )
        .unwrap()
        .play()
        .await
        .unwrap();

        assert_eq!(report.status(), GameStatus::Draw);
        assert_eq!(report.stats.unique_words, 6);
        assert_eq!(report.stats.players[0].word_count(), 3);
    }

    #[tokio::test]
    async fn test_callback_and_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink_seen = seen.clone();

        let report = game(GameConfig::new().with_save_log(true), &["りんご", "らいおん"], &["ごりら"])
            .with_turn_callback(move |record| {
                sink_seen.lock().unwrap().push(record.word.clone());
            })
            .with_log_sink(Box::new(MemorySink::new()))
            .play()
            .await
            .unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                Some("りんご".to_string()),
                Some("ごりら".to_string()),
                Some("らいおん".to_string())
            ]
        );
        assert_eq!(report.saved_to.as_deref(), Some("memory#0"));
        assert_eq!(report.log.records.len(), 3);
    }

    #[tokio::test]
    async fn test_play_turn_after_end_fails() {
        let mut game = game(GameConfig::new().with_max_turns(1), &["りんご", "ごま"], &[]);
        assert_eq!(game.play_turn().await.unwrap(), GameStatus::Draw);

        let err = game.play_turn().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::GameFinished);
        assert_eq!(game.state().history().len(), 1);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let err = Game::new(
            GameConfig::new().with_max_turns(0),
            ScriptedPlayer::new("ノエル", &[]).boxed(),
            ScriptedPlayer::new("フレア", &[]).boxed(),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
    }

    #[test]
    fn test_player_names_must_match_config() {
        let err = Game::new(
            GameConfig::new(),
            ScriptedPlayer::new("ノエル", &[]).boxed(),
            ScriptedPlayer::new("ぺこら", &[]).boxed(),
        )
        .err()
        .unwrap();
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert_eq!(err.operation(), "game::new");
        assert!(err.context().contains(&("actual", "ぺこら".to_string())));

        // swapped seats are a mismatch too
        let swapped = Game::new(
            GameConfig::new(),
            ScriptedPlayer::new("フレア", &[]).boxed(),
            ScriptedPlayer::new("ノエル", &[]).boxed(),
        );
        assert!(swapped.is_err());
    }
}
