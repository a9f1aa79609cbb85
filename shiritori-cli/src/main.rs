//! # Shiritori CLI
//!
//! Command-line interface for running a game between two agents.
//!
//! Usage:
//!   shiritori [OPTIONS]
//!   shiritori play [OPTIONS]
//!   shiritori check [--probe]
//!
//! Examples:
//!   shiritori --max-turns 10
//!   shiritori --provider local --base-url http://localhost:11434/v1 --model llama3
//!   shiritori --offline --save-log
//!   shiritori check --probe

use clap::builder::FalseyValueParser;
use clap::{Parser, Subcommand, ValueEnum};
use shiritori_agent::{DictionaryPlayer, Game, GameReport, LlmPlayer, Player};
use shiritori_core::config::{DEFAULT_FIRST_PLAYER, DEFAULT_SECOND_PLAYER};
use shiritori_core::{
    AnyProvider, FileSink, GameConfig, LlmProvider, LossReason, ProviderConfig, ProviderType,
    TurnRecord,
};
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "shiritori")]
#[command(author, version, about = "Shiritori - two AI agents chaining Japanese words")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Game ends in a draw after this many accepted words
    #[arg(long, env = "SHIRITORI_MAX_TURNS", default_value_t = 20, global = true)]
    max_turns: u32,

    /// Seconds a player has to answer (fractions allowed, e.g. 180.0)
    #[arg(long, env = "SHIRITORI_TIMEOUT", default_value = "180.0", value_parser = parse_timeout, global = true)]
    timeout: Duration,

    /// Name of the player who moves first
    #[arg(long, env = "AGENT1_NAME", default_value = DEFAULT_FIRST_PLAYER, global = true)]
    first: String,

    /// Name of the second player
    #[arg(long, env = "AGENT2_NAME", default_value = DEFAULT_SECOND_PLAYER, global = true)]
    second: String,

    /// Write the game log as JSON when the game ends
    #[arg(long, env = "SAVE_GAME_LOG", value_parser = FalseyValueParser::new(), global = true)]
    save_log: bool,

    /// Directory for game logs
    #[arg(long, env = "SHIRITORI_LOG_DIR", default_value = "logs", global = true)]
    log_dir: PathBuf,

    /// Text-generation backend
    #[arg(long, env = "SHIRITORI_PROVIDER", value_enum, default_value_t = ProviderArg::Gemini, global = true)]
    provider: ProviderArg,

    /// Model name (provider default if unset)
    #[arg(long, env = "SHIRITORI_MODEL", global = true)]
    model: Option<String>,

    /// API key (falls back to GOOGLE_API_KEY / OPENAI_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Endpoint override, e.g. an Ollama server
    #[arg(long, env = "SHIRITORI_BASE_URL", global = true)]
    base_url: Option<String>,

    /// Sampling temperature
    #[arg(long, env = "SHIRITORI_TEMPERATURE", default_value_t = shiritori_agent::DEFAULT_TEMPERATURE, global = true)]
    temperature: f32,

    /// Play with the built-in vocabulary instead of a provider
    #[arg(long, global = true)]
    offline: bool,

    /// Log filter when RUST_LOG is unset (e.g. info, debug)
    #[arg(long, env = "LOG_LEVEL", global = true)]
    log_level: Option<String>,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode - only show the result
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game (default)
    Play,
    /// Validate the configuration without playing
    Check {
        /// Also send one request to the provider
        #[arg(long)]
        probe: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ProviderArg {
    Gemini,
    Openai,
    /// OpenAI-compatible server without an API key (Ollama, vLLM)
    Local,
}

impl From<ProviderArg> for ProviderType {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Gemini => ProviderType::Gemini,
            ProviderArg::Openai => ProviderType::OpenAI,
            ProviderArg::Local => ProviderType::Local,
        }
    }
}

/// Positive, finite seconds as a `Duration`
fn parse_timeout(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .trim()
        .parse()
        .map_err(|e| format!("not a number of seconds: {}", e))?;
    if secs <= 0.0 {
        return Err("must be greater than zero".to_string());
    }
    Duration::try_from_secs_f64(secs).map_err(|e| e.to_string())
}

const DEFAULT_LOCAL_URL: &str = "http://localhost:11434/v1";
const DEFAULT_LOCAL_MODEL: &str = "llama3";

fn fatal(message: impl Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn init_tracing(cli: &Cli) {
    let level = if cli.verbose {
        "debug"
    } else {
        cli.log_level.as_deref().unwrap_or("warn")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn game_config(cli: &Cli) -> GameConfig {
    GameConfig::new()
        .with_max_turns(cli.max_turns)
        .with_turn_timeout(cli.timeout)
        .with_players(cli.first.clone(), cli.second.clone())
        .with_save_log(cli.save_log)
        .with_log_dir(cli.log_dir.clone())
}

fn provider_config(cli: &Cli) -> ProviderConfig {
    let provider_type = ProviderType::from(cli.provider);
    let api_key = cli.api_key.clone().or_else(|| {
        provider_type
            .api_key_var()
            .and_then(|var| std::env::var(var).ok())
    });

    let mut config = match provider_type {
        ProviderType::Gemini => ProviderConfig::gemini(api_key.unwrap_or_default()),
        ProviderType::OpenAI => ProviderConfig::openai(api_key.unwrap_or_default()),
        ProviderType::Local => {
            let mut config = ProviderConfig::local(DEFAULT_LOCAL_URL, DEFAULT_LOCAL_MODEL);
            config.api_key = api_key;
            config
        }
    };

    if let Some(model) = &cli.model {
        config = config.with_model(model.clone());
    }
    if let Some(url) = &cli.base_url {
        config = config.with_base_url(url.clone());
    }
    // the turn timeout decides when a reply is too late, not the HTTP client
    config.with_timeout(cli.timeout.as_secs_f64().ceil() as u64)
}

fn players(cli: &Cli, config: &GameConfig) -> (Box<dyn Player>, Box<dyn Player>) {
    if cli.offline {
        return (
            Box::new(DictionaryPlayer::new(config.first_player.clone())),
            Box::new(DictionaryPlayer::new(config.second_player.clone())),
        );
    }

    let provider = match AnyProvider::from_config(provider_config(cli)) {
        Ok(provider) => Arc::new(provider),
        Err(e) => fatal(e),
    };
    // the model override already lives in the provider config
    let player =
        |name: &str| LlmPlayer::new(name, provider.clone()).with_temperature(cli.temperature);
    (
        Box::new(player(&config.first_player)),
        Box::new(player(&config.second_player)),
    )
}

fn print_turn(record: &TurnRecord) {
    let secs = record.elapsed_ms as f64 / 1000.0;
    match (&record.word, record.accepted) {
        (Some(word), true) => {
            println!("ターン {:3} | {:8} | 「{}」 ({:.2}秒)", record.turn, record.player, word, secs)
        }
        (None, _) if record.reason == Some(LossReason::Resigned) => {
            println!("ターン {:3} | {:8} | 投了 ({:.2}秒)", record.turn, record.player, secs)
        }
        (word, _) => println!(
            "ターン {:3} | {:8} | ✗ {} ({}, {:.2}秒)",
            record.turn,
            record.player,
            word.as_deref().map_or("(応答なし)".to_string(), |w| format!("「{}」", w)),
            record.reason.map(|r| r.as_str()).unwrap_or("rejected"),
            secs
        ),
    }
}

fn print_report(report: &GameReport, config: &GameConfig) {
    println!("\n=== ゲーム終了 ===");
    println!("{}", report.status().describe(config));
    if let Some(location) = &report.saved_to {
        println!("ログ: {}", location);
    }

    let stats = &report.stats;
    println!("\n--- 統計 ---");
    for player in &stats.players {
        println!("  {}: {}語", player.name, player.word_count());
    }
    println!("  総ターン数: {}", stats.total_turns);
    println!("  ユニーク単語数: {}", stats.unique_words);
    if !stats.chain.is_empty() {
        println!("  しりとり: {}", stats.chain_display());
    }
}

async fn run_game(cli: &Cli, config: GameConfig) {
    let (first, second) = players(cli, &config);

    if !cli.quiet {
        println!("=== しりとり ===");
        println!(
            "{} vs {} (最大{}ターン, 1ターン{}秒)\n",
            config.first_player,
            config.second_player,
            config.max_turns,
            config.turn_timeout.as_secs_f64()
        );
    }

    let mut game = match Game::new(config.clone(), first, second) {
        Ok(game) => game,
        Err(e) => fatal(e),
    };
    if !cli.quiet {
        game = game.with_turn_callback(print_turn);
    }
    if config.save_log {
        match FileSink::new(&config.log_dir) {
            Ok(sink) => game = game.with_log_sink(Box::new(sink)),
            Err(e) => fatal(e),
        }
    }

    match game.play().await {
        Ok(report) => print_report(&report, &config),
        Err(e) => fatal(e),
    }
}

async fn check(cli: &Cli, config: &GameConfig, probe: bool) {
    println!(
        "Game: {} vs {}, {} turns, {}s per turn",
        config.first_player,
        config.second_player,
        config.max_turns,
        config.turn_timeout.as_secs_f64()
    );
    if cli.offline {
        println!("Players: built-in vocabulary");
        return;
    }

    let provider = match AnyProvider::from_config(provider_config(cli)) {
        Ok(provider) => provider,
        Err(e) => fatal(e),
    };
    println!("Provider: {} ({})", provider.name(), provider.default_model());

    if probe {
        match provider.prompt("「り」で始まるひらがなの名詞を1つだけ答えてください。").await {
            Ok(reply) => println!("Probe reply: {}", reply),
            Err(e) => fatal(e.into_error(provider.name())),
        }
    }
    println!("OK");
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(&cli);

    let config = game_config(&cli);
    if let Err(e) = config.validate() {
        fatal(e);
    }

    match cli.command {
        Some(Commands::Check { probe }) => check(&cli, &config, probe).await,
        Some(Commands::Play) | None => run_game(&cli, config).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::{CommandFactory, FromArgMatches};

    /// Parse without the environment fallbacks, so a developer's shell or
    /// `.env` cannot change the outcome
    fn parse(args: &[&str]) -> Cli {
        let command = Cli::command().mut_args(|arg| arg.env(None::<&str>));
        let matches = command.try_get_matches_from(args).unwrap();
        Cli::from_arg_matches(&matches).unwrap()
    }

    fn try_parse(args: &[&str]) -> Result<Cli, clap::Error> {
        let command = Cli::command().mut_args(|arg| arg.env(None::<&str>));
        command
            .try_get_matches_from(args)
            .and_then(|matches| Cli::from_arg_matches(&matches))
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["shiritori"]);
        let config = game_config(&cli);

        assert_eq!(config.max_turns, 20);
        assert_eq!(config.turn_timeout, Duration::from_secs(180));
        assert_eq!(config.first_player, "ノエル");
        assert_eq!(config.second_player, "フレア");
        assert!(!config.save_log);
        assert_eq!(cli.provider, ProviderArg::Gemini);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_defaults_ignore_environment() {
        std::env::set_var("SHIRITORI_MAX_TURNS", "3");
        std::env::set_var("AGENT1_NAME", "ぺこら");
        let cli = parse(&["shiritori"]);

        assert_eq!(cli.max_turns, 20);
        assert_eq!(cli.first, "ノエル");
    }

    #[test]
    fn test_fractional_timeout() {
        let cli = parse(&["shiritori", "--timeout", "180.0"]);
        assert_eq!(game_config(&cli).turn_timeout, Duration::from_secs(180));

        let cli = parse(&["shiritori", "--timeout", "1.5"]);
        assert_eq!(cli.timeout, Duration::from_millis(1500));
        // the provider's HTTP timeout never undercuts the turn timeout
        assert_eq!(provider_config(&cli).timeout_secs, Some(2));

        let cli = parse(&["shiritori", "--timeout", "30"]);
        assert_eq!(cli.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_non_positive_timeout_rejected() {
        for value in ["--timeout=0", "--timeout=-1", "--timeout=nan", "--timeout=inf", "--timeout=abc"] {
            assert!(try_parse(&["shiritori", value]).is_err(), "{} accepted", value);
        }
        assert!(parse_timeout("0.0").is_err());
        assert_eq!(parse_timeout(" 2.5 "), Ok(Duration::from_millis(2500)));
    }

    #[test]
    fn test_local_provider_config() {
        let cli = parse(&[
            "shiritori",
            "--provider",
            "local",
            "--model",
            "qwen2",
            "--base-url",
            "http://127.0.0.1:8000/v1",
        ]);
        let config = provider_config(&cli);

        assert_eq!(config.provider_type, ProviderType::Local);
        assert_eq!(config.default_model.as_deref(), Some("qwen2"));
        assert_eq!(config.base_url.as_deref(), Some("http://127.0.0.1:8000/v1"));
        assert_eq!(config.timeout_secs, Some(180));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_subcommand_with_global_options() {
        let cli = parse(&["shiritori", "check", "--probe", "--max-turns", "5"]);
        assert!(matches!(cli.command, Some(Commands::Check { probe: true })));
        assert_eq!(cli.max_turns, 5);
    }

    #[test]
    fn test_zero_turns_rejected() {
        let cli = parse(&["shiritori", "--max-turns", "0"]);
        assert!(game_config(&cli).validate().is_err());
    }
}
