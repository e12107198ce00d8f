use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

pub const USAGE: &str = "Usage: serv round_time minplayers maxplayers port qfile [port qfile ...]";

/// serv - multi-port trivia server
#[derive(Parser, Debug)]
#[command(
    name = "serv",
    version,
    about,
    override_usage = "serv round_time minplayers maxplayers port qfile [port qfile ...]"
)]
pub struct Args {
    /// Seconds each round stays open for answers
    #[arg(allow_hyphen_values = true)]
    pub round_time: String,

    /// Players required before a round starts
    #[arg(allow_hyphen_values = true)]
    pub min_players: String,

    /// Players allowed in a game at once
    #[arg(allow_hyphen_values = true)]
    pub max_players: String,

    /// One or more `port question_file` pairs
    #[arg(required = true, num_args = 2.., allow_hyphen_values = true)]
    pub games: Vec<String>,
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{}", USAGE)]
    Usage,
    #[error("Bad Number")]
    BadNumber,
    #[error("Invalid Port")]
    InvalidPort,
}

impl ConfigError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ConfigError::Usage => 1,
            ConfigError::BadNumber => 2,
            ConfigError::InvalidPort => 4,
        }
    }
}

/// Settings shared by every game the server hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    pub round_time: Duration,
    pub min_players: usize,
    pub max_players: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub port: u16,
    pub question_file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub settings: GameSettings,
    pub games: Vec<GameConfig>,
}

impl ServerConfig {
    pub fn from_args(args: Args) -> Result<Self, ConfigError> {
        if args.games.len() < 2 || args.games.len() % 2 != 0 {
            return Err(ConfigError::Usage);
        }

        let round_time = parse_number(&args.round_time).ok_or(ConfigError::BadNumber)?;
        let min_players = parse_number(&args.min_players).ok_or(ConfigError::BadNumber)?;
        let max_players = parse_number(&args.max_players).ok_or(ConfigError::BadNumber)?;

        let mut seen = HashSet::new();
        let mut games = Vec::with_capacity(args.games.len() / 2);
        for pair in args.games.chunks(2) {
            let port = parse_port(&pair[0]).ok_or(ConfigError::InvalidPort)?;
            if !seen.insert(port) {
                return Err(ConfigError::InvalidPort);
            }
            games.push(GameConfig {
                port,
                question_file: PathBuf::from(&pair[1]),
            });
        }

        Ok(Self {
            settings: GameSettings {
                round_time: Duration::from_secs(round_time),
                min_players: min_players as usize,
                max_players: max_players as usize,
            },
            games,
        })
    }
}

fn parse_number(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

fn parse_port(s: &str) -> Option<u16> {
    match parse_number(s)? {
        port @ 1..=65535 => Some(port as u16),
        _ => None,
    }
}
