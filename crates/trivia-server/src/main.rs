use std::process::ExitCode;

use clap::Parser;

use trivia_server::config::{Args, ConfigError, ServerConfig, USAGE};
use trivia_server::error::ServerError;
use trivia_server::policy::{self, ServerPolicy};
use trivia_server::server::Server;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trivia_server=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            tracing::debug!("Argument error: {}", e);
            eprintln!("{USAGE}");
            return ExitCode::from(ConfigError::Usage.exit_code());
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            if let Some(source) = std::error::Error::source(&e) {
                tracing::debug!("Caused by: {}", source);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: Args) -> Result<(), ServerError> {
    let config = ServerConfig::from_args(args)?;
    let policy = ServerPolicy::new();

    #[cfg(unix)]
    {
        let policy = policy.clone();
        tokio::spawn(async move {
            if let Err(e) = policy::watch_signals(policy).await {
                tracing::warn!("Signal handling unavailable: {}", e);
            }
        });
    }

    let server = Server::bind(&config).await?;
    tracing::info!(
        "Starting trivia server: {} game(s), round time {:?}, players {}-{}",
        config.games.len(),
        config.settings.round_time,
        config.settings.min_players,
        config.settings.max_players
    );
    server.run(policy).await;
    Ok(())
}
