use std::io::Write;

use clap::Parser;

use trivia_client::outcome::{self, Outcome};
use trivia_client::session;

/// Trivia client: joins a game and plays it from the terminal
#[derive(Parser, Debug)]
#[command(name = "trivial", version, about)]
struct Args {
    /// Name shown to other players
    name: String,

    /// Game port on the server
    port: String,

    /// Server host
    #[arg(default_value = "localhost")]
    host: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trivia_client=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let outcome = match Args::try_parse() {
        Ok(args) => run(args).await,
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            tracing::debug!("Argument error: {}", e);
            Outcome::Usage
        }
    };

    finish(outcome)
}

async fn run(args: Args) -> Outcome {
    let Some(port) = outcome::parse_port(&args.port) else {
        return Outcome::InvalidPort;
    };
    tracing::debug!("Joining {}:{} as {}", args.host, port, args.name);
    session::run_session(&args.name, &args.host, port).await
}

/// Reports the outcome and exits without waiting on the blocked stdin reader.
fn finish(outcome: Outcome) -> ! {
    let _ = std::io::stdout().flush();
    if let Some(label) = outcome.label() {
        eprintln!("{label}");
    }
    std::process::exit(outcome.exit_code().into())
}
