use std::io::Write;

use clap::Parser;

use trivia_client::outcome::{self, Outcome};
use trivia_client::session;

const USAGE: &str = "Usage: scores port [host]";

/// Prints the score table of a running trivia server
#[derive(Parser, Debug)]
#[command(name = "scores", version, about)]
struct Args {
    /// Any game port on the server
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
        Ok(args) => match outcome::parse_port(&args.port) {
            Some(port) => {
                let mut stdout = std::io::stdout();
                let outcome = session::run_scores_query(&args.host, port, &mut stdout).await;
                let _ = stdout.flush();
                outcome
            }
            None => Outcome::InvalidPort,
        },
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            tracing::debug!("Argument error: {}", e);
            Outcome::Usage
        }
    };

    let code = match outcome {
        Outcome::Usage => {
            eprintln!("{USAGE}");
            outcome.exit_code()
        }
        Outcome::InvalidPort | Outcome::BadServer => {
            eprintln!("{}", outcome.label().unwrap_or_default());
            outcome.exit_code()
        }
        // Whatever arrived before the connection ended has been printed.
        _ => 0,
    };
    std::process::exit(code.into())
}
