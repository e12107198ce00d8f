use std::io::{self, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::{Sink, Stream};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

use trivia_common::net::{self, MAX_LINE_LENGTH};
use trivia_common::protocol::SCORES_REQUEST;

use crate::driver::{ClientDriver, DriverError, Step};
use crate::input;
use crate::outcome::Outcome;

/// Plays one quiz: one task renders the server's stream, another forwards
/// the user's guesses. Whichever finishes first decides the outcome.
pub async fn run_session(name: &str, host: &str, port: u16) -> Outcome {
    let stream = match net::connect(host, port).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::debug!("{}", e);
            return Outcome::BadServer;
        }
    };
    let (mut sink, lines) = net::split_transport(stream);

    if let Err(e) = net::send_line(&mut sink, name).await {
        tracing::debug!("Could not identify to server: {}", e);
        return Outcome::SystemError;
    }

    let num_options = Arc::new(AtomicUsize::new(0));

    let mut server_task = {
        let num_options = num_options.clone();
        tokio::spawn(async move {
            let mut stdout = io::stdout();
            consume_server(lines, &num_options, &mut stdout).await
        })
    };

    let mut input_task = tokio::spawn(async move {
        let stdin = FramedRead::new(
            tokio::io::stdin(),
            LinesCodec::new_with_max_length(MAX_LINE_LENGTH),
        );
        let mut stdout = io::stdout();
        consume_input(stdin, sink, &num_options, &mut stdout).await
    });

    let outcome = tokio::select! {
        result = &mut server_task => result,
        result = &mut input_task => result,
    };
    server_task.abort();
    input_task.abort();

    outcome.unwrap_or_else(|e| {
        tracing::error!("Client task failed: {}", e);
        Outcome::SystemError
    })
}

/// Server-message consumer: drives the protocol state machine until the
/// quiz ends, the server leaves, or the server breaks protocol.
pub async fn consume_server<S, W>(mut lines: S, num_options: &AtomicUsize, out: &mut W) -> Outcome
where
    S: Stream<Item = Result<String, LinesCodecError>> + Unpin,
    W: Write,
{
    let mut driver = ClientDriver::new();
    loop {
        let line = match net::recv_line(&mut lines).await {
            Ok(Some(line)) => line,
            Ok(None) => return Outcome::ServerDisconnected,
            Err(e) => {
                tracing::debug!("Read from server failed: {}", e);
                return Outcome::ServerDisconnected;
            }
        };

        let step = driver.feed(&line, out);
        num_options.store(driver.num_options(), Ordering::SeqCst);

        match step {
            Ok(Step::Continue) => {}
            Ok(Step::Finished) => return Outcome::Finished,
            Err(DriverError::ServerFull) => return Outcome::ServerFull,
            Err(DriverError::Protocol) => return Outcome::ProtocolError,
            Err(DriverError::Io(e)) => {
                tracing::debug!("Output failed: {}", e);
                return Outcome::SystemError;
            }
        }
    }
}

/// User-input consumer: forwards guesses that name a shown option and
/// rejects the rest locally.
pub async fn consume_input<I, S, W>(
    mut input: I,
    mut sink: S,
    num_options: &AtomicUsize,
    out: &mut W,
) -> Outcome
where
    I: Stream<Item = Result<String, LinesCodecError>> + Unpin,
    S: Sink<String, Error = LinesCodecError> + Unpin,
    W: Write,
{
    loop {
        let line = match net::recv_line(&mut input).await {
            Ok(Some(line)) => line,
            Ok(None) => return Outcome::ClientEof,
            Err(e) => {
                tracing::debug!("Read from input failed: {}", e);
                return Outcome::SystemError;
            }
        };

        match input::validate_guess(&line, num_options.load(Ordering::SeqCst)) {
            Some(guess) => {
                if let Err(e) = net::send_line(&mut sink, guess.to_string()).await {
                    tracing::debug!("Send to server failed: {}", e);
                    return Outcome::SystemError;
                }
            }
            None => {
                if writeln!(out, "Invalid guess").is_err() {
                    return Outcome::SystemError;
                }
            }
        }
    }
}

/// Asks a server for its score table and prints every line until it closes.
pub async fn run_scores_query<W: Write>(host: &str, port: u16, out: &mut W) -> Outcome {
    let stream = match net::connect(host, port).await {
        Ok(stream) => stream,
        Err(e) => {
            tracing::debug!("{}", e);
            return Outcome::BadServer;
        }
    };
    let mut transport = net::framed_transport(stream);

    if let Err(e) = net::send_line(&mut transport, SCORES_REQUEST).await {
        tracing::debug!("Could not send scores request: {}", e);
        return Outcome::SystemError;
    }

    loop {
        match net::recv_line(&mut transport).await {
            Ok(Some(line)) => {
                if writeln!(out, "{line}").is_err() {
                    return Outcome::SystemError;
                }
            }
            Ok(None) => return Outcome::Finished,
            Err(e) => {
                tracing::debug!("Read from server failed: {}", e);
                return Outcome::Finished;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use futures::SinkExt;
    use futures::StreamExt;
    use tokio::net::TcpListener;

    fn lines(items: &[&str]) -> impl Stream<Item = Result<String, LinesCodecError>> + Unpin {
        stream::iter(
            items
                .iter()
                .map(|s| Ok(s.to_string()))
                .collect::<Vec<_>>(),
        )
    }

    fn capture_sink() -> (
        impl Sink<String, Error = LinesCodecError> + Unpin,
        futures::channel::mpsc::UnboundedReceiver<String>,
    ) {
        let (tx, rx) = futures::channel::mpsc::unbounded::<String>();
        let sink = tx.sink_map_err(|e| {
            LinesCodecError::Io(io::Error::new(io::ErrorKind::BrokenPipe, e))
        });
        (sink, rx)
    }

    #[tokio::test]
    async fn test_server_stream_to_finish() {
        let server = lines(&[
            "Hello Player 1/1.",
            "Salice:0",
            "Q",
            ".",
            "2",
            "A",
            "B",
            "Walice",
            "Calice:Correct",
            "Salice:1",
        ]);
        let num_options = AtomicUsize::new(0);
        let mut out = Vec::new();
        let outcome = consume_server(server, &num_options, &mut out).await;
        assert_eq!(outcome, Outcome::Finished);
        assert_eq!(num_options.load(Ordering::SeqCst), 0);
        assert!(String::from_utf8(out).unwrap().ends_with("Winner(s): alice\n"));
    }

    #[tokio::test]
    async fn test_server_closing_mid_quiz() {
        let server = lines(&["Hello Player 1/1.", "Salice:0", "Q"]);
        let mut out = Vec::new();
        let outcome = consume_server(server, &AtomicUsize::new(0), &mut out).await;
        assert_eq!(outcome, Outcome::ServerDisconnected);
    }

    #[tokio::test]
    async fn test_server_full_outcome() {
        let mut out = Vec::new();
        let outcome = consume_server(lines(&["$"]), &AtomicUsize::new(0), &mut out).await;
        assert_eq!(outcome, Outcome::ServerFull);
    }

    #[tokio::test]
    async fn test_protocol_error_outcome() {
        let server = lines(&["Hello", "Sa:0", "Q", ".", "1", "A", "bogus"]);
        let mut out = Vec::new();
        let outcome = consume_server(server, &AtomicUsize::new(0), &mut out).await;
        assert_eq!(outcome, Outcome::ProtocolError);
        assert!(!String::from_utf8(out).unwrap().contains("bogus"));
    }

    #[tokio::test]
    async fn test_input_forwards_only_valid_guesses() {
        let (sink, rx) = capture_sink();
        let num_options = AtomicUsize::new(3);
        let mut out = Vec::new();

        let outcome = consume_input(
            lines(&["2", "abc", "4", "0", "3"]),
            sink,
            &num_options,
            &mut out,
        )
        .await;

        assert_eq!(outcome, Outcome::ClientEof);
        let sent: Vec<String> = rx.collect().await;
        assert_eq!(sent, vec!["2", "3"]);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Invalid guess\nInvalid guess\nInvalid guess\n"
        );
    }

    #[tokio::test]
    async fn test_input_rejected_between_questions() {
        let (sink, rx) = capture_sink();
        let mut out = Vec::new();
        let outcome = consume_input(lines(&["1"]), sink, &AtomicUsize::new(0), &mut out).await;
        assert_eq!(outcome, Outcome::ClientEof);
        assert!(rx.collect::<Vec<_>>().await.is_empty());
        assert_eq!(String::from_utf8(out).unwrap(), "Invalid guess\n");
    }

    #[tokio::test]
    async fn test_scores_query_prints_all_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut transport = net::framed_transport(stream);
            let request = net::recv_line(&mut transport).await.unwrap();
            for line in ["alice played:1 won:1 disc:0 score:2", "bob played:2 won:0 disc:1 score:0"] {
                transport.send(line.to_string()).await.unwrap();
            }
            request
        });

        let mut out = Vec::new();
        let outcome = run_scores_query("127.0.0.1", port, &mut out).await;
        assert_eq!(outcome, Outcome::Finished);
        assert_eq!(server.await.unwrap().as_deref(), Some("scores"));
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "alice played:1 won:1 disc:0 score:2\nbob played:2 won:0 disc:1 score:0\n"
        );
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        assert_eq!(run_session("alice", "127.0.0.1", port).await, Outcome::BadServer);
        let mut out = Vec::new();
        assert_eq!(
            run_scores_query("127.0.0.1", port, &mut out).await,
            Outcome::BadServer
        );
    }
}
