use std::net::SocketAddr;
use std::sync::Arc;

use futures::SinkExt;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, OwnedSemaphorePermit};

use trivia_common::net::{self, LineSink, LineStream};
use trivia_common::protocol::{self, SCORES_REQUEST, SERVER_FULL};

use crate::game::Game;
use crate::scores;

/// A registered player's connection. Outbound lines go through a channel
/// drained by a writer task; the read half is lent to each round's collector.
pub struct PlayerLink {
    outbox: mpsc::UnboundedSender<String>,
    inbox: Option<LineStream>,
}

impl PlayerLink {
    pub fn spawn(mut sink: LineSink, inbox: LineStream, peer: SocketAddr) -> Self {
        let (outbox, mut rx) = mpsc::unbounded_channel::<String>();

        // Writer task: drains rx and writes to sink. Ends once the link is
        // dropped and everything queued has been written.
        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if let Err(e) = sink.send(line).await {
                    tracing::debug!("Write to {} failed: {}", peer, e);
                    break;
                }
            }
        });

        Self {
            outbox,
            inbox: Some(inbox),
        }
    }

    pub fn send(&self, line: &str) {
        let _ = self.outbox.send(line.to_string());
    }

    pub fn take_inbox(&mut self) -> Option<LineStream> {
        self.inbox.take()
    }

    pub fn restore_inbox(&mut self, inbox: LineStream) {
        self.inbox = Some(inbox);
    }

    /// A link with no socket behind it; the receiver sees everything sent.
    #[cfg(test)]
    pub(crate) fn detached() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (outbox, rx) = mpsc::unbounded_channel();
        (
            Self {
                outbox,
                inbox: None,
            },
            rx,
        )
    }
}

/// Join Handler: the first line decides between a scores query and a new player.
pub async fn handle_join(
    stream: TcpStream,
    peer: SocketAddr,
    slot: OwnedSemaphorePermit,
    game: Arc<Game>,
    games: Arc<[Arc<Game>]>,
) {
    let (mut sink, mut lines) = net::split_transport(stream);
    // The connection is ours now; the listener may accept the next one.
    drop(slot);

    let first = match net::recv_line(&mut lines).await {
        Ok(Some(line)) => line,
        Ok(None) => {
            tracing::debug!("{} closed before identifying", peer);
            return;
        }
        Err(e) => {
            tracing::debug!("Read error from {}: {}", peer, e);
            return;
        }
    };

    if first == SCORES_REQUEST {
        let totals = scores::aggregate(&games).await;
        tracing::debug!("Serving scores to {} ({} players)", peer, totals.len());
        for entry in &totals {
            if let Err(e) = net::send_line(&mut sink, entry.to_string()).await {
                tracing::debug!("Scores write to {} failed: {}", peer, e);
                break;
            }
        }
        return;
    }

    let mut roster = game.roster().lock().await;
    if !roster.has_capacity(game.settings().max_players) {
        drop(roster);
        tracing::debug!(
            "Rejecting '{}' from {} on port {} (game full)",
            first,
            peer,
            game.port()
        );
        let _ = net::send_line(&mut sink, SERVER_FULL).await;
        return;
    }

    let name = first;
    tracing::debug!("Player '{}' joined port {} from {}", name, game.port(), peer);
    let link = PlayerLink::spawn(sink, lines, peer);
    let index = roster.register(name, link);
    let greeting = protocol::greeting_line(roster.active_count(), game.settings().min_players);
    roster.send_to(index, &greeting);
    drop(roster);

    game.notify_joined();
}
