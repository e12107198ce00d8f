use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::{GameSettings, ServerConfig};
use crate::connection;
use crate::error::ServerError;
use crate::game::Game;
use crate::policy::ServerPolicy;
use crate::question::{self, Question};

/// Every game loaded and bound, ready to run.
pub struct Server {
    games: Vec<(Arc<Game>, TcpListener)>,
}

impl Server {
    /// Loads every question file, then binds every port. Nothing starts unless
    /// all of it succeeds.
    pub async fn bind(config: &ServerConfig) -> Result<Self, ServerError> {
        let mut games = Vec::with_capacity(config.games.len());
        for game in &config.games {
            let questions = question::load_questions(&game.question_file).map_err(|source| {
                ServerError::Questions {
                    path: game.question_file.clone(),
                    source,
                }
            })?;
            tracing::debug!(
                "Loaded {} questions from {}",
                questions.len(),
                game.question_file.display()
            );
            games.push((game.port, questions));
        }
        Self::from_questions(config.settings.clone(), games).await
    }

    /// Binds one game per `(port, questions)` pair. Port 0 picks a free port.
    pub async fn from_questions(
        settings: GameSettings,
        games: Vec<(u16, Vec<Question>)>,
    ) -> Result<Self, ServerError> {
        let mut bound = Vec::with_capacity(games.len());
        for (port, questions) in games {
            let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
                .await
                .map_err(|source| ServerError::Listen { port, source })?;
            let port = listener
                .local_addr()
                .map_err(|source| ServerError::Listen { port, source })?
                .port();
            bound.push((
                Arc::new(Game::new(port, settings.clone(), questions)),
                listener,
            ));
        }
        Ok(Self { games: bound })
    }

    pub fn local_addrs(&self) -> Vec<SocketAddr> {
        self.games
            .iter()
            .filter_map(|(_, listener)| listener.local_addr().ok())
            .collect()
    }

    pub fn games(&self) -> Vec<Arc<Game>> {
        self.games.iter().map(|(game, _)| game.clone()).collect()
    }

    /// Runs every game and returns once all of them have terminated.
    pub async fn run(self, policy: ServerPolicy) {
        let all: Arc<[Arc<Game>]> = self.games().into();

        let mut controllers = JoinSet::new();
        for (game, listener) in self.games {
            tracing::info!("Game listening on port {}", game.port());
            controllers.spawn(run_game(game, listener, all.clone(), policy.clone()));
        }

        while let Some(result) = controllers.join_next().await {
            if let Err(e) = result {
                tracing::error!("Game task failed: {}", e);
            }
        }
        tracing::info!("All games finished");
    }
}

/// Game Controller: one supervisor and one listener, torn down together.
async fn run_game(
    game: Arc<Game>,
    listener: TcpListener,
    games: Arc<[Arc<Game>]>,
    policy: ServerPolicy,
) {
    let shutdown = CancellationToken::new();
    let listener_task = tokio::spawn(run_listener(
        listener,
        game.clone(),
        games,
        shutdown.clone(),
    ));

    game.run(policy).await;

    shutdown.cancel();
    if let Err(e) = listener_task.await {
        tracing::error!("Listener on port {} failed: {}", game.port(), e);
    }
}

/// Listener: accepts until shut down and hands each connection to its own
/// Join Handler. The next accept waits until the previous connection has
/// been claimed by its handler.
async fn run_listener(
    listener: TcpListener,
    game: Arc<Game>,
    games: Arc<[Arc<Game>]>,
    shutdown: CancellationToken,
) {
    let slot_gate = Arc::new(Semaphore::new(1));
    let mut handlers = JoinSet::new();

    loop {
        let slot = tokio::select! {
            _ = shutdown.cancelled() => break,
            slot = slot_gate.clone().acquire_owned() => match slot {
                Ok(slot) => slot,
                Err(_) => break,
            },
        };

        let accepted = tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        match accepted {
            Ok((stream, peer)) => {
                tracing::debug!("Connection on port {} from {}", game.port(), peer);
                handlers.spawn(connection::handle_join(
                    stream,
                    peer,
                    slot,
                    game.clone(),
                    games.clone(),
                ));
            }
            Err(e) => {
                tracing::warn!("Accept failed on port {}: {}", game.port(), e);
            }
        }

        // Reap handlers that have already finished.
        while handlers.try_join_next().is_some() {}
    }

    handlers.shutdown().await;
    tracing::debug!("Listener on port {} stopped", game.port());
}
