use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use trivia_common::net::{self, LineStream};
use trivia_common::protocol;

use crate::config::GameSettings;
use crate::policy::ServerPolicy;
use crate::question::Question;
use crate::roster::{Answer, Roster};

/// Upper bound on how long a waiting game goes without rechecking quorum.
const QUORUM_POLL: Duration = Duration::from_millis(100);

pub struct Game {
    port: u16,
    settings: GameSettings,
    questions: Vec<Question>,
    roster: Arc<Mutex<Roster>>,
    running: AtomicBool,
    joined: Notify,
}

impl Game {
    pub fn new(port: u16, settings: GameSettings, questions: Vec<Question>) -> Self {
        Self {
            port,
            settings,
            questions,
            roster: Arc::new(Mutex::new(Roster::new())),
            running: AtomicBool::new(true),
            joined: Notify::new(),
        }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn roster(&self) -> &Arc<Mutex<Roster>> {
        &self.roster
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Wakes the supervisor if it is waiting for quorum.
    pub fn notify_joined(&self) {
        self.joined.notify_one();
    }

    /// Round Supervisor. Plays quizzes back to back until restart is disabled
    /// while the game is waiting to start a new one.
    pub async fn run(&self, policy: ServerPolicy) {
        let mut index = 0;
        loop {
            if !self.wait_for_quorum(index == 0, &policy).await {
                break;
            }

            let final_question = index + 1 == self.questions.len();
            self.play_round(index, final_question).await;

            if final_question {
                tracing::info!("Quiz finished on port {}", self.port);
                index = 0;
            } else {
                index += 1;
            }
        }

        self.running.store(false, Ordering::SeqCst);
        tracing::info!("Game on port {} terminated", self.port);
    }

    /// Returns false if the game should terminate instead of starting a quiz.
    async fn wait_for_quorum(&self, quiz_start: bool, policy: &ServerPolicy) -> bool {
        let mut restart = policy.subscribe();
        loop {
            if quiz_start && !*restart.borrow_and_update() {
                return false;
            }
            if self.roster.lock().await.active_count() >= self.settings.min_players {
                return true;
            }
            tokio::select! {
                _ = self.joined.notified() => {}
                _ = restart.changed() => {}
                _ = tokio::time::sleep(QUORUM_POLL) => {}
            }
        }
    }

    async fn play_round(&self, index: usize, final_question: bool) {
        let question = &self.questions[index];
        let cancel = CancellationToken::new();

        let collectors = {
            let mut roster = self.roster.lock().await;
            let in_round = roster.freeze_round();
            tracing::debug!(
                "Port {}: question {} with {} players",
                self.port,
                index + 1,
                in_round.len()
            );

            let scores = roster.scores_line();
            for &i in &in_round {
                roster.send_to(i, &scores);
                for line in question.lines() {
                    roster.send_to(i, line);
                }
            }

            let mut collectors = Vec::new();
            if question.has_options() {
                for &i in &in_round {
                    if let Some(inbox) = roster.take_inbox(i) {
                        collectors.push(tokio::spawn(collect_answer(
                            self.roster.clone(),
                            i,
                            inbox,
                            cancel.clone(),
                        )));
                    }
                }
            }
            collectors
        };

        if question.has_options() {
            tokio::time::sleep(self.settings.round_time).await;
            cancel.cancel();
            join_collectors(collectors).await;
        }

        let mut roster = self.roster.lock().await;
        let report = roster.tally(question.correct(), question.has_options(), final_question);
        roster.broadcast_results(&report, final_question);
        roster.finish_round(&report, final_question);
    }
}

async fn join_collectors(collectors: Vec<JoinHandle<()>>) {
    for collector in collectors {
        if let Err(e) = collector.await {
            tracing::error!("Answer collector failed: {}", e);
        }
    }
}

/// Answer Collector: waits for one line from one player. The answer is
/// committed under the roster lock before the task completes, so a joined
/// collector's result is always visible to the tally.
async fn collect_answer(
    roster: Arc<Mutex<Roster>>,
    index: usize,
    mut inbox: LineStream,
    cancel: CancellationToken,
) {
    let received = tokio::select! {
        _ = cancel.cancelled() => None,
        line = net::recv_line(&mut inbox) => Some(line),
    };

    let mut roster = roster.lock().await;
    match received {
        // Deadline passed with nothing read; the answer stays pending.
        None => roster.restore_inbox(index, inbox),
        Some(Ok(Some(line))) => match protocol::parse_guess(&line) {
            Some(guess) => {
                roster.record_answer(index, Answer::Submitted(guess));
                roster.restore_inbox(index, inbox);
            }
            None => roster.record_answer(index, Answer::Disconnected),
        },
        Some(Ok(None)) | Some(Err(_)) => roster.record_answer(index, Answer::Disconnected),
    }
}
