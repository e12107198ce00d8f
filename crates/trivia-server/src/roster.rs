use trivia_common::net::LineStream;
use trivia_common::protocol::{self, RoundResult};

use crate::connection::PlayerLink;

/// A player's state for the current round. Ordered so that everything above
/// `Disconnected` counts as an active player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Answer {
    Disconnected,
    Pending,
    Submitted(u32),
}

pub struct Player {
    pub name: String,
    link: Option<PlayerLink>,
    pub answer: Answer,
    pub in_round: bool,
    pub wins: u32,
    pub disconnects: u32,
    pub score: u32,
}

impl Player {
    fn new(name: String, link: PlayerLink) -> Self {
        Self {
            name,
            link: Some(link),
            answer: Answer::Pending,
            in_round: false,
            wins: 0,
            disconnects: 0,
            score: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.answer >= Answer::Pending
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    fn send(&self, line: &str) {
        if let Some(link) = &self.link {
            link.send(line);
        }
    }

    /// Marks the player gone and closes the connection once queued lines are written.
    fn disconnect(&mut self) {
        self.answer = Answer::Disconnected;
        self.link = None;
    }

    fn result(&self, correct: u32) -> RoundResult {
        match self.answer {
            Answer::Submitted(guess) if guess == correct => RoundResult::Correct,
            Answer::Submitted(_) => RoundResult::Incorrect,
            Answer::Pending | Answer::Disconnected => RoundResult::TimedOut,
        }
    }
}

/// Per-player data copied out for the scores query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRecord {
    pub name: String,
    pub wins: u32,
    pub disconnects: u32,
    pub score: u32,
    /// The player's game is over for them, either by leaving or by the quiz ending.
    pub finished: bool,
}

/// What a tally decided, kept until results are sent and the round is closed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RoundReport {
    pub results: Vec<(usize, RoundResult)>,
    pub timed_out: Vec<usize>,
    pub winners: Vec<usize>,
}

#[derive(Default)]
pub struct Roster {
    players: Vec<Player>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn active_count(&self) -> usize {
        self.players.iter().filter(|p| p.is_active()).count()
    }

    pub fn has_capacity(&self, max_players: usize) -> bool {
        self.active_count() < max_players
    }

    /// Adds a player and returns its index. Capacity is the caller's check,
    /// made under the same lock.
    pub fn register(&mut self, name: String, link: PlayerLink) -> usize {
        self.players.push(Player::new(name, link));
        self.players.len() - 1
    }

    pub fn send_to(&self, index: usize, line: &str) {
        if let Some(player) = self.players.get(index) {
            player.send(line);
        }
    }

    /// Puts every active player into the round and clears last round's answer.
    /// Players registered afterwards wait for the next round.
    pub fn freeze_round(&mut self) -> Vec<usize> {
        let mut in_round = Vec::new();
        for (i, player) in self.players.iter_mut().enumerate() {
            if player.is_active() {
                player.in_round = true;
                player.answer = Answer::Pending;
                in_round.push(i);
            }
        }
        in_round
    }

    /// `S` line over the players in the current round.
    pub fn scores_line(&self) -> String {
        protocol::scores_line(
            self.players
                .iter()
                .filter(|p| p.in_round)
                .map(|p| (p.name.as_str(), p.score)),
        )
    }

    pub fn take_inbox(&mut self, index: usize) -> Option<LineStream> {
        self.players
            .get_mut(index)?
            .link
            .as_mut()
            .and_then(PlayerLink::take_inbox)
    }

    /// Hands a reader back after a collector is done with it. Dropped if the
    /// player was disconnected meanwhile.
    pub fn restore_inbox(&mut self, index: usize, inbox: LineStream) {
        if let Some(link) = self.players.get_mut(index).and_then(|p| p.link.as_mut()) {
            link.restore_inbox(inbox);
        }
    }

    pub fn record_answer(&mut self, index: usize, answer: Answer) {
        if let Some(player) = self.players.get_mut(index) {
            player.answer = answer;
        }
    }

    /// Scores the round. `collected` is false for questions that had no
    /// collection phase, where silence is not penalised.
    pub fn tally(&mut self, correct: u32, collected: bool, final_question: bool) -> RoundReport {
        let mut report = RoundReport::default();

        for (i, player) in self.players.iter_mut().enumerate() {
            if !player.in_round {
                continue;
            }
            report.results.push((i, player.result(correct)));

            match player.answer {
                Answer::Submitted(guess) if guess == correct => player.score += 1,
                Answer::Submitted(_) => {}
                Answer::Disconnected => {
                    player.disconnects += 1;
                    player.link = None;
                }
                Answer::Pending if collected => {
                    player.disconnects += 1;
                    report.timed_out.push(i);
                }
                Answer::Pending => {}
            }
        }

        if final_question {
            let top = self
                .players
                .iter()
                .filter(|p| p.in_round)
                .map(|p| p.score)
                .max();
            if let Some(top) = top {
                for (i, player) in self.players.iter_mut().enumerate() {
                    if player.in_round && player.score == top {
                        player.wins += 1;
                        report.winners.push(i);
                    }
                }
            }
        }

        report
    }

    /// Sends `W` (final question only), `C`, then `S` (final question only)
    /// to every in-round player that is still connected.
    pub fn broadcast_results(&self, report: &RoundReport, final_question: bool) {
        let results = protocol::results_line(
            report
                .results
                .iter()
                .map(|&(i, result)| (self.players[i].name.as_str(), result)),
        );
        let winners = final_question.then(|| {
            protocol::winners_line(report.winners.iter().map(|&i| self.players[i].name.as_str()))
        });
        let scores = final_question.then(|| self.scores_line());

        for &(i, _) in &report.results {
            let player = &self.players[i];
            if !player.is_connected() {
                continue;
            }
            if let Some(winners) = &winners {
                player.send(winners);
            }
            player.send(&results);
            if let Some(scores) = &scores {
                player.send(scores);
            }
        }
    }

    /// Closes out the round: timed-out players are dropped, and at the end of
    /// the quiz every in-round player is.
    pub fn finish_round(&mut self, report: &RoundReport, final_question: bool) {
        for &i in &report.timed_out {
            self.players[i].disconnect();
        }
        for player in self.players.iter_mut().filter(|p| p.in_round) {
            if final_question {
                player.disconnect();
            }
            player.in_round = false;
        }
    }

    pub fn snapshot(&self) -> Vec<PlayerRecord> {
        self.players
            .iter()
            .map(|p| PlayerRecord {
                name: p.name.clone(),
                wins: p.wins,
                disconnects: p.disconnects,
                score: p.score,
                finished: p.answer == Answer::Disconnected,
            })
            .collect()
    }
}
