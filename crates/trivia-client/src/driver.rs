use std::io::{self, Write};

use trivia_common::protocol::{
    self, QUESTION_TERMINATOR, RESULTS_PREFIX, SCORES_PREFIX, WINNERS_PREFIX,
};

// -- Protocol State Machine --

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Greeting,
    Scores,
    QuestionText { started: bool },
    NumOptions,
    Options { shown: usize },
    FinalInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// The quiz is over and the winners have been shown.
    Finished,
}

#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("server is full")]
    ServerFull,
    #[error("unexpected line from server")]
    Protocol,
    #[error("could not write output: {0}")]
    Io(#[from] io::Error),
}

/// Renders the server's line stream for a person. Fed one line at a time;
/// a line that does not fit the current phase is a protocol error and is
/// not printed.
#[derive(Debug)]
pub struct ClientDriver {
    phase: Phase,
    num_options: usize,
    pending_winners: Option<String>,
}

impl ClientDriver {
    pub fn new() -> Self {
        Self {
            phase: Phase::Greeting,
            num_options: 0,
            pending_winners: None,
        }
    }

    /// Options on the question currently shown; 0 between questions.
    pub fn num_options(&self) -> usize {
        self.num_options
    }

    pub fn feed(&mut self, line: &str, out: &mut impl Write) -> Result<Step, DriverError> {
        match self.phase {
            Phase::Greeting => {
                if protocol::is_server_full(line) {
                    return Err(DriverError::ServerFull);
                }
                writeln!(out, "{line}")?;
                self.phase = Phase::Scores;
            }

            Phase::Scores => {
                let scores = line
                    .strip_prefix(SCORES_PREFIX)
                    .ok_or(DriverError::Protocol)?;
                self.num_options = 0;
                writeln!(out, "Scores: {scores}")?;
                if let Some(winners) = self.pending_winners.take() {
                    writeln!(out, "Winner(s): {winners}")?;
                    return Ok(Step::Finished);
                }
                self.phase = Phase::QuestionText { started: false };
            }

            Phase::QuestionText { started: false } => {
                writeln!(out)?;
                writeln!(out, "{line}")?;
                self.phase = Phase::QuestionText { started: true };
            }

            Phase::QuestionText { started: true } => {
                if line == QUESTION_TERMINATOR {
                    self.phase = Phase::NumOptions;
                } else {
                    writeln!(out, "{line}")?;
                }
            }

            Phase::NumOptions => {
                let count = protocol::parse_guess(line).ok_or(DriverError::Protocol)? as usize;
                writeln!(out, "=====")?;
                self.num_options = count;
                if count == 0 {
                    writeln!(out, "++++")?;
                    self.phase = Phase::FinalInfo;
                } else {
                    self.phase = Phase::Options { shown: 0 };
                }
            }

            Phase::Options { shown } => {
                let shown = shown + 1;
                writeln!(out, "{shown}: {line}")?;
                if shown == self.num_options {
                    writeln!(out, "++++")?;
                    self.phase = Phase::FinalInfo;
                } else {
                    self.phase = Phase::Options { shown };
                }
            }

            Phase::FinalInfo => {
                if let Some(winners) = line.strip_prefix(WINNERS_PREFIX) {
                    self.pending_winners = Some(winners.to_string());
                } else if let Some(results) = line.strip_prefix(RESULTS_PREFIX) {
                    writeln!(out, "Results: {results}")?;
                    self.phase = Phase::Scores;
                } else {
                    return Err(DriverError::Protocol);
                }
            }
        }

        Ok(Step::Continue)
    }
}

impl Default for ClientDriver {
    fn default() -> Self {
        Self::new()
    }
}
