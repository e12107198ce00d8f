use std::io;
use std::path::Path;

use trivia_common::protocol::QUESTION_TERMINATOR;

/// Separates the question text from its option header.
const TEXT_END: &str = "----";

/// One question, pre-formatted as the lines sent to players: the text, the
/// terminator, the option count and the options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    lines: Vec<String>,
    options: usize,
    correct: u32,
}

impl Question {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn options(&self) -> usize {
        self.options
    }

    pub fn correct(&self) -> u32 {
        self.correct
    }

    /// Zero-option questions are shown but never collect answers.
    pub fn has_options(&self) -> bool {
        self.options > 0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QuestionError {
    #[error("could not read question file: {0}")]
    Unreadable(#[from] io::Error),
    #[error("question {index} is malformed")]
    Malformed { index: usize },
    #[error("question file contains no questions")]
    Empty,
}

impl QuestionError {
    /// Index of the question being built when loading failed.
    pub fn index(&self) -> usize {
        match self {
            QuestionError::Malformed { index } => *index,
            QuestionError::Unreadable(_) | QuestionError::Empty => 0,
        }
    }
}

enum ParseState {
    Text,
    Header,
    Options { remaining: usize },
    Terminator,
}

struct Draft {
    lines: Vec<String>,
    options: usize,
    correct: u32,
}

impl Draft {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            options: 0,
            correct: 0,
        }
    }

    fn finish(&mut self) -> Question {
        let draft = std::mem::replace(self, Draft::new());
        Question {
            lines: draft.lines,
            options: draft.options,
            correct: draft.correct,
        }
    }
}

pub fn load_questions(path: &Path) -> Result<Vec<Question>, QuestionError> {
    let source = std::fs::read_to_string(path)?;
    parse_questions(&source)
}

pub fn parse_questions(source: &str) -> Result<Vec<Question>, QuestionError> {
    let mut questions = Vec::new();
    let mut draft = Draft::new();
    let mut state = ParseState::Text;

    for line in source.lines() {
        let index = questions.len();
        let malformed = move || QuestionError::Malformed { index };

        state = match state {
            ParseState::Text if draft.lines.is_empty() => {
                // Blank lines between questions are tolerated.
                if line.is_empty() {
                    ParseState::Text
                } else if line == TEXT_END {
                    return Err(malformed());
                } else {
                    draft.lines.push(line.to_string());
                    ParseState::Text
                }
            }
            ParseState::Text => {
                if line == TEXT_END {
                    draft.lines.push(QUESTION_TERMINATOR.to_string());
                    ParseState::Header
                } else {
                    draft.lines.push(line.to_string());
                    ParseState::Text
                }
            }
            ParseState::Header => {
                let (options, correct) = parse_header(line).ok_or_else(malformed)?;
                draft.options = options;
                draft.correct = correct;
                draft.lines.push(options.to_string());
                if options == 0 {
                    ParseState::Terminator
                } else {
                    ParseState::Options { remaining: options }
                }
            }
            ParseState::Options { remaining } => {
                draft.lines.push(line.to_string());
                if remaining == 1 {
                    ParseState::Terminator
                } else {
                    ParseState::Options {
                        remaining: remaining - 1,
                    }
                }
            }
            ParseState::Terminator => {
                if !line.is_empty() {
                    return Err(malformed());
                }
                questions.push(draft.finish());
                ParseState::Text
            }
        };
    }

    match state {
        ParseState::Text if draft.lines.is_empty() => {}
        _ => {
            return Err(QuestionError::Malformed {
                index: questions.len(),
            })
        }
    }

    if questions.is_empty() {
        return Err(QuestionError::Empty);
    }
    Ok(questions)
}

/// `<options> <correct_index>`
fn parse_header(line: &str) -> Option<(usize, u32)> {
    let mut parts = line.split_whitespace();
    let options = parts.next()?.parse().ok()?;
    let correct = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((options, correct))
}
