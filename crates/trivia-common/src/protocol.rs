use std::fmt;

// -- Line prefixes --

pub const SCORES_PREFIX: char = 'S';
pub const WINNERS_PREFIX: char = 'W';
pub const RESULTS_PREFIX: char = 'C';
pub const SERVER_FULL_PREFIX: char = '$';

/// Sent alone on a line by the server when a game has no free slot.
pub const SERVER_FULL: &str = "$";
/// Ends the text part of a question; the option count follows.
pub const QUESTION_TERMINATOR: &str = ".";
/// First line a client sends to ask for the cross-game score table.
pub const SCORES_REQUEST: &str = "scores";

// -- Round results --

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundResult {
    Correct,
    Incorrect,
    TimedOut,
}

impl RoundResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoundResult::Correct => "Correct",
            RoundResult::Incorrect => "Incorrect",
            RoundResult::TimedOut => "TimedOut",
        }
    }
}

impl fmt::Display for RoundResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// -- Line builders --

/// `S<name>:<score>[ <name>:<score>...]`
pub fn scores_line<'a>(entries: impl IntoIterator<Item = (&'a str, u32)>) -> String {
    prefixed_list(
        SCORES_PREFIX,
        entries
            .into_iter()
            .map(|(name, score)| format!("{name}:{score}")),
    )
}

/// `W<name>[ <name>...]`
pub fn winners_line<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    prefixed_list(WINNERS_PREFIX, names.into_iter().map(str::to_owned))
}

/// `C<name>:<result>[ <name>:<result>...]`
pub fn results_line<'a>(entries: impl IntoIterator<Item = (&'a str, RoundResult)>) -> String {
    prefixed_list(
        RESULTS_PREFIX,
        entries
            .into_iter()
            .map(|(name, result)| format!("{name}:{result}")),
    )
}

pub fn greeting_line(active_players: usize, min_players: usize) -> String {
    format!("Hello Player {active_players}/{min_players}.")
}

fn prefixed_list(prefix: char, items: impl Iterator<Item = String>) -> String {
    let mut line = String::from(prefix);
    for (i, item) in items.enumerate() {
        if i > 0 {
            line.push(' ');
        }
        line.push_str(&item);
    }
    line
}

// -- Parsing --

/// A guess is a non-empty run of ASCII digits. Anything else, including
/// signs, whitespace and values that overflow, is rejected.
pub fn parse_guess(line: &str) -> Option<u32> {
    if line.is_empty() || !line.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    line.parse().ok()
}

pub fn is_server_full(line: &str) -> bool {
    line.starts_with(SERVER_FULL_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scores_line() {
        let line = scores_line([("alice", 2), ("bob", 0)]);
        assert_eq!(line, "Salice:2 bob:0");
    }

    #[test]
    fn test_scores_line_empty() {
        assert_eq!(scores_line(std::iter::empty()), "S");
    }

    #[test]
    fn test_winners_line() {
        assert_eq!(winners_line(["alice"]), "Walice");
        assert_eq!(winners_line(["alice", "bob"]), "Walice bob");
    }

    #[test]
    fn test_results_line() {
        let line = results_line([
            ("alice", RoundResult::Correct),
            ("bob", RoundResult::Incorrect),
            ("carol", RoundResult::TimedOut),
        ]);
        assert_eq!(line, "Calice:Correct bob:Incorrect carol:TimedOut");
    }

    #[test]
    fn test_greeting_line() {
        assert_eq!(greeting_line(1, 2), "Hello Player 1/2.");
    }

    #[test]
    fn test_parse_guess() {
        assert_eq!(parse_guess("1"), Some(1));
        assert_eq!(parse_guess("042"), Some(42));
        assert_eq!(parse_guess(""), None);
        assert_eq!(parse_guess("-1"), None);
        assert_eq!(parse_guess("1 "), None);
        assert_eq!(parse_guess("abc"), None);
        assert_eq!(parse_guess("99999999999999999999"), None);
    }

    #[test]
    fn test_server_full_marker() {
        assert!(is_server_full(SERVER_FULL));
        assert!(!is_server_full("Hello Player 1/1."));
    }
}
