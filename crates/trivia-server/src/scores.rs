use std::fmt;
use std::sync::Arc;

use crate::game::Game;
use crate::roster::PlayerRecord;

/// Cross-game totals for one player name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerTotals {
    pub name: String,
    pub played: u32,
    pub wins: u32,
    pub disconnects: u32,
    pub score: u32,
}

impl fmt::Display for PlayerTotals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} played:{} won:{} disc:{} score:{}",
            self.name, self.played, self.wins, self.disconnects, self.score
        )
    }
}

/// Builds the score table across every running game. Each game's roster is
/// locked only while its records are copied, one game at a time.
pub async fn aggregate(games: &[Arc<Game>]) -> Vec<PlayerTotals> {
    let mut totals = Vec::new();
    for game in games {
        if !game.is_running() {
            continue;
        }
        let records = game.roster().lock().await.snapshot();
        merge_snapshot(&mut totals, &records);
    }
    totals
}

/// Folds one game's records into the running totals, keeping first-seen order.
/// Score only counts for players whose game is over.
pub fn merge_snapshot(totals: &mut Vec<PlayerTotals>, records: &[PlayerRecord]) {
    for record in records {
        let score = if record.finished { record.score } else { 0 };
        match totals.iter_mut().find(|t| t.name == record.name) {
            Some(entry) => {
                entry.played += 1;
                entry.wins += record.wins;
                entry.disconnects += record.disconnects;
                entry.score += score;
            }
            None => totals.push(PlayerTotals {
                name: record.name.clone(),
                played: 1,
                wins: record.wins,
                disconnects: record.disconnects,
                score,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameSettings;
    use crate::connection::PlayerLink;
    use std::time::Duration;

    fn record(name: &str, wins: u32, disconnects: u32, score: u32, finished: bool) -> PlayerRecord {
        PlayerRecord {
            name: name.into(),
            wins,
            disconnects,
            score,
            finished,
        }
    }

    #[test]
    fn test_merge_across_games() {
        let mut totals = Vec::new();
        merge_snapshot(
            &mut totals,
            &[record("alice", 1, 0, 3, true), record("bob", 0, 1, 1, true)],
        );
        merge_snapshot(
            &mut totals,
            &[record("carol", 0, 0, 2, true), record("alice", 0, 1, 2, true)],
        );

        assert_eq!(totals.len(), 3);
        assert_eq!(
            totals[0],
            PlayerTotals {
                name: "alice".into(),
                played: 2,
                wins: 1,
                disconnects: 1,
                score: 5,
            }
        );
        assert_eq!(totals[1].name, "bob");
        assert_eq!(totals[2].name, "carol");
    }

    #[test]
    fn test_unfinished_players_contribute_no_score() {
        let mut totals = Vec::new();
        merge_snapshot(
            &mut totals,
            &[record("alice", 0, 0, 4, false), record("alice", 1, 0, 2, true)],
        );
        assert_eq!(totals[0].played, 2);
        assert_eq!(totals[0].wins, 1);
        assert_eq!(totals[0].score, 2);
    }

    #[test]
    fn test_display_format() {
        let totals = PlayerTotals {
            name: "alice".into(),
            played: 2,
            wins: 1,
            disconnects: 0,
            score: 7,
        };
        assert_eq!(totals.to_string(), "alice played:2 won:1 disc:0 score:7");
    }

    fn game() -> Arc<Game> {
        let settings = GameSettings {
            round_time: Duration::from_secs(1),
            min_players: 1,
            max_players: 4,
        };
        Arc::new(Game::new(0, settings, Vec::new()))
    }

    #[tokio::test]
    async fn test_aggregate_is_repeatable() {
        let games: Vec<Arc<Game>> = vec![game(), game()];
        for (game, name) in games.iter().zip(["alice", "bob"]) {
            let (link, _rx) = PlayerLink::detached();
            game.roster().lock().await.register(name.into(), link);
        }

        let first = aggregate(&games).await;
        let second = aggregate(&games).await;
        assert_eq!(first, second);
        assert_eq!(
            first.iter().map(|t| t.name.as_str()).collect::<Vec<_>>(),
            ["alice", "bob"]
        );
    }
}
