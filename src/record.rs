//! Move-by-move session records, persisted as JSON Lines.
//!
//! A [`SessionLog`] collects one [`MoveRecord`] per committed turn and a
//! [`SessionEvent`] for everything around the moves: starts, rejected moves,
//! hints and endings. On disk every line carries a `row` tag (`move`,
//! `event` or `summary`), and the summary is always last.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::info;

use crate::board::{Board, Player};
use crate::game::{Game, TurnReport};

/// One committed turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoveRecord {
    pub sequence: u32,
    pub timestamp: NaiveDateTime,
    pub player: String,
    pub pit: usize,
    /// Stones lifted from the chosen pit on the first lap
    pub stones_distributed: u32,
    pub board_before: String,
    pub board_after: String,
    /// How the final lap ended ("Sow", "Capture", "Burn", "Extra Turn")
    pub action: String,
    /// What the controller did next ("Turn Complete", "Extra Turn", "Game Over")
    pub outcome: String,
    /// Growth of the acting player's store
    pub stones_captured: u32,
    pub extra_turn: bool,
    pub burned_pits: Vec<usize>,
    pub p1_score: u32,
    pub p2_score: u32,
    pub score_difference: i64,
}

/// Something that happened in a session besides a committed turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionEvent {
    pub timestamp: NaiveDateTime,
    /// Player to move when the event happened
    pub player: String,
    /// "Game Started", "Invalid Move", "Hint", "Game Over - ..." or
    /// "Game Aborted by User"
    pub action: String,
    /// Why an invalid move was rejected
    pub detail: Option<String>,
    pub pit: Option<usize>,
    pub p1_score: u32,
    pub p2_score: u32,
    pub board: String,
    pub best_move: Option<usize>,
    pub best_score: Option<f64>,
}

/// Totals over a whole session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub started: NaiveDateTime,
    /// Ended before the game was over
    pub aborted: bool,
    pub total_moves: usize,
    pub total_captured: u32,
    pub total_extra_turns: usize,
    pub total_burns: usize,
    pub invalid_moves: usize,
    pub final_p1_score: u32,
    pub final_p2_score: u32,
    pub final_score_difference: i64,
    pub winner: String,
    pub avg_captured_per_move: f64,
    pub avg_extra_turns_per_move: f64,
}

#[derive(Serialize)]
#[serde(tag = "row", rename_all = "snake_case")]
enum Row<'a> {
    Move(&'a MoveRecord),
    Event(&'a SessionEvent),
    Summary(&'a SessionSummary),
}

const GAME_STARTED: &str = "Game Started";
const GAME_ABORTED: &str = "Game Aborted by User";
const INVALID_MOVE: &str = "Invalid Move";

fn board_text(board: &Board) -> String {
    format!("{:?}", board.slots())
}

/// `"Player 1"`, `"Player 2"` or `"Draw"`.
pub fn winner_label(winner: Option<Player>) -> String {
    winner.map_or_else(|| "Draw".to_string(), |p| p.to_string())
}

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// Serialize each row as one line of JSON.
pub fn write_rows<W: Write, T: Serialize>(mut out: W, rows: &[T]) -> anyhow::Result<()> {
    for row in rows {
        serde_json::to_writer(&mut out, row)?;
        out.write_all(b"\n")?;
    }
    Ok(())
}

/// Create `dir` if needed and open a fresh `<prefix>_<timestamp>.jsonl` in it.
/// A numeric suffix keeps files created within the same second apart.
pub fn create_jsonl(dir: &Path, prefix: &str) -> anyhow::Result<(PathBuf, BufWriter<File>)> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;
    let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let mut path = dir.join(format!("{prefix}_{stamp}.jsonl"));
    let mut n = 1;
    while path.exists() {
        n += 1;
        path = dir.join(format!("{prefix}_{stamp}_{n}.jsonl"));
    }
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok((path, BufWriter::new(file)))
}

/// Recorder for one game session.
#[derive(Debug, Clone)]
pub struct SessionLog {
    started: NaiveDateTime,
    moves: Vec<MoveRecord>,
    events: Vec<SessionEvent>,
    aborted: bool,
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLog {
    pub fn new() -> Self {
        Self {
            started: now(),
            moves: Vec::new(),
            events: Vec::new(),
            aborted: false,
        }
    }

    /// A log that opens with a "Game Started" event for `game`.
    pub fn started(game: &Game) -> Self {
        let mut log = Self::new();
        log.event(game, GAME_STARTED, None);
        log
    }

    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Nothing but the start has been recorded.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty() && self.events.iter().all(|e| e.action == GAME_STARTED)
    }

    /// Append an event; `game` is the state when it happened.
    pub fn event(&mut self, game: &Game, action: impl Into<String>, pit: Option<usize>) {
        self.push_event(game, action.into(), pit);
    }

    /// A rejected move attempt.
    pub fn invalid_move(&mut self, game: &Game, pit: usize, reason: impl ToString) {
        self.push_event(game, INVALID_MOVE.to_string(), Some(pit));
        if let Some(event) = self.events.last_mut() {
            event.detail = Some(reason.to_string());
        }
    }

    /// The move a hint suggested, with its score.
    pub fn hint(&mut self, game: &Game, best_move: usize, best_score: f64) {
        self.push_event(game, "Hint".to_string(), None);
        if let Some(event) = self.events.last_mut() {
            event.best_move = Some(best_move);
            event.best_score = Some(best_score);
        }
    }

    /// "Game Over - Winner: ..." or "Game Over - Draw".
    pub fn game_over(&mut self, game: &Game) {
        let action = match game.winner() {
            Some(player) => format!("Game Over - Winner: {player}"),
            None => "Game Over - Draw".to_string(),
        };
        self.event(game, action, None);
    }

    /// Mark the session as ended by the user before the game was over.
    pub fn abort(&mut self, game: &Game) {
        self.event(game, GAME_ABORTED, None);
        self.aborted = true;
    }

    fn push_event(&mut self, game: &Game, action: String, pit: Option<usize>) {
        self.events.push(SessionEvent {
            timestamp: now(),
            player: game.current_player().to_string(),
            action,
            detail: None,
            pit,
            p1_score: game.score(Player::First),
            p2_score: game.score(Player::Second),
            board: board_text(game.board()),
            best_move: None,
            best_score: None,
        });
    }

    /// Append a record for `report`; `game` is the state after the turn.
    pub fn record(&mut self, report: &TurnReport, game: &Game) {
        let (action, stones_distributed, extra_turn) = match &report.resolution {
            Some(result) => (
                result.label(),
                result.laps.first().map_or(0, |lap| lap.sown),
                result.extra_turn,
            ),
            None => ("None", 0, false),
        };
        let p1_score = game.score(Player::First);
        let p2_score = game.score(Player::Second);

        self.moves.push(MoveRecord {
            sequence: self.moves.len() as u32 + 1,
            timestamp: now(),
            player: report.player.to_string(),
            pit: report.pit,
            stones_distributed,
            board_before: board_text(&report.board_before),
            board_after: board_text(game.board()),
            action: action.to_string(),
            outcome: report.outcome.to_string(),
            stones_captured: report.store_gain,
            extra_turn,
            burned_pits: report.new_burns.clone(),
            p1_score,
            p2_score,
            score_difference: i64::from(p1_score) - i64::from(p2_score),
        });
    }

    pub fn summary(&self) -> SessionSummary {
        let total_moves = self.moves.len();
        let total_captured = self.moves.iter().map(|m| m.stones_captured).sum();
        let total_extra_turns = self.moves.iter().filter(|m| m.extra_turn).count();
        let total_burns = self.moves.iter().map(|m| m.burned_pits.len()).sum();
        let (p1, p2) = self
            .moves
            .last()
            .map_or((0, 0), |m| (m.p1_score, m.p2_score));
        let winner = match p1.cmp(&p2) {
            std::cmp::Ordering::Greater => Some(Player::First),
            std::cmp::Ordering::Less => Some(Player::Second),
            std::cmp::Ordering::Equal => None,
        };
        let per_move = |count: f64| {
            if total_moves == 0 {
                0.0
            } else {
                count / total_moves as f64
            }
        };

        let invalid_moves = self
            .events
            .iter()
            .filter(|e| e.action == INVALID_MOVE)
            .count();

        SessionSummary {
            started: self.started,
            aborted: self.aborted,
            total_moves,
            total_captured,
            total_extra_turns,
            total_burns,
            invalid_moves,
            final_p1_score: p1,
            final_p2_score: p2,
            final_score_difference: i64::from(p1) - i64::from(p2),
            winner: winner_label(winner),
            avg_captured_per_move: per_move(f64::from(total_captured)),
            avg_extra_turns_per_move: per_move(total_extra_turns as f64),
        }
    }

    /// Write every move, every event and then the summary to
    /// `<dir>/<prefix>_<timestamp>.jsonl`.
    pub fn write_jsonl(&self, dir: &Path, prefix: &str) -> anyhow::Result<PathBuf> {
        let (path, mut out) = create_jsonl(dir, prefix)?;
        let summary = self.summary();
        let rows: Vec<Row<'_>> = self
            .moves
            .iter()
            .map(Row::Move)
            .chain(self.events.iter().map(Row::Event))
            .chain(std::iter::once(Row::Summary(&summary)))
            .collect();
        write_rows(&mut out, &rows)?;
        out.flush()
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(
            path = %path.display(),
            moves = self.moves.len(),
            events = self.events.len(),
            aborted = self.aborted,
            "session saved"
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn played_log() -> (SessionLog, Game) {
        let mut game = Game::new();
        let mut log = SessionLog::new();
        // Pit 0 ends in the store, then pit 1 is an ordinary turn.
        for pit in [0, 1] {
            let report = game.play(pit).unwrap();
            log.record(&report, &game);
        }
        (log, game)
    }

    #[test]
    fn test_record_fields() {
        let (log, game) = played_log();
        let first = &log.moves()[0];
        assert_eq!(first.sequence, 1);
        assert_eq!(first.player, "Player 1");
        assert_eq!(first.stones_distributed, 7);
        assert_eq!(first.action, "Extra Turn");
        assert_eq!(first.outcome, "Extra Turn");
        assert!(first.extra_turn);
        assert_eq!(first.stones_captured, 1);
        assert_eq!(first.board_before, "[7, 7, 7, 7, 7, 7, 7, 0, 7, 7, 7, 7, 7, 7, 7, 0]");

        let last = &log.moves()[1];
        assert_eq!(last.sequence, 2);
        assert_eq!(last.p1_score, game.score(Player::First));
        assert_eq!(
            last.score_difference,
            i64::from(game.score(Player::First)) - i64::from(game.score(Player::Second))
        );
    }

    #[test]
    fn test_summary() {
        let (log, _) = played_log();
        let summary = log.summary();
        assert_eq!(summary.total_moves, 2);
        assert!(summary.total_extra_turns >= 1);
        assert_eq!(
            summary.final_score_difference,
            i64::from(summary.final_p1_score) - i64::from(summary.final_p2_score)
        );
        assert_eq!(SessionLog::new().summary().winner, "Draw");
    }

    #[test]
    fn test_write_jsonl() {
        let (log, _) = played_log();
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = log
            .write_jsonl(&dir.path().join("nested"), "sungka_session")
            .expect("write failed");
        let text = fs::read_to_string(&path).expect("read failed");
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["row"], "move");
        let summary: serde_json::Value = serde_json::from_str(lines[2]).unwrap();
        assert_eq!(summary["row"], "summary");
        assert_eq!(summary["total_moves"], 2);
        assert_eq!(summary["aborted"], false);
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("sungka_session_")
        );
    }

    #[test]
    fn test_events() {
        let mut game = Game::new();
        let mut log = SessionLog::started(&game);
        assert!(log.is_empty());
        assert_eq!(log.events()[0].action, "Game Started");

        log.invalid_move(&game, 9, "not your hole");
        log.hint(&game, 3, 1.5);
        assert!(!log.is_empty());
        let report = game.play(0).unwrap();
        log.record(&report, &game);
        log.abort(&game);

        let events = log.events();
        assert_eq!(events.len(), 4);
        assert_eq!(events[1].action, "Invalid Move");
        assert_eq!(events[1].detail.as_deref(), Some("not your hole"));
        assert_eq!(events[1].pit, Some(9));
        assert_eq!(events[2].best_move, Some(3));
        assert_eq!(events[2].best_score, Some(1.5));
        assert_eq!(events[3].action, "Game Aborted by User");
        assert_eq!(events[3].p1_score, game.score(Player::First));

        let summary = log.summary();
        assert!(summary.aborted);
        assert_eq!(summary.invalid_moves, 1);
        assert_eq!(summary.total_moves, 1);
    }

    #[test]
    fn test_write_jsonl_tags_rows() {
        let mut game = Game::new();
        let mut log = SessionLog::started(&game);
        let report = game.play(3).unwrap();
        log.record(&report, &game);
        log.abort(&game);

        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let path = log.write_jsonl(dir.path(), "sungka_session").unwrap();
        let rows: Vec<serde_json::Value> = fs::read_to_string(&path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        let tags: Vec<&str> = rows.iter().map(|r| r["row"].as_str().unwrap()).collect();
        assert_eq!(tags, vec!["move", "event", "event", "summary"]);
        assert_eq!(rows[2]["action"], "Game Aborted by User");
        assert_eq!(rows[3]["aborted"], true);
    }
}
