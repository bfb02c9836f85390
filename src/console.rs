//! Line-oriented console for playing Sungka from a terminal.
//!
//! Each input line is one command; each reply starts with `=` on success or
//! `?` on failure, followed by the message.
//!
//! ## Commands
//!
//! - `<pit>` or `play <pit>` - Sow from a pit for the player to move
//! - `hint` - Score every legal move and suggest the best one
//! - `board` - Show the board, the player to move and burned pits
//! - `moves` - List legal pits for the player to move
//! - `metrics` - Per-player counters for the current game
//! - `new` - Start a new game
//! - `help` - List commands
//! - `quit` - Exit

use std::fmt::Write as _;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tracing::warn;

use crate::board::Player;
use crate::bots::Policy;
use crate::game::{Game, TurnOutcome, TurnReport};
use crate::heuristic::{Evaluation, Heuristic, ScoreInput};
use crate::record::{SessionLog, winner_label};
use crate::resolver::LapOutcome;

const KNOWN_COMMANDS: &[&str] = &[
    "board", "help", "hint", "metrics", "moves", "new", "play", "quit",
];

/// Interactive session state.
pub struct Console {
    game: Game,
    heuristic: Heuristic,
    rng: fastrand::Rng,
    /// Plays Player 2's turns when set
    opponent: Option<Box<dyn Policy>>,
    log: SessionLog,
    record_dir: Option<PathBuf>,
}

impl Console {
    pub fn new(heuristic: Heuristic, seed: Option<u64>) -> Self {
        let game = Game::new();
        Self {
            log: SessionLog::started(&game),
            game,
            heuristic,
            rng: seed.map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed),
            opponent: None,
            record_dir: None,
        }
    }

    /// Let `opponent` play Player 2.
    pub fn with_opponent(mut self, opponent: Box<dyn Policy>) -> Self {
        self.opponent = Some(opponent);
        self
    }

    /// Save each game as JSON Lines under `dir`, including games abandoned
    /// by `new`, `quit` or end of input.
    pub fn with_recording(mut self, dir: PathBuf) -> Self {
        self.record_dir = Some(dir);
        self
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    /// Read commands from stdin until `quit` or end of input.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let stdin = io::stdin();
        self.run_with(stdin.lock(), io::stdout())
    }

    /// Read commands from `input` until `quit` or end of input, replying on
    /// `output`. An unfinished game is saved on the way out.
    pub fn run_with(&mut self, input: impl BufRead, mut output: impl Write) -> anyhow::Result<()> {
        writeln!(output, "{}", self.describe_position())?;
        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parts: Vec<&str> = line.split_whitespace().collect();
            let command = parts[0].to_lowercase();
            let (success, message) = self.execute(&command, &parts[1..]);

            let prefix = if success { '=' } else { '?' };
            writeln!(output, "{prefix} {message}\n")?;
            output.flush()?;

            if command == "quit" {
                return Ok(());
            }
        }
        if let Some(message) = self.abandon() {
            writeln!(output, "{message}")?;
        }
        Ok(())
    }

    /// Execute one command and return (success, response).
    pub fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        if let Ok(pit) = command.parse::<usize>() {
            return self.play(pit);
        }
        match command {
            "play" => match args.first().map(|a| a.parse::<usize>()) {
                Some(Ok(pit)) => self.play(pit),
                Some(Err(_)) => (false, "invalid pit".to_string()),
                None => (false, "missing argument".to_string()),
            },

            "hint" => self.hint(),

            "board" => (true, self.describe_position()),

            "moves" => {
                let player = self.game.current_player();
                let moves = self.game.legal_moves(player);
                if moves.is_empty() {
                    (true, format!("{player} has no legal moves"))
                } else {
                    let list: Vec<String> = moves.iter().map(|m| m.to_string()).collect();
                    (true, list.join(" "))
                }
            }

            "metrics" => {
                let mut out = String::from("=== PERFORMANCE METRICS SUMMARY ===\n");
                for player in Player::BOTH {
                    let _ = write!(out, "{player}\n{}", self.game.metrics().player(player));
                }
                (true, out.trim_end().to_string())
            }

            "new" => {
                let saved = self.abandon();
                self.game = Game::new();
                self.log = SessionLog::started(&self.game);
                let position = self.describe_position();
                match saved {
                    Some(message) => (true, format!("{message}\n{position}")),
                    None => (true, position),
                }
            }

            "help" => (true, KNOWN_COMMANDS.join(" ")),

            "quit" => (true, self.abandon().unwrap_or_default()),

            _ => (false, format!("unknown command: {command}")),
        }
    }

    fn play(&mut self, pit: usize) -> (bool, String) {
        let report = match self.game.play(pit) {
            Ok(report) => report,
            Err(err) => {
                self.log.invalid_move(&self.game, pit, &err);
                return (false, err.to_string());
            }
        };
        self.log.record(&report, &self.game);
        let mut out = describe_turn(&report);

        while let Some(reply) = self.opponent_turn() {
            out.push('\n');
            out.push_str(&reply);
        }

        if self.game.is_over() {
            out.push('\n');
            out.push_str(&self.finish());
        } else {
            out.push('\n');
            out.push_str(&self.describe_position());
        }
        (true, out.trim_end().to_string())
    }

    /// Let the bot move if it is Player 2's turn; `None` when it is not.
    fn opponent_turn(&mut self) -> Option<String> {
        let player = self.game.current_player();
        if self.game.is_over() || player != Player::Second {
            return None;
        }
        let opponent = self.opponent.as_mut()?;
        let pit = opponent.choose(&self.game, player);
        let result = match pit {
            Some(pit) => self.game.play(pit),
            None => {
                self.game.conclude();
                return Some(format!("{player} has no moves left"));
            }
        };
        match result {
            Ok(report) => {
                self.log.record(&report, &self.game);
                Some(format!(
                    "{} plays {}\n{}",
                    opponent.name(),
                    report.pit,
                    describe_turn(&report)
                ))
            }
            Err(err) => {
                warn!(%err, "opponent chose an invalid move");
                if let Some(pit) = pit {
                    self.log.invalid_move(&self.game, pit, &err);
                }
                self.game.conclude();
                Some(format!("{} made an invalid move: {err}", opponent.name()))
            }
        }
    }

    fn hint(&mut self) -> (bool, String) {
        if self.game.is_over() {
            return (false, "the game is over".to_string());
        }
        let player = self.game.current_player();
        let input = ScoreInput::from_game(&self.game, player);
        let evaluations = self.heuristic.evaluate_all(&input, &mut self.rng);
        let Some(best) = evaluations
            .iter()
            .fold(None::<&Evaluation>, |best, e| match best {
                Some(b) if b.total >= e.total => Some(b),
                _ => Some(e),
            })
        else {
            return (false, format!("{player} has no legal moves"));
        };

        let mut out = format!("Evaluating possible moves for {player}:\n");
        for eval in &evaluations {
            let _ = writeln!(out, "{eval}");
        }
        let _ = write!(out, "Suggested Best Move: Hole {}", best.pit);
        self.log.hint(&self.game, best.pit, best.total);
        (true, out)
    }

    fn describe_position(&self) -> String {
        let mut out = String::new();
        let _ = write!(out, "{}", self.game.board());
        let burned = self.game.burned();
        for player in Player::BOTH {
            let pits = burned.of(player);
            if !pits.is_empty() {
                let _ = writeln!(out, "Burned ({player}): {pits}");
            }
        }
        if self.game.is_over() {
            out.push_str("Game over");
        } else {
            let _ = write!(out, "{} to move", self.game.current_player());
        }
        out
    }

    fn finish(&mut self) -> String {
        let mut out = self.describe_position();
        let _ = write!(
            out,
            "\nFinal score: {} - {}\nWinner: {}",
            self.game.score(Player::First),
            self.game.score(Player::Second),
            winner_label(self.game.winner())
        );
        self.log.game_over(&self.game);
        if let Some(message) = self.save() {
            let _ = write!(out, "\n{message}");
        }
        out
    }

    /// Record an unfinished game as aborted and save it. `None` when there
    /// is nothing to save.
    fn abandon(&mut self) -> Option<String> {
        if self.record_dir.is_none() || self.game.is_over() || self.log.is_empty() {
            return None;
        }
        self.log.abort(&self.game);
        self.save()
    }

    fn save(&self) -> Option<String> {
        let dir = self.record_dir.as_ref()?;
        Some(match self.log.write_jsonl(dir, "sungka_session") {
            Ok(path) => format!("Session saved to {}", path.display()),
            Err(err) => {
                warn!("failed to save session: {err:#}");
                format!("Failed to save session: {err:#}")
            }
        })
    }
}

/// One line per lap plus the controller's verdict.
fn describe_turn(report: &TurnReport) -> String {
    let player = report.player;
    let mut out = String::new();
    if let Some(result) = &report.resolution {
        for lap in &result.laps {
            let _ = write!(
                out,
                "Sowed {} from hole {}, last stone in {}",
                lap.sown, lap.start, lap.landing
            );
            match lap.outcome {
                LapOutcome::Relay => out.push_str(", continuing"),
                LapOutcome::Capture { opposite, stones } => {
                    let _ = write!(
                        out,
                        ": {player} captured {stones} stones from holes {} and {opposite}",
                        lap.landing
                    );
                }
                LapOutcome::Burn => {
                    let _ = write!(out, ": SUNOG! {player}'s hole {} is now burned", lap.landing);
                }
                LapOutcome::ExtraTurn | LapOutcome::Rest => {}
            }
            out.push('\n');
        }
    }
    let _ = write!(out, "=== Turn Result: {} ===", report.outcome);
    if report.outcome == TurnOutcome::ExtraTurn {
        let _ = write!(out, "\n{player} moves again");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bots::MaxStonesBot;
    use crate::heuristic::Preset;

    fn console() -> Console {
        Console::new(Heuristic::from_preset(Preset::MoreBalanced), Some(3))
    }

    #[test]
    fn test_play_by_number_and_command() {
        let mut c = console();
        let (success, response) = c.execute("0", &[]);
        assert!(success);
        assert!(response.contains("Extra Turn"));
        assert_eq!(c.game().current_player(), Player::First);

        let (success, _) = c.execute("play", &["1"]);
        assert!(success);
        assert_eq!(c.game().metrics().moves(), 2);
    }

    #[test]
    fn test_invalid_moves_rejected() {
        let mut c = console();
        let (success, response) = c.execute("9", &[]);
        assert!(!success);
        assert!(response.starts_with("Invalid move"));

        let (success, _) = c.execute("play", &[]);
        assert!(!success);
        let (success, _) = c.execute("play", &["x"]);
        assert!(!success);
        assert_eq!(c.game().metrics().moves(), 0);
    }

    #[test]
    fn test_opponent_replies() {
        let mut c = console().with_opponent(Box::new(MaxStonesBot));
        // Pit 3 does not end in the store, so the bot answers.
        let (success, response) = c.execute("3", &[]);
        assert!(success);
        assert!(response.contains("Max Policy plays"));
        assert!(c.game().is_over() || c.game().current_player() == Player::First);
        assert!(c.game().metrics().player(Player::Second).moves >= 1);
    }

    #[test]
    fn test_hint_and_moves() {
        let mut c = console();
        let (success, response) = c.execute("hint", &[]);
        assert!(success);
        assert!(response.contains("Suggested Best Move: Hole"));

        let (success, response) = c.execute("moves", &[]);
        assert!(success);
        assert_eq!(response, "0 1 2 3 4 5 6");
    }

    #[test]
    fn test_new_and_unknown() {
        let mut c = console();
        c.execute("0", &[]);
        let (success, _) = c.execute("new", &[]);
        assert!(success);
        assert_eq!(c.game().metrics().moves(), 0);
        assert_eq!(c.game().board().store(Player::First), 0);

        let (success, response) = c.execute("dance", &[]);
        assert!(!success);
        assert_eq!(response, "unknown command: dance");
    }

    #[test]
    fn test_metrics_and_board() {
        let mut c = console();
        c.execute("0", &[]);
        let (success, response) = c.execute("metrics", &[]);
        assert!(success);
        assert!(response.contains("Total Extra Turns: 1"));
        assert!(response.contains("No moves were made."));

        let (_, response) = c.execute("board", &[]);
        assert!(response.ends_with("Player 1 to move"));
    }

    fn session_rows(path: &std::path::Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn saved_sessions(dir: &std::path::Path) -> Vec<std::path::PathBuf> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        paths.sort();
        paths
    }

    #[test]
    fn test_abandoned_games_are_saved() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let mut c = console().with_recording(dir.path().to_path_buf());
        c.execute("0", &[]);
        let (success, _) = c.execute("9", &[]);
        assert!(!success);
        let (_, response) = c.execute("new", &[]);
        assert!(response.starts_with("Session saved to"));
        c.execute("3", &[]);
        let (success, response) = c.execute("quit", &[]);
        assert!(success);
        assert!(response.starts_with("Session saved to"));

        let paths = saved_sessions(dir.path());
        assert_eq!(paths.len(), 2);

        let first = session_rows(&paths[0]);
        let actions: Vec<&str> = first
            .iter()
            .filter(|r| r["row"] == "event")
            .map(|r| r["action"].as_str().unwrap())
            .collect();
        assert_eq!(actions, vec!["Game Started", "Invalid Move", "Game Aborted by User"]);
        let summary = first.last().unwrap();
        assert_eq!(summary["row"], "summary");
        assert_eq!(summary["aborted"], true);
        assert_eq!(summary["total_moves"], 1);
        assert_eq!(summary["invalid_moves"], 1);

        let second = session_rows(&paths[1]);
        assert_eq!(second.last().unwrap()["total_moves"], 1);
        assert_eq!(second.last().unwrap()["aborted"], true);
    }

    #[test]
    fn test_end_of_input_saves_session() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let mut c = console().with_recording(dir.path().to_path_buf());
        let mut output = Vec::new();
        c.run_with(std::io::Cursor::new("0\nhint\n"), &mut output)
            .unwrap();
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Session saved to"));

        let paths = saved_sessions(dir.path());
        assert_eq!(paths.len(), 1);
        let rows = session_rows(&paths[0]);
        let hint = rows
            .iter()
            .find(|r| r["action"] == "Hint")
            .expect("no hint row");
        assert!(hint["best_move"].as_u64().is_some());
        assert!(hint["best_score"].as_f64().is_some());
        assert_eq!(rows.last().unwrap()["aborted"], true);
    }

    #[test]
    fn test_untouched_game_is_not_saved() {
        let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let mut c = console().with_recording(dir.path().to_path_buf());
        let (_, response) = c.execute("quit", &[]);
        assert!(response.is_empty());
        assert!(saved_sessions(dir.path()).is_empty());
    }
}
