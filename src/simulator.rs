//! Batch simulation: the heuristic against a scripted opponent.
//!
//! Games run one after another from a single seeded RNG, so a seed
//! reproduces a whole batch. Each game yields a [`GameRow`]; the batch is
//! folded into a [`Summary`] that renders as a text report.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::board::Player;
use crate::bots::{HeuristicBot, Opponent, Policy};
use crate::constants::{DETAILED_GAMES, MAX_MOVES_PER_GAME, N_GAMES, REPORT_PERIOD};
use crate::game::Game;
use crate::heuristic::Preset;
use crate::record::{SessionLog, create_jsonl, write_rows};

/// Who opens each game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum TurnOrder {
    /// Coin flip per game.
    #[default]
    Random,
    /// First half with the heuristic opening, second half with the opponent opening.
    Split,
}

/// Batch settings.
#[derive(Debug, Clone)]
pub struct SimConfig {
    pub opponent: Opponent,
    pub games: usize,
    /// Moves after which a game is cut short and swept
    pub max_moves: usize,
    pub seed: Option<u64>,
    pub order: TurnOrder,
    pub preset: Preset,
    /// Games per turn-order block that get a move-by-move log
    pub detailed: usize,
    /// Where rows and detailed logs go; nothing is written when unset
    pub out_dir: Option<PathBuf>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            opponent: Opponent::Random,
            games: N_GAMES,
            max_moves: MAX_MOVES_PER_GAME,
            seed: None,
            order: TurnOrder::default(),
            preset: Preset::default(),
            detailed: DETAILED_GAMES,
            out_dir: None,
        }
    }
}

/// Outcome of one simulated game, seen from the heuristic's seat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameRow {
    pub game_number: usize,
    pub heuristic_first: bool,
    /// 1 or 2
    pub heuristic_player: usize,
    /// 1, 2, or `None` for a draw
    pub winner: Option<usize>,
    pub heuristic_won: Option<bool>,
    pub final_p1_store: u32,
    pub final_p2_store: u32,
    pub heuristic_score: u32,
    pub opponent_score: u32,
    pub score_difference: i64,
    pub abs_score_difference: u64,
    /// Moves by both players
    pub total_moves: usize,
    pub heuristic_moves: u32,
    pub stones_captured: u32,
    pub extra_turns: u32,
    pub burns_created: u32,
    pub burns_suffered: u32,
    pub burned_p1: Vec<usize>,
    pub burned_p2: Vec<usize>,
    /// Cut short by the move cap or an invalid move
    pub aborted: bool,
}

impl GameRow {
    pub fn has_burns(&self) -> bool {
        !self.burned_p1.is_empty() || !self.burned_p2.is_empty()
    }
}

/// Runs batches of games.
pub struct Simulator {
    config: SimConfig,
    rng: fastrand::Rng,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Self {
        let rng = config
            .seed
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        Self { config, rng }
    }

    /// Play one game. The heuristic sits in seat 1 when `heuristic_first`,
    /// otherwise in seat 2; seat 1 always opens.
    pub fn play_game(
        &mut self,
        number: usize,
        heuristic_first: bool,
        mut log: Option<&mut SessionLog>,
    ) -> GameRow {
        let heuristic_player = if heuristic_first {
            Player::First
        } else {
            Player::Second
        };
        let mut heuristic = HeuristicBot::new(self.config.preset, self.rng.u64(..));
        let mut opponent = self
            .config
            .opponent
            .policy(self.config.preset, self.rng.u64(..));

        let mut game = Game::new();
        let mut moves = 0;
        while !game.is_finished() && moves < self.config.max_moves {
            let player = game.current_player();
            let choice = if player == heuristic_player {
                heuristic.choose(&game, player)
            } else {
                opponent.choose(&game, player)
            };
            let Some(pit) = choice else {
                break;
            };
            match game.play(pit) {
                Ok(report) => {
                    moves += 1;
                    if let Some(log) = log.as_deref_mut() {
                        log.record(&report, &game);
                    }
                }
                Err(err) => {
                    warn!(game = number, %player, pit, %err, "invalid move, ending game");
                    break;
                }
            }
        }

        let mut aborted = false;
        if !game.is_over() {
            aborted = !game.is_finished();
            if aborted {
                debug!(game = number, moves, "game cut short");
            }
            game.conclude();
        }

        let metrics = *game.metrics().player(heuristic_player);
        let heuristic_score = game.score(heuristic_player);
        let opponent_score = game.score(heuristic_player.opponent());
        let score_difference = i64::from(heuristic_score) - i64::from(opponent_score);
        let winner = game.winner();

        GameRow {
            game_number: number,
            heuristic_first,
            heuristic_player: heuristic_player.index() + 1,
            winner: winner.map(|p| p.index() + 1),
            heuristic_won: winner.map(|p| p == heuristic_player),
            final_p1_store: game.score(Player::First),
            final_p2_store: game.score(Player::Second),
            heuristic_score,
            opponent_score,
            score_difference,
            abs_score_difference: score_difference.unsigned_abs(),
            total_moves: moves,
            heuristic_moves: metrics.moves,
            stones_captured: metrics.stones_captured,
            extra_turns: metrics.extra_turns,
            burns_created: metrics.burns_created,
            burns_suffered: metrics.burns_suffered,
            burned_p1: game.burned().of(Player::First).iter().collect(),
            burned_p2: game.burned().of(Player::Second).iter().collect(),
            aborted,
        }
    }

    /// Play the whole batch, writing rows and detailed logs when an output
    /// directory is configured.
    pub fn run(&mut self) -> anyhow::Result<Summary> {
        let start = Instant::now();
        let games = self.config.games;
        let half = games / 2;
        let mut rows = Vec::with_capacity(games);

        info!(opponent = %self.config.opponent, games, order = ?self.config.order, "starting simulation");
        for number in 1..=games {
            let (heuristic_first, block_index) = match self.config.order {
                TurnOrder::Random => (self.rng.bool(), number),
                TurnOrder::Split if number <= half => (true, number),
                TurnOrder::Split => (false, number - half),
            };
            let mut log = (self.config.out_dir.is_some() && block_index <= self.config.detailed)
                .then(SessionLog::new);
            let row = self.play_game(number, heuristic_first, log.as_mut());
            if let (Some(log), Some(dir)) = (log, &self.config.out_dir) {
                log.write_jsonl(dir, &format!("sungka_game_{number}"))?;
            }
            rows.push(row);

            if number % REPORT_PERIOD == 0 {
                info!(completed = number, total = games, "simulation progress");
            }
        }

        if let Some(dir) = &self.config.out_dir {
            let prefix = format!(
                "simulation_results_{}",
                self.config.opponent.title().to_lowercase().replace(' ', "_")
            );
            let (path, mut out) = create_jsonl(dir, &prefix)?;
            write_rows(&mut out, &rows)?;
            out.flush()
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), games = rows.len(), "results saved");
        }

        Ok(Summary::from_rows(
            self.config.opponent,
            &rows,
            start.elapsed(),
        ))
    }
}

// =============================================================================
// Statistics
// =============================================================================

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Sample standard deviation (n - 1 denominator).
fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

fn ratio(count: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(count) / f64::from(total)
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

/// Results for games where the heuristic held one seat.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeatStats {
    pub games: usize,
    pub wins: usize,
    pub mean_difference: f64,
}

impl SeatStats {
    fn from_rows<'a>(rows: impl Iterator<Item = &'a GameRow>) -> Self {
        let rows: Vec<&GameRow> = rows.collect();
        let diffs: Vec<f64> = rows.iter().map(|r| r.score_difference as f64).collect();
        Self {
            games: rows.len(),
            wins: rows.iter().filter(|r| r.heuristic_won == Some(true)).count(),
            mean_difference: mean(&diffs),
        }
    }

    pub fn win_rate(&self) -> f64 {
        percent(self.wins, self.games) / 100.0
    }
}

/// Aggregated batch results.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub opponent: Opponent,
    pub games: usize,
    pub elapsed: Duration,
    pub heuristic_wins: usize,
    pub opponent_wins: usize,
    pub draws: usize,
    pub aborted: usize,
    pub mean_difference: f64,
    pub mean_abs_difference: f64,
    pub median_difference: f64,
    pub std_difference: f64,
    pub max_difference: i64,
    pub min_difference: i64,
    pub as_first: SeatStats,
    pub as_second: SeatStats,
    pub total_moves: usize,
    pub heuristic_moves: u32,
    pub captured_per_move: f64,
    pub extra_turns_per_move: f64,
    pub burns_created_per_move: f64,
    pub burns_suffered_per_move: f64,
    pub games_with_burns: usize,
}

impl Summary {
    pub fn from_rows(opponent: Opponent, rows: &[GameRow], elapsed: Duration) -> Self {
        let diffs: Vec<f64> = rows.iter().map(|r| r.score_difference as f64).collect();
        let abs: Vec<f64> = rows.iter().map(|r| r.abs_score_difference as f64).collect();
        let heuristic_moves = rows.iter().map(|r| r.heuristic_moves).sum();
        let total = |f: fn(&GameRow) -> u32| rows.iter().map(f).sum::<u32>();

        Self {
            opponent,
            games: rows.len(),
            elapsed,
            heuristic_wins: rows.iter().filter(|r| r.heuristic_won == Some(true)).count(),
            opponent_wins: rows.iter().filter(|r| r.heuristic_won == Some(false)).count(),
            draws: rows.iter().filter(|r| r.heuristic_won.is_none()).count(),
            aborted: rows.iter().filter(|r| r.aborted).count(),
            mean_difference: mean(&diffs),
            mean_abs_difference: mean(&abs),
            median_difference: median(&diffs),
            std_difference: sample_std(&diffs),
            max_difference: rows.iter().map(|r| r.score_difference).max().unwrap_or(0),
            min_difference: rows.iter().map(|r| r.score_difference).min().unwrap_or(0),
            as_first: SeatStats::from_rows(rows.iter().filter(|r| r.heuristic_first)),
            as_second: SeatStats::from_rows(rows.iter().filter(|r| !r.heuristic_first)),
            total_moves: rows.iter().map(|r| r.total_moves).sum(),
            heuristic_moves,
            captured_per_move: ratio(total(|r| r.stones_captured), heuristic_moves),
            extra_turns_per_move: ratio(total(|r| r.extra_turns), heuristic_moves),
            burns_created_per_move: ratio(total(|r| r.burns_created), heuristic_moves),
            burns_suffered_per_move: ratio(total(|r| r.burns_suffered), heuristic_moves),
            games_with_burns: rows.iter().filter(|r| r.has_burns()).count(),
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(60);
        writeln!(f, "{rule}")?;
        writeln!(f, "HEURISTIC PERFORMANCE ANALYSIS")?;
        writeln!(f, "{rule}")?;
        if self.games == 0 {
            return writeln!(f, "No games completed.");
        }
        let n = self.games;
        writeln!(f, "Opponent: {}", self.opponent)?;
        writeln!(f, "Total Games: {n}")?;
        writeln!(f, "Total Time: {:.2} seconds", self.elapsed.as_secs_f64())?;
        writeln!(
            f,
            "Average Game Length: {:.1} moves",
            self.total_moves as f64 / n as f64
        )?;
        if self.aborted > 0 {
            writeln!(f, "Games Cut Short: {}/{n}", self.aborted)?;
        }

        writeln!(f, "\n--- OVERALL RESULTS ---")?;
        for (label, count) in [
            ("Heuristic Wins", self.heuristic_wins),
            ("Opponent Wins", self.opponent_wins),
            ("Draws", self.draws),
        ] {
            writeln!(f, "{label}: {count}/{n} ({:.1}%)", percent(count, n))?;
        }

        writeln!(f, "\n--- SCORE DIFFERENCE ANALYSIS ---")?;
        writeln!(
            f,
            "Average Score Difference (Heuristic - Opponent): {:+.2}",
            self.mean_difference
        )?;
        writeln!(
            f,
            "Average Absolute Score Difference: {:.2}",
            self.mean_abs_difference
        )?;
        writeln!(f, "Median Score Difference: {:+.2}", self.median_difference)?;
        writeln!(f, "Standard Deviation: {:.2}", self.std_difference)?;
        writeln!(f, "Maximum Score Difference: {:+}", self.max_difference)?;
        writeln!(f, "Minimum Score Difference: {:+}", self.min_difference)?;

        writeln!(f, "\n--- TURN ORDER ANALYSIS ---")?;
        for (label, seat) in [
            ("As First Player: ", &self.as_first),
            ("As Second Player:", &self.as_second),
        ] {
            if seat.games > 0 {
                writeln!(
                    f,
                    "{label} {}/{} ({:.1}% wins)",
                    seat.wins,
                    seat.games,
                    seat.win_rate() * 100.0
                )?;
                writeln!(f, "   Avg Score Difference: {:+.2}", seat.mean_difference)?;
            }
        }
        if self.as_first.games > 0 && self.as_second.games > 0 {
            writeln!(
                f,
                "First Player Advantage: {:+.1} percentage points",
                (self.as_first.win_rate() - self.as_second.win_rate()) * 100.0
            )?;
            writeln!(
                f,
                "First Player Score Advantage: {:+.2} points",
                self.as_first.mean_difference - self.as_second.mean_difference
            )?;
        }

        writeln!(f, "\n--- PERFORMANCE METRICS (Heuristic) ---")?;
        writeln!(
            f,
            "Avg Marbles Captured per Move: {:.4}",
            self.captured_per_move
        )?;
        writeln!(f, "Avg Extra Turns per Move: {:.4}", self.extra_turns_per_move)?;
        writeln!(
            f,
            "Avg Burned Holes Created per Move: {:.6}",
            self.burns_created_per_move
        )?;
        writeln!(
            f,
            "Avg Burned Holes Suffered per Move: {:.6}",
            self.burns_suffered_per_move
        )?;
        writeln!(
            f,
            "Games with Burned Holes: {}/{n} ({:.1}%)",
            self.games_with_burns,
            percent(self.games_with_burns, n)
        )?;
        write!(f, "{rule}")
    }
}
