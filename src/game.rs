//! The turn controller: authoritative game state, legality, turn passing,
//! end-of-game detection, and the endgame sweep.
//!
//! All mutation of a game goes through [`Game::play`]. A move is resolved
//! completely by [`crate::resolver::simulate`] before anything is committed,
//! so callers never observe a half-played turn.

use std::fmt;

use tracing::debug;

use crate::board::{Board, BurnedPits, Player};
use crate::metrics::{GameMetrics, MoveUpdate};
use crate::resolver::{MoveError, TurnResult, check_move, simulate};

/// What the caller should do after a successful move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The same player moves again.
    ExtraTurn,
    /// Play passed to the opponent.
    TurnComplete,
    /// The game ended and the remaining stones were swept.
    GameOver,
}

impl fmt::Display for TurnOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnOutcome::ExtraTurn => write!(f, "Extra Turn"),
            TurnOutcome::TurnComplete => write!(f, "Turn Complete"),
            TurnOutcome::GameOver => write!(f, "Game Over"),
        }
    }
}

/// Detailed account of one call to [`Game::play`], for loggers and UIs.
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub player: Player,
    pub pit: usize,
    pub board_before: Board,
    pub outcome: TurnOutcome,
    /// `None` when the game ended before the move could be resolved
    pub resolution: Option<TurnResult>,
    /// Pits burned by this move, for either player
    pub new_burns: Vec<usize>,
    /// Growth of the acting player's store from this move
    pub store_gain: u32,
}

/// A game of Sungka in progress.
#[derive(Clone, Debug)]
pub struct Game {
    board: Board,
    burned: BurnedPits,
    current: Player,
    metrics: GameMetrics,
    over: bool,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Standard opening with Player 1 to move.
    pub fn new() -> Self {
        Self::with_first_player(Player::First)
    }

    /// Standard opening with `player` to move first.
    pub fn with_first_player(player: Player) -> Self {
        Self::from_position(Board::new(), BurnedPits::new(), player)
    }

    /// Start from an arbitrary position (analysis and tests).
    pub fn from_position(board: Board, burned: BurnedPits, current: Player) -> Self {
        Self {
            board,
            burned,
            current,
            metrics: GameMetrics::default(),
            over: false,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn burned(&self) -> &BurnedPits {
        &self.burned
    }

    pub fn current_player(&self) -> Player {
        self.current
    }

    pub fn metrics(&self) -> &GameMetrics {
        &self.metrics
    }

    /// Whether the game has reached its terminal state.
    pub fn is_over(&self) -> bool {
        self.over
    }

    /// Whether the game is over or the player to move has nothing left to sow.
    pub fn is_finished(&self) -> bool {
        self.over || self.board.side_total(self.current) == 0
    }

    pub fn score(&self, player: Player) -> u32 {
        self.board.store(player)
    }

    /// Player with the larger store, or `None` on a draw.
    pub fn winner(&self) -> Option<Player> {
        let first = self.score(Player::First);
        let second = self.score(Player::Second);
        match first.cmp(&second) {
            std::cmp::Ordering::Greater => Some(Player::First),
            std::cmp::Ordering::Less => Some(Player::Second),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// Pits `player` may start from, in ascending order.
    pub fn legal_moves(&self, player: Player) -> Vec<usize> {
        player
            .pits()
            .filter(|&pit| check_move(&self.board, player, &self.burned, pit).is_ok())
            .collect()
    }

    /// Whether the player to move may start from `pit`.
    pub fn is_valid_move(&self, pit: usize) -> bool {
        !self.over && check_move(&self.board, self.current, &self.burned, pit).is_ok()
    }

    /// Resolve `pit` for the player to move without changing the game.
    pub fn simulate(&self, pit: usize) -> Result<TurnResult, MoveError> {
        simulate(&self.board, self.current, &self.burned, pit)
    }

    /// Play `pit` for the player to move.
    pub fn play_turn(&mut self, pit: usize) -> Result<TurnOutcome, MoveError> {
        self.play(pit).map(|report| report.outcome)
    }

    /// Play `pit` for the player to move and report everything that happened.
    pub fn play(&mut self, pit: usize) -> Result<TurnReport, MoveError> {
        if self.over {
            return Err(MoveError::GameOver);
        }
        let player = self.current;
        let board_before = self.board;

        if self.is_finished() {
            self.conclude();
            return Ok(TurnReport {
                player,
                pit,
                board_before,
                outcome: TurnOutcome::GameOver,
                resolution: None,
                new_burns: Vec::new(),
                store_gain: 0,
            });
        }

        let result = simulate(&self.board, player, &self.burned, pit)?;

        let burned_before = self.burned;
        let store_before = self.board.store(player);
        self.board = result.board;
        self.burned = result.burned;

        let store_gain = self.board.store(player).saturating_sub(store_before);
        let created = self.burned.of(player).difference(burned_before.of(player));
        let suffered = self
            .burned
            .of(player.opponent())
            .difference(burned_before.of(player.opponent()));
        self.metrics.record_move(MoveUpdate {
            player,
            store_gain,
            extra_turn: result.extra_turn,
            burns_created: created.len() as u32,
            burns_suffered: suffered.len() as u32,
        });

        let outcome = if result.extra_turn {
            TurnOutcome::ExtraTurn
        } else {
            self.current = player.opponent();
            if self.is_finished() {
                self.conclude();
                TurnOutcome::GameOver
            } else {
                TurnOutcome::TurnComplete
            }
        };

        debug!(
            %player,
            pit,
            laps = result.laps.len(),
            captured = result.captured,
            burns = result.burns,
            %outcome,
            "turn resolved"
        );

        Ok(TurnReport {
            player,
            pit,
            board_before,
            outcome,
            new_burns: created.union(suffered).iter().collect(),
            resolution: Some(result),
            store_gain,
        })
    }

    /// End the game: sweep every side's pit stones into that side's own store.
    ///
    /// When one side is already empty this is the standard endgame sweep. The
    /// simulator also calls it to cut a game short.
    pub fn conclude(&mut self) {
        for player in Player::BOTH {
            let remaining: u32 = player.pits().map(|pit| self.board.take(pit)).sum();
            if remaining > 0 {
                debug!(%player, remaining, "collecting remaining stones");
                self.board.add(player.store(), remaining);
            }
        }
        self.over = true;
    }
}
