//! Sungka: a Philippine mancala with relay sowing, captures and burned pits.
//!
//! This crate provides the rules engine, a weighted move heuristic, a set
//! of scripted opponents, and a batch simulator for measuring the
//! heuristic against them.
//!
//! ## Modules
//!
//! - [`constants`] - Board geometry, heuristic phases, simulation defaults
//! - [`board`] - Stone counts, players, burned-pit sets
//! - [`resolver`] - Resolves a full turn (sowing, relay, capture, burn)
//! - [`game`] - Turn controller: legality, turn passing, endgame sweep
//! - [`metrics`] - Per-player counters for a game
//! - [`heuristic`] - Move scoring with tunable weight presets
//! - [`bots`] - Move-choosing policies
//! - [`simulator`] - Heuristic-versus-bot batches and their statistics
//! - [`record`] - JSON Lines move and session logs
//! - [`console`] - Text console for interactive play
//!
//! ## Example
//!
//! ```
//! use sungka::board::Player;
//! use sungka::game::{Game, TurnOutcome};
//!
//! let mut game = Game::new();
//!
//! // Seven stones from pit 0 end exactly in Player 1's store.
//! assert_eq!(game.play_turn(0), Ok(TurnOutcome::ExtraTurn));
//! assert_eq!(game.current_player(), Player::First);
//! assert_eq!(game.board().total(), 98);
//! ```

pub mod board;
pub mod bots;
pub mod console;
pub mod constants;
pub mod game;
pub mod heuristic;
pub mod metrics;
pub mod record;
pub mod resolver;
pub mod simulator;
