//! Constants for board geometry, heuristic phases, and simulation defaults.
//!
//! The board is a flat array of 16 slots walked counter-clockwise:
//!
//! ```text
//!        14 13 12 11 10  9  8
//!    15                        7
//!         0  1  2  3  4  5  6
//! ```
//!
//! Player 1 owns pits 0..=6 and the store at 7; Player 2 owns pits 8..=14
//! and the store at 15.

// =============================================================================
// Board Geometry
// =============================================================================

/// Number of playable pits per side.
pub const PITS_PER_SIDE: usize = 7;

/// Total number of slots on the board (14 pits + 2 stores).
pub const SLOTS: usize = 16;

/// Store ("head") of the first player.
pub const FIRST_STORE: usize = 7;

/// Store ("head") of the second player.
pub const SECOND_STORE: usize = 15;

/// Pits are mirrored around this value: `opposite(i) = OPPOSITE_SUM - i`.
pub const OPPOSITE_SUM: usize = 14;

/// Stones placed in every pit at the start of a game.
pub const INITIAL_STONES: u32 = 7;

/// Stones in play for a standard game (14 pits x 7 stones).
pub const TOTAL_STONES: u32 = INITIAL_STONES * (2 * PITS_PER_SIDE) as u32;

// =============================================================================
// Heuristic Game Phases
// =============================================================================

/// Game progress below which the position is scored as an opening.
pub const EARLY_GAME: f64 = 0.3;

/// Game progress above which the endgame terms take over.
pub const LATE_GAME: f64 = 0.6;

/// Progress after which the random variation term is applied.
pub const VARIATION_START: f64 = 0.1;

/// Progress after which positional control is no longer scored.
pub const POSITIONAL_END: f64 = 0.7;

/// Active pits needed for the opening development bonus.
pub const DEVELOPED_PITS: usize = 5;

/// Active pits at or below which the opening is considered starved.
pub const STARVED_PITS: usize = 2;

/// Active pits needed for the middle-game flexibility bonus.
pub const FLEXIBLE_PITS: usize = 3;

/// Own-side stones below which the endgame "clear the side" bonus grows.
pub const CLEAR_TARGET: i32 = 15;

/// Sowing more stones than this without a gain counts as wasteful.
pub const WASTEFUL_SOW: u32 = 12;

/// Extra turns that take at most this many stones count as cheap.
pub const CHEAP_SOW: u32 = 6;

// =============================================================================
// Simulation Defaults
// =============================================================================

/// Default number of games in a batch.
pub const N_GAMES: usize = 100;

/// Default cap on moves per game before the simulator aborts it.
pub const MAX_MOVES_PER_GAME: usize = 200;

/// Default number of games per batch that get a detailed move log.
pub const DETAILED_GAMES: usize = 5;

/// Progress report period (games between progress messages).
pub const REPORT_PERIOD: usize = 10;
