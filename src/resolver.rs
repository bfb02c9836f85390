//! Move resolution: sowing, relay, extra turns, captures, and burning.
//!
//! [`simulate`] resolves a whole turn from a starting pit on a private copy
//! of the board. It never touches the caller's state, so heuristics and bots
//! can probe every candidate pit from the same position.
//!
//! A turn is a sequence of laps. Each lap empties its starting pit and sows
//! one stone per slot, skipping the opponent's store and every burned pit.
//! Where the last stone lands decides what happens next:
//!
//! - own store: extra turn, the turn ends
//! - any non-store pit now holding more than one stone: relay from there
//! - own pit holding exactly one stone:
//!   - opposite pit non-empty: capture both into own store
//!   - opposite pit empty and the pit was empty before the turn: burn (sunog)
//! - anything else: the stone rests
//!
//! "Empty before the turn" is a snapshot taken once, before the first lap.

use std::fmt;

use tracing::trace;

use crate::board::{Board, BurnedPits, PitSet, Player, is_store, opposite};
use crate::constants::SLOTS;

/// Why a pit cannot be played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    /// Pit is a store or lies on the other player's side
    NotOwned { pit: usize, player: Player },
    /// Pit holds no stones
    Empty(usize),
    /// Pit is burned for the acting player
    Burned(usize),
    /// The game has already ended
    GameOver,
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::NotOwned { pit, player } => {
                let pits = player.pits();
                write!(
                    f,
                    "Invalid move: hole {pit} is not one of {player}'s holes ({}-{})",
                    pits.start,
                    pits.end - 1
                )
            }
            MoveError::Empty(pit) => write!(f, "Invalid move: hole {pit} is empty"),
            MoveError::Burned(pit) => write!(f, "Invalid move: hole {pit} is burned"),
            MoveError::GameOver => write!(f, "Invalid move: the game is over"),
        }
    }
}

impl std::error::Error for MoveError {}

/// How a single lap ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LapOutcome {
    /// Last stone reached the acting player's store.
    ExtraTurn,
    /// Landing pit had stones already; sowing continues from it.
    Relay,
    /// Landing pit and its opposite were emptied into the acting player's store.
    Capture { opposite: usize, stones: u32 },
    /// Landing pit burned; its stone went to the opponent's store.
    Burn,
    /// The stone stays where it landed.
    Rest,
}

/// One sowing pass within a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lap {
    /// Pit the stones were taken from
    pub start: usize,
    /// Stones sown during the lap
    pub sown: u32,
    /// Slot that received the last stone
    pub landing: usize,
    pub outcome: LapOutcome,
}

/// Everything a resolved turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResult {
    /// Board after the whole turn
    pub board: Board,
    /// Burned pits after the turn
    pub burned: BurnedPits,
    /// Stones moved into the acting player's store by captures
    pub captured: u32,
    /// Whether the turn ended in the acting player's store
    pub extra_turn: bool,
    /// Pits burned during the turn
    pub burns: u32,
    /// Slot where the final lap ended
    pub last_pit: usize,
    /// Laps in the order they were played
    pub laps: Vec<Lap>,
}

impl TurnResult {
    /// Stones taken from the pit opposite the capture, i.e. from the other side.
    pub fn stones_taken(&self) -> u32 {
        self.laps
            .iter()
            .map(|lap| match lap.outcome {
                LapOutcome::Capture { stones, .. } => stones - 1,
                _ => 0,
            })
            .sum()
    }

    /// Short label for the final lap, used in logs.
    pub fn label(&self) -> &'static str {
        match self.laps.last().map(|lap| lap.outcome) {
            Some(LapOutcome::ExtraTurn) => "Extra Turn",
            Some(LapOutcome::Capture { .. }) => "Capture",
            Some(LapOutcome::Burn) => "Burn",
            _ => "Sow",
        }
    }
}

/// Check that `player` may start a turn from `pit`.
pub fn check_move(
    board: &Board,
    player: Player,
    burned: &BurnedPits,
    pit: usize,
) -> Result<(), MoveError> {
    if !player.owns_pit(pit) {
        return Err(MoveError::NotOwned { pit, player });
    }
    if burned.is_burned_for(player, pit) {
        return Err(MoveError::Burned(pit));
    }
    if board.get(pit) == 0 {
        return Err(MoveError::Empty(pit));
    }
    Ok(())
}

/// Slots that would receive stones when `player` sows from `from`, in order.
///
/// Skips the opponent's store and every burned pit. The iterator is endless;
/// take as many items as there are stones.
pub fn sowing_path(
    player: Player,
    burned: &BurnedPits,
    from: usize,
) -> impl Iterator<Item = usize> + use<> {
    let skipped = burned.all();
    let opponent_store = player.opponent_store();
    (1..)
        .map(move |step| (from + step) % SLOTS)
        .filter(move |&slot| slot != opponent_store && !skipped.contains(slot))
}

/// Resolve a full turn for `player` starting at `pit`.
///
/// Works on copies of `board` and `burned`; the inputs are never modified.
pub fn simulate(
    board: &Board,
    player: Player,
    burned: &BurnedPits,
    pit: usize,
) -> Result<TurnResult, MoveError> {
    check_move(board, player, burned, pit)?;

    let mut board = *board;
    let mut burned = *burned;
    let originally_empty: PitSet = (0..SLOTS).filter(|&i| board.get(i) == 0).collect();

    let mut captured = 0;
    let mut burns = 0;
    let mut extra_turn = false;
    let mut laps = Vec::new();
    let mut start = pit;

    loop {
        let stones = board.take(start);
        // Burned pits are fixed for the duration of a turn: burning ends it.
        let mut landing = start;
        for slot in sowing_path(player, &burned, start).take(stones as usize) {
            board.add(slot, 1);
            landing = slot;
        }

        let outcome = if landing == player.store() {
            extra_turn = true;
            LapOutcome::ExtraTurn
        } else if !is_store(landing) && board.get(landing) > 1 {
            LapOutcome::Relay
        } else if player.owns_pit(landing) && board.get(landing) == 1 {
            let across = opposite(landing);
            if board.get(across) > 0 {
                let stones = board.take(landing) + board.take(across);
                board.add(player.store(), stones);
                captured += stones;
                LapOutcome::Capture {
                    opposite: across,
                    stones,
                }
            } else if originally_empty.contains(landing) {
                let stone = board.take(landing);
                board.add(player.opponent_store(), stone);
                burned.burn(player, landing);
                burns += 1;
                LapOutcome::Burn
            } else {
                LapOutcome::Rest
            }
        } else {
            LapOutcome::Rest
        };

        trace!(start, sown = stones, landing, ?outcome, "lap");
        laps.push(Lap {
            start,
            sown: stones,
            landing,
            outcome,
        });

        match outcome {
            LapOutcome::Relay => start = landing,
            _ => {
                return Ok(TurnResult {
                    board,
                    burned,
                    captured,
                    extra_turn,
                    burns,
                    last_pit: landing,
                    laps,
                });
            }
        }
    }
}
