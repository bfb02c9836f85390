//! Per-game performance counters.

use std::fmt;

use crate::board::Player;

/// Cumulative counters for one player over one game.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PlayerMetrics {
    /// Stones the player banked in their store through their own moves
    pub stones_captured: u32,
    pub extra_turns: u32,
    /// Pits the player burned on their own side
    pub burns_created: u32,
    /// Pits burned on this player's side by the opponent's moves
    pub burns_suffered: u32,
    pub moves: u32,
}

impl PlayerMetrics {
    /// Counter divided by moves played, zero before the first move.
    pub fn per_move(&self, count: u32) -> f64 {
        if self.moves == 0 {
            0.0
        } else {
            count as f64 / self.moves as f64
        }
    }

    fn merge(&self, other: &PlayerMetrics) -> PlayerMetrics {
        PlayerMetrics {
            stones_captured: self.stones_captured + other.stones_captured,
            extra_turns: self.extra_turns + other.extra_turns,
            burns_created: self.burns_created + other.burns_created,
            burns_suffered: self.burns_suffered + other.burns_suffered,
            moves: self.moves + other.moves,
        }
    }
}

impl fmt::Display for PlayerMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.moves == 0 {
            return writeln!(f, "No moves were made.");
        }
        writeln!(f, "Total Moves: {}", self.moves)?;
        writeln!(
            f,
            "Total Marbles Captured: {} (Avg: {:.2} per move)",
            self.stones_captured,
            self.per_move(self.stones_captured)
        )?;
        writeln!(
            f,
            "Total Extra Turns: {} (Avg: {:.2} per move)",
            self.extra_turns,
            self.per_move(self.extra_turns)
        )?;
        writeln!(
            f,
            "Burned Holes Created: {} (Avg: {:.4} per move)",
            self.burns_created,
            self.per_move(self.burns_created)
        )?;
        writeln!(
            f,
            "Burned Holes Suffered: {} (Avg: {:.4} per move)",
            self.burns_suffered,
            self.per_move(self.burns_suffered)
        )
    }
}

/// Counters for both players; owned by a [`crate::game::Game`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GameMetrics {
    players: [PlayerMetrics; 2],
}

impl GameMetrics {
    pub fn player(&self, player: Player) -> &PlayerMetrics {
        &self.players[player.index()]
    }

    /// Both players' counters added together.
    pub fn totals(&self) -> PlayerMetrics {
        self.players[0].merge(&self.players[1])
    }

    /// Moves played by both players so far.
    pub fn moves(&self) -> u32 {
        self.players[0].moves + self.players[1].moves
    }

    /// Fold one resolved move into the counters.
    pub(crate) fn record_move(&mut self, update: MoveUpdate) {
        let actor = &mut self.players[update.player.index()];
        actor.stones_captured += update.store_gain;
        actor.extra_turns += u32::from(update.extra_turn);
        actor.burns_created += update.burns_created;
        actor.moves += 1;
        self.players[update.player.opponent().index()].burns_suffered += update.burns_suffered;
    }
}

/// What the controller learned from one committed move.
#[derive(Copy, Clone, Debug)]
pub(crate) struct MoveUpdate {
    pub player: Player,
    pub store_gain: u32,
    pub extra_turn: bool,
    pub burns_created: u32,
    pub burns_suffered: u32,
}
