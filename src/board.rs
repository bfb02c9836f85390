//! Board storage, player identities, and burned-pit sets.
//!
//! The board is pure data: sixteen stone counts and nothing else. Rules live
//! in [`crate::resolver`] and [`crate::game`].

use std::fmt;
use std::ops::Range;

use crate::constants::{
    FIRST_STORE, INITIAL_STONES, OPPOSITE_SUM, PITS_PER_SIDE, SECOND_STORE, SLOTS,
};

/// One of the two seats at the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Player {
    /// Owns pits 0..=6 and the store at 7 (bottom row).
    First,
    /// Owns pits 8..=14 and the store at 15 (top row).
    Second,
}

impl Player {
    pub const BOTH: [Player; 2] = [Player::First, Player::Second];

    /// 0 for the first player, 1 for the second.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Player::First => 0,
            Player::Second => 1,
        }
    }

    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::First => Player::Second,
            Player::Second => Player::First,
        }
    }

    /// Store where this player's extra-turn landings and captures go.
    #[inline]
    pub fn store(self) -> usize {
        match self {
            Player::First => FIRST_STORE,
            Player::Second => SECOND_STORE,
        }
    }

    /// Store this player skips while sowing and feeds when a pit burns.
    #[inline]
    pub fn opponent_store(self) -> usize {
        self.opponent().store()
    }

    /// Indices of this player's seven pits, in sowing order.
    #[inline]
    pub fn pits(self) -> Range<usize> {
        match self {
            Player::First => 0..PITS_PER_SIDE,
            Player::Second => FIRST_STORE + 1..SECOND_STORE,
        }
    }

    #[inline]
    pub fn owns_pit(self, index: usize) -> bool {
        self.pits().contains(&index)
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player {}", self.index() + 1)
    }
}

/// Whether `index` is one of the two stores.
#[inline]
pub fn is_store(index: usize) -> bool {
    index == FIRST_STORE || index == SECOND_STORE
}

/// The pit facing `pit` across the board. Only meaningful for pits, never stores.
#[inline]
pub fn opposite(pit: usize) -> usize {
    debug_assert!(!is_store(pit) && pit < SLOTS, "opposite() of non-pit {pit}");
    OPPOSITE_SUM - pit
}

/// Sixteen stone counts: pits 0..=6, store 7, pits 8..=14, store 15.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    slots: [u32; SLOTS],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    /// The standard opening: seven stones in every pit, both stores empty.
    pub fn new() -> Self {
        let mut slots = [INITIAL_STONES; SLOTS];
        slots[FIRST_STORE] = 0;
        slots[SECOND_STORE] = 0;
        Self { slots }
    }

    pub fn from_slots(slots: [u32; SLOTS]) -> Self {
        Self { slots }
    }

    pub fn slots(&self) -> &[u32; SLOTS] {
        &self.slots
    }

    #[inline]
    pub fn get(&self, index: usize) -> u32 {
        self.slots[index]
    }

    #[inline]
    pub fn set(&mut self, index: usize, value: u32) {
        self.slots[index] = value;
    }

    #[inline]
    pub fn add(&mut self, index: usize, stones: u32) {
        self.slots[index] += stones;
    }

    /// Empty a slot and return what it held.
    #[inline]
    pub fn take(&mut self, index: usize) -> u32 {
        std::mem::take(&mut self.slots[index])
    }

    pub fn sum(&self, range: Range<usize>) -> u32 {
        self.slots[range].iter().sum()
    }

    /// Every stone on the board, stores included.
    pub fn total(&self) -> u32 {
        self.sum(0..SLOTS)
    }

    /// Stones still in `player`'s seven pits.
    pub fn side_total(&self, player: Player) -> u32 {
        self.sum(player.pits())
    }

    /// Stones in `player`'s store.
    pub fn store(&self, player: Player) -> u32 {
        self.slots[player.store()]
    }

    /// Stones in all fourteen pits (stores excluded).
    pub fn pits_total(&self) -> u32 {
        Player::BOTH.iter().map(|&p| self.side_total(p)).sum()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "     ")?;
        for pit in Player::Second.pits().rev() {
            write!(f, "{:>3}", self.slots[pit])?;
        }
        writeln!(f)?;
        writeln!(
            f,
            "{:>3}{:>25}",
            self.slots[SECOND_STORE], self.slots[FIRST_STORE]
        )?;
        write!(f, "     ")?;
        for pit in Player::First.pits() {
            write!(f, "{:>3}", self.slots[pit])?;
        }
        writeln!(f)
    }
}

/// A set of board indices, one bit per slot.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct PitSet(u16);

impl PitSet {
    pub const EMPTY: PitSet = PitSet(0);

    #[inline]
    pub fn contains(self, index: usize) -> bool {
        self.0 & (1 << index) != 0
    }

    #[inline]
    pub fn insert(&mut self, index: usize) {
        self.0 |= 1 << index;
    }

    #[inline]
    pub fn union(self, other: PitSet) -> PitSet {
        PitSet(self.0 | other.0)
    }

    /// Members of `self` that are not in `other`.
    #[inline]
    pub fn difference(self, other: PitSet) -> PitSet {
        PitSet(self.0 & !other.0)
    }

    #[inline]
    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Members in ascending order.
    pub fn iter(self) -> impl Iterator<Item = usize> {
        (0..SLOTS).filter(move |&i| self.contains(i))
    }

    /// Whether every member of `self` is also in `other`.
    pub fn is_subset(self, other: PitSet) -> bool {
        self.0 & !other.0 == 0
    }
}

impl FromIterator<usize> for PitSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = PitSet::EMPTY;
        for i in iter {
            set.insert(i);
        }
        set
    }
}

impl fmt::Display for PitSet {
    /// Comma-separated members, empty string for the empty set.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for i in self.iter() {
            if !first {
                write!(f, ",")?;
            }
            write!(f, "{i}")?;
            first = false;
        }
        Ok(())
    }
}

/// Burned pits for both players. A pit in either set is skipped by all sowing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BurnedPits {
    sets: [PitSet; 2],
}

impl BurnedPits {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn of(&self, player: Player) -> PitSet {
        self.sets[player.index()]
    }

    #[inline]
    pub fn burn(&mut self, player: Player, pit: usize) {
        self.sets[player.index()].insert(pit);
    }

    /// Burned for `player` specifically (blocks `player` from starting there).
    #[inline]
    pub fn is_burned_for(&self, player: Player, pit: usize) -> bool {
        self.sets[player.index()].contains(pit)
    }

    /// Burned for anyone (skipped while sowing).
    #[inline]
    pub fn all(&self) -> PitSet {
        self.sets[0].union(self.sets[1])
    }

    pub fn count(&self) -> usize {
        self.sets[0].len() + self.sets[1].len()
    }
}
