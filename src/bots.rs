//! Move-choosing policies: scripted bots and the heuristic player.
//!
//! Every policy sees the game read-only and answers with a pit, or `None`
//! when it has no legal move.

use std::cmp::Reverse;
use std::fmt;

use crate::board::Player;
use crate::game::Game;
use crate::heuristic::{Heuristic, Preset, ScoreInput};
use crate::resolver::{simulate, sowing_path};

/// Something that picks moves.
pub trait Policy {
    fn name(&self) -> &'static str;

    /// Pick a pit for `player` in the current position of `game`.
    fn choose(&mut self, game: &Game, player: Player) -> Option<usize>;
}

/// Uniformly random legal move.
pub struct RandomBot {
    rng: fastrand::Rng,
}

impl RandomBot {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Policy for RandomBot {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn choose(&mut self, game: &Game, player: Player) -> Option<usize> {
        let moves = game.legal_moves(player);
        if moves.is_empty() {
            return None;
        }
        Some(moves[self.rng.usize(..moves.len())])
    }
}

/// Always sows the fullest pit.
pub struct MaxStonesBot;

impl Policy for MaxStonesBot {
    fn name(&self) -> &'static str {
        "Max Policy"
    }

    fn choose(&mut self, game: &Game, player: Player) -> Option<usize> {
        fullest(game, &game.legal_moves(player))
    }
}

/// Lowest-index pit among `moves` with the most stones.
fn fullest(game: &Game, moves: &[usize]) -> Option<usize> {
    moves
        .iter()
        .copied()
        .min_by_key(|&pit| Reverse(game.board().get(pit)))
}

/// Prefers pits whose stones reach exactly the player's own store.
pub struct ExactLandingBot;

impl ExactLandingBot {
    /// Stones needed from `pit` for the last one to land in `player`'s store.
    pub fn distance_to_store(game: &Game, player: Player, pit: usize) -> usize {
        sowing_path(player, game.burned(), pit)
            .position(|slot| slot == player.store())
            .map_or(usize::MAX, |i| i + 1)
    }
}

impl Policy for ExactLandingBot {
    fn name(&self) -> &'static str {
        "Exact Policy"
    }

    fn choose(&mut self, game: &Game, player: Player) -> Option<usize> {
        let moves = game.legal_moves(player);
        let exact = moves.iter().copied().filter(|&pit| {
            game.board().get(pit) as usize == Self::distance_to_store(game, player, pit)
        });
        // Nearest to the store wins; pits are ascending toward it on both sides.
        exact.max().or_else(|| fullest(game, &moves))
    }
}

/// Plain rules of thumb: capture, else cheap extra turn, else a sensible pit.
pub struct BasicRulesBot;

impl BasicRulesBot {
    fn preference(game: &Game, player: Player, pit: usize) -> i32 {
        let stones = game.board().get(pit);
        let mut score = 0;
        if (4..=8).contains(&stones) {
            score += 10;
        } else if stones <= 2 {
            score -= 5;
        } else if stones >= 12 {
            score -= 8;
        }
        match pit - player.pits().start {
            2..=4 => score += 5,
            0 | 6 => score -= 3,
            _ => {}
        }
        score
    }
}

impl Policy for BasicRulesBot {
    fn name(&self) -> &'static str {
        "Realistic Basic Rules"
    }

    fn choose(&mut self, game: &Game, player: Player) -> Option<usize> {
        let moves = game.legal_moves(player);
        let outcomes: Vec<_> = moves
            .iter()
            .filter_map(|&pit| {
                simulate(game.board(), player, game.burned(), pit)
                    .ok()
                    .map(|r| (pit, r))
            })
            .collect();

        if let Some((pit, _)) = outcomes.iter().find(|(_, r)| r.captured > 0) {
            return Some(*pit);
        }
        let cheapest_extra = outcomes
            .iter()
            .filter(|(_, r)| r.extra_turn)
            .map(|(pit, _)| *pit)
            .min_by_key(|&pit| game.board().get(pit));
        if cheapest_extra.is_some() {
            return cheapest_extra;
        }
        moves
            .iter()
            .copied()
            .min_by_key(|&pit| Reverse(Self::preference(game, player, pit)))
    }
}

/// Plays the heuristic's best move.
pub struct HeuristicBot {
    heuristic: Heuristic,
    rng: fastrand::Rng,
}

impl HeuristicBot {
    pub fn new(preset: Preset, seed: u64) -> Self {
        Self::with_heuristic(Heuristic::from_preset(preset), seed)
    }

    pub fn with_heuristic(heuristic: Heuristic, seed: u64) -> Self {
        Self {
            heuristic,
            rng: fastrand::Rng::with_seed(seed),
        }
    }
}

impl Policy for HeuristicBot {
    fn name(&self) -> &'static str {
        "Heuristic"
    }

    fn choose(&mut self, game: &Game, player: Player) -> Option<usize> {
        let input = ScoreInput::from_game(game, player);
        self.heuristic
            .best_move(&input, &mut self.rng)
            .map(|eval| eval.pit)
    }
}

/// Opponents selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Opponent {
    Random,
    Basic,
    Heuristic,
    Max,
    Exact,
}

impl Opponent {
    /// Build the policy. `seed` feeds bots that use randomness.
    pub fn policy(self, preset: Preset, seed: u64) -> Box<dyn Policy> {
        match self {
            Opponent::Random => Box::new(RandomBot::new(seed)),
            Opponent::Basic => Box::new(BasicRulesBot),
            Opponent::Heuristic => Box::new(HeuristicBot::new(preset, seed)),
            Opponent::Max => Box::new(MaxStonesBot),
            Opponent::Exact => Box::new(ExactLandingBot),
        }
    }

    /// Report title for games against this opponent.
    pub fn title(self) -> &'static str {
        match self {
            Opponent::Random => "Random",
            Opponent::Basic => "Realistic Basic Rules",
            Opponent::Heuristic => "Heuristic vs Heuristic",
            Opponent::Max => "Max Policy",
            Opponent::Exact => "Exact Policy",
        }
    }
}

impl fmt::Display for Opponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, BurnedPits};

    fn game(slots: [u32; 16], player: Player) -> Game {
        Game::from_position(Board::from_slots(slots), BurnedPits::new(), player)
    }

    #[test]
    fn test_random_bot_picks_legal() {
        let g = game([0, 3, 0, 2, 0, 0, 0, 0, 7, 7, 7, 7, 7, 7, 7, 0], Player::First);
        let mut bot = RandomBot::new(42);
        for _ in 0..20 {
            let pit = bot.choose(&g, Player::First).unwrap();
            assert!(pit == 1 || pit == 3);
        }
    }

    #[test]
    fn test_no_moves_yields_none() {
        let g = game([0, 0, 0, 0, 0, 0, 0, 9, 7, 7, 7, 7, 7, 7, 7, 0], Player::First);
        assert_eq!(RandomBot::new(1).choose(&g, Player::First), None);
        assert_eq!(MaxStonesBot.choose(&g, Player::First), None);
        assert_eq!(ExactLandingBot.choose(&g, Player::First), None);
        assert_eq!(BasicRulesBot.choose(&g, Player::First), None);
        assert_eq!(
            HeuristicBot::new(Preset::Balanced, 1).choose(&g, Player::First),
            None
        );
    }

    #[test]
    fn test_max_stones_prefers_lowest_on_tie() {
        let g = game([2, 5, 1, 5, 0, 0, 0, 0, 7, 7, 7, 7, 7, 7, 7, 0], Player::First);
        assert_eq!(MaxStonesBot.choose(&g, Player::First), Some(1));
    }

    #[test]
    fn test_distance_to_store() {
        let g = Game::new();
        assert_eq!(ExactLandingBot::distance_to_store(&g, Player::First, 0), 7);
        assert_eq!(ExactLandingBot::distance_to_store(&g, Player::First, 6), 1);
        assert_eq!(ExactLandingBot::distance_to_store(&g, Player::Second, 14), 1);
        // Burned pits are skipped on the way.
        let mut burned = BurnedPits::new();
        burned.burn(Player::First, 5);
        let g = Game::from_position(Board::new(), burned, Player::First);
        assert_eq!(ExactLandingBot::distance_to_store(&g, Player::First, 3), 3);
    }

    #[test]
    fn test_exact_landing_choice() {
        // Pit 4 (3 stones) and pit 6 (1 stone) both reach store 7; 6 is nearer.
        let g = game([0, 0, 0, 0, 3, 9, 1, 0, 7, 7, 7, 7, 7, 7, 7, 0], Player::First);
        assert_eq!(ExactLandingBot.choose(&g, Player::First), Some(6));
        // Nothing exact: falls back to the fullest pit.
        let g = game([0, 0, 0, 0, 1, 9, 0, 0, 7, 7, 7, 7, 7, 7, 7, 0], Player::First);
        assert_eq!(ExactLandingBot.choose(&g, Player::First), Some(5));
    }

    #[test]
    fn test_basic_rules_capture_first() {
        // Pit 0 -> pit 1 (empty) captures the 7 stones in pit 13.
        let g = game([1, 0, 0, 0, 0, 0, 1, 0, 7, 7, 7, 7, 7, 7, 7, 0], Player::First);
        assert_eq!(BasicRulesBot.choose(&g, Player::First), Some(0));
    }

    #[test]
    fn test_basic_rules_extra_turn_second() {
        // Pit 6 lands in the store; pit 5 rests on the empty pit 8.
        let g = game([0, 0, 0, 0, 0, 3, 1, 0, 0, 0, 0, 0, 0, 0, 7, 0], Player::First);
        assert_eq!(BasicRulesBot.choose(&g, Player::First), Some(6));
    }

    #[test]
    fn test_basic_rules_preference() {
        let g = Game::new();
        assert_eq!(BasicRulesBot::preference(&g, Player::First, 3), 15);
        assert_eq!(BasicRulesBot::preference(&g, Player::First, 0), 7);
        assert_eq!(BasicRulesBot::preference(&g, Player::Second, 10), 15);
    }

    #[test]
    fn test_opponent_policies() {
        let g = Game::new();
        for opponent in [
            Opponent::Random,
            Opponent::Basic,
            Opponent::Heuristic,
            Opponent::Max,
            Opponent::Exact,
        ] {
            let mut policy = opponent.policy(Preset::MoreBalanced, 9);
            let pit = policy.choose(&g, Player::First).unwrap();
            assert!(g.is_valid_move(pit), "{} chose {pit}", policy.name());
        }
    }
}
