//! Single-ply move scoring.
//!
//! Every legal pit is resolved once with [`crate::resolver::simulate`] and the
//! resulting position is scored as a sum of terms: immediate gains, a
//! phase-dependent position evaluation, the opponent's best immediate
//! replies, move efficiency, follow-up captures, and a small random
//! variation that keeps mirror matches from looping.
//!
//! The terms are fixed; their weights are not. [`Weights`] holds every tunable
//! number and [`Preset`] names the three tunings that were played against
//! each other.
//!
//! The scorer reads nothing but its [`ScoreInput`], so it can be run against
//! any position without a live game.

use std::fmt;

use crate::board::{Board, BurnedPits, Player};
use crate::constants::{
    CHEAP_SOW, CLEAR_TARGET, DEVELOPED_PITS, EARLY_GAME, FLEXIBLE_PITS, LATE_GAME,
    POSITIONAL_END, STARVED_PITS, TOTAL_STONES, VARIATION_START, WASTEFUL_SOW,
};
use crate::game::Game;
use crate::resolver::{TurnResult, simulate};

/// Weights for the opening or middle-game position terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseWeights {
    /// Per stone of store lead
    pub head: f64,
    /// Per stone of pit material lead
    pub material: f64,
    /// Awarded when enough own pits still hold stones
    pub active_bonus: f64,
    /// Awarded (negative) when too few own pits hold stones
    pub inactive_penalty: f64,
}

/// Late-game weights, applied once few stones remain in the pits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EndgameWeights {
    /// Stones left in all pits at or below which these terms apply
    pub threshold: u32,
    /// Store lead that counts as clearly ahead (or behind, negated)
    pub lead_margin: i32,
    pub head: f64,
    /// Per stone under the clearing target while ahead
    pub clear: f64,
    /// Per stone of material lead while behind
    pub comeback: f64,
    /// Store-deficit weight when behind with no material lead
    pub desperate: f64,
    /// Per stone of material lead in a close game
    pub even: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThreatWeights {
    /// Penalty when an opponent reply lands in its store
    pub extra_turn: f64,
    /// Penalty per own stone an opponent reply would capture
    pub per_stone: f64,
    /// Multiplier for the whole threat term
    pub scale: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EfficiencyWeights {
    /// Per captured stone per stone sown
    pub capture_ratio: f64,
    pub cheap_extra_turn: f64,
    pub costly_extra_turn: f64,
    /// Penalty for sowing a large pit with nothing to show
    pub wasteful: f64,
}

/// Bonus for the second player during the first few moves of a game.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnBalance {
    pub before_moves: u32,
    pub bonus: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionalWeights {
    /// Bonus for four or more active pits
    pub spread: f64,
    /// Penalty for one or no active pits
    pub sparse: f64,
    /// Per pit holding a moderate (3-8) number of stones
    pub moderate: f64,
}

/// All tunable numbers of the scorer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub capture: f64,
    pub extra_turn: f64,
    pub burn: f64,
    pub opening: PhaseWeights,
    pub middle: PhaseWeights,
    pub late_material: f64,
    pub endgame: EndgameWeights,
    pub threat: ThreatWeights,
    pub efficiency: EfficiencyWeights,
    pub setup_per_stone: f64,
    /// Half-width of the uniform random variation
    pub variation: f64,
    pub turn_balance: Option<TurnBalance>,
    pub positional: Option<PositionalWeights>,
}

impl Weights {
    /// Sharp tuning: large rewards for captures and extra turns, heavy burn penalty.
    pub fn optimized() -> Self {
        Self {
            capture: 12.0,
            extra_turn: 20.0,
            burn: -30.0,
            opening: PhaseWeights {
                head: 8.0,
                material: 3.0,
                active_bonus: 8.0,
                inactive_penalty: -15.0,
            },
            middle: PhaseWeights {
                head: 10.0,
                material: 2.0,
                active_bonus: 5.0,
                inactive_penalty: -8.0,
            },
            late_material: 1.0,
            endgame: EndgameWeights {
                threshold: 20,
                lead_margin: 0,
                head: 15.0,
                clear: 3.0,
                comeback: 5.0,
                desperate: 20.0,
                even: 8.0,
            },
            threat: ThreatWeights {
                extra_turn: -5.0,
                per_stone: -2.0,
                scale: 1.0,
            },
            efficiency: EfficiencyWeights {
                capture_ratio: 8.0,
                cheap_extra_turn: 6.0,
                costly_extra_turn: 2.0,
                wasteful: -8.0,
            },
            setup_per_stone: 0.5,
            variation: 2.0,
            turn_balance: None,
            positional: None,
        }
    }

    /// Toned-down tuning with a small second-player compensation.
    pub fn balanced() -> Self {
        Self {
            capture: 10.0,
            extra_turn: 15.0,
            burn: -20.0,
            opening: PhaseWeights {
                head: 6.0,
                material: 2.0,
                active_bonus: 5.0,
                inactive_penalty: -10.0,
            },
            middle: PhaseWeights {
                head: 8.0,
                material: 1.5,
                active_bonus: 3.0,
                inactive_penalty: -5.0,
            },
            late_material: 0.8,
            endgame: EndgameWeights {
                threshold: 20,
                lead_margin: 0,
                head: 12.0,
                clear: 2.0,
                comeback: 3.0,
                desperate: 15.0,
                even: 5.0,
            },
            threat: ThreatWeights {
                extra_turn: -4.0,
                per_stone: -1.5,
                scale: 1.0,
            },
            efficiency: EfficiencyWeights {
                capture_ratio: 5.0,
                cheap_extra_turn: 4.0,
                costly_extra_turn: 1.0,
                wasteful: -4.0,
            },
            setup_per_stone: 0.3,
            variation: 1.0,
            turn_balance: Some(TurnBalance {
                before_moves: 4,
                bonus: 1.0,
            }),
            positional: None,
        }
    }

    /// Slightly more aggressive than balanced, with positional control terms.
    pub fn more_balanced() -> Self {
        Self {
            capture: 11.0,
            extra_turn: 16.0,
            burn: -18.0,
            opening: PhaseWeights {
                head: 7.0,
                material: 2.5,
                active_bonus: 6.0,
                inactive_penalty: -8.0,
            },
            middle: PhaseWeights {
                head: 9.0,
                material: 1.8,
                active_bonus: 4.0,
                inactive_penalty: -4.0,
            },
            late_material: 1.0,
            endgame: EndgameWeights {
                threshold: 25,
                lead_margin: 3,
                head: 10.0,
                clear: 1.5,
                comeback: 2.5,
                desperate: 12.0,
                even: 4.0,
            },
            threat: ThreatWeights {
                extra_turn: -3.0,
                per_stone: -1.0,
                scale: 0.8,
            },
            efficiency: EfficiencyWeights {
                capture_ratio: 6.0,
                cheap_extra_turn: 5.0,
                costly_extra_turn: 2.0,
                wasteful: -3.0,
            },
            setup_per_stone: 0.4,
            variation: 1.5,
            turn_balance: Some(TurnBalance {
                before_moves: 6,
                bonus: 1.5,
            }),
            positional: Some(PositionalWeights {
                spread: 2.0,
                sparse: -3.0,
                moderate: 0.5,
            }),
        }
    }
}

impl Default for Weights {
    fn default() -> Self {
        Self::more_balanced()
    }
}

/// Named weight sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Preset {
    Optimized,
    Balanced,
    #[default]
    MoreBalanced,
}

impl Preset {
    pub fn weights(self) -> Weights {
        match self {
            Preset::Optimized => Weights::optimized(),
            Preset::Balanced => Weights::balanced(),
            Preset::MoreBalanced => Weights::more_balanced(),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Optimized => write!(f, "optimized"),
            Preset::Balanced => write!(f, "balanced"),
            Preset::MoreBalanced => write!(f, "more-balanced"),
        }
    }
}

/// One line of a move's score breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    Captures,
    ExtraTurns,
    BurnPenalty,
    HeadAdvantage,
    MaterialControl,
    Development,
    Flexibility,
    EndgameStrategy,
    ThreatAnalysis,
    MoveEfficiency,
    TacticalSetup,
    Variation,
    TurnBalance,
    PositionalControl,
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Term::Captures => "Captures",
            Term::ExtraTurns => "Extra Turns",
            Term::BurnPenalty => "Burn Penalty",
            Term::HeadAdvantage => "Head Advantage",
            Term::MaterialControl => "Material Control",
            Term::Development => "Development",
            Term::Flexibility => "Flexibility",
            Term::EndgameStrategy => "Endgame Strategy",
            Term::ThreatAnalysis => "Threat Analysis",
            Term::MoveEfficiency => "Move Efficiency",
            Term::TacticalSetup => "Tactical Setup",
            Term::Variation => "Variation",
            Term::TurnBalance => "Turn Balance",
            Term::PositionalControl => "Positional Control",
        };
        f.write_str(label)
    }
}

/// Everything the scorer is allowed to look at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInput {
    pub board: Board,
    pub burned: BurnedPits,
    /// Player whose move is being scored
    pub player: Player,
    /// Moves played by both players so far in the game
    pub moves_played: u32,
}

impl ScoreInput {
    /// Score from `player`'s perspective in the current position of `game`.
    pub fn from_game(game: &Game, player: Player) -> Self {
        Self {
            board: *game.board(),
            burned: *game.burned(),
            player,
            moves_played: game.metrics().moves(),
        }
    }
}

/// Score and breakdown for one candidate pit.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub pit: usize,
    /// Stones in the pit before the move
    pub stones_used: u32,
    pub total: f64,
    pub terms: Vec<(Term, f64)>,
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Hole {}:", self.pit)?;
        for (term, value) in &self.terms {
            writeln!(f, "  - {term}: {value:+.2}")?;
        }
        writeln!(f, "  - Stones Used: {}", self.stones_used)?;
        writeln!(f, "  => Total Score: {:+.2}", self.total)
    }
}

/// Position summary from the evaluating player's side.
struct Perspective {
    head_diff: i32,
    material_diff: i32,
    my_stones: i32,
    opponent_stones: i32,
}

impl Perspective {
    fn new(board: &Board, player: Player) -> Self {
        let opponent = player.opponent();
        let my_stones = board.side_total(player) as i32;
        let opponent_stones = board.side_total(opponent) as i32;
        Self {
            head_diff: board.store(player) as i32 - board.store(opponent) as i32,
            material_diff: my_stones - opponent_stones,
            my_stones,
            opponent_stones,
        }
    }
}

/// The move scorer.
#[derive(Debug, Clone, Default)]
pub struct Heuristic {
    weights: Weights,
}

impl Heuristic {
    pub fn new(weights: Weights) -> Self {
        Self { weights }
    }

    pub fn from_preset(preset: Preset) -> Self {
        Self::new(preset.weights())
    }

    /// Score `pit`, or `None` if `input.player` cannot play it.
    pub fn evaluate(
        &self,
        input: &ScoreInput,
        pit: usize,
        rng: &mut fastrand::Rng,
    ) -> Option<Evaluation> {
        let result = simulate(&input.board, input.player, &input.burned, pit).ok()?;
        let w = &self.weights;
        let after = &result.board;
        let player = input.player;
        let stones_used = input.board.get(pit);

        let progress = 1.0 - after.pits_total() as f64 / TOTAL_STONES as f64;
        let view = Perspective::new(after, player);
        let active = player.pits().filter(|&p| after.get(p) > 0).count();

        let mut terms = vec![
            (Term::Captures, result.captured as f64 * w.capture),
            (Term::ExtraTurns, f64::from(u8::from(result.extra_turn)) * w.extra_turn),
            (Term::BurnPenalty, result.burns as f64 * w.burn),
        ];

        if progress < EARLY_GAME {
            let phase = &w.opening;
            terms.push((Term::HeadAdvantage, view.head_diff as f64 * phase.head));
            terms.push((Term::MaterialControl, view.material_diff as f64 * phase.material));
            let development = if active >= DEVELOPED_PITS {
                phase.active_bonus
            } else if active <= STARVED_PITS {
                phase.inactive_penalty
            } else {
                0.0
            };
            terms.push((Term::Development, development));
        } else if progress > LATE_GAME {
            terms.push((Term::EndgameStrategy, self.endgame(&view)));
            terms.push((Term::MaterialControl, view.material_diff as f64 * w.late_material));
        } else {
            let phase = &w.middle;
            terms.push((Term::HeadAdvantage, view.head_diff as f64 * phase.head));
            terms.push((Term::MaterialControl, view.material_diff as f64 * phase.material));
            let flexibility = if active >= FLEXIBLE_PITS {
                phase.active_bonus
            } else {
                phase.inactive_penalty
            };
            terms.push((Term::Flexibility, flexibility));
        }

        terms.push((
            Term::ThreatAnalysis,
            self.threats(after, &result.burned, player) * w.threat.scale,
        ));
        terms.push((Term::MoveEfficiency, self.efficiency(&result, stones_used)));
        terms.push((
            Term::TacticalSetup,
            self.setup(after, &result.burned, player),
        ));

        let variation = if progress > VARIATION_START {
            (rng.f64() * 2.0 - 1.0) * w.variation
        } else {
            0.0
        };
        terms.push((Term::Variation, variation));

        if let Some(balance) = w.turn_balance {
            let bonus = if input.moves_played < balance.before_moves && player == Player::Second {
                balance.bonus
            } else {
                0.0
            };
            terms.push((Term::TurnBalance, bonus));
        }

        if let Some(positional) = w.positional {
            let mut score = 0.0;
            if progress < POSITIONAL_END {
                if active >= 4 {
                    score += positional.spread;
                } else if active <= 1 {
                    score += positional.sparse;
                }
                let moderate = player
                    .pits()
                    .filter(|&p| (3..=8).contains(&after.get(p)))
                    .count();
                score += moderate as f64 * positional.moderate;
            }
            terms.push((Term::PositionalControl, score));
        }

        let total = terms.iter().map(|(_, v)| v).sum();
        Some(Evaluation {
            pit,
            stones_used,
            total,
            terms,
        })
    }

    /// Score every legal pit for `input.player`, in pit order.
    pub fn evaluate_all(&self, input: &ScoreInput, rng: &mut fastrand::Rng) -> Vec<Evaluation> {
        input
            .player
            .pits()
            .filter_map(|pit| self.evaluate(input, pit, rng))
            .collect()
    }

    /// Highest-scoring legal pit. The lowest pit wins ties.
    pub fn best_move(&self, input: &ScoreInput, rng: &mut fastrand::Rng) -> Option<Evaluation> {
        self.evaluate_all(input, rng)
            .into_iter()
            .fold(None, |best: Option<Evaluation>, candidate| match best {
                Some(b) if b.total >= candidate.total => Some(b),
                _ => Some(candidate),
            })
    }

    fn endgame(&self, view: &Perspective) -> f64 {
        let e = &self.weights.endgame;
        let remaining = (view.my_stones + view.opponent_stones) as u32;
        if remaining > e.threshold {
            return 0.0;
        }
        let head_diff = view.head_diff as f64;
        let material = (view.my_stones - view.opponent_stones) as f64;
        if view.head_diff > e.lead_margin {
            let clear = (CLEAR_TARGET - view.my_stones).max(0) as f64 * e.clear;
            head_diff * e.head + clear
        } else if view.head_diff < -e.lead_margin {
            if view.my_stones > view.opponent_stones {
                head_diff * e.head + material * e.comeback
            } else {
                head_diff * e.desperate
            }
        } else {
            material * e.even
        }
    }

    /// Penalties for the opponent's immediate replies on the resulting board.
    fn threats(&self, board: &Board, burned: &BurnedPits, player: Player) -> f64 {
        let t = &self.weights.threat;
        let opponent = player.opponent();
        opponent
            .pits()
            .filter_map(|pit| simulate(board, opponent, burned, pit).ok())
            .map(|reply| {
                let mut score = reply.stones_taken() as f64 * t.per_stone;
                if reply.extra_turn {
                    score += t.extra_turn;
                }
                score
            })
            .sum()
    }

    fn efficiency(&self, result: &TurnResult, stones_used: u32) -> f64 {
        let e = &self.weights.efficiency;
        let mut score = 0.0;
        if result.captured > 0 {
            score += result.captured as f64 / stones_used.max(1) as f64 * e.capture_ratio;
        }
        if result.extra_turn {
            score += if stones_used <= CHEAP_SOW {
                e.cheap_extra_turn
            } else {
                e.costly_extra_turn
            };
        }
        if stones_used > WASTEFUL_SOW && result.captured == 0 && !result.extra_turn {
            score += e.wasteful;
        }
        score
    }

    /// Reward for own follow-up moves that would capture on the resulting board.
    fn setup(&self, board: &Board, burned: &BurnedPits, player: Player) -> f64 {
        player
            .pits()
            .filter_map(|pit| simulate(board, player, burned, pit).ok())
            .map(|next| next.stones_taken() as f64 * self.weights.setup_per_stone)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(slots: [u32; 16], player: Player) -> ScoreInput {
        ScoreInput {
            board: Board::from_slots(slots),
            burned: BurnedPits::new(),
            player,
            moves_played: 10,
        }
    }

    #[test]
    fn test_invalid_pit_scores_nothing() {
        let h = Heuristic::default();
        let mut rng = fastrand::Rng::with_seed(1);
        let inp = ScoreInput::from_game(&Game::new(), Player::First);
        assert!(h.evaluate(&inp, 9, &mut rng).is_none());
        assert!(h.evaluate(&inp, 7, &mut rng).is_none());
    }

    #[test]
    fn test_terms_sum_to_total() {
        let h = Heuristic::from_preset(Preset::Optimized);
        let mut rng = fastrand::Rng::with_seed(7);
        let inp = ScoreInput::from_game(&Game::new(), Player::First);
        let all = h.evaluate_all(&inp, &mut rng);
        assert_eq!(all.len(), 7);
        for eval in &all {
            let variation = eval
                .terms
                .iter()
                .find(|(t, _)| *t == Term::Variation)
                .map(|(_, v)| *v)
                .unwrap();
            assert!(variation.abs() <= 2.0);
            let sum: f64 = eval.terms.iter().map(|(_, v)| v).sum();
            assert!((sum - eval.total).abs() < 1e-9);
        }
    }

    #[test]
    fn test_deterministic_without_variation() {
        let h = Heuristic::new(Weights {
            variation: 0.0,
            ..Weights::optimized()
        });
        let inp = ScoreInput::from_game(&Game::new(), Player::First);
        let a = h.best_move(&inp, &mut fastrand::Rng::with_seed(1)).unwrap();
        let b = h.best_move(&inp, &mut fastrand::Rng::with_seed(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_prefers_extra_turn_from_opening() {
        // Pit 0 holds exactly seven stones: the last lands in the store.
        let h = Heuristic::from_preset(Preset::Optimized);
        let inp = ScoreInput::from_game(&Game::new(), Player::First);
        let mut rng = fastrand::Rng::with_seed(3);
        let eval = h.evaluate(&inp, 0, &mut rng).unwrap();
        assert_eq!(eval.terms[1], (Term::ExtraTurns, 20.0));
        assert_eq!(eval.stones_used, 7);
    }

    #[test]
    fn test_burn_penalised() {
        let h = Heuristic::from_preset(Preset::Balanced);
        let inp = input([1, 0, 7, 7, 7, 7, 7, 0, 7, 7, 7, 7, 7, 0, 7, 0], Player::First);
        let mut rng = fastrand::Rng::with_seed(3);
        let eval = h.evaluate(&inp, 0, &mut rng).unwrap();
        assert_eq!(eval.terms[2], (Term::BurnPenalty, -20.0));
    }

    #[test]
    fn test_endgame_branches() {
        let h = Heuristic::from_preset(Preset::MoreBalanced);
        let ahead = Perspective {
            head_diff: 10,
            material_diff: 0,
            my_stones: 5,
            opponent_stones: 5,
        };
        // 10 * 10 + (15 - 5) * 1.5
        assert_eq!(h.endgame(&ahead), 115.0);
        let close = Perspective {
            head_diff: 2,
            material_diff: 3,
            my_stones: 6,
            opponent_stones: 3,
        };
        assert_eq!(h.endgame(&close), 12.0);
        let desperate = Perspective {
            head_diff: -5,
            material_diff: -2,
            my_stones: 2,
            opponent_stones: 4,
        };
        assert_eq!(h.endgame(&desperate), -60.0);
        let crowded = Perspective {
            head_diff: 10,
            material_diff: 0,
            my_stones: 20,
            opponent_stones: 20,
        };
        assert_eq!(h.endgame(&crowded), 0.0);
    }

    #[test]
    fn test_turn_balance_only_for_second_player() {
        let h = Heuristic::from_preset(Preset::MoreBalanced);
        let mut game = Game::with_first_player(Player::Second);
        let inp = ScoreInput::from_game(&game, Player::Second);
        let mut rng = fastrand::Rng::with_seed(5);
        let eval = h.evaluate(&inp, 8, &mut rng).unwrap();
        assert!(eval.terms.contains(&(Term::TurnBalance, 1.5)));

        game = Game::new();
        let inp = ScoreInput::from_game(&game, Player::First);
        let eval = h.evaluate(&inp, 0, &mut rng).unwrap();
        assert!(eval.terms.contains(&(Term::TurnBalance, 0.0)));
        assert!(
            Heuristic::from_preset(Preset::Optimized)
                .evaluate(&inp, 0, &mut rng)
                .unwrap()
                .terms
                .iter()
                .all(|(t, _)| *t != Term::TurnBalance)
        );
    }

    #[test]
    fn test_threats_count_opponent_capture() {
        // Player 2 can sow 8 -> 9 (empty) and take the 5 stones in pit 5.
        let h = Heuristic::from_preset(Preset::Optimized);
        let board = Board::from_slots([0, 0, 0, 0, 0, 5, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]);
        let threat = h.threats(&board, &BurnedPits::new(), Player::First);
        assert_eq!(threat, -10.0);
    }
}
