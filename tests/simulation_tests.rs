//! Bots and batch simulation, driven through the public API.

use sungka::board::Player;
use sungka::bots::{HeuristicBot, Opponent, Policy};
use sungka::constants::TOTAL_STONES;
use sungka::game::{Game, TurnOutcome};
use sungka::heuristic::{Heuristic, Preset, ScoreInput, Weights};
use sungka::simulator::{SimConfig, Simulator, TurnOrder};

const OPPONENTS: [Opponent; 5] = [
    Opponent::Random,
    Opponent::Basic,
    Opponent::Heuristic,
    Opponent::Max,
    Opponent::Exact,
];

// =============================================================================
// Bots
// =============================================================================

/// Let two policies play a full game and return the finished game.
fn play_out(first: &mut dyn Policy, second: &mut dyn Policy) -> Game {
    let mut game = Game::new();
    for _ in 0..1000 {
        let player = game.current_player();
        let policy: &mut dyn Policy = match player {
            Player::First => &mut *first,
            Player::Second => &mut *second,
        };
        let Some(pit) = policy.choose(&game, player) else {
            game.conclude();
            return game;
        };
        assert!(
            game.is_valid_move(pit),
            "{} chose illegal pit {pit}",
            policy.name()
        );
        if game.play_turn(pit) == Ok(TurnOutcome::GameOver) {
            return game;
        }
    }
    panic!("game did not finish");
}

#[test]
fn test_every_bot_finishes_games() {
    for (i, opponent) in OPPONENTS.into_iter().enumerate() {
        let mut first = opponent.policy(Preset::Balanced, i as u64);
        let mut second = Opponent::Random.policy(Preset::Balanced, 100 + i as u64);
        let game = play_out(first.as_mut(), second.as_mut());
        assert!(game.is_over());
        assert_eq!(
            game.score(Player::First) + game.score(Player::Second),
            TOTAL_STONES
        );
    }
}

#[test]
fn test_heuristic_bot_matches_best_move() {
    let game = Game::new();
    let weights = Weights {
        variation: 0.0,
        ..Weights::optimized()
    };
    let heuristic = Heuristic::new(weights);
    let mut bot = HeuristicBot::with_heuristic(heuristic.clone(), 5);
    let mut rng = fastrand::Rng::with_seed(5);
    let best = heuristic
        .best_move(&ScoreInput::from_game(&game, Player::First), &mut rng)
        .unwrap();
    assert_eq!(bot.choose(&game, Player::First), Some(best.pit));
}

// =============================================================================
// Simulator
// =============================================================================

fn config(opponent: Opponent, games: usize) -> SimConfig {
    SimConfig {
        opponent,
        games,
        seed: Some(2024),
        detailed: 0,
        ..SimConfig::default()
    }
}

#[test]
fn test_batch_against_every_opponent() {
    for opponent in OPPONENTS {
        let summary = Simulator::new(config(opponent, 4)).run().unwrap();
        assert_eq!(summary.games, 4);
        assert_eq!(
            summary.heuristic_wins + summary.opponent_wins + summary.draws,
            4
        );
        assert_eq!(summary.as_first.games + summary.as_second.games, 4);
        assert!(summary.max_difference >= summary.min_difference);
        assert!(summary.to_string().contains(opponent.title()));
    }
}

#[test]
fn test_same_seed_same_summary() {
    let a = Simulator::new(config(Opponent::Basic, 6)).run().unwrap();
    let b = Simulator::new(config(Opponent::Basic, 6)).run().unwrap();
    assert_eq!(a.heuristic_wins, b.heuristic_wins);
    assert_eq!(a.mean_difference, b.mean_difference);
    assert_eq!(a.total_moves, b.total_moves);
}

#[test]
fn test_split_order_seats() {
    let mut sim = Simulator::new(SimConfig {
        order: TurnOrder::Split,
        ..config(Opponent::Max, 5)
    });
    let rows: Vec<_> = (1..=4)
        .map(|n| sim.play_game(n, n <= 2, None))
        .collect();
    assert!(rows[..2].iter().all(|r| r.heuristic_player == 1));
    assert!(rows[2..].iter().all(|r| r.heuristic_player == 2));

    let summary = sim.run().unwrap();
    assert_eq!(summary.as_first.games, 2);
    assert_eq!(summary.as_second.games, 3);
}

#[test]
fn test_results_written_as_json_lines() {
    let dir = tempfile::TempDir::new().expect("Failed to create temp dir");
    let summary = Simulator::new(SimConfig {
        detailed: 2,
        out_dir: Some(dir.path().to_path_buf()),
        ..config(Opponent::Random, 3)
    })
    .run()
    .unwrap();
    assert_eq!(summary.games, 3);

    let mut results = None;
    let mut detailed = 0;
    for entry in std::fs::read_dir(dir.path()).unwrap() {
        let path = entry.unwrap().path();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if name.starts_with("simulation_results_random_") {
            results = Some(path);
        } else if name.starts_with("sungka_game_") {
            detailed += 1;
        }
    }
    assert_eq!(detailed, 2);

    let text = std::fs::read_to_string(results.expect("no results file")).unwrap();
    let rows: Vec<serde_json::Value> = text
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(rows.len(), 3);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row["game_number"], i + 1);
        let p1 = row["final_p1_store"].as_u64().unwrap();
        let p2 = row["final_p2_store"].as_u64().unwrap();
        assert_eq!(p1 + p2, u64::from(TOTAL_STONES));
    }
}
