//! Sungka: play, simulate, or watch a demo.
//!
//! ## Usage
//!
//! - `sungka` - Show a demo
//! - `sungka play --opponent basic` - Play Player 1 against a bot
//! - `sungka simulate --opponent random --games 100` - Benchmark the heuristic
//! - `sungka demo` - Resolve a few moves and score the opening
//!
//! Set `RUST_LOG` or pass `-v`/`-vv` for more log output.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sungka::bots::Opponent;
use sungka::console::Console;
use sungka::constants::{DETAILED_GAMES, MAX_MOVES_PER_GAME, N_GAMES};
use sungka::game::Game;
use sungka::heuristic::{Heuristic, Preset, ScoreInput};
use sungka::simulator::{SimConfig, Simulator, TurnOrder};

/// Sungka: a Philippine mancala engine with heuristic play
#[derive(Parser)]
#[command(name = "sungka")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play interactively on the terminal
    Play {
        /// Bot that plays Player 2; two humans share the terminal when omitted
        #[arg(long, value_enum)]
        opponent: Option<Opponent>,
        /// Weights for hints and the heuristic bot
        #[arg(long, value_enum, default_value_t)]
        preset: Preset,
        /// Save each game, finished or abandoned, as JSON Lines in this directory
        #[arg(long)]
        record: Option<PathBuf>,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Pit the heuristic against a bot over many games
    Simulate {
        #[arg(long, value_enum)]
        opponent: Opponent,
        #[arg(long, default_value_t = N_GAMES)]
        games: usize,
        #[arg(long, default_value_t = MAX_MOVES_PER_GAME)]
        max_moves: usize,
        /// Who opens each game
        #[arg(long, value_enum, default_value_t)]
        order: TurnOrder,
        #[arg(long, value_enum, default_value_t)]
        preset: Preset,
        #[arg(long)]
        seed: Option<u64>,
        /// Games per turn order that get a move-by-move log
        #[arg(long, default_value_t = DETAILED_GAMES)]
        detailed: usize,
        /// Directory for result rows and detailed logs
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run a short demo of the engine
    Demo,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Some(Commands::Play {
            opponent,
            preset,
            record,
            seed,
        }) => {
            let mut console = Console::new(Heuristic::from_preset(preset), seed);
            if let Some(opponent) = opponent {
                console = console.with_opponent(opponent.policy(preset, seed.unwrap_or(0)));
            }
            if let Some(dir) = record {
                console = console.with_recording(dir);
            }
            console.run()
        }
        Some(Commands::Simulate {
            opponent,
            games,
            max_moves,
            order,
            preset,
            seed,
            detailed,
            out,
        }) => {
            let mut simulator = Simulator::new(SimConfig {
                opponent,
                games,
                max_moves,
                seed,
                order,
                preset,
                detailed,
                out_dir: out,
            });
            let summary = simulator.run()?;
            println!("{summary}");
            Ok(())
        }
        Some(Commands::Demo) | None => {
            run_demo();
            Ok(())
        }
    }
}

fn run_demo() {
    println!("Sungka: relay sowing, captures and burned pits\n");

    println!("=== Opening Move ===");
    let mut game = Game::new();
    println!("{}", game.board());
    match game.play(3) {
        Ok(report) => {
            if let Some(result) = &report.resolution {
                for lap in &result.laps {
                    println!(
                        "Sowed {} from hole {}, landed in {}: {:?}",
                        lap.sown, lap.start, lap.landing, lap.outcome
                    );
                }
            }
            println!("Turn result: {}", report.outcome);
        }
        Err(err) => println!("{err}"),
    }
    println!("{}", game.board());

    println!("=== Heuristic Scores ===");
    let heuristic = Heuristic::default();
    let mut rng = fastrand::Rng::with_seed(1);
    let input = ScoreInput::from_game(&game, game.current_player());
    for eval in heuristic.evaluate_all(&input, &mut rng) {
        println!("Hole {:>2}: {:+.2}", eval.pit, eval.total);
    }

    println!("\n=== Heuristic vs Random (10 games) ===");
    let mut simulator = Simulator::new(SimConfig {
        games: 10,
        seed: Some(1),
        detailed: 0,
        ..SimConfig::default()
    });
    match simulator.run() {
        Ok(summary) => println!(
            "Heuristic won {}/{} ({} draws, {} lost)",
            summary.heuristic_wins, summary.games, summary.draws, summary.opponent_wins
        ),
        Err(err) => println!("simulation failed: {err:#}"),
    }
}
