//! Headless Outbreak runner.
//!
//! Plays games with the autopilot and prints results as JSON.
//!
//! # Usage
//!
//! ```bash
//! # One game on a standard map
//! cargo run -p outbreak_headless -- run --seed 7
//!
//! # One game from a RON config, saved at the end
//! cargo run -p outbreak_headless -- run --config game.ron --save final
//!
//! # Batch balance run
//! cargo run -p outbreak_headless -- batch --count 500 --difficulty hard --output results/
//!
//! # Show a save file and the leaderboards
//! cargo run -p outbreak_headless -- inspect saves/final.json
//! cargo run -p outbreak_headless -- scores --dir saves
//! ```
//!
//! Output (stdout): JSON summaries and rendered maps
//! Logs (stderr): controlled by `RUST_LOG`, `--verbose` raises the default to debug

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use outbreak_core::leaderboard::DATE_FORMAT;
use outbreak_core::prelude::*;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use outbreak_headless::{
    ascii::{render_map, render_summary},
    autopilot::AutopilotConfig,
    batch::{run_batch, BatchConfig},
    runner::{run_game, MapSize, RunConfig},
};

#[derive(Parser)]
#[command(name = "outbreak_headless")]
#[command(about = "Headless Outbreak runner for autopilot play and balance testing")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single game with the autopilot
    Run {
        /// Game config file (RON); flags below override its seed
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Map seed
        #[arg(long)]
        seed: Option<u64>,

        /// Map size preset, ignored with --config
        #[arg(long, value_enum, default_value_t = MapSize::Standard)]
        size: MapSize,

        /// Difficulty, ignored with --config
        #[arg(short, long, default_value = "medium")]
        difficulty: Difficulty,

        /// Rounds to play before stopping
        #[arg(short, long, default_value = "100")]
        rounds: u32,

        /// Directory for saves, autosaves and leaderboards
        #[arg(long)]
        save_dir: Option<PathBuf>,

        /// Write an autosave at the start of every player turn
        #[arg(long)]
        autosave: bool,

        /// Record the result on the leaderboards
        #[arg(long)]
        record: bool,

        /// Save the final state under this name
        #[arg(long)]
        save: Option<String>,

        /// Autopilot policy file (RON)
        #[arg(short, long)]
        autopilot: Option<PathBuf>,

        /// Print the final map under the summary
        #[arg(long)]
        show_map: bool,
    },

    /// Run a batch of games for balance statistics
    Batch {
        /// Number of games to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Rounds per game
        #[arg(short, long, default_value = "100")]
        rounds: u32,

        /// Map size preset
        #[arg(long, value_enum, default_value_t = MapSize::Standard)]
        size: MapSize,

        /// Difficulty
        #[arg(short, long, default_value = "medium")]
        difficulty: Difficulty,

        /// Maximum parallel games (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Autopilot policy file (RON)
        #[arg(short, long)]
        autopilot: Option<PathBuf>,

        /// Output directory for batch_results.json
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Render a saved game
    Inspect {
        /// Save file path
        path: PathBuf,

        /// Ignore fog of war
        #[arg(long)]
        reveal: bool,
    },

    /// Print the leaderboards
    Scores {
        /// Directory holding the leaderboard files
        #[arg(long, default_value = "saves")]
        dir: PathBuf,

        /// Only show cure victories for this difficulty
        #[arg(short, long)]
        difficulty: Option<Difficulty>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries results
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(filter)
        .init();

    let result = match cli.command {
        Commands::Run {
            config,
            seed,
            size,
            difficulty,
            rounds,
            save_dir,
            autosave,
            record,
            save,
            autopilot,
            show_map,
        } => {
            let options = RunOptions {
                config,
                seed,
                size,
                difficulty,
                rounds,
                save_dir,
                autosave,
                record,
                save,
                autopilot,
                show_map,
            };
            cmd_run(options)
        }
        Commands::Batch {
            count,
            seed,
            rounds,
            size,
            difficulty,
            parallel,
            autopilot,
            output,
        } => cmd_batch(count, seed, rounds, size, difficulty, parallel, autopilot, output),
        Commands::Inspect { path, reveal } => cmd_inspect(&path, reveal),
        Commands::Scores { dir, difficulty } => cmd_scores(&dir, difficulty),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

type CliResult = std::result::Result<(), Box<dyn std::error::Error>>;

struct RunOptions {
    config: Option<PathBuf>,
    seed: Option<u64>,
    size: MapSize,
    difficulty: Difficulty,
    rounds: u32,
    save_dir: Option<PathBuf>,
    autosave: bool,
    record: bool,
    save: Option<String>,
    autopilot: Option<PathBuf>,
    show_map: bool,
}

fn load_autopilot(path: Option<&Path>) -> std::result::Result<AutopilotConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(AutopilotConfig::load(path)?),
        None => Ok(AutopilotConfig::default()),
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_run(options: RunOptions) -> CliResult {
    let mut game = match &options.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig {
            map: options.size.config(0),
            difficulty: options.difficulty,
            ..GameConfig::default()
        },
    };
    if let Some(seed) = options.seed {
        game.map.seed = seed;
    }
    if let Some(dir) = options.save_dir {
        game.save_dir = dir;
    }
    game.autosave |= options.autosave;

    let config = RunConfig {
        game,
        max_rounds: options.rounds,
        autopilot: load_autopilot(options.autopilot.as_deref())?,
    };
    let save_dir = config.game.save_dir.clone();

    let (state, summary) = run_game(&config)?;

    if let Some(name) = &options.save {
        let path = SaveStore::new(&save_dir).save(&state, name)?;
        info!("Saved final state to {}", path.display());
    }
    if options.record {
        let date = chrono::Local::now().format(DATE_FORMAT).to_string();
        summary.record(&Leaderboards::new(&save_dir), &date)?;
    }

    print_json(&summary)?;
    if options.show_map {
        print!("{}", render_map(&state, false));
        print!("{}", render_summary(&state));
    }
    Ok(())
}

fn cmd_batch(
    count: u32,
    seed: u64,
    rounds: u32,
    size: MapSize,
    difficulty: Difficulty,
    parallel: u32,
    autopilot: Option<PathBuf>,
    output: Option<PathBuf>,
) -> CliResult {
    let mut run = RunConfig {
        max_rounds: rounds,
        autopilot: load_autopilot(autopilot.as_deref())?,
        ..RunConfig::default()
    };
    run.game.map = size.config(seed);
    run.game.difficulty = difficulty;

    let mut config = BatchConfig::new(count).with_run(run).with_seed(seed);
    config.parallel_games = parallel;
    config.output_dir = output;

    let results = run_batch(config);

    if let Some(dir) = &results.config.output_dir {
        let path = dir.join("batch_results.json");
        results.save(&path)?;
        info!("Results saved to {}", path.display());
    }
    for error in &results.errors {
        eprintln!("Game {} (seed {}) failed: {}", error.game_index, error.seed, error.message);
    }

    print_json(&results.summary)
}

fn cmd_inspect(path: &Path, reveal: bool) -> CliResult {
    let json = std::fs::read_to_string(path)?;
    let state = GameState::from_json(&json)?;
    print!("{}", render_map(&state, reveal));
    print!("{}", render_summary(&state));
    Ok(())
}

fn cmd_scores(dir: &Path, difficulty: Option<Difficulty>) -> CliResult {
    let boards = Leaderboards::new(dir);
    match difficulty {
        Some(difficulty) => print_json(&boards.cure_victories(difficulty)),
        None => {
            let cures: Vec<(Difficulty, Vec<CureVictory>)> = Difficulty::ALL
                .into_iter()
                .map(|d| (d, boards.cure_victories(d)))
                .collect();
            print_json(&serde_json::json!({
                "high_scores": boards.high_scores(),
                "cure_victories": cures,
            }))
        }
    }
}
