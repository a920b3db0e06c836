//! Headless game runner for automated play and balance testing.
//!
//! This crate plays Outbreak without a presentation layer:
//!
//! - **Autopilot**: a scripted player policy that founds a city, gathers
//!   supplies, researches, recruits and goes for the cure
//! - **Batch runs**: many seeded games in parallel, aggregated for balance
//! - **Inspection**: ASCII rendering of saved games
//!
//! Results are printed as JSON on stdout; logs go to stderr.
//!
//! # Example
//!
//! ```bash
//! # Play one game and record it on the leaderboards
//! cargo run -p outbreak_headless -- run --seed 42 --difficulty hard --record
//!
//! # Run 200 games starting at seed 1000
//! cargo run -p outbreak_headless -- batch --count 200 --seed 1000 --output results/
//!
//! # Look at a save
//! cargo run -p outbreak_headless -- inspect saves/autosave.json --reveal
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ascii;
pub mod autopilot;
pub mod batch;
pub mod runner;

pub use ascii::{render_map, render_summary};
pub use autopilot::{Autopilot, AutopilotConfig, AutopilotError, AutopilotStats};
pub use batch::{run_batch, BatchConfig, BatchResults, BatchSummary};
pub use runner::{run_game, GameSummary, MapSize, Outcome, RunConfig};
