//! Headless match runner for scripted play and CI verification.
//!
//! This crate drives a [`siege_core`] match from JSON commands on stdin,
//! with responses on stdout. This enables:
//!
//! - **Scripted play**: a script or external agent supplies target orders
//!   and route choices without a user interface
//! - **CI verification**: automated checks of match flow and determinism
//! - **Formation checks**: validate scenario files before a match
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from the controller (`set_target`, `advance`, ...)
//! - **stdout**: Responses and match updates (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! See the [`protocol`] module for the full command and response format.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"complete_targets"}' | cargo run -p siege_headless
//!
//! # Run a scenario from a command file
//! cargo run -p siege_headless -- run --scenario scenarios/raid.ron --commands script.jsonl
//!
//! # Check a scenario's formations
//! cargo run -p siege_headless -- check --scenario scenarios/standard.ron
//! ```

pub mod protocol;
pub mod runner;
pub mod scenario;

pub use protocol::{Command, MatchState, Response};
pub use runner::{HeadlessConfig, HeadlessRunner, SessionSummary};
pub use scenario::{Scenario, ScenarioError};
