//! Headless match runner implementation.
//!
//! Reads [`Command`] lines from any buffered reader and writes [`Response`]
//! lines to any writer, so sessions can be driven from stdin, a command file
//! or an in-memory buffer in tests.

use std::io::{self, BufRead, Write};
use std::str::FromStr;

use siege_core::components::UnitId;
use siege_core::factions::PerFaction;
use siege_core::formation::{validate, Formation};
use siege_core::math::GridPos;
use siege_core::routes::RouteId;
use siege_core::simulation::{Match, Phase};

use crate::protocol::{Command, MatchState, Response};
use crate::scenario::{Scenario, ScenarioError};

/// Headless runner configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessConfig {
    /// Output the full state after every simulated turn.
    pub auto_state_output: bool,
}

/// What a finished session looked like.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    /// Lines that parsed into commands.
    pub commands: usize,
    /// Commands the match refused.
    pub rejected: usize,
    /// Lines that failed to parse.
    pub errors: usize,
    /// Whether the session ended with `quit`.
    pub quit: bool,
}

/// Headless runner for script-controlled matches.
pub struct HeadlessRunner<R, W> {
    game: Match,
    formations: PerFaction<Formation>,
    config: HeadlessConfig,
    input: R,
    output: W,
    announced_over: bool,
}

impl<R: BufRead, W: Write> HeadlessRunner<R, W> {
    /// Create a runner around an already started match.
    pub fn new(
        game: Match,
        formations: PerFaction<Formation>,
        config: HeadlessConfig,
        input: R,
        output: W,
    ) -> Self {
        Self {
            game,
            formations,
            config,
            input,
            output,
            announced_over: false,
        }
    }

    /// Start the scenario's match and wrap it in a runner.
    ///
    /// # Errors
    ///
    /// Fails if the scenario's configuration or formations are refused.
    pub fn from_scenario(
        scenario: &Scenario,
        config: HeadlessConfig,
        input: R,
        output: W,
    ) -> Result<Self, ScenarioError> {
        let game = scenario.build_match()?;
        Ok(Self::new(game, scenario.formations(), config, input, output))
    }

    /// The match being driven.
    pub const fn game(&self) -> &Match {
        &self.game
    }

    /// Give back the output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Run the session until `quit` or end of input.
    ///
    /// # Errors
    ///
    /// Returns IO errors from reading input or writing responses. Malformed
    /// lines and refused commands are reported on the output instead.
    pub fn run(&mut self) -> io::Result<SessionSummary> {
        let mut summary = SessionSummary::default();
        self.send(&Response::ready(&self.game))?;
        self.announce_blockers()?;

        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                break;
            }
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let command = match Command::from_json(trimmed) {
                Ok(command) => command,
                Err(e) => {
                    tracing::debug!(error = %e, "Unparseable command");
                    summary.errors += 1;
                    self.send(&Response::error(format!("Parse error: {e}"), None))?;
                    continue;
                }
            };
            summary.commands += 1;

            if matches!(command, Command::Quit) {
                summary.quit = true;
                break;
            }
            if !self.handle(&command)? {
                summary.rejected += 1;
            }
        }

        self.send(&Response::Bye)?;
        tracing::info!(
            commands = summary.commands,
            rejected = summary.rejected,
            turn = self.game.turn(),
            "Session ended"
        );
        Ok(summary)
    }

    /// Process one command. Returns `false` if the match refused it.
    fn handle(&mut self, command: &Command) -> io::Result<bool> {
        let name = command.name();
        let accepted = match command {
            Command::SetTarget { unit, x, y } => {
                let result = UnitId::from_str(unit)
                    .and_then(|id| self.game.set_unit_target(id, GridPos::new(*x, *y)));
                self.acknowledge(name, result)?
            }
            Command::CompleteTargets => {
                let result = self.game.complete_target_setting();
                let accepted = self.acknowledge(name, result)?;
                if accepted {
                    self.announce_blockers()?;
                }
                accepted
            }
            Command::Advance { count } => self.advance(*count)?,
            Command::ConfirmRoute { faction, route } => {
                let result = RouteId::try_from(*route)
                    .and_then(|route| self.game.confirm_route(*faction, route));
                let accepted = self.acknowledge(name, result.map(|_| ()))?;
                if accepted {
                    self.announce_blockers()?;
                }
                accepted
            }
            Command::Validate { faction } => {
                let report = validate(
                    *faction,
                    self.formations.get(*faction),
                    self.game.grid(),
                    &self.game.config().limits,
                );
                self.send(&Response::report(*faction, report))?;
                true
            }
            Command::Query => {
                self.send(&Response::State(MatchState::capture(&self.game)))?;
                true
            }
            Command::Hash => {
                self.send(&Response::StateHash {
                    turn: self.game.turn(),
                    hash: self.game.state_hash(),
                })?;
                true
            }
            Command::Quit => true,
        };
        Ok(accepted)
    }

    /// Simulate up to `count` turns, stopping at the first blocker.
    fn advance(&mut self, count: u32) -> io::Result<bool> {
        if self.game.phase().blocks_advance() {
            let message = match self.game.phase() {
                Phase::TargetSetting => "target setting is open; send complete_targets",
                Phase::RouteSelecting => "a vehicle is waiting; send confirm_route",
                Phase::MatchOver => "the match is over",
                Phase::Idle | Phase::Simulating => "turn cannot advance",
            };
            self.send(&Response::rejected("advance", message))?;
            self.announce_blockers()?;
            return Ok(false);
        }

        for _ in 0..count {
            let events = self.game.advance_turn();
            if events.is_empty() {
                break;
            }
            self.send(&Response::Turn(events))?;
            if self.config.auto_state_output {
                self.send(&Response::State(MatchState::capture(&self.game)))?;
            }
            if self.game.phase() != Phase::Idle {
                break;
            }
        }
        self.announce_blockers()?;
        Ok(true)
    }

    /// Tell the script what the match is waiting for, if anything.
    fn announce_blockers(&mut self) -> io::Result<()> {
        match self.game.phase() {
            Phase::RouteSelecting => {
                for faction in self.game.pending_factions() {
                    if let Some(vehicle_index) = self.game.pending_spawn(faction) {
                        self.send(&Response::RouteRequired {
                            faction,
                            vehicle_index,
                        })?;
                    }
                }
            }
            Phase::MatchOver if !self.announced_over => {
                self.announced_over = true;
                self.send(&Response::GameOver {
                    outcome: self.game.outcome(),
                    winner: self.game.outcome().winner(),
                    turn: self.game.turn(),
                    log: self.game.event_log().to_vec(),
                })?;
            }
            _ => {}
        }
        Ok(())
    }

    fn acknowledge(
        &mut self,
        cmd: &str,
        result: siege_core::error::Result<()>,
    ) -> io::Result<bool> {
        match result {
            Ok(()) => {
                self.send(&Response::ack(cmd))?;
                Ok(true)
            }
            Err(e) => {
                self.send(&Response::rejected(cmd, e.to_string()))?;
                Ok(false)
            }
        }
    }

    fn send(&mut self, response: &Response) -> io::Result<()> {
        self.output.write_all(response.to_json_line().as_bytes())?;
        self.output.flush()
    }
}
