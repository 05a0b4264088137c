//! Per-tick match orchestration.
//!
//! [`MatchRunner`] owns one [`GameState`], one [`CheatRuntime`], and a
//! lazily-populated map of tank id to agent. Each tick it dispatches the
//! cheats scheduled for the current frame, polls every living tank's
//! agent, applies the resulting action, and advances the state.
//!
//! Actions are applied in order - team A's tanks in collection order,
//! then team B's - not batched. Earlier-acting tanks can claim a
//! contested cell or land the first shot; this ordering is part of the
//! deterministic contract.

use std::collections::{BTreeMap, HashMap};

use tracing::info;

use crate::agent::{Action, Policy, ScriptedAgent};
use crate::cheats::{CheatLogEntry, CheatRuntime};
use crate::entities::{TankId, Team};
use crate::error::Result;
use crate::state::{GameState, DEFAULT_TICK_LIMIT};

/// Multiplier mixing tank ids into agent seeds (Knuth's 2^32 / phi).
const SEED_MIX: u64 = 2_654_435_761;

/// Cheat commands keyed by the frame they run at.
///
/// Parsed from script text where every line is `<frame> <command...>`.
/// Empty lines and `#` comments are ignored; lines whose frame field is
/// not numeric are skipped silently.
#[derive(Debug, Clone, Default)]
pub struct CheatSchedule {
    by_frame: BTreeMap<u64, Vec<String>>,
}

impl CheatSchedule {
    /// An empty schedule.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a schedule from script text.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut by_frame: BTreeMap<u64, Vec<String>> = BTreeMap::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.splitn(2, char::is_whitespace);
            let Some(frame_field) = parts.next() else {
                continue;
            };
            let Ok(frame) = frame_field.parse::<u64>() else {
                continue;
            };
            let Some(command) = parts.next().map(str::trim) else {
                continue;
            };
            if command.is_empty() {
                continue;
            }

            by_frame.entry(frame).or_default().push(command.to_string());
        }

        Self { by_frame }
    }

    /// Add one command at a frame, after any already scheduled there.
    pub fn schedule(&mut self, frame: u64, command: impl Into<String>) {
        self.by_frame.entry(frame).or_default().push(command.into());
    }

    /// Commands bound to a frame, in file order.
    #[must_use]
    pub fn commands_for(&self, frame: u64) -> &[String] {
        self.by_frame.get(&frame).map_or(&[], Vec::as_slice)
    }

    /// Total number of scheduled commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_frame.values().map(Vec::len).sum()
    }

    /// Whether nothing is scheduled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_frame.is_empty()
    }
}

/// Everything configurable about a match besides the level layout.
#[derive(Debug, Clone)]
pub struct MatchSetup {
    /// Match seed; agent streams are derived from it.
    pub seed: u64,
    /// Frame at which an undecided match is drawn.
    pub tick_limit: u64,
    /// Default policy for team A's tanks.
    pub team_a_policy: Policy,
    /// Default policy for team B's tanks.
    pub team_b_policy: Policy,
    /// Per-tank policy overrides, beating the team default.
    pub overrides: HashMap<TankId, Policy>,
    /// Cheats to run at their scheduled frames.
    pub schedule: CheatSchedule,
}

impl Default for MatchSetup {
    fn default() -> Self {
        Self {
            seed: 0,
            tick_limit: DEFAULT_TICK_LIMIT,
            team_a_policy: Policy::default(),
            team_b_policy: Policy::default(),
            overrides: HashMap::new(),
            schedule: CheatSchedule::new(),
        }
    }
}

impl MatchSetup {
    /// Setup with a seed and defaults for everything else.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }

    /// Set the tick limit.
    #[must_use]
    pub fn tick_limit(mut self, limit: u64) -> Self {
        self.tick_limit = limit;
        self
    }

    /// Set both team default policies.
    #[must_use]
    pub fn policies(mut self, team_a: Policy, team_b: Policy) -> Self {
        self.team_a_policy = team_a;
        self.team_b_policy = team_b;
        self
    }

    /// Override the policy of one tank id.
    #[must_use]
    pub fn override_tank(mut self, id: TankId, policy: Policy) -> Self {
        self.overrides.insert(id, policy);
        self
    }

    /// Attach a cheat schedule.
    #[must_use]
    pub fn schedule(mut self, schedule: CheatSchedule) -> Self {
        self.schedule = schedule;
        self
    }
}

/// Runs one match to completion, tick by tick.
#[derive(Debug)]
pub struct MatchRunner {
    state: GameState,
    cheats: CheatRuntime,
    agents: HashMap<TankId, ScriptedAgent>,
    setup: MatchSetup,
}

impl MatchRunner {
    /// Initialize a match from a level layout and a setup.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout cannot be parsed.
    pub fn new(layout: &[String], setup: MatchSetup) -> Result<Self> {
        let state = GameState::new(layout, setup.tick_limit)?;
        info!(seed = setup.seed, tick_limit = setup.tick_limit, "Starting match");
        Ok(Self {
            state,
            cheats: CheatRuntime::new(),
            agents: HashMap::new(),
            setup,
        })
    }

    /// Advance one tick: scheduled cheats, team A's decisions, team B's
    /// decisions, then the state update. No-op once the match is over.
    pub fn step(&mut self) {
        if self.state.is_game_over() {
            return;
        }

        self.run_scheduled_cheats();
        self.run_team(Team::A);
        self.run_team(Team::B);
        self.state.update();
    }

    /// Run until the match concludes.
    pub fn run(&mut self) {
        while !self.state.is_game_over() {
            self.step();
        }
        let winner = self.state.winner().map_or("Draw", |t| match t {
            Team::A => "A",
            Team::B => "B",
        });
        info!(
            frames = self.state.frame(),
            score = self.state.score(),
            winner,
            "Match finished"
        );
    }

    /// Execute a cheat command immediately at the current frame.
    ///
    /// Returns whether it succeeded; the outcome lands in the log either
    /// way.
    pub fn execute_cheat(&mut self, command: &str) -> bool {
        let frame = self.state.frame();
        self.cheats.execute(&mut self.state, frame, command)
    }

    fn run_scheduled_cheats(&mut self) {
        let frame = self.state.frame();
        let commands = self.setup.schedule.commands_for(frame).to_vec();
        for command in commands {
            self.cheats.execute(&mut self.state, frame, &command);
        }
    }

    /// Poll and apply every living tank of a team, in collection order.
    fn run_team(&mut self, team: Team) {
        let ids: Vec<TankId> = self.state.team_tanks(team).iter().map(|t| t.id).collect();
        for id in ids {
            // Tanks can die to an earlier tank's shot within this tick.
            if !self.state.tank(id).is_some_and(|t| t.is_alive()) {
                continue;
            }

            let action = self.decide(id, team);
            match action {
                Action::Move(direction) => {
                    self.state.move_tank(id, direction);
                }
                Action::Fire => self.state.tank_shoot(id),
                Action::Stop => {}
            }
        }
    }

    /// Fetch (or lazily create) the tank's agent and poll it.
    fn decide(&mut self, id: TankId, team: Team) -> Action {
        let policy = self
            .setup
            .overrides
            .get(&id)
            .copied()
            .unwrap_or(match team {
                Team::A => self.setup.team_a_policy,
                Team::B => self.setup.team_b_policy,
            });
        let seed = self.setup.seed ^ (u64::from(id).wrapping_mul(SEED_MIX));

        let agent = self
            .agents
            .entry(id)
            .or_insert_with(|| ScriptedAgent::new(team, policy, seed));
        agent.decide(&self.state, id)
    }

    /// The match state.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// The cheat execution log so far.
    #[must_use]
    pub fn cheat_log(&self) -> &[CheatLogEntry] {
        self.cheats.log()
    }

    /// Number of failed cheats so far.
    #[must_use]
    pub fn failed_cheats(&self) -> usize {
        self.cheats.failed_count()
    }

    /// The match seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.setup.seed
    }
}
