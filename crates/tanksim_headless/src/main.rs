//! Headless tank-battle match runner.
//!
//! Runs seeded, fully deterministic matches without any rendering and
//! emits JSON result reports.
//!
//! # Usage
//!
//! ```bash
//! # Run a single match on a built-in level
//! cargo run -p tanksim_headless -- run --level level2 --seed 7
//!
//! # Attach a cheat script and write the report to a file
//! cargo run -p tanksim_headless -- run --cheats cheats.txt --output result.json
//!
//! # Sweep 100 seeds for a policy matchup
//! cargo run -p tanksim_headless -- batch --count 100 \
//!     --team-a-policy astar_attack --team-b-policy defensive
//!
//! # Verify a seed replays identically
//! cargo run -p tanksim_headless -- verify --seed 12345 --runs 5
//! ```

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tanksim_core::agent::Policy;
use tanksim_core::entities::TankId;
use tanksim_core::runner::{CheatSchedule, MatchRunner, MatchSetup};
use tanksim_headless::batch::{run_batch, BatchConfig};
use tanksim_headless::levels;
use tanksim_headless::report::MatchReport;

#[derive(Parser)]
#[command(name = "tanksim_headless")]
#[command(about = "Headless tank-battle match runner for AI testing and CI")]
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
    /// Run a single match and emit a JSON report
    Run {
        /// Built-in level name
        #[arg(short, long, default_value = "level1")]
        level: String,

        /// Load the layout from a text file instead
        #[arg(long, conflicts_with = "level")]
        level_file: Option<PathBuf>,

        /// Match seed (defaults to a clock-derived value)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Maximum frames before a forced draw
        #[arg(long, default_value = "500")]
        max_frames: u64,

        /// Advertised tick rate, recorded in the report
        #[arg(long, default_value = "10")]
        tick_rate: u32,

        /// Team A default agent policy
        #[arg(long, default_value = "attack_base")]
        team_a_policy: Policy,

        /// Team B default agent policy
        #[arg(long, default_value = "attack_base")]
        team_b_policy: Policy,

        /// Per-tank policy override as id:policy (repeatable)
        #[arg(long = "tank-policy")]
        tank_policy: Vec<String>,

        /// Cheat script file (lines of "<frame> <command>")
        #[arg(long)]
        cheats: Option<PathBuf>,

        /// Report output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run a batch of matches across a seed sweep
    Batch {
        /// Built-in level name
        #[arg(short, long, default_value = "level1")]
        level: String,

        /// Number of matches to run
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// First seed of the sweep
        #[arg(long, default_value = "0")]
        seed_start: u64,

        /// Maximum frames per match
        #[arg(long, default_value = "500")]
        max_frames: u64,

        /// Team A default agent policy
        #[arg(long, default_value = "attack_base")]
        team_a_policy: Policy,

        /// Team B default agent policy
        #[arg(long, default_value = "attack_base")]
        team_b_policy: Policy,

        /// Summary output path (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Verify determinism by replaying one seed several times
    Verify {
        /// Built-in level name
        #[arg(short, long, default_value = "level2")]
        level: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Maximum frames per run
        #[arg(long, default_value = "500")]
        max_frames: u64,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logging goes to stderr; stdout carries reports.
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    match cli.command {
        Commands::Run {
            level,
            level_file,
            seed,
            max_frames,
            tick_rate,
            team_a_policy,
            team_b_policy,
            tank_policy,
            cheats,
            output,
        } => cmd_run(RunArgs {
            level,
            level_file,
            seed,
            max_frames,
            tick_rate,
            team_a_policy,
            team_b_policy,
            tank_policy,
            cheats,
            output,
        }),
        Commands::Batch {
            level,
            count,
            seed_start,
            max_frames,
            team_a_policy,
            team_b_policy,
            output,
        } => cmd_batch(
            &level,
            count,
            seed_start,
            max_frames,
            team_a_policy,
            team_b_policy,
            output,
        ),
        Commands::Verify {
            level,
            seed,
            runs,
            max_frames,
        } => cmd_verify(&level, seed, runs, max_frames),
    }
}

struct RunArgs {
    level: String,
    level_file: Option<PathBuf>,
    seed: Option<u64>,
    max_frames: u64,
    tick_rate: u32,
    team_a_policy: Policy,
    team_b_policy: Policy,
    tank_policy: Vec<String>,
    cheats: Option<PathBuf>,
    output: Option<PathBuf>,
}

/// Run one match end to end and emit its report.
fn cmd_run(args: RunArgs) {
    let (layout, level_label) = match &args.level_file {
        Some(path) => match levels::load_file(path) {
            Ok(rows) => (rows, path.display().to_string()),
            Err(e) => fail(&format!("cannot load level file: {e}")),
        },
        None => match levels::by_name(&args.level) {
            Ok(rows) => (rows, args.level.clone()),
            Err(e) => fail(&e.to_string()),
        },
    };

    let seed = args.seed.unwrap_or_else(clock_seed);
    let mut setup = MatchSetup::with_seed(seed)
        .tick_limit(args.max_frames)
        .policies(args.team_a_policy, args.team_b_policy);

    for spec in &args.tank_policy {
        match parse_tank_policy(spec) {
            Ok((id, policy)) => setup = setup.override_tank(id, policy),
            Err(e) => fail(&e),
        }
    }

    let cheats_label = match &args.cheats {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => {
                let schedule = CheatSchedule::parse(&text);
                info!(path = %path.display(), commands = schedule.len(), "Loaded cheat script");
                setup = setup.schedule(schedule);
                path.display().to_string()
            }
            Err(e) => fail(&format!("cannot read cheat script: {e}")),
        },
        None => String::new(),
    };

    let mut runner = match MatchRunner::new(&layout, setup) {
        Ok(runner) => runner,
        Err(e) => fail(&e.to_string()),
    };
    runner.run();

    let report = MatchReport::from_runner(&runner, args.tick_rate, &level_label, &cheats_label);
    emit(&report, args.output.as_deref());
}

/// Run a seed sweep and emit the aggregate summary.
fn cmd_batch(
    level: &str,
    count: u32,
    seed_start: u64,
    max_frames: u64,
    team_a_policy: Policy,
    team_b_policy: Policy,
    output: Option<PathBuf>,
) {
    let layout = match levels::by_name(level) {
        Ok(rows) => rows,
        Err(e) => fail(&e.to_string()),
    };

    let config = BatchConfig {
        layout,
        count,
        seed_start,
        max_frames,
        team_a_policy,
        team_b_policy,
    };

    match run_batch(&config) {
        Ok(summary) => emit(&summary, output.as_deref()),
        Err(e) => fail(&e.to_string()),
    }
}

/// Replay one seed `runs` times and compare final state hashes.
fn cmd_verify(level: &str, seed: u64, runs: u32, max_frames: u64) {
    let layout = match levels::by_name(level) {
        Ok(rows) => rows,
        Err(e) => fail(&e.to_string()),
    };

    let mut hashes = Vec::new();
    for _ in 0..runs.max(1) {
        let setup = MatchSetup::with_seed(seed).tick_limit(max_frames);
        let mut runner = match MatchRunner::new(&layout, setup) {
            Ok(runner) => runner,
            Err(e) => fail(&e.to_string()),
        };
        runner.run();
        hashes.push(runner.state().state_hash());
    }

    if hashes.windows(2).all(|w| w[0] == w[1]) {
        info!(seed, runs, hash = hashes[0], "Deterministic: all runs matched");
    } else {
        error!(seed, ?hashes, "NON-DETERMINISTIC: runs diverged");
        std::process::exit(1);
    }
}

/// Parse a per-tank override spec of the form `id:policy`.
fn parse_tank_policy(spec: &str) -> Result<(TankId, Policy), String> {
    let (id, policy) = spec
        .split_once(':')
        .ok_or_else(|| format!("invalid tank policy spec '{spec}' (expected id:policy)"))?;
    let id: TankId = id
        .parse()
        .map_err(|_| format!("invalid tank id in spec '{spec}'"))?;
    let policy: Policy = policy.parse().map_err(|e| format!("{e}"))?;
    Ok((id, policy))
}

/// Print to stdout or write to a file.
fn emit<T: serde::Serialize>(value: &T, output: Option<&std::path::Path>) {
    let json = match serde_json::to_string_pretty(value) {
        Ok(json) => json,
        Err(e) => fail(&format!("serialization failed: {e}")),
    };
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, json) {
                fail(&format!("cannot write {}: {e}", path.display()));
            }
            info!(path = %path.display(), "Report written");
        }
        None => println!("{json}"),
    }
}

/// Clock-derived default seed for casual runs; pass `--seed` for
/// reproducible ones.
fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::from(d.subsec_nanos()) ^ d.as_secs())
}

/// Log the error and exit non-zero.
fn fail(message: &str) -> ! {
    error!("{message}");
    std::process::exit(1);
}
