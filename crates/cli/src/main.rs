use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use rayon::prelude::*;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use skyrace_shared::*;
use skyrace_sim::analyzer::{analyze, LapMetrics};
use skyrace_sim::{
    default_course, resolve_policy, run_episode, CheckpointCourse, CourseFile, POLICY_NAMES,
};

#[derive(Parser)]
#[command(name = "skyrace", about = "Checkpoint race simulator CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fly one episode and print the result
    Run {
        /// Pilot policy (do_nothing, pursuit, random)
        #[arg(long, default_value = "pursuit")]
        pilot: String,

        /// Random seed for spawn placement and stochastic pilots
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Training rules: rewards, deadline and course-complete end
        #[arg(long)]
        training: bool,

        /// Spawn behind a random checkpoint
        #[arg(long)]
        randomize: bool,

        /// Course JSON file; the built-in circuit if omitted
        #[arg(long)]
        course: Option<PathBuf>,

        /// Number of agents sharing the start line
        #[arg(long, default_value_t = 1)]
        agents: usize,

        /// Tick cap for the episode
        #[arg(long, default_value_t = EVAL_MAX_TICKS)]
        max_ticks: u32,

        /// Output path for replay JSON (agent 0)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the checkpoints of a course
    Course {
        /// Course JSON file; the built-in circuit if omitted
        #[arg(long)]
        course: Option<PathBuf>,
    },

    /// Fly many seeds in parallel and summarize
    Batch {
        /// Comma-separated list of pilots
        #[arg(long, default_value = "pursuit")]
        pilots: String,

        /// Seeds per pilot
        #[arg(long, default_value_t = 8)]
        seeds: u64,

        /// Agents per episode start line
        #[arg(long, default_value_t = 1)]
        agents: usize,

        #[arg(long)]
        training: bool,

        #[arg(long)]
        course: Option<PathBuf>,

        #[arg(long, default_value_t = EVAL_MAX_TICKS)]
        max_ticks: u32,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("skyrace_sim=info,skyrace_cli=info,warn"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install log subscriber: {e}");
    }
}

fn load_course(path: Option<&Path>) -> Result<CheckpointCourse, Box<dyn Error>> {
    let course = match path {
        Some(path) => {
            info!(path = %path.display(), "loading course");
            CourseFile::load(path)?.into_course()?
        }
        None => default_course()?,
    };
    Ok(course)
}

fn flight_config(training: bool, randomize: bool) -> FlightConfig {
    let base = if training {
        FlightConfig::training()
    } else {
        FlightConfig::evaluation()
    };
    FlightConfig {
        randomize_spawn: randomize,
        ..base
    }
}

fn check_pilot(name: &str) -> Result<(), Box<dyn Error>> {
    if POLICY_NAMES.contains(&name) {
        Ok(())
    } else {
        Err(format!(
            "Unknown pilot '{}'. Valid options: {}.",
            name,
            POLICY_NAMES.join(", ")
        )
        .into())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            pilot,
            seed,
            training,
            randomize,
            course,
            agents,
            max_ticks,
            output,
        } => {
            let config = EpisodeConfig {
                seed,
                pilot,
                agent_count: agents.max(1),
                max_ticks,
                flight: flight_config(training, randomize),
                ..Default::default()
            };
            cmd_run(&config, course.as_deref(), output)
        }

        Commands::Course { course } => cmd_course(course.as_deref()),

        Commands::Batch {
            pilots,
            seeds,
            agents,
            training,
            course,
            max_ticks,
        } => cmd_batch(&pilots, seeds, agents.max(1), training, course.as_deref(), max_ticks),
    }
}

fn fly_start_line(course: &CheckpointCourse, config: &EpisodeConfig) -> Vec<EpisodeRecord> {
    (0..config.agent_count)
        .into_par_iter()
        .filter_map(|agent_index| {
            let config = EpisodeConfig {
                agent_index,
                ..config.clone()
            };
            let seed = config.seed.wrapping_add(agent_index as u64);
            let mut policy = resolve_policy(&config.pilot, seed)?;
            Some(run_episode(course, &config, policy.as_mut()))
        })
        .collect()
}

fn cmd_run(
    config: &EpisodeConfig,
    course_path: Option<&Path>,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    check_pilot(&config.pilot)?;
    let course = load_course(course_path)?;

    println!(
        "Running episode: {} x{} (seed={}, {})",
        config.pilot,
        config.agent_count,
        config.seed,
        if config.flight.training_mode { "training" } else { "evaluation" }
    );

    let records = fly_start_line(&course, config);

    for (agent, record) in records.iter().enumerate() {
        let result = &record.result;
        let metrics = analyze(record);

        println!();
        println!("=== Agent {} ===", agent);
        println!("End:         {:?}", result.end);
        println!(
            "Final tick:  {} ({:.1}s)",
            result.final_tick,
            result.final_tick as f32 * DT
        );
        println!("Checkpoints: {} ({} laps)", result.checkpoints_reached, result.laps);
        if config.flight.training_mode {
            println!("Reward:      {:.3}", result.cumulative_reward);
        }
        print_metrics(&metrics);
    }

    if let Some(path) = output {
        match records.first() {
            Some(record) => {
                std::fs::write(&path, serde_json::to_string_pretty(record)?)?;
                println!("\nReplay written to {}", path.display());
            }
            None => warn!("no episode to write"),
        }
    }
    Ok(())
}

fn print_metrics(m: &LapMetrics) {
    println!("--- Flight ---");
    println!("  Distance:   {:.1}", m.distance_flown);
    println!("  Speed:      mean {:.1}, peak {:.1}", m.mean_speed, m.peak_speed);
    println!("  Peak bank:  {:.1} deg, peak pitch {:.1} deg", m.peak_bank, m.peak_pitch);
    if !m.split_times.is_empty() {
        let splits: Vec<String> = m.split_times.iter().map(|t| format!("{t:.2}")).collect();
        println!("  Splits (s): {}", splits.join(" "));
    }
    if let Some(t) = m.completion_time {
        println!("  Completed:  {t:.2}s");
    }
}

fn cmd_course(course_path: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let course = load_course(course_path)?;

    println!("{:<6} {:<7} {:>9} {:>9} {:>9} {:>8}", "Index", "Kind", "X", "Y", "Z", "Heading");
    println!("{:-<6} {:-<7} {:-<9} {:-<9} {:-<9} {:-<8}", "", "", "", "", "", "");
    for (i, checkpoint) in course.checkpoints().iter().enumerate() {
        let forward = checkpoint.forward();
        let heading = forward.x.atan2(forward.z).to_degrees();
        let p = checkpoint.position;
        println!(
            "{:<6} {:<7} {:>9.1} {:>9.1} {:>9.1} {:>8.1}",
            i,
            format!("{:?}", checkpoint.kind),
            p.x,
            p.y,
            p.z,
            heading
        );
    }
    Ok(())
}

struct BatchRow {
    pilot: String,
    episodes: usize,
    completed: usize,
    collided: usize,
    timed_out: usize,
    mean_checkpoints: f32,
    mean_reward: f32,
    best_lap: Option<f32>,
}

fn cmd_batch(
    pilots_str: &str,
    seeds: u64,
    agents: usize,
    training: bool,
    course_path: Option<&Path>,
    max_ticks: u32,
) -> Result<(), Box<dyn Error>> {
    let pilots: Vec<&str> = pilots_str.split(',').map(|s| s.trim()).collect();
    for pilot in &pilots {
        check_pilot(pilot)?;
    }
    let course = load_course(course_path)?;

    println!(
        "Batch: {} pilots, {} seeds x {} agents, {}",
        pilots.len(),
        seeds,
        agents,
        if training { "training" } else { "evaluation" }
    );

    let mut rows = Vec::with_capacity(pilots.len());
    for pilot in pilots {
        let jobs: Vec<EpisodeConfig> = (0..seeds)
            .flat_map(|seed| {
                (0..agents).map(move |agent_index| EpisodeConfig {
                    seed,
                    pilot: pilot.to_string(),
                    agent_index,
                    agent_count: agents,
                    max_ticks,
                    flight: flight_config(training, training),
                    ..Default::default()
                })
            })
            .collect();

        let records: Vec<EpisodeRecord> = jobs
            .par_iter()
            .filter_map(|job| {
                let mut policy = resolve_policy(&job.pilot, job.seed)?;
                Some(run_episode(&course, job, policy.as_mut()))
            })
            .collect();

        rows.push(summarize(pilot, &course, &records));
    }

    println!();
    println!(
        "{:<12} {:>5} {:>6} {:>6} {:>6} {:>8} {:>8} {:>9}",
        "Pilot", "Runs", "Done", "Crash", "Late", "Ckpts", "Reward", "Best lap"
    );
    println!(
        "{:-<12} {:->5} {:->6} {:->6} {:->6} {:->8} {:->8} {:->9}",
        "", "", "", "", "", "", "", ""
    );
    for row in rows {
        let best = row
            .best_lap
            .map(|t| format!("{t:.2}s"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<12} {:>5} {:>6} {:>6} {:>6} {:>8.1} {:>8.3} {:>9}",
            row.pilot,
            row.episodes,
            row.completed,
            row.collided,
            row.timed_out,
            row.mean_checkpoints,
            row.mean_reward,
            best
        );
    }
    Ok(())
}

fn summarize(pilot: &str, course: &CheckpointCourse, records: &[EpisodeRecord]) -> BatchRow {
    let count = |end: EpisodeEnd| {
        records
            .iter()
            .filter(|r| r.result.end == Some(end))
            .count()
    };
    let n = records.len().max(1) as f32;

    // First pass over the finish, in either mode.
    let finish = course.len() - 1;
    let best_lap = records
        .iter()
        .filter_map(|r| r.result.splits.iter().find(|s| s.0 == finish))
        .map(|s| s.1 as f32 * DT)
        .reduce(f32::min);

    BatchRow {
        pilot: pilot.to_string(),
        episodes: records.len(),
        completed: count(EpisodeEnd::CourseComplete),
        collided: count(EpisodeEnd::Collided),
        timed_out: count(EpisodeEnd::TimedOut),
        mean_checkpoints: records
            .iter()
            .map(|r| r.result.checkpoints_reached as f32)
            .sum::<f32>()
            / n,
        mean_reward: records.iter().map(|r| r.result.cumulative_reward).sum::<f32>() / n,
        best_lap,
    }
}
