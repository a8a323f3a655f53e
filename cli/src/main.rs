//! `locsim` CLI: windowed-accuracy sweeps and trajectory dumps.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use floor_model::{LandmarkPosition, WalkingGraph};
use inference_core::{Metric, MetricSummary, ObjectId, Particle, SimConfig, WindowStatistics};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim::scenarios::{Scenario, ScenarioKind};
use sim::Simulation;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "locsim", about = "Indoor location-inference simulator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum MetricArg {
    Recall,
    Precision,
    F1,
}

impl From<MetricArg> for Metric {
    fn from(m: MetricArg) -> Self {
        match m {
            MetricArg::Recall => Metric::Recall,
            MetricArg::Precision => Metric::Precision,
            MetricArg::F1 => Metric::F1,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate a floor plan and report accuracy per window size.
    RunScenario {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        /// Random seed for reproducibility
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// JSON file with simulation settings (missing fields use the scenario defaults)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the number of objects
        #[arg(long)]
        objects: Option<usize>,
        /// Override the number of provisional particles per prediction
        #[arg(long)]
        particles: Option<usize>,
        /// Only print this metric
        #[arg(long, value_enum)]
        metric: Option<MetricArg>,
        /// Output statistics to a JSON file
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Walk one object and print its transition history.
    Trajectory {
        #[arg(value_enum)]
        scenario: ScenarioKind,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Number of unit steps to walk
        #[arg(long, default_value_t = 100)]
        steps: usize,
        /// Also print the reconstructed position at every whole time unit
        #[arg(long)]
        positions: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::RunScenario {
            scenario,
            seed,
            config,
            objects,
            particles,
            metric,
            output,
        } => {
            run_scenario(
                scenario,
                seed,
                config.as_deref(),
                objects,
                particles,
                metric.map(Metric::from),
                output.as_deref(),
            )?;
        }
        Commands::Trajectory {
            scenario,
            seed,
            steps,
            positions,
        } => {
            run_trajectory(scenario, seed, steps, positions)?;
        }
    }

    Ok(())
}

fn load_config(path: &Path, defaults: &SimConfig) -> Result<SimConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let mut value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    // Overlay the file onto the scenario defaults.
    let mut merged = serde_json::to_value(defaults)?;
    if let (Some(base), Some(overlay)) = (merged.as_object_mut(), value.as_object_mut()) {
        for (k, v) in std::mem::take(overlay) {
            base.insert(k, v);
        }
    }
    Ok(serde_json::from_value(merged)?)
}

fn run_scenario(
    kind: ScenarioKind,
    seed: u64,
    config_path: Option<&Path>,
    objects: Option<usize>,
    particles: Option<usize>,
    metric: Option<Metric>,
    output_path: Option<&Path>,
) -> Result<()> {
    let scenario = Scenario::build(kind)?;
    let mut config = match config_path {
        Some(path) => load_config(path, &scenario.config)?,
        None => scenario.config.clone(),
    };
    if let Some(n) = objects {
        config.num_objects = n;
    }
    if let Some(n) = particles {
        config.num_particles = n;
    }

    println!(
        "Running scenario '{}' (seed={}, objects={}, particles={}, duration={:.0})...",
        scenario.name, seed, config.num_objects, config.num_particles, config.duration
    );

    info!(scenario = %scenario.name, seed, "run started");
    let start = std::time::Instant::now();
    let mut sim = Simulation::new(scenario.plan, config.clone(), seed)?;
    let stats = sim.execute();
    let elapsed = start.elapsed();

    info!(elapsed_s = elapsed.as_secs_f64(), "run finished");
    println!("Done: elapsed={:.2}s", elapsed.as_secs_f64());
    let metrics: Vec<Metric> = match metric {
        Some(m) => vec![m],
        None => Metric::ALL.to_vec(),
    };
    print_table(&stats, &metrics);

    if let Some(opath) = output_path {
        let mut table = serde_json::Map::new();
        for m in &metrics {
            table.insert(m.name().to_string(), serde_json::to_value(stats.measure(*m))?);
        }
        let json = serde_json::json!({
            "scenario": scenario.name,
            "seed": seed,
            "elapsed_s": elapsed.as_secs_f64(),
            "config": config,
            "statistics": table,
        });
        std::fs::write(opath, serde_json::to_string_pretty(&json)?)?;
        info!(path = %opath.display(), "report written");
        println!("Statistics saved to {}", opath.display());
    }

    Ok(())
}

fn print_table(stats: &WindowStatistics, metrics: &[Metric]) {
    let columns: Vec<Vec<MetricSummary>> = metrics.iter().map(|m| stats.measure(*m)).collect();

    print!("{:>10} {:>8}", "window", "trials");
    for m in metrics {
        print!(" {:>19}", m.name());
    }
    println!();

    for (w, size) in stats.window_sizes().iter().enumerate() {
        print!("{:>10.4} {:>8}", size, stats.samples(w));
        for col in &columns {
            print!("   {:>7.4} ± {:>6.4}", col[w].mean, col[w].std_dev);
        }
        println!();
    }
}

fn run_trajectory(kind: ScenarioKind, seed: u64, steps: usize, positions: bool) -> Result<()> {
    let scenario = Scenario::build(kind)?;
    let plan = &scenario.plan;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    info!(scenario = %scenario.name, seed, steps, "walking one object");
    let mut walker = Particle::new(plan, ObjectId(0), None, &mut rng);
    let start: LandmarkPosition = walker.position();
    for _ in 0..steps {
        walker.advance(plan, None, &mut rng);
    }

    println!(
        "Walker velocity={:.2} start={} end={} events={}",
        walker.velocity(),
        start,
        walker.position(),
        walker.history().len()
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    walker.write_history(&mut out)?;

    if positions {
        for t in 0..=steps {
            let pos = walker.position_at(plan, t as f64);
            let p = plan.position_coordinate(&pos);
            writeln!(out, "t={t} {pos} ({:.1}, {:.1})", p.x, p.y)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_overlays_scenario_defaults() {
        let path = std::env::temp_dir().join(format!("locsim-config-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "num_objects": 7, "window_sizes": [0.3] }"#).unwrap();

        let defaults = Scenario::build(ScenarioKind::Corridor).unwrap().config;
        let cfg = load_config(&path, &defaults).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(cfg.num_objects, 7);
        assert_eq!(cfg.window_sizes, vec![0.3]);
        assert_eq!(cfg.radius, defaults.radius);
        assert_eq!(cfg.duration, defaults.duration);
    }
}
