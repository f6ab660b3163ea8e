use alloy_heat_core::{
    display_channel, Alloy, GridSnapshot, HeatSource, KernelPolicy, Outcome, Simulation,
    SimulationConfig, SnapshotReceiver, TemperatureTarget,
};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Characters from coldest to hottest
const PALETTE: &[u8] = b" .:-=+*#%@";

/// Hue of the coldest displayed temperature; 0.0 is red hot
const COLD_HUE: f64 = 0.7;

/// Alloy composition presets
#[derive(Debug, Clone, Copy, ValueEnum)]
enum AlloyPreset {
    /// 33% / 30% / 37%
    Standard,
    /// 33% / 33% / 34%
    Balanced,
}

/// Convergence threshold presets
#[derive(Debug, Clone, Copy, ValueEnum)]
enum ThresholdPreset {
    /// 99% of the hottest heat source
    Hottest,
    /// Mean of all heat sources
    Mean,
}

/// Headless alloy heat relaxation demo
#[derive(Parser, Debug)]
#[command(name = "alloy-heat-demo")]
#[command(about = "Parallel Jacobi heat relaxation on a two-source alloy plate", long_about = None)]
struct Args {
    /// JSON configuration file (overrides the grid options below)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Grid width in cells
    #[arg(long, default_value_t = 64)]
    width: usize,

    /// Grid height in cells
    #[arg(long, default_value_t = 36)]
    height: usize,

    /// Temperature of the top-left heat source
    #[arg(long, default_value_t = 1000.0)]
    hot: f64,

    /// Temperature of the bottom-right heat source
    #[arg(long, default_value_t = 400.0)]
    cool: f64,

    /// Alloy composition
    #[arg(short, long, value_enum, default_value_t = AlloyPreset::Standard)]
    alloy: AlloyPreset,

    /// Let cells exceed their hottest neighbor
    #[arg(long)]
    unclamped: bool,

    /// Convergence threshold
    #[arg(short, long, value_enum, default_value_t = ThresholdPreset::Mean)]
    threshold: ThresholdPreset,

    /// Red-hot temperature: caps the ceiling and sets the display scale
    #[arg(long)]
    red_hot: Option<f64>,

    /// Worker threads (default: all hardware threads)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Largest leaf area of the task tree
    #[arg(long)]
    leaf_threshold: Option<usize>,

    /// Give up after this many generations
    #[arg(short, long, default_value_t = 100_000)]
    max_generations: u64,

    /// Print a heat map every N generations (0 = final map only)
    #[arg(short, long, default_value_t = 50)]
    report_interval: u64,

    /// Snapshots buffered between the simulation and the display
    #[arg(long, default_value_t = 4)]
    queue: usize,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_config(args: &Args) -> Result<SimulationConfig, String> {
    if let Some(path) = &args.config {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
        let config = serde_json::from_str(&text)
            .map_err(|e| format!("cannot parse {}: {e}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        return Ok(config);
    }

    let alloy = match args.alloy {
        AlloyPreset::Standard => Alloy::standard(),
        AlloyPreset::Balanced => Alloy::balanced(),
    };
    let kernel = if args.unclamped {
        KernelPolicy::Unclamped
    } else {
        KernelPolicy::Clamped
    };
    let ceiling = match args.red_hot {
        Some(red_hot) => TemperatureTarget::CappedAtHottest(red_hot),
        None => TemperatureTarget::FractionOfHottest(0.99),
    };
    let threshold = match args.threshold {
        ThresholdPreset::Hottest => TemperatureTarget::FractionOfHottest(0.99),
        ThresholdPreset::Mean => TemperatureTarget::MeanOfSources,
    };

    let mut config = SimulationConfig::corner_sources(args.width, args.height)
        .with_heat_sources(vec![
            HeatSource::new(0, 0, args.hot),
            HeatSource::new(
                args.width.saturating_sub(1),
                args.height.saturating_sub(1),
                args.cool,
            ),
        ])
        .with_alloy(alloy)
        .with_kernel(kernel)
        .with_ceiling(ceiling)
        .with_threshold(threshold)
        .with_max_generations(Some(args.max_generations));
    if let Some(threads) = args.threads {
        config = config.with_parallelism(threads);
    }
    if let Some(leaf_threshold) = args.leaf_threshold {
        config = config.with_leaf_threshold(leaf_threshold);
    }
    Ok(config)
}

/// Map a temperature to a hue in `[0, COLD_HUE]`, 0 being red hot.
fn hue(temperature: f64, red_hot: f64) -> f64 {
    (((red_hot - temperature) / red_hot) * COLD_HUE).clamp(0.0, COLD_HUE)
}

fn render(snapshot: &GridSnapshot, red_hot: f64) -> String {
    let mut out = String::with_capacity((snapshot.width + 1) * snapshot.height);
    for y in 0..snapshot.height {
        for x in 0..snapshot.width {
            if snapshot.is_heat_source(x, y) {
                out.push('O');
                continue;
            }
            let t = snapshot.temperature_at(x, y).unwrap_or(0.0);
            let heat = 1.0 - hue(t, red_hot) / COLD_HUE;
            let idx = ((heat * (PALETTE.len() - 1) as f64).round() as usize).min(PALETTE.len() - 1);
            out.push(char::from(PALETTE[idx]));
        }
        out.push('\n');
    }
    out
}

fn print_frame(snapshot: &GridSnapshot, red_hot: f64) {
    println!(
        "Generation {} | min {:.2} | mean {:.2} | max {:.2}",
        snapshot.generation,
        snapshot.min(),
        snapshot.mean(),
        snapshot.max()
    );
    print!("{}", render(snapshot, red_hot));
    println!();
}

/// Drain snapshots until the simulation drops its publisher.
fn consume(receiver: &SnapshotReceiver, red_hot: f64, every: u64) -> (u64, Option<GridSnapshot>) {
    let mut received = 0;
    let mut next_report = every;
    let mut last = None;

    while let Ok(snapshot) = receiver.recv() {
        received += 1;
        if every > 0 && snapshot.generation >= next_report {
            print_frame(&snapshot, red_hot);
            next_report = (snapshot.generation / every + 1) * every;
        }
        last = Some(snapshot);
    }
    (received, last)
}

fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    println!("=== Alloy Heat Relaxation Demo ===\n");

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(message) => {
            error!("{message}");
            return ExitCode::FAILURE;
        }
    };

    let mut sim = match Simulation::new(config) {
        Ok(sim) => sim,
        Err(e) => {
            error!("Cannot start simulation: {e}");
            return ExitCode::FAILURE;
        }
    };

    let red_hot = args.red_hot.unwrap_or_else(|| sim.ceiling());
    println!(
        "{}x{} grid, {} leaves, ceiling {:.1}, threshold {:.1}\n",
        sim.config().width,
        sim.config().height,
        sim.tree().leaf_count(),
        sim.ceiling(),
        sim.threshold()
    );

    let (publisher, receiver) = display_channel(args.queue);
    sim.attach_display(publisher);
    let every = args.report_interval;
    let display = thread::spawn(move || consume(&receiver, red_hot, every));

    let outcome = sim.run();
    // Closing the channel lets the display thread finish
    drop(sim.detach_display());

    let (received, last) = match display.join() {
        Ok(result) => result,
        Err(_) => {
            error!("Display thread panicked");
            return ExitCode::FAILURE;
        }
    };
    if let Some(last) = &last {
        print_frame(last, red_hot);
    }

    let timer = sim.timer();
    println!("=== Simulation Complete ===");
    println!("Snapshots displayed: {received} of {}", outcome.generations());
    println!(
        "Generation time: {:.3} ms mean, {:.1} ms total",
        timer.mean_ms(),
        timer.total_ms()
    );

    match outcome {
        Outcome::Converged {
            generations,
            local_min,
        } => {
            println!("Converged after {generations} generations (min {local_min:.3})");
            ExitCode::SUCCESS
        }
        Outcome::DidNotConverge {
            generations,
            local_min,
        } => {
            println!("Did not converge within {generations} generations (min {local_min:.3})");
            ExitCode::from(2)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hue_mapping() {
        assert_eq!(hue(1000.0, 1000.0), 0.0);
        assert_eq!(hue(2000.0, 1000.0), 0.0);
        assert!((hue(0.0, 1000.0) - COLD_HUE).abs() < 1e-12);
        assert!((hue(500.0, 1000.0) - 0.35).abs() < 1e-12);
    }

    #[test]
    fn test_red_hot_below_hottest_threshold_is_rejected() {
        let args = Args::try_parse_from(["demo", "--red-hot", "500", "--threshold", "hottest"])
            .unwrap();
        let config = build_config(&args).unwrap();
        assert!(matches!(
            Simulation::new(config),
            Err(alloy_heat_core::SimulationError::Config(
                alloy_heat_core::ConfigError::ThresholdAboveCeiling { .. }
            ))
        ));

        let args = Args::try_parse_from(["demo", "--red-hot", "800", "--threshold", "mean"])
            .unwrap();
        let config = build_config(&args).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_render_marks_sources() {
        let snapshot = GridSnapshot {
            generation: 1,
            width: 3,
            height: 2,
            temperatures: vec![1000.0, 0.0, 1000.0, 0.0, 0.0, 400.0],
            heat_sources: vec![true, false, false, false, false, true],
        };
        assert_eq!(render(&snapshot, 1000.0), "O @\n  O\n");
    }
}
