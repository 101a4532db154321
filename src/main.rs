use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use num2sqrts::logging::init_tracing;
use num2sqrts::logic::DEFAULT_MAX_MAGNITUDE;
use num2sqrts::rendering::{self, GridSweep, DEFAULT_RADIUS};
use num2sqrts::timing::{self, TimingSweep};
use num2sqrts::{Decomposer, Outcome};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Split a number into two signed square roots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Iteration counts over a square grid of integer pairs
    Grid {
        #[arg(short, long, default_value_t = DEFAULT_RADIUS)]
        radius: i64,

        #[arg(short, long, default_value_t = DEFAULT_MAX_MAGNITUDE)]
        max_magnitude: f64,

        #[arg(short, long)]
        workers: Option<usize>,

        #[arg(short, long, default_value = "grid.json")]
        output: PathBuf,

        /// BMP heatmap, needs the `heatmap` feature
        #[arg(long)]
        heatmap: Option<PathBuf>,
    },
    /// Time the search on scaled targets and fit a line per run
    Timing {
        #[arg(short, long, default_value_t = 5)]
        runs: usize,

        #[arg(short, long, default_value_t = 99)]
        steps: usize,

        #[arg(short = 'k', long, default_value_t = 99)]
        multipliers: usize,

        #[arg(short, long, default_value_t = DEFAULT_MAX_MAGNITUDE)]
        max_magnitude: f64,

        #[arg(short, long, default_value = "timing.json")]
        output: PathBuf,
    },
    /// Decompose a single number
    Solve {
        #[arg(allow_hyphen_values = true)]
        n: f64,

        #[arg(short, long, default_value_t = DEFAULT_MAX_MAGNITUDE)]
        max_magnitude: f64,

        /// Print the iteration count instead of the pair
        #[arg(short, long)]
        count: bool,
    },
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Grid {
            radius,
            max_magnitude,
            workers,
            output,
            heatmap,
        } => {
            let mut config = GridSweep {
                radius,
                max_magnitude,
                ..GridSweep::default()
            };
            if let Some(workers) = workers {
                config.workers = workers;
            }
            let grid = rendering::sweep(&config)?;
            grid.write_json(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            info!(path = %output.display(), "grid written");
            if let Some(path) = heatmap {
                save_heatmap(&grid, &path)?;
            }
        }
        Command::Timing {
            runs,
            steps,
            multipliers,
            max_magnitude,
            output,
        } => {
            let config = TimingSweep {
                runs,
                steps,
                multipliers,
                max_magnitude,
                ..TimingSweep::default()
            };
            let report = timing::sweep(&config)?;
            report
                .write_json(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            info!(path = %output.display(), "timings written");
        }
        Command::Solve {
            n,
            max_magnitude,
            count,
        } => {
            if !n.is_finite() {
                bail!("{} is not a finite number", n);
            }
            let decomposer = Decomposer::new(max_magnitude)?;
            match decomposer.decompose(n, count)? {
                Outcome::Decomposed(d) => {
                    let residual = d.residual(n).unwrap_or(f64::NAN);
                    println!("{} = {}  ({}, {})  residual {:e}", n, d, d.a2, d.b2, residual);
                }
                Outcome::Iterations(i) => println!("{}", i),
                Outcome::Exhausted => println!("none"),
            }
        }
    }
    Ok(())
}

#[cfg(feature = "heatmap")]
fn save_heatmap(grid: &rendering::IterationGrid, path: &std::path::Path) -> anyhow::Result<()> {
    grid.save_heatmap(path)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), "heatmap written");
    Ok(())
}

#[cfg(not(feature = "heatmap"))]
fn save_heatmap(_: &rendering::IterationGrid, path: &std::path::Path) -> anyhow::Result<()> {
    bail!(
        "cannot write {}: built without the `heatmap` feature",
        path.display()
    )
}
