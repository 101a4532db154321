// Holds the timing sweep: how long the search takes to find its first hit
// as the target is scaled down, and a straight line fitted through the samples
use crate::error::Error;
use crate::logic::{Decomposer, DEFAULT_MAX_MAGNITUDE};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// `sqrt(1000) - sqrt(999)`, decomposed as (1000, -999) under the default cap
pub fn base_unit() -> f64 {
    1000f64.sqrt() - 999f64.sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimingSweep {
    pub runs: usize,
    pub steps: usize,
    pub multipliers: usize,
    pub max_magnitude: f64,
    pub base: f64,
}

impl Default for TimingSweep {
    fn default() -> Self {
        TimingSweep {
            runs: 5,
            steps: 99,
            multipliers: 99,
            max_magnitude: DEFAULT_MAX_MAGNITUDE,
            base: base_unit(),
        }
    }
}

/// Least squares line `y = slope * x + intercept` and Pearson's r
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
    pub correlation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingReport {
    /// Seconds per step, one row per run
    pub data: Vec<Vec<f64>>,
    pub analyze: Vec<LineFit>,
}

impl TimingReport {
    pub fn write_json(&self, path: &Path) -> Result<(), Error> {
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }
}

pub fn fit_line(xs: &[f64], ys: &[f64]) -> Result<LineFit, Error> {
    if xs.len() != ys.len() {
        return Err(Error::MismatchedSamples(xs.len(), ys.len()));
    }
    let n = xs.len();
    if n < 2 {
        return Err(Error::TooFewSamples(n));
    }
    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;
    let (mut sxy, mut sxx, mut syy) = (0., 0., 0.);
    for (x, y) in xs.iter().zip(ys) {
        let (dx, dy) = (x - mean_x, y - mean_y);
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0. || syy == 0. {
        return Err(Error::ConstantSamples);
    }
    let slope = sxy / sxx;
    Ok(LineFit {
        slope,
        intercept: mean_y - slope * mean_x,
        correlation: sxy / (sxx * syy).sqrt(),
    })
}

/// Scales `unit` by 1, 2, .. until the search finds something, returning
/// the multiplier that worked
pub fn first_hit(decomposer: &Decomposer, unit: f64, multipliers: usize) -> Result<Option<usize>, Error> {
    for i in 1..=multipliers {
        if decomposer.search(unit * i as f64)?.decomposition().is_some() {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

pub fn sweep(config: &TimingSweep) -> Result<TimingReport, Error> {
    let decomposer = Decomposer::new(config.max_magnitude)?;
    let xs: Vec<f64> = (1..=config.steps).map(|k| k as f64).collect();
    let mut data = Vec::with_capacity(config.runs);
    let mut analyze = Vec::with_capacity(config.runs);
    for run in 0..config.runs {
        let mut samples = Vec::with_capacity(config.steps);
        for k in 1..=config.steps {
            let unit = config.base / k as f64;
            let now = Instant::now();
            let hit = first_hit(&decomposer, unit, config.multipliers)?;
            samples.push(now.elapsed().as_secs_f64());
            debug!(run, step = k, ?hit, "timed step");
        }
        let fit = fit_line(&xs, &samples)?;
        info!(run, slope = fit.slope, intercept = fit.intercept, correlation = fit.correlation, "run finished");
        data.push(samples);
        analyze.push(fit);
    }
    Ok(TimingReport { data, analyze })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_an_exact_line() {
        let xs = [1., 2., 3., 4.];
        let ys = [3., 5., 7., 9.];
        let fit = fit_line(&xs, &ys).unwrap();
        assert!((fit.slope - 2.).abs() < 1e-12);
        assert!((fit.intercept - 1.).abs() < 1e-12);
        assert!((fit.correlation - 1.).abs() < 1e-12);

        let falling = fit_line(&xs, &[4., 3., 2., 1.]).unwrap();
        assert!((falling.correlation + 1.).abs() < 1e-12);
    }

    #[test]
    fn fit_needs_spread() {
        assert!(matches!(fit_line(&[1.], &[1.]), Err(Error::TooFewSamples(1))));
        assert!(matches!(fit_line(&[1., 2., 3.], &[5., 5., 5.]), Err(Error::ConstantSamples)));
        assert!(matches!(fit_line(&[2., 2.], &[1., 3.]), Err(Error::ConstantSamples)));
    }

    #[test]
    fn fit_rejects_unequal_lengths() {
        let xs = [1., 2., 3., 4.];
        assert!(matches!(fit_line(&xs, &[3., 5., 7.]), Err(Error::MismatchedSamples(4, 3))));
        assert!(matches!(fit_line(&xs[..2], &[3., 5., 7.]), Err(Error::MismatchedSamples(2, 3))));
    }

    #[test]
    fn base_unit_is_found_at_once() {
        let decomposer = Decomposer::default();
        assert_eq!(first_hit(&decomposer, base_unit(), 99).unwrap(), Some(1));
    }

    #[test]
    fn first_hit_gives_up() {
        let decomposer = Decomposer::new(1.).unwrap();
        assert_eq!(first_hit(&decomposer, 7.5, 3).unwrap(), None);
    }

    #[test]
    fn small_sweep_has_one_row_per_run() {
        let config = TimingSweep {
            runs: 2,
            steps: 4,
            multipliers: 5,
            ..TimingSweep::default()
        };
        let report = sweep(&config).unwrap();
        assert_eq!(report.data.len(), 2);
        assert!(report.data.iter().all(|row| row.len() == 4));
        assert_eq!(report.analyze.len(), 2);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timing.json");
        report.write_json(&path).unwrap();
        let back: TimingReport = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(back.data.len(), 2);
    }
}
