// Holds the search itself: walks candidate square roots outward from the
// half-sum until two integer squares add up to the target or the cap is hit
use crate::error::Error;
use crate::numbers::{precise, signed_sqrt, Tolerance};
use std::fmt;
use tracing::{debug, warn};

pub const DEFAULT_MAX_MAGNITUDE: f64 = 1000.;
/// Hard stop for inputs whose candidates stop moving in f64, e.g. a cap above 2^53
pub const DEFAULT_MAX_ITERATIONS: u64 = 10_000_000;

/// Two integer squares whose signed square roots add up to the target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Decomposition {
    pub a2: i64,
    pub b2: i64,
}

impl Decomposition {
    pub fn sum(&self) -> f64 {
        signed_sqrt(self.a2 as f64) + signed_sqrt(self.b2 as f64)
    }

    /// The pair that decomposes `-n` when this one decomposes `n`
    pub fn mirrored(&self) -> Self {
        Decomposition {
            a2: -self.a2,
            b2: -self.b2,
        }
    }

    pub fn residual(&self, target: f64) -> Option<f64> {
        precise::residual(self.a2, self.b2, target)
    }
}

impl fmt::Display for Decomposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ssqrt({}) + ssqrt({})", self.a2, self.b2)
    }
}

/// Why a search left the SEARCHING state
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stop {
    Matched(Decomposition),
    Exhausted,
    CeilingReached,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchReport {
    pub iterations: u64,
    pub stop: Stop,
}

impl SearchReport {
    pub fn decomposition(&self) -> Option<Decomposition> {
        match self.stop {
            Stop::Matched(d) => Some(d),
            Stop::Exhausted | Stop::CeilingReached => None,
        }
    }

    pub fn into_outcome(self, report_iterations: bool) -> Outcome {
        if report_iterations {
            return Outcome::Iterations(self.iterations);
        }
        match self.decomposition() {
            Some(d) => Outcome::Decomposed(d),
            None => Outcome::Exhausted,
        }
    }
}

/// What a caller gets back from `decompose`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Decomposed(Decomposition),
    Iterations(u64),
    Exhausted,
}

impl Outcome {
    pub fn decomposition(&self) -> Option<Decomposition> {
        match self {
            Outcome::Decomposed(d) => Some(*d),
            _ => None,
        }
    }

    pub fn iterations(&self) -> Option<u64> {
        match self {
            Outcome::Iterations(i) => Some(*i),
            _ => None,
        }
    }
}

// Working state of one search, dropped when it returns
struct SearchState {
    mid: f64,
    actual_mid: f64,
    t: f64,
    iterations: u64,
}

impl SearchState {
    fn init(n: f64) -> Self {
        let actual_mid = n / 2.;
        let half_squared = actual_mid * actual_mid;
        // Sit halfway between two integers so mid + t walks integer values
        let mid = if n >= 0. {
            half_squared.floor() + 0.5
        } else {
            (-half_squared).ceil() - 0.5
        };
        SearchState {
            mid,
            actual_mid,
            t: 0.5,
            iterations: 1,
        }
    }

    /// The two candidate roots for the current offset. `b` is snapped so
    /// that its square is an integer with the sign of the raw complement.
    fn candidates(&self) -> (f64, f64) {
        let a = signed_sqrt(self.mid + self.t);
        let d = (a - self.actual_mid).abs();
        let b_raw = self.actual_mid - d;
        let b = signed_sqrt((b_raw * b_raw).round_ties_even().copysign(b_raw));
        (a, b)
    }

    fn advance(&mut self) {
        self.iterations += 1;
        self.t += 1.;
    }
}

fn square_to_int(root: f64) -> i64 {
    (root * root).copysign(root).round_ties_even() as i64
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decomposer {
    max_magnitude: f64,
    tolerance: Tolerance,
    max_iterations: u64,
}

impl Default for Decomposer {
    fn default() -> Self {
        Decomposer {
            max_magnitude: DEFAULT_MAX_MAGNITUDE,
            tolerance: Tolerance::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl Decomposer {
    pub fn new(max_magnitude: f64) -> Result<Self, Error> {
        Decomposer::default().with_max_magnitude(max_magnitude)
    }

    pub fn with_max_magnitude(mut self, max_magnitude: f64) -> Result<Self, Error> {
        if !(max_magnitude.is_finite() && max_magnitude > 0.) {
            return Err(Error::InvalidMagnitude(max_magnitude));
        }
        self.max_magnitude = max_magnitude;
        Ok(self)
    }

    pub fn with_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u64) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn max_magnitude(&self) -> f64 {
        self.max_magnitude
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    pub fn max_iterations(&self) -> u64 {
        self.max_iterations
    }

    /// Runs the search for `n` until it matches, runs past the magnitude cap,
    /// or hits the iteration ceiling.
    pub fn search(&self, n: f64) -> Result<SearchReport, Error> {
        if !n.is_finite() {
            return Err(Error::NonFiniteTarget(n));
        }
        let mut state = SearchState::init(n);
        loop {
            let (a, b) = state.candidates();
            if (a * a).abs() > self.max_magnitude || (b * b).abs() > self.max_magnitude {
                debug!(n, iterations = state.iterations, "search exhausted");
                return Ok(SearchReport {
                    iterations: state.iterations,
                    stop: Stop::Exhausted,
                });
            }
            if self.tolerance.is_close(a + b, n) {
                let found = Decomposition {
                    a2: square_to_int(a),
                    b2: square_to_int(b),
                };
                debug!(n, iterations = state.iterations, %found, "search matched");
                return Ok(SearchReport {
                    iterations: state.iterations,
                    stop: Stop::Matched(found),
                });
            }
            if state.iterations >= self.max_iterations {
                warn!(n, iterations = state.iterations, "search hit the iteration ceiling");
                return Ok(SearchReport {
                    iterations: state.iterations,
                    stop: Stop::CeilingReached,
                });
            }
            state.advance();
        }
    }

    pub fn decompose(&self, n: f64, report_iterations: bool) -> Result<Outcome, Error> {
        Ok(self.search(n)?.into_outcome(report_iterations))
    }
}

/// One-shot search with the default tolerance and iteration ceiling
pub fn decompose(n: f64, max_magnitude: f64, report_iterations: bool) -> Result<Outcome, Error> {
    Decomposer::new(max_magnitude)?.decompose(n, report_iterations)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(a2: i64, b2: i64) -> Outcome {
        Outcome::Decomposed(Decomposition { a2, b2 })
    }

    #[test]
    fn initial_midpoint_per_sign() {
        let s = SearchState::init(5.);
        assert_eq!(s.mid, 6.5);
        assert_eq!(s.actual_mid, 2.5);
        let s = SearchState::init(-5.);
        assert_eq!(s.mid, -6.5);
        let s = SearchState::init(0.);
        assert_eq!(s.mid, 0.5);
        assert_eq!((s.t, s.iterations), (0.5, 1));
    }

    #[test]
    fn zero_decomposes_into_one_and_minus_one() {
        assert_eq!(decompose(0., 1000., false).unwrap(), pair(1, -1));
        assert_eq!(decompose(0., 1000., true).unwrap(), Outcome::Iterations(1));
        // Even a cap of 1 admits it
        assert_eq!(decompose(0., 1., false).unwrap(), pair(1, -1));
    }

    #[test]
    fn known_decompositions() {
        let cases = [
            (2., 3., pair(3, 2), 1),
            (5., 7., pair(7, 5), 2),
            (2., -3., pair(2, -3), 3),
            (-2., -3., pair(-2, -3), 1),
            (4., 9., pair(9, 4), 3),
            (50., 2., pair(32, 8), 14),
        ];
        for &(p, q, expected, loops) in &cases {
            let n = signed_sqrt(p) + signed_sqrt(q);
            assert_eq!(decompose(n, 1000., false).unwrap(), expected, "n = {}", n);
            assert_eq!(decompose(n, 1000., true).unwrap(), Outcome::Iterations(loops));
        }
    }

    #[test]
    fn squares_are_plain_products() {
        // (n / 2)^2 comes out as 951.9999999999999 as a product, so the walk
        // starts at 952 and lands on the equal pair straight away
        let n = 2. * signed_sqrt(952.);
        assert_eq!(decompose(n, 1000., false).unwrap(), pair(952, 952));
        assert_eq!(decompose(n, 1000., true).unwrap(), Outcome::Iterations(1));
        let n = 2. * signed_sqrt(3.);
        assert_eq!(decompose(n, 1000., false).unwrap(), pair(3, 3));
        assert_eq!(decompose(-n, 1000., false).unwrap(), pair(0, -12));
    }

    #[test]
    fn whole_numbers() {
        assert_eq!(decompose(1., 1000., false).unwrap(), pair(1, 0));
        assert_eq!(decompose(-1., 1000., false).unwrap(), pair(0, -1));
        assert_eq!(decompose(2., 1000., false).unwrap(), pair(4, 0));
        assert_eq!(decompose(-2., 1000., false).unwrap(), pair(-1, -1));
    }

    #[test]
    fn benchmark_scenario() {
        let n = 1000f64.sqrt() - 999f64.sqrt();
        assert_eq!(decompose(n, 1000., false).unwrap(), pair(1000, -999));
        assert_eq!(decompose(n, 1000., true).unwrap(), Outcome::Iterations(1000));
        assert_eq!(decompose(-n, 1000., false).unwrap(), pair(999, -1000));
    }

    #[test]
    fn exhaustion() {
        let n = signed_sqrt(2.) + signed_sqrt(3.);
        assert_eq!(decompose(n, 1., false).unwrap(), Outcome::Exhausted);
        assert_eq!(decompose(n, 1., true).unwrap(), Outcome::Iterations(1));
        assert_eq!(decompose(100., 1., false).unwrap(), Outcome::Exhausted);
        assert_eq!(decompose(7.5, 1000., false).unwrap(), Outcome::Exhausted);
        assert_eq!(decompose(7.5, 1000., true).unwrap(), Outcome::Iterations(987));
        assert_eq!(decompose(-7.5, 1000., true).unwrap(), Outcome::Iterations(598));
    }

    #[test]
    fn ceiling_stops_early() {
        let decomposer = Decomposer::default().with_max_iterations(10);
        let report = decomposer.search(7.5).unwrap();
        assert_eq!(report.iterations, 10);
        assert_eq!(report.stop, Stop::CeilingReached);
        assert_eq!(report.into_outcome(false), Outcome::Exhausted);
        assert_eq!(report.into_outcome(true), Outcome::Iterations(10));
    }

    #[test]
    fn rejects_bad_inputs() {
        assert!(matches!(decompose(f64::NAN, 1000., false), Err(Error::NonFiniteTarget(_))));
        assert!(matches!(
            decompose(f64::NEG_INFINITY, 1000., true),
            Err(Error::NonFiniteTarget(_))
        ));
        assert!(matches!(Decomposer::new(0.), Err(Error::InvalidMagnitude(_))));
        assert!(matches!(Decomposer::new(-3.), Err(Error::InvalidMagnitude(_))));
        assert!(matches!(Decomposer::new(f64::NAN), Err(Error::InvalidMagnitude(_))));
    }

    #[test]
    fn decomposition_helpers() {
        let d = Decomposition { a2: 9, b2: -4 };
        assert_eq!(d.sum(), 1.);
        assert_eq!(d.mirrored(), Decomposition { a2: -9, b2: 4 });
        assert_eq!(d.to_string(), "ssqrt(9) + ssqrt(-4)");
        assert!(d.residual(1.).unwrap() < 1e-30);
    }
}
