// Splits a real number into two integer squares whose signed square roots add up to it,
// plus the grid and timing sweeps that drive the search in bulk
pub mod error;
pub mod logging;
pub mod logic;
pub mod numbers;
pub mod rendering;
pub mod timing;

pub use error::Error;
pub use logic::{decompose, Decomposer, Decomposition, Outcome, SearchReport, Stop};
pub use numbers::{signed_sqrt, Tolerance};
