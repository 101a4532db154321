use thiserror::Error;

/// Everything that can go wrong around a search. An exhausted search is a
/// normal `Outcome`, never one of these.
#[derive(Debug, Error)]
pub enum Error {
    #[error("magnitude cap must be positive and finite, got {0}")]
    InvalidMagnitude(f64),

    #[error("target sum must be finite, got {0}")]
    NonFiniteTarget(f64),

    #[error("need at least two samples to fit a line, got {0}")]
    TooFewSamples(usize),

    #[error("x and y samples differ in length: {0} vs {1}")]
    MismatchedSamples(usize, usize),

    #[error("samples have zero variance")]
    ConstantSamples,

    #[error("grid radius must be between 1 and {max}, got {0}", max = crate::rendering::MAX_RADIUS)]
    InvalidRadius(i64),

    #[error("heatmap rendering failed: {0}")]
    Render(String),

    #[error("a sweep worker thread panicked")]
    WorkerPanicked,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
