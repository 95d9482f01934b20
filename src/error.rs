use thiserror::Error;

/// Errors that can occur during tracing.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TraceError {
    #[error("invalid grid: {width}x{height} with {len} cells")]
    InvalidGrid { width: u32, height: u32, len: usize },

    #[error("{name} out of range: {value}")]
    ToleranceOutOfRange { name: &'static str, value: f64 },

    #[error("failed to load image: {0}")]
    ImageLoad(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
