use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A risk factor outside [0,100] is a data-entry error, rejected at
    /// construction rather than clamped.
    #[error("risk factor `{field}` must be within 0-100, got {value}")]
    Validation { field: &'static str, value: f64 },

    /// Trend recordings must name a period on the tracker's declared axis.
    #[error("unknown trend period `{0}`")]
    UnknownPeriod(String),

    #[error("report export failed: {0}")]
    Export(String),
}
