use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeostatError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Parameter error: {0}")]
    ParameterError(String),

    #[error("Shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    #[error("Matrix of size {size} is not positive definite")]
    NotPositiveDefinite { size: usize },

    #[error("Solver diverged at iteration {iteration}: {message}")]
    SolverDiverged { iteration: usize, message: String },

    #[error("Linear algebra error: {0}")]
    LinAlg(String),

    #[error("Projection error: {0}")]
    Projection(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GeostatError {
    pub fn shape(context: &str, expected: impl ToString, found: impl ToString) -> Self {
        GeostatError::ShapeMismatch {
            context: context.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

pub type GeostatResult<T> = Result<T, GeostatError>;
