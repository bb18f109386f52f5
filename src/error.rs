use std::error::Error;
use std::fmt;

/// Errors raised by the surrogate regressor and its collaborators.
#[derive(Debug)]
pub enum SurrogateError {
    /// Missing or invalid collaborator, option, or data shape.
    Config(String),
    /// Predict or export was called before a successful fit.
    NotFitted,
    /// Failure propagated unchanged from the tree-training backend.
    Training(String),
}

impl fmt::Display for SurrogateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SurrogateError::Config(msg) => write!(f, "configuration error: {}", msg),
            SurrogateError::NotFitted => {
                write!(f, "model has not been fitted; call fit() first")
            }
            SurrogateError::Training(msg) => write!(f, "training backend error: {}", msg),
        }
    }
}

impl Error for SurrogateError {}

pub type Result<T> = std::result::Result<T, SurrogateError>;
