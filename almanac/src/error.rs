use common::BirthError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CalendarError {
    /// Rejected before any calendar conversion is attempted.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("calculation failed: {0}")]
    Computation(String),
}

impl From<BirthError> for CalendarError {
    fn from(err: BirthError) -> Self {
        CalendarError::InvalidInput(err.to_string())
    }
}

pub type CalendarResult<T> = Result<T, CalendarError>;
