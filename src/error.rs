use temporal_ephemeris::core::ERR_INVALID_LUNAR_DATE;
use temporal_ephemeris::CalculationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SajuError {
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Calendar service unavailable: {0}")]
    CalendarService(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<CalculationError> for SajuError {
    fn from(err: CalculationError) -> Self {
        if err.code == ERR_INVALID_LUNAR_DATE {
            SajuError::InvalidDate(err.msg)
        } else {
            SajuError::CalendarService(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, SajuError>;
