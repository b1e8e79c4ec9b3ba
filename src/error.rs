use std::fmt;
use std::fmt::{Display, Formatter};

/// Fatal, load-time failures. Per-title anomalies (a stage that found nothing to
/// match) are never represented here -- they are recorded directly on
/// `ExtractionResult` instead, since they are not failures of the program.
#[derive(Debug)]
pub enum ExtractionError {
    PatternLibraryInvalid(String),
    ConfigInvalid(String),
    Io(String),
}

impl Display for ExtractionError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ExtractionError::PatternLibraryInvalid(msg) => {
                write!(f, "pattern library invalid: {}", msg)
            }
            ExtractionError::ConfigInvalid(msg) => write!(f, "configuration invalid: {}", msg),
            ExtractionError::Io(msg) => write!(f, "io error: {}", msg),
        }
    }
}

impl std::error::Error for ExtractionError {}

impl From<std::io::Error> for ExtractionError {
    fn from(e: std::io::Error) -> Self {
        ExtractionError::Io(e.to_string())
    }
}
