use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid statistics data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TutorError {
    #[error("lesson {0} not found")]
    LessonNotFound(u32),
    #[error("unknown category '{0}'")]
    UnknownCategory(String),
    #[error("no theory lesson is waiting for acknowledgment")]
    NoActiveTheory,
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("embedded table {0} is missing")]
    Missing(&'static str),
    #[error("embedded table is invalid: {0}")]
    Invalid(#[from] serde_json::Error),
}
