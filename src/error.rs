use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unknown period: {0:?} (expected day, week, month or year)")]
    InvalidPeriod(String),
    #[error("feed error: {0}")]
    Feed(String),
    #[error("state lock poisoned")]
    StateLock,
}
