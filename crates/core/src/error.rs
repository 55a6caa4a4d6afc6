use thiserror::Error;

#[derive(Error, Debug)]
pub enum CineError {
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

}

impl CineError {
    /// Whether the error was caused by the caller (maps to a 4xx response).
    pub fn is_client_error(&self) -> bool {
        matches!(self, CineError::Validation(_) | CineError::NotFound(_))
    }
}
