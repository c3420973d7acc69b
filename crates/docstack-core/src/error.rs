//! Core boundary error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Record store error: {0}")]
    Store(String),

    #[error("Audit sink error: {0}")]
    Audit(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
