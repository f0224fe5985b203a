//! Render errors.

use thiserror::Error;

/// Why a render produced no image.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("Invalid render configuration: {0}")]
    InvalidConfig(String),

    #[error("Render was cancelled")]
    Cancelled,
}

pub type RenderResult<T> = Result<T, RenderError>;
