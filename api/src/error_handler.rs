//! Application error type for the HTTP layer.
//!
//! Request handlers answer with typed JSON bodies directly; `AppError`
//! covers startup and serve-loop failures surfaced from [`crate::start`].

use thiserror::Error;

use pr_reviewer::errors::ConfigError;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- Boot / config ---
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Client construction failure from the reviewer crate.
    #[error(transparent)]
    Reviewer(#[from] pr_reviewer::Error),

    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),
}
