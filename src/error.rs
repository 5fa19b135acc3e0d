//! Error taxonomy for the render core.
//!
//! Kinds, not identifiers: a host distinguishes caller misuse from bad
//! loader data from allocation failure by matching on [`Error`] variants,
//! not by parsing message strings.

use thiserror::Error;

/// An error produced by the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// Caller misuse, e.g. calling [`crate::render::Engine::play`] before
    /// `validate()` has succeeded. Surfaced immediately; no state changes.
    #[error("argument error: {0}")]
    Argument(String),

    /// Malformed or semantically invalid input tree, caught during
    /// `validate()`. The message names the offending key path and the
    /// violated concept (e.g. "song", "instance", "control").
    #[error("format error: {0}")]
    Format(String),

    /// Allocation failure. The render path never allocates once
    /// `set_buffer_size`/`set_audio_rate` have run, so this can only
    /// surface from those calls or from `validate()`.
    #[error("memory error: {0}")]
    Memory(String),

    /// Failure originating in loader-provided data, e.g. a truncated
    /// sample. Reported by `validate()` only.
    #[error("resource error: {0}")]
    Resource(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn format(path: impl std::fmt::Display, concept: &str, detail: impl std::fmt::Display) -> Self {
        Error::Format(format!("{path}: invalid {concept}: {detail}"))
    }
}
