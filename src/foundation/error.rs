/// Convenience result type used across driftfx.
pub type DriftResult<T> = Result<T, DriftError>;

/// Top-level error taxonomy used by pipeline, transition and IO APIs.
#[derive(thiserror::Error, Debug)]
pub enum DriftError {
    /// Missing program, missing slot, or too few ring-buffer slots.
    #[error("setup error: {0}")]
    Setup(String),

    /// A single pass failed while rendering a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Texture load or capture save failure.
    #[error("io error: {0}")]
    Io(String),

    /// Invalid user-provided configuration data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DriftError {
    /// Build a [`DriftError::Setup`] value.
    pub fn setup(msg: impl Into<String>) -> Self {
        Self::Setup(msg.into())
    }

    /// Build a [`DriftError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`DriftError::Io`] value.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Build a [`DriftError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Return `true` for errors that abort an operation before any state was touched.
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::Setup(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
