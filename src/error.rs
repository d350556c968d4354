use thiserror::Error;

/// Errors surfaced by the recorder, the player and the script codec.
#[derive(Debug, Error)]
pub enum Error {
    /// The input hook could not attach (missing permission, unsupported platform).
    #[error("input hook failed to attach: {0}")]
    InputHook(String),

    /// The pointer entered the safety zone while playback was driving it.
    #[error("Failsafe triggered: pointer moved into the safety corner at ({x}, {y})")]
    SafetyAbort { x: i32, y: i32 },

    /// Any other failure of the underlying input backend.
    #[error("actuation failed: {0}")]
    Actuation(String),

    /// Malformed document or out-of-range setting.
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for the safety-zone abort, which is never retried.
    pub fn is_safety_abort(&self) -> bool {
        matches!(self, Error::SafetyAbort { .. })
    }
}

impl From<enigo::InputError> for Error {
    fn from(err: enigo::InputError) -> Self {
        Error::Actuation(err.to_string())
    }
}

impl From<enigo::NewConError> for Error {
    fn from(err: enigo::NewConError) -> Self {
        Error::Actuation(format!("failed to connect to the input backend: {err}"))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
