use thiserror::Error;

/// Usage and configuration failures surfaced by the engine.
///
/// Game outcomes such as a contradiction or running out of questions are not
/// errors; they are reported through [`crate::belief::UpdateOutcome`] and
/// [`crate::guess::Verdict`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    #[error("catalog contains no identities")]
    EmptyCatalog,
    #[error("identity '{0}' is defined more than once")]
    DuplicateIdentity(String),
    #[error("unknown attribute '{0}'")]
    InvalidAttribute(String),
    #[error("unknown identity '{0}'")]
    UnknownIdentity(String),
    #[error("answer must be 0 or 1 but was {0}")]
    InvalidAnswer(u8),
    #[error("{field}: {message}")]
    InvalidParams { field: &'static str, message: String },
}
