use thiserror::Error;

/// Errors surfaced by the physics engine.
///
/// Nothing in the engine retries: every failure propagates to the caller of
/// the operation that triggered it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhysicsError {
    /// A connection to the engine could not be established.
    #[error("physics engine unavailable: {0}")]
    EngineUnavailable(String),
    /// The operation targeted a disconnected world, a removed body or a link
    /// or joint the body does not have.
    #[error("invalid handle: {0}")]
    InvalidHandle(String),
}

impl PhysicsError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidHandle(message.into())
    }
}
