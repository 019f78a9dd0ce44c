use physics::PhysicsError;
use thiserror::Error;

/// Errors surfaced by the environment.
#[derive(Error, Debug)]
pub enum EnvError {
    /// The physics engine rejected a call or could not be reached.
    #[error(transparent)]
    Physics(#[from] PhysicsError),
    /// An action label, index or command outside the configured action space.
    #[error("invalid action: {0}")]
    InvalidAction(String),
    /// A feature vector or configuration document that does not parse.
    #[error("malformed feature vector: {0}")]
    FeatureVector(#[from] serde_json::Error),
}

impl EnvError {
    pub(crate) fn invalid_action(message: impl Into<String>) -> Self {
        Self::InvalidAction(message.into())
    }
}
