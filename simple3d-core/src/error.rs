/// Error type shared by the transform, projection and dispatch layers
use crate::scene::ObjectId;

/// Errors raised by the core
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An argument would drive the math out of its domain (zero axis, zero scale, ...)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The id does not name an object in the scene
    #[error("unknown object: {0}")]
    UnknownObject(ObjectId),

    /// The event kind name could not be parsed
    #[error("unknown event kind: {0}")]
    UnknownEventKind(String),
}

impl Error {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
