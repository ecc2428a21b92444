use std::fmt::{Display, Formatter};

/// Error type for every fallible engine operation.
///
/// A render either produces its full output or fails with one of these; no
/// partial result is ever returned.
#[derive(Debug)]
pub enum ReelError {
    /// The request was rejected before any decode work started.
    Input(String),
    /// A source could not be decoded. `name` is the source's display name.
    Decode { name: String, reason: String },
    /// Mixing, mastering or encoding failed.
    Render(String),
    /// The render was cancelled between phases.
    Cancelled,
}

impl ReelError {
    pub(crate) fn decode(name: impl Into<String>, reason: impl Display) -> Self {
        Self::Decode {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

impl Display for ReelError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Input(err) => write!(f, "input error: {}", err),
            Self::Decode { name, reason } => write!(f, "failed to decode {}: {}", name, reason),
            Self::Render(err) => write!(f, "render error: {}", err),
            Self::Cancelled => write!(f, "render cancelled"),
        }
    }
}

impl std::error::Error for ReelError {}
