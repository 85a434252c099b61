//! Errors surfaced to callers of the command surface.
//!
//! Internal plumbing uses `anyhow`; these typed errors mark the failures the host
//! needs to tell apart. They travel inside `anyhow::Error` and are recovered with
//! `downcast_ref` when building a command response.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParameterError {
    /// A required command parameter was not supplied.
    #[error("Parameter \"{0}\" is missing")]
    MissingParameter(String),

    /// A command parameter was supplied with a wrong type or out of range.
    #[error("{0}")]
    InvalidParameter(String),

    /// The command was valid but could not be carried out.
    #[error("{0}")]
    CommandError(String),
}

impl ParameterError {
    pub fn missing(name: &str) -> Self {
        ParameterError::MissingParameter(name.to_string())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ParameterError::InvalidParameter(message.into())
    }

    pub fn command(message: impl Into<String>) -> Self {
        ParameterError::CommandError(message.into())
    }

    /// Name used in the `type` field of JSON error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            ParameterError::MissingParameter(_) => "MissingParameter",
            ParameterError::InvalidParameter(_) => "InvalidParameter",
            ParameterError::CommandError(_) => "CommandError",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ParameterError::missing("latitude").to_string(),
            "Parameter \"latitude\" is missing"
        );
        assert_eq!(
            ParameterError::invalid("Hostname is not valid").to_string(),
            "Hostname is not valid"
        );
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err: anyhow::Error = ParameterError::command("Unable to save position").into();
        let typed = err.downcast_ref::<ParameterError>().unwrap();
        assert_eq!(typed.kind(), "CommandError");
    }
}
