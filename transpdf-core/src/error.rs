use thiserror::Error;

/// Failure reported by one of the HTTP collaborators.
///
/// The `Display` output is what ends up in front of the user, so `Rejected`
/// carries the server's `detail` (or the endpoint's generic message) verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Rejected(String),
    #[error("could not reach the server: {0}")]
    Transport(String),
    #[error("unexpected response from the server: {0}")]
    Decode(String),
}

impl ServiceError {
    pub fn rejected(message: impl Into<String>) -> Self {
        ServiceError::Rejected(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_displays_message_verbatim() {
        let err = ServiceError::rejected("corrupt file");
        assert_eq!(err.to_string(), "corrupt file");
    }

    #[test]
    fn transport_error_is_prefixed() {
        let err = ServiceError::Transport("connection refused".into());
        assert_eq!(
            err.to_string(),
            "could not reach the server: connection refused"
        );
    }
}
