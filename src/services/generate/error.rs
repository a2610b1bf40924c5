use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "typegen", derive(specta::Type))]
#[cfg_attr(feature = "typegen", specta(rename_all = "camelCase"))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GenerateError {
    /// The request could not be sent or the response body could not be read.
    Transport { message: String },
    /// The endpoint answered with a non-success HTTP status.
    Server { status: u16, message: String },
    /// The response declared success but carried no body.
    EmptyBody { message: String },
    /// A generation request is already in flight for this session.
    Busy { message: String },
    InvalidInput { message: String },
    Internal { message: String },
}

impl GenerateError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }

    pub fn empty_body(message: impl Into<String>) -> Self {
        Self::EmptyBody {
            message: message.into(),
        }
    }

    pub fn busy(message: impl Into<String>) -> Self {
        Self::Busy {
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Transport { message }
            | Self::Server { message, .. }
            | Self::EmptyBody { message }
            | Self::Busy { message }
            | Self::InvalidInput { message }
            | Self::Internal { message } => message,
        }
    }
}

impl From<reqwest::Error> for GenerateError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport { message } => write!(f, "Transport: {}", message),
            Self::Server { status, message } => write!(f, "Server {}: {}", status, message),
            Self::EmptyBody { message } => write!(f, "EmptyBody: {}", message),
            Self::Busy { message } => write!(f, "Busy: {}", message),
            Self::InvalidInput { message } => write!(f, "InvalidInput: {}", message),
            Self::Internal { message } => write!(f, "Internal: {}", message),
        }
    }
}

impl std::error::Error for GenerateError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_tagged() {
        let json = serde_json::to_value(GenerateError::server(502, "Bad Gateway")).unwrap();
        assert_eq!(json["type"], "server");
        assert_eq!(json["status"], 502);
        assert_eq!(json["message"], "Bad Gateway");
    }

    #[test]
    fn test_display_includes_variant() {
        let err = GenerateError::busy("A generation request is already in flight");
        assert_eq!(
            err.to_string(),
            "Busy: A generation request is already in flight"
        );
        assert_eq!(err.message(), "A generation request is already in flight");
    }
}
