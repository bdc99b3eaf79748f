use thiserror::Error;

/// Shown when the provider gives no usable error text
pub const GENERIC_FAILURE: &str = "응답 실패";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("API error {status}: {}", .message.as_deref().unwrap_or(GENERIC_FAILURE))]
    Api {
        status: u16,
        message: Option<String>,
    },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl ChatError {
    pub fn api(status: u16, message: Option<String>) -> Self {
        Self::Api { status, message }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Text shown to the user: the provider's own message when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Api {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            ChatError::Api { .. } => GENERIC_FAILURE.to_string(),
            ChatError::Transport(e) => e.to_string(),
            ChatError::MalformedResponse(_) => GENERIC_FAILURE.to_string(),
        }
    }
}

pub type ChatResult<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_provider_text() {
        let err = ChatError::api(401, Some("invalid key".to_string()));
        assert_eq!(err.user_message(), "invalid key");
    }

    #[test]
    fn test_user_message_falls_back() {
        assert_eq!(ChatError::api(500, None).user_message(), GENERIC_FAILURE);
        assert_eq!(ChatError::api(502, Some("  ".into())).user_message(), GENERIC_FAILURE);
        assert_eq!(ChatError::malformed("missing choices").user_message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_display_includes_status() {
        let err = ChatError::api(429, Some("slow down".to_string()));
        assert_eq!(err.to_string(), "API error 429: slow down");
    }
}
