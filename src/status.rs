use tracing::{info, warn};

use crate::error::ChatResult;
use crate::openai::CompletionApi;

pub const CHECKING_TEXT: &str = "API 키 확인 중...";
pub const HEALTHY_TEXT: &str = "API 키 정상 작동 중";
pub const MISSING_KEY_TEXT: &str = "API 키가 없습니다. OPENAI_API_KEY 환경변수를 설정한 뒤 재시작하세요.";
pub const REQUEST_FAILED_TEXT: &str = "응답 처리 중 오류 발생";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusState {
    Pending,
    Success,
    Error,
}

/// What the header dot and text show
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: StatusState,
    pub message: String,
}

impl ConnectionStatus {
    pub fn pending() -> Self {
        Self {
            state: StatusState::Pending,
            message: CHECKING_TEXT.to_string(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            state: StatusState::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            state: StatusState::Error,
            message: message.into(),
        }
    }

    pub fn healthy() -> Self {
        Self::success(HEALTHY_TEXT)
    }

    pub fn is_error(&self) -> bool {
        self.state == StatusState::Error
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::pending()
    }
}

/// Map a verification outcome onto the indicator.
pub fn status_from_verification(result: &ChatResult<()>) -> ConnectionStatus {
    match result {
        Ok(()) => ConnectionStatus::healthy(),
        Err(e) => ConnectionStatus::error(format!("API 키 오류: {}", e.user_message())),
    }
}

/// One-shot credential check run at startup.
pub async fn verify_credential<A: CompletionApi + ?Sized>(api: &A) -> ChatResult<()> {
    let result = api.verify_key().await;
    match &result {
        Ok(()) => info!("credential check passed"),
        Err(e) => warn!(error = %e, "credential check failed"),
    }
    result
}
