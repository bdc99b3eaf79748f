//! Session state and the submit/finish state machine
//!
//! `Session::submit` is the only way into the sending state and
//! `Session::finish` the only way out. Network I/O is not performed here: a
//! successful submit returns the request to send and the caller feeds the
//! outcome back through `finish`, which keeps this module testable without a
//! terminal or a server.

use tracing::{info, warn};

use crate::chat_log::{ChatLog, TypingIndicator};
use crate::config::Config;
use crate::error::ChatResult;
use crate::openai::CompletionRequest;
use crate::state::{ChatRole, History};
use crate::status::{
    status_from_verification, ConnectionStatus, MISSING_KEY_TEXT, REQUEST_FAILED_TEXT,
};

pub const FALLBACK_REPLY: &str = "명문장을 찾지 못했습니다.";
pub const MISSING_KEY_NOTICE: &str =
    "환경변수에 API 키가 없어서 OpenAI에 연결할 수 없습니다. 키를 추가한 뒤 다시 실행하세요.";
pub const LOCKED_OUT_NOTICE: &str = "API 키가 없어 응답할 수 없습니다.";

/// Fixed generation parameters sent with every completion
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub max_history: usize,
}

impl RequestSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.model().to_string(),
            temperature: config.temperature(),
            max_tokens: config.max_tokens(),
            max_history: config.max_history(),
        }
    }
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self::from_config(&Config::new())
    }
}

/// Effect of a submission
#[derive(Debug, Clone, PartialEq)]
pub enum Submission {
    /// Send this request; call `finish` with the outcome.
    Dispatch(CompletionRequest),
    /// Blank input, nothing happened
    Empty,
    /// A request is already outstanding
    Busy,
    /// No credential; a notice was added to the log
    LockedOut,
}

pub struct Session {
    pub history: History,
    pub status: ConnectionStatus,
    pub log: ChatLog,
    pub input: String,
    pub cursor: usize, // char index into input
    settings: RequestSettings,
    in_flight: bool,
    locked_out: bool,
    submit_enabled: bool,
    typing: Option<TypingIndicator>,
}

impl Session {
    pub fn new(settings: RequestSettings, has_api_key: bool) -> Self {
        let history = History::seeded(settings.max_history);
        let mut log = ChatLog::new();
        if let Some(greeting) = history.last() {
            log.append_message(greeting.role, &greeting.content);
        }

        let mut session = Self {
            history,
            status: ConnectionStatus::pending(),
            log,
            input: String::new(),
            cursor: 0,
            settings,
            in_flight: false,
            locked_out: false,
            submit_enabled: true,
            typing: None,
        };

        if !has_api_key {
            session.lock_out();
        }
        session
    }

    fn lock_out(&mut self) {
        warn!("no API key configured, input disabled");
        self.locked_out = true;
        self.submit_enabled = false;
        self.status = ConnectionStatus::error(MISSING_KEY_TEXT);
        self.log.append_message(ChatRole::System, MISSING_KEY_NOTICE);
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn is_locked_out(&self) -> bool {
        self.locked_out
    }

    pub fn input_enabled(&self) -> bool {
        !self.locked_out
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    pub fn settings(&self) -> &RequestSettings {
        &self.settings
    }

    /// Startup credential check result.
    pub fn apply_verification(&mut self, result: &ChatResult<()>) {
        if self.locked_out {
            return;
        }
        self.status = status_from_verification(result);
    }

    /// Submit whatever is in the input line.
    pub fn submit_input(&mut self) -> Submission {
        let input = self.input.clone();
        self.submit(&input)
    }

    pub fn submit(&mut self, input: &str) -> Submission {
        if self.in_flight {
            return Submission::Busy;
        }
        let prompt = input.trim();
        if prompt.is_empty() {
            return Submission::Empty;
        }
        if self.locked_out {
            self.log.append_message(ChatRole::System, LOCKED_OUT_NOTICE);
            return Submission::LockedOut;
        }

        self.input.clear();
        self.cursor = 0;

        self.in_flight = true;
        self.submit_enabled = false;
        self.log.append_message(ChatRole::User, prompt);
        self.history.append(ChatRole::User, prompt);
        self.history.trim();
        self.typing = Some(self.log.show_typing_indicator());

        info!(history = self.history.len(), "dispatching completion request");

        Submission::Dispatch(CompletionRequest {
            model: self.settings.model.clone(),
            messages: self.history.messages().to_vec(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        })
    }

    /// Completion outcome for the outstanding request.
    pub fn finish(&mut self, result: ChatResult<Option<String>>) {
        match result {
            Ok(content) => {
                let reply = content
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .unwrap_or_else(|| FALLBACK_REPLY.to_string());
                self.history.append(ChatRole::Assistant, reply.clone());
                self.history.trim();
                self.log.append_message(ChatRole::Assistant, &reply);
                self.status = ConnectionStatus::healthy();
            }
            Err(e) => {
                warn!(error = %e, "completion request failed");
                self.log.append_message(
                    ChatRole::System,
                    &format!("응답 중 오류가 발생했습니다. {}", e.user_message()),
                );
                self.status = ConnectionStatus::error(REQUEST_FAILED_TEXT);
            }
        }

        // Always runs, whatever the outcome
        if let Some(typing) = self.typing.take() {
            self.log.remove_typing_indicator(typing);
        }
        self.submit_enabled = true;
        self.in_flight = false;
    }
}
