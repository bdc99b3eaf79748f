//! Conversation state shared by the dispatcher and the renderer
//!
//! The history is the exact message list sent to the completion endpoint.
//! Index 0 is always the system prompt; everything after it is a sliding
//! window over the most recent turns.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default number of non-system messages kept in the window
pub const DEFAULT_MAX_HISTORY: usize = 10;

pub const SYSTEM_PROMPT: &str = "당신은 인생의 흐름을 한 문장에 담아내는 고전 명문장 큐레이터입니다. \
단순한 번역이 아니라, 질문자의 심정을 헤아려 동양과 서양 고전의 문장을 활용해 통찰력 있는 답변을 제공하세요. \
응답은 한국어로 자연스럽게 작성하고, 명문장을 적절히 인용하여 구성합니다.";

pub const INITIAL_GREETING: &str = "안녕하세요. 고전의 지혜를 꺼내 삶의 흐름을 짚어주는 인생일력 챗봇입니다. \
질문을 주시면 관련 명문장과 그 맥락을 연결해 답변드릴게요.";

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone)]
pub struct History {
    messages: Vec<ChatMessage>,
    max_window: usize,
}

impl History {
    pub fn new(system_prompt: &str, max_window: usize) -> Self {
        Self {
            messages: vec![ChatMessage::new(ChatRole::System, system_prompt)],
            max_window,
        }
    }

    /// System prompt followed by the assistant greeting
    pub fn seeded(max_window: usize) -> Self {
        let mut history = Self::new(SYSTEM_PROMPT, max_window);
        history.append(ChatRole::Assistant, INITIAL_GREETING);
        history
    }

    pub fn append(&mut self, role: ChatRole, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(role, content));
    }

    /// Drop the oldest messages after the system prompt until the window fits.
    pub fn trim(&mut self) {
        let limit = self.max_window + 1;
        if self.messages.len() > limit {
            let overflow = self.messages.len() - limit;
            self.messages.drain(1..1 + overflow);
            debug!(evicted = overflow, remaining = self.messages.len(), "trimmed history");
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}
