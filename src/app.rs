use std::sync::Arc;

use ratatui::layout::Rect;
use tokio::sync::mpsc::UnboundedSender;

use crate::config::Config;
use crate::dispatcher::{RequestSettings, Session, Submission};
use crate::openai::{CompletionApi, CompletionRequest};
use crate::status::verify_credential;
use crate::tui::AppEvent;

pub const APP_TITLE: &str = "고전 명문 챗봇";
pub const APP_EYEBROW: &str = "인생일력 추천";
pub const INTRO_TEXT: &str = "질문을 입력하면 시공을 넘나드는 고전 명문장을 추천하고, 그 철학적 의미를 해석해주는 대화를 이어갑니다. \
맥락을 기억하는 챗봇으로 대화할수록 맞춤 명문장이 쌓입니다.";
pub const INPUT_PLACEHOLDER: &str = "오늘의 흐름을 물어보고 싶은 문장을 입력하세요";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub text: &'static str,
    pub author: &'static str,
}

pub const HIGHLIGHT_QUOTES: [Quote; 4] = [
    Quote { text: "천 리 길도 한 걸음부터.", author: "노자, 도덕경" },
    Quote { text: "나는 생각한다, 고로 존재한다.", author: "데카르트, 방법서설" },
    Quote { text: "배움은 쉼 없이 점검하는 것이다.", author: "공자" },
    Quote {
        text: "바람이 불지 않을 때 연을 만들고, 바람이 불 때 날리는 것이 인생.",
        author: "마르쿠스 아우렐리우스",
    },
];

pub struct App {
    pub should_quit: bool,
    pub session: Session,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Log area for mouse hit-testing (updated during render)
    pub log_area: Option<Rect>,

    api: Option<Arc<dyn CompletionApi>>,
    events: UnboundedSender<AppEvent>,
}

impl App {
    /// `api` is `None` when no credential is configured; the session then
    /// starts locked out.
    pub fn new(
        config: &Config,
        api: Option<Arc<dyn CompletionApi>>,
        events: UnboundedSender<AppEvent>,
    ) -> Self {
        let session = Session::new(RequestSettings::from_config(config), api.is_some());

        Self {
            should_quit: false,
            session,
            animation_frame: 0,
            log_area: None,
            api,
            events,
        }
    }

    /// Kick off the one-time credential check without blocking the first draw.
    pub fn start_verification(&self) {
        let Some(api) = self.api.clone() else {
            return;
        };
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = verify_credential(api.as_ref()).await;
            let _ = events.send(AppEvent::Verified(result));
        });
    }

    /// Submit the input line. A session without a client is locked out,
    /// so it never yields `Dispatch` here.
    pub fn submit(&mut self) -> Submission {
        let submission = self.session.submit_input();
        if let (Submission::Dispatch(request), Some(api)) = (&submission, self.api.clone()) {
            Self::spawn_completion(api, request.clone(), self.events.clone());
        }
        submission
    }

    fn spawn_completion(
        api: Arc<dyn CompletionApi>,
        request: CompletionRequest,
        events: UnboundedSender<AppEvent>,
    ) {
        tokio::spawn(async move {
            let result = api.complete(&request).await;
            let _ = events.send(AppEvent::Completed(result));
        });
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_in_flight() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
