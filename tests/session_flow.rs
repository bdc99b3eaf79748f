use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use quotechat::handler::handle_event;
use quotechat::status::{HEALTHY_TEXT, REQUEST_FAILED_TEXT};
use quotechat::tui::AppEvent;
use quotechat::{
    App, ChatError, ChatResult, ChatRole, CompletionApi, CompletionRequest, Config, StatusState,
    Submission,
};
use tokio::sync::{mpsc, Notify};

/// Scripted stand-in for the OpenAI client
struct FakeApi {
    verify: fn() -> ChatResult<()>,
    reply: fn() -> ChatResult<Option<String>>,
    gate: Option<Arc<Notify>>,
    calls: AtomicUsize,
}

impl FakeApi {
    fn new(reply: fn() -> ChatResult<Option<String>>) -> Self {
        Self {
            verify: || Ok(()),
            reply,
            gate: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CompletionApi for FakeApi {
    async fn verify_key(&self) -> ChatResult<()> {
        (self.verify)()
    }

    async fn complete(&self, _request: &CompletionRequest) -> ChatResult<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        (self.reply)()
    }
}

fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

fn type_and_send(app: &mut App, text: &str) {
    for c in text.chars() {
        handle_event(app, key(KeyCode::Char(c))).unwrap();
    }
    handle_event(app, key(KeyCode::Enter)).unwrap();
}

async fn pump(app: &mut App, rx: &mut mpsc::UnboundedReceiver<AppEvent>) {
    let event = rx.recv().await.expect("event channel closed");
    handle_event(app, event).unwrap();
}

fn app_with(api: Arc<FakeApi>) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let app = App::new(&Config::new(), Some(api as Arc<dyn CompletionApi>), tx);
    (app, rx)
}

#[tokio::test]
async fn successful_reply_round_trip() {
    let api = Arc::new(FakeApi::new(|| Ok(Some("결과".to_string()))));
    let (mut app, mut rx) = app_with(api.clone());

    let history_before = app.session.history.len();
    let bubbles_before = app.session.log.len();

    type_and_send(&mut app, "오늘의 문장");
    assert!(app.session.is_in_flight());
    assert!(app.session.log.is_typing());

    pump(&mut app, &mut rx).await;

    assert!(!app.session.is_in_flight());
    assert_eq!(app.session.history.len(), history_before + 2);
    // user bubble + assistant bubble, typing indicator gone
    assert_eq!(app.session.log.len(), bubbles_before + 2);
    let last = app.session.log.bubbles().last().unwrap();
    assert_eq!(last.role, ChatRole::Assistant);
    assert_eq!(last.text(), "결과");
    assert_eq!(app.session.status.message, HEALTHY_TEXT);
    assert_eq!(api.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn reply_without_content_uses_fallback() {
    let api = Arc::new(FakeApi::new(|| Ok(None)));
    let (mut app, mut rx) = app_with(api);

    type_and_send(&mut app, "질문");
    pump(&mut app, &mut rx).await;

    let last = app.session.log.bubbles().last().unwrap();
    assert_eq!(last.role, ChatRole::Assistant);
    assert_eq!(last.text(), quotechat::dispatcher::FALLBACK_REPLY);
    assert_eq!(app.session.status.state, StatusState::Success);
}

#[tokio::test]
async fn second_submission_rejected_while_first_is_delayed() {
    let gate = Arc::new(Notify::new());
    let api = Arc::new(FakeApi {
        gate: Some(gate.clone()),
        ..FakeApi::new(|| Ok(Some("첫 답".to_string())))
    });
    let (mut app, mut rx) = app_with(api.clone());

    assert!(!app.session.is_in_flight());
    type_and_send(&mut app, "first");
    assert!(app.session.is_in_flight());

    app.session.input = "second".to_string();
    assert_eq!(app.submit(), Submission::Busy);
    assert_eq!(app.session.history.len(), 3);

    gate.notify_one();
    pump(&mut app, &mut rx).await;
    assert!(!app.session.is_in_flight());
    assert_eq!(api.calls.load(Ordering::SeqCst), 1);

    // the unsent text is still in the input and goes through now
    assert!(matches!(app.submit(), Submission::Dispatch(_)));
    gate.notify_one();
    pump(&mut app, &mut rx).await;
    assert!(!app.session.is_in_flight());
    assert_eq!(api.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unauthorized_reply_shows_error_bubble() {
    let api = Arc::new(FakeApi::new(|| {
        Err(ChatError::api(401, Some("invalid key".to_string())))
    }));
    let (mut app, mut rx) = app_with(api);

    type_and_send(&mut app, "질문");
    pump(&mut app, &mut rx).await;

    let last = app.session.log.bubbles().last().unwrap();
    assert_eq!(last.role, ChatRole::System);
    assert!(last.text().contains("invalid key"));
    assert_eq!(app.session.status.state, StatusState::Error);
    assert_eq!(app.session.status.message, REQUEST_FAILED_TEXT);
    assert!(app
        .session
        .history
        .messages()
        .iter()
        .skip(2)
        .all(|m| m.role != ChatRole::Assistant));
    assert!(!app.session.is_in_flight());
    assert!(app.session.submit_enabled());
}

#[tokio::test]
async fn startup_verification_updates_status() {
    let api = Arc::new(FakeApi {
        verify: || Err(ChatError::api(401, Some("bad key".to_string()))),
        ..FakeApi::new(|| Ok(None))
    });
    let (mut app, mut rx) = app_with(api);
    assert_eq!(app.session.status.state, StatusState::Pending);

    app.start_verification();
    pump(&mut app, &mut rx).await;

    assert_eq!(app.session.status.state, StatusState::Error);
    assert_eq!(app.session.status.message, "API 키 오류: bad key");
    // a failed check does not lock the input
    assert!(app.session.input_enabled());
}

#[tokio::test]
async fn missing_key_makes_no_calls() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut app = App::new(&Config::new(), None, tx);

    app.start_verification();
    assert_eq!(app.session.submit("hello"), Submission::LockedOut);
    assert_eq!(
        app.session.log.bubbles().last().unwrap().text(),
        quotechat::dispatcher::LOCKED_OUT_NOTICE
    );
    assert!(!app.session.input_enabled());
    assert!(!app.session.submit_enabled());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn twenty_turns_keep_window() {
    let api = Arc::new(FakeApi::new(|| Ok(Some("답".to_string()))));
    let (mut app, mut rx) = app_with(api);

    for i in 0..20 {
        type_and_send(&mut app, &format!("질문 {}", i));
        pump(&mut app, &mut rx).await;
        assert!(app.session.history.len() <= 11);
        assert_eq!(app.session.history.messages()[0].role, ChatRole::System);
    }
    assert_eq!(app.session.history.len(), 11);
}
