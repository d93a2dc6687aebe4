//! Shared fixtures: an engine over an in-memory SQLite store, a recording bot and helpers that
//! drive the handler chain with commands, text and button presses.

#![allow(dead_code)]

pub mod faulty_store;
pub mod mock_bot;

use chrono::NaiveDate;
use practice_bot::conversation::Session;
use practice_bot::{
    CallbackAction, Chat, Command, ConversationEngine, Event, EventKind, HandlerChain,
    HandlerResponse, InMemorySessionStore, LoggingHandler, PracticeConfig, SessionStore, User,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Once};
use storage::{
    Account, Application, ApplicationStatus, InstitutionType, PracticeStore, PracticeType,
    SqliteStore,
};
use tracing_subscriber::{fmt, EnvFilter};

pub use faulty_store::{Fault, FaultyStore};
pub use mock_bot::RecordingBot;

pub const ADMIN: i64 = 9000;
pub const STUDENT: i64 = 100;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing once per test process; `RUST_LOG` controls the level.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = fmt().with_env_filter(env_filter).with_test_writer().try_init();
    });
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub struct Harness {
    pub bot: Arc<RecordingBot>,
    pub store: Arc<SqliteStore>,
    /// The store the engine talks to; wraps `store` and can inject failures.
    pub faults: Arc<FaultyStore>,
    pub sessions: Arc<InMemorySessionStore>,
    pub engine: Arc<ConversationEngine>,
    pub chain: HandlerChain,
    next_event: AtomicU64,
}

impl Harness {
    pub async fn new() -> Self {
        Self::with_config(PracticeConfig {
            admin_chat_ids: vec![ADMIN],
            ..PracticeConfig::default()
        })
        .await
    }

    pub async fn with_config(config: PracticeConfig) -> Self {
        init_tracing();
        let bot = Arc::new(RecordingBot::new());
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let faults = Arc::new(FaultyStore::new(store.clone()));
        let sessions = Arc::new(InMemorySessionStore::new());
        let engine = Arc::new(ConversationEngine::new(
            bot.clone(),
            faults.clone(),
            sessions.clone(),
            config,
        ));
        let chain = HandlerChain::new()
            .add_handler(Arc::new(LoggingHandler))
            .add_handler(engine.clone());
        Self {
            bot,
            store,
            faults,
            sessions,
            engine,
            chain,
            next_event: AtomicU64::new(0),
        }
    }

    fn user(chat_id: i64) -> User {
        User {
            id: chat_id,
            username: Some(format!("user{}", chat_id)),
            first_name: Some("Иван".to_string()),
            last_name: None,
        }
    }

    pub async fn send_event(&self, chat_id: i64, kind: EventKind) -> HandlerResponse {
        let id = self.next_event.fetch_add(1, Ordering::SeqCst).to_string();
        let event = Event::new(id, Self::user(chat_id), Chat::private(chat_id), kind);
        self.chain.handle(&event).await.unwrap()
    }

    pub async fn command(&self, chat_id: i64, command: Command) -> HandlerResponse {
        self.send_event(chat_id, EventKind::Command(command)).await
    }

    pub async fn text(&self, chat_id: i64, text: &str) -> HandlerResponse {
        self.send_event(chat_id, EventKind::Text(text.to_string()))
            .await
    }

    /// Presses a button on the last message sent to the chat.
    pub async fn press(&self, chat_id: i64, action: CallbackAction) -> HandlerResponse {
        let message_id = self.bot.last_to(chat_id).map(|r| r.message_id);
        self.send_event(chat_id, EventKind::Callback { action, message_id })
            .await
    }

    pub async fn session(&self, chat_id: i64) -> Option<Session> {
        self.sessions.get(chat_id).await
    }

    pub async fn account(&self, chat_id: i64) -> Option<Account> {
        self.store.find_account_by_chat_id(chat_id).await.unwrap()
    }

    /// Latest application of the chat's account, any status.
    pub async fn latest_application(&self, chat_id: i64) -> Option<Application> {
        let account = self.account(chat_id).await?;
        self.store
            .find_applications_by_account(&account.id, &[], 1)
            .await
            .unwrap()
            .into_iter()
            .next()
    }

    /// Walks the whole registration flow up to (not including) confirmation.
    pub async fn fill_registration(&self, chat_id: i64, start: &str, end: &str) {
        self.command(chat_id, Command::Register).await;
        self.press(chat_id, CallbackAction::PrivacyAccept).await;
        self.text(chat_id, "Иванов").await;
        self.text(chat_id, "Иван").await;
        self.text(chat_id, "Иванович").await;
        self.press(
            chat_id,
            CallbackAction::RegistrationPracticeType(PracticeType::Production),
        )
        .await;
        self.press(
            chat_id,
            CallbackAction::RegistrationInstitutionType(InstitutionType::University),
        )
        .await;
        self.text(chat_id, "МГТУ им. Баумана").await;
        self.text(chat_id, "3").await;
        self.text(chat_id, &format!("student{}@example.com", chat_id))
            .await;
        self.text(chat_id, "+7 900 000-00-00").await;
        self.text(chat_id, start).await;
        self.text(chat_id, end).await;
    }

    /// Full registration; returns the stored application.
    pub async fn register(&self, chat_id: i64, start: &str, end: &str) -> Application {
        self.fill_registration(chat_id, start, end).await;
        self.press(chat_id, CallbackAction::ConfirmRegistration)
            .await;
        self.latest_application(chat_id).await.unwrap()
    }

    /// Registers and has the administrator approve the application.
    pub async fn register_and_approve(&self, chat_id: i64, start: &str, end: &str) -> Application {
        let app = self.register(chat_id, start, end).await;
        self.press(ADMIN, CallbackAction::Approve(app.id.clone()))
            .await;
        let app = self.store.find_application(&app.id).await.unwrap().unwrap();
        assert_eq!(app.status, ApplicationStatus::Approved);
        app
    }
}
