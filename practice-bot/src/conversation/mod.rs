//! # Conversation engine
//!
//! Per-chat state machine behind the bot. Each event is handled under the chat's lock:
//!
//! 1. Commands run in any state.
//! 2. With no session, text is matched against the main-menu labels; anything else is ignored.
//! 3. With a session, text goes to the handler of the current step. Invalid input re-prompts and
//!    keeps the step.
//! 4. Button presses arrive as [`CallbackAction`]s. Flow buttons without a matching session are
//!    stale and ignored without a reply.
//!
//! Any error that escapes a step clears the session and sends a fallback message.

mod creation;
mod edit;
pub mod format;
pub mod menu;
mod moderation;
mod registration;
mod state;
mod submission;
pub mod validation;

pub use edit::AUDIT_MARKER;
pub use state::{
    CreationSession, CreationStep, EditSession, EditStep, RegistrationDraft, RegistrationSession,
    RegistrationStep, Session, SubmissionSession, TaskDraft,
};

use async_trait::async_trait;
use std::sync::Arc;
use storage::{Account, PracticeStore, StorageError};
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, instrument, warn};

use crate::config::PracticeConfig;
use crate::core::{
    Bot, BotError, CallbackAction, Command, Event, EventKind, Handler, HandlerResponse,
    Keyboard, OutgoingMessage, Result,
};
use crate::notify::Notifier;
use crate::session::{ChatLocks, SessionStore};

const GENERIC_ERROR: &str =
    "Произошла ошибка. Попробуйте ещё раз или начните заново командой /register.";
const NOT_FOUND: &str = "Запись не найдена. Возможно, она была удалена.";
const ADMIN_ONLY: &str = "Эта команда доступна только администраторам.";
const CANCELLED: &str = "Действие отменено.";
const NOTHING_TO_CANCEL: &str = "Нечего отменять.";
const NO_ACCOUNT: &str = "Вы ещё не зарегистрированы. Подать заявку: /register.";
const INFO: &str = "Практика проходит в нашей компании по учебному, производственному или \
преддипломному направлению.\n\n\
Как это работает:\n\
1. Подайте заявку (/register).\n\
2. Дождитесь решения администратора.\n\
3. После одобрения получайте задания (/tasks) и сдавайте решения прямо в чате.\n\n\
Перед окончанием практики бот напомнит о сроках.";

/// Drives every conversation of the bot. Cheap to share behind an `Arc`.
pub struct ConversationEngine {
    bot: Arc<dyn Bot>,
    store: Arc<dyn PracticeStore>,
    sessions: Arc<dyn SessionStore>,
    locks: ChatLocks,
    notifier: Notifier,
    config: PracticeConfig,
}

impl ConversationEngine {
    pub fn new(
        bot: Arc<dyn Bot>,
        store: Arc<dyn PracticeStore>,
        sessions: Arc<dyn SessionStore>,
        config: PracticeConfig,
    ) -> Self {
        let notifier = Notifier::new(bot.clone());
        Self {
            bot,
            store,
            sessions,
            locks: ChatLocks::new(),
            notifier,
            config,
        }
    }

    fn is_admin(&self, chat_id: i64) -> bool {
        self.config.is_admin(chat_id)
    }

    /// Sends a reply. Delivery failures are logged and swallowed: the conversation state has
    /// already moved on and a retry would duplicate it.
    async fn reply(&self, chat_id: i64, message: OutgoingMessage) -> Result<Option<String>> {
        match self.bot.send(chat_id, &message).await {
            Ok(message_id) => Ok(Some(message_id)),
            Err(e) if e.is_blocked() => {
                debug!(chat_id, error = %e, "Reply not delivered, chat unreachable");
                Ok(None)
            }
            Err(BotError::Transport(e)) => {
                warn!(chat_id, error = %e, "Reply not delivered");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn say(&self, chat_id: i64, text: &str) -> Result<()> {
        self.reply(chat_id, OutgoingMessage::plain(text)).await?;
        Ok(())
    }

    /// Plain text with the main menu under it.
    async fn say_with_menu(&self, chat_id: i64, text: &str) -> Result<()> {
        let message =
            OutgoingMessage::plain(text).with_keyboard(menu::main_menu(self.is_admin(chat_id)));
        self.reply(chat_id, message).await?;
        Ok(())
    }

    /// Hides the main menu while a flow collects free text.
    async fn begin_flow(&self, chat_id: i64, text: &str) -> Result<()> {
        self.reply(chat_id, OutgoingMessage::plain(text).with_keyboard(Keyboard::Remove))
            .await?;
        Ok(())
    }

    /// Best effort: a keyboard that cannot be removed is only cosmetic.
    async fn remove_buttons(&self, chat_id: i64, message_id: Option<&str>) {
        if let Some(message_id) = message_id {
            if let Err(e) = self.bot.remove_keyboard(chat_id, message_id).await {
                debug!(chat_id, message_id, error = %e, "Could not remove inline keyboard");
            }
        }
    }

    async fn typing(&self, chat_id: i64) {
        if let Err(e) = self.bot.send_typing(chat_id).await {
            debug!(chat_id, error = %e, "Typing indicator failed");
        }
    }

    async fn account(&self, chat_id: i64) -> Result<Option<Account>> {
        Ok(self.store.find_account_by_chat_id(chat_id).await?)
    }

    async fn set_session(&self, chat_id: i64, session: Session) {
        debug!(chat_id, state = %session.describe(), "Session updated");
        self.sessions.set(chat_id, session).await;
    }

    async fn clear_session(&self, chat_id: i64) {
        if self.sessions.delete(chat_id).await {
            debug!(chat_id, "Session cleared");
        }
    }

    fn stale(&self, chat_id: i64, action: &CallbackAction) -> HandlerResponse {
        debug!(chat_id, action = %action.encode(), "Stale button ignored");
        HandlerResponse::Ignore
    }

    async fn dispatch(&self, event: &Event) -> Result<HandlerResponse> {
        match &event.kind {
            EventKind::Command(command) => self.on_command(event, *command).await,
            EventKind::Text(text) => self.on_text(event, text).await,
            EventKind::Callback { action, message_id } => {
                self.on_callback(event, action, message_id.as_deref()).await
            }
        }
    }

    async fn on_command(&self, event: &Event, command: Command) -> Result<HandlerResponse> {
        let chat_id = event.chat_id();
        info!(chat_id, command = ?command, "Command received");
        if command.is_admin_only() && !self.is_admin(chat_id) {
            self.say(chat_id, ADMIN_ONLY).await?;
            return Ok(HandlerResponse::Stop);
        }
        match command {
            Command::Start => {
                self.clear_session(chat_id).await;
                self.show_welcome(event).await?
            }
            Command::Register => self.start_registration(event).await?,
            Command::Status => self.show_status(chat_id).await?,
            Command::Edit => self.start_edit(chat_id).await?,
            Command::Tasks => self.show_tasks(chat_id).await?,
            Command::Notifications => self.show_notifications(chat_id).await?,
            Command::Info => self.say_with_menu(chat_id, INFO).await?,
            Command::Contacts => self.show_contacts(chat_id).await?,
            Command::Help => self.show_help(chat_id).await?,
            Command::Cancel => self.cancel(chat_id).await?,
            Command::Pending => self.show_pending(chat_id).await?,
            Command::Stats => self.show_stats(chat_id).await?,
            Command::NewTask => self.start_task_creation(chat_id).await?,
        }
        Ok(HandlerResponse::Stop)
    }

    async fn on_text(&self, event: &Event, text: &str) -> Result<HandlerResponse> {
        let chat_id = event.chat_id();
        match self.sessions.get(chat_id).await {
            None => match menu::command_for_label(text) {
                Some(command) if !command.is_admin_only() || self.is_admin(chat_id) => {
                    self.on_command(event, command).await
                }
                _ => Ok(HandlerResponse::Ignore),
            },
            Some(Session::Registration(session)) => {
                self.registration_text(event, session, text).await
            }
            Some(Session::Edit(session)) => self.edit_text(chat_id, session, text).await,
            Some(Session::Submission(session)) => {
                self.submission_text(chat_id, session, text).await
            }
            Some(Session::Creation(session)) => self.creation_text(chat_id, session, text).await,
        }
    }

    async fn on_callback(
        &self,
        event: &Event,
        action: &CallbackAction,
        message_id: Option<&str>,
    ) -> Result<HandlerResponse> {
        let chat_id = event.chat_id();
        debug!(chat_id, action = %action.encode(), "Button pressed");
        let session = self.sessions.get(chat_id).await;

        if action.belongs_to_registration() {
            return match session {
                Some(Session::Registration(session)) => {
                    self.registration_callback(event, session, action, message_id)
                        .await
                }
                _ => Ok(self.stale(chat_id, action)),
            };
        }
        if action.belongs_to_edit() {
            return match session {
                Some(Session::Edit(session)) => {
                    self.edit_callback(chat_id, session, action, message_id).await
                }
                _ => Ok(self.stale(chat_id, action)),
            };
        }
        if action.belongs_to_task_creation() {
            return match session {
                Some(Session::Creation(session)) if self.is_admin(chat_id) => {
                    self.creation_callback(chat_id, session, action, message_id)
                        .await
                }
                _ => Ok(self.stale(chat_id, action)),
            };
        }

        match action {
            CallbackAction::SubmitTask(task_id) => self.start_submission(chat_id, task_id).await,
            CallbackAction::Approve(application_id) | CallbackAction::Reject(application_id)
                if !self.is_admin(chat_id) =>
            {
                warn!(chat_id, application_id = %application_id, "Moderation button pressed outside an admin chat");
                Ok(HandlerResponse::Ignore)
            }
            CallbackAction::Approve(application_id) => {
                self.approve(chat_id, application_id, message_id).await
            }
            CallbackAction::Reject(application_id) => {
                self.reject(chat_id, application_id, message_id).await
            }
            CallbackAction::Notifications(enabled) => {
                self.set_notifications(chat_id, *enabled, message_id).await
            }
            _ => Ok(self.stale(chat_id, action)),
        }
    }

    async fn show_welcome(&self, event: &Event) -> Result<()> {
        let name = event
            .user
            .first_name
            .clone()
            .unwrap_or_else(|| "студент".to_string());
        let mut text = format!(
            "Здравствуйте, {}! Я бот практики.\n\nЗдесь можно подать заявку, следить за её статусом, получать задания и сдавать решения.",
            name
        );
        if self.is_admin(event.chat_id()) {
            text.push_str("\n\nВам доступны функции администратора: заявки, статистика, задания.");
        }
        self.say_with_menu(event.chat_id(), &text).await
    }

    async fn show_help(&self, chat_id: i64) -> Result<()> {
        let mut text = Command::descriptions().to_string();
        text.push_str("\n\nКнопки меню дублируют основные команды. /cancel прерывает любое действие.");
        self.say_with_menu(chat_id, &text).await
    }

    async fn show_contacts(&self, chat_id: i64) -> Result<()> {
        let text = format!(
            "Поддержка: {}\nПолитика обработки персональных данных: {}",
            self.config.support_contact, self.config.privacy_policy_url
        );
        self.say_with_menu(chat_id, &text).await
    }

    async fn cancel(&self, chat_id: i64) -> Result<()> {
        let had_session = self.sessions.delete(chat_id).await;
        info!(chat_id, had_session, "Cancel requested");
        let text = if had_session { CANCELLED } else { NOTHING_TO_CANCEL };
        self.say_with_menu(chat_id, text).await
    }

    async fn show_status(&self, chat_id: i64) -> Result<()> {
        let Some(account) = self.account(chat_id).await? else {
            return self.say_with_menu(chat_id, NO_ACCOUNT).await;
        };
        let latest = self
            .store
            .find_applications_by_account(&account.id, &[], 1)
            .await?;
        let Some(app) = latest.first() else {
            return self.say_with_menu(chat_id, NO_ACCOUNT).await;
        };
        let today = chrono::Local::now().date_naive();
        let message = OutgoingMessage::markdown(format::status_view(app, today))
            .with_keyboard(menu::main_menu(self.is_admin(chat_id)));
        self.reply(chat_id, message).await?;
        Ok(())
    }

    async fn show_notifications(&self, chat_id: i64) -> Result<()> {
        let Some(account) = self.account(chat_id).await? else {
            return self.say_with_menu(chat_id, NO_ACCOUNT).await;
        };
        let message = OutgoingMessage::plain(notifications_text(account.notifications_enabled))
            .with_keyboard(menu::notifications(account.notifications_enabled));
        self.reply(chat_id, message).await?;
        Ok(())
    }

    async fn set_notifications(
        &self,
        chat_id: i64,
        enabled: bool,
        message_id: Option<&str>,
    ) -> Result<HandlerResponse> {
        let Some(account) = self.account(chat_id).await? else {
            return Ok(self.stale(chat_id, &CallbackAction::Notifications(enabled)));
        };
        self.store
            .set_notifications_enabled(&account.id, enabled)
            .await?;
        info!(chat_id, enabled, "Notification preference changed");

        let message = OutgoingMessage::plain(notifications_text(enabled))
            .with_keyboard(menu::notifications(enabled));
        let edited = match message_id {
            Some(message_id) => self.bot.edit(chat_id, message_id, &message).await.is_ok(),
            None => false,
        };
        if !edited {
            self.reply(chat_id, message).await?;
        }
        Ok(HandlerResponse::Stop)
    }

    /// Fail closed: drop the session and tell the user something went wrong.
    async fn fail_closed(&self, chat_id: i64, e: &BotError) {
        self.clear_session(chat_id).await;
        let text = match e {
            BotError::Storage(StorageError::AlreadyExists(field)) => {
                warn!(chat_id, field = %field, "Conflict while handling event");
                conflict_message(field).to_string()
            }
            BotError::Storage(StorageError::NotFound(what)) => {
                warn!(chat_id, what = %what, "Record missing while handling event");
                NOT_FOUND.to_string()
            }
            _ => {
                error!(chat_id, error = %e, "Event handling failed, session cleared");
                if self.config.is_development() {
                    format!("{}\n\nПодробности: {}", GENERIC_ERROR, e)
                } else {
                    GENERIC_ERROR.to_string()
                }
            }
        };
        if let Err(send_err) = self
            .bot
            .send(
                chat_id,
                &OutgoingMessage::plain(text).with_keyboard(menu::main_menu(self.is_admin(chat_id))),
            )
            .await
        {
            debug!(chat_id, error = %send_err, "Fallback message not delivered");
        }
    }
}

fn notifications_text(enabled: bool) -> String {
    if enabled {
        "🔔 Уведомления включены: напоминания о сроках и новых заданиях приходят в этот чат.".to_string()
    } else {
        "🔕 Уведомления выключены. Решения по заявкам и новые задания всё равно придут.".to_string()
    }
}

/// User-facing text for a violated uniqueness constraint.
pub fn conflict_message(field: &str) -> &'static str {
    if field.contains("telegram_id") {
        "Этот Telegram-аккаунт уже зарегистрирован. Проверьте статус командой /status."
    } else if field.contains("email") {
        "Пользователь с таким email уже зарегистрирован. Укажите другой email или обратитесь в поддержку."
    } else {
        "Такая запись уже существует."
    }
}

#[async_trait]
impl Handler for ConversationEngine {
    #[instrument(skip(self, event), fields(chat_id = event.chat.id, kind = event.kind_name()))]
    async fn handle(&self, event: &Event) -> Result<HandlerResponse> {
        let chat_id = event.chat_id();
        let _guard = self.locks.lock(chat_id).await;
        match self.dispatch(event).await {
            Ok(response) => Ok(response),
            Err(e) => {
                self.fail_closed(chat_id, &e).await;
                Ok(HandlerResponse::Stop)
            }
        }
    }
}
