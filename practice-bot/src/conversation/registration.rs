//! Registration flow: consent, personal data, practice details, confirmation, commit.

use std::collections::BTreeSet;
use storage::{
    ApplicationStatus, InstitutionType, NewAccount, NewApplication, PracticeType, StorageError,
};
use tracing::{info, instrument, warn};

use super::format::{self, application_status_label};
use super::menu;
use super::state::{RegistrationSession, RegistrationStep, Session};
use super::validation::{self, ValidationError};
use super::{conflict_message, ConversationEngine};
use crate::core::{CallbackAction, Event, HandlerError, HandlerResponse, OutgoingMessage, Result};

const CONSENT_DECLINED: &str =
    "Без согласия на обработку персональных данных подать заявку нельзя. Если передумаете, начните заново: /register.";
const REGISTRATION_CANCELLED: &str = "Регистрация отменена.";
const CONSENT_MISSING: &str =
    "Не получено согласие на обработку персональных данных. Начните заново: /register.";

impl ConversationEngine {
    /// Starts (or restarts) registration for the chat.
    pub(super) async fn start_registration(&self, event: &Event) -> Result<()> {
        let chat_id = event.chat_id();
        let mut text = format!(
            "Для подачи заявки нужно согласие на обработку персональных данных.\n\nПолитика: {}",
            self.config.privacy_policy_url
        );
        if let Some(account) = self.account(chat_id).await? {
            let open = self
                .store
                .find_applications_by_account(
                    &account.id,
                    &[ApplicationStatus::Pending, ApplicationStatus::Approved],
                    1,
                )
                .await?;
            if let Some(app) = open.first() {
                text.push_str(&format!(
                    "\n\nУ вас уже есть заявка ({}). Новая заявка заменит её вместе с историей. Чтобы изменить данные, используйте /edit.",
                    application_status_label(app.status)
                ));
            }
        }

        info!(chat_id, "Registration started");
        self.begin_flow(chat_id, "📝 Подача заявки на практику. Прервать можно командой /cancel.")
            .await?;
        self.set_session(chat_id, Session::Registration(RegistrationSession::new()))
            .await;
        self.reply(
            chat_id,
            OutgoingMessage::plain(text).with_keyboard(menu::privacy_consent()),
        )
        .await?;
        Ok(())
    }

    async fn prompt_registration(&self, chat_id: i64, session: &RegistrationSession) -> Result<()> {
        self.reply(chat_id, registration_prompt(session)).await?;
        Ok(())
    }

    async fn reprompt_registration(
        &self,
        chat_id: i64,
        session: &RegistrationSession,
        error: ValidationError,
    ) -> Result<HandlerResponse> {
        let mut message = registration_prompt(session);
        message.text = format!("{}\n\n{}", error, message.text);
        self.reply(chat_id, message).await?;
        Ok(HandlerResponse::Stop)
    }

    pub(super) async fn registration_text(
        &self,
        event: &Event,
        mut session: RegistrationSession,
        text: &str,
    ) -> Result<HandlerResponse> {
        let chat_id = event.chat_id();
        let next = match session.step {
            // Button-only steps.
            RegistrationStep::PrivacyConsent
            | RegistrationStep::InstitutionType
            | RegistrationStep::Confirming => return Ok(HandlerResponse::Ignore),
            RegistrationStep::LastName => match validation::validate_name(text) {
                Ok(value) => {
                    session.draft.last_name = Some(value);
                    RegistrationStep::FirstName
                }
                Err(e) => return self.reprompt_registration(chat_id, &session, e).await,
            },
            RegistrationStep::FirstName => match validation::validate_name(text) {
                Ok(value) => {
                    session.draft.first_name = Some(value);
                    RegistrationStep::MiddleName
                }
                Err(e) => return self.reprompt_registration(chat_id, &session, e).await,
            },
            RegistrationStep::MiddleName => {
                session.draft.middle_name = validation::parse_middle_name(text);
                RegistrationStep::PracticeType
            }
            RegistrationStep::PracticeType => match validation::parse_practice_type(text) {
                Ok(value) => {
                    session.draft.practice_type = Some(value);
                    RegistrationStep::InstitutionType
                }
                Err(e) => return self.reprompt_registration(chat_id, &session, e).await,
            },
            RegistrationStep::InstitutionName => {
                match validation::validate_institution_name(text) {
                    Ok(value) => {
                        session.draft.institution_name = Some(value);
                        RegistrationStep::Course
                    }
                    Err(e) => return self.reprompt_registration(chat_id, &session, e).await,
                }
            }
            RegistrationStep::Course => match validation::parse_course(text) {
                Ok(value) => {
                    session.draft.course = Some(value);
                    RegistrationStep::Email
                }
                Err(e) => return self.reprompt_registration(chat_id, &session, e).await,
            },
            RegistrationStep::Email => match validation::parse_email(text) {
                Ok(value) => {
                    session.draft.email = value;
                    RegistrationStep::Phone
                }
                Err(e) => return self.reprompt_registration(chat_id, &session, e).await,
            },
            RegistrationStep::Phone => {
                session.draft.phone = validation::parse_phone(text);
                RegistrationStep::StartDate
            }
            RegistrationStep::StartDate => match validation::parse_date(text) {
                Ok(value) => {
                    session.draft.start_date = Some(value);
                    RegistrationStep::EndDate
                }
                Err(e) => return self.reprompt_registration(chat_id, &session, e).await,
            },
            RegistrationStep::EndDate => {
                let Some(start) = session.draft.start_date else {
                    return Err(HandlerError::IncompleteDraft("start_date").into());
                };
                match validation::parse_end_date(text, start) {
                    Ok(value) => {
                        session.draft.end_date = Some(value);
                        RegistrationStep::Confirming
                    }
                    Err(e) => return self.reprompt_registration(chat_id, &session, e).await,
                }
            }
        };

        session.step = next;
        self.set_session(chat_id, Session::Registration(session.clone()))
            .await;
        self.prompt_registration(chat_id, &session).await?;
        Ok(HandlerResponse::Stop)
    }

    pub(super) async fn registration_callback(
        &self,
        event: &Event,
        mut session: RegistrationSession,
        action: &CallbackAction,
        message_id: Option<&str>,
    ) -> Result<HandlerResponse> {
        let chat_id = event.chat_id();
        match (action, session.step) {
            (CallbackAction::PrivacyAccept, RegistrationStep::PrivacyConsent) => {
                session.draft.privacy_accepted = true;
                session.step = RegistrationStep::LastName;
            }
            (CallbackAction::PrivacyDecline, RegistrationStep::PrivacyConsent) => {
                self.remove_buttons(chat_id, message_id).await;
                self.clear_session(chat_id).await;
                info!(chat_id, "Privacy consent declined");
                self.say_with_menu(chat_id, CONSENT_DECLINED).await?;
                return Ok(HandlerResponse::Stop);
            }
            (CallbackAction::RegistrationPracticeType(t), RegistrationStep::PracticeType) => {
                session.draft.practice_type = Some(*t);
                session.step = RegistrationStep::InstitutionType;
            }
            (CallbackAction::RegistrationInstitutionType(t), RegistrationStep::InstitutionType) => {
                session.draft.institution_type = Some(*t);
                session.step = RegistrationStep::InstitutionName;
            }
            (CallbackAction::ConfirmRegistration, RegistrationStep::Confirming) => {
                self.remove_buttons(chat_id, message_id).await;
                return self.confirm_registration(event, session).await;
            }
            (CallbackAction::CancelRegistration, _) => {
                self.remove_buttons(chat_id, message_id).await;
                self.clear_session(chat_id).await;
                self.say_with_menu(chat_id, REGISTRATION_CANCELLED).await?;
                return Ok(HandlerResponse::Stop);
            }
            _ => return Ok(self.stale(chat_id, action)),
        }

        self.remove_buttons(chat_id, message_id).await;
        self.set_session(chat_id, Session::Registration(session.clone()))
            .await;
        self.prompt_registration(chat_id, &session).await?;
        Ok(HandlerResponse::Stop)
    }

    /// Commits the draft: removes earlier accounts of the same person, stores the account and a
    /// `PENDING` application, then asks every administrator to moderate it.
    #[instrument(skip(self, event, session), fields(chat_id = event.chat.id))]
    async fn confirm_registration(
        &self,
        event: &Event,
        session: RegistrationSession,
    ) -> Result<HandlerResponse> {
        let chat_id = event.chat_id();
        let draft = session.draft;
        if !draft.privacy_accepted {
            self.clear_session(chat_id).await;
            self.say_with_menu(chat_id, CONSENT_MISSING).await?;
            return Ok(HandlerResponse::Stop);
        }
        let last_name = draft
            .last_name
            .ok_or(HandlerError::IncompleteDraft("last_name"))?;
        let first_name = draft
            .first_name
            .ok_or(HandlerError::IncompleteDraft("first_name"))?;
        let institution_name = draft
            .institution_name
            .ok_or(HandlerError::IncompleteDraft("institution_name"))?;
        let course = draft.course.ok_or(HandlerError::IncompleteDraft("course"))?;
        let start_date = draft
            .start_date
            .ok_or(HandlerError::IncompleteDraft("start_date"))?;
        let end_date = draft
            .end_date
            .ok_or(HandlerError::IncompleteDraft("end_date"))?;
        let practice_type = draft.practice_type.unwrap_or(PracticeType::Educational);
        let institution_type = draft.institution_type.unwrap_or(InstitutionType::University);

        self.typing(chat_id).await;

        let email = draft
            .email
            .clone()
            .unwrap_or_else(|| placeholder_email(chat_id));
        let username = event
            .user
            .username
            .clone()
            .unwrap_or_else(|| format!("tg_{}", chat_id));

        let removed = self.remove_previous_accounts(chat_id, &email, &username).await?;
        if removed > 0 {
            info!(chat_id, removed, "Previous accounts removed before re-registration");
        }

        let account = match self
            .store
            .create_account(NewAccount {
                telegram_id: chat_id,
                email,
                username,
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                middle_name: draft.middle_name.clone(),
            })
            .await
        {
            Ok(account) => account,
            Err(StorageError::AlreadyExists(field)) => {
                return self.registration_conflict(chat_id, &field).await;
            }
            Err(e) => return Err(e.into()),
        };

        let app = match self
            .store
            .create_application(NewApplication {
                account_id: account.id.clone(),
                last_name,
                first_name,
                middle_name: draft.middle_name,
                practice_type,
                institution_type,
                institution_name,
                course,
                email: draft.email,
                phone: draft.phone,
                start_date,
                end_date,
            })
            .await
        {
            Ok(app) => app,
            Err(StorageError::AlreadyExists(field)) => {
                return self.registration_conflict(chat_id, &field).await;
            }
            Err(e) => return Err(e.into()),
        };

        self.clear_session(chat_id).await;
        info!(chat_id, application_id = %app.id, "Application submitted");

        let message = OutgoingMessage::markdown(format::registration_success(&app))
            .with_keyboard(menu::main_menu(self.is_admin(chat_id)));
        self.reply(chat_id, message).await?;
        self.notify_admins(&app, false).await;
        Ok(HandlerResponse::Stop)
    }

    /// Deletes accounts sharing this chat id, email or username. Returns how many were removed.
    async fn remove_previous_accounts(
        &self,
        chat_id: i64,
        email: &str,
        username: &str,
    ) -> Result<usize> {
        let mut ids = BTreeSet::new();
        if let Some(account) = self.store.find_account_by_chat_id(chat_id).await? {
            ids.insert(account.id);
        }
        if let Some(account) = self.store.find_account_by_email(email).await? {
            ids.insert(account.id);
        }
        for account in self.store.find_accounts_by_username(username).await? {
            ids.insert(account.id);
        }

        let mut removed = 0;
        for id in ids {
            if self.store.delete_account(&id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn registration_conflict(&self, chat_id: i64, field: &str) -> Result<HandlerResponse> {
        warn!(chat_id, field, "Registration conflict");
        self.clear_session(chat_id).await;
        self.say_with_menu(chat_id, conflict_message(field)).await?;
        Ok(HandlerResponse::Stop)
    }
}

/// Accounts need a unique email; chats that skipped it get one derived from the chat id.
fn placeholder_email(chat_id: i64) -> String {
    format!("tg_{}@telegram.local", chat_id)
}

/// Question (and keyboard) for the session's current step.
fn registration_prompt(session: &RegistrationSession) -> OutgoingMessage {
    let cancel = menu::cancel_registration();
    match session.step {
        RegistrationStep::PrivacyConsent => {
            OutgoingMessage::plain("Подтвердите согласие на обработку персональных данных.")
                .with_keyboard(menu::privacy_consent())
        }
        RegistrationStep::LastName => {
            OutgoingMessage::plain("Введите фамилию:").with_keyboard(cancel)
        }
        RegistrationStep::FirstName => OutgoingMessage::plain("Введите имя:").with_keyboard(cancel),
        RegistrationStep::MiddleName => {
            OutgoingMessage::plain("Введите отчество (или «-», если его нет):").with_keyboard(cancel)
        }
        RegistrationStep::PracticeType => OutgoingMessage::plain(
            "Выберите тип практики:\n1. Учебная\n2. Производственная\n3. Преддипломная",
        )
        .with_keyboard(menu::practice_types(false)),
        RegistrationStep::InstitutionType => {
            OutgoingMessage::plain("Выберите тип учебного заведения:")
                .with_keyboard(menu::institution_types(false))
        }
        RegistrationStep::InstitutionName => {
            OutgoingMessage::plain("Введите название учебного заведения:").with_keyboard(cancel)
        }
        RegistrationStep::Course => {
            OutgoingMessage::plain("Введите номер курса (от 1 до 10):").with_keyboard(cancel)
        }
        RegistrationStep::Email => {
            OutgoingMessage::plain("Введите email (или «-», чтобы пропустить):").with_keyboard(cancel)
        }
        RegistrationStep::Phone => OutgoingMessage::plain(
            "Введите номер телефона (или «-», чтобы пропустить):",
        )
        .with_keyboard(cancel),
        RegistrationStep::StartDate => OutgoingMessage::plain(
            "Введите дату начала практики в формате ДД.ММ.ГГГГ:",
        )
        .with_keyboard(cancel),
        RegistrationStep::EndDate => OutgoingMessage::plain(
            "Введите дату окончания практики в формате ДД.ММ.ГГГГ:",
        )
        .with_keyboard(cancel),
        RegistrationStep::Confirming => {
            OutgoingMessage::plain(format::registration_summary(&session.draft))
                .with_keyboard(menu::confirm_registration())
        }
    }
}

