//! Edit flow: pick a field of the current application, enter the new value, save.
//!
//! Editing an approved application sends it back to moderation.

use chrono::{Local, NaiveDate};
use storage::{Application, ApplicationStatus, InstitutionType, PracticeType};
use tracing::{info, warn};

use super::format;
use super::menu;
use super::state::{EditSession, EditStep, Session};
use super::validation::{self, ValidationError};
use super::{ConversationEngine, NO_ACCOUNT, NOT_FOUND};
use crate::core::{CallbackAction, EditField, HandlerResponse, OutgoingMessage, Result};

/// Prefix of the note appended when an approved application is edited.
pub const AUDIT_MARKER: &str = "[повторное рассмотрение]";

const NOTHING_TO_EDIT: &str =
    "Нет заявки, которую можно изменить. Подать новую заявку: /register.";
const EDIT_CANCELLED: &str = "Редактирование отменено.";
const STATUS_CHANGED: &str =
    "Пока вы редактировали, заявку рассмотрел администратор. Изменения не сохранены, проверьте /status и повторите /edit.";
const APPLICATION_CLOSED: &str =
    "Заявка уже отклонена, изменить её нельзя. Подать новую заявку: /register.";

/// A validated new value for one field.
#[derive(Debug, Clone, PartialEq)]
enum FieldChange {
    LastName(String),
    FirstName(String),
    MiddleName(Option<String>),
    PracticeType(PracticeType),
    InstitutionType(InstitutionType),
    InstitutionName(String),
    Course(i64),
    Email(Option<String>),
    Phone(Option<String>),
    Dates { start: NaiveDate, end: NaiveDate },
}

impl FieldChange {
    fn field(&self) -> EditField {
        match self {
            FieldChange::LastName(_) => EditField::LastName,
            FieldChange::FirstName(_) => EditField::FirstName,
            FieldChange::MiddleName(_) => EditField::MiddleName,
            FieldChange::PracticeType(_) => EditField::PracticeType,
            FieldChange::InstitutionType(_) => EditField::InstitutionType,
            FieldChange::InstitutionName(_) => EditField::InstitutionName,
            FieldChange::Course(_) => EditField::Course,
            FieldChange::Email(_) => EditField::Email,
            FieldChange::Phone(_) => EditField::Phone,
            FieldChange::Dates { .. } => EditField::Dates,
        }
    }

    fn apply(self, app: &mut Application) {
        match self {
            FieldChange::LastName(v) => app.last_name = v,
            FieldChange::FirstName(v) => app.first_name = v,
            FieldChange::MiddleName(v) => app.middle_name = v,
            FieldChange::PracticeType(v) => app.practice_type = v,
            FieldChange::InstitutionType(v) => app.institution_type = v,
            FieldChange::InstitutionName(v) => app.institution_name = v,
            FieldChange::Course(v) => app.course = v,
            FieldChange::Email(v) => app.email = v,
            FieldChange::Phone(v) => app.phone = v,
            FieldChange::Dates { start, end } => {
                app.start_date = start;
                app.end_date = end;
            }
        }
    }
}

/// Question for the value of `field`. For dates this asks for the start date.
fn value_prompt(field: EditField) -> OutgoingMessage {
    let text = match field {
        EditField::LastName => "Введите новую фамилию:",
        EditField::FirstName => "Введите новое имя:",
        EditField::MiddleName => "Введите новое отчество (или «-», если его нет):",
        EditField::PracticeType => {
            return OutgoingMessage::plain("Выберите тип практики:")
                .with_keyboard(menu::practice_types(true))
        }
        EditField::InstitutionType => {
            return OutgoingMessage::plain("Выберите тип учебного заведения:")
                .with_keyboard(menu::institution_types(true))
        }
        EditField::InstitutionName => "Введите название учебного заведения:",
        EditField::Course => "Введите номер курса (от 1 до 10):",
        EditField::Email => "Введите email (или «-», чтобы удалить):",
        EditField::Phone => "Введите телефон (или «-», чтобы удалить):",
        EditField::Dates => "Введите новую дату начала практики (ДД.ММ.ГГГГ):",
    };
    OutgoingMessage::plain(text).with_keyboard(menu::cancel_edit())
}

fn end_date_prompt(start: NaiveDate) -> OutgoingMessage {
    OutgoingMessage::plain(format!(
        "Дата начала: {}. Теперь введите дату окончания (ДД.ММ.ГГГГ):",
        validation::format_date(start)
    ))
    .with_keyboard(menu::cancel_edit())
}

impl ConversationEngine {
    pub(super) async fn start_edit(&self, chat_id: i64) -> Result<()> {
        let Some(account) = self.account(chat_id).await? else {
            return self.say_with_menu(chat_id, NO_ACCOUNT).await;
        };
        let open = self
            .store
            .find_applications_by_account(
                &account.id,
                &[ApplicationStatus::Pending, ApplicationStatus::Approved],
                1,
            )
            .await?;
        let Some(app) = open.into_iter().next() else {
            return self.say_with_menu(chat_id, NOTHING_TO_EDIT).await;
        };

        info!(chat_id, application_id = %app.id, "Edit started");
        self.begin_flow(chat_id, "✏️ Редактирование заявки. Прервать можно командой /cancel.")
            .await?;
        self.set_session(
            chat_id,
            Session::Edit(EditSession {
                application_id: app.id.clone(),
                step: EditStep::WaitingField,
            }),
        )
        .await;
        let mut text = format::application_summary(&app);
        if app.status == ApplicationStatus::Approved {
            text.push_str("\n\nЗаявка одобрена: после изменения она снова уйдёт на рассмотрение.");
        }
        text.push_str("\n\nЧто изменить?");
        self.reply(
            chat_id,
            OutgoingMessage::plain(text).with_keyboard(menu::edit_fields()),
        )
        .await?;
        Ok(())
    }

    pub(super) async fn edit_callback(
        &self,
        chat_id: i64,
        mut session: EditSession,
        action: &CallbackAction,
        message_id: Option<&str>,
    ) -> Result<HandlerResponse> {
        let change = match (action, session.step) {
            (CallbackAction::EditField(field), EditStep::WaitingField) => {
                self.remove_buttons(chat_id, message_id).await;
                session.step = EditStep::WaitingValue(*field);
                self.set_session(chat_id, Session::Edit(session)).await;
                self.reply(chat_id, value_prompt(*field)).await?;
                return Ok(HandlerResponse::Stop);
            }
            (
                CallbackAction::EditPracticeType(t),
                EditStep::WaitingValue(EditField::PracticeType),
            ) => FieldChange::PracticeType(*t),
            (
                CallbackAction::EditInstitutionType(t),
                EditStep::WaitingValue(EditField::InstitutionType),
            ) => FieldChange::InstitutionType(*t),
            (CallbackAction::CancelEdit, _) => {
                self.remove_buttons(chat_id, message_id).await;
                self.clear_session(chat_id).await;
                self.say_with_menu(chat_id, EDIT_CANCELLED).await?;
                return Ok(HandlerResponse::Stop);
            }
            _ => return Ok(self.stale(chat_id, action)),
        };
        self.remove_buttons(chat_id, message_id).await;
        self.apply_edit(chat_id, &session, change).await
    }

    pub(super) async fn edit_text(
        &self,
        chat_id: i64,
        mut session: EditSession,
        text: &str,
    ) -> Result<HandlerResponse> {
        let field = match session.step {
            EditStep::WaitingField => return Ok(HandlerResponse::Ignore),
            EditStep::WaitingEndDate { start } => {
                return match validation::parse_end_date(text, start) {
                    Ok(end) => {
                        self.apply_edit(chat_id, &session, FieldChange::Dates { start, end })
                            .await
                    }
                    Err(e) => self.reprompt_edit(chat_id, end_date_prompt(start), e).await,
                };
            }
            EditStep::WaitingValue(field) => field,
        };

        let parsed = match field {
            EditField::LastName => validation::validate_name(text).map(FieldChange::LastName),
            EditField::FirstName => validation::validate_name(text).map(FieldChange::FirstName),
            EditField::MiddleName => Ok(FieldChange::MiddleName(validation::parse_middle_name(
                text,
            ))),
            EditField::PracticeType => {
                validation::parse_practice_type(text).map(FieldChange::PracticeType)
            }
            EditField::InstitutionType => return Ok(HandlerResponse::Ignore),
            EditField::InstitutionName => {
                validation::validate_institution_name(text).map(FieldChange::InstitutionName)
            }
            EditField::Course => validation::parse_course(text).map(FieldChange::Course),
            EditField::Email => validation::parse_email(text).map(FieldChange::Email),
            EditField::Phone => Ok(FieldChange::Phone(validation::parse_phone(text))),
            EditField::Dates => match validation::parse_date(text) {
                Ok(start) => {
                    session.step = EditStep::WaitingEndDate { start };
                    self.set_session(chat_id, Session::Edit(session)).await;
                    self.reply(chat_id, end_date_prompt(start)).await?;
                    return Ok(HandlerResponse::Stop);
                }
                Err(e) => Err(e),
            },
        };

        match parsed {
            Ok(change) => self.apply_edit(chat_id, &session, change).await,
            Err(e) => self.reprompt_edit(chat_id, value_prompt(field), e).await,
        }
    }

    async fn reprompt_edit(
        &self,
        chat_id: i64,
        mut prompt: OutgoingMessage,
        error: ValidationError,
    ) -> Result<HandlerResponse> {
        prompt.text = format!("{}\n\n{}", error, prompt.text);
        self.reply(chat_id, prompt).await?;
        Ok(HandlerResponse::Stop)
    }

    /// Saves one field. An approved application goes back to `PENDING` with an audit note and
    /// is offered to the administrators again.
    async fn apply_edit(
        &self,
        chat_id: i64,
        session: &EditSession,
        change: FieldChange,
    ) -> Result<HandlerResponse> {
        let account = self.account(chat_id).await?;
        let app = self.store.find_application(&session.application_id).await?;
        let mut app = match (account, app) {
            (Some(account), Some(app)) if app.account_id == account.id => app,
            _ => {
                self.clear_session(chat_id).await;
                self.say_with_menu(chat_id, NOT_FOUND).await?;
                return Ok(HandlerResponse::Stop);
            }
        };
        if app.status == ApplicationStatus::Rejected {
            self.clear_session(chat_id).await;
            self.say_with_menu(chat_id, APPLICATION_CLOSED).await?;
            return Ok(HandlerResponse::Stop);
        }

        let field = change.field();
        let read_status = app.status;
        change.apply(&mut app);
        let resubmitted = app.status == ApplicationStatus::Approved;
        if resubmitted {
            app.status = ApplicationStatus::Pending;
            app.append_note(&format!(
                "{} {}: изменено поле «{}» после одобрения",
                AUDIT_MARKER,
                Local::now().format("%d.%m.%Y %H:%M"),
                field.label()
            ));
        }
        let saved = self
            .store
            .update_application_if_status(&app, read_status)
            .await?;
        self.clear_session(chat_id).await;
        if !saved {
            warn!(chat_id, application_id = %app.id, "Edit lost a race with moderation");
            self.say_with_menu(chat_id, STATUS_CHANGED).await?;
            return Ok(HandlerResponse::Stop);
        }
        info!(
            chat_id,
            application_id = %app.id,
            field = field.code(),
            resubmitted,
            "Application edited"
        );

        let mut text = format!(
            "✅ Изменения сохранены.\n\n{}",
            format::application_summary(&app)
        );
        if resubmitted {
            text.push_str("\n\nЗаявка была одобрена, поэтому отправлена на повторное рассмотрение.");
        }
        self.say_with_menu(chat_id, &text).await?;
        if resubmitted {
            self.notify_admins(&app, true).await;
        }
        Ok(HandlerResponse::Stop)
    }
}
