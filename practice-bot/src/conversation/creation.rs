//! Task creation by an administrator: student, title, description, deadline, materials,
//! confirmation.

use chrono::{Local, Utc};
use storage::{NewTask, Student};
use tracing::{info, warn};

use super::format;
use super::menu;
use super::state::{CreationSession, CreationStep, Session};
use super::validation::{self, ValidationError};
use super::ConversationEngine;
use crate::core::{
    CallbackAction, HandlerError, HandlerResponse, InlineButton, Keyboard, OutgoingMessage, Result,
};

/// Buttons offered when picking a student.
const MAX_STUDENT_CHOICES: usize = 30;

const NO_STUDENTS: &str = "Нет студентов с активной практикой.";
const STUDENT_NOT_FOUND: &str = "Студент не найден. Выберите его кнопкой или отправьте часть ФИО.";
const CREATION_CANCELLED: &str = "Создание задания отменено.";

fn creation_prompt(session: &CreationSession) -> OutgoingMessage {
    let cancel = Keyboard::Inline(vec![vec![InlineButton::new(
        "❌ Отмена",
        CallbackAction::CancelNewTask,
    )]]);
    match session.step {
        CreationStep::WaitingStudent => {
            OutgoingMessage::plain("Выберите студента кнопкой или отправьте часть ФИО:")
        }
        CreationStep::WaitingTitle => OutgoingMessage::plain(format!(
            "Студент: {}\n\nВведите название задания:",
            session.draft.student_name.as_deref().unwrap_or("—")
        ))
        .with_keyboard(cancel),
        CreationStep::WaitingDescription => {
            OutgoingMessage::plain("Введите описание задания (или «-», чтобы пропустить):")
                .with_keyboard(cancel)
        }
        CreationStep::WaitingDeadline => OutgoingMessage::plain(
            "Введите срок сдачи: ДД.ММ.ГГГГ или ДД.ММ.ГГГГ ЧЧ:ММ (без времени — до 23:59):",
        )
        .with_keyboard(cancel),
        CreationStep::WaitingReferenceLink => OutgoingMessage::plain(
            "Отправьте ссылку на материалы (или «-», чтобы пропустить):",
        )
        .with_keyboard(cancel),
        CreationStep::Confirming => {
            OutgoingMessage::plain(format::task_draft_summary(&session.draft))
                .with_keyboard(menu::confirm_task())
        }
    }
}

fn student_choices(students: &[Student]) -> Vec<(String, String)> {
    students
        .iter()
        .take(MAX_STUDENT_CHOICES)
        .map(|s| (s.id.clone(), s.full_name()))
        .collect()
}

impl ConversationEngine {
    async fn active_students(&self) -> Result<Vec<Student>> {
        let today = Local::now().date_naive();
        Ok(self
            .store
            .find_active_students(today)
            .await?
            .into_iter()
            .map(|contact| contact.student)
            .collect())
    }

    pub(super) async fn start_task_creation(&self, chat_id: i64) -> Result<()> {
        let students = self.active_students().await?;
        if students.is_empty() {
            return self.say_with_menu(chat_id, NO_STUDENTS).await;
        }
        info!(chat_id, candidates = students.len(), "Task creation started");
        self.begin_flow(chat_id, "➕ Новое задание. Прервать можно командой /cancel.")
            .await?;
        let session = CreationSession::new();
        self.set_session(chat_id, Session::Creation(session.clone()))
            .await;
        let prompt = creation_prompt(&session)
            .with_keyboard(menu::students(&student_choices(&students)));
        self.reply(chat_id, prompt).await?;
        Ok(())
    }

    async fn reprompt_creation(
        &self,
        chat_id: i64,
        session: &CreationSession,
        error: ValidationError,
    ) -> Result<HandlerResponse> {
        let mut prompt = creation_prompt(session);
        prompt.text = format!("{}\n\n{}", error, prompt.text);
        self.reply(chat_id, prompt).await?;
        Ok(HandlerResponse::Stop)
    }

    async fn advance_creation(&self, chat_id: i64, session: CreationSession) -> Result<HandlerResponse> {
        self.set_session(chat_id, Session::Creation(session.clone()))
            .await;
        self.reply(chat_id, creation_prompt(&session)).await?;
        Ok(HandlerResponse::Stop)
    }

    async fn select_student(
        &self,
        chat_id: i64,
        mut session: CreationSession,
        student: &Student,
    ) -> Result<HandlerResponse> {
        session.draft.student_id = Some(student.id.clone());
        session.draft.student_name = Some(student.full_name());
        session.step = CreationStep::WaitingTitle;
        self.advance_creation(chat_id, session).await
    }

    pub(super) async fn creation_text(
        &self,
        chat_id: i64,
        mut session: CreationSession,
        text: &str,
    ) -> Result<HandlerResponse> {
        match session.step {
            CreationStep::WaitingStudent => {
                let query = text.trim().to_lowercase();
                let matches: Vec<Student> = self
                    .active_students()
                    .await?
                    .into_iter()
                    .filter(|s| !query.is_empty() && s.full_name().to_lowercase().contains(&query))
                    .collect();
                match matches.as_slice() {
                    [] => {
                        self.say(chat_id, STUDENT_NOT_FOUND).await?;
                        Ok(HandlerResponse::Stop)
                    }
                    [student] => self.select_student(chat_id, session, student).await,
                    several => {
                        let prompt = OutgoingMessage::plain(format!(
                            "Найдено студентов: {}. Выберите нужного:",
                            several.len()
                        ))
                        .with_keyboard(menu::students(&student_choices(several)));
                        self.reply(chat_id, prompt).await?;
                        Ok(HandlerResponse::Stop)
                    }
                }
            }
            CreationStep::WaitingTitle => match validation::validate_title(text) {
                Ok(title) => {
                    session.draft.title = Some(title);
                    session.step = CreationStep::WaitingDescription;
                    self.advance_creation(chat_id, session).await
                }
                Err(e) => self.reprompt_creation(chat_id, &session, e).await,
            },
            CreationStep::WaitingDescription => {
                let trimmed = text.trim();
                session.draft.description =
                    (trimmed != validation::SKIP && !trimmed.is_empty()).then(|| trimmed.to_string());
                session.step = CreationStep::WaitingDeadline;
                self.advance_creation(chat_id, session).await
            }
            CreationStep::WaitingDeadline => match validation::parse_deadline(text, Utc::now()) {
                Ok(deadline) => {
                    session.draft.deadline = Some(deadline);
                    session.step = CreationStep::WaitingReferenceLink;
                    self.advance_creation(chat_id, session).await
                }
                Err(e) => self.reprompt_creation(chat_id, &session, e).await,
            },
            CreationStep::WaitingReferenceLink => match validation::parse_reference_link(text) {
                Ok(link) => {
                    session.draft.reference_link = link;
                    session.step = CreationStep::Confirming;
                    self.advance_creation(chat_id, session).await
                }
                Err(e) => self.reprompt_creation(chat_id, &session, e).await,
            },
            CreationStep::Confirming => Ok(HandlerResponse::Ignore),
        }
    }

    pub(super) async fn creation_callback(
        &self,
        chat_id: i64,
        session: CreationSession,
        action: &CallbackAction,
        message_id: Option<&str>,
    ) -> Result<HandlerResponse> {
        match (action, session.step) {
            (CallbackAction::NewTaskStudent(student_id), CreationStep::WaitingStudent) => {
                match self.store.find_student(student_id).await? {
                    Some(details) if details.student.is_active => {
                        self.remove_buttons(chat_id, message_id).await;
                        self.select_student(chat_id, session, &details.student).await
                    }
                    _ => {
                        self.say(chat_id, STUDENT_NOT_FOUND).await?;
                        Ok(HandlerResponse::Stop)
                    }
                }
            }
            (CallbackAction::ConfirmNewTask, CreationStep::Confirming) => {
                self.remove_buttons(chat_id, message_id).await;
                self.commit_task(chat_id, session).await
            }
            (CallbackAction::CancelNewTask, _) => {
                self.remove_buttons(chat_id, message_id).await;
                self.clear_session(chat_id).await;
                self.say_with_menu(chat_id, CREATION_CANCELLED).await?;
                Ok(HandlerResponse::Stop)
            }
            _ => Ok(self.stale(chat_id, action)),
        }
    }

    /// Stores the task and tells the student about it.
    async fn commit_task(&self, chat_id: i64, session: CreationSession) -> Result<HandlerResponse> {
        let draft = session.draft;
        let student_id = draft
            .student_id
            .ok_or(HandlerError::IncompleteDraft("student_id"))?;
        let title = draft.title.ok_or(HandlerError::IncompleteDraft("title"))?;
        let deadline = draft
            .deadline
            .ok_or(HandlerError::IncompleteDraft("deadline"))?;

        let task = self
            .store
            .create_task(NewTask {
                student_id: student_id.clone(),
                title,
                description: draft.description,
                deadline,
                reference_link: draft.reference_link,
                allow_late_submission: None,
                created_by: Some(chat_id),
            })
            .await?;
        self.clear_session(chat_id).await;
        info!(chat_id, task_id = %task.id, student_id = %student_id, "Task created");

        let student_chat = self
            .store
            .find_account_by_student(&student_id)
            .await?
            .and_then(|account| account.telegram_id);
        let delivered = match student_chat {
            Some(student_chat) => {
                let notice = OutgoingMessage::markdown(format::new_task_notice(&task))
                    .with_keyboard(menu::submit_buttons(&[&task]));
                self.notifier.notify(student_chat, &notice).await.is_ok()
            }
            None => {
                warn!(student_id = %student_id, "Student has no chat to notify about the task");
                false
            }
        };

        let mut text = format!(
            "✅ Задание «{}» создано для {}.",
            task.title,
            draft.student_name.as_deref().unwrap_or("студента")
        );
        text.push_str(if delivered {
            " Студент получил уведомление."
        } else {
            " Уведомить студента не удалось."
        });
        self.say_with_menu(chat_id, &text).await?;
        Ok(HandlerResponse::Stop)
    }
}
