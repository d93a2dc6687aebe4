//! Administrator side: moderation prompts, approve/reject, pending queue, statistics.
//!
//! Approve and reject first claim the application with a conditional status update
//! (`PENDING` → new status). Only the claimant runs the side effects, so two administrators
//! pressing buttons at once cannot both process the same application.

use chrono::Local;
use storage::{Application, ApplicationStatus, Institution, NewStudent, StorageError, Student};
use tracing::{error, info, instrument, warn};

use super::format;
use super::menu;
use super::ConversationEngine;
use crate::core::{HandlerResponse, OutgoingMessage, Result};

/// Applications listed by the pending queue.
const PENDING_LIMIT: i64 = 20;

/// Stored on rejected applications and shown to the student.
const DEFAULT_REJECTION_REASON: &str =
    "Заявка не прошла модерацию. Уточнить причину можно у поддержки.";

const APPLICATION_MISSING: &str = "Заявка не найдена: возможно, студент подал её заново.";
const NO_PENDING: &str = "Заявок на рассмотрении нет.";

impl ConversationEngine {
    /// Sends the moderation prompt with approve/reject buttons to every administrator.
    pub(super) async fn notify_admins(&self, app: &Application, resubmitted: bool) {
        if self.config.admin_chat_ids.is_empty() {
            warn!(application_id = %app.id, "No administrators configured, application not announced");
            return;
        }
        let prompt = OutgoingMessage::markdown(format::moderation_prompt(app, resubmitted))
            .with_keyboard(menu::moderation(&app.id));
        let deliveries = self
            .notifier
            .notify_many(&self.config.admin_chat_ids, &prompt)
            .await;
        if deliveries.iter().all(|d| !d.is_delivered()) {
            error!(application_id = %app.id, "Moderation prompt reached no administrator");
        }
    }

    pub(super) async fn show_pending(&self, chat_id: i64) -> Result<()> {
        let pending = self
            .store
            .find_applications_by_status(ApplicationStatus::Pending, PENDING_LIMIT)
            .await?;
        if pending.is_empty() {
            return self.say_with_menu(chat_id, NO_PENDING).await;
        }
        self.say(
            chat_id,
            &format!("Заявок на рассмотрении: {}", pending.len()),
        )
        .await?;
        for app in &pending {
            let prompt = OutgoingMessage::markdown(format::moderation_prompt(app, false))
                .with_keyboard(menu::moderation(&app.id));
            self.reply(chat_id, prompt).await?;
        }
        Ok(())
    }

    pub(super) async fn show_stats(&self, chat_id: i64) -> Result<()> {
        let pending = self
            .store
            .count_applications_by_status(ApplicationStatus::Pending)
            .await?;
        let approved = self
            .store
            .count_applications_by_status(ApplicationStatus::Approved)
            .await?;
        let rejected = self
            .store
            .count_applications_by_status(ApplicationStatus::Rejected)
            .await?;
        let message = OutgoingMessage::markdown(format::stats_view(pending, approved, rejected))
            .with_keyboard(menu::main_menu(true));
        self.reply(chat_id, message).await?;
        Ok(())
    }

    /// Tells the administrator the application was already handled (or is gone).
    async fn already_processed(
        &self,
        chat_id: i64,
        application_id: &str,
        message_id: Option<&str>,
    ) -> Result<HandlerResponse> {
        self.remove_buttons(chat_id, message_id).await;
        let text = match self.store.find_application(application_id).await? {
            Some(app) => format!(
                "Заявка {} уже обработана: {}.",
                app.full_name(),
                format::application_status_label(app.status)
            ),
            None => APPLICATION_MISSING.to_string(),
        };
        info!(chat_id, application_id, "Moderation skipped, application not pending");
        self.say(chat_id, &text).await?;
        Ok(HandlerResponse::Stop)
    }

    #[instrument(skip(self, message_id))]
    pub(super) async fn approve(
        &self,
        chat_id: i64,
        application_id: &str,
        message_id: Option<&str>,
    ) -> Result<HandlerResponse> {
        self.typing(chat_id).await;
        let claimed = self
            .store
            .transition_application_status(
                application_id,
                ApplicationStatus::Pending,
                ApplicationStatus::Approved,
                None,
            )
            .await?;
        if !claimed {
            return self.already_processed(chat_id, application_id, message_id).await;
        }

        let app = match self.finish_approval(chat_id, application_id).await {
            Ok(app) => app,
            Err(e) => {
                // Hand the application back so it can be approved again.
                if let Err(revert) = self
                    .store
                    .transition_application_status(
                        application_id,
                        ApplicationStatus::Approved,
                        ApplicationStatus::Pending,
                        None,
                    )
                    .await
                {
                    error!(application_id, error = %revert, "Could not return application to pending");
                }
                return Err(e);
            }
        };
        self.remove_buttons(chat_id, message_id).await;
        info!(chat_id, application_id, student_id = ?app.student_id, "Application approved");
        let notice = OutgoingMessage::markdown(format::approval_notice(&app));
        let delivered = self.notify_applicant(&app, notice).await?;
        self.say(
            chat_id,
            &format!(
                "✅ Заявка {} одобрена.{}",
                app.full_name(),
                delivery_note(delivered)
            ),
        )
        .await?;
        Ok(HandlerResponse::Stop)
    }

    /// Side effects of an approval: institution, student record, account link, audit note.
    async fn finish_approval(&self, chat_id: i64, application_id: &str) -> Result<Application> {
        let Some(mut app) = self.store.find_application(application_id).await? else {
            return Err(StorageError::NotFound(format!("application {}", application_id)).into());
        };
        let institution = self.find_or_create_institution(&app).await?;
        let student = self.upsert_student(&app, &institution).await?;
        self.store
            .link_student_to_account(&student.id, &app.account_id)
            .await?;

        app.student_id = Some(student.id);
        app.status = ApplicationStatus::Approved;
        app.append_note(&format!(
            "{}: одобрена администратором {}",
            Local::now().format("%d.%m.%Y %H:%M"),
            chat_id
        ));
        self.store.update_application(&app).await?;
        Ok(app)
    }

    async fn find_or_create_institution(&self, app: &Application) -> Result<Institution> {
        if let Some(existing) = self
            .store
            .find_institution(&app.institution_name, app.institution_type)
            .await?
        {
            return Ok(existing);
        }
        Ok(self
            .store
            .create_institution(&app.institution_name, app.institution_type)
            .await?)
    }

    /// Re-approval after an edit updates the student record the application already points to.
    async fn upsert_student(&self, app: &Application, institution: &Institution) -> Result<Student> {
        let existing = match app.student_id.as_deref() {
            Some(student_id) => self.store.find_student(student_id).await?,
            None => None,
        };
        if let Some(details) = existing {
            let mut student = details.student;
            student.institution_id = institution.id.clone();
            student.last_name = app.last_name.clone();
            student.first_name = app.first_name.clone();
            student.middle_name = app.middle_name.clone();
            student.email = app.email.clone();
            student.phone = app.phone.clone();
            student.course = app.course;
            student.practice_type = app.practice_type;
            student.start_date = app.start_date;
            student.end_date = app.end_date;
            student.is_active = true;
            self.store.update_student(&student).await?;
            return Ok(student);
        }
        Ok(self
            .store
            .create_student(NewStudent {
                institution_id: institution.id.clone(),
                last_name: app.last_name.clone(),
                first_name: app.first_name.clone(),
                middle_name: app.middle_name.clone(),
                email: app.email.clone(),
                phone: app.phone.clone(),
                course: app.course,
                practice_type: app.practice_type,
                start_date: app.start_date,
                end_date: app.end_date,
            })
            .await?)
    }

    #[instrument(skip(self, message_id))]
    pub(super) async fn reject(
        &self,
        chat_id: i64,
        application_id: &str,
        message_id: Option<&str>,
    ) -> Result<HandlerResponse> {
        let claimed = self
            .store
            .transition_application_status(
                application_id,
                ApplicationStatus::Pending,
                ApplicationStatus::Rejected,
                Some(DEFAULT_REJECTION_REASON),
            )
            .await?;
        if !claimed {
            return self.already_processed(chat_id, application_id, message_id).await;
        }
        self.remove_buttons(chat_id, message_id).await;

        let Some(app) = self.store.find_application(application_id).await? else {
            self.say(chat_id, APPLICATION_MISSING).await?;
            return Ok(HandlerResponse::Stop);
        };
        info!(chat_id, application_id, "Application rejected");
        let reason = app
            .rejection_reason
            .as_deref()
            .unwrap_or(DEFAULT_REJECTION_REASON);
        let notice = OutgoingMessage::markdown(format::rejection_notice(
            reason,
            &self.config.support_contact,
        ));
        let delivered = self.notify_applicant(&app, notice).await?;
        self.say(
            chat_id,
            &format!(
                "❌ Заявка {} отклонена.{}",
                app.full_name(),
                delivery_note(delivered)
            ),
        )
        .await?;
        Ok(HandlerResponse::Stop)
    }

    /// Sends the decision to the applicant. False when they have no chat or cannot be reached.
    async fn notify_applicant(&self, app: &Application, notice: OutgoingMessage) -> Result<bool> {
        let chat = self
            .store
            .find_account(&app.account_id)
            .await?
            .and_then(|account| account.telegram_id);
        let Some(student_chat) = chat else {
            warn!(application_id = %app.id, "Applicant has no chat, decision not delivered");
            return Ok(false);
        };
        let notice = notice.with_keyboard(menu::main_menu(self.is_admin(student_chat)));
        match self.notifier.notify(student_chat, &notice).await {
            Ok(_) => Ok(true),
            Err(e) => {
                info!(application_id = %app.id, error = %e, "Decision not delivered to applicant");
                Ok(false)
            }
        }
    }
}

fn delivery_note(delivered: bool) -> &'static str {
    if delivered {
        " Студент получил уведомление."
    } else {
        " Уведомить студента не удалось."
    }
}
