//! Task list and solution submission.

use chrono::Utc;
use storage::{NewSubmission, Student, SubmissionStatus, Task, TaskStatus};
use tracing::info;

use super::format;
use super::menu;
use super::state::{Session, SubmissionSession};
use super::validation;
use super::{ConversationEngine, NO_ACCOUNT};
use crate::core::{HandlerResponse, Keyboard, OutgoingMessage, Result};

const NOT_A_STUDENT: &str = "Задания появятся после одобрения заявки.";
const NO_TASKS: &str = "У вас пока нет заданий.";
const TASK_UNAVAILABLE: &str = "Задание не найдено.";
const TASK_COMPLETED: &str = "Это задание уже принято, повторная сдача не нужна.";
pub(super) const LATE_REFUSED: &str =
    "Срок сдачи этого задания истёк, поздняя сдача для него запрещена. Обратитесь к руководителю практики.";

fn is_open(task: &Task) -> bool {
    task.status != TaskStatus::Completed
}

impl ConversationEngine {
    /// Student record linked to the chat's account, if approved.
    async fn student_for_chat(&self, chat_id: i64) -> Result<Option<Student>> {
        let Some(account) = self.account(chat_id).await? else {
            return Ok(None);
        };
        let Some(student_id) = account.student_id else {
            return Ok(None);
        };
        Ok(self
            .store
            .find_student(&student_id)
            .await?
            .map(|details| details.student))
    }

    pub(super) async fn show_tasks(&self, chat_id: i64) -> Result<()> {
        if self.account(chat_id).await?.is_none() {
            return self.say_with_menu(chat_id, NO_ACCOUNT).await;
        }
        let Some(student) = self.student_for_chat(chat_id).await? else {
            return self.say_with_menu(chat_id, NOT_A_STUDENT).await;
        };
        let tasks = self.store.find_tasks_by_student(&student.id, &[]).await?;
        if tasks.is_empty() {
            return self.say_with_menu(chat_id, NO_TASKS).await;
        }

        let now = Utc::now();
        let mut blocks = Vec::with_capacity(tasks.len());
        for task in &tasks {
            let submission = self.store.find_submission(&task.id, &student.id).await?;
            blocks.push(format::task_line(task, submission.as_ref(), now));
        }
        let submittable: Vec<&Task> = tasks
            .iter()
            .filter(|t| is_open(t) && !t.rejects_submission_at(now))
            .collect();

        let mut message = OutgoingMessage::markdown(blocks.join("\n\n"));
        if !submittable.is_empty() {
            message = message.with_keyboard(menu::submit_buttons(&submittable));
        }
        self.reply(chat_id, message).await?;
        Ok(())
    }

    /// "Submit" button: checks the task can still be submitted and waits for the solution.
    pub(super) async fn start_submission(
        &self,
        chat_id: i64,
        task_id: &str,
    ) -> Result<HandlerResponse> {
        let Some(student) = self.student_for_chat(chat_id).await? else {
            self.say_with_menu(chat_id, NOT_A_STUDENT).await?;
            return Ok(HandlerResponse::Stop);
        };
        let task = match self.store.find_task(task_id).await? {
            Some(task) if task.student_id == student.id => task,
            _ => {
                self.say(chat_id, TASK_UNAVAILABLE).await?;
                return Ok(HandlerResponse::Stop);
            }
        };
        if !is_open(&task) {
            self.say(chat_id, TASK_COMPLETED).await?;
            return Ok(HandlerResponse::Stop);
        }
        if task.rejects_submission_at(Utc::now()) {
            info!(chat_id, task_id, "Late submission refused");
            self.say(chat_id, LATE_REFUSED).await?;
            return Ok(HandlerResponse::Stop);
        }

        self.set_session(
            chat_id,
            Session::Submission(SubmissionSession {
                task_id: task.id.clone(),
            }),
        )
        .await;
        let text = format!(
            "📤 Сдача задания «{}».\n\nОтправьте одним сообщением ссылку на решение и/или его описание. Отменить: /cancel.",
            task.title
        );
        self.reply(chat_id, OutgoingMessage::plain(text).with_keyboard(Keyboard::Remove))
            .await?;
        Ok(HandlerResponse::Stop)
    }

    pub(super) async fn submission_text(
        &self,
        chat_id: i64,
        session: SubmissionSession,
        text: &str,
    ) -> Result<HandlerResponse> {
        let solution = match validation::parse_solution(text) {
            Ok(solution) => solution,
            Err(e) => {
                self.say(chat_id, &e.to_string()).await?;
                return Ok(HandlerResponse::Stop);
            }
        };

        let student = self.student_for_chat(chat_id).await?;
        let task = self.store.find_task(&session.task_id).await?;
        let (student, task) = match (student, task) {
            (Some(student), Some(task)) if task.student_id == student.id => (student, task),
            _ => {
                self.clear_session(chat_id).await;
                self.say_with_menu(chat_id, TASK_UNAVAILABLE).await?;
                return Ok(HandlerResponse::Stop);
            }
        };
        let now = Utc::now();
        if task.rejects_submission_at(now) {
            info!(chat_id, task_id = %task.id, "Late submission refused");
            self.clear_session(chat_id).await;
            self.say_with_menu(chat_id, LATE_REFUSED).await?;
            return Ok(HandlerResponse::Stop);
        }

        let submission = match self.store.find_submission(&task.id, &student.id).await? {
            Some(mut existing) => {
                existing.solution_link = solution.link;
                existing.solution_description = solution.description;
                existing.status = SubmissionStatus::Submitted;
                existing.submitted_at = now;
                self.store.update_submission(&existing).await?;
                existing
            }
            None => {
                self.store
                    .create_submission(NewSubmission {
                        task_id: task.id.clone(),
                        student_id: student.id.clone(),
                        solution_link: solution.link,
                        solution_description: solution.description,
                    })
                    .await?
            }
        };
        self.store
            .update_task_status(&task.id, TaskStatus::Submitted)
            .await?;
        self.clear_session(chat_id).await;
        info!(
            chat_id,
            task_id = %task.id,
            submission_id = %submission.id,
            late = submission.submitted_at > task.deadline,
            "Solution submitted"
        );

        let mut text = format!("✅ Решение по заданию «{}» отправлено.", task.title);
        if submission.submitted_at > task.deadline {
            text.push_str(" Срок уже прошёл, руководитель увидит отметку о поздней сдаче.");
        }
        self.say_with_menu(chat_id, &text).await?;

        let notice = OutgoingMessage::markdown(format::submission_notice(
            &student.full_name(),
            &task,
            &submission,
        ));
        self.notifier
            .notify_many(&self.config.admin_chat_ids, &notice)
            .await;
        Ok(HandlerResponse::Stop)
    }
}
