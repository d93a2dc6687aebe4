//! Tasks: creation by an administrator, the task list, submission and the late-submission gate.

mod common;

use chrono::{Duration, Local, Utc};
use common::{Harness, ADMIN, STUDENT};
use practice_bot::conversation::validation::format_date;
use practice_bot::conversation::{CreationStep, Session, SubmissionSession};
use practice_bot::{CallbackAction, Command, Keyboard};
use storage::{NewTask, PracticeStore, SubmissionStatus, Task, TaskStatus};

/// Registers and approves a student whose practice is running now.
async fn active_student(h: &Harness) -> String {
    let today = Local::now().date_naive();
    let app = h
        .register_and_approve(
            STUDENT,
            &format_date(today - Duration::days(10)),
            &format_date(today + Duration::days(60)),
        )
        .await;
    app.student_id.unwrap()
}

async fn task(h: &Harness, student_id: &str, hours_from_now: i64, late: Option<bool>) -> Task {
    h.store
        .create_task(NewTask {
            student_id: student_id.to_string(),
            title: "Лабораторная работа".to_string(),
            description: None,
            deadline: Utc::now() + Duration::hours(hours_from_now),
            reference_link: None,
            allow_late_submission: late,
            created_by: Some(ADMIN),
        })
        .await
        .unwrap()
}

/// **Test: an administrator creates a task step by step; the student is notified with a submit button.**
#[tokio::test]
async fn test_task_creation_flow() {
    let h = Harness::new().await;
    let student_id = active_student(&h).await;
    let deadline = format_date(Local::now().date_naive() + Duration::days(7));

    h.command(ADMIN, Command::NewTask).await;
    assert!(matches!(
        h.session(ADMIN).await,
        Some(Session::Creation(s)) if s.step == CreationStep::WaitingStudent
    ));
    h.press(ADMIN, CallbackAction::NewTaskStudent(student_id.clone()))
        .await;
    h.text(ADMIN, "Отчёт по практике").await;
    h.text(ADMIN, "-").await;
    h.text(ADMIN, &deadline).await;
    h.text(ADMIN, "https://example.org/materials").await;
    assert!(matches!(
        h.session(ADMIN).await,
        Some(Session::Creation(s)) if s.step == CreationStep::Confirming
    ));
    h.press(ADMIN, CallbackAction::ConfirmNewTask).await;

    assert!(h.session(ADMIN).await.is_none());
    let tasks = h.store.find_tasks_by_student(&student_id, &[]).await.unwrap();
    assert_eq!(tasks.len(), 1);
    let task = &tasks[0];
    assert_eq!(task.title, "Отчёт по практике");
    assert!(task.description.is_none());
    assert_eq!(task.reference_link.as_deref(), Some("https://example.org/materials"));
    assert_eq!(task.allow_late_submission, None);
    assert_eq!(task.created_by, Some(ADMIN));
    assert_eq!(task.status, TaskStatus::Assigned);

    let notice = h.bot.last_to(STUDENT).unwrap();
    assert!(notice
        .message
        .keyboard
        .unwrap()
        .actions()
        .contains(&&CallbackAction::SubmitTask(task.id.clone())));
    assert!(h.bot.last_text(ADMIN).contains("Студент получил уведомление"));
}

/// **Test: typing part of the name selects the student when exactly one matches.**
#[tokio::test]
async fn test_task_creation_student_search() {
    let h = Harness::new().await;
    active_student(&h).await;

    h.command(ADMIN, Command::NewTask).await;
    h.text(ADMIN, "сидоров").await;
    assert!(h.bot.last_text(ADMIN).contains("Студент не найден"));

    h.text(ADMIN, "иванов").await;
    assert!(matches!(
        h.session(ADMIN).await,
        Some(Session::Creation(s)) if s.step == CreationStep::WaitingTitle
    ));
}

/// **Test: a deadline in the past is refused.**
#[tokio::test]
async fn test_task_deadline_in_past_refused() {
    let h = Harness::new().await;
    let student_id = active_student(&h).await;

    h.command(ADMIN, Command::NewTask).await;
    h.press(ADMIN, CallbackAction::NewTaskStudent(student_id)).await;
    h.text(ADMIN, "Отчёт").await;
    h.text(ADMIN, "Описание").await;
    h.text(ADMIN, "01.01.2020").await;

    assert!(h.bot.last_text(ADMIN).contains("Срок сдачи должен быть в будущем"));
    assert!(matches!(
        h.session(ADMIN).await,
        Some(Session::Creation(s)) if s.step == CreationStep::WaitingDeadline
    ));
}

/// **Test: /tasks lists tasks and offers a submit button for each open one.**
#[tokio::test]
async fn test_task_list() {
    let h = Harness::new().await;
    let student_id = active_student(&h).await;
    let open = task(&h, &student_id, 48, None).await;

    h.command(STUDENT, Command::Tasks).await;
    let list = h.bot.last_to(STUDENT).unwrap();
    assert!(list.message.text.contains("Лабораторная работа"));
    match list.message.keyboard {
        Some(Keyboard::Inline(rows)) => {
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0][0].action, CallbackAction::SubmitTask(open.id));
        }
        other => panic!("unexpected keyboard {:?}", other),
    }
}

/// **Test: past the deadline, late submission is refused only when explicitly forbidden.**
#[tokio::test]
async fn test_late_submission_gate() {
    let h = Harness::new().await;
    let student_id = active_student(&h).await;
    let forbidden = task(&h, &student_id, -2, Some(false)).await;
    let unset = task(&h, &student_id, -2, None).await;

    h.press(STUDENT, CallbackAction::SubmitTask(forbidden.id.clone()))
        .await;
    assert!(h
        .bot
        .last_text(STUDENT)
        .contains("поздняя сдача для него запрещена"));
    assert!(h.session(STUDENT).await.is_none());

    h.press(STUDENT, CallbackAction::SubmitTask(unset.id.clone()))
        .await;
    assert_eq!(
        h.session(STUDENT).await,
        Some(Session::Submission(SubmissionSession {
            task_id: unset.id.clone()
        }))
    );
}

/// **Test: the solution text is split into link and description and stored as a submission.**
#[tokio::test]
async fn test_submission_stores_link_and_description() {
    let h = Harness::new().await;
    let student_id = active_student(&h).await;
    let open = task(&h, &student_id, 48, None).await;
    let admin_before = h.bot.count_to(ADMIN);

    h.press(STUDENT, CallbackAction::SubmitTask(open.id.clone()))
        .await;
    h.text(STUDENT, "Готово https://github.com/ivanov/lab1 см. README")
        .await;

    let submission = h
        .store
        .find_submission(&open.id, &student_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        submission.solution_link.as_deref(),
        Some("https://github.com/ivanov/lab1")
    );
    assert_eq!(
        submission.solution_description.as_deref(),
        Some("Готово см. README")
    );
    assert_eq!(submission.status, SubmissionStatus::Submitted);

    let task = h.store.find_task(&open.id).await.unwrap().unwrap();
    assert_eq!(task.status, TaskStatus::Submitted);
    assert!(h.session(STUDENT).await.is_none());
    assert_eq!(h.bot.count_to(ADMIN), admin_before + 1);
}

/// **Test: submitting again overwrites the earlier submission and puts it back to SUBMITTED.**
#[tokio::test]
async fn test_resubmission_overwrites_previous() {
    let h = Harness::new().await;
    let student_id = active_student(&h).await;
    let open = task(&h, &student_id, 48, None).await;

    h.press(STUDENT, CallbackAction::SubmitTask(open.id.clone()))
        .await;
    h.text(STUDENT, "https://github.com/ivanov/lab1 первая версия")
        .await;
    let mut first = h
        .store
        .find_submission(&open.id, &student_id)
        .await
        .unwrap()
        .unwrap();

    // Reviewed and sent back for revision a day ago.
    first.status = SubmissionStatus::NeedsRevision;
    first.submitted_at = Utc::now() - Duration::days(1);
    h.store.update_submission(&first).await.unwrap();

    h.press(STUDENT, CallbackAction::SubmitTask(open.id.clone()))
        .await;
    h.text(STUDENT, "https://gitlab.com/ivanov/lab1-fixed").await;

    let second = h
        .store
        .find_submission(&open.id, &student_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(
        second.solution_link.as_deref(),
        Some("https://gitlab.com/ivanov/lab1-fixed")
    );
    assert!(second.solution_description.is_none());
    assert_eq!(second.status, SubmissionStatus::Submitted);
    assert!(second.submitted_at > first.submitted_at + Duration::hours(23));
    assert!(h.session(STUDENT).await.is_none());
}

/// **Test: a late submission on a task without a late policy is accepted and flagged.**
#[tokio::test]
async fn test_late_submission_allowed_when_unset() {
    let h = Harness::new().await;
    let student_id = active_student(&h).await;
    let overdue = task(&h, &student_id, -1, None).await;

    h.press(STUDENT, CallbackAction::SubmitTask(overdue.id.clone()))
        .await;
    h.text(STUDENT, "https://github.com/ivanov/lab2").await;

    assert!(h
        .store
        .find_submission(&overdue.id, &student_id)
        .await
        .unwrap()
        .is_some());
    assert!(h.bot.last_text(STUDENT).contains("Срок уже прошёл"));
}

/// **Test: an empty solution re-prompts and keeps the submission session.**
#[tokio::test]
async fn test_empty_solution_reprompts() {
    let h = Harness::new().await;
    let student_id = active_student(&h).await;
    let open = task(&h, &student_id, 48, None).await;

    h.press(STUDENT, CallbackAction::SubmitTask(open.id.clone()))
        .await;
    h.text(STUDENT, "   ").await;

    assert!(h.bot.last_text(STUDENT).contains("Отправьте ссылку на решение"));
    assert!(matches!(h.session(STUDENT).await, Some(Session::Submission(_))));
}

/// **Test: students without an approved application have no tasks.**
#[tokio::test]
async fn test_tasks_before_approval() {
    let h = Harness::new().await;
    h.register(STUDENT, "01.09.2024", "30.12.2024").await;
    h.command(STUDENT, Command::Tasks).await;
    assert!(h
        .bot
        .last_text(STUDENT)
        .contains("Задания появятся после одобрения заявки"));
}
