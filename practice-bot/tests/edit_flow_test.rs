//! Edit flow: field selection, validation, date range with an explicit end-date step, the
//! approved → pending re-moderation and stale buttons.

mod common;

use common::{date, Harness, ADMIN, STUDENT};
use practice_bot::conversation::{EditStep, Session, AUDIT_MARKER};
use practice_bot::core::EditField;
use practice_bot::{CallbackAction, Command, HandlerResponse};
use storage::{ApplicationStatus, PracticeStore, PracticeType};

/// **Test: editing a pending application saves the field and keeps it pending without an audit note.**
#[tokio::test]
async fn test_edit_pending_keeps_status() {
    let h = Harness::new().await;
    let app = h.register(STUDENT, "01.09.2024", "30.12.2024").await;
    let admin_messages = h.bot.count_to(ADMIN);

    h.command(STUDENT, Command::Edit).await;
    h.press(STUDENT, CallbackAction::EditField(EditField::LastName))
        .await;
    h.text(STUDENT, "Петров").await;

    let stored = h.store.find_application(&app.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ApplicationStatus::Pending);
    assert_eq!(stored.last_name, "Петров");
    assert!(!stored.notes.unwrap_or_default().contains(AUDIT_MARKER));
    assert!(h.session(STUDENT).await.is_none());
    assert_eq!(h.bot.count_to(ADMIN), admin_messages);
}

/// **Test: editing an approved application sends it back to PENDING with an audit note and re-notifies admins.**
#[tokio::test]
async fn test_edit_approved_returns_to_pending() {
    let h = Harness::new().await;
    let app = h.register_and_approve(STUDENT, "01.09.2024", "30.12.2024").await;
    h.bot.clear();

    h.command(STUDENT, Command::Edit).await;
    h.press(STUDENT, CallbackAction::EditField(EditField::Course))
        .await;
    h.text(STUDENT, "4").await;

    let stored = h.store.find_application(&app.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ApplicationStatus::Pending);
    assert_eq!(stored.course, 4);
    assert!(stored.notes.unwrap().contains(AUDIT_MARKER));

    let prompt = h.bot.last_to(ADMIN).unwrap();
    assert!(prompt
        .message
        .keyboard
        .unwrap()
        .actions()
        .contains(&&CallbackAction::Approve(app.id.clone())));
}

/// **Test: re-approving an edited application updates the existing student record.**
#[tokio::test]
async fn test_reapproval_reuses_student() {
    let h = Harness::new().await;
    let app = h.register_and_approve(STUDENT, "01.09.2024", "30.12.2024").await;
    let student_id = app.student_id.clone().unwrap();

    h.command(STUDENT, Command::Edit).await;
    h.press(STUDENT, CallbackAction::EditField(EditField::Course))
        .await;
    h.text(STUDENT, "5").await;
    h.press(ADMIN, CallbackAction::Approve(app.id.clone())).await;

    let stored = h.store.find_application(&app.id).await.unwrap().unwrap();
    assert_eq!(stored.status, ApplicationStatus::Approved);
    assert_eq!(stored.student_id.as_deref(), Some(student_id.as_str()));
    let student = h.store.find_student(&student_id).await.unwrap().unwrap();
    assert_eq!(student.student.course, 5);
}

/// **Test: the date range is edited in two steps and the end date must follow the new start.**
#[tokio::test]
async fn test_edit_dates_two_steps() {
    let h = Harness::new().await;
    let app = h.register(STUDENT, "01.09.2024", "30.12.2024").await;

    h.command(STUDENT, Command::Edit).await;
    h.press(STUDENT, CallbackAction::EditField(EditField::Dates))
        .await;
    h.text(STUDENT, "01.10.2024").await;
    assert!(matches!(
        h.session(STUDENT).await,
        Some(Session::Edit(s)) if s.step == EditStep::WaitingEndDate { start: date(2024, 10, 1) }
    ));

    h.text(STUDENT, "15.09.2024").await;
    assert!(h.bot.last_text(STUDENT).contains("Дата окончания должна быть позже"));
    assert!(matches!(
        h.session(STUDENT).await,
        Some(Session::Edit(s)) if matches!(s.step, EditStep::WaitingEndDate { .. })
    ));

    h.text(STUDENT, "30.11.2024").await;
    let stored = h.store.find_application(&app.id).await.unwrap().unwrap();
    assert_eq!(stored.start_date, date(2024, 10, 1));
    assert_eq!(stored.end_date, date(2024, 11, 30));
    assert!(h.session(STUDENT).await.is_none());
}

/// **Test: choice fields are edited with their own buttons.**
#[tokio::test]
async fn test_edit_practice_type_button() {
    let h = Harness::new().await;
    let app = h.register(STUDENT, "01.09.2024", "30.12.2024").await;

    h.command(STUDENT, Command::Edit).await;
    h.press(STUDENT, CallbackAction::EditField(EditField::PracticeType))
        .await;
    h.press(STUDENT, CallbackAction::EditPracticeType(PracticeType::Educational))
        .await;

    let stored = h.store.find_application(&app.id).await.unwrap().unwrap();
    assert_eq!(stored.practice_type, PracticeType::Educational);
}

/// **Test: invalid values re-prompt and keep waiting for the same field.**
#[tokio::test]
async fn test_edit_invalid_value_reprompts() {
    let h = Harness::new().await;
    h.register(STUDENT, "01.09.2024", "30.12.2024").await;

    h.command(STUDENT, Command::Edit).await;
    h.press(STUDENT, CallbackAction::EditField(EditField::Course))
        .await;
    h.text(STUDENT, "11").await;

    assert!(h.bot.last_text(STUDENT).contains("Курс должен быть"));
    assert!(matches!(
        h.session(STUDENT).await,
        Some(Session::Edit(s)) if s.step == EditStep::WaitingValue(EditField::Course)
    ));
}

/// **Test: an edit button pressed with no edit session is ignored without any reply.**
#[tokio::test]
async fn test_stale_edit_button_is_silent() {
    let h = Harness::new().await;
    h.register(STUDENT, "01.09.2024", "30.12.2024").await;
    let before = h.bot.count_to(STUDENT);

    let response = h
        .press(STUDENT, CallbackAction::EditField(EditField::Course))
        .await;

    assert_ne!(response, HandlerResponse::Stop);
    assert_eq!(h.bot.count_to(STUDENT), before);
    assert!(h.session(STUDENT).await.is_none());
}

/// **Test: a rejected application cannot be edited.**
#[tokio::test]
async fn test_nothing_to_edit_after_rejection() {
    let h = Harness::new().await;
    let app = h.register(STUDENT, "01.09.2024", "30.12.2024").await;
    h.press(ADMIN, CallbackAction::Reject(app.id.clone())).await;

    h.command(STUDENT, Command::Edit).await;
    assert!(h.bot.last_text(STUDENT).contains("Нет заявки, которую можно изменить"));
    assert!(h.session(STUDENT).await.is_none());
}
