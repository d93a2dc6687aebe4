//! Daily digest against a real store: who gets reminded, what the administrators see.

mod common;

use chrono::{Duration, Local, NaiveDate};
use common::{RecordingBot, ADMIN};
use practice_bot::{DigestJob, Notifier};
use std::sync::Arc;
use storage::{
    InstitutionType, NewAccount, NewStudent, PracticeStore, PracticeType, SqliteStore,
};

async fn enrol(
    store: &SqliteStore,
    chat_id: i64,
    start: NaiveDate,
    end: NaiveDate,
    notifications: bool,
) {
    let institution = store
        .create_institution(&format!("Колледж {}", chat_id), InstitutionType::College)
        .await
        .unwrap();
    let student = store
        .create_student(NewStudent {
            institution_id: institution.id,
            last_name: "Петров".to_string(),
            first_name: "Пётр".to_string(),
            middle_name: None,
            email: None,
            phone: None,
            course: 2,
            practice_type: PracticeType::Educational,
            start_date: start,
            end_date: end,
        })
        .await
        .unwrap();
    let account = store
        .create_account(NewAccount {
            telegram_id: chat_id,
            email: format!("s{}@example.com", chat_id),
            username: format!("s{}", chat_id),
            first_name: "Пётр".to_string(),
            last_name: "Петров".to_string(),
            middle_name: None,
        })
        .await
        .unwrap();
    store
        .link_student_to_account(&student.id, &account.id)
        .await
        .unwrap();
    if !notifications {
        store
            .set_notifications_enabled(&account.id, false)
            .await
            .unwrap();
    }
}

async fn setup() -> (Arc<RecordingBot>, Arc<SqliteStore>, DigestJob) {
    common::init_tracing();
    let bot = Arc::new(RecordingBot::new());
    let store = Arc::new(SqliteStore::in_memory().await.unwrap());
    let job = DigestJob::new(store.clone(), Notifier::new(bot.clone()), vec![ADMIN]);
    (bot, store, job)
}

/// **Test: on the last day of practice the student gets the last-day reminder.**
#[tokio::test]
async fn test_last_day_reminder() {
    let (bot, store, job) = setup().await;
    let today = Local::now().date_naive();
    enrol(&store, 501, today - Duration::days(30), today, true).await;

    let report = job.run_once(today).await;

    assert_eq!(report.reminders_sent, Some(1));
    assert!(bot
        .last_text(501)
        .contains("Сегодня последний день практики"));
}

/// **Test: reminders go only to opted-in students within 30 days of the end.**
#[tokio::test]
async fn test_reminder_window_and_opt_out() {
    let (bot, store, job) = setup().await;
    let today = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
    enrol(&store, 601, today - Duration::days(60), today + Duration::days(1), true).await;
    enrol(&store, 602, today - Duration::days(60), today + Duration::days(10), true).await;
    enrol(&store, 603, today - Duration::days(60), today + Duration::days(31), true).await;
    enrol(&store, 604, today - Duration::days(60), today + Duration::days(5), false).await;

    let report = job.run_once(today).await;

    assert_eq!(report.reminders_sent, Some(2));
    assert!(bot.last_text(601).contains("Завтра"));
    assert!(bot.last_text(602).contains("осталось 10 дней"));
    assert_eq!(bot.count_to(603), 0);
    assert_eq!(bot.count_to(604), 0);
}

/// **Test: the admin digest counts active, starting and ending students.**
#[tokio::test]
async fn test_admin_digest_counts() {
    let (bot, store, job) = setup().await;
    let today = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap();
    let tomorrow = today + Duration::days(1);
    enrol(&store, 701, today, today + Duration::days(90), true).await;
    enrol(&store, 702, tomorrow, today + Duration::days(90), true).await;
    enrol(&store, 703, today - Duration::days(30), today, true).await;

    let report = job.run_once(today).await;

    assert_eq!(report.admin_deliveries, Some(1));
    let digest = bot.last_text(ADMIN);
    assert!(digest.contains("Сводка на 01\\.09\\.2024"));
    assert!(digest.contains("Проходят практику:* 2"));
    assert!(digest.contains("Начинают завтра:* 1"));
    assert!(digest.contains("Заканчивают сегодня:* 1"));
}

/// **Test: a blocked student does not stop reminders to the others.**
#[tokio::test]
async fn test_blocked_student_does_not_stop_digest() {
    let (bot, store, job) = setup().await;
    let today = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap();
    enrol(&store, 801, today - Duration::days(60), today + Duration::days(3), true).await;
    enrol(&store, 802, today - Duration::days(60), today + Duration::days(3), true).await;
    bot.block(801);

    let report = job.run_once(today).await;

    assert_eq!(report.reminders_sent, Some(1));
    assert_eq!(bot.count_to(802), 1);
    assert_eq!(report.admin_deliveries, Some(1));
}
