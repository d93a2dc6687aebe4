//! Message rendering.
//!
//! Summaries and confirmation screens are plain text so raw user input can never break them.
//! Notifications and status views are MarkdownV2: every dynamic piece goes through [`esc`].

use chrono::{DateTime, Local, NaiveDate, Utc};
use storage::{
    Application, ApplicationStatus, InstitutionType, PracticeType, Task, TaskStatus,
    TaskSubmission,
};
use teloxide::utils::markdown;

use super::state::{RegistrationDraft, TaskDraft};
use super::validation::format_date;

pub fn esc(text: &str) -> String {
    markdown::escape(text)
}

/// `*label* value`, both escaped.
fn field(label: &str, value: &str) -> String {
    format!("{} {}", markdown::bold(&esc(label)), esc(value))
}

fn heading(text: &str) -> String {
    markdown::bold(&esc(text))
}

pub fn practice_type_label(practice_type: PracticeType) -> &'static str {
    match practice_type {
        PracticeType::Educational => "Учебная",
        PracticeType::Production => "Производственная",
        PracticeType::PreDiploma => "Преддипломная",
    }
}

pub fn institution_type_label(institution_type: InstitutionType) -> &'static str {
    match institution_type {
        InstitutionType::University => "Университет",
        InstitutionType::College => "Колледж",
    }
}

pub fn application_status_label(status: ApplicationStatus) -> &'static str {
    match status {
        ApplicationStatus::Pending => "⏳ На рассмотрении",
        ApplicationStatus::Approved => "✅ Одобрена",
        ApplicationStatus::Rejected => "❌ Отклонена",
    }
}

pub fn task_status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Assigned => "Назначено",
        TaskStatus::InProgress => "В работе",
        TaskStatus::Submitted => "Сдано",
        TaskStatus::Completed => "Принято",
        TaskStatus::Overdue => "Просрочено",
    }
}

/// Russian plural for "day": 1 день, 2 дня, 5 дней, 11 дней, 21 день.
pub fn plural_days(n: i64) -> &'static str {
    let n = n.abs();
    let last_two = n % 100;
    let last = n % 10;
    if (11..=14).contains(&last_two) {
        "дней"
    } else if last == 1 {
        "день"
    } else if (2..=4).contains(&last) {
        "дня"
    } else {
        "дней"
    }
}

pub fn format_deadline(deadline: DateTime<Utc>) -> String {
    deadline
        .with_timezone(&Local)
        .format("%d.%m.%Y %H:%M")
        .to_string()
}

fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("—")
}

fn date_or_dash(value: Option<NaiveDate>) -> String {
    value.map(format_date).unwrap_or_else(|| "—".to_string())
}

/// Plain-text echo of a registration draft before it is committed.
pub fn registration_summary(draft: &RegistrationDraft) -> String {
    let mut lines = vec!["Проверьте данные заявки:".to_string(), String::new()];
    lines.push(format!("Фамилия: {}", or_dash(draft.last_name.as_deref())));
    lines.push(format!("Имя: {}", or_dash(draft.first_name.as_deref())));
    lines.push(format!("Отчество: {}", or_dash(draft.middle_name.as_deref())));
    lines.push(format!(
        "Тип практики: {}",
        draft.practice_type.map(practice_type_label).unwrap_or("—")
    ));
    lines.push(format!(
        "Тип учебного заведения: {}",
        draft.institution_type.map(institution_type_label).unwrap_or("—")
    ));
    lines.push(format!(
        "Учебное заведение: {}",
        or_dash(draft.institution_name.as_deref())
    ));
    lines.push(format!(
        "Курс: {}",
        draft.course.map(|c| c.to_string()).unwrap_or_else(|| "—".to_string())
    ));
    lines.push(format!("Email: {}", or_dash(draft.email.as_deref())));
    lines.push(format!("Телефон: {}", or_dash(draft.phone.as_deref())));
    lines.push(format!(
        "Даты практики: {} — {}",
        date_or_dash(draft.start_date),
        date_or_dash(draft.end_date)
    ));
    lines.push(String::new());
    lines.push("Всё верно?".to_string());
    lines.join("\n")
}

/// Plain-text view of a stored application (edit screen).
pub fn application_summary(app: &Application) -> String {
    [
        format!("Заявка: {}", app.full_name()),
        format!("Статус: {}", application_status_label(app.status)),
        format!("Тип практики: {}", practice_type_label(app.practice_type)),
        format!(
            "Учебное заведение: {} ({})",
            app.institution_name,
            institution_type_label(app.institution_type)
        ),
        format!("Курс: {}", app.course),
        format!("Email: {}", or_dash(app.email.as_deref())),
        format!("Телефон: {}", or_dash(app.phone.as_deref())),
        format!(
            "Даты практики: {} — {}",
            format_date(app.start_date),
            format_date(app.end_date)
        ),
    ]
    .join("\n")
}

/// Plain-text echo of a task before creation.
pub fn task_draft_summary(draft: &TaskDraft) -> String {
    [
        "Проверьте задание:".to_string(),
        String::new(),
        format!("Студент: {}", or_dash(draft.student_name.as_deref())),
        format!("Название: {}", or_dash(draft.title.as_deref())),
        format!("Описание: {}", or_dash(draft.description.as_deref())),
        format!(
            "Срок сдачи: {}",
            draft.deadline.map(format_deadline).unwrap_or_else(|| "—".to_string())
        ),
        format!("Материалы: {}", or_dash(draft.reference_link.as_deref())),
        String::new(),
        "Создать задание?".to_string(),
    ]
    .join("\n")
}

/// Moderation prompt for administrators. `resubmitted` marks an approved application that was
/// edited and needs review again.
pub fn moderation_prompt(app: &Application, resubmitted: bool) -> String {
    let title = if resubmitted {
        "🔄 Заявка изменена после одобрения"
    } else {
        "📥 Новая заявка на практику"
    };
    let mut lines = vec![
        heading(title),
        String::new(),
        field("ФИО:", &app.full_name()),
        field("Тип практики:", practice_type_label(app.practice_type)),
        field(
            "Учебное заведение:",
            &format!(
                "{} ({})",
                app.institution_name,
                institution_type_label(app.institution_type)
            ),
        ),
        field("Курс:", &app.course.to_string()),
        field("Email:", or_dash(app.email.as_deref())),
        field("Телефон:", or_dash(app.phone.as_deref())),
        field(
            "Даты:",
            &format!("{} — {}", format_date(app.start_date), format_date(app.end_date)),
        ),
    ];
    if let Some(notes) = app.notes.as_deref() {
        lines.push(field("Примечания:", notes));
    }
    lines.join("\n")
}

/// Confirmation to the student right after the application is stored.
pub fn registration_success(app: &Application) -> String {
    [
        heading("✅ Заявка отправлена!"),
        String::new(),
        esc(&format!(
            "{}, ваша заявка на {} практику ({} — {}) передана на рассмотрение.",
            app.first_name,
            practice_type_label(app.practice_type).to_lowercase(),
            format_date(app.start_date),
            format_date(app.end_date)
        )),
        esc("Мы сообщим о решении в этом чате. Статус можно проверить командой /status."),
    ]
    .join("\n")
}

pub fn approval_notice(app: &Application) -> String {
    [
        heading("🎉 Ваша заявка одобрена!"),
        String::new(),
        esc(&format!(
            "Практика: {} — {}.",
            format_date(app.start_date),
            format_date(app.end_date)
        )),
        esc("Задания будут приходить в этот чат. Список заданий: /tasks."),
    ]
    .join("\n")
}

pub fn rejection_notice(reason: &str, support_contact: &str) -> String {
    [
        heading("❌ Заявка отклонена"),
        String::new(),
        field("Причина:", reason),
        esc(&format!(
            "Вопросы можно задать поддержке: {}. Подать новую заявку: /register.",
            support_contact
        )),
    ]
    .join("\n")
}

/// `/status` view. `today` is used for the days-remaining line of approved practice.
pub fn status_view(app: &Application, today: NaiveDate) -> String {
    let mut lines = vec![
        heading("📋 Ваша заявка"),
        String::new(),
        field("Статус:", application_status_label(app.status)),
        field("ФИО:", &app.full_name()),
        field("Тип практики:", practice_type_label(app.practice_type)),
        field("Учебное заведение:", &app.institution_name),
        field(
            "Даты:",
            &format!("{} — {}", format_date(app.start_date), format_date(app.end_date)),
        ),
    ];
    match app.status {
        ApplicationStatus::Approved => {
            let days = (app.end_date - today).num_days();
            if today < app.start_date {
                lines.push(esc(&format!(
                    "Практика начнётся {}.",
                    format_date(app.start_date)
                )));
            } else if days >= 0 {
                lines.push(esc(&format!(
                    "До окончания практики: {} {}.",
                    days,
                    plural_days(days)
                )));
            } else {
                lines.push(esc("Практика завершена."));
            }
        }
        ApplicationStatus::Rejected => {
            if let Some(reason) = app.rejection_reason.as_deref() {
                lines.push(field("Причина отказа:", reason));
            }
        }
        ApplicationStatus::Pending => {
            lines.push(esc("Заявка ожидает решения администратора."));
        }
    }
    lines.join("\n")
}

pub fn task_line(task: &Task, submission: Option<&TaskSubmission>, now: DateTime<Utc>) -> String {
    let mut lines = vec![
        heading(&task.title),
        field("Срок:", &format_deadline(task.deadline)),
        field("Статус:", task_status_label(task.status)),
    ];
    if let Some(description) = task.description.as_deref() {
        lines.push(esc(description));
    }
    if let Some(link) = task.reference_link.as_deref() {
        lines.push(field("Материалы:", link));
    }
    if now > task.deadline {
        let policy = if task.rejects_submission_at(now) {
            "срок истёк, сдача закрыта"
        } else {
            "срок истёк, поздняя сдача разрешена"
        };
        lines.push(esc(&format!("⚠️ {}", policy)));
    }
    if let Some(submission) = submission {
        lines.push(field(
            "Последняя сдача:",
            &format_deadline(submission.submitted_at),
        ));
    }
    lines.join("\n")
}

pub fn new_task_notice(task: &Task) -> String {
    let mut lines = vec![
        heading("📌 Новое задание"),
        String::new(),
        field("Название:", &task.title),
        field("Срок сдачи:", &format_deadline(task.deadline)),
    ];
    if let Some(description) = task.description.as_deref() {
        lines.push(field("Описание:", description));
    }
    if let Some(link) = task.reference_link.as_deref() {
        lines.push(field("Материалы:", link));
    }
    lines.push(esc("Сдать решение можно через /tasks."));
    lines.join("\n")
}

pub fn submission_notice(student_name: &str, task: &Task, submission: &TaskSubmission) -> String {
    let mut lines = vec![
        heading("📨 Сдано задание"),
        String::new(),
        field("Студент:", student_name),
        field("Задание:", &task.title),
    ];
    if let Some(link) = submission.solution_link.as_deref() {
        lines.push(field("Ссылка:", link));
    }
    if let Some(description) = submission.solution_description.as_deref() {
        lines.push(field("Комментарий:", description));
    }
    if submission.submitted_at > task.deadline {
        lines.push(esc("⚠️ Сдано после срока."));
    }
    lines.join("\n")
}

/// Practice-end reminder for a student.
pub fn reminder(days_remaining: i64, end_date: NaiveDate) -> String {
    let body = match days_remaining {
        0 => "Сегодня последний день практики. Не забудьте сдать все задания и отчёт!".to_string(),
        1 => format!(
            "Завтра ({}) последний день практики. Проверьте, что все задания сданы.",
            format_date(end_date)
        ),
        n => format!(
            "До окончания практики осталось {} {} (до {}).",
            n,
            plural_days(n),
            format_date(end_date)
        ),
    };
    format!("{}\n\n{}", heading("⏰ Напоминание"), esc(&body))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigestCounts {
    pub active: usize,
    pub starting_today: usize,
    pub starting_tomorrow: usize,
    pub ending_today: usize,
    pub ending_tomorrow: usize,
}

pub fn admin_digest(today: NaiveDate, counts: &DigestCounts) -> String {
    [
        heading(&format!("📊 Сводка на {}", format_date(today))),
        String::new(),
        field("Проходят практику:", &counts.active.to_string()),
        field("Начинают сегодня:", &counts.starting_today.to_string()),
        field("Начинают завтра:", &counts.starting_tomorrow.to_string()),
        field("Заканчивают сегодня:", &counts.ending_today.to_string()),
        field("Заканчивают завтра:", &counts.ending_tomorrow.to_string()),
    ]
    .join("\n")
}

pub fn stats_view(pending: i64, approved: i64, rejected: i64) -> String {
    [
        heading("📊 Статистика заявок"),
        String::new(),
        field("На рассмотрении:", &pending.to_string()),
        field("Одобрено:", &approved.to_string()),
        field("Отклонено:", &rejected.to_string()),
        field("Всего:", &(pending + approved + rejected).to_string()),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural_days() {
        let cases = [
            (0, "дней"),
            (1, "день"),
            (2, "дня"),
            (4, "дня"),
            (5, "дней"),
            (11, "дней"),
            (12, "дней"),
            (14, "дней"),
            (21, "день"),
            (22, "дня"),
            (25, "дней"),
            (30, "дней"),
            (101, "день"),
            (111, "дней"),
        ];
        for (n, expected) in cases {
            assert_eq!(plural_days(n), expected, "{}", n);
        }
    }

    #[test]
    fn test_reminder_templates() {
        let end = NaiveDate::from_ymd_opt(2024, 12, 30).unwrap();
        assert!(reminder(0, end).contains("последний день практики"));
        assert!(reminder(0, end).starts_with("*"));
        assert!(reminder(1, end).contains("Завтра"));
        let many = reminder(3, end);
        assert!(many.contains("3 дня"));
        assert!(many.contains("30\\.12\\.2024"));
    }

    #[test]
    fn test_markdown_escapes_user_input() {
        let rendered = field("ФИО:", "O'Neil_[x]*(y).");
        assert!(rendered.contains("O'Neil\\_\\[x\\]\\*\\(y\\)\\."));
    }

    #[test]
    fn test_summary_is_plain_text() {
        let draft = RegistrationDraft {
            last_name: Some("Smith_*".to_string()),
            ..Default::default()
        };
        let summary = registration_summary(&draft);
        assert!(summary.contains("Фамилия: Smith_*"));
        assert!(summary.contains("Имя: —"));
    }
}
