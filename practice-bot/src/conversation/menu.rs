//! Keyboards: the persistent main menu and the inline keyboards of each flow.

use storage::{InstitutionType, PracticeType, Task};

use super::format::{institution_type_label, practice_type_label};
use crate::core::{CallbackAction, Command, EditField, InlineButton, Keyboard};

/// Main-menu buttons and the command each one stands for.
const STUDENT_MENU: &[(&str, Command)] = &[
    ("📝 Подать заявку", Command::Register),
    ("📋 Моя практика", Command::Status),
    ("✏️ Редактировать заявку", Command::Edit),
    ("📚 Мои задания", Command::Tasks),
    ("🔔 Уведомления", Command::Notifications),
    ("ℹ️ О практике", Command::Info),
    ("📞 Контакты", Command::Contacts),
    ("❓ Помощь", Command::Help),
];

const ADMIN_MENU: &[(&str, Command)] = &[
    ("🗂 Заявки на рассмотрении", Command::Pending),
    ("📊 Статистика", Command::Stats),
    ("➕ Новое задание", Command::NewTask),
];

/// Command behind a main-menu label, if `text` is one.
pub fn command_for_label(text: &str) -> Option<Command> {
    let text = text.trim();
    STUDENT_MENU
        .iter()
        .chain(ADMIN_MENU)
        .find(|(label, _)| *label == text)
        .map(|(_, command)| *command)
}

pub fn label_for(command: Command) -> Option<&'static str> {
    STUDENT_MENU
        .iter()
        .chain(ADMIN_MENU)
        .find(|(_, c)| *c == command)
        .map(|(label, _)| *label)
}

fn rows_of_two(labels: &[(&str, Command)]) -> Vec<Vec<String>> {
    labels
        .chunks(2)
        .map(|pair| pair.iter().map(|(label, _)| label.to_string()).collect())
        .collect()
}

pub fn main_menu(is_admin: bool) -> Keyboard {
    let mut rows = rows_of_two(STUDENT_MENU);
    if is_admin {
        rows.extend(rows_of_two(ADMIN_MENU));
    }
    Keyboard::Reply(rows)
}

pub fn privacy_consent() -> Keyboard {
    Keyboard::Inline(vec![vec![
        InlineButton::new("✅ Согласен", CallbackAction::PrivacyAccept),
        InlineButton::new("❌ Не согласен", CallbackAction::PrivacyDecline),
    ]])
}

/// Practice-type choice; `for_edit` picks the edit-flow payloads.
pub fn practice_types(for_edit: bool) -> Keyboard {
    Keyboard::inline_column(
        PracticeType::ALL
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let action = if for_edit {
                    CallbackAction::EditPracticeType(*t)
                } else {
                    CallbackAction::RegistrationPracticeType(*t)
                };
                InlineButton::new(format!("{}. {}", i + 1, practice_type_label(*t)), action)
            })
            .collect(),
    )
}

pub fn institution_types(for_edit: bool) -> Keyboard {
    Keyboard::Inline(vec![InstitutionType::ALL
        .iter()
        .map(|t| {
            let action = if for_edit {
                CallbackAction::EditInstitutionType(*t)
            } else {
                CallbackAction::RegistrationInstitutionType(*t)
            };
            InlineButton::new(institution_type_label(*t), action)
        })
        .collect()])
}

pub fn confirm_registration() -> Keyboard {
    Keyboard::Inline(vec![vec![
        InlineButton::new("✅ Отправить", CallbackAction::ConfirmRegistration),
        InlineButton::new("❌ Отменить", CallbackAction::CancelRegistration),
    ]])
}

pub fn cancel_registration() -> Keyboard {
    Keyboard::Inline(vec![vec![InlineButton::new(
        "❌ Отменить регистрацию",
        CallbackAction::CancelRegistration,
    )]])
}

pub fn edit_fields() -> Keyboard {
    let mut rows: Vec<Vec<InlineButton>> = EditField::ALL
        .chunks(2)
        .map(|pair| {
            pair.iter()
                .map(|f| InlineButton::new(f.label(), CallbackAction::EditField(*f)))
                .collect()
        })
        .collect();
    rows.push(vec![InlineButton::new("❌ Отмена", CallbackAction::CancelEdit)]);
    Keyboard::Inline(rows)
}

pub fn cancel_edit() -> Keyboard {
    Keyboard::Inline(vec![vec![InlineButton::new(
        "❌ Отмена",
        CallbackAction::CancelEdit,
    )]])
}

pub fn moderation(application_id: &str) -> Keyboard {
    Keyboard::Inline(vec![vec![
        InlineButton::new(
            "✅ Одобрить",
            CallbackAction::Approve(application_id.to_string()),
        ),
        InlineButton::new(
            "❌ Отклонить",
            CallbackAction::Reject(application_id.to_string()),
        ),
    ]])
}

/// Shows the opposite of the current setting.
pub fn notifications(enabled: bool) -> Keyboard {
    let button = if enabled {
        InlineButton::new("🔕 Выключить", CallbackAction::Notifications(false))
    } else {
        InlineButton::new("🔔 Включить", CallbackAction::Notifications(true))
    };
    Keyboard::Inline(vec![vec![button]])
}

pub fn submit_buttons(tasks: &[&Task]) -> Keyboard {
    Keyboard::inline_column(
        tasks
            .iter()
            .map(|t| {
                InlineButton::new(
                    format!("📤 Сдать: {}", t.title),
                    CallbackAction::SubmitTask(t.id.clone()),
                )
            })
            .collect(),
    )
}

/// One button per `(student_id, full_name)`.
pub fn students(choices: &[(String, String)]) -> Keyboard {
    let mut buttons: Vec<InlineButton> = choices
        .iter()
        .map(|(id, name)| InlineButton::new(name.clone(), CallbackAction::NewTaskStudent(id.clone())))
        .collect();
    buttons.push(InlineButton::new("❌ Отмена", CallbackAction::CancelNewTask));
    Keyboard::inline_column(buttons)
}

pub fn confirm_task() -> Keyboard {
    Keyboard::Inline(vec![vec![
        InlineButton::new("✅ Создать", CallbackAction::ConfirmNewTask),
        InlineButton::new("❌ Отменить", CallbackAction::CancelNewTask),
    ]])
}
