//! Slash-commands understood in any conversation state.

use teloxide::utils::command::BotCommands;

#[derive(BotCommands, Clone, Copy, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    /// Главное меню
    Start,
    /// Подать заявку на практику
    Register,
    /// Статус заявки и практики
    Status,
    /// Редактировать заявку
    Edit,
    /// Мои задания
    Tasks,
    /// Настройки уведомлений
    Notifications,
    /// Информация о практике
    Info,
    /// Контакты поддержки
    Contacts,
    /// Справка
    Help,
    /// Отменить текущее действие
    Cancel,
    /// Заявки на рассмотрении (администратор)
    Pending,
    /// Статистика заявок (администратор)
    Stats,
    /// Создать задание (администратор)
    NewTask,
}

impl Command {
    /// Commands reserved for administrator chats.
    pub fn is_admin_only(&self) -> bool {
        matches!(self, Command::Pending | Command::Stats | Command::NewTask)
    }

    /// Parses `/cmd`, `/cmd@bot` and `/cmd payload` (deep links), ignoring any payload.
    pub fn parse_text(text: &str, bot_username: &str) -> Option<Command> {
        let text = text.trim();
        if !text.starts_with('/') {
            return None;
        }
        if let Ok(cmd) = Command::parse(text, bot_username) {
            return Some(cmd);
        }
        let head = text.split_whitespace().next()?;
        Command::parse(head, bot_username).ok()
    }
}
