//! Per-step input rules. Every validator takes raw user text and returns the value to store or
//! the message to re-prompt with.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use regex::Regex;
use std::sync::LazyLock;
use storage::PracticeType;
use thiserror::Error;

/// Answer that means "leave empty".
pub const SKIP: &str = "-";

pub const MIN_NAME_LEN: usize = 2;
pub const MIN_INSTITUTION_LEN: usize = 3;
pub const MIN_TITLE_LEN: usize = 3;
pub const COURSE_RANGE: std::ops::RangeInclusive<i64> = 1..=10;
pub const YEAR_RANGE: std::ops::RangeInclusive<i32> = 1900..=2100;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is invalid"));
static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})\.(\d{2})\.(\d{4})$").expect("date regex is invalid"));
static DEADLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2}\.\d{2}\.\d{4})(?:\s+(\d{1,2}):(\d{2}))?$").expect("deadline regex is invalid")
});
static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)https?://[^\s]+").expect("url regex is invalid"));

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Слишком коротко: нужно не меньше {0} символов. Попробуйте ещё раз.")]
    TooShort(usize),
    #[error("Не удалось распознать тип практики. Выберите вариант кнопкой или отправьте номер от 1 до 3.")]
    PracticeType,
    #[error("Курс должен быть целым числом от 1 до 10.")]
    Course,
    #[error("Некорректный email. Пример: name@example.com. Отправьте «-», чтобы пропустить.")]
    Email,
    #[error("Дата должна быть в формате ДД.ММ.ГГГГ (например, 01.09.2024) и существовать в календаре.")]
    Date,
    #[error("Дата окончания должна быть позже даты начала ({0}).")]
    EndNotAfterStart(String),
    #[error("Срок сдачи должен быть в формате ДД.ММ.ГГГГ или ДД.ММ.ГГГГ ЧЧ:ММ.")]
    DeadlineFormat,
    #[error("Срок сдачи должен быть в будущем.")]
    DeadlineInPast,
    #[error("В сообщении нет ссылки. Отправьте ссылку вида https://… или «-», чтобы пропустить.")]
    ReferenceLink,
    #[error("Отправьте ссылку на решение, его описание или и то и другое.")]
    EmptySolution,
}

pub type ValidationResult<T> = Result<T, ValidationError>;

fn min_len(text: &str, min: usize) -> ValidationResult<String> {
    let trimmed = text.trim();
    if trimmed.chars().count() < min {
        return Err(ValidationError::TooShort(min));
    }
    Ok(trimmed.to_string())
}

/// Last or first name.
pub fn validate_name(text: &str) -> ValidationResult<String> {
    min_len(text, MIN_NAME_LEN)
}

/// `-` means no middle name; anything else is kept exactly as typed.
pub fn parse_middle_name(text: &str) -> Option<String> {
    (text.trim() != SKIP).then(|| text.to_string())
}

pub fn validate_institution_name(text: &str) -> ValidationResult<String> {
    min_len(text, MIN_INSTITUTION_LEN)
}

pub fn validate_title(text: &str) -> ValidationResult<String> {
    min_len(text, MIN_TITLE_LEN)
}

/// Accepts the stored code, a Russian or English synonym, or the menu number 1–3.
pub fn parse_practice_type(text: &str) -> ValidationResult<PracticeType> {
    let normalized = text.trim().to_lowercase();
    let practice_type = match normalized.as_str() {
        "1" | "учебная" | "educational" => PracticeType::Educational,
        "2" | "производственная" | "production" => PracticeType::Production,
        "3" | "преддипломная" | "pre_diploma" | "pre-diploma" | "prediploma" => {
            PracticeType::PreDiploma
        }
        _ => return Err(ValidationError::PracticeType),
    };
    Ok(practice_type)
}

pub fn parse_course(text: &str) -> ValidationResult<i64> {
    let course: i64 = text.trim().parse().map_err(|_| ValidationError::Course)?;
    if !COURSE_RANGE.contains(&course) {
        return Err(ValidationError::Course);
    }
    Ok(course)
}

/// `-` skips; otherwise `local@domain.tld`.
pub fn parse_email(text: &str) -> ValidationResult<Option<String>> {
    match optional(text) {
        None => Ok(None),
        Some(email) if EMAIL.is_match(&email) => Ok(Some(email)),
        Some(_) => Err(ValidationError::Email),
    }
}

/// `-` skips; anything else is kept verbatim.
pub fn parse_phone(text: &str) -> Option<String> {
    optional(text)
}

fn optional(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed == SKIP || trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Strict `DD.MM.YYYY`; the date must exist (no 31.02) and the year must be in 1900–2100.
pub fn parse_date(text: &str) -> ValidationResult<NaiveDate> {
    let caps = DATE.captures(text.trim()).ok_or(ValidationError::Date)?;
    let day: u32 = caps[1].parse().map_err(|_| ValidationError::Date)?;
    let month: u32 = caps[2].parse().map_err(|_| ValidationError::Date)?;
    let year: i32 = caps[3].parse().map_err(|_| ValidationError::Date)?;
    if !YEAR_RANGE.contains(&year) {
        return Err(ValidationError::Date);
    }
    NaiveDate::from_ymd_opt(year, month, day).ok_or(ValidationError::Date)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// End date: same format rule, strictly after `start`.
pub fn parse_end_date(text: &str, start: NaiveDate) -> ValidationResult<NaiveDate> {
    let end = parse_date(text)?;
    if end <= start {
        return Err(ValidationError::EndNotAfterStart(format_date(start)));
    }
    Ok(end)
}

/// `DD.MM.YYYY` (end of that day) or `DD.MM.YYYY HH:MM`, local time, strictly after `now`.
pub fn parse_deadline(text: &str, now: DateTime<Utc>) -> ValidationResult<DateTime<Utc>> {
    let caps = DEADLINE
        .captures(text.trim())
        .ok_or(ValidationError::DeadlineFormat)?;
    let date = parse_date(&caps[1]).map_err(|_| ValidationError::DeadlineFormat)?;
    let time = match (caps.get(2), caps.get(3)) {
        (Some(hour), Some(minute)) => {
            let hour: u32 = hour.as_str().parse().map_err(|_| ValidationError::DeadlineFormat)?;
            let minute: u32 = minute
                .as_str()
                .parse()
                .map_err(|_| ValidationError::DeadlineFormat)?;
            NaiveTime::from_hms_opt(hour, minute, 0).ok_or(ValidationError::DeadlineFormat)?
        }
        _ => NaiveTime::from_hms_opt(23, 59, 0).ok_or(ValidationError::DeadlineFormat)?,
    };
    let deadline = Local
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .ok_or(ValidationError::DeadlineFormat)?
        .with_timezone(&Utc);
    if deadline <= now {
        return Err(ValidationError::DeadlineInPast);
    }
    Ok(deadline)
}

/// First URL in `text`, if any.
pub fn extract_url(text: &str) -> Option<String> {
    URL.find(text).map(|m| m.as_str().to_string())
}

/// `-` skips; otherwise the text must contain a URL, which is what gets stored.
pub fn parse_reference_link(text: &str) -> ValidationResult<Option<String>> {
    if text.trim() == SKIP {
        return Ok(None);
    }
    extract_url(text)
        .map(Some)
        .ok_or(ValidationError::ReferenceLink)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub link: Option<String>,
    pub description: Option<String>,
}

/// Splits free text into the first URL and whatever remains around it.
pub fn parse_solution(text: &str) -> ValidationResult<Solution> {
    let (link, rest) = match URL.find(text) {
        Some(m) => {
            let before = text[..m.start()].trim_end();
            let after = text[m.end()..].trim_start();
            let rest = match (before.is_empty(), after.is_empty()) {
                (false, false) => format!("{} {}", before, after),
                (false, true) => before.to_string(),
                _ => after.to_string(),
            };
            (Some(m.as_str().to_string()), rest)
        }
        None => (None, text.to_string()),
    };
    let rest = rest.trim();
    let description = (!rest.is_empty()).then(|| rest.to_string());
    if link.is_none() && description.is_none() {
        return Err(ValidationError::EmptySolution);
    }
    Ok(Solution { link, description })
}
