//! Daily digest: practice-end reminders for students and a head-count summary for administrators.
//!
//! Both parts run independently on every firing; a failure in one is logged and never stops the
//! other or the next day's run.

use chrono::{Duration as ChronoDuration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use std::time::Duration;
use storage::{PracticeStore, StudentContact};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{error, info, instrument};

use crate::conversation::format::{self, DigestCounts};
use crate::core::{OutgoingMessage, Result};
use crate::notify::Notifier;

/// Reminders start this many days before the end of practice.
pub const REMINDER_WINDOW_DAYS: i64 = 30;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// What one firing achieved. `None` means the part failed before sending anything.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DigestReport {
    pub reminders_sent: Option<usize>,
    pub admin_deliveries: Option<usize>,
}

/// Days left until `end_date`, counting today as day zero.
pub fn days_remaining(end_date: NaiveDate, today: NaiveDate) -> i64 {
    (end_date - today).num_days()
}

pub fn needs_reminder(days_remaining: i64) -> bool {
    (0..=REMINDER_WINDOW_DAYS).contains(&days_remaining)
}

pub fn digest_counts(contacts: &[StudentContact], today: NaiveDate) -> DigestCounts {
    let tomorrow = today + ChronoDuration::days(1);
    let mut counts = DigestCounts::default();
    for contact in contacts {
        let student = &contact.student;
        if student.start_date <= today && today <= student.end_date {
            counts.active += 1;
        }
        if student.start_date == today {
            counts.starting_today += 1;
        }
        if student.start_date == tomorrow {
            counts.starting_tomorrow += 1;
        }
        if student.end_date == today {
            counts.ending_today += 1;
        }
        if student.end_date == tomorrow {
            counts.ending_tomorrow += 1;
        }
    }
    counts
}

/// Time from `now` until the next `hour:00`: today if still ahead, otherwise tomorrow.
pub fn initial_delay(now: NaiveDateTime, hour: u32) -> Duration {
    let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or(NaiveTime::MIN);
    let mut next = now.date().and_time(at);
    if next <= now {
        next += ChronoDuration::days(1);
    }
    (next - now).to_std().unwrap_or(Duration::ZERO)
}

pub struct DigestJob {
    store: Arc<dyn PracticeStore>,
    notifier: Notifier,
    admin_chat_ids: Vec<i64>,
}

impl DigestJob {
    pub fn new(store: Arc<dyn PracticeStore>, notifier: Notifier, admin_chat_ids: Vec<i64>) -> Self {
        Self {
            store,
            notifier,
            admin_chat_ids,
        }
    }

    /// Runs both parts for `today`.
    #[instrument(skip(self))]
    pub async fn run_once(&self, today: NaiveDate) -> DigestReport {
        let reminders_sent = match self.send_reminders(today).await {
            Ok(sent) => Some(sent),
            Err(e) => {
                error!(error = %e, "Practice reminders failed");
                None
            }
        };
        let admin_deliveries = match self.send_admin_digest(today).await {
            Ok(delivered) => Some(delivered),
            Err(e) => {
                error!(error = %e, "Admin digest failed");
                None
            }
        };
        info!(?reminders_sent, ?admin_deliveries, "Digest finished");
        DigestReport {
            reminders_sent,
            admin_deliveries,
        }
    }

    /// Reminds every reachable student who opted in and whose practice ends within the window.
    pub async fn send_reminders(&self, today: NaiveDate) -> Result<usize> {
        let contacts = self.store.find_active_students(today).await?;
        let mut sent = 0;
        for contact in &contacts {
            let Some(chat_id) = contact.chat_id else {
                continue;
            };
            if !contact.notifications_enabled {
                continue;
            }
            let days = days_remaining(contact.student.end_date, today);
            if !needs_reminder(days) {
                continue;
            }
            let message =
                OutgoingMessage::markdown(format::reminder(days, contact.student.end_date));
            if self.notifier.notify(chat_id, &message).await.is_ok() {
                sent += 1;
            }
        }
        info!(candidates = contacts.len(), sent, "Practice reminders sent");
        Ok(sent)
    }

    pub async fn send_admin_digest(&self, today: NaiveDate) -> Result<usize> {
        if self.admin_chat_ids.is_empty() {
            return Ok(0);
        }
        let contacts = self.store.find_active_students(today).await?;
        let counts = digest_counts(&contacts, today);
        let message = OutgoingMessage::markdown(format::admin_digest(today, &counts));
        let deliveries = self
            .notifier
            .notify_many(&self.admin_chat_ids, &message)
            .await;
        Ok(deliveries.iter().filter(|d| d.is_delivered()).count())
    }

    /// Fires every day at `hour:00` local time. Never returns.
    pub async fn run_daily(self, hour: u32) {
        let delay = initial_delay(Local::now().naive_local(), hour);
        info!(hour, first_run_in_secs = delay.as_secs(), "Digest scheduled");
        let mut timer = tokio::time::interval_at(Instant::now() + delay, DAY);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            timer.tick().await;
            self.run_once(Local::now().date_naive()).await;
        }
    }
}
