mod control;
mod monitor;
mod notifier;
mod speech;
mod state_store;

pub use control::{
    CalendarStatus, ControlApi, DueReminders, Email, NextEvent, PendingVoice, ReminderCreated,
    SendOutcome, ServerReminder, StatusPayload, TaskItem, UnreadEmails, UpcomingTasks,
    VoiceNotification,
};
pub use monitor::Monitor;
pub use notifier::Notifier;
pub use speech::SpeechBackend;
pub use state_store::{LocalReminder, NewReminder, StateStore};
