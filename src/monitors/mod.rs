//! Monitors poll the control API, diff the result against the local
//! store, and notify on what changed. Each monitor owns a disjoint set
//! of session keys, so they never step on each other's snapshots.
//!
//! Snapshots are persisted before notifications go out: a crash between
//! the two loses a notification rather than repeating it.

mod calendar;
mod email;
mod reminders;
mod tasks;
mod voice;

pub use calendar::CalendarMonitor;
pub use email::EmailMonitor;
pub use reminders::ReminderMonitor;
pub use tasks::TaskMonitor;
pub use voice::VoiceMonitor;
