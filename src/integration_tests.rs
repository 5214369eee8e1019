//! End-to-end tests over the real store, the monitors and the
//! scheduler, with only the HTTP client and the OS sinks stubbed out.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;

use crate::monitors::{CalendarMonitor, EmailMonitor, ReminderMonitor, TaskMonitor, VoiceMonitor};
use crate::notifiers::{ChatNotifier, NotificationRouter};
use crate::scheduler::{MonitorTelemetry, Scheduler};
use crate::testing::{temp_store, RecordingNotifier, StubControlApi, StubSpeech};
use crate::traits::{
    CalendarStatus, DueReminders, Email, NextEvent, Notifier, PendingVoice, ServerReminder,
    SpeechBackend, StateStore, StatusPayload, TaskItem, UnreadEmails, UpcomingTasks,
    VoiceNotification,
};
use crate::types::Priority;

struct Fixture {
    api: Arc<StubControlApi>,
    store: Arc<dyn StateStore>,
    recorder: Arc<RecordingNotifier>,
    speech: Arc<StubSpeech>,
    _db: tempfile::NamedTempFile,
}

impl Fixture {
    async fn new() -> Self {
        let (store, db) = temp_store().await;
        Self {
            api: Arc::new(StubControlApi::default()),
            store: Arc::new(store),
            recorder: Arc::new(RecordingNotifier::default()),
            speech: Arc::new(StubSpeech::default()),
            _db: db,
        }
    }

    /// Wire all five monitors into a fresh scheduler over the shared
    /// store, as a daemon (re)start would.
    fn build_scheduler(&self) -> (Scheduler, Arc<MonitorTelemetry>) {
        let router = Arc::new(NotificationRouter::new(vec![
            self.recorder.clone() as Arc<dyn Notifier>
        ]));
        let speech = Arc::new(crate::voice::SpeechEngine::new(Some(
            self.speech.clone() as Arc<dyn SpeechBackend>,
        )));
        let telemetry = Arc::new(MonitorTelemetry::new());
        let mut scheduler = Scheduler::new(self.store.clone(), telemetry.clone());
        let interval = Duration::from_secs(60);
        scheduler.register(
            Arc::new(EmailMonitor::new(self.api.clone(), self.store.clone(), router.clone())),
            interval,
        );
        scheduler.register(
            Arc::new(TaskMonitor::new(self.api.clone(), self.store.clone(), router.clone())),
            interval,
        );
        scheduler.register(
            Arc::new(CalendarMonitor::new(self.api.clone(), self.store.clone(), router.clone())),
            interval,
        );
        scheduler.register(
            Arc::new(ReminderMonitor::new(self.api.clone(), self.store.clone(), router)),
            interval,
        );
        scheduler.register(
            Arc::new(VoiceMonitor::new(self.api.clone(), self.store.clone(), speech)),
            interval,
        );
        (scheduler, telemetry)
    }

    fn populate_everything(&self) {
        self.api.set_emails(UnreadEmails {
            emails: vec![Email {
                id: "e1".to_string(),
                subject: "Contract renewal".to_string(),
                from_name: Some("Grace".to_string()),
                from_email: None,
                priority_level: Some(Priority::High),
            }],
            total_count: 4,
        });
        self.api.set_tasks(UpcomingTasks {
            tasks: vec![TaskItem {
                id: "t1".to_string(),
                title: "File expenses".to_string(),
                priority: Some(Priority::Medium),
                is_overdue: true,
            }],
            total_count: 1,
        });
        self.api.set_status(StatusPayload {
            calendar: CalendarStatus {
                events_today: 1,
                next_event: Some(NextEvent {
                    id: "ev1".to_string(),
                    title: "1:1".to_string(),
                    start_time: Some(Utc::now() + chrono::Duration::minutes(10)),
                }),
            },
        });
        self.api.set_due_reminders(DueReminders {
            reminders: vec![ServerReminder {
                id: "r1".to_string(),
                title: "Take medication".to_string(),
                priority: Some(Priority::High),
            }],
        });
        self.api.set_pending_voice(PendingVoice {
            notifications: vec![VoiceNotification {
                id: "v1".to_string(),
                notification_type: "briefing".to_string(),
                title: "Morning briefing".to_string(),
                spoken_message: "You have one meeting today".to_string(),
                full_message: String::new(),
            }],
        });
    }
}

#[tokio::test]
async fn test_first_cycle_notifies_everything_once() {
    let fixture = Fixture::new().await;
    fixture.populate_everything();
    let (scheduler, _) = fixture.build_scheduler();

    scheduler.run_all_once().await;

    let titles: Vec<String> = fixture.recorder.sent().iter().map(|s| s.0.clone()).collect();
    assert!(titles.iter().any(|t| t == "New email from Grace"));
    assert!(titles.iter().any(|t| t == "Task overdue"));
    assert!(titles.iter().any(|t| t.starts_with("Meeting in ")));
    assert!(titles.iter().any(|t| t == "Reminder"));
    assert_eq!(titles.len(), 4);
    assert_eq!(fixture.speech.spoken(), vec!["You have one meeting today"]);
    assert_eq!(fixture.api.delivered_voice_ids(), vec!["v1"]);
}

#[tokio::test]
async fn test_unchanged_world_stays_silent_on_repeat_cycles() {
    let fixture = Fixture::new().await;
    fixture.populate_everything();
    let (scheduler, _) = fixture.build_scheduler();

    scheduler.run_all_once().await;
    let after_first = fixture.recorder.sent().len();

    scheduler.run_all_once().await;
    scheduler.run_all_once().await;

    assert_eq!(fixture.recorder.sent().len(), after_first);
    assert_eq!(fixture.speech.spoken().len(), 1);
}

#[tokio::test]
async fn test_restart_does_not_renotify() {
    let fixture = Fixture::new().await;
    fixture.populate_everything();

    let (scheduler, _) = fixture.build_scheduler();
    scheduler.run_all_once().await;
    let after_first = fixture.recorder.sent().len();
    assert!(after_first > 0);

    // Fresh monitors and scheduler over the same database, the way a
    // process restart rebuilds them.
    let (scheduler, _) = fixture.build_scheduler();
    scheduler.run_all_once().await;

    assert_eq!(fixture.recorder.sent().len(), after_first);
    assert_eq!(fixture.speech.spoken().len(), 1);
}

#[tokio::test]
async fn test_one_dead_endpoint_leaves_the_rest_working() {
    // The email endpoint is the only one left unset, so it fails.
    let broken = Fixture::new().await;
    broken.api.set_tasks(UpcomingTasks {
        tasks: vec![TaskItem {
            id: "t1".to_string(),
            title: "File expenses".to_string(),
            priority: None,
            is_overdue: true,
        }],
        total_count: 1,
    });
    broken.api.set_status(StatusPayload::default());
    broken.api.set_due_reminders(DueReminders::default());
    broken.api.set_pending_voice(PendingVoice::default());

    let (scheduler, telemetry) = broken.build_scheduler();
    scheduler.run_all_once().await;

    // The task notification made it out despite the email failure.
    let sent = broken.recorder.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, "Task overdue");

    let snapshots = telemetry.snapshots();
    let email = snapshots.iter().find(|s| s.name == "email").unwrap();
    assert_eq!(email.consecutive_failures, 1);
    let tasks = snapshots.iter().find(|s| s.name == "tasks").unwrap();
    assert_eq!(tasks.consecutive_failures, 0);

    assert!(broken.store.get_last_sync("email").await.unwrap().is_none());
    assert!(broken.store.get_last_sync("tasks").await.unwrap().is_some());
}

#[tokio::test]
async fn test_calendar_event_lifecycle() {
    let fixture = Fixture::new().await;
    fixture.api.set_emails(UnreadEmails::default());
    fixture.api.set_tasks(UpcomingTasks::default());
    fixture.api.set_due_reminders(DueReminders::default());
    fixture.api.set_pending_voice(PendingVoice::default());

    let event = |starts_in_mins: i64| StatusPayload {
        calendar: CalendarStatus {
            events_today: 1,
            next_event: Some(NextEvent {
                id: "ev1".to_string(),
                title: "Board meeting".to_string(),
                start_time: Some(Utc::now() + chrono::Duration::minutes(starts_in_mins)),
            }),
        },
    };

    let (scheduler, _) = fixture.build_scheduler();

    // Far out: silent.
    fixture.api.set_status(event(90));
    scheduler.run_all_once().await;
    assert!(fixture.recorder.sent().is_empty());

    // Inside the window: one warning.
    fixture.api.set_status(event(10));
    scheduler.run_all_once().await;
    assert_eq!(fixture.recorder.sent().len(), 1);

    // Closer still, same event: no repeat.
    fixture.api.set_status(event(3));
    scheduler.run_all_once().await;
    assert_eq!(fixture.recorder.sent().len(), 1);

    // Started: nothing.
    fixture.api.set_status(event(-5));
    scheduler.run_all_once().await;
    assert_eq!(fixture.recorder.sent().len(), 1);
}

#[tokio::test]
async fn test_chat_sink_formats_through_control_api() {
    let fixture = Fixture::new().await;
    fixture.api.set_due_reminders(DueReminders {
        reminders: vec![ServerReminder {
            id: "r1".to_string(),
            title: "Stand up".to_string(),
            priority: None,
        }],
    });

    let router = Arc::new(NotificationRouter::new(vec![Arc::new(ChatNotifier::new(
        fixture.api.clone(),
    )) as Arc<dyn Notifier>]));
    let monitor = ReminderMonitor::new(fixture.api.clone(), fixture.store.clone(), router);

    use crate::traits::Monitor;
    let summary = monitor.check().await.unwrap();
    assert_eq!(summary, json!({"server_due": 1, "new_notifications": 1, "local_due": 0}));
    assert_eq!(fixture.api.sent_dms(), vec!["*Reminder*\nStand up"]);
}
