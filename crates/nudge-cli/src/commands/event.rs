use chrono::NaiveDateTime;
use clap::Subcommand;
use nudge_core::{NotificationHandle, NudgeEvent, NudgeType};

use super::{open_engine, print_report};

#[derive(Subcommand)]
pub enum EventAction {
    /// The app came to the foreground: reconcile every slot
    Foreground,
    /// Reminder settings for a type changed
    Settings {
        /// Nudge type (e.g. "daily-show-up")
        nudge: NudgeType,
    },
    /// The user showed up today
    ShowUp,
    /// A focus session was completed today
    FocusDone,
    /// The OS delivered a notification
    Fired {
        nudge: NudgeType,
        /// Handle of the delivered notification
        #[arg(long)]
        handle: Option<String>,
    },
    /// The user opened a delivered notification
    Opened { nudge: NudgeType },
}

pub fn run(action: EventAction, now: NaiveDateTime) -> Result<(), Box<dyn std::error::Error>> {
    let today = now.date();
    let event = match action {
        EventAction::Foreground => NudgeEvent::AppForegrounded,
        EventAction::Settings { nudge } => NudgeEvent::SettingsChanged { nudge },
        EventAction::ShowUp => NudgeEvent::ShowUpRecorded { date: today },
        EventAction::FocusDone => NudgeEvent::FocusSessionCompleted { date: today },
        EventAction::Fired { nudge, handle } => NudgeEvent::NotificationFired {
            nudge,
            date: today,
            handle: handle.map(NotificationHandle::new),
        },
        EventAction::Opened { nudge } => NudgeEvent::NotificationOpened { nudge, date: today },
    };

    let engine = open_engine()?;
    print_report(&engine.on_event(event, now))
}
