use chrono::NaiveDateTime;
use nudge_core::{open_route, DeepLinkRouter, NudgeEvent, NudgeType, OpenRoute};

use super::{open_engine, print_report};

/// Prints the route instead of navigating a UI.
struct PrintRouter;

impl DeepLinkRouter for PrintRouter {
    fn navigate(&self, route: &OpenRoute) {
        match serde_json::to_string(route) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::warn!(error = %e, "failed to render route"),
        }
    }
}

pub fn run(nudge: NudgeType, now: NaiveDateTime) -> Result<(), Box<dyn std::error::Error>> {
    let engine = open_engine()?;
    let facts = engine.current_facts(now)?;
    PrintRouter.navigate(&open_route(nudge, &facts));

    let report = engine.on_event(
        NudgeEvent::NotificationOpened {
            nudge,
            date: now.date(),
        },
        now,
    );
    print_report(&report)
}
