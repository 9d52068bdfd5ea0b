//! Integration tests for end-to-end nudge scheduling.
//!
//! Each test drives the reconciler through the same event sequence the app
//! produces and checks what ends up armed.
//!
//! | Scenario | Facts                      | Trigger                     | Expected                          |
//! |----------|----------------------------|-----------------------------|-----------------------------------|
//! | A        | 1 goal, 1 incomplete       | show-up reminder on         | one dailyShowUp tomorrow          |
//! | B        | 0 goals                    | show-up reminder on, tap    | setupNextStep, Suggested lit      |
//! | C        | goal nudge ignored twice   | next pass on day 2          | target day 2 + 2                  |
//! | D        | goal nudge armed for today | show-up recorded            | cancelled, nothing for today      |

mod common;

use std::sync::Arc;

use common::{at, d, deliver_due, harness, with_goals};
use nudge_core::{
    open_route, AppView, Database, Event, GlobalFacts, GlobalKey, LedgerStore, LocalOutbox,
    NudgeEvent, NudgeSettings, NudgeState, NudgeType, Reconciler, ScheduleAction, Scheduler,
    SqliteLedger,
};

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn scenario_a_show_up_with_actionable_goal() {
    let h = harness();
    h.facts.update(|f| with_goals(f, &[1]));

    h.facts.update(|f| f.settings.daily_show_up_enabled = true);
    let report = h.engine.on_event(
        NudgeEvent::SettingsChanged {
            nudge: NudgeType::DailyShowUp,
        },
        at("2026-10-18 10:00"),
    );

    assert!(report.is_clean());
    let show_up = h.primitive.armed_for(NudgeType::DailyShowUp);
    assert_eq!(show_up.len(), 1);
    assert_eq!(show_up[0].fire_at, at("2026-10-19 08:00"));
    assert!(h.primitive.armed_for(NudgeType::SetupNextStep).is_empty());
}

#[test]
fn scenario_b_empty_state_routes_to_suggested() {
    let h = harness();
    h.facts.update(|f| f.settings.daily_show_up_enabled = true);

    let report = h.engine.on_event(
        NudgeEvent::SettingsChanged {
            nudge: NudgeType::DailyShowUp,
        },
        at("2026-10-18 10:00"),
    );

    let decision = report.decision_for(NudgeType::DailyShowUp).unwrap();
    assert_eq!(decision.effective_type(), NudgeType::SetupNextStep);
    assert_eq!(h.primitive.armed_for(NudgeType::SetupNextStep).len(), 1);
    assert!(h.primitive.armed_for(NudgeType::DailyShowUp).is_empty());

    let fired = deliver_due(&h, at("2026-10-19 08:00"));
    assert!(fired.events.contains(&Event::NudgeFired {
        nudge: NudgeType::SetupNextStep,
        date: d("2026-10-19"),
    }));

    let facts = h.engine.current_facts(at("2026-10-19 08:01")).unwrap();
    let route = open_route(NudgeType::SetupNextStep, &facts);
    assert_eq!(route.view, AppView::Activities);
    assert!(route.highlight_suggested);
}

#[test]
fn scenario_c_two_ignored_goal_nudges_back_off() {
    let h = harness();
    h.facts.update(|f| {
        with_goals(f, &[3]);
        f.settings.goal_nudge_enabled = true;
    });

    // Day 1: armed in the morning, fires at 16:00, never opened.
    h.engine.on_event(NudgeEvent::AppForegrounded, at("2026-10-17 09:00"));
    deliver_due(&h, at("2026-10-17 16:00"));

    // Evening pass counts the first ignore and arms day 2.
    let evening = h.engine.on_event(NudgeEvent::AppForegrounded, at("2026-10-17 20:00"));
    assert_eq!(
        evening.decision_for(NudgeType::GoalNudge).unwrap().scheduled_at(),
        Some(at("2026-10-18 16:00"))
    );

    // Day 2: fires, never opened.
    deliver_due(&h, at("2026-10-18 16:00"));
    let report = h.engine.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 20:00"));

    assert!(report.events.contains(&Event::NoOpenRecorded {
        nudge: NudgeType::GoalNudge,
        consecutive_no_open_count: 2,
    }));
    let decision = report.decision_for(NudgeType::GoalNudge).unwrap();
    assert_eq!(decision.base_target, Some(at("2026-10-19 16:00")));
    assert_eq!(decision.scheduled_at(), Some(at("2026-10-20 16:00")));
    assert_eq!(h.primitive.armed().len(), 1);
}

#[test]
fn scenario_d_show_up_cancels_todays_goal_nudge() {
    let h = harness();
    h.facts.update(|f| {
        with_goals(f, &[1]);
        f.settings.goal_nudge_enabled = true;
    });
    h.engine.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 09:00"));
    assert_eq!(h.primitive.armed_for(NudgeType::GoalNudge)[0].fire_at, at("2026-10-18 16:00"));

    let report = h.engine.on_event(
        NudgeEvent::ShowUpRecorded {
            date: d("2026-10-18"),
        },
        at("2026-10-18 11:00"),
    );

    assert_eq!(
        report.decision_for(NudgeType::GoalNudge).unwrap().action,
        ScheduleAction::Cancel
    );
    assert!(h.primitive.armed_for(NudgeType::GoalNudge).is_empty());

    // Later passes the same day keep it that way.
    h.engine.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 15:00"));
    assert!(h.primitive.armed_for(NudgeType::GoalNudge).is_empty());
    assert!(deliver_due(&h, at("2026-10-18 23:59")).events.is_empty());

    // The next day it comes back.
    h.engine.on_event(NudgeEvent::AppForegrounded, at("2026-10-19 09:00"));
    assert_eq!(h.primitive.armed_for(NudgeType::GoalNudge)[0].fire_at, at("2026-10-19 16:00"));
}

// ============================================================================
// Ledger behaviour across passes
// ============================================================================

#[test]
fn opening_resets_backoff_before_next_pass() {
    let h = harness();
    h.facts.update(|f| {
        with_goals(f, &[1]);
        f.settings.goal_nudge_enabled = true;
    });
    for (morning, fire) in [
        ("2026-10-16 09:00", "2026-10-16 16:00"),
        ("2026-10-17 09:00", "2026-10-17 16:00"),
    ] {
        h.engine.on_event(NudgeEvent::AppForegrounded, at(morning));
        deliver_due(&h, at(fire));
    }
    h.engine.on_event(NudgeEvent::AppForegrounded, at("2026-10-17 18:00"));
    let ledger = h.engine.scheduler().ledger();
    assert_eq!(ledger.entry(NudgeType::GoalNudge).unwrap().consecutive_no_open_count, 2);

    h.engine.on_event(
        NudgeEvent::NotificationOpened {
            nudge: NudgeType::GoalNudge,
            date: d("2026-10-17"),
        },
        at("2026-10-17 18:30"),
    );
    let entry = ledger.entry(NudgeType::GoalNudge).unwrap();
    assert_eq!(entry.consecutive_no_open_count, 0);
    assert_eq!(NudgeState::of(&entry), NudgeState::Scheduled);

    let report = h.engine.on_event(NudgeEvent::AppForegrounded, at("2026-10-17 19:00"));
    assert_eq!(
        report.decision_for(NudgeType::GoalNudge).unwrap().scheduled_at(),
        Some(at("2026-10-18 16:00"))
    );
}

#[test]
fn disabling_then_enabling_does_not_skip_a_day() {
    let h = harness();
    h.facts.update(|f| {
        with_goals(f, &[1]);
        f.settings.daily_show_up_enabled = true;
    });
    let settings_changed = NudgeEvent::SettingsChanged {
        nudge: NudgeType::DailyShowUp,
    };

    h.engine.on_event(settings_changed.clone(), at("2026-10-18 10:00"));
    h.facts.update(|f| f.settings.daily_show_up_enabled = false);
    h.engine.on_event(settings_changed.clone(), at("2026-10-18 10:01"));
    assert!(h.primitive.armed().is_empty());

    h.facts.update(|f| f.settings.daily_show_up_enabled = true);
    h.engine.on_event(settings_changed, at("2026-10-18 10:02"));
    assert_eq!(h.primitive.armed_for(NudgeType::DailyShowUp)[0].fire_at, at("2026-10-19 08:00"));
}

#[test]
fn focus_session_skips_same_day_reminder() {
    let h = harness();
    h.facts.update(|f| f.settings.daily_focus_enabled = true);
    h.engine.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 09:00"));
    assert_eq!(h.primitive.armed_for(NudgeType::DailyFocus)[0].fire_at, at("2026-10-19 20:00"));

    h.engine.on_event(
        NudgeEvent::FocusSessionCompleted {
            date: d("2026-10-19"),
        },
        at("2026-10-19 12:00"),
    );
    assert_eq!(h.primitive.armed_for(NudgeType::DailyFocus)[0].fire_at, at("2026-10-20 20:00"));
    assert_eq!(
        h.engine
            .scheduler()
            .ledger()
            .global(GlobalKey::LastFocusCompletedDate)
            .unwrap(),
        Some(d("2026-10-19"))
    );
}

// ============================================================================
// SQLite-backed engine
// ============================================================================

#[test]
fn sqlite_engine_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nudge.db");
    let mut facts = GlobalFacts {
        settings: NudgeSettings {
            daily_show_up_enabled: true,
            goal_nudge_enabled: true,
            ..Default::default()
        },
        ..Default::default()
    };
    with_goals(&mut facts, &[2]);

    let open = || {
        let db = Arc::new(Database::open_at(&path).unwrap());
        Reconciler::new(
            Scheduler::new(
                SqliteLedger::new(Arc::clone(&db)),
                LocalOutbox::new(db, true),
            ),
            nudge_core::StaticFacts(facts.clone()),
        )
    };

    {
        let engine = open();
        let report = engine.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 09:00"));
        assert!(report.is_clean());
        assert_eq!(engine.scheduler().primitive().list().unwrap().len(), 2);
    }

    let engine = open();
    let report = engine.on_event(NudgeEvent::AppForegrounded, at("2026-10-18 09:30"));
    assert!(report
        .decisions
        .iter()
        .all(|d| d.action == ScheduleAction::NoChange));
    assert!(report.events.is_empty());

    let due = engine
        .scheduler()
        .primitive()
        .take_due(at("2026-10-18 16:00"))
        .unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].effective, NudgeType::GoalNudge);
    engine.on_event(
        NudgeEvent::NotificationFired {
            nudge: NudgeType::GoalNudge,
            date: d("2026-10-18"),
            handle: Some(due[0].handle.clone()),
        },
        at("2026-10-18 16:00"),
    );
    let entry = engine.scheduler().ledger().entry(NudgeType::GoalNudge).unwrap();
    assert_eq!(NudgeState::of(&entry), NudgeState::PendingOpen);
}
