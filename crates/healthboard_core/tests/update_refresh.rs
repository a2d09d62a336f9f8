use std::sync::Once;
use std::time::Duration;

use healthboard_core::{
    decode_snapshot, update, ApiError, AppState, Effect, FailureKind, FetchPurpose, GroupId, Msg,
    RefreshPhase, Snapshot, TaskReply, TimerSlot, ViewKind,
};
use pretty_assertions::assert_eq;

const V0: &str = "2024-01-01T00:00:00";
const V1: &str = "2024-01-01T00:00:01";

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(healthboard_logging::initialize_for_tests);
}

fn dci() -> GroupId {
    GroupId::new("DCI")
}

fn health(version: &str) -> Snapshot {
    let body = format!(
        r#"{{ "LastUpdate": "{version}", "Servers": [{{ "ServerName": "SRV01", "CPU": 10 }}] }}"#
    );
    decode_snapshot(ViewKind::HealthDashboard, &body)
        .unwrap()
        .unwrap()
}

fn clusters(version: &str) -> Snapshot {
    let body = format!(r#"{{ "LastUpdate": "{version}", "Clusters": [] }}"#);
    decode_snapshot(ViewKind::Clusters, &body).unwrap().unwrap()
}

fn reply(status: &str, task_state: Option<&str>) -> TaskReply {
    TaskReply {
        status: status.to_string(),
        task_state: task_state.map(str::to_string),
        ..TaskReply::default()
    }
}

fn loaded(version: &str) -> AppState {
    let (state, _) = update(AppState::new(), Msg::Started);
    let (state, _) = update(
        state,
        Msg::SnapshotLoaded {
            group: dci(),
            purpose: FetchPurpose::Load,
            result: Ok(health(version)),
        },
    );
    state
}

fn poll_result(
    state: AppState,
    generation: u64,
    result: Result<Snapshot, ApiError>,
) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::SnapshotLoaded {
            group: dci(),
            purpose: FetchPurpose::Poll { generation },
            result,
        },
    )
}

fn fire(state: AppState, timer: TimerSlot, generation: u64) -> (AppState, Vec<Effect>) {
    update(state, Msg::TimerFired { timer, generation })
}

/// Drives a fresh health refresh up to the first scheduled poll.
fn waiting(version: &str) -> AppState {
    let (state, _) = update(loaded(version), Msg::RefreshClicked);
    let (state, _) = update(
        state,
        Msg::TaskStatusReceived {
            generation: 1,
            result: Ok(reply("ok", Some("Ready"))),
        },
    );
    let (state, _) = update(
        state,
        Msg::TaskStartReceived {
            generation: 1,
            result: Ok(reply("started", None)),
        },
    );
    state
}

fn progress(state: &AppState) -> Option<String> {
    state.view().progress
}

#[test]
fn start_loads_active_group_and_arms_background_check() {
    init_logging();
    let (_state, effects) = update(AppState::new(), Msg::Started);
    assert_eq!(
        effects,
        vec![
            Effect::FetchSnapshot {
                group: dci(),
                purpose: FetchPurpose::Load,
            },
            Effect::Schedule {
                timer: TimerSlot::BackgroundCheck,
                generation: 0,
                after: Duration::from_secs(60),
            },
        ]
    );
}

#[test]
fn ready_task_is_started_and_polled_until_version_changes() {
    init_logging();
    let (state, effects) = update(loaded(V0), Msg::RefreshClicked);
    assert_eq!(
        effects,
        vec![
            Effect::CancelTimer {
                timer: TimerSlot::RefreshPoll
            },
            Effect::CancelTimer {
                timer: TimerSlot::ProgressDismiss
            },
            Effect::QueryTaskStatus { generation: 1 },
        ]
    );
    assert_eq!(progress(&state).as_deref(), Some("Checking task status..."));

    let (state, effects) = update(
        state,
        Msg::TaskStatusReceived {
            generation: 1,
            result: Ok(reply("ok", Some("Ready"))),
        },
    );
    assert_eq!(effects, vec![Effect::StartTask { generation: 1 }]);
    assert_eq!(progress(&state).as_deref(), Some("Starting task..."));

    let (state, effects) = update(
        state,
        Msg::TaskStartReceived {
            generation: 1,
            result: Ok(reply("started", None)),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Schedule {
            timer: TimerSlot::RefreshPoll,
            generation: 1,
            after: Duration::from_secs(2),
        }]
    );
    assert_eq!(
        progress(&state).as_deref(),
        Some("Task started - waiting for data...")
    );

    let (state, effects) = fire(state, TimerSlot::RefreshPoll, 1);
    assert_eq!(
        effects,
        vec![Effect::FetchSnapshot {
            group: dci(),
            purpose: FetchPurpose::Poll { generation: 1 },
        }]
    );
    assert_eq!(progress(&state).as_deref(), Some("Refreshing data... (1s)"));

    let (state, effects) = poll_result(state, 1, Ok(health(V0)));
    assert_eq!(
        effects,
        vec![Effect::Schedule {
            timer: TimerSlot::RefreshPoll,
            generation: 1,
            after: Duration::from_secs(1),
        }]
    );

    let (state, _) = fire(state, TimerSlot::RefreshPoll, 1);
    assert_eq!(progress(&state).as_deref(), Some("Refreshing data... (2s)"));
    let (state, effects) = poll_result(state, 1, Ok(health(V1)));
    assert!(effects.is_empty());
    assert_eq!(progress(&state), None);
    assert_eq!(state.refresh().phase(), RefreshPhase::Idle);
    assert_eq!(state.view_state().displayed_version(), Some(V1));
    assert_eq!(state.view().stats.last_update, V1);
}

#[test]
fn running_task_is_awaited_without_starting_it() {
    init_logging();
    let (state, _) = update(loaded(V0), Msg::RefreshClicked);
    let (state, effects) = update(
        state,
        Msg::TaskStatusReceived {
            generation: 1,
            result: Ok(reply("ok", Some("Running"))),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Schedule {
            timer: TimerSlot::RefreshPoll,
            generation: 1,
            after: Duration::from_secs(2),
        }]
    );
    assert_eq!(
        progress(&state).as_deref(),
        Some("Update already running - waiting for it to finish...")
    );
    let (state, _) = fire(state, TimerSlot::RefreshPoll, 1);
    assert_eq!(
        progress(&state).as_deref(),
        Some("Update in progress - waiting... (1s)")
    );
}

#[test]
fn poll_gives_up_after_cap_and_reloads_anyway() {
    init_logging();
    let mut state = waiting(V0);
    let mut polls = 0;
    let mut last_effects = Vec::new();
    for attempt in 1..=120u32 {
        let (next, effects) = fire(state, TimerSlot::RefreshPoll, 1);
        polls += effects
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    Effect::FetchSnapshot {
                        purpose: FetchPurpose::Poll { .. },
                        ..
                    }
                )
            })
            .count();
        // Transport errors mid-poll are not fatal.
        let result = if attempt % 2 == 0 {
            Err(ApiError::new(FailureKind::Network, "connection reset"))
        } else {
            Ok(health(V0))
        };
        let (next, effects) = poll_result(next, 1, result);
        state = next;
        last_effects = effects;
    }
    assert_eq!(polls, 120);
    assert_eq!(
        last_effects,
        vec![Effect::Schedule {
            timer: TimerSlot::RefreshPoll,
            generation: 1,
            after: Duration::from_secs(1),
        }]
    );
    assert_eq!(progress(&state).as_deref(), Some("Timeout - reloading data..."));
    assert_eq!(state.refresh().phase(), RefreshPhase::TimedOut);

    let (state, effects) = fire(state, TimerSlot::RefreshPoll, 1);
    assert_eq!(
        effects,
        vec![Effect::FetchSnapshot {
            group: dci(),
            purpose: FetchPurpose::Reload { generation: 1 },
        }]
    );
    let (state, effects) = update(
        state,
        Msg::SnapshotLoaded {
            group: dci(),
            purpose: FetchPurpose::Reload { generation: 1 },
            result: Ok(health(V0)),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Schedule {
            timer: TimerSlot::ProgressDismiss,
            generation: 1,
            after: Duration::from_millis(500),
        }]
    );
    let (state, _) = fire(state, TimerSlot::ProgressDismiss, 1);
    assert_eq!(progress(&state), None);
}

#[test]
fn blocked_start_is_rejected_and_dismissed() {
    init_logging();
    let (state, _) = update(loaded(V0), Msg::RefreshClicked);
    let (state, _) = update(
        state,
        Msg::TaskStatusReceived {
            generation: 1,
            result: Ok(reply("ok", Some("Ready"))),
        },
    );
    let (state, effects) = update(
        state,
        Msg::TaskStartReceived {
            generation: 1,
            result: Ok(reply("blocked", Some("Queued"))),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Schedule {
            timer: TimerSlot::ProgressDismiss,
            generation: 1,
            after: Duration::from_secs(5),
        }]
    );
    assert_eq!(progress(&state).as_deref(), Some("Task is not ready: Queued"));
    assert_eq!(state.view_state().displayed_version(), Some(V0));

    let (state, _) = fire(state, TimerSlot::ProgressDismiss, 1);
    assert_eq!(progress(&state), None);
}

#[test]
fn unexpected_start_status_reports_original_task_state() {
    init_logging();
    let (state, _) = update(loaded(V0), Msg::RefreshClicked);
    let (state, _) = update(
        state,
        Msg::TaskStatusReceived {
            generation: 1,
            result: Ok(reply("ok", Some("Ready"))),
        },
    );
    let (state, _) = update(
        state,
        Msg::TaskStartReceived {
            generation: 1,
            result: Ok(reply("weird", None)),
        },
    );
    assert_eq!(
        progress(&state).as_deref(),
        Some("Task is not ready (status: Ready)")
    );
}

#[test]
fn status_failures_surface_as_messages() {
    init_logging();
    let cases = vec![
        (
            Ok(TaskReply {
                message: Some("access denied".to_string()),
                ..reply("error", None)
            }),
            "Error: access denied",
        ),
        (
            Ok(reply("ok", Some("Disabled"))),
            "Task is not ready (status: Disabled)",
        ),
        (
            Err(ApiError::new(FailureKind::Network, "connection refused")),
            "Error: connection refused",
        ),
    ];
    for (result, expected) in cases {
        let (state, _) = update(loaded(V0), Msg::RefreshClicked);
        let (state, effects) = update(
            state,
            Msg::TaskStatusReceived {
                generation: 1,
                result,
            },
        );
        assert_eq!(progress(&state).as_deref(), Some(expected));
        assert_eq!(
            effects,
            vec![Effect::Schedule {
                timer: TimerSlot::ProgressDismiss,
                generation: 1,
                after: Duration::from_secs(5),
            }]
        );
        assert_eq!(state.refresh().phase(), RefreshPhase::Idle);
    }
}

#[test]
fn new_refresh_supersedes_waiting_one() {
    init_logging();
    let state = waiting(V0);
    let (state, effects) = update(state, Msg::RefreshClicked);
    assert_eq!(
        effects,
        vec![
            Effect::CancelTimer {
                timer: TimerSlot::RefreshPoll
            },
            Effect::CancelTimer {
                timer: TimerSlot::ProgressDismiss
            },
            Effect::QueryTaskStatus { generation: 2 },
        ]
    );

    // The superseded cycle's timer and responses are dropped.
    let (state, effects) = fire(state, TimerSlot::RefreshPoll, 1);
    assert!(effects.is_empty());
    let (state, effects) = poll_result(state, 1, Ok(health(V1)));
    assert!(effects.is_empty());
    assert_eq!(state.view_state().displayed_version(), Some(V0));
    assert_eq!(state.refresh().phase(), RefreshPhase::CheckingStatus);
}

#[test]
fn tab_switch_cancels_waiting_refresh() {
    init_logging();
    let state = waiting(V0);
    let (state, effects) = update(state, Msg::TabSelected(GroupId::new("ClustersWindows")));
    assert_eq!(
        effects,
        vec![
            Effect::CancelTimer {
                timer: TimerSlot::RefreshPoll
            },
            Effect::CancelTimer {
                timer: TimerSlot::ProgressDismiss
            },
            Effect::FetchSnapshot {
                group: GroupId::new("ClustersWindows"),
                purpose: FetchPurpose::Load,
            },
        ]
    );
    assert_eq!(progress(&state), None);

    let (state, effects) = fire(state, TimerSlot::RefreshPoll, 1);
    assert!(effects.is_empty());
    let (state, effects) = poll_result(state, 1, Ok(health(V1)));
    assert!(effects.is_empty());
    assert_eq!(state.view_state().kind(), ViewKind::Clusters);
    assert!(state.view_state().snapshot().is_none());
}

#[test]
fn infra_refresh_reloads_and_dismisses_shortly_after() {
    init_logging();
    let group = GroupId::new("ClustersWindows");
    let (state, _) = update(loaded(V0), Msg::TabSelected(group.clone()));
    let (state, _) = update(
        state,
        Msg::SnapshotLoaded {
            group: group.clone(),
            purpose: FetchPurpose::Load,
            result: Ok(clusters(V0)),
        },
    );
    let (state, effects) = update(state, Msg::RefreshClicked);
    let generation = state.refresh().generation();
    assert_eq!(
        effects.last(),
        Some(&Effect::FetchSnapshot {
            group: group.clone(),
            purpose: FetchPurpose::Reload { generation },
        })
    );
    assert_eq!(progress(&state).as_deref(), Some("Refreshing data..."));

    let (state, effects) = update(
        state,
        Msg::SnapshotLoaded {
            group,
            purpose: FetchPurpose::Reload { generation },
            result: Ok(clusters(V1)),
        },
    );
    assert_eq!(
        effects,
        vec![Effect::Schedule {
            timer: TimerSlot::ProgressDismiss,
            generation,
            after: Duration::from_millis(500),
        }]
    );
    assert_eq!(state.view_state().displayed_version(), Some(V1));
}

#[test]
fn event_log_tab_has_no_refresh_and_no_background_fetch() {
    init_logging();
    let (state, _) = update(loaded(V0), Msg::TabSelected(GroupId::new("LogiEventLog")));
    let (state, effects) = update(state, Msg::RefreshClicked);
    assert!(effects.is_empty());
    let (_state, effects) = fire(state, TimerSlot::BackgroundCheck, 0);
    assert_eq!(
        effects,
        vec![Effect::Schedule {
            timer: TimerSlot::BackgroundCheck,
            generation: 0,
            after: Duration::from_secs(60),
        }]
    );
}

#[test]
fn background_check_replaces_only_changed_versions() {
    init_logging();
    let mut state = loaded(V0);
    assert!(state.consume_dirty());

    let (mut state, effects) = fire(state, TimerSlot::BackgroundCheck, 0);
    assert_eq!(
        effects[1],
        Effect::FetchSnapshot {
            group: dci(),
            purpose: FetchPurpose::Background,
        }
    );
    assert!(!state.consume_dirty());

    let background = |state, result| {
        update(
            state,
            Msg::SnapshotLoaded {
                group: dci(),
                purpose: FetchPurpose::Background,
                result,
            },
        )
    };

    let (mut state, _) = background(
        state,
        Err(ApiError::new(FailureKind::InvalidResponse, "not json")),
    );
    assert!(!state.consume_dirty());
    assert_eq!(state.view_state().displayed_version(), Some(V0));

    let (mut state, _) = background(state, Err(ApiError::remote("collector offline")));
    assert!(!state.consume_dirty());

    let (mut state, _) = background(state, Ok(health(V0)));
    assert!(!state.consume_dirty());

    let (mut state, _) = background(state, Ok(health(V1)));
    assert!(state.consume_dirty());
    assert_eq!(state.view_state().displayed_version(), Some(V1));
}

#[test]
fn background_check_fills_view_after_failed_load() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::Started);
    let (state, _) = update(
        state,
        Msg::SnapshotLoaded {
            group: dci(),
            purpose: FetchPurpose::Load,
            result: Err(ApiError::new(FailureKind::Network, "connection refused")),
        },
    );
    assert_eq!(
        state.view().content,
        healthboard_core::ContentView::Error("Error loading data: connection refused".to_string())
    );
    let (state, _) = update(
        state,
        Msg::SnapshotLoaded {
            group: dci(),
            purpose: FetchPurpose::Background,
            result: Ok(health(V0)),
        },
    );
    assert_eq!(state.view_state().displayed_version(), Some(V0));
}
