use healthboard_logging::{board_debug, board_warn};

use crate::effect::FetchPurpose;
use crate::filter::SectionKey;
use crate::logs::{fallback_log_types, LogColumn};
use crate::refresh::{PollVerdict, TimerSlot};
use crate::render::RoleSwitchColumn;
use crate::sort::SortColumn;
use crate::{ApiError, AppState, Effect, FailureKind, Msg, RefreshMode, Snapshot, ViewKind};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => {
            let mut effects = load_effects(&state);
            effects.push(background_check(&state));
            state.mark_dirty();
            effects
        }
        Msg::TabSelected(group) => {
            if !state.is_known_tab(&group) {
                board_warn!("Ignoring unknown tab {group}");
                return (state, Vec::new());
            }
            let mut effects = state.refresh_mut().cancel();
            state.replace_view(group);
            effects.extend(load_effects(&state));
            state.mark_dirty();
            effects
        }
        Msg::RefreshClicked => {
            let view = state.view_state();
            let group = view.group().clone();
            let effects = match view.kind().refresh_mode() {
                RefreshMode::None => Vec::new(),
                RefreshMode::Reload => state.refresh_mut().begin_reload(group),
                RefreshMode::Task => {
                    let old_version = view.displayed_version().map(str::to_string);
                    state.refresh_mut().begin_task(group, old_version)
                }
            };
            if !effects.is_empty() {
                state.mark_dirty();
            }
            effects
        }
        Msg::SearchChanged(raw) => {
            if state.view_state().kind().is_searchable() {
                state.view_mut().set_search(&raw);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::CriticalFilterToggled => {
            let view = state.view_state();
            if view.kind().supports_critical_filter() {
                let on = !view.critical_only();
                state.view_mut().set_critical_only(on);
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SectionToggled { card, section } => {
            state.view_mut().toggle_section(SectionKey::new(card, section));
            state.mark_dirty();
            Vec::new()
        }
        Msg::SortClicked(key) => {
            apply_sort(&mut state, &key);
            Vec::new()
        }
        Msg::SnapshotLoaded {
            group,
            purpose,
            result,
        } => {
            if &group != state.view_state().group() {
                board_debug!("Dropping {purpose:?} result for inactive group {group}");
                return (state, Vec::new());
            }
            apply_snapshot(&mut state, purpose, result)
        }
        Msg::TaskStatusReceived { generation, result } => {
            state.mark_dirty();
            state.refresh_mut().on_task_status(generation, result)
        }
        Msg::TaskStartReceived { generation, result } => {
            state.mark_dirty();
            state.refresh_mut().on_task_started(generation, result)
        }
        Msg::TimerFired { timer, generation } => match timer {
            TimerSlot::BackgroundCheck => {
                let view = state.view_state();
                let mut effects = vec![background_check(&state)];
                if view.kind().is_background_polled() {
                    effects.push(Effect::FetchSnapshot {
                        group: view.group().clone(),
                        purpose: FetchPurpose::Background,
                    });
                }
                effects
            }
            TimerSlot::RefreshPoll => {
                let group = state.view_state().group().clone();
                state.mark_dirty();
                state.refresh_mut().on_poll_timer(generation, &group)
            }
            TimerSlot::ProgressDismiss => {
                if state.refresh_mut().on_dismiss(generation) {
                    state.mark_dirty();
                }
                Vec::new()
            }
        },
        Msg::LogServersChanged(raw) => {
            with_logs(&mut state, |logs| logs.set_servers_input(&raw));
            Vec::new()
        }
        Msg::LogTypeSelected(name) => {
            with_logs(&mut state, |logs| logs.set_log_type(&name));
            Vec::new()
        }
        Msg::LogPeriodSelected(period) => {
            with_logs(&mut state, |logs| logs.set_period(period));
            Vec::new()
        }
        Msg::LogQuerySubmitted => {
            let Some(submitted) = state.view_mut().logs_mut().map(|logs| logs.submit()) else {
                return (state, Vec::new());
            };
            state.mark_dirty();
            match submitted {
                Ok(query) => {
                    let request = state.next_log_request();
                    vec![Effect::FetchLogs { request, query }]
                }
                Err(message) => {
                    board_debug!("Log query rejected: {message}");
                    Vec::new()
                }
            }
        }
        Msg::LogTypesLoaded(result) => {
            let types = match result {
                Ok(types) if !types.is_empty() => types,
                Ok(_) => fallback_log_types(),
                Err(err) => {
                    board_warn!("Could not load log types, using defaults: {err}");
                    fallback_log_types()
                }
            };
            state.set_log_types(types);
            state.mark_dirty();
            Vec::new()
        }
        Msg::LogsLoaded { request, result } => {
            if request != state.log_request() {
                board_debug!("Dropping stale log results for request {request}");
                return (state, Vec::new());
            }
            with_logs(&mut state, |logs| logs.apply_results(result));
            Vec::new()
        }
        Msg::LogServerSelected(name) => {
            with_logs(&mut state, |logs| {
                logs.select_server(&name);
            });
            Vec::new()
        }
        Msg::LogSearchChanged(raw) => {
            with_logs(&mut state, |logs| logs.set_search(&raw));
            Vec::new()
        }
    };

    (state, effects)
}

fn load_effects(state: &AppState) -> Vec<Effect> {
    let view = state.view_state();
    if view.kind().has_snapshot() {
        vec![Effect::FetchSnapshot {
            group: view.group().clone(),
            purpose: FetchPurpose::Load,
        }]
    } else if state.log_types().is_none() {
        vec![Effect::LoadLogTypes]
    } else {
        Vec::new()
    }
}

fn background_check(state: &AppState) -> Effect {
    Effect::Schedule {
        timer: TimerSlot::BackgroundCheck,
        generation: 0,
        after: state.refresh().timings().background_interval,
    }
}

/// Text shown in place of the view when the primary load fails.
pub fn load_error_text(err: &ApiError) -> String {
    match err.kind {
        FailureKind::Remote | FailureKind::InvalidResponse => err.message.clone(),
        _ => format!("Error loading data: {}", err.message),
    }
}

fn show_result(state: &mut AppState, result: Result<Snapshot, ApiError>) {
    match result {
        Ok(snapshot) => state.view_mut().show_snapshot(snapshot),
        Err(err) => state.view_mut().show_error(load_error_text(&err)),
    }
    state.mark_dirty();
}

fn apply_snapshot(
    state: &mut AppState,
    purpose: FetchPurpose,
    result: Result<Snapshot, ApiError>,
) -> Vec<Effect> {
    match purpose {
        FetchPurpose::Load => {
            show_result(state, result);
            Vec::new()
        }
        FetchPurpose::Background => {
            let snapshot = match result {
                Ok(snapshot) => snapshot,
                Err(err) => {
                    board_debug!("Background check failed: {err}");
                    return Vec::new();
                }
            };
            let replace = match state.view_state().displayed_version() {
                None => true,
                Some(shown) => snapshot.version().is_some_and(|v| v != shown),
            };
            if replace {
                state.view_mut().show_snapshot(snapshot);
                state.mark_dirty();
            }
            Vec::new()
        }
        FetchPurpose::Poll { generation } => {
            match state.refresh_mut().on_poll_result(generation, result) {
                PollVerdict::Ignored => Vec::new(),
                PollVerdict::Continue(effects) => {
                    state.mark_dirty();
                    effects
                }
                PollVerdict::Changed(snapshot) => {
                    state.view_mut().show_snapshot(snapshot);
                    state.mark_dirty();
                    Vec::new()
                }
            }
        }
        FetchPurpose::Reload { generation } => {
            match state.refresh_mut().on_reload_result(generation) {
                Some(effects) => {
                    show_result(state, result);
                    effects
                }
                None => Vec::new(),
            }
        }
    }
}

fn apply_sort(state: &mut AppState, key: &str) {
    match state.view_state().kind() {
        ViewKind::RoleSwitches => {
            if let Some(column) = RoleSwitchColumn::from_key(key) {
                let sort = state.view_state().role_sort().select(column);
                state.view_mut().set_role_sort(sort);
                state.mark_dirty();
            }
        }
        ViewKind::EventLog => {
            if let Some(column) = LogColumn::from_key(key) {
                with_logs(state, |logs| logs.select_sort(column));
            }
        }
        _ => board_debug!("Ignoring sort on unsortable tab"),
    }
}

fn with_logs(state: &mut AppState, apply: impl FnOnce(&mut crate::LogViewerState)) {
    if let Some(logs) = state.view_mut().logs_mut() {
        apply(logs);
        state.mark_dirty();
    }
}
