//! Refresh coordinator.
//!
//! Health tabs refresh by asking the backend to run its collection task and
//! then polling the snapshot until its `LastUpdate` changes. Infrastructure
//! tabs simply re-fetch. Every cycle gets a fresh generation number; timers
//! and responses carrying an older generation are ignored.

use std::time::Duration;

use healthboard_logging::{board_debug, board_error, board_info, board_warn};
use serde::Deserialize;
use serde_json::Value;

use crate::effect::{Effect, FetchPurpose};
use crate::{ApiError, GroupId, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTimings {
    pub background_interval: Duration,
    /// Delay before the first poll after the task was started.
    pub poll_grace: Duration,
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    /// How long rejections and errors stay on screen.
    pub message_dismiss: Duration,
    pub reload_dismiss: Duration,
    pub timeout_reload_delay: Duration,
}

impl Default for RefreshTimings {
    fn default() -> Self {
        Self {
            background_interval: Duration::from_secs(60),
            poll_grace: Duration::from_secs(2),
            poll_interval: Duration::from_secs(1),
            max_poll_attempts: 120,
            message_dismiss: Duration::from_secs(5),
            reload_dismiss: Duration::from_millis(500),
            timeout_reload_delay: Duration::from_secs(1),
        }
    }
}

/// Named timer slots. Scheduling into a slot replaces its pending timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerSlot {
    BackgroundCheck,
    RefreshPoll,
    ProgressDismiss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    CheckingStatus,
    StartingTask,
    Waiting,
    TimedOut,
    Reloading,
}

/// Reply of the `taskstatus` and `refresh` actions.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct TaskReply {
    pub status: String,
    #[serde(rename = "taskState")]
    pub task_state: Option<String>,
    pub message: Option<String>,
    pub debug: Option<Value>,
}

impl TaskReply {
    fn task_state_text(&self) -> &str {
        self.task_state.as_deref().unwrap_or("unknown")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshCycle {
    pub generation: u64,
    pub group: GroupId,
    pub old_version: Option<String>,
    pub attempts: u32,
    pub already_running: bool,
    pub phase: RefreshPhase,
    /// Task state reported by the status query.
    pub status_state: Option<String>,
}

/// What to do with a poll response.
#[derive(Debug, Clone, PartialEq)]
pub enum PollVerdict {
    /// Stale or unexpected; drop it.
    Ignored,
    Continue(Vec<Effect>),
    Changed(Snapshot),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RefreshCoordinator {
    timings: RefreshTimings,
    generation: u64,
    cycle: Option<RefreshCycle>,
    progress: Option<String>,
}

impl RefreshCoordinator {
    pub fn new(timings: RefreshTimings) -> Self {
        Self {
            timings,
            ..Self::default()
        }
    }

    pub fn timings(&self) -> &RefreshTimings {
        &self.timings
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cycle(&self) -> Option<&RefreshCycle> {
        self.cycle.as_ref()
    }

    pub fn phase(&self) -> RefreshPhase {
        self.cycle.as_ref().map_or(RefreshPhase::Idle, |c| c.phase)
    }

    pub fn progress(&self) -> Option<&str> {
        self.progress.as_deref()
    }

    fn is_current(&self, generation: u64) -> bool {
        generation == self.generation && self.cycle.is_some()
    }

    fn cycle_mut(&mut self) -> Option<&mut RefreshCycle> {
        self.cycle.as_mut()
    }

    /// Supersedes whatever was running and opens a new cycle.
    fn open(
        &mut self,
        group: GroupId,
        old_version: Option<String>,
        phase: RefreshPhase,
        text: &str,
    ) -> Vec<Effect> {
        if let Some(previous) = &self.cycle {
            board_debug!(
                "Refresh generation {} superseded in phase {:?}",
                previous.generation,
                previous.phase
            );
        }
        self.generation += 1;
        self.cycle = Some(RefreshCycle {
            generation: self.generation,
            group,
            old_version,
            attempts: 0,
            already_running: false,
            phase,
            status_state: None,
        });
        self.progress = Some(text.to_string());
        vec![
            Effect::CancelTimer {
                timer: TimerSlot::RefreshPoll,
            },
            Effect::CancelTimer {
                timer: TimerSlot::ProgressDismiss,
            },
        ]
    }

    pub fn begin_task(&mut self, group: GroupId, old_version: Option<String>) -> Vec<Effect> {
        board_info!("Refresh requested for group {group}");
        let mut effects = self.open(
            group,
            old_version,
            RefreshPhase::CheckingStatus,
            "Checking task status...",
        );
        effects.push(Effect::QueryTaskStatus {
            generation: self.generation,
        });
        effects
    }

    pub fn begin_reload(&mut self, group: GroupId) -> Vec<Effect> {
        board_info!("Reload requested for group {group}");
        let mut effects = self.open(
            group.clone(),
            None,
            RefreshPhase::Reloading,
            "Refreshing data...",
        );
        effects.push(Effect::FetchSnapshot {
            group,
            purpose: FetchPurpose::Reload {
                generation: self.generation,
            },
        });
        effects
    }

    /// Abandons the active cycle, e.g. on a tab switch.
    pub fn cancel(&mut self) -> Vec<Effect> {
        self.generation += 1;
        self.progress = None;
        if let Some(cycle) = self.cycle.take() {
            board_debug!("Refresh generation {} cancelled", cycle.generation);
        }
        vec![
            Effect::CancelTimer {
                timer: TimerSlot::RefreshPoll,
            },
            Effect::CancelTimer {
                timer: TimerSlot::ProgressDismiss,
            },
        ]
    }

    /// Ends the cycle with a message that disappears after a while.
    fn fail(&mut self, text: String) -> Vec<Effect> {
        board_warn!("Refresh generation {} ended: {text}", self.generation);
        self.cycle = None;
        self.progress = Some(text);
        vec![Effect::Schedule {
            timer: TimerSlot::ProgressDismiss,
            generation: self.generation,
            after: self.timings.message_dismiss,
        }]
    }

    fn wait(&mut self, already_running: bool, text: &str) -> Vec<Effect> {
        let generation = self.generation;
        let grace = self.timings.poll_grace;
        if let Some(cycle) = self.cycle_mut() {
            cycle.phase = RefreshPhase::Waiting;
            cycle.already_running = already_running;
            cycle.attempts = 0;
        }
        self.progress = Some(text.to_string());
        vec![Effect::Schedule {
            timer: TimerSlot::RefreshPoll,
            generation,
            after: grace,
        }]
    }

    fn log_remote_debug(reply: &TaskReply) {
        if let Some(debug) = &reply.debug {
            board_error!("Task endpoint debug: {debug}");
        }
    }

    pub fn on_task_status(
        &mut self,
        generation: u64,
        result: Result<TaskReply, ApiError>,
    ) -> Vec<Effect> {
        if !self.is_current(generation) || self.phase() != RefreshPhase::CheckingStatus {
            board_debug!("Dropping stale task status for generation {generation}");
            return Vec::new();
        }
        let reply = match result {
            Ok(reply) => reply,
            Err(err) => return self.fail(format!("Error: {}", err.message)),
        };
        if reply.status == "error" {
            Self::log_remote_debug(&reply);
            return self.fail(format!("Error: {}", reply.message.unwrap_or_default()));
        }
        if let Some(cycle) = self.cycle_mut() {
            cycle.status_state = reply.task_state.clone();
        }
        match reply.task_state.as_deref() {
            Some("Running") => {
                self.wait(true, "Update already running - waiting for it to finish...")
            }
            Some("Ready") => {
                if let Some(cycle) = self.cycle_mut() {
                    cycle.phase = RefreshPhase::StartingTask;
                }
                self.progress = Some("Starting task...".to_string());
                vec![Effect::StartTask { generation }]
            }
            _ => {
                let state = reply.task_state_text().to_string();
                self.fail(format!("Task is not ready (status: {state})"))
            }
        }
    }

    pub fn on_task_started(
        &mut self,
        generation: u64,
        result: Result<TaskReply, ApiError>,
    ) -> Vec<Effect> {
        if !self.is_current(generation) || self.phase() != RefreshPhase::StartingTask {
            board_debug!("Dropping stale task start for generation {generation}");
            return Vec::new();
        }
        let reply = match result {
            Ok(reply) => reply,
            Err(err) => return self.fail(format!("Error: {}", err.message)),
        };
        match reply.status.as_str() {
            "error" => {
                Self::log_remote_debug(&reply);
                self.fail(format!("Error: {}", reply.message.unwrap_or_default()))
            }
            "started" => self.wait(false, "Task started - waiting for data..."),
            "blocked" => self.fail(format!("Task is not ready: {}", reply.task_state_text())),
            _ => {
                let state = self
                    .cycle
                    .as_ref()
                    .and_then(|c| c.status_state.clone())
                    .unwrap_or_else(|| "unknown".to_string());
                self.fail(format!("Task is not ready (status: {state})"))
            }
        }
    }

    /// A `RefreshPoll` timer fired.
    pub fn on_poll_timer(&mut self, generation: u64, active_group: &GroupId) -> Vec<Effect> {
        if !self.is_current(generation) {
            return Vec::new();
        }
        let Some(cycle) = self.cycle.as_mut() else {
            return Vec::new();
        };
        if &cycle.group != active_group {
            board_debug!("Refresh for {} outlived its tab", cycle.group);
            return Vec::new();
        }
        match cycle.phase {
            RefreshPhase::Waiting => {
                cycle.attempts += 1;
                let text = if cycle.already_running {
                    format!("Update in progress - waiting... ({}s)", cycle.attempts)
                } else {
                    format!("Refreshing data... ({}s)", cycle.attempts)
                };
                let effect = Effect::FetchSnapshot {
                    group: cycle.group.clone(),
                    purpose: FetchPurpose::Poll { generation },
                };
                self.progress = Some(text);
                vec![effect]
            }
            RefreshPhase::TimedOut => {
                cycle.phase = RefreshPhase::Reloading;
                vec![Effect::FetchSnapshot {
                    group: cycle.group.clone(),
                    purpose: FetchPurpose::Reload { generation },
                }]
            }
            _ => Vec::new(),
        }
    }

    pub fn on_poll_result(
        &mut self,
        generation: u64,
        result: Result<Snapshot, ApiError>,
    ) -> PollVerdict {
        if !self.is_current(generation) || self.phase() != RefreshPhase::Waiting {
            return PollVerdict::Ignored;
        }
        let timings = self.timings;
        let Some(cycle) = self.cycle.as_mut() else {
            return PollVerdict::Ignored;
        };

        match result {
            Ok(snapshot) => {
                let changed = snapshot
                    .version()
                    .is_some_and(|v| Some(v) != cycle.old_version.as_deref());
                if changed {
                    board_info!(
                        "Snapshot for {} changed after {} polls",
                        cycle.group,
                        cycle.attempts
                    );
                    self.cycle = None;
                    self.progress = None;
                    return PollVerdict::Changed(snapshot);
                }
            }
            Err(err) => board_debug!("Poll {} failed: {err}", cycle.attempts),
        }

        if cycle.attempts < timings.max_poll_attempts {
            return PollVerdict::Continue(vec![Effect::Schedule {
                timer: TimerSlot::RefreshPoll,
                generation,
                after: timings.poll_interval,
            }]);
        }
        board_warn!(
            "Refresh for {} timed out after {} polls",
            cycle.group,
            cycle.attempts
        );
        cycle.phase = RefreshPhase::TimedOut;
        self.progress = Some("Timeout - reloading data...".to_string());
        PollVerdict::Continue(vec![Effect::Schedule {
            timer: TimerSlot::RefreshPoll,
            generation,
            after: timings.timeout_reload_delay,
        }])
    }

    /// A reload fetch finished. Returns `None` when the result is stale.
    pub fn on_reload_result(&mut self, generation: u64) -> Option<Vec<Effect>> {
        if !self.is_current(generation) || self.phase() != RefreshPhase::Reloading {
            return None;
        }
        self.cycle = None;
        Some(vec![Effect::Schedule {
            timer: TimerSlot::ProgressDismiss,
            generation,
            after: self.timings.reload_dismiss,
        }])
    }

    pub fn on_dismiss(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.progress.is_none() {
            return false;
        }
        self.progress = None;
        true
    }
}
