use std::time::Duration;

use crate::logs::LogQuery;
use crate::refresh::TimerSlot;
use crate::GroupId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchSnapshot {
        group: GroupId,
        purpose: FetchPurpose,
    },
    QueryTaskStatus {
        generation: u64,
    },
    StartTask {
        generation: u64,
    },
    LoadLogTypes,
    FetchLogs {
        request: u64,
        query: LogQuery,
    },
    /// Arms `timer`, replacing whatever was pending in that slot.
    Schedule {
        timer: TimerSlot,
        generation: u64,
        after: Duration,
    },
    CancelTimer {
        timer: TimerSlot,
    },
}

/// Why a snapshot is fetched; echoed back with the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPurpose {
    /// Initial load of a tab.
    Load,
    /// Periodic check for a newer version.
    Background,
    /// Poll while waiting for the collection task.
    Poll { generation: u64 },
    /// Explicit reload, shown with the progress indicator.
    Reload { generation: u64 },
}
