use crate::effect::FetchPurpose;
use crate::logs::{LogPeriod, LogResults, LogTypeInfo};
use crate::refresh::{TaskReply, TimerSlot};
use crate::{ApiError, GroupId, Snapshot};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// Session opened; load the initial tab and arm the background check.
    Started,
    /// User picked a tab.
    TabSelected(GroupId),
    /// User clicked the refresh button.
    RefreshClicked,
    /// User edited the shared search box.
    SearchChanged(String),
    /// User toggled the critical-only filter.
    CriticalFilterToggled,
    /// User expanded or collapsed a card section.
    SectionToggled { card: String, section: String },
    /// User clicked a sortable column header.
    SortClicked(String),
    /// Engine finished a snapshot fetch.
    SnapshotLoaded {
        group: GroupId,
        purpose: FetchPurpose,
        result: Result<Snapshot, ApiError>,
    },
    /// Engine answered the task status query.
    TaskStatusReceived {
        generation: u64,
        result: Result<TaskReply, ApiError>,
    },
    /// Engine answered the task start request.
    TaskStartReceived {
        generation: u64,
        result: Result<TaskReply, ApiError>,
    },
    /// A scheduled timer elapsed.
    TimerFired { timer: TimerSlot, generation: u64 },
    /// Event log: server list input changed.
    LogServersChanged(String),
    LogTypeSelected(String),
    LogPeriodSelected(LogPeriod),
    LogQuerySubmitted,
    LogTypesLoaded(Result<Vec<LogTypeInfo>, ApiError>),
    LogsLoaded {
        request: u64,
        result: Result<LogResults, ApiError>,
    },
    LogServerSelected(String),
    LogSearchChanged(String),
}
