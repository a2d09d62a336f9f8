use healthboard_core::{
    ApiError, FetchPurpose, GroupId, LogResults, LogTypeInfo, Snapshot, TaskReply, TimerSlot,
};
use thiserror::Error;

/// Results reported by the engine thread, in completion order.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    SnapshotFetched {
        group: GroupId,
        purpose: FetchPurpose,
        result: Result<Snapshot, ApiError>,
    },
    TaskStatus {
        generation: u64,
        result: Result<TaskReply, ApiError>,
    },
    TaskStarted {
        generation: u64,
        result: Result<TaskReply, ApiError>,
    },
    LogTypes(Result<Vec<LogTypeInfo>, ApiError>),
    Logs {
        request: u64,
        result: Result<LogResults, ApiError>,
    },
    TimerFired {
        timer: TimerSlot,
        generation: u64,
    },
}

/// Failures while setting the engine up. Request failures travel as
/// [`ApiError`] inside events instead.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid endpoint url {url:?}: {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("could not build http client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("could not start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
