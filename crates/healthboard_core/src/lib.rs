//! Healthboard core: pure session state machine, refresh coordinator and
//! view filter engine.
mod document;
mod effect;
mod error;
mod filter;
mod group;
mod highlight;
mod logs;
mod msg;
mod refresh;
mod render;
mod snapshot;
mod sort;
mod state;
mod update;
mod view_model;

pub use document::{Block, Card, Column, Document, Row, Section, Table, TableBlock, Tone};
pub use effect::{Effect, FetchPurpose};
pub use error::{ApiError, FailureKind};
pub use filter::{filter_document, FilterOutcome, Filters, SectionKey};
pub use group::{GroupId, MatchScope, RefreshMode, ViewKind};
pub use highlight::{
    contains_ignore_case, highlight_all, highlight_first, MarkedText, SearchQuery, Segment,
};
pub use logs::{
    fallback_log_types, level_tone, truncate_message, LogColumn, LogEntry, LogPeriod, LogQuery,
    LogResults, LogTypeInfo, LogViewerState, OneOrMany, RawLogEntry, ServerLogs,
    MESSAGE_DISPLAY_LIMIT,
};
pub use msg::Msg;
pub use refresh::{
    PollVerdict, RefreshCoordinator, RefreshCycle, RefreshPhase, RefreshTimings, TaskReply,
    TimerSlot,
};
pub use render::{
    default_role_sort, event_type_tone, is_critical, render_document, render_stats,
    RoleSwitchColumn, CRITICAL_THRESHOLD,
};
pub use snapshot::{
    decode_snapshot, Cluster, ClusterNode, ClusterRole, ClustersSnapshot, DiskUsage, FileServer,
    FileShare, FileSharesSnapshot, FirewallProfiles, HealthSnapshot, IisItem, IisStatus,
    LooseText, MqServer, PendingUpdate, PendingUpdates, ProcessUsage, Queue, QueueManager,
    QueuesSnapshot, RamUsage, RoleSwitch, RoleSwitchSnapshot, ServerHealth, ServiceState,
    Snapshot, SnapshotMeta, SqlDatabase, SqlInstance, SqlSnapshot,
};
pub use sort::{
    compare_values, parse_integer, parse_timestamp, CompareKind, SortColumn, SortDirection,
    SortRow, SortState,
};
pub use state::{AppState, SessionSettings, ViewContent, ViewState, DEFAULT_GROUP};
pub use update::{load_error_text, update};
pub use view_model::{
    AppViewModel, BlockView, CardView, ContentView, LogRowView, LogServerTabView, LogViewerView,
    RowView, SearchBarView, SectionView, StatsView, TabView, TableView,
};
