use std::collections::BTreeSet;

use crate::filter::{filter_document, Filters, SectionKey};
use crate::highlight::SearchQuery;
use crate::logs::{fallback_log_types, LogTypeInfo, LogViewerState};
use crate::refresh::{RefreshCoordinator, RefreshTimings};
use crate::render::{default_role_sort, render_document, render_stats, RoleSwitchColumn};
use crate::sort::SortState;
use crate::view_model::{AppViewModel, ContentView, SearchBarView, StatsView, TabView};
use crate::{GroupId, Snapshot, ViewKind};

/// Group shown first when nothing else is configured.
pub const DEFAULT_GROUP: &str = "DCI";

/// Session-wide settings, fixed for the lifetime of an [`AppState`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub tabs: Vec<GroupId>,
    pub initial_group: GroupId,
    pub timings: RefreshTimings,
}

impl Default for SessionSettings {
    fn default() -> Self {
        let mut tabs = vec![GroupId::new(DEFAULT_GROUP)];
        tabs.extend(
            ViewKind::INFRA
                .iter()
                .chain(std::iter::once(&ViewKind::EventLog))
                .filter_map(|kind| kind.group_id())
                .map(GroupId::new),
        );
        Self {
            tabs,
            initial_group: GroupId::new(DEFAULT_GROUP),
            timings: RefreshTimings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewContent {
    Loading,
    Loaded(Snapshot),
    /// Inline error of the primary load.
    Failed(String),
    Logs(Box<LogViewerState>),
}

/// Everything tied to the active tab. Rebuilt from scratch on a tab switch.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    group: GroupId,
    kind: ViewKind,
    content: ViewContent,
    search: SearchQuery,
    critical_only: bool,
    role_sort: SortState<RoleSwitchColumn>,
    collapsed: BTreeSet<SectionKey>,
}

impl ViewState {
    pub fn new(group: GroupId) -> Self {
        let kind = group.kind();
        let content = if kind.has_snapshot() {
            ViewContent::Loading
        } else {
            ViewContent::Logs(Box::default())
        };
        Self {
            group,
            kind,
            content,
            search: SearchQuery::default(),
            critical_only: false,
            role_sort: default_role_sort(),
            collapsed: BTreeSet::new(),
        }
    }

    pub fn group(&self) -> &GroupId {
        &self.group
    }

    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    pub fn content(&self) -> &ViewContent {
        &self.content
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        match &self.content {
            ViewContent::Loaded(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    /// Version of what is on screen, if anything is.
    pub fn displayed_version(&self) -> Option<&str> {
        self.snapshot().and_then(Snapshot::version)
    }

    pub fn search(&self) -> &SearchQuery {
        &self.search
    }

    pub fn critical_only(&self) -> bool {
        self.critical_only
    }

    pub fn role_sort(&self) -> SortState<RoleSwitchColumn> {
        self.role_sort
    }

    pub fn collapsed(&self) -> &BTreeSet<SectionKey> {
        &self.collapsed
    }

    pub fn logs(&self) -> Option<&LogViewerState> {
        match &self.content {
            ViewContent::Logs(logs) => Some(logs.as_ref()),
            _ => None,
        }
    }

    pub(crate) fn logs_mut(&mut self) -> Option<&mut LogViewerState> {
        match &mut self.content {
            ViewContent::Logs(logs) => Some(logs.as_mut()),
            _ => None,
        }
    }

    pub(crate) fn show_snapshot(&mut self, snapshot: Snapshot) {
        self.content = ViewContent::Loaded(snapshot);
    }

    pub(crate) fn show_error(&mut self, message: String) {
        self.content = ViewContent::Failed(message);
    }

    pub(crate) fn set_role_sort(&mut self, sort: SortState<RoleSwitchColumn>) {
        self.role_sort = sort;
    }

    pub(crate) fn set_search(&mut self, raw: &str) {
        self.search = SearchQuery::new(raw);
        self.release_matched_sections();
    }

    pub(crate) fn set_critical_only(&mut self, on: bool) {
        self.critical_only = on;
        if !on {
            self.search = SearchQuery::default();
        }
        self.release_matched_sections();
    }

    pub(crate) fn toggle_section(&mut self, key: SectionKey) {
        if !self.collapsed.remove(&key) {
            self.collapsed.insert(key);
        }
    }

    /// Sections opened by a match stay open once the query goes away.
    fn release_matched_sections(&mut self) {
        let Some(snapshot) = self.snapshot() else {
            return;
        };
        if self.search.is_empty() {
            return;
        }
        let document = render_document(snapshot, self.role_sort);
        let outcome = filter_document(
            self.kind,
            &document,
            Filters {
                query: &self.search,
                critical_only: self.critical_only,
            },
            &self.collapsed,
        );
        for key in outcome.forced_open {
            self.collapsed.remove(&key);
        }
    }

    fn content_view(&self, log_types: &[LogTypeInfo]) -> ContentView {
        match &self.content {
            ViewContent::Loading => ContentView::Loading,
            ViewContent::Failed(message) => ContentView::Error(message.clone()),
            ViewContent::Logs(logs) => ContentView::Logs(logs.view(log_types)),
            ViewContent::Loaded(snapshot) => {
                let document = render_document(snapshot, self.role_sort);
                if let Some(message) = &document.empty_message {
                    return ContentView::Message(message.clone());
                }
                let outcome = filter_document(
                    self.kind,
                    &document,
                    Filters {
                        query: &self.search,
                        critical_only: self.critical_only,
                    },
                    &self.collapsed,
                );
                ContentView::Blocks(outcome.blocks)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    settings: SessionSettings,
    view: ViewState,
    refresh: RefreshCoordinator,
    log_types: Option<Vec<LogTypeInfo>>,
    log_request: u64,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::with_settings(SessionSettings::default())
    }

    pub fn with_settings(settings: SessionSettings) -> Self {
        Self {
            view: ViewState::new(settings.initial_group.clone()),
            refresh: RefreshCoordinator::new(settings.timings),
            settings,
            log_types: None,
            log_request: 0,
            dirty: false,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn refresh(&self) -> &RefreshCoordinator {
        &self.refresh
    }

    pub fn log_types(&self) -> Option<&[LogTypeInfo]> {
        self.log_types.as_deref()
    }

    pub fn log_request(&self) -> u64 {
        self.log_request
    }

    pub fn view(&self) -> AppViewModel {
        let kind = self.view.kind;
        let log_types = self.log_types.clone().unwrap_or_else(fallback_log_types);
        AppViewModel {
            tabs: self
                .settings
                .tabs
                .iter()
                .map(|group| TabView {
                    group: group.clone(),
                    title: match group.kind() {
                        ViewKind::HealthDashboard => group.to_string(),
                        other => other.title().to_string(),
                    },
                    active: group == &self.view.group,
                })
                .collect(),
            stats: self
                .view
                .snapshot()
                .map_or_else(StatsView::placeholder, render_stats),
            search: kind.search_placeholder().map(|placeholder| SearchBarView {
                placeholder,
                query: self.view.search.raw().to_string(),
            }),
            critical_only: kind
                .supports_critical_filter()
                .then_some(self.view.critical_only),
            progress: self.refresh.progress().map(str::to_string),
            content: self.view.content_view(&log_types),
            dirty: self.dirty,
        }
    }

    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    pub(crate) fn refresh_mut(&mut self) -> &mut RefreshCoordinator {
        &mut self.refresh
    }

    pub(crate) fn replace_view(&mut self, group: GroupId) {
        self.view = ViewState::new(group);
        if let (Some(types), Some(logs)) = (self.log_types.as_deref(), self.view.logs_mut()) {
            logs.offer_log_types(types);
        }
    }

    pub(crate) fn set_log_types(&mut self, types: Vec<LogTypeInfo>) {
        if let Some(logs) = self.view.logs_mut() {
            logs.offer_log_types(&types);
        }
        self.log_types = Some(types);
    }

    pub(crate) fn next_log_request(&mut self) -> u64 {
        self.log_request += 1;
        self.log_request
    }

    pub fn is_known_tab(&self, group: &GroupId) -> bool {
        self.settings.tabs.contains(group)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
