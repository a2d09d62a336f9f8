use crate::document::{Column, Tone};
use crate::highlight::MarkedText;
use crate::logs::{LogPeriod, LogTypeInfo};
use crate::GroupId;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub tabs: Vec<TabView>,
    pub stats: StatsView,
    pub search: Option<SearchBarView>,
    /// `None` on tabs without the critical-only toggle.
    pub critical_only: Option<bool>,
    pub progress: Option<String>,
    pub content: ContentView,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabView {
    pub group: GroupId,
    pub title: String,
    pub active: bool,
}

/// Header counters. Every field is display-ready text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsView {
    pub last_update: String,
    pub duration: String,
    pub total: String,
    pub success: String,
    pub failed: String,
    pub critical: String,
}

impl StatsView {
    pub fn placeholder() -> Self {
        Self {
            last_update: "-".to_string(),
            duration: "-".to_string(),
            total: "-".to_string(),
            success: "-".to_string(),
            failed: "-".to_string(),
            critical: "-".to_string(),
        }
    }
}

impl Default for StatsView {
    fn default() -> Self {
        Self::placeholder()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchBarView {
    pub placeholder: &'static str,
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContentView {
    #[default]
    Loading,
    /// Nothing to show, e.g. "No data".
    Message(String),
    Error(String),
    Blocks(Vec<BlockView>),
    Logs(LogViewerView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockView {
    Card(CardView),
    Table(TableView),
}

impl BlockView {
    pub fn key(&self) -> &str {
        match self {
            BlockView::Card(card) => &card.key,
            BlockView::Table(table) => &table.key,
        }
    }

    pub fn is_visible(&self) -> bool {
        match self {
            BlockView::Card(card) => card.visible,
            BlockView::Table(table) => table.visible,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardView {
    pub key: String,
    pub visible: bool,
    /// The card itself matched the query (not only a nested row).
    pub highlighted: bool,
    pub tone: Tone,
    pub critical: bool,
    pub title: MarkedText,
    pub badges: Vec<MarkedText>,
    pub lines: Vec<MarkedText>,
    pub sections: Vec<SectionView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionView {
    pub name: String,
    pub title: MarkedText,
    pub collapsible: bool,
    pub expanded: bool,
    pub lines: Vec<MarkedText>,
    pub table: Option<TableView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableView {
    /// Empty for tables nested in a card section.
    pub key: String,
    pub title: String,
    pub subtitle: String,
    pub visible: bool,
    pub columns: Vec<Column>,
    pub rows: Vec<RowView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub cells: Vec<MarkedText>,
    pub visible: bool,
    pub highlighted: bool,
    pub tone: Tone,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogViewerView {
    pub log_types: Vec<LogTypeInfo>,
    pub servers_input: String,
    pub selected_type: Option<String>,
    pub period: LogPeriod,
    pub loading: bool,
    pub error: Option<String>,
    pub server_tabs: Vec<LogServerTabView>,
    pub search: String,
    /// "Found: N of M" while searching, "Total: M" otherwise.
    pub count_text: String,
    pub columns: Vec<Column>,
    pub rows: Vec<LogRowView>,
    /// Single message row shown instead of entries.
    pub notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogServerTabView {
    pub name: String,
    /// "NAME (count)"; failed servers count 0.
    pub label: String,
    pub active: bool,
    pub failed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRowView {
    pub time: MarkedText,
    pub level: MarkedText,
    pub event_id: MarkedText,
    pub source: MarkedText,
    pub message: MarkedText,
    pub tone: Tone,
}
