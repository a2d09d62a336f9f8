//! On-demand Windows event-log viewer.
//!
//! Logs are fetched per query (several servers at once), shown one server at
//! a time, sorted by column and filtered by a local search box.

use std::borrow::Cow;
use std::fmt;

use chrono::DateTime;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

use crate::document::{Column, Tone};
use crate::highlight::{contains_ignore_case, highlight_all, MarkedText, SearchQuery};
use crate::snapshot::{text, LooseText};
use crate::sort::{
    parse_integer, parse_timestamp, CompareKind, SortColumn, SortDirection, SortRow, SortState,
};
use crate::view_model::{LogRowView, LogServerTabView, LogViewerView};
use crate::ApiError;

/// Messages longer than this are cut in the table.
pub const MESSAGE_DISPLAY_LIMIT: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogTypeInfo {
    pub name: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
}

impl LogTypeInfo {
    pub fn new(name: &str, display_name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: display_name.to_string(),
        }
    }
}

/// Used when the backend cannot list its configured log types.
pub fn fallback_log_types() -> Vec<LogTypeInfo> {
    vec![
        LogTypeInfo::new("Application", "Application"),
        LogTypeInfo::new("System", "System"),
    ]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LogPeriod {
    TenMinutes,
    ThirtyMinutes,
    #[default]
    OneHour,
    TwoHours,
    SixHours,
    TwelveHours,
    Day,
}

impl LogPeriod {
    pub const ALL: [LogPeriod; 7] = [
        LogPeriod::TenMinutes,
        LogPeriod::ThirtyMinutes,
        LogPeriod::OneHour,
        LogPeriod::TwoHours,
        LogPeriod::SixHours,
        LogPeriod::TwelveHours,
        LogPeriod::Day,
    ];

    /// Wire token for the `period` parameter.
    pub fn token(self) -> &'static str {
        match self {
            LogPeriod::TenMinutes => "10min",
            LogPeriod::ThirtyMinutes => "30min",
            LogPeriod::OneHour => "1h",
            LogPeriod::TwoHours => "2h",
            LogPeriod::SixHours => "6h",
            LogPeriod::TwelveHours => "12h",
            LogPeriod::Day => "24h",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LogPeriod::TenMinutes => "last 10 minutes",
            LogPeriod::ThirtyMinutes => "last 30 minutes",
            LogPeriod::OneHour => "last hour",
            LogPeriod::TwoHours => "last 2 hours",
            LogPeriod::SixHours => "last 6 hours",
            LogPeriod::TwelveHours => "last 12 hours",
            LogPeriod::Day => "last 24 hours",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.token() == token.trim())
    }
}

/// A validated `getLogs` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    /// Comma-separated server names, passed through as typed (trimmed).
    pub servers: String,
    pub log_type: String,
    pub period: LogPeriod,
}

/// One event as returned by the backend; every field is optional.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct RawLogEntry {
    #[serde(rename = "TimeCreated")]
    pub time_created: Option<LooseText>,
    #[serde(rename = "LevelDisplayName")]
    pub level_display_name: Option<LooseText>,
    #[serde(rename = "Level")]
    pub level: Option<LooseText>,
    #[serde(rename = "Id")]
    pub id: Option<LooseText>,
    #[serde(rename = "EventId")]
    pub event_id: Option<LooseText>,
    #[serde(rename = "ProviderName")]
    pub provider_name: Option<LooseText>,
    #[serde(rename = "Source")]
    pub source: Option<LooseText>,
    #[serde(rename = "Message")]
    pub message: Option<LooseText>,
}

/// The backend sends a bare object when a server returned exactly one event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    Many(Vec<RawLogEntry>),
    One(RawLogEntry),
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct ServerLogs {
    pub success: bool,
    pub logs: Option<OneOrMany>,
    pub error: Option<String>,
}

impl ServerLogs {
    pub fn entries(&self) -> Vec<LogEntry> {
        match &self.logs {
            None => Vec::new(),
            Some(OneOrMany::Many(list)) => list.iter().map(LogEntry::normalize).collect(),
            Some(OneOrMany::One(entry)) => vec![LogEntry::normalize(entry)],
        }
    }
}

/// Per-server results in the order the backend listed them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LogResults(pub Vec<(String, ServerLogs)>);

impl<'de> Deserialize<'de> for LogResults {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ResultsVisitor;

        impl<'de> Visitor<'de> for ResultsVisitor {
            type Value = LogResults;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of server name to log results")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut servers = Vec::new();
                while let Some((name, logs)) = map.next_entry::<String, ServerLogs>()? {
                    servers.push((name, logs));
                }
                Ok(LogResults(servers))
            }
        }

        deserializer.deserialize_map(ResultsVisitor)
    }
}

/// A normalized event, ready for sorting and display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub time_created: String,
    pub level: String,
    pub event_id: i64,
    pub source: String,
    pub message: String,
}

fn first_non_empty<'a>(candidates: &[&'a Option<LooseText>]) -> Option<&'a str> {
    candidates
        .iter()
        .copied()
        .map(text)
        .find(|value| !value.is_empty())
}

impl LogEntry {
    pub fn normalize(raw: &RawLogEntry) -> Self {
        Self {
            time_created: text(&raw.time_created).to_string(),
            level: first_non_empty(&[&raw.level_display_name, &raw.level])
                .unwrap_or("Unknown")
                .to_string(),
            event_id: first_non_empty(&[&raw.id, &raw.event_id]).map_or(0, parse_integer),
            source: first_non_empty(&[&raw.provider_name, &raw.source])
                .unwrap_or("Unknown")
                .to_string(),
            message: text(&raw.message).to_string(),
        }
    }

    /// Display form of the creation time; unparseable values are shown raw.
    pub fn display_time(&self) -> String {
        parse_timestamp(&self.time_created)
            .and_then(DateTime::from_timestamp_millis)
            .map_or_else(
                || self.time_created.clone(),
                |dt| dt.format("%Y-%m-%d %H:%M:%S").to_string(),
            )
    }

    fn search_text(&self) -> String {
        [
            self.display_time().as_str(),
            self.level.as_str(),
            &self.event_id.to_string(),
            self.source.as_str(),
            self.message.as_str(),
        ]
        .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogColumn {
    TimeCreated,
    Level,
    EventId,
    Source,
    Message,
}

impl SortColumn for LogColumn {
    const ALL: &'static [Self] = &[
        LogColumn::TimeCreated,
        LogColumn::Level,
        LogColumn::EventId,
        LogColumn::Source,
        LogColumn::Message,
    ];

    fn key(self) -> &'static str {
        match self {
            LogColumn::TimeCreated => "TimeCreated",
            LogColumn::Level => "Level",
            LogColumn::EventId => "EventId",
            LogColumn::Source => "Source",
            LogColumn::Message => "Message",
        }
    }

    fn label(self) -> &'static str {
        match self {
            LogColumn::TimeCreated => "Date/Time",
            LogColumn::Level => "Level",
            LogColumn::EventId => "Event ID",
            LogColumn::Source => "Source",
            LogColumn::Message => "Message",
        }
    }

    fn compare_kind(self) -> CompareKind {
        match self {
            LogColumn::TimeCreated => CompareKind::Timestamp,
            LogColumn::EventId => CompareKind::Integer,
            LogColumn::Level | LogColumn::Source | LogColumn::Message => CompareKind::Text,
        }
    }
}

impl SortRow<LogColumn> for LogEntry {
    fn sort_value(&self, column: LogColumn) -> Cow<'_, str> {
        match column {
            LogColumn::TimeCreated => Cow::Borrowed(&self.time_created),
            LogColumn::Level => Cow::Borrowed(&self.level),
            LogColumn::EventId => Cow::Owned(self.event_id.to_string()),
            LogColumn::Source => Cow::Borrowed(&self.source),
            LogColumn::Message => Cow::Borrowed(&self.message),
        }
    }
}

pub fn level_tone(level: &str) -> Tone {
    let level = level.to_lowercase();
    if level.contains("error") || level.contains("critical") {
        Tone::Error
    } else if level.contains("warning") {
        Tone::Warning
    } else if level.contains("information") {
        Tone::Good
    } else {
        Tone::Normal
    }
}

/// Cuts `message` to `limit` chars, appending "..." when something was cut.
pub fn truncate_message(message: &str, limit: usize) -> String {
    match message.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ServerResult {
    name: String,
    outcome: Result<Vec<LogEntry>, String>,
}

/// Form, results and table state of the event-log tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogViewerState {
    servers_input: String,
    selected_type: Option<String>,
    period: LogPeriod,
    loading: bool,
    error: Option<String>,
    results: Vec<ServerResult>,
    current_server: Option<String>,
    sort: SortState<LogColumn>,
    search: SearchQuery,
}

impl Default for LogViewerState {
    fn default() -> Self {
        Self {
            servers_input: String::new(),
            selected_type: None,
            period: LogPeriod::default(),
            loading: false,
            error: None,
            results: Vec::new(),
            current_server: None,
            sort: SortState::new(LogColumn::TimeCreated, SortDirection::Descending),
            search: SearchQuery::default(),
        }
    }
}

impl LogViewerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn current_server(&self) -> Option<&str> {
        self.current_server.as_deref()
    }

    pub fn sort(&self) -> SortState<LogColumn> {
        self.sort
    }

    pub fn set_servers_input(&mut self, raw: &str) {
        self.servers_input = raw.to_string();
    }

    pub fn set_log_type(&mut self, name: &str) {
        self.selected_type = Some(name.to_string());
    }

    pub fn set_period(&mut self, period: LogPeriod) {
        self.period = period;
    }

    /// Preselects the first type unless the user already picked one.
    pub fn offer_log_types(&mut self, types: &[LogTypeInfo]) {
        if self.selected_type.is_none() {
            self.selected_type = types.first().map(|t| t.name.clone());
        }
    }

    /// Validates the form. On success the viewer enters the loading state.
    pub fn submit(&mut self) -> Result<LogQuery, String> {
        let servers = self.servers_input.trim();
        if servers.is_empty() {
            let message = "Please enter a server name.".to_string();
            self.error = Some(message.clone());
            return Err(message);
        }
        let query = LogQuery {
            servers: servers.to_string(),
            log_type: self
                .selected_type
                .clone()
                .unwrap_or_else(|| "Application".to_string()),
            period: self.period,
        };
        self.loading = true;
        self.error = None;
        self.results.clear();
        self.current_server = None;
        Ok(query)
    }

    pub fn apply_results(&mut self, result: Result<LogResults, ApiError>) {
        self.loading = false;
        match result {
            Err(err) => {
                self.error = Some(format!("Failed to fetch logs: {}", err.message));
            }
            Ok(LogResults(servers)) => {
                self.search = SearchQuery::default();
                self.results = servers
                    .into_iter()
                    .map(|(name, logs)| ServerResult {
                        outcome: if logs.success {
                            Ok(logs.entries())
                        } else {
                            Err(logs.error.unwrap_or_default())
                        },
                        name,
                    })
                    .collect();
                self.current_server = self.results.first().map(|s| s.name.clone());
                if self.results.is_empty() {
                    self.error = Some("No data to display.".to_string());
                }
            }
        }
    }

    /// Unknown server names are ignored.
    pub fn select_server(&mut self, name: &str) -> bool {
        if self.results.iter().any(|s| s.name == name) {
            self.current_server = Some(name.to_string());
            true
        } else {
            false
        }
    }

    pub fn set_search(&mut self, raw: &str) {
        self.search = SearchQuery::new(raw);
    }

    pub fn select_sort(&mut self, column: LogColumn) {
        self.sort = self.sort.select(column);
    }

    pub fn view(&self, log_types: &[LogTypeInfo]) -> LogViewerView {
        let mut view = LogViewerView {
            log_types: log_types.to_vec(),
            servers_input: self.servers_input.clone(),
            selected_type: self.selected_type.clone(),
            period: self.period,
            loading: self.loading,
            error: self.error.clone(),
            search: self.search.raw().to_string(),
            columns: LogColumn::ALL
                .iter()
                .map(|&column| Column {
                    key: column.key().to_string(),
                    label: column.label().to_string(),
                    indicator: self.sort.indicator(column),
                })
                .collect(),
            ..LogViewerView::default()
        };

        view.server_tabs = self
            .results
            .iter()
            .map(|server| {
                let count = server.outcome.as_ref().map_or(0, Vec::len);
                LogServerTabView {
                    name: server.name.clone(),
                    label: format!("{} ({count})", server.name),
                    active: self.current_server.as_deref() == Some(server.name.as_str()),
                    failed: server.outcome.is_err(),
                }
            })
            .collect();

        let Some(current) = self
            .current_server
            .as_deref()
            .and_then(|name| self.results.iter().find(|s| s.name == name))
        else {
            return view;
        };

        let entries = match &current.outcome {
            Err(error) => {
                view.notice = Some(format!("Error: {error}"));
                return view;
            }
            Ok(entries) if entries.is_empty() => {
                view.notice = Some("No logs in the selected period.".to_string());
                return view;
            }
            Ok(entries) => entries,
        };

        let mut sorted: Vec<&LogEntry> = entries.iter().collect();
        self.sort.apply(&mut sorted);
        let total = sorted.len();
        let needle = self.search.needle();
        let shown: Vec<&LogEntry> = sorted
            .into_iter()
            .filter(|entry| {
                self.search.is_empty() || contains_ignore_case(&entry.search_text(), needle)
            })
            .collect();

        view.count_text = if self.search.is_empty() {
            format!("Total: {total}")
        } else {
            format!("Found: {} of {total}", shown.len())
        };
        if shown.is_empty() {
            view.notice = Some(format!("No results for \"{}\"", self.search.raw().trim()));
            return view;
        }

        let mark = |text: &str| {
            if self.search.is_empty() {
                MarkedText::plain(text)
            } else {
                highlight_all(text, needle)
            }
        };
        view.rows = shown
            .into_iter()
            .map(|entry| LogRowView {
                time: mark(&entry.display_time()),
                level: mark(&entry.level),
                event_id: mark(&entry.event_id.to_string()),
                source: mark(&entry.source),
                message: mark(&truncate_message(&entry.message, MESSAGE_DISPLAY_LIMIT)),
                tone: level_tone(&entry.level),
            })
            .collect();
        view
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_falls_back_field_by_field() {
        let raw: RawLogEntry = serde_json::from_str(
            r#"{ "TimeCreated": "2024-05-01T10:00:00", "Level": 2, "EventId": "7036", "Source": "SCM" }"#,
        )
        .unwrap();
        let entry = LogEntry::normalize(&raw);
        assert_eq!(entry.level, "2");
        assert_eq!(entry.event_id, 7036);
        assert_eq!(entry.source, "SCM");
        assert_eq!(entry.message, "");

        let empty = LogEntry::normalize(&RawLogEntry::default());
        assert_eq!(empty.level, "Unknown");
        assert_eq!(empty.event_id, 0);
        assert_eq!(empty.source, "Unknown");
    }

    #[test]
    fn display_name_wins_over_numeric_level() {
        let raw: RawLogEntry = serde_json::from_str(
            r#"{ "LevelDisplayName": "Error", "Level": 2, "Id": 4625, "EventId": 1, "ProviderName": "Security" }"#,
        )
        .unwrap();
        let entry = LogEntry::normalize(&raw);
        assert_eq!(entry.level, "Error");
        assert_eq!(entry.event_id, 4625);
        assert_eq!(entry.source, "Security");
    }

    #[test]
    fn results_keep_backend_server_order() {
        let results: LogResults = serde_json::from_str(
            r#"{ "ZETA": { "success": true, "logs": [] }, "ALPHA": { "success": false, "error": "RPC" } }"#,
        )
        .unwrap();
        let names: Vec<&str> = results.0.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["ZETA", "ALPHA"]);
    }

    #[test]
    fn truncation_counts_chars() {
        assert_eq!(truncate_message("abc", 3), "abc");
        assert_eq!(truncate_message("abcd", 3), "abc...");
        assert_eq!(truncate_message("żółw", 2), "żó...");
    }

    #[test]
    fn level_tones() {
        assert_eq!(level_tone("Error"), Tone::Error);
        assert_eq!(level_tone("Critical"), Tone::Error);
        assert_eq!(level_tone("Warning"), Tone::Warning);
        assert_eq!(level_tone("Information"), Tone::Good);
        assert_eq!(level_tone("Verbose"), Tone::Normal);
    }

    #[test]
    fn periods_round_trip_tokens() {
        for period in LogPeriod::ALL {
            assert_eq!(LogPeriod::from_token(period.token()), Some(period));
        }
        assert_eq!(LogPeriod::default().token(), "1h");
    }
}
