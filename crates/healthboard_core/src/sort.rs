//! Column sorting shared by the role-switch history and the event-log table.

use std::borrow::Cow;
use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

/// How values of a column are compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareKind {
    Timestamp,
    Integer,
    Text,
}

/// A sortable column of some table.
pub trait SortColumn: Copy + Eq + std::fmt::Debug + 'static {
    /// Every column, in display order.
    const ALL: &'static [Self];

    fn key(self) -> &'static str;
    fn label(self) -> &'static str;
    fn compare_kind(self) -> CompareKind;

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|column| column.key().eq_ignore_ascii_case(key.trim()))
    }
}

/// Something that exposes a raw textual value per column.
pub trait SortRow<C: SortColumn> {
    fn sort_value(&self, column: C) -> Cow<'_, str>;
}

impl<C: SortColumn, R: SortRow<C>> SortRow<C> for &R {
    fn sort_value(&self, column: C) -> Cow<'_, str> {
        (**self).sort_value(column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState<C> {
    pub column: C,
    pub direction: SortDirection,
}

impl<C: SortColumn> SortState<C> {
    pub fn new(column: C, direction: SortDirection) -> Self {
        Self { column, direction }
    }

    /// Same column flips the direction, a new column starts ascending.
    pub fn select(self, column: C) -> Self {
        if self.column == column {
            Self::new(column, self.direction.toggled())
        } else {
            Self::new(column, SortDirection::Ascending)
        }
    }

    /// Indicator glyph for `column`; only the active column has one.
    pub fn indicator(&self, column: C) -> Option<&'static str> {
        (self.column == column).then(|| self.direction.glyph())
    }

    /// Stable total reorder. Descending is the exact reverse of ascending.
    pub fn apply<R: SortRow<C>>(&self, rows: &mut [R]) {
        let column = self.column;
        let kind = column.compare_kind();
        rows.sort_by(|a, b| compare_values(kind, &a.sort_value(column), &b.sort_value(column)));
        if self.direction == SortDirection::Descending {
            rows.reverse();
        }
    }
}

pub fn compare_values(kind: CompareKind, a: &str, b: &str) -> Ordering {
    match kind {
        // Unparseable timestamps sort before every valid one.
        CompareKind::Timestamp => parse_timestamp(a).cmp(&parse_timestamp(b)),
        CompareKind::Integer => parse_integer(a).cmp(&parse_integer(b)),
        CompareKind::Text => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}

/// Leading integer of `raw`, or 0 when there is none.
pub fn parse_integer(raw: &str) -> i64 {
    let raw = raw.trim();
    let digits_end = raw
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(raw.len(), |(i, _)| i);
    raw[..digits_end].parse().unwrap_or(0)
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y, %H:%M:%S",
];

/// Milliseconds since the epoch for the timestamp shapes the backend emits.
///
/// Offset-less values are read as UTC; only their relative order matters.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Some(inner) = raw.strip_prefix("/Date(").and_then(|r| r.strip_suffix(")/")) {
        let millis_end = inner
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '+' || c == '-')
            .map_or(inner.len(), |(i, _)| i);
        return inner[..millis_end].parse().ok();
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.timestamp_millis());
    }
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc().timestamp_millis());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}
