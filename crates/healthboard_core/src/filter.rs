//! Search and critical-only filtering over a rendered [`Document`].
//!
//! Filtering never touches the document; it produces a fresh view tree with
//! visibility flags and highlight segments, so applying the same query twice
//! yields the same output and clearing the query restores the plain view.

use std::collections::BTreeSet;

use crate::document::{Block, Card, Document, Row, Section, Table, TableBlock};
use crate::highlight::{contains_ignore_case, highlight_first, MarkedText, SearchQuery};
use crate::view_model::{BlockView, CardView, RowView, SectionView, TableView};
use crate::{MatchScope, ViewKind};

/// Identifies a collapsible section across re-renders.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SectionKey {
    pub card: String,
    pub section: String,
}

impl SectionKey {
    pub fn new(card: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            card: card.into(),
            section: section.into(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Filters<'a> {
    pub query: &'a SearchQuery,
    /// Only honoured on cards; tables ignore it.
    pub critical_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterOutcome {
    pub blocks: Vec<BlockView>,
    /// Collapsed sections that were opened because they hold a match.
    pub forced_open: Vec<SectionKey>,
    /// Visible cards plus visible standalone table rows.
    pub visible: usize,
    pub total: usize,
}

pub fn filter_document(
    kind: ViewKind,
    document: &Document,
    filters: Filters<'_>,
    collapsed: &BTreeSet<SectionKey>,
) -> FilterOutcome {
    let scope = kind.match_scope();
    let mut outcome = FilterOutcome::default();
    for block in &document.blocks {
        let view = match block {
            Block::Card(card) => {
                let view = filter_card(scope, card, filters, collapsed, &mut outcome.forced_open);
                outcome.total += 1;
                outcome.visible += usize::from(view.visible);
                BlockView::Card(view)
            }
            Block::Table(table) => {
                let view = filter_table_block(table, filters.query);
                outcome.total += view.rows.len();
                outcome.visible += view.rows.iter().filter(|r| r.visible).count();
                BlockView::Table(view)
            }
        };
        outcome.blocks.push(view);
    }
    outcome
}

/// Matches field by field, so a hit is always something `mark` can highlight.
fn any_field_matches<'a>(mut fields: impl Iterator<Item = &'a str>, needle: &str) -> bool {
    fields.any(|field| contains_ignore_case(field, needle))
}

fn row_matches(row: &Row, needle: &str) -> bool {
    any_field_matches(row.all_text(), needle)
}

fn mark(text: &str, needle: &str, on: bool) -> MarkedText {
    if on {
        highlight_first(text, needle)
    } else {
        MarkedText::plain(text)
    }
}

fn filter_card(
    scope: MatchScope,
    card: &Card,
    filters: Filters<'_>,
    collapsed: &BTreeSet<SectionKey>,
    forced_open: &mut Vec<SectionKey>,
) -> CardView {
    let needle = filters.query.needle();
    let searching = !filters.query.is_empty();
    let row_scoped = scope == MatchScope::LabelOrRows;

    let (matched, label_matched) = if !searching {
        (true, false)
    } else if row_scoped {
        let label = any_field_matches(card.label_fields(), needle);
        let rows = card
            .sections
            .iter()
            .filter_map(|s| s.table.as_ref())
            .flat_map(|t| t.rows.iter())
            .any(|r| row_matches(r, needle));
        (label || rows, label)
    } else {
        let whole = any_field_matches(card.all_text(), needle);
        (whole, whole)
    };
    let visible = matched && (!filters.critical_only || card.critical);
    let mark_label = searching && label_matched;
    let mark_body = searching && matched && !row_scoped;

    let sections = card
        .sections
        .iter()
        .map(|section| {
            let key = SectionKey::new(&card.key, &section.name);
            let user_collapsed = section.collapsible && collapsed.contains(&key);
            let holds_match = searching && matched && section_has_match(section, needle, row_scoped);
            if visible && user_collapsed && holds_match {
                forced_open.push(key);
            }
            SectionView {
                name: section.name.clone(),
                title: mark(&section.title, needle, mark_body),
                collapsible: section.collapsible,
                expanded: !user_collapsed || (visible && holds_match),
                lines: section
                    .lines
                    .iter()
                    .map(|line| mark(line, needle, mark_body))
                    .collect(),
                table: section
                    .table
                    .as_ref()
                    .map(|table| nested_table(table, needle, searching, mark_body)),
            }
        })
        .collect();

    CardView {
        key: card.key.clone(),
        visible,
        highlighted: mark_label,
        tone: card.tone,
        critical: card.critical,
        title: mark(&card.title, needle, mark_label),
        badges: card
            .badges
            .iter()
            .map(|badge| mark(badge, needle, mark_label))
            .collect(),
        lines: card
            .lines
            .iter()
            .map(|line| mark(line, needle, mark_body))
            .collect(),
        sections,
    }
}

fn section_has_match(section: &Section, needle: &str, rows_only: bool) -> bool {
    if rows_only {
        section
            .table
            .iter()
            .flat_map(|t| t.rows.iter())
            .any(|r| row_matches(r, needle))
    } else {
        any_field_matches(section.all_text(), needle)
    }
}

/// Rows inside a card stay visible; matching ones are highlighted.
fn nested_table(table: &Table, needle: &str, searching: bool, mark_all: bool) -> TableView {
    let rows = table
        .rows
        .iter()
        .map(|row| {
            let hit = searching && row_matches(row, needle);
            RowView {
                cells: row
                    .cells
                    .iter()
                    .map(|cell| mark(cell, needle, hit || mark_all))
                    .collect(),
                visible: true,
                highlighted: hit,
                tone: row.tone,
            }
        })
        .collect();
    TableView {
        visible: true,
        columns: table.columns.clone(),
        rows,
        ..TableView::default()
    }
}

/// Standalone tables hide non-matching rows, and the whole block when none match.
fn filter_table_block(block: &TableBlock, query: &SearchQuery) -> TableView {
    let needle = query.needle();
    let searching = !query.is_empty();
    let rows: Vec<RowView> = block
        .table
        .rows
        .iter()
        .map(|row| {
            let hit = !searching || row_matches(row, needle);
            RowView {
                cells: row
                    .cells
                    .iter()
                    .map(|cell| mark(cell, needle, searching && hit))
                    .collect(),
                visible: hit,
                highlighted: searching && hit,
                tone: row.tone,
            }
        })
        .collect();
    TableView {
        key: block.key.clone(),
        title: block.title.clone(),
        subtitle: block.subtitle.clone(),
        visible: !searching || rows.iter().any(|r| r.visible),
        columns: block.table.columns.clone(),
        rows,
    }
}
