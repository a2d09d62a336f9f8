use std::io::{self, Write};

use crossterm::style::{style, Print, PrintStyledContent, StyledContent, Stylize};
use crossterm::terminal::{Clear, ClearType};
use crossterm::{cursor, QueueableCommand};
use healthboard_core::{
    AppViewModel, BlockView, CardView, Column, ContentView, LogViewerView, MarkedText, RowView,
    SectionView, TableView, Tone,
};

const PROMPT: &str = "> ";

/// A run of text drawn with one style.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Span {
    pub text: String,
    pub tone: Tone,
    /// Search match, drawn in reverse video.
    pub mark: bool,
    pub bold: bool,
    pub dim: bool,
}

impl Span {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    fn tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn dim(mut self) -> Self {
        self.dim = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    fn indented(depth: usize) -> Self {
        let mut line = Self::default();
        if depth > 0 {
            line.spans.push(Span::plain(" ".repeat(depth)));
        }
        line
    }

    fn plain(text: impl Into<String>) -> Self {
        Self {
            spans: vec![Span::plain(text)],
        }
    }

    fn with(mut self, span: Span) -> Self {
        self.spans.push(span);
        self
    }

    fn marked(mut self, text: &MarkedText, tone: Tone, bold: bool) -> Self {
        self.spans.extend(marked_spans(text, tone, bold));
        self
    }

    /// Unstyled text of the line.
    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

fn marked_spans(text: &MarkedText, tone: Tone, bold: bool) -> Vec<Span> {
    text.segments()
        .iter()
        .map(|segment| Span {
            text: segment.text.replace(['\r', '\n'], " "),
            tone,
            mark: segment.is_match,
            bold,
            dim: false,
        })
        .collect()
}

/// Clears the terminal and draws the whole view followed by the prompt.
pub fn draw<W: Write>(out: &mut W, view: &AppViewModel, notice: Option<&str>) -> io::Result<()> {
    out.queue(Clear(ClearType::All))?
        .queue(cursor::MoveTo(0, 0))?;
    for line in render(view, notice) {
        for span in &line.spans {
            out.queue(PrintStyledContent(styled(span)))?;
        }
        out.queue(Print("\n"))?;
    }
    out.queue(Print(PROMPT))?;
    out.flush()
}

fn styled(span: &Span) -> StyledContent<&str> {
    let mut content = style(span.text.as_str());
    content = match span.tone {
        Tone::Normal => content,
        Tone::Good => content.green(),
        Tone::Warning => content.yellow(),
        Tone::Error => content.red(),
    };
    if span.bold {
        content = content.bold();
    }
    if span.dim {
        content = content.dim();
    }
    if span.mark {
        content = content.reverse();
    }
    content
}

pub fn render(view: &AppViewModel, notice: Option<&str>) -> Vec<Line> {
    let mut lines = vec![tab_line(view), stats_line(view)];
    if let Some(progress) = &view.progress {
        lines.push(Line::plain("» ").with(Span::plain(progress).tone(Tone::Warning).bold()));
    }
    if let Some(line) = filter_line(view) {
        lines.push(line);
    }
    lines.push(Line::default());

    match &view.content {
        ContentView::Loading => lines.push(Line::plain("Loading...")),
        ContentView::Message(message) => lines.push(Line::plain(message)),
        ContentView::Error(error) => {
            lines.push(Line::default().with(Span::plain(error).tone(Tone::Error).bold()))
        }
        ContentView::Blocks(blocks) => {
            for block in blocks.iter().filter(|block| block.is_visible()) {
                match block {
                    BlockView::Card(card) => card_lines(card, &mut lines),
                    BlockView::Table(table) => table_block_lines(table, &mut lines),
                }
            }
        }
        ContentView::Logs(logs) => log_lines(logs, &mut lines),
    }

    if let Some(notice) = notice {
        lines.push(Line::default());
        lines.extend(notice.lines().map(|text| Line::default().with(Span::plain(text).dim())));
    }
    lines
}

fn tab_line(view: &AppViewModel) -> Line {
    let mut line = Line::default();
    for (index, tab) in view.tabs.iter().enumerate() {
        if index > 0 {
            line.spans.push(Span::plain("  "));
        }
        let label = format!("{} {}", index + 1, tab.title);
        line.spans.push(if tab.active {
            Span::plain(format!("[{label}]")).bold()
        } else {
            Span::plain(label).dim()
        });
    }
    line
}

fn stats_line(view: &AppViewModel) -> Line {
    let stats = &view.stats;
    Line::plain(format!(
        "Last update: {} | Duration: {} | Servers: {} | OK: {} | Failed: {} | ",
        stats.last_update, stats.duration, stats.total, stats.success, stats.failed
    ))
    .with(Span::plain(format!("Critical: {}", stats.critical)).tone(Tone::Error))
}

fn filter_line(view: &AppViewModel) -> Option<Line> {
    let search = view.search.as_ref()?;
    let mut line = Line::plain("Search: ");
    line.spans.push(if search.query.is_empty() {
        Span::plain(search.placeholder).dim()
    } else {
        Span::plain(&search.query).bold()
    });
    if let Some(on) = view.critical_only {
        line.spans.push(Span::plain(format!(
            " | Critical only: {}",
            if on { "on" } else { "off" }
        )));
    }
    Some(line)
}

fn card_lines(card: &CardView, lines: &mut Vec<Line>) {
    let mut title = Line::plain(if card.highlighted { "▶ " } else { "■ " })
        .marked(&card.title, card.tone, true);
    for badge in &card.badges {
        title = title.with(Span::plain(" · ").dim()).marked(badge, Tone::Normal, false);
    }
    if card.critical {
        title = title.with(Span::plain(" [CRITICAL]").tone(Tone::Error).bold());
    }
    lines.push(title);

    for text in &card.lines {
        lines.push(Line::indented(4).marked(text, Tone::Normal, false));
    }
    for section in &card.sections {
        section_lines(&card.key, section, lines);
    }
    lines.push(Line::default());
}

fn section_lines(card_key: &str, section: &SectionView, lines: &mut Vec<Line>) {
    let marker = match (section.collapsible, section.expanded) {
        (false, _) => "",
        (true, true) => "▾ ",
        (true, false) => "▸ ",
    };
    let mut header = Line::indented(4)
        .with(Span::plain(marker))
        .marked(&section.title, Tone::Normal, true);
    if section.collapsible {
        header = header.with(Span::plain(format!("  (x {card_key} {})", section.name)).dim());
    }
    lines.push(header);
    if !section.expanded {
        return;
    }
    for text in &section.lines {
        lines.push(Line::indented(6).marked(text, Tone::Normal, false));
    }
    if let Some(table) = &section.table {
        grid_lines(&table.columns, &table.rows, 6, lines);
    }
}

fn table_block_lines(table: &TableView, lines: &mut Vec<Line>) {
    let mut heading = Line::default().with(Span::plain(&table.title).bold());
    if !table.subtitle.is_empty() {
        heading = heading.with(Span::plain(format!("  {}", table.subtitle)).dim());
    }
    lines.push(heading);
    grid_lines(&table.columns, &table.rows, 2, lines);
    lines.push(Line::default());
}

fn log_lines(logs: &LogViewerView, lines: &mut Vec<Line>) {
    let type_label = logs
        .selected_type
        .as_deref()
        .and_then(|name| logs.log_types.iter().find(|t| t.name == name))
        .map_or_else(
            || logs.selected_type.clone().unwrap_or_else(|| "-".to_string()),
            |t| t.display_name.clone(),
        );
    let servers = if logs.servers_input.trim().is_empty() {
        Span::plain("(none)").dim()
    } else {
        Span::plain(&logs.servers_input).bold()
    };
    lines.push(
        Line::plain("Servers: ")
            .with(servers)
            .with(Span::plain(format!(
                " | Type: {type_label} | Period: {} ({})",
                logs.period.label(),
                logs.period.token()
            ))),
    );
    let types: Vec<&str> = logs.log_types.iter().map(|t| t.name.as_str()).collect();
    lines.push(Line::default().with(Span::plain(format!("Log types: {}", types.join(", "))).dim()));

    if logs.loading {
        lines.push(Line::default().with(Span::plain("Loading logs...").tone(Tone::Warning)));
    }
    if let Some(error) = &logs.error {
        lines.push(Line::default().with(Span::plain(error).tone(Tone::Error).bold()));
    }
    if logs.server_tabs.is_empty() {
        return;
    }

    lines.push(Line::default());
    let mut tabs = Line::default();
    for tab in &logs.server_tabs {
        let span = if tab.active {
            Span::plain(format!("[{}]", tab.label)).bold()
        } else {
            Span::plain(&tab.label)
        };
        tabs.spans.push(if tab.failed { span.tone(Tone::Error) } else { span });
        tabs.spans.push(Span::plain("  "));
    }
    tabs.spans.pop();
    lines.push(tabs);

    let mut search = Line::plain("Search: ");
    search.spans.push(if logs.search.is_empty() {
        Span::plain("search in logs").dim()
    } else {
        Span::plain(&logs.search).bold()
    });
    if !logs.count_text.is_empty() {
        search.spans.push(Span::plain(format!("  {}", logs.count_text)).dim());
    }
    lines.push(search);

    if let Some(notice) = &logs.notice {
        lines.push(Line::default().with(Span::plain(notice).dim()));
        return;
    }
    let rows: Vec<RowView> = logs
        .rows
        .iter()
        .map(|row| RowView {
            cells: vec![
                row.time.clone(),
                row.level.clone(),
                row.event_id.clone(),
                row.source.clone(),
                row.message.clone(),
            ],
            visible: true,
            highlighted: false,
            tone: row.tone,
        })
        .collect();
    grid_lines(&logs.columns, &rows, 0, lines);
}

/// Column-aligned table. Invisible rows are skipped.
fn grid_lines(columns: &[Column], rows: &[RowView], indent: usize, lines: &mut Vec<Line>) {
    let headers: Vec<String> = columns
        .iter()
        .map(|column| match column.indicator {
            Some(indicator) => format!("{} {indicator}", column.label),
            None => column.label.clone(),
        })
        .collect();
    let visible: Vec<&RowView> = rows.iter().filter(|row| row.visible).collect();

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &visible {
        for (index, cell) in row.cells.iter().enumerate() {
            let width = cell.text().chars().count();
            match widths.get_mut(index) {
                Some(current) => *current = (*current).max(width),
                None => widths.push(width),
            }
        }
    }

    let mut header = Line::indented(indent);
    for (index, label) in headers.iter().enumerate() {
        header.spans.push(Span::plain(pad(label, widths[index])).bold());
    }
    lines.push(header);

    for row in visible {
        let mut line = Line::indented(indent);
        for (index, cell) in row.cells.iter().enumerate() {
            line.spans.extend(marked_spans(cell, row.tone, row.highlighted));
            let used = cell.text().chars().count();
            line.spans.push(Span::plain(" ".repeat(widths[index] - used + 2)));
        }
        lines.push(line);
    }
}

fn pad(text: &str, width: usize) -> String {
    format!("{text:<width$}  ")
}
