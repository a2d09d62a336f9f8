//! DOM-agnostic rendered output of a snapshot.
//!
//! The filter engine works on this text tree rather than on the payloads, so
//! a search finds whatever the user can read on screen.

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
    /// Shown instead of blocks when the snapshot holds nothing to render.
    pub empty_message: Option<String>,
}

impl Document {
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            blocks: Vec::new(),
            empty_message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Card(Card),
    Table(TableBlock),
}

impl Block {
    pub fn key(&self) -> &str {
        match self {
            Block::Card(card) => &card.key,
            Block::Table(table) => &table.key,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Normal,
    Good,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Card {
    pub key: String,
    pub title: String,
    /// Extra label fields shown next to the title.
    pub badges: Vec<String>,
    pub tone: Tone,
    pub critical: bool,
    pub lines: Vec<String>,
    pub sections: Vec<Section>,
}

impl Card {
    pub fn label_fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.title.as_str()).chain(self.badges.iter().map(String::as_str))
    }

    /// Every text field of the card, in reading order.
    pub fn all_text(&self) -> impl Iterator<Item = &str> {
        self.label_fields()
            .chain(self.lines.iter().map(String::as_str))
            .chain(self.sections.iter().flat_map(Section::all_text))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Section {
    /// Stable name within the card, used to remember collapsed state.
    pub name: String,
    pub title: String,
    pub collapsible: bool,
    pub lines: Vec<String>,
    pub table: Option<Table>,
}

impl Section {
    pub fn new(name: &str, title: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn collapsible(mut self) -> Self {
        self.collapsible = true;
        self
    }

    pub fn with_lines(mut self, lines: Vec<String>) -> Self {
        self.lines = lines;
        self
    }

    pub fn with_table(mut self, table: Table) -> Self {
        self.table = Some(table);
        self
    }

    pub fn all_text(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.title.as_str())
            .chain(self.lines.iter().map(String::as_str))
            .chain(self.table.iter().flat_map(|t| t.rows.iter()).flat_map(Row::all_text))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Sort key, empty for columns that cannot be sorted.
    pub key: String,
    pub label: String,
    pub indicator: Option<&'static str>,
}

impl Column {
    pub fn plain(label: &str) -> Self {
        Self {
            key: String::new(),
            label: label.to_string(),
            indicator: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    pub cells: Vec<String>,
    pub tone: Tone,
}

impl Row {
    pub fn new(cells: Vec<String>) -> Self {
        Self {
            cells,
            tone: Tone::Normal,
        }
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn all_text(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(String::as_str)
    }
}

/// A standalone table spanning the whole view (MQ queues, role switches).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableBlock {
    pub key: String,
    pub title: String,
    pub subtitle: String,
    pub table: Table,
}
