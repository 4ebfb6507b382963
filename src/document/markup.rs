//! Markup formatter.
//!
//! Turns substituted template text into [`RenderedBlock`]s. The dialect is small:
//!
//! - `#`, `##`, `###` at the start of a line make that line a heading; alignment
//!   tags may precede the marker, text may not
//! - a blank line ends a paragraph, a single line break stays inside it
//! - `~center~ … ~/center~` (also `right`, `left`) aligns everything in between
//! - `| a | b |` lines form a table, the first row being the header

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkupDirective {
    Open(Alignment),
    Close(Alignment),
}

impl MarkupDirective {
    const ALL: [MarkupDirective; 6] = [
        Self::Open(Alignment::Left),
        Self::Open(Alignment::Center),
        Self::Open(Alignment::Right),
        Self::Close(Alignment::Left),
        Self::Close(Alignment::Center),
        Self::Close(Alignment::Right),
    ];

    pub fn tag(self) -> &'static str {
        match self {
            Self::Open(Alignment::Left) => "~left~",
            Self::Open(Alignment::Center) => "~center~",
            Self::Open(Alignment::Right) => "~right~",
            Self::Close(Alignment::Left) => "~/left~",
            Self::Close(Alignment::Center) => "~/center~",
            Self::Close(Alignment::Right) => "~/right~",
        }
    }

    /// Recognize a tag at the start of `s`, returning it with its byte length.
    pub fn parse_prefix(s: &str) -> Option<(Self, usize)> {
        if !s.starts_with('~') {
            return None;
        }
        Self::ALL
            .into_iter()
            .find(|d| s.starts_with(d.tag()))
            .map(|d| (d, d.tag().len()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    Heading {
        level: u8,
    },
    Paragraph,
    LineBreak,
    Table {
        header: Vec<String>,
        rows: Vec<Vec<String>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RenderedBlock {
    pub kind: BlockKind,
    pub alignment: Alignment,
    /// Plain text of the block. Paragraph lines are joined with `\n`.
    pub text: String,
}

/// Escape a table cell so it survives as a single `|`-delimited cell.
pub fn escape_cell(value: &str) -> String {
    value
        .replace('\\', r"\\")
        .replace('|', r"\|")
        .replace(['\r', '\n'], " ")
}

/// Format substituted text into blocks.
pub fn format_blocks(text: &str) -> Vec<RenderedBlock> {
    let normalized = text.replace("\r\n", "\n");
    let mut formatter = Formatter::default();
    let mut rest = normalized.as_str();

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('\n') {
            formatter.newline();
            rest = after;
            continue;
        }
        if let Some((directive, len)) = MarkupDirective::parse_prefix(rest) {
            formatter.directive(directive);
            rest = &rest[len..];
            continue;
        }
        let end = rest
            .char_indices()
            .skip(1)
            .find(|(_, c)| *c == '\n' || *c == '~')
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        formatter.text(&rest[..end]);
        rest = &rest[end..];
    }

    formatter.finish()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Normal,
    InHeading(u8),
    InAlignment(Alignment),
}

struct Formatter {
    blocks: Vec<RenderedBlock>,
    frames: Vec<Alignment>,
    state: State,
    line: String,
    /// The current line carried an alignment tag, so an otherwise empty line is not blank.
    line_has_tag: bool,
    /// Non-blank text appeared earlier on the current physical line.
    line_has_text: bool,
    paragraph: Vec<String>,
    table: Vec<String>,
    blank_run: usize,
}

impl Default for Formatter {
    fn default() -> Self {
        Self {
            blocks: Vec::new(),
            frames: Vec::new(),
            state: State::Normal,
            line: String::new(),
            line_has_tag: false,
            line_has_text: false,
            paragraph: Vec::new(),
            table: Vec::new(),
            blank_run: 0,
        }
    }
}

impl Formatter {
    fn alignment(&self) -> Alignment {
        self.frames.last().copied().unwrap_or_default()
    }

    fn enclosing(&self) -> State {
        self.frames
            .last()
            .map(|a| State::InAlignment(*a))
            .unwrap_or(State::Normal)
    }

    fn text(&mut self, text: &str) {
        let leading = !self.line_has_text;
        if !text.trim().is_empty() {
            self.line_has_text = true;
        }
        if leading && self.line.is_empty() && !matches!(self.state, State::InHeading(_)) {
            if let Some((level, rest)) = heading_marker(text) {
                self.state = State::InHeading(level);
                self.line.push_str(rest);
                return;
            }
        }
        self.line.push_str(text);
    }

    fn newline(&mut self) {
        if let State::InHeading(level) = self.state {
            self.emit_heading(level);
        } else {
            let line = std::mem::take(&mut self.line);
            if line.trim().is_empty() {
                if !self.line_has_tag {
                    self.flush_paragraph();
                    self.flush_table();
                    self.blank_run += 1;
                    if self.blank_run > 1 {
                        self.push(BlockKind::LineBreak, String::new());
                    }
                }
            } else {
                self.take_line(line);
            }
        }
        self.line_has_tag = false;
        self.line_has_text = false;
    }

    fn directive(&mut self, directive: MarkupDirective) {
        match directive {
            MarkupDirective::Open(alignment) => {
                self.flush_inline();
                self.frames.push(alignment);
                self.state = State::InAlignment(alignment);
            }
            MarkupDirective::Close(alignment) => {
                // Close tags that do not match the innermost frame are dropped.
                if self.frames.last() == Some(&alignment) {
                    self.flush_inline();
                    self.frames.pop();
                    self.state = self.enclosing();
                }
            }
        }
        self.line_has_tag = true;
    }

    fn finish(mut self) -> Vec<RenderedBlock> {
        self.flush_inline();
        self.frames.clear();
        self.blocks
    }

    /// Close whatever is open at an alignment boundary.
    fn flush_inline(&mut self) {
        if let State::InHeading(level) = self.state {
            self.emit_heading(level);
            return;
        }
        let line = std::mem::take(&mut self.line);
        if !line.trim().is_empty() {
            self.take_line(line);
        }
        self.flush_paragraph();
        self.flush_table();
    }

    fn take_line(&mut self, line: String) {
        if is_table_row(&line) {
            self.flush_paragraph();
            if !is_separator_row(&line) {
                self.table.push(line);
            }
        } else {
            self.flush_table();
            self.paragraph.push(line);
        }
        self.blank_run = 0;
    }

    fn emit_heading(&mut self, level: u8) {
        self.flush_paragraph();
        self.flush_table();
        let text = std::mem::take(&mut self.line).trim().to_string();
        self.push(BlockKind::Heading { level }, text);
        self.state = self.enclosing();
        self.blank_run = 0;
    }

    fn flush_paragraph(&mut self) {
        if self.paragraph.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.paragraph).join("\n");
        self.push(BlockKind::Paragraph, text);
    }

    fn flush_table(&mut self) {
        if self.table.is_empty() {
            return;
        }
        let lines = std::mem::take(&mut self.table);
        let mut rows = lines.iter().map(|line| split_cells(line));
        let header = rows.next().unwrap_or_default();
        let rows = rows.collect();
        self.push(BlockKind::Table { header, rows }, lines.join("\n"));
    }

    fn push(&mut self, kind: BlockKind, text: String) {
        let alignment = self.alignment();
        self.blocks.push(RenderedBlock {
            kind,
            alignment,
            text,
        });
    }
}

/// `## Title` -> `(2, "Title")`. Four or more `#` are plain text.
fn heading_marker(text: &str) -> Option<(u8, &str)> {
    let trimmed = text.trim_start_matches([' ', '\t']);
    let level = trimmed.bytes().take_while(|b| *b == b'#').count();
    if !(1..=3).contains(&level) {
        return None;
    }
    let rest = &trimmed[level..];
    if !rest.starts_with([' ', '\t']) {
        return None;
    }
    Some((level as u8, rest.trim_start()))
}

fn is_table_row(line: &str) -> bool {
    let t = line.trim();
    t.len() >= 2 && t.starts_with('|') && t.ends_with('|') && !t.ends_with(r"\|")
}

fn is_separator_row(line: &str) -> bool {
    let t = line.trim();
    t.contains('-') && t.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

fn split_cells(line: &str) -> Vec<String> {
    let t = line.trim();
    let inner = &t[1..t.len() - 1];

    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(next) => cell.push(next),
                None => cell.push('\\'),
            },
            '|' => cells.push(std::mem::take(&mut cell).trim().to_string()),
            _ => cell.push(c),
        }
    }
    cells.push(cell.trim().to_string());
    cells
}
