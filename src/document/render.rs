//! Renderer: turns formatted blocks into Typst source for the PDF backend.
//!
//! All user text is emitted as Typst string literals, never as markup, so values
//! such as `#` or `*` in a client name are printed as-is.

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use utoipa::ToSchema;

use super::common::typst_str;
use super::markup::{Alignment, BlockKind, RenderedBlock};
use super::models::Company;

/// Page geometry shared by every generated document.
#[derive(Debug, Clone, PartialEq)]
pub struct PageLayout {
    /// Space left blank for pre-printed letterhead paper.
    pub blank_top_margin_cm: f32,
    pub letterhead_top_margin_cm: f32,
    pub bottom_margin_cm: f32,
    pub side_margin_cm: f32,
    pub font_size_pt: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            blank_top_margin_cm: 5.0,
            letterhead_top_margin_cm: 4.0,
            bottom_margin_cm: 2.0,
            side_margin_cm: 2.0,
            font_size_pt: 11.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LetterheadOption {
    #[default]
    None,
    Company,
}

/// A file the Typst source refers to by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum Letterhead {
    None,
    Company {
        company: Company,
        /// Letterhead artwork. Without it a text header is printed.
        image: Option<Attachment>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypstDocument {
    pub source: String,
    pub attachments: Vec<Attachment>,
}

pub fn render_document(
    blocks: &[RenderedBlock],
    letterhead: &Letterhead,
    layout: &PageLayout,
) -> TypstDocument {
    let mut source = String::new();
    let mut attachments = Vec::new();

    let top = match letterhead {
        Letterhead::None => layout.blank_top_margin_cm,
        Letterhead::Company { .. } => layout.letterhead_top_margin_cm,
    };
    let _ = write!(
        source,
        "#set page(paper: \"a4\", margin: (top: {}cm, bottom: {}cm, x: {}cm)",
        top, layout.bottom_margin_cm, layout.side_margin_cm
    );
    match letterhead {
        Letterhead::None => {}
        Letterhead::Company {
            image: Some(image), ..
        } => {
            let _ = write!(
                source,
                ", header: align(center, image({}, height: {}cm, fit: \"contain\"))",
                typst_str(&image.name),
                (layout.letterhead_top_margin_cm - 1.0).max(1.0)
            );
            attachments.push(image.clone());
        }
        Letterhead::Company {
            company,
            image: None,
        } => {
            let _ = write!(source, ", header: {}", text_header(company));
        }
    }
    source.push_str(")\n");
    let _ = writeln!(source, "#set text(size: {}pt)", layout.font_size_pt);
    source.push_str("#set heading(numbering: none)\n\n");

    for block in blocks {
        render_block(&mut source, block);
        source.push_str("\n\n");
    }

    TypstDocument {
        source,
        attachments,
    }
}

fn text_header(company: &Company) -> String {
    let mut lines = vec![format!(
        "text(size: 16pt, weight: \"bold\", {})",
        typst_str(&company.name)
    )];
    if let Some(address) = company.address.as_deref().filter(|a| !a.trim().is_empty()) {
        lines.push(format!("text(size: 9pt, {})", typst_str(address)));
    }

    let contacts: Vec<String> = [
        company.phone.as_deref().map(|v| format!("Phone: {}", v)),
        company.email.as_deref().map(|v| format!("Email: {}", v)),
        company.gstin.as_deref().map(|v| format!("GSTIN: {}", v)),
    ]
    .into_iter()
    .flatten()
    .collect();
    if !contacts.is_empty() {
        lines.push(format!("text(size: 9pt, {})", typst_str(&contacts.join(" | "))));
    }

    format!(
        "[#align(center, stack(spacing: 4pt, {})) #line(length: 100%, stroke: 0.5pt)]",
        lines.join(", ")
    )
}

fn align_name(alignment: Alignment) -> &'static str {
    match alignment {
        Alignment::Left => "left",
        Alignment::Center => "center",
        Alignment::Right => "right",
    }
}

fn render_block(out: &mut String, block: &RenderedBlock) {
    let align = align_name(block.alignment);
    match &block.kind {
        BlockKind::Heading { level } => {
            let _ = write!(
                out,
                "#align({})[#heading(level: {}, outlined: false)[#{}]]",
                align,
                level,
                typst_str(&block.text)
            );
        }
        BlockKind::Paragraph => {
            let body = block
                .text
                .split('\n')
                .map(|line| format!("#{}", typst_str(line)))
                .collect::<Vec<_>>()
                .join("#linebreak()");
            let _ = write!(out, "#align({})[{}]", align, body);
        }
        BlockKind::LineBreak => out.push_str("#v(1em)"),
        BlockKind::Table { header, rows } => {
            let columns = rows
                .iter()
                .map(Vec::len)
                .chain(std::iter::once(header.len()))
                .max()
                .unwrap_or(1)
                .max(1);

            let _ = writeln!(out, "#align({})[#table(", align);
            let _ = writeln!(out, "  columns: {},", columns);
            let header_cells = padded(header, columns)
                .map(|c| format!("[#strong({})]", typst_str(c)))
                .collect::<Vec<_>>()
                .join(", ");
            let _ = writeln!(out, "  table.header({}),", header_cells);
            for row in rows {
                let cells = padded(row, columns)
                    .map(|c| format!("[#{}]", typst_str(c)))
                    .collect::<Vec<_>>()
                    .join(", ");
                let _ = writeln!(out, "  {},", cells);
            }
            out.push_str(")]");
        }
    }
}

fn padded(cells: &[String], columns: usize) -> impl Iterator<Item = &str> {
    cells
        .iter()
        .map(String::as_str)
        .chain(std::iter::repeat(""))
        .take(columns)
}
