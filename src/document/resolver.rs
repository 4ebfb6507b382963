//! Placeholder resolver and the single substitution pass over a template.

use super::aggregate::aggregate;
use super::catalog::{Collection, CollectionKind};
use super::context::DocumentContext;
use super::format::FormatConfig;
use super::scanner::{scan, AggregateKind, Token};
use super::table::{expand_table, GeneratedTable};

/// Resolves tokens against one context. Created per render and dropped afterwards.
pub struct Resolver<'a> {
    context: &'a DocumentContext,
    format: &'a FormatConfig,
    collections: Vec<Collection>,
}

impl<'a> Resolver<'a> {
    pub fn new(context: &'a DocumentContext, format: &'a FormatConfig) -> Self {
        let collections = CollectionKind::ALL
            .iter()
            .map(|kind| Collection::from_context(*kind, context))
            .collect();
        Self {
            context,
            format,
            collections,
        }
    }

    pub fn collection(&self, kind: CollectionKind) -> &Collection {
        // `ALL` lists the kinds in declaration order.
        &self.collections[kind as usize]
    }

    /// Text for a single token. Gaps in the data resolve to an empty string.
    pub fn resolve(&self, token: &Token<'_>) -> String {
        match token {
            Token::Literal(text) => (*text).to_string(),
            Token::Markup(directive) => directive.tag().to_string(),
            Token::Scalar(field) => field.value(self.context).display(self.format),
            Token::Current(field) => field.value(self.context).display(self.format),
            Token::Indexed {
                collection,
                column,
                index,
            } => self
                .collection(*collection)
                .cell(*index, *column)
                .map(|v| v.display(self.format))
                .unwrap_or_default(),
            Token::Table(kind) => self.expand_table(*kind).to_markup(),
            Token::Aggregate(kind, collection) => self.aggregate(*kind, *collection),
        }
    }

    pub fn expand_table(&self, kind: CollectionKind) -> GeneratedTable {
        expand_table(self.collection(kind), self.format)
    }

    pub fn aggregate(&self, kind: AggregateKind, collection: CollectionKind) -> String {
        aggregate(kind, self.collection(collection), self.format)
    }

    /// Substitute every token of `template` in one pass.
    ///
    /// Tables are placed on lines of their own so the formatter sees whole rows.
    pub fn render(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut needs_newline = false;

        for token in scan(template) {
            let text = self.resolve(&token);
            let is_table = matches!(token, Token::Table(_));

            if is_table && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            if needs_newline && !text.is_empty() {
                if !text.starts_with('\n') {
                    out.push('\n');
                }
                needs_newline = false;
            }

            out.push_str(&text);
            needs_newline |= is_table;
        }

        out
    }
}
