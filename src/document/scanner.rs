//! Token scanner for template text.
//!
//! One left-to-right pass splits the template into literal runs, placeholders and
//! alignment tags. Anything between `{{` and `}}` that is not in the catalog stays
//! literal text, byte for byte.

use super::catalog::{CollectionKind, CurrentField, ScalarField};
use super::markup::MarkupDirective;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    /// `TOTAL_<PLURAL>_AMOUNT`
    Sum,
    /// `<PLURAL>_COUNT`
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    Literal(&'a str),
    Scalar(ScalarField),
    /// `{{AMOUNT}}`, `{{DATE}}`, `{{DESCRIPTION}}`
    Current(CurrentField),
    Indexed {
        collection: CollectionKind,
        column: usize,
        index: usize,
    },
    Table(CollectionKind),
    Aggregate(AggregateKind, CollectionKind),
    Markup(MarkupDirective),
}

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Split `template` into tokens, preserving literal runs verbatim.
pub fn scan(template: &str) -> Vec<Token<'_>> {
    let bytes = template.as_bytes();
    let mut tokens = Vec::new();
    let mut literal_start = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        let found = match bytes[pos] {
            b'{' => parse_placeholder(&template[pos..]),
            b'~' => MarkupDirective::parse_prefix(&template[pos..])
                .map(|(directive, len)| (Token::Markup(directive), len)),
            _ => None,
        };

        match found {
            Some((token, len)) => {
                if literal_start < pos {
                    tokens.push(Token::Literal(&template[literal_start..pos]));
                }
                tokens.push(token);
                pos += len;
                literal_start = pos;
            }
            None => pos += 1,
        }
    }

    if literal_start < bytes.len() {
        tokens.push(Token::Literal(&template[literal_start..]));
    }

    tokens
}

/// Parse a placeholder at the start of `s`, returning the token and its byte length.
fn parse_placeholder(s: &str) -> Option<(Token<'static>, usize)> {
    let body = s.strip_prefix(OPEN)?;
    let end = body.find(CLOSE)?;
    let name = &body[..end];
    let token = classify(name)?;
    Some((token, OPEN.len() + end + CLOSE.len()))
}

fn classify(name: &str) -> Option<Token<'static>> {
    if name.is_empty() || !name.bytes().all(is_name_byte) {
        return None;
    }

    // A bracket always means an indexed placeholder; a malformed one is never
    // reinterpreted as a scalar.
    if let Some(open) = name.find('[') {
        let field = &name[..open];
        let digits = name[open + 1..].strip_suffix(']')?;
        let index = parse_index(digits)?;
        let (collection, column) = CollectionKind::parse_field(field)?;
        return Some(Token::Indexed {
            collection,
            column,
            index,
        });
    }

    if let Some(plural) = name.strip_suffix("_TABLE") {
        if let Some(kind) = CollectionKind::from_plural(plural) {
            return Some(Token::Table(kind));
        }
    }
    if let Some(plural) = name
        .strip_prefix("TOTAL_")
        .and_then(|rest| rest.strip_suffix("_AMOUNT"))
    {
        if let Some(kind) = CollectionKind::from_plural(plural) {
            if kind.amount_column().is_some() {
                return Some(Token::Aggregate(AggregateKind::Sum, kind));
            }
        }
    }
    if let Some(plural) = name.strip_suffix("_COUNT") {
        if let Some(kind) = CollectionKind::from_plural(plural) {
            return Some(Token::Aggregate(AggregateKind::Count, kind));
        }
    }

    ScalarField::from_name(name)
        .map(Token::Scalar)
        .or_else(|| CurrentField::from_name(name).map(Token::Current))
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_uppercase() || b.is_ascii_digit() || matches!(b, b'_' | b'[' | b']')
}

/// Non-empty base-10 digits. Values too large for `usize` are clamped, which is
/// simply out of range for any collection.
fn parse_index(digits: &str) -> Option<usize> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits.parse::<usize>().unwrap_or(usize::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::markup::Alignment;

    #[test]
    fn test_plain_text_is_one_literal() {
        assert_eq!(scan("Hello world"), vec![Token::Literal("Hello world")]);
        assert!(scan("").is_empty());
    }

    #[test]
    fn test_scalar_between_literals() {
        let tokens = scan("Hello {{CLIENT_NAME}}, welcome");
        assert_eq!(
            tokens,
            vec![
                Token::Literal("Hello "),
                Token::Scalar(ScalarField::ClientName),
                Token::Literal(", welcome"),
            ]
        );
    }

    #[test]
    fn test_indexed_wins_over_scalar() {
        let tokens = scan("{{PAYMENT_RECEIPT_AMOUNT[2]}}");
        assert_eq!(
            tokens,
            vec![Token::Indexed {
                collection: CollectionKind::PaymentReceipts,
                column: 2,
                index: 2,
            }]
        );
    }

    #[test]
    fn test_malformed_index_stays_literal() {
        for text in [
            "{{PAYMENT_RECEIPT_AMOUNT[x]}}",
            "{{PAYMENT_RECEIPT_AMOUNT[ 1]}}",
            "{{PAYMENT_RECEIPT_AMOUNT[]}}",
            "{{PAYMENT_RECEIPT_AMOUNT[-1]}}",
            "{{PAYMENT_RECEIPT_AMOUNT[1}}",
            "{{PAYMENT_RECEIPT_AMOUNT[1]]}}",
        ] {
            assert_eq!(scan(text), vec![Token::Literal(text)], "{}", text);
        }
    }

    #[test]
    fn test_unknown_placeholder_stays_literal() {
        assert_eq!(
            scan("a {{NOT_A_FIELD}} b"),
            vec![Token::Literal("a {{NOT_A_FIELD}} b")]
        );
        assert_eq!(scan("{{ CLIENT_NAME }}"), vec![Token::Literal("{{ CLIENT_NAME }}")]);
        assert_eq!(scan("{{CLIENT_NAME"), vec![Token::Literal("{{CLIENT_NAME")]);
    }

    #[test]
    fn test_stray_open_brace_before_placeholder() {
        assert_eq!(
            scan("{{{CLIENT_NAME}}"),
            vec![Token::Literal("{"), Token::Scalar(ScalarField::ClientName)]
        );
    }

    #[test]
    fn test_table_and_aggregates() {
        assert_eq!(
            scan("{{PROJECT_MILESTONES_TABLE}}"),
            vec![Token::Table(CollectionKind::ProjectMilestones)]
        );
        assert_eq!(
            scan("{{TOTAL_PAYMENT_REQUESTS_AMOUNT}}"),
            vec![Token::Aggregate(AggregateKind::Sum, CollectionKind::PaymentRequests)]
        );
        assert_eq!(
            scan("{{PENDING_PAYMENTS_COUNT}}"),
            vec![Token::Aggregate(AggregateKind::Count, CollectionKind::PendingPayments)]
        );
        // Milestones carry no amount to sum.
        assert_eq!(
            scan("{{TOTAL_PROJECT_MILESTONES_AMOUNT}}"),
            vec![Token::Literal("{{TOTAL_PROJECT_MILESTONES_AMOUNT}}")]
        );
    }

    #[test]
    fn test_current_record_shorthand() {
        assert_eq!(
            scan("{{AMOUNT}} on {{DATE}}"),
            vec![
                Token::Current(CurrentField::Amount),
                Token::Literal(" on "),
                Token::Current(CurrentField::Date),
            ]
        );
    }

    #[test]
    fn test_alignment_tags_are_markup_tokens() {
        assert_eq!(
            scan("~center~Hi~/center~ ~bold~"),
            vec![
                Token::Markup(MarkupDirective::Open(Alignment::Center)),
                Token::Literal("Hi"),
                Token::Markup(MarkupDirective::Close(Alignment::Center)),
                Token::Literal(" ~bold~"),
            ]
        );
    }

    #[test]
    fn test_multibyte_text_around_tokens() {
        assert_eq!(
            scan("₹ {{FLAT_VALUE}} – ok"),
            vec![
                Token::Literal("₹ "),
                Token::Scalar(ScalarField::FlatValue),
                Token::Literal(" – ok"),
            ]
        );
    }

    #[test]
    fn test_huge_index_is_clamped() {
        match scan("{{PAYMENT_REQUEST_AMOUNT[99999999999999999999999]}}")[0] {
            Token::Indexed { index, .. } => assert_eq!(index, usize::MAX),
            ref other => panic!("unexpected token {:?}", other),
        }
    }
}
