//! Inline emphasis formatting for message bodies.
//!
//! The generate service marks up replies with a small asterisk subset:
//! `***text***` for bold italic, `**text**` for bold, `*text*` for italic.
//! Rules are applied in that order, each match non-greedy, and unbalanced
//! runs fall through as literal text. The output is styled spans, so the
//! text itself is never re-interpreted as markup.

use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

/// Format one line of message text into styled spans on top of `base`.
pub fn emphasis_line(text: &str, base: Style) -> Line<'static> {
    Line::from(emphasis_spans(text, base))
}

pub fn emphasis_spans(text: &str, base: Style) -> Vec<Span<'static>> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut spans = vec![Span::styled(text.to_string(), base)];
    for (marker, modifier) in [
        ("***", Modifier::BOLD | Modifier::ITALIC),
        ("**", Modifier::BOLD),
        ("*", Modifier::ITALIC),
    ] {
        spans = apply_rule(spans, marker, modifier);
    }
    spans
}

/// Run one delimiter rule across every span produced so far. Earlier rules
/// produce styled spans whose text is still visible to later rules, so a
/// `*x*` nested inside `***...***` content picks up italics there.
fn apply_rule(
    spans: Vec<Span<'static>>,
    marker: &str,
    modifier: Modifier,
) -> Vec<Span<'static>> {
    let mut out = Vec::with_capacity(spans.len());

    for span in spans {
        let style = span.style;
        let mut rest: &str = &span.content;

        loop {
            let Some(open) = rest.find(marker) else {
                if !rest.is_empty() {
                    out.push(Span::styled(rest.to_string(), style));
                }
                break;
            };

            let after_open = open + marker.len();
            let Some(close) = rest[after_open..].find(marker) else {
                // No closing run anywhere ahead, keep the rest literal.
                out.push(Span::styled(rest.to_string(), style));
                break;
            };

            if open > 0 {
                out.push(Span::styled(rest[..open].to_string(), style));
            }

            let content = &rest[after_open..after_open + close];
            if !content.is_empty() {
                out.push(Span::styled(
                    content.to_string(),
                    style.add_modifier(modifier),
                ));
            }

            rest = &rest[after_open + close + marker.len()..];
            if rest.is_empty() {
                break;
            }
        }
    }

    out
}
