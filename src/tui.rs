use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Span;

use crate::fmt::money;
use crate::scorer::ConfidenceBand;

pub const HEADER_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

pub const FOOTER_STYLE: Style = Style::new().fg(Color::DarkGray);

pub const AMOUNT_POS_STYLE: Style = Style::new().fg(Color::Rgb(80, 220, 100));
pub const AMOUNT_NEG_STYLE: Style = Style::new().fg(Color::Red);

pub const WARNING_STYLE: Style = Style::new()
    .fg(Color::Yellow)
    .add_modifier(Modifier::BOLD);

/// Format an amount as a colored Span (green inflow, red outflow).
/// Shows absolute value — color conveys the sign.
pub fn money_span(amount: f64) -> Span<'static> {
    let style = if amount < 0.0 {
        AMOUNT_NEG_STYLE
    } else {
        AMOUNT_POS_STYLE
    };
    Span::styled(money(amount.abs()), style)
}

/// Confidence score colored by its band.
pub fn confidence_span(score: i64) -> Span<'static> {
    let style = match ConfidenceBand::of(score) {
        ConfidenceBand::High => Style::new().fg(Color::Green).add_modifier(Modifier::BOLD),
        ConfidenceBand::Medium => Style::new().fg(Color::Yellow),
        ConfidenceBand::Low => Style::new().fg(Color::Red),
    };
    Span::styled(
        format!("{score} ({})", ConfidenceBand::of(score).as_str()),
        style,
    )
}

/// Wrap text to a given width. Returns (wrapped_string, line_count).
pub fn wrap_text(text: &str, width: usize) -> (String, u16) {
    if width == 0 {
        return (text.to_string(), 1);
    }
    let wrapped = textwrap::fill(text, width);
    let lines = wrapped.lines().count().max(1) as u16;
    (wrapped, lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_span_colors_by_sign() {
        assert_eq!(money_span(-12.5).style, AMOUNT_NEG_STYLE);
        assert_eq!(money_span(12.5).style, AMOUNT_POS_STYLE);
        assert_eq!(money_span(-12.5).content, "$12.50");
    }

    #[test]
    fn confidence_span_mentions_band() {
        assert!(confidence_span(95).content.contains("high"));
        assert!(confidence_span(75).content.contains("medium"));
        assert!(confidence_span(40).content.contains("low"));
    }

    #[test]
    fn wrap_text_counts_lines() {
        let (wrapped, lines) = wrap_text("one two three four five six", 10);
        assert!(lines >= 3);
        assert!(wrapped.contains('\n'));
        let (_, one) = wrap_text("short", 80);
        assert_eq!(one, 1);
    }
}
