use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use chrono::{DateTime, Local};
use crate::app::{App, InputMode, Message, MessageKind};
use crate::format::emphasis_line;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, chat log, input box, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" banter ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.base_url.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn format_time(timestamp: DateTime<Local>) -> String {
    timestamp.format("%H:%M").to_string()
}

/// Decoded size of a base64 payload, without actually decoding it.
fn image_size_label(encoded: &str) -> String {
    let trimmed = encoded.trim();
    let padding = trimmed.chars().rev().take_while(|&c| c == '=').count();
    let bytes = (trimmed.len() / 4) * 3 - padding.min(2);

    if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{bytes} B")
    }
}

fn push_message_lines(
    lines: &mut Vec<Line<'static>>,
    msg: &Message,
    followups_active: bool,
) {
    let time_style = Style::default().fg(Color::DarkGray);

    match msg.kind {
        MessageKind::User => {
            lines.push(
                Line::from(vec![
                    Span::styled("You", Style::default().fg(Color::Cyan).bold()),
                    Span::styled(format!(" · {}", format_time(msg.created_at)), time_style),
                ])
                .right_aligned(),
            );
            for line in msg.content.lines() {
                lines.push(emphasis_line(line, Style::default()).right_aligned());
            }
        }
        MessageKind::Assistant => {
            lines.push(Line::from(vec![
                Span::styled("● AI", Style::default().fg(Color::Yellow).bold()),
                Span::styled(format!(" · {}", format_time(msg.created_at)), time_style),
            ]));
            for line in msg.content.lines() {
                lines.push(emphasis_line(line, Style::default()));
            }
            if let Some(encoded) = &msg.image {
                lines.push(Line::from(Span::styled(
                    format!("▣ generated image · {}", image_size_label(encoded)),
                    Style::default().fg(Color::Magenta),
                )));
            }
            if !msg.follow_ups.is_empty() {
                lines.push(Line::from(Span::styled(
                    "Continue the conversation:",
                    time_style,
                )));
                let row_style = if followups_active {
                    Style::default().fg(Color::Green)
                } else {
                    time_style
                };
                for (i, question) in msg.follow_ups.iter().enumerate() {
                    lines.push(Line::from(vec![
                        Span::styled(format!("[{}] ", i + 1), row_style.bold()),
                        Span::styled(question.clone(), row_style),
                    ]));
                }
            }
        }
        MessageKind::Error => {
            lines.push(Line::from(vec![
                Span::styled("✗ error", Style::default().fg(Color::Red).bold()),
                Span::styled(format!(" · {}", format_time(msg.created_at)), time_style),
            ]));
            for line in msg.content.lines() {
                lines.push(emphasis_line(line, Style::default().fg(Color::Red)));
            }
        }
    }

    lines.push(Line::default());
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    // Inner size minus borders, kept for scroll calculations
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let chat_focused = app.input_mode == InputMode::Normal;
    let border_color = if chat_focused { Color::Cyan } else { Color::DarkGray };

    let chat_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Conversation ");

    if app.messages.is_empty() && !app.loading {
        app.total_chat_lines = 0;
        app.scroll = 0;

        let placeholder = Text::from(vec![
            Line::default(),
            Line::from(Span::styled(
                "Start a conversation",
                Style::default().fg(Color::DarkGray).bold(),
            ))
            .centered(),
            Line::from(Span::styled(
                "Type a message below to begin chatting with the assistant",
                Style::default().fg(Color::DarkGray),
            ))
            .centered(),
        ]);

        let chat = Paragraph::new(placeholder)
            .block(chat_block)
            .wrap(Wrap { trim: true });
        frame.render_widget(chat, area);
        return;
    }

    // Number keys act on the newest suggestions only, and never mid-request
    let active_followup_id = if app.loading {
        None
    } else {
        app.latest_follow_ups().map(|m| m.id)
    };

    let mut lines: Vec<Line<'static>> = Vec::new();
    for msg in &app.messages {
        push_message_lines(&mut lines, msg, Some(msg.id) == active_followup_id);
    }

    if app.loading {
        lines.push(Line::from(Span::styled(
            "● AI",
            Style::default().fg(Color::Yellow).bold(),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        )));
    }

    app.total_chat_lines = lines.len() as u16;
    let max_scroll = app.total_chat_lines.saturating_sub(app.chat_height);
    app.scroll = app.scroll.min(max_scroll);

    let chat = Paragraph::new(Text::from(lines))
        .block(chat_block)
        .wrap(Wrap { trim: true })
        .scroll((app.scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let editing = app.input_mode == InputMode::Editing;
    let border_color = if editing { Color::Yellow } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message (Enter to send) ");

    if app.draft.is_empty() && !editing {
        let placeholder = Paragraph::new("Type your message here...")
            .style(Style::default().fg(Color::DarkGray))
            .block(input_block);
        frame.render_widget(placeholder, area);
        return;
    }

    // Horizontal scrolling keeps the cursor inside the visible slice.
    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .draft
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(input_block);

    frame.render_widget(input, area);

    if editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };
    let mode_text = match app.input_mode {
        InputMode::Normal => " CHAT ",
        InputMode::Editing => " INPUT ",
    };

    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];

    match app.input_mode {
        InputMode::Editing => {
            spans.extend(vec![
                Span::styled(" Enter ", key_style),
                Span::styled(" send ", label_style),
                Span::styled(" Esc ", key_style),
                Span::styled(" chat ", label_style),
            ]);
        }
        InputMode::Normal => {
            spans.extend(vec![
                Span::styled(" i ", key_style),
                Span::styled(" write ", label_style),
                Span::styled(" j/k ", key_style),
                Span::styled(" scroll ", label_style),
            ]);
            if app.latest_follow_ups().is_some() {
                spans.extend(vec![
                    Span::styled(" 1-9 ", key_style),
                    Span::styled(" follow-up ", label_style),
                ]);
            }
            if app.latest_image().is_some() {
                spans.extend(vec![
                    Span::styled(" s ", key_style),
                    Span::styled(" save image ", label_style),
                ]);
            }
            if !app.messages.is_empty() {
                spans.extend(vec![
                    Span::styled(" c ", key_style),
                    Span::styled(" clear ", label_style),
                ]);
            }
            spans.extend(vec![
                Span::styled(" q ", key_style),
                Span::styled(" quit ", label_style),
            ]);
        }
    }

    if let Some(status) = &app.status {
        spans.push(Span::styled(
            format!("  {}", status),
            Style::default().fg(Color::Gray),
        ));
    }

    if !app.messages.is_empty() {
        spans.push(Span::styled(
            format!("  {} messages", app.messages.len()),
            Style::default().fg(Color::DarkGray),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}
