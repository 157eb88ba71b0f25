use crate::ui::input_metrics::{char_display_width, cursor_row_col, wrap_input_lines};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::Line,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

/// Centered notice rendered over the transcript: feed ingestion progress,
/// its result, or a dismissible error.
pub enum NoticeModal<'a> {
    FeedProgress {
        rss_url: &'a str,
    },
    FeedResult {
        total_articles: u64,
    },
    Error {
        message: &'a str,
    },
}

pub fn input_visual_rows(input: &str, width: usize) -> usize {
    wrap_input_lines(input, width).len().max(1)
}

pub fn render_status_line(frame: &mut Frame<'_>, area: Rect, status: &str) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let text = truncate_line(status, area.width as usize);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

pub fn render_transcript(frame: &mut Frame<'_>, area: Rect, lines: &[String], scroll: usize) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let body = if lines.is_empty() {
        "Ask about your news feeds to get started.".to_string()
    } else {
        lines.join("\n")
    };

    let paragraph = Paragraph::new(body)
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: false })
        .scroll((scroll as u16, 0));
    frame.render_widget(paragraph, area);
}

pub fn render_input(frame: &mut Frame<'_>, area: Rect, input: &str, cursor_byte: usize) {
    if area.height == 0 || area.width <= 2 {
        return;
    }

    let input_width = area.width.saturating_sub(2).max(1) as usize;
    let lines = wrap_input_lines(input, input_width);
    let (cursor_row, cursor_col) = cursor_row_col(input, cursor_byte, input_width);
    let visible_rows = area.height as usize;
    let window_start = cursor_row.saturating_add(1).saturating_sub(visible_rows);

    let mut rendered = Vec::with_capacity(visible_rows);
    for offset in 0..visible_rows {
        let row_index = window_start + offset;
        let prefix = if row_index == 0 { "> " } else { "  " };
        let line = lines.get(row_index).cloned().unwrap_or_default();
        rendered.push(Line::from(format!("{prefix}{line}")));
    }

    frame.render_widget(
        Paragraph::new(rendered).style(Style::default().fg(Color::Gray)),
        area,
    );

    let cursor_y = area
        .y
        .saturating_add(cursor_row.saturating_sub(window_start) as u16);
    let cursor_x = area
        .x
        .saturating_add(2 + cursor_col as u16)
        .min(area.x.saturating_add(area.width.saturating_sub(1)));
    frame.set_cursor_position((cursor_x, cursor_y));
}

pub fn render_notice_modal(frame: &mut Frame<'_>, modal: NoticeModal<'_>) {
    let size = frame.area();
    let width = size.width.clamp(40, 80);
    let height = size.height.clamp(6, 9);
    let x = size.x + (size.width.saturating_sub(width)) / 2;
    let y = size.y + (size.height.saturating_sub(height)) / 2;
    let area = Rect::new(x, y, width, height);
    frame.render_widget(Clear, area);

    let (title, color, lines) = match modal {
        NoticeModal::FeedProgress { rss_url } => (
            "Adding feed",
            Color::Yellow,
            vec![
                Line::from(format!("Ingesting {rss_url}")),
                Line::from(""),
                Line::from("This fetches and indexes every article; hang tight."),
            ],
        ),
        NoticeModal::FeedResult { total_articles } => (
            "Feed added",
            Color::Green,
            vec![
                Line::from(format!("Indexed {total_articles} articles.")),
                Line::from(""),
                Line::from("esc to close"),
            ],
        ),
        NoticeModal::Error { message } => (
            "Error",
            Color::Red,
            vec![
                Line::from(message.to_string()),
                Line::from(""),
                Line::from("esc to dismiss"),
            ],
        ),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(lines)
            .style(Style::default().fg(Color::White))
            .wrap(Wrap { trim: false }),
        inner,
    );
}

fn truncate_line(input: &str, width: usize) -> String {
    let width = width.max(1);
    let mut out = String::new();
    let mut used = 0usize;

    for ch in input.chars() {
        let ch_width = char_display_width(ch);
        if used + ch_width > width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out
}
