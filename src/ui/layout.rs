use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Status header, scrolling transcript, and the input editor at the bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppPanes {
    pub status: Rect,
    pub transcript: Rect,
    pub input: Rect,
}

pub fn split_app_panes(area: Rect, input_rows: u16) -> AppPanes {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(input_rows.max(1)),
        ])
        .split(area);

    AppPanes {
        status: chunks[0],
        transcript: chunks[1],
        input: chunks[2],
    }
}
