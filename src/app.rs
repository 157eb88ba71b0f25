use crate::api::ApiClient;
use crate::auth::TokenProvider;
use crate::config::Config;
use crate::format::format_message;
use crate::state::{ChatSession, FeedTracker, SessionUpdate};
use crate::terminal::TerminalType;
use crate::types::{Message, Role};
use crate::ui::layout::split_app_panes;
use crate::ui::render::{
    input_visual_rows, render_input, render_notice_modal, render_status_line, render_transcript,
    NoticeModal,
};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task;
use tokio_util::sync::CancellationToken;

const MAX_INPUT_PANE_ROWS: usize = 4;
const PAGE_SCROLL_LINES: usize = 10;

/// User intents forwarded to the session worker. The worker handles them one
/// at a time, which is what serializes all mutation of the message sequence.
pub enum SessionCommand {
    Ask(String),
    Reset,
    LoadHistory,
    AddFeed(String),
}

/// Worker-to-UI notifications.
pub enum UiUpdate {
    StreamDelta(String),
    Transcript(Vec<Message>),
    AskFinished { error: Option<String> },
    HistoryFinished { error: Option<String> },
    ResetFinished { error: Option<String> },
    FeedFinished {
        total_articles: Option<u64>,
        error: Option<String>,
    },
}

#[derive(Debug, PartialEq, Eq)]
enum Submission {
    Ask(String),
    Quit,
    Reset,
    History,
    AddFeed(String),
    Unknown(String),
}

fn parse_submission(value: &str) -> Option<Submission> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    let Some(command) = value.strip_prefix('/') else {
        return Some(Submission::Ask(value.to_string()));
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };
    Some(match name {
        "quit" | "q" => Submission::Quit,
        "reset" => Submission::Reset,
        "history" => Submission::History,
        "feed" => Submission::AddFeed(arg.to_string()),
        other => Submission::Unknown(other.to_string()),
    })
}

pub struct App {
    command_tx: mpsc::UnboundedSender<SessionCommand>,
    update_rx: mpsc::UnboundedReceiver<UiUpdate>,
    cancel: CancellationToken,
    signed_in: bool,

    transcript: Vec<Message>,
    live_reply: String,

    sending: bool,
    syncing: bool,
    ingesting: bool,
    pending_feed_url: String,
    feed_result: Option<u64>,
    error: Option<String>,

    input: String,
    cursor: usize,
    scroll: usize,
    auto_follow: bool,
    quit: bool,
}

impl App {
    pub fn new(config: &Config, auth: Arc<dyn TokenProvider>) -> Self {
        let client = Arc::new(ApiClient::new(config));
        let session = Arc::new(Mutex::new(ChatSession::new(
            Arc::clone(&client),
            Arc::clone(&auth),
        )));
        let feed = Arc::new(Mutex::new(FeedTracker::new(client, Arc::clone(&auth))));

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        spawn_session_worker(session, feed, command_rx, update_tx, cancel.clone());

        Self {
            command_tx,
            update_rx,
            cancel,
            signed_in: auth.is_signed_in(),
            transcript: Vec::new(),
            live_reply: String::new(),
            sending: false,
            syncing: false,
            ingesting: false,
            pending_feed_url: String::new(),
            feed_result: None,
            error: None,
            input: String::new(),
            cursor: 0,
            scroll: 0,
            auto_follow: true,
            quit: false,
        }
    }

    pub async fn run(&mut self, terminal: &mut TerminalType) -> Result<()> {
        // One-time history fetch at session start.
        self.syncing = true;
        self.dispatch(SessionCommand::LoadHistory);
        if !self.signed_in {
            self.error = Some(
                "not signed in: set NEWSDESK_API_TOKEN to talk to the news assistant".to_string(),
            );
        }

        while !self.quit {
            self.drain_updates();
            self.draw(terminal)?;
            self.poll_input()?;
        }

        // Abandon any in-flight read; the worker exits and drops the stream.
        self.cancel.cancel();
        Ok(())
    }

    fn dispatch(&mut self, command: SessionCommand) {
        if self.command_tx.send(command).is_err() {
            self.error = Some("session worker stopped unexpectedly".to_string());
        }
    }

    fn drain_updates(&mut self) {
        while let Ok(update) = self.update_rx.try_recv() {
            self.apply_update(update);
        }
    }

    fn apply_update(&mut self, update: UiUpdate) {
        match update {
            UiUpdate::StreamDelta(delta) => {
                self.live_reply.push_str(&delta);
            }
            UiUpdate::Transcript(messages) => {
                self.transcript = messages;
                self.live_reply.clear();
            }
            UiUpdate::AskFinished { error } => {
                self.sending = false;
                if let Some(error) = error {
                    self.error = Some(error);
                }
            }
            UiUpdate::HistoryFinished { error } | UiUpdate::ResetFinished { error } => {
                self.syncing = false;
                if let Some(error) = error {
                    self.error = Some(error);
                }
            }
            UiUpdate::FeedFinished {
                total_articles,
                error,
            } => {
                self.ingesting = false;
                self.pending_feed_url.clear();
                if let Some(error) = error {
                    self.error = Some(error);
                } else if let Some(count) = total_articles {
                    self.feed_result = Some(count);
                }
            }
        }
    }

    fn busy(&self) -> bool {
        self.sending || self.syncing || self.ingesting
    }

    fn mode_label(&self) -> &'static str {
        if self.sending {
            "streaming"
        } else if self.ingesting {
            "ingesting"
        } else if self.syncing {
            "syncing"
        } else {
            "ready"
        }
    }

    fn status_line(&self) -> String {
        let auth = if self.signed_in {
            "signed-in"
        } else {
            "signed-out"
        };
        format!(
            "newsdesk  mode:{}  messages:{}  auth:{}  (/feed <url> /reset /history /quit)",
            self.mode_label(),
            self.transcript.len(),
            auth
        )
    }

    fn transcript_lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        for message in &self.transcript {
            match message.role() {
                Role::User => push_message_lines(&mut lines, "you>", message.content()),
                Role::Assistant => {
                    let body = if message.is_pending() {
                        message.content().to_string()
                    } else {
                        format_message(message.content())
                    };
                    push_message_lines(&mut lines, "news>", &body);
                }
            }
        }
        if self.sending && !self.live_reply.is_empty() {
            push_message_lines(&mut lines, "news>", &self.live_reply);
        }
        lines
    }

    fn draw(&mut self, terminal: &mut TerminalType) -> Result<()> {
        let status = self.status_line();
        let lines = self.transcript_lines();
        let app = &*self;

        terminal.draw(|frame| {
            let area = frame.area();
            let input_width = area.width.saturating_sub(2).max(1) as usize;
            let input_rows = input_visual_rows(&app.input, input_width).min(MAX_INPUT_PANE_ROWS);
            let panes = split_app_panes(area, input_rows as u16);

            render_status_line(frame, panes.status, &status);

            let viewport = panes.transcript.height as usize;
            let max_scroll = lines.len().saturating_sub(viewport);
            let scroll = if app.auto_follow {
                max_scroll
            } else {
                app.scroll.min(max_scroll)
            };
            render_transcript(frame, panes.transcript, &lines, scroll);
            render_input(frame, panes.input, &app.input, app.cursor);

            if let Some(message) = &app.error {
                render_notice_modal(frame, NoticeModal::Error { message });
            } else if app.ingesting {
                render_notice_modal(
                    frame,
                    NoticeModal::FeedProgress {
                        rss_url: &app.pending_feed_url,
                    },
                );
            } else if let Some(total_articles) = app.feed_result {
                render_notice_modal(frame, NoticeModal::FeedResult { total_articles });
            }
        })?;
        Ok(())
    }

    fn poll_input(&mut self) -> Result<()> {
        if !event::poll(Duration::from_millis(16))? {
            return Ok(());
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Release {
                self.handle_key(key);
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.quit = true;
            }
            KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                if self.input.is_empty() {
                    self.quit = true;
                }
            }
            KeyCode::Esc => {
                if self.error.take().is_none() {
                    self.feed_result = None;
                }
            }
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.cursor = self.prev_char_boundary(self.cursor),
            KeyCode::Right => self.cursor = self.next_char_boundary(self.cursor),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.input.len(),
            KeyCode::Up => self.scroll_up(1),
            KeyCode::Down => self.scroll_down(1),
            KeyCode::PageUp => self.scroll_up(PAGE_SCROLL_LINES),
            KeyCode::PageDown => self.scroll_down(PAGE_SCROLL_LINES),
            KeyCode::Char(ch)
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT) =>
            {
                self.insert_char(ch);
            }
            _ => {}
        }
    }

    fn submit(&mut self) {
        let Some(submission) = parse_submission(&self.input) else {
            return;
        };
        self.input.clear();
        self.cursor = 0;

        match submission {
            Submission::Quit => self.quit = true,
            Submission::Ask(question) => self.start_ask(question),
            Submission::Reset => {
                if self.refuse_if_busy() {
                    return;
                }
                self.syncing = true;
                self.dispatch(SessionCommand::Reset);
            }
            Submission::History => {
                if self.refuse_if_busy() {
                    return;
                }
                self.syncing = true;
                self.dispatch(SessionCommand::LoadHistory);
            }
            Submission::AddFeed(url) => {
                if url.is_empty() {
                    self.error = Some("usage: /feed <rss-url>".to_string());
                    return;
                }
                if self.refuse_if_busy() {
                    return;
                }
                self.ingesting = true;
                self.feed_result = None;
                self.pending_feed_url = url.clone();
                self.dispatch(SessionCommand::AddFeed(url));
            }
            Submission::Unknown(name) => {
                self.error = Some(format!("unknown command '/{name}'"));
            }
        }
    }

    fn start_ask(&mut self, question: String) {
        if self.refuse_if_busy() {
            return;
        }
        self.error = None;
        self.sending = true;
        self.auto_follow = true;
        self.live_reply.clear();
        // Echo the user message immediately; the worker's snapshot replaces
        // this mirror when the turn settles.
        self.transcript.push(Message::user(question.clone()));
        self.dispatch(SessionCommand::Ask(question));
    }

    /// Single-flight at the UI level: one session operation at a time.
    fn refuse_if_busy(&mut self) -> bool {
        if self.busy() {
            self.error = Some("wait for the current operation to finish".to_string());
            return true;
        }
        false
    }

    fn scroll_up(&mut self, lines: usize) {
        self.auto_follow = false;
        self.scroll = self.scroll.saturating_sub(lines);
    }

    fn scroll_down(&mut self, lines: usize) {
        // Clamped against the real maximum at render time; hitting the end
        // re-enables follow mode.
        self.scroll = self.scroll.saturating_add(lines);
        let total = self.transcript_lines().len();
        if self.scroll >= total {
            self.auto_follow = true;
        }
    }

    fn insert_char(&mut self, ch: char) {
        let cursor = self.clamp_cursor(self.cursor);
        self.input.insert(cursor, ch);
        self.cursor = cursor + ch.len_utf8();
    }

    fn backspace(&mut self) {
        let end = self.clamp_cursor(self.cursor);
        if end == 0 {
            return;
        }
        let start = self.prev_char_boundary(end);
        self.input.replace_range(start..end, "");
        self.cursor = start;
    }

    fn delete(&mut self) {
        let start = self.clamp_cursor(self.cursor);
        if start >= self.input.len() {
            return;
        }
        let end = self.next_char_boundary(start);
        self.input.replace_range(start..end, "");
        self.cursor = start;
    }

    fn clamp_cursor(&self, idx: usize) -> usize {
        crate::ui::input_metrics::clamp_to_char_boundary_left(&self.input, idx)
    }

    fn prev_char_boundary(&self, idx: usize) -> usize {
        let clamped = self.clamp_cursor(idx);
        if clamped == 0 {
            return 0;
        }
        let mut prev = clamped - 1;
        while prev > 0 && !self.input.is_char_boundary(prev) {
            prev -= 1;
        }
        prev
    }

    fn next_char_boundary(&self, idx: usize) -> usize {
        let clamped = self.clamp_cursor(idx);
        match self.input[clamped..].chars().next() {
            Some(ch) => clamped + ch.len_utf8(),
            None => self.input.len(),
        }
    }
}

fn push_message_lines(lines: &mut Vec<String>, label: &str, body: &str) {
    let mut first = true;
    for line in body.lines() {
        if first {
            lines.push(format!("{label} {line}"));
            first = false;
        } else {
            lines.push(format!("{:indent$} {line}", "", indent = label.len()));
        }
    }
    if first {
        lines.push(label.to_string());
    }
    lines.push(String::new());
}

fn spawn_session_worker(
    session: Arc<Mutex<ChatSession>>,
    feed: Arc<Mutex<FeedTracker>>,
    mut command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    update_tx: mpsc::UnboundedSender<UiUpdate>,
    cancel: CancellationToken,
) {
    task::spawn(async move {
        loop {
            let command = tokio::select! {
                _ = cancel.cancelled() => break,
                command = command_rx.recv() => match command {
                    Some(command) => command,
                    None => break,
                },
            };

            match command {
                SessionCommand::Ask(text) => {
                    let (delta_tx, mut delta_rx) = mpsc::unbounded_channel::<SessionUpdate>();
                    let forwarder = {
                        let update_tx = update_tx.clone();
                        task::spawn(async move {
                            while let Some(update) = delta_rx.recv().await {
                                if let SessionUpdate::AssistantDelta(delta) = update {
                                    let _ = update_tx.send(UiUpdate::StreamDelta(delta));
                                }
                            }
                        })
                    };

                    let result = {
                        let mut session = session.lock().await;
                        tokio::select! {
                            _ = cancel.cancelled() => None,
                            result = session.send_message(text, Some(&delta_tx)) => Some(result),
                        }
                    };
                    drop(delta_tx);
                    let _ = forwarder.await;

                    let Some(result) = result else {
                        // Cancelled mid-turn: abandon the pending read.
                        break;
                    };
                    send_snapshot(&session, &update_tx).await;
                    let _ = update_tx.send(UiUpdate::AskFinished {
                        error: result.err().map(|e| format!("{e:#}")),
                    });
                }
                SessionCommand::LoadHistory => {
                    let result = session.lock().await.load_history().await;
                    send_snapshot(&session, &update_tx).await;
                    let _ = update_tx.send(UiUpdate::HistoryFinished {
                        error: result.err().map(|e| format!("{e:#}")),
                    });
                }
                SessionCommand::Reset => {
                    let result = session.lock().await.reset().await;
                    send_snapshot(&session, &update_tx).await;
                    let _ = update_tx.send(UiUpdate::ResetFinished {
                        error: result.err().map(|e| format!("{e:#}")),
                    });
                }
                SessionCommand::AddFeed(url) => {
                    let result = feed.lock().await.submit(&url).await;
                    let (total_articles, error) = match result {
                        Ok(count) => (count, None),
                        Err(e) => (None, Some(format!("{e:#}"))),
                    };
                    let _ = update_tx.send(UiUpdate::FeedFinished {
                        total_articles,
                        error,
                    });
                }
            }
        }
    });
}

async fn send_snapshot(
    session: &Arc<Mutex<ChatSession>>,
    update_tx: &mpsc::UnboundedSender<UiUpdate>,
) {
    let messages = session.lock().await.messages().to_vec();
    let _ = update_tx.send(UiUpdate::Transcript(messages));
}
