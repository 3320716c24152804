use crate::events::Message;
use crate::llm::{Answer, AnswerService, ServiceUnavailable};
use crate::prompts::ERROR_MESSAGE;
use crate::session::Conversation;
use crate::ui::conversation::{
    get_help_text, ComposerResult, ConversationComposer, ConversationHistory, LoadingIndicator, ParsedCommand,
    SlashCommand,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};
use std::rc::Rc;
use std::sync::Arc;
use tokio::sync::oneshot;

const DISCLAIMER: &str = "AI는 실수를 할 수 있습니다. 중요한 정보는 확인이 필요합니다. | Powered by Gemini";

type TurnOutcome = Result<Answer, ServiceUnavailable>;

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
}

/// Owns the conversation and drives one turn at a time through the
/// answer service.
pub struct ConversationManager {
    conversation: Conversation,
    service: Arc<dyn AnswerService>,
    composer: ConversationComposer,
    indicator: LoadingIndicator,
    pending: Option<oneshot::Receiver<TurnOutcome>>,
    notice: Option<String>,
    site_url: String,
    show_timestamps: bool,
    scroll: usize,
    /// Last area the manager was drawn into
    viewport: Rect,
}

impl ConversationManager {
    pub fn new(service: Arc<dyn AnswerService>, site_url: impl Into<String>) -> Self {
        let site_url = site_url.into();
        Self {
            conversation: Conversation::for_site(&site_url),
            service,
            composer: ConversationComposer::new(),
            indicator: LoadingIndicator::new(),
            pending: None,
            notice: None,
            site_url,
            show_timestamps: true,
            scroll: 0,
            viewport: Rect::default(),
        }
    }

    pub fn with_timestamps(mut self, show: bool) -> Self {
        self.show_timestamps = show;
        self
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn is_busy(&self) -> bool {
        self.conversation.is_busy()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Lines the history is scrolled up from the bottom.
    pub fn scroll_offset(&self) -> usize {
        self.scroll
    }

    /// Record the terminal area; scrolling is bounded by what fits in it.
    pub fn set_viewport(&mut self, area: Rect) {
        self.viewport = area;
        self.scroll = self.scroll.min(self.max_scroll());
    }

    fn history(&self) -> ConversationHistory<'_> {
        ConversationHistory::new(self.conversation.messages())
            .show_timestamps(self.show_timestamps)
            .scroll(self.scroll)
    }

    fn max_scroll(&self) -> usize {
        self.history().max_scroll(layout(self.viewport)[0])
    }

    /// Start a turn. Returns `false`, leaving the conversation untouched,
    /// when the input is blank or a turn is already in flight.
    pub fn submit(&mut self, input: &str) -> bool {
        let utterance = input.trim();
        if utterance.is_empty() || self.conversation.is_busy() {
            return false;
        }

        // The provider sees everything before this question; the question
        // itself goes out as the wrapped final turn.
        let history = self.conversation.messages().to_vec();
        if let Err(e) = self.conversation.append(Message::user(utterance)) {
            log::warn!("Rejected user message: {}", e);
            return false;
        }

        self.conversation.set_busy(true);
        self.composer.set_locked(true);
        self.notice = None;
        self.scroll = 0;

        let (tx, rx) = oneshot::channel();
        let service = Arc::clone(&self.service);
        let utterance = utterance.to_string();
        tokio::spawn(async move {
            let outcome = service.answer(&history, &utterance).await;
            let _ = tx.send(outcome);
        });
        self.pending = Some(rx);

        log::info!("Turn started ({} messages)", self.conversation.len());
        true
    }

    /// Apply a finished turn if one is ready (called from the main loop)
    pub fn process_pending(&mut self) {
        let Some(rx) = self.pending.as_mut() else {
            return;
        };

        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(oneshot::error::TryRecvError::Empty) => return,
            Err(oneshot::error::TryRecvError::Closed) => {
                log::error!("Answer task ended without a result");
                Err(ServiceUnavailable)
            }
        };
        self.complete_turn(outcome);
    }

    /// Wait for the in-flight turn, if any, and apply it.
    pub async fn wait_for_answer(&mut self) {
        let Some(rx) = self.pending.take() else {
            return;
        };

        let outcome = rx.await.unwrap_or_else(|_| {
            log::error!("Answer task ended without a result");
            Err(ServiceUnavailable)
        });
        self.complete_turn(outcome);
    }

    /// Close the open turn with exactly one assistant message.
    fn complete_turn(&mut self, outcome: TurnOutcome) {
        self.pending = None;

        let message = match outcome {
            Ok(answer) => Message::answer(answer.text, answer.sources),
            Err(e) => {
                log::error!("Turn failed: {}", e);
                Message::model(ERROR_MESSAGE)
            }
        };
        if let Err(e) = self.conversation.append(message) {
            log::warn!("Failed to append assistant message: {}", e);
        }

        self.conversation.set_busy(false);
        self.composer.set_locked(false);
        self.scroll = 0;
    }

    /// Advance animations; also applies any finished turn.
    pub fn tick(&mut self) {
        if self.is_busy() {
            self.indicator.tick();
        }
        self.process_pending();
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.kind == KeyEventKind::Press {
            match key.code {
                KeyCode::Esc => return ConversationAction::Exit,
                KeyCode::PageUp | KeyCode::Up => {
                    let step = if key.code == KeyCode::PageUp { 10 } else { 1 };
                    self.scroll = (self.scroll + step).min(self.max_scroll());
                    return ConversationAction::None;
                }
                KeyCode::PageDown | KeyCode::Down => {
                    self.scroll = self.scroll.saturating_sub(if key.code == KeyCode::PageDown { 10 } else { 1 });
                    return ConversationAction::None;
                }
                _ => {}
            }
        }

        match self.composer.handle_key(key) {
            ComposerResult::Submitted(input) => {
                self.submit(&input);
                ConversationAction::None
            }
            ComposerResult::Command(command) => self.handle_slash_command(command),
            ComposerResult::None => ConversationAction::None,
        }
    }

    /// Handle slash commands
    fn handle_slash_command(&mut self, command: ParsedCommand) -> ConversationAction {
        match command.command {
            SlashCommand::Help => {
                self.notice = Some(get_help_text());
                ConversationAction::None
            }
            SlashCommand::Site => {
                self.notice = Some(format!("답변 출처 사이트: {}", self.site_url));
                ConversationAction::None
            }
            SlashCommand::Bye => ConversationAction::Exit,
        }
    }
}

fn layout(area: Rect) -> Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // History
            Constraint::Length(1), // Loading indicator
            Constraint::Length(3), // Composer
            Constraint::Length(1), // Footer
        ])
        .split(area)
}

impl Widget for &ConversationManager {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = layout(area);

        self.history().render(chunks[0], buf);

        if self.is_busy() {
            self.indicator.render(chunks[1], buf);
        }

        self.composer.render(chunks[2], buf);

        let footer = match &self.notice {
            Some(notice) => Line::from(vec![Span::styled(notice.as_str(), Style::default().fg(Color::Yellow))]),
            None => Line::from(vec![Span::styled(DISCLAIMER, Style::default().fg(Color::DarkGray))]),
        };
        buf.set_line(chunks[3].x, chunks[3].y, &footer, chunks[3].width);
    }
}
