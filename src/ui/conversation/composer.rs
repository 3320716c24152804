use crate::ui::conversation::commands::{parse_slash_command, ParsedCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

pub const PLACEHOLDER: &str = "독도에 대해 궁금한 점을 물어보세요...";

/// Result returned when the user interacts with the conversation composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    /// Trimmed, non-empty question
    Submitted(String),
    Command(ParsedCommand),
    None,
}

/// State for the text area within the composer. `cursor` counts chars, not
/// bytes, so Hangul input edits cleanly.
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    pub cursor: usize,
}

impl TextAreaState {
    fn byte_offset(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.content.len())
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    fn insert_char(&mut self, c: char) {
        let offset = self.byte_offset(self.cursor);
        self.content.insert(offset, c);
        self.cursor += 1;
    }

    /// Delete character before cursor
    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let offset = self.byte_offset(self.cursor);
            self.content.remove(offset);
        }
    }

    /// Delete character at cursor
    fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let offset = self.byte_offset(self.cursor);
            self.content.remove(offset);
        }
    }

    fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }
}

/// Input box at the bottom of the screen
#[derive(Debug, Clone, Default)]
pub struct ConversationComposer {
    state: TextAreaState,
    locked: bool,
}

impl ConversationComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// While locked (a turn is in flight) every key is ignored.
    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn content(&self) -> &str {
        &self.state.content
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ComposerResult {
        if key.kind != KeyEventKind::Press || self.locked {
            return ComposerResult::None;
        }

        let state = &mut self.state;
        match key.code {
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => state.insert_char('\n'),
            KeyCode::Enter => {
                if state.content.trim().is_empty() {
                    return ComposerResult::None;
                }
                let content = state.take();
                if let Some(command) = parse_slash_command(&content) {
                    return ComposerResult::Command(command);
                }
                return ComposerResult::Submitted(content.trim().to_string());
            }
            KeyCode::Char(c) => state.insert_char(c),
            KeyCode::Backspace => state.backspace(),
            KeyCode::Delete => state.delete(),
            KeyCode::Left => state.cursor = state.cursor.saturating_sub(1),
            KeyCode::Right => state.cursor = (state.cursor + 1).min(state.char_len()),
            KeyCode::Home => state.cursor = 0,
            KeyCode::End => state.cursor = state.char_len(),
            _ => {}
        }

        ComposerResult::None
    }

    fn title(&self) -> &'static str {
        if self.locked {
            "🔒 답변을 기다리는 중"
        } else {
            "✏️ 질문하기 (Enter 전송 · /help)"
        }
    }
}

impl Widget for &ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title())
            .style(if self.locked {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::Blue)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        let state = &self.state;
        if state.content.is_empty() {
            let placeholder = Line::from(vec![Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray))]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder, inner_area.width);
            return;
        }

        let mut content = state.content.clone();
        if !self.locked {
            content.insert(state.byte_offset(state.cursor), '▌');
        }

        // Keep the cursor's line visible by showing the last lines.
        let lines: Vec<&str> = content.split('\n').collect();
        let height = inner_area.height as usize;
        let start = lines.len().saturating_sub(height);
        for (i, text) in lines[start..].iter().enumerate() {
            let line = Line::from(vec![Span::styled(*text, Style::default().fg(Color::White))]);
            buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
        }
    }
}
