//! Conversation history display component

use crate::events::{Message, Role};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use unicode_width::UnicodeWidthChar;

/// Read-only view over the conversation. Rendering never touches the store,
/// so the same messages always produce the same screen.
pub struct ConversationHistory<'a> {
    messages: &'a [Message],
    show_timestamps: bool,
    /// Lines scrolled up from the bottom
    scroll: usize,
}

impl<'a> ConversationHistory<'a> {
    pub fn new(messages: &'a [Message]) -> Self {
        Self {
            messages,
            show_timestamps: true,
            scroll: 0,
        }
    }

    pub fn show_timestamps(mut self, show: bool) -> Self {
        self.show_timestamps = show;
        self
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    /// All display lines for the conversation at the given width.
    pub fn lines(&self, width: u16) -> Vec<Line<'a>> {
        let mut all_lines = Vec::new();
        for message in self.messages {
            all_lines.extend(self.render_message(message, width));
            all_lines.push(Line::default());
        }
        all_lines
    }

    /// Largest useful scroll offset when drawn into `area`: lines that do
    /// not fit below the top of the view.
    pub fn max_scroll(&self, area: Rect) -> usize {
        let inner_area = frame().inner(area);
        self.lines(inner_area.width)
            .len()
            .saturating_sub(inner_area.height as usize)
    }

    /// Render a single message into lines
    fn render_message(&self, message: &'a Message, width: u16) -> Vec<Line<'a>> {
        let mut lines = Vec::new();

        let icon = match message.role {
            Role::User => "👤",
            Role::Model => "🤖",
        };
        let mut header = vec![Span::styled(
            format!("{} {}", icon, message.role.display_name()),
            Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD),
        )];
        if self.show_timestamps {
            header.push(Span::styled(format!("  {}", message.clock_time()), Style::default().fg(Color::DarkGray)));
        }
        lines.push(Line::from(header));

        let content_width = width.saturating_sub(2) as usize;
        for content_line in wrap_text(&message.text, content_width) {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(content_line, content_style(message.role)),
            ]));
        }

        let sources = message.cited_sources();
        if !sources.is_empty() {
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled("ℹ 참고 출처", Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD)),
            ]));
            for source in sources {
                lines.push(Line::from(vec![
                    Span::raw("    • "),
                    Span::styled(source.title.as_str(), Style::default().fg(Color::Cyan)),
                    Span::styled(format!(" <{}>", source.uri), Style::default().fg(Color::DarkGray)),
                ]));
            }
        }

        lines
    }
}

fn frame() -> Block<'static> {
    Block::default().borders(Borders::ALL).title("💬 Dokdo Vibe")
}

fn content_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Blue),
        Role::Model => Style::default().fg(Color::White),
    }
}

/// Wrap text to fit within the given display width. Explicit newlines are
/// kept so Markdown lists and tables stay line-aligned.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return text.lines().map(str::to_string).collect();
    }

    let mut lines = Vec::new();
    for raw_line in text.lines() {
        let mut current = String::new();
        let mut current_width = 0;

        for c in raw_line.chars() {
            let w = c.width().unwrap_or(0);
            if current_width + w > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
                current_width = 0;
            }
            current.push(c);
            current_width += w;
        }
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

impl Widget for ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = frame();
        let inner_area = block.inner(area);
        block.render(area, buf);

        let all_lines = self.lines(inner_area.width);

        // Bottom-anchored window, shifted up by the scroll offset.
        let height = inner_area.height as usize;
        let total = all_lines.len();
        let end = total - self.scroll.min(total.saturating_sub(height));
        let start = end.saturating_sub(height);

        for (i, line) in all_lines[start..end].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Source;
    use crate::session::Conversation;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    fn sample_conversation() -> Conversation {
        let mut conversation = Conversation::new();
        conversation.append(Message::user("독도는 어디에 있나요?")).unwrap();
        conversation
            .append(Message::answer(
                "**독도**는 동해에 있습니다.\n- 동도\n- 서도",
                vec![Source {
                    title: "vibe_dokdo".into(),
                    uri: "https://pnumin.github.io/vibe_dokdo".into(),
                }],
            ))
            .unwrap();
        conversation
    }

    #[test]
    fn wrap_respects_display_width_and_newlines() {
        assert_eq!(wrap_text("독도독도독", 4), vec!["독도", "독도", "독"]);
        assert_eq!(wrap_text("a\nb", 10), vec!["a", "b"]);
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }

    #[test]
    fn sources_are_listed_under_answers() {
        let conversation = sample_conversation();
        let lines: Vec<String> = ConversationHistory::new(conversation.messages())
            .lines(80)
            .iter()
            .map(text_of)
            .collect();

        assert!(lines.iter().any(|l| l.contains("참고 출처")));
        assert!(lines.iter().any(|l| l.contains("vibe_dokdo <https://pnumin.github.io/vibe_dokdo>")));
        assert!(lines.iter().any(|l| l.trim() == "- 동도"));
        assert!(lines.iter().any(|l| l.contains("독도 바이브 봇")));
        assert!(lines.iter().any(|l| l.contains("나")));
    }

    #[test]
    fn uncited_answer_has_no_source_block() {
        let mut conversation = Conversation::new();
        conversation.append(Message::answer("답변을 찾을 수 없음", vec![])).unwrap();
        let lines = ConversationHistory::new(conversation.messages()).lines(80);
        assert!(!lines.iter().map(text_of).any(|l| l.contains("참고 출처")));
    }

    #[test]
    fn rendering_is_idempotent() {
        let conversation = sample_conversation();
        let area = Rect::new(0, 0, 60, 20);

        let mut first = Buffer::empty(area);
        ConversationHistory::new(conversation.messages()).render(area, &mut first);
        let mut second = Buffer::empty(area);
        ConversationHistory::new(conversation.messages()).render(area, &mut second);

        assert_eq!(first, second);
        assert_eq!(conversation.len(), 3);
    }

    #[test]
    fn scroll_reveals_older_lines() {
        let conversation = sample_conversation();
        let area = Rect::new(0, 0, 60, 5);

        let mut bottom = Buffer::empty(area);
        ConversationHistory::new(conversation.messages()).render(area, &mut bottom);
        let mut scrolled = Buffer::empty(area);
        ConversationHistory::new(conversation.messages()).scroll(100).render(area, &mut scrolled);

        assert_ne!(bottom, scrolled);
    }

    #[test]
    fn max_scroll_counts_lines_beyond_the_view() {
        let conversation = sample_conversation();
        let history = ConversationHistory::new(conversation.messages());
        let total = history.lines(58).len();

        assert_eq!(history.max_scroll(Rect::new(0, 0, 60, 5)), total - 3);
        assert_eq!(history.max_scroll(Rect::new(0, 0, 60, 200)), 0);

        // Scrolling past the limit shows the same top window.
        let area = Rect::new(0, 0, 60, 5);
        let max = history.max_scroll(area);
        let mut at_max = Buffer::empty(area);
        ConversationHistory::new(conversation.messages()).scroll(max).render(area, &mut at_max);
        let mut beyond = Buffer::empty(area);
        ConversationHistory::new(conversation.messages()).scroll(max + 50).render(area, &mut beyond);
        assert_eq!(at_max, beyond);
    }
}
