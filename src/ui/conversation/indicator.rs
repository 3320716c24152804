use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Widget,
};

/// "Answer pending" line shown above the composer while a turn is in flight.
#[derive(Debug, Clone, Default)]
pub struct LoadingIndicator {
    frame: usize,
}

impl LoadingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the animation by one frame
    pub fn tick(&mut self) {
        self.frame = self.frame.wrapping_add(1);
    }

    pub fn dots(&self) -> &'static str {
        match (self.frame / 3) % 4 {
            0 => ".",
            1 => "..",
            2 => "...",
            _ => "   ",
        }
    }
}

impl Widget for &LoadingIndicator {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let indicator = Line::from(vec![
            Span::styled("🤖 ", Style::default().fg(Color::Green)),
            Span::styled("사이트에서 답변을 찾는 중", Style::default().fg(Color::Green)),
            Span::styled(self.dots(), Style::default().fg(Color::Yellow)),
        ]);
        buf.set_line(area.x, area.y, &indicator, area.width);
    }
}
