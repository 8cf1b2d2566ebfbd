use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the footer bar: breadcrumb on the left, status on the right
pub fn draw_footer(frame: &mut Frame, area: Rect, breadcrumb: &[&str], status: &str) {
  let mut spans = vec![Span::raw(" ")];

  for (i, part) in breadcrumb.iter().enumerate() {
    if i > 0 {
      spans.push(Span::styled(" > ", Style::default().fg(Color::DarkGray)));
    }

    let style = if i == breadcrumb.len() - 1 {
      // Current panel - highlighted
      Style::default().fg(Color::Cyan).bold()
    } else {
      Style::default().fg(Color::White)
    };

    spans.push(Span::styled(part.to_string(), style));
  }

  let [left, right] =
    Layout::horizontal([Constraint::Min(0), Constraint::Length(status.chars().count() as u16 + 1)])
      .areas(area);

  let style = Style::default().bg(Color::Black);
  frame.render_widget(Paragraph::new(Line::from(spans)).style(style), left);
  frame.render_widget(
    Paragraph::new(Span::styled(status, Style::default().fg(Color::DarkGray)))
      .style(style)
      .alignment(Alignment::Right),
    right,
  );
}
