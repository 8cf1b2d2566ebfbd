use crate::ui::view::ShortcutInfo;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Draw the header bar with logo, page title, focused panel and shortcuts
pub fn draw_header(
  frame: &mut Frame,
  area: Rect,
  title: &str,
  context: &str,
  shortcuts: &[ShortcutInfo],
) {
  let mut spans = vec![
    Span::styled(" catui ", Style::default().fg(Color::Cyan).bold()),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(format!(" {} ", title), Style::default().fg(Color::White)),
    Span::styled("│", Style::default().fg(Color::DarkGray)),
    Span::styled(
      format!(" {} ", context),
      Style::default().fg(Color::Yellow).bold(),
    ),
    Span::raw(" "),
  ];
  spans.extend(shortcut_spans(shortcuts));

  let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}

/// Shortcuts ordered by priority, keys highlighted and labels dimmed
fn shortcut_spans(shortcuts: &[ShortcutInfo]) -> Vec<Span<'static>> {
  let mut sorted: Vec<&ShortcutInfo> = shortcuts.iter().collect();
  sorted.sort_by_key(|s| s.priority);

  sorted
    .into_iter()
    .flat_map(|s| {
      [
        Span::raw("  "),
        Span::styled(format!("<{}>", s.key), Style::default().fg(Color::Cyan)),
        Span::styled(format!(" {}", s.label), Style::default().fg(Color::DarkGray)),
      ]
    })
    .collect()
}
