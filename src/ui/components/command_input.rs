use super::input::{InputResult, TextInput};
use super::KeyResult;
use crate::commands::{self, Command};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};

/// Most suggestions shown at once
const MAX_SUGGESTIONS: usize = 6;

/// Command palette opened with ':', with autocomplete
#[derive(Debug, Clone, Default)]
pub struct CommandInput {
  input: TextInput,
  active: bool,
  selected_suggestion: usize,
}

impl CommandInput {
  pub fn new() -> Self {
    Self::default()
  }

  /// Check if command mode is currently active
  pub fn is_active(&self) -> bool {
    self.active
  }

  fn open(&mut self) {
    self.active = true;
    self.input.clear();
    self.selected_suggestion = 0;
  }

  fn close(&mut self) {
    self.active = false;
    self.input.clear();
    self.selected_suggestion = 0;
  }

  /// Get autocomplete suggestions for current input
  pub fn suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(self.input.value())
  }

  /// Handle a key event. Emits the resolved command name on Enter.
  ///
  /// Call this regardless of active state - it handles activation too.
  pub fn handle_key(&mut self, key: KeyEvent) -> KeyResult<String> {
    if !self.active {
      if key.code == KeyCode::Char(':') {
        self.open();
        return KeyResult::Handled;
      }
      return KeyResult::NotHandled;
    }

    let count = self.suggestions().len();
    match key.code {
      KeyCode::Tab | KeyCode::Down => {
        if count > 0 {
          self.selected_suggestion = (self.selected_suggestion + 1) % count;
        }
        return KeyResult::Handled;
      }
      KeyCode::BackTab | KeyCode::Up => {
        if count > 0 {
          self.selected_suggestion = (self.selected_suggestion + count - 1) % count;
        }
        return KeyResult::Handled;
      }
      _ => {}
    }

    match self.input.handle_key(key) {
      InputResult::Submitted(_) => {
        let cmd = self.resolve_command();
        self.close();
        KeyResult::Event(cmd)
      }
      InputResult::Cancelled => {
        self.close();
        KeyResult::Handled
      }
      InputResult::Consumed => {
        self.selected_suggestion = 0; // Reset on input change
        KeyResult::Handled
      }
      // Palette is modal, nothing leaks to the views behind it
      InputResult::NotHandled => KeyResult::Handled,
    }
  }

  /// Resolve the final command (from suggestion or direct input)
  fn resolve_command(&self) -> String {
    match self.suggestions().get(self.selected_suggestion) {
      Some(cmd) => cmd.name.to_string(),
      None => self.input.value().trim().to_lowercase(),
    }
  }

  /// Render the palette in the top-left corner of `area` if active
  pub fn render_overlay(&self, frame: &mut Frame, area: Rect) {
    if !self.active {
      return;
    }

    let suggestions = self.suggestions();
    let shown = suggestions.len().min(MAX_SUGGESTIONS) as u16;

    let width = (area.width * 60 / 100).clamp(30, 60).min(area.width);
    let height = (3 + shown).min(area.height);
    let overlay_area = Rect::new(area.x + 1, area.y + 1, width, height).intersection(area);

    frame.render_widget(Clear, overlay_area);

    let block = Block::default()
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Yellow))
      .title(" Command ");
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    if inner.height == 0 {
      return;
    }

    let [input_area, list_area] =
      Layout::vertical([Constraint::Length(1), Constraint::Min(0)]).areas(inner);

    let input_line = Line::from(vec![
      Span::styled(":", Style::default().fg(Color::Yellow)),
      Span::raw(self.input.value()),
      Span::styled("_", Style::default().fg(Color::Yellow)), // Cursor
    ]);
    frame.render_widget(Paragraph::new(input_line), input_area);

    if suggestions.is_empty() || list_area.height == 0 {
      return;
    }

    let items: Vec<ListItem> = suggestions
      .iter()
      .take(MAX_SUGGESTIONS)
      .map(|cmd| {
        ListItem::new(Line::from(vec![
          Span::styled(format!("{:<10}", cmd.name), Style::default().fg(Color::Cyan)),
          Span::styled(cmd.description, Style::default().fg(Color::DarkGray)),
        ]))
      })
      .collect();

    let list =
      List::new(items).highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));
    let mut state = ListState::default().with_selected(Some(self.selected_suggestion));
    frame.render_stateful_widget(list, list_area, &mut state);
  }
}
