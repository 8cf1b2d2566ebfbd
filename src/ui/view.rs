use crossterm::event::KeyEvent;
use ratatui::prelude::*;

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
  pub priority: u8, // Lower = shown first
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self {
      key,
      label,
      priority: 100,
    }
  }

  pub const fn with_priority(mut self, priority: u8) -> Self {
    self.priority = priority;
    self
  }
}

/// What a view did with a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewAction {
  /// Key consumed, nothing for App to do
  None,
  /// Key not used by the view, App may act on it (focus, quit, palette)
  Unhandled,
}

/// Trait for panel behavior
///
/// Views own their input handling and async state. App routes keys to the
/// focused view first and only acts on what comes back `Unhandled`.
///
/// Views that load data asynchronously use a `Query` or `Mutation`
/// internally and poll it in `tick()`.
pub trait View {
  /// Handle a key event, returning whether App should look at it
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view into `area`. `focused` views draw a highlighted border.
  fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool);

  /// Get the breadcrumb label for this view
  fn breadcrumb_label(&self) -> String;

  /// Called on each event loop iteration to poll async work
  fn tick(&mut self) {}

  /// Get keyboard shortcuts to display in the header while focused
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    Vec::new()
  }
}

/// Border color for a panel
pub fn border_color(focused: bool) -> Color {
  if focused {
    Color::Yellow
  } else {
    Color::Blue
  }
}
