use crate::cache::{CacheSource, QueryClient};
use crate::catapi::{CatApiClient, CatImage, CatQueryKey};
use crate::query::{Query, QueryState};
use crate::ui::components::render_cat_modal;
use crate::ui::renderfns::truncate;
use crate::ui::view::{border_color, ShortcutInfo, View, ViewAction};
use chrono::Local;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use std::future::Future;

pub const LOADING_TEXT: &str = "Loading cats...";
pub const ERROR_TEXT: &str = "Failed to load cats.";
pub const EMPTY_TEXT: &str = "No cats found.";

/// Panels at least this wide get two tile columns
const TWO_COLUMN_MIN_WIDTH: u16 = 60;
/// Borders around the url and caption lines, the id sits in the title
const TILE_HEIGHT: u16 = 4;

/// Grid of cat images with a detail overlay for the selected one
pub struct GalleryView {
  query: Query<CatQueryKey, Vec<CatImage>>,
  selected: usize,
  /// Column count of the last render, used for up/down navigation
  columns: usize,
  /// First visible tile row
  scroll: usize,
  selected_cat: Option<CatImage>,
  modal_open: bool,
}

impl GalleryView {
  pub fn new(client: QueryClient<CatQueryKey>, api: CatApiClient) -> Self {
    Self::with_fetcher(client, move || {
      let api = api.clone();
      async move { api.search_images().await.map_err(|e| e.to_string()) }
    })
  }

  /// Build the view around any fetcher for the cat batch
  pub fn with_fetcher<F, Fut>(client: QueryClient<CatQueryKey>, fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<CatImage>, String>> + Send + 'static,
  {
    let mut query = Query::new(client, CatQueryKey::Cats, fetcher);

    // Start fetching immediately
    query.fetch();

    Self {
      query,
      selected: 0,
      columns: 2,
      scroll: 0,
      selected_cat: None,
      modal_open: false,
    }
  }

  fn cats(&self) -> &[CatImage] {
    self.query.data().map(|v| v.as_slice()).unwrap_or(&[])
  }

  /// Invalidate the batch so it is fetched again
  pub fn refresh(&mut self) {
    self.query.refetch();
  }

  #[cfg(test)]
  pub fn is_modal_open(&self) -> bool {
    self.modal_open
  }

  fn clamp_selection(&mut self) {
    let len = self.cats().len();
    if len == 0 {
      self.selected = 0;
    } else if self.selected >= len {
      self.selected = len - 1;
    }
  }

  fn move_selection(&mut self, key: KeyCode) {
    let len = self.cats().len();
    if len == 0 {
      return;
    }

    match key {
      KeyCode::Left | KeyCode::Char('h') => {
        self.selected = self.selected.saturating_sub(1);
      }
      KeyCode::Right | KeyCode::Char('l') => {
        if self.selected + 1 < len {
          self.selected += 1;
        }
      }
      KeyCode::Up | KeyCode::Char('k') => {
        if self.selected >= self.columns {
          self.selected -= self.columns;
        }
      }
      KeyCode::Down | KeyCode::Char('j') => {
        if self.selected + self.columns < len {
          self.selected += self.columns;
        }
      }
      _ => {}
    }
  }

  fn open_selected(&mut self) {
    if let Some(cat) = self.cats().get(self.selected) {
      self.selected_cat = Some(cat.clone());
      self.modal_open = true;
    }
  }

  /// Scroll so the selected row is inside the `visible_rows` window
  fn keep_selection_visible(&mut self, visible_rows: usize) {
    let row = self.selected / self.columns;
    if row < self.scroll {
      self.scroll = row;
    } else if row >= self.scroll + visible_rows {
      self.scroll = row + 1 - visible_rows;
    }
  }

  fn render_grid(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
    self.clamp_selection();

    let count = self.cats().len();
    let mut title = match self.query.state() {
      QueryState::Success(_) => format!(" Cats ({}) ", count),
      _ => " Cats ".to_string(),
    };
    if self.query.is_fetching() && self.query.data().is_some() {
      title.push_str("(refreshing...) ");
    } else if self.query.source() == Some(CacheSource::Offline) {
      // Refetch failed, the tiles are the last good batch
      let since = self
        .query
        .fetched_at()
        .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
        .unwrap_or_default();
      title.push_str(&format!("(offline, from {}) ", since));
    }

    let block = Block::default()
      .title(title)
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border_color(focused)));
    let inner = block.inner(area);

    let placeholder = match self.query.state() {
      _ if self.query.is_loading() => Some(LOADING_TEXT),
      QueryState::Idle => Some(LOADING_TEXT),
      QueryState::Error(_) => Some(ERROR_TEXT),
      QueryState::Success(_) if count == 0 => Some(EMPTY_TEXT),
      _ => None,
    };
    if let Some(text) = placeholder {
      let paragraph = Paragraph::new(text)
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    frame.render_widget(block, area);

    self.columns = if area.width >= TWO_COLUMN_MIN_WIDTH { 2 } else { 1 };
    let visible_rows = (inner.height / TILE_HEIGHT).max(1) as usize;
    self.keep_selection_visible(visible_rows);

    let tile_width = inner.width / self.columns as u16;
    let first = self.scroll * self.columns;
    let last = (first + visible_rows * self.columns).min(count);

    for index in first..last {
      let offset = index - first;
      let col = (offset % self.columns) as u16;
      let row = (offset / self.columns) as u16;
      let tile_area = Rect::new(
        inner.x + col * tile_width,
        inner.y + row * TILE_HEIGHT,
        tile_width,
        TILE_HEIGHT,
      )
      .intersection(inner);

      if let Some(cat) = self.cats().get(index) {
        render_tile(frame, tile_area, cat, index == self.selected);
      }
    }
  }
}

fn render_tile(frame: &mut Frame, area: Rect, cat: &CatImage, selected: bool) {
  let border = if selected {
    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
  } else {
    Style::default().fg(Color::DarkGray)
  };

  let block = Block::default()
    .title(format!(" {} ", cat.id))
    .borders(Borders::ALL)
    .border_style(border);

  let width = block.inner(area).width as usize;
  let caption = match cat.caption() {
    Some(name) => Span::styled(truncate(name, width), Style::default().fg(Color::Cyan)),
    None => Span::raw(""),
  };
  let lines = vec![
    Line::from(Span::styled(
      truncate(&cat.url, width),
      Style::default().fg(Color::Blue),
    )),
    Line::from(caption),
  ];

  frame.render_widget(Paragraph::new(lines).block(block), area);
}

impl View for GalleryView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    // The overlay is modal: it only listens for its close keys
    if self.modal_open {
      if matches!(
        key.code,
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter
      ) {
        self.modal_open = false;
      }
      return ViewAction::None;
    }

    match key.code {
      KeyCode::Left
      | KeyCode::Right
      | KeyCode::Up
      | KeyCode::Down
      | KeyCode::Char('h')
      | KeyCode::Char('j')
      | KeyCode::Char('k')
      | KeyCode::Char('l') => self.move_selection(key.code),
      KeyCode::Enter => self.open_selected(),
      KeyCode::Char('r') => self.refresh(),
      _ => return ViewAction::Unhandled,
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
    self.render_grid(frame, area, focused);
    render_cat_modal(
      frame,
      area,
      self.modal_open,
      self.selected_cat.as_ref(),
    );
  }

  fn breadcrumb_label(&self) -> String {
    match &self.selected_cat {
      Some(cat) if self.modal_open => format!("Gallery > {}", cat.id),
      _ => "Gallery".to_string(),
    }
  }

  fn tick(&mut self) {
    let polled = self.query.poll();
    let refreshed = self.query.refetch_if_stale();
    if polled || refreshed {
      self.clamp_selection();
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    if self.modal_open {
      return vec![ShortcutInfo::new("esc", "close").with_priority(10)];
    }
    vec![
      ShortcutInfo::new("enter", "details").with_priority(10),
      ShortcutInfo::new("r", "refresh").with_priority(20),
      ShortcutInfo::new(":", "command").with_priority(30),
      ShortcutInfo::new("q", "quit").with_priority(90),
    ]
  }
}
