use crate::cache::QueryClient;
use crate::catapi::{CatApiClient, CatImage, CatQueryKey};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::registration::SimulatedRegistrar;
use crate::ui::components::{CommandInput, KeyResult};
use crate::ui::renderfns::{draw_footer, draw_header};
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::{GalleryView, RegistrationView};
use chrono::Local;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::{stdout, Stdout};
use std::time::Duration;
use tracing::{info, warn};

const TICK_RATE: Duration = Duration::from_millis(250);

/// Which panel receives keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
  Register,
  Gallery,
}

impl Focus {
  fn label(self) -> &'static str {
    match self {
      Focus::Register => "Register",
      Focus::Gallery => "Gallery",
    }
  }

  fn toggled(self) -> Self {
    match self {
      Focus::Register => Focus::Gallery,
      Focus::Gallery => Focus::Register,
    }
  }
}

/// Main application state
pub struct App {
  /// Application configuration
  config: Config,

  /// Shared query cache, also held by both panels
  client: QueryClient<CatQueryKey>,

  register: RegistrationView,
  gallery: GalleryView,

  /// Panel that gets keys first
  focus: Focus,

  /// Command palette (after pressing :)
  command_input: CommandInput,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config) -> Result<Self> {
    let client = QueryClient::new().with_stale_time(config.cache.stale_time());
    let api = CatApiClient::new(&config.cat_api)?;
    let registrar = SimulatedRegistrar::new(config.registration.delay());

    let register = RegistrationView::new(client.clone(), registrar);
    let gallery = GalleryView::new(client.clone(), api);

    Ok(Self::from_parts(config, client, register, gallery))
  }

  fn from_parts(
    config: Config,
    client: QueryClient<CatQueryKey>,
    register: RegistrationView,
    gallery: GalleryView,
  ) -> Self {
    Self {
      config,
      client,
      register,
      gallery,
      focus: Focus::Register,
      command_input: CommandInput::new(),
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    info!("terminal ready");

    let result = self.event_loop(&mut terminal).await;

    // Cleanup terminal, even when the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    info!("terminal restored");

    result
  }

  async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);

    while !self.should_quit {
      terminal.draw(|frame| self.draw(frame))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    if let Event::Key(key) = event {
      self.handle_key(key);
    }
    // Poll async work on every event so results show up without waiting a tick
    self.register.tick();
    self.gallery.tick();
  }

  fn handle_key(&mut self, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      self.should_quit = true;
      return;
    }

    // The palette is modal while open
    if self.command_input.is_active() {
      if let KeyResult::Event(cmd) = self.command_input.handle_key(key) {
        self.execute_command(&cmd);
      }
      return;
    }

    if self.focused_view_mut().handle_key(key) == ViewAction::None {
      return;
    }

    match (self.focus, key.code) {
      (_, KeyCode::Tab) | (_, KeyCode::BackTab) => self.focus = self.focus.toggled(),
      (Focus::Register, KeyCode::Esc) => self.focus = Focus::Gallery,
      (Focus::Gallery, KeyCode::Char('q')) => self.should_quit = true,
      (Focus::Gallery, KeyCode::Char(':')) => {
        self.command_input.handle_key(key);
      }
      _ => {}
    }
  }

  fn execute_command(&mut self, cmd: &str) {
    match cmd {
      "register" => self.focus = Focus::Register,
      "gallery" => self.focus = Focus::Gallery,
      "refresh" => self.gallery.refresh(),
      "quit" => self.should_quit = true,
      _ => warn!(command = cmd, "unknown command"),
    }
  }

  fn focused_view(&self) -> &dyn View {
    match self.focus {
      Focus::Register => &self.register,
      Focus::Gallery => &self.gallery,
    }
  }

  fn focused_view_mut(&mut self) -> &mut dyn View {
    match self.focus {
      Focus::Register => &mut self.register,
      Focus::Gallery => &mut self.gallery,
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = self.focused_view().shortcuts();
    shortcuts.push(ShortcutInfo::new("tab", "switch panel").with_priority(80));
    shortcuts.push(ShortcutInfo::new("ctrl-c", "quit").with_priority(95));
    shortcuts
  }

  /// Freshness of the gallery's cached batch, for the footer
  fn cache_status(&self) -> String {
    let key = CatQueryKey::Cats;
    let Some(cats) = self.client.query_data::<Vec<CatImage>>(&key) else {
      return "cats: not loaded ".to_string();
    };

    let freshness = if self.client.is_stale(&key) {
      "stale"
    } else {
      "fresh"
    };
    let fetched = self
      .client
      .cached_at(&key)
      .map(|at| at.with_timezone(&Local).format("%H:%M:%S").to_string())
      .unwrap_or_else(|| "-".to_string());

    format!("{} cats | {} | fetched {} ", cats.len(), freshness, fetched)
  }

  fn draw(&mut self, frame: &mut Frame) {
    let [header_area, body_area, footer_area] = Layout::vertical([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Panels
      Constraint::Length(1), // Footer
    ])
    .areas(frame.area());

    draw_header(
      frame,
      header_area,
      &self.config.title,
      self.focus.label(),
      &self.shortcuts(),
    );

    let [form_area, gallery_area] = Layout::vertical([
      Constraint::Length(self.register.desired_height()),
      Constraint::Min(0),
    ])
    .areas(body_area);

    self
      .register
      .render(frame, form_area, self.focus == Focus::Register);
    self
      .gallery
      .render(frame, gallery_area, self.focus == Focus::Gallery);

    let crumb = self.focused_view().breadcrumb_label();
    draw_footer(
      frame,
      footer_area,
      &[self.config.title.as_str(), crumb.as_str()],
      &self.cache_status(),
    );

    // Palette renders last so it sits on top
    self.command_input.render_overlay(frame, body_area);
  }
}
