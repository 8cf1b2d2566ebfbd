use crate::cache::QueryClient;
use crate::catapi::CatQueryKey;
use crate::query::Mutation;
use crate::registration::{self, FieldErrors, FormValues, SimulatedRegistrar};
use crate::ui::components::{InputResult, TextInput};
use crate::ui::view::{border_color, ShortcutInfo, View, ViewAction};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use std::future::Future;
use tracing::{debug, info, warn};

const NO_BACKEND_NOTE: &str =
  "Note: nothing is stored, The Cat API has no endpoint for registering cats.";

/// Where the last submission stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
  Idle,
  Submitting,
  Succeeded,
  Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
  Name,
  Age,
}

/// Name/age form backed by a (simulated) registration mutation
pub struct RegistrationView {
  client: QueryClient<CatQueryKey>,
  name: TextInput,
  age: TextInput,
  focus: Field,
  errors: FieldErrors,
  phase: SubmissionPhase,
  /// Result of the last completed submission, overwritten by the next one
  status_message: Option<String>,
  mutation: Mutation<FormValues, ()>,
}

impl RegistrationView {
  pub fn new(client: QueryClient<CatQueryKey>, registrar: SimulatedRegistrar) -> Self {
    Self::with_mutation(client, move |cat| {
      let registrar = registrar.clone();
      async move { registrar.register(cat).await }
    })
  }

  /// Build the form around any submission function
  pub fn with_mutation<F, Fut>(client: QueryClient<CatQueryKey>, mutator: F) -> Self
  where
    F: Fn(FormValues) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), String>> + Send + 'static,
  {
    Self {
      client,
      name: TextInput::new(),
      age: TextInput::new(),
      focus: Field::Name,
      errors: FieldErrors::default(),
      phase: SubmissionPhase::Idle,
      status_message: None,
      mutation: Mutation::new(mutator),
    }
  }

  #[cfg(test)]
  pub fn phase(&self) -> SubmissionPhase {
    self.phase
  }

  #[cfg(test)]
  pub fn status_message(&self) -> Option<&str> {
    self.status_message.as_deref()
  }

  fn focused_input(&mut self) -> &mut TextInput {
    match self.focus {
      Field::Name => &mut self.name,
      Field::Age => &mut self.age,
    }
  }

  fn submit(&mut self) {
    if self.mutation.is_pending() {
      return;
    }

    match registration::validate(self.name.value(), self.age.value()) {
      Ok(cat) => {
        self.errors = FieldErrors::default();
        self.phase = SubmissionPhase::Submitting;
        self.mutation.mutate(cat);
      }
      Err(errors) => {
        debug!(errors = ?errors.messages().collect::<Vec<_>>(), "registration input rejected");
        self.focus = if errors.name.is_some() {
          Field::Name
        } else {
          Field::Age
        };
        self.errors = errors;
        // An earlier outcome no longer describes the form
        self.phase = SubmissionPhase::Idle;
        self.status_message = None;
      }
    }
  }

  fn apply_outcome(&mut self, cat: FormValues, result: Result<(), String>) {
    match result {
      Ok(()) => {
        info!(name = %cat.name, age = cat.age, "cat registered");
        self.client.invalidate(&CatQueryKey::Cats);
        self.name.clear();
        self.age.clear();
        self.focus = Field::Name;
        self.phase = SubmissionPhase::Succeeded;
        self.status_message = Some(registration::success_message(&cat));
      }
      Err(reason) => {
        warn!(name = %cat.name, error = %reason, "cat registration failed");
        self.phase = SubmissionPhase::Failed;
        self.status_message = Some(registration::failure_message(&reason));
      }
    }
  }

  fn status_lines(&self) -> u16 {
    self
      .status_message
      .as_deref()
      .map(|m| m.lines().count() as u16)
      .unwrap_or(0)
  }

  /// Rows the form needs to show everything without clipping
  pub fn desired_height(&self) -> u16 {
    // borders + two inputs with their error rows + submit row + note
    2 + 2 * (3 + 1) + 1 + self.status_lines() + 1
  }

  fn render_field(
    frame: &mut Frame,
    area: Rect,
    label: &str,
    input: &TextInput,
    error: Option<&str>,
    active: bool,
  ) {
    let [input_area, error_area] =
      Layout::vertical([Constraint::Length(3), Constraint::Length(1)]).areas(area);

    let border = if active { Color::Yellow } else { Color::DarkGray };
    let block = Block::default()
      .title(format!(" {} ", label))
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border));
    let inner = block.inner(input_area);
    frame.render_widget(Paragraph::new(input.value()).block(block), input_area);

    if let Some(error) = error {
      frame.render_widget(
        Paragraph::new(Span::styled(error, Style::default().fg(Color::Red))),
        error_area,
      );
    }

    if active {
      let x = inner.x + (input.cursor_position() as u16).min(inner.width.saturating_sub(1));
      frame.set_cursor_position((x, inner.y));
    }
  }
}

impl View for RegistrationView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Up => {
        self.focus = Field::Name;
        return ViewAction::None;
      }
      KeyCode::Down => {
        self.focus = Field::Age;
        return ViewAction::None;
      }
      KeyCode::Enter => {
        self.submit();
        return ViewAction::None;
      }
      KeyCode::Esc | KeyCode::Tab | KeyCode::BackTab => return ViewAction::Unhandled,
      _ => {}
    }

    // Fields are read-only while a submission runs
    if self.phase == SubmissionPhase::Submitting {
      return ViewAction::None;
    }

    match self.focused_input().handle_key(key) {
      InputResult::NotHandled => ViewAction::Unhandled,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect, focused: bool) {
    let block = Block::default()
      .title(" Register a cat ")
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(border_color(focused)));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [name_area, age_area, submit_area, status_area, note_area] = Layout::vertical([
      Constraint::Length(4),
      Constraint::Length(4),
      Constraint::Length(1),
      Constraint::Length(self.status_lines()),
      Constraint::Length(1),
    ])
    .areas(inner);

    let editing = focused && self.phase != SubmissionPhase::Submitting;
    Self::render_field(
      frame,
      name_area,
      "Name",
      &self.name,
      self.errors.name,
      editing && self.focus == Field::Name,
    );
    Self::render_field(
      frame,
      age_area,
      "Age",
      &self.age,
      self.errors.age,
      editing && self.focus == Field::Age,
    );

    let submit = if self.phase == SubmissionPhase::Submitting {
      Line::from(Span::styled(
        "Registering...",
        Style::default().fg(Color::Yellow).add_modifier(Modifier::ITALIC),
      ))
    } else {
      Line::from(vec![
        Span::styled("<Enter>", Style::default().fg(Color::Cyan)),
        Span::styled(" register", Style::default().fg(Color::DarkGray)),
      ])
    };
    frame.render_widget(Paragraph::new(submit), submit_area);

    if let Some(message) = &self.status_message {
      let color = match self.phase {
        SubmissionPhase::Failed => Color::Red,
        _ => Color::Green,
      };
      frame.render_widget(
        Paragraph::new(message.as_str())
          .style(Style::default().fg(color))
          .wrap(Wrap { trim: false }),
        status_area,
      );
    }

    frame.render_widget(
      Paragraph::new(Span::styled(
        NO_BACKEND_NOTE,
        Style::default().fg(Color::DarkGray),
      )),
      note_area,
    );
  }

  fn breadcrumb_label(&self) -> String {
    "Register".to_string()
  }

  fn tick(&mut self) {
    while let Some(outcome) = self.mutation.poll() {
      self.apply_outcome(outcome.variables, outcome.result);
    }
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("enter", "register").with_priority(10),
      ShortcutInfo::new("↑/↓", "field").with_priority(20),
      ShortcutInfo::new("esc", "gallery").with_priority(30),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::CacheResult;
  use crate::registration::{AGE_NEGATIVE, AGE_REQUIRED, NAME_REQUIRED};
  use crossterm::event::KeyModifiers;
  use ratatui::backend::TestBackend;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;
  use std::time::Duration;

  fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
  }

  fn type_str(view: &mut RegistrationView, s: &str) {
    for c in s.chars() {
      view.handle_key(key(KeyCode::Char(c)));
    }
  }

  fn fill(view: &mut RegistrationView, name: &str, age: &str) {
    view.handle_key(key(KeyCode::Up));
    type_str(view, name);
    view.handle_key(key(KeyCode::Down));
    type_str(view, age);
  }

  fn counting_view(
    client: &QueryClient<CatQueryKey>,
    calls: &Arc<AtomicU32>,
    result: Result<(), String>,
  ) -> RegistrationView {
    let calls = calls.clone();
    RegistrationView::with_mutation(client.clone(), move |_| {
      let calls = calls.clone();
      let result = result.clone();
      async move {
        calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        result
      }
    })
  }

  fn rendered_text(view: &mut RegistrationView) -> String {
    let mut terminal = Terminal::new(TestBackend::new(90, 24)).unwrap();
    terminal
      .draw(|frame| view.render(frame, frame.area(), true))
      .unwrap();
    terminal
      .backend()
      .buffer()
      .content()
      .iter()
      .map(|cell| cell.symbol())
      .collect()
  }

  #[tokio::test]
  async fn test_valid_submission_flow() {
    let client = QueryClient::new();
    let cached: Result<CacheResult<Arc<Vec<u32>>>, String> = client
      .fetch_query(&CatQueryKey::Cats, || async { Ok(vec![1]) })
      .await;
    assert!(cached.is_ok());
    assert!(!client.is_stale(&CatQueryKey::Cats));
    let mut invalidations = client.subscribe();

    let calls = Arc::new(AtomicU32::new(0));
    let mut view = counting_view(&client, &calls, Ok(()));
    assert_eq!(view.phase(), SubmissionPhase::Idle);

    fill(&mut view, "Tom", "3");
    view.handle_key(key(KeyCode::Enter));
    assert_eq!(view.phase(), SubmissionPhase::Submitting);
    assert!(rendered_text(&mut view).contains("Registering..."));

    tokio::time::sleep(Duration::from_millis(30)).await;
    view.tick();

    assert_eq!(view.phase(), SubmissionPhase::Succeeded);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(view.name.value().is_empty());
    assert!(view.age.value().is_empty());

    let message = view.status_message().unwrap();
    assert!(message.starts_with("Cat registered successfully!"));
    assert!(message.contains("Name: Tom"));
    assert!(message.contains("Age: 3"));

    assert!(client.is_stale(&CatQueryKey::Cats));
    assert_eq!(invalidations.try_recv().unwrap(), CatQueryKey::Cats);
  }

  #[tokio::test]
  async fn test_invalid_input_never_submits() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));
    let mut view = counting_view(&client, &calls, Ok(()));

    view.handle_key(key(KeyCode::Enter));
    tokio::time::sleep(Duration::from_millis(20)).await;
    view.tick();

    assert_eq!(view.phase(), SubmissionPhase::Idle);
    assert_eq!(view.errors.name, Some(NAME_REQUIRED));
    assert_eq!(view.errors.age, Some(AGE_REQUIRED));
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    let text = rendered_text(&mut view);
    assert!(text.contains(NAME_REQUIRED));
    assert!(text.contains(AGE_REQUIRED));
  }

  #[tokio::test]
  async fn test_negative_age_reports_only_age_error() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));
    let mut view = counting_view(&client, &calls, Ok(()));

    fill(&mut view, "Tom", "-2");
    view.handle_key(key(KeyCode::Enter));

    assert_eq!(view.errors.name, None);
    assert_eq!(view.errors.age, Some(AGE_NEGATIVE));
    assert_eq!(view.focus, Field::Age);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_failed_submission_keeps_input() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));
    let mut view = counting_view(&client, &calls, Err("service unavailable".to_string()));

    fill(&mut view, "Tom", "3");
    view.handle_key(key(KeyCode::Enter));
    tokio::time::sleep(Duration::from_millis(30)).await;
    view.tick();

    assert_eq!(view.phase(), SubmissionPhase::Failed);
    assert_eq!(
      view.status_message(),
      Some("Registration failed: service unavailable")
    );
    assert_eq!(view.name.value(), "Tom");
    assert_eq!(view.age.value(), "3");
  }

  #[tokio::test]
  async fn test_panicking_submission_fails() {
    let client = QueryClient::new();
    let mut view = RegistrationView::with_mutation(client, |_| async {
      if true {
        panic!("backend exploded");
      }
      Ok(())
    });

    fill(&mut view, "Tom", "3");
    view.handle_key(key(KeyCode::Enter));
    tokio::time::sleep(Duration::from_millis(20)).await;
    view.tick();

    assert_eq!(view.phase(), SubmissionPhase::Failed);
    assert!(view
      .status_message()
      .unwrap()
      .starts_with("Registration failed:"));
    assert_eq!(view.name.value(), "Tom");
  }

  #[tokio::test]
  async fn test_enter_while_submitting_is_ignored() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));
    let mut view = counting_view(&client, &calls, Ok(()));

    fill(&mut view, "Tom", "3");
    view.handle_key(key(KeyCode::Enter));
    view.handle_key(key(KeyCode::Enter));
    type_str(&mut view, "9");
    assert_eq!(view.age.value(), "3");

    tokio::time::sleep(Duration::from_millis(30)).await;
    view.tick();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_rejected_input_after_outcome_resets_phase() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));
    let mut view = counting_view(&client, &calls, Ok(()));

    fill(&mut view, "Tom", "3");
    view.handle_key(key(KeyCode::Enter));
    tokio::time::sleep(Duration::from_millis(30)).await;
    view.tick();
    assert_eq!(view.phase(), SubmissionPhase::Succeeded);

    view.handle_key(key(KeyCode::Enter));
    assert_eq!(view.phase(), SubmissionPhase::Idle);
    assert_eq!(view.status_message(), None);
    assert_eq!(view.errors.name, Some(NAME_REQUIRED));
    assert!(!rendered_text(&mut view).contains("Cat registered successfully!"));

    let mut view = counting_view(&client, &calls, Err("service unavailable".to_string()));
    fill(&mut view, "Tom", "3");
    view.handle_key(key(KeyCode::Enter));
    tokio::time::sleep(Duration::from_millis(30)).await;
    view.tick();
    assert_eq!(view.phase(), SubmissionPhase::Failed);

    type_str(&mut view, "x");
    view.handle_key(key(KeyCode::Enter));
    assert_eq!(view.phase(), SubmissionPhase::Idle);
    assert_eq!(view.status_message(), None);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_typed_age_is_echoed_verbatim() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));
    let mut view = counting_view(&client, &calls, Ok(()));

    fill(&mut view, "Bond", "007");
    view.handle_key(key(KeyCode::Enter));
    tokio::time::sleep(Duration::from_millis(30)).await;
    view.tick();

    assert!(view.status_message().unwrap().contains("Age: 007"));
  }

  #[tokio::test]
  async fn test_status_message_is_overwritten() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));
    let mut view = counting_view(&client, &calls, Ok(()));

    fill(&mut view, "Tom", "3");
    view.handle_key(key(KeyCode::Enter));
    tokio::time::sleep(Duration::from_millis(30)).await;
    view.tick();

    fill(&mut view, "Luna", "5");
    view.handle_key(key(KeyCode::Enter));
    tokio::time::sleep(Duration::from_millis(30)).await;
    view.tick();

    let message = view.status_message().unwrap();
    assert!(message.contains("Luna"));
    assert!(!message.contains("Tom"));
  }

  #[tokio::test]
  async fn test_navigation_keys() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));
    let mut view = counting_view(&client, &calls, Ok(()));

    type_str(&mut view, "Mia");
    view.handle_key(key(KeyCode::Down));
    type_str(&mut view, "4");
    assert_eq!(view.name.value(), "Mia");
    assert_eq!(view.age.value(), "4");

    assert_eq!(view.handle_key(key(KeyCode::Esc)), ViewAction::Unhandled);
    assert_eq!(view.handle_key(key(KeyCode::Tab)), ViewAction::Unhandled);
  }

  #[tokio::test]
  async fn test_render_shows_note_and_fields() {
    let client = QueryClient::new();
    let calls = Arc::new(AtomicU32::new(0));
    let mut view = counting_view(&client, &calls, Ok(()));
    type_str(&mut view, "Félix");

    let text = rendered_text(&mut view);
    assert!(text.contains("Félix"));
    assert!(text.contains("nothing is stored"));
  }
}
