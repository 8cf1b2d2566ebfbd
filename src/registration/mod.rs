//! Cat registration: form validation and the simulated submission.
//!
//! The Cat API has no endpoint for creating cats, so submissions only wait
//! for a configurable delay and report success.

use std::time::Duration;
use tracing::info;

pub const NAME_REQUIRED: &str = "Name is required!";
pub const AGE_REQUIRED: &str = "Age is required!";
pub const AGE_NOT_A_NUMBER: &str = "Age must be a whole number!";
pub const AGE_NEGATIVE: &str = "Age must be 0 or greater!";

/// Validated registration input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormValues {
  pub name: String,
  pub age: u32,
  /// Age as the user typed it (trimmed), echoed back on success
  pub age_text: String,
}

/// Inline messages for fields that failed validation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
  pub name: Option<&'static str>,
  pub age: Option<&'static str>,
}

impl FieldErrors {
  pub fn is_empty(&self) -> bool {
    self.name.is_none() && self.age.is_none()
  }

  /// Messages in field order
  pub fn messages(&self) -> impl Iterator<Item = &'static str> {
    [self.name, self.age].into_iter().flatten()
  }
}

/// Check raw field text. Each field is checked on its own, so both errors
/// can be reported at once.
pub fn validate(name: &str, age: &str) -> Result<FormValues, FieldErrors> {
  let name = name.trim();
  let age_text = age.trim();
  let mut errors = FieldErrors::default();

  if name.is_empty() {
    errors.name = Some(NAME_REQUIRED);
  }

  let age = match parse_age(age_text) {
    Ok(age) => Some(age),
    Err(message) => {
      errors.age = Some(message);
      None
    }
  };

  match age {
    Some(age) if errors.is_empty() => Ok(FormValues {
      name: name.to_string(),
      age,
      age_text: age_text.to_string(),
    }),
    _ => Err(errors),
  }
}

fn parse_age(age: &str) -> Result<u32, &'static str> {
  if age.is_empty() {
    return Err(AGE_REQUIRED);
  }
  match age.parse::<i64>() {
    Ok(n) if n < 0 => Err(AGE_NEGATIVE),
    Ok(n) => u32::try_from(n).map_err(|_| AGE_NOT_A_NUMBER),
    Err(_) => Err(AGE_NOT_A_NUMBER),
  }
}

pub fn success_message(cat: &FormValues) -> String {
  format!(
    "Cat registered successfully!\nName: {}\nAge: {}",
    cat.name, cat.age_text
  )
}

pub fn failure_message(reason: &str) -> String {
  format!("Registration failed: {}", reason)
}

/// Stand-in for a registration backend
#[derive(Debug, Clone)]
pub struct SimulatedRegistrar {
  delay: Duration,
}

impl SimulatedRegistrar {
  pub fn new(delay: Duration) -> Self {
    Self { delay }
  }

  /// Pretend to store the cat. Nothing is sent anywhere.
  pub async fn register(&self, cat: FormValues) -> Result<(), String> {
    info!(name = %cat.name, age = cat.age, "submitting cat registration (simulated)");
    tokio::time::sleep(self.delay).await;
    Ok(())
  }
}
