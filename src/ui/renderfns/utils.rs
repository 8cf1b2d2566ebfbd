use ratatui::prelude::*;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// A rectangle of the given percentage size centered in `area`
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
  let scale = |len: u16, percent: u16| (u32::from(len) * u32::from(percent) / 100) as u16;
  let width = scale(area.width, percent_x).max(20).min(area.width);
  let height = scale(area.height, percent_y).max(7).min(area.height);

  let x = area.x + (area.width - width) / 2;
  let y = area.y + (area.height - height) / 2;
  Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_short_string() {
    assert_eq!(truncate("hello", 10), "hello");
  }

  #[test]
  fn test_truncate_exact_length() {
    assert_eq!(truncate("hello", 5), "hello");
  }

  #[test]
  fn test_truncate_long_string() {
    assert_eq!(truncate("hello world", 8), "hello...");
  }

  #[test]
  fn test_truncate_multibyte() {
    assert_eq!(truncate("Abyssinian Ragdoll", 10), "Abyssin...");
    assert_eq!(truncate("ééééé", 4), "é...");
  }

  #[test]
  fn test_centered_rect() {
    let area = Rect::new(0, 0, 100, 50);
    assert_eq!(centered_rect(50, 50, area), Rect::new(25, 12, 50, 25));
  }

  #[test]
  fn test_centered_rect_very_wide_area() {
    let area = Rect::new(0, 0, 2000, 1000);
    assert_eq!(centered_rect(70, 60, area), Rect::new(300, 200, 1400, 600));
  }

  #[test]
  fn test_centered_rect_small_area() {
    let area = Rect::new(5, 5, 10, 4);
    assert_eq!(centered_rect(50, 50, area), area);
  }
}
