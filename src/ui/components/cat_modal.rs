use crate::catapi::CatImage;
use crate::ui::renderfns::centered_rect;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

/// Placeholder for a breed field the API left out
pub const UNKNOWN_FIELD: &str = "Unknown";
pub const BREED_UNKNOWN: &str = "Breed unknown";

/// Breed section of the detail overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BreedInfo<'a> {
  Known {
    name: &'a str,
    temperament: &'a str,
    origin: &'a str,
  },
  Unknown,
}

/// Everything the detail overlay shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalContent<'a> {
  pub id: &'a str,
  pub url: &'a str,
  pub breed: BreedInfo<'a>,
}

/// Decide what the overlay shows. Closed and "nothing selected" both mean
/// nothing is drawn.
pub fn modal_content(is_open: bool, cat: Option<&CatImage>) -> Option<ModalContent<'_>> {
  if !is_open {
    return None;
  }
  let cat = cat?;

  let breed = match cat.primary_breed() {
    Some(breed) => BreedInfo::Known {
      name: &breed.name,
      temperament: breed.temperament.as_deref().unwrap_or(UNKNOWN_FIELD),
      origin: breed.origin.as_deref().unwrap_or(UNKNOWN_FIELD),
    },
    None => BreedInfo::Unknown,
  };

  Some(ModalContent {
    id: &cat.id,
    url: &cat.url,
    breed,
  })
}

/// Draw the detail overlay centered in `area`, if there is anything to show.
///
/// Closing is up to the caller, who owns the open flag.
pub fn render_overlay(frame: &mut Frame, area: Rect, is_open: bool, cat: Option<&CatImage>) {
  let Some(content) = modal_content(is_open, cat) else {
    return;
  };

  let overlay_area = centered_rect(70, 60, area);
  frame.render_widget(Clear, overlay_area);

  let block = Block::default()
    .title(format!(" Cat {} ", content.id))
    .title_alignment(Alignment::Center)
    .title_bottom(Line::from(vec![
      Span::styled(" <Esc>", Style::default().fg(Color::Cyan)),
      Span::styled(" close ", Style::default().fg(Color::DarkGray)),
    ]))
    .borders(Borders::ALL)
    .border_style(Style::default().fg(Color::Yellow));

  let label = Style::default().fg(Color::DarkGray);
  let mut lines = vec![
    Line::from(Span::styled("Image", label)),
    Line::from(Span::styled(content.url, Style::default().fg(Color::Blue).underlined())),
    Line::default(),
  ];

  match content.breed {
    BreedInfo::Known {
      name,
      temperament,
      origin,
    } => {
      lines.push(Line::from(Span::styled(
        name,
        Style::default().fg(Color::Cyan).bold(),
      )));
      lines.push(Line::from(vec![
        Span::styled("Temperament: ", label),
        Span::raw(temperament),
      ]));
      lines.push(Line::from(vec![
        Span::styled("Origin: ", label),
        Span::raw(origin),
      ]));
    }
    BreedInfo::Unknown => {
      lines.push(Line::from(Span::styled(
        BREED_UNKNOWN,
        Style::default().fg(Color::DarkGray).italic(),
      )));
    }
  }

  let paragraph = Paragraph::new(lines)
    .block(block)
    .wrap(Wrap { trim: false });
  frame.render_widget(paragraph, overlay_area);
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catapi::Breed;
  use ratatui::backend::TestBackend;

  fn siamese() -> CatImage {
    CatImage {
      id: "1".to_string(),
      url: "u1".to_string(),
      breeds: vec![Breed {
        name: "Siamese".to_string(),
        temperament: None,
        origin: None,
      }],
    }
  }

  fn no_breed() -> CatImage {
    CatImage {
      id: "2".to_string(),
      url: "u2".to_string(),
      breeds: Vec::new(),
    }
  }

  fn rendered_text(is_open: bool, cat: Option<&CatImage>) -> String {
    let mut terminal = Terminal::new(TestBackend::new(60, 20)).unwrap();
    terminal
      .draw(|frame| render_overlay(frame, frame.area(), is_open, cat))
      .unwrap();
    terminal
      .backend()
      .buffer()
      .content()
      .iter()
      .map(|cell| cell.symbol())
      .collect()
  }

  #[test]
  fn test_closed_renders_nothing() {
    let cat = siamese();
    assert_eq!(modal_content(false, Some(&cat)), None);
    assert!(rendered_text(false, Some(&cat)).trim().is_empty());
  }

  #[test]
  fn test_open_without_cat_renders_nothing() {
    assert_eq!(modal_content(true, None), None);
    assert!(rendered_text(true, None).trim().is_empty());
  }

  #[test]
  fn test_known_breed_with_placeholders() {
    let cat = siamese();
    let content = modal_content(true, Some(&cat)).unwrap();
    assert_eq!(content.url, "u1");
    assert_eq!(
      content.breed,
      BreedInfo::Known {
        name: "Siamese",
        temperament: UNKNOWN_FIELD,
        origin: UNKNOWN_FIELD,
      }
    );

    let text = rendered_text(true, Some(&cat));
    assert!(text.contains("Siamese"));
    assert!(text.contains("Temperament: Unknown"));
    assert!(text.contains("Origin: Unknown"));
  }

  #[test]
  fn test_full_breed_details() {
    let mut cat = siamese();
    cat.breeds[0].temperament = Some("Vocal".to_string());
    cat.breeds[0].origin = Some("Thailand".to_string());

    let text = rendered_text(true, Some(&cat));
    assert!(text.contains("Temperament: Vocal"));
    assert!(text.contains("Origin: Thailand"));
  }

  #[test]
  fn test_unknown_breed() {
    let cat = no_breed();
    assert_eq!(
      modal_content(true, Some(&cat)).unwrap().breed,
      BreedInfo::Unknown
    );
    assert!(rendered_text(true, Some(&cat)).contains(BREED_UNKNOWN));
  }
}
