/// Cat breed metadata attached to an image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Breed {
  pub name: String,
  pub temperament: Option<String>,
  pub origin: Option<String>,
}

/// One image record from the image search endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatImage {
  pub id: String,
  pub url: String,
  pub breeds: Vec<Breed>, // Empty when the API sent none
}

impl CatImage {
  /// The only breed ever displayed is the first one
  pub fn primary_breed(&self) -> Option<&Breed> {
    self.breeds.first()
  }

  /// Caption shown under a gallery tile
  pub fn caption(&self) -> Option<&str> {
    self.primary_breed().map(|b| b.name.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn breed(name: &str) -> Breed {
    Breed {
      name: name.to_string(),
      temperament: None,
      origin: None,
    }
  }

  #[test]
  fn test_caption_uses_first_breed() {
    let cat = CatImage {
      id: "1".to_string(),
      url: "u1".to_string(),
      breeds: vec![breed("Siamese"), breed("Persian")],
    };
    assert_eq!(cat.caption(), Some("Siamese"));
  }

  #[test]
  fn test_caption_without_breeds() {
    let cat = CatImage {
      id: "2".to_string(),
      url: "u2".to_string(),
      breeds: Vec::new(),
    };
    assert_eq!(cat.primary_breed(), None);
    assert_eq!(cat.caption(), None);
  }
}
