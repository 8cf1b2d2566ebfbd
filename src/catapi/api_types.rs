//! Serde-deserializable types matching The Cat API responses.
//!
//! These are kept apart from the domain types so that decoding stays lenient
//! while the conversion into domain types checks what the rest of the app
//! relies on (non-empty ids and urls, named breeds, unique ids per batch).

use serde::Deserialize;
use std::collections::HashSet;

use super::error::CatApiError;
use super::types::{Breed, CatImage};

#[derive(Debug, Deserialize)]
pub struct ApiBreed {
  pub name: String,
  pub temperament: Option<String>,
  pub origin: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCatImage {
  pub id: String,
  pub url: String,
  #[serde(default)]
  pub breeds: Option<Vec<ApiBreed>>,
}

impl ApiBreed {
  fn into_breed(self) -> Result<Breed, String> {
    let name = self.name.trim();
    if name.is_empty() {
      return Err("breed name is empty".to_string());
    }

    Ok(Breed {
      name: name.to_string(),
      temperament: non_blank(self.temperament),
      origin: non_blank(self.origin),
    })
  }
}

impl ApiCatImage {
  fn into_cat(self) -> Result<CatImage, String> {
    if self.id.trim().is_empty() {
      return Err("id is empty".to_string());
    }
    if self.url.trim().is_empty() {
      return Err(format!("image {} has an empty url", self.id));
    }

    let breeds = self
      .breeds
      .unwrap_or_default()
      .into_iter()
      .map(ApiBreed::into_breed)
      .collect::<Result<Vec<_>, _>>()
      .map_err(|e| format!("image {}: {}", self.id, e))?;

    Ok(CatImage {
      id: self.id,
      url: self.url,
      breeds,
    })
  }
}

/// Decode a search response body and convert it into domain records.
pub fn decode_search_response(body: &[u8]) -> Result<Vec<CatImage>, CatApiError> {
  let records: Vec<ApiCatImage> = serde_json::from_slice(body)?;

  let mut seen = HashSet::with_capacity(records.len());
  records
    .into_iter()
    .enumerate()
    .map(|(index, record)| {
      let cat = record
        .into_cat()
        .map_err(|reason| CatApiError::Schema { index, reason })?;
      if !seen.insert(cat.id.clone()) {
        return Err(CatApiError::Schema {
          index,
          reason: format!("duplicate id {}", cat.id),
        });
      }
      Ok(cat)
    })
    .collect()
}

/// Optional text fields sometimes come back as empty strings
fn non_blank(value: Option<String>) -> Option<String> {
  value.filter(|v| !v.trim().is_empty())
}
