//! Query keys for The Cat API.

use crate::cache::QueryKey;

/// Query key types for cat API calls.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum CatQueryKey {
  /// The gallery's image search batch
  Cats,
}

impl QueryKey for CatQueryKey {
  fn description(&self) -> String {
    match self {
      Self::Cats => "cats".to_string(),
    }
  }
}
