use crate::catapi::api_types::decode_search_response;
use crate::catapi::error::CatApiError;
use crate::catapi::types::CatImage;
use crate::config::CatApiConfig;
use color_eyre::{eyre::eyre, Result};
use tracing::{debug, info};
use url::Url;

const API_KEY_HEADER: &str = "x-api-key";

/// The Cat API client wrapper
#[derive(Clone)]
pub struct CatApiClient {
  http: reqwest::Client,
  search_url: Url,
  api_key: Option<String>,
}

impl CatApiClient {
  pub fn new(config: &CatApiConfig) -> Result<Self> {
    // Url::join drops the last path segment unless the base ends with '/'
    let base = if config.base_url.ends_with('/') {
      config.base_url.clone()
    } else {
      format!("{}/", config.base_url)
    };

    let mut search_url = Url::parse(&base)
      .and_then(|u| u.join("images/search"))
      .map_err(|e| eyre!("Invalid cat API base url {}: {}", config.base_url, e))?;
    search_url
      .query_pairs_mut()
      .append_pair("limit", &config.limit.to_string())
      .append_pair("has_breeds", "1");

    let http = reqwest::Client::builder()
      .user_agent(concat!("catui/", env!("CARGO_PKG_VERSION")))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      search_url,
      api_key: config.api_key.clone(),
    })
  }

  /// Fetch one batch of images that carry breed metadata.
  ///
  /// Issues a single GET and never retries.
  pub async fn search_images(&self) -> Result<Vec<CatImage>, CatApiError> {
    debug!(url = %self.search_url, authenticated = self.api_key.is_some(), "searching cat images");

    let mut request = self.http.get(self.search_url.clone());
    if let Some(key) = &self.api_key {
      request = request.header(API_KEY_HEADER, key);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
      return Err(CatApiError::Status(status));
    }

    let body = response.bytes().await?;
    let cats = decode_search_response(&body)?;

    info!(count = cats.len(), "cat images loaded");
    Ok(cats)
  }

  #[cfg(test)]
  pub fn search_url(&self) -> &Url {
    &self.search_url
  }
}
