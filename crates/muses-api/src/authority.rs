//! HTTP client for the authentication service.

use std::time::Duration;

use muses_core::authority::{Authority, AuthorityError};
use reqwest::Client;
use serde_json::json;
use tracing::{debug, instrument};
use url::Url;
use uuid::Uuid;

/// Registers and de-registers entities with the authentication service.
///
/// - link: `POST {base}/linkentity` with `{"user_id", "external_id"}`
/// - unlink: `DELETE {base}/delete/{actor}`
///
/// Any non-2xx answer is a failure. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpAuthority {
  client: Client,
  base:   Url,
}

impl HttpAuthority {
  /// Every request is bounded by `timeout`.
  pub fn new(base: Url, timeout: Duration) -> Result<Self, AuthorityError> {
    let client = Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| AuthorityError::Transport(e.to_string()))?;
    Ok(Self { client, base })
  }

  /// Client for the service reachable under the bare host name `name`
  /// (e.g. a container name), or `None` when `name` is blank.
  pub fn for_service(name: &str, timeout: Duration) -> Result<Option<Self>, AuthorityError> {
    let name = name.trim();
    if name.is_empty() {
      return Ok(None);
    }
    let base = Url::parse(&format!("http://{name}/"))
      .map_err(|e| AuthorityError::Transport(format!("invalid auth service name {name:?}: {e}")))?;
    Self::new(base, timeout).map(Some)
  }

  pub fn base(&self) -> &Url { &self.base }

  fn endpoint(&self, segments: &[&str]) -> Result<Url, AuthorityError> {
    let mut url = self.base.clone();
    url
      .path_segments_mut()
      .map_err(|_| AuthorityError::Transport("auth service URL cannot be a base".into()))?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  async fn send(&self, req: reqwest::RequestBuilder) -> Result<(), AuthorityError> {
    let resp = req
      .send()
      .await
      .map_err(|e| AuthorityError::Transport(e.to_string()))?;
    let status = resp.status();
    debug!(%status, "auth service answered");
    if !status.is_success() {
      return Err(AuthorityError::Status(status.as_u16()));
    }
    Ok(())
  }
}

impl Authority for HttpAuthority {
  #[instrument(skip_all, fields(base = %self.base, %entity_id))]
  async fn link(&self, actor: &str, entity_id: Uuid) -> Result<(), AuthorityError> {
    let url = self.endpoint(&["linkentity"])?;
    let body = json!({
      "user_id": actor,
      "external_id": entity_id.to_string(),
    });
    self.send(self.client.post(url).json(&body)).await
  }

  #[instrument(skip_all, fields(base = %self.base))]
  async fn unlink(&self, actor: &str) -> Result<(), AuthorityError> {
    let url = self.endpoint(&["delete", actor])?;
    self.send(self.client.delete(url)).await
  }
}
