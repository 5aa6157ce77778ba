//! HTTP transport for the HR REST API.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use crate::config::ApiConfig;
use crate::error::{Error, Result};

/// Thin wrapper around `reqwest::Client` bound to one API base URL.
///
/// Maps transport and status failures into the crate error taxonomy and never
/// returns partial data. Caching and retries are concerns of the query layer
/// above, not of this client.
#[derive(Clone)]
pub struct RestClient {
  http: Client,
  base: Url,
}

impl RestClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let base = Url::parse(&config.base_url)
      .map_err(|e| Error::Config(format!("invalid base url {}: {}", config.base_url, e)))?;

    let http = Client::builder()
      .timeout(config.timeout())
      .build()
      .map_err(|e| Error::Config(format!("failed to build http client: {}", e)))?;

    Ok(Self { http, base })
  }

  fn endpoint(&self, path: &str) -> Result<Url> {
    self
      .base
      .join(path)
      .map_err(|e| Error::Validation(format!("invalid request path {}: {}", path, e)))
  }

  pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    let url = self.endpoint(path)?;
    let response = self.http.get(url).send().await.map_err(from_transport)?;
    decode_json(check_status(response).await?).await
  }

  pub async fn post_json<T: DeserializeOwned, B: Serialize>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T> {
    let url = self.endpoint(path)?;
    let response = self
      .http
      .post(url)
      .json(body)
      .send()
      .await
      .map_err(from_transport)?;
    decode_json(check_status(response).await?).await
  }

  pub async fn put_json<T: DeserializeOwned, B: Serialize>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T> {
    let url = self.endpoint(path)?;
    let response = self
      .http
      .put(url)
      .json(body)
      .send()
      .await
      .map_err(from_transport)?;
    decode_json(check_status(response).await?).await
  }

  /// PUT without a request body, discarding the response body.
  pub async fn put_empty(&self, path: &str) -> Result<()> {
    let url = self.endpoint(path)?;
    let response = self.http.put(url).send().await.map_err(from_transport)?;
    check_status(response).await?;
    Ok(())
  }

  pub async fn delete(&self, path: &str) -> Result<()> {
    let url = self.endpoint(path)?;
    let response = self.http.delete(url).send().await.map_err(from_transport)?;
    check_status(response).await?;
    Ok(())
  }
}

/// Timeouts and connection failures both surface as `Network`.
fn from_transport(err: reqwest::Error) -> Error {
  Error::Network(err.to_string())
}

/// Reject non-2xx responses, extracting the server's `detail` message when
/// the body carries one.
async fn check_status(response: Response) -> Result<Response> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  let detail = response
    .text()
    .await
    .ok()
    .and_then(|body| extract_detail(&body))
    .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());

  Err(Error::Server {
    status: status.as_u16(),
    detail,
  })
}

fn extract_detail(body: &str) -> Option<String> {
  let value: serde_json::Value = serde_json::from_str(body).ok()?;
  match value.get("detail")? {
    serde_json::Value::String(s) => Some(s.clone()),
    other => Some(other.to_string()),
  }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
  let bytes = response.bytes().await.map_err(from_transport)?;
  serde_json::from_slice(&bytes).map_err(|e| Error::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extract_detail_reads_string_and_structured_bodies() {
    assert_eq!(
      extract_detail(r#"{"detail": "employee not found"}"#),
      Some("employee not found".to_string())
    );
    assert_eq!(
      extract_detail(r#"{"detail": {"field": "email"}}"#),
      Some(r#"{"field":"email"}"#.to_string())
    );
    assert_eq!(extract_detail("<html>502</html>"), None);
  }

  #[test]
  fn invalid_base_url_is_a_config_error() {
    let config = ApiConfig {
      base_url: "not a url".to_string(),
      timeout_secs: 10,
    };
    assert!(matches!(RestClient::new(&config), Err(Error::Config(_))));
  }
}
