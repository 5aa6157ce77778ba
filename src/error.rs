//! Error taxonomy for the synchronization engine.
//!
//! Every variant is `Clone` because a single in-flight fetch can be joined by
//! many waiters, and each of them receives the same failure.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error)]
pub enum Error {
  /// Transport-level failure: timeout, connection refused, DNS.
  #[error("network error: {0}")]
  Network(String),

  /// The server answered with a 4xx/5xx status.
  #[error("server error {status}: {detail}")]
  Server { status: u16, detail: String },

  /// Client-side input rejected before any network call was made.
  #[error("validation error: {0}")]
  Validation(String),

  /// A payload did not match the expected shape.
  #[error("decode error: {0}")]
  Decode(String),

  /// Configuration could not be loaded or is inconsistent.
  #[error("config error: {0}")]
  Config(String),
}

impl Error {
  /// Status code for server errors, `None` for everything else.
  pub fn status(&self) -> Option<u16> {
    match self {
      Error::Server { status, .. } => Some(*status),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn display_includes_status_and_detail() {
    let err = Error::Server {
      status: 422,
      detail: "email already taken".to_string(),
    };
    assert_eq!(err.to_string(), "server error 422: email already taken");
    assert_eq!(err.status(), Some(422));
  }

  #[test]
  fn non_server_errors_have_no_status() {
    assert_eq!(Error::Network("timed out".to_string()).status(), None);
  }
}
