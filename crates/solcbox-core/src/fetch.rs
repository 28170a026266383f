//! Blocking byte fetches over HTTP.

use std::io::Read;
use std::time::Duration;

use crate::error::FetchError;

/// Retrieves raw bytes from a URL.
///
/// The registry and catalog only ever need this one operation, which keeps
/// the transport replaceable in tests.
pub trait BinaryFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// HTTP fetcher backed by a `ureq` agent.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Creates a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("solcbox/", env!("CARGO_PKG_VERSION")))
            .build();
        Self { agent }
    }
}

impl BinaryFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::Status(status, _) => FetchError::Status {
                url: url.to_string(),
                status,
            },
            ureq::Error::Transport(transport) => FetchError::Transport {
                url: url.to_string(),
                message: transport.to_string(),
            },
        })?;

        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|e| FetchError::Read {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(body)
    }
}

/// Joins a base URL and a relative path with exactly one slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("https://binaries.soliditylang.org/emscripten-wasm32", "soljson-v0.8.17.js"),
            "https://binaries.soliditylang.org/emscripten-wasm32/soljson-v0.8.17.js"
        );
        assert_eq!(join_url("https://h/a/", "/b.js"), "https://h/a/b.js");
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        let fetcher = HttpFetcher::new(Duration::from_secs(2));
        let err = fetcher.fetch("http://127.0.0.1:1/list.json").unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }), "{:?}", err);
    }
}
