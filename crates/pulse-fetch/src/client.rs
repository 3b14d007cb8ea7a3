//! HTTP signal source.

use std::collections::BTreeSet;
use std::env;

use pulse_traits::{RawSignalValue, RawValue, SignalKey};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::source::{FetchFuture, SignalSource};
use crate::{ProviderError, Result};

/// Environment variable holding the provider API key.
pub const API_KEY_VAR: &str = "PULSE_API_KEY";

/// Longest response body kept in an error message.
const MAX_ERROR_BODY: usize = 256;

/// Wire shape of `GET {base}/signals/{key}`. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct Payload {
    value: RawValue,
    #[serde(default)]
    delta: Option<f64>,
}

/// Decode and validate a signal payload.
///
/// # Errors
///
/// Returns [`ProviderError::DataFormat`] if the body is not the expected
/// JSON object or holds a non-finite number.
pub fn decode_payload(key: SignalKey, body: &str) -> Result<RawSignalValue> {
    let payload: Payload = serde_json::from_str(body)?;
    if !payload.value.is_valid() {
        return Err(ProviderError::DataFormat(format!(
            "{key}: non-finite value"
        )));
    }
    let mut value = RawSignalValue::new(key, payload.value);
    if let Some(delta) = payload.delta {
        if !delta.is_finite() {
            return Err(ProviderError::DataFormat(format!(
                "{key}: non-finite delta"
            )));
        }
        value = value.with_delta(delta);
    }
    Ok(value)
}

/// Signal provider reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: Client,
    name: String,
    base_url: String,
    api_key: Option<String>,
    keys: BTreeSet<SignalKey>,
}

impl HttpSource {
    /// Create a source serving every signal from `base_url`, without
    /// credentials.
    #[must_use]
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            name: name.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: None,
            keys: SignalKey::ALL.into_iter().collect(),
        }
    }

    /// Create a source whose API key comes from `PULSE_API_KEY`.
    ///
    /// This will also load from a `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::MissingApiKey`] if the variable is not set.
    pub fn from_env(name: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        // Try to load .env file (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_key = env::var(API_KEY_VAR).map_err(|_| ProviderError::MissingApiKey(API_KEY_VAR))?;
        Ok(Self::new(name, base_url).with_api_key(api_key))
    }

    /// Attach an API key, sent as the `apikey` query parameter.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Restrict the signals this source claims to serve.
    #[must_use]
    pub fn with_keys(mut self, keys: impl IntoIterator<Item = SignalKey>) -> Self {
        self.keys = keys.into_iter().collect();
        self
    }

    fn url(&self, key: SignalKey) -> String {
        format!("{}/signals/{key}", self.base_url)
    }

    async fn get(&self, key: SignalKey) -> Result<RawSignalValue> {
        let mut request = self.client.get(self.url(key));
        if let Some(api_key) = &self.api_key {
            request = request.query(&[("apikey", api_key)]);
        }
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ProviderError::RateLimited(self.name.clone()));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ProviderError::Auth(status.as_u16()));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY).collect(),
            });
        }

        let text = response.text().await?;
        decode_payload(key, &text)
    }
}

impl SignalSource for HttpSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn provides(&self, key: SignalKey) -> bool {
        self.keys.contains(&key)
    }

    fn fetch(&self, key: SignalKey) -> FetchFuture<'_> {
        Box::pin(self.get(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_decode_number_and_flag() {
        let v = decode_payload(SignalKey::VixLevel, r#"{"value": 14.2, "delta": -0.3}"#).unwrap();
        assert_eq!(v.value, RawValue::Number(14.2));
        assert_eq!(v.delta, Some(-0.3));

        let v = decode_payload(SignalKey::GoldenCross, r#"{"value": true, "source": "x"}"#).unwrap();
        assert_eq!(v.value, RawValue::Flag(true));
        assert_eq!(v.delta, None);
    }

    #[test]
    fn test_decode_rejects_malformed() {
        for body in [
            r#"{"value": "14.2"}"#,
            r#"{"delta": 1.0}"#,
            r#"{"value": null}"#,
            "not json",
        ] {
            assert!(
                matches!(
                    decode_payload(SignalKey::VixLevel, body),
                    Err(ProviderError::DataFormat(_))
                ),
                "{body}"
            );
        }
    }

    #[test]
    fn test_key_filter() {
        let source = HttpSource::new("fred", "http://localhost/")
            .with_keys([SignalKey::HySpread, SignalKey::IgSpread]);
        assert!(source.provides(SignalKey::HySpread));
        assert!(!source.provides(SignalKey::VixLevel));
        assert_eq!(
            source.url(SignalKey::HySpread),
            "http://localhost/signals/hy_spread"
        );
    }

    /// Serve one canned HTTP response per connection, in order.
    async fn serve(responses: Vec<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut buf = [0_u8; 4096];
                let _ = socket.read(&mut buf).await;
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });
        format!("http://{addr}")
    }

    fn response(status: &str, body: &str) -> &'static str {
        let text = format!(
            "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        Box::leak(text.into_boxed_str())
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let base = serve(vec![
            response("200 OK", r#"{"value": 0.92}"#),
            response("429 Too Many Requests", ""),
            response("403 Forbidden", ""),
            response("500 Internal Server Error", "down"),
        ])
        .await;
        let source = HttpSource::new("test", base).with_api_key("k");

        let ok = source.fetch(SignalKey::PutCallRatio).await.unwrap();
        assert_eq!(ok.value.as_number(), Some(0.92));

        assert!(matches!(
            source.fetch(SignalKey::PutCallRatio).await,
            Err(ProviderError::RateLimited(_))
        ));
        assert!(matches!(
            source.fetch(SignalKey::PutCallRatio).await,
            Err(ProviderError::Auth(403))
        ));
        assert!(matches!(
            source.fetch(SignalKey::PutCallRatio).await,
            Err(ProviderError::Status { status: 500, body }) if body == "down"
        ));
    }
}
