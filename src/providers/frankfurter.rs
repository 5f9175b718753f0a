use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, error, instrument};

use crate::core::error::FetchError;
use crate::core::rate::QuoteSource;

pub const DEFAULT_BASE_URL: &str = "https://api.frankfurter.dev/v1";

// FrankfurterProvider implementation for QuoteSource
pub struct FrankfurterProvider {
    base_url: String,
    api_key: Option<String>,
}

impl FrankfurterProvider {
    pub fn new(base_url: &str) -> Self {
        FrankfurterProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key;
        self
    }

    fn query_params<'a>(&'a self, base: &'a str, target: &'a str) -> Vec<(&'static str, &'a str)> {
        let mut params = vec![("from", base), ("to", target)];
        if let Some(key) = &self.api_key {
            params.push(("apikey", key.as_str()));
        }
        params
    }
}

#[derive(Debug, Deserialize)]
struct FrankfurterResponse {
    #[serde(default)]
    rates: HashMap<String, f64>,
    message: Option<String>,
    error: Option<String>,
}

impl FrankfurterResponse {
    fn provider_error(&self) -> Option<&str> {
        self.error.as_deref().or(self.message.as_deref())
    }
}

#[async_trait]
impl QuoteSource for FrankfurterProvider {
    #[instrument(name = "FrankfurterQuoteFetch", skip(self))]
    async fn fetch_rate(&self, base: &str, target: &str) -> Result<f64, FetchError> {
        let url = format!("{}/latest", self.base_url);
        debug!("Requesting exchange rate from {}", self.base_url);

        let client = reqwest::Client::builder()
            .user_agent("unitconv/0.1")
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let response = client
            .get(&url)
            .query(&self.query_params(base, target))
            .send()
            .await
            .map_err(|e| FetchError::Transport(format!("{e} for currency pair: {base}/{target}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let parsed = serde_json::from_str::<FrankfurterResponse>(&text);

        if !status.is_success() {
            if let Ok(body) = &parsed {
                if let Some(message) = body.provider_error() {
                    return Err(FetchError::Provider(message.to_string()));
                }
            }
            return Err(FetchError::Status(status.to_string()));
        }

        let data = parsed.map_err(|e| {
            error!(error = ?e, response = %text, "Failed to parse quote response");
            FetchError::Malformed(e.to_string())
        })?;

        match data.rates.get(target) {
            Some(rate) => Ok(*rate),
            None => match data.provider_error() {
                Some(message) => Err(FetchError::Provider(message.to_string())),
                None => Err(FetchError::MissingRate(target.to_string())),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_mock_server(status: u16, mock_response: &str) -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("from", "USD"))
            .and(query_param("to", "BRL"))
            .respond_with(ResponseTemplate::new(status).set_body_string(mock_response))
            .mount(&mock_server)
            .await;

        mock_server
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let mock_response = r#"{
            "amount": 1.0,
            "base": "USD",
            "date": "2025-06-30",
            "rates": { "BRL": 5.4321 }
        }"#;
        let mock_server = create_mock_server(200, mock_response).await;

        let provider = FrankfurterProvider::new(&mock_server.uri());
        let rate = provider
            .fetch_rate("USD", "BRL")
            .await
            .expect("Failed to get rate");
        assert_eq!(rate, 5.4321);
    }

    #[tokio::test]
    async fn test_api_key_is_sent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("apikey", "secret"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"rates": {"BRL": 5.0}}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider = FrankfurterProvider::new(&format!("{}/", mock_server.uri()))
            .with_api_key(Some("secret".to_string()));
        assert_eq!(provider.fetch_rate("USD", "BRL").await.unwrap(), 5.0);
    }

    #[tokio::test]
    async fn test_api_key_is_escaped() {
        let key = "a&b+c#d=e";
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/latest"))
            .and(query_param("apikey", key))
            .and(query_param("from", "USD"))
            .and(query_param("to", "BRL"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"rates": {"BRL": 5.2}}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;

        let provider =
            FrankfurterProvider::new(&mock_server.uri()).with_api_key(Some(key.to_string()));
        assert_eq!(provider.fetch_rate("USD", "BRL").await.unwrap(), 5.2);
    }

    #[tokio::test]
    async fn test_missing_rate_field() {
        let mock_server = create_mock_server(200, r#"{"rates": {"EUR": 0.92}}"#).await;
        let provider = FrankfurterProvider::new(&mock_server.uri());

        let result = provider.fetch_rate("USD", "BRL").await;
        assert_eq!(result, Err(FetchError::MissingRate("BRL".to_string())));
    }

    #[tokio::test]
    async fn test_non_numeric_rate() {
        let mock_server = create_mock_server(200, r#"{"rates": {"BRL": "5.1"}}"#).await;
        let provider = FrankfurterProvider::new(&mock_server.uri());

        let result = provider.fetch_rate("USD", "BRL").await;
        assert!(matches!(result, Err(FetchError::Malformed(_))));
    }

    #[tokio::test]
    async fn test_provider_error_field() {
        let mock_server = create_mock_server(200, r#"{"error": "quota exceeded"}"#).await;
        let provider = FrankfurterProvider::new(&mock_server.uri());

        let result = provider.fetch_rate("USD", "BRL").await;
        assert_eq!(result, Err(FetchError::Provider("quota exceeded".to_string())));
    }

    #[tokio::test]
    async fn test_error_status_with_message() {
        let mock_server = create_mock_server(404, r#"{"message": "not found"}"#).await;
        let provider = FrankfurterProvider::new(&mock_server.uri());

        let result = provider.fetch_rate("USD", "BRL").await;
        assert_eq!(result, Err(FetchError::Provider("not found".to_string())));
    }

    #[tokio::test]
    async fn test_error_status() {
        let mock_server = create_mock_server(500, "").await;
        let provider = FrankfurterProvider::new(&mock_server.uri());

        let result = provider.fetch_rate("USD", "BRL").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error"
        );
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = create_mock_server(200, "<html>oops</html>").await;
        let provider = FrankfurterProvider::new(&mock_server.uri());

        let result = provider.fetch_rate("USD", "BRL").await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse quote response")
        );
    }

    #[tokio::test]
    async fn test_network_error() {
        // Nothing listens on the discard port
        let provider = FrankfurterProvider::new("http://127.0.0.1:9");

        let result = provider.fetch_rate("USD", "BRL").await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }
}
