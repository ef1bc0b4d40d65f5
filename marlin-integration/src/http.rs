use crate::{error::TransportError, secret::ApiCredentials};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Method, StatusCode};
use sha2::Sha256;
use std::time::Duration;
use tracing::debug;

const HEADER_API_KEY: &str = "X-MBX-APIKEY";
const QUERY_KEY_SIGNATURE: &str = "signature";
const QUERY_KEY_TIMESTAMP: &str = "timestamp";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Lowercase hex HMAC-SHA256 of the canonical query string.
pub fn sign_query(secret: &str, query: &str) -> Result<String, TransportError> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| TransportError::SignKey)?;
    mac.update(query.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// REST client for venue order endpoints.
///
/// Signed requests carry a millisecond UTC `timestamp`, sign the canonical
/// query string (parameters percent-encoded in insertion order) and append
/// the signature as the final query parameter; the api key travels in the
/// `X-MBX-APIKEY` header.
#[derive(Debug, Clone)]
pub struct RestClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl RestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Execute an unsigned request against a public endpoint.
    pub async fn send_public(
        &self,
        method: Method,
        path: &str,
        params: &[(String, String)],
    ) -> Result<String, TransportError> {
        let query = serde_urlencoded::to_string(params)?;
        let url = if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query)
        };

        let response = self
            .http_client
            .request(method, url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;
        Self::read_response(response).await
    }

    /// Execute a signed request against a private endpoint.
    pub async fn send_signed(
        &self,
        method: Method,
        path: &str,
        mut params: Vec<(String, String)>,
        credentials: &ApiCredentials,
    ) -> Result<String, TransportError> {
        params.push((
            QUERY_KEY_TIMESTAMP.to_string(),
            Utc::now().timestamp_millis().to_string(),
        ));

        let query = serde_urlencoded::to_string(&params)?;
        let signature = sign_query(&credentials.api_secret, &query)?;
        let url = format!(
            "{}{}?{}&{}={}",
            self.base_url, path, query, QUERY_KEY_SIGNATURE, signature
        );

        debug!(%method, path, "dispatching signed request");

        let response = self
            .http_client
            .request(method, url)
            .timeout(REQUEST_TIMEOUT)
            .header(HEADER_API_KEY, &credentials.api_key)
            .send()
            .await?;

        Self::read_response(response).await
    }

    async fn read_response(response: reqwest::Response) -> Result<String, TransportError> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(TransportError::HttpResponse(status, body))
        }
    }
}

/// True for statuses that should count against the transport circuit.
pub fn status_is_transient(status: StatusCode) -> bool {
    status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_is_lowercase_hex() {
        // Reference vector from the venue's API documentation.
        let secret = "NhqPtmdSJYdKjVHjA7PZj4Mge3R5YNiP1e3UZjInClVN65XAbvqqM6A7H5fATj0j";
        let query = "symbol=LTCBTC&side=BUY&type=LIMIT&timeInForce=GTC&quantity=1&price=0.1&recvWindow=5000&timestamp=1499827319559";
        let signature = sign_query(secret, query).unwrap();
        assert_eq!(
            signature,
            "c8db56825ae71d6d79447849e617115f4a920fa2acdcab2b053c4b2838bd6b71"
        );
    }

    #[test]
    fn test_canonical_query_preserves_insertion_order() {
        let params = vec![
            ("symbol".to_string(), "BTCUSDT".to_string()),
            ("side".to_string(), "BUY".to_string()),
            ("type".to_string(), "MARKET".to_string()),
            ("quantity".to_string(), "0.5".to_string()),
        ];
        let query = serde_urlencoded::to_string(&params).unwrap();
        assert_eq!(query, "symbol=BTCUSDT&side=BUY&type=MARKET&quantity=0.5");
    }

    #[test]
    fn test_transient_statuses() {
        assert!(status_is_transient(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(status_is_transient(StatusCode::BAD_GATEWAY));
        assert!(!status_is_transient(StatusCode::BAD_REQUEST));
        assert!(!status_is_transient(StatusCode::TOO_MANY_REQUESTS));
    }
}
