use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::Deserialize;
use serde_json::Value;

use super::payload::{self, PushDocument, UploadDocument};
use super::{CarrierClient, CarrierError, CarrierResult};
use crate::core::CarrierConfig;
use crate::models::{ShipmentCreated, ShipmentRecord};

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Client for the UPS OAuth, Shipping and Paperless Documents APIs.
pub struct UpsClient {
    http: reqwest::Client,
    config: CarrierConfig,
}

impl UpsClient {
    pub fn new(config: CarrierConfig) -> CarrierResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(CarrierError::Transport)?;
        Ok(UpsClient { http, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn documents_url(&self, action: &str) -> String {
        self.url(&format!("/api/paperlessdocuments/{}/{}", self.config.docs_version, action))
    }

    async fn post_json(&self, url: &str, token: &str, body: &Value, with_shipper: bool) -> CarrierResult<Value> {
        let mut request = self.http.post(url).bearer_auth(token).json(body);
        if with_shipper {
            request = request.header("ShipperNumber", &self.config.account_number);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CarrierError::Http {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl CarrierClient for UpsClient {
    async fn access_token(&self) -> CarrierResult<Option<String>> {
        let (Some(id), Some(secret)) = (&self.config.client_id, &self.config.client_secret) else {
            return Ok(None);
        };

        let response = self
            .http
            .post(&self.config.oauth_url)
            .basic_auth(id, Some(secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CarrierError::Http {
                status: status.as_u16(),
                body,
            });
        }
        let token: TokenResponse = response.json().await?;
        Ok(Some(token.access_token))
    }

    async fn create_shipment(&self, record: &ShipmentRecord) -> CarrierResult<ShipmentCreated> {
        let token = self.access_token().await?.ok_or(CarrierError::MissingCredentials)?;

        let country = payload::account_country(record, self.config.account_country.as_deref());
        let body = payload::shipment_request(record, &self.config.account_number, &country);
        let raw = self
            .post_json(&self.url("/api/shipments/v1/ship"), &token, &body, false)
            .await?;

        let shipment_number = payload::shipment_number(&raw);
        tracing::info!(shipment_number = ?shipment_number, "shipment created");
        Ok(ShipmentCreated { shipment_number, raw })
    }

    async fn upload_document(&self, document: &UploadDocument) -> CarrierResult<Option<Value>> {
        let Some(token) = self.access_token().await? else {
            return Ok(None);
        };

        let bytes = tokio::fs::read(&document.path).await?;
        let encoded = BASE64.encode(&bytes);
        let body = payload::upload_request(document, &encoded, &self.config.account_number);

        let response = self
            .post_json(&self.documents_url("upload"), &token, &body, true)
            .await?;
        Ok(Some(response))
    }

    async fn push_document(&self, push: &PushDocument) -> CarrierResult<Option<Value>> {
        let Some(token) = self.access_token().await? else {
            return Ok(None);
        };

        let body = payload::push_request(push);
        let response = self
            .post_json(&self.documents_url("image"), &token, &body, true)
            .await?;
        Ok(Some(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> UpsClient {
        UpsClient::new(CarrierConfig {
            base_url: base_url.to_string(),
            docs_version: "v2".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn builds_document_urls_from_version() {
        let ups = client("https://example.test/");
        assert_eq!(ups.documents_url("upload"), "https://example.test/api/paperlessdocuments/v2/upload");
        assert_eq!(ups.url("/api/shipments/v1/ship"), "https://example.test/api/shipments/v1/ship");
    }

    #[tokio::test]
    async fn without_credentials_nothing_is_sent() {
        // an unroutable base url: any request would fail rather than return None
        let ups = client("http://127.0.0.1:9");
        assert_eq!(ups.access_token().await.unwrap(), None);

        let push = PushDocument {
            document_id: "D".into(),
            shipment_identifier: "1Z".into(),
            tracking_number: "1Z".into(),
            shipment_date_time: "2024-01-01-00.00.00".into(),
            customer_context: String::new(),
        };
        assert_eq!(ups.push_document(&push).await.unwrap(), None);

        let err = ups.create_shipment(&ShipmentRecord::default()).await.unwrap_err();
        assert!(matches!(err, CarrierError::MissingCredentials));
    }
}
