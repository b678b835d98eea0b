//! HTTP client for the CRM backend.
//! Credentials are handed in through [`ApiConfig`]; the client never reads
//! ambient state.

use std::time::Duration;

use crm_core::config::ApiConfig;
use crm_core::types::{
    Campaign, CampaignSend, CampaignSendResult, Customer, NewCampaign, NewCustomer, NewOrder,
    Order, OrderStatus,
};
use crm_segmentation::{NewSegment, Segment};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use url::Url;

use crate::envelope::{error_message, item_from_envelope, list_from_envelope};
use crate::error::ApiError;

/// Outcome of a connectivity probe against `/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub connected: bool,
    pub status: u16,
    pub message: String,
}

pub struct CrmClient {
    base_url: Url,
    http: reqwest::Client,
    token: Option<String>,
}

impl CrmClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            base_url: parse_base_url(&config.base_url)?,
            http,
            token: config.token.clone(),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ─── Customers ─────────────────────────────────────────────────────

    pub async fn fetch_customers(&self) -> Result<Vec<Customer>, ApiError> {
        let body = self.execute(self.request(Method::GET, "customers")?).await?;
        Ok(list_from_envelope(body, "customers")?)
    }

    pub async fn create_customer(&self, customer: &NewCustomer) -> Result<Customer, ApiError> {
        info!(email = %customer.email, "Creating customer");
        let request = self.request(Method::POST, "customers")?.json(customer);
        Ok(item_from_envelope(self.execute(request).await?, "customer")?)
    }

    // ─── Orders ────────────────────────────────────────────────────────

    pub async fn fetch_orders(&self) -> Result<Vec<Order>, ApiError> {
        let body = self.execute(self.request(Method::GET, "orders")?).await?;
        Ok(list_from_envelope(body, "orders")?)
    }

    pub async fn create_order(&self, order: &NewOrder) -> Result<Order, ApiError> {
        info!(
            customer = %order.customer,
            total_amount = order.total_amount,
            "Creating order"
        );
        let request = self.request(Method::POST, "orders")?.json(order);
        Ok(item_from_envelope(self.execute(request).await?, "order")?)
    }

    pub async fn update_order_status(
        &self,
        order_id: &str,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        info!(order_id, status = status.as_str(), "Updating order status");
        let request = self
            .request(Method::PATCH, &format!("orders/{order_id}/status"))?
            .json(&json!({ "status": status }));
        Ok(item_from_envelope(self.execute(request).await?, "order")?)
    }

    // ─── Segments ──────────────────────────────────────────────────────

    pub async fn fetch_segments(&self) -> Result<Vec<Segment>, ApiError> {
        let body = self.execute(self.request(Method::GET, "segments")?).await?;
        Ok(list_from_envelope(body, "segments")?)
    }

    pub async fn create_segment(&self, segment: &NewSegment) -> Result<Segment, ApiError> {
        info!(
            name = %segment.name,
            rules = segment.rules.len(),
            logic = ?segment.logic,
            "Creating segment"
        );
        let request = self.request(Method::POST, "segments")?.json(segment);
        Ok(item_from_envelope(self.execute(request).await?, "segment")?)
    }

    // ─── Campaigns ─────────────────────────────────────────────────────

    pub async fn fetch_campaigns(&self) -> Result<Vec<Campaign>, ApiError> {
        let body = self.execute(self.request(Method::GET, "campaigns")?).await?;
        Ok(list_from_envelope(body, "campaigns")?)
    }

    pub async fn create_campaign(&self, campaign: &NewCampaign) -> Result<Campaign, ApiError> {
        info!(title = %campaign.title, "Creating campaign");
        let request = self.request(Method::POST, "campaigns")?.json(campaign);
        Ok(item_from_envelope(self.execute(request).await?, "campaign")?)
    }

    pub async fn send_campaign(&self, send: &CampaignSend) -> Result<CampaignSendResult, ApiError> {
        info!(
            segment_id = %send.segment_id,
            kind = ?send.kind,
            "Sending campaign"
        );
        let request = self.request(Method::POST, "campaigns/send")?.json(send);
        Ok(item_from_envelope(self.execute(request).await?, "campaign")?)
    }

    // ─── Health ────────────────────────────────────────────────────────

    /// Probes `/health`. Connection problems are reported in the status,
    /// not as an error.
    pub async fn health(&self) -> HealthStatus {
        let request = match self.request(Method::GET, "health") {
            Ok(request) => request,
            Err(err) => return disconnected(err),
        };
        match request.send().await {
            Ok(response) => {
                let status = response.status();
                HealthStatus {
                    connected: status.is_success(),
                    status: status.as_u16(),
                    message: if status.is_success() {
                        "API connected successfully".to_string()
                    } else {
                        "API connection failed".to_string()
                    },
                }
            }
            Err(err) => disconnected(err.into()),
        }
    }

    // ─── Internal helpers ──────────────────────────────────────────────

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let mut builder = self
            .http
            .request(method, self.endpoint(path)?)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().clone();
        let body = response.text().await?;

        debug!(url = %url, status = status.as_u16(), "API response received");

        if !status.is_success() {
            let message = error_message(status.as_u16(), &body);
            warn!(url = %url, status = status.as_u16(), error = %message, "API request failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

/// Normalizes the base URL to end in `/` so relative joins keep its path.
fn parse_base_url(raw: &str) -> Result<Url, ApiError> {
    let trimmed = raw.trim().trim_end_matches('/');
    Ok(Url::parse(&format!("{trimmed}/"))?)
}

fn disconnected(err: ApiError) -> HealthStatus {
    HealthStatus {
        connected: false,
        status: 0,
        message: format!("API connection error: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> ApiConfig {
        ApiConfig {
            base_url: base_url.to_string(),
            ..ApiConfig::default()
        }
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let client = CrmClient::new(&config("https://crm.example.com/api")).unwrap();
        assert_eq!(
            client.endpoint("/customers").unwrap().as_str(),
            "https://crm.example.com/api/customers"
        );

        let client = CrmClient::new(&config("https://crm.example.com/api/")).unwrap();
        assert_eq!(
            client.endpoint("orders/o-1/status").unwrap().as_str(),
            "https://crm.example.com/api/orders/o-1/status"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            CrmClient::new(&config("not a url")),
            Err(ApiError::Url(_))
        ));
    }
}
