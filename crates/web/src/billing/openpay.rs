//! Live OpenPay gateway client.
//!
//! Thin HTTP wrapper over the provider's customers/subscriptions REST
//! endpoints. Authentication is HTTP Basic with the merchant's private key
//! as the username and an empty password.

use reqwest::{Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use dailyrep_core::{CustomerId, SubscriptionId};

use crate::config::BillingConfig;

use super::gateway::{Gateway, GatewayError};
use super::types::{CustomerPayload, RemoteCustomer, RemoteSubscription, SubscriptionRequest};

/// Error body the gateway returns for rejected requests.
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

/// Live billing gateway client.
///
/// Cheap to clone; holds a shared `reqwest::Client`.
#[derive(Clone)]
pub struct OpenpayClient {
    client: reqwest::Client,
    base_url: String,
    private_key: SecretString,
}

impl OpenpayClient {
    /// Create a client scoped to one merchant account.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client fails to build.
    pub fn new(config: &BillingConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            base_url: format!(
                "{}/{}",
                config.api_base.trim_end_matches('/'),
                config.merchant_id
            ),
            private_key: config.private_key.clone(),
        })
    }

    /// Send a request and decode the expected JSON body.
    async fn decode<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = self.send(request).await?;
        response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }

    /// Send a request, mapping non-success statuses to `GatewayError::Api`.
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, GatewayError> {
        let response = request
            .basic_auth(self.private_key.expose_secret(), Some(""))
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        Err(api_error(status, response).await)
    }
}

/// Build a `GatewayError::Api` from an error response, tolerating bodies
/// that are not the documented error shape.
async fn api_error(status: StatusCode, response: Response) -> GatewayError {
    let body = response.text().await.unwrap_or_default();
    let parsed: Option<ApiErrorBody> = serde_json::from_str(&body).ok();

    let (error_code, description) = match parsed {
        Some(e) => (e.error_code, e.description.unwrap_or(body)),
        None => (None, body),
    };

    GatewayError::Api {
        status: status.as_u16(),
        error_code,
        description,
    }
}

impl Gateway for OpenpayClient {
    async fn create_customer(
        &self,
        payload: &CustomerPayload,
    ) -> Result<RemoteCustomer, GatewayError> {
        let url = format!("{}/customers", self.base_url);
        self.decode(self.client.post(&url).json(payload)).await
    }

    async fn update_customer(
        &self,
        id: &CustomerId,
        payload: &CustomerPayload,
    ) -> Result<RemoteCustomer, GatewayError> {
        let url = format!("{}/customers/{}", self.base_url, id.as_str());
        self.decode(self.client.put(&url).json(payload)).await
    }

    async fn create_subscription(
        &self,
        customer: &CustomerId,
        request: &SubscriptionRequest,
    ) -> Result<RemoteSubscription, GatewayError> {
        let url = format!("{}/customers/{}/subscriptions", self.base_url, customer.as_str());
        self.decode(self.client.post(&url).json(request)).await
    }

    async fn get_subscription(
        &self,
        customer: &CustomerId,
        subscription: &SubscriptionId,
    ) -> Result<RemoteSubscription, GatewayError> {
        let url = format!(
            "{}/customers/{}/subscriptions/{}",
            self.base_url,
            customer.as_str(),
            subscription.as_str()
        );
        self.decode(self.client.get(&url)).await
    }

    async fn delete_subscription(
        &self,
        customer: &CustomerId,
        subscription: &SubscriptionId,
    ) -> Result<(), GatewayError> {
        let url = format!(
            "{}/customers/{}/subscriptions/{}",
            self.base_url,
            customer.as_str(),
            subscription.as_str()
        );
        self.send(self.client.delete(&url)).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use dailyrep_core::PlanId;
    use secrecy::SecretString;

    fn test_config() -> BillingConfig {
        BillingConfig {
            merchant_id: "m_test".to_owned(),
            private_key: SecretString::from("sk_test"),
            public_key: "pk_test".to_owned(),
            plan_id: PlanId::from("plan_test"),
            api_base: "https://sandbox-api.openpay.mx/v1/".to_owned(),
        }
    }

    #[test]
    fn test_base_url_joins_merchant_id() {
        let client = OpenpayClient::new(&test_config()).unwrap();
        assert_eq!(client.base_url, "https://sandbox-api.openpay.mx/v1/m_test");
    }

    #[test]
    fn test_error_body_parsing() {
        let body = r#"{"category":"request","error_code":2005,"description":"The expiration date has already passed","http_code":400}"#;
        let parsed: ApiErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error_code, Some(2005));
        assert_eq!(
            parsed.description.as_deref(),
            Some("The expiration date has already passed")
        );
    }
}
