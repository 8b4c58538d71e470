use async_trait::async_trait;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use super::{ChargeMetadata, ConfirmedCharge, GatewayError, InitializedCharge, PaymentGateway};

/// Paystack transaction API response envelope.
#[derive(Debug, Deserialize)]
struct PaystackEnvelope<T> {
    status: bool,
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct InitializeData {
    authorization_url: String,
    access_code: Option<String>,
    reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct VerifyData {
    status: String,
    amount: i64,
    reference: String,
}

/// HTTP client for the Paystack hosted-payment-page API.
#[derive(Clone)]
pub struct PaystackClient {
    client: Client,
    base_url: String,
    secret_key: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl PaystackClient {
    pub fn new(base_url: String, secret_key: String) -> Self {
        Self::with_circuit_breaker(base_url, secret_key, 3, 60)
    }

    /// Creates a client with custom circuit breaker configuration.
    pub fn with_circuit_breaker(
        base_url: String,
        secret_key: String,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        PaystackClient {
            client,
            base_url,
            secret_key,
            circuit_breaker,
        }
    }

    /// Returns the current state of the circuit breaker.
    pub fn circuit_state(&self) -> String {
        if self.circuit_breaker.is_call_permitted() {
            "closed".to_string()
        } else {
            "open".to_string()
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn initialize(
        &self,
        payer_email: &str,
        amount_minor_units: i64,
        metadata: ChargeMetadata,
    ) -> Result<InitializedCharge, GatewayError> {
        let url = self.endpoint("/transaction/initialize");
        let client = self.client.clone();
        let secret = self.secret_key.clone();
        let body = json!({
            "email": payer_email,
            "amount": amount_minor_units,
            "metadata": metadata,
        });

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client
                    .post(&url)
                    .bearer_auth(&secret)
                    .json(&body)
                    .send()
                    .await?;

                let envelope = response.json::<PaystackEnvelope<InitializeData>>().await?;

                if !envelope.status {
                    return Err(GatewayError::Rejected(
                        envelope
                            .message
                            .unwrap_or_else(|| "Failed to initialize payment".to_string()),
                    ));
                }

                let data = envelope.data.ok_or_else(|| {
                    GatewayError::InvalidResponse("initialize response missing data".to_string())
                })?;

                Ok(InitializedCharge {
                    reference: data.reference,
                    authorization_url: data.authorization_url,
                })
            })
            .await;

        match result {
            Ok(charge) => {
                tracing::info!(reference = %charge.reference, amount = amount_minor_units, "gateway charge initialized");
                Ok(charge)
            }
            Err(FailsafeError::Rejected) => Err(GatewayError::CircuitOpen),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }

    async fn confirm(&self, reference: &str) -> Result<ConfirmedCharge, GatewayError> {
        let url = self.endpoint(&format!("/transaction/verify/{}", reference));
        let client = self.client.clone();
        let secret = self.secret_key.clone();

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client.get(&url).bearer_auth(&secret).send().await?;

                let envelope = response.json::<PaystackEnvelope<VerifyData>>().await?;

                if !envelope.status {
                    return Err(GatewayError::Rejected(
                        envelope
                            .message
                            .unwrap_or_else(|| "Payment verification failed".to_string()),
                    ));
                }

                let data = envelope.data.ok_or_else(|| {
                    GatewayError::InvalidResponse("verify response missing data".to_string())
                })?;

                Ok(ConfirmedCharge {
                    success: data.status == "success",
                    status: data.status,
                    amount_minor_units: data.amount,
                })
            })
            .await;

        match result {
            Ok(charge) => Ok(charge),
            Err(FailsafeError::Rejected) => Err(GatewayError::CircuitOpen),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}
