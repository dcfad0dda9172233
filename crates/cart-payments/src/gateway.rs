//! Payment Gateway Client
//!
//! `PaymentGateway` is the boundary the checkout flow talks to. Neither
//! operation returns an error: every failure comes back as a session or
//! lookup with `success: false`, tagged with a `FailureKind`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use crate::checkout::{PaymentRequest, PaymentSession};
use crate::error::{PaymentError, Result};
use crate::transaction::TransactionLookup;

/// Payment gateway (Strategy pattern)
///
/// Implemented over HTTP by `HttpPaymentGateway`; tests substitute their own.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a hosted payment session
    async fn create_payment(&self, request: &PaymentRequest) -> PaymentSession;

    /// Look up a transaction by its gateway reference
    async fn get_transaction(&self, transaction_ref: &str) -> TransactionLookup;

    /// Gateway name
    fn name(&self) -> &str;
}

/// Gateway client configuration
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Base URL, e.g. `https://gateway.example.com/api`
    pub base_url: String,

    /// Optional bearer token
    pub api_key: Option<String>,

    /// Upper bound for a single gateway request
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4000/api".into(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let base_url = std::env::var("PAYMENT_GATEWAY_URL").unwrap_or(defaults.base_url);
        let api_key = std::env::var("PAYMENT_GATEWAY_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());
        let timeout = match std::env::var("PAYMENT_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    PaymentError::Config(format!("PAYMENT_TIMEOUT_SECS must be a whole number, got '{raw}'"))
                })?;
                if secs == 0 {
                    return Err(PaymentError::Config("PAYMENT_TIMEOUT_SECS must be positive".into()));
                }
                Duration::from_secs(secs)
            }
            Err(_) => defaults.timeout,
        };

        Ok(Self {
            base_url,
            api_key,
            timeout,
        })
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP implementation of the gateway contract
pub struct HttpPaymentGateway {
    client: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
}

impl HttpPaymentGateway {
    /// Create a client from configuration
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| PaymentError::Config(format!("invalid gateway URL '{}': {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(PaymentError::Config(format!("gateway URL '{base_url}' cannot be a base")));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PaymentError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(GatewayConfig::from_env()?)
    }

    /// `POST {base}/payments`
    pub async fn try_create_payment(&self, request: &PaymentRequest) -> Result<PaymentSession> {
        let url = self.endpoint(&["payments"])?;
        let response = self
            .authorize(self.client.post(url))
            .json(request)
            .send()
            .await
            .map_err(|e| PaymentError::transport(&e))?;

        let body = Self::read_success_body(response).await?;
        let session: PaymentSession = serde_json::from_str(&body)
            .map_err(|e| PaymentError::MalformedResponse(e.to_string()))?;

        if !session.success {
            return Err(PaymentError::Gateway(
                session.error.unwrap_or_else(|| "payment session was rejected".into()),
            ));
        }
        if session.redirect_url().is_none() {
            return Err(PaymentError::MalformedResponse(
                "successful response without payment_url".into(),
            ));
        }

        Ok(session)
    }

    /// `GET {base}/payments/{transaction_ref}`
    pub async fn try_get_transaction(&self, transaction_ref: &str) -> Result<TransactionLookup> {
        if transaction_ref.trim().is_empty() {
            return Err(PaymentError::InvalidRequest("transaction_ref is required".into()));
        }

        let url = self.endpoint(&["payments", transaction_ref])?;
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| PaymentError::transport(&e))?;

        let body = Self::read_success_body(response).await?;
        let lookup: TransactionLookup = serde_json::from_str(&body)
            .map_err(|e| PaymentError::MalformedResponse(e.to_string()))?;

        if !lookup.success {
            return Err(PaymentError::Gateway(
                lookup.error.unwrap_or_else(|| "transaction lookup was rejected".into()),
            ));
        }
        if lookup.transaction.is_none() {
            return Err(PaymentError::MalformedResponse(
                "successful lookup without transaction".into(),
            ));
        }

        Ok(lookup)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| PaymentError::Config("gateway URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn read_success_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await.map_err(|e| PaymentError::transport(&e))?;

        if status.is_success() {
            return Ok(body);
        }

        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.error.or(b.message))
            .filter(|m| !m.trim().is_empty());
        Err(PaymentError::Gateway(match detail {
            Some(detail) => format!("HTTP {}: {detail}", status.as_u16()),
            None => format!("gateway responded with HTTP {}", status.as_u16()),
        }))
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn create_payment(&self, request: &PaymentRequest) -> PaymentSession {
        match self.try_create_payment(request).await {
            Ok(session) => {
                tracing::info!(
                    transaction_ref = ?session.transaction_ref,
                    amount = %request.amount(),
                    currency = %request.currency(),
                    "Created payment session"
                );
                session
            }
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "Payment session creation failed");
                PaymentSession::failed(e.failure_kind(), e.to_string())
            }
        }
    }

    async fn get_transaction(&self, transaction_ref: &str) -> TransactionLookup {
        match self.try_get_transaction(transaction_ref).await {
            Ok(lookup) => {
                tracing::debug!(transaction_ref = %transaction_ref, status = ?lookup.status(), "Fetched transaction");
                lookup
            }
            Err(e) => {
                tracing::warn!(
                    code = e.code(),
                    error = %e,
                    transaction_ref = %transaction_ref,
                    "Transaction lookup failed"
                );
                TransactionLookup::failed(e.failure_kind(), e.to_string())
            }
        }
    }

    fn name(&self) -> &str {
        "HttpPaymentGateway"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::{BillingAddress, PaymentCustomer, ReturnUrls};
    use crate::error::FailureKind;
    use crate::transaction::PaymentStatus;
    use axum::{
        extract::{Path, State},
        http::{HeaderMap, StatusCode},
        routing::{get, post},
        Json, Router,
    };
    use rust_decimal_macros::dec;
    use serde_json::{json, Value};
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<(Value, Option<String>)>>>;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn gateway(base_url: String, timeout: Duration) -> HttpPaymentGateway {
        HttpPaymentGateway::new(GatewayConfig {
            base_url,
            api_key: Some("sk_test".into()),
            timeout,
        })
        .unwrap()
    }

    fn request() -> PaymentRequest {
        PaymentRequest::new(
            dec!(49.19),
            "EGP",
            "Rust 101",
            PaymentCustomer {
                name: "Ada Lovelace".into(),
                email: "ada@example.com".into(),
                phone: "0100".into(),
            },
            BillingAddress {
                address: "1 Nile St".into(),
                city: "Cairo".into(),
                state: "Cairo".into(),
                country: "EG".into(),
                zip: "11511".into(),
            },
            ReturnUrls {
                return_url: "https://shop.test/return".into(),
                callback_url: "https://shop.test/callback".into(),
            },
        )
        .unwrap()
    }

    async fn capture(
        State(captured): State<Captured>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Json<Value> {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        captured.lock().unwrap().push((body, auth));
        Json(json!({"success": true, "payment_url": "https://pay/x", "transaction_ref": "T1"}))
    }

    #[tokio::test]
    async fn test_create_payment_success() {
        let captured: Captured = Arc::default();
        let router = Router::new()
            .route("/api/payments", post(capture))
            .with_state(captured.clone());
        let client = gateway(serve(router).await, Duration::from_secs(5));

        let session = client.create_payment(&request()).await;
        assert!(session.success);
        assert_eq!(session.redirect_url(), Some("https://pay/x"));
        assert_eq!(session.transaction_ref.as_deref(), Some("T1"));

        let calls = captured.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0["amount"], "49.19");
        assert_eq!(calls[0].0["customer_email"], "ada@example.com");
        assert_eq!(calls[0].1.as_deref(), Some("Bearer sk_test"));
    }

    #[tokio::test]
    async fn test_declined_payment_is_gateway_failure() {
        let router = Router::new().route(
            "/api/payments",
            post(|| async { Json(json!({"success": false, "error": "Merchant disabled"})) }),
        );
        let client = gateway(serve(router).await, Duration::from_secs(5));

        let session = client.create_payment(&request()).await;
        assert!(!session.success);
        assert_eq!(session.failure, Some(FailureKind::Gateway));
        assert!(session.error.unwrap().contains("Merchant disabled"));
    }

    #[tokio::test]
    async fn test_non_2xx_is_gateway_failure() {
        let router = Router::new().route(
            "/api/payments",
            post(|| async { (StatusCode::BAD_GATEWAY, Json(json!({"error": "upstream down"}))) }),
        );
        let client = gateway(serve(router).await, Duration::from_secs(5));

        let session = client.create_payment(&request()).await;
        assert_eq!(session.failure, Some(FailureKind::Gateway));
        assert!(session.error.unwrap().contains("502"));
    }

    #[tokio::test]
    async fn test_unparsable_body_is_malformed() {
        let router = Router::new().route("/api/payments", post(|| async { "<html>oops</html>" }));
        let client = gateway(serve(router).await, Duration::from_secs(5));

        let session = client.create_payment(&request()).await;
        assert!(!session.success);
        assert_eq!(session.failure, Some(FailureKind::MalformedResponse));
    }

    #[tokio::test]
    async fn test_success_without_url_is_malformed() {
        let router = Router::new().route(
            "/api/payments",
            post(|| async { Json(json!({"success": true, "transaction_ref": "T1"})) }),
        );
        let client = gateway(serve(router).await, Duration::from_secs(5));

        let session = client.create_payment(&request()).await;
        assert_eq!(session.failure, Some(FailureKind::MalformedResponse));
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = gateway(format!("http://{addr}/api"), Duration::from_secs(5));
        let session = client.create_payment(&request()).await;
        assert!(!session.success);
        assert_eq!(session.failure, Some(FailureKind::Transport));
    }

    #[tokio::test]
    async fn test_slow_gateway_times_out() {
        let router = Router::new().route(
            "/api/payments",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Json(json!({"success": true, "payment_url": "https://pay/late"}))
            }),
        );
        let client = gateway(serve(router).await, Duration::from_millis(200));

        let session = client.create_payment(&request()).await;
        assert_eq!(session.failure, Some(FailureKind::Transport));
        assert!(session.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_get_transaction() {
        let router = Router::new().route(
            "/api/payments/{reference}",
            get(|Path(reference): Path<String>| async move {
                if reference == "T1" {
                    (
                        StatusCode::OK,
                        Json(json!({
                            "success": true,
                            "transaction": {"transaction_ref": "T1", "status": "paid", "amount": "49.19", "currency": "EGP"}
                        })),
                    )
                } else {
                    (StatusCode::NOT_FOUND, Json(json!({"success": false, "error": "not found"})))
                }
            }),
        );
        let client = gateway(serve(router).await, Duration::from_secs(5));

        let found = client.get_transaction("T1").await;
        assert_eq!(found.status(), Some(PaymentStatus::Paid));

        let missing = client.get_transaction("T2").await;
        assert!(!missing.success);
        assert_eq!(missing.failure, Some(FailureKind::Gateway));

        let blank = client.get_transaction(" ").await;
        assert_eq!(blank.failure, Some(FailureKind::InvalidRequest));
    }

    #[test]
    fn test_invalid_base_url() {
        let result = HttpPaymentGateway::new(GatewayConfig {
            base_url: "not a url".into(),
            ..Default::default()
        });
        assert!(matches!(result, Err(PaymentError::Config(_))));
    }
}
