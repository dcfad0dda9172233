//! Payment Session Creation
//!
//! Request and response shapes for creating a hosted payment session.
//! Required fields are enforced when the request is built, not when sent.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{FailureKind, PaymentError, Result};

/// Customer contact details sent with the payment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentCustomer {
    pub name: String,
    pub email: String,
    pub phone: String,
}

/// Billing address sent with the payment
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BillingAddress {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub zip: String,
}

/// Where the gateway sends the user and the server afterwards
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReturnUrls {
    pub return_url: String,
    pub callback_url: String,
}

/// Body of a payment creation call
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PaymentRequest {
    amount: String,
    currency: String,
    description: String,
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    billing_address: String,
    billing_city: String,
    billing_state: String,
    billing_country: String,
    billing_zip: String,
    return_url: String,
    callback_url: String,
}

impl PaymentRequest {
    /// Build a request, rejecting blank fields and non-positive amounts.
    ///
    /// The amount is rounded half away from zero to 2 decimals and sent as a
    /// string, e.g. `"129.99"`.
    pub fn new(
        amount: Decimal,
        currency: impl Into<String>,
        description: impl Into<String>,
        customer: PaymentCustomer,
        billing: BillingAddress,
        urls: ReturnUrls,
    ) -> Result<Self> {
        if amount <= Decimal::ZERO {
            return Err(PaymentError::InvalidRequest(format!(
                "amount must be positive, got {amount}"
            )));
        }
        let amount = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

        let request = Self {
            amount: format!("{amount:.2}"),
            currency: currency.into().trim().to_uppercase(),
            description: description.into(),
            customer_name: customer.name,
            customer_email: customer.email,
            customer_phone: customer.phone,
            billing_address: billing.address,
            billing_city: billing.city,
            billing_state: billing.state,
            billing_country: billing.country,
            billing_zip: billing.zip,
            return_url: urls.return_url,
            callback_url: urls.callback_url,
        };

        let required = [
            ("currency", &request.currency),
            ("customer_name", &request.customer_name),
            ("customer_email", &request.customer_email),
            ("customer_phone", &request.customer_phone),
            ("billing_address", &request.billing_address),
            ("billing_city", &request.billing_city),
            ("billing_state", &request.billing_state),
            ("billing_country", &request.billing_country),
            ("billing_zip", &request.billing_zip),
            ("return_url", &request.return_url),
            ("callback_url", &request.callback_url),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(PaymentError::InvalidRequest(format!("{field} is required")));
        }

        Ok(request)
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn customer_email(&self) -> &str {
        &self.customer_email
    }

    pub fn return_url(&self) -> &str {
        &self.return_url
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }
}

/// Gateway's view of a payment session
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSession {
    pub success: bool,

    /// Hosted payment page to redirect the user to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_url: Option<String>,

    /// Gateway reference for later lookups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_ref: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Set on failures produced by the client itself
    #[serde(skip)]
    pub failure: Option<FailureKind>,
}

impl PaymentSession {
    pub fn created(payment_url: impl Into<String>, transaction_ref: Option<String>) -> Self {
        Self {
            success: true,
            payment_url: Some(payment_url.into()),
            transaction_ref,
            error: None,
            failure: None,
        }
    }

    pub fn failed(kind: FailureKind, error: impl Into<String>) -> Self {
        Self {
            success: false,
            payment_url: None,
            transaction_ref: None,
            error: Some(error.into()),
            failure: Some(kind),
        }
    }

    /// URL to redirect to, only for successful sessions that carry one
    pub fn redirect_url(&self) -> Option<&str> {
        if !self.success {
            return None;
        }
        self.payment_url.as_deref().filter(|url| !url.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn customer() -> PaymentCustomer {
        PaymentCustomer {
            name: "Ada Lovelace".into(),
            email: "ada@example.com".into(),
            phone: "+20 100 000 0000".into(),
        }
    }

    fn billing() -> BillingAddress {
        BillingAddress {
            address: "1 Nile St".into(),
            city: "Cairo".into(),
            state: "Cairo".into(),
            country: "EG".into(),
            zip: "11511".into(),
        }
    }

    fn urls() -> ReturnUrls {
        ReturnUrls {
            return_url: "https://shop.test/checkout/return".into(),
            callback_url: "https://shop.test/api/payments/callback".into(),
        }
    }

    #[test]
    fn test_request_wire_shape() {
        let request =
            PaymentRequest::new(dec!(129.985), "egp", "Rust 101", customer(), billing(), urls()).unwrap();
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["amount"], "129.99");
        assert_eq!(json["currency"], "EGP");
        assert_eq!(json["customer_name"], "Ada Lovelace");
        assert_eq!(json["billing_zip"], "11511");
        assert_eq!(json["callback_url"], "https://shop.test/api/payments/callback");
        assert_eq!(json.as_object().unwrap().len(), 13);
    }

    #[test]
    fn test_whole_amount_keeps_two_decimals() {
        let request = PaymentRequest::new(dec!(40), "EGP", "", customer(), billing(), urls()).unwrap();
        assert_eq!(request.amount(), "40.00");
    }

    #[test]
    fn test_required_fields_enforced() {
        let mut missing_email = customer();
        missing_email.email = "  ".into();
        let err = PaymentRequest::new(dec!(10), "EGP", "", missing_email, billing(), urls()).unwrap_err();
        assert!(err.to_string().contains("customer_email"));

        let err = PaymentRequest::new(Decimal::ZERO, "EGP", "", customer(), billing(), urls()).unwrap_err();
        assert!(matches!(err, PaymentError::InvalidRequest(_)));
    }

    #[test]
    fn test_session_redirect_url() {
        let ok: PaymentSession =
            serde_json::from_str(r#"{"success":true,"payment_url":"https://pay/x","transaction_ref":"T1"}"#)
                .unwrap();
        assert_eq!(ok.redirect_url(), Some("https://pay/x"));

        let no_url: PaymentSession = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert_eq!(no_url.redirect_url(), None);

        let failed = PaymentSession::failed(FailureKind::Gateway, "declined");
        assert_eq!(failed.redirect_url(), None);
    }
}
