//! Checkout Configuration
//!
//! Flat-rate pricing rules, currency and redirect URL templates, loaded from
//! the environment with defaults.

use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CheckoutError, Result};

/// Placeholder replaced by `app_origin` in URL templates
pub const ORIGIN_PLACEHOLDER: &str = "{origin}";

/// Tax and shipping rules applied to every order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRules {
    /// Fraction of the subtotal, e.g. `0.08`
    pub tax_rate: Decimal,

    /// Shipping is free when the subtotal exceeds this
    pub free_shipping_threshold: Decimal,

    /// Shipping charged otherwise
    pub flat_shipping_fee: Decimal,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            tax_rate: Decimal::new(8, 2),
            free_shipping_threshold: Decimal::from(50),
            flat_shipping_fee: Decimal::new(599, 2),
        }
    }
}

/// Checkout configuration
#[derive(Clone, Debug)]
pub struct CheckoutConfig {
    pub pricing: PricingRules,

    /// ISO currency code sent to the gateway
    pub currency: String,

    /// Public origin of the storefront, e.g. `https://shop.example.com`
    pub app_origin: String,

    pub return_url_template: String,
    pub callback_url_template: String,

    /// Upper bound on waiting for the gateway during submission
    pub submit_timeout: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            pricing: PricingRules::default(),
            currency: "EGP".into(),
            app_origin: "http://localhost:3000".into(),
            return_url_template: "{origin}/checkout/return".into(),
            callback_url_template: "{origin}/api/payments/callback".into(),
            submit_timeout: Duration::from_secs(30),
        }
    }
}

impl CheckoutConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let pricing = PricingRules {
            tax_rate: env_decimal("CHECKOUT_TAX_RATE", defaults.pricing.tax_rate)?,
            free_shipping_threshold: env_decimal(
                "CHECKOUT_FREE_SHIPPING_THRESHOLD",
                defaults.pricing.free_shipping_threshold,
            )?,
            flat_shipping_fee: env_decimal("CHECKOUT_FLAT_SHIPPING_FEE", defaults.pricing.flat_shipping_fee)?,
        };

        let submit_timeout = match std::env::var("PAYMENT_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    CheckoutError::Config(format!("PAYMENT_TIMEOUT_SECS must be a positive whole number, got '{raw}'"))
                })?,
            Err(_) => defaults.submit_timeout,
        };

        let config = Self {
            pricing,
            currency: std::env::var("CHECKOUT_CURRENCY").unwrap_or(defaults.currency),
            app_origin: std::env::var("APP_BASE_URL").unwrap_or(defaults.app_origin),
            return_url_template: std::env::var("CHECKOUT_RETURN_URL").unwrap_or(defaults.return_url_template),
            callback_url_template: std::env::var("CHECKOUT_CALLBACK_URL")
                .unwrap_or(defaults.callback_url_template),
            submit_timeout,
        };
        config.check()?;

        tracing::info!(
            currency = %config.currency,
            tax_rate = %config.pricing.tax_rate,
            free_shipping_threshold = %config.pricing.free_shipping_threshold,
            "Checkout configuration loaded"
        );

        Ok(config)
    }

    /// Reject rules that would produce nonsensical totals
    pub fn check(&self) -> Result<()> {
        let pricing = &self.pricing;
        if pricing.tax_rate < Decimal::ZERO || pricing.tax_rate >= Decimal::ONE {
            return Err(CheckoutError::Config(format!(
                "tax rate must be in [0, 1), got {}",
                pricing.tax_rate
            )));
        }
        if pricing.free_shipping_threshold < Decimal::ZERO || pricing.flat_shipping_fee < Decimal::ZERO {
            return Err(CheckoutError::Config("shipping amounts must not be negative".into()));
        }
        if self.currency.trim().is_empty() {
            return Err(CheckoutError::Config("currency must be set".into()));
        }
        Ok(())
    }

    pub fn return_url(&self) -> String {
        self.expand(&self.return_url_template)
    }

    pub fn callback_url(&self) -> String {
        self.expand(&self.callback_url_template)
    }

    fn expand(&self, template: &str) -> String {
        template.replace(ORIGIN_PLACEHOLDER, self.app_origin.trim_end_matches('/'))
    }
}

fn env_decimal(name: &str, default: Decimal) -> Result<Decimal> {
    match std::env::var(name) {
        Ok(raw) => Decimal::from_str(raw.trim())
            .map_err(|e| CheckoutError::Config(format!("{name} must be a decimal, got '{raw}': {e}"))),
        Err(_) => Ok(default),
    }
}
