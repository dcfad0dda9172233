//! Checkout Orchestrator
//!
//! Drives one checkout attempt against the payment gateway:
//!
//! ```text
//! Idle ─▶ Validating ─▶ Submitting ─▶ Redirecting
//!              │              │
//!              └──▶ Error ◀───┘ ──▶ Idle
//! ```
//!
//! Every failure ends back in `Idle` with the cart and form untouched, so the
//! user can retry. A submission dropped mid-flight also lands in `Idle`. The
//! cart is only cleared once the gateway confirms the transaction of the
//! latest redirect as paid, for the amount that was charged.

use std::str::FromStr;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use cart_core::{Cart, CartStore};
use cart_payments::{
    BillingAddress, FailureKind, PaymentCustomer, PaymentGateway, PaymentRequest, PaymentSession,
    PaymentStatus, ReturnUrls, Transaction,
};

use crate::config::CheckoutConfig;
use crate::customer::{validate, CustomerInfo, ValidationErrors};
use crate::error::{CheckoutError, Result};
use crate::pricing::{compute_totals, Order, OrderTotals};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPhase {
    #[default]
    Idle,
    Validating,
    Submitting,
    Redirecting,
    Error,
}

/// Observable checkout state for the UI
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutStatus {
    pub phase: CheckoutPhase,

    /// True while a gateway call is in flight
    pub is_submitting: bool,

    pub last_error: Option<String>,
    pub error_code: Option<String>,

    #[serde(skip_serializing_if = "ValidationErrors::is_empty")]
    pub field_errors: ValidationErrors,

    /// Gateway reference of the last created session, for display
    pub transaction_ref: Option<String>,
    pub payment_url: Option<String>,
}

impl CheckoutStatus {
    /// A submission is underway and new ones must be rejected
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, CheckoutPhase::Validating | CheckoutPhase::Submitting)
    }

    fn enter(&mut self, phase: CheckoutPhase) {
        self.phase = phase;
        self.is_submitting = phase == CheckoutPhase::Submitting;
    }
}

/// Instruction to send the client to the hosted payment page
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    pub payment_url: String,
    pub transaction_ref: Option<String>,
    pub totals: OrderTotals,
}

/// Payment session handed to the client and not yet settled
#[derive(Clone, Debug, PartialEq, Eq)]
struct PendingPayment {
    transaction_ref: String,
    total: Decimal,
    currency: String,
}

impl PendingPayment {
    /// Whether a looked-up transaction settles this session
    fn matches(&self, transaction: &Transaction) -> bool {
        if transaction.transaction_ref != self.transaction_ref {
            return false;
        }
        let amount_ok = transaction
            .amount
            .as_deref()
            .is_none_or(|amount| Decimal::from_str(amount.trim()).is_ok_and(|amount| amount == self.total));
        let currency_ok = transaction
            .currency
            .as_deref()
            .is_none_or(|currency| currency.trim().eq_ignore_ascii_case(&self.currency));
        amount_ok && currency_ok
    }
}

/// Moves the status out of `Validating`/`Submitting` if a submission is
/// dropped before it finishes
struct SubmitGuard<'a> {
    status: &'a watch::Sender<CheckoutStatus>,
    armed: bool,
}

impl<'a> SubmitGuard<'a> {
    fn arm(status: &'a watch::Sender<CheckoutStatus>) -> Self {
        Self { status, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        tracing::warn!(code = "SUBMISSION_INTERRUPTED", "Order submission dropped before completion");
        self.status.send_modify(|status| {
            status.enter(CheckoutPhase::Error);
            status.last_error = Some("Checkout was interrupted. Please try again.".into());
            status.error_code = Some("SUBMISSION_INTERRUPTED".into());
        });
        self.status.send_modify(|status| status.enter(CheckoutPhase::Idle));
    }
}

pub struct CheckoutOrchestrator {
    gateway: Arc<dyn PaymentGateway>,
    config: CheckoutConfig,
    status: watch::Sender<CheckoutStatus>,
    pending: watch::Sender<Option<PendingPayment>>,
}

impl CheckoutOrchestrator {
    pub fn new(gateway: Arc<dyn PaymentGateway>, config: CheckoutConfig) -> Self {
        let (status, _) = watch::channel(CheckoutStatus::default());
        let (pending, _) = watch::channel(None);
        Self {
            gateway,
            config,
            status,
            pending,
        }
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    /// Current status snapshot
    pub fn status(&self) -> CheckoutStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CheckoutStatus> {
        self.status.subscribe()
    }

    pub fn validate(&self, customer: &CustomerInfo) -> ValidationErrors {
        validate(customer)
    }

    pub fn compute_totals(&self, cart: &Cart) -> OrderTotals {
        compute_totals(cart, &self.config.pricing)
    }

    /// Submit the order and create a payment session.
    ///
    /// Rejected with `AlreadySubmitting` while another submission is in
    /// flight; that rejection leaves the status untouched. The cart is not
    /// cleared on success. Dropping the returned future mid-flight returns
    /// the status to `Idle`.
    pub async fn submit_order(&self, customer: &CustomerInfo, cart: &Cart) -> Result<Redirect> {
        let mut accepted = false;
        self.status.send_if_modified(|status| {
            if status.is_busy() {
                return false;
            }
            *status = CheckoutStatus::default();
            status.enter(CheckoutPhase::Validating);
            accepted = true;
            true
        });
        if !accepted {
            tracing::warn!(code = "ALREADY_SUBMITTING", "Rejected re-entrant order submission");
            return Err(CheckoutError::AlreadySubmitting);
        }

        let guard = SubmitGuard::arm(&self.status);
        let result = self.run_submission(customer, cart).await;
        guard.disarm();
        result
    }

    /// Ends in `Redirecting` on success, `Idle` otherwise
    async fn run_submission(&self, customer: &CustomerInfo, cart: &Cart) -> Result<Redirect> {
        if cart.is_empty() {
            return Err(self.fail(CheckoutError::EmptyCart));
        }

        let errors = validate(customer);
        if !errors.is_empty() {
            return Err(self.fail(CheckoutError::Validation(errors)));
        }

        let order = Order::from_cart(cart, &self.config.pricing);
        let request = match self.payment_request(customer, &order) {
            Ok(request) => request,
            Err(e) => return Err(self.fail(e)),
        };

        self.status.send_modify(|status| status.enter(CheckoutPhase::Submitting));
        tracing::info!(
            items = order.item_count,
            total = %order.total,
            currency = %request.currency(),
            gateway = self.gateway.name(),
            "Submitting order"
        );

        let session = tokio::time::timeout(self.config.submit_timeout, self.gateway.create_payment(&request))
            .await
            .unwrap_or_else(|_| {
                PaymentSession::failed(FailureKind::Transport, "payment gateway did not respond in time")
            });

        let Some(payment_url) = session.redirect_url().map(String::from) else {
            let message = session
                .error
                .clone()
                .unwrap_or_else(|| "payment session was not created".into());
            let error = match session.failure {
                Some(FailureKind::Transport) => CheckoutError::Transport(message),
                _ => CheckoutError::Gateway(message),
            };
            return Err(self.fail(error));
        };

        self.pending.send_replace(session.transaction_ref.clone().map(|transaction_ref| PendingPayment {
            transaction_ref,
            total: order.total,
            currency: request.currency().to_string(),
        }));
        self.status.send_modify(|status| {
            status.enter(CheckoutPhase::Redirecting);
            status.transaction_ref.clone_from(&session.transaction_ref);
            status.payment_url = Some(payment_url.clone());
        });
        tracing::info!(
            transaction_ref = ?session.transaction_ref,
            "Payment session created; redirecting"
        );

        Ok(Redirect {
            payment_url,
            transaction_ref: session.transaction_ref,
            totals: OrderTotals {
                subtotal: order.subtotal,
                tax: order.tax,
                shipping: order.shipping,
                total: order.total,
            },
        })
    }

    /// Start over after a redirect or error; ignored while busy
    pub fn reset(&self) {
        self.status.send_if_modified(|status| {
            if status.is_busy() {
                return false;
            }
            *status = CheckoutStatus::default();
            true
        });
    }

    /// Ask the gateway for a transaction
    pub async fn fetch_transaction(&self, transaction_ref: &str) -> Result<Transaction> {
        let lookup = self.gateway.get_transaction(transaction_ref).await;

        match lookup.transaction {
            Some(tx) if lookup.success && tx.transaction_ref == transaction_ref => Ok(tx),
            Some(tx) if lookup.success => Err(CheckoutError::Gateway(format!(
                "lookup for {transaction_ref} returned transaction {}",
                tx.transaction_ref
            ))),
            _ => {
                let message = lookup
                    .error
                    .unwrap_or_else(|| "transaction lookup failed".into());
                Err(match lookup.failure {
                    Some(FailureKind::Transport) => CheckoutError::Transport(message),
                    _ => CheckoutError::Gateway(message),
                })
            }
        }
    }

    /// Apply a looked-up transaction to the cart.
    ///
    /// Only the session from the latest redirect counts: any other reference,
    /// or a different amount or currency, leaves cart and status untouched.
    /// Clears the cart only when that session is `paid`; returns whether it did.
    pub fn complete_order(&self, transaction: &Transaction, cart: &mut CartStore) -> bool {
        let transaction_ref = transaction.transaction_ref.as_str();
        let status = transaction.status;

        let current = self
            .pending
            .borrow()
            .as_ref()
            .is_some_and(|pending| pending.matches(transaction));
        if !current {
            tracing::warn!(
                code = "UNRECOGNIZED_TRANSACTION",
                transaction_ref = %transaction_ref,
                status = %status,
                amount = ?transaction.amount,
                "Transaction does not match the current checkout; ignoring"
            );
            return false;
        }

        match status {
            PaymentStatus::Paid => {
                cart.clear();
                self.pending.send_replace(None);
                self.reset();
                tracing::info!(transaction_ref = %transaction_ref, "Payment confirmed; order completed");
                true
            }
            PaymentStatus::Failed | PaymentStatus::Cancelled => {
                self.pending.send_replace(None);
                self.status.send_if_modified(|current| {
                    if current.is_busy() {
                        return false;
                    }
                    current.enter(CheckoutPhase::Idle);
                    current.last_error = Some(format!("Payment was {status}. Your cart has been kept."));
                    current.error_code = Some("PAYMENT_NOT_COMPLETED".into());
                    true
                });
                tracing::info!(transaction_ref = %transaction_ref, status = %status, "Payment not completed");
                false
            }
            PaymentStatus::Pending | PaymentStatus::Unknown => {
                tracing::debug!(transaction_ref = %transaction_ref, status = %status, "Payment not yet confirmed");
                false
            }
        }
    }

    /// Look up the transaction and complete the order if it was paid
    pub async fn confirm_payment(&self, transaction_ref: &str, cart: &mut CartStore) -> Result<PaymentStatus> {
        let transaction = self.fetch_transaction(transaction_ref).await?;
        self.complete_order(&transaction, cart);
        Ok(transaction.status)
    }

    fn payment_request(&self, customer: &CustomerInfo, order: &Order) -> Result<PaymentRequest> {
        let request = PaymentRequest::new(
            order.total,
            self.config.currency.clone(),
            order.description(),
            PaymentCustomer {
                name: customer.full_name(),
                email: customer.email.trim().to_string(),
                phone: customer.phone.trim().to_string(),
            },
            BillingAddress {
                address: customer.address.trim().to_string(),
                city: customer.city.trim().to_string(),
                state: customer.state.trim().to_string(),
                country: customer.country.trim().to_string(),
                zip: customer.zip_code.trim().to_string(),
            },
            ReturnUrls {
                return_url: self.config.return_url(),
                callback_url: self.config.callback_url(),
            },
        )?;
        Ok(request)
    }

    /// Record a failed attempt: `Error`, then back to `Idle`
    fn fail(&self, error: CheckoutError) -> CheckoutError {
        if error.is_preflight() {
            tracing::debug!(code = error.code(), error = %error, "Checkout rejected before submission");
        } else {
            tracing::warn!(code = error.code(), error = %error, "Checkout failed");
        }

        let field_errors = match &error {
            CheckoutError::Validation(errors) => errors.clone(),
            _ => ValidationErrors::default(),
        };
        self.status.send_modify(|status| {
            status.enter(CheckoutPhase::Error);
            status.last_error = Some(error.user_message());
            status.error_code = Some(error.code().into());
            status.field_errors = field_errors;
        });
        self.status.send_modify(|status| status.enter(CheckoutPhase::Idle));

        error
    }
}
